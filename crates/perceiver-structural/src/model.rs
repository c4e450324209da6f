use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Recorded metadata sufficient to find an element again after the snapshot is taken.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorHints {
    pub role: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xpath: Option<String>,
    /// Attribute fallbacks keyed by attribute name (`name`, `aria-label`, `placeholder`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementReference {
    pub ref_id: String,
    pub role: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub checked: Option<bool>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub expanded: Option<bool>,
    #[serde(default)]
    pub tag: Option<String>,
    pub hints: LocatorHints,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    Accessibility,
    Dom,
    /// Sentinel produced when the page could not be observed.
    Error,
}

/// One observation of the page. Superseded by the next snapshot or by navigation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    pub text: String,
    pub reference_map: HashMap<String, ElementReference>,
    pub count: usize,
    pub source: SnapshotSource,
    #[serde(default)]
    pub error: Option<String>,
}

impl PageSnapshot {
    pub fn from_references(
        url: impl Into<String>,
        text: String,
        references: Vec<ElementReference>,
        source: SnapshotSource,
    ) -> Self {
        let reference_map: HashMap<_, _> = references
            .into_iter()
            .map(|reference| (reference.ref_id.clone(), reference))
            .collect();
        Self {
            url: url.into(),
            text,
            count: reference_map.len(),
            reference_map,
            source,
            error: None,
        }
    }

    /// Empty snapshot that lets the loop continue after an observation failure.
    pub fn error(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: String::new(),
            reference_map: HashMap::new(),
            count: 0,
            source: SnapshotSource::Error,
            error: Some(reason.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.source == SnapshotSource::Error
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Look up a reference written any way the model tends to write it.
    pub fn get(&self, raw_ref: &str) -> Option<&ElementReference> {
        self.reference_map.get(&normalize_ref(raw_ref))
    }

    /// References in assignment order.
    pub fn ordered_references(&self) -> Vec<&ElementReference> {
        let mut refs: Vec<&ElementReference> = self.reference_map.values().collect();
        refs.sort_by_key(|reference| ref_ordinal(&reference.ref_id));
        refs
    }
}

fn ref_ordinal(ref_id: &str) -> u64 {
    ref_id
        .trim_start_matches('e')
        .parse()
        .unwrap_or(u64::MAX)
}

/// Canonical `eN` form of `[e3]`, `e3`, `3`, `ref=e3` and similar.
pub fn normalize_ref(raw: &str) -> String {
    let trimmed = raw
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim();
    let trimmed = trimmed.strip_prefix("ref=").unwrap_or(trimmed).trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return format!("e{trimmed}");
    }
    match trimmed.strip_prefix('E') {
        Some(rest) if rest.chars().all(|c| c.is_ascii_digit()) => format!("e{rest}"),
        _ => trimmed.to_string(),
    }
}
