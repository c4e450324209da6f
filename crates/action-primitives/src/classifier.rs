//! Search and credential field classification.
//!
//! After typing, a search field is submitted with Enter. Credential fields never are, even
//! when they also look like search boxes, so both classes are evaluated independently and
//! credential wins.

use std::collections::HashMap;

use perceiver_structural::LocatorHints;

/// What the executor knows about a text field it is about to type into.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldDescriptor {
    pub role: String,
    pub name: String,
    /// Live DOM attributes, including the lowercased `tag`.
    pub attributes: HashMap<String, String>,
}

impl FieldDescriptor {
    pub fn new(hints: Option<&LocatorHints>, attributes: HashMap<String, String>) -> Self {
        let mut attributes = attributes;
        if let Some(hints) = hints {
            for (name, value) in &hints.attributes {
                attributes.entry(name.clone()).or_insert_with(|| value.clone());
            }
        }
        Self {
            role: hints.map(|h| h.role.clone()).unwrap_or_default(),
            name: hints.map(|h| h.name.clone()).unwrap_or_default(),
            attributes,
        }
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldClass {
    Search,
    Credential,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldClassification {
    pub search: bool,
    pub credential: bool,
}

impl FieldClassification {
    /// Whether typing should be followed by Enter.
    pub fn submits_on_enter(&self) -> bool {
        self.search && !self.credential
    }
}

pub trait FieldClassifier: Send + Sync {
    fn classify(&self, field: &FieldDescriptor) -> FieldClassification;
}

/// One predicate over a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldMatcher {
    /// Accessible role equals (case-insensitive).
    Role(&'static str),
    /// Attribute equals one of the values (case-insensitive).
    AttributeIs(&'static str, &'static [&'static str]),
    /// Attribute contains one of the fragments (case-insensitive).
    AttributeContains(&'static str, &'static [&'static str]),
    /// Accessible name contains one of the fragments (case-insensitive).
    NameContains(&'static [&'static str]),
}

impl FieldMatcher {
    pub fn matches(&self, field: &FieldDescriptor) -> bool {
        match self {
            FieldMatcher::Role(role) => field.role.eq_ignore_ascii_case(role),
            FieldMatcher::AttributeIs(attr, values) => field
                .attribute(attr)
                .map(|v| values.iter().any(|want| v.trim().eq_ignore_ascii_case(want)))
                .unwrap_or(false),
            FieldMatcher::AttributeContains(attr, fragments) => field
                .attribute(attr)
                .map(|v| contains_any(v, fragments))
                .unwrap_or(false),
            FieldMatcher::NameContains(fragments) => contains_any(&field.name, fragments),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub class: FieldClass,
    pub matcher: FieldMatcher,
}

const SEARCH_WORDS: &[&str] = &["search", "query", "find"];
const CREDENTIAL_WORDS: &[&str] = &["password", "passwd", "passcode", "username", "user name", "login", "email", "otp"];

/// Ordered rule table. Any matching rule sets its class.
#[derive(Debug, Clone)]
pub struct RuleTableClassifier {
    rules: Vec<FieldRule>,
}

impl Default for RuleTableClassifier {
    fn default() -> Self {
        use FieldClass::*;
        use FieldMatcher::*;

        let rule = |class, matcher| FieldRule { class, matcher };
        Self::new(vec![
            rule(Credential, AttributeIs("type", &["password", "email"])),
            rule(Credential, AttributeContains("autocomplete", &["password", "username", "email", "one-time-code"])),
            rule(Credential, AttributeContains("name", CREDENTIAL_WORDS)),
            rule(Credential, AttributeContains("id", CREDENTIAL_WORDS)),
            rule(Credential, NameContains(CREDENTIAL_WORDS)),
            rule(Search, Role("searchbox")),
            rule(Search, AttributeIs("type", &["search"])),
            rule(Search, AttributeIs("role", &["searchbox", "search"])),
            rule(Search, AttributeIs("name", &["q", "query", "search", "search_query", "keywords", "k"])),
            rule(Search, AttributeContains("placeholder", SEARCH_WORDS)),
            rule(Search, AttributeContains("aria-label", SEARCH_WORDS)),
            rule(Search, NameContains(SEARCH_WORDS)),
        ])
    }
}

impl RuleTableClassifier {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn with_rule(mut self, class: FieldClass, matcher: FieldMatcher) -> Self {
        self.rules.push(FieldRule { class, matcher });
        self
    }
}

impl FieldClassifier for RuleTableClassifier {
    fn classify(&self, field: &FieldDescriptor) -> FieldClassification {
        let mut result = FieldClassification::default();
        for rule in &self.rules {
            let already = match rule.class {
                FieldClass::Search => result.search,
                FieldClass::Credential => result.credential,
            };
            if already || !rule.matcher.matches(field) {
                continue;
            }
            match rule.class {
                FieldClass::Search => result.search = true,
                FieldClass::Credential => result.credential = true,
            }
        }
        result
    }
}

fn contains_any(haystack: &str, fragments: &[&str]) -> bool {
    let haystack = haystack.to_lowercase();
    fragments.iter().any(|fragment| haystack.contains(fragment))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(role: &str, name: &str, attrs: &[(&str, &str)]) -> FieldDescriptor {
        FieldDescriptor {
            role: role.into(),
            name: name.into(),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn google_style_query_box_is_search() {
        let classifier = RuleTableClassifier::default();
        let result = classifier.classify(&field("combobox", "Search", &[("name", "q"), ("tag", "textarea")]));
        assert!(result.search);
        assert!(!result.credential);
        assert!(result.submits_on_enter());
    }

    #[test]
    fn password_field_never_submits() {
        let classifier = RuleTableClassifier::default();
        let result = classifier.classify(&field("textbox", "Password", &[("type", "password")]));
        assert!(result.credential);
        assert!(!result.submits_on_enter());
    }

    #[test]
    fn credential_beats_search_when_both_match() {
        let classifier = RuleTableClassifier::default();
        let result = classifier.classify(&field(
            "searchbox",
            "Find your account by email",
            &[("type", "email")],
        ));
        assert!(result.search);
        assert!(result.credential);
        assert!(!result.submits_on_enter());
    }

    #[test]
    fn plain_text_fields_are_neither() {
        let classifier = RuleTableClassifier::default();
        let result = classifier.classify(&field("textbox", "First name", &[("name", "first_name")]));
        assert_eq!(result, FieldClassification::default());
    }

    #[test]
    fn custom_rules_extend_the_table() {
        let classifier = RuleTableClassifier::default()
            .with_rule(FieldClass::Search, FieldMatcher::AttributeIs("id", &["twotabsearchtextbox"]));
        let result = classifier.classify(&field("textbox", "", &[("id", "twotabsearchtextbox")]));
        assert!(result.submits_on_enter());
    }

    #[test]
    fn snapshot_hints_fill_missing_attributes() {
        let mut hints = LocatorHints {
            role: "textbox".into(),
            name: "Search jobs".into(),
            ..LocatorHints::default()
        };
        hints.attributes.insert("placeholder".into(), "Title, skill".into());
        let descriptor = FieldDescriptor::new(Some(&hints), HashMap::from([("placeholder".to_string(), "Search".to_string())]));
        assert_eq!(descriptor.attribute("placeholder"), Some("Search"));
        assert_eq!(descriptor.role, "textbox");
    }
}
