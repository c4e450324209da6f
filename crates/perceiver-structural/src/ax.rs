//! Accessibility-tree snapshot builder.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use cdp_adapter::{AxNode, PageDriver};
use tracing::debug;

use crate::builder::{SnapshotBuilder, SnapshotOptions};
use crate::errors::SnapshotError;
use crate::is_interactive_role;
use crate::model::{ElementReference, LocatorHints, PageSnapshot, SnapshotSource};
use crate::render::{self, format_line, Line, LineParts};

const CONTAINER_ROLES: &[&str] = &["generic", "none", "presentation", "genericcontainer"];
const DROPPED_ROLES: &[&str] = &["inlinetextbox", "linebreak"];

#[derive(Clone, Debug, Default)]
pub struct AccessibilitySnapshotBuilder {
    options: SnapshotOptions,
}

impl AccessibilitySnapshotBuilder {
    pub fn new(options: SnapshotOptions) -> Self {
        Self { options }
    }

    /// Walk already-fetched nodes. The first node is the root.
    pub fn from_nodes(&self, url: &str, nodes: &[AxNode]) -> PageSnapshot {
        let Some(root) = nodes.first() else {
            return PageSnapshot::from_references(url, String::new(), Vec::new(), SnapshotSource::Accessibility);
        };
        let by_id: HashMap<&str, &AxNode> =
            nodes.iter().map(|node| (node.node_id.as_str(), node)).collect();

        let mut lines = Vec::new();
        let mut references = Vec::new();
        let mut visited = HashSet::new();
        // (node, depth, parent's rendered name)
        let mut stack: Vec<(&AxNode, usize, String)> = vec![(root, 0, String::new())];

        while let Some((node, depth, parent_name)) = stack.pop() {
            if !visited.insert(node.node_id.as_str()) {
                continue;
            }
            let role = node.role.to_ascii_lowercase();
            if DROPPED_ROLES.contains(&role.as_str()) || node.flag("hidden") == Some(true) {
                continue;
            }

            let has_content =
                !node.name.trim().is_empty() || !node.value.trim().is_empty() || !node.description.trim().is_empty();
            let is_container = role.is_empty() || CONTAINER_ROLES.contains(&role.as_str());
            let redundant_text = role == "statictext" && render::clean(&node.name) == parent_name;
            let rendered = !node.ignored && !redundant_text && (!is_container || has_content);

            let child_depth = if rendered { depth + 1 } else { depth };
            let name_for_children = if rendered {
                render::clean(&node.name)
            } else {
                parent_name
            };
            for child_id in node.child_ids.iter().rev() {
                if let Some(child) = by_id.get(child_id.as_str()) {
                    stack.push((child, child_depth, name_for_children.clone()));
                }
            }
            if !rendered {
                continue;
            }

            let disabled = node.flag("disabled") == Some(true);
            let ref_id = (is_interactive_role(&role) && !disabled)
                .then(|| format!("e{}", references.len() + 1));
            let parts = LineParts {
                role: if role == "statictext" { "text" } else { node.role.as_str() },
                name: &node.name,
                value: &node.value,
                checked: node.flag("checked"),
                disabled,
                expanded: node.flag("expanded"),
                description: &node.description,
            };
            lines.push(Line {
                depth,
                ref_id: ref_id.clone(),
                text: format_line(ref_id.as_deref(), &parts),
            });
            if let Some(ref_id) = ref_id {
                references.push(reference_for(ref_id, &role, node));
            }
        }

        let (text, kept) = render::render(&lines, self.options.char_budget);
        references.retain(|reference| kept.contains(&reference.ref_id));
        debug!(lines = lines.len(), refs = references.len(), "Built accessibility snapshot");
        PageSnapshot::from_references(url, text, references, SnapshotSource::Accessibility)
    }
}

fn reference_for(ref_id: String, role: &str, node: &AxNode) -> ElementReference {
    let name = render::clean(&node.name);
    let mut attributes = BTreeMap::new();
    if !name.is_empty() {
        attributes.insert("aria-label".to_string(), name.clone());
        if matches!(role, "textbox" | "searchbox" | "combobox") {
            attributes.insert("placeholder".to_string(), name.clone());
        }
    }
    ElementReference {
        ref_id,
        role: role.to_string(),
        name: name.clone(),
        description: node.description.clone(),
        value: node.value.clone(),
        checked: node.flag("checked"),
        disabled: false,
        expanded: node.flag("expanded"),
        tag: None,
        hints: LocatorHints {
            role: role.to_string(),
            name,
            xpath: None,
            attributes,
        },
    }
}

#[async_trait]
impl SnapshotBuilder for AccessibilitySnapshotBuilder {
    fn source(&self) -> SnapshotSource {
        SnapshotSource::Accessibility
    }

    async fn capture(&self, page: &dyn PageDriver) -> Result<PageSnapshot, SnapshotError> {
        let url = page.url().await?;
        let nodes = page.accessibility_tree().await?;
        if nodes.is_empty() {
            return Err(SnapshotError::EmptyTree);
        }
        Ok(self.from_nodes(&url, &nodes))
    }
}
