//! DOM snapshot builder, used when the accessibility tree is unavailable or empty.
//!
//! The serialized document is parsed with `scraper`, reduced to an owned tree (noise tags and
//! hidden subtrees dropped, attributes filtered to an allow-list, bare wrapper `div`/`span`
//! chains collapsed) and rendered with the same line format as the accessibility builder.

use std::collections::BTreeMap;

use async_trait::async_trait;
use cdp_adapter::PageDriver;
use scraper::{ElementRef, Html, Node};
use tracing::debug;

use crate::builder::{SnapshotBuilder, SnapshotOptions};
use crate::errors::SnapshotError;
use crate::is_interactive_role;
use crate::model::{ElementReference, LocatorHints, PageSnapshot, SnapshotSource};
use crate::render::{self, format_line, Line, LineParts};

const DROPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "svg", "meta", "link", "head", "template", "iframe",
];
const KEPT_ATTRIBUTES: &[&str] = &[
    "id",
    "name",
    "type",
    "role",
    "aria-label",
    "aria-expanded",
    "aria-checked",
    "aria-disabled",
    "placeholder",
    "href",
    "value",
    "title",
    "alt",
    "disabled",
    "checked",
    "onclick",
];
const HINT_ATTRIBUTES: &[&str] = &["name", "aria-label", "placeholder"];
const WRAPPER_TAGS: &[&str] = &["div", "span"];

#[derive(Debug, Clone)]
enum Child {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    xpath: String,
    attrs: BTreeMap<String, String>,
    children: Vec<Child>,
}

impl Element {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        render::clean(&out)
    }

    fn direct_text(&self) -> String {
        let joined: Vec<&str> = self
            .children
            .iter()
            .filter_map(|child| match child {
                Child::Text(text) => Some(text.as_str()),
                Child::Element(_) => None,
            })
            .collect();
        render::clean(&joined.join(" "))
    }

    fn is_disabled(&self) -> bool {
        self.attrs.contains_key("disabled") || self.attr("aria-disabled") == Some("true")
    }

    fn role(&self) -> String {
        if let Some(explicit) = self.attr("role").and_then(|r| r.split_whitespace().next()) {
            return explicit.to_ascii_lowercase();
        }
        let input_type = self.attr("type").unwrap_or("text").to_ascii_lowercase();
        match self.tag.as_str() {
            "a" if self.attrs.contains_key("href") => "link".into(),
            "button" => "button".into(),
            "select" => "combobox".into(),
            "textarea" => "textbox".into(),
            "input" => match input_type.as_str() {
                "button" | "submit" | "reset" | "image" => "button".into(),
                "checkbox" => "checkbox".into(),
                "radio" => "radio".into(),
                "range" => "slider".into(),
                "search" => "searchbox".into(),
                _ => "textbox".into(),
            },
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "heading".into(),
            "img" => "img".into(),
            "li" => "listitem".into(),
            "ul" | "ol" => "list".into(),
            "form" => "form".into(),
            "nav" => "navigation".into(),
            "main" => "main".into(),
            "table" => "table".into(),
            "label" => "label".into(),
            "p" => "paragraph".into(),
            other => other.to_string(),
        }
    }

    fn is_interactive(&self) -> bool {
        let role = self.role();
        let by_tag = match self.tag.as_str() {
            "a" => self.attrs.contains_key("href"),
            "button" | "input" | "select" | "textarea" => true,
            _ => false,
        };
        (by_tag || is_interactive_role(&role) || self.attrs.contains_key("onclick"))
            && !self.is_disabled()
    }

    fn accessible_name(&self) -> String {
        if let Some(label) = self.attr("aria-label").filter(|l| !l.trim().is_empty()) {
            return render::clean(label);
        }
        if self.tag == "input" {
            let input_type = self.attr("type").unwrap_or_default();
            if matches!(input_type, "button" | "submit" | "reset") {
                if let Some(value) = self.attr("value") {
                    return render::clean(value);
                }
            }
        }
        let text = self.text_content();
        if !text.is_empty() {
            return text;
        }
        ["placeholder", "title", "alt", "name"]
            .iter()
            .find_map(|key| self.attr(key).filter(|v| !v.trim().is_empty()))
            .map(render::clean)
            .unwrap_or_default()
    }
}

fn collect_text(children: &[Child], out: &mut String) {
    for child in children {
        match child {
            Child::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Child::Element(element) => collect_text(&element.children, out),
        }
    }
}

fn is_hidden(tag: &str, attrs: &BTreeMap<String, String>, raw: &scraper::node::Element) -> bool {
    if raw.attr("hidden").is_some() || raw.attr("aria-hidden") == Some("true") {
        return true;
    }
    if tag == "input" && attrs.get("type").map(String::as_str) == Some("hidden") {
        return true;
    }
    raw.attr("style")
        .map(|style| {
            let compact: String = style.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_ascii_lowercase();
            compact.contains("display:none") || compact.contains("visibility:hidden")
        })
        .unwrap_or(false)
}

/// Convert a scraper element into the reduced tree. `None` means the subtree is dropped.
fn reduce(node: ElementRef<'_>, xpath: String) -> Option<Element> {
    let raw = node.value();
    let tag = raw.name().to_ascii_lowercase();
    if DROPPED_TAGS.contains(&tag.as_str()) {
        return None;
    }
    let attrs: BTreeMap<String, String> = raw
        .attrs()
        .filter(|(name, _)| KEPT_ATTRIBUTES.contains(name))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    if is_hidden(&tag, &attrs, raw) {
        return None;
    }

    let element_children: Vec<_> = node
        .children()
        .filter(|child| child.value().is_element())
        .collect();
    let mut children = Vec::new();
    for child in node.children() {
        match child.value() {
            Node::Text(text) => {
                let text: &str = text;
                if !text.trim().is_empty() {
                    children.push(Child::Text(text.to_string()));
                }
            }
            Node::Element(child_el) => {
                let child_tag = child_el.name().to_ascii_lowercase();
                let same_tag: Vec<_> = element_children
                    .iter()
                    .filter(|sibling| {
                        sibling
                            .value()
                            .as_element()
                            .map(|el| el.name().eq_ignore_ascii_case(&child_tag))
                            .unwrap_or(false)
                    })
                    .collect();
                let step = if same_tag.len() > 1 {
                    let position = same_tag
                        .iter()
                        .position(|sibling| sibling.id() == child.id())
                        .map(|p| p + 1)
                        .unwrap_or(1);
                    format!("{child_tag}[{position}]")
                } else {
                    child_tag
                };
                let reduced = ElementRef::wrap(child)
                    .and_then(|child_ref| reduce(child_ref, format!("{xpath}/{step}")));
                if let Some(reduced) = reduced {
                    children.push(Child::Element(reduced));
                }
            }
            _ => {}
        }
    }

    let element = Element {
        tag,
        xpath,
        attrs,
        children,
    };
    Some(collapse(element))
}

/// Replace a bare wrapper holding exactly one element and no text with that element.
fn collapse(element: Element) -> Element {
    let bare = WRAPPER_TAGS.contains(&element.tag.as_str()) && element.attrs.is_empty();
    if bare && element.children.len() == 1 {
        if let Some(Child::Element(only)) = element.children.first() {
            return only.clone();
        }
    }
    element
}

#[derive(Clone, Debug, Default)]
pub struct DomSnapshotBuilder {
    options: SnapshotOptions,
}

impl DomSnapshotBuilder {
    pub fn new(options: SnapshotOptions) -> Self {
        Self { options }
    }

    pub fn from_html(&self, url: &str, html: &str) -> PageSnapshot {
        let document = Html::parse_document(html);
        let root = document.root_element();
        let Some(tree) = reduce(root, "/html".to_string()) else {
            return PageSnapshot::from_references(url, String::new(), Vec::new(), SnapshotSource::Dom);
        };

        let mut lines = Vec::new();
        let mut references = Vec::new();
        walk(&tree, 0, &mut lines, &mut references);

        let (text, kept) = render::render(&lines, self.options.char_budget);
        references.retain(|reference| kept.contains(&reference.ref_id));
        debug!(lines = lines.len(), refs = references.len(), "Built DOM snapshot");
        PageSnapshot::from_references(url, text, references, SnapshotSource::Dom)
    }
}

fn walk(element: &Element, depth: usize, lines: &mut Vec<Line>, references: &mut Vec<ElementReference>) {
    if element.is_interactive() {
        let ref_id = format!("e{}", references.len() + 1);
        let role = element.role();
        let name = element.accessible_name();
        let checked = element
            .attr("aria-checked")
            .map(|v| v == "true")
            .or_else(|| element.attrs.contains_key("checked").then_some(true));
        let expanded = element.attr("aria-expanded").map(|v| v == "true");
        let value = element.attr("value").unwrap_or_default();
        let description = element.attr("title").unwrap_or_default();
        let text = format_line(
            Some(&ref_id),
            &LineParts {
                role: &role,
                name: &name,
                value: if role == "button" { "" } else { value },
                checked,
                disabled: false,
                expanded,
                description,
            },
        );
        lines.push(Line {
            depth,
            ref_id: Some(ref_id.clone()),
            text,
        });
        let attributes = HINT_ATTRIBUTES
            .iter()
            .filter_map(|key| element.attr(key).map(|v| (key.to_string(), v.to_string())))
            .collect();
        references.push(ElementReference {
            ref_id,
            role: role.clone(),
            name: name.clone(),
            description: description.to_string(),
            value: value.to_string(),
            checked,
            disabled: false,
            expanded,
            tag: Some(element.tag.clone()),
            hints: LocatorHints {
                role,
                name,
                xpath: Some(element.xpath.clone()),
                attributes,
            },
        });
        return;
    }

    let own_text = element.direct_text();
    let labelled = element.tag != "body" && element.tag != "html";
    let disabled = element.is_disabled()
        && matches!(element.tag.as_str(), "button" | "input" | "select" | "textarea" | "a");
    let child_depth = if labelled && (!own_text.is_empty() || disabled) {
        let role = element.role();
        let label = if disabled {
            element.accessible_name()
        } else {
            own_text
        };
        lines.push(Line {
            depth,
            ref_id: None,
            text: format_line(
                None,
                &LineParts {
                    role: &role,
                    name: &label,
                    disabled,
                    ..LineParts::default()
                },
            ),
        });
        depth + 1
    } else {
        depth
    };
    if disabled {
        return;
    }
    for child in &element.children {
        if let Child::Element(child) = child {
            walk(child, child_depth, lines, references);
        }
    }
}

#[async_trait]
impl SnapshotBuilder for DomSnapshotBuilder {
    fn source(&self) -> SnapshotSource {
        SnapshotSource::Dom
    }

    async fn capture(&self, page: &dyn PageDriver) -> Result<PageSnapshot, SnapshotError> {
        let url = page.url().await?;
        let html = page.content().await?;
        if html.trim().is_empty() {
            return Err(SnapshotError::Document("empty document".into()));
        }
        Ok(self.from_html(&url, &html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>x</title><script>var a = 1;</script></head>
<body>
  <div><div><span><h1>Jobs</h1></span></div></div>
  <form>
    <input name="q" placeholder="Search jobs">
    <button type="submit">Search</button>
    <button disabled>Apply</button>
    <input type="hidden" name="token" value="secret">
  </form>
  <div style="display: none"><a href="/ghost">Ghost</a></div>
  <ul><li><a href="/a">First</a></li><li><a href="/b">Second</a></li></ul>
</body></html>"#;

    #[test]
    fn renders_interactive_elements_with_xpath_hints() {
        let snapshot = DomSnapshotBuilder::default().from_html("https://a.test", PAGE);
        assert_eq!(snapshot.source, SnapshotSource::Dom);
        assert_eq!(snapshot.count, 4);

        let search = snapshot.get("e1").expect("search field");
        assert_eq!(search.role, "textbox");
        assert_eq!(search.name, "Search jobs");
        assert_eq!(search.hints.attributes.get("name").map(String::as_str), Some("q"));
        assert_eq!(search.hints.xpath.as_deref(), Some("/html/body/form/input[1]"));

        let second = snapshot.get("e4").expect("second link");
        assert_eq!(second.name, "Second");
        assert_eq!(second.hints.xpath.as_deref(), Some("/html/body/ul/li[2]/a"));
    }

    #[test]
    fn strips_noise_hidden_and_disabled_elements() {
        let snapshot = DomSnapshotBuilder::default().from_html("https://a.test", PAGE);
        assert!(!snapshot.text.contains("var a"));
        assert!(!snapshot.text.contains("Ghost"));
        assert!(!snapshot.text.contains("secret"));
        assert!(snapshot.text.contains("- button \"Apply\" disabled"));
        assert!(snapshot.reference_map.values().all(|r| r.name != "Apply"));
    }

    #[test]
    fn bare_wrappers_collapse_onto_their_child() {
        let snapshot = DomSnapshotBuilder::default().from_html("https://a.test", PAGE);
        let first = snapshot.text.lines().next().expect("line");
        assert_eq!(first, "- heading \"Jobs\"");
    }
}
