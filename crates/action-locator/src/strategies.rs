//! Query generation per strategy.

use cdp_adapter::ElementQuery;
use perceiver_structural::LocatorHints;

use crate::types::LocatorStrategy;

/// Attribute fallbacks, most specific first.
pub const ATTRIBUTE_ORDER: &[&str] = &["name", "aria-label", "placeholder"];

pub trait Strategy: Send + Sync {
    fn strategy_type(&self) -> LocatorStrategy;

    /// Queries to try in order. Empty when the hints carry nothing for this strategy.
    fn queries(&self, hints: &LocatorHints) -> Vec<ElementQuery>;

    fn name(&self) -> &'static str {
        self.strategy_type().name()
    }
}

pub struct RoleNameStrategy;

impl Strategy for RoleNameStrategy {
    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::RoleName
    }

    fn queries(&self, hints: &LocatorHints) -> Vec<ElementQuery> {
        let role = hints.role.trim();
        let name = hints.name.trim();
        if role.is_empty() || name.is_empty() {
            return Vec::new();
        }
        [true, false]
            .into_iter()
            .map(|exact| ElementQuery::Role {
                role: role.to_string(),
                name: name.to_string(),
                exact,
            })
            .collect()
    }
}

pub struct XPathStrategy;

impl Strategy for XPathStrategy {
    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::XPath
    }

    fn queries(&self, hints: &LocatorHints) -> Vec<ElementQuery> {
        hints
            .xpath
            .iter()
            .filter(|xpath| !xpath.trim().is_empty())
            .map(|xpath| ElementQuery::XPath {
                xpath: xpath.clone(),
            })
            .collect()
    }
}

pub struct AttributeStrategy;

impl Strategy for AttributeStrategy {
    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::Attribute
    }

    fn queries(&self, hints: &LocatorHints) -> Vec<ElementQuery> {
        ATTRIBUTE_ORDER
            .iter()
            .filter_map(|attr| {
                let value = hints.attributes.get(*attr)?;
                (!value.trim().is_empty()).then(|| ElementQuery::Attribute {
                    name: attr.to_string(),
                    value: value.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints() -> LocatorHints {
        let mut hints = LocatorHints {
            role: "textbox".into(),
            name: "Email".into(),
            xpath: Some("/html/body/form/input[1]".into()),
            ..LocatorHints::default()
        };
        hints.attributes.insert("placeholder".into(), "you@example.com".into());
        hints.attributes.insert("name".into(), "email".into());
        hints
    }

    #[test]
    fn role_queries_try_exact_before_substring() {
        let queries = RoleNameStrategy.queries(&hints());
        assert_eq!(queries.len(), 2);
        assert!(matches!(queries[0], ElementQuery::Role { exact: true, .. }));
        assert!(matches!(queries[1], ElementQuery::Role { exact: false, .. }));
    }

    #[test]
    fn attribute_queries_follow_fixed_order() {
        let names: Vec<String> = AttributeStrategy
            .queries(&hints())
            .into_iter()
            .map(|query| match query {
                ElementQuery::Attribute { name, .. } => name,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(names, vec!["name", "placeholder"]);
    }

    #[test]
    fn nameless_hints_skip_role_strategy() {
        let hints = LocatorHints {
            role: "button".into(),
            ..LocatorHints::default()
        };
        assert!(RoleNameStrategy.queries(&hints).is_empty());
        assert!(XPathStrategy.queries(&hints).is_empty());
    }
}
