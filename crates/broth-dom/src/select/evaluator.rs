//! Element predicates.

use regex::Regex;

use crate::attributes::normalize_key;
use crate::error::{DomError, DomResult};
use crate::tree::DomTree;
use crate::NodeId;

/// A test applied to each element during collection.
///
/// Attribute keys are normalized like attribute keys themselves. Value
/// comparisons ignore case: the expected value is trimmed and lower-cased at
/// construction, the actual value is lower-cased when compared. Use the
/// constructor functions, which do this normalization, rather than building
/// the variants by hand.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Evaluator {
    /// Every element.
    AllElements,
    /// Elements with this (lower-case) tag name.
    Tag(String),
    /// Elements whose `id` equals this.
    Id(String),
    /// Elements carrying this class, ignoring case.
    Class(String),
    /// Elements with this attribute.
    Attribute(String),
    /// Elements with an attribute whose key starts with this prefix.
    AttributeStarting(String),
    /// `[key=value]`
    AttributeWithValue {
        /// Normalized key.
        key: String,
        /// Lower-cased value.
        value: String,
    },
    /// `[key!=value]`: also matches elements without the attribute.
    AttributeWithValueNot {
        /// Normalized key.
        key: String,
        /// Lower-cased value.
        value: String,
    },
    /// `[key^=value]`
    AttributeWithValueStarting {
        /// Normalized key.
        key: String,
        /// Lower-cased value.
        value: String,
    },
    /// `[key$=value]`
    AttributeWithValueEnding {
        /// Normalized key.
        key: String,
        /// Lower-cased value.
        value: String,
    },
    /// `[key*=value]`
    AttributeWithValueContaining {
        /// Normalized key.
        key: String,
        /// Lower-cased value.
        value: String,
    },
    /// `[key~=regex]`
    AttributeWithValueMatching {
        /// Normalized key.
        key: String,
        /// Pattern searched for in the value.
        pattern: Regex,
    },
    /// Element sibling index below this.
    IndexLessThan(usize),
    /// Element sibling index above this.
    IndexGreaterThan(usize),
    /// Element sibling index equal to this.
    IndexEquals(usize),
    /// Lower-cased [`DomTree::text`] contains this.
    ContainsText(String),
    /// Lower-cased [`DomTree::own_text`] contains this.
    ContainsOwnText(String),
    /// [`DomTree::text`] matches this pattern.
    Matches(Regex),
    /// [`DomTree::own_text`] matches this pattern.
    MatchesOwn(Regex),
    /// Every inner evaluator matches.
    And(Vec<Evaluator>),
    /// Any inner evaluator matches.
    Or(Vec<Evaluator>),
    /// Some ancestor below the collection root matches.
    Ancestor(Box<Evaluator>),
    /// The parent matches.
    Parent(Box<Evaluator>),
}

fn required(what: &str, value: &str) -> DomResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomError::invalid(format!("{what} must not be empty")));
    }
    Ok(value.to_string())
}

fn required_key(key: &str) -> DomResult<String> {
    let key = normalize_key(key);
    if key.is_empty() {
        return Err(DomError::invalid("attribute key must not be empty"));
    }
    Ok(key)
}

/// Compile a query pattern.
///
/// # Errors
///
/// Returns [`DomError::Pattern`] if the pattern is invalid.
pub fn compile(pattern: &str) -> DomResult<Regex> {
    Regex::new(pattern).map_err(|source| DomError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

impl Evaluator {
    /// Match by tag name.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if the name is empty.
    pub fn tag(name: &str) -> DomResult<Self> {
        Ok(Self::Tag(required("tag name", name)?.to_ascii_lowercase()))
    }

    /// Match by `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if the id is empty.
    pub fn id(id: &str) -> DomResult<Self> {
        Ok(Self::Id(required("id", id)?))
    }

    /// Match by class.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if the class name is empty.
    pub fn class(name: &str) -> DomResult<Self> {
        Ok(Self::Class(required("class name", name)?))
    }

    /// Match by attribute presence.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if the key is empty.
    pub fn attribute(key: &str) -> DomResult<Self> {
        Ok(Self::Attribute(required_key(key)?))
    }

    /// Match by attribute key prefix.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if the prefix is empty.
    pub fn attribute_starting(prefix: &str) -> DomResult<Self> {
        Ok(Self::AttributeStarting(required_key(prefix)?))
    }

    fn key_value(key: &str, value: &str) -> DomResult<(String, String)> {
        Ok((required_key(key)?, value.trim().to_lowercase()))
    }

    /// `[key=value]`
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if the key is empty.
    pub fn attribute_value(key: &str, value: &str) -> DomResult<Self> {
        let (key, value) = Self::key_value(key, value)?;
        Ok(Self::AttributeWithValue { key, value })
    }

    /// `[key!=value]`
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if the key is empty.
    pub fn attribute_value_not(key: &str, value: &str) -> DomResult<Self> {
        let (key, value) = Self::key_value(key, value)?;
        Ok(Self::AttributeWithValueNot { key, value })
    }

    /// `[key^=value]`
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if the key is empty.
    pub fn attribute_value_starting(key: &str, value: &str) -> DomResult<Self> {
        let (key, value) = Self::key_value(key, value)?;
        Ok(Self::AttributeWithValueStarting { key, value })
    }

    /// `[key$=value]`
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if the key is empty.
    pub fn attribute_value_ending(key: &str, value: &str) -> DomResult<Self> {
        let (key, value) = Self::key_value(key, value)?;
        Ok(Self::AttributeWithValueEnding { key, value })
    }

    /// `[key*=value]`
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if the key is empty.
    pub fn attribute_value_containing(key: &str, value: &str) -> DomResult<Self> {
        let (key, value) = Self::key_value(key, value)?;
        Ok(Self::AttributeWithValueContaining { key, value })
    }

    /// `[key~=regex]`
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if the key is empty, or
    /// [`DomError::Pattern`] if the pattern does not compile.
    pub fn attribute_value_matching(key: &str, pattern: &str) -> DomResult<Self> {
        Ok(Self::AttributeWithValueMatching {
            key: required_key(key)?,
            pattern: compile(pattern)?,
        })
    }

    /// Text contains `search`, ignoring case.
    #[must_use]
    pub fn contains_text(search: &str) -> Self {
        Self::ContainsText(search.to_lowercase())
    }

    /// Own text contains `search`, ignoring case.
    #[must_use]
    pub fn contains_own_text(search: &str) -> Self {
        Self::ContainsOwnText(search.to_lowercase())
    }

    /// Text matches `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Pattern`] if the pattern does not compile.
    pub fn matches_text(pattern: &str) -> DomResult<Self> {
        Ok(Self::Matches(compile(pattern)?))
    }

    /// Own text matches `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Pattern`] if the pattern does not compile.
    pub fn matches_own_text(pattern: &str) -> DomResult<Self> {
        Ok(Self::MatchesOwn(compile(pattern)?))
    }

    /// Test `element`, found while collecting from `root`. Non-elements
    /// never match.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, root: NodeId, element: NodeId) -> bool {
        if !tree.is_element(element) {
            return false;
        }
        let value = |key: &str| tree.attr(element, key).to_lowercase();
        match self {
            Self::AllElements => true,
            Self::Tag(name) => tree.tag_name(element) == name,
            Self::Id(id) => tree.element_id(element) == *id,
            Self::Class(name) => tree.has_class(element, name),
            Self::Attribute(key) => tree.has_attr(element, key),
            Self::AttributeStarting(prefix) => tree
                .attributes(element)
                .is_some_and(|attrs| attrs.iter().any(|a| a.key().starts_with(prefix.as_str()))),
            Self::AttributeWithValue { key, value: expected } => {
                tree.has_attr(element, key) && value(key) == *expected
            }
            Self::AttributeWithValueNot { key, value: expected } => value(key) != *expected,
            Self::AttributeWithValueStarting { key, value: expected } => {
                tree.has_attr(element, key) && value(key).starts_with(expected.as_str())
            }
            Self::AttributeWithValueEnding { key, value: expected } => {
                tree.has_attr(element, key) && value(key).ends_with(expected.as_str())
            }
            Self::AttributeWithValueContaining { key, value: expected } => {
                tree.has_attr(element, key) && value(key).contains(expected.as_str())
            }
            Self::AttributeWithValueMatching { key, pattern } => {
                tree.has_attr(element, key) && pattern.is_match(&tree.attr(element, key))
            }
            Self::IndexLessThan(index) => tree.element_sibling_index(element) < *index,
            Self::IndexGreaterThan(index) => tree.element_sibling_index(element) > *index,
            Self::IndexEquals(index) => tree.element_sibling_index(element) == *index,
            Self::ContainsText(search) => {
                tree.text(element).to_lowercase().contains(search.as_str())
            }
            Self::ContainsOwnText(search) => {
                tree.own_text(element).to_lowercase().contains(search.as_str())
            }
            Self::Matches(pattern) => pattern.is_match(&tree.text(element)),
            Self::MatchesOwn(pattern) => pattern.is_match(&tree.own_text(element)),
            Self::And(all) => all.iter().all(|e| e.matches(tree, root, element)),
            Self::Or(any) => any.iter().any(|e| e.matches(tree, root, element)),
            Self::Ancestor(inner) => {
                element != root
                    && tree
                        .ancestors(element)
                        .take_while(|&ancestor| ancestor != root)
                        .any(|ancestor| inner.matches(tree, root, ancestor))
            }
            Self::Parent(inner) => {
                element != root
                    && tree
                        .parent(element)
                        .is_some_and(|parent| inner.matches(tree, root, parent))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_normalize() {
        match Evaluator::attribute_value(" HREF ", "  Foo ").unwrap() {
            Evaluator::AttributeWithValue { key, value } => {
                assert_eq!(key, "href");
                assert_eq!(value, "foo");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(Evaluator::tag("P").unwrap(), Evaluator::Tag(name) if name == "p"));
    }

    #[test]
    fn test_empty_arguments_rejected() {
        assert!(Evaluator::tag("").is_err());
        assert!(Evaluator::id(" ").is_err());
        assert!(Evaluator::attribute("").is_err());
    }

    #[test]
    fn test_bad_pattern() {
        let err = Evaluator::matches_text("(unclosed").unwrap_err();
        assert!(matches!(err, DomError::Pattern { ref pattern, .. } if pattern == "(unclosed"));
    }
}
