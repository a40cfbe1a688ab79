//! Element attributes.
//!
//! [§ 4.9.2 Interface NamedNodeMap](https://dom.spec.whatwg.org/#interface-namednodemap)
//!
//! An [`Attributes`] set is an insertion-ordered list of [`Attribute`]s with
//! unique keys. Keys are trimmed and lower-cased once, when the attribute is
//! constructed, and are only compared in that form afterwards.

use std::fmt;

use crate::entities::{self, Charset, EscapeMode};
use crate::error::{DomError, DomResult};

/// Prefix of custom data attributes exposed through [`Dataset`].
pub const DATA_PREFIX: &str = "data-";

/// Normalize an attribute key: trim surrounding whitespace and lower-case.
#[must_use]
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// A single key/value attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    key: String,
    value: String,
}

impl Attribute {
    /// Create an attribute, normalizing the key.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if the key is empty after trimming.
    pub fn new(key: &str, value: impl Into<String>) -> DomResult<Self> {
        let key = normalize_key(key);
        if key.is_empty() {
            return Err(DomError::InvalidArgument(
                "attribute key must not be empty".to_string(),
            ));
        }
        Ok(Self {
            key,
            value: value.into(),
        })
    }

    /// Create an attribute from an encoded value, resolving character
    /// references strictly (a reference must end with `;`).
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if the key is empty.
    pub fn from_encoded(key: &str, encoded_value: &str) -> DomResult<Self> {
        Self::new(key, entities::unescape_with(encoded_value, true))
    }

    /// The normalized key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Replace the key, normalizing it.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if the key is empty after trimming.
    pub fn set_key(&mut self, key: &str) -> DomResult<()> {
        let key = normalize_key(key);
        if key.is_empty() {
            return Err(DomError::InvalidArgument(
                "attribute key must not be empty".to_string(),
            ));
        }
        self.key = key;
        Ok(())
    }

    /// The value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the value, returning the old one.
    pub fn set_value(&mut self, value: impl Into<String>) -> String {
        std::mem::replace(&mut self.value, value.into())
    }

    /// True for `data-*` keys with a non-empty suffix.
    #[must_use]
    pub fn is_data_attribute(&self) -> bool {
        self.key.len() > DATA_PREFIX.len() && self.key.starts_with(DATA_PREFIX)
    }

    /// Write `key="escaped value"` into `out`.
    pub fn html_into(&self, out: &mut String, charset: Charset, mode: EscapeMode) {
        out.push_str(&self.key);
        out.push_str("=\"");
        out.push_str(&entities::escape(&self.value, charset, mode));
        out.push('"');
    }

    /// The markup form of this attribute with default output settings.
    #[must_use]
    pub fn html(&self) -> String {
        let mut out = String::new();
        self.html_into(&mut out, Charset::default(), EscapeMode::default());
        out
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.html())
    }
}

/// Insertion-ordered set of attributes with unique, case-insensitive keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    attrs: Vec<Attribute>,
}

impl Attributes {
    /// Create an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { attrs: Vec::new() }
    }

    fn position(&self, key: &str) -> Option<usize> {
        let key = normalize_key(key);
        self.attrs.iter().position(|a| a.key == key)
    }

    /// The value for `key`, or `""` if it is not set.
    #[must_use]
    pub fn get(&self, key: &str) -> &str {
        self.attribute(key).map_or("", Attribute::value)
    }

    /// The attribute for `key`, if set.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Attribute> {
        self.position(key).map(|i| &self.attrs[i])
    }

    /// Set `key` to `value`. An existing key keeps its position.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if the key is empty after trimming.
    pub fn put(&mut self, key: &str, value: impl Into<String>) -> DomResult<()> {
        self.put_attribute(Attribute::new(key, value)?);
        Ok(())
    }

    /// Insert an attribute, overwriting (in place) any attribute with the same key.
    pub fn put_attribute(&mut self, attribute: Attribute) {
        match self.attrs.iter_mut().find(|a| a.key == attribute.key) {
            Some(existing) => *existing = attribute,
            None => self.attrs.push(attribute),
        }
    }

    /// Remove `key`, returning the removed attribute.
    pub fn remove(&mut self, key: &str) -> Option<Attribute> {
        self.position(key).map(|i| self.attrs.remove(i))
    }

    /// Returns true if `key` is set.
    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// Returns true if no attributes are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Merge `other` into this set; colliding keys take `other`'s value.
    pub fn add_all(&mut self, other: &Self) {
        for attribute in &other.attrs {
            self.put_attribute(attribute.clone());
        }
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.attrs.iter()
    }

    /// Iterate over `data-*` attributes as `(key without prefix, value)`.
    pub fn data_attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs
            .iter()
            .filter(|a| a.is_data_attribute())
            .map(|a| (&a.key[DATA_PREFIX.len()..], a.value.as_str()))
    }

    /// A live view over the `data-*` attributes.
    pub fn dataset(&mut self) -> Dataset<'_> {
        Dataset { attributes: self }
    }

    /// Write each attribute as ` key="value"` into `out`.
    pub fn html_into(&self, out: &mut String, charset: Charset, mode: EscapeMode) {
        for attribute in &self.attrs {
            out.push(' ');
            attribute.html_into(out, charset, mode);
        }
    }

    /// The markup form of these attributes with default output settings.
    #[must_use]
    pub fn html(&self) -> String {
        let mut out = String::new();
        self.html_into(&mut out, Charset::default(), EscapeMode::default());
        out
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.html())
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.attrs.iter()
    }
}

/// [§ 3.2.6.6 Embedding custom non-visible data](https://html.spec.whatwg.org/multipage/dom.html#embedding-custom-non-visible-data-with-the-data-*-attributes)
///
/// A view over the `data-*` attributes of an [`Attributes`] set. Keys are read
/// without the prefix and written with it; every change lands in the backing
/// set.
#[derive(Debug)]
pub struct Dataset<'a> {
    attributes: &'a mut Attributes,
}

impl Dataset<'_> {
    /// The value of `data-{key}`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .attribute(&format!("{DATA_PREFIX}{key}"))
            .map(Attribute::value)
    }

    /// Set `data-{key}`, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if `key` is empty.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) -> DomResult<Option<String>> {
        if key.trim().is_empty() {
            return Err(DomError::InvalidArgument(
                "dataset key must not be empty".to_string(),
            ));
        }
        let data_key = format!("{DATA_PREFIX}{key}");
        let previous = self.attributes.attribute(&data_key).map(|a| a.value.clone());
        self.attributes.put(&data_key, value)?;
        Ok(previous)
    }

    /// Remove `data-{key}`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.attributes
            .remove(&format!("{DATA_PREFIX}{key}"))
            .map(|a| a.value)
    }

    /// Number of `data-*` attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.data_attributes().count()
    }

    /// Returns true if there are no `data-*` attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate as `(key without prefix, value)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.data_attributes()
    }
}
