//! Text, data, comment and doctype leaves.
//!
//! [§ 4.10 Interface Text](https://dom.spec.whatwg.org/#interface-text)

use crate::entities;
use crate::error::{DomError, DomResult};
use crate::node::{DoctypeData, NodeKind};
use crate::tree::DomTree;
use crate::NodeId;

/// [§ 4.3.1 ASCII whitespace](https://infra.spec.whatwg.org/#ascii-whitespace)
///
/// "ASCII whitespace is U+0009 TAB, U+000A LF, U+000C FF, U+000D CR, or
/// U+0020 SPACE."
pub(crate) const fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0C' | '\r')
}

/// True if `text` is empty or only whitespace.
pub(crate) fn is_blank(text: &str) -> bool {
    text.chars().all(is_whitespace)
}

/// Collapse every run of whitespace into a single space. Leading and
/// trailing runs are collapsed too, not removed.
pub(crate) fn normalise_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_white = false;
    for c in text.chars() {
        if is_whitespace(c) {
            if !last_was_white {
                out.push(' ');
                last_was_white = true;
            }
        } else {
            out.push(c);
            last_was_white = false;
        }
    }
    out
}

/// Strip leading and trailing spaces and control characters.
pub(crate) fn trim(text: &str) -> &str {
    text.trim_matches(|c: char| c <= ' ')
}

pub(crate) fn ends_with_whitespace(text: &str) -> bool {
    text.ends_with(' ')
}

impl DomTree {
    /// Create a text node from escaped markup text, resolving character
    /// references (`&lt;` becomes `<`).
    pub fn create_text_from_encoded(&mut self, encoded: &str, base_uri: &str) -> NodeId {
        let text = entities::unescape(encoded);
        self.create_text(&text, base_uri)
    }

    /// Create a data node from escaped text.
    pub fn create_data_from_encoded(&mut self, encoded: &str, base_uri: &str) -> NodeId {
        let data = entities::unescape(encoded);
        self.create_data(&data, base_uri)
    }

    /// The text of a text node, whitespace untouched. `""` for other kinds.
    #[must_use]
    pub fn whole_text(&self, id: NodeId) -> &str {
        match &self.node(id).kind {
            NodeKind::Text(text) => text,
            _ => "",
        }
    }

    /// The text of a text node with whitespace collapsed.
    #[must_use]
    pub fn normalized_text(&self, id: NodeId) -> String {
        normalise_whitespace(self.whole_text(id))
    }

    /// Replace the text of a text node.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if `id` is not a text node.
    pub fn set_whole_text(&mut self, id: NodeId, text: &str) -> DomResult<()> {
        match &mut self.node_mut(id).kind {
            NodeKind::Text(existing) => {
                text.clone_into(existing);
                Ok(())
            }
            _ => Err(DomError::invalid("not a text node")),
        }
    }

    /// True if a text node holds only whitespace. Always false for other
    /// kinds.
    #[must_use]
    pub fn is_blank(&self, id: NodeId) -> bool {
        match &self.node(id).kind {
            NodeKind::Text(text) => is_blank(text),
            _ => false,
        }
    }

    /// Split a text node in two at `offset` (counted in characters).
    ///
    /// The node keeps the text before `offset`; a new text node holding the
    /// rest is inserted right after it (if it has a parent) and returned.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if `id` is not a text node or
    /// `offset` is not less than its length.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> DomResult<NodeId> {
        let NodeKind::Text(text) = &self.node(id).kind else {
            return Err(DomError::invalid("not a text node"));
        };
        let length = text.chars().count();
        if offset >= length {
            return Err(DomError::invalid(format!(
                "split offset {offset} must be less than text length {length}"
            )));
        }
        let byte_offset = text
            .char_indices()
            .nth(offset)
            .map_or(text.len(), |(index, _)| index);
        let tail = text[byte_offset..].to_string();
        let head = text[..byte_offset].to_string();

        let base_uri = self.base_uri(id).to_string();
        let new_node = self.create_text(&tail, &base_uri);
        self.set_whole_text(id, &head)?;
        if self.parent(id).is_some() {
            self.after(id, new_node)?;
        }
        Ok(new_node)
    }

    /// The payload of a data node. `""` for other kinds.
    #[must_use]
    pub fn whole_data(&self, id: NodeId) -> &str {
        match &self.node(id).kind {
            NodeKind::Data(data) => data,
            _ => "",
        }
    }

    /// Replace the payload of a data node.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if `id` is not a data node.
    pub fn set_whole_data(&mut self, id: NodeId, data: &str) -> DomResult<()> {
        match &mut self.node_mut(id).kind {
            NodeKind::Data(existing) => {
                data.clone_into(existing);
                Ok(())
            }
            _ => Err(DomError::invalid("not a data node")),
        }
    }

    /// The content of a comment. `""` for other kinds.
    #[must_use]
    pub fn comment_data(&self, id: NodeId) -> &str {
        match &self.node(id).kind {
            NodeKind::Comment(data) => data,
            _ => "",
        }
    }

    /// The doctype payload, if `id` is a doctype.
    #[must_use]
    pub fn doctype(&self, id: NodeId) -> Option<&DoctypeData> {
        match &self.node(id).kind {
            NodeKind::Doctype(doctype) => Some(doctype),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_whitespace() {
        assert_eq!(normalise_whitespace("  a \n\t b  "), " a b ");
        assert_eq!(normalise_whitespace("abc"), "abc");
        assert!(is_blank(" \r\n\t"));
        assert!(is_blank(""));
        assert!(!is_blank(" x "));
    }

    #[test]
    fn test_split_text() {
        let mut tree = DomTree::new();
        let p = tree.create_element("p", "").unwrap();
        let text = tree.create_text("hello world", "");
        tree.append_child(p, text).unwrap();

        let tail = tree.split_text(text, 5).unwrap();
        assert_eq!(tree.whole_text(text), "hello");
        assert_eq!(tree.whole_text(tail), " world");
        assert_eq!(tree.children(p), &[text, tail]);
        assert_eq!(tree.sibling_index(tail), 1);
    }

    #[test]
    fn test_split_text_counts_characters() {
        let mut tree = DomTree::new();
        let text = tree.create_text("héllo", "");
        let tail = tree.split_text(text, 2).unwrap();
        assert_eq!(tree.whole_text(text), "hé");
        assert_eq!(tree.whole_text(tail), "llo");
        assert_eq!(tree.parent(tail), None);
    }

    #[test]
    fn test_split_text_bounds() {
        let mut tree = DomTree::new();
        let text = tree.create_text("abc", "");
        assert!(tree.split_text(text, 3).is_err());
        let p = tree.create_element("p", "").unwrap();
        assert!(tree.split_text(p, 0).is_err());
    }

    #[test]
    fn test_create_from_encoded() {
        let mut tree = DomTree::new();
        let text = tree.create_text_from_encoded("&lt;b&gt; &amp; &copy", "");
        assert_eq!(tree.whole_text(text), "<b> & \u{A9}");
        let data = tree.create_data_from_encoded("a &amp;&amp; b", "");
        assert_eq!(tree.whole_data(data), "a && b");
    }
}
