//! Markup serialization.
//!
//! [§ 13.3 Serializing HTML fragments](https://html.spec.whatwg.org/multipage/parsing.html#serialising-html-fragments)
//!
//! Serialization is a [`NodeVisitor`]: the opening part of a node is written
//! on the way down (`head`), the closing part on the way back up (`tail`).
//! With pretty printing on, newlines and indentation are only inserted where
//! they cannot change what the markup renders as: around block-formatted
//! elements, and before text that starts a block.

use crate::entities::{self, Charset, EscapeMode};
use crate::node::NodeKind;
use crate::text::{is_blank, normalise_whitespace, trim};
use crate::traverse::NodeVisitor;
use crate::tree::DomTree;
use crate::NodeId;

/// How a tree is written back out as markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSettings {
    pretty_print: bool,
    outline: bool,
    indent_amount: usize,
    escape_mode: EscapeMode,
    charset: Charset,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            pretty_print: true,
            outline: false,
            indent_amount: 1,
            escape_mode: EscapeMode::Base,
            charset: Charset::Utf8,
        }
    }
}

impl OutputSettings {
    /// Insert newlines and indentation.
    #[must_use]
    pub const fn pretty_print(&self) -> bool {
        self.pretty_print
    }

    /// Put every element on its own line, not just block-formatted ones.
    #[must_use]
    pub const fn outline(&self) -> bool {
        self.outline
    }

    /// Spaces per indentation level.
    #[must_use]
    pub const fn indent_amount(&self) -> usize {
        self.indent_amount
    }

    /// Which named references text and attribute values may use.
    #[must_use]
    pub const fn escape_mode(&self) -> EscapeMode {
        self.escape_mode
    }

    /// Output encoding; characters it cannot hold become numeric references.
    #[must_use]
    pub const fn charset(&self) -> Charset {
        self.charset
    }

    /// Builder: enable or disable pretty printing.
    #[must_use]
    pub const fn with_pretty_print(mut self, pretty_print: bool) -> Self {
        self.pretty_print = pretty_print;
        self
    }

    /// Builder: enable or disable outline mode.
    #[must_use]
    pub const fn with_outline(mut self, outline: bool) -> Self {
        self.outline = outline;
        self
    }

    /// Builder: set the indentation per level.
    #[must_use]
    pub const fn with_indent_amount(mut self, indent_amount: usize) -> Self {
        self.indent_amount = indent_amount;
        self
    }

    /// Builder: set the escape mode.
    #[must_use]
    pub const fn with_escape_mode(mut self, escape_mode: EscapeMode) -> Self {
        self.escape_mode = escape_mode;
        self
    }

    /// Builder: set the output charset.
    #[must_use]
    pub const fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    fn indent(&self, out: &mut String, depth: usize) {
        out.push('\n');
        out.extend(std::iter::repeat_n(' ', depth * self.indent_amount));
    }

    fn escape(&self, text: &str) -> String {
        entities::escape(text, self.charset, self.escape_mode)
    }
}

/// Writes nodes into a shared buffer.
struct HtmlWriter<'a> {
    out: &'a mut String,
    settings: &'a OutputSettings,
}

impl HtmlWriter<'_> {
    fn element_head(&mut self, tree: &DomTree, id: NodeId, depth: usize) {
        let node = tree.node(id);
        let Some(data) = node.as_element() else {
            return;
        };
        let settings = self.settings;
        let parent_formats_block = node.parent.is_some_and(|p| tree.formats_as_block(p));
        if !self.out.is_empty()
            && settings.pretty_print
            && (data.tag.format_as_block() || parent_formats_block || settings.outline)
        {
            settings.indent(self.out, depth);
        }
        self.out.push('<');
        self.out.push_str(data.tag.name());
        if let Some(attributes) = &node.attributes {
            attributes.html_into(self.out, settings.charset, settings.escape_mode);
        }
        if node.children.is_empty() && data.tag.is_self_closing() {
            self.out.push_str(" />");
        } else {
            self.out.push('>');
        }
    }

    fn element_tail(&mut self, tree: &DomTree, id: NodeId, depth: usize) {
        let node = tree.node(id);
        let Some(data) = node.as_element() else {
            return;
        };
        let children = &node.children;
        if children.is_empty() && data.tag.is_self_closing() {
            return;
        }
        let settings = self.settings;
        let single_non_text =
            children.len() == 1 && !matches!(tree.kind(children[0]), NodeKind::Text(_));
        if settings.pretty_print
            && !children.is_empty()
            && (data.tag.format_as_block()
                || (settings.outline && (children.len() > 1 || single_non_text)))
        {
            settings.indent(self.out, depth);
        }
        self.out.push_str("</");
        self.out.push_str(data.tag.name());
        self.out.push('>');
    }

    fn text(&mut self, tree: &DomTree, id: NodeId, text: &str, depth: usize) {
        let settings = self.settings;
        let parent = tree.parent(id);
        let mut html = settings.escape(text);
        if settings.pretty_print
            && parent.is_some_and(|p| tree.node(p).is_container() && !tree.preserve_whitespace(p))
        {
            html = normalise_whitespace(&html);
        }

        let blank = is_blank(text);
        let starts_block = tree.sibling_index(id) == 0
            && parent.is_some_and(|p| tree.formats_as_block(p))
            && !blank;
        let outlined = settings.outline && !tree.sibling_nodes(id).is_empty() && !blank;
        if settings.pretty_print && (starts_block || outlined) {
            settings.indent(self.out, depth);
        }
        self.out.push_str(&html);
    }
}

impl NodeVisitor for HtmlWriter<'_> {
    fn head(&mut self, tree: &DomTree, id: NodeId, depth: usize) {
        match tree.kind(id) {
            NodeKind::Document => {}
            NodeKind::Element(_) => self.element_head(tree, id, depth),
            NodeKind::Text(text) => self.text(tree, id, text, depth),
            NodeKind::Data(data) => self.out.push_str(data),
            NodeKind::Comment(data) => {
                if self.settings.pretty_print {
                    self.settings.indent(self.out, depth);
                }
                self.out.push_str("<!--");
                self.out.push_str(data);
                self.out.push_str("-->");
            }
            NodeKind::Doctype(doctype) => {
                self.out.push_str("<!DOCTYPE ");
                self.out.push_str(&doctype.name);
                if !is_blank(&doctype.public_id) {
                    self.out.push_str(" PUBLIC \"");
                    self.out.push_str(&doctype.public_id);
                    self.out.push('"');
                }
                if !is_blank(&doctype.system_id) {
                    self.out.push_str(" \"");
                    self.out.push_str(&doctype.system_id);
                    self.out.push('"');
                }
                self.out.push('>');
            }
        }
    }

    fn tail(&mut self, tree: &DomTree, id: NodeId, depth: usize) {
        if tree.is_element(id) {
            self.element_tail(tree, id, depth);
        }
    }
}

impl DomTree {
    /// The Document counts as a block-formatted container.
    pub(crate) fn formats_as_block(&self, id: NodeId) -> bool {
        match self.kind(id) {
            NodeKind::Document => true,
            NodeKind::Element(data) => data.tag.format_as_block(),
            _ => false,
        }
    }

    /// Returns true if text directly inside `id` keeps its whitespace: the
    /// element or its parent is a whitespace-preserving tag such as `<pre>`.
    pub(crate) fn preserve_whitespace(&self, id: NodeId) -> bool {
        let preserves = |id: NodeId| {
            self.as_element(id)
                .is_some_and(|data| data.tag.preserve_whitespace())
        };
        self.is_element(id) && (preserves(id) || self.parent(id).is_some_and(preserves))
    }

    fn write_outer_html(&self, id: NodeId, settings: &OutputSettings, out: &mut String) {
        let mut writer = HtmlWriter { out, settings };
        self.traverse(id, &mut writer);
    }

    /// The markup of a node and its descendants, using the tree's output
    /// settings. For the Document this is the markup of its children.
    #[must_use]
    pub fn outer_html(&self, id: NodeId) -> String {
        self.outer_html_with(id, self.output_settings())
    }

    /// As [`outer_html`](Self::outer_html), with explicit settings.
    #[must_use]
    pub fn outer_html_with(&self, id: NodeId, settings: &OutputSettings) -> String {
        if matches!(self.kind(id), NodeKind::Document) {
            return self.html_with(id, settings);
        }
        let mut out = String::new();
        self.write_outer_html(id, settings, &mut out);
        out
    }

    /// The markup of a node's children, trimmed.
    #[must_use]
    pub fn html(&self, id: NodeId) -> String {
        self.html_with(id, self.output_settings())
    }

    /// As [`html`](Self::html), with explicit settings.
    #[must_use]
    pub fn html_with(&self, id: NodeId, settings: &OutputSettings) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_outer_html(child, settings, &mut out);
        }
        trim(&out).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::DoctypeData;

    fn compact() -> OutputSettings {
        OutputSettings::default().with_pretty_print(false)
    }

    #[test]
    fn test_defaults() {
        let settings = OutputSettings::default();
        assert!(settings.pretty_print());
        assert!(!settings.outline());
        assert_eq!(settings.indent_amount(), 1);
        assert_eq!(settings.escape_mode(), EscapeMode::Base);
        assert_eq!(settings.charset(), Charset::Utf8);
    }

    #[test]
    fn test_void_element_self_closes() {
        let mut tree = DomTree::new();
        let p = tree.create_element("p", "").unwrap();
        let br = tree.create_element("br", "").unwrap();
        let img = tree.create_element("img", "").unwrap();
        tree.set_attr(img, "src", "a.png").unwrap();
        tree.append_children(p, &[br, img]).unwrap();
        assert_eq!(
            tree.outer_html_with(p, &compact()),
            r#"<p><br /><img src="a.png" /></p>"#
        );
    }

    #[test]
    fn test_leaf_kinds() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div", "").unwrap();
        let comment = tree.create_comment(" note ", "");
        let script = tree.create_element("script", "").unwrap();
        let data = tree.create_data("if (a < b && c) {}", "");
        let text = tree.create_text("1 < 2 & \"q\"", "");
        tree.append_child(script, data).unwrap();
        tree.append_children(div, &[comment, script, text]).unwrap();
        assert_eq!(
            tree.outer_html_with(div, &compact()),
            "<div><!-- note --><script>if (a < b && c) {}</script>1 &lt; 2 &amp; &quot;q&quot;</div>"
        );
    }

    #[test]
    fn test_doctype() {
        let mut tree = DomTree::new();
        let doctype = tree.create_doctype(
            DoctypeData {
                name: "html".into(),
                public_id: "-//W3C//DTD XHTML 1.0 Strict//EN".into(),
                system_id: String::new(),
            },
            "",
        );
        assert_eq!(
            tree.outer_html(doctype),
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN">"#
        );
    }

    #[test]
    fn test_pretty_print_blocks() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div", "").unwrap();
        let p = tree.create_element("p", "").unwrap();
        let text = tree.create_text("Hello", "");
        tree.append_child(NodeId::ROOT, div).unwrap();
        tree.append_child(div, p).unwrap();
        tree.append_child(p, text).unwrap();
        assert_eq!(tree.outer_html(div), "<div>\n <p>Hello</p>\n</div>");

        tree.set_output_settings(OutputSettings::default().with_indent_amount(4));
        assert_eq!(tree.outer_html(div), "<div>\n    <p>Hello</p>\n</div>");
    }

    #[test]
    fn test_outline_mode() {
        let mut tree = DomTree::new();
        let p = tree.create_element("p", "").unwrap();
        for word in ["a", "b"] {
            let span = tree.append_element(p, "span").unwrap();
            let _ = tree.append_text(span, word).unwrap();
        }
        assert_eq!(tree.outer_html(p), "<p><span>a</span><span>b</span></p>");

        let outlined = OutputSettings::default().with_outline(true);
        assert_eq!(
            tree.outer_html_with(p, &outlined),
            "<p>\n <span>a</span>\n <span>b</span>\n</p>"
        );
    }
}
