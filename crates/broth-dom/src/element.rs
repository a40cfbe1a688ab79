//! The element surface: identity, navigation, building, text, classes and
//! form values.
//!
//! [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element)

use crate::attributes::Dataset;
use crate::error::{DomError, DomResult};
use crate::node::{ElementData, NodeKind};
use crate::tag::Tag;
use crate::text::{ends_with_whitespace, is_blank, is_whitespace, normalise_whitespace, trim};
use crate::traverse::NodeVisitor;
use crate::tree::DomTree;
use crate::NodeId;

/// Concatenates text for [`DomTree::text`].
struct TextAccumulator {
    out: String,
}

impl NodeVisitor for TextAccumulator {
    fn head(&mut self, tree: &DomTree, id: NodeId, _depth: usize) {
        match tree.kind(id) {
            NodeKind::Text(text) => append_normalised_text(tree, &mut self.out, id, text),
            NodeKind::Element(data) => {
                if !self.out.is_empty()
                    && (data.tag.is_block() || data.tag.name() == "br")
                    && !ends_with_whitespace(&self.out)
                {
                    self.out.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn append_normalised_text(tree: &DomTree, out: &mut String, id: NodeId, text: &str) {
    if tree.parent(id).is_some_and(|p| tree.preserve_whitespace(p)) {
        out.push_str(text);
        return;
    }
    let normalised = normalise_whitespace(text);
    if ends_with_whitespace(out) {
        out.push_str(normalised.trim_start_matches(is_whitespace));
    } else {
        out.push_str(&normalised);
    }
}

/// Split a class attribute into unique tokens, in order.
fn tokenize_classes(value: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in value.split(is_whitespace).filter(|name| !name.is_empty()) {
        if !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    }
    names
}

impl DomTree {
    fn element_data(&self, id: NodeId) -> DomResult<&ElementData> {
        self.as_element(id)
            .ok_or_else(|| DomError::invalid(format!("node {id:?} is not an element")))
    }

    // ===== Identity =====

    /// The element's tag name; for other kinds, the node name.
    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> &str {
        self.node_name(id)
    }

    /// The element's tag, if `id` is an element.
    #[must_use]
    pub fn tag(&self, id: NodeId) -> Option<&Tag> {
        self.as_element(id).map(ElementData::tag)
    }

    /// Rename an element.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if `id` is not an element or
    /// the name is empty.
    pub fn set_tag_name(&mut self, id: NodeId, tag_name: &str) -> DomResult<()> {
        let tag = Tag::value_of(tag_name)?;
        match &mut self.node_mut(id).kind {
            NodeKind::Element(data) => {
                if tag.name() == "form" && data.form_controls.is_none() {
                    data.form_controls = Some(Vec::new());
                }
                data.tag = tag;
                Ok(())
            }
            _ => Err(DomError::invalid(format!("node {id:?} is not an element"))),
        }
    }

    /// Returns true for block level elements.
    #[must_use]
    pub fn is_block(&self, id: NodeId) -> bool {
        self.tag(id).is_some_and(Tag::is_block)
    }

    /// The `id` attribute, or `""`.
    #[must_use]
    pub fn element_id(&self, id: NodeId) -> String {
        self.attr(id, "id")
    }

    /// A live view of the element's `data-*` attributes.
    pub fn dataset(&mut self, id: NodeId) -> Dataset<'_> {
        self.attributes_mut(id).dataset()
    }

    // ===== Navigation =====

    /// Element ancestors, nearest first.
    #[must_use]
    pub fn parents(&self, id: NodeId) -> Vec<NodeId> {
        self.ancestors(id).filter(|&a| self.is_element(a)).collect()
    }

    /// Child elements, skipping other node kinds.
    #[must_use]
    pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.is_element(child))
            .collect()
    }

    /// The child element at `index`, counting elements only.
    #[must_use]
    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.child_elements(id).get(index).copied()
    }

    /// Direct text children.
    #[must_use]
    pub fn text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.children_of_kind(id, |kind| matches!(kind, NodeKind::Text(_)))
    }

    /// Direct data children.
    #[must_use]
    pub fn data_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.children_of_kind(id, |kind| matches!(kind, NodeKind::Data(_)))
    }

    fn children_of_kind(&self, id: NodeId, wanted: impl Fn(&NodeKind) -> bool) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| wanted(self.kind(child)))
            .collect()
    }

    /// The parent's element children, including `id`. Empty when detached.
    fn element_siblings_and_self(&self, id: NodeId) -> Vec<NodeId> {
        self.parent(id)
            .map(|parent| self.child_elements(parent))
            .unwrap_or_default()
    }

    /// The other element children of the parent.
    #[must_use]
    pub fn sibling_elements(&self, id: NodeId) -> Vec<NodeId> {
        let mut siblings = self.element_siblings_and_self(id);
        siblings.retain(|&sibling| sibling != id);
        siblings
    }

    /// Position among the parent's element children; 0 when detached.
    #[must_use]
    pub fn element_sibling_index(&self, id: NodeId) -> usize {
        self.element_siblings_and_self(id)
            .iter()
            .position(|&sibling| sibling == id)
            .unwrap_or(0)
    }

    /// The next element sibling.
    #[must_use]
    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.element_siblings_and_self(id);
        let index = siblings.iter().position(|&sibling| sibling == id)?;
        siblings.get(index + 1).copied()
    }

    /// The previous element sibling.
    #[must_use]
    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.element_siblings_and_self(id);
        let index = siblings.iter().position(|&sibling| sibling == id)?;
        index.checked_sub(1).and_then(|i| siblings.get(i).copied())
    }

    /// The first element child of the parent (possibly `id` itself), or
    /// `None` when `id` has no element siblings.
    #[must_use]
    pub fn first_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.element_siblings_and_self(id);
        if siblings.len() > 1 { siblings.first().copied() } else { None }
    }

    /// The last element child of the parent (possibly `id` itself), or
    /// `None` when `id` has no element siblings.
    #[must_use]
    pub fn last_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.element_siblings_and_self(id);
        if siblings.len() > 1 { siblings.last().copied() } else { None }
    }

    // ===== Building =====

    /// Create an element with the parent's base URI and append it.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag name is empty or `parent` cannot hold
    /// children.
    pub fn append_element(&mut self, parent: NodeId, tag_name: &str) -> DomResult<NodeId> {
        let base_uri = self.base_uri(parent).to_string();
        let child = self.create_element(tag_name, &base_uri)?;
        self.append_child(parent, child)?;
        Ok(child)
    }

    /// Create an element with the parent's base URI and prepend it.
    ///
    /// # Errors
    ///
    /// As [`append_element`](Self::append_element).
    pub fn prepend_element(&mut self, parent: NodeId, tag_name: &str) -> DomResult<NodeId> {
        let base_uri = self.base_uri(parent).to_string();
        let child = self.create_element(tag_name, &base_uri)?;
        self.prepend_child(parent, child)?;
        Ok(child)
    }

    /// Create a text node and append it.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` cannot hold children.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> DomResult<NodeId> {
        let base_uri = self.base_uri(parent).to_string();
        let child = self.create_text(text, &base_uri);
        self.append_child(parent, child)?;
        Ok(child)
    }

    /// Create a text node and prepend it.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` cannot hold children.
    pub fn prepend_text(&mut self, parent: NodeId, text: &str) -> DomResult<NodeId> {
        let base_uri = self.base_uri(parent).to_string();
        let child = self.create_text(text, &base_uri);
        self.prepend_child(parent, child)?;
        Ok(child)
    }

    /// Parse `html` in the context of `parent` and append the result.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::NoFragmentParser`] if no parser is installed, or
    /// the parser's error.
    pub fn append_html(&mut self, parent: NodeId, html: &str) -> DomResult<Vec<NodeId>> {
        let nodes = self.parse_child_html(parent, html)?;
        self.append_children(parent, &nodes)?;
        Ok(nodes)
    }

    /// Parse `html` in the context of `parent` and prepend the result.
    ///
    /// # Errors
    ///
    /// As [`append_html`](Self::append_html).
    pub fn prepend_html(&mut self, parent: NodeId, html: &str) -> DomResult<Vec<NodeId>> {
        let nodes = self.parse_child_html(parent, html)?;
        self.insert_children(parent, 0, &nodes)?;
        Ok(nodes)
    }

    fn parse_child_html(&mut self, parent: NodeId, html: &str) -> DomResult<Vec<NodeId>> {
        let base_uri = self.base_uri(parent).to_string();
        self.parse_fragment_in(html, Some(parent), &base_uri)
    }

    /// Replace the children of `id` with the parsed `html`. Relative links
    /// in the markup resolve against `id`'s base URI.
    ///
    /// The old children stay allocated, detached; see
    /// [`compact`](Self::compact).
    ///
    /// # Errors
    ///
    /// As [`append_html`](Self::append_html). The children are only removed
    /// once parsing has succeeded.
    pub fn set_html(&mut self, id: NodeId, html: &str) -> DomResult<()> {
        let nodes = self.parse_child_html(id, html)?;
        self.empty(id);
        self.append_children(id, &nodes)
    }

    /// Replace the children of `id` with a single text node.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` cannot hold children.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> DomResult<()> {
        if !self.node(id).is_container() {
            return Err(DomError::invalid(format!("node {id:?} cannot hold text")));
        }
        self.empty(id);
        let _ = self.append_text(id, text)?;
        Ok(())
    }

    // ===== Text =====

    /// The combined text of `id` and its descendants.
    ///
    /// Whitespace runs collapse to one space, and a space separates block
    /// elements and `<br>`s from the text around them. Text inside a
    /// whitespace-preserving element (such as `<pre>`) is kept verbatim.
    /// The result is trimmed.
    ///
    /// For `<p>Hello <b>there</b> now!</p>` this is `"Hello there now!"`.
    #[must_use]
    pub fn text(&self, id: NodeId) -> String {
        let mut accumulator = TextAccumulator { out: String::new() };
        self.traverse(id, &mut accumulator);
        trim(&accumulator.out).to_string()
    }

    /// The text of the direct text children of `id` only.
    ///
    /// For `<p>Hello <b>there</b> now!</p>` this is `"Hello now!"`.
    #[must_use]
    pub fn own_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            match self.kind(child) {
                NodeKind::Text(text) => append_normalised_text(self, &mut out, child, text),
                NodeKind::Element(data) if data.tag.name() == "br" => {
                    if !ends_with_whitespace(&out) {
                        out.push(' ');
                    }
                }
                _ => {}
            }
        }
        trim(&out).to_string()
    }

    /// Returns true if any descendant text node is not blank.
    #[must_use]
    pub fn has_text(&self, id: NodeId) -> bool {
        self.descendants(id).skip(1).any(|node| match self.kind(node) {
            NodeKind::Text(text) => !is_blank(text),
            _ => false,
        })
    }

    /// The combined payload of descendant data nodes (script and style
    /// content).
    #[must_use]
    pub fn data(&self, id: NodeId) -> String {
        self.descendants(id)
            .filter_map(|node| match self.kind(node) {
                NodeKind::Data(data) => Some(data.as_str()),
                _ => None,
            })
            .collect()
    }

    // ===== Classes =====

    /// The raw `class` attribute, or `""`.
    #[must_use]
    pub fn class_name(&self, id: NodeId) -> String {
        self.attr(id, "class")
    }

    /// The class tokens, in order and without duplicates.
    ///
    /// Tokens are computed on first use and cached until the element's
    /// attributes are next written.
    #[must_use]
    pub fn class_names(&self, id: NodeId) -> &[String] {
        let Some(data) = self.as_element(id) else {
            return &[];
        };
        data.class_names.get_or_init(|| {
            let value = self
                .attributes(id)
                .map_or("", |attributes| attributes.get("class"));
            tokenize_classes(value)
        })
    }

    /// Overwrite the `class` attribute with `names`, joined by spaces.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if `id` is not an element.
    pub fn set_class_names<I, S>(&mut self, id: NodeId, names: I) -> DomResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let _ = self.element_data(id)?;
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if !name.is_empty() && !unique.iter().any(|existing| existing == name) {
                unique.push(name.to_string());
            }
        }
        self.set_attr(id, "class", &unique.join(" "))
    }

    /// Returns true if the element has the class, ignoring ASCII case.
    #[must_use]
    pub fn has_class(&self, id: NodeId, class_name: &str) -> bool {
        self.class_names(id)
            .iter()
            .any(|name| name.eq_ignore_ascii_case(class_name))
    }

    /// Add a class if it is not already present.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if `id` is not an element.
    pub fn add_class(&mut self, id: NodeId, class_name: &str) -> DomResult<()> {
        let mut names = self.class_names(id).to_vec();
        names.push(class_name.to_string());
        self.set_class_names(id, names)
    }

    /// Remove a class.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if `id` is not an element.
    pub fn remove_class(&mut self, id: NodeId, class_name: &str) -> DomResult<()> {
        let mut names = self.class_names(id).to_vec();
        names.retain(|name| name != class_name);
        self.set_class_names(id, names)
    }

    /// Add the class if absent, remove it if present.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if `id` is not an element.
    pub fn toggle_class(&mut self, id: NodeId, class_name: &str) -> DomResult<()> {
        if self.class_names(id).iter().any(|name| name == class_name) {
            self.remove_class(id, class_name)
        } else {
            self.add_class(id, class_name)
        }
    }

    // ===== Form values =====

    /// The value of a form control: the text of a `<textarea>`, otherwise the
    /// `value` attribute.
    #[must_use]
    pub fn val(&self, id: NodeId) -> String {
        if self.tag_name(id) == "textarea" {
            self.text(id)
        } else {
            self.attr(id, "value")
        }
    }

    /// Set the value of a form control; see [`val`](Self::val).
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if `id` is not an element.
    pub fn set_val(&mut self, id: NodeId, value: &str) -> DomResult<()> {
        let _ = self.element_data(id)?;
        if self.tag_name(id) == "textarea" {
            self.set_text(id, value)
        } else {
            self.set_attr(id, "value", value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `<p>Hello <b>there</b> now!</p>`
    fn hello(tree: &mut DomTree) -> (NodeId, NodeId) {
        let p = tree.append_element(NodeId::ROOT, "p").unwrap();
        let _ = tree.append_text(p, "Hello ").unwrap();
        let b = tree.append_element(p, "b").unwrap();
        let _ = tree.append_text(b, "there").unwrap();
        let _ = tree.append_text(p, " now!").unwrap();
        (p, b)
    }

    #[test]
    fn test_text_and_own_text() {
        let mut tree = DomTree::new();
        let (p, b) = hello(&mut tree);
        assert_eq!(tree.text(p), "Hello there now!");
        assert_eq!(tree.own_text(p), "Hello now!");
        assert_eq!(tree.text(b), "there");
    }

    #[test]
    fn test_text_block_boundaries() {
        let mut tree = DomTree::new();
        let div = tree.append_element(NodeId::ROOT, "div").unwrap();
        let _ = tree.append_text(div, "one").unwrap();
        let p = tree.append_element(div, "p").unwrap();
        let _ = tree.append_text(p, "two").unwrap();
        let _ = tree.append_element(div, "br").unwrap();
        let _ = tree.append_text(div, "  three \n four ").unwrap();
        assert_eq!(tree.text(div), "one two three four");
    }

    #[test]
    fn test_text_preserves_pre() {
        let mut tree = DomTree::new();
        let div = tree.append_element(NodeId::ROOT, "div").unwrap();
        let pre = tree.append_element(div, "pre").unwrap();
        let _ = tree.append_text(pre, "  a\n   b").unwrap();
        assert_eq!(tree.text(pre), "a\n   b");
        assert_eq!(tree.own_text(pre), "a\n   b");
    }

    #[test]
    fn test_has_text_and_data() {
        let mut tree = DomTree::new();
        let div = tree.append_element(NodeId::ROOT, "div").unwrap();
        let _ = tree.append_text(div, "  \n ").unwrap();
        assert!(!tree.has_text(div));
        let script = tree.append_element(div, "script").unwrap();
        let data = tree.create_data("var a = 1;", "");
        tree.append_child(script, data).unwrap();
        assert!(!tree.has_text(div));
        assert_eq!(tree.data(div), "var a = 1;");
        let span = tree.append_element(div, "span").unwrap();
        let _ = tree.append_text(span, "x").unwrap();
        assert!(tree.has_text(div));
    }

    #[test]
    fn test_class_mutation() {
        let mut tree = DomTree::new();
        let div = tree.append_element(NodeId::ROOT, "div").unwrap();
        tree.set_attr(div, "class", " one  two one ").unwrap();
        assert_eq!(tree.class_names(div), ["one", "two"]);
        assert!(tree.has_class(div, "TWO"));

        tree.add_class(div, "three").unwrap();
        tree.remove_class(div, "one").unwrap();
        tree.toggle_class(div, "two").unwrap();
        tree.toggle_class(div, "four").unwrap();
        assert_eq!(tree.class_name(div), "three four");
    }

    #[test]
    fn test_class_cache_follows_raw_writes() {
        let mut tree = DomTree::new();
        let div = tree.append_element(NodeId::ROOT, "div").unwrap();
        tree.set_attr(div, "class", "a").unwrap();
        assert!(tree.has_class(div, "a"));
        tree.set_attr(div, "class", "b").unwrap();
        assert!(!tree.has_class(div, "a"));
        assert!(tree.has_class(div, "b"));
        tree.attributes_mut(div).put("class", "c").unwrap();
        assert_eq!(tree.class_names(div), ["c"]);
    }

    #[test]
    fn test_val() {
        let mut tree = DomTree::new();
        let input = tree.append_element(NodeId::ROOT, "input").unwrap();
        let textarea = tree.append_element(NodeId::ROOT, "textarea").unwrap();
        tree.set_val(input, "one").unwrap();
        tree.set_val(textarea, "two").unwrap();
        assert_eq!(tree.attr(input, "value"), "one");
        assert_eq!(tree.val(input), "one");
        assert!(!tree.has_attr(textarea, "value"));
        assert_eq!(tree.val(textarea), "two");
    }

    #[test]
    fn test_element_siblings() {
        let mut tree = DomTree::new();
        let ul = tree.append_element(NodeId::ROOT, "ul").unwrap();
        let _ = tree.append_text(ul, " ").unwrap();
        let a = tree.append_element(ul, "li").unwrap();
        let _ = tree.append_text(ul, " ").unwrap();
        let b = tree.append_element(ul, "li").unwrap();
        let c = tree.append_element(ul, "li").unwrap();

        assert_eq!(tree.element_sibling_index(b), 1);
        assert_eq!(tree.sibling_index(b), 3);
        assert_eq!(tree.next_element_sibling(a), Some(b));
        assert_eq!(tree.previous_element_sibling(a), None);
        assert_eq!(tree.previous_element_sibling(c), Some(b));
        assert_eq!(tree.first_element_sibling(c), Some(a));
        assert_eq!(tree.last_element_sibling(a), Some(c));
        assert_eq!(tree.sibling_elements(b), [a, c]);
        assert_eq!(tree.child(ul, 2), Some(c));
        assert_eq!(tree.text_nodes(ul).len(), 2);
        assert_eq!(tree.parents(a), [ul]);
    }

    #[test]
    fn test_set_tag_name_and_dataset() {
        let mut tree = DomTree::new();
        let div = tree.append_element(NodeId::ROOT, "div").unwrap();
        tree.set_tag_name(div, "SECTION").unwrap();
        assert_eq!(tree.tag_name(div), "section");
        assert!(tree.is_block(div));

        let _ = tree.dataset(div).insert("role", "main").unwrap();
        assert_eq!(tree.attr(div, "data-role"), "main");
        assert_eq!(tree.dataset(div).get("role"), Some("main"));
    }

    #[test]
    fn test_set_text_replaces_children() {
        let mut tree = DomTree::new();
        let (p, b) = hello(&mut tree);
        tree.set_text(p, "plain").unwrap();
        assert_eq!(tree.child_node_size(p), 1);
        assert_eq!(tree.parent(b), None);
        assert_eq!(tree.text(p), "plain");
    }
}
