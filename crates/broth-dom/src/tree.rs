//! The arena and its read-only navigation surface.

use std::fmt;
use std::mem;
use std::sync::Arc;

use broth_common::url::resolve_url;

use crate::attributes::{Attribute, Attributes};
use crate::error::{DomError, DomResult};
use crate::fragment::FragmentParser;
use crate::node::{DoctypeData, ElementData, Node, NodeKind};
use crate::serialize::OutputSettings;
use crate::tag::Tag;
use crate::NodeId;

/// Attribute key prefix that asks for the absolute form of a URL attribute.
const ABS_PREFIX: &str = "abs:";

/// Arena-based document tree.
///
/// [§ 4 Nodes](https://dom.spec.whatwg.org/#nodes)
///
/// "The DOM represents a document as a tree."
///
/// All nodes live in one vector and refer to each other by [`NodeId`]. The
/// Document node is always at [`NodeId::ROOT`]. Nodes created with the
/// `create_*` methods start detached and are attached with the mutation
/// primitives; detaching never frees a slot.
///
/// Methods taking a [`NodeId`] panic if the id was not issued by this tree.
///
/// Cloning the tree gives a fully independent copy that can be handed to
/// another thread.
#[derive(Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
    settings: OutputSettings,
    parser: Option<Arc<dyn FragmentParser>>,
}

impl fmt::Debug for DomTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomTree")
            .field("nodes", &self.nodes.len())
            .field("settings", &self.settings)
            .field("parser", &self.parser.is_some())
            .finish()
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding only the Document node.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_uri("")
    }

    /// Create a tree whose Document node has the given base URI.
    #[must_use]
    pub fn with_base_uri(base_uri: &str) -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Document, base_uri)],
            settings: OutputSettings::default(),
            parser: None,
        }
    }

    /// Get the root document node ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by its ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get the number of nodes in the arena, attached or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the arena is empty (it always holds at least the Document).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Allocate a detached node.
    pub(crate) fn alloc(&mut self, kind: NodeKind, base_uri: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind, base_uri));
        id
    }

    pub(crate) fn alloc_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    // ===== Creation =====

    /// Create a detached element.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if the tag name is empty.
    pub fn create_element(&mut self, tag_name: &str, base_uri: &str) -> DomResult<NodeId> {
        let tag = Tag::value_of(tag_name)?;
        Ok(self.alloc(NodeKind::Element(ElementData::new(tag)), base_uri))
    }

    /// Create a detached element carrying `attributes`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if the tag name is empty.
    pub fn create_element_with(
        &mut self,
        tag_name: &str,
        base_uri: &str,
        attributes: Attributes,
    ) -> DomResult<NodeId> {
        let id = self.create_element(tag_name, base_uri)?;
        self.node_mut(id).attributes = Some(attributes);
        Ok(id)
    }

    /// Create a detached text node holding unescaped `text`.
    pub fn create_text(&mut self, text: &str, base_uri: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()), base_uri)
    }

    /// Create a detached data node (script or style payload).
    pub fn create_data(&mut self, data: &str, base_uri: &str) -> NodeId {
        self.alloc(NodeKind::Data(data.to_string()), base_uri)
    }

    /// Create a detached comment.
    pub fn create_comment(&mut self, data: &str, base_uri: &str) -> NodeId {
        self.alloc(NodeKind::Comment(data.to_string()), base_uri)
    }

    /// Create a detached doctype.
    pub fn create_doctype(&mut self, doctype: DoctypeData, base_uri: &str) -> NodeId {
        self.alloc(NodeKind::Doctype(doctype), base_uri)
    }

    // ===== Settings and collaborators =====

    /// Output settings used by serialization.
    #[must_use]
    pub const fn output_settings(&self) -> &OutputSettings {
        &self.settings
    }

    /// Mutable output settings.
    pub fn output_settings_mut(&mut self) -> &mut OutputSettings {
        &mut self.settings
    }

    /// Replace the output settings.
    pub fn set_output_settings(&mut self, settings: OutputSettings) {
        self.settings = settings;
    }

    /// Install the parser used by every operation that takes markup.
    pub fn set_fragment_parser(&mut self, parser: Arc<dyn FragmentParser>) {
        self.parser = Some(parser);
    }

    pub(crate) fn fragment_parser(&self) -> DomResult<Arc<dyn FragmentParser>> {
        self.parser.clone().ok_or(DomError::NoFragmentParser)
    }

    // ===== Node surface =====

    /// The kind payload of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    /// The node name: the tag name for elements, a `#` name otherwise.
    #[must_use]
    pub fn node_name(&self, id: NodeId) -> &str {
        match &self.node(id).kind {
            NodeKind::Document => "#document",
            NodeKind::Doctype(_) => "#doctype",
            NodeKind::Element(data) => data.tag.name(),
            NodeKind::Text(_) => "#text",
            NodeKind::Data(_) => "#data",
            NodeKind::Comment(_) => "#comment",
        }
    }

    /// Element payload, if `id` is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::as_element)
    }

    /// Returns true if `id` is an element.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_element)
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all child nodes of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// The child at `index`, if any.
    #[must_use]
    pub fn child_node(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    /// Number of child nodes.
    #[must_use]
    pub fn child_node_size(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    /// Get the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// Get the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Position of the node among its parent's children.
    #[must_use]
    pub fn sibling_index(&self, id: NodeId) -> usize {
        self.node(id).sibling_index
    }

    /// Get the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        self.child_node(parent, self.sibling_index(id) + 1)
    }

    /// Get the previous sibling of a node.
    #[must_use]
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.sibling_index(id).checked_sub(1)?;
        self.child_node(parent, index)
    }

    /// The parent's other children. Empty when detached.
    #[must_use]
    pub fn sibling_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.parent(id).map_or_else(Vec::new, |parent| {
            self.children(parent)
                .iter()
                .copied()
                .filter(|&sibling| sibling != id)
                .collect()
        })
    }

    /// Iterate over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            current: self.parent(id),
        }
    }

    /// [§ 4.2.6 Descendant](https://dom.spec.whatwg.org/#concept-tree-descendant)
    ///
    /// Check if `descendant` is a descendant of `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, descendant: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(descendant).any(|id| id == ancestor)
    }

    /// The Document this node is attached under, if any.
    #[must_use]
    pub fn owner_document(&self, id: NodeId) -> Option<NodeId> {
        let top = self.ancestors(id).last().unwrap_or(id);
        (top == NodeId::ROOT).then_some(NodeId::ROOT)
    }

    // ===== Attributes =====

    /// The attribute set, if one exists.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> Option<&Attributes> {
        self.node(id).attributes.as_ref()
    }

    /// Mutable access to the attribute set, creating it for leaf kinds on
    /// first use. Any cached class tokens are dropped.
    pub fn attributes_mut(&mut self, id: NodeId) -> &mut Attributes {
        let node = self.node_mut(id);
        if let NodeKind::Element(data) = &mut node.kind {
            data.invalidate_class_names();
        }
        node.attributes.get_or_insert_with(Attributes::new)
    }

    /// The value of an attribute, or `""`.
    ///
    /// A key starting with `abs:` (for example `abs:href`) returns the
    /// attribute resolved against the node's base URI.
    #[must_use]
    pub fn attr(&self, id: NodeId, key: &str) -> String {
        if let Some(attribute) = self.attributes(id).and_then(|a| a.attribute(key)) {
            return attribute.value().to_string();
        }
        match strip_abs_prefix(key) {
            Some(key) => self.abs_url(id, key),
            None => String::new(),
        }
    }

    /// Set an attribute.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if the key is empty.
    pub fn set_attr(&mut self, id: NodeId, key: &str, value: &str) -> DomResult<()> {
        let attribute = Attribute::new(key, value)?;
        self.attributes_mut(id).put_attribute(attribute);
        Ok(())
    }

    /// Returns true if the attribute is set. For `abs:` keys, also requires
    /// that it resolves to an absolute URL.
    #[must_use]
    pub fn has_attr(&self, id: NodeId, key: &str) -> bool {
        let has_key = |key: &str| self.attributes(id).is_some_and(|a| a.has_key(key));
        if let Some(stripped) = strip_abs_prefix(key)
            && has_key(stripped)
            && !self.abs_url(id, stripped).is_empty()
        {
            return true;
        }
        has_key(key)
    }

    /// Remove an attribute, returning it.
    pub fn remove_attr(&mut self, id: NodeId, key: &str) -> Option<Attribute> {
        if self.attributes(id).is_none_or(|a| !a.has_key(key)) {
            return None;
        }
        self.attributes_mut(id).remove(key)
    }

    /// Resolve a URL attribute against the node's base URI.
    ///
    /// Returns `""` if the attribute is missing or cannot be made absolute.
    #[must_use]
    pub fn abs_url(&self, id: NodeId, key: &str) -> String {
        let Some(relative) = self.attributes(id).and_then(|a| a.attribute(key)) else {
            return String::new();
        };
        resolve_url(relative.value(), self.base_uri(id)).unwrap_or_default()
    }

    // ===== Base URI =====

    /// The node's base URI.
    #[must_use]
    pub fn base_uri(&self, id: NodeId) -> &str {
        &self.node(id).base_uri
    }

    /// Set the base URI of a node and all of its descendants.
    pub fn set_base_uri(&mut self, id: NodeId, base_uri: &str) {
        let base_uri = base_uri.trim();
        let subtree: Vec<NodeId> = self.descendants(id).collect();
        for node in subtree {
            base_uri.clone_into(&mut self.node_mut(node).base_uri);
        }
    }

    // ===== Document helpers =====

    /// [§ 3.1.1 The document element](https://html.spec.whatwg.org/multipage/dom.html#the-html-element-2)
    ///
    /// "The document element of a document is the element whose parent is that
    /// document, if it exists; otherwise null."
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(NodeId::ROOT)
            .iter()
            .copied()
            .find(|&id| self.is_element(id))
    }

    /// [§ 3.1.4 The head element](https://html.spec.whatwg.org/multipage/dom.html#the-head-element-2)
    ///
    /// "The head element of a document is the first head element that is a
    /// child of the html element, if there is one, or null otherwise."
    #[must_use]
    pub fn head(&self) -> Option<NodeId> {
        self.first_child_element_named(self.document_element()?, &["head"])
    }

    /// [§ 3.1.3 The body element](https://html.spec.whatwg.org/multipage/dom.html#the-body-element-2)
    ///
    /// "The body element of a document is the first of the html element's children
    /// that is either a body element or a frameset element, or null if there is
    /// no such element."
    #[must_use]
    pub fn body(&self) -> Option<NodeId> {
        self.first_child_element_named(self.document_element()?, &["body", "frameset"])
    }

    /// The normalized text of the first `<title>` element, or `""`.
    #[must_use]
    pub fn title(&self) -> String {
        self.descendants(NodeId::ROOT)
            .find(|&id| self.as_element(id).is_some_and(|e| e.tag.name() == "title"))
            .map(|title| self.text(title))
            .unwrap_or_default()
    }

    fn first_child_element_named(&self, parent: NodeId, names: &[&str]) -> Option<NodeId> {
        self.children(parent).iter().copied().find(|&id| {
            self.as_element(id)
                .is_some_and(|e| names.contains(&e.tag.name()))
        })
    }

    // ===== Compaction =====

    /// Free the slots of nodes nothing can reach any more, renumbering the
    /// rest in their original order.
    ///
    /// Detaching never frees a slot, so markup edits (`set_html`, `wrap`,
    /// `clone_node`, ...) grow the arena for as long as the tree lives. A node
    /// survives if it belongs to the same tree (topmost ancestor and all its
    /// descendants) as the Document, a node in `keep`, or a control
    /// registered with a surviving form.
    ///
    /// Every [`NodeId`] held from before the call is invalidated. The returned
    /// table maps each old index to its new id, or `None` if it was freed.
    pub fn compact(&mut self, keep: &[NodeId]) -> Vec<Option<NodeId>> {
        let mut live = vec![false; self.nodes.len()];
        let mut pending: Vec<NodeId> = keep.iter().copied().chain([NodeId::ROOT]).collect();
        while let Some(id) = pending.pop() {
            let top = self.ancestors(id).last().unwrap_or(id);
            if live[top.0] {
                continue;
            }
            for node in self.descendants(top) {
                live[node.0] = true;
                if let Some(controls) = self
                    .as_element(node)
                    .and_then(|data| data.form_controls.as_deref())
                {
                    pending.extend_from_slice(controls);
                }
            }
        }

        let mut map = Vec::with_capacity(live.len());
        let mut next = 0;
        for &alive in &live {
            if alive {
                map.push(Some(NodeId(next)));
                next += 1;
            } else {
                map.push(None);
            }
        }

        // Parents, children and controls of a live node are live themselves.
        let nodes = mem::take(&mut self.nodes);
        self.nodes = nodes
            .into_iter()
            .zip(&live)
            .filter(|&(_, &alive)| alive)
            .map(|(mut node, _)| {
                node.parent = node.parent.and_then(|parent| map[parent.0]);
                node.children = node.children.iter().filter_map(|child| map[child.0]).collect();
                if let NodeKind::Element(data) = &mut node.kind
                    && let Some(controls) = &mut data.form_controls
                {
                    *controls = controls.iter().filter_map(|control| map[control.0]).collect();
                }
                node
            })
            .collect();
        tracing::debug!(before = map.len(), after = self.nodes.len(), "compacted arena");
        map
    }
}

fn strip_abs_prefix(key: &str) -> Option<&str> {
    key.get(..ABS_PREFIX.len())
        .filter(|prefix| prefix.eq_ignore_ascii_case(ABS_PREFIX))
        .map(|_| &key[ABS_PREFIX.len()..])
}

/// Iterator over ancestors of a node.
#[derive(Debug)]
pub struct Ancestors<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tree_has_document() {
        let tree = DomTree::new();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.node_name(tree.root()), "#document");
        assert_eq!(tree.owner_document(NodeId::ROOT), Some(NodeId::ROOT));
    }

    #[test]
    fn test_attr_case_insensitive() {
        let mut tree = DomTree::new();
        let a = tree.create_element("a", "").unwrap();
        tree.set_attr(a, "HREF", "x").unwrap();
        assert!(tree.has_attr(a, "href"));
        assert_eq!(tree.attr(a, "Href"), "x");
        assert!(tree.remove_attr(a, "hReF").is_some());
        assert!(!tree.has_attr(a, "href"));
    }

    #[test]
    fn test_abs_attr() {
        let mut tree = DomTree::new();
        let a = tree.create_element("a", "http://example.com/dir/page.html").unwrap();
        tree.set_attr(a, "href", "../other.html").unwrap();
        assert_eq!(tree.attr(a, "abs:href"), "http://example.com/other.html");
        assert!(tree.has_attr(a, "abs:href"));
        assert!(!tree.has_attr(a, "abs:src"));
        assert_eq!(tree.attr(a, "abs:src"), "");
    }

    #[test]
    fn test_leaf_attributes_are_lazy() {
        let mut tree = DomTree::new();
        let text = tree.create_text("hi", "");
        assert!(tree.attributes(text).is_none());
        assert_eq!(tree.attr(text, "x"), "");
        tree.set_attr(text, "x", "1").unwrap();
        assert_eq!(tree.attr(text, "x"), "1");
    }

    #[test]
    fn test_detached_navigation() {
        let mut tree = DomTree::new();
        let p = tree.create_element("p", "").unwrap();
        assert_eq!(tree.parent(p), None);
        assert_eq!(tree.next_sibling(p), None);
        assert_eq!(tree.previous_sibling(p), None);
        assert!(tree.sibling_nodes(p).is_empty());
        assert_eq!(tree.owner_document(p), None);
    }
}
