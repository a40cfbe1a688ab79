//! Node storage.
//!
//! [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
//!
//! "Node is an abstract interface that is used by all nodes in a tree."
//!
//! Every node kind lives in the same arena slot type, [`Node`]; the kind
//! specific payload is the closed [`NodeKind`] sum. Behaviour is implemented
//! on [`DomTree`](crate::DomTree), which owns the arena.

use std::sync::OnceLock;

use crate::NodeId;
use crate::attributes::Attributes;
use crate::tag::Tag;

/// One slot of the arena.
///
/// The parent link is navigation only: ownership flows down through
/// `children`, and a node id appears in at most one `children` list.
#[derive(Debug, Clone)]
pub struct Node {
    /// "Each node has an associated node type"
    pub(crate) kind: NodeKind,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-parent)
    /// "An object that participates in a tree has a parent, which is either
    /// null or an object."
    pub(crate) parent: Option<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-child)
    /// "A node has an associated list of children"
    pub(crate) children: Vec<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-index)
    /// "The index of an object is its number of preceding siblings, or 0 if
    /// it has none."
    ///
    /// Cached; every mutation renumbers the siblings it shifts.
    pub(crate) sibling_index: usize,

    /// Base for resolving relative URLs in attributes.
    pub(crate) base_uri: String,

    /// Always present on elements. Leaf kinds only get a set once something
    /// writes an attribute to them.
    pub(crate) attributes: Option<Attributes>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, base_uri: &str) -> Self {
        let attributes = matches!(kind, NodeKind::Element(_)).then(Attributes::new);
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            sibling_index: 0,
            base_uri: base_uri.trim().to_string(),
            attributes,
        }
    }

    /// The kind specific payload.
    #[must_use]
    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The parent, if attached.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The children in order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Position among the parent's children.
    #[must_use]
    pub const fn sibling_index(&self) -> usize {
        self.sibling_index
    }

    /// The base URI.
    #[must_use]
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// The attribute set, if one has been materialized.
    #[must_use]
    pub const fn attributes(&self) -> Option<&Attributes> {
        self.attributes.as_ref()
    }

    /// Element payload, if this is an element.
    #[must_use]
    pub const fn as_element(&self) -> Option<&ElementData> {
        match &self.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Returns true for element nodes.
    #[must_use]
    pub const fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_))
    }

    /// Returns true for kinds that may hold children.
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Document | NodeKind::Element(_))
    }
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Each node has an associated node type"
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// [§ 4.5 Interface Document](https://dom.spec.whatwg.org/#interface-document)
    ///
    /// The root of a parsed document. Only ever at [`NodeId::ROOT`].
    Document,
    /// [§ 4.6 Interface DocumentType](https://dom.spec.whatwg.org/#interface-documenttype)
    Doctype(DoctypeData),
    /// [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element)
    Element(ElementData),
    /// [§ 4.10 Interface Text](https://dom.spec.whatwg.org/#interface-text)
    ///
    /// Stored unescaped; whitespace is kept as parsed.
    Text(String),
    /// Raw script or style payload. Never normalized, never escaped.
    Data(String),
    /// [§ 4.7 Interface Comment](https://dom.spec.whatwg.org/#interface-comment)
    Comment(String),
}

/// "Doctypes have an associated name, public ID, and system ID."
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctypeData {
    /// The doctype name, usually `html`.
    pub name: String,
    /// The public identifier, or empty.
    pub public_id: String,
    /// The system identifier, or empty.
    pub system_id: String,
}

/// Element payload: the tag plus derived and form state.
#[derive(Debug, Clone)]
pub struct ElementData {
    pub(crate) tag: Tag,

    /// Tokens of the `class` attribute, in order and without duplicates.
    /// Reset by every attribute write on the element.
    pub(crate) class_names: OnceLock<Vec<String>>,

    /// Controls registered with a `<form>` element, in registration order.
    /// This list is independent of the children.
    pub(crate) form_controls: Option<Vec<NodeId>>,
}

impl ElementData {
    pub(crate) fn new(tag: Tag) -> Self {
        let form_controls = (tag.name() == "form").then(Vec::new);
        Self {
            tag,
            class_names: OnceLock::new(),
            form_controls,
        }
    }

    /// The element's tag.
    #[must_use]
    pub const fn tag(&self) -> &Tag {
        &self.tag
    }

    /// Returns true if this element can collect form controls.
    #[must_use]
    pub const fn is_form(&self) -> bool {
        self.form_controls.is_some()
    }

    pub(crate) fn invalidate_class_names(&mut self) {
        self.class_names = OnceLock::new();
    }
}
