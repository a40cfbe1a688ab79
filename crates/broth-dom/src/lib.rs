//! Mutable HTML document tree for broth.
//!
//! This crate provides an arena-based document tree following the
//! [DOM Living Standard](https://dom.spec.whatwg.org/), together with the
//! pieces needed to work with it as markup:
//!
//! - [`entities`]: named and numeric character references.
//! - [`attributes`]: ordered, case-insensitive attribute sets with a `data-*` view.
//! - [`DomTree`]: the arena, its mutation primitives, the element query and
//!   text surface, and the pretty-printing serializer.
//! - [`select`]: predicate construction and document-order collection.
//! - [`form`]: form control registration and submission data.
//!
//! # Design
//!
//! The tree uses arena allocation with [`NodeId`] indices for all relationships.
//! A node id can be listed in at most one `children` vector, and every
//! mutation renumbers the cached sibling indices it disturbs before returning.
//!
//! Turning text into a tree is left to a [`FragmentParser`]; the `broth-html`
//! crate provides one.

pub mod attributes;
pub mod entities;
mod element;
mod error;
pub mod form;
mod fragment;
mod mutation;
mod node;
pub mod select;
mod serialize;
mod tag;
mod text;
mod traverse;
mod tree;

pub use attributes::{Attribute, Attributes, Dataset};
pub use entities::{Charset, EscapeMode};
pub use error::{DomError, DomResult};
pub use form::{FormSubmission, KeyVal, Method};
pub use fragment::FragmentParser;
pub use node::{DoctypeData, ElementData, Node, NodeKind};
pub use select::Evaluator;
pub use serialize::OutputSettings;
pub use tag::Tag;
pub use traverse::{Descendants, NodeVisitor};
pub use tree::{Ancestors, DomTree};

/// A type-safe index into a [`DomTree`].
///
/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
/// "Each node has an associated node document..."
///
/// Ids are only meaningful for the tree that issued them. Nodes are never
/// freed, so an id stays valid for the lifetime of its tree even after the
/// node is detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root document node is always at index 0.
    pub const ROOT: Self = Self(0);
}
