//! Structural mutation primitives.
//!
//! [§ 4.2.3 Mutation algorithms](https://dom.spec.whatwg.org/#mutation-algorithms)
//!
//! Every primitive here leaves the tree satisfying two rules:
//! - a node id is listed in at most one `children` vector, and its `parent`
//!   link names that vector's owner;
//! - every attached node's cached `sibling_index` equals its position.
//!
//! Inserting a node that already has a parent moves it: it is detached from
//! the old parent first. Validation happens before any change, so a failed
//! call leaves the tree untouched.

use std::collections::{HashMap, HashSet};

use broth_common::warning::warn_once;

use crate::error::{DomError, DomResult};
use crate::node::NodeKind;
use crate::tree::DomTree;
use crate::NodeId;

impl DomTree {
    // ===== Internal bookkeeping =====

    /// Renumber `parent`'s children from position `from` onwards.
    fn reindex_children(&mut self, parent: NodeId, from: usize) {
        let children = self.node(parent).children.clone();
        for (index, &child) in children.iter().enumerate().skip(from) {
            self.node_mut(child).sibling_index = index;
        }
    }

    /// Unlink `child` from its parent, if it has one.
    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.node(child).parent else {
            return;
        };
        let index = self.node(child).sibling_index;
        debug_assert_eq!(self.node(parent).children.get(index), Some(&child));
        let _ = self.node_mut(parent).children.remove(index);
        self.reindex_children(parent, index);
        let node = self.node_mut(child);
        node.parent = None;
        node.sibling_index = 0;
    }

    /// [§ 4.2.3 Ensure pre-insertion validity](https://dom.spec.whatwg.org/#concept-node-ensure-pre-insertion-validity)
    fn check_insert(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let refuse = |reason| {
            Err(DomError::HierarchyRequest {
                parent,
                node: child,
                reason,
            })
        };
        if !self.node(parent).is_container() {
            return refuse("only documents and elements can have children");
        }
        if matches!(self.node(child).kind, NodeKind::Document) {
            return refuse("a document cannot be inserted");
        }
        // "If node is a host-including inclusive ancestor of parent, then throw"
        if child == parent || self.is_descendant_of(parent, child) {
            return refuse("a node cannot be inserted into itself or its descendants");
        }
        Ok(())
    }

    // ===== Children =====

    /// [§ 4.2.3 Append](https://dom.spec.whatwg.org/#concept-node-append)
    ///
    /// "To append a node to a parent, pre-insert node into parent before null."
    ///
    /// Appends `child` as the last child of `parent`, moving it from its old
    /// parent if it has one.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::HierarchyRequest`] if `parent` cannot hold children
    /// or the move would create a cycle.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.check_insert(parent, child)?;
        self.detach(child);
        let index = self.node(parent).children.len();
        self.node_mut(parent).children.push(child);
        let node = self.node_mut(child);
        node.parent = Some(parent);
        node.sibling_index = index;
        Ok(())
    }

    /// Append several children in order.
    ///
    /// # Errors
    ///
    /// As [`insert_children`](Self::insert_children).
    pub fn append_children(&mut self, parent: NodeId, children: &[NodeId]) -> DomResult<()> {
        self.insert_children(parent, -1, children)
    }

    /// Insert `child` as the first child of `parent`.
    ///
    /// # Errors
    ///
    /// As [`append_child`](Self::append_child).
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_children(parent, 0, &[child])
    }

    /// Insert `nodes`, in order, at position `index` of `parent`'s children.
    ///
    /// A negative index counts from the end: `-1` appends, `-2` inserts
    /// before the last child, and so on. Nodes that already have a parent are
    /// moved.
    ///
    /// # Errors
    ///
    /// - [`DomError::IndexOutOfBounds`] if the normalized index is outside
    ///   `0..=len`.
    /// - [`DomError::InvalidArgument`] if a node is listed twice.
    /// - [`DomError::HierarchyRequest`] if any insertion is invalid.
    pub fn insert_children(
        &mut self,
        parent: NodeId,
        index: isize,
        nodes: &[NodeId],
    ) -> DomResult<()> {
        let len = self.node(parent).children.len();
        let position = if index < 0 {
            index.checked_add_unsigned(len + 1)
        } else {
            Some(index)
        };
        let mut position = match position.and_then(|p| usize::try_from(p).ok()) {
            Some(p) if p <= len => p,
            _ => return Err(DomError::IndexOutOfBounds { index, len }),
        };

        let mut seen = HashSet::with_capacity(nodes.len());
        for &node in nodes {
            if !seen.insert(node) {
                return Err(DomError::invalid(format!("node {node:?} listed twice")));
            }
            self.check_insert(parent, node)?;
        }

        for &node in nodes {
            // Pulling an earlier sibling out shifts the insertion point left.
            if self.node(node).parent == Some(parent) && self.node(node).sibling_index < position {
                position -= 1;
            }
            self.detach(node);
        }

        let _ = self
            .node_mut(parent)
            .children
            .splice(position..position, nodes.iter().copied());
        for &node in nodes {
            self.node_mut(node).parent = Some(parent);
        }
        self.reindex_children(parent, position);
        Ok(())
    }

    /// Detach a node from its parent. The node keeps its own children.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::NoParent`] if the node is already detached.
    pub fn remove(&mut self, id: NodeId) -> DomResult<()> {
        if self.node(id).parent.is_none() {
            return Err(DomError::NoParent(id));
        }
        self.detach(id);
        Ok(())
    }

    /// Detach every child of `id`.
    pub fn empty(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.node_mut(id).children);
        for child in children {
            let node = self.node_mut(child);
            node.parent = None;
            node.sibling_index = 0;
        }
    }

    /// Put `replacement` where `old` is in `parent`'s children. `old` ends up
    /// detached; `replacement` is moved if it was attached elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::NotAChild`] if `old` is not a child of `parent`,
    /// or [`DomError::HierarchyRequest`] if the replacement is invalid.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        old: NodeId,
        replacement: NodeId,
    ) -> DomResult<()> {
        if self.node(old).parent != Some(parent) {
            return Err(DomError::NotAChild { parent, child: old });
        }
        if old == replacement {
            return Ok(());
        }
        self.check_insert(parent, replacement)?;
        self.detach(replacement);

        let index = self.node(old).sibling_index;
        self.node_mut(parent).children[index] = replacement;
        let node = self.node_mut(replacement);
        node.parent = Some(parent);
        node.sibling_index = index;
        let node = self.node_mut(old);
        node.parent = None;
        node.sibling_index = 0;
        Ok(())
    }

    /// Replace `id` in the tree with `replacement`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::NoParent`] if `id` is detached, or the errors of
    /// [`replace_child`](Self::replace_child).
    pub fn replace_with(&mut self, id: NodeId, replacement: NodeId) -> DomResult<()> {
        let parent = self.node(id).parent.ok_or(DomError::NoParent(id))?;
        self.replace_child(parent, id, replacement)
    }

    // ===== Siblings =====

    /// Insert `node` immediately before `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::NoParent`] if `id` is detached.
    pub fn before(&mut self, id: NodeId, node: NodeId) -> DomResult<()> {
        let (parent, index) = self.position_of(id)?;
        self.insert_children(parent, index, &[node])
    }

    /// Insert `node` immediately after `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::NoParent`] if `id` is detached.
    pub fn after(&mut self, id: NodeId, node: NodeId) -> DomResult<()> {
        let (parent, index) = self.position_of(id)?;
        self.insert_children(parent, index + 1, &[node])
    }

    /// Parse `html` and insert the result immediately before `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::NoParent`] if `id` is detached, or a parse error.
    pub fn before_html(&mut self, id: NodeId, html: &str) -> DomResult<()> {
        let (parent, index) = self.position_of(id)?;
        let nodes = self.parse_sibling_html(id, parent, html)?;
        self.insert_children(parent, index, &nodes)
    }

    /// Parse `html` and insert the result immediately after `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::NoParent`] if `id` is detached, or a parse error.
    pub fn after_html(&mut self, id: NodeId, html: &str) -> DomResult<()> {
        let (parent, index) = self.position_of(id)?;
        let nodes = self.parse_sibling_html(id, parent, html)?;
        self.insert_children(parent, index + 1, &nodes)
    }

    /// Parent and live sibling index of an attached node.
    fn position_of(&self, id: NodeId) -> DomResult<(NodeId, isize)> {
        let node = self.node(id);
        let parent = node.parent.ok_or(DomError::NoParent(id))?;
        let index = isize::try_from(node.sibling_index)
            .map_err(|_| DomError::invalid("sibling index overflow"))?;
        Ok((parent, index))
    }

    fn parse_sibling_html(
        &mut self,
        id: NodeId,
        parent: NodeId,
        html: &str,
    ) -> DomResult<Vec<NodeId>> {
        let base_uri = self.base_uri(id).to_string();
        self.parse_fragment_in(html, Some(parent), &base_uri)
    }

    // ===== Wrap / unwrap =====

    /// Wrap `id` in the element parsed from `html`.
    ///
    /// The first top-level node of the fragment becomes the wrapper and
    /// takes `id`'s place. `id` is appended to the deepest element reached by
    /// following first element children, so `<div><p></p></div>` puts it in
    /// the `<p>`. Any further top-level fragment nodes are appended to the
    /// wrapper after that chain.
    ///
    /// Returns `Ok(None)`, leaving the tree unchanged, if the fragment does
    /// not start with an element. The parsed nodes are still allocated in
    /// that case; [`compact`](Self::compact) frees them.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if `html` is empty,
    /// [`DomError::NoParent`] if `id` is detached, or a parse error.
    pub fn wrap(&mut self, id: NodeId, html: &str) -> DomResult<Option<NodeId>> {
        if html.is_empty() {
            return Err(DomError::invalid("wrap markup must not be empty"));
        }
        let parent = self.node(id).parent.ok_or(DomError::NoParent(id))?;
        let nodes = self.parse_sibling_html(id, parent, html)?;

        let Some((&wrapper, remainder)) = nodes.split_first() else {
            warn_once("Dom", "wrap markup produced no nodes; nothing to wrap with");
            return Ok(None);
        };
        if !self.is_element(wrapper) {
            warn_once("Dom", "wrap markup does not start with an element; nothing to wrap with");
            return Ok(None);
        }

        let deepest = self.deepest_first_element(wrapper);
        self.replace_child(parent, id, wrapper)?;
        self.append_child(deepest, id)?;
        for &node in remainder {
            self.append_child(wrapper, node)?;
        }
        tracing::debug!(node = id.0, wrapper = wrapper.0, "wrapped node");
        Ok(Some(id))
    }

    fn deepest_first_element(&self, element: NodeId) -> NodeId {
        let mut deepest = element;
        while let Some(first) = self
            .children(deepest)
            .iter()
            .copied()
            .find(|&child| self.is_element(child))
        {
            deepest = first;
        }
        deepest
    }

    /// Remove `id` but keep its children, which take its place among its
    /// former siblings.
    ///
    /// Returns the former first child, if there was one.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::NoParent`] if `id` is detached.
    pub fn unwrap(&mut self, id: NodeId) -> DomResult<Option<NodeId>> {
        let (parent, index) = self.position_of(id)?;
        let children = self.node(id).children.clone();
        self.insert_children(parent, index, &children)?;
        self.detach(id);
        tracing::debug!(node = id.0, moved = children.len(), "unwrapped node");
        Ok(children.first().copied())
    }

    // ===== Copies =====

    /// Deep-copy the subtree rooted at `id` into this arena.
    ///
    /// The copy is detached. Attribute sets are copied, children are copied
    /// recursively and point at their copied parents, and form control lists
    /// inside the copy refer to the copied controls.
    pub fn clone_node(&mut self, id: NodeId) -> NodeId {
        let originals: Vec<NodeId> = self.descendants(id).collect();
        let mut mapping = HashMap::with_capacity(originals.len());
        for &original in &originals {
            let mut copy = self.node(original).clone();
            copy.parent = None;
            copy.children.clear();
            let _ = mapping.insert(original, self.alloc_node(copy));
        }

        for &original in &originals {
            let copy = mapping[&original];
            let children: Vec<NodeId> = self
                .node(original)
                .children
                .iter()
                .map(|child| mapping[child])
                .collect();
            for &child in &children {
                self.node_mut(child).parent = Some(copy);
            }
            let node = self.node_mut(copy);
            node.children = children;
            if let NodeKind::Element(data) = &mut node.kind
                && let Some(controls) = &mut data.form_controls
            {
                for control in controls.iter_mut() {
                    if let Some(&copied) = mapping.get(control) {
                        *control = copied;
                    }
                }
            }
        }

        let root = mapping[&id];
        self.node_mut(root).sibling_index = 0;
        root
    }

    /// Deep copies of each child of `id`, detached.
    pub fn child_nodes_copy(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = self.node(id).children.clone();
        children
            .into_iter()
            .map(|child| self.clone_node(child))
            .collect()
    }
}
