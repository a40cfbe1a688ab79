//! Element queries.
//!
//! Each `get_elements_*` method builds an [`Evaluator`] and hands it to
//! [`DomTree::collect`], which walks the subtree in document order and keeps
//! the elements that match. [`DomTree::select`] does the same for a query
//! string.

mod evaluator;
mod query;

pub use evaluator::{Evaluator, compile};

use crate::error::DomResult;
use crate::tree::DomTree;
use crate::NodeId;

impl DomTree {
    /// Every element in the subtree of `root` (including `root`) that
    /// `evaluator` accepts, in document order and without duplicates.
    #[must_use]
    pub fn collect(&self, root: NodeId, evaluator: &Evaluator) -> Vec<NodeId> {
        self.descendants(root)
            .filter(|&id| evaluator.matches(self, root, id))
            .collect()
    }

    /// Run a query such as `div.note > a[href]` against the subtree of `root`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`](crate::DomError::InvalidArgument)
    /// if the query cannot be parsed, or
    /// [`DomError::Pattern`](crate::DomError::Pattern) for a bad `~=` pattern.
    pub fn select(&self, root: NodeId, query: &str) -> DomResult<Vec<NodeId>> {
        let evaluator = query::parse(query)?;
        Ok(self.collect(root, &evaluator))
    }

    /// The first element matching `query`, if any.
    ///
    /// # Errors
    ///
    /// As [`select`](Self::select).
    pub fn select_first(&self, root: NodeId, query: &str) -> DomResult<Option<NodeId>> {
        let evaluator = query::parse(query)?;
        Ok(self
            .descendants(root)
            .find(|&id| evaluator.matches(self, root, id)))
    }

    /// Elements with the given tag name.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error if the name is empty.
    pub fn get_elements_by_tag(&self, root: NodeId, tag_name: &str) -> DomResult<Vec<NodeId>> {
        Ok(self.collect(root, &Evaluator::tag(tag_name)?))
    }

    /// The first element with the given `id`.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error if the id is empty.
    pub fn get_element_by_id(&self, root: NodeId, id: &str) -> DomResult<Option<NodeId>> {
        let evaluator = Evaluator::id(id)?;
        Ok(self
            .descendants(root)
            .find(|&node| evaluator.matches(self, root, node)))
    }

    /// Elements carrying the class, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error if the class name is empty.
    pub fn get_elements_by_class(&self, root: NodeId, class_name: &str) -> DomResult<Vec<NodeId>> {
        Ok(self.collect(root, &Evaluator::class(class_name)?))
    }

    /// Elements with the attribute.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error if the key is empty.
    pub fn get_elements_by_attribute(&self, root: NodeId, key: &str) -> DomResult<Vec<NodeId>> {
        Ok(self.collect(root, &Evaluator::attribute(key)?))
    }

    /// Elements with an attribute whose key starts with `prefix`, such as
    /// `data-`.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error if the prefix is empty.
    pub fn get_elements_by_attribute_starting(
        &self,
        root: NodeId,
        prefix: &str,
    ) -> DomResult<Vec<NodeId>> {
        Ok(self.collect(root, &Evaluator::attribute_starting(prefix)?))
    }

    /// Elements whose attribute equals `value`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error if the key is empty.
    pub fn get_elements_by_attribute_value(
        &self,
        root: NodeId,
        key: &str,
        value: &str,
    ) -> DomResult<Vec<NodeId>> {
        Ok(self.collect(root, &Evaluator::attribute_value(key, value)?))
    }

    /// Elements whose attribute is absent or differs from `value`.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error if the key is empty.
    pub fn get_elements_by_attribute_value_not(
        &self,
        root: NodeId,
        key: &str,
        value: &str,
    ) -> DomResult<Vec<NodeId>> {
        Ok(self.collect(root, &Evaluator::attribute_value_not(key, value)?))
    }

    /// Elements whose attribute starts with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error if the key is empty.
    pub fn get_elements_by_attribute_value_starting(
        &self,
        root: NodeId,
        key: &str,
        prefix: &str,
    ) -> DomResult<Vec<NodeId>> {
        Ok(self.collect(root, &Evaluator::attribute_value_starting(key, prefix)?))
    }

    /// Elements whose attribute ends with `suffix`.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error if the key is empty.
    pub fn get_elements_by_attribute_value_ending(
        &self,
        root: NodeId,
        key: &str,
        suffix: &str,
    ) -> DomResult<Vec<NodeId>> {
        Ok(self.collect(root, &Evaluator::attribute_value_ending(key, suffix)?))
    }

    /// Elements whose attribute contains `part`.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error if the key is empty.
    pub fn get_elements_by_attribute_value_containing(
        &self,
        root: NodeId,
        key: &str,
        part: &str,
    ) -> DomResult<Vec<NodeId>> {
        Ok(self.collect(root, &Evaluator::attribute_value_containing(key, part)?))
    }

    /// Elements whose attribute matches the regular expression.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error if the key is empty, or a pattern
    /// error if the expression does not compile.
    pub fn get_elements_by_attribute_value_matching(
        &self,
        root: NodeId,
        key: &str,
        pattern: &str,
    ) -> DomResult<Vec<NodeId>> {
        Ok(self.collect(root, &Evaluator::attribute_value_matching(key, pattern)?))
    }

    /// Elements whose element sibling index is below `index`.
    #[must_use]
    pub fn get_elements_by_index_less_than(&self, root: NodeId, index: usize) -> Vec<NodeId> {
        self.collect(root, &Evaluator::IndexLessThan(index))
    }

    /// Elements whose element sibling index is above `index`.
    #[must_use]
    pub fn get_elements_by_index_greater_than(&self, root: NodeId, index: usize) -> Vec<NodeId> {
        self.collect(root, &Evaluator::IndexGreaterThan(index))
    }

    /// Elements whose element sibling index equals `index`.
    #[must_use]
    pub fn get_elements_by_index_equals(&self, root: NodeId, index: usize) -> Vec<NodeId> {
        self.collect(root, &Evaluator::IndexEquals(index))
    }

    /// Elements whose text contains `search`, ignoring case.
    #[must_use]
    pub fn get_elements_containing_text(&self, root: NodeId, search: &str) -> Vec<NodeId> {
        self.collect(root, &Evaluator::contains_text(search))
    }

    /// Elements whose own text contains `search`, ignoring case.
    #[must_use]
    pub fn get_elements_containing_own_text(&self, root: NodeId, search: &str) -> Vec<NodeId> {
        self.collect(root, &Evaluator::contains_own_text(search))
    }

    /// Elements whose text matches the regular expression.
    ///
    /// # Errors
    ///
    /// Returns a pattern error if the expression does not compile.
    pub fn get_elements_matching_text(&self, root: NodeId, pattern: &str) -> DomResult<Vec<NodeId>> {
        Ok(self.collect(root, &Evaluator::matches_text(pattern)?))
    }

    /// Elements whose own text matches the regular expression.
    ///
    /// # Errors
    ///
    /// Returns a pattern error if the expression does not compile.
    pub fn get_elements_matching_own_text(
        &self,
        root: NodeId,
        pattern: &str,
    ) -> DomResult<Vec<NodeId>> {
        Ok(self.collect(root, &Evaluator::matches_own_text(pattern)?))
    }

    /// Every element in the subtree, `root` included if it is one.
    #[must_use]
    pub fn get_all_elements(&self, root: NodeId) -> Vec<NodeId> {
        self.collect(root, &Evaluator::AllElements)
    }
}
