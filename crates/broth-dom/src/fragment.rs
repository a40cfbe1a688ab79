//! Seam to the markup parser.

use std::fmt;

use crate::error::DomResult;
use crate::tree::DomTree;
use crate::NodeId;

/// Turns markup into detached nodes of an existing tree.
///
/// The tree never parses on its own: operations that take markup
/// (`append_html`, `set_html`, `before_html`, `wrap`, ...) hand it to the
/// parser installed with [`DomTree::set_fragment_parser`].
pub trait FragmentParser: Send + Sync + fmt::Debug {
    /// Parse `html` as the content of an element named `context` (or of
    /// `<body>` when there is none), allocate the resulting nodes in `tree`
    /// with `base_uri`, and return the top-level nodes in order. The returned
    /// nodes must be detached.
    ///
    /// # Errors
    ///
    /// Returns an error if the markup cannot be read.
    fn parse_fragment(
        &self,
        html: &str,
        context: Option<&str>,
        base_uri: &str,
        tree: &mut DomTree,
    ) -> DomResult<Vec<NodeId>>;
}

impl DomTree {
    /// Parse `html` with the installed parser, in the context of `context`
    /// (an element whose tag name sets the parsing context and whose base URI
    /// resolves relative links).
    pub(crate) fn parse_fragment_in(
        &mut self,
        html: &str,
        context: Option<NodeId>,
        base_uri: &str,
    ) -> DomResult<Vec<NodeId>> {
        let parser = self.fragment_parser()?;
        let context_tag = context
            .and_then(|id| self.as_element(id))
            .map(|data| data.tag().name().to_string());
        let nodes = parser.parse_fragment(html, context_tag.as_deref(), base_uri, self)?;
        tracing::trace!(count = nodes.len(), context = ?context_tag, "parsed fragment");
        Ok(nodes)
    }
}
