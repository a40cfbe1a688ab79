//! Depth-first traversal.
//!
//! [§ 4.2 Node tree](https://dom.spec.whatwg.org/#concept-tree-order)
//!
//! "An object A is preceding an object B if A and B are in the same tree and A
//! comes before B in tree order." Tree order is a pre-order, depth-first walk.

use crate::tree::DomTree;
use crate::NodeId;

/// Callbacks for [`DomTree::traverse`].
///
/// `head` runs when a node is first reached, `tail` after all of its
/// descendants have been visited. `depth` is relative to the traversal root.
pub trait NodeVisitor {
    /// Called on entry to `id`.
    fn head(&mut self, tree: &DomTree, id: NodeId, depth: usize);

    /// Called on exit from `id`.
    fn tail(&mut self, tree: &DomTree, id: NodeId, depth: usize) {
        let _ = (tree, id, depth);
    }
}

impl DomTree {
    /// Walk the subtree rooted at `root` depth first, calling `visitor`'s
    /// `head` and `tail` for every node.
    ///
    /// The walk is iterative, so deep trees cannot overflow the stack.
    pub fn traverse<V: NodeVisitor + ?Sized>(&self, root: NodeId, visitor: &mut V) {
        let mut node = root;
        let mut depth = 0;
        loop {
            visitor.head(self, node, depth);
            if let Some(first) = self.first_child(node) {
                node = first;
                depth += 1;
                continue;
            }
            loop {
                visitor.tail(self, node, depth);
                if node == root {
                    return;
                }
                if let Some(next) = self.next_sibling(node) {
                    node = next;
                    break;
                }
                match self.parent(node) {
                    Some(parent) => {
                        node = parent;
                        depth -= 1;
                    }
                    None => return,
                }
            }
        }
    }

    /// Iterate over `root` and all of its descendants in tree order.
    #[must_use]
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![root],
        }
    }
}

/// Pre-order iterator over a subtree, including its root.
#[derive(Debug)]
pub struct Descendants<'a> {
    tree: &'a DomTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder(Vec<String>);

    impl NodeVisitor for Recorder {
        fn head(&mut self, tree: &DomTree, id: NodeId, depth: usize) {
            self.0.push(format!("+{}@{depth}", tree.node_name(id)));
        }

        fn tail(&mut self, tree: &DomTree, id: NodeId, depth: usize) {
            self.0.push(format!("-{}@{depth}", tree.node_name(id)));
        }
    }

    fn sample() -> (DomTree, NodeId) {
        let mut tree = DomTree::new();
        let div = tree.create_element("div", "").unwrap();
        let p = tree.create_element("p", "").unwrap();
        let text = tree.create_text("x", "");
        let span = tree.create_element("span", "").unwrap();
        tree.append_child(NodeId::ROOT, div).unwrap();
        tree.append_child(div, p).unwrap();
        tree.append_child(p, text).unwrap();
        tree.append_child(div, span).unwrap();
        (tree, div)
    }

    #[test]
    fn test_head_and_tail_order() {
        let (tree, div) = sample();
        let mut recorder = Recorder(Vec::new());
        tree.traverse(div, &mut recorder);
        assert_eq!(
            recorder.0,
            [
                "+div@0", "+p@1", "+#text@2", "-#text@2", "-p@1", "+span@1", "-span@1", "-div@0",
            ]
        );
    }

    #[test]
    fn test_traverse_stops_at_root() {
        let (tree, div) = sample();
        let p = tree.first_child(div).unwrap();
        let mut recorder = Recorder(Vec::new());
        tree.traverse(p, &mut recorder);
        assert_eq!(recorder.0, ["+p@0", "+#text@1", "-#text@1", "-p@0"]);
    }

    #[test]
    fn test_descendants_in_tree_order() {
        let (tree, div) = sample();
        let names: Vec<_> = tree.descendants(div).map(|id| tree.node_name(id)).collect();
        assert_eq!(names, ["div", "p", "#text", "span"]);
    }
}
