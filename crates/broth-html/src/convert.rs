//! Copying an html5ever `RcDom` into a [`DomTree`].

use broth_common::warning::warn_once;
use broth_dom::{DoctypeData, DomResult, DomTree, NodeId};
use markup5ever_rcdom::{Handle, NodeData};

use crate::DATA_TAGS;

/// Walks `RcDom` handles and allocates matching nodes in a tree.
pub(crate) struct Converter<'a> {
    tree: &'a mut DomTree,
    base_uri: &'a str,
}

impl<'a> Converter<'a> {
    pub(crate) const fn new(tree: &'a mut DomTree, base_uri: &'a str) -> Self {
        Self { tree, base_uri }
    }

    /// Copy `handle` and its subtree, appending it to `parent` if given.
    /// Returns the new node, or `None` for kinds the tree does not keep.
    pub(crate) fn convert(
        &mut self,
        handle: &Handle,
        parent: Option<NodeId>,
    ) -> DomResult<Option<NodeId>> {
        let base_uri = self.base_uri;
        let id = match &handle.data {
            NodeData::Document => {
                warn_once("HTML", "nested document node skipped");
                return Ok(None);
            }
            NodeData::Doctype {
                name,
                public_id,
                system_id,
            } => self.tree.create_doctype(
                DoctypeData {
                    name: name.to_string(),
                    public_id: public_id.to_string(),
                    system_id: system_id.to_string(),
                },
                base_uri,
            ),
            NodeData::Text { contents } => {
                let contents = contents.borrow();
                if parent.is_some_and(|p| self.holds_data(p)) {
                    self.tree.create_data(&contents, base_uri)
                } else {
                    self.tree.create_text(&contents, base_uri)
                }
            }
            NodeData::Comment { contents } => self.tree.create_comment(contents, base_uri),
            NodeData::Element { name, attrs, .. } => {
                let id = self.tree.create_element(&name.local, base_uri)?;
                for attr in attrs.borrow().iter() {
                    let key = match &attr.name.prefix {
                        Some(prefix) => format!("{}:{}", &**prefix, &*attr.name.local),
                        None => attr.name.local.to_string(),
                    };
                    self.tree.set_attr(id, &key, &attr.value)?;
                }
                id
            }
            NodeData::ProcessingInstruction { target, .. } => {
                warn_once(
                    "HTML",
                    &format!("dropping processing instruction '{}'", &**target),
                );
                return Ok(None);
            }
        };

        if let Some(parent) = parent {
            self.tree.append_child(parent, id)?;
        }
        if self.tree.is_element(id) {
            self.register_with_form(id)?;
            self.convert_children(handle, id)?;
        }
        Ok(Some(id))
    }

    fn convert_children(&mut self, handle: &Handle, parent: NodeId) -> DomResult<()> {
        for child in handle.children.borrow().iter() {
            let _ = self.convert(child, Some(parent))?;
        }
        // <template> keeps its content in a separate fragment.
        if let NodeData::Element {
            template_contents, ..
        } = &handle.data
            && let Some(contents) = template_contents.borrow().as_ref()
        {
            for child in contents.children.borrow().iter() {
                let _ = self.convert(child, Some(parent))?;
            }
        }
        Ok(())
    }

    fn holds_data(&self, parent: NodeId) -> bool {
        DATA_TAGS.contains(&self.tree.tag_name(parent))
    }

    /// [§ 4.10.17.3 Association of controls and forms](https://html.spec.whatwg.org/multipage/form-control-infrastructure.html#association-of-controls-and-forms)
    ///
    /// Listed elements join the nearest enclosing form.
    fn register_with_form(&mut self, id: NodeId) -> DomResult<()> {
        if !self.tree.tag(id).is_some_and(|tag| tag.is_form_listed()) {
            return Ok(());
        }
        let form = self.tree.ancestors(id).find(|&a| self.tree.is_form(a));
        if let Some(form) = form {
            self.tree.add_form_element(form, id)?;
        }
        Ok(())
    }
}
