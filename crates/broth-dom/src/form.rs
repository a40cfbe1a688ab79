//! Form controls and submission data.
//!
//! [§ 4.10.21 Form submission](https://html.spec.whatwg.org/multipage/form-control-infrastructure.html#form-submission-2)
//!
//! A `<form>` element keeps its own list of associated controls, filled by
//! whoever builds the tree (the parser registers every listed element it
//! meets inside an open form). The list is independent of the children: a
//! control can be registered while living anywhere in the tree, or nowhere.

use serde::Serialize;
use strum_macros::{Display, EnumString};

use crate::error::{DomError, DomResult};
use crate::node::NodeKind;
use crate::select::Evaluator;
use crate::tree::DomTree;
use crate::NodeId;

/// HTTP method a form submits with.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// `GET`, the default.
    #[default]
    Get,
    /// `POST`
    Post,
}

/// One submitted name/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct KeyVal {
    /// The control's `name`.
    pub key: String,
    /// The control's value.
    pub value: String,
}

impl KeyVal {
    /// Create a pair.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Everything a transport needs to submit a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormSubmission {
    /// Absolute target URL.
    pub url: String,
    /// HTTP method.
    pub method: Method,
    /// Name/value pairs in control order.
    pub data: Vec<KeyVal>,
}

impl DomTree {
    fn form_controls_mut(&mut self, form: NodeId) -> DomResult<&mut Vec<NodeId>> {
        match &mut self.node_mut(form).kind {
            NodeKind::Element(data) => data.form_controls.as_mut(),
            _ => None,
        }
        .ok_or_else(|| DomError::invalid(format!("node {form:?} is not a form")))
    }

    /// Returns true if `id` is a `<form>` element.
    #[must_use]
    pub fn is_form(&self, id: NodeId) -> bool {
        self.as_element(id).is_some_and(|data| data.is_form())
    }

    /// Register `control` with `form`. Registering twice has no effect.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if `form` is not a form or
    /// `control` is not an element.
    pub fn add_form_element(&mut self, form: NodeId, control: NodeId) -> DomResult<()> {
        if !self.is_element(control) {
            return Err(DomError::invalid(format!("node {control:?} is not an element")));
        }
        let controls = self.form_controls_mut(form)?;
        if !controls.contains(&control) {
            controls.push(control);
        }
        Ok(())
    }

    /// The registered controls, in registration order. Empty for non-forms.
    #[must_use]
    pub fn form_elements(&self, form: NodeId) -> &[NodeId] {
        self.as_element(form)
            .and_then(|data| data.form_controls.as_deref())
            .unwrap_or_default()
    }

    /// The name/value pairs the form would submit.
    ///
    /// Controls that do not submit values (buttons, fieldsets, ...) and
    /// controls with an empty `name` are skipped. A `<select>` contributes
    /// one pair per selected `<option>`. The result is a fresh copy.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if `form` is not a form.
    pub fn form_data(&self, form: NodeId) -> DomResult<Vec<KeyVal>> {
        if !self.is_form(form) {
            return Err(DomError::invalid(format!("node {form:?} is not a form")));
        }
        let selected_option = Evaluator::And(vec![
            Evaluator::Tag("option".to_string()),
            Evaluator::Attribute("selected".to_string()),
        ]);

        let mut data = Vec::new();
        for &control in self.form_elements(form) {
            if !self.tag(control).is_some_and(|tag| tag.is_form_submittable()) {
                continue;
            }
            let name = self.attr(control, "name");
            if name.is_empty() {
                continue;
            }
            if self.tag_name(control) == "select" {
                for option in self.collect(control, &selected_option) {
                    data.push(KeyVal::new(name.clone(), self.val(option)));
                }
            } else {
                data.push(KeyVal::new(name, self.val(control)));
            }
        }
        Ok(data)
    }

    /// The target, method and data for submitting `form`.
    ///
    /// The target is the absolute `action` URL, or the form's base URI when
    /// there is no `action`. The method is `POST` when the `method`
    /// attribute says so (in any case), otherwise `GET`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if `form` is not a form or no
    /// absolute target URL can be determined.
    pub fn form_submission(&self, form: NodeId) -> DomResult<FormSubmission> {
        let url = if self.has_attr(form, "action") {
            self.abs_url(form, "action")
        } else {
            self.base_uri(form).to_string()
        };
        if url.is_empty() {
            return Err(DomError::invalid(
                "could not determine a form action URL; set a base URI when parsing",
            ));
        }
        let method = if self.attr(form, "method").eq_ignore_ascii_case("post") {
            Method::Post
        } else {
            Method::Get
        };
        let data = self.form_data(form)?;
        tracing::debug!(%url, %method, fields = data.len(), "built form submission");
        Ok(FormSubmission { url, method, data })
    }
}
