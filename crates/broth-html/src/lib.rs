//! HTML parsing for broth.
//!
//! [§ 13.2 Parsing HTML documents](https://html.spec.whatwg.org/multipage/parsing.html)
//!
//! Tokenization and tree construction are done by html5ever into an
//! `RcDom`, which is then copied into a [`DomTree`]. The resulting tree has
//! an [`Html5everParser`] installed, so markup operations such as
//! [`DomTree::append_html`] and [`DomTree::wrap`] work on it straight away.
//!
//! # Example
//! ```
//! let tree = broth_html::parse("<p>Hello <b>there</b> now!</p>", "").unwrap();
//! let p = tree.select_first(tree.root(), "p").unwrap().unwrap();
//! assert_eq!(tree.text(p), "Hello there now!");
//! ```

mod convert;

use std::io;
use std::sync::Arc;

use broth_common::url::resolve_url;
use broth_common::warning;
use broth_dom::{DomError, DomResult, DomTree, FragmentParser, NodeId};
use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, ParseOpts, QualName, ns, parse_document, parse_fragment};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use thiserror::Error;

use convert::Converter;

/// Errors from [`parse`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// html5ever could not read the input.
    #[error("failed to read markup: {0}")]
    Io(#[from] io::Error),

    /// The parsed document could not be copied into the tree.
    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Tags whose text content is kept as raw data rather than text.
const DATA_TAGS: &[&str] = &["script", "style"];

fn read_dom(html: &str) -> io::Result<RcDom> {
    parse_document(RcDom::default(), ParseOpts::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
}

/// Parse a complete document.
///
/// Relative URLs resolve against `base_uri`, or against the document's first
/// `<base href>` when it has one. Warnings recorded for an earlier document
/// are forgotten, so each is reported again for this one.
///
/// # Errors
///
/// Returns [`ParseError`] if the input cannot be read.
pub fn parse(html: &str, base_uri: &str) -> Result<DomTree, ParseError> {
    warning::clear_warnings();
    let dom = read_dom(html)?;
    let mut tree = DomTree::with_base_uri(base_uri);
    {
        let mut converter = Converter::new(&mut tree, base_uri);
        for child in dom.document.children.borrow().iter() {
            let _ = converter.convert(child, Some(NodeId::ROOT))?;
        }
    }
    apply_base_element(&mut tree);
    tree.set_fragment_parser(Arc::new(Html5everParser));
    tracing::debug!(nodes = tree.len(), base_uri, "parsed document");
    Ok(tree)
}

/// Parse `html` as the content of a `<body>`, returning a full document
/// (with `html`, `head` and `body`) around it.
///
/// # Errors
///
/// Returns [`ParseError`] if the input cannot be read.
pub fn parse_body_fragment(html: &str, base_uri: &str) -> Result<DomTree, ParseError> {
    let mut tree = parse("", base_uri)?;
    if let Some(body) = tree.body() {
        let _ = tree.append_html(body, html)?;
    }
    Ok(tree)
}

/// [§ 4.2.3 The base element](https://html.spec.whatwg.org/multipage/semantics.html#the-base-element)
///
/// "The document base URL of a Document object is the absolute URL obtained
/// by running these steps: ... the frozen base URL of the first base element
/// in the Document that has an href attribute, in tree order."
fn apply_base_element(tree: &mut DomTree) {
    let Ok(Some(base)) = tree.select_first(NodeId::ROOT, "base[href]") else {
        return;
    };
    let href = tree.attr(base, "href");
    match resolve_url(&href, tree.base_uri(NodeId::ROOT)) {
        Some(url) => {
            tracing::debug!(%url, "document base URI set from <base>");
            tree.set_base_uri(NodeId::ROOT, &url);
        }
        None => warning::warn_once(
            "HTML",
            &format!("ignoring <base href=\"{href}\">: not a usable URL"),
        ),
    }
}

/// Fragment parser backed by html5ever.
///
/// [§ 13.4 Parsing HTML fragments](https://html.spec.whatwg.org/multipage/parsing.html#parsing-html-fragments)
///
/// The markup is parsed with the context element's tag name (`body` when
/// there is none), so table rows, list items and options land where a
/// browser would put them. Inside a `<script>` or `<style>` context the
/// markup is not parsed at all and comes back as a single data node.
#[derive(Debug, Default, Clone, Copy)]
pub struct Html5everParser;

impl FragmentParser for Html5everParser {
    fn parse_fragment(
        &self,
        html: &str,
        context: Option<&str>,
        base_uri: &str,
        tree: &mut DomTree,
    ) -> DomResult<Vec<NodeId>> {
        if context.is_some_and(|tag| DATA_TAGS.contains(&tag)) {
            return Ok(vec![tree.create_data(html, base_uri)]);
        }

        let context = context.unwrap_or("body");
        let dom = read_fragment(html, context).map_err(|err| DomError::Parse(err.to_string()))?;
        // The fragment algorithm puts the parsed nodes under a synthetic <html> root.
        let Some(root) = child_element(&dom.document, "html") else {
            return Ok(Vec::new());
        };
        let mut converter = Converter::new(tree, base_uri);
        let mut nodes = Vec::new();
        for child in root.children.borrow().iter() {
            nodes.extend(converter.convert(child, None)?);
        }
        Ok(nodes)
    }
}

fn read_fragment(html: &str, context: &str) -> io::Result<RcDom> {
    let context = QualName::new(None, ns!(html), LocalName::from(context));
    parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new(), false)
        .from_utf8()
        .read_from(&mut html.as_bytes())
}

fn child_element(parent: &Handle, tag: &str) -> Option<Handle> {
    parent
        .children
        .borrow()
        .iter()
        .find(|child| matches!(&child.data, NodeData::Element { name, .. } if &*name.local == tag))
        .cloned()
}
