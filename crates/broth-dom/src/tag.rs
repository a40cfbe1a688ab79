//! HTML tag classification.
//!
//! [§ 4 The elements of HTML](https://html.spec.whatwg.org/multipage/#toc-semantics)
//!
//! A [`Tag`] carries the name of an element together with the properties the
//! serializer and text aggregation need: is it block level, should it be laid
//! out on its own line when pretty printing, is it void, does it preserve
//! whitespace, and how does it take part in forms.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use crate::error::{DomError, DomResult};

/// Tags that are block level.
const BLOCK_TAGS: &[&str] = &[
    "html", "head", "body", "frameset", "script", "noscript", "style", "meta", "link", "title",
    "frame", "noframes", "section", "nav", "aside", "hgroup", "header", "footer", "p", "h1", "h2",
    "h3", "h4", "h5", "h6", "ul", "ol", "pre", "div", "blockquote", "hr", "address", "figure",
    "figcaption", "form", "fieldset", "ins", "del", "s", "dl", "dt", "dd", "li", "table",
    "caption", "thead", "tfoot", "tbody", "colgroup", "col", "tr", "th", "td", "video", "audio",
    "canvas", "details", "menu", "plaintext", "main", "article",
];

/// Tags that are inline.
const INLINE_TAGS: &[&str] = &[
    "object", "base", "font", "tt", "i", "b", "u", "big", "small", "em", "strong", "dfn", "code",
    "samp", "kbd", "var", "cite", "abbr", "time", "acronym", "mark", "ruby", "rt", "rp", "a",
    "img", "br", "wbr", "map", "q", "sub", "sup", "bdo", "iframe", "embed", "span", "input",
    "select", "textarea", "label", "button", "optgroup", "option", "legend", "datalist", "keygen",
    "output", "progress", "meter", "area", "param", "source", "track", "summary", "command",
    "device",
];

/// [§ 13.1.2 Elements](https://html.spec.whatwg.org/multipage/syntax.html#void-elements)
///
/// Void elements: no content, serialized self-closed.
const EMPTY_TAGS: &[&str] = &[
    "meta", "link", "base", "frame", "img", "br", "wbr", "embed", "hr", "input", "keygen", "col",
    "command", "device", "area", "param", "source", "track",
];

/// Block tags whose content is still laid out inline when pretty printing.
const FORMAT_AS_INLINE_TAGS: &[&str] = &[
    "title", "a", "p", "h1", "h2", "h3", "h4", "h5", "h6", "pre", "address", "li", "th", "td",
    "script", "style", "ins", "del", "s",
];

const PRESERVE_WHITESPACE_TAGS: &[&str] = &["pre", "plaintext", "title", "textarea"];

/// [§ 4.10.2 Categories](https://html.spec.whatwg.org/multipage/forms.html#category-listed)
///
/// "Listed elements: button, fieldset, input, object, output, select, textarea"
const FORM_LISTED_TAGS: &[&str] = &[
    "button", "fieldset", "input", "keygen", "object", "output", "select", "textarea",
];

/// Listed elements whose value takes part in form submission.
const FORM_SUBMIT_TAGS: &[&str] = &["input", "keygen", "object", "select", "textarea"];

/// Classification flags for a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::struct_excessive_bools)]
struct TagFlags {
    is_block: bool,
    format_as_block: bool,
    can_contain_block: bool,
    can_contain_inline: bool,
    empty: bool,
    self_closing: bool,
    preserve_whitespace: bool,
    form_list: bool,
    form_submit: bool,
}

impl TagFlags {
    /// Flags for a tag nobody registered: inline, but laid out as a block and
    /// able to hold anything.
    const UNKNOWN: Self = Self {
        is_block: false,
        format_as_block: true,
        can_contain_block: true,
        can_contain_inline: true,
        empty: false,
        self_closing: false,
        preserve_whitespace: false,
        form_list: false,
        form_submit: false,
    };

    const BLOCK: Self = Self {
        is_block: true,
        ..Self::UNKNOWN
    };

    const INLINE: Self = Self {
        is_block: false,
        format_as_block: false,
        can_contain_block: false,
        ..Self::UNKNOWN
    };
}

static REGISTRY: LazyLock<HashMap<&'static str, TagFlags>> = LazyLock::new(|| {
    let mut tags = HashMap::new();
    for &name in BLOCK_TAGS {
        let _ = tags.insert(name, TagFlags::BLOCK);
    }
    for &name in INLINE_TAGS {
        let _ = tags.insert(name, TagFlags::INLINE);
    }
    for &name in EMPTY_TAGS {
        let flags = tags.entry(name).or_insert(TagFlags::INLINE);
        flags.can_contain_block = false;
        flags.can_contain_inline = false;
        flags.empty = true;
        flags.self_closing = true;
    }
    for &name in FORMAT_AS_INLINE_TAGS {
        if let Some(flags) = tags.get_mut(name) {
            flags.format_as_block = false;
        }
    }
    for &name in PRESERVE_WHITESPACE_TAGS {
        if let Some(flags) = tags.get_mut(name) {
            flags.preserve_whitespace = true;
        }
    }
    for &name in FORM_LISTED_TAGS {
        if let Some(flags) = tags.get_mut(name) {
            flags.form_list = true;
        }
    }
    for &name in FORM_SUBMIT_TAGS {
        if let Some(flags) = tags.get_mut(name) {
            flags.form_submit = true;
        }
    }
    tags
});

/// An element's tag: its lower-case name plus classification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    name: String,
    flags: TagFlags,
}

impl Tag {
    /// Look up a tag by name. The name is trimmed and lower-cased; unknown
    /// names get a fresh inline tag that formats as a block.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidArgument`] if the name is empty.
    pub fn value_of(name: &str) -> DomResult<Self> {
        let name = name.trim().to_ascii_lowercase();
        if name.is_empty() {
            return Err(DomError::invalid("tag name must not be empty"));
        }
        let flags = REGISTRY.get(name.as_str()).copied().unwrap_or(TagFlags::UNKNOWN);
        Ok(Self { name, flags })
    }

    /// Returns true if `name` is a registered HTML tag.
    #[must_use]
    pub fn is_known_tag(name: &str) -> bool {
        REGISTRY.contains_key(name.trim().to_ascii_lowercase().as_str())
    }

    /// The lower-case tag name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block level elements start a new line of text.
    #[must_use]
    pub const fn is_block(&self) -> bool {
        self.flags.is_block
    }

    /// Pretty printing puts this element's children on their own lines.
    #[must_use]
    pub const fn format_as_block(&self) -> bool {
        self.flags.format_as_block
    }

    /// May hold block level children.
    #[must_use]
    pub const fn can_contain_block(&self) -> bool {
        self.flags.can_contain_block
    }

    /// May hold inline children and text.
    #[must_use]
    pub const fn can_contain_inline(&self) -> bool {
        self.flags.can_contain_inline
    }

    /// Not block level.
    #[must_use]
    pub const fn is_inline(&self) -> bool {
        !self.flags.is_block
    }

    /// Void element: never has content.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.flags.empty
    }

    /// May be serialized as `<tag />` when it has no children.
    #[must_use]
    pub const fn is_self_closing(&self) -> bool {
        self.flags.empty || self.flags.self_closing
    }

    /// Text inside keeps its whitespace verbatim.
    #[must_use]
    pub const fn preserve_whitespace(&self) -> bool {
        self.flags.preserve_whitespace
    }

    /// Gets registered with the nearest enclosing form.
    #[must_use]
    pub const fn is_form_listed(&self) -> bool {
        self.flags.form_list
    }

    /// Contributes a value when its form is submitted.
    #[must_use]
    pub const fn is_form_submittable(&self) -> bool {
        self.flags.form_submit
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
