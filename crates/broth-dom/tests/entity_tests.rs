//! Tests for the character reference codec and attribute encoding.

use broth_dom::entities::{self, Charset, EscapeMode};
use broth_dom::{Attribute, Attributes};
use quickcheck_macros::quickcheck;

fn escape_utf8(text: &str, mode: EscapeMode) -> String {
    entities::escape(text, Charset::Utf8, mode)
}

// ========== escape ==========

#[test]
fn test_escape_markup_characters() {
    assert_eq!(
        escape_utf8("<a href=\"x\">&</a>", EscapeMode::Base),
        "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;"
    );
    assert_eq!(escape_utf8("it's", EscapeMode::Xhtml), "it&apos;s");
}

#[test]
fn test_escape_modes_widen() {
    let text = "caf\u{e9} \u{2026}";
    assert_eq!(escape_utf8(text, EscapeMode::Xhtml), text);
    assert_eq!(escape_utf8(text, EscapeMode::Base), "caf&eacute; \u{2026}");
    assert_eq!(escape_utf8(text, EscapeMode::Extended), "caf&eacute; &hellip;");
}

#[test]
fn test_escape_unencodable_as_numeric() {
    assert_eq!(
        entities::escape("caf\u{e9} \u{263a}", Charset::Ascii, EscapeMode::Xhtml),
        "caf&#xe9; &#x263a;"
    );
    assert_eq!(
        entities::escape("\u{e9}\u{263a}", Charset::Latin1, EscapeMode::Xhtml),
        "\u{e9}&#x263a;"
    );
    assert_eq!(escape_utf8("\u{a0}", EscapeMode::Base), "&nbsp;");
}

// ========== unescape ==========

#[test]
fn test_unescape_named_and_numeric() {
    assert_eq!(entities::unescape("&lt;p&gt; &amp; &copy;"), "<p> & \u{a9}");
    assert_eq!(entities::unescape("&#65;&#x42;&#X43;"), "ABC");
    assert_eq!(entities::unescape("no references"), "no references");
}

#[test]
fn test_unescape_leniency() {
    // A missing semicolon is tolerated; the longest known name wins.
    assert_eq!(entities::unescape("&amp &lt3 &copy2024"), "& <3 \u{a9}2024");
    assert_eq!(entities::unescape("&ampx"), "&x");
    // Strict mode wants the semicolon.
    assert_eq!(entities::unescape_with("&amp &lt;", true), "&amp <");
}

#[test]
fn test_unescape_keeps_invalid_references() {
    for text in ["&nosuch;", "&#xZZ;", "&#0;", "&#1114112;", "& alone", "&;"] {
        assert_eq!(entities::unescape(text), text);
    }
}

#[test]
fn test_named_entity_lookup() {
    assert!(entities::is_named_entity("hellip"));
    assert!(!entities::is_base_named_entity("hellip"));
    assert!(entities::is_base_named_entity("nbsp"));
    assert_eq!(entities::character_by_name("gt"), Some('>'));
}

#[quickcheck]
fn prop_escape_only_reescapes_ampersands(text: String) -> bool {
    [EscapeMode::Xhtml, EscapeMode::Base].into_iter().all(|mode| {
        let once = escape_utf8(&text, mode);
        escape_utf8(&once, mode) == once.replace('&', "&amp;")
    })
}

#[quickcheck]
fn prop_unescape_reverses_escape(text: String) -> bool {
    [Charset::Utf8, Charset::Ascii].into_iter().all(|charset| {
        [EscapeMode::Xhtml, EscapeMode::Base, EscapeMode::Extended]
            .into_iter()
            .all(|mode| entities::unescape(&entities::escape(&text, charset, mode)) == text)
    })
}

// ========== attributes ==========

#[test]
fn test_attribute_html() {
    let attr = Attribute::new("Title", "a \"b\" & c").unwrap();
    assert_eq!(attr.html(), "title=\"a &quot;b&quot; &amp; c\"");
    assert_eq!(attr.to_string(), attr.html());
}

#[test]
fn test_attribute_from_encoded_is_strict() {
    let attr = Attribute::from_encoded("href", "?a=1&amp;b=2&copy=3").unwrap();
    assert_eq!(attr.value(), "?a=1&b=2&copy=3");
}

#[test]
fn test_attributes_keep_order() {
    let mut attrs = Attributes::new();
    attrs.put("b", "1").unwrap();
    attrs.put("A", "2").unwrap();
    attrs.put("B", "3").unwrap();

    assert_eq!(attrs.html(), " b=\"3\" a=\"2\"");
    let keys: Vec<&str> = attrs.iter().map(Attribute::key).collect();
    assert_eq!(keys, ["b", "a"]);

    let mut other = Attributes::new();
    other.put("a", "x").unwrap();
    other.put("c", "y").unwrap();
    attrs.add_all(&other);
    assert_eq!(attrs.to_string(), " b=\"3\" a=\"x\" c=\"y\"");
}
