//! Tests for the element surface: attributes, text, classes, queries, markup
//! insertion and forms.

use std::sync::Arc;

use broth_common::warning::was_warned;
use broth_dom::{DomError, DomResult, DomTree, FragmentParser, KeyVal, Method, NodeId};

/// Minimal fragment parser: each whitespace-separated `<tag>` token becomes an
/// empty element, anything else a text node.
#[derive(Debug)]
struct TokenParser;

impl FragmentParser for TokenParser {
    fn parse_fragment(
        &self,
        html: &str,
        _context: Option<&str>,
        base_uri: &str,
        tree: &mut DomTree,
    ) -> DomResult<Vec<NodeId>> {
        html.split_whitespace()
            .map(|token| match token.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
                Some(tag) => tree.create_element(tag, base_uri),
                None => Ok(tree.create_text(token, base_uri)),
            })
            .collect()
    }
}

fn tree_with_parser() -> DomTree {
    let mut tree = DomTree::with_base_uri("http://example.com/dir/");
    tree.set_fragment_parser(Arc::new(TokenParser));
    tree
}

/// `<p>Hello <b>there</b> now!</p>` attached to the document.
fn hello(tree: &mut DomTree) -> NodeId {
    let p = tree.append_element(NodeId::ROOT, "p").unwrap();
    let _ = tree.append_text(p, "Hello ").unwrap();
    let b = tree.append_element(p, "b").unwrap();
    let _ = tree.append_text(b, "there").unwrap();
    let _ = tree.append_text(p, " now!").unwrap();
    p
}

// ========== attributes ==========

#[test]
fn test_attribute_keys_normalized() {
    let mut tree = DomTree::new();
    let a = tree.create_element("a", "").unwrap();
    tree.set_attr(a, " HREF ", "one").unwrap();
    tree.set_attr(a, "href", "two").unwrap();

    assert_eq!(tree.attr(a, "Href"), "two");
    assert_eq!(tree.attributes(a).unwrap().len(), 1);
    assert!(tree.set_attr(a, "  ", "x").is_err());
    assert_eq!(tree.remove_attr(a, "HREF").unwrap().value(), "two");
    assert!(!tree.has_attr(a, "href"));
}

#[test]
fn test_abs_url() {
    let mut tree = DomTree::new();
    let a = tree.create_element("a", "http://example.com/dir/page.html").unwrap();
    tree.set_attr(a, "href", "../other.html").unwrap();

    assert_eq!(tree.abs_url(a, "href"), "http://example.com/other.html");
    assert_eq!(tree.attr(a, "abs:href"), "http://example.com/other.html");
    assert!(tree.has_attr(a, "abs:href"));
    assert_eq!(tree.abs_url(a, "src"), "");
}

#[test]
fn test_dataset_is_live() {
    let mut tree = DomTree::new();
    let div = tree.create_element("div", "").unwrap();
    tree.set_attr(div, "data-name", "jsoup").unwrap();
    tree.set_attr(div, "class", "x").unwrap();

    {
        let mut dataset = tree.dataset(div);
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.insert("package", "broth").unwrap(), None);
        assert_eq!(dataset.remove("name").as_deref(), Some("jsoup"));
    }

    assert_eq!(tree.attr(div, "data-package"), "broth");
    assert!(!tree.has_attr(div, "data-name"));
    assert_eq!(tree.attr(div, "class"), "x");
}

// ========== text ==========

#[test]
fn test_text_and_own_text() {
    let mut tree = DomTree::new();
    let p = hello(&mut tree);

    assert_eq!(tree.text(p), "Hello there now!");
    assert_eq!(tree.own_text(p), "Hello now!");
    assert!(tree.has_text(p));
}

#[test]
fn test_text_separates_blocks() {
    let mut tree = DomTree::new();
    let div = tree.create_element("div", "").unwrap();
    for word in ["one", "two"] {
        let p = tree.append_element(div, "p").unwrap();
        let _ = tree.append_text(p, word).unwrap();
    }
    let _ = tree.append_element(div, "br").unwrap();
    let _ = tree.append_text(div, "three");

    assert_eq!(tree.text(div), "one two three");
}

#[test]
fn test_text_preserves_pre() {
    let mut tree = DomTree::new();
    let pre = tree.create_element("pre", "").unwrap();
    let _ = tree.append_text(pre, "  a\n   b ").unwrap();

    assert_eq!(tree.text(pre), "a\n   b");
}

#[test]
fn test_set_text_replaces_children() {
    let mut tree = DomTree::new();
    let p = hello(&mut tree);
    tree.set_text(p, "plain").unwrap();

    assert_eq!(tree.child_node_size(p), 1);
    assert_eq!(tree.text(p), "plain");
    let comment = tree.create_comment("c", "");
    assert!(tree.set_text(comment, "x").is_err());
}

#[test]
fn test_split_text() {
    let mut tree = DomTree::new();
    let p = tree.create_element("p", "").unwrap();
    let text = tree.append_text(p, "Hello there").unwrap();

    let tail = tree.split_text(text, 6).unwrap();

    assert_eq!(tree.whole_text(text), "Hello ");
    assert_eq!(tree.whole_text(tail), "there");
    assert_eq!(tree.children(p), &[text, tail]);
    assert!(tree.split_text(tail, 5).is_err());
}

#[test]
fn test_data_of_script() {
    let mut tree = DomTree::new();
    let script = tree.create_element("script", "").unwrap();
    let data = tree.create_data("let x = 1 < 2;", "");
    tree.append_child(script, data).unwrap();

    assert_eq!(tree.data(script), "let x = 1 < 2;");
    assert_eq!(tree.text(script), "");
}

// ========== classes ==========

#[test]
fn test_class_operations() {
    let mut tree = DomTree::new();
    let div = tree.create_element("div", "").unwrap();
    tree.set_attr(div, "class", "  a b  a ").unwrap();

    assert_eq!(tree.class_names(div), ["a", "b"]);
    assert!(tree.has_class(div, "B"));

    tree.add_class(div, "c").unwrap();
    tree.remove_class(div, "a").unwrap();
    tree.toggle_class(div, "b").unwrap();
    tree.toggle_class(div, "d").unwrap();

    assert_eq!(tree.class_name(div), "c d");
    assert_eq!(tree.class_names(div), ["c", "d"]);
}

#[test]
fn test_class_cache_sees_attribute_writes() {
    let mut tree = DomTree::new();
    let div = tree.create_element("div", "").unwrap();
    tree.set_attr(div, "class", "old").unwrap();
    assert!(tree.has_class(div, "old"));

    tree.attributes_mut(div).put("class", "new").unwrap();
    assert!(!tree.has_class(div, "old"));
    assert!(tree.has_class(div, "new"));
}

// ========== navigation ==========

#[test]
fn test_element_siblings() {
    let mut tree = DomTree::new();
    let ul = tree.create_element("ul", "").unwrap();
    let first = tree.append_element(ul, "li").unwrap();
    let _ = tree.append_text(ul, " ").unwrap();
    let second = tree.append_element(ul, "li").unwrap();
    let third = tree.append_element(ul, "li").unwrap();

    assert_eq!(tree.element_sibling_index(third), 2);
    assert_eq!(tree.next_element_sibling(first), Some(second));
    assert_eq!(tree.previous_element_sibling(first), None);
    assert_eq!(tree.first_element_sibling(third), Some(first));
    assert_eq!(tree.last_element_sibling(first), Some(third));
    assert_eq!(tree.sibling_elements(second), vec![first, third]);
    assert_eq!(tree.child(ul, 1), Some(second));
}

#[test]
fn test_only_child_has_no_element_siblings() {
    let mut tree = DomTree::new();
    let div = tree.append_element(NodeId::ROOT, "div").unwrap();
    let _ = tree.append_text(div, "text is not an element").unwrap();
    let only = tree.append_element(div, "p").unwrap();

    assert_eq!(tree.first_element_sibling(only), None);
    assert_eq!(tree.last_element_sibling(only), None);
    assert!(tree.sibling_elements(only).is_empty());

    let second = tree.append_element(div, "p").unwrap();
    assert_eq!(tree.first_element_sibling(second), Some(only));
    assert_eq!(tree.last_element_sibling(only), Some(second));
}

// ========== queries ==========

#[test]
fn test_select_queries() {
    let mut tree = DomTree::new();
    let div = tree.append_element(NodeId::ROOT, "div").unwrap();
    tree.set_attr(div, "id", "main").unwrap();
    let a = tree.append_element(div, "a").unwrap();
    tree.set_attr(a, "href", "https://example.com").unwrap();
    tree.set_attr(a, "class", "Link").unwrap();
    let _ = tree.append_text(a, "Example").unwrap();
    let span = tree.append_element(div, "span").unwrap();
    let _ = tree.append_text(span, "other").unwrap();

    assert_eq!(tree.select(NodeId::ROOT, "div > a.link").unwrap(), vec![a]);
    assert_eq!(tree.select(NodeId::ROOT, "#main span").unwrap(), vec![span]);
    assert_eq!(tree.get_element_by_id(NodeId::ROOT, "main").unwrap(), Some(div));
    assert_eq!(
        tree.get_elements_by_attribute_value_starting(NodeId::ROOT, "href", "HTTPS").unwrap(),
        vec![a]
    );
    assert_eq!(tree.get_elements_containing_own_text(NodeId::ROOT, "exam"), vec![a]);
    assert_eq!(tree.get_elements_matching_text(NodeId::ROOT, "^oth").unwrap(), vec![span]);
    assert_eq!(tree.get_all_elements(div), vec![div, a, span]);
    assert!(matches!(
        tree.get_elements_matching_own_text(NodeId::ROOT, "("),
        Err(DomError::Pattern { .. })
    ));
}

// ========== markup insertion ==========

#[test]
fn test_html_requires_parser() {
    let mut tree = DomTree::new();
    let div = tree.create_element("div", "").unwrap();
    assert!(matches!(
        tree.append_html(div, "<p>"),
        Err(DomError::NoFragmentParser)
    ));
}

#[test]
fn test_append_prepend_and_set_html() {
    let mut tree = tree_with_parser();
    let div = tree.append_element(NodeId::ROOT, "div").unwrap();
    let _ = tree.append_text(div, "middle").unwrap();

    let appended = tree.append_html(div, "<b> end").unwrap();
    let prepended = tree.prepend_html(div, "<i>").unwrap();
    assert_eq!(appended.len(), 2);
    assert_eq!(tree.children(div)[0], prepended[0]);
    assert_eq!(tree.child_node_size(div), 4);
    assert_eq!(tree.base_uri(appended[0]), "http://example.com/dir/");

    tree.set_html(div, "<em>").unwrap();
    assert_eq!(tree.child_node_size(div), 1);
    assert_eq!(tree.tag_name(tree.children(div)[0]), "em");
}

#[test]
fn test_before_and_after_html() {
    let mut tree = tree_with_parser();
    let div = tree.append_element(NodeId::ROOT, "div").unwrap();
    let p = tree.append_element(div, "p").unwrap();

    tree.before_html(p, "<h1>").unwrap();
    tree.after_html(p, "<hr>").unwrap();

    let names: Vec<&str> = tree.children(div).iter().map(|&c| tree.tag_name(c)).collect();
    assert_eq!(names, ["h1", "p", "hr"]);
    assert_eq!(tree.sibling_index(p), 1);
}

#[test]
fn test_wrap() {
    let mut tree = tree_with_parser();
    let div = tree.append_element(NodeId::ROOT, "div").unwrap();
    let p = tree.append_element(div, "p").unwrap();

    assert_eq!(tree.wrap(p, "<section> <aside>").unwrap(), Some(p));

    let section = tree.children(div)[0];
    assert_eq!(tree.tag_name(section), "section");
    assert_eq!(tree.parent(p), Some(section));
    let names: Vec<&str> = tree.children(section).iter().map(|&c| tree.tag_name(c)).collect();
    assert_eq!(names, ["p", "aside"]);
}

#[test]
fn test_wrap_without_element_is_noop() {
    let mut tree = tree_with_parser();
    let div = tree.append_element(NodeId::ROOT, "div").unwrap();
    let p = tree.append_element(div, "p").unwrap();

    assert_eq!(tree.wrap(p, "just-text").unwrap(), None);
    assert_eq!(tree.children(div), &[p]);
    assert!(was_warned(
        "Dom",
        "wrap markup does not start with an element; nothing to wrap with"
    ));
    assert!(tree.wrap(p, "").is_err());
}

// ========== forms ==========

#[test]
fn test_form_submission() {
    let mut tree = DomTree::with_base_uri("http://example.com/search/");
    let form = tree.append_element(NodeId::ROOT, "form").unwrap();
    tree.set_attr(form, "action", "go").unwrap();
    tree.set_attr(form, "method", "Post").unwrap();

    let query = tree.append_element(form, "input").unwrap();
    tree.set_attr(query, "name", "q").unwrap();
    tree.set_val(query, "rust").unwrap();

    let unnamed = tree.append_element(form, "input").unwrap();
    tree.set_val(unnamed, "ignored").unwrap();

    let button = tree.append_element(form, "button").unwrap();
    tree.set_attr(button, "name", "go").unwrap();

    let select = tree.append_element(form, "select").unwrap();
    tree.set_attr(select, "name", "lang").unwrap();
    for (value, selected) in [("en", true), ("fr", false), ("de", true)] {
        let option = tree.append_element(select, "option").unwrap();
        tree.set_attr(option, "value", value).unwrap();
        if selected {
            tree.set_attr(option, "selected", "").unwrap();
        }
    }

    let notes = tree.append_element(form, "textarea").unwrap();
    tree.set_attr(notes, "name", "notes").unwrap();
    tree.set_val(notes, "hi there").unwrap();

    for control in [query, unnamed, button, select, notes] {
        tree.add_form_element(form, control).unwrap();
    }

    let submission = tree.form_submission(form).unwrap();
    assert_eq!(submission.url, "http://example.com/search/go");
    assert_eq!(submission.method, Method::Post);
    assert_eq!(
        submission.data,
        vec![
            KeyVal::new("q", "rust"),
            KeyVal::new("lang", "en"),
            KeyVal::new("lang", "de"),
            KeyVal::new("notes", "hi there"),
        ]
    );

    let json = serde_json::to_value(&submission).unwrap();
    assert_eq!(json["method"], "POST");
    assert_eq!(json["data"][0]["key"], "q");
}

#[test]
fn test_form_submission_needs_url() {
    let mut tree = DomTree::new();
    let form = tree.append_element(NodeId::ROOT, "form").unwrap();

    assert!(matches!(
        tree.form_submission(form),
        Err(DomError::InvalidArgument(_))
    ));
    tree.set_base_uri(form, "http://example.com/");
    let submission = tree.form_submission(form).unwrap();
    assert_eq!(submission.url, "http://example.com/");
    assert_eq!(submission.method, Method::Get);
    assert!(submission.data.is_empty());
}

#[test]
fn test_cloned_form_keeps_own_controls() {
    let mut tree = DomTree::new();
    let form = tree.append_element(NodeId::ROOT, "form").unwrap();
    let input = tree.append_element(form, "input").unwrap();
    tree.add_form_element(form, input).unwrap();

    let copy = tree.clone_node(form);
    let copied_input = tree.children(copy)[0];

    assert_eq!(tree.form_elements(copy), [copied_input]);
    assert_eq!(tree.form_elements(form), [input]);
}
