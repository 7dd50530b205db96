use std::rc::Rc;

use crate::editor::config::EditorConfig;
use crate::html::dom::{parent_element, NodeRef};

/// Derives the rule key for `node`.
///
/// An element with an id is keyed as `#id`. Otherwise one `tag.class1.class2` part is collected
/// per level, walking up until `<body>`/`<html>`, the depth limit, or an ancestor with an id
/// (which is prefixed as `#id`). Parts are joined outermost first with ` > `.
pub fn generate_selector(node: &NodeRef, config: &EditorConfig) -> String {
    if let Some(id) = element_id(node) {
        return format!("#{}", id);
    }

    let mut parts = Vec::new();
    let mut current = Some(Rc::clone(node));
    let mut depth = 0;

    while let Some(el) = current {
        if depth >= config.max_selector_depth {
            break;
        }
        let tag_name = el.borrow().get_tag_name();
        if matches!(tag_name.as_deref(), Some("body" | "html")) {
            break;
        }
        if let Some(part) = selector_part(&el, config) {
            parts.push(part);
        }

        let parent = parent_element(&el);
        if let Some(id) = parent.as_ref().and_then(element_id) {
            parts.push(format!("#{}", id));
            break;
        }
        current = parent;
        depth += 1;
    }

    parts.reverse();
    parts.join(" > ")
}

/// `tag.class1.class2` for one element, with internal and volatile classes removed.
fn selector_part(node: &NodeRef, config: &EditorConfig) -> Option<String> {
    let node = node.borrow();
    let elm = node.element()?;
    let mut part = elm.tag_name.clone();
    for class_name in elm
        .class_list()
        .iter()
        .filter(|c| config.is_selectable_class(c))
    {
        part.push('.');
        part.push_str(class_name);
    }
    Some(part)
}

fn element_id(node: &NodeRef) -> Option<String> {
    node.borrow()
        .element()
        .and_then(|e| e.id())
        .map(|id| id.to_string())
}

/// Human readable label of an element: `tag#id.class1.class2`, without editor classes.
pub fn display_name(node: &NodeRef, config: &EditorConfig) -> String {
    let node = node.borrow();
    let Some(elm) = node.element() else {
        return String::new();
    };
    let mut name = elm.tag_name.clone();
    if let Some(id) = elm.id() {
        name.push('#');
        name.push_str(id);
    }
    for class_name in elm
        .class_list()
        .iter()
        .filter(|c| config.is_selectable_class(c))
    {
        name.push('.');
        name.push_str(class_name);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;

    fn selector_for(html: &str, query: &str) -> String {
        let doc = parse_html(html).unwrap();
        let node = doc.query_selector(query).unwrap().unwrap();
        generate_selector(&node, &EditorConfig::default())
    }

    #[test]
    fn id_is_terminal() {
        assert_eq!(
            selector_for(r#"<div id="outer"><p id="inner" class="x"></p></div>"#, "p"),
            "#inner"
        );
    }

    #[test]
    fn ancestor_with_id_is_prefixed() {
        assert_eq!(
            selector_for(
                r#"<div id="main"><span class="foo ojs-bar"></span></div>"#,
                "span"
            ),
            "#main > span.foo"
        );
    }

    #[test]
    fn stops_at_body() {
        assert_eq!(
            selector_for(r#"<section class="a"><p class="b hover">x</p></section>"#, "p"),
            "section.a > p.b"
        );
    }

    #[test]
    fn depth_is_bounded() {
        let html = "<div><div><div><div><div><em>x</em></div></div></div></div></div>";
        assert_eq!(selector_for(html, "em"), "div > div > div > em");
    }

    #[test]
    fn id_on_the_limit_ancestor_is_still_used() {
        let html = r#"<div id="root"><div><div><div><em>x</em></div></div></div></div>"#;
        assert_eq!(selector_for(html, "em"), "#root > div > div > div > em");
    }

    #[test]
    fn body_id_is_used() {
        assert_eq!(
            selector_for(r#"<body id="page"><p class="universal-editor-highlight">x</p></body>"#, "p"),
            "#page > p"
        );
    }

    #[test]
    fn generated_selectors_match_their_element() {
        let html = r#"<main class="c"><ul class="list"><li class="item"><a class="l focus" href="/">x</a></li></ul></main>"#;
        let doc = parse_html(html).unwrap();
        let config = EditorConfig::default();
        for node in doc.elements() {
            let selector = generate_selector(&node, &config);
            if selector.is_empty() {
                continue;
            }
            let matched = doc.query_selector_all(&selector).unwrap();
            assert!(
                matched.iter().any(|n| Rc::ptr_eq(n, &node)),
                "{} does not match its element",
                selector
            );
        }
    }

    #[test]
    fn display_names() {
        let doc = parse_html(r#"<p id="x" class="a universal-editor-highlight b">t</p>"#).unwrap();
        let p = doc.get_element_by_id("x").unwrap();
        assert_eq!(display_name(&p, &EditorConfig::default()), "p#x.a.b");
    }
}
