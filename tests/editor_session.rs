use std::rc::Rc;

use pretty_assertions::assert_eq;
use restyle::{
    css::{computed_style, parse_stylesheet},
    editor::{generate_selector, storage::RULES_KEY},
    parse_html, EditorConfig, Error, MemoryStorage, Result, Storage, StyleEditorSession,
};

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Shop</title>
  <style>
    .card { padding: 8px; border: 1px solid #cccccc }
    #main p { color: #333333 }
  </style>
</head>
<body>
  <header class="top"><nav><a class="link hover" href="/">Home</a></nav></header>
  <div id="main">
    <span class="foo ojs-bar">first</span>
    <section class="card wide"><p class="note">a</p><p class="note">b</p></section>
  </div>
  <div id="universal-theme-editor-toolbox"><input id="ote-color"></div>
</body>
</html>"#;

fn session() -> StyleEditorSession<MemoryStorage> {
    StyleEditorSession::new(parse_html(PAGE).unwrap(), MemoryStorage::new())
}

/// Rejects every write, as a full or revoked extension storage would.
#[derive(Default)]
struct FailingStorage;

impl Storage for FailingStorage {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(Error::Storage("storage is unavailable".into()))
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
        Err(Error::Storage("storage is unavailable".into()))
    }
}

#[test]
fn elements_with_an_id_are_keyed_by_it() {
    let doc = parse_html(PAGE).unwrap();
    let config = EditorConfig::default();
    for node in doc.elements() {
        let id = node.borrow().element().and_then(|e| e.id().map(|s| s.to_string()));
        if let Some(id) = id {
            assert_eq!(generate_selector(&node, &config), format!("#{}", id));
        }
    }
}

#[test]
fn generated_selectors_resolve_to_their_element() {
    let doc = parse_html(PAGE).unwrap();
    let config = EditorConfig::default();
    let body = doc.body().unwrap();
    for node in doc.elements() {
        if !restyle::html::dom::is_inclusive_descendant(&node, &body) || Rc::ptr_eq(&node, &body) {
            continue;
        }
        let selector = generate_selector(&node, &config);
        let matched = doc.query_selector_all(&selector).unwrap();
        assert!(
            matched.iter().any(|n| Rc::ptr_eq(n, &node)),
            "`{}` does not match its element",
            selector
        );
    }
}

#[test]
fn internal_classes_are_filtered_below_an_id() {
    let mut s = session();
    assert_eq!(s.select_selector("span").unwrap(), "#main > span.foo");
    assert_eq!(s.select_selector("a").unwrap(), "header.top > nav > a.link");
}

#[test]
fn applying_twice_is_applying_once() {
    let mut s = session();
    s.select_selector("p").unwrap();
    s.apply_style("color", "#ff0000").unwrap();
    let once = s.rules().clone();
    s.apply_style("color", "#ff0000").unwrap();
    assert_eq!(s.rules(), &once);
}

#[test]
fn injected_stylesheet_parses_back_to_the_last_values() {
    let mut s = session();
    s.select_selector("p").unwrap();
    s.apply_style("color", "#ff0000").unwrap();
    s.apply_style("margin", "2px").unwrap();
    s.apply_style("color", "#00ff00").unwrap();
    s.select_selector("span").unwrap();
    s.apply_style("font-size", "20px").unwrap();

    let sheet = parse_stylesheet(&s.injected_stylesheet_text());
    let parsed = sheet
        .rules
        .iter()
        .map(|rule| {
            (
                rule.selector_text.clone(),
                rule.declarations
                    .iter()
                    .map(|d| (d.name.clone(), d.value.clone()))
                    .collect::<Vec<_>>(),
            )
        })
        .collect::<Vec<_>>();
    assert_eq!(
        parsed,
        vec![
            (
                "#main > section.card.wide > p.note".to_string(),
                vec![
                    ("color".to_string(), "#00ff00".to_string()),
                    ("margin".to_string(), "2px".to_string()),
                ]
            ),
            (
                "#main > span.foo".to_string(),
                vec![("font-size".to_string(), "20px".to_string())]
            ),
        ]
    );
}

#[test]
fn rules_apply_page_wide() {
    let mut s = session();
    s.select_selector("p").unwrap();
    s.apply_style("color", "#ff0000").unwrap();

    for p in s.document().query_selector_all("p").unwrap() {
        assert_eq!(
            computed_style(s.document(), &p).get_property_value("color"),
            "rgb(255, 0, 0)"
        );
    }
}

#[test]
fn undo_removes_from_rules_and_history() {
    let mut s = session();
    s.select_selector("p").unwrap();
    s.apply_style("color", "#ff0000").unwrap();
    s.apply_style("padding", "1px").unwrap();
    let selector = s.active_selector().unwrap().to_string();

    let (property, _) = s.undo_last_change().unwrap();
    assert_eq!(property, "padding");
    assert_eq!(s.rules().get_value(&selector, "padding"), None);
    assert_eq!(s.history().get_value(&selector, "padding"), None);

    s.undo_last_change().unwrap();
    let rules = s.rules().clone();
    let history = s.history().clone();
    assert!(matches!(s.undo_last_change(), Err(Error::NothingToUndo(_))));
    assert_eq!(s.rules(), &rules);
    assert_eq!(s.history(), &history);
    assert!(!s.rules().contains(&selector));
}

#[test]
fn reset_removes_the_whole_rule() {
    let mut s = session();
    s.select_selector("section").unwrap();
    s.apply_style("background-color", "#000000").unwrap();
    s.apply_style("border-radius", "4px").unwrap();
    let node = s.active_element().cloned().unwrap();

    s.reset_to_original(&node).unwrap();
    assert!(!s.rules().contains("#main > section.card.wide"));
    assert_eq!(
        s.originals().get_value("#main > section.card.wide", "padding"),
        Some("8px")
    );
}

#[test]
fn export_carries_important() {
    let mut s = session();
    s.set_force_important(false);
    s.select_selector("p").unwrap();
    s.apply_style("color", "#ff0000").unwrap();

    let export = s.export_stylesheet();
    assert!(export.contains("#main > section.card.wide > p.note {\n  color: #ff0000 !important;\n}"));
    assert!(!s.injected_stylesheet_text().contains("!important"));
}

#[test]
fn clear_all_empties_the_injected_stylesheet() {
    let mut s = session();
    s.select_selector("p").unwrap();
    s.apply_style("color", "#ff0000").unwrap();
    s.clear_all_styles();
    s.regenerate_stylesheet();

    assert_eq!(s.injected_stylesheet_text(), "");
    assert!(s.active_element().is_none());
    assert!(!s.is_toolbox_visible());
    assert_eq!(s.stats().selectors, 0);
}

#[test]
fn the_toolbox_cannot_select_itself() {
    let mut s = session();
    assert!(matches!(s.select_selector("#ote-color"), Err(Error::IgnoredTarget)));
    assert!(matches!(s.select_selector("p >"), Err(Error::CssSelectorParse(_))));
    assert!(matches!(
        s.select_selector("table"),
        Err(Error::NoMatchingElement(_))
    ));
}

#[test]
fn state_survives_a_reload() {
    let mut s = session();
    s.select_selector("p").unwrap();
    s.apply_style("backgroundColor", "#123456").unwrap();
    s.set_force_important(false);
    let storage = s.storage().clone();

    let reloaded = StyleEditorSession::new(parse_html(PAGE).unwrap(), storage);
    assert_eq!(reloaded.rules(), s.rules());
    assert_eq!(reloaded.originals(), s.originals());
    assert!(!reloaded.force_important());
    assert!(reloaded.history().is_empty());
    assert_eq!(
        reloaded.injected_stylesheet_text(),
        "#main > section.card.wide > p.note {\n  background-color: #123456;\n}\n"
    );
}

#[test]
fn malformed_persisted_rules_start_empty() {
    let mut storage = MemoryStorage::new();
    storage.set(RULES_KEY, "{not json").unwrap();
    let s = StyleEditorSession::new(parse_html(PAGE).unwrap(), storage);
    assert!(s.rules().is_empty());
    assert_eq!(s.injected_stylesheet_text(), "");
}

#[test]
fn storage_failures_keep_the_session_working() {
    let mut s = StyleEditorSession::new(parse_html(PAGE).unwrap(), FailingStorage);
    s.select_selector("p").unwrap();
    s.apply_style("color", "#ff0000").unwrap();
    s.set_force_important(false);

    assert_eq!(s.stats().declarations, 1);
    assert_eq!(
        s.injected_stylesheet_text(),
        "#main > section.card.wide > p.note {\n  color: #ff0000;\n}\n"
    );
}

#[test]
fn clear_page_keeps_rules_of_other_pages() {
    let mut storage = MemoryStorage::new();
    storage
        .set(
            RULES_KEY,
            r##"{".checkout > button":{"color":"red"},"#main > span.foo":{"margin":"0"}}"##,
        )
        .unwrap();
    let mut s = StyleEditorSession::new(parse_html(PAGE).unwrap(), storage);
    assert_eq!(s.clear_current_page_styles(), 1);
    assert_eq!(
        s.rules().selectors().collect::<Vec<_>>(),
        vec![".checkout > button"]
    );
}

#[test]
fn prefill_reads_the_cascade() {
    let mut s = session();
    let p = s.document().query_selector("p").unwrap().unwrap();
    s.select(&p).unwrap();

    let prefill = s.prefill(&p);
    assert_eq!(prefill.text_color.as_str(), "#333333");
    assert_eq!(prefill.background_color.as_str(), "#f0f0f0");
    assert_eq!(prefill.border_color.as_str(), "#333333");
    assert_eq!(prefill.values["border"], "0px none rgb(51, 51, 51)");

    let section = s.document().query_selector("section").unwrap().unwrap();
    assert_eq!(s.prefill(&section).border_color.as_str(), "#cccccc");
}
