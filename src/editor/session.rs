use std::{
    fmt, fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::Serialize;

use crate::css::cascade::{computed_style, inline_style};
use crate::editor::{
    color::{to_display_hex, HexColor},
    config::EditorConfig,
    generator::generate_selector,
    hierarchy::{build_hierarchy, HierarchyEntry},
    property::{canonical_property_name, PropertyMap},
    rules::{OriginalValues, StyleRuleSet, UndoHistory},
    storage::{Storage, DEBUG_MODE_KEY, FORCE_IMPORTANT_KEY, ORIGINAL_VALUES_KEY, RULES_KEY},
    stylesheet::{render_export, render_stylesheet},
    values::{
        extract_color_from_border_shorthand, extract_numeric_value, parse_linear_gradient,
        BoxShadow, LinearGradient,
    },
};
use crate::error::{Error, Result};
use crate::html::dom::{closest_with_id, DocumentTree, DomNode, NodeRef};

/// Computed values snapshotted the first time a selector is selected.
pub const ORIGINAL_PROPERTIES: &[&str] = &[
    "color",
    "background-color",
    "font-size",
    "padding",
    "margin",
    "border",
    "border-radius",
    "height",
    "width",
    "box-shadow",
];

/// Properties the toolbox controls show.
pub const TOOLBOX_PROPERTIES: &[&str] = &[
    "color",
    "background-color",
    "background-image",
    "background",
    "font-size",
    "padding",
    "margin",
    "border",
    "border-radius",
    "box-shadow",
    "width",
    "height",
];

/// Controls backed by a number input.
const NUMERIC_PROPERTIES: &[&str] = &[
    "font-size",
    "padding",
    "margin",
    "border-radius",
    "width",
    "height",
];

/// Values the toolbox is filled with when an element is selected.
#[derive(Clone, Debug, Serialize)]
pub struct Prefill {
    pub selector: String,
    pub values: PropertyMap,
    pub numbers: IndexMap<String, f64>,
    pub text_color: HexColor,
    pub background_color: HexColor,
    pub border_color: HexColor,
    pub is_image: bool,
    pub gradient: Option<LinearGradient>,
    pub box_shadow: Option<BoxShadow>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub selectors: usize,
    pub declarations: usize,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} selectors, {} declarations",
            self.selectors, self.declarations
        )
    }
}

/// Owns everything the editor mutates while a page is open: the document, the rule store, the
/// undo history, the captured originals and the current selection.
pub struct StyleEditorSession<S: Storage> {
    document: DocumentTree,
    config: EditorConfig,
    storage: S,
    rules: StyleRuleSet,
    history: UndoHistory,
    originals: OriginalValues,
    active: Option<NodeRef>,
    active_selector: Option<String>,
    /// Selector the undo history belongs to. Survives a deselection.
    history_selector: Option<String>,
    hierarchy: Vec<HierarchyEntry>,
    force_important: bool,
    debug_mode: bool,
    toolbox_visible: bool,
}

impl<S: Storage> StyleEditorSession<S> {
    pub fn new(document: DocumentTree, storage: S) -> Self {
        Self::with_config(document, EditorConfig::default(), storage)
    }

    /// Creates a session and hydrates it from `storage`. The stored rules are injected into the
    /// document right away.
    pub fn with_config(document: DocumentTree, config: EditorConfig, storage: S) -> Self {
        let mut session = Self {
            document,
            config,
            storage,
            rules: StyleRuleSet::new(),
            history: UndoHistory::new(),
            originals: OriginalValues::new(),
            active: None,
            active_selector: None,
            history_selector: None,
            hierarchy: Vec::new(),
            force_important: true,
            debug_mode: false,
            toolbox_visible: false,
        };
        session.load();
        session
    }

    /// Reads rules, originals and options back from storage, then regenerates the stylesheet.
    /// Unreadable entries are logged and treated as empty.
    pub fn load(&mut self) {
        self.rules = self.read_map(RULES_KEY);
        self.originals = self.read_map(ORIGINAL_VALUES_KEY);
        self.force_important = self.read_flag(FORCE_IMPORTANT_KEY).unwrap_or(true);
        self.debug_mode = self.read_flag(DEBUG_MODE_KEY).unwrap_or(false);
        debug!(
            "loaded {} rules and {} original snapshots",
            self.rules.len(),
            self.originals.len()
        );
        self.regenerate_stylesheet();
    }

    fn read_map(&self, key: &str) -> StyleRuleSet {
        let parsed = self.storage.get(key).and_then(|value| match value {
            Some(json) => Ok(serde_json::from_str::<StyleRuleSet>(&json)?),
            None => Ok(StyleRuleSet::new()),
        });
        match parsed {
            Ok(map) => map.canonicalized(),
            Err(e) => {
                warn!("Failed to load `{}`: {}", key, e);
                StyleRuleSet::new()
            }
        }
    }

    fn read_flag(&self, key: &str) -> Option<bool> {
        match self.storage.get(key) {
            Ok(value) => value.map(|v| v.trim() == "true"),
            Err(e) => {
                warn!("Failed to load `{}`: {}", key, e);
                None
            }
        }
    }

    /// Writes the rules and originals to storage. Failures are logged, never returned.
    pub fn save(&mut self) {
        for (key, map) in [(RULES_KEY, &self.rules), (ORIGINAL_VALUES_KEY, &self.originals)] {
            let result = serde_json::to_string(map)
                .map_err(Error::from)
                .and_then(|json| self.storage.set(key, &json));
            if let Err(e) = result {
                warn!("Failed to save `{}`: {}", key, e);
            }
        }
    }

    fn save_flag(&mut self, key: &str, value: bool) {
        if let Err(e) = self.storage.set(key, if value { "true" } else { "false" }) {
            warn!("Failed to save `{}`: {}", key, e);
        }
    }

    /// Makes `node` the active element. Returns its selector.
    ///
    /// Elements of the editor UI (and their descendants) are rejected with
    /// [`Error::IgnoredTarget`].
    pub fn select(&mut self, node: &NodeRef) -> Result<String> {
        if !node.borrow().is_element() || closest_with_id(node, &self.config.reserved_ids).is_some()
        {
            debug!("ignored a selection inside the editor UI");
            return Err(Error::IgnoredTarget);
        }
        let selector = self.activate(node);
        self.hierarchy = build_hierarchy(node, &self.config);
        info!("Selected `{}`", selector);
        Ok(selector)
    }

    /// Selects the first element matching `query`.
    pub fn select_selector(&mut self, query: &str) -> Result<String> {
        let node = self
            .document
            .query_selector(query)?
            .ok_or_else(|| Error::NoMatchingElement(query.to_string()))?;
        self.select(&node)
    }

    /// Moves the selection to a level of the current hierarchy. The hierarchy itself is kept so
    /// that the user can move back down.
    pub fn select_from_hierarchy(&mut self, index: usize) -> Result<String> {
        let node = self
            .hierarchy
            .get(index)
            .map(|entry| Rc::clone(&entry.node))
            .ok_or(Error::HierarchyIndex(index))?;
        let selector = self.activate(&node);
        info!("Selected level {} `{}`", index, selector);
        Ok(selector)
    }

    fn activate(&mut self, node: &NodeRef) -> String {
        self.clear_highlight();
        if let Some(elm) = node.borrow_mut().element_mut() {
            elm.add_class(&self.config.highlight_class);
        }

        let selector = generate_selector(node, &self.config);
        if self.history_selector.as_deref() != Some(selector.as_str()) {
            self.history.clear();
            self.history_selector = Some(selector.clone());
        }
        self.store_original_values(node, &selector);

        self.active = Some(Rc::clone(node));
        self.active_selector = Some(selector.clone());
        self.toolbox_visible = true;
        selector
    }

    /// Snapshots the computed values of `node` the first time `selector` is seen.
    fn store_original_values(&mut self, node: &NodeRef, selector: &str) {
        if selector.is_empty() || self.originals.contains(selector) {
            return;
        }
        let style = computed_style(&self.document, node);
        let snapshot = ORIGINAL_PROPERTIES
            .iter()
            .map(|p| (p.to_string(), style.get_property_value(p)))
            .collect::<PropertyMap>();
        if self.originals.insert_if_absent(selector, snapshot) {
            debug!("captured original values of `{}`", selector);
            self.save();
        }
    }

    fn clear_highlight(&mut self) {
        if let Some(active) = self.active.take() {
            if let Some(elm) = active.borrow_mut().element_mut() {
                elm.remove_class(&self.config.highlight_class);
            };
        }
    }

    pub fn deselect(&mut self) {
        self.clear_highlight();
        self.active_selector = None;
        self.hierarchy.clear();
    }

    /// Deselects and closes the toolbox.
    pub fn hide(&mut self) {
        self.deselect();
        self.toolbox_visible = false;
    }

    fn require_active(&self) -> Result<(NodeRef, String)> {
        match (&self.active, &self.active_selector) {
            (Some(node), Some(selector)) => Ok((Rc::clone(node), selector.clone())),
            _ => {
                warn!("No active element is selected");
                Err(Error::NoActiveElement)
            }
        }
    }

    /// Sets `property` to `value` for every element matching the active element's selector.
    /// An empty value removes the property.
    pub fn apply_style(&mut self, property: &str, value: &str) -> Result<()> {
        let (_, selector) = self.require_active()?;
        let property = canonical_property_name(property);
        let value = value.trim();
        if value.contains([';', '{', '}']) {
            warn!("Rejected `{}: {}`: the value would escape its rule", property, value);
            return Err(Error::InvalidValue(value.to_string()));
        }

        if value.is_empty() {
            self.rules.remove_property(&selector, &property);
            self.history.remove_property(&selector, &property);
        } else {
            self.rules.set(&selector, &property, value);
            self.history.set(&selector, &property, value);
        }
        debug!("`{}` {{ {}: {} }}", selector, property, value);

        self.regenerate_stylesheet();
        self.save();
        Ok(())
    }

    /// Saved rule, then this selection's history, then the computed value.
    pub fn resolve_for_display(&self, node: &NodeRef, property: &str) -> String {
        let property = canonical_property_name(property);
        let selector = generate_selector(node, &self.config);
        if let Some(value) = self
            .rules
            .get_value(&selector, &property)
            .or_else(|| self.history.get_value(&selector, &property))
        {
            return value.to_string();
        }
        computed_style(&self.document, node).get_property_value(&property)
    }

    /// Collects the values the toolbox controls are filled with for `node`.
    pub fn prefill(&self, node: &NodeRef) -> Prefill {
        let values = TOOLBOX_PROPERTIES
            .iter()
            .map(|p| (p.to_string(), self.resolve_for_display(node, p)))
            .collect::<PropertyMap>();
        let value = |name: &str| values.get(name).map(|v| v.as_str()).unwrap_or_default();

        let numbers = NUMERIC_PROPERTIES
            .iter()
            .map(|p| (p.to_string(), extract_numeric_value(value(p))))
            .collect();

        let gradient = parse_linear_gradient(value("background-image"))
            .or_else(|| parse_linear_gradient(value("background")));
        let box_shadow = BoxShadow::parse(value("box-shadow")).unwrap_or_else(|e| {
            warn!("Failed to read the box shadow: {}", e);
            None
        });

        Prefill {
            selector: generate_selector(node, &self.config),
            text_color: to_display_hex(value("color"), &HexColor::black()),
            background_color: to_display_hex(value("background-color"), &HexColor::white()),
            border_color: self.border_color(node),
            is_image: is_image_element(node),
            gradient,
            box_shadow,
            numbers,
            values,
        }
    }

    /// The explicit `border-color`, else the color inside `border`, else the computed
    /// `border-color`.
    fn border_color(&self, node: &NodeRef) -> HexColor {
        let mut source = self.resolve_for_display(node, "border-color");
        if source.is_empty() || source == "initial" || source == "inherit" {
            source = self.resolve_for_display(node, "border");
        }
        let color = match extract_color_from_border_shorthand(&source) {
            Ok(Some(color)) => color,
            Ok(None) => computed_style(&self.document, node).get_property_value("border-color"),
            Err(e) => {
                warn!("Failed to read the border color: {}", e);
                String::new()
            }
        };
        to_display_hex(&color, &HexColor::black())
    }

    /// Removes the property most recently set during this selection.
    pub fn undo_last_change(&mut self) -> Result<(String, String)> {
        let (_, selector) = self.require_active()?;
        let Some((property, value)) = self.history.pop_last(&selector) else {
            warn!("No changes to undo for `{}`", selector);
            return Err(Error::NothingToUndo(selector));
        };
        self.rules.remove_property(&selector, &property);
        info!("Undid `{}: {}` on `{}`", property, value, selector);

        self.regenerate_stylesheet();
        self.save();
        Ok((property, value))
    }

    /// Drops every custom property of the selector `node` maps to.
    pub fn reset_to_original(&mut self, node: &NodeRef) -> Result<()> {
        let selector = generate_selector(node, &self.config);
        if !self.originals.contains(&selector) {
            warn!("No original values were captured for `{}`", selector);
            return Err(Error::MissingOriginal(selector));
        }
        self.rules.remove_selector(&selector);
        self.history.remove_selector(&selector);
        info!("Reset `{}` to its original style", selector);

        self.regenerate_stylesheet();
        self.save();
        Ok(())
    }

    /// Removes the rules whose selector matches something on this page. Unparseable selectors
    /// are removed as well. Returns the number of removed selectors.
    pub fn clear_current_page_styles(&mut self) -> usize {
        let document = &self.document;
        let before = self.rules.len();
        self.rules
            .retain(|selector| matches!(document.query_selector(selector), Ok(None)));
        let rules = &self.rules;
        self.history.retain(|selector| rules.contains(selector));
        let removed = before - self.rules.len();
        info!("Cleared {} rules of the current page", removed);

        self.regenerate_stylesheet();
        self.save();
        self.deselect();
        removed
    }

    pub fn clear_all_styles(&mut self) {
        self.rules.clear();
        self.history.clear();
        info!("Cleared all rules");

        self.regenerate_stylesheet();
        self.save();
        self.hide();
    }

    /// Replaces the text of the injected `<style>` element with the current rule set, creating
    /// the element in `<head>` if needed.
    pub fn regenerate_stylesheet(&mut self) {
        let css = self.stylesheet_text();
        let style = match self.document.get_element_by_id(&self.config.style_element_id) {
            Some(style) => style,
            None => {
                let parent = self
                    .document
                    .head()
                    .or_else(|| self.document.document_element())
                    .unwrap_or_else(|| Rc::clone(&self.document.root));
                DomNode::append_child(
                    &parent,
                    DomNode::new_element(
                        "style",
                        vec![("id".to_string(), self.config.style_element_id.clone())],
                    ),
                )
            }
        };
        DomNode::set_text_content(&style, &css);
    }

    /// The current text of the injected `<style>` element.
    pub fn injected_stylesheet_text(&self) -> String {
        self.document
            .get_element_by_id(&self.config.style_element_id)
            .map(|style| style.borrow().text_content())
            .unwrap_or_default()
    }

    pub fn stylesheet_text(&self) -> String {
        render_stylesheet(&self.rules, self.force_important)
    }

    pub fn export_stylesheet(&self) -> String {
        render_export(&self.rules)
    }

    /// Writes the exported style sheet to `path`. A directory gets the default file name.
    pub fn export_to(&self, path: &Path) -> Result<PathBuf> {
        let path = if path.is_dir() {
            path.join(&self.config.export_file_name)
        } else {
            path.to_path_buf()
        };
        fs::write(&path, self.export_stylesheet())?;
        info!("Exported {} rules to {}", self.rules.len(), path.display());
        Ok(path)
    }

    pub fn set_force_important(&mut self, force_important: bool) {
        self.force_important = force_important;
        self.save_flag(FORCE_IMPORTANT_KEY, force_important);
        self.regenerate_stylesheet();
    }

    pub fn set_debug_mode(&mut self, debug_mode: bool) {
        self.debug_mode = debug_mode;
        self.save_flag(DEBUG_MODE_KEY, debug_mode);
    }

    pub fn stats(&self) -> Stats {
        Stats {
            selectors: self.rules.len(),
            declarations: self.rules.declaration_count(),
        }
    }

    pub fn document(&self) -> &DocumentTree {
        &self.document
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn rules(&self) -> &StyleRuleSet {
        &self.rules
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    pub fn originals(&self) -> &OriginalValues {
        &self.originals
    }

    pub fn active_element(&self) -> Option<&NodeRef> {
        self.active.as_ref()
    }

    pub fn active_selector(&self) -> Option<&str> {
        self.active_selector.as_deref()
    }

    pub fn hierarchy(&self) -> &[HierarchyEntry] {
        &self.hierarchy
    }

    pub fn force_important(&self) -> bool {
        self.force_important
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    pub fn is_toolbox_visible(&self) -> bool {
        self.toolbox_visible
    }
}

/// `<img>`, `<svg>`, or an element with an inline background image.
pub fn is_image_element(node: &NodeRef) -> bool {
    let tag_name = node.borrow().get_tag_name();
    if matches!(tag_name.as_deref(), Some("img" | "svg")) {
        return true;
    }
    inline_style(node)
        .get("background-image")
        .is_some_and(|v| !v.trim().is_empty() && v.trim() != "none")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::storage::MemoryStorage;
    use crate::html::parse_html;

    const PAGE: &str = r#"<html><head><style>p { color: rgb(10, 20, 30); padding: 4px }</style></head>
        <body>
          <div id="main"><p class="note ojs-bar">one</p><p class="note">two</p></div>
          <div id="universal-theme-editor-toolbox"><button>x</button></div>
          <img src="a.png"><span style="background-image: url(b.png)">s</span>
        </body></html>"#;

    fn session() -> StyleEditorSession<MemoryStorage> {
        StyleEditorSession::new(parse_html(PAGE).unwrap(), MemoryStorage::new())
    }

    fn first(session: &StyleEditorSession<MemoryStorage>, query: &str) -> NodeRef {
        session.document().query_selector(query).unwrap().unwrap()
    }

    #[test]
    fn edits_need_a_selection() {
        let mut s = session();
        assert!(matches!(s.apply_style("color", "red"), Err(Error::NoActiveElement)));
        assert!(matches!(s.undo_last_change(), Err(Error::NoActiveElement)));
        assert!(s.rules().is_empty());
    }

    #[test]
    fn select_highlights_and_builds_the_hierarchy() {
        let mut s = session();
        let p = first(&s, "p");
        assert_eq!(s.select(&p).unwrap(), "#main > p.note");
        assert!(p.borrow().element().unwrap().has_class("universal-editor-highlight"));
        assert_eq!(s.hierarchy().len(), 2);
        assert!(s.is_toolbox_visible());

        assert_eq!(s.select_from_hierarchy(0).unwrap(), "#main");
        assert!(!p.borrow().element().unwrap().has_class("universal-editor-highlight"));
        assert_eq!(s.hierarchy().len(), 2);
        assert!(matches!(s.select_from_hierarchy(5), Err(Error::HierarchyIndex(5))));
    }

    #[test]
    fn editor_ui_is_not_selectable() {
        let mut s = session();
        let button = first(&s, "button");
        assert!(matches!(s.select(&button), Err(Error::IgnoredTarget)));
        assert!(s.active_element().is_none());
    }

    #[test]
    fn originals_are_captured_once() {
        let mut s = session();
        s.select_selector("p").unwrap();
        assert_eq!(
            s.originals().get_value("#main > p.note", "color"),
            Some("rgb(10, 20, 30)")
        );
        assert_eq!(s.originals().get_value("#main > p.note", "padding"), Some("4px"));

        s.apply_style("color", "#ff0000").unwrap();
        s.deselect();
        s.select_selector("p").unwrap();
        assert_eq!(
            s.originals().get_value("#main > p.note", "color"),
            Some("rgb(10, 20, 30)")
        );
    }

    #[test]
    fn apply_writes_rules_history_and_the_page() {
        let mut s = session();
        s.select_selector("p").unwrap();
        s.apply_style("backgroundColor", "#00ff00").unwrap();

        assert_eq!(s.rules().get_value("#main > p.note", "background-color"), Some("#00ff00"));
        assert_eq!(s.history().get_value("#main > p.note", "background-color"), Some("#00ff00"));
        assert_eq!(
            s.injected_stylesheet_text(),
            "#main > p.note {\n  background-color: #00ff00 !important;\n}\n"
        );

        let second = s.document().query_selector_all("p").unwrap()[1].clone();
        assert_eq!(
            computed_style(s.document(), &second).get_property_value("background-color"),
            "rgb(0, 255, 0)"
        );
    }

    #[test]
    fn resolution_order() {
        let mut s = session();
        let p = first(&s, "p");
        assert_eq!(s.resolve_for_display(&p, "color"), "rgb(10, 20, 30)");
        s.select(&p).unwrap();
        s.apply_style("color", "#ff0000").unwrap();
        assert_eq!(s.resolve_for_display(&p, "color"), "#ff0000");
        assert_eq!(s.resolve_for_display(&p, "fontSize"), "16px");
    }

    #[test]
    fn undo_pops_the_last_property() {
        let mut s = session();
        s.select_selector("p").unwrap();
        s.apply_style("color", "red").unwrap();
        s.apply_style("margin", "0").unwrap();

        assert_eq!(s.undo_last_change().unwrap(), ("margin".into(), "0".into()));
        assert_eq!(s.rules().get_value("#main > p.note", "margin"), None);
        assert_eq!(s.undo_last_change().unwrap(), ("color".into(), "red".into()));
        assert!(!s.rules().contains("#main > p.note"));

        let rules = s.rules().clone();
        assert!(matches!(s.undo_last_change(), Err(Error::NothingToUndo(_))));
        assert_eq!(s.rules(), &rules);
    }

    #[test]
    fn history_is_per_selection() {
        let mut s = session();
        s.select_selector("p").unwrap();
        s.apply_style("color", "red").unwrap();
        s.select_selector("img").unwrap();
        s.select_selector("p").unwrap();
        assert!(matches!(s.undo_last_change(), Err(Error::NothingToUndo(_))));
        assert_eq!(s.rules().get_value("#main > p.note", "color"), Some("red"));
    }

    #[test]
    fn history_survives_a_deselection() {
        let mut s = session();
        s.select_selector("p").unwrap();
        s.apply_style("color", "red").unwrap();
        s.deselect();
        s.select_selector("p").unwrap();
        assert_eq!(s.undo_last_change().unwrap(), ("color".into(), "red".into()));
        assert!(!s.rules().contains("#main > p.note"));

        s.apply_style("margin", "0").unwrap();
        s.hide();
        s.select_selector("p").unwrap();
        assert_eq!(s.undo_last_change().unwrap(), ("margin".into(), "0".into()));
    }

    #[test]
    fn values_cannot_escape_their_rule() {
        let mut s = session();
        s.select_selector("p").unwrap();
        s.apply_style("color", "blue").unwrap();
        for value in ["red; } body { display: none", "red;", "{", "x }"] {
            assert!(matches!(s.apply_style("color", value), Err(Error::InvalidValue(_))));
        }
        assert_eq!(s.rules().get_value("#main > p.note", "color"), Some("blue"));
        assert_eq!(
            s.injected_stylesheet_text(),
            "#main > p.note {\n  color: blue !important;\n}\n"
        );
    }

    #[test]
    fn reset_requires_a_snapshot() {
        let mut s = session();
        let img = first(&s, "img");
        assert!(matches!(s.reset_to_original(&img), Err(Error::MissingOriginal(_))));

        s.select(&img).unwrap();
        s.apply_style("width", "10px").unwrap();
        s.reset_to_original(&img).unwrap();
        assert!(!s.rules().contains("img"));
        assert!(s.history().is_empty());
    }

    #[test]
    fn clearing_the_page_keeps_foreign_rules() {
        let mut storage = MemoryStorage::new();
        storage
            .set(
                RULES_KEY,
                r##"{"#main > p.note":{"color":"red"},"#elsewhere":{"color":"blue"},"#1bad":{"color":"green"}}"##,
            )
            .unwrap();
        let mut s = StyleEditorSession::new(parse_html(PAGE).unwrap(), storage);
        s.select_selector("p").unwrap();

        assert_eq!(s.clear_current_page_styles(), 2);
        assert_eq!(s.rules().selectors().collect::<Vec<_>>(), vec!["#elsewhere"]);
        assert!(s.active_element().is_none());
    }

    #[test]
    fn clearing_the_page_drops_its_history() {
        let mut s = session();
        let p = first(&s, "p");
        s.select(&p).unwrap();
        s.apply_style("color", "#ff0000").unwrap();

        assert_eq!(s.clear_current_page_styles(), 1);
        assert!(s.rules().is_empty());
        assert!(s.history().is_empty());
        assert_eq!(s.resolve_for_display(&p, "color"), "rgb(10, 20, 30)");

        s.select(&p).unwrap();
        assert!(matches!(s.undo_last_change(), Err(Error::NothingToUndo(_))));
    }

    #[test]
    fn prefill_values() {
        let mut s = session();
        let p = first(&s, "p");
        s.select(&p).unwrap();
        s.apply_style("border", "2px solid #FF0000").unwrap();
        s.apply_style("box-shadow", "1px 2px 3px rgba(0, 0, 0, 0.5)").unwrap();
        s.apply_style(
            "background-image",
            "linear-gradient(45deg, #112233 0%, #445566 30%, #112233 100%)",
        )
        .unwrap();

        let prefill = s.prefill(&p);
        assert_eq!(prefill.selector, "#main > p.note");
        assert_eq!(prefill.text_color.as_str(), "#0a141e");
        assert_eq!(prefill.background_color.as_str(), "#f0f0f0");
        assert_eq!(prefill.border_color.as_str(), "#ff0000");
        assert_eq!(prefill.numbers["padding"], 4.0);
        assert_eq!(prefill.numbers["font-size"], 16.0);
        assert_eq!(prefill.gradient.unwrap().end_position, 30.0);
        assert_eq!(prefill.box_shadow.unwrap().blur, 3.0);
        assert!(!prefill.is_image);

        assert!(is_image_element(&first(&s, "img")));
        assert!(is_image_element(&first(&s, "span")));
    }

    #[test]
    fn force_important_is_persisted() {
        let mut s = session();
        s.select_selector("p").unwrap();
        s.apply_style("color", "red").unwrap();
        s.set_force_important(false);
        assert_eq!(s.injected_stylesheet_text(), "#main > p.note {\n  color: red;\n}\n");
        assert_eq!(s.storage().get(FORCE_IMPORTANT_KEY).unwrap(), Some("false".into()));
    }
}
