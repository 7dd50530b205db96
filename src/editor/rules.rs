use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::editor::property::{canonicalize_map, PropertyMap};

/// Selector to property map. Serialized as a plain nested JSON object.
///
/// A selector whose last property is removed is dropped, so no empty property map is ever kept.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectorMap(IndexMap<String, PropertyMap>);

/// All persisted overrides.
pub type StyleRuleSet = SelectorMap;
/// Edits made during the current selection, used for undo.
pub type UndoHistory = SelectorMap;
/// Computed values captured the first time a selector was selected.
pub type OriginalValues = SelectorMap;

impl SelectorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, selector: &str) -> Option<&PropertyMap> {
        self.0.get(selector)
    }

    pub fn get_value(&self, selector: &str, property: &str) -> Option<&str> {
        self.0
            .get(selector)
            .and_then(|props| props.get(property))
            .map(|v| v.as_str())
    }

    pub fn contains(&self, selector: &str) -> bool {
        self.0.contains_key(selector)
    }

    /// Upserts one property. An existing property keeps its position.
    pub fn set(&mut self, selector: &str, property: &str, value: &str) {
        self.0
            .entry(selector.to_string())
            .or_default()
            .insert(property.to_string(), value.to_string());
    }

    /// Inserts a whole property map for `selector` unless one already exists.
    /// Returns true if it was inserted.
    pub fn insert_if_absent(&mut self, selector: &str, props: PropertyMap) -> bool {
        if self.0.contains_key(selector) || props.is_empty() {
            return false;
        }
        self.0.insert(selector.to_string(), props);
        true
    }

    /// Removes one property, dropping the selector when it becomes empty.
    pub fn remove_property(&mut self, selector: &str, property: &str) -> Option<String> {
        let props = self.0.get_mut(selector)?;
        let removed = props.shift_remove(property);
        if props.is_empty() {
            self.0.shift_remove(selector);
        }
        removed
    }

    /// Removes and returns the most recently inserted property of `selector`.
    pub fn pop_last(&mut self, selector: &str) -> Option<(String, String)> {
        let props = self.0.get_mut(selector)?;
        let last = props.pop();
        if props.is_empty() {
            self.0.shift_remove(selector);
        }
        last
    }

    pub fn remove_selector(&mut self, selector: &str) -> Option<PropertyMap> {
        self.0.shift_remove(selector)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.0.retain(|selector, _| keep(selector));
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyMap)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of selectors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of declarations over all selectors.
    pub fn declaration_count(&self) -> usize {
        self.0.values().map(|props| props.len()).sum()
    }

    /// Canonicalizes property keys and drops selectors without properties.
    /// Applied to everything read back from storage.
    pub fn canonicalized(self) -> Self {
        Self(
            self.0
                .into_iter()
                .map(|(selector, props)| (selector, canonicalize_map(props)))
                .filter(|(_, props)| !props.is_empty())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_is_idempotent() {
        let mut once = SelectorMap::new();
        once.set("p", "color", "red");
        let mut twice = once.clone();
        twice.set("p", "color", "red");
        assert_eq!(once, twice);
    }

    #[test]
    fn removing_the_last_property_drops_the_selector() {
        let mut rules = SelectorMap::new();
        rules.set("p", "color", "red");
        rules.set("p", "margin", "0");
        assert_eq!(rules.remove_property("p", "color"), Some("red".into()));
        assert!(rules.contains("p"));
        assert_eq!(rules.remove_property("p", "margin"), Some("0".into()));
        assert!(!rules.contains("p"));
        assert_eq!(rules.remove_property("p", "margin"), None);
    }

    #[test]
    fn pop_last_follows_first_insertion_order() {
        let mut history = SelectorMap::new();
        history.set("p", "color", "red");
        history.set("p", "margin", "0");
        history.set("p", "color", "blue");
        assert_eq!(history.pop_last("p"), Some(("margin".into(), "0".into())));
        assert_eq!(history.pop_last("p"), Some(("color".into(), "blue".into())));
        assert_eq!(history.pop_last("p"), None);
        assert!(history.is_empty());
    }

    #[test]
    fn counts() {
        let mut rules = SelectorMap::new();
        rules.set("p", "color", "red");
        rules.set("p", "margin", "0");
        rules.set("#x", "color", "red");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.declaration_count(), 3);
    }

    #[test]
    fn json_shape_is_a_nested_object() {
        let mut rules = SelectorMap::new();
        rules.set("#main > p", "color", "red");
        assert_eq!(
            serde_json::to_string(&rules).unwrap(),
            r##"{"#main > p":{"color":"red"}}"##
        );
        let back: SelectorMap =
            serde_json::from_str(r##"{"p":{"backgroundColor":"red"},"q":{}}"##).unwrap();
        let back = back.canonicalized();
        assert_eq!(back.get_value("p", "background-color"), Some("red"));
        assert!(!back.contains("q"));
    }
}
