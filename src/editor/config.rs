use serde::Serialize;

/// Tunables of the style editor. The defaults are the values the extension ships with.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EditorConfig {
    /// Number of element levels a generated selector may span before it stops ascending.
    pub max_selector_depth: usize,
    /// Classes starting with one of these belong to the editor itself and never appear in selectors.
    pub internal_class_prefixes: Vec<String>,
    /// State-like class names that are too volatile to key rules on.
    pub volatile_classes: Vec<String>,
    /// Id of the `<style>` element the rule set is injected into.
    pub style_element_id: String,
    pub highlight_class: String,
    /// Ids of the editor's own UI. Clicks on these elements or inside them are ignored.
    pub reserved_ids: Vec<String>,
    pub export_file_name: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_selector_depth: 4,
            internal_class_prefixes: vec!["universal-".into(), "ote-".into(), "ojs-".into()],
            volatile_classes: vec!["hover".into(), "focus".into()],
            style_element_id: "universal-dynamic-styles".into(),
            highlight_class: "universal-editor-highlight".into(),
            reserved_ids: vec![
                "universal-theme-editor-toolbox".into(),
                "universal-theme-toggle-btn".into(),
                "universal-theme-options-panel".into(),
                "ote-about-dialog".into(),
                "ote-instruction".into(),
            ],
            export_file_name: "custom-universal-theme.css".into(),
        }
    }
}

impl EditorConfig {
    /// Returns true if `class_name` may be used in a generated selector.
    pub fn is_selectable_class(&self, class_name: &str) -> bool {
        !self
            .internal_class_prefixes
            .iter()
            .any(|prefix| class_name.starts_with(prefix.as_str()))
            && !self.volatile_classes.iter().any(|c| c == class_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_internal_and_volatile_classes() {
        let config = EditorConfig::default();
        assert!(config.is_selectable_class("card"));
        assert!(!config.is_selectable_class("ojs-bar"));
        assert!(!config.is_selectable_class("universal-editor-highlight"));
        assert!(!config.is_selectable_class("ote-panel"));
        assert!(!config.is_selectable_class("hover"));
        assert!(config.is_selectable_class("hovered"));
    }
}
