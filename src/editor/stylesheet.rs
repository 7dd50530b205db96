use log::debug;

use crate::css::selector::parse_selector_list;
use crate::editor::rules::StyleRuleSet;

pub const EXPORT_HEADER: &str = "/* --- Custom Universal Theme Styles --- */";

/// Serializes the rule set into the text of the injected `<style>` element.
///
/// Selectors that do not parse are skipped. Each declaration carries `!important`
/// when `force_important` is set.
pub fn render_stylesheet(rules: &StyleRuleSet, force_important: bool) -> String {
    let mut css = String::new();
    for (selector, props) in rules.iter() {
        if let Err(e) = parse_selector_list(selector) {
            debug!("skipped the rule for `{}`: {}", selector, e);
            continue;
        }
        write_block(&mut css, selector, props.iter(), force_important);
    }
    css
}

/// Serializes the rule set as a downloadable style sheet. Every declaration is `!important`.
pub fn render_export(rules: &StyleRuleSet) -> String {
    let mut css = format!("{}\n\n", EXPORT_HEADER);
    for (selector, props) in rules.iter() {
        write_block(&mut css, selector, props.iter(), true);
        css.push('\n');
    }
    css
}

fn write_block<'a>(
    css: &mut String,
    selector: &str,
    props: impl Iterator<Item = (&'a String, &'a String)>,
    important: bool,
) {
    css.push_str(selector);
    css.push_str(" {\n");
    for (property, value) in props {
        css.push_str("  ");
        css.push_str(property);
        css.push_str(": ");
        css.push_str(value);
        if important {
            css.push_str(" !important");
        }
        css.push_str(";\n");
    }
    css.push_str("}\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::parser::parse_stylesheet;

    fn sample() -> StyleRuleSet {
        let mut rules = StyleRuleSet::new();
        rules.set("#main > p.note", "color", "#ff0000");
        rules.set("#main > p.note", "padding", "4px 8px");
        rules.set("#1bad", "color", "blue");
        rules.set("h1", "font-size", "2em");
        rules
    }

    #[test]
    fn injected_text() {
        assert_eq!(
            render_stylesheet(&sample(), true),
            "#main > p.note {\n  color: #ff0000 !important;\n  padding: 4px 8px !important;\n}\nh1 {\n  font-size: 2em !important;\n}\n"
        );
        assert_eq!(
            render_stylesheet(&sample(), false),
            "#main > p.note {\n  color: #ff0000;\n  padding: 4px 8px;\n}\nh1 {\n  font-size: 2em;\n}\n"
        );
        assert_eq!(render_stylesheet(&StyleRuleSet::new(), true), "");
    }

    #[test]
    fn export_text() {
        let text = render_export(&sample());
        assert!(text.starts_with("/* --- Custom Universal Theme Styles --- */\n\n"));
        assert!(text.contains("#main > p.note {\n  color: #ff0000 !important;\n"));
        assert!(text.contains("#1bad {\n  color: blue !important;\n}\n\n"));
    }

    #[test]
    fn rendered_text_parses_back() {
        let sheet = parse_stylesheet(&render_stylesheet(&sample(), true));
        assert_eq!(sheet.rules.len(), 2);
        assert_eq!(sheet.rules[0].selector_text, "#main > p.note");
        let values = sheet.rules[0]
            .declarations
            .iter()
            .map(|d| (d.name.as_str(), d.value.as_str(), d.important))
            .collect::<Vec<_>>();
        assert_eq!(
            values,
            vec![("color", "#ff0000", true), ("padding", "4px 8px", true)]
        );
    }
}
