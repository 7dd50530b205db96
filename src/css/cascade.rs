use indexmap::IndexMap;
use log::debug;

use crate::{
    css::{
        color::Color,
        cssom::{Declaration, StyleSheet},
        parser::{parse_declaration_list, parse_stylesheet},
        property::{collapse_box, expand, initial_value, is_color_property, is_inherited, longhands},
    },
    html::dom::{parent_element, DocumentTree, NodeRef},
};

/// Elements that generate a block box in the UA style sheet.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "details", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "html", "main", "nav", "ol", "p", "pre", "section", "summary", "ul",
];

/// Elements that are never rendered.
const HIDDEN_ELEMENTS: &[&str] = &[
    "base", "head", "link", "meta", "noscript", "script", "style", "template", "title",
];

/// Collects the author style sheets of the document: every `<style>` element in tree order.
pub fn collect_style_sheets(document: &DocumentTree) -> Vec<StyleSheet> {
    document
        .elements_by_tag_name("style")
        .iter()
        .map(|style| parse_stylesheet(&style.borrow().text_content()))
        .collect()
}

/// Equivalent of `getComputedStyle(node)`.
pub fn computed_style(document: &DocumentTree, node: &NodeRef) -> ComputedStyle {
    StyleResolver::new(document).computed_style(node)
}

/// Resolves computed styles against a fixed set of style sheets.
#[derive(Debug)]
pub struct StyleResolver {
    style_sheets: Vec<StyleSheet>,
}

impl StyleResolver {
    pub fn new(document: &DocumentTree) -> Self {
        Self {
            style_sheets: collect_style_sheets(document),
        }
    }

    pub fn computed_style(&self, node: &NodeRef) -> ComputedStyle {
        let parent = parent_element(node).map(|p| Box::new(self.computed_style(&p)));
        let tag_name = node.borrow().get_tag_name().unwrap_or_default();
        let cascaded = apply_filtering(node, &self.style_sheets).apply_cascading();
        debug!(
            "cascaded {} declarations for <{}>",
            cascaded.values.len(),
            tag_name
        );
        ComputedStyle {
            tag_name,
            cascaded,
            parent,
        }
    }
}

/// Where a declaration comes from; later variants take precedence.
/// https://www.w3.org/TR/css-cascade-3/#cascade-origin
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Normal,
    NormalInline,
    Important,
    ImportantInline,
}

impl Precedence {
    fn of(declaration: &Declaration, inline: bool) -> Self {
        match (declaration.important, inline) {
            (false, false) => Precedence::Normal,
            (false, true) => Precedence::NormalInline,
            (true, false) => Precedence::Important,
            (true, true) => Precedence::ImportantInline,
        }
    }
}

/// Returns all declared values that match the node.
/// https://www.w3.org/TR/css-cascade-3/#filtering
fn apply_filtering(node: &NodeRef, style_sheets: &[StyleSheet]) -> DeclaredStyle {
    let mut declared_values = DeclaredStyle::new();

    // Declarations from the style sheets are treated as if they were concatenated in document order.
    for rule in style_sheets.iter().flat_map(|s| s.rules.iter()) {
        if let Some(selector) = rule.best_match(node) {
            declared_values.add(selector.calc_specificity(), &rule.declarations, false);
        }
    }

    let inline = node
        .borrow()
        .element()
        .and_then(|elm| elm.get_attribute("style").map(parse_declaration_list));
    if let Some(declarations) = inline {
        declared_values.add(0, &declarations, true);
    }

    declared_values
}

/// https://www.w3.org/TR/css-cascade-3/#declared
#[derive(Debug, Default)]
pub struct DeclaredStyle {
    /// (precedence, specificity, order of appearance, declaration)
    pub values: Vec<(Precedence, u32, usize, Declaration)>,
}

impl DeclaredStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, specificity: u32, declarations: &[Declaration], inline: bool) {
        for declaration in declarations {
            let order = self.values.len();
            self.values.push((
                Precedence::of(declaration, inline),
                specificity,
                order,
                declaration.clone(),
            ));
        }
    }

    /// Returns the cascaded values, which are the declared values that "win" the cascade.
    /// There is at most one cascaded value per property per element.
    /// https://www.w3.org/TR/css-cascade-3/#cascading
    pub fn apply_cascading(&self) -> CascadedStyle {
        let mut sorted_list = self.values.iter().collect::<Vec<_>>();
        // Highest priority first: precedence, then specificity, then the later declaration.
        sorted_list.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| b.1.cmp(&a.1))
                .then_with(|| b.2.cmp(&a.2))
        });

        let mut cascaded_values = CascadedStyle::default();
        for (_, _, _, declaration) in sorted_list {
            for (name, value) in expand(&declaration.name, &declaration.value) {
                // Lower-priority declarations of a property that already has a value are ignored.
                cascaded_values.add(&name, &value);
            }
        }
        cascaded_values
    }
}

/// https://www.w3.org/TR/css-cascade-3/#cascaded
#[derive(Clone, Debug, Default)]
pub struct CascadedStyle {
    pub values: IndexMap<String, String>,
}

impl CascadedStyle {
    pub fn add(&mut self, name: &str, value: &str) {
        self.values
            .entry(name.to_string())
            .or_insert_with(|| value.to_string());
    }
}

/// Computed style of one element. Inherited and defaulted values are resolved lazily
/// through the parent chain.
#[derive(Clone, Debug)]
pub struct ComputedStyle {
    tag_name: String,
    cascaded: CascadedStyle,
    parent: Option<Box<ComputedStyle>>,
}

impl ComputedStyle {
    /// Equivalent of `CSSStyleDeclaration.getPropertyValue()`. Unknown properties yield "".
    pub fn get_property_value(&self, name: &str) -> String {
        let name = name.trim();
        if name.starts_with("--") {
            return self.get_custom_property(name);
        }
        let name = name.to_ascii_lowercase();
        if let Some(names) = longhands(&name) {
            return self.get_shorthand_value(&name, &names);
        }
        self.get_longhand_value(&name).unwrap_or_default()
    }

    fn get_custom_property(&self, name: &str) -> String {
        match self.cascaded.values.get(name) {
            Some(v) => v.clone(),
            None => self
                .parent
                .as_ref()
                .map(|p| p.get_custom_property(name))
                .unwrap_or_default(),
        }
    }

    fn get_shorthand_value(&self, name: &str, names: &[String]) -> String {
        let values = names
            .iter()
            .map(|n| self.get_longhand_value(n).unwrap_or_default())
            .collect::<Vec<_>>();
        match name {
            "background" => format!("{} {}", values[0], values[1]),
            "border" => {
                let (widths, rest) = values.split_at(4);
                let (styles, colors) = rest.split_at(4);
                let all_same = |v: &[String]| v.iter().all(|x| *x == v[0]);
                if all_same(widths) && all_same(styles) && all_same(colors) {
                    format!("{} {} {}", widths[0], styles[0], colors[0])
                } else {
                    String::new()
                }
            }
            _ if names.len() == 3 => values.join(" "),
            _ => collapse_box(&values),
        }
    }

    fn get_longhand_value(&self, name: &str) -> Option<String> {
        let specified = match self.cascaded.values.get(name).map(|v| v.as_str()) {
            Some(v) if v.eq_ignore_ascii_case("inherit") => return Some(self.inherited_value(name)),
            Some(v) if v.eq_ignore_ascii_case("initial") => None,
            Some(v) if v.eq_ignore_ascii_case("unset") => {
                if is_inherited(name) {
                    return Some(self.inherited_value(name));
                }
                None
            }
            Some(v) => Some(v.to_string()),
            None if is_inherited(name) && self.parent.is_some() => {
                return Some(self.inherited_value(name))
            }
            None => None,
        };

        let value = match specified {
            Some(v) => v,
            None => self.default_value(name)?,
        };
        Some(self.compute(name, &value))
    }

    fn inherited_value(&self, name: &str) -> String {
        match &self.parent {
            Some(parent) => parent.get_longhand_value(name).unwrap_or_default(),
            None => self
                .default_value(name)
                .map(|v| self.compute(name, &v))
                .unwrap_or_default(),
        }
    }

    fn default_value(&self, name: &str) -> Option<String> {
        if name == "display" {
            let display = if HIDDEN_ELEMENTS.contains(&self.tag_name.as_str()) {
                "none"
            } else if BLOCK_ELEMENTS.contains(&self.tag_name.as_str()) {
                "block"
            } else if self.tag_name == "li" {
                "list-item"
            } else {
                "inline"
            };
            return Some(display.to_string());
        }
        initial_value(name).map(|v| v.to_string())
    }

    /// Turns a specified value into its computed form.
    /// https://www.w3.org/TR/css-cascade-3/#computed
    fn compute(&self, name: &str, value: &str) -> String {
        if is_color_property(name) {
            return self.compute_color(name, value);
        }
        if name.ends_with("-width") && name.starts_with("border-") {
            let style = name.replace("-width", "-style");
            let style = self.get_longhand_value(&style).unwrap_or_default();
            if style == "none" || style == "hidden" {
                return "0px".to_string();
            }
            return match value {
                "thin" => "1px".to_string(),
                "medium" => "3px".to_string(),
                "thick" => "5px".to_string(),
                v => v.to_string(),
            };
        }
        match name {
            "font-size" => self.compute_font_size(value),
            "font-weight" => match value {
                "normal" => "400".to_string(),
                "bold" => "700".to_string(),
                v => v.to_string(),
            },
            _ => value.to_string(),
        }
    }

    fn compute_color(&self, name: &str, value: &str) -> String {
        if value.eq_ignore_ascii_case("currentcolor") {
            return if name == "color" {
                self.parent
                    .as_ref()
                    .and_then(|p| p.get_longhand_value("color"))
                    .unwrap_or_else(|| Color::default().to_string())
            } else {
                self.get_longhand_value("color").unwrap_or_default()
            };
        }
        Color::parse(value)
            .map(|c| c.to_string())
            .unwrap_or_else(|_| value.to_string())
    }

    /// https://developer.mozilla.org/en-US/docs/Web/CSS/font-size
    fn compute_font_size(&self, value: &str) -> String {
        let parent_px = || {
            self.parent
                .as_ref()
                .and_then(|p| p.get_longhand_value("font-size"))
                .and_then(|v| v.strip_suffix("px").and_then(|n| n.parse::<f64>().ok()))
                .unwrap_or(16.0)
        };
        let px = match value {
            "xx-small" => Some(9.0),
            "x-small" => Some(10.0),
            "small" => Some(13.0),
            "medium" => Some(16.0),
            "large" => Some(18.0),
            "x-large" => Some(24.0),
            "xx-large" => Some(32.0),
            "smaller" => Some(parent_px() / 1.2),
            "larger" => Some(parent_px() * 1.2),
            v => {
                if let Some(n) = v.strip_suffix("rem").and_then(|n| n.parse::<f64>().ok()) {
                    Some(n * 16.0)
                } else if let Some(n) = v.strip_suffix("em").and_then(|n| n.parse::<f64>().ok()) {
                    Some(n * parent_px())
                } else if let Some(n) = v.strip_suffix('%').and_then(|n| n.parse::<f64>().ok()) {
                    Some(n / 100.0 * parent_px())
                } else if let Some(n) = v.strip_suffix("pt").and_then(|n| n.parse::<f64>().ok()) {
                    Some(n * 4.0 / 3.0)
                } else {
                    None
                }
            }
        };
        match px {
            Some(px) => format!("{}px", (px * 100.0).round() / 100.0),
            None => value.to_string(),
        }
    }
}

/// Parses the inline `style` attribute of a node as an ordered property map.
pub fn inline_style(node: &NodeRef) -> IndexMap<String, String> {
    let style = node
        .borrow()
        .element()
        .and_then(|e| e.get_attribute("style").map(|s| s.to_string()));
    style
        .map(|s| {
            parse_declaration_list(&s)
                .into_iter()
                .map(|d| (d.name, d.value))
                .collect()
        })
        .unwrap_or_default()
}
