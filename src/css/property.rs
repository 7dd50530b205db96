//! Property metadata used by the cascade: which properties inherit, their initial values,
//! and how shorthands expand into longhands and serialize back.

use crate::css::color::Color;

const SIDES: [&str; 4] = ["top", "right", "bottom", "left"];
const CORNERS: [&str; 4] = ["top-left", "top-right", "bottom-right", "bottom-left"];

/// https://www.w3.org/TR/CSS22/propidx.html
const INHERITED: &[&str] = &[
    "color",
    "cursor",
    "direction",
    "font-family",
    "font-size",
    "font-style",
    "font-variant",
    "font-weight",
    "letter-spacing",
    "line-height",
    "list-style-position",
    "list-style-type",
    "text-align",
    "text-indent",
    "text-transform",
    "visibility",
    "white-space",
    "word-spacing",
];

const BORDER_STYLES: &[&str] = &[
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
];

pub fn is_inherited(name: &str) -> bool {
    INHERITED.contains(&name)
}

pub fn is_color_property(name: &str) -> bool {
    matches!(
        name,
        "color"
            | "background-color"
            | "outline-color"
            | "caret-color"
            | "text-decoration-color"
            | "column-rule-color"
    ) || (name.starts_with("border-") && name.ends_with("-color") && name != "border-color")
}

/// Initial value of a longhand, in its computed form. `None` for unknown properties.
pub fn initial_value(name: &str) -> Option<&'static str> {
    let v = match name {
        "color" => "rgb(0, 0, 0)",
        "background-color" => "rgba(0, 0, 0, 0)",
        "background-image" => "none",
        "box-shadow" | "text-shadow" | "text-decoration-line" | "transform" | "float" => "none",
        "display" => "inline",
        "font-size" => "16px",
        "font-family" => "serif",
        "font-style" | "font-variant" | "letter-spacing" | "word-spacing" | "line-height"
        | "white-space" => "normal",
        "font-weight" => "400",
        "text-align" => "start",
        "text-indent" => "0px",
        "text-transform" => "none",
        "visibility" => "visible",
        "cursor" => "auto",
        "direction" => "ltr",
        "list-style-type" => "disc",
        "list-style-position" => "outside",
        "opacity" => "1",
        "position" => "static",
        "overflow" => "visible",
        "z-index" | "width" | "height" | "top" | "right" | "bottom" | "left" => "auto",
        "min-width" | "min-height" => "auto",
        "max-width" | "max-height" => "none",
        "outline-style" => "none",
        "outline-width" => "3px",
        "outline-color" | "caret-color" | "text-decoration-color" | "column-rule-color" => {
            "currentcolor"
        }
        _ => {
            if let Some(rest) = name.strip_prefix("margin-").or(name.strip_prefix("padding-")) {
                if SIDES.contains(&rest) {
                    return Some("0px");
                }
                return None;
            }
            if let Some(rest) = name.strip_prefix("border-") {
                if let Some(corner) = rest.strip_suffix("-radius") {
                    return CORNERS.contains(&corner).then_some("0px");
                }
                let (side, part) = rest.split_once('-')?;
                if !SIDES.contains(&side) {
                    return None;
                }
                return match part {
                    "width" => Some("3px"),
                    "style" => Some("none"),
                    "color" => Some("currentcolor"),
                    _ => None,
                };
            }
            return None;
        }
    };
    Some(v)
}

/// Longhands a shorthand expands to, in serialization order.
pub fn longhands(name: &str) -> Option<Vec<String>> {
    let sided = |prefix: &str, suffix: &str| {
        SIDES
            .iter()
            .map(|s| format!("{}-{}{}", prefix, s, suffix))
            .collect::<Vec<_>>()
    };
    match name {
        "margin" => Some(sided("margin", "")),
        "padding" => Some(sided("padding", "")),
        "border-width" => Some(sided("border", "-width")),
        "border-style" => Some(sided("border", "-style")),
        "border-color" => Some(sided("border", "-color")),
        "border-radius" => Some(
            CORNERS
                .iter()
                .map(|c| format!("border-{}-radius", c))
                .collect(),
        ),
        "border" => Some(
            ["-width", "-style", "-color"]
                .iter()
                .flat_map(|suffix| sided("border", suffix))
                .collect(),
        ),
        "background" => Some(vec!["background-color".into(), "background-image".into()]),
        _ => {
            let side = name.strip_prefix("border-")?;
            SIDES.contains(&side).then(|| {
                ["width", "style", "color"]
                    .iter()
                    .map(|p| format!("border-{}-{}", side, p))
                    .collect()
            })
        }
    }
}

/// Expands a declaration into longhand declarations. Longhands and unknown properties pass
/// through unchanged. CSS-wide keywords apply to every longhand.
pub fn expand(name: &str, value: &str) -> Vec<(String, String)> {
    let Some(names) = longhands(name) else {
        return vec![(name.to_string(), value.to_string())];
    };
    let lower = value.trim().to_ascii_lowercase();
    if matches!(lower.as_str(), "inherit" | "initial" | "unset") {
        return names.into_iter().map(|n| (n, lower.clone())).collect();
    }

    let parts = split_top_level(value, |c| c.is_ascii_whitespace());
    let values: Vec<String> = match name {
        "margin" | "padding" | "border-width" | "border-style" | "border-color" => {
            expand_box(&parts)
        }
        "border-radius" => {
            // Only the horizontal radii; the part after `/` is dropped.
            let horizontal = parts
                .iter()
                .take_while(|p| p.as_str() != "/")
                .cloned()
                .collect::<Vec<_>>();
            expand_box(&horizontal)
        }
        "border" => {
            let (width, style, color) = parse_border_parts(&parts);
            [width, style, color]
                .iter()
                .flat_map(|v| std::iter::repeat(v.clone()).take(4))
                .collect()
        }
        "background" => {
            let (color, image) = parse_background_parts(&parts);
            vec![color, image]
        }
        _ => {
            let (width, style, color) = parse_border_parts(&parts);
            vec![width, style, color]
        }
    };

    if values.len() != names.len() {
        return Vec::new();
    }
    names.into_iter().zip(values).collect()
}

/// https://www.w3.org/TR/css-box-4/#margin-shorthand
fn expand_box(parts: &[String]) -> Vec<String> {
    match parts {
        [all] => vec![all.clone(); 4],
        [tb, rl] => vec![tb.clone(), rl.clone(), tb.clone(), rl.clone()],
        [t, rl, b] => vec![t.clone(), rl.clone(), b.clone(), rl.clone()],
        [t, r, b, l] => vec![t.clone(), r.clone(), b.clone(), l.clone()],
        _ => Vec::new(),
    }
}

fn parse_border_parts(parts: &[String]) -> (String, String, String) {
    let mut width = None;
    let mut style = None;
    let mut color = None;
    for part in parts {
        let lower = part.to_ascii_lowercase();
        if BORDER_STYLES.contains(&lower.as_str()) {
            style = Some(lower);
        } else if is_length_like(&lower) {
            width = Some(lower);
        } else if lower == "currentcolor" || Color::parse(&lower).is_ok() {
            color = Some(part.clone());
        }
    }
    (
        width.unwrap_or_else(|| "medium".into()),
        style.unwrap_or_else(|| "none".into()),
        color.unwrap_or_else(|| "currentcolor".into()),
    )
}

fn parse_background_parts(parts: &[String]) -> (String, String) {
    let mut color = None;
    let mut image = None;
    for part in parts {
        let lower = part.to_ascii_lowercase();
        if lower.starts_with("url(") || lower.contains("gradient(") {
            image = Some(part.clone());
        } else if lower == "currentcolor" || Color::parse(&lower).is_ok() {
            color = Some(part.clone());
        }
    }
    (
        color.unwrap_or_else(|| "transparent".into()),
        image.unwrap_or_else(|| "none".into()),
    )
}

fn is_length_like(value: &str) -> bool {
    matches!(value, "thin" | "medium" | "thick")
        || value
            .trim_start_matches(['+', '-'])
            .starts_with(|c: char| c.is_ascii_digit() || c == '.')
}

/// Serializes four side values the way `getComputedStyle` collapses box shorthands.
pub fn collapse_box(values: &[String]) -> String {
    match values {
        [t, r, b, l] if t == r && r == b && b == l => t.clone(),
        [t, r, b, l] if t == b && r == l => format!("{} {}", t, r),
        [t, r, b, l] if r == l => format!("{} {} {}", t, r, b),
        _ => values.join(" "),
    }
}

/// Splits `value` on separator characters that are not nested inside parentheses or quotes.
/// Empty pieces are dropped and each piece is trimmed.
pub fn split_top_level(value: &str, is_separator: impl Fn(char) -> bool) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote = None;

    for c in value.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, c) if depth == 0 && is_separator(c) => {
                let part = current.trim();
                if !part.is_empty() {
                    parts.push(part.to_string());
                }
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    let part = current.trim();
    if !part.is_empty() {
        parts.push(part.to_string());
    }
    parts
}
