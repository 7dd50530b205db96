//! Helpers that pull control values out of CSS value strings.

use std::fmt;

use regex::Regex;
use serde::Serialize;

use crate::css::{color::Color, property::split_top_level};
use crate::error::Result;

/// Returns the first unsigned numeric run of `value`, e.g. `16` for `16px`.
/// `auto`, `none`, the empty string, and values without digits give 0.
pub fn extract_numeric_value(value: &str) -> f64 {
    let value = value.trim();
    if value.is_empty() || value == "auto" || value == "none" {
        return 0.0;
    }
    let number = value
        .char_indices()
        .skip_while(|(_, c)| !c.is_ascii_digit() && *c != '.')
        .take_while(|(_, c)| c.is_ascii_digit() || *c == '.')
        .map(|(_, c)| c)
        .collect::<String>();
    leading_float(&number).unwrap_or(0.0)
}

/// Parses the longest prefix of `s` that is a float, as `parseFloat` would.
fn leading_float(s: &str) -> Option<f64> {
    (1..=s.len()).rev().find_map(|end| s[..end].parse::<f64>().ok())
}

/// Finds the color component of a border-like shorthand such as `2px solid #ff0000`.
///
/// Hex and `rgb()`/`rgba()` colors are searched first, then named colors.
pub fn extract_color_from_border_shorthand(shorthand: &str) -> Result<Option<String>> {
    let patterns = [
        r"#[0-9a-fA-F]{6}\b",
        r"#[0-9a-fA-F]{3}\b",
        r"rgba?\([^)]+\)",
    ];
    for pattern in patterns {
        if let Some(m) = Regex::new(pattern)?.find(shorthand) {
            return Ok(Some(m.as_str().to_string()));
        }
    }

    let named = shorthand
        .split(|c: char| c.is_ascii_whitespace() || c == ';')
        .filter(|w| !w.is_empty())
        .find(|w| {
            let w = w.to_ascii_lowercase();
            w == "transparent" || w == "currentcolor" || Color::parse_named_color(&w).is_ok()
        });
    Ok(named.map(|s| s.to_string()))
}

/// A two-stop `linear-gradient()` as edited by the gradient controls.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LinearGradient {
    /// Degrees
    pub angle: f64,
    pub start_color: String,
    pub end_color: String,
    /// Percentage at which `end_color` is reached.
    pub end_position: f64,
}

impl Default for LinearGradient {
    fn default() -> Self {
        Self {
            angle: 90.0,
            start_color: "#ffffff".into(),
            end_color: "#000000".into(),
            end_position: 50.0,
        }
    }
}

impl fmt::Display for LinearGradient {
    /// Serializes the way the gradient controls write the `background` property.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "linear-gradient({}deg, {} 0%, {} {}%, {} 100%)",
            self.angle, self.start_color, self.end_color, self.end_position, self.start_color
        )
    }
}

/// Parses the first `linear-gradient(...)` found in `value`. Missing parts keep their defaults.
pub fn parse_linear_gradient(value: &str) -> Option<LinearGradient> {
    let start = value.to_ascii_lowercase().find("linear-gradient(")?;
    let args_start = start + "linear-gradient(".len();

    let mut depth = 1usize;
    let mut args_end = None;
    for (i, c) in value[args_start..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    args_end = Some(args_start + i);
                    break;
                }
            }
            _ => {}
        }
    }
    let args = &value[args_start..args_end?];

    let mut gradient = LinearGradient::default();
    let mut parts = split_top_level(args, |c| c == ',');
    if let Some(angle) = parts
        .first()
        .and_then(|p| p.strip_suffix("deg"))
        .and_then(|p| p.trim().parse::<f64>().ok())
    {
        gradient.angle = angle;
        parts.remove(0);
    }

    if let Some((color, _)) = parts.first().map(|p| split_color_stop(p)) {
        gradient.start_color = color;
    }
    if let Some((color, position)) = parts.get(1).map(|p| split_color_stop(p)) {
        gradient.end_color = color;
        if let Some(position) = position {
            gradient.end_position = position;
        }
    }
    Some(gradient)
}

/// Splits `rgb(1, 2, 3) 40%` into the color and the optional percentage.
fn split_color_stop(stop: &str) -> (String, Option<f64>) {
    let pieces = split_top_level(stop, |c| c.is_ascii_whitespace());
    match pieces.as_slice() {
        [color, position] => match position
            .strip_suffix('%')
            .and_then(|p| p.parse::<f64>().ok())
        {
            Some(p) => (color.clone(), Some(p)),
            None => (stop.trim().to_string(), None),
        },
        _ => (stop.trim().to_string(), None),
    }
}

/// A single `box-shadow` layer as edited by the shadow controls.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BoxShadow {
    pub offset_x: f64,
    pub offset_y: f64,
    pub blur: f64,
    pub color: String,
}

impl BoxShadow {
    /// Parses `<x>px <y>px <blur>px <color>`. Any other shape, including `none`, yields `None`.
    pub fn parse(value: &str) -> Result<Option<Self>> {
        let re = Regex::new(r"^\s*([-\d.]+)px\s+([-\d.]+)px\s+([\d.]+)px\s+(.+?)\s*$")?;
        let Some(caps) = re.captures(value) else {
            return Ok(None);
        };
        let number = |i: usize| caps[i].parse::<f64>().ok();
        Ok(match (number(1), number(2), number(3)) {
            (Some(offset_x), Some(offset_y), Some(blur)) => Some(Self {
                offset_x,
                offset_y,
                blur,
                color: caps[4].to_string(),
            }),
            _ => None,
        })
    }
}

impl fmt::Display for BoxShadow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}px {}px {}px {}",
            self.offset_x, self.offset_y, self.blur, self.color
        )
    }
}
