use std::fmt;

use log::debug;
use serde::Serialize;

use crate::css::color::Color;

/// A `#rrggbb` value, the only format a color input control accepts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HexColor(String);

impl HexColor {
    /// Shown for fully transparent colors so that the control is visibly "empty".
    pub const TRANSPARENT_INDICATOR: &'static str = "#f0f0f0";

    /// Accepts `#rrggbb` (any case) and normalizes it to lowercase.
    pub fn parse(value: &str) -> Option<Self> {
        let hex = value.strip_prefix('#')?;
        (hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
            .then(|| Self(value.to_ascii_lowercase()))
    }

    pub fn black() -> Self {
        Self("#000000".into())
    }

    pub fn white() -> Self {
        Self("#ffffff".into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Color> for HexColor {
    fn from(color: Color) -> Self {
        Self(color.to_hex())
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coerces any color-like CSS value to a hex color for display, or returns `fallback`.
///
/// - `#rrggbb` is lowercased, `#rgb` is expanded
/// - `rgb()`/`rgba()` drop the alpha channel, channels are clamped to 0..=255
/// - `transparent` and `rgba(0, 0, 0, 0)` map to [`HexColor::TRANSPARENT_INDICATOR`]
/// - named colors are resolved through the color table
pub fn to_display_hex(value: &str, fallback: &HexColor) -> HexColor {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return fallback.clone();
    }

    if let Some(hex) = value.strip_prefix('#') {
        return match hex.len() {
            3 | 6 => Color::parse_hex_color(hex)
                .map(HexColor::from)
                .unwrap_or_else(|_| fallback.clone()),
            _ => fallback.clone(),
        };
    }

    let lower = value.to_ascii_lowercase();
    let parsed = if lower.starts_with("rgb") {
        Color::parse_rgb_function(&lower)
    } else if lower == "transparent" {
        Ok(Color::transparent())
    } else {
        Color::parse_named_color(&lower)
    };

    match parsed {
        Ok(color) if color == Color::transparent() => {
            HexColor(HexColor::TRANSPARENT_INDICATOR.into())
        }
        Ok(color) => color.into(),
        Err(e) => {
            debug!("could not convert `{}` to a hex color: {}", value, e);
            fallback.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(value: &str) -> String {
        to_display_hex(value, &HexColor::black()).to_string()
    }

    #[test]
    fn hex_values() {
        assert_eq!(hex("#FF00aa"), "#ff00aa");
        assert_eq!(hex("#AbC"), "#aabbcc");
        assert_eq!(hex("#abcd"), "#000000");
        assert_eq!(hex("#xyzxyz"), "#000000");
    }

    #[test]
    fn rgb_values() {
        assert_eq!(hex("rgb(255, 0, 16)"), "#ff0010");
        assert_eq!(hex("rgba(1, 2, 3, 0.5)"), "#010203");
        assert_eq!(hex("rgb(300, 0, 0)"), "#ff0000");
    }

    #[test]
    fn transparent_values() {
        assert_eq!(hex("transparent"), "#f0f0f0");
        assert_eq!(hex("rgba(0, 0, 0, 0)"), "#f0f0f0");
    }

    #[test]
    fn named_and_unknown_values() {
        assert_eq!(hex("Red"), "#ff0000");
        assert_eq!(hex(""), "#000000");
        assert_eq!(hex("none"), "#000000");
        assert_eq!(to_display_hex("inherit", &HexColor::white()).as_str(), "#ffffff");
        assert_eq!(
            to_display_hex("linear-gradient(red, blue)", &HexColor::white()).as_str(),
            "#ffffff"
        );
    }

    #[test]
    fn parse_only_full_hex() {
        assert_eq!(HexColor::parse("#ABCDEF").unwrap().as_str(), "#abcdef");
        assert!(HexColor::parse("#abc").is_none());
        assert!(HexColor::parse("red").is_none());
    }
}
