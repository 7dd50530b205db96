use std::fmt;

use regex::Regex;

use crate::error::{Error, Result};

/// Computed value of a `<color>`, such as the `color` or `background-color` property.
/// https://developer.mozilla.org/en-US/docs/Web/CSS/color_value
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// 0.0 (fully transparent) to 1.0 (opaque)
    pub a: f64,
}

impl fmt::Display for Color {
    /// Serializes the way `getComputedStyle` does.
    /// https://www.w3.org/TR/css-color-4/#serializing-sRGB-values
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.a >= 1.0 {
            write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
        } else {
            let a = (self.a * 1000.0).round() / 1000.0;
            write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, a)
        }
    }
}

impl Default for Color {
    fn default() -> Color {
        // Canvas text color
        Color::new(0, 0, 0, 1.0)
    }
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self {
            r,
            g,
            b,
            a: a.clamp(0.0, 1.0),
        }
    }

    pub fn transparent() -> Self {
        Color::new(0, 0, 0, 0.0)
    }

    /// Parses hex, `rgb()`/`rgba()`, `transparent`, and named colors.
    /// `currentcolor` is not a concrete color and must be resolved by the caller.
    pub fn parse(value: &str) -> Result<Self> {
        let v = value.trim().to_ascii_lowercase();
        if let Some(hex) = v.strip_prefix('#') {
            return Self::parse_hex_color(hex);
        }
        if v.starts_with("rgb") {
            return Self::parse_rgb_function(&v);
        }
        if v == "transparent" {
            return Ok(Self::transparent());
        }
        Self::parse_named_color(&v)
    }

    pub fn parse_hex_color(value: &str) -> Result<Self> {
        if !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::CssParse(format!("Invalid hex color: #{}", value)));
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).unwrap_or_default();
        let short = |i: usize| channel(&value[i..i + 1].repeat(2));
        match value.len() {
            3 => Ok(Color::new(short(0), short(1), short(2), 1.0)),
            4 => Ok(Color::new(
                short(0),
                short(1),
                short(2),
                f64::from(short(3)) / 255.0,
            )),
            6 => Ok(Color::new(
                channel(&value[0..2]),
                channel(&value[2..4]),
                channel(&value[4..6]),
                1.0,
            )),
            8 => Ok(Color::new(
                channel(&value[0..2]),
                channel(&value[2..4]),
                channel(&value[4..6]),
                f64::from(channel(&value[6..8])) / 255.0,
            )),
            _ => Err(Error::CssParse(format!("Invalid hex color: #{}", value))),
        }
    }

    /// Accepts both the legacy comma syntax and the space/slash syntax.
    /// https://www.w3.org/TR/css-color-4/#rgb-functions
    pub fn parse_rgb_function(value: &str) -> Result<Self> {
        let re = Regex::new(
            r"^rgba?\(\s*([^,\s/)]+)\s*[,\s]\s*([^,\s/)]+)\s*[,\s]\s*([^,\s/)]+)\s*(?:[,/]\s*([^,\s/)]+)\s*)?\)$",
        )?;
        let caps = re
            .captures(value.trim())
            .ok_or_else(|| Error::CssParse(format!("Invalid rgb function: {}", value)))?;

        let mut rgb = [0u8; 3];
        for (i, channel) in rgb.iter_mut().enumerate() {
            let arg = &caps[i + 1];
            let v = match arg.strip_suffix('%') {
                Some(p) => parse_number(p)? * 255.0 / 100.0,
                None => parse_number(arg)?,
            };
            *channel = v.round().clamp(0.0, 255.0) as u8;
        }
        let a = match caps.get(4) {
            Some(m) => match m.as_str().strip_suffix('%') {
                Some(p) => parse_number(p)? / 100.0,
                None => parse_number(m.as_str())?,
            },
            None => 1.0,
        };
        Ok(Color::new(rgb[0], rgb[1], rgb[2], a))
    }

    /// https://www.w3.org/TR/css-color-4/#named-colors
    pub fn parse_named_color(value: &str) -> Result<Self> {
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == value)
            .map(|(_, rgb)| {
                Color::new(
                    ((rgb >> 16) & 0xff) as u8,
                    ((rgb >> 8) & 0xff) as u8,
                    (rgb & 0xff) as u8,
                    1.0,
                )
            })
            .ok_or_else(|| Error::CssParse(format!("Invalid color name: {}", value)))
    }

    /// `#rrggbb`, alpha dropped.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0.0
    }
}

fn parse_number(s: &str) -> Result<f64> {
    s.parse::<f64>()
        .map_err(|_| Error::CssParse(format!("Invalid number in color: {}", s)))
}

const NAMED_COLORS: &[(&str, u32)] = &[
    ("aqua", 0x00ffff),
    ("beige", 0xf5f5dc),
    ("black", 0x000000),
    ("blue", 0x0000ff),
    ("blueviolet", 0x8a2be2),
    ("brown", 0xa52a2a),
    ("coral", 0xff7f50),
    ("crimson", 0xdc143c),
    ("cyan", 0x00ffff),
    ("darkblue", 0x00008b),
    ("darkgray", 0xa9a9a9),
    ("darkgreen", 0x006400),
    ("darkgrey", 0xa9a9a9),
    ("darkred", 0x8b0000),
    ("fuchsia", 0xff00ff),
    ("gold", 0xffd700),
    ("gray", 0x808080),
    ("green", 0x008000),
    ("grey", 0x808080),
    ("indigo", 0x4b0082),
    ("ivory", 0xfffff0),
    ("khaki", 0xf0e68c),
    ("lavender", 0xe6e6fa),
    ("lightblue", 0xadd8e6),
    ("lightgray", 0xd3d3d3),
    ("lightgreen", 0x90ee90),
    ("lightgrey", 0xd3d3d3),
    ("lime", 0x00ff00),
    ("magenta", 0xff00ff),
    ("maroon", 0x800000),
    ("navy", 0x000080),
    ("olive", 0x808000),
    ("orange", 0xffa500),
    ("pink", 0xffc0cb),
    ("purple", 0x800080),
    ("red", 0xff0000),
    ("salmon", 0xfa8072),
    ("silver", 0xc0c0c0),
    ("skyblue", 0x87ceeb),
    ("teal", 0x008080),
    ("tomato", 0xff6347),
    ("turquoise", 0x40e0d0),
    ("violet", 0xee82ee),
    ("wheat", 0xf5deb3),
    ("white", 0xffffff),
    ("whitesmoke", 0xf5f5f5),
    ("yellow", 0xffff00),
    ("yellowgreen", 0x9acd32),
];
