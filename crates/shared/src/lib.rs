//! Data model shared by the viewer core and the browser bindings.
//!
//! Everything here is plain serde data: colors, viewer construction options,
//! configurator option catalogs and configuration snapshots.

mod configuration;
mod options;

pub use configuration::{Configuration, ExportedConfiguration};
pub use options::{
    ColorOption, ConfiguratorOptions, MaterialOption, ModelOption, OptionKind, ViewerOptions,
    ViewerOverrides,
};

use serde::{Deserialize, Serialize};

/// sRGB color, 8 bits per channel
///
/// Deserializes from either a hex number (`0xf0f0f0`) or a CSS hex string
/// (`"#f0f0f0"`, `"#fff"`). Always serializes as a CSS hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ColorRepr", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::from_hex(0xffffff);
    pub const BLACK: Color = Color::from_hex(0x000000);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value (upper byte ignored)
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    pub fn to_hex(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Parse `#rgb` or `#rrggbb`
    pub fn parse_css(s: &str) -> Result<Self, String> {
        let digits = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| format!("color '{s}' must start with '#'"))?;
        let parse = |d: &str| u32::from_str_radix(d, 16).map_err(|e| format!("color '{s}': {e}"));
        match digits.len() {
            3 => {
                let short = parse(digits)?;
                let expand = |v: u32| ((v & 0xf) * 0x11) as u8;
                Ok(Self::new(expand(short >> 8), expand(short >> 4), expand(short)))
            }
            6 => Ok(Self::from_hex(parse(digits)?)),
            _ => Err(format!("color '{s}' must have 3 or 6 hex digits")),
        }
    }

    /// CSS form, e.g. `#f0f0f0`
    pub fn to_css(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channels normalized to 0.0..=1.0
    pub fn to_rgb_f32(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_css()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(u32),
    Css(String),
}

impl TryFrom<ColorRepr> for Color {
    type Error = String;

    fn try_from(repr: ColorRepr) -> Result<Self, Self::Error> {
        match repr {
            ColorRepr::Hex(hex) => Ok(Color::from_hex(hex)),
            ColorRepr::Css(s) => Color::parse_css(&s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_hex() {
        let c = Color::from_hex(0x404040);
        assert_eq!(c, Color::new(0x40, 0x40, 0x40));
        assert_eq!(c.to_hex(), 0x404040);
    }

    #[test]
    fn test_color_parse_css() {
        assert_eq!(Color::parse_css("#ff8000").unwrap(), Color::new(255, 128, 0));
        assert_eq!(Color::parse_css("#fff").unwrap(), Color::WHITE);
        assert!(Color::parse_css("ff8000").is_err());
        assert!(Color::parse_css("#ff80").is_err());
        assert!(Color::parse_css("#gggggg").is_err());
    }

    #[test]
    fn test_color_serde_accepts_number_and_string() {
        let from_num: Color = serde_json::from_str("16777215").unwrap();
        assert_eq!(from_num, Color::WHITE);

        let from_str: Color = serde_json::from_str(r##""#000000""##).unwrap();
        assert_eq!(from_str, Color::BLACK);

        assert_eq!(serde_json::to_string(&Color::from_hex(0xf5f5f5)).unwrap(), r##""#f5f5f5""##);
    }

    #[test]
    fn test_color_to_rgb_f32() {
        let [r, g, b] = Color::new(255, 0, 51).to_rgb_f32();
        assert_eq!(r, 1.0);
        assert_eq!(g, 0.0);
        assert!((b - 0.2).abs() < 1e-6);
    }
}
