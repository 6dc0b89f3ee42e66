//! RGBA8 colors and the CSS color strings used on the drawing surface.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Straight-alpha RGBA8 color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Parse a CSS color string.
    ///
    /// Accepts `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`,
    /// `rgba(r, g, b, a)` with `a` in `0.0..=1.0`, and the keywords
    /// `transparent`, `black` and `white`.
    pub fn parse_css(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return Self::parse_hex(hex);
        }

        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "transparent" => return Some(Self::TRANSPARENT),
            "black" => return Some(Self::BLACK),
            "white" => return Some(Self::WHITE),
            _ => {}
        }

        if let Some(args) = lower.strip_prefix("rgba(").and_then(|r| r.strip_suffix(')')) {
            let parts: Vec<&str> = args.split(',').map(str::trim).collect();
            if parts.len() != 4 {
                return None;
            }
            let alpha: f64 = parts[3].parse().ok()?;
            if !(0.0..=1.0).contains(&alpha) {
                return None;
            }
            return Some(Self::new(
                parts[0].parse().ok()?,
                parts[1].parse().ok()?,
                parts[2].parse().ok()?,
                (alpha * 255.0).round() as u8,
            ));
        }

        if let Some(args) = lower.strip_prefix("rgb(").and_then(|r| r.strip_suffix(')')) {
            let parts: Vec<&str> = args.split(',').map(str::trim).collect();
            if parts.len() != 3 {
                return None;
            }
            return Some(Self::opaque(
                parts[0].parse().ok()?,
                parts[1].parse().ok()?,
                parts[2].parse().ok()?,
            ));
        }

        None
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => {
                let mut out = [0u8; 3];
                for (slot, c) in out.iter_mut().zip(hex.chars()) {
                    let v = c.to_digit(16)? as u8;
                    *slot = v * 17;
                }
                Some(Self::opaque(out[0], out[1], out[2]))
            }
            6 => Some(Self::opaque(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    /// `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// CSS `rgba(r,g,b,a)` with the given opacity, three decimals.
    pub fn to_rgba_css(&self, opacity: f64) -> String {
        format!(
            "rgba({},{},{},{:.3})",
            self.r,
            self.g,
            self.b,
            opacity.clamp(0.0, 1.0)
        )
    }

    /// Same color with alpha scaled by `opacity`.
    pub fn with_opacity(self, opacity: f64) -> Self {
        let alpha = (self.a as f64 * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a: alpha, ..self }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Rgba {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgba::parse_css(&value).ok_or_else(|| format!("invalid color: {value:?}"))
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(Rgba::parse_css("#000000"), Some(Rgba::BLACK));
        assert_eq!(Rgba::parse_css("#FFA500"), Some(Rgba::opaque(255, 165, 0)));
        assert_eq!(Rgba::parse_css("#fff"), Some(Rgba::WHITE));
        assert_eq!(Rgba::parse_css("#11223344"), Some(Rgba::new(0x11, 0x22, 0x33, 0x44)));
        assert_eq!(Rgba::parse_css("#12345"), None);
        assert_eq!(Rgba::parse_css("#gg0000"), None);
    }

    #[test]
    fn test_parse_functional_forms() {
        assert_eq!(
            Rgba::parse_css("rgba(255,165,0,0.250)"),
            Some(Rgba::new(255, 165, 0, 64))
        );
        assert_eq!(Rgba::parse_css("rgb(1, 2, 3)"), Some(Rgba::opaque(1, 2, 3)));
        assert_eq!(Rgba::parse_css("rgba(1,2,3,1.5)"), None);
        assert_eq!(Rgba::parse_css("transparent"), Some(Rgba::TRANSPARENT));
        assert_eq!(Rgba::parse_css("chartreuse"), None);
    }

    #[test]
    fn test_rgba_css_output() {
        let orange = Rgba::opaque(255, 165, 0);
        assert_eq!(orange.to_rgba_css(0.25), "rgba(255,165,0,0.250)");
        assert_eq!(orange.to_hex(), "#ffa500");
        assert_eq!(orange.with_opacity(0.5).a, 128);
    }

    #[test]
    fn test_serde_uses_hex_strings() {
        let json = serde_json::to_string(&Rgba::opaque(230, 230, 230)).unwrap();
        assert_eq!(json, "\"#e6e6e6\"");
        let back: Rgba = serde_json::from_str("\"#E6E6E6\"").unwrap();
        assert_eq!(back, Rgba::opaque(230, 230, 230));
        assert!(serde_json::from_str::<Rgba>("\"nope\"").is_err());
    }
}
