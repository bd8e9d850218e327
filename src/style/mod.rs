//! # Style Primitives
//!
//! Colours, run style flags, font variants and line spacing. Everything here
//! is a small `Copy` value so runs and draw operations can carry it freely.

use serde::{Deserialize, Serialize};

/// An RGB colour with components in 0.0 - 1.0.
///
/// Deserializes from `{"r", "g", "b"}` or a `#rrggbb` string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };
    /// Shading behind table header rows.
    pub const HEADER_SHADE: Color = Color {
        r: 0.88,
        g: 0.9,
        b: 0.93,
    };
    /// Fill of the highlighted totals box.
    pub const TOTALS_FILL: Color = Color {
        r: 0.93,
        g: 0.95,
        b: 0.98,
    };
    pub const DARK_GRAY: Color = Color {
        r: 0.25,
        g: 0.25,
        b: 0.3,
    };
    pub const MID_GRAY: Color = Color {
        r: 0.45,
        g: 0.45,
        b: 0.5,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::rgb(
            channel(0)? as f64 / 255.0,
            channel(2)? as f64 / 255.0,
            channel(4)? as f64 / 255.0,
        ))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(String),
    Rgb { r: f64, g: f64, b: f64 },
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match ColorRepr::deserialize(deserializer)? {
            ColorRepr::Rgb { r, g, b } => Ok(Color::rgb(r, g, b)),
            ColorRepr::Hex(hex) => Color::from_hex(&hex)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid colour '{}'", hex))),
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// The font variants the engine knows how to measure and embed.
///
/// Ordering is significant: the serializer assigns `/F0`, `/F1`, ... in this
/// order, which keeps output deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FontVariant {
    Regular,
    Bold,
    Italic,
    Monospace,
}

impl FontVariant {
    pub const ALL: [FontVariant; 4] = [
        FontVariant::Regular,
        FontVariant::Bold,
        FontVariant::Italic,
        FontVariant::Monospace,
    ];
}

/// Style flags carried by a styled run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StyleFlags {
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    pub monospace: bool,
}

impl StyleFlags {
    pub const PLAIN: StyleFlags = StyleFlags {
        bold: false,
        italic: false,
        strike: false,
        monospace: false,
    };
    pub const BOLD: StyleFlags = StyleFlags {
        bold: true,
        ..StyleFlags::PLAIN
    };
    pub const ITALIC: StyleFlags = StyleFlags {
        italic: true,
        ..StyleFlags::PLAIN
    };
    pub const STRIKE: StyleFlags = StyleFlags {
        strike: true,
        ..StyleFlags::PLAIN
    };
    pub const MONOSPACE: StyleFlags = StyleFlags {
        monospace: true,
        ..StyleFlags::PLAIN
    };

    /// The font variant used to draw text with these flags.
    ///
    /// Monospace wins over weight, weight wins over slant. Strike has no font
    /// of its own; it is drawn as a line over the regular face.
    pub fn font_variant(&self) -> FontVariant {
        if self.monospace {
            FontVariant::Monospace
        } else if self.bold {
            FontVariant::Bold
        } else if self.italic {
            FontVariant::Italic
        } else {
            FontVariant::Regular
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == StyleFlags::PLAIN
    }
}

/// Line spacing selection from the report form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineSpacing {
    #[default]
    #[serde(rename = "single", alias = "1", alias = "1.0")]
    Single,
    #[serde(rename = "1.5", alias = "oneAndHalf")]
    OneAndHalf,
    #[serde(rename = "double", alias = "2", alias = "2.0")]
    Double,
}

impl LineSpacing {
    pub fn factor(&self) -> f64 {
        match self {
            LineSpacing::Single => 1.0,
            LineSpacing::OneAndHalf => 1.5,
            LineSpacing::Double => 2.0,
        }
    }

    /// Baseline-to-baseline distance for a font size.
    pub fn line_height(&self, font_size: f64) -> f64 {
        font_size * 1.2 * self.factor()
    }
}
