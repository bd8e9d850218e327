//! # Font Management
//!
//! Measuring and resolving the four font variants a report can reference:
//! regular, bold, italic and monospace.
//!
//! By default every variant maps to one of the standard PDF fonts
//! (Helvetica, Helvetica-Bold, Helvetica-Oblique, Courier), which need no
//! embedding. A request may replace any variant with a TrueType font; its
//! bytes are kept as-is and only parsed for real when the serializer embeds
//! them, so a corrupt font fails generation there with a descriptive error.

pub mod metrics;

pub use metrics::StandardFontMetrics;
use std::collections::HashMap;

use crate::error::{FolioError, Result};
use crate::style::FontVariant;

/// The standard PDF fonts used by the default variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    Courier,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::Courier => "Courier",
        }
    }

    fn for_variant(variant: FontVariant) -> Self {
        match variant {
            FontVariant::Regular => Self::Helvetica,
            FontVariant::Bold => Self::HelveticaBold,
            FontVariant::Italic => Self::HelveticaOblique,
            FontVariant::Monospace => Self::Courier,
        }
    }
}

#[derive(Debug, Clone)]
pub enum FontData {
    /// One of the standard PDF fonts. No embedding needed.
    Standard(StandardFont),
    /// A TrueType/OpenType font that needs to be embedded.
    Custom {
        /// Family name used for the embedded /BaseFont.
        family: String,
        data: Vec<u8>,
        /// Parsed metrics, if the font parsed at registration time.
        metrics: Option<CustomFontMetrics>,
    },
}

/// Parsed metrics from a TrueType/OpenType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
    pub ascender: i16,
    pub descender: i16,
}

impl CustomFontMetrics {
    /// Advance width of `ch` in points; unmapped characters use the space width.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f64 / self.units_per_em as f64) * font_size
    }

    /// Read the advance of every mapped character. `None` when the bytes
    /// are not a font ttf-parser understands.
    pub fn from_font_data(data: &[u8]) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, 0).ok()?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();

        // Every character the font's Unicode cmaps map, so measured widths
        // match the advances the serializer embeds.
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables {
                if !subtable.is_unicode() {
                    continue;
                }
                subtable.codepoints(|code| {
                    let Some(ch) = char::from_u32(code) else {
                        return;
                    };
                    if let Some(glyph_id) = face.glyph_index(ch) {
                        let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                        advance_widths.insert(ch, advance);
                    }
                });
            }
        }
        let default_advance = match advance_widths.get(&' ') {
            Some(&w) if w > 0 => w,
            _ => units_per_em / 2,
        };

        Some(CustomFontMetrics {
            units_per_em,
            advance_widths,
            default_advance,
            ascender: face.ascender(),
            descender: face.descender(),
        })
    }
}

static FALLBACK_FONT: FontData = FontData::Standard(StandardFont::Helvetica);

/// Font registry and text measurement shared by layout and serialization.
///
/// Each generation builds its own context; nothing is cached across calls.
#[derive(Debug, Clone)]
pub struct FontContext {
    fonts: HashMap<FontVariant, FontData>,
}

impl Default for FontContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FontContext {
    pub fn new() -> Self {
        let fonts = FontVariant::ALL
            .iter()
            .map(|&v| (v, FontData::Standard(StandardFont::for_variant(v))))
            .collect();
        Self { fonts }
    }

    /// Replace a variant with a custom TrueType font.
    ///
    /// Fails only when the bytes are empty; unparseable data is accepted here
    /// and reported by the serializer when it tries to embed the font.
    pub fn register(&mut self, variant: FontVariant, family: &str, data: Vec<u8>) -> Result<()> {
        if data.is_empty() {
            return Err(FolioError::font(format!(
                "font data for '{}' ({:?}) is empty",
                family, variant
            )));
        }
        let metrics = CustomFontMetrics::from_font_data(&data);
        if metrics.is_none() {
            log::warn!(
                "font '{}' ({:?}) did not parse; measuring with Helvetica metrics",
                family,
                variant
            );
        } else {
            log::debug!("registered custom font '{}' for {:?}", family, variant);
        }
        self.fonts.insert(
            variant,
            FontData::Custom {
                family: family.to_string(),
                data,
                metrics,
            },
        );
        Ok(())
    }

    /// Resolve a variant to its font data.
    pub fn resolve(&self, variant: FontVariant) -> &FontData {
        self.fonts.get(&variant).unwrap_or(&FALLBACK_FONT)
    }

    /// Metrics a variant is measured with. Custom fonts that failed to
    /// parse measure as Helvetica.
    fn metrics_for(&self, variant: FontVariant) -> Metrics<'_> {
        match self.resolve(variant) {
            FontData::Standard(std_font) => Metrics::Standard(std_font.metrics()),
            FontData::Custom { metrics: Some(m), .. } => Metrics::Custom(m),
            FontData::Custom { metrics: None, .. } => {
                Metrics::Standard(StandardFont::Helvetica.metrics())
            }
        }
    }

    /// Advance width of one character in points.
    pub fn char_width(&self, ch: char, variant: FontVariant, font_size: f64) -> f64 {
        match self.metrics_for(variant) {
            Metrics::Standard(m) => m.char_width(ch, font_size),
            Metrics::Custom(m) => m.char_width(ch, font_size),
        }
    }

    /// Width of a string in points.
    pub fn measure(&self, text: &str, variant: FontVariant, font_size: f64) -> f64 {
        match self.metrics_for(variant) {
            Metrics::Standard(m) => m.measure_string(text, font_size),
            Metrics::Custom(m) => text.chars().map(|ch| m.char_width(ch, font_size)).sum(),
        }
    }

    /// Ascent above the baseline in points.
    pub fn ascent(&self, variant: FontVariant, font_size: f64) -> f64 {
        let (ascender, units) = match self.metrics_for(variant) {
            Metrics::Standard(m) => (m.ascender, 1000),
            Metrics::Custom(m) => (m.ascender, m.units_per_em),
        };
        ascender as f64 / units as f64 * font_size
    }
}

enum Metrics<'a> {
    Standard(StandardFontMetrics),
    Custom(&'a CustomFontMetrics),
}
