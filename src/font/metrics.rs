//! Advance widths for the standard PDF fonts the engine draws with.
//!
//! Values are Adobe AFM widths in 1/1000 em for the printable ASCII range
//! (0x20..=0x7E). A few WinAnsi punctuation marks used by report layouts
//! (bullet, dashes, curly quotes) are mapped explicitly; everything else
//! falls back to the font's default width.

use super::StandardFont;

#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Metrics for one standard font.
#[derive(Debug, Clone, Copy)]
pub struct StandardFontMetrics {
    /// `None` means every glyph has `default_width` (Courier).
    ascii_widths: Option<&'static [u16; 95]>,
    default_width: u16,
    pub ascender: i16,
    pub descender: i16,
}

impl StandardFontMetrics {
    /// Advance width of one character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        self.units(ch) as f64 / 1000.0 * font_size
    }

    /// Width of a string in points. Every glyph has a non-negative advance,
    /// so the result never shrinks as the string grows.
    pub fn measure_string(&self, text: &str, font_size: f64) -> f64 {
        let units: u32 = text.chars().map(|ch| self.units(ch) as u32).sum();
        units as f64 / 1000.0 * font_size
    }

    fn units(&self, ch: char) -> u16 {
        let Some(table) = self.ascii_widths else {
            return self.default_width;
        };
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) {
            return table[(cp - 0x20) as usize];
        }
        match ch {
            '\u{2022}' => 350,
            '\u{2013}' => 556,
            '\u{2014}' | '\u{2026}' => 1000,
            '\u{2018}' | '\u{2019}' => 222,
            '\u{201C}' | '\u{201D}' => 333,
            '\u{00A0}' => 278,
            _ => self.default_width,
        }
    }
}

impl StandardFont {
    pub fn metrics(&self) -> StandardFontMetrics {
        match self {
            StandardFont::Helvetica | StandardFont::HelveticaOblique => StandardFontMetrics {
                ascii_widths: Some(&HELVETICA_WIDTHS),
                default_width: 556,
                ascender: 718,
                descender: -207,
            },
            StandardFont::HelveticaBold => StandardFontMetrics {
                ascii_widths: Some(&HELVETICA_BOLD_WIDTHS),
                default_width: 556,
                ascender: 718,
                descender: -207,
            },
            StandardFont::Courier => StandardFontMetrics {
                ascii_widths: None,
                default_width: 600,
                ascender: 629,
                descender: -157,
            },
        }
    }
}
