//! # Engine Configuration
//!
//! Everything tunable about a generation run. Every field has a default, so
//! `{}` is a valid config and requests only spell out what they change.

use serde::{Deserialize, Serialize};

use crate::style::{Color, LineSpacing};

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub page_size: PageSize,
    /// Uniform page margin in points.
    pub margin: f64,
    /// Height of the letterhead zone below the top margin. Zero means "size
    /// it from the letterhead lines", or no zone when there is no letterhead.
    pub header_reserved: f64,
    /// Height above the bottom margin kept free for the footer.
    pub footer_reserved: f64,
    pub base_font_size: f64,
    pub line_spacing: LineSpacing,
    pub footer_font_size: f64,
    pub fetch_timeout_ms: u64,
    /// Page fill used when there is no background image or it failed to load.
    /// Accepts `"#rrggbb"`.
    pub fallback_background: Color,
    pub currency: String,
    /// Rendered for a label whose value is missing.
    pub value_placeholder: String,
    /// Rendered for a field group with no entries.
    pub empty_group_text: String,
    /// Reject documents that still have open pages besides the last one.
    /// Lenient mode finalizes them and logs a warning instead.
    pub strict_finalize: bool,
    pub compress_streams: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            margin: 50.0,
            header_reserved: 0.0,
            footer_reserved: 24.0,
            base_font_size: 11.0,
            line_spacing: LineSpacing::Single,
            footer_font_size: 8.0,
            fetch_timeout_ms: 5000,
            fallback_background: Color::WHITE,
            currency: "PKR".to_string(),
            value_placeholder: "N/A".to_string(),
            empty_group_text: "None".to_string(),
            strict_finalize: cfg!(debug_assertions),
            compress_streams: true,
        }
    }
}

impl EngineConfig {
    /// Baseline-to-baseline distance for body text.
    pub fn line_height(&self) -> f64 {
        self.line_spacing.line_height(self.base_font_size)
    }

    pub fn fetch_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.fetch_timeout_ms)
    }
}
