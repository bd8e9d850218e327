//! # Drawing Surface
//!
//! Primitive paint operations for one page. Coordinates are page-local PDF
//! points with the origin at the bottom-left corner and y increasing upward.
//! Nothing is clipped; the serializer turns each op into content-stream
//! operators in the order it was recorded.

use crate::style::{Color, FontVariant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Handle into the document's image table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(pub usize);

/// How the `x` of a text op is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    /// `x` is the left edge of the first glyph.
    Start,
    /// `x` is the horizontal centre. The left edge is resolved when the page
    /// is serialized, after footer placeholders have been substituted.
    Center,
}

/// Stroke around a rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Border {
    pub color: Color,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        text: String,
        x: f64,
        /// Baseline.
        y: f64,
        size: f64,
        font: FontVariant,
        color: Color,
        anchor: TextAnchor,
    },
    Line {
        from: Point,
        to: Point,
        thickness: f64,
        color: Color,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Color>,
        border: Option<Border>,
    },
    Image {
        image: ImageId,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

/// The ordered list of paint operations for one page.
#[derive(Debug, Clone)]
pub struct Surface {
    pub width: f64,
    pub height: f64,
    ops: Vec<DrawOp>,
}

impl Surface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        size: f64,
        font: FontVariant,
        color: Color,
    ) {
        if text.is_empty() {
            return;
        }
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            size,
            font,
            color,
            anchor: TextAnchor::Start,
        });
    }

    /// Draw text horizontally centred on `center_x`.
    pub fn draw_text_centered(
        &mut self,
        text: &str,
        center_x: f64,
        y: f64,
        size: f64,
        font: FontVariant,
        color: Color,
    ) {
        if text.is_empty() {
            return;
        }
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            x: center_x,
            y,
            size,
            font,
            color,
            anchor: TextAnchor::Center,
        });
    }

    pub fn draw_line(&mut self, from: Point, to: Point, thickness: f64, color: Color) {
        self.ops.push(DrawOp::Line {
            from,
            to,
            thickness,
            color,
        });
    }

    /// `(x, y)` is the bottom-left corner.
    pub fn draw_rect(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Color>,
        border: Option<Border>,
    ) {
        if fill.is_none() && border.is_none() {
            return;
        }
        self.ops.push(DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
            border,
        });
    }

    pub fn draw_image(&mut self, image: ImageId, x: f64, y: f64, width: f64, height: f64) {
        self.ops.push(DrawOp::Image {
            image,
            x,
            y,
            width,
            height,
        });
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Text ops in paint order, as `(text, x, y)`.
    pub fn texts(&self) -> impl Iterator<Item = (&str, f64, f64)> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, x, y, .. } => Some((text.as_str(), *x, *y)),
            _ => None,
        })
    }
}
