//! Side-by-side columns and their reconciliation.
//!
//! Each column keeps its own cursor while it is filled. Before anything
//! full-width is drawn, the cursors are reconciled to the lowest of them so
//! no full-width element can start above a column's last line.

use crate::text::{FlowResult, Frame};

/// A named column and the point its content reached.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    pub x: f64,
    pub max_width: f64,
    pub flow: FlowResult,
}

impl Section {
    pub fn new(name: impl Into<String>, x: f64, max_width: f64, start: FlowResult) -> Self {
        Self {
            name: name.into(),
            x,
            max_width,
            flow: FlowResult { x, ..start },
        }
    }

    /// Split `[x, x + width]` into two columns separated by `gutter`, both
    /// starting at `start`.
    pub fn pair(
        names: (&str, &str),
        x: f64,
        width: f64,
        gutter: f64,
        start: FlowResult,
    ) -> (Section, Section) {
        let column = ((width - gutter) / 2.0).max(0.0);
        (
            Section::new(names.0, x, column, start),
            Section::new(names.1, x + column + gutter, column, start),
        )
    }

    /// A text frame spanning this column.
    pub fn frame(&self, template: &Frame) -> Frame {
        Frame {
            x: self.x,
            max_width: self.max_width,
            ..*template
        }
    }
}

/// The lower of two cursors: a later page wins, then the smaller y.
pub fn lowest(a: FlowResult, b: FlowResult) -> FlowResult {
    if b.is_below(&a) {
        b
    } else {
        a
    }
}

/// Reconcile any number of column cursors with the current cursor. The
/// result starts at `x`.
pub fn reconcile(current: FlowResult, sections: &[Section], x: f64) -> FlowResult {
    let low = sections
        .iter()
        .map(|s| s.flow)
        .fold(current, lowest);
    FlowResult { x, ..low }
}
