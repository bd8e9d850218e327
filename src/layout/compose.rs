//! Block composition.
//!
//! The [`Composer`] walks a list of content blocks top to bottom, keeping
//! one document cursor (the baseline of the next body line) plus the
//! cursors of any columns the previous block left open. Columns are always
//! reconciled before the next block starts.

use super::columns::{self, Section};
use super::{Document, PageGeometry, PageManager};
use crate::error::Result;
use crate::font::FontContext;
use crate::model::ContentBlock;
use crate::style::{Color, LineSpacing};
use crate::surface::Surface;
use crate::text::{FlowLine, FlowResult, Frame, StyledRun, TextFlow};

/// Something that can lay itself out through a [`Composer`].
pub trait LayoutBlock {
    fn layout(&self, composer: &mut Composer<'_>) -> Result<()>;
}

/// Text settings shared by every block of a document.
#[derive(Debug, Clone)]
pub struct BlockStyle {
    pub font_size: f64,
    pub line_spacing: LineSpacing,
    pub color: Color,
    pub value_placeholder: String,
    pub empty_group_text: String,
}

impl BlockStyle {
    pub fn line_height(&self) -> f64 {
        self.line_spacing.line_height(self.font_size)
    }
}

pub struct Composer<'a> {
    pm: PageManager,
    flow: TextFlow<'a>,
    style: BlockStyle,
    cursor: FlowResult,
    sections: Vec<Section>,
}

impl<'a> Composer<'a> {
    /// Open the first page and place the cursor at the top of its body.
    pub fn new(doc: Document, fonts: &'a FontContext, style: BlockStyle) -> Result<Self> {
        let mut pm = PageManager::new(doc);
        let page = pm.new_page()?;
        pm.ensure_header(page)?;
        let geometry = *pm.geometry();
        Ok(Self {
            pm,
            flow: TextFlow::new(fonts),
            style,
            cursor: FlowResult::new(geometry.margin, geometry.body_top(), page),
            sections: Vec::new(),
        })
    }

    pub fn compose(&mut self, blocks: &[ContentBlock]) -> Result<()> {
        for block in blocks {
            self.reconcile();
            block.layout(self)?;
        }
        self.reconcile();
        Ok(())
    }

    pub fn finish(self) -> Document {
        self.pm.finish()
    }

    /// Move the cursor below every open column and close them.
    pub fn reconcile(&mut self) {
        if self.sections.is_empty() {
            return;
        }
        let margin = self.pm.geometry().margin;
        self.cursor = columns::reconcile(self.cursor, &self.sections, margin);
        self.sections.clear();
    }

    /// Leave columns open; the next block starts below the lowest of them.
    pub fn open_columns(&mut self, sections: Vec<Section>) {
        self.sections = sections;
    }

    pub fn cursor(&self) -> FlowResult {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: FlowResult) {
        self.cursor = cursor;
    }

    /// Move down by `dy` and back to the left margin.
    pub fn advance(&mut self, dy: f64) {
        self.cursor.y -= dy;
        self.cursor.x = self.pm.geometry().margin;
    }

    pub fn geometry(&self) -> PageGeometry {
        *self.pm.geometry()
    }

    pub fn style(&self) -> &BlockStyle {
        &self.style
    }

    pub fn fonts(&self) -> &'a FontContext {
        self.flow.fonts()
    }

    /// Full content-width frame in body text settings.
    pub fn body_frame(&self) -> Frame {
        let g = self.pm.geometry();
        Frame {
            x: g.margin,
            max_width: g.content_width(),
            font_size: self.style.font_size,
            line_height: self.style.line_height(),
            color: self.style.color,
        }
    }

    pub fn flow_text(&mut self, runs: &[StyledRun], at: FlowResult, frame: &Frame) -> Result<FlowResult> {
        self.flow.layout(runs, at, frame, &mut self.pm)
    }

    pub fn break_lines(&self, runs: &[StyledRun], max_width: f64, font_size: f64) -> Vec<FlowLine> {
        self.flow.break_lines(runs, 0.0, max_width, font_size)
    }

    pub fn draw_flow_line(
        &mut self,
        line: &FlowLine,
        x: f64,
        y: f64,
        page: usize,
        frame: &Frame,
    ) -> Result<()> {
        self.flow.draw_line(line, x, y, page, frame, &mut self.pm)
    }

    /// Keep `needed` points below the baseline of `at` on one page.
    pub fn ensure_space(&mut self, at: FlowResult, needed: f64) -> Result<FlowResult> {
        self.flow.ensure_space(at, needed, &mut self.pm)
    }

    /// Top of the body on the page after `from`, at the left margin.
    pub fn next_page(&mut self, from: FlowResult) -> Result<FlowResult> {
        let page = self.pm.page_after(from.page)?;
        let g = self.pm.geometry();
        Ok(FlowResult::new(g.margin, g.body_top(), page))
    }

    pub fn surface_mut(&mut self, page: usize) -> Result<&mut Surface> {
        self.pm.surface_mut(page)
    }
}
