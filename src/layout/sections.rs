//! # Section Templates
//!
//! Layout for each [`ContentBlock`] kind. All positions derive from the
//! composer's cursor, which always holds the baseline of the next body line.

use regex::Regex;

use super::columns::Section;
use super::compose::{Composer, LayoutBlock};
use super::page_break::{decide_break, lines_that_fit, BreakDecision};
use crate::error::{FolioError, Result};
use crate::model::{Align, ContentBlock, FieldGroup, TableBlock};
use crate::style::{Color, FontVariant, StyleFlags};
use crate::surface::{Border, Point};
use crate::text::{tokenize, FlowLine, FlowResult, Frame, PlacedWord, StyledRun};

/// Offset of list markers from the left margin.
pub const LIST_INDENT: f64 = 18.0;
/// Width reserved for a list marker; item text starts after it.
pub const MARKER_COLUMN: f64 = 18.0;
const COLUMN_GUTTER: f64 = 24.0;
const CELL_PADDING: f64 = 4.0;
const BOX_PADDING_X: f64 = 16.0;
const BOX_PADDING_Y: f64 = 8.0;
const BULLET: &str = "\u{2022}";
const ELLIPSIS: &str = "\u{2026}";

impl LayoutBlock for ContentBlock {
    fn layout(&self, c: &mut Composer<'_>) -> Result<()> {
        match self {
            ContentBlock::LetterBody { text } => layout_letter_body(c, text),
            ContentBlock::TwoColumnFields { left, right } => layout_field_columns(c, left, right),
            ContentBlock::TotalsBox { text } => layout_totals_box(c, text),
            ContentBlock::Table(table) => layout_table(c, table),
            ContentBlock::Heading { text, level, align } => layout_heading(c, text, *level, *align),
            ContentBlock::Separator => layout_separator(c),
            ContentBlock::Spacer { height } => {
                c.advance(height.max(0.0));
                Ok(())
            }
        }
    }
}

/// Give every run of `runs` the bold flag.
fn emboldened(runs: Vec<StyledRun>) -> Vec<StyledRun> {
    runs.into_iter()
        .map(|r| {
            let style = StyleFlags {
                bold: true,
                ..r.style
            };
            StyledRun::new(r.text, style)
        })
        .collect()
}

// ── Letter body ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ListMarker {
    Ordered(String),
    Unordered,
}

impl ListMarker {
    pub fn label(&self) -> &str {
        match self {
            ListMarker::Ordered(label) => label,
            ListMarker::Unordered => BULLET,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub marker: ListMarker,
    /// Offset of the item text from the left margin.
    pub indent: f64,
    pub runs: Vec<StyledRun>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BodyLine {
    Blank,
    Paragraph(Vec<StyledRun>),
    Item(ListItem),
}

struct ListSyntax {
    numbered: Regex,
    bulleted: Regex,
}

impl ListSyntax {
    fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| FolioError::RenderError(format!("list pattern: {}", e)))
        };
        Ok(Self {
            numbered: compile(r"^(\d+)\.\s+(.*)$")?,
            bulleted: compile(r"^[-*]\s+(.*)$")?,
        })
    }

    fn classify(&self, line: &str) -> BodyLine {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return BodyLine::Blank;
        }
        let indent = LIST_INDENT + MARKER_COLUMN;
        if let Some(caps) = self.numbered.captures(trimmed) {
            return BodyLine::Item(ListItem {
                marker: ListMarker::Ordered(format!("{}.", &caps[1])),
                indent,
                runs: tokenize(&caps[2]),
            });
        }
        if let Some(caps) = self.bulleted.captures(trimmed) {
            return BodyLine::Item(ListItem {
                marker: ListMarker::Unordered,
                indent,
                runs: tokenize(&caps[1]),
            });
        }
        BodyLine::Paragraph(tokenize(line.trim_end()))
    }
}

/// Split a letter body into blank lines, paragraphs and list items.
pub fn parse_body(text: &str) -> Result<Vec<BodyLine>> {
    let syntax = ListSyntax::new()?;
    Ok(text.lines().map(|line| syntax.classify(line)).collect())
}

fn layout_letter_body(c: &mut Composer<'_>, text: &str) -> Result<()> {
    let frame = c.body_frame();
    for line in parse_body(text)? {
        match line {
            BodyLine::Blank => c.advance(frame.line_height),
            BodyLine::Paragraph(runs) => {
                let end = c.flow_text(&runs, c.cursor(), &frame)?;
                c.set_cursor(end.next_line(&frame));
            }
            BodyLine::Item(item) => {
                let text_frame = Frame {
                    x: frame.x + item.indent,
                    max_width: frame.max_width - item.indent,
                    ..frame
                };
                let start = FlowResult {
                    x: text_frame.x,
                    ..c.cursor()
                };
                let at = c.ensure_space(start, 0.0)?;
                c.surface_mut(at.page)?.draw_text(
                    item.marker.label(),
                    frame.x + LIST_INDENT,
                    at.y,
                    frame.font_size,
                    FontVariant::Regular,
                    frame.color,
                );
                let end = c.flow_text(&item.runs, at, &text_frame)?;
                c.set_cursor(end.next_line(&frame));
            }
        }
    }
    Ok(())
}

// ── Two-column label/value block ────────────────────────────────

fn field_runs(label: &str, value: Option<&str>, placeholder: &str) -> Vec<StyledRun> {
    let value = value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(placeholder);
    vec![
        StyledRun::bold(format!("{}:", label)),
        StyledRun::plain(" "),
        StyledRun::plain(value),
    ]
}

/// The run sequences of a group body, one per line group.
fn group_entries(c: &Composer<'_>, group: &FieldGroup) -> Vec<Vec<StyledRun>> {
    let style = c.style();
    if group.fields.is_empty() {
        return vec![vec![StyledRun::plain(style.empty_group_text.clone())]];
    }
    group
        .fields
        .iter()
        .map(|f| field_runs(&f.label, f.value.as_deref(), &style.value_placeholder))
        .collect()
}

/// Lines a group occupies at `width`, header included.
fn group_line_count(c: &Composer<'_>, group: &FieldGroup, width: f64) -> usize {
    let size = c.style().font_size;
    1 + group_entries(c, group)
        .iter()
        .map(|runs| c.break_lines(runs, width, size).len())
        .sum::<usize>()
}

/// Draw a group's underlined header and entries into `frame` from `at`.
/// Returns the cursor for the line after the group.
fn render_group(c: &mut Composer<'_>, group: &FieldGroup, at: FlowResult, frame: &Frame) -> Result<FlowResult> {
    let at = c.ensure_space(FlowResult { x: frame.x, ..at }, 0.0)?;
    let title_width = c.fonts().measure(&group.title, FontVariant::Bold, frame.font_size);
    let surface = c.surface_mut(at.page)?;
    surface.draw_text(&group.title, frame.x, at.y, frame.font_size, FontVariant::Bold, frame.color);
    if title_width > 0.0 {
        let underline = at.y - frame.font_size * 0.15;
        surface.draw_line(
            Point::new(frame.x, underline),
            Point::new(frame.x + title_width, underline),
            0.75,
            frame.color,
        );
    }

    let mut cursor = at.next_line(frame);
    for runs in group_entries(c, group) {
        let end = c.flow_text(&runs, cursor, frame)?;
        cursor = end.next_line(frame);
    }
    Ok(cursor)
}

fn layout_field_columns(c: &mut Composer<'_>, left: &FieldGroup, right: &FieldGroup) -> Result<()> {
    let body = c.body_frame();
    let g = c.geometry();
    let start = c.cursor();
    let (mut lsec, mut rsec) = Section::pair(
        (left.title.as_str(), right.title.as_str()),
        body.x,
        body.max_width,
        COLUMN_GUTTER,
        start,
    );

    let tallest = group_line_count(c, left, lsec.max_width).max(group_line_count(c, right, rsec.max_width));
    let needed = (tallest.saturating_sub(1)) as f64 * body.line_height;
    let remaining = start.y - g.body_bottom();

    let origin = match decide_break(remaining, needed, g.body_height()) {
        BreakDecision::Place => start,
        BreakDecision::MoveToNextPage => c.next_page(start)?,
        BreakDecision::Oversized => {
            log::debug!(
                "columns '{}' / '{}' exceed a page body; stacking them",
                left.title,
                right.title
            );
            let after_left = render_group(c, left, start, &body)?;
            let gap = FlowResult {
                y: after_left.y - body.line_height / 2.0,
                ..after_left
            };
            let after_right = render_group(c, right, gap, &body)?;
            c.set_cursor(after_right);
            return Ok(());
        }
    };

    lsec.flow = FlowResult { x: lsec.x, ..origin };
    rsec.flow = FlowResult { x: rsec.x, ..origin };
    lsec.flow = render_group(c, left, lsec.flow, &lsec.frame(&body))?;
    rsec.flow = render_group(c, right, rsec.flow, &rsec.frame(&body))?;
    c.set_cursor(origin);
    c.open_columns(vec![lsec, rsec]);
    Ok(())
}

// ── Totals box ──────────────────────────────────────────────────

fn layout_totals_box(c: &mut Composer<'_>, text: &str) -> Result<()> {
    let body = c.body_frame();
    let g = c.geometry();
    let size = body.font_size + 1.0;
    let fonts = c.fonts();
    let ascent = fonts.ascent(FontVariant::Bold, size);
    let text_width = fonts.measure(text, FontVariant::Bold, size);
    let box_width = (text_width + 2.0 * BOX_PADDING_X).min(g.content_width());
    let box_height = size + 2.0 * BOX_PADDING_Y;

    // The box top sits at the ascent line of the cursor's baseline.
    let needed = box_height - ascent;
    let start = c.cursor();
    let at = match decide_break(start.y - g.body_bottom(), needed, g.body_height()) {
        BreakDecision::Place => start,
        BreakDecision::MoveToNextPage | BreakDecision::Oversized => c.next_page(start)?,
    };

    let top = at.y + ascent;
    let bottom = top - box_height;
    let surface = c.surface_mut(at.page)?;
    surface.draw_rect(
        (g.width - box_width) / 2.0,
        bottom,
        box_width,
        box_height,
        Some(Color::TOTALS_FILL),
        Some(Border {
            color: Color::DARK_GRAY,
            width: 1.0,
        }),
    );
    surface.draw_text_centered(
        text,
        g.width / 2.0,
        bottom + (box_height - ascent) / 2.0,
        size,
        FontVariant::Bold,
        body.color,
    );
    c.set_cursor(FlowResult::new(g.margin, bottom - body.line_height, at.page));
    Ok(())
}

// ── Table ───────────────────────────────────────────────────────

/// Column widths from weights. Non-positive weights count as 1.
fn column_widths(table: &TableBlock, total: f64) -> Vec<f64> {
    let weights: Vec<f64> = table
        .columns
        .iter()
        .map(|col| if col.weight > 0.0 { col.weight } else { 1.0 })
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.iter().map(|w| total * w / sum).collect()
}

struct TableMetrics {
    frame: Frame,
    ascent: f64,
    descent: f64,
    xs: Vec<f64>,
    widths: Vec<f64>,
}

impl TableMetrics {
    fn row_height(&self, lines: usize) -> f64 {
        2.0 * CELL_PADDING
            + self.ascent
            + self.descent
            + lines.saturating_sub(1) as f64 * self.frame.line_height
    }
}

fn cell_lines(c: &Composer<'_>, m: &TableMetrics, texts: &[Vec<StyledRun>]) -> Vec<Vec<FlowLine>> {
    m.widths
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let runs = texts.get(i).cloned().unwrap_or_default();
            c.break_lines(&runs, w - 2.0 * CELL_PADDING, m.frame.font_size)
        })
        .collect()
}

fn draw_row(
    c: &mut Composer<'_>,
    m: &TableMetrics,
    cells: &[Vec<FlowLine>],
    top: f64,
    page: usize,
    fill: Option<Color>,
) -> Result<f64> {
    let lines = cells.iter().map(Vec::len).max().unwrap_or(1);
    let height = m.row_height(lines);
    for (i, (x, w)) in m.xs.iter().zip(&m.widths).enumerate() {
        c.surface_mut(page)?.draw_rect(
            *x,
            top - height,
            *w,
            height,
            fill,
            Some(Border {
                color: Color::MID_GRAY,
                width: 0.5,
            }),
        );
        let Some(cell) = cells.get(i) else { continue };
        for (n, line) in cell.iter().enumerate() {
            let baseline = top - CELL_PADDING - m.ascent - n as f64 * m.frame.line_height;
            c.draw_flow_line(line, x + CELL_PADDING, baseline, page, &m.frame)?;
        }
    }
    Ok(height)
}

/// Cut every cell to `max_lines`, marking cut cells with an ellipsis.
fn truncate_cells(c: &Composer<'_>, cells: &mut [Vec<FlowLine>], max_lines: usize, font_size: f64) {
    for cell in cells.iter_mut() {
        if cell.len() <= max_lines {
            continue;
        }
        cell.truncate(max_lines);
        if let Some(last) = cell.last_mut() {
            let width = c.fonts().measure(ELLIPSIS, FontVariant::Regular, font_size);
            last.words.push(PlacedWord {
                text: ELLIPSIS.to_string(),
                dx: last.width,
                width,
                font: FontVariant::Regular,
                style: StyleFlags::PLAIN,
                is_space: false,
            });
            last.width += width;
        }
    }
}

fn layout_table(c: &mut Composer<'_>, table: &TableBlock) -> Result<()> {
    if table.columns.is_empty() {
        return Ok(());
    }
    let body = c.body_frame();
    let g = c.geometry();
    let fonts = c.fonts();
    let widths = column_widths(table, g.content_width());
    let xs = widths
        .iter()
        .scan(g.margin, |x, w| {
            let left = *x;
            *x += w;
            Some(left)
        })
        .collect();
    let m = TableMetrics {
        frame: body,
        ascent: fonts.ascent(FontVariant::Regular, body.font_size),
        descent: body.font_size * 0.25,
        xs,
        widths,
    };

    let headers: Vec<Vec<StyledRun>> = table
        .columns
        .iter()
        .map(|col| emboldened(tokenize(&col.header)))
        .collect();
    let header_cells = cell_lines(c, &m, &headers);
    let header_height = m.row_height(header_cells.iter().map(Vec::len).max().unwrap_or(1));
    let rows: Vec<Vec<Vec<FlowLine>>> = table
        .rows
        .iter()
        .map(|row| {
            let texts: Vec<Vec<StyledRun>> = row.iter().map(|cell| tokenize(cell)).collect();
            cell_lines(c, &m, &texts)
        })
        .collect();

    let bottom = g.body_bottom();
    let fresh_top = g.body_top() + m.ascent;
    // Space for rows on a page that starts with a header.
    let capacity = fresh_top - header_height - bottom;

    let mut at = c.cursor();
    let mut top = at.y + m.ascent;
    let first_row = rows
        .first()
        .map(|cells| m.row_height(cells.iter().map(Vec::len).max().unwrap_or(1)))
        .unwrap_or(0.0);
    if top - header_height - first_row < bottom && top < fresh_top {
        at = c.next_page(at)?;
        top = fresh_top;
    }
    top -= draw_row(c, &m, &header_cells, top, at.page, Some(Color::HEADER_SHADE))?;
    let mut page_has_rows = false;

    for mut cells in rows {
        let lines = cells.iter().map(Vec::len).max().unwrap_or(1);
        let height = m.row_height(lines);
        let decision = decide_break(top - bottom, height, capacity);
        if decision != BreakDecision::Place && page_has_rows {
            at = c.next_page(at)?;
            top = fresh_top;
            top -= draw_row(c, &m, &header_cells, top, at.page, Some(Color::HEADER_SHADE))?;
            page_has_rows = false;
        }
        if decision == BreakDecision::Oversized {
            let fit = lines_that_fit(
                top - bottom,
                m.row_height(1),
                m.frame.line_height,
            );
            log::warn!(
                "table row of {} lines is taller than a page; truncating to {}",
                lines,
                fit
            );
            truncate_cells(c, &mut cells, fit, m.frame.font_size);
        }
        top -= draw_row(c, &m, &cells, top, at.page, None)?;
        page_has_rows = true;
    }

    c.set_cursor(FlowResult::new(g.margin, top - body.line_height, at.page));
    Ok(())
}

// ── Heading, separator ──────────────────────────────────────────

fn heading_size(base: f64, level: u8) -> f64 {
    match level {
        0 | 1 => base + 5.0,
        2 => base + 3.0,
        _ => base + 1.0,
    }
}

fn layout_heading(c: &mut Composer<'_>, text: &str, level: u8, align: Align) -> Result<()> {
    let body = c.body_frame();
    let size = heading_size(body.font_size, level);
    let frame = Frame {
        font_size: size,
        line_height: size * 1.2,
        ..body
    };
    let runs = emboldened(tokenize(text));

    // Taller glyphs need extra room above the baseline, and a heading
    // keeps two body lines with it on the page.
    let start = FlowResult {
        y: c.cursor().y - (frame.line_height - body.line_height).max(0.0),
        ..c.cursor()
    };
    let mut at = c.ensure_space(start, 2.0 * body.line_height)?;
    if align == Align::Center {
        let width: f64 = runs
            .iter()
            .map(|r| c.fonts().measure(&r.text, r.font, size))
            .sum();
        at.x = frame.x + ((frame.max_width - width) / 2.0).max(0.0);
    } else {
        at.x = frame.x;
    }

    let end = c.flow_text(&runs, at, &frame)?;
    let next = FlowResult {
        y: end.y - body.line_height - size * 0.3,
        x: body.x,
        page: end.page,
    };
    c.set_cursor(next);
    Ok(())
}

fn layout_separator(c: &mut Composer<'_>) -> Result<()> {
    let body = c.body_frame();
    let at = c.ensure_space(c.cursor(), 0.0)?;
    let y = at.y + body.font_size * 0.35;
    c.surface_mut(at.page)?.draw_line(
        Point::new(body.x, y),
        Point::new(body.x + body.max_width, y),
        0.75,
        Color::MID_GRAY,
    );
    c.set_cursor(at.next_line(&body));
    Ok(())
}
