//! # Text Flow
//!
//! Greedy word wrapping of styled runs into a column, and placement of the
//! resulting lines onto pages.
//!
//! Text is split into words, whitespace and forced breaks. A word is a
//! maximal stretch of non-whitespace and may span several runs
//! (`*bold*ness` is one word in two fonts), so lines and pages only ever
//! break between words. A word wider than the column on its own is placed
//! anyway and overflows the right edge.

pub mod runs;

pub use runs::{tokenize, StyledRun};

use crate::error::Result;
use crate::font::FontContext;
use crate::layout::PageManager;
use crate::style::{Color, FontVariant, StyleFlags};
use crate::surface::Point;

/// Tolerance for width and height comparisons.
const EPSILON: f64 = 1e-6;

/// The column text is flowed into.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    /// Left edge of every line after the first.
    pub x: f64,
    pub max_width: f64,
    pub font_size: f64,
    pub line_height: f64,
    pub color: Color,
}

/// Where a flow stopped: pen position on the baseline of the last line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowResult {
    pub x: f64,
    /// Baseline.
    pub y: f64,
    pub page: usize,
}

impl FlowResult {
    pub fn new(x: f64, y: f64, page: usize) -> Self {
        Self { x, y, page }
    }

    /// Start of the following line in `frame`. The result may sit below
    /// the page body; the next placement moves it to a new page.
    pub fn next_line(self, frame: &Frame) -> Self {
        Self {
            x: frame.x,
            y: self.y - frame.line_height,
            page: self.page,
        }
    }

    /// Whether `self` is further down the document than `other`.
    pub fn is_below(&self, other: &FlowResult) -> bool {
        self.page > other.page || (self.page == other.page && self.y < other.y)
    }
}

/// One drawn piece of a line: a word fragment in a single style, or a
/// whitespace gap.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedWord {
    pub text: String,
    /// Offset of the left edge from the frame's `x`.
    pub dx: f64,
    pub width: f64,
    pub font: FontVariant,
    pub style: StyleFlags,
    pub is_space: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowLine {
    pub words: Vec<PlacedWord>,
    /// Right edge of the last drawn word, from the frame's `x`.
    pub width: f64,
    /// Pen position after the line, trailing whitespace included.
    pub advance: f64,
}

impl FlowLine {
    pub fn has_ink(&self) -> bool {
        self.words.iter().any(|w| !w.is_space)
    }

    /// The line's text, whitespace included.
    pub fn text(&self) -> String {
        self.words.iter().map(|w| w.text.as_str()).collect()
    }
}

/// A fragment of a token together with the run it came from.
struct Piece<'a> {
    text: &'a str,
    run: &'a StyledRun,
}

enum Token<'a> {
    Word(Vec<Piece<'a>>),
    Space(Vec<Piece<'a>>),
    Newline,
}

/// Split runs into words, whitespace and forced breaks. Empty runs produce
/// nothing.
fn split_tokens(runs: &[StyledRun]) -> Vec<Token<'_>> {
    let mut tokens: Vec<Token> = Vec::new();
    for run in runs {
        let text = run.text.as_str();
        let mut chars = text.char_indices().peekable();
        while let Some((i, ch)) = chars.next() {
            if ch == '\n' {
                tokens.push(Token::Newline);
                continue;
            }
            let space = ch.is_whitespace();
            let mut end = i + ch.len_utf8();
            while let Some(&(j, next)) = chars.peek() {
                if next == '\n' || next.is_whitespace() != space {
                    break;
                }
                end = j + next.len_utf8();
                chars.next();
            }
            let piece = Piece {
                text: &text[i..end],
                run,
            };
            let unmerged = match (tokens.last_mut(), space) {
                (Some(Token::Word(pieces)), false) | (Some(Token::Space(pieces)), true) => {
                    pieces.push(piece);
                    None
                }
                _ => Some(piece),
            };
            if let Some(piece) = unmerged {
                tokens.push(if space {
                    Token::Space(vec![piece])
                } else {
                    Token::Word(vec![piece])
                });
            }
        }
    }
    tokens
}

/// Measures and places styled text.
pub struct TextFlow<'f> {
    fonts: &'f FontContext,
}

impl<'f> TextFlow<'f> {
    pub fn new(fonts: &'f FontContext) -> Self {
        Self { fonts }
    }

    pub fn fonts(&self) -> &'f FontContext {
        self.fonts
    }

    /// Break runs into lines no wider than `max_width`.
    ///
    /// `first_offset` is where the pen already stands on the first line,
    /// from the left edge. Whitespace at the start of a wrapped line is
    /// dropped; whitespace after a forced break is kept. Always returns at
    /// least one (possibly empty) line.
    pub fn break_lines(
        &self,
        runs: &[StyledRun],
        first_offset: f64,
        max_width: f64,
        font_size: f64,
    ) -> Vec<FlowLine> {
        let mut lines = Vec::new();
        let mut line = FlowLine::default();
        let mut pen = first_offset;
        let mut wrapped = false;

        for token in split_tokens(runs) {
            match token {
                Token::Newline => {
                    line.advance = pen;
                    lines.push(std::mem::take(&mut line));
                    pen = 0.0;
                    wrapped = false;
                }
                Token::Space(pieces) => {
                    if wrapped && line.words.is_empty() {
                        continue;
                    }
                    for piece in pieces {
                        let w = self.measure_piece(&piece, font_size);
                        line.words.push(placed(&piece, pen, w, true));
                        pen += w;
                    }
                }
                Token::Word(pieces) => {
                    let widths: Vec<f64> = pieces
                        .iter()
                        .map(|p| self.measure_piece(p, font_size))
                        .collect();
                    let total: f64 = widths.iter().sum();
                    let occupied = !line.words.is_empty() || pen > EPSILON;
                    if occupied && pen + total > max_width + EPSILON {
                        trim_trailing_space(&mut line);
                        line.advance = pen;
                        lines.push(std::mem::take(&mut line));
                        pen = 0.0;
                        wrapped = true;
                    }
                    for (piece, w) in pieces.iter().zip(widths) {
                        line.words.push(placed(piece, pen, w, false));
                        pen += w;
                    }
                    line.width = pen;
                }
            }
        }

        line.advance = pen;
        lines.push(line);
        lines
    }

    fn measure_piece(&self, piece: &Piece, font_size: f64) -> f64 {
        self.fonts.measure(piece.text, piece.run.font, font_size)
    }

    /// Flow runs into `frame` starting at `at`, requesting new pages as the
    /// body fills up. Returns the pen position after the last line.
    pub fn layout(
        &self,
        runs: &[StyledRun],
        at: FlowResult,
        frame: &Frame,
        pm: &mut PageManager,
    ) -> Result<FlowResult> {
        let lines = self.break_lines(runs, at.x - frame.x, frame.max_width, frame.font_size);
        let mut cursor = at;
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                cursor = cursor.next_line(frame);
            }
            if line.has_ink() {
                cursor = self.ensure_space(cursor, 0.0, pm)?;
                self.draw_line(line, frame.x, cursor.y, cursor.page, frame, pm)?;
            }
            cursor.x = frame.x + line.advance;
        }
        pm.set_cursor(cursor.page, Point::new(cursor.x, cursor.y));
        Ok(cursor)
    }

    /// Make sure a block reaching `needed` below the baseline `at.y` stays
    /// inside the page body, moving to the next page when it would not.
    pub fn ensure_space(
        &self,
        at: FlowResult,
        needed: f64,
        pm: &mut PageManager,
    ) -> Result<FlowResult> {
        let bottom = pm.geometry().body_bottom();
        if at.y - needed >= bottom - EPSILON {
            return Ok(at);
        }
        let page = pm.page_after(at.page)?;
        Ok(FlowResult::new(at.x, pm.geometry().body_top(), page))
    }

    /// Draw one broken line with its left edge at `x` and baseline `y`.
    ///
    /// Neighbouring pieces sharing a style are merged into a single text op;
    /// whitespace at either end of a merged span is not drawn.
    pub fn draw_line(
        &self,
        line: &FlowLine,
        x: f64,
        y: f64,
        page: usize,
        frame: &Frame,
        pm: &mut PageManager,
    ) -> Result<()> {
        let surface = pm.surface_mut(page)?;
        let mut spans: Vec<Vec<&PlacedWord>> = Vec::new();
        for word in &line.words {
            match spans.last_mut() {
                Some(span) if span[0].style == word.style && span[0].font == word.font => {
                    span.push(word)
                }
                _ => spans.push(vec![word]),
            }
        }

        for span in spans {
            let Some(first) = span.iter().position(|w| !w.is_space) else {
                continue;
            };
            let last = span.iter().rposition(|w| !w.is_space).unwrap_or(first);
            let inked = &span[first..=last];
            let text: String = inked.iter().map(|w| w.text.as_str()).collect();
            let left = x + inked[0].dx;
            let right = x + inked[inked.len() - 1].dx + inked[inked.len() - 1].width;
            let font = inked[0].font;
            surface.draw_text(&text, left, y, frame.font_size, font, frame.color);

            if inked[0].style.strike {
                let mid = y + self.fonts.ascent(font, frame.font_size) / 2.0;
                surface.draw_line(
                    Point::new(left, mid),
                    Point::new(right, mid),
                    (frame.font_size * 0.05).max(0.5),
                    frame.color,
                );
            }
        }
        Ok(())
    }
}

fn placed(piece: &Piece, dx: f64, width: f64, is_space: bool) -> PlacedWord {
    PlacedWord {
        text: piece.text.to_string(),
        dx,
        width,
        font: piece.run.font,
        style: piece.run.style,
        is_space,
    }
}

fn trim_trailing_space(line: &mut FlowLine) {
    while line.words.last().is_some_and(|w| w.is_space) {
        line.words.pop();
    }
}
