//! Inline markup tokenizer.
//!
//! Report text is free-form, so markup is forgiving: `*bold*`, `_italic_`,
//! `~strike~` and `` `code` `` are recognized only when the closing
//! delimiter exists and the enclosed span holds no other marker character.
//! Anything else is literal text. Markers never nest.

use crate::style::{FontVariant, StyleFlags};

const MARKERS: [char; 4] = ['*', '_', '~', '`'];

/// A contiguous span of text drawn with one style.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledRun {
    pub text: String,
    pub style: StyleFlags,
    /// Font variant derived from `style`.
    pub font: FontVariant,
}

impl StyledRun {
    pub fn new(text: impl Into<String>, style: StyleFlags) -> Self {
        Self {
            text: text.into(),
            style,
            font: style.font_variant(),
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, StyleFlags::PLAIN)
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self::new(text, StyleFlags::BOLD)
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self::new(text, StyleFlags::ITALIC)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

fn marker_style(marker: char) -> StyleFlags {
    match marker {
        '*' => StyleFlags::BOLD,
        '_' => StyleFlags::ITALIC,
        '~' => StyleFlags::STRIKE,
        _ => StyleFlags::MONOSPACE,
    }
}

/// Split annotated text into styled runs.
///
/// The runs cover the input with no gaps: concatenating their text gives the
/// input minus the delimiters of every recognized pair.
pub fn tokenize(input: &str) -> Vec<StyledRun> {
    let chars: Vec<char> = input.chars().collect();
    let mut runs = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if MARKERS.contains(&ch) {
            if let Some(close) = find_close(&chars, i) {
                if !literal.is_empty() {
                    runs.push(StyledRun::plain(std::mem::take(&mut literal)));
                }
                let inner: String = chars[i + 1..close].iter().collect();
                runs.push(StyledRun::new(inner, marker_style(ch)));
                i = close + 1;
                continue;
            }
        }
        literal.push(ch);
        i += 1;
    }

    if !literal.is_empty() {
        runs.push(StyledRun::plain(literal));
    }
    runs
}

/// Index of the delimiter closing the marker at `open`, if the pair is valid.
fn find_close(chars: &[char], open: usize) -> Option<usize> {
    let marker = chars[open];
    for (offset, &c) in chars[open + 1..].iter().enumerate() {
        if c == marker {
            return Some(open + 1 + offset);
        }
        if MARKERS.contains(&c) {
            return None;
        }
    }
    None
}

/// Concatenated text of a run sequence.
pub fn plain_text(runs: &[StyledRun]) -> String {
    runs.iter().map(|r| r.text.as_str()).collect()
}
