//! Property tests for markup tokenizing, measuring, line breaking and page
//! breaks.

use std::collections::HashMap;

use folio::asset::BackgroundAsset;
use folio::config::EngineConfig;
use folio::font::FontContext;
use folio::layout::{Document, PageManager};
use folio::model::Metadata;
use folio::style::{Color, FontVariant, LineSpacing};
use folio::text::runs::{plain_text, tokenize, StyledRun};
use folio::text::{FlowResult, Frame, TextFlow};
use proptest::prelude::*;

const MARKERS: [char; 4] = ['*', '_', '~', '`'];

/// The markup that produced `runs`: styled runs wrapped back in their
/// delimiters.
fn rewrap(runs: &[StyledRun]) -> String {
    runs.iter()
        .map(|r| {
            let marker = if r.style.bold {
                "*"
            } else if r.style.italic {
                "_"
            } else if r.style.strike {
                "~"
            } else if r.style.monospace {
                "`"
            } else {
                ""
            };
            format!("{}{}{}", marker, r.text, marker)
        })
        .collect()
}

fn words() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-zA-Z0-9,.]{1,18}", 1..60)
}

proptest! {
    #[test]
    fn tokenize_only_drops_pair_delimiters(input in "[a-z *_~`]{0,60}") {
        let runs = tokenize(&input);
        prop_assert_eq!(rewrap(&runs), input.clone());

        let pairs = runs.iter().filter(|r| !r.style.is_plain()).count();
        prop_assert_eq!(
            input.chars().count() - plain_text(&runs).chars().count(),
            2 * pairs
        );
        for run in &runs {
            if run.style.is_plain() {
                prop_assert!(!run.is_empty());
            } else {
                prop_assert!(!run.text.contains(MARKERS));
            }
        }
        for pair in runs.windows(2) {
            prop_assert!(!(pair[0].style.is_plain() && pair[1].style.is_plain()));
        }
    }

    #[test]
    fn unmarked_text_is_one_plain_run(input in "[a-zA-Z0-9 ,.]{1,80}") {
        let runs = tokenize(&input);
        prop_assert_eq!(runs, vec![StyledRun::plain(input.clone())]);
    }

    #[test]
    fn measuring_is_monotonic(a in "[ -~]{0,40}", b in "[ -~]{0,40}", size in 6.0f64..24.0) {
        let fonts = FontContext::new();
        for variant in [FontVariant::Regular, FontVariant::Bold, FontVariant::Italic, FontVariant::Monospace] {
            let joined = format!("{}{}", a, b);
            prop_assert!(fonts.measure(&joined, variant, size) + 1e-9 >= fonts.measure(&a, variant, size));
        }
    }

    #[test]
    fn only_single_words_overflow(words in words(), max_width in 20.0f64..400.0, size in 8.0f64..16.0) {
        let fonts = FontContext::new();
        let flow = TextFlow::new(&fonts);
        let text = words.join(" ");
        let lines = flow.break_lines(&[StyledRun::plain(text)], 0.0, max_width, size);

        for line in &lines {
            if line.width > max_width + 0.01 {
                prop_assert!(!line.text().trim().contains(' '), "overflowing line '{}'", line.text());
            }
        }
    }

    #[test]
    fn breaking_keeps_every_word(words in words(), max_width in 20.0f64..400.0) {
        let fonts = FontContext::new();
        let flow = TextFlow::new(&fonts);
        let text = words.join(" ");
        let lines = flow.break_lines(&tokenize(&text), 0.0, max_width, 11.0);

        let rejoined: Vec<String> = lines
            .iter()
            .flat_map(|l| l.text().split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .collect();
        prop_assert_eq!(rejoined, words);
    }

    #[test]
    fn page_breaks_never_split_a_word(
        count in 5usize..80,
        max_width in 60.0f64..300.0,
        lines_left in 0usize..4,
    ) {
        // Each word is a plain stem with a bold tail: two pieces that must
        // land on the same page.
        let text: Vec<String> = (0..count).map(|i| format!("w{}*x{}*", i, i)).collect();
        let runs = tokenize(&text.join(" "));

        let fonts = FontContext::new();
        let flow = TextFlow::new(&fonts);
        let mut pm = page_manager();
        let first = pm.new_page().unwrap();
        let g = *pm.geometry();
        let frame = Frame {
            x: g.margin,
            max_width,
            font_size: 11.0,
            line_height: 13.2,
            color: Color::BLACK,
        };
        let start_y = g.body_bottom() + lines_left as f64 * frame.line_height;
        flow.layout(&runs, FlowResult::new(g.margin, start_y, first), &frame, &mut pm).unwrap();

        let doc = pm.finish();
        let mut page_of: HashMap<String, usize> = HashMap::new();
        for (index, page) in doc.pages.iter().enumerate() {
            for (piece, _, y) in page.surface.texts() {
                prop_assert!(y >= g.body_bottom() - 0.01);
                prop_assert!(page_of.insert(piece.to_string(), index).is_none(), "'{}' drawn twice", piece);
            }
        }
        for i in 0..count {
            let stem = page_of.get(&format!("w{}", i));
            let tail = page_of.get(&format!("x{}", i));
            prop_assert!(stem.is_some() && tail.is_some(), "word {} missing", i);
            prop_assert_eq!(stem, tail, "word {} split across pages", i);
        }
    }
}

fn page_manager() -> PageManager {
    PageManager::new(Document::new(
        &EngineConfig::default(),
        LineSpacing::Single,
        BackgroundAsset::Solid(Color::WHITE),
        None,
        None,
        Metadata::default(),
    ))
}
