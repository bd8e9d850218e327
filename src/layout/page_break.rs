//! # Page Break Decisions
//!
//! Keep-together rules shared by the section templates. A totals box, a
//! table row or a pair of field columns is either placed where the cursor
//! is, moved whole to the next page, or recognised as taller than any page
//! body so the caller can fall back (stacking columns, truncating a row).

/// What to do with an unbreakable block of a given height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakDecision {
    /// It fits in the space left on the current page.
    Place,
    /// It does not fit here but fits on an empty page body.
    MoveToNextPage,
    /// It is taller than an empty page body.
    Oversized,
}

/// Decide how to place a block of height `needed`.
///
/// `remaining` is the space left below the cursor on the current page and
/// `capacity` the space an empty page body offers. Comparisons allow a small
/// tolerance so blocks measured to exactly fill the page are not pushed off
/// by rounding.
pub fn decide_break(remaining: f64, needed: f64, capacity: f64) -> BreakDecision {
    const EPSILON: f64 = 0.01;
    if needed <= remaining + EPSILON {
        BreakDecision::Place
    } else if needed <= capacity + EPSILON {
        BreakDecision::MoveToNextPage
    } else {
        BreakDecision::Oversized
    }
}

/// How many lines of a block fit in `available` space, where the first line
/// costs `first_line` and every further line `line_height`. At least one line
/// is always granted so an oversized block still shows something.
pub fn lines_that_fit(available: f64, first_line: f64, line_height: f64) -> usize {
    if available < first_line || line_height <= 0.0 {
        return 1;
    }
    1 + ((available - first_line) / line_height + 1e-9).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_on_current_page() {
        assert_eq!(decide_break(300.0, 120.0, 700.0), BreakDecision::Place);
    }

    #[test]
    fn exact_fit_is_placed() {
        assert_eq!(decide_break(120.0, 120.000_001, 700.0), BreakDecision::Place);
    }

    #[test]
    fn moves_when_short_on_space() {
        assert_eq!(decide_break(40.0, 120.0, 700.0), BreakDecision::MoveToNextPage);
    }

    #[test]
    fn oversized_blocks_are_flagged() {
        assert_eq!(decide_break(40.0, 900.0, 700.0), BreakDecision::Oversized);
        assert_eq!(decide_break(900.0, 900.0, 700.0), BreakDecision::Place);
    }

    #[test]
    fn line_capacity() {
        assert_eq!(lines_that_fit(100.0, 20.0, 10.0), 9);
        assert_eq!(lines_that_fit(5.0, 20.0, 10.0), 1);
        assert_eq!(lines_that_fit(20.0, 20.0, 10.0), 1);
    }
}
