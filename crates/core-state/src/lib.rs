//! The Display/Editor interface: point/mark/clipboard/overwrite/
//! isearch state, composed over `core-text::Document` and
//! `core-render::Formatter`. This crate does not paint. It only tracks the
//! state a display loop needs and implements the framing algorithm that
//! decides which BoL to treat as the top of the screen.

use core_render::Formatter;
use core_text::{Document, Location};

/// Incremental search state.
#[derive(Debug, Clone)]
pub struct IsearchState {
    pub active: bool,
    pub forward: bool,
    pub pattern: String,
    /// Point at the moment search was entered, restored if the user cancels.
    pub origin: Location,
}

impl IsearchState {
    pub fn inactive(origin: Location) -> Self {
        Self {
            active: false,
            forward: true,
            pattern: String::new(),
            origin,
        }
    }
}

/// Editor-level state sitting above the piece-table engine and the
/// Formatter: cursor preferences, selection anchor, clipboard, and
/// incremental search. Named entry points over this type live in
/// `core-actions`.
pub struct Editor {
    pub preferred_top: Option<Location>,
    pub preferred_col: usize,
    pub sticky_column: bool,
    pub mark: Option<Location>,
    pub clipboard: Vec<u8>,
    pub overwrite: bool,
    pub isearch: IsearchState,
}

impl Editor {
    pub fn new(doc: &Document) -> Self {
        Self {
            preferred_top: None,
            preferred_col: 0,
            sticky_column: false,
            mark: None,
            clipboard: Vec::new(),
            overwrite: false,
            isearch: IsearchState::inactive(doc.doc_start()),
        }
    }

    pub fn set_mark(&mut self, loc: Location) {
        self.mark = Some(loc);
    }

    pub fn clear_mark(&mut self) {
        self.mark = None;
    }

    /// The region `[start, end)` bounded by point and mark, if a mark is
    /// set, ordered so `start` precedes `end` in the live chain.
    pub fn selection(&self, doc: &Document) -> Option<(Location, Location)> {
        let mark = self.mark?;
        let point = doc.point();
        if doc.distance_before(mark, point).is_some() {
            Some((mark, point))
        } else if doc.distance_before(point, mark).is_some() {
            Some((point, mark))
        } else {
            None
        }
    }

    /// Decides which BoL should be painted as row 0 of a screen of `rows`
    /// display rows: prefer keeping the
    /// previous top on screen (if point hasn't scrolled off it), subject to
    /// `guard_rows` of context above/below; otherwise recenter around
    /// point at `rows/2`. Returns the rung Locations to paint from, one per
    /// row, restoring point to its pre-call position on exit.
    pub fn frame(
        &mut self,
        doc: &mut Document,
        fmt: &mut Formatter,
        rows: usize,
        guard_rows: usize,
    ) -> Vec<Location> {
        if rows == 0 {
            return Vec::new();
        }
        let anchor = doc.point();
        fmt.clamp_to_bol(doc);

        let preferred_row = rows / 2;
        let mut fallback = doc.point();
        let mut cur = doc.point();
        let mut top = fallback;
        let mut stopped_early = false;
        let mut steps_above = 0usize;

        for i in 1..=rows {
            let prev = fmt.bol_to_prev_bol(doc);
            if prev == cur {
                // Reached start-of-document before finding the previous top.
                break;
            }
            cur = prev;
            if i == preferred_row {
                fallback = cur;
            }
            if Some(cur) == self.preferred_top {
                stopped_early = true;
                steps_above = i;
                break;
            }
        }

        if stopped_early {
            let below = rows.saturating_sub(steps_above);
            top = if steps_above >= guard_rows && below >= guard_rows {
                cur
            } else {
                fallback
            };
        } else {
            top = fallback;
        }

        doc.set_point(top);
        let mut painted = vec![top];
        for _ in 1..rows {
            if doc.at_end() {
                break;
            }
            painted.push(fmt.bol_to_next_bol(doc));
        }
        doc.set_point(anchor);
        self.preferred_top = Some(top);
        painted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_render::Formatter;
    use core_text::Document;

    #[test]
    fn frame_on_short_document_returns_single_row_from_start() {
        let mut doc = Document::from_str("t", "hello world");
        let mut fmt = Formatter::new(10, 4, 4);
        let mut editor = Editor::new(&doc);
        doc.set_point_start();
        let rows = editor.frame(&mut doc, &mut fmt, 5, 1);
        assert_eq!(rows[0], doc.doc_start());
    }

    #[test]
    fn selection_orders_mark_and_point() {
        let mut doc = Document::from_str("t", "abcdefgh");
        let mut editor = Editor::new(&doc);
        let mark = doc.move_location(doc.doc_start(), 5);
        editor.set_mark(mark);
        doc.set_point(doc.move_location(doc.doc_start(), 2));
        let (start, end) = editor.selection(&doc).unwrap();
        assert_eq!(doc.position(start), 2);
        assert_eq!(doc.position(end), 5);
    }
}
