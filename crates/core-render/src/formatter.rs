//! The wrapping line formatter: turns the piece chain into display rows and
//! maintains the beginning-of-line (BoL) ladder cache that lets vertical
//! motion and painting avoid re-wrapping the whole document on every frame.
//!
//! `Formatter` knows nothing about a terminal. It reads a `Document`
//! through its public `Location`/`Document` API and produces byte rows plus
//! a column map. The display layer (`core-state`/`ox-bin`) pushes those
//! bytes at a `Screen`.

use crate::ladder::{Ladder, DEFAULT_CAPACITY};
use core_text::{Document, Location};
use tracing::debug;

/// Control bytes below this encode as a two-byte `^X` escape (except `\t`
/// and `\n`, which have their own rendering).
const CTRL_THRESHOLD: u8 = 0x20;
/// Bytes at or above this encode as a three-byte `\HH` escape.
const HIGH_THRESHOLD: u8 = 0x7F;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

pub struct Formatter {
    pub cols: usize,
    pub tab: usize,
    pub rungs: usize,
    ladder: Ladder,
}

impl Formatter {
    /// `tab` must divide `cols` (a misconfiguration, not a user-input
    /// error), so this fails fast rather than silently truncating a row.
    pub fn new(cols: usize, tab: usize, rungs: usize) -> Self {
        assert!(cols > 0, "cols must be positive");
        assert!(tab > 0 && cols % tab == 0, "tab must divide cols");
        Self {
            cols,
            tab,
            rungs,
            ladder: Ladder::new(DEFAULT_CAPACITY),
        }
    }

    pub fn ladder(&self) -> &Ladder {
        &self.ladder
    }

    // -- Line formatting ----------------------------------------------

    /// Width in display columns of the byte `b` if placed at column `col`,
    /// and renders it into `line[col..col+width]`. Newline is handled
    /// separately by the caller, since its effect (pad-and-stop) isn't a
    /// fixed width at this column.
    fn width_of(b: u8, col: usize, tab: usize) -> usize {
        match b {
            b'\t' => tab - (col % tab),
            0x20..=0x7E => 1,
            b if b < CTRL_THRESHOLD => 2,
            b if b >= HIGH_THRESHOLD => 3,
            _ => 1,
        }
    }

    fn encode_into(line: &mut [u8], col: usize, b: u8, width: usize) {
        match b {
            b'\t' => {
                line[col] = b'\t';
                for slot in line.iter_mut().skip(col + 1).take(width - 1) {
                    *slot = 0;
                }
            }
            0x20..=0x7E => line[col] = b,
            b if b < CTRL_THRESHOLD => {
                line[col] = 0x01;
                line[col + 1] = b | 0x40;
            }
            b => {
                line[col] = 0x02;
                line[col + 1] = HEX_DIGITS[(b >> 4) as usize];
                line[col + 2] = HEX_DIGITS[(b & 0x0F) as usize];
            }
        }
    }

    /// Reads forward from `doc`'s point, filling exactly `self.cols` bytes,
    /// and leaves point at the start of the following row. Returns the row
    /// bytes and `col_map[i]`, the column of the i-th document byte
    /// consumed on this row (plus one trailing entry for the hypothetical
    /// end-of-document position).
    pub fn format_line(&self, doc: &mut Document) -> (Vec<u8>, Vec<usize>) {
        let mut line = vec![0u8; self.cols];
        let mut col_map = Vec::new();
        let mut col = 0usize;
        // The most recent soft-wrap candidate seen on this row: the column
        // just past it, the Location just past it, and how many col_map
        // entries existed at that point, so overflow can roll back to it.
        let mut wrap: Option<(usize, Location, usize)> = None;

        loop {
            if doc.at_end() {
                col_map.push(col);
                break;
            }

            let before = doc.point();
            let b = doc.get_char();

            if b == b'\n' {
                col_map.push(col);
                doc.next_char();
                break;
            }

            let width = Self::width_of(b, col, self.tab);
            if col + width > self.cols {
                if let Some((wrap_col, wrap_loc, wrap_len)) = wrap {
                    doc.set_point(wrap_loc);
                    for slot in line.iter_mut().skip(wrap_col) {
                        *slot = 0;
                    }
                    col_map.truncate(wrap_len);
                } else {
                    doc.set_point(before);
                }
                break;
            }

            Self::encode_into(&mut line, col, b, width);
            col_map.push(col);
            col += width;
            doc.next_char();

            if matches!(b, b' ' | b'\t' | b'-') {
                wrap = Some((col, doc.point(), col_map.len()));
            }
            // No explicit "row full" break here: if col has reached `cols`,
            // the next byte (width >= 1) always overflows and is caught by
            // the overflow branch above, which is what lets a row-filling
            // run roll back to the last wrap point instead of hard-breaking
            // one byte past a word boundary.
        }

        (line, col_map)
    }

    // -- Column helpers --------------------------------------------------

    /// The largest document offset (into this row) whose column is `<=
    /// col`. Used for vertical motion landing on the nearest byte to a
    /// sticky column.
    pub fn offset_for_column(col: usize, col_map: &[usize]) -> usize {
        match col_map.binary_search(&col) {
            Ok(i) => i,
            Err(0) => 0,
            Err(i) => i - 1,
        }
    }

    pub fn column_for_offset(off: usize, col_map: &[usize]) -> usize {
        col_map[off.min(col_map.len() - 1)]
    }

    // -- BoL ladder -------------------------------------------------------

    fn brackets(&self, doc: &Document, point: Location) -> bool {
        let (Some(first), Some(last)) = (self.ladder.front(), self.ladder.back()) else {
            return false;
        };
        doc.distance_before(first, point).is_some() && doc.distance_before(point, last).is_some()
    }

    /// Advances the ladder one row forward via `format_line`, appending the
    /// resulting BoL. Returns the new point (start of the following row).
    fn extend_forward(&mut self, doc: &mut Document) -> Location {
        let (_line, _map) = self.format_line(doc);
        let here = doc.point();
        self.ladder.push_back(here);
        here
    }

    /// Ensures the ladder strictly brackets `point` with roughly
    /// `self.rungs` rungs preceding it. Rebuilds from scratch (seeking back
    /// `rungs*cols` bytes then to the nearest line start) when the existing
    /// ladder doesn't already bracket.
    pub fn ladder_point(&mut self, doc: &mut Document) {
        let point = doc.point();
        if self.brackets(doc, point) {
            return;
        }

        let back = (self.rungs * self.cols) as isize;
        let seek = doc.move_location(point, -back);
        let start = doc.line_start(seek);

        self.ladder.clear();
        doc.set_point(start);
        self.ladder.push_back(start);

        loop {
            if doc.at_end() {
                break;
            }
            let here = self.extend_forward(doc);
            if self.brackets(doc, point) {
                let _ = here;
                break;
            }
        }
        doc.set_point(point);
    }

    /// Moves point back to the beginning of its current display row.
    pub fn clamp_to_bol(&mut self, doc: &mut Document) {
        let point = doc.point();
        if point == doc.doc_start() || point == doc.doc_end() {
            return;
        }
        if self.ladder.contains(point) {
            return;
        }
        self.ladder_point(doc);
        let target_pos = doc.position(point);
        let mut best = doc.doc_start();
        for rung in self.ladder.iter() {
            if doc.position(rung) <= target_pos {
                best = rung;
            } else {
                break;
            }
        }
        doc.set_point(best);
    }

    /// Jumps point to the start of the next display row.
    pub fn bol_to_next_bol(&mut self, doc: &mut Document) -> Location {
        let point = doc.point();
        if let Some(idx) = self.ladder.index_of(point) {
            if let Some(next) = self.ladder.get(idx + 1) {
                doc.set_point(next);
                return next;
            }
        }
        self.extend_forward(doc)
    }

    /// Jumps point to the start of the previous display row. No-op at
    /// start-of-document.
    pub fn bol_to_prev_bol(&mut self, doc: &mut Document) -> Location {
        let point = doc.point();
        if doc.at_start() {
            return point;
        }
        if let Some(idx) = self.ladder.index_of(point) {
            if idx > 0 {
                let prev = self.ladder.get(idx - 1).expect("idx > 0");
                doc.set_point(prev);
                return prev;
            }
        }
        self.ladder_point(doc);
        let target_pos = doc.position(point);
        let mut prev = doc.doc_start();
        for rung in self.ladder.iter() {
            let rung_pos = doc.position(rung);
            if rung_pos < target_pos {
                prev = rung;
            } else {
                break;
            }
        }
        doc.set_point(prev);
        prev
    }

    /// Rescues the ladder after an edit affecting `[change_start,
    /// change_end)`, rewriting rungs using byte distances relative to
    /// `change_start` rather than the stale Location values. Those may now
    /// lie in a detached side-chain the edit excluded from the live chain.
    pub fn change_handler(&mut self, doc: &Document, change_start: Location, _change_end: Location) {
        if self.ladder.is_empty() {
            return;
        }
        let first = self.ladder.front().expect("checked non-empty above");
        let last = self.ladder.back().expect("checked non-empty above");

        let discard = match doc.distance_before(first, change_start) {
            None => true,
            Some(d) if d < self.cols => true,
            Some(_) => match doc.distance_before(change_start, last) {
                Some(d) => d > self.rungs * self.cols,
                None => true,
            },
        };
        if discard {
            debug!(target: "core_render.formatter", "ladder discarded on rescue");
            self.ladder.clear();
            return;
        }

        // `w[0]`/`w[1]` are two rungs from the ladder *before* this edit. If
        // the edit excluded the piece(s) between them into a detached
        // side-chain, `distance_before` can no longer measure the gap, and
        // because every later rung's position is reconstructed relative to
        // this one, nothing past that point can be trusted either. Stop
        // collecting deltas there rather than papering over the gap with a
        // made-up distance, which would duplicate the last valid rung.
        let old: Vec<Location> = self.ladder.iter().collect();
        let mut deltas = Vec::with_capacity(old.len());
        for w in old.windows(2) {
            match doc.distance_before(w[0], w[1]) {
                Some(d) => deltas.push(d),
                None => break,
            }
        }

        self.ladder.clear();
        self.ladder.push_back(first);
        let mut last_pushed = first;
        let mut kept = 1usize;
        for d in deltas {
            let candidate = doc.move_location(last_pushed, d as isize);
            let too_close = doc
                .distance_before(candidate, change_start)
                .map(|dd| dd < self.cols)
                .unwrap_or(true);
            if too_close {
                break;
            }
            self.ladder.push_back(candidate);
            last_pushed = candidate;
            kept += 1;
        }
        debug!(target: "core_render.formatter", kept, total = old.len(), "ladder rescued");
    }
}
