//! Document: the sentinel-bracketed piece chain, the point, and the journal.
//!
//! Mutators apply exactly one `Edit`, move `point` to its end-of-change,
//! mark the document dirty, and notify watchers with the affected region,
//! in that order, matching the keymap's single-dispatch ordering.

use crate::edit::{Edit, EditId};
use crate::location::Location;
use crate::piece::{Piece, PieceId};
use tracing::debug;

/// Case sensitivity policy for `find_forward`/`find_backward`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Exact,
    IgnoreCase,
    /// Case-insensitive if the pattern is all lower-case, exact otherwise.
    SmartCase,
}

pub struct Document {
    pub(crate) pieces: Vec<Piece>,
    pub(crate) edits: Vec<Edit>,
    pub(crate) start: PieceId,
    pub(crate) end: PieceId,
    pub(crate) root_edit: EditId,
    pub(crate) tip: EditId,
    pub(crate) point: Location,
    pub(crate) dirty: bool,
    pub name: String,
    watchers: Vec<Box<dyn FnMut(Location, Location)>>,
}

impl Document {
    /// Builds a document whose initial content is `data`, held in a single
    /// primary piece (the whole-file-read-on-open path).
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        let mut doc = Document {
            pieces: Vec::new(),
            edits: Vec::new(),
            start: PieceId(0),
            end: PieceId(1),
            root_edit: EditId(0),
            tip: EditId(0),
            point: Location {
                piece: PieceId(1),
                offset: 0,
            },
            dirty: false,
            name: name.into(),
            watchers: Vec::new(),
        };
        doc.rebuild_chain(data);
        doc
    }

    pub fn from_str(name: impl Into<String>, content: &str) -> Self {
        Self::from_bytes(name, content.as_bytes().to_vec())
    }

    /// Resets the chain to sentinels bracketing a single primary piece (or
    /// just sentinels, if `data` is empty) and starts a fresh journal
    /// holding only the root edit. Used by both construction and `squash`.
    fn rebuild_chain(&mut self, data: Vec<u8>) {
        self.pieces.clear();
        self.edits.clear();

        let start = self.new_primary(Vec::new());
        let end = self.new_primary(Vec::new());
        self.start = start;
        self.end = end;

        if data.is_empty() {
            self.link(Some(start), Some(end));
        } else {
            let body = self.new_primary(data);
            self.link(Some(start), Some(body));
            self.link(Some(body), Some(end));
        }

        let root = Edit {
            pre: None,
            ins: None,
            post: None,
            first: end,
            last: start,
            before: start,
            after: end,
            applied: true,
            prev: None,
            next: None,
        };
        self.edits.push(root);
        self.root_edit = EditId(0);
        self.tip = EditId(0);
        self.point = self.doc_start();
        self.dirty = false;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn point(&self) -> Location {
        self.point
    }

    pub fn set_point(&mut self, loc: Location) {
        self.point = loc;
    }

    pub fn set_point_start(&mut self) {
        self.point = self.doc_start();
    }

    pub fn set_point_end(&mut self) {
        self.point = self.doc_end();
    }

    pub fn move_point(&mut self, delta: isize) {
        self.point = self.move_location(self.point, delta);
    }

    pub(crate) fn notify(&mut self, start: Location, end: Location) {
        for w in &mut self.watchers {
            w(start, end);
        }
    }

    pub fn watch(&mut self, f: impl FnMut(Location, Location) + 'static) {
        self.watchers.push(Box::new(f));
    }

    // -- Character-level navigation -----------------------------------

    pub fn get_char(&self) -> u8 {
        self.byte_at(self.point)
    }

    pub fn next_char(&mut self) -> u8 {
        let c = self.get_char();
        self.point = self.advance(self.point);
        c
    }

    pub fn prev_char(&mut self) -> u8 {
        self.point = self.retreat(self.point);
        self.get_char()
    }

    /// Scans forward until a byte in `set` is found, leaving point just
    /// past the match. Returns whether a match was found.
    pub fn find_char_forward(&mut self, set: &[u8]) -> bool {
        self.scan_forward(|b| set.contains(&b))
    }

    pub fn find_char_backward(&mut self, set: &[u8]) -> bool {
        self.scan_backward(|b| set.contains(&b))
    }

    /// Stops at the first byte *not* in `set`. (Resolves an Open
    /// Question in favor of `while !is_match`, not the source's
    /// `while is_match`.)
    pub fn find_not_char_forward(&mut self, set: &[u8]) -> bool {
        self.scan_forward(|b| !set.contains(&b))
    }

    pub fn find_not_char_backward(&mut self, set: &[u8]) -> bool {
        self.scan_backward(|b| !set.contains(&b))
    }

    fn scan_forward(&mut self, pred: impl Fn(u8) -> bool) -> bool {
        loop {
            if self.at_end() {
                return false;
            }
            let b = self.get_char();
            self.point = self.advance(self.point);
            if pred(b) {
                return true;
            }
        }
    }

    fn scan_backward(&mut self, pred: impl Fn(u8) -> bool) -> bool {
        loop {
            if self.at_start() {
                return false;
            }
            self.point = self.retreat(self.point);
            let b = self.get_char();
            if pred(b) {
                return true;
            }
        }
    }

    // -- Search ----------------------------------------------------------

    fn eq_byte(a: u8, b: u8, mode: MatchMode, pattern_is_lower: bool) -> bool {
        match mode {
            MatchMode::Exact => a == b,
            MatchMode::IgnoreCase => a.to_ascii_lowercase() == b.to_ascii_lowercase(),
            MatchMode::SmartCase => {
                if pattern_is_lower {
                    a.to_ascii_lowercase() == b.to_ascii_lowercase()
                } else {
                    a == b
                }
            }
        }
    }

    /// Naive forward scan for `pattern`. Leaves point just after the match
    /// and returns `true`, or leaves point unmoved and returns `false`.
    pub fn find_forward(&mut self, pattern: &[u8], mode: MatchMode) -> bool {
        if pattern.is_empty() {
            return false;
        }
        let pattern_is_lower = pattern.iter().all(|b| !b.is_ascii_uppercase());
        let mut candidate = self.point;
        loop {
            if let Some(end) = self.matches_at(candidate, pattern, mode, pattern_is_lower) {
                self.point = end;
                return true;
            }
            if candidate == self.doc_end() {
                return false;
            }
            candidate = self.advance(candidate);
        }
    }

    /// Naive backward scan for `pattern`, trying each start position moving
    /// left from point. Leaves point just after the match.
    pub fn find_backward(&mut self, pattern: &[u8], mode: MatchMode) -> bool {
        if pattern.is_empty() || pattern.len() >= self.position(self.point) {
            self.point = self.doc_start();
            return false;
        }
        let pattern_is_lower = pattern.iter().all(|b| !b.is_ascii_uppercase());
        let mut candidate = self.point;
        loop {
            candidate = self.retreat(candidate);
            if let Some(end) = self.matches_at(candidate, pattern, mode, pattern_is_lower) {
                self.point = end;
                return true;
            }
            if candidate == self.doc_start() {
                self.point = self.doc_start();
                return false;
            }
        }
    }

    /// If `pattern` matches starting at `loc`, returns the location just
    /// past the match.
    fn matches_at(
        &self,
        loc: Location,
        pattern: &[u8],
        mode: MatchMode,
        pattern_is_lower: bool,
    ) -> Option<Location> {
        let mut cur = loc;
        for &pb in pattern {
            if cur == self.doc_end() {
                return None;
            }
            let b = self.byte_at(cur);
            if !Self::eq_byte(pb, b, mode, pattern_is_lower) {
                return None;
            }
            cur = self.advance(cur);
        }
        Some(cur)
    }

    // -- Extraction --------------------------------------------------

    /// Bytes in the half-open range `[start, end)`.
    pub fn get_data(&self, start: Location, end: Location) -> Vec<u8> {
        let mut out = Vec::new();
        let mut cur = start;
        while cur != end {
            out.push(self.byte_at(cur));
            cur = self.advance(cur);
        }
        out
    }

    /// The whole document's bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.get_data(self.doc_start(), self.doc_end())
    }

    /// Byte-level (not display-wrapped) start of the line containing `loc`:
    /// walk backward to the byte just past the nearest `\n`, or document
    /// start. Used by line/paragraph motions, which are pure compositions
    /// over the engine but still need a Document primitive to
    /// compose over.
    pub fn line_start(&self, loc: Location) -> Location {
        let mut cur = loc;
        loop {
            if cur == self.doc_start() {
                return cur;
            }
            let before = self.retreat(cur);
            if self.byte_at(before) == b'\n' {
                return cur;
            }
            cur = before;
        }
    }

    pub fn is_line_start(&self, loc: Location) -> bool {
        self.line_start(loc) == loc
    }

    // -- Mutators ------------------------------------------------------

    pub fn insert(&mut self, s: &[u8]) {
        if s.is_empty() {
            return;
        }
        self.apply_change(self.point, 0, s);
    }

    pub fn delete(&mut self, n: isize) {
        if n == 0 {
            return;
        }
        let (left, right) = if n > 0 {
            (self.point, self.move_location(self.point, n))
        } else {
            (self.move_location(self.point, n), self.point)
        };
        let actual = self.distance_before(left, right).unwrap_or(0) as isize;
        if actual == 0 {
            return;
        }
        let signed = if n > 0 { actual } else { -actual };
        self.apply_change(self.point, signed, &[]);
    }

    pub fn replace(&mut self, s: &[u8]) {
        self.apply_change(self.point, s.len() as isize, s);
    }

    /// Serializes the document, rebuilds the chain as a single primary
    /// piece, and starts a fresh journal. Destructive of undo history.
    /// Point is restored by absolute byte offset against the new chain.
    pub fn squash(&mut self) {
        let old_pos = self.position(self.point);
        let data = self.to_bytes();
        self.rebuild_chain(data);
        self.point = self.move_location(self.doc_start(), old_pos as isize);
        debug!(target: "core_text.document", bytes = self.pieces.len(), "squash");
        let (s, e) = (self.doc_start(), self.doc_end());
        self.notify(s, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_read_back() {
        let mut doc = Document::from_str("t", "hello world");
        doc.set_point_start();
        doc.move_point(5);
        doc.insert(b" there");
        assert_eq!(doc.to_bytes(), b"hello there world");
    }

    #[test]
    fn delete_clamped_at_start() {
        let mut doc = Document::from_str("t", "abc");
        doc.set_point_start();
        doc.delete(-10);
        assert_eq!(doc.to_bytes(), b"abc");
    }

    #[test]
    fn find_char_forward_at_end_fails() {
        let mut doc = Document::from_str("t", "abc");
        doc.set_point_end();
        assert!(!doc.find_char_forward(b"x"));
        assert!(doc.at_end());
    }

    #[test]
    fn find_not_char_backward_stops_at_mismatch() {
        let mut doc = Document::from_str("t", "aaab");
        doc.set_point_end();
        assert!(doc.find_not_char_backward(b"a"));
        assert_eq!(doc.get_char(), b'b');
    }
}
