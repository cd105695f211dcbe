//! The piece-table document engine.
//!
//! `Document` owns a sentinel-bracketed doubly linked chain of `Piece`s, the
//! current point, and an append-only journal of `Edit`s. `Location` is a
//! stable `(piece, offset)` handle that keeps designating the same logical
//! byte across edits that don't swap its piece out of the chain.
//!
//! This crate has no knowledge of display wrapping (`core-render`), screen
//! I/O, or keymaps. It is the ASCII byte-level engine only. Non-goals:
//! multi-byte encodings, bidirectional text, syntax highlighting.

pub mod document;
pub mod edit;
pub mod location;
pub mod piece;

pub use document::{Document, MatchMode};
pub use location::Location;
pub use piece::PieceId;

#[cfg(test)]
mod tests {
    use super::*;

    // Sequential single-byte inserts at the same point coalesce into one edit.
    #[test]
    fn coalesced_insert() {
        let mut doc = Document::from_str("t", "the quick brown fox");
        doc.set_point_start();
        doc.move_point(9);
        doc.insert(b" white");
        doc.insert(b" sly");
        assert_eq!(doc.to_bytes(), b"the quick white sly brown fox");
    }

    // Sequential single-byte deletes at the same point coalesce into one edit.
    #[test]
    fn coalesced_deletes() {
        let mut doc = Document::from_str("t", "the quick brown fox");
        doc.set_point_start();
        doc.move_point(9);
        doc.delete(-1);
        doc.delete(-1);
        assert_eq!(doc.to_bytes(), b"the qui brown fox");
    }

    // undo/redo walks the coalesced journal one entry at a time.
    #[test]
    fn undo_redo_sequence() {
        let mut doc = Document::from_str("t", "the quick brown fox");
        doc.set_point_start();
        doc.move_point(4);
        doc.insert(b"fastest ");
        doc.move_point(-4);
        doc.delete(9);
        doc.undo();
        assert_eq!(doc.to_bytes(), b"the fastest quick brown fox");
        assert_eq!(doc.to_bytes().len(), 27);
        doc.undo();
        assert_eq!(doc.to_bytes(), b"the quick brown fox");
        assert_eq!(doc.to_bytes().len(), 19);
        doc.redo();
        doc.redo();
        assert_eq!(doc.to_bytes(), b"the fast brown fox");
        assert_eq!(doc.to_bytes().len(), 18);
    }

    // undo();redo() leaves state/point byte-identical.
    #[test]
    fn undo_then_redo_is_identity() {
        let mut doc = Document::from_str("t", "abcdef");
        doc.set_point_start();
        doc.move_point(3);
        doc.insert(b"XYZ");
        let point_after = doc.point();
        let bytes_after = doc.to_bytes();
        doc.undo();
        doc.redo();
        assert_eq!(doc.to_bytes(), bytes_after);
        assert_eq!(doc.point(), point_after);
    }

    #[test]
    fn redo_then_undo_is_identity() {
        let mut doc = Document::from_str("t", "abcdef");
        doc.set_point_start();
        doc.move_point(3);
        doc.insert(b"XYZ");
        doc.undo();
        let point_before_redo = doc.point();
        let bytes_before_redo = doc.to_bytes();
        doc.redo();
        doc.undo();
        assert_eq!(doc.to_bytes(), bytes_before_redo);
        assert_eq!(doc.point(), point_before_redo);
    }

    // Random soak: coalescing keeps total edit count below the
    // number of mutations applied.
    #[test]
    fn soak_undo_restores_initial_content() {
        // Deterministic xorshift so the test needs no external RNG crate.
        struct Rng(u64);
        impl Rng {
            fn next(&mut self) -> u64 {
                self.0 ^= self.0 << 13;
                self.0 ^= self.0 >> 7;
                self.0 ^= self.0 << 17;
                self.0
            }
            fn range(&mut self, n: usize) -> usize {
                (self.next() % n as u64) as usize
            }
        }

        let initial: Vec<u8> = (0..1024).map(|i| b'a' + (i % 26) as u8).collect();
        let mut doc = Document::from_bytes("t", initial.clone());
        let mut rng = Rng(0x243F6A8885A308D3);
        let mut applied = 0usize;
        for _ in 0..8192 {
            let len = doc.to_bytes().len();
            // Bias the point to near the start or near the end, rather than
            // uniformly across the document, so the piece chain's head and
            // tail both take the brunt of the mutation.
            let window = 32.min(len + 1);
            let pos = if rng.range(2) == 0 {
                rng.range(window)
            } else {
                len - rng.range(window)
            };
            doc.set_point_start();
            doc.move_point(pos as isize);
            match rng.range(3) {
                0 => {
                    let n = rng.range(5) + 1;
                    let s: Vec<u8> = (0..n).map(|_| b'x').collect();
                    doc.insert(&s);
                }
                1 => {
                    let n = rng.range(5) as isize + 1;
                    doc.delete(n);
                }
                _ => {
                    let n = rng.range(4) + 1;
                    let s: Vec<u8> = (0..n).map(|_| b'y').collect();
                    doc.replace(&s);
                }
            }
            applied += 1;
        }
        let mut undone = 0;
        while doc.undo() {
            undone += 1;
        }
        assert_eq!(doc.to_bytes(), initial);
        assert!(undone < applied, "coalescing should have merged some edits");
    }

    #[test]
    fn get_data_whole_document_round_trips() {
        let doc = Document::from_str("t", "piece table");
        let bytes = doc.get_data(doc.doc_start(), doc.doc_end());
        assert_eq!(bytes, b"piece table");
    }

    #[test]
    fn line_start_walks_back_to_newline() {
        let doc = Document::from_str("t", "first\nsecond\nthird");
        let mid = doc.move_location(doc.doc_start(), 9); // inside "second"
        let start = doc.line_start(mid);
        assert_eq!(doc.position(start), 6);
        assert!(doc.is_line_start(start));
        assert!(!doc.is_line_start(mid));
    }
}
