//! Crate-boundary integration tests for the invariants and round-trip laws
//! exercised only through `core_text`'s public API (unlike the
//! in-module unit tests, which can reach `pub(crate)` internals).

use core_text::{Document, MatchMode};

/// Invariant 3: `end_sentinel.position()` equals the sum of all live piece
/// lengths, which is just `to_bytes().len()` from outside the crate.
#[test]
fn end_position_matches_total_length_across_edits() {
    let mut doc = Document::from_str("t", "abcdefgh");
    doc.set_point_start();
    doc.move_point(3);
    doc.insert(b"123");
    doc.move_point(2);
    doc.delete(-2);
    doc.replace(b"XY");
    assert_eq!(doc.position(doc.doc_end()), doc.to_bytes().len());
}

/// Round-trip law: undoing an arbitrary sequence of edits restores the
/// original content and point exactly.
#[test]
fn undoing_a_mixed_edit_sequence_restores_initial_state() {
    let initial = "the quick brown fox jumps over the lazy dog";
    let mut doc = Document::from_str("t", initial);
    let start_point = doc.point();

    doc.set_point_start();
    doc.move_point(4);
    doc.insert(b"very ");
    doc.move_point(10);
    doc.delete(5);
    doc.move_point(-3);
    doc.replace(b"QQQ");

    assert_ne!(doc.to_bytes(), initial.as_bytes());

    while doc.undo() {}

    assert_eq!(doc.to_bytes(), initial.as_bytes());
    assert_eq!(doc.point(), start_point);
}

/// Boundary: `find_backward` with a pattern at least as long as the
/// position leaves point at start and reports no match.
#[test]
fn find_backward_with_pattern_longer_than_position_lands_at_start() {
    let mut doc = Document::from_str("t", "hello world");
    doc.set_point_start();
    doc.move_point(3);
    assert!(!doc.find_backward(b"hello world and then some", MatchMode::Exact));
    assert!(doc.at_start());
}

/// Repeated forward search finds every
/// occurrence in order and reports failure (point at end) once exhausted.
#[test]
fn repeated_find_forward_visits_every_occurrence_then_fails() {
    let mut doc = Document::from_str("t", "ababab");
    doc.set_point_start();
    let mut hits = Vec::new();
    while doc.find_forward(b"ab", MatchMode::Exact) {
        hits.push(doc.position(doc.point()));
    }
    assert_eq!(hits, vec![2, 4, 6]);
    assert!(doc.at_end());
}

/// Coalescing must actually reduce the number of journal entries relative
/// to the number of mutations applied (otherwise undo would take as many
/// steps as edits, defeating the point of the journal).
#[test]
fn interleaved_inserts_at_a_fixed_point_coalesce_into_one_undo_step() {
    let mut doc = Document::from_str("t", "0123456789");
    doc.set_point_start();
    doc.move_point(5);
    for _ in 0..20 {
        doc.insert(b"x");
    }
    assert_eq!(doc.to_bytes().len(), 30);
    assert!(doc.undo());
    assert_eq!(doc.to_bytes(), b"0123456789");
    assert!(!doc.undo(), "the whole run of inserts should be a single journal step");
}

/// `squash()` collapses the journal but keeps the document content and
/// point position (by absolute byte offset) intact.
#[test]
fn squash_preserves_content_and_point_but_clears_undo_history() {
    let mut doc = Document::from_str("t", "hello world");
    doc.set_point_start();
    doc.move_point(6);
    doc.insert(b"wonderful ");
    let point_pos = doc.position(doc.point());
    let bytes_before = doc.to_bytes();

    doc.squash();

    assert_eq!(doc.to_bytes(), bytes_before);
    assert_eq!(doc.position(doc.point()), point_pos);
    assert!(!doc.undo(), "squash replaces the journal with just its root edit");
}
