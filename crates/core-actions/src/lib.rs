//! The commands surface: one named entry point per editing
//! command the keymap dispatches by `ActionId`. Each function is a thin
//! composition over `core_text::Document`, `core_render::Formatter`, and
//! `core_state::Editor`. The three own all the policy; nothing here
//! duplicates engine behavior.

use core_render::Formatter;
use core_state::Editor;
use core_text::{Document, MatchMode};
use tracing::debug;

/// Bytes `move_word_*` treats as separating one word from the next.
const WORD_BREAK: &[u8] = b" \t\n";

/// Identifies one command entry point. The keymap's `Instruction::CallAction`
/// carries one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionId {
    MoveCharForward,
    MoveCharBackward,
    MoveWordForward,
    MoveWordBackward,
    MoveLineUp,
    MoveLineDown,
    MoveLineStart,
    MoveLineEnd,
    MoveParagraphForward,
    MoveParagraphBackward,
    MovePageForward,
    MovePageBackward,
    MoveDocStart,
    MoveDocEnd,
    DeleteCharForward,
    DeleteCharBackward,
    ToggleOverwrite,
    Undo,
    Redo,
    IsearchForward,
    IsearchBackward,
    IsearchDelete,
    IsearchExit,
    SetMark,
    ClearMark,
    Copy,
    Cut,
    Paste,
    CutLine,
    CopyLine,
    Save,
    Quit,
    Squash,
    Recenter,
}

/// What the display loop should do after a dispatched action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
}

/// Everything an action needs to do its work, bundled so `dispatch`'s
/// signature doesn't grow a parameter per new command.
pub struct Context<'a> {
    pub editor: &'a mut Editor,
    pub doc: &'a mut Document,
    pub fmt: &'a mut Formatter,
}

/// Invokes the entry point named by `action`. Returns `Outcome::Quit` only
/// for `ActionId::Quit`; everything else continues the loop.
pub fn dispatch(action: ActionId, ctx: &mut Context) -> Outcome {
    match action {
        ActionId::MoveCharForward => move_char_forward(ctx.doc),
        ActionId::MoveCharBackward => move_char_backward(ctx.doc),
        ActionId::MoveWordForward => move_word_forward(ctx.doc),
        ActionId::MoveWordBackward => move_word_backward(ctx.doc),
        ActionId::MoveLineUp => move_line_vertical(ctx.editor, ctx.doc, ctx.fmt, -1),
        ActionId::MoveLineDown => move_line_vertical(ctx.editor, ctx.doc, ctx.fmt, 1),
        ActionId::MoveLineStart => move_line_start(ctx.doc, ctx.fmt),
        ActionId::MoveLineEnd => move_line_end(ctx.doc, ctx.fmt),
        ActionId::MoveParagraphForward => move_paragraph_forward(ctx.doc),
        ActionId::MoveParagraphBackward => move_paragraph_backward(ctx.doc),
        ActionId::MovePageForward => move_page(ctx.doc, ctx.fmt, 1),
        ActionId::MovePageBackward => move_page(ctx.doc, ctx.fmt, -1),
        ActionId::MoveDocStart => ctx.doc.set_point_start(),
        ActionId::MoveDocEnd => ctx.doc.set_point_end(),
        ActionId::DeleteCharForward => delete_char_forward(ctx.editor, ctx.doc),
        ActionId::DeleteCharBackward => delete_char_backward(ctx.editor, ctx.doc),
        ActionId::ToggleOverwrite => ctx.editor.overwrite = !ctx.editor.overwrite,
        ActionId::Undo => {
            ctx.doc.undo();
        }
        ActionId::Redo => {
            ctx.doc.redo();
        }
        ActionId::IsearchForward => isearch_start(ctx.editor, ctx.doc, true),
        ActionId::IsearchBackward => isearch_start(ctx.editor, ctx.doc, false),
        ActionId::IsearchDelete => isearch_delete(ctx.editor, ctx.doc),
        ActionId::IsearchExit => isearch_exit(ctx.editor, ctx.doc, false),
        ActionId::SetMark => ctx.editor.set_mark(ctx.doc.point()),
        ActionId::ClearMark => ctx.editor.clear_mark(),
        ActionId::Copy => copy(ctx.editor, ctx.doc),
        ActionId::Cut => cut(ctx.editor, ctx.doc),
        ActionId::Paste => paste(ctx.editor, ctx.doc),
        ActionId::CutLine => cut_line(ctx.editor, ctx.doc),
        ActionId::CopyLine => copy_line(ctx.editor, ctx.doc),
        ActionId::Save => return Outcome::Continue,
        ActionId::Quit => return Outcome::Quit,
        ActionId::Squash => ctx.doc.squash(),
        ActionId::Recenter => recenter(ctx.editor),
    }
    Outcome::Continue
}

// -- Cursor motions --------------------------------------------------------

pub fn move_char_forward(doc: &mut Document) {
    if !doc.at_end() {
        doc.move_point(1);
    }
}

pub fn move_char_backward(doc: &mut Document) {
    if !doc.at_start() {
        doc.move_point(-1);
    }
}

pub fn move_word_forward(doc: &mut Document) {
    doc.find_char_forward(WORD_BREAK);
    if doc.find_not_char_forward(WORD_BREAK) {
        doc.move_point(-1);
    }
}

pub fn move_word_backward(doc: &mut Document) {
    doc.find_not_char_backward(WORD_BREAK);
    if doc.find_char_backward(WORD_BREAK) {
        doc.move_point(1);
    }
}

pub fn move_line_start(doc: &mut Document, fmt: &mut Formatter) {
    fmt.clamp_to_bol(doc);
}

pub fn move_line_end(doc: &mut Document, fmt: &mut Formatter) {
    fmt.clamp_to_bol(doc);
    let bol = doc.point();
    let (_line, col_map) = fmt.format_line(doc);
    let last = col_map.len().saturating_sub(1) as isize;
    doc.set_point(bol);
    doc.move_point(last);
}

/// Moves point up (`rows == -1`) or down (`rows == 1`) one display row,
/// landing at the byte nearest `editor.preferred_col` (sticky column)
/// rather than re-deriving a column from the old position each time.
fn move_line_vertical(editor: &mut Editor, doc: &mut Document, fmt: &mut Formatter, rows: isize) {
    let point = doc.point();
    fmt.clamp_to_bol(doc);
    let current_bol = doc.point();
    let col = if editor.sticky_column {
        editor.preferred_col
    } else {
        let target_pos = doc.position(point);
        let bol_pos = doc.position(current_bol);
        target_pos.saturating_sub(bol_pos)
    };

    let new_bol = if rows < 0 {
        fmt.bol_to_prev_bol(doc)
    } else {
        fmt.bol_to_next_bol(doc)
    };

    doc.set_point(new_bol);
    let (_line, col_map) = fmt.format_line(doc);
    let offset = Formatter::offset_for_column(col, &col_map);
    doc.set_point(doc.move_location(new_bol, offset as isize));

    editor.preferred_col = col;
    editor.sticky_column = true;
}

pub fn move_paragraph_forward(doc: &mut Document) {
    loop {
        if !doc.find_char_forward(b"\n") {
            return;
        }
        if doc.at_end() || doc.get_char() == b'\n' {
            return;
        }
    }
}

pub fn move_paragraph_backward(doc: &mut Document) {
    loop {
        if !doc.find_char_backward(b"\n") {
            return;
        }
        if doc.at_start() {
            return;
        }
        doc.prev_char();
        let blank = doc.get_char() == b'\n';
        doc.next_char();
        if blank {
            return;
        }
    }
}

/// Moves one page (`fmt.rungs` rows) forward or backward.
fn move_page(doc: &mut Document, fmt: &mut Formatter, direction: isize) {
    for _ in 0..fmt.rungs {
        if direction < 0 {
            if doc.at_start() {
                break;
            }
            fmt.bol_to_prev_bol(doc);
        } else {
            if doc.at_end() {
                break;
            }
            fmt.bol_to_next_bol(doc);
        }
    }
}

// -- Editing ---------------------------------------------------------------

pub fn delete_char_forward(editor: &mut Editor, doc: &mut Document) {
    doc.delete(1);
    editor.clear_mark();
}

pub fn delete_char_backward(editor: &mut Editor, doc: &mut Document) {
    doc.delete(-1);
    editor.clear_mark();
}

/// Handles `Instruction::InsertByte`: in overwrite mode, replaces the byte
/// under point (unless point sits at a newline or end-of-document, where
/// overwrite degrades to insert so it never eats the line break). Any insert
/// drops an in-progress selection, same as every other mutation below.
pub fn insert_byte(editor: &mut Editor, doc: &mut Document, byte: u8) {
    if editor.overwrite && !doc.at_end() && doc.get_char() != b'\n' {
        doc.replace(&[byte]);
    } else {
        doc.insert(&[byte]);
    }
    editor.clear_mark();
}

// -- Search ------------------------------------------------------------

fn isearch_start(editor: &mut Editor, doc: &Document, forward: bool) {
    editor.isearch.active = true;
    editor.isearch.forward = forward;
    editor.isearch.pattern.clear();
    editor.isearch.origin = doc.point();
}

/// Appends `byte` to the in-progress search pattern and re-runs the search
/// from `origin`.
pub fn isearch_feed(editor: &mut Editor, doc: &mut Document, byte: u8) {
    editor.isearch.pattern.push(byte as char);
    doc.set_point(editor.isearch.origin);
    let pattern = editor.isearch.pattern.clone().into_bytes();
    let found = if editor.isearch.forward {
        doc.find_forward(&pattern, MatchMode::SmartCase)
    } else {
        doc.find_backward(&pattern, MatchMode::SmartCase)
    };
    if !found {
        doc.set_point(editor.isearch.origin);
    }
}

/// Shrinks the in-progress search pattern by one byte and re-runs it from
/// `origin`, so backspace during an incremental search un-narrows the match
/// instead of falling through to plain cursor motion. A no-op on an already
/// empty pattern.
pub fn isearch_delete(editor: &mut Editor, doc: &mut Document) {
    if editor.isearch.pattern.pop().is_none() {
        return;
    }
    doc.set_point(editor.isearch.origin);
    if editor.isearch.pattern.is_empty() {
        return;
    }
    let pattern = editor.isearch.pattern.clone().into_bytes();
    let found = if editor.isearch.forward {
        doc.find_forward(&pattern, MatchMode::SmartCase)
    } else {
        doc.find_backward(&pattern, MatchMode::SmartCase)
    };
    if !found {
        doc.set_point(editor.isearch.origin);
    }
}

/// Ends the search. `cancel == true` restores point to the search's origin;
/// `cancel == false` keeps point at the last match.
pub fn isearch_exit(editor: &mut Editor, doc: &mut Document, cancel: bool) {
    if cancel {
        doc.set_point(editor.isearch.origin);
    }
    editor.isearch.active = false;
    editor.isearch.pattern.clear();
}

// -- Mark / clipboard -------------------------------------------------------

fn copy(editor: &mut Editor, doc: &Document) {
    if let Some((start, end)) = editor.selection(doc) {
        editor.clipboard = doc.get_data(start, end);
    }
}

fn cut(editor: &mut Editor, doc: &mut Document) {
    if let Some((start, end)) = editor.selection(doc) {
        editor.clipboard = doc.get_data(start, end);
        let n = doc.distance_before(start, end).unwrap_or(0) as isize;
        doc.set_point(start);
        doc.delete(n);
        editor.clear_mark();
    }
}

/// Pasting over an active selection replaces it: the selection is cut first
/// (which also sets the clipboard to the very thing we're about to discard,
/// so the cut's clipboard write is immediately overwritten), then the
/// clipboard content prior to that cut is inserted at point.
fn paste(editor: &mut Editor, doc: &mut Document) {
    let content = editor.clipboard.clone();
    if editor.mark.is_some() {
        cut(editor, doc);
    }
    if !content.is_empty() {
        doc.insert(&content);
    }
    editor.clear_mark();
}

fn cut_line(editor: &mut Editor, doc: &mut Document) {
    let start = doc.line_start(doc.point());
    doc.set_point(start);
    let found = doc.find_char_forward(b"\n");
    let end = doc.point();
    doc.set_point(start);
    let n = doc.distance_before(start, end).unwrap_or(0) as isize;
    editor.clipboard = doc.get_data(start, end);
    doc.delete(n);
    let _ = found;
}

fn copy_line(editor: &mut Editor, doc: &Document) {
    let start = doc.line_start(doc.point());
    let mut end = start;
    while end != doc.doc_end() && doc.byte_at(end) != b'\n' {
        end = doc.advance(end);
    }
    if end != doc.doc_end() {
        end = doc.advance(end);
    }
    editor.clipboard = doc.get_data(start, end);
}

fn recenter(editor: &mut Editor) {
    editor.preferred_top = None;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(text: &str) -> (Document, Editor, Formatter) {
        let doc = Document::from_str("t", text);
        let editor = Editor::new(&doc);
        let fmt = Formatter::new(80, 8, 20);
        (doc, editor, fmt)
    }

    #[test]
    fn move_word_forward_lands_on_next_word() {
        let (mut doc, _e, _f) = fixture("one two three");
        doc.set_point_start();
        move_word_forward(&mut doc);
        assert_eq!(doc.position(doc.point()), 4);
        move_word_forward(&mut doc);
        assert_eq!(doc.position(doc.point()), 8);
    }

    #[test]
    fn move_word_backward_lands_on_word_start() {
        let (mut doc, _e, _f) = fixture("one two three");
        doc.set_point_end();
        move_word_backward(&mut doc);
        assert_eq!(doc.position(doc.point()), 8);
        move_word_backward(&mut doc);
        assert_eq!(doc.position(doc.point()), 4);
    }

    #[test]
    fn delete_char_forward_removes_one_byte() {
        let (mut doc, mut editor, _f) = fixture("abc");
        doc.set_point_start();
        delete_char_forward(&mut editor, &mut doc);
        assert_eq!(doc.to_bytes(), b"bc");
    }

    #[test]
    fn insert_byte_overwrite_replaces_under_point() {
        let (mut doc, mut editor, _f) = fixture("abc");
        editor.overwrite = true;
        doc.set_point_start();
        insert_byte(&mut editor, &mut doc, b'X');
        assert_eq!(doc.to_bytes(), b"Xbc");
    }

    #[test]
    fn insert_byte_normal_mode_inserts() {
        let (mut doc, mut editor, _f) = fixture("abc");
        doc.set_point_start();
        insert_byte(&mut editor, &mut doc, b'X');
        assert_eq!(doc.to_bytes(), b"Xabc");
    }

    #[test]
    fn insert_byte_clears_an_active_mark() {
        let (mut doc, mut editor, _f) = fixture("abc");
        doc.set_point_start();
        editor.set_mark(doc.point());
        insert_byte(&mut editor, &mut doc, b'X');
        assert!(editor.mark.is_none());
    }

    #[test]
    fn cut_then_paste_round_trips() {
        let (mut doc, mut editor, _f) = fixture("hello world");
        doc.set_point_start();
        editor.set_mark(doc.point());
        doc.move_point(5);
        cut(&mut editor, &mut doc);
        assert_eq!(doc.to_bytes(), b" world");
        paste(&mut editor, &mut doc);
        assert_eq!(doc.to_bytes(), b"hello world");
    }

    #[test]
    fn paste_over_an_active_mark_replaces_the_selection() {
        let (mut doc, mut editor, _f) = fixture("hello world");
        editor.clipboard = b"XYZ".to_vec();
        doc.set_point_start();
        editor.set_mark(doc.point());
        doc.move_point(5);
        paste(&mut editor, &mut doc);
        assert_eq!(doc.to_bytes(), b"XYZ world");
        assert!(editor.mark.is_none());
    }

    #[test]
    fn cut_line_removes_through_newline() {
        let (mut doc, mut editor, _f) = fixture("first\nsecond\n");
        doc.set_point_start();
        cut_line(&mut editor, &mut doc);
        assert_eq!(doc.to_bytes(), b"second\n");
        assert_eq!(editor.clipboard, b"first\n");
    }

    #[test]
    fn isearch_feed_finds_pattern_forward() {
        let (mut doc, mut editor, _f) = fixture("find the needle here");
        doc.set_point_start();
        isearch_start(&mut editor, &doc, true);
        for b in b"needle" {
            isearch_feed(&mut editor, &mut doc, *b);
        }
        assert_eq!(doc.position(doc.point()), 15);
    }

    #[test]
    fn isearch_delete_shrinks_pattern_and_widens_match() {
        let (mut doc, mut editor, _f) = fixture("find the needle here");
        doc.set_point_start();
        isearch_start(&mut editor, &doc, true);
        for b in b"needlx" {
            isearch_feed(&mut editor, &mut doc, *b);
        }
        // "needlx" doesn't match anything; point falls back to origin.
        assert_eq!(doc.position(doc.point()), 0);
        isearch_delete(&mut editor, &mut doc);
        assert_eq!(editor.isearch.pattern, "needl");
        assert_eq!(doc.position(doc.point()), 14);
    }

    #[test]
    fn isearch_delete_on_empty_pattern_is_a_no_op() {
        let (mut doc, mut editor, _f) = fixture("find the needle here");
        doc.set_point_start();
        isearch_start(&mut editor, &doc, true);
        isearch_delete(&mut editor, &mut doc);
        assert_eq!(editor.isearch.pattern, "");
        assert_eq!(doc.position(doc.point()), 0);
    }

    #[test]
    fn isearch_exit_cancel_restores_origin() {
        let (mut doc, mut editor, _f) = fixture("find the needle here");
        doc.set_point_start();
        doc.move_point(3);
        isearch_start(&mut editor, &doc, true);
        isearch_feed(&mut editor, &mut doc, b'n');
        isearch_exit(&mut editor, &mut doc, true);
        assert_eq!(doc.position(doc.point()), 3);
    }

    #[test]
    fn dispatch_quit_returns_quit_outcome() {
        let (mut doc, mut editor, mut fmt) = fixture("x");
        let mut ctx = Context {
            editor: &mut editor,
            doc: &mut doc,
            fmt: &mut fmt,
        };
        assert_eq!(dispatch(ActionId::Quit, &mut ctx), Outcome::Quit);
    }

    #[test]
    fn dispatch_move_char_forward_advances_point() {
        let (mut doc, mut editor, mut fmt) = fixture("abc");
        doc.set_point_start();
        let mut ctx = Context {
            editor: &mut editor,
            doc: &mut doc,
            fmt: &mut fmt,
        };
        dispatch(ActionId::MoveCharForward, &mut ctx);
        assert_eq!(ctx.doc.position(ctx.doc.point()), 1);
    }
}
