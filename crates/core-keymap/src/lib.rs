//! The mode machine: "a vector of maps keyed by an
//! input code to a small instruction list (set mode, insert byte, call
//! action)". `Keymap` is exactly that: table-driven, no parsing, no
//! ambiguity resolution beyond a plain `HashMap` lookup.

use core_actions::ActionId;
use crossterm::event::KeyEvent;
use smallvec::SmallVec;
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Normal,
    Meta,
    Isearch,
}

pub const MODE_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    SetMode(Mode),
    InsertByte(u8),
    CallAction(ActionId),
}

/// `instructions[mode as usize]` is the table for that mode. A
/// `SmallVec<[Instruction; 2]>` per binding since most keys emit one
/// instruction ("call this action") and a few emit two ("leave ISEARCH,
/// then call this action").
pub struct Keymap {
    tables: [HashMap<KeyEvent, SmallVec<[Instruction; 2]>>; MODE_COUNT],
}

/// What happened when a key was fed to the keymap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The key mapped directly in the current mode's table.
    Mapped(SmallVec<[Instruction; 2]>),
    /// The key was unmapped in ISEARCH: exit search, then redispatch
    /// against NORMAL mode's table.
    IsearchFallback(SmallVec<[Instruction; 2]>),
    /// The key was unmapped and there is no fallback for this mode.
    Unmapped,
}

impl Keymap {
    pub fn new() -> Self {
        Self {
            tables: [HashMap::new(), HashMap::new(), HashMap::new()],
        }
    }

    pub fn bind(&mut self, mode: Mode, key: KeyEvent, instructions: SmallVec<[Instruction; 2]>) {
        self.tables[mode as usize].insert(key, instructions);
    }

    /// Looks `key` up in `mode`'s table. In ISEARCH, an unmapped key falls
    /// back to a re-lookup against NORMAL's table (the key that ended the
    /// search is also the key NORMAL would have acted on).
    pub fn dispatch(&self, mode: Mode, key: KeyEvent) -> Dispatch {
        if let Some(instrs) = self.tables[mode as usize].get(&key) {
            trace!(target: "core_keymap", ?mode, ?key, "mapped");
            return Dispatch::Mapped(instrs.clone());
        }
        if mode == Mode::Isearch {
            if let Some(instrs) = self.tables[Mode::Normal as usize].get(&key) {
                trace!(target: "core_keymap", ?key, "isearch_fallback");
                return Dispatch::IsearchFallback(instrs.clone());
            }
        }
        Dispatch::Unmapped
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}

/// A small, representative binding set: motions, insert, delete,
/// undo/redo, isearch, mark/yank/paste, save/quit. Not a full modal-editing
/// grammar, just representative coverage.
pub fn default_keymap() -> Keymap {
    use crossterm::event::{KeyCode, KeyModifiers};
    use Instruction::*;

    let mut km = Keymap::new();
    let plain = KeyModifiers::NONE;
    let key = |code| KeyEvent::new(code, plain);

    // -- NORMAL --------------------------------------------------------
    km.bind(
        Mode::Normal,
        key(KeyCode::Esc),
        SmallVec::from_slice(&[SetMode(Mode::Meta)]),
    );
    km.bind(
        Mode::Normal,
        key(KeyCode::Left),
        SmallVec::from_slice(&[CallAction(ActionId::MoveCharBackward)]),
    );
    km.bind(
        Mode::Normal,
        key(KeyCode::Right),
        SmallVec::from_slice(&[CallAction(ActionId::MoveCharForward)]),
    );
    km.bind(
        Mode::Normal,
        key(KeyCode::Up),
        SmallVec::from_slice(&[CallAction(ActionId::MoveLineUp)]),
    );
    km.bind(
        Mode::Normal,
        key(KeyCode::Down),
        SmallVec::from_slice(&[CallAction(ActionId::MoveLineDown)]),
    );
    km.bind(
        Mode::Normal,
        key(KeyCode::Home),
        SmallVec::from_slice(&[CallAction(ActionId::MoveLineStart)]),
    );
    km.bind(
        Mode::Normal,
        key(KeyCode::End),
        SmallVec::from_slice(&[CallAction(ActionId::MoveLineEnd)]),
    );
    km.bind(
        Mode::Normal,
        key(KeyCode::PageUp),
        SmallVec::from_slice(&[CallAction(ActionId::MovePageBackward)]),
    );
    km.bind(
        Mode::Normal,
        key(KeyCode::PageDown),
        SmallVec::from_slice(&[CallAction(ActionId::MovePageForward)]),
    );
    km.bind(
        Mode::Normal,
        key(KeyCode::Delete),
        SmallVec::from_slice(&[CallAction(ActionId::DeleteCharForward)]),
    );
    km.bind(
        Mode::Normal,
        key(KeyCode::Backspace),
        SmallVec::from_slice(&[CallAction(ActionId::DeleteCharBackward)]),
    );
    km.bind(
        Mode::Normal,
        key(KeyCode::Insert),
        SmallVec::from_slice(&[CallAction(ActionId::ToggleOverwrite)]),
    );
    km.bind(
        Mode::Normal,
        KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL),
        SmallVec::from_slice(&[CallAction(ActionId::Redo)]),
    );
    km.bind(
        Mode::Normal,
        KeyEvent::new(KeyCode::Char('_'), KeyModifiers::CONTROL),
        SmallVec::from_slice(&[CallAction(ActionId::Undo)]),
    );
    km.bind(
        Mode::Normal,
        KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL),
        SmallVec::from_slice(&[CallAction(ActionId::Save)]),
    );
    km.bind(
        Mode::Normal,
        KeyEvent::new(KeyCode::Char('w'), KeyModifiers::CONTROL),
        SmallVec::from_slice(&[CallAction(ActionId::Cut)]),
    );
    km.bind(
        Mode::Normal,
        KeyEvent::new(KeyCode::Char('y'), KeyModifiers::CONTROL),
        SmallVec::from_slice(&[CallAction(ActionId::Paste)]),
    );
    km.bind(
        Mode::Normal,
        KeyEvent::new(KeyCode::Char(' '), KeyModifiers::CONTROL),
        SmallVec::from_slice(&[CallAction(ActionId::SetMark)]),
    );
    km.bind(
        Mode::Normal,
        KeyEvent::new(KeyCode::Char('s'), plain),
        SmallVec::from_slice(&[CallAction(ActionId::IsearchForward), SetMode(Mode::Isearch)]),
    );
    km.bind(
        Mode::Normal,
        KeyEvent::new(KeyCode::Char('r'), plain),
        SmallVec::from_slice(&[CallAction(ActionId::IsearchBackward), SetMode(Mode::Isearch)]),
    );
    km.bind(
        Mode::Normal,
        KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL),
        SmallVec::from_slice(&[CallAction(ActionId::Recenter)]),
    );

    // -- META (entered by Esc) ------------------------------------------
    km.bind(
        Mode::Meta,
        key(KeyCode::Esc),
        SmallVec::from_slice(&[SetMode(Mode::Normal)]),
    );
    km.bind(
        Mode::Meta,
        key(KeyCode::Char('f')),
        SmallVec::from_slice(&[CallAction(ActionId::MoveWordForward), SetMode(Mode::Normal)]),
    );
    km.bind(
        Mode::Meta,
        key(KeyCode::Char('b')),
        SmallVec::from_slice(&[
            CallAction(ActionId::MoveWordBackward),
            SetMode(Mode::Normal),
        ]),
    );
    km.bind(
        Mode::Meta,
        key(KeyCode::Char('>')),
        SmallVec::from_slice(&[CallAction(ActionId::MoveDocEnd), SetMode(Mode::Normal)]),
    );
    km.bind(
        Mode::Meta,
        key(KeyCode::Char('<')),
        SmallVec::from_slice(&[CallAction(ActionId::MoveDocStart), SetMode(Mode::Normal)]),
    );
    km.bind(
        Mode::Meta,
        key(KeyCode::Char('w')),
        SmallVec::from_slice(&[CallAction(ActionId::Copy), SetMode(Mode::Normal)]),
    );
    km.bind(
        Mode::Meta,
        key(KeyCode::Char('}')),
        SmallVec::from_slice(&[
            CallAction(ActionId::MoveParagraphForward),
            SetMode(Mode::Normal),
        ]),
    );
    km.bind(
        Mode::Meta,
        key(KeyCode::Char('{')),
        SmallVec::from_slice(&[
            CallAction(ActionId::MoveParagraphBackward),
            SetMode(Mode::Normal),
        ]),
    );
    km.bind(
        Mode::Meta,
        key(KeyCode::Char('q')),
        SmallVec::from_slice(&[CallAction(ActionId::Quit), SetMode(Mode::Normal)]),
    );

    // -- ISEARCH ---------------------------------------------------------
    km.bind(
        Mode::Isearch,
        key(KeyCode::Esc),
        SmallVec::from_slice(&[CallAction(ActionId::IsearchExit), SetMode(Mode::Normal)]),
    );
    km.bind(
        Mode::Isearch,
        key(KeyCode::Enter),
        SmallVec::from_slice(&[CallAction(ActionId::IsearchExit), SetMode(Mode::Normal)]),
    );
    km.bind(
        Mode::Isearch,
        key(KeyCode::Backspace),
        SmallVec::from_slice(&[CallAction(ActionId::IsearchDelete)]),
    );

    km
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    #[test]
    fn normal_mode_char_falls_through_as_unmapped_for_insert_byte() {
        let km = default_keymap();
        let key = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
        assert_eq!(km.dispatch(Mode::Normal, key), Dispatch::Unmapped);
    }

    #[test]
    fn esc_enters_meta_mode() {
        let km = default_keymap();
        let key = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(
            km.dispatch(Mode::Normal, key),
            Dispatch::Mapped(SmallVec::from_slice(&[Instruction::SetMode(Mode::Meta)]))
        );
    }

    #[test]
    fn isearch_unmapped_key_falls_back_to_normal_table() {
        let km = default_keymap();
        let left = KeyEvent::new(KeyCode::Left, KeyModifiers::NONE);
        match km.dispatch(Mode::Isearch, left) {
            Dispatch::IsearchFallback(instrs) => {
                assert_eq!(
                    instrs,
                    SmallVec::from_slice(&[Instruction::CallAction(ActionId::MoveCharBackward)])
                );
            }
            other => panic!("expected IsearchFallback, got {other:?}"),
        }
    }

    #[test]
    fn isearch_enter_exits_without_fallback() {
        let km = default_keymap();
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(
            km.dispatch(Mode::Isearch, enter),
            Dispatch::Mapped(SmallVec::from_slice(&[
                Instruction::CallAction(ActionId::IsearchExit),
                Instruction::SetMode(Mode::Normal)
            ]))
        );
    }

    #[test]
    fn completely_unmapped_key_in_normal_mode_is_unmapped() {
        let km = default_keymap();
        let f12 = KeyEvent::new(KeyCode::F(12), KeyModifiers::NONE);
        assert_eq!(km.dispatch(Mode::Normal, f12), Dispatch::Unmapped);
    }
}
