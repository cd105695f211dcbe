//! Piece primitives and the arena that owns them.
//!
//! A piece is a contiguous span of bytes. A *primary* piece owns its bytes
//! directly; a *secondary* piece is a window `[start, start+length)` into
//! some primary. Pieces never move once allocated: `Document` keeps them in
//! an append-only arena addressed by `PieceId`, so a `Location` can hold a
//! `PieceId` across any number of edits without needing `Rc`/`RefCell` or
//! invalidation bookkeeping. The arena only shrinks on `squash`.

use crate::Document;

/// Index into `Document`'s piece arena. Never reused within a session:
/// arena slots are append-only, so a `PieceId` doubles as a stable identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceId(pub(crate) u32);

#[derive(Debug, Clone)]
pub(crate) enum PieceKind {
    /// Owns its bytes. Only the two chain sentinels may be empty.
    Primary(Vec<u8>),
    /// A window into a primary piece's bytes. `length` is always > 0.
    Secondary {
        primary: PieceId,
        start: usize,
        length: usize,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct Piece {
    pub(crate) kind: PieceKind,
    pub(crate) prev: Option<PieceId>,
    pub(crate) next: Option<PieceId>,
}

impl Piece {
    fn len(&self) -> usize {
        match &self.kind {
            PieceKind::Primary(data) => data.len(),
            PieceKind::Secondary { length, .. } => *length,
        }
    }
}

impl Document {
    pub(crate) fn piece_len(&self, id: PieceId) -> usize {
        self.pieces[id.0 as usize].len()
    }

    pub(crate) fn prev_of(&self, id: PieceId) -> Option<PieceId> {
        self.pieces[id.0 as usize].prev
    }

    pub(crate) fn next_of(&self, id: PieceId) -> Option<PieceId> {
        self.pieces[id.0 as usize].next
    }

    /// Sets `a.next = Some(b)` and `b.prev = Some(a)`. Either side may be
    /// `None` to leave that half-link alone (used when linking a piece to
    /// the chain's outer edge, where the sentinel's outward link stays
    /// `None`).
    pub(crate) fn link(&mut self, a: Option<PieceId>, b: Option<PieceId>) {
        if let Some(a) = a {
            self.pieces[a.0 as usize].next = b;
        }
        if let Some(b) = b {
            self.pieces[b.0 as usize].prev = a;
        }
    }

    fn push_piece(&mut self, kind: PieceKind) -> PieceId {
        let id = PieceId(self.pieces.len() as u32);
        self.pieces.push(Piece {
            kind,
            prev: None,
            next: None,
        });
        id
    }

    pub(crate) fn new_primary(&mut self, data: Vec<u8>) -> PieceId {
        self.push_piece(PieceKind::Primary(data))
    }

    /// Resolves `id`'s underlying primary and absolute `[start, start+len)`
    /// window, whether `id` is itself a primary (window `0..len`) or a
    /// secondary.
    fn underlying(&self, id: PieceId) -> (PieceId, usize, usize) {
        match &self.pieces[id.0 as usize].kind {
            PieceKind::Primary(data) => (id, 0, data.len()),
            PieceKind::Secondary {
                primary,
                start,
                length,
            } => (*primary, *start, *length),
        }
    }

    /// Left remainder `[0, k)` of `id`'s window, as a new unlinked secondary.
    /// `0 < k < len(id)`. Callers must avoid splitting at the boundary.
    pub(crate) fn lsplit(&mut self, id: PieceId, k: usize) -> PieceId {
        let (primary, start, len) = self.underlying(id);
        debug_assert!(k > 0 && k < len, "lsplit at a piece boundary");
        self.push_piece(PieceKind::Secondary {
            primary,
            start,
            length: k,
        })
    }

    /// Right remainder `[k, len)` of `id`'s window, as a new unlinked secondary.
    pub(crate) fn rsplit(&mut self, id: PieceId, k: usize) -> PieceId {
        let (primary, start, len) = self.underlying(id);
        debug_assert!(k > 0 && k < len, "rsplit at a piece boundary");
        self.push_piece(PieceKind::Secondary {
            primary,
            start: start + k,
            length: len - k,
        })
    }

    /// Appends bytes to a primary piece in place. Legal only on a primary
    /// that is the `ins` of the journal tip, enforced by the caller
    /// (`apply_change`'s coalescing path), not by the type system.
    pub(crate) fn extend_primary(&mut self, id: PieceId, bytes: &[u8]) {
        match &mut self.pieces[id.0 as usize].kind {
            PieceKind::Primary(data) => data.extend_from_slice(bytes),
            PieceKind::Secondary { .. } => {
                panic!("extend_primary called on a secondary piece")
            }
        }
    }

    /// Shrinks a primary piece in place. Positive `n` trims from the left,
    /// negative trims from the right. Only the edit that owns the piece may
    /// call this.
    pub(crate) fn trim_primary(&mut self, id: PieceId, n: isize) {
        match &mut self.pieces[id.0 as usize].kind {
            PieceKind::Primary(data) => {
                if n >= 0 {
                    data.drain(0..n as usize);
                } else {
                    let new_len = data.len() - (-n) as usize;
                    data.truncate(new_len);
                }
            }
            PieceKind::Secondary { .. } => panic!("trim_primary called on a secondary piece"),
        }
    }

    /// Shrinks a secondary piece's window in place from both sides.
    pub(crate) fn trim_secondary(&mut self, id: PieceId, left: usize, right: usize) {
        match &mut self.pieces[id.0 as usize].kind {
            PieceKind::Secondary { start, length, .. } => {
                *start += left;
                *length -= left + right;
                debug_assert!(*length > 0, "secondary piece trimmed to empty");
            }
            PieceKind::Primary(_) => panic!("trim_secondary called on a primary piece"),
        }
    }

    /// Byte at `offset` within piece `id`.
    pub(crate) fn byte_in_piece(&self, id: PieceId, offset: usize) -> u8 {
        match &self.pieces[id.0 as usize].kind {
            PieceKind::Primary(data) => data[offset],
            PieceKind::Secondary {
                primary,
                start,
                length,
            } => {
                debug_assert!(offset < *length);
                match &self.pieces[primary.0 as usize].kind {
                    PieceKind::Primary(data) => data[start + offset],
                    PieceKind::Secondary { .. } => {
                        panic!("secondary piece referencing a secondary primary")
                    }
                }
            }
        }
    }
}
