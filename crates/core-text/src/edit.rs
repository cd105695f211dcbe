//! Edit: one atomic change, and the doubly linked undo/redo journal.
//!
//! Applying or reverting an edit is exactly two pointer writes: `before.next`
//! and `after.prev` swap between pointing at the edit's new pieces and
//! pointing at the old excluded run. Nothing else about the chain moves,
//! which is what lets the journal and the live chain share piece neighbours
//! as a DAG instead of needing to clone or relink the whole tail of the
//! document on every undo.

use crate::location::Location;
use crate::piece::PieceId;
use crate::Document;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EditId(pub(crate) u32);

#[derive(Debug, Clone)]
pub(crate) struct Edit {
    /// Left remainder of the leftmost excluded piece, if its split offset
    /// was non-zero.
    pub(crate) pre: Option<PieceId>,
    /// Newly typed text, if any.
    pub(crate) ins: Option<PieceId>,
    /// Right remainder of the rightmost excluded piece, if its split offset
    /// was non-zero.
    pub(crate) post: Option<PieceId>,
    /// First and last piece of the old run this edit excluded. When the
    /// edit is a pure insertion at an existing piece boundary, `first ==
    /// after` and `last == before`: the "excluded run" is empty and these
    /// fields alias the live neighbours instead of denoting real exclusion.
    pub(crate) first: PieceId,
    pub(crate) last: PieceId,
    /// Live-chain neighbours outside the excluded run.
    pub(crate) before: PieceId,
    pub(crate) after: PieceId,
    pub(crate) applied: bool,
    pub(crate) prev: Option<EditId>,
    pub(crate) next: Option<EditId>,
}

impl Edit {
    /// The new pieces this edit spliced in, in chain order, omitting
    /// whichever of pre/ins/post are absent.
    fn new_chain(&self) -> [Option<PieceId>; 3] {
        [self.pre, self.ins, self.post]
    }

    fn new_first(&self) -> Option<PieceId> {
        self.new_chain().into_iter().flatten().next()
    }

    fn new_last(&self) -> Option<PieceId> {
        self.new_chain().into_iter().flatten().next_back()
    }
}

impl Document {
    pub(crate) fn edit(&self, id: EditId) -> &Edit {
        &self.edits[id.0 as usize]
    }

    fn edit_mut(&mut self, id: EditId) -> &mut Edit {
        &mut self.edits[id.0 as usize]
    }

    fn push_edit(&mut self, edit: Edit) -> EditId {
        let id = EditId(self.edits.len() as u32);
        self.edits.push(edit);
        id
    }

    /// Resolves the `(left, right)` span endpoints for a change of `delta`
    /// bytes at `point` (positive deletes rightward, negative deletes
    /// leftward, zero is a pure insertion point). Both endpoints are
    /// clamped to document bounds by `move_location`.
    fn resolve_span(&self, point: Location, delta: isize) -> (Location, Location) {
        if delta >= 0 {
            (point, self.move_location(point, delta))
        } else {
            (self.move_location(point, delta), point)
        }
    }

    /// The location where the point should land after this edit applies.
    pub(crate) fn end_of_change(&self, id: EditId) -> Location {
        let edit = self.edit(id);
        match edit.post {
            Some(post) => Location {
                piece: post,
                offset: 0,
            },
            None => Location {
                piece: edit.after,
                offset: 0,
            },
        }
    }

    /// The location marking the start of this edit's new content, for
    /// change-notification purposes.
    pub(crate) fn start_of_change(&self, id: EditId) -> Location {
        let edit = self.edit(id);
        let piece = edit.ins.or(edit.post).unwrap_or(edit.after);
        Location { piece, offset: 0 }
    }

    /// Builds and applies a brand-new edit for `(point, delta, insert)`,
    /// appending it to the journal (truncating any stale redo tail).
    fn create_and_apply(&mut self, point: Location, delta: isize, insert: &[u8]) -> EditId {
        let (left, right) = self.resolve_span(point, delta);

        let pre = if left.offset > 0 {
            Some(self.lsplit(left.piece, left.offset))
        } else {
            None
        };
        let post = if right.offset > 0 {
            Some(self.rsplit(right.piece, right.offset))
        } else {
            None
        };
        let ins = if !insert.is_empty() {
            Some(self.new_primary(insert.to_vec()))
        } else {
            None
        };

        let first = left.piece;
        let last = if right.offset > 0 {
            right.piece
        } else {
            self.prev_of(right.piece)
                .expect("non-sentinel piece must have a prev")
        };
        let before = self
            .prev_of(left.piece)
            .expect("non-sentinel piece must have a prev");
        let after = if right.offset > 0 {
            self.next_of(right.piece)
                .expect("non-sentinel piece must have a next")
        } else {
            right.piece
        };

        // Wire the new pieces' fixed back-links: new_first.prev = before,
        // new_last.next = after. These never change again, even across
        // undo/redo; only `before.next`/`after.prev` toggle.
        let chain: Vec<PieceId> = [pre, ins, post].into_iter().flatten().collect();
        for w in chain.windows(2) {
            self.link(Some(w[0]), Some(w[1]));
        }
        let new_first = chain.first().copied();
        let new_last = chain.last().copied();
        if let Some(nf) = new_first {
            self.link(Some(before), Some(nf));
        }
        if let Some(nl) = new_last {
            self.link(Some(nl), Some(after));
        }
        // first/last keep their original back-links to before/after so undo
        // can relink the excluded run verbatim.
        self.pieces[first.0 as usize].prev = Some(before);
        self.pieces[last.0 as usize].next = Some(after);

        // Apply: splice the new pieces (or after/before directly, if there
        // are none) into the live chain.
        self.link(Some(before), new_first.or(Some(after)));
        self.link(new_last.or(Some(before)), Some(after));

        let edit = Edit {
            pre,
            ins,
            post,
            first,
            last,
            before,
            after,
            applied: true,
            prev: None,
            next: None,
        };
        let id = self.push_edit(edit);
        trace!(target: "core_text.edit", edit = id.0, "created");
        id
    }

    fn append_to_journal(&mut self, id: EditId) {
        let tip = self.tip;
        self.edit_mut(id).prev = Some(tip);
        self.edit_mut(tip).next = Some(id);
        self.tip = id;
    }

    /// Coalesce-or-append entry point backing `insert`/`delete`/`replace`.
    pub(crate) fn apply_change(&mut self, point: Location, delta: isize, insert: &[u8]) {
        if delta == 0 && insert.is_empty() {
            return;
        }
        if !self.try_coalesce(point, delta, insert) {
            let id = self.create_and_apply(point, delta, insert);
            self.append_to_journal(id);
        }
        self.point = self.end_of_change(self.tip);
        self.dirty = true;
        let (s, e) = (self.start_of_change(self.tip), self.end_of_change(self.tip));
        self.notify(s, e);
    }

    /// Attempts to fold `(point, delta, insert)` into the journal tip in
    /// place. Returns `false` (no mutation performed) when coalescing isn't
    /// possible and the caller must append a fresh edit instead.
    fn try_coalesce(&mut self, point: Location, delta: isize, insert: &[u8]) -> bool {
        if self.tip == self.root_edit {
            return false;
        }
        if point != self.end_of_change(self.tip) {
            return false;
        }

        if delta > 0 {
            let n = delta as usize;
            let post = self.edit(self.tip).post;
            match post {
                Some(post) if self.piece_len(post) > n => {
                    self.trim_secondary(post, n, 0);
                }
                _ => return false,
            }
        } else if delta < 0 {
            let n = (-delta) as usize;
            let tip = self.tip;
            let ins = self.edit(tip).ins;
            let pre = self.edit(tip).pre;
            if let Some(ins) = ins {
                if self.piece_len(ins) > n {
                    self.trim_primary(ins, -(n as isize));
                } else {
                    return false;
                }
            } else if let Some(pre) = pre {
                if self.piece_len(pre) > n {
                    self.trim_secondary(pre, 0, n);
                } else {
                    return false;
                }
            } else {
                return false;
            }
        }

        if !insert.is_empty() {
            let tip = self.tip;
            match self.edit(tip).ins {
                Some(ins) => self.extend_primary(ins, insert),
                None => {
                    let new_ins = self.new_primary(insert.to_vec());
                    let left = self.edit(tip).pre.unwrap_or(self.edit(tip).before);
                    let right = self.edit(tip).post.unwrap_or(self.edit(tip).after);
                    self.link(Some(left), Some(new_ins));
                    self.link(Some(new_ins), Some(right));
                    self.edit_mut(tip).ins = Some(new_ins);
                }
            }
        }
        // A coalesce folds into `tip` in place without going through
        // `append_to_journal`, so it must truncate any redo tail itself:
        // otherwise a stale `tip.next` from a prior undo stays reachable
        // and a later redo() splices its detached run back into the chain.
        if let Some(stale) = self.edit(self.tip).next {
            self.edit_mut(stale).prev = None;
            self.edit_mut(self.tip).next = None;
        }
        trace!(target: "core_text.edit", edit = self.tip.0, delta, inserted = insert.len(), "coalesced");
        true
    }

    /// Reverts the tip edit's link configuration back to the excluded run.
    fn unapply(&mut self, id: EditId) {
        let e = self.edit(id).clone();
        self.link(Some(e.before), Some(e.first));
        self.link(Some(e.last), Some(e.after));
        self.edit_mut(id).applied = false;
    }

    /// Re-applies a previously reverted edit's link configuration.
    fn reapply(&mut self, id: EditId) {
        let e = self.edit(id).clone();
        let new_first = e.new_first();
        let new_last = e.new_last();
        self.link(Some(e.before), new_first.or(Some(e.after)));
        self.link(new_last.or(Some(e.before)), Some(e.after));
        self.edit_mut(id).applied = true;
    }

    pub fn undo(&mut self) -> bool {
        let tip = self.tip;
        let Some(prev) = self.edit(tip).prev else {
            return false;
        };
        debug_assert!(self.edit(tip).applied, "undo of an already-undone edit");
        let (s, e) = (self.start_of_change(tip), self.end_of_change(tip));
        self.unapply(tip);
        self.tip = prev;
        self.point = self.end_of_change(self.tip);
        self.dirty = true;
        trace!(target: "core_text.edit", edit = tip.0, "undo");
        self.notify(s, e);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.edit(self.tip).next else {
            return false;
        };
        debug_assert!(!self.edit(next).applied, "redo of an already-applied edit");
        self.reapply(next);
        self.tip = next;
        self.point = self.end_of_change(self.tip);
        self.dirty = true;
        let (s, e) = (self.start_of_change(self.tip), self.end_of_change(self.tip));
        trace!(target: "core_text.edit", edit = next.0, "redo");
        self.notify(s, e);
        true
    }
}
