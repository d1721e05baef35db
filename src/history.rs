//! Undo/redo history that survives concurrent edits
//!
//! The history is a stack of entries, each pairing the changeset that was
//! executed with the changeset that undoes it, together with the selection
//! to restore. Three cursors count how many entries are applied locally,
//! were submitted to the server, and were acknowledged by it.
//!
//! When an edit from another client arrives, the stack is rewritten so that
//! undo never reverts someone else's work: entries older than the foreign
//! edit are reordered behind it with [`Changeset::swap`], newer entries are
//! rebased over it with [`Changeset::follow`], and entries that became no-ops
//! are spliced out.
//!
//! # Example
//!
//! ```rust
//! use textsync_core::{Changeset, Document, History, Selection};
//!
//! let mut document = Document::new();
//! let mut history = History::new(document.view().clone());
//!
//! let edit = Changeset::edit(0, 0..0, "hi").unwrap();
//! history.push(&mut document, &edit, Selection::caret(0), Selection::caret(2)).unwrap();
//! assert_eq!(document.text(), "hi");
//!
//! assert_eq!(history.undo(&mut document).unwrap(), Some(Selection::caret(0)));
//! assert_eq!(document.text(), "");
//!
//! assert_eq!(history.redo(&mut document).unwrap(), Some(Selection::caret(2)));
//! assert_eq!(document.text(), "hi");
//! ```

use crate::changeset::Changeset;
use crate::document::Document;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Which end of a selection the caret sits on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionDirection {
    Forward,
    Backward,
    #[default]
    None,
}

/// A selected range of the document, in characters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub direction: SelectionDirection,
}

impl Selection {
    pub fn new(start: usize, end: usize, direction: SelectionDirection) -> Self {
        Self {
            start,
            end,
            direction,
        }
    }

    /// Collapsed selection at `position`
    pub fn caret(position: usize) -> Self {
        Self::new(position, position, SelectionDirection::None)
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Map both ends through `changeset`
    pub fn follow(&self, changeset: &Changeset) -> Selection {
        Selection {
            start: changeset.follow_index(self.start),
            end: changeset.follow_index(self.end),
            direction: self.direction,
        }
    }
}

/// A changeset and the selection to restore once it is applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryStep {
    pub changeset: Changeset,
    pub selection: Selection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub execute: HistoryStep,
    pub undo: HistoryStep,
}

/// How [`History::rebase`] fitted a foreign edit into the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebaseOutcome {
    /// Placed at the server cursor
    Anchored,

    /// Placed at the local cursor, because the stack rewritten around the
    /// server cursor did not reproduce the view
    Realigned,

    /// The stack could not be rewritten and was cleared
    Reset,
}

/// The stack after a foreign edit was woven in
struct Rewrite {
    base: Changeset,
    entries: Vec<HistoryEntry>,
    at_local: Changeset,
}

/// Undo/redo stack with local, submitted and server cursors
///
/// `base` is the document before the first entry, so applying the first
/// `local` entries to it reproduces the document view.
#[derive(Debug, Clone)]
pub struct History {
    base: Changeset,
    entries: Vec<HistoryEntry>,
    local: usize,
    submitted: usize,
    server: usize,
}

impl History {
    /// Empty history over `base`
    pub fn new(base: Changeset) -> Self {
        Self {
            base,
            entries: Vec::new(),
            local: 0,
            submitted: 0,
            server: 0,
        }
    }

    /// Record and apply a user edit
    ///
    /// Anything that was undone is discarded first. Identity edits are
    /// applied without being recorded.
    ///
    /// # Errors
    ///
    /// Returns a length error if `changeset` does not apply to the document
    /// view. Nothing is recorded on error.
    pub fn push(
        &mut self,
        document: &mut Document,
        changeset: &Changeset,
        before: Selection,
        after: Selection,
    ) -> Result<()> {
        let undo = changeset.inverse(document.view())?;
        let unchanged = changeset.is_identity_for(document.view());
        document.compose_local_change(changeset)?;
        if unchanged {
            return Ok(());
        }

        self.entries.truncate(self.local);
        self.submitted = self.submitted.min(self.local);
        self.server = self.server.min(self.local);

        self.entries.push(HistoryEntry {
            execute: HistoryStep {
                changeset: changeset.clone(),
                selection: after,
            },
            undo: HistoryStep {
                changeset: undo,
                selection: before,
            },
        });
        self.local += 1;
        Ok(())
    }

    /// Revert the most recent applied entry
    ///
    /// Returns the selection from before that edit, or `None` when there is
    /// nothing to undo.
    pub fn undo(&mut self, document: &mut Document) -> Result<Option<Selection>> {
        let Some(entry) = self.local.checked_sub(1).and_then(|index| self.entries.get(index)) else {
            return Ok(None);
        };

        document.compose_local_change(&entry.undo.changeset)?;
        let selection = entry.undo.selection;
        self.local -= 1;
        Ok(Some(selection))
    }

    /// Re-apply the most recently undone entry
    ///
    /// Returns the selection from after that edit, or `None` when there is
    /// nothing to redo.
    pub fn redo(&mut self, document: &mut Document) -> Result<Option<Selection>> {
        let Some(entry) = self.entries.get(self.local) else {
            return Ok(None);
        };

        document.compose_local_change(&entry.execute.changeset)?;
        let selection = entry.execute.selection;
        self.local += 1;
        Ok(Some(selection))
    }

    pub fn can_undo(&self) -> bool {
        self.local > 0
    }

    pub fn can_redo(&self) -> bool {
        self.local < self.entries.len()
    }

    /// Everything applied locally has been submitted
    pub fn mark_submitted(&mut self) {
        self.submitted = self.local;
    }

    /// The last submission was acknowledged
    pub fn mark_acknowledged(&mut self) {
        self.server = self.submitted;
    }

    /// Weave a foreign edit into the stack
    ///
    /// `foreign` is the edit as confirmed by the server, `view_follow` maps
    /// the previous view onto `view`, the document view after the edit.
    /// The edit is first placed at the server cursor. If the rewritten stack
    /// does not reproduce `view`, `view_follow` is placed at the local cursor
    /// instead, and if that fails too the history is cleared.
    pub fn rebase(
        &mut self,
        foreign: &Changeset,
        view_follow: &Changeset,
        view: &Changeset,
    ) -> RebaseOutcome {
        let anchor = self.server.min(self.entries.len());
        if let Ok(rewrite) = self.rewrite(anchor, foreign) {
            if &rewrite.at_local == view {
                self.install(rewrite);
                return RebaseOutcome::Anchored;
            }
        }

        if let Ok(rewrite) = self.rewrite(self.local, view_follow) {
            if &rewrite.at_local == view {
                self.install(rewrite);
                return RebaseOutcome::Realigned;
            }
        }

        self.reset(view.clone());
        RebaseOutcome::Reset
    }

    /// Rewrite the stack as if `foreign` had been applied right after the
    /// first `anchor` entries
    fn rewrite(&self, anchor: usize, foreign: &Changeset) -> Result<Rewrite> {
        let mut entries = self.entries.clone();

        // Move the edit back through the entries it comes after
        let mut moving = foreign.clone();
        for index in (0..anchor).rev() {
            let base_length = match index {
                0 => self.base.length(),
                _ => self.entries[index - 1].execute.changeset.length(),
            };
            let entry = &mut entries[index];

            entry.execute.selection = entry.execute.selection.follow(&moving);
            let (moved, execute) = entry.execute.changeset.swap(&moving, base_length)?;
            entry.execute.changeset = execute;
            entry.undo.selection = entry.undo.selection.follow(&moved);
            moving = moved;
        }

        let base = self.base.compose(&moving)?;

        // Rebase the entries that come after it
        let mut following = foreign.clone();
        for entry in entries.iter_mut().skip(anchor) {
            entry.undo.selection = entry.undo.selection.follow(&following);
            let execute = following.follow(&entry.execute.changeset);
            let next = entry.execute.changeset.follow(&following);
            entry.execute.changeset = execute;
            entry.execute.selection = entry.execute.selection.follow(&next);
            following = next;
        }

        // Undo steps are recomputed against the rewritten documents
        let mut document = base.clone();
        let mut at_local = base.clone();
        for (index, entry) in entries.iter_mut().enumerate() {
            entry.undo.changeset = entry.execute.changeset.inverse(&document)?;
            document = document.compose(&entry.execute.changeset)?;
            if index + 1 == self.local {
                at_local = document.clone();
            }
        }

        Ok(Rewrite {
            base,
            entries,
            at_local,
        })
    }

    fn install(&mut self, rewrite: Rewrite) {
        self.base = rewrite.base;
        self.entries = rewrite.entries;

        let mut index = 0;
        let mut length = self.base.length();
        while index < self.entries.len() {
            let execute = &self.entries[index].execute.changeset;
            if execute.is_identity_over(length) {
                self.splice(index);
            } else {
                length = execute.length();
                index += 1;
            }
        }
    }

    /// Remove the entry at `index`, shifting every cursor past it
    ///
    /// The removed entry's selections move to its neighbours on the same
    /// side of the local cursor, so undoing and redoing over the gap still
    /// lands where the user left off.
    fn splice(&mut self, index: usize) {
        let removed = self.entries.remove(index);
        let applied = index < self.local;

        if index > 0 && (index - 1 < self.local) == applied {
            self.entries[index - 1].execute.selection = removed.execute.selection;
        }
        if let Some(next) = self.entries.get_mut(index) {
            if (index + 1 < self.local) == applied {
                next.undo.selection = removed.undo.selection;
            }
        }

        for cursor in [&mut self.local, &mut self.submitted, &mut self.server] {
            if *cursor > index {
                *cursor -= 1;
            }
        }

        let len = self.entries.len();
        debug_assert!(
            self.local <= len && self.submitted <= len && self.server <= len,
            "history cursors {}/{}/{} past {} entries",
            self.local,
            self.submitted,
            self.server,
            len
        );
    }

    /// Drop every entry and start over from `base`
    pub fn reset(&mut self, base: Changeset) {
        *self = Self::new(base);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn base(&self) -> &Changeset {
        &self.base
    }

    pub fn local(&self) -> usize {
        self.local
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }

    pub fn server(&self) -> usize {
        self.server
    }
}
