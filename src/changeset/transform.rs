//! Operational transformation: rebasing changesets against concurrent
//! siblings, mapping carets, and reordering consecutive edits
//!
//! All routines walk changesets in *base document order*. An insertion is
//! positioned immediately after the last character its changeset retained
//! before it, which places it ahead of any characters the same changeset
//! deletes at that spot.

use super::algebra::Changeset;
use super::strip::{char_len, char_slice, Strip};
use crate::error::{Result, SyncError};
use std::cmp::Ordering;

/// A strip positioned against the changeset's input document
#[derive(Debug, Clone, Copy)]
enum Span<'a> {
    /// Input characters `start..end` are kept
    Keep { start: usize, end: usize },

    /// `text` is inserted before input character `at`
    Insert { at: usize, text: &'a str },
}

fn spans(changeset: &Changeset) -> Vec<Span<'_>> {
    let mut at = 0;
    changeset
        .strips()
        .iter()
        .filter_map(|strip| match strip {
            Strip::Retain { start, end } => {
                at = end + 1;
                Some(Span::Keep {
                    start: *start,
                    end: end + 1,
                })
            }
            Strip::Insert(text) => Some(Span::Insert { at, text }),
            Strip::Empty => None,
        })
        .collect()
}

/// Walks the spans of one changeset while a caller advances through input
/// positions.
///
/// Callers must stop at every boundary reported by `run`, which is what
/// keeps `take_insert` from ever skipping an insertion.
struct SpanCursor<'a> {
    spans: Vec<Span<'a>>,
    index: usize,
}

impl<'a> SpanCursor<'a> {
    fn new(changeset: &'a Changeset) -> Self {
        Self {
            spans: spans(changeset),
            index: 0,
        }
    }

    /// Consume the insertion sitting at `position`, if there is one
    fn take_insert(&mut self, position: usize) -> Option<&'a str> {
        match self.spans.get(self.index) {
            Some(Span::Insert { at, text }) if *at == position => {
                self.index += 1;
                Some(*text)
            }
            _ => None,
        }
    }

    /// Whether `position` is kept, and where that state next changes
    fn run(&self, position: usize) -> (bool, usize) {
        match self.spans.get(self.index) {
            Some(Span::Keep { start, end }) if *start <= position => (true, *end),
            Some(Span::Keep { start, .. }) => (false, *start),
            Some(Span::Insert { at, .. }) => (false, *at),
            None => (false, usize::MAX),
        }
    }

    fn advance(&mut self, position: usize) {
        if let Some(Span::Keep { end, .. }) = self.spans.get(self.index) {
            if *end <= position {
                self.index += 1;
            }
        }
    }
}

/// Order of two insertions made at the same position by concurrent edits
///
/// Lexicographic on the inserted text, so both sides of a transform agree on
/// the result no matter which one is the receiver. `Less` or `Equal` puts
/// `own` first.
pub fn insertion_order(own: &str, foreign: &str) -> Ordering {
    own.cmp(foreign)
}

impl Changeset {
    /// Rebase `other` so that it applies after `self`
    ///
    /// Both changesets must apply to the same document. The result carries
    /// the intent of `other` into the output of `self`, and the two orders
    /// converge:
    ///
    /// `self ∘ self.follow(other) == other ∘ other.follow(self)`
    ///
    /// Characters kept by both sides stay kept, characters either side
    /// deleted are gone, insertions of `self` are retained and insertions of
    /// `other` are inserted. Insertions made at the same position by both
    /// sides are ordered with [`insertion_order`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use textsync_core::changeset::{Changeset, Strip};
    ///
    /// // "baseball" -> "basil" and "baseball" -> "below"
    /// let basil = Changeset::new(vec![Strip::retain(0, 1), Strip::insert("si"), Strip::retain(7, 7)]);
    /// let below = Changeset::new(vec![Strip::retain(0, 0), Strip::insert("e"), Strip::retain(6, 6), Strip::insert("ow")]);
    ///
    /// let document = Changeset::from_text("baseball");
    /// let left = document.compose(&basil).unwrap().compose(&basil.follow(&below)).unwrap();
    /// let right = document.compose(&below).unwrap().compose(&below.follow(&basil)).unwrap();
    /// assert_eq!(left.text(), "besiow");
    /// assert_eq!(left, right);
    /// ```
    pub fn follow(&self, other: &Changeset) -> Changeset {
        let mut own = SpanCursor::new(self);
        let mut foreign = SpanCursor::new(other);
        let mut strips = Vec::new();
        let mut position = 0;
        let mut offset = 0;

        loop {
            let inserted = match (own.take_insert(position), foreign.take_insert(position)) {
                (Some(mine), Some(theirs))
                    if insertion_order(mine, theirs) == Ordering::Greater =>
                {
                    [Some((false, theirs)), Some((true, mine))]
                }
                (mine, theirs) => [mine.map(|text| (true, text)), theirs.map(|text| (false, text))],
            };

            for (is_own, text) in inserted.into_iter().flatten() {
                if is_own {
                    let len = char_len(text);
                    strips.push(Strip::retain_range(offset..offset + len));
                    offset += len;
                } else {
                    strips.push(Strip::insert(text));
                }
            }

            let (kept_here, own_until) = own.run(position);
            let (kept_there, foreign_until) = foreign.run(position);
            let until = own_until.min(foreign_until);
            if until == usize::MAX {
                break;
            }

            let len = until - position;
            if kept_here {
                if kept_there {
                    strips.push(Strip::retain_range(offset..offset + len));
                }
                offset += len;
            }

            position = until;
            own.advance(position);
            foreign.advance(position);
        }

        Changeset::new(strips)
    }

    /// Map a caret offset in the input of `self` to its output
    ///
    /// Insertions before the caret, or exactly at it, push it right. A caret
    /// inside a deleted range collapses to where the deletion happened.
    pub fn follow_index(&self, position: usize) -> usize {
        let mut offset = 0;

        for span in spans(self) {
            match span {
                Span::Insert { at, text } => {
                    if at > position {
                        break;
                    }
                    offset += char_len(text);
                }
                Span::Keep { start, end } => {
                    if position < start {
                        break;
                    }
                    if position < end {
                        return offset + (position - start);
                    }
                    offset += end - start;
                }
            }
        }

        offset
    }

    /// Reorder `self` and the edit `next` that followed it
    ///
    /// `self` applies to a base of `base_length` characters and `next`
    /// applies to the output of `self`. Returns `(moved, after)` where
    /// `moved` carries `next` onto the base and `after` replays `self` on
    /// top of it, with
    ///
    /// `self ∘ next == moved ∘ after`
    ///
    /// Characters `self` deleted remain deleted by `after`. Characters
    /// `self` inserted and `next` deleted are never inserted by `after`.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::LengthMismatch` if the lengths do not chain.
    pub fn swap(&self, next: &Changeset, base_length: usize) -> Result<(Changeset, Changeset)> {
        if self.required_length() > base_length {
            return Err(SyncError::LengthMismatch {
                required: self.required_length(),
                actual: base_length,
            });
        }
        if next.required_length() > self.length() {
            return Err(SyncError::LengthMismatch {
                required: next.required_length(),
                actual: self.length(),
            });
        }

        let mut swap = Swap {
            cursor: SpanCursor::new(next),
            moved: Vec::new(),
            after: Vec::new(),
            middle: 0,
            moved_len: 0,
        };

        for piece in pieces(self, base_length) {
            match piece {
                Piece::Removed { start, end } => {
                    swap.flush_inserts();
                    swap.moved.push(Strip::retain_range(start..end));
                    swap.moved_len += end - start;
                }
                Piece::Kept { start, end } => {
                    let first = swap.middle;
                    swap.walk(end - start, |swap, from, to| {
                        let base = start + (from - first)..start + (to - first);
                        swap.moved.push(Strip::retain_range(base));
                        swap.after.push(Strip::retain_range(swap.moved_len..swap.moved_len + (to - from)));
                        swap.moved_len += to - from;
                    });
                }
                Piece::Added(text) => {
                    let first = swap.middle;
                    swap.walk(char_len(text), |swap, from, to| {
                        swap.after.push(Strip::insert(char_slice(text, from - first, to - first)));
                    });
                }
            }
        }
        swap.flush_inserts();

        Ok((Changeset::new(swap.moved), Changeset::new(swap.after)))
    }
}

/// A run of the first edit, in base document order
enum Piece<'a> {
    /// Base characters `start..end` deleted by the first edit
    Removed { start: usize, end: usize },

    /// Base characters `start..end` kept by the first edit
    Kept { start: usize, end: usize },

    /// Text inserted by the first edit
    Added(&'a str),
}

fn pieces(changeset: &Changeset, base_length: usize) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut next_base = 0;

    for strip in changeset.strips().iter() {
        match strip {
            Strip::Retain { start, end } => {
                if *start > next_base {
                    pieces.push(Piece::Removed {
                        start: next_base,
                        end: *start,
                    });
                }
                pieces.push(Piece::Kept {
                    start: *start,
                    end: end + 1,
                });
                next_base = end + 1;
            }
            Strip::Insert(text) => pieces.push(Piece::Added(text)),
            Strip::Empty => {}
        }
    }

    if base_length > next_base {
        pieces.push(Piece::Removed {
            start: next_base,
            end: base_length,
        });
    }

    pieces
}

/// Working state of [`Changeset::swap`]
struct Swap<'a> {
    /// Cursor over the second edit, in the first edit's output
    cursor: SpanCursor<'a>,

    /// Strips of the second edit moved onto the base
    moved: Vec<Strip>,

    /// Strips of the first edit replayed after the moved edit
    after: Vec<Strip>,

    /// Position in the first edit's output
    middle: usize,

    /// Length of the moved edit's output so far
    moved_len: usize,
}

impl<'a> Swap<'a> {
    /// Emit the second edit's insertions at the current middle position
    fn flush_inserts(&mut self) {
        while let Some(text) = self.cursor.take_insert(self.middle) {
            let len = char_len(text);
            self.moved.push(Strip::insert(text));
            self.after.push(Strip::retain_range(self.moved_len..self.moved_len + len));
            self.moved_len += len;
        }
    }

    /// Advance `len` positions through the first edit's output, calling
    /// `kept` for every sub-range the second edit keeps
    fn walk(&mut self, len: usize, mut kept: impl FnMut(&mut Self, usize, usize)) {
        let end = self.middle + len;

        while self.middle < end {
            self.flush_inserts();
            let (is_kept, until) = self.cursor.run(self.middle);
            let until = until.min(end);
            if is_kept {
                kept(self, self.middle, until);
            }
            self.middle = until;
            self.cursor.advance(self.middle);
        }
    }
}
