//! Changeset: an edit expressed as strips plus the lengths it consumes and
//! produces

use super::strip::{char_len, Strip};
use super::strips::Strips;
use crate::error::{Result, SyncError};
use std::ops::Range;

/// An immutable edit operation
///
/// `required_length` is one past the highest retained index, the shortest
/// input the changeset can be applied to. `length` is the length of the
/// output. Strips are compacted at construction, so structural equality is
/// semantic equality.
///
/// A *document* is a changeset applied to the empty document: it contains
/// only inserts, and its text is the concatenation of those inserts.
///
/// # Example
///
/// ```rust
/// use textsync_core::changeset::{Changeset, Strip};
///
/// let document = Changeset::from_text("hello");
/// let edit = Changeset::new(vec![Strip::retain(0, 4), Strip::insert(" world")]);
///
/// let composed = document.compose(&edit).unwrap();
/// assert_eq!(composed.text(), "hello world");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    strips: Strips,
    required_length: usize,
    length: usize,
}

impl Changeset {
    /// Build a changeset, compacting the strips
    pub fn new(strips: impl Into<Strips>) -> Self {
        let strips = strips.into().compact();
        let required_length = strips
            .iter()
            .filter_map(|strip| match strip {
                Strip::Retain { end, .. } => Some(end + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        let length = strips.length();

        Self {
            strips,
            required_length,
            length,
        }
    }

    /// The empty document
    pub fn empty() -> Self {
        Self::default()
    }

    /// A document holding `text`
    pub fn from_text(text: &str) -> Self {
        Self::new(Strip::insert(text))
    }

    /// The no-op changeset over a document of `length` characters
    pub fn identity_of(length: usize) -> Self {
        Self::new(Strip::retain_range(0..length))
    }

    /// Replace `range` of a document of `document_length` characters with
    /// `text`
    ///
    /// This is the bridge from raw editor input: typing at a caret is an
    /// empty range, deleting backwards is an empty `text`.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::RetainOutOfBounds` if the range does not fit the
    /// document.
    pub fn edit(document_length: usize, range: Range<usize>, text: &str) -> Result<Self> {
        if range.start > range.end || range.end > document_length {
            return Err(SyncError::RetainOutOfBounds {
                start: range.start,
                end: range.end,
                length: document_length,
            });
        }

        Ok(Self::new(vec![
            Strip::retain_range(0..range.start),
            Strip::insert(text),
            Strip::retain_range(range.end..document_length),
        ]))
    }

    pub fn strips(&self) -> &Strips {
        &self.strips
    }

    pub fn into_strips(self) -> Strips {
        self.strips
    }

    /// Shortest input length this changeset can be applied to
    pub fn required_length(&self) -> usize {
        self.required_length
    }

    /// Output length
    pub fn length(&self) -> usize {
        self.length
    }

    /// True for a single full-range retain over its own length
    ///
    /// A changeset does not record the length of its input, so a tail
    /// deletion such as `[[0, 3]]` on a longer document passes this check
    /// too. Use [`Changeset::is_identity_over`] or
    /// [`Changeset::is_identity_for`] when the input is known.
    pub fn is_identity(&self) -> bool {
        match self.strips.as_slice() {
            [] => self.length == 0,
            [Strip::Retain { start: 0, end }] => end + 1 == self.length,
            _ => false,
        }
    }

    /// True when this changeset keeps a document of `input_length`
    /// characters exactly as it is
    pub fn is_identity_over(&self, input_length: usize) -> bool {
        self.length == input_length && self.is_identity()
    }

    /// True when applying this changeset after `other` leaves `other`
    /// unchanged
    pub fn is_identity_for(&self, other: &Changeset) -> bool {
        other
            .compose(self)
            .map(|composed| &composed == other)
            .unwrap_or(false)
    }

    /// The identity changeset for this changeset's output
    pub fn identity(&self) -> Changeset {
        Self::identity_of(self.length)
    }

    /// Apply `self`, then `next`
    ///
    /// Every strip of `next` is resolved against the strips of `self`; the
    /// results are concatenated and compacted.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::LengthMismatch` if `next` needs a longer input
    /// than `self` produces, or `SyncError::RetainOutOfBounds` if a retain
    /// cannot be resolved.
    pub fn compose(&self, next: &Changeset) -> Result<Changeset> {
        if next.required_length > self.length {
            return Err(SyncError::LengthMismatch {
                required: next.required_length,
                actual: self.length,
            });
        }

        let mut strips = Strips::new();
        for strip in next.strips.iter() {
            strips.extend(strip.reference(&self.strips)?);
        }

        Ok(Changeset::new(strips))
    }

    /// The changeset that undoes `self`, given the document it applied to
    ///
    /// Retained characters map back onto themselves, deleted characters are
    /// re-inserted from `base`, inserted characters are dropped.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::LengthMismatch` if `base` is shorter than `self`
    /// requires.
    pub fn inverse(&self, base: &Changeset) -> Result<Changeset> {
        if self.required_length > base.length {
            return Err(SyncError::LengthMismatch {
                required: self.required_length,
                actual: base.length,
            });
        }

        let mut strips = Strips::new();
        let mut next_base = 0;
        let mut offset = 0;

        for strip in self.strips.iter() {
            match strip {
                Strip::Retain { start, end } => {
                    if *start > next_base {
                        strips.extend(base.strips.slice(next_base..*start));
                    }
                    strips.push(Strip::retain(offset, offset + (end - start)));
                    offset += end - start + 1;
                    next_base = end + 1;
                }
                Strip::Insert(value) => offset += char_len(value),
                Strip::Empty => {}
            }
        }

        if base.length > next_base {
            strips.extend(base.strips.slice(next_base..base.length));
        }

        Ok(Changeset::new(strips))
    }

    /// Concatenated inserted text
    ///
    /// For a document this is its full text. Retains are skipped.
    pub fn text(&self) -> String {
        self.strips
            .iter()
            .filter_map(|strip| match strip {
                Strip::Insert(value) => Some(value.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Apply this changeset to plain text
    ///
    /// # Errors
    ///
    /// Returns `SyncError::LengthMismatch` if `text` is too short.
    pub fn apply(&self, text: &str) -> Result<String> {
        let chars: Vec<char> = text.chars().collect();
        if self.required_length > chars.len() {
            return Err(SyncError::LengthMismatch {
                required: self.required_length,
                actual: chars.len(),
            });
        }

        let mut output = String::with_capacity(text.len());
        for strip in self.strips.iter() {
            match strip {
                Strip::Retain { start, end } => output.extend(&chars[*start..=*end]),
                Strip::Insert(value) => output.push_str(value),
                Strip::Empty => {}
            }
        }

        Ok(output)
    }
}

impl From<Strips> for Changeset {
    fn from(strips: Strips) -> Self {
        Changeset::new(strips)
    }
}
