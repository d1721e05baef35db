//! Strip: the atomic edit primitive
//!
//! A strip either keeps a contiguous range of the document it is applied to,
//! or contributes literal new text. Changesets are ordered runs of strips.

use super::strips::Strips;
use crate::error::{Result, SyncError};
use std::ops::{Bound, Range, RangeBounds};

/// Atomic unit of a changeset
///
/// # Example
///
/// ```rust
/// use textsync_core::changeset::Strip;
///
/// let kept = Strip::retain(2, 5);
/// assert_eq!(kept.len(), 4);
///
/// let added = Strip::insert("hello");
/// assert_eq!(added.slice(1..3), Strip::insert("el"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Strip {
    /// Keeps characters `start..=end` of the input document
    Retain { start: usize, end: usize },

    /// Contributes literal characters
    Insert(String),

    /// Zero-length filler, absorbed by any concatenation
    Empty,
}

impl Strip {
    /// Retain `start..=end` (inclusive on both ends)
    pub fn retain(start: usize, end: usize) -> Self {
        debug_assert!(end >= start, "retain end {} before start {}", end, start);
        Strip::Retain { start, end }
    }

    /// Retain a half-open range, or `Empty` when the range is empty
    pub fn retain_range(range: Range<usize>) -> Self {
        if range.is_empty() {
            Strip::Empty
        } else {
            Strip::Retain {
                start: range.start,
                end: range.end - 1,
            }
        }
    }

    /// Insert text, or `Empty` for the empty string
    pub fn insert(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Strip::Empty
        } else {
            Strip::Insert(value)
        }
    }

    /// Number of characters this strip contributes to the output document
    ///
    /// A reversed retain covers nothing.
    pub fn len(&self) -> usize {
        match self {
            Strip::Retain { start, end } => (end + 1).saturating_sub(*start),
            Strip::Insert(value) => char_len(value),
            Strip::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_retain(&self) -> bool {
        matches!(self, Strip::Retain { .. })
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Strip::Insert(_))
    }

    /// Resolve this strip against the strips of a prior document
    ///
    /// A retain resolves to the strips covering its range; an insert
    /// resolves to itself.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::RetainOutOfBounds` when the retained range reaches
    /// past the end of `strips`.
    pub fn reference(&self, strips: &Strips) -> Result<Strips> {
        match self {
            Strip::Retain { start, end } => {
                let resolved = strips.slice(*start..*end + 1);
                if resolved.length() < self.len() {
                    return Err(SyncError::RetainOutOfBounds {
                        start: *start,
                        end: *end,
                        length: strips.length(),
                    });
                }
                Ok(resolved)
            }
            Strip::Insert(_) => Ok(Strips::from(vec![self.clone()])),
            Strip::Empty => Ok(Strips::new()),
        }
    }

    /// Sub-strip covering `range`, relative to this strip's own output
    ///
    /// Bounds are clamped to the strip's length. Slicing a retain narrows its
    /// range, slicing an insert narrows its text.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Strip {
        let (from, to) = resolve_range(&range, self.len());
        if from >= to {
            return Strip::Empty;
        }

        match self {
            Strip::Retain { start, .. } => Strip::Retain {
                start: start + from,
                end: start + to - 1,
            },
            Strip::Insert(value) => Strip::Insert(char_slice(value, from, to).to_string()),
            Strip::Empty => Strip::Empty,
        }
    }

    /// Concatenate two strips
    ///
    /// Touching retains and adjacent inserts collapse into a single strip,
    /// empty strips are absorbed. Anything else comes back as two strips.
    pub fn concat(self, other: Strip) -> Strips {
        if other.is_empty() {
            return Strips::from(vec![self]);
        }
        if self.is_empty() {
            return Strips::from(vec![other]);
        }

        match (self, other) {
            (Strip::Retain { start, end }, Strip::Retain { start: next, end: last })
                if end + 1 == next =>
            {
                Strips::from(vec![Strip::Retain { start, end: last }])
            }
            (Strip::Insert(mut value), Strip::Insert(more)) => {
                value.push_str(&more);
                Strips::from(vec![Strip::Insert(value)])
            }
            (first, second) => Strips::from(vec![first, second]),
        }
    }
}

/// Number of characters in `value`
pub(crate) fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Sub-string by character offsets `from..to`
pub(crate) fn char_slice(value: &str, from: usize, to: usize) -> &str {
    let mut offsets = value
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(value.len()));
    let start = offsets.nth(from).unwrap_or(value.len());
    let end = if to > from {
        offsets.nth(to - from - 1).unwrap_or(value.len())
    } else {
        start
    };
    &value[start..end]
}

/// Clamp arbitrary range bounds to `0..len`
pub(crate) fn resolve_range(range: &impl RangeBounds<usize>, len: usize) -> (usize, usize) {
    let start = match range.start_bound() {
        Bound::Included(&start) => start,
        Bound::Excluded(&start) => start + 1,
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&end) => end + 1,
        Bound::Excluded(&end) => end,
        Bound::Unbounded => len,
    };
    (start.min(len), end.min(len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths() {
        assert_eq!(Strip::retain(0, 0).len(), 1);
        assert_eq!(Strip::retain(3, 7).len(), 5);
        assert_eq!(Strip::insert("héllo").len(), 5);
        assert_eq!(Strip::Empty.len(), 0);
        assert_eq!(Strip::insert(""), Strip::Empty);
        assert_eq!(Strip::retain_range(4..4), Strip::Empty);
        assert_eq!(Strip::retain_range(4..6), Strip::retain(4, 5));
        assert_eq!(Strip::Retain { start: 4, end: 1 }.len(), 0);
        assert!(Strip::Retain { start: 4, end: 1 }.is_empty());
    }

    #[test]
    fn test_slice_retain() {
        let strip = Strip::retain(10, 19);
        assert_eq!(strip.slice(0..3), Strip::retain(10, 12));
        assert_eq!(strip.slice(5..), Strip::retain(15, 19));
        assert_eq!(strip.slice(..), strip);
        assert_eq!(strip.slice(4..4), Strip::Empty);
        assert_eq!(strip.slice(8..50), Strip::retain(18, 19));
    }

    #[test]
    fn test_slice_insert() {
        let strip = Strip::insert("añb👋c");
        assert_eq!(strip.slice(1..4), Strip::insert("ñb👋"));
        assert_eq!(strip.slice(4..), Strip::insert("c"));
        assert_eq!(strip.slice(..1), Strip::insert("a"));
        assert_eq!(Strip::Empty.slice(0..3), Strip::Empty);
    }

    #[test]
    fn test_concat() {
        let merged = Strip::retain(0, 3).concat(Strip::retain(4, 6));
        assert_eq!(merged.as_slice(), &[Strip::retain(0, 6)]);

        let merged = Strip::insert("ab").concat(Strip::insert("cd"));
        assert_eq!(merged.as_slice(), &[Strip::insert("abcd")]);

        let split = Strip::retain(0, 3).concat(Strip::retain(5, 6));
        assert_eq!(split.as_slice(), &[Strip::retain(0, 3), Strip::retain(5, 6)]);

        let split = Strip::insert("x").concat(Strip::retain(0, 1));
        assert_eq!(split.as_slice().len(), 2);

        let absorbed = Strip::Empty.concat(Strip::insert("x"));
        assert_eq!(absorbed.as_slice(), &[Strip::insert("x")]);
    }

    #[test]
    fn test_reference() {
        let source = Strips::from(vec![Strip::insert("hello"), Strip::retain(0, 2)]);

        let resolved = Strip::retain(3, 6).reference(&source).unwrap();
        assert_eq!(
            resolved.as_slice(),
            &[Strip::insert("lo"), Strip::retain(0, 1)]
        );

        let resolved = Strip::insert("x").reference(&source).unwrap();
        assert_eq!(resolved.as_slice(), &[Strip::insert("x")]);

        assert!(Strip::Empty.reference(&source).unwrap().is_empty());
    }

    #[test]
    fn test_reference_out_of_bounds() {
        let source = Strips::from(vec![Strip::insert("abc")]);
        let result = Strip::retain(1, 5).reference(&source);

        match result {
            Err(SyncError::RetainOutOfBounds { start, end, length }) => {
                assert_eq!((start, end, length), (1, 5, 3));
            }
            other => panic!("Expected RetainOutOfBounds, got {:?}", other),
        }
    }

    #[test]
    fn test_char_slice() {
        assert_eq!(char_slice("héllo", 1, 3), "él");
        assert_eq!(char_slice("abc", 3, 3), "");
        assert_eq!(char_slice("abc", 0, 10), "abc");
    }
}
