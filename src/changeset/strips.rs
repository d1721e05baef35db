//! Strips: ordered runs of strips with slicing and compaction

use super::strip::{resolve_range, Strip};
use crate::error::{Result, SyncError};
use std::ops::RangeBounds;

/// An ordered sequence of strips
///
/// Order is significant. Two `Strips` are equal when their compacted forms
/// are equal, so `["ab", "c"]` equals `["abc"]`.
#[derive(Debug, Clone, Default, Eq)]
pub struct Strips(Vec<Strip>);

impl Strips {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Total number of output characters
    pub fn length(&self) -> usize {
        self.0.iter().map(Strip::len).sum()
    }

    /// True when there are no strips at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Strip] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Strip> {
        self.0.iter()
    }

    pub fn push(&mut self, strip: Strip) {
        self.0.push(strip);
    }

    /// Merge adjacent compatible strips into the fewest possible elements
    ///
    /// Left fold keeping a running last strip: each next strip is
    /// concatenated onto it, and whenever the concatenation yields two
    /// strips the first one is emitted. Empty strips disappear.
    pub fn compact(self) -> Strips {
        let mut compacted = Vec::with_capacity(self.0.len());
        let mut last = Strip::Empty;

        for strip in self.0 {
            let mut joined = last.concat(strip).0;
            last = joined.pop().unwrap_or(Strip::Empty);
            compacted.extend(joined.into_iter().filter(|strip| !strip.is_empty()));
        }

        if !last.is_empty() {
            compacted.push(last);
        }

        Strips(compacted)
    }

    /// Strips covering output positions `range`
    ///
    /// Walks the strips accumulating position, emitting the relative slice of
    /// every strip that intersects the range, and stops once `end` is
    /// reached. Bounds are clamped to the total length.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Strips {
        let (start, end) = resolve_range(&range, self.length());
        let mut sliced = Vec::new();
        let mut position = 0;

        for strip in &self.0 {
            if position >= end {
                break;
            }

            let len = strip.len();
            let next = position + len;
            if next > start {
                let from = start.saturating_sub(position);
                let to = (end - position).min(len);
                sliced.push(strip.slice(from..to));
            }
            position = next;
        }

        Strips(sliced)
    }

    /// Check that retained ranges are increasing and non-overlapping
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidChangeset` naming the first offending strip.
    pub fn validate(&self) -> Result<()> {
        let mut next_free: Option<usize> = None;

        for (index, strip) in self.0.iter().enumerate() {
            if let Strip::Retain { start, end } = strip {
                if end < start {
                    return Err(SyncError::InvalidChangeset(format!(
                        "strip {} retains reversed range {}..={}",
                        index, start, end
                    )));
                }
                if let Some(free) = next_free {
                    if *start < free {
                        return Err(SyncError::InvalidChangeset(format!(
                            "strip {} retains {}..={}, overlapping or preceding the previous retain",
                            index, start, end
                        )));
                    }
                }
                next_free = Some(end + 1);
            }
        }

        Ok(())
    }
}

impl PartialEq for Strips {
    fn eq(&self, other: &Self) -> bool {
        self.clone().compact().0 == other.clone().compact().0
    }
}

impl From<Vec<Strip>> for Strips {
    fn from(strips: Vec<Strip>) -> Self {
        Strips(strips)
    }
}

impl From<Strip> for Strips {
    fn from(strip: Strip) -> Self {
        Strips(vec![strip])
    }
}

impl FromIterator<Strip> for Strips {
    fn from_iter<I: IntoIterator<Item = Strip>>(iter: I) -> Self {
        Strips(iter.into_iter().collect())
    }
}

impl Extend<Strip> for Strips {
    fn extend<I: IntoIterator<Item = Strip>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for Strips {
    type Item = Strip;
    type IntoIter = std::vec::IntoIter<Strip>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Strips {
    type Item = &'a Strip;
    type IntoIter = std::slice::Iter<'a, Strip>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
