use super::algebra::Changeset;
use serde::{Deserialize, Serialize};

/// A changeset tagged with the revision it belongs to
///
/// On the way to the server `revision` is the base revision the changeset
/// was made against. On the way back it is the revision the changeset
/// produced in the server log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionChangeset {
    pub revision: u64,
    pub changeset: Changeset,
}

impl RevisionChangeset {
    pub fn new(revision: u64, changeset: Changeset) -> Self {
        Self {
            revision,
            changeset,
        }
    }
}
