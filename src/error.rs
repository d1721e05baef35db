//! Error types for the sync core
//!
//! Every error is surfaced synchronously at the call site. Nothing in the
//! algebra retries; recovery policy belongs to the embedding session.

use thiserror::Error;

/// Errors produced by changeset algebra, the client state machine and the
/// reference server.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Composition input is shorter than the changeset requires
    #[error("changeset requires an input of length {required}, but the input has length {actual}")]
    LengthMismatch { required: usize, actual: usize },

    /// A retained range points past the end of the input document
    #[error("retained range {start}..={end} is outside the input (length {length})")]
    RetainOutOfBounds {
        start: usize,
        end: usize,
        length: usize,
    },

    /// A revision arrived that is not exactly `current + 1`
    #[error("expected revision {expected}, received {received}")]
    RevisionMismatch { expected: u64, received: u64 },

    /// The server has no log record for a client's base revision
    #[error("no revision record for base revision {0}")]
    UnknownRevision(u64),

    /// The client fell too far behind to repair locally
    #[error("session is stale: {0}")]
    StaleSession(String),

    /// A new submission was readied while one is still unacknowledged
    #[error("a submission is already awaiting acknowledgement")]
    SubmissionPending,

    /// A changeset violates the strip ordering invariants
    #[error("invalid changeset: {0}")]
    InvalidChangeset(String),

    /// Message from an unregistered connection
    #[error("unknown connection {0}")]
    UnknownConnection(uuid::Uuid),

    /// Wire encoding failure
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// Whether the documented recovery for this error is a full resync of the
    /// session, discarding unacknowledged local state.
    pub fn requires_resync(&self) -> bool {
        matches!(
            self,
            SyncError::RevisionMismatch { .. }
                | SyncError::UnknownRevision(_)
                | SyncError::StaleSession(_)
                | SyncError::LengthMismatch { .. }
                | SyncError::RetainOutOfBounds { .. }
        )
    }
}

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = SyncError::RevisionMismatch {
            expected: 4,
            received: 6,
        };
        assert_eq!(err.to_string(), "expected revision 4, received 6");

        let err = SyncError::RetainOutOfBounds {
            start: 2,
            end: 9,
            length: 5,
        };
        assert_eq!(
            err.to_string(),
            "retained range 2..=9 is outside the input (length 5)"
        );
    }

    #[test]
    fn test_requires_resync() {
        assert!(SyncError::UnknownRevision(3).requires_resync());
        assert!(SyncError::StaleSession("gap".to_string()).requires_resync());
        assert!(!SyncError::SubmissionPending.requires_resync());
        assert!(!SyncError::InvalidChangeset("x".to_string()).requires_resync());
    }
}
