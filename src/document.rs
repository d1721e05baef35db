//! Client-side document state machine
//!
//! A client tracks its document as three layers stacked on top of each
//! other:
//!
//! - **server_confirmed:** the document at the last revision the server
//!   confirmed
//! - **submitted:** the edit sent to the server and not yet acknowledged
//! - **local:** edits made since the last submission
//!
//! The text shown to the user is `view = server_confirmed ∘ submitted ∘
//! local`. At most one submission is in flight at a time.
//!
//! # Example
//!
//! ```rust
//! use textsync_core::{Changeset, Document};
//!
//! let mut document = Document::new();
//! document.compose_local_change(&Changeset::edit(0, 0..0, "hi").unwrap()).unwrap();
//!
//! let outgoing = document.ready_changes_for_server_submission().unwrap();
//! assert_eq!(outgoing.revision, 0);
//!
//! document.handle_submitted_changes_acknowledged(1).unwrap();
//! assert_eq!(document.text(), "hi");
//! assert_eq!(document.revision(), 1);
//! ```

use crate::changeset::{Changeset, RevisionChangeset};
use crate::error::{Result, SyncError};

/// Per-client synchronization state for one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    server_confirmed: Changeset,
    submitted: Changeset,
    local: Changeset,
    view: Changeset,
    revision: u64,
}

impl Document {
    /// Empty document at revision 0
    pub fn new() -> Self {
        Self::from_revision(0, Changeset::empty())
    }

    /// Document the server reported as its latest version
    pub fn from_revision(revision: u64, document: Changeset) -> Self {
        Self {
            submitted: document.identity(),
            local: document.identity(),
            view: document.clone(),
            server_confirmed: document,
            revision,
        }
    }

    /// Apply an edit made by the user
    ///
    /// # Errors
    ///
    /// Returns `SyncError::LengthMismatch` if the edit does not fit the
    /// current view. The document is unchanged on error.
    pub fn compose_local_change(&mut self, change: &Changeset) -> Result<()> {
        let local = self.local.compose(change)?;
        let view = self.view.compose(change)?;

        self.local = local;
        self.view = view;
        Ok(())
    }

    /// Move local edits into the submitted slot and return them, tagged with
    /// the revision they were made against
    ///
    /// # Errors
    ///
    /// Returns `SyncError::SubmissionPending` while an earlier submission is
    /// still unacknowledged.
    pub fn ready_changes_for_server_submission(&mut self) -> Result<RevisionChangeset> {
        if !self.submitted.is_identity_for(&self.server_confirmed) {
            return Err(SyncError::SubmissionPending);
        }

        let identity = self.local.identity();
        self.submitted = std::mem::replace(&mut self.local, identity);

        Ok(RevisionChangeset::new(self.revision, self.submitted.clone()))
    }

    /// The server accepted our submission as revision `revision`
    ///
    /// # Errors
    ///
    /// Returns `SyncError::RevisionMismatch` unless `revision` is exactly one
    /// past the current revision.
    pub fn handle_submitted_changes_acknowledged(&mut self, revision: u64) -> Result<()> {
        self.check_next_revision(revision)?;

        let server_confirmed = self.server_confirmed.compose(&self.submitted)?;
        self.submitted = server_confirmed.identity();
        self.server_confirmed = server_confirmed;
        self.revision = revision;
        Ok(())
    }

    /// Another client's edit was confirmed by the server as `revision`
    ///
    /// The in-flight submission and the local edits are rebased over it.
    /// Returns the changeset that carries the previous view onto the new
    /// one, for mapping carets and history.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::RevisionMismatch` on a revision gap, or a length
    /// error if `other` does not apply to the confirmed document. The
    /// document is unchanged on error.
    pub fn handle_other_client_changes(
        &mut self,
        revision: u64,
        other: &Changeset,
    ) -> Result<Changeset> {
        self.check_next_revision(revision)?;

        let server_confirmed = self.server_confirmed.compose(other)?;
        let other_after_submitted = self.submitted.follow(other);
        let submitted = other.follow(&self.submitted);
        let local = other_after_submitted.follow(&self.local);
        let view_follow = self.local.follow(&other_after_submitted);
        let view = server_confirmed.compose(&submitted)?.compose(&local)?;

        self.server_confirmed = server_confirmed;
        self.submitted = submitted;
        self.local = local;
        self.view = view;
        self.revision = revision;

        Ok(view_follow)
    }

    /// Replace the whole state with the server's latest version
    ///
    /// Unsubmitted and unacknowledged edits are discarded.
    pub fn handle_server_latest_version(&mut self, revision: u64, document: Changeset) {
        *self = Self::from_revision(revision, document);
    }

    fn check_next_revision(&self, revision: u64) -> Result<()> {
        let expected = self.revision + 1;
        if revision != expected {
            return Err(SyncError::RevisionMismatch {
                expected,
                received: revision,
            });
        }
        Ok(())
    }

    /// Text as currently shown to the user
    pub fn text(&self) -> String {
        self.view.text()
    }

    /// Number of characters in the view
    pub fn len(&self) -> usize {
        self.view.length()
    }

    pub fn is_empty(&self) -> bool {
        self.view.length() == 0
    }

    pub fn view(&self) -> &Changeset {
        &self.view
    }

    pub fn server_confirmed(&self) -> &Changeset {
        &self.server_confirmed
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether there are edits that have not been submitted yet
    pub fn has_local_changes(&self) -> bool {
        self.server_confirmed
            .compose(&self.submitted)
            .map(|base| !self.local.is_identity_for(&base))
            .unwrap_or(true)
    }

    /// Whether a submission is awaiting acknowledgement
    pub fn has_submitted_changes(&self) -> bool {
        !self.submitted.is_identity_for(&self.server_confirmed)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changeset::Strip;

    fn typed(document: &Document, at: usize, text: &str) -> Changeset {
        Changeset::edit(document.len(), at..at, text).unwrap()
    }

    #[test]
    fn test_new_document() {
        let document = Document::new();
        assert_eq!(document.text(), "");
        assert_eq!(document.revision(), 0);
        assert!(!document.has_local_changes());
        assert!(!document.has_submitted_changes());
    }

    #[test]
    fn test_local_changes_update_view() {
        let mut document = Document::new();
        document.compose_local_change(&typed(&document, 0, "hello")).unwrap();
        document.compose_local_change(&typed(&document, 5, "!")).unwrap();

        assert_eq!(document.text(), "hello!");
        assert!(document.has_local_changes());
        assert_eq!(document.server_confirmed().text(), "");
    }

    #[test]
    fn test_local_change_too_long_is_rejected() {
        let mut document = Document::from_revision(3, Changeset::from_text("abc"));
        let edit = Changeset::new(vec![Strip::retain(0, 7)]);

        assert!(document.compose_local_change(&edit).is_err());
        assert_eq!(document.text(), "abc");
    }

    #[test]
    fn test_submit_and_acknowledge() {
        let mut document = Document::new();
        document.compose_local_change(&typed(&document, 0, "abc")).unwrap();

        let outgoing = document.ready_changes_for_server_submission().unwrap();
        assert_eq!(outgoing.revision, 0);
        assert_eq!(outgoing.changeset.text(), "abc");
        assert!(!document.has_local_changes());
        assert!(document.has_submitted_changes());

        document.handle_submitted_changes_acknowledged(1).unwrap();
        assert_eq!(document.revision(), 1);
        assert_eq!(document.server_confirmed().text(), "abc");
        assert!(!document.has_submitted_changes());
        assert_eq!(document.text(), "abc");
    }

    #[test]
    fn test_second_submission_is_pending() {
        let mut document = Document::new();
        document.compose_local_change(&typed(&document, 0, "a")).unwrap();
        document.ready_changes_for_server_submission().unwrap();
        document.compose_local_change(&typed(&document, 1, "b")).unwrap();

        match document.ready_changes_for_server_submission() {
            Err(SyncError::SubmissionPending) => {}
            other => panic!("Expected SubmissionPending, got {:?}", other),
        }
        assert_eq!(document.text(), "ab");
    }

    #[test]
    fn test_acknowledge_revision_gap() {
        let mut document = Document::new();
        document.compose_local_change(&typed(&document, 0, "a")).unwrap();
        document.ready_changes_for_server_submission().unwrap();

        match document.handle_submitted_changes_acknowledged(3) {
            Err(SyncError::RevisionMismatch { expected, received }) => {
                assert_eq!((expected, received), (1, 3));
            }
            other => panic!("Expected RevisionMismatch, got {:?}", other),
        }
        assert_eq!(document.revision(), 0);
    }

    #[test]
    fn test_other_client_changes_rebase_pending_edits() {
        // Confirmed "baseball"; we have "basil" in flight and append "!" locally
        let mut document = Document::from_revision(1, Changeset::from_text("baseball"));
        let basil = Changeset::new(vec![Strip::retain(0, 1), Strip::insert("si"), Strip::retain(7, 7)]);
        document.compose_local_change(&basil).unwrap();
        document.ready_changes_for_server_submission().unwrap();
        document.compose_local_change(&typed(&document, 5, "!")).unwrap();
        assert_eq!(document.text(), "basil!");

        let below = Changeset::new(vec![
            Strip::retain(0, 0),
            Strip::insert("e"),
            Strip::retain(6, 6),
            Strip::insert("ow"),
        ]);
        let view_follow = document.handle_other_client_changes(2, &below).unwrap();

        assert_eq!(document.revision(), 2);
        assert_eq!(document.server_confirmed().text(), "below");
        assert_eq!(document.text(), "besiow!");
        assert_eq!(view_follow.apply("basil!").unwrap(), "besiow!");

        // Our submission lands on top of "below"
        document.handle_submitted_changes_acknowledged(3).unwrap();
        assert_eq!(document.server_confirmed().text(), "besiow");
        assert_eq!(document.text(), "besiow!");
    }

    #[test]
    fn test_other_client_changes_rejects_bad_length() {
        let mut document = Document::from_revision(1, Changeset::from_text("ab"));
        let other = Changeset::new(vec![Strip::retain(0, 5)]);

        assert!(document.handle_other_client_changes(2, &other).is_err());
        assert_eq!(document.revision(), 1);
        assert_eq!(document.text(), "ab");
    }

    #[test]
    fn test_server_latest_version_resets() {
        let mut document = Document::new();
        document.compose_local_change(&typed(&document, 0, "draft")).unwrap();

        document.handle_server_latest_version(7, Changeset::from_text("fresh"));
        assert_eq!(document.revision(), 7);
        assert_eq!(document.text(), "fresh");
        assert!(!document.has_local_changes());
        assert!(!document.has_submitted_changes());
    }
}
