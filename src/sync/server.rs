//! Reference document server
//!
//! Linearizes concurrent submissions into a single revision log. A
//! submission made against an older revision is followed through every
//! record appended since, then appended itself. Messages are processed one
//! at a time; there is no persistence.
use crate::changeset::{Changeset, RevisionChangeset};
use crate::error::{Result, SyncError};
use crate::protocol::{ClientMessage, ServerMessage};
use std::collections::BTreeSet;
use tracing::{debug, trace};
use uuid::Uuid;

/// A message addressed to one connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub to: Uuid,
    pub message: ServerMessage,
}

/// In-memory revision log for one document
#[derive(Debug, Clone)]
pub struct DocumentServer {
    /// Record `n` turns revision `n - 1` into revision `n`; record 0 is the
    /// empty document
    log: Vec<RevisionChangeset>,
    head: Changeset,
    connections: BTreeSet<Uuid>,
}

impl DocumentServer {
    pub fn new() -> Self {
        Self {
            log: vec![RevisionChangeset::new(0, Changeset::empty())],
            head: Changeset::empty(),
            connections: BTreeSet::new(),
        }
    }

    /// Server whose revision 1 holds `text`
    pub fn with_text(text: &str) -> Self {
        let mut server = Self::new();
        let document = Changeset::from_text(text);
        server.head = document.clone();
        server.log.push(RevisionChangeset::new(1, document));
        server
    }

    /// Register a new connection
    ///
    /// Returns its id and the `headtext` message to send it.
    pub fn connect(&mut self) -> (Uuid, ServerMessage) {
        let id = Uuid::new_v4();
        self.connections.insert(id);
        debug!(%id, revision = self.revision(), "client connected");

        (id, self.headtext())
    }

    /// Forget a connection, returning whether it was registered
    pub fn disconnect(&mut self, id: &Uuid) -> bool {
        let removed = self.connections.remove(id);
        if removed {
            debug!(%id, "client disconnected");
        }
        removed
    }

    /// The full document at the latest revision
    pub fn headtext(&self) -> ServerMessage {
        ServerMessage::Headtext(RevisionChangeset::new(self.revision(), self.head.clone()))
    }

    /// Latest revision in the log
    pub fn revision(&self) -> u64 {
        self.log.last().map(|record| record.revision).unwrap_or(0)
    }

    pub fn head(&self) -> &Changeset {
        &self.head
    }

    pub fn text(&self) -> String {
        self.head.text()
    }

    pub fn log(&self) -> &[RevisionChangeset] {
        &self.log
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Append a submission made against `submission.revision`
    ///
    /// Returns the record as it was appended to the log.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::UnknownRevision` if the base revision is not in
    /// the log, or a length error if the changeset does not fit the
    /// document at that revision.
    pub fn submit(&mut self, submission: RevisionChangeset) -> Result<RevisionChangeset> {
        let base = submission.revision;
        let index = usize::try_from(base)
            .ok()
            .filter(|index| *index < self.log.len())
            .ok_or(SyncError::UnknownRevision(base))?;

        let base_length = self.log[index].changeset.length();
        if submission.changeset.required_length() > base_length {
            return Err(SyncError::LengthMismatch {
                required: submission.changeset.required_length(),
                actual: base_length,
            });
        }

        let mut changeset = submission.changeset;
        for record in &self.log[index + 1..] {
            changeset = record.changeset.follow(&changeset);
        }

        self.head = self.head.compose(&changeset)?;
        let record = RevisionChangeset::new(self.revision() + 1, changeset);
        self.log.push(record.clone());

        debug!(
            base,
            revision = record.revision,
            transformed = self.log.len() - index - 2,
            "accepted submission"
        );
        Ok(record)
    }

    /// Process one client message and return what to send in response
    ///
    /// The submitter gets `changes-acknowledged`, every other connection
    /// gets the transformed `changes`.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::UnknownConnection` for unregistered senders, and
    /// anything [`DocumentServer::submit`] rejects.
    pub fn handle_message(&mut self, from: Uuid, message: ClientMessage) -> Result<Vec<Outbound>> {
        if !self.connections.contains(&from) {
            return Err(SyncError::UnknownConnection(from));
        }

        match message {
            ClientMessage::Changes(submission) => {
                let record = self.submit(submission)?;
                let mut outbound = Vec::with_capacity(self.connections.len());

                for &to in &self.connections {
                    let message = if to == from {
                        ServerMessage::ChangesAcknowledged {
                            revision: record.revision,
                        }
                    } else {
                        ServerMessage::Changes(record.clone())
                    };
                    outbound.push(Outbound { to, message });
                }

                trace!(%from, revision = record.revision, recipients = outbound.len(), "broadcast");
                Ok(outbound)
            }
        }
    }
}

impl Default for DocumentServer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changeset::Strip;

    #[test]
    fn test_connect_sends_headtext() {
        let mut server = DocumentServer::with_text("hello");
        let (id, message) = server.connect();

        assert_eq!(server.connection_count(), 1);
        match message {
            ServerMessage::Headtext(update) => {
                assert_eq!(update.revision, 1);
                assert_eq!(update.changeset.text(), "hello");
            }
            other => panic!("Expected Headtext, got {:?}", other),
        }

        assert!(server.disconnect(&id));
        assert!(!server.disconnect(&id));
    }

    #[test]
    fn test_submit_at_head() {
        let mut server = DocumentServer::with_text("hello");
        let edit = Changeset::new(vec![Strip::retain(0, 4), Strip::insert(" world")]);

        let record = server.submit(RevisionChangeset::new(1, edit.clone())).unwrap();
        assert_eq!(record.revision, 2);
        assert_eq!(record.changeset, edit);
        assert_eq!(server.text(), "hello world");
    }

    #[test]
    fn test_submit_against_old_revision() {
        let mut server = DocumentServer::with_text("baseball");
        let basil = Changeset::new(vec![Strip::retain(0, 1), Strip::insert("si"), Strip::retain(7, 7)]);
        let below = Changeset::new(vec![
            Strip::retain(0, 0),
            Strip::insert("e"),
            Strip::retain(6, 6),
            Strip::insert("ow"),
        ]);

        server.submit(RevisionChangeset::new(1, basil)).unwrap();
        let record = server.submit(RevisionChangeset::new(1, below)).unwrap();

        assert_eq!(record.revision, 3);
        assert_eq!(server.text(), "besiow");
        assert_eq!(server.log().len(), 4);
    }

    #[test]
    fn test_submit_unknown_revision() {
        let mut server = DocumentServer::new();
        match server.submit(RevisionChangeset::new(5, Changeset::from_text("x"))) {
            Err(SyncError::UnknownRevision(5)) => {}
            other => panic!("Expected UnknownRevision, got {:?}", other),
        }
        assert_eq!(server.revision(), 0);
    }

    #[test]
    fn test_submit_too_long_for_base() {
        let mut server = DocumentServer::with_text("ab");
        let edit = Changeset::new(vec![Strip::retain(0, 5)]);
        assert!(server.submit(RevisionChangeset::new(1, edit)).is_err());
        assert_eq!(server.revision(), 1);
    }

    #[test]
    fn test_handle_message_routes_ack_and_broadcast() {
        let mut server = DocumentServer::new();
        let (alice, _) = server.connect();
        let (bob, _) = server.connect();

        let message = ClientMessage::Changes(RevisionChangeset::new(0, Changeset::from_text("hi")));
        let outbound = server.handle_message(alice, message).unwrap();

        assert_eq!(outbound.len(), 2);
        for Outbound { to, message } in outbound {
            if to == alice {
                assert_eq!(message, ServerMessage::ChangesAcknowledged { revision: 1 });
            } else {
                assert_eq!(to, bob);
                assert_eq!(message.revision(), 1);
                assert!(matches!(message, ServerMessage::Changes(_)));
            }
        }
    }

    #[test]
    fn test_handle_message_unknown_connection() {
        let mut server = DocumentServer::new();
        let stranger = Uuid::new_v4();
        let message = ClientMessage::Changes(RevisionChangeset::new(0, Changeset::from_text("x")));

        match server.handle_message(stranger, message) {
            Err(SyncError::UnknownConnection(id)) => assert_eq!(id, stranger),
            other => panic!("Expected UnknownConnection, got {:?}", other),
        }
    }
}
