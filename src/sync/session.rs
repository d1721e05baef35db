//! Client session: one editor's view of a shared document
//!
//! Ties the [`Document`] state machine, the undo [`History`] and the caret
//! together, and sequences the messages exchanged with the server. Server
//! messages that arrive ahead of their turn are buffered and applied in
//! revision order.

use super::DEFAULT_MAX_BUFFERED_MESSAGES;
use crate::changeset::{char_len, Changeset};
use crate::document::Document;
use crate::error::{Result, SyncError};
use crate::history::{History, RebaseOutcome, Selection};
use crate::protocol::{ClientMessage, ServerMessage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;
use tracing::{debug, trace, warn};

/// Session tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Out-of-order server messages held before the session is declared
    /// stale
    pub max_buffered_messages: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_buffered_messages: DEFAULT_MAX_BUFFERED_MESSAGES,
        }
    }
}

/// An editor connected to a shared document
#[derive(Debug, Clone)]
pub struct ClientSession {
    document: Document,
    history: History,
    selection: Selection,
    buffered: BTreeMap<u64, ServerMessage>,
    in_flight: bool,
    last_rebase: Option<RebaseOutcome>,
    config: SessionConfig,
}

impl ClientSession {
    /// Session over an empty document at revision 0
    ///
    /// The server's `headtext` brings it up to date.
    pub fn new(config: SessionConfig) -> Self {
        let document = Document::new();
        let history = History::new(document.view().clone());

        Self {
            document,
            history,
            selection: Selection::default(),
            buffered: BTreeMap::new(),
            in_flight: false,
            last_rebase: None,
            config,
        }
    }

    /// Replace `range` with `text` and leave the caret after it
    ///
    /// # Errors
    ///
    /// Returns `SyncError::RetainOutOfBounds` if `range` does not fit the
    /// document.
    pub fn edit(&mut self, range: Range<usize>, text: &str) -> Result<()> {
        let changeset = Changeset::edit(self.document.len(), range.clone(), text)?;
        let after = Selection::caret(range.start + char_len(text));

        self.history
            .push(&mut self.document, &changeset, self.selection, after)?;
        self.selection = after;
        Ok(())
    }

    /// Type `text` over the current selection
    pub fn insert(&mut self, text: &str) -> Result<()> {
        let range = self.selected_range();
        self.edit(range, text)
    }

    /// Delete the selection, or `count` characters before the caret
    pub fn delete_backward(&mut self, count: usize) -> Result<()> {
        let mut range = self.selected_range();
        if range.is_empty() {
            range.start = range.end.saturating_sub(count);
        }
        if range.is_empty() {
            return Ok(());
        }
        self.edit(range, "")
    }

    /// Undo the latest local edit, returning whether there was one
    pub fn undo(&mut self) -> Result<bool> {
        match self.history.undo(&mut self.document)? {
            Some(selection) => {
                self.selection = selection;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Redo the latest undone edit, returning whether there was one
    pub fn redo(&mut self) -> Result<bool> {
        match self.history.redo(&mut self.document)? {
            Some(selection) => {
                self.selection = selection;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn set_selection(&mut self, selection: Selection) {
        let len = self.document.len();
        self.selection = Selection {
            start: selection.start.min(len),
            end: selection.end.min(len),
            direction: selection.direction,
        };
    }

    /// Handle a message from the server
    ///
    /// `headtext` resynchronizes immediately. Other messages are applied in
    /// revision order, buffering any that arrive early; duplicates of
    /// revisions already applied are ignored.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::StaleSession` once the buffer overflows, or the
    /// error of the message that failed to apply. Errors for which
    /// [`SyncError::requires_resync`] holds leave the session waiting for a
    /// fresh `headtext`.
    pub fn receive(&mut self, message: ServerMessage) -> Result<()> {
        let revision = message.revision();

        if let ServerMessage::Headtext(latest) = message {
            self.resync(latest.revision, latest.changeset);
            return self.drain();
        }

        if revision <= self.document.revision() {
            trace!(revision, current = self.document.revision(), "ignoring duplicate message");
            return Ok(());
        }

        self.buffered.insert(revision, message);
        if self.buffered.len() > self.config.max_buffered_messages {
            warn!(
                current = self.document.revision(),
                buffered = self.buffered.len(),
                "revision gap never closed"
            );
            self.buffered.clear();
            return Err(SyncError::StaleSession(format!(
                "more than {} messages buffered after revision {}",
                self.config.max_buffered_messages,
                self.document.revision()
            )));
        }

        self.drain()
    }

    /// Apply buffered messages while the next revision is available
    fn drain(&mut self) -> Result<()> {
        while let Some(entry) = self.buffered.first_entry() {
            let next = self.document.revision() + 1;
            if *entry.key() < next {
                entry.remove();
                continue;
            }
            if *entry.key() > next {
                trace!(waiting_for = next, buffered = self.buffered.len(), "revision gap");
                break;
            }
            let message = entry.remove();
            self.apply(message)?;
        }
        Ok(())
    }

    fn apply(&mut self, message: ServerMessage) -> Result<()> {
        match message {
            ServerMessage::Changes(update) => {
                let view_follow = self
                    .document
                    .handle_other_client_changes(update.revision, &update.changeset)?;
                self.selection = self.selection.follow(&view_follow);

                let outcome = self
                    .history
                    .rebase(&update.changeset, &view_follow, self.document.view());
                self.last_rebase = Some(outcome);
                match outcome {
                    RebaseOutcome::Anchored => {}
                    RebaseOutcome::Realigned => {
                        debug!(revision = update.revision, "history realigned on the view")
                    }
                    RebaseOutcome::Reset => {
                        warn!(revision = update.revision, "history could not be rebased, cleared")
                    }
                }
            }
            ServerMessage::ChangesAcknowledged { revision } => {
                self.document.handle_submitted_changes_acknowledged(revision)?;
                self.history.mark_acknowledged();
                self.in_flight = false;
                debug!(revision, "submission acknowledged");
            }
            ServerMessage::Headtext(latest) => self.resync(latest.revision, latest.changeset),
        }
        Ok(())
    }

    /// Drop all local state in favour of the server's document
    fn resync(&mut self, revision: u64, document: Changeset) {
        debug!(revision, "resynchronizing");
        self.document.handle_server_latest_version(revision, document);
        self.history.reset(self.document.view().clone());
        self.buffered = self.buffered.split_off(&(revision + 1));
        self.in_flight = false;
        self.last_rebase = None;
        self.set_selection(self.selection);
    }

    /// The next message to send, if local edits are waiting and nothing is
    /// in flight
    pub fn poll_outbound(&mut self) -> Result<Option<ClientMessage>> {
        if self.in_flight || !self.document.has_local_changes() {
            return Ok(None);
        }

        let submission = self.document.ready_changes_for_server_submission()?;
        self.history.mark_submitted();
        self.in_flight = true;
        debug!(
            base = submission.revision,
            length = submission.changeset.length(),
            "submitting local changes"
        );

        Ok(Some(ClientMessage::Changes(submission)))
    }

    fn selected_range(&self) -> Range<usize> {
        let Selection { start, end, .. } = self.selection;
        start.min(end)..start.max(end)
    }

    pub fn text(&self) -> String {
        self.document.text()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn revision(&self) -> u64 {
        self.document.revision()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether a submission is awaiting acknowledgement
    pub fn is_waiting_for_ack(&self) -> bool {
        self.in_flight
    }

    pub fn buffered_len(&self) -> usize {
        self.buffered.len()
    }

    /// How the history absorbed the most recent foreign edit
    pub fn last_rebase(&self) -> Option<RebaseOutcome> {
        self.last_rebase
    }
}

impl Default for ClientSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
