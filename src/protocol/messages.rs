//! Messages exchanged between clients and the server
//!
//! Every message is a JSON object `{"type": ..., "payload": ...}`.

use crate::changeset::RevisionChangeset;
use serde::{Deserialize, Serialize};

/// Client to server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Local edits made against base revision `revision`
    Changes(RevisionChangeset),
}

/// Server to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// The full document at `revision`, sent on connect
    Headtext(RevisionChangeset),

    /// Another client's edit, confirmed as `revision`
    Changes(RevisionChangeset),

    /// The receiver's own submission, confirmed as `revision`
    ChangesAcknowledged { revision: u64 },
}

impl ServerMessage {
    /// Revision this message brings the receiver to
    pub fn revision(&self) -> u64 {
        match self {
            ServerMessage::Headtext(update) | ServerMessage::Changes(update) => update.revision,
            ServerMessage::ChangesAcknowledged { revision } => *revision,
        }
    }
}
