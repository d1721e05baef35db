mod server;
/// Synchronization between editors and the server
///
/// Client side, a [`ClientSession`] owns a document, its undo history and
/// the caret, produces `changes` submissions and consumes server messages.
/// Server side, a [`DocumentServer`] linearizes submissions into a revision
/// log and fans the results out.
///
/// Key properties:
/// - At most one submission per client is in flight
/// - Revisions are applied strictly in order, early messages are buffered
/// - Every client converges on the server's text once messages drain
mod session;

pub use server::{DocumentServer, Outbound};
pub use session::{ClientSession, SessionConfig};

/// Default bound on out-of-order server messages a session will hold
pub const DEFAULT_MAX_BUFFERED_MESSAGES: usize = 256;
