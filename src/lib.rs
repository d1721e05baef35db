//! TextSync Core - Operational transformation for collaborative plain text
//!
//! This is the Rust core of TextSync, compiled to both native and WASM.
//! It implements:
//! - Changeset algebra: compose, follow, inverse, swap
//! - Client document state machine with a single in-flight submission
//! - Undo/redo history that is rewritten around concurrent edits
//! - A reference server linearizing edits into a revision log
//! - JSON wire format for changesets and protocol messages
//!
//! # Examples
//!
//! ```rust
//! use textsync_core::{ClientSession, DocumentServer};
//!
//! let mut server = DocumentServer::with_text("hello");
//! let (id, headtext) = server.connect();
//!
//! let mut session = ClientSession::default();
//! session.receive(headtext).unwrap();
//! session.edit(5..5, " world").unwrap();
//!
//! let submission = session.poll_outbound().unwrap().unwrap();
//! for outbound in server.handle_message(id, submission).unwrap() {
//!     session.receive(outbound.message).unwrap();
//! }
//! assert_eq!(server.text(), "hello world");
//! ```

pub mod changeset;
pub mod document;
pub mod error;
pub mod history;
pub mod protocol;
pub mod sync;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-exports for convenience
pub use changeset::{Changeset, RevisionChangeset, Strip, Strips};
pub use document::Document;
pub use error::{Result, SyncError};
pub use history::{History, RebaseOutcome, Selection, SelectionDirection};
pub use protocol::{ClientMessage, ServerMessage};
pub use sync::{ClientSession, DocumentServer, SessionConfig};
