//! Wire protocol
//!
//! Transport-agnostic JSON shapes for changesets and the three message
//! kinds a text session needs. Transports are expected to deliver messages
//! reliably and in order per connection; the session still tolerates
//! reordering within a bounded window.
//!
//! # Example
//!
//! ```rust
//! use textsync_core::protocol::{decode_server_message, ServerMessage};
//!
//! let message = decode_server_message(r#"{"type":"changes-acknowledged","payload":{"revision":4}}"#).unwrap();
//! assert_eq!(message, ServerMessage::ChangesAcknowledged { revision: 4 });
//! ```

pub mod messages;
pub mod serialize;

pub use messages::{ClientMessage, ServerMessage};
pub use serialize::{
    decode_client_message, decode_server_message, deserialize_changeset, encode_message,
    serialize_changeset,
};
