//! Changeset algebra for plain-text operational transformation
//!
//! A [`Changeset`] describes how to build a new document from an old one, as
//! an ordered run of [`Strip`]s: ranges kept from the old document and
//! literal text inserted between them. A document is itself a changeset
//! applied to the empty document.
//!
//! # Operations
//!
//! - **compose:** apply one changeset after another
//! - **follow:** rebase a concurrent changeset so both orders converge
//! - **inverse:** undo a changeset given the document it applied to
//! - **swap:** reorder two consecutive changesets
//!
//! # Example
//!
//! ```rust
//! use textsync_core::changeset::{Changeset, Strip};
//!
//! let document = Changeset::from_text("hello");
//! let edit = Changeset::new(vec![Strip::retain(0, 4), Strip::insert(" world")]);
//!
//! assert_eq!(document.compose(&edit).unwrap().text(), "hello world");
//! ```
//!
//! # References
//!
//! - "Easysync technical manual" (Etherpad)
//! - Ellis & Gibbs, "Concurrency control in groupware systems" (1989)

mod algebra;
mod revision;
mod strip;
mod strips;
mod transform;

pub use algebra::Changeset;
pub use revision::RevisionChangeset;
pub use strip::Strip;
pub use strips::Strips;
pub use transform::insertion_order;

pub(crate) use strip::char_len;
