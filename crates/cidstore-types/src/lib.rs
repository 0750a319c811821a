//! Foundation types for cidstore.
//!
//! Every other cidstore crate depends on `cidstore-types`.
//!
//! # Key Types
//!
//! - [`ContentKey`] — Printable key, usually the BLAKE3 digest of the value it names
//! - [`CollectionName`] — Validated table identifier safe to splice into DDL
//! - [`OpContext`] — Deadline and cancellation carried by every store operation

pub mod collection;
pub mod context;
pub mod error;
pub mod key;

pub use collection::CollectionName;
pub use context::OpContext;
pub use error::{ContextError, TypeError};
pub use key::ContentKey;
