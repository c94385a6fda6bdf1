//! Request body generation and idempotency checks for Prism Central resources.
//!
//! Resources describe their parameters as [`Schema`] tables. The generator
//! merges caller parameters into a base tree, and the idempotency check decides
//! whether the merged tree differs from what the server already holds.

#![deny(missing_docs)]

pub mod generator;
pub mod idempotency;
pub mod info;
pub mod schema;

pub use generator::build_spec;
pub use idempotency::{check, supplied_secrets, Decision};
pub use info::info_query;
pub use schema::{Field, FieldKind, Schema, Variant};

/// Convenient result alias that reuses the shared Prism error type.
pub type Result<T> = prism_core::Result<T>;
