//! Declarative operations over Nutanix Prism Central resources.
//!
//! An operation takes the parameters of one automation task, drives the
//! read/compare/write cycle against Prism Central and reports a single
//! [`OperationResult`]. Errors never escape a module run; they are reported as
//! `failed: true` with a `CODE: message` error string.

#![deny(missing_docs)]

pub mod catalog;
pub mod envelope;
pub mod info;
pub mod module;
pub mod params;

pub use catalog::Resource;
pub use envelope::{shape_response, OperationResult, State};
pub use info::InfoModule;
pub use module::EntityModule;
pub use params::Params;

/// Convenient result alias that reuses the shared Prism error type.
pub type Result<T> = prism_core::Result<T>;
