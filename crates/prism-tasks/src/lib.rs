//! Task orchestration for Nutanix Prism Central.
//!
//! Most mutating v4 calls answer with a task reference. This crate reads task
//! records, polls them to a terminal state with a bounded wait and picks the
//! affected entity a caller is interested in.

#![deny(missing_docs)]

pub mod client;
pub mod models;
pub mod relations;
pub mod wait;

pub use client::{TasksClient, TasksClientBuilder};
pub use models::{EntityReference, Task, TaskLink, TaskMessage, TaskStatus};
pub use relations::{affected_entity_ext_id, created_ext_id, RELATION_TAGS};
pub use wait::{TaskSource, TaskWaiter, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};

/// Convenient result alias that reuses the shared Prism error type.
pub type Result<T> = prism_core::Result<T>;
