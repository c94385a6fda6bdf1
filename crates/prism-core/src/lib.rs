//! # prism-core
//!
//! Core types and utilities for automating Nutanix Prism Central.
//!
//! This crate provides the transport configuration, error handling, HTTP client
//! plumbing and response shaping shared by every Prism Central integration.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and HTTP status code mapping
//! - [`ids`] - Strongly-typed external identifiers for Prism resources
//! - [`types`] - Service tags and resource kinds exposed by Prism Central
//! - [`config`] - Transport configuration and parameter/environment resolution
//! - [`client`] - Instrumented per-service HTTP client
//! - [`factory`] - Capability registry and client factory
//! - [`entity`] - Uniform get/list/create/update/delete client for any resource kind
//! - [`observe`] - Request/response logging interceptor with header redaction
//! - [`etag`] - Optimistic concurrency helpers
//! - [`query`] - List query parameters
//! - [`pagination`] - Single-page and full-enumeration list fetching
//! - [`shaper`] - Stripping of server-internal attributes from response trees
//! - [`case`] - snake_case / camelCase key conversion

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod case;
pub mod client;
pub mod config;
pub mod entity;
pub mod error;
pub mod etag;
pub mod factory;
pub mod ids;
pub mod observe;
pub mod pagination;
pub mod query;
pub mod shaper;
pub mod types;

// Re-export commonly used types
pub use client::{ApiResponse, ServiceClient};
pub use config::TransportConfig;
pub use entity::EntityClient;
pub use error::{Error, Result};
pub use factory::{ClientFactory, ServiceRegistry};
pub use query::ListQuery;
pub use types::{PrismService, ResourceKind};
