//! Dynamic Ansible inventory for Nutanix Prism Central.
//!
//! Enumerates AHV VMs or hypervisor hosts, turns each into a host with its
//! variables, applies client-side filters and builds groups per cluster plus
//! any `compose`, `groups` and `keyed_groups` the inventory file defines.

#![deny(missing_docs)]

pub mod address;
pub mod compose;
pub mod config;
pub mod engine;
pub mod evaluator;
pub mod hostvars;
pub mod inventory;

pub use compose::{sanitize_group_name, Composer};
pub use config::{CustomAnsibleHost, InventoryConfig, InventoryKind, KeyedGroup, HOST_PLUGIN, VM_PLUGIN};
pub use engine::InventoryEngine;
pub use evaluator::{ExpressionEvaluator, JinjaEvaluator};
pub use hostvars::HostRecord;
pub use inventory::{Group, Inventory, ROOT_GROUP};

/// Convenient result alias that reuses the shared Prism error type.
pub type Result<T> = prism_core::Result<T>;
