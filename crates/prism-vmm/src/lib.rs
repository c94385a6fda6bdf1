//! AHV virtual machine client and data models for Nutanix Prism Central.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::{VmmClient, VmmClientBuilder};
pub use models::{
    IpAddress, Ipv4Config, LearnedAddresses, Nic, NicBackingInfo, NicNetworkInfo, PowerState,
    Reference, Vm, NORMAL_NIC,
};

/// Convenient result alias that reuses the shared Prism error type.
pub type Result<T> = prism_core::Result<T>;
