//! Cluster and host client and data models for Nutanix Prism Central.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::{ClustersClient, ClustersClientBuilder};
pub use models::{
    AddressValue, Cluster, ClusterConfig, ClusterNetwork, Host, HostCluster, HostEndpoint,
    IpAddressOrFqdn,
};

/// Convenient result alias that reuses the shared Prism error type.
pub type Result<T> = prism_core::Result<T>;
