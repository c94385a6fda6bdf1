//! Inventory file.
//!
//! ```yaml
//! plugin: nutanix.ncp.ntnx_prism_vm_inventory
//! nutanix_host: pc.lab.example
//! nutanix_username: admin
//! validate_certs: false
//! fetch_all_vms: true
//! filters:
//!   - power_state == 'ON'
//! custom_ansible_host:
//!   expr: "{vm_name}.{cluster_name}.example"
//! keyed_groups:
//!   - key: power_state
//!     prefix: power
//! ```
//!
//! Transport options (`nutanix_host`, `nutanix_port`, credentials, proxy
//! settings, …) are resolved with the same precedence as module parameters.

use std::collections::BTreeMap;
use std::path::Path;

use prism_core::config::EnvSource;
use prism_core::{Error, ListQuery, Result, TransportConfig};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Plugin name of the VM inventory.
pub const VM_PLUGIN: &str = "nutanix.ncp.ntnx_prism_vm_inventory";

/// Plugin name of the host inventory.
pub const HOST_PLUGIN: &str = "nutanix.ncp.ntnx_prism_host_inventory";

/// Which entity type an inventory enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryKind {
    /// AHV virtual machines
    Vms,
    /// Hypervisor hosts
    Hosts,
}

/// Address template for `ansible_host`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CustomAnsibleHost {
    /// Template with `{placeholder}` fragments.
    pub expr: String,
}

fn default_separator() -> String {
    "_".to_string()
}

const fn default_true() -> bool {
    true
}

/// One `keyed_groups` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeyedGroup {
    /// Expression whose value names the group(s).
    pub key: String,
    /// Group name prefix.
    #[serde(default)]
    pub prefix: String,
    /// Separator between prefix and value.
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Value used when the key evaluates to an empty value.
    #[serde(default)]
    pub default_value: Option<String>,
    /// Group the generated groups are nested under.
    #[serde(default)]
    pub parent_group: Option<String>,
    /// Keep the separator when the value is empty.
    #[serde(default = "default_true")]
    pub trailing_separator: bool,
    /// Keep the separator when the prefix is empty.
    #[serde(default = "default_true")]
    pub leading_separator: bool,
}

/// Parsed inventory file.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryConfig {
    /// Plugin name.
    pub plugin: String,
    /// Enumerate every VM instead of one page.
    #[serde(default)]
    pub fetch_all_vms: bool,
    /// Enumerate every host instead of one page.
    #[serde(default)]
    pub fetch_all_hosts: bool,
    /// Page index for bounded listing.
    #[serde(default)]
    pub page: Option<u32>,
    /// Page size for bounded listing.
    #[serde(default)]
    pub limit: Option<u32>,
    /// Server-side filter expression.
    #[serde(default)]
    pub filter: Option<String>,
    /// Client-side expressions; a host is kept when all are true.
    #[serde(default)]
    pub filters: Vec<String>,
    /// `ansible_host` template.
    #[serde(default)]
    pub custom_ansible_host: Option<CustomAnsibleHost>,
    /// Treat expression failures as fatal.
    #[serde(default)]
    pub strict: bool,
    /// Host variables computed from expressions.
    #[serde(default)]
    pub compose: BTreeMap<String, String>,
    /// Groups whose membership is an expression.
    #[serde(default)]
    pub groups: BTreeMap<String, String>,
    /// Groups named after expression values.
    #[serde(default)]
    pub keyed_groups: Vec<KeyedGroup>,
    /// Remaining keys: transport options.
    #[serde(flatten)]
    pub transport: Map<String, Value>,
}

impl InventoryConfig {
    /// Parses an inventory document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for malformed YAML or an unknown plugin.
    pub fn from_yaml(source: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(source)
            .map_err(|e| Error::InvalidConfig(format!("invalid inventory file: {e}")))?;
        config.kind()?;
        Ok(config)
    }

    /// Reads and parses an inventory file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!("cannot read inventory file {}: {e}", path.display()))
        })?;
        Self::from_yaml(&source)
    }

    /// Inventory kind selected by the plugin name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for an unknown plugin.
    pub fn kind(&self) -> Result<InventoryKind> {
        let name = self.plugin.rsplit('.').next().unwrap_or_default();
        match name {
            "ntnx_prism_vm_inventory" => Ok(InventoryKind::Vms),
            "ntnx_prism_host_inventory" => Ok(InventoryKind::Hosts),
            _ => Err(Error::InvalidConfig(format!(
                "unknown inventory plugin `{}`, expected {VM_PLUGIN} or {HOST_PLUGIN}",
                self.plugin
            ))),
        }
    }

    /// Whether every page is fetched for the configured kind.
    #[must_use]
    pub fn fetch_all(&self) -> bool {
        match self.kind() {
            Ok(InventoryKind::Hosts) => self.fetch_all_hosts,
            _ => self.fetch_all_vms,
        }
    }

    /// Listing query for the server side.
    #[must_use]
    pub fn query(&self) -> ListQuery {
        let mut query = ListQuery::new();
        if let Some(filter) = &self.filter {
            query = query.with_filter(filter.clone());
        }
        if !self.fetch_all() {
            query.page = self.page;
            query.limit = self.limit;
        }
        query
    }

    /// Resolves the transport options against `env`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] as for module parameters.
    pub fn transport<E: EnvSource + ?Sized>(&self, env: &E) -> Result<TransportConfig> {
        TransportConfig::resolve(&self.transport, env)
    }
}
