//! Inventory construction.

use std::collections::HashMap;

use prism_clusters::ClustersClient;
use prism_core::{ClientFactory, Error, Result};
use prism_vmm::VmmClient;
use serde_json::Value;
use tracing::{debug, info};

use crate::address::{self, HOST_PLACEHOLDERS, VM_PLACEHOLDERS};
use crate::compose::Composer;
use crate::config::{InventoryConfig, InventoryKind};
use crate::evaluator::{ExpressionEvaluator, JinjaEvaluator};
use crate::hostvars::{self, HostRecord};
use crate::inventory::{Inventory, ROOT_GROUP};

/// Group of the hosts of a cluster: `cluster_` plus the ext id with `-`
/// replaced by `_`.
fn cluster_group(ext_id: &str) -> String {
    format!("cluster_{}", ext_id.replace('-', "_"))
}

/// Builds an [`Inventory`] from Prism Central according to an inventory file.
pub struct InventoryEngine {
    config: InventoryConfig,
    evaluator: Box<dyn ExpressionEvaluator>,
}

impl InventoryEngine {
    /// Create an engine using the Jinja evaluator.
    #[must_use]
    pub fn new(config: InventoryConfig) -> Self {
        Self {
            config,
            evaluator: Box::new(JinjaEvaluator::new()),
        }
    }

    /// Replace the expression evaluator.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: Box<dyn ExpressionEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// The inventory configuration.
    #[must_use]
    pub const fn config(&self) -> &InventoryConfig {
        &self.config
    }

    /// Fetches entities and builds the inventory.
    ///
    /// # Errors
    ///
    /// Returns transport and remote errors, and in strict mode any
    /// expression or address template failure.
    pub async fn build(&self, factory: &ClientFactory) -> Result<Inventory> {
        let kind = self.config.kind()?;
        let records = match kind {
            InventoryKind::Vms => self.vm_records(factory).await?,
            InventoryKind::Hosts => self.host_records(factory).await?,
        };

        let mut inventory = Inventory::new();
        for record in records {
            self.place(kind, record, &mut inventory)?;
        }
        info!(hosts = inventory.len(), ?kind, "inventory built");
        Ok(inventory)
    }

    async fn vm_records(&self, factory: &ClientFactory) -> Result<Vec<HostRecord>> {
        let vmm = VmmClient::from_factory(factory)?;
        let cluster_names = ClustersClient::from_factory(factory)?.cluster_names().await?;
        let query = self.config.query();
        let vms = if self.config.fetch_all_vms {
            vmm.list_all_vms(&query).await?
        } else {
            vmm.list_vms(&query).await?.data
        };
        debug!(count = vms.len(), "fetched VMs");
        vms.iter()
            .filter_map(|vm| hostvars::vm_record(vm, &cluster_names).transpose())
            .collect()
    }

    async fn host_records(&self, factory: &ClientFactory) -> Result<Vec<HostRecord>> {
        let clusters = ClustersClient::from_factory(factory)?;
        let query = self.config.query();
        let hosts = if self.config.fetch_all_hosts {
            clusters.list_all_hosts(&query).await?
        } else {
            clusters.list_hosts(&query).await?.data
        };
        debug!(count = hosts.len(), "fetched hosts");

        let cluster_names = if hosts
            .iter()
            .any(|h| h.cluster_ext_id().is_some() && h.cluster_name().is_none())
        {
            clusters.cluster_names().await?
        } else {
            HashMap::new()
        };
        hosts
            .iter()
            .filter_map(|host| hostvars::host_record(host, &cluster_names).transpose())
            .collect()
    }

    fn place(&self, kind: InventoryKind, mut record: HostRecord, inventory: &mut Inventory) -> Result<()> {
        let strict = self.config.strict;

        if let Some(custom) = &self.config.custom_ansible_host {
            let allowed = match kind {
                InventoryKind::Vms => VM_PLACEHOLDERS,
                InventoryKind::Hosts => HOST_PLACEHOLDERS,
            };
            match address::render(&custom.expr, allowed, &record.placeholders)? {
                Some(host) => {
                    record
                        .vars
                        .insert("ansible_host".to_string(), Value::String(host));
                }
                None if strict => {
                    return Err(Error::TemplateError(format!(
                        "`{}` resolved to an empty address for host {}",
                        custom.expr, record.name
                    )));
                }
                None => {
                    debug!(host = %record.name, "dropping host with an empty custom address");
                    return Ok(());
                }
            }
        }

        for expr in &self.config.filters {
            match self.evaluator.is_true(expr, &record.vars) {
                Ok(true) => {}
                Ok(false) => {
                    debug!(host = %record.name, filter = %expr, "filtered out");
                    return Ok(());
                }
                Err(err) if strict => return Err(err),
                Err(err) => {
                    debug!(host = %record.name, filter = %expr, error = %err, "filter failed, dropping host");
                    return Ok(());
                }
            }
        }

        let composer = Composer::new(self.evaluator.as_ref(), strict);
        composer.compose(&record.name, &mut record.vars, &self.config.compose)?;

        let name = record.name;
        let group = record
            .cluster_ext_id
            .as_deref()
            .map_or_else(|| ROOT_GROUP.to_string(), cluster_group);
        inventory.add_host_to_group(&group, &name);

        composer.conditional_groups(&name, &record.vars, &self.config.groups, inventory)?;
        composer.keyed_groups(&name, &record.vars, &self.config.keyed_groups, inventory)?;

        if inventory.add_host(name.clone(), record.vars) {
            debug!(host = %name, "duplicate host name, keeping the last record");
        }
        Ok(())
    }
}
