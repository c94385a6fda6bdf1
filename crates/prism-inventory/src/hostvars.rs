//! Host variable maps built from VM and host records.
//!
//! Every non-empty attribute is copied with snake_case keys, internal keys
//! are dropped, categories become a list of ext ids and bulky sub-trees are
//! removed. `ansible_host` is set from the entity's primary address when it
//! has one.

use std::collections::HashMap;

use prism_clusters::Host;
use prism_core::case::snake_case_keys;
use prism_core::shaper::ResultShaper;
use prism_core::Result;
use prism_vmm::Vm;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

/// VM attributes too large to carry in an inventory.
pub const BULKY_VM_KEYS: &[&str] = &[
    "disks",
    "nics",
    "cd_roms",
    "gpus",
    "serial_ports",
    "boot_config",
    "guest_customization",
    "guest_tools",
    "vtpm_config",
    "apc_config",
    "storage_config",
    "pcie_devices",
];

/// Host attributes too large to carry in an inventory.
pub const BULKY_HOST_KEYS: &[&str] = &["disk", "gpu_list", "host_nic_ext_ids"];

/// One inventory host before filtering and grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct HostRecord {
    /// Inventory host name.
    pub name: String,
    /// Host variables.
    pub vars: Map<String, Value>,
    /// Cluster the entity belongs to.
    pub cluster_ext_id: Option<String>,
    /// Values available to the `ansible_host` template.
    pub placeholders: HashMap<&'static str, String>,
}

fn base_vars<T: Serialize>(entity: &T, bulky: &[&str]) -> Result<Map<String, Value>> {
    let raw = serde_json::to_value(entity)?;
    let Value::Object(mut vars) = snake_case_keys(&ResultShaper::new().shape(&raw)) else {
        return Ok(Map::new());
    };
    for key in bulky {
        vars.remove(*key);
    }
    Ok(vars)
}

fn insert_str(vars: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        vars.insert(key.to_string(), Value::String(value.to_string()));
    }
}

/// Builds the record of a VM. VMs without a name are skipped.
///
/// # Errors
///
/// Returns a parse error if the VM cannot be serialized.
pub fn vm_record(vm: &Vm, cluster_names: &HashMap<String, String>) -> Result<Option<HostRecord>> {
    let Some(name) = vm.name.as_deref().filter(|n| !n.is_empty()) else {
        warn!(ext_id = ?vm.ext_id, "skipping VM without a name");
        return Ok(None);
    };

    let mut vars = base_vars(vm, BULKY_VM_KEYS)?;
    let categories = vm.category_ext_ids();
    if !categories.is_empty() {
        vars.insert(
            "categories".to_string(),
            Value::Array(categories.into_iter().map(|id| Value::String(id.to_string())).collect()),
        );
    }

    let cluster_ext_id = vm.cluster_ext_id();
    let cluster_name = cluster_ext_id.and_then(|id| cluster_names.get(id)).map(String::as_str);
    insert_str(&mut vars, "cluster_ext_id", cluster_ext_id);
    insert_str(&mut vars, "cluster_name", cluster_name);
    insert_str(&mut vars, "ansible_host", vm.primary_address());

    let ext_id = vm.ext_id.as_ref().map(|id| id.as_str().to_string());
    let placeholders = [
        ("vm_name", Some(name.to_string())),
        ("vm_ext_id", ext_id),
        ("vm_description", vm.description.clone()),
        ("cluster_name", cluster_name.map(str::to_string)),
        ("cluster_ext_id", cluster_ext_id.map(str::to_string)),
    ]
    .into_iter()
    .filter_map(|(k, v)| v.map(|v| (k, v)))
    .collect();

    Ok(Some(HostRecord {
        name: name.to_string(),
        vars,
        cluster_ext_id: cluster_ext_id.map(str::to_string),
        placeholders,
    }))
}

/// Builds the record of a hypervisor host. Hosts without a name are skipped.
///
/// The cluster name embedded in the host wins over `cluster_names`.
///
/// # Errors
///
/// Returns a parse error if the host cannot be serialized.
pub fn host_record(host: &Host, cluster_names: &HashMap<String, String>) -> Result<Option<HostRecord>> {
    let Some(name) = host.host_name.as_deref().filter(|n| !n.is_empty()) else {
        warn!(ext_id = ?host.ext_id, "skipping host without a name");
        return Ok(None);
    };

    let mut vars = base_vars(host, BULKY_HOST_KEYS)?;
    vars.insert("name".to_string(), Value::String(name.to_string()));

    let cluster_ext_id = host.cluster_ext_id();
    let cluster_name = host
        .cluster_name()
        .or_else(|| cluster_ext_id.and_then(|id| cluster_names.get(id)).map(String::as_str));
    insert_str(&mut vars, "cluster_ext_id", cluster_ext_id);
    insert_str(&mut vars, "cluster_name", cluster_name);
    insert_str(&mut vars, "ansible_host", host.primary_address());

    let ext_id = host.ext_id.as_ref().map(|id| id.as_str().to_string());
    let placeholders = [
        ("host_name", Some(name.to_string())),
        ("host_ext_id", ext_id),
        ("cluster_name", cluster_name.map(str::to_string)),
        ("cluster_ext_id", cluster_ext_id.map(str::to_string)),
    ]
    .into_iter()
    .filter_map(|(k, v)| v.map(|v| (k, v)))
    .collect();

    Ok(Some(HostRecord {
        name: name.to_string(),
        vars,
        cluster_ext_id: cluster_ext_id.map(str::to_string),
        placeholders,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names() -> HashMap<String, String> {
        HashMap::from([("C-1".to_string(), "c1".to_string())])
    }

    #[test]
    fn test_vm_record() {
        let vm: Vm = serde_json::from_value(json!({
            "$objectType": "vmm.v4.ahv.config.Vm",
            "extId": "V-1",
            "name": "web01",
            "description": "",
            "powerState": "ON",
            "cluster": {"extId": "C-1"},
            "categories": [{"extId": "K-1"}],
            "nics": [{"networkInfo": {"ipv4Info": {"learnedIpAddresses": [{"value": "10.0.0.5"}]}}}],
            "disks": [{"extId": "D-1"}],
            "bootConfig": {"$objectType": "vmm.v4.ahv.config.LegacyBoot"},
            "numSockets": 2
        }))
        .unwrap();

        let record = vm_record(&vm, &names()).unwrap().unwrap();
        assert_eq!(record.name, "web01");
        assert_eq!(record.cluster_ext_id.as_deref(), Some("C-1"));
        let vars = &record.vars;
        assert_eq!(vars["power_state"], "ON");
        assert_eq!(vars["num_sockets"], 2);
        assert_eq!(vars["ansible_host"], "10.0.0.5");
        assert_eq!(vars["cluster_name"], "c1");
        assert_eq!(vars["categories"], json!(["K-1"]));
        for gone in ["disks", "nics", "boot_config", "description", "$objectType"] {
            assert!(!vars.contains_key(gone), "{gone} should be removed");
        }
        assert!(!record.placeholders.contains_key("vm_description"));
        assert_eq!(record.placeholders["cluster_name"], "c1");
    }

    #[test]
    fn test_unrecognized_power_state_copied_verbatim() {
        let vm: Vm = serde_json::from_value(json!({
            "extId": "V-3",
            "name": "app01",
            "powerState": "SUSPENDED"
        }))
        .unwrap();

        let record = vm_record(&vm, &names()).unwrap().unwrap();
        assert_eq!(record.vars["power_state"], "SUSPENDED");
    }

    #[test]
    fn test_unnamed_vm_skipped() {
        let vm: Vm = serde_json::from_value(json!({"extId": "V-2"})).unwrap();
        assert!(vm_record(&vm, &names()).unwrap().is_none());
    }

    #[test]
    fn test_host_record() {
        let host: Host = serde_json::from_value(json!({
            "extId": "H-1",
            "hostName": "node1",
            "cluster": {"uuid": "C-1"},
            "hypervisor": {"externalAddress": {"ipv4": {"value": "10.0.0.11"}}},
            "disk": [{"serialId": "S1"}]
        }))
        .unwrap();

        let record = host_record(&host, &names()).unwrap().unwrap();
        assert_eq!(record.vars["name"], "node1");
        assert_eq!(record.vars["ansible_host"], "10.0.0.11");
        assert_eq!(record.vars["cluster_name"], "c1");
        assert!(!record.vars.contains_key("disk"));
        assert_eq!(record.placeholders["host_ext_id"], "H-1");
    }
}
