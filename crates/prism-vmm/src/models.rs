//! AHV virtual machine models (`vmm.v4.ahv.config`).

use chrono::{DateTime, Utc};
use prism_core::ids::{CategoryExtId, ClusterExtId, HostExtId, VmExtId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// NIC type carrying guest traffic.
pub const NORMAL_NIC: &str = "NORMAL_NIC";

/// Power state of a VM.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PowerState {
    /// Powered on
    On,
    /// Powered off
    Off,
    /// Paused
    Paused,
    /// Not determined by the hypervisor
    Undetermined,
    /// Anything newer than this client, kept with its wire spelling
    #[serde(untagged)]
    Other(String),
}

impl PowerState {
    /// Wire spelling.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
            Self::Paused => "PAUSED",
            Self::Undetermined => "UNDETERMINED",
            Self::Other(state) => state,
        }
    }
}

/// Reference to another entity by external identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference<Id> {
    /// External identifier of the referenced entity.
    pub ext_id: Id,
}

/// An IP address with optional prefix length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpAddress {
    /// Dotted or colon notation.
    pub value: String,
    /// Prefix length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_length: Option<u8>,
}

/// Static IPv4 configuration of a NIC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ipv4Config {
    /// Whether IPAM assigns the address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_assign_ip: Option<bool>,
    /// Configured address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<IpAddress>,
}

/// Addresses learned from guest traffic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnedAddresses {
    /// Addresses in the order reported.
    #[serde(default)]
    pub learned_ip_addresses: Vec<IpAddress>,
}

/// Network side of a NIC.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NicNetworkInfo {
    /// `NORMAL_NIC`, `DIRECT_NIC`, `NETWORK_FUNCTION_NIC`, …
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nic_type: Option<String>,
    /// Attached subnet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<Reference<String>>,
    /// Static IPv4 configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_config: Option<Ipv4Config>,
    /// Learned IPv4 addresses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_info: Option<LearnedAddresses>,
    /// Learned IPv6 addresses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_info: Option<LearnedAddresses>,
}

/// Virtual device side of a NIC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NicBackingInfo {
    /// Device model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// MAC address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    /// Link state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_connected: Option<bool>,
}

/// A virtual NIC.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nic {
    /// NIC identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext_id: Option<String>,
    /// Device description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backing_info: Option<NicBackingInfo>,
    /// Network attachment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_info: Option<NicNetworkInfo>,
}

impl Nic {
    /// Returns true for guest traffic NICs. A NIC without a type is normal.
    #[must_use]
    pub fn is_normal(&self) -> bool {
        self.network_info
            .as_ref()
            .and_then(|info| info.nic_type.as_deref())
            .map_or(true, |t| t == NORMAL_NIC)
    }

    fn learned_ipv4(&self) -> Option<&str> {
        self.network_info
            .as_ref()?
            .ipv4_info
            .as_ref()?
            .learned_ip_addresses
            .first()
            .map(|ip| ip.value.as_str())
    }

    fn configured_ipv4(&self) -> Option<&str> {
        self.network_info
            .as_ref()?
            .ipv4_config
            .as_ref()?
            .ip_address
            .as_ref()
            .map(|ip| ip.value.as_str())
    }

    fn learned_ipv6(&self) -> Option<&str> {
        self.network_info
            .as_ref()?
            .ipv6_info
            .as_ref()?
            .learned_ip_addresses
            .first()
            .map(|ip| ip.value.as_str())
    }
}

/// An AHV virtual machine.
///
/// Attributes without a typed field are kept in [`Vm::other`] so the full
/// record survives a round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vm {
    /// VM identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext_id: Option<VmExtId>,
    /// VM name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Power state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_state: Option<PowerState>,
    /// Sockets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_sockets: Option<u32>,
    /// Cores per socket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_cores_per_socket: Option<u32>,
    /// Threads per core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_threads_per_core: Option<u32>,
    /// Memory in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_size_bytes: Option<u64>,
    /// Owning cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<Reference<ClusterExtId>>,
    /// Current host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<Reference<HostExtId>>,
    /// Attached categories.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<Reference<CategoryExtId>>,
    /// Virtual NICs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nics: Vec<Nic>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
    /// Remaining attributes.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Vm {
    /// Cluster external identifier, if the VM has a cluster reference.
    #[must_use]
    pub fn cluster_ext_id(&self) -> Option<&str> {
        self.cluster.as_ref().map(|c| c.ext_id.as_str())
    }

    /// Category external identifiers.
    #[must_use]
    pub fn category_ext_ids(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.ext_id.as_str()).collect()
    }

    /// Address used to reach the VM: first learned IPv4 on a normal NIC, then
    /// the first configured IPv4, then the first learned IPv6.
    #[must_use]
    pub fn primary_address(&self) -> Option<&str> {
        let normal = || self.nics.iter().filter(|nic| nic.is_normal());
        normal()
            .find_map(Nic::learned_ipv4)
            .or_else(|| normal().find_map(Nic::configured_ipv4))
            .or_else(|| normal().find_map(Nic::learned_ipv6))
            .filter(|addr| !addr.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vm(nics: Value) -> Vm {
        serde_json::from_value(json!({"extId": "V-1", "name": "web01", "nics": nics})).unwrap()
    }

    #[test]
    fn test_learned_ipv4_on_normal_nic_wins() {
        let vm = vm(json!([
            {"networkInfo": {"nicType": "DIRECT_NIC",
                "ipv4Info": {"learnedIpAddresses": [{"value": "10.0.0.9"}]}}},
            {"networkInfo": {"nicType": "NORMAL_NIC",
                "ipv4Config": {"ipAddress": {"value": "10.0.0.2"}},
                "ipv4Info": {"learnedIpAddresses": [{"value": "10.0.0.3"}, {"value": "10.0.0.4"}]}}}
        ]));
        assert_eq!(vm.primary_address(), Some("10.0.0.3"));
    }

    #[test]
    fn test_address_fallbacks() {
        let configured = vm(json!([
            {"networkInfo": {"ipv4Config": {"ipAddress": {"value": "10.0.0.2", "prefixLength": 24}}}}
        ]));
        assert_eq!(configured.primary_address(), Some("10.0.0.2"));

        let v6 = vm(json!([
            {"networkInfo": {"ipv6Info": {"learnedIpAddresses": [{"value": "fd00::2"}]}}}
        ]));
        assert_eq!(v6.primary_address(), Some("fd00::2"));

        assert_eq!(vm(json!([])).primary_address(), None);
    }

    #[test]
    fn test_unknown_attributes_round_trip() {
        let input = json!({
            "extId": "V-1",
            "powerState": "SUSPENDED",
            "bootConfig": {"$objectType": "vmm.v4.ahv.config.LegacyBoot"},
            "isAgentVm": false
        });
        let vm: Vm = serde_json::from_value(input).unwrap();
        assert_eq!(vm.power_state, Some(PowerState::Other("SUSPENDED".to_string())));
        assert!(vm.other.contains_key("bootConfig"));

        let back = serde_json::to_value(&vm).unwrap();
        assert_eq!(back["isAgentVm"], false);
        assert_eq!(back["powerState"], "SUSPENDED");
    }
}
