//! Cluster and host models (`clustermgmt.v4.config`).

use prism_core::ids::{ClusterExtId, HostExtId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A bare address value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressValue {
    /// Address or name.
    pub value: String,
    /// Prefix length, for IP addresses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_length: Option<u8>,
}

/// Wire form of an address: an object carrying one of `ipv4`, `ipv6`, `fqdn`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressWire {
    /// IPv4 member
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<AddressValue>,
    /// IPv6 member
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<AddressValue>,
    /// FQDN member
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<AddressValue>,
}

/// An IPv4 address, IPv6 address or fully qualified domain name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AddressWire", into = "AddressWire")]
pub enum IpAddressOrFqdn {
    /// IPv4 address
    Ipv4(AddressValue),
    /// IPv6 address
    Ipv6(AddressValue),
    /// Domain name
    Fqdn(AddressValue),
}

impl IpAddressOrFqdn {
    /// The address as a string.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Ipv4(a) | Self::Ipv6(a) | Self::Fqdn(a) => &a.value,
        }
    }
}

impl TryFrom<AddressWire> for IpAddressOrFqdn {
    type Error = String;

    fn try_from(wire: AddressWire) -> Result<Self, Self::Error> {
        wire.ipv4
            .map(Self::Ipv4)
            .or_else(|| wire.ipv6.map(Self::Ipv6))
            .or_else(|| wire.fqdn.map(Self::Fqdn))
            .ok_or_else(|| "address carries none of ipv4, ipv6 or fqdn".to_string())
    }
}

impl From<IpAddressOrFqdn> for AddressWire {
    fn from(address: IpAddressOrFqdn) -> Self {
        match address {
            IpAddressOrFqdn::Ipv4(a) => Self {
                ipv4: Some(a),
                ..Self::default()
            },
            IpAddressOrFqdn::Ipv6(a) => Self {
                ipv6: Some(a),
                ..Self::default()
            },
            IpAddressOrFqdn::Fqdn(a) => Self {
                fqdn: Some(a),
                ..Self::default()
            },
        }
    }
}

/// Cluster network settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterNetwork {
    /// Virtual IP of the cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_address: Option<IpAddressOrFqdn>,
    /// Remaining attributes.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Cluster configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    /// `AOS`, `PRISM_CENTRAL`, …
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cluster_function: Vec<String>,
    /// Remaining attributes.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// A cluster registered with Prism Central.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Cluster identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext_id: Option<ClusterExtId>,
    /// Cluster name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ClusterConfig>,
    /// Network settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<ClusterNetwork>,
    /// Remaining attributes.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Cluster {
    /// Returns true for the Prism Central cluster itself.
    #[must_use]
    pub fn is_prism_central(&self) -> bool {
        self.config
            .as_ref()
            .is_some_and(|c| c.cluster_function.iter().any(|f| f == "PRISM_CENTRAL"))
    }
}

/// Cluster reference embedded in a host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostCluster {
    /// Cluster identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<ClusterExtId>,
    /// Cluster name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// An endpoint (hypervisor or controller VM) of a host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostEndpoint {
    /// Externally reachable address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_address: Option<IpAddressOrFqdn>,
    /// Remaining attributes.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// A hypervisor node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    /// Host identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext_id: Option<HostExtId>,
    /// Host name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    /// `HYPER_CONVERGED`, `COMPUTE_ONLY`, …
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_type: Option<String>,
    /// Owning cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<HostCluster>,
    /// Hypervisor endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor: Option<HostEndpoint>,
    /// Controller VM endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller_vm: Option<HostEndpoint>,
    /// Remaining attributes.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Host {
    /// Cluster external identifier.
    #[must_use]
    pub fn cluster_ext_id(&self) -> Option<&str> {
        self.cluster.as_ref()?.uuid.as_ref().map(ClusterExtId::as_str)
    }

    /// Cluster name as embedded in the host record.
    #[must_use]
    pub fn cluster_name(&self) -> Option<&str> {
        self.cluster.as_ref()?.name.as_deref()
    }

    /// Address used to reach the host: hypervisor external address, then the
    /// controller VM external address.
    #[must_use]
    pub fn primary_address(&self) -> Option<&str> {
        [&self.hypervisor, &self.controller_vm]
            .into_iter()
            .flatten()
            .find_map(|endpoint| endpoint.external_address.as_ref())
            .map(IpAddressOrFqdn::value)
            .filter(|addr| !addr.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_address_variants() {
        let v4: IpAddressOrFqdn =
            serde_json::from_value(json!({"ipv4": {"value": "10.0.0.1", "prefixLength": 32}}))
                .unwrap();
        assert!(matches!(v4, IpAddressOrFqdn::Ipv4(_)));
        assert_eq!(v4.value(), "10.0.0.1");

        let fqdn: IpAddressOrFqdn =
            serde_json::from_value(json!({"$objectType": "common.v1.config.IPAddressOrFQDN",
                "fqdn": {"value": "node1.lab"}}))
            .unwrap();
        assert_eq!(fqdn, IpAddressOrFqdn::Fqdn(AddressValue {
            value: "node1.lab".to_string(),
            prefix_length: None
        }));

        assert!(serde_json::from_value::<IpAddressOrFqdn>(json!({})).is_err());
        assert_eq!(
            serde_json::to_value(&v4).unwrap(),
            json!({"ipv4": {"value": "10.0.0.1", "prefixLength": 32}})
        );
    }

    #[test]
    fn test_host_address_fallback() {
        let host: Host = serde_json::from_value(json!({
            "extId": "H-1",
            "hostName": "node1",
            "controllerVm": {"externalAddress": {"ipv4": {"value": "10.0.0.31"}}}
        }))
        .unwrap();
        assert_eq!(host.primary_address(), Some("10.0.0.31"));

        let host: Host = serde_json::from_value(json!({
            "hypervisor": {"externalAddress": {"ipv4": {"value": "10.0.0.11"}}},
            "controllerVm": {"externalAddress": {"ipv4": {"value": "10.0.0.31"}}}
        }))
        .unwrap();
        assert_eq!(host.primary_address(), Some("10.0.0.11"));
        assert_eq!(Host::default().primary_address(), None);
    }
}
