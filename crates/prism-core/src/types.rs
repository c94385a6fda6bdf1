//! Prism Central service tags and resource kinds.
//!
//! Every v4 endpoint lives under `/api/{namespace}/{version}/`. A
//! [`PrismService`] names the namespace, a [`ResourceKind`] names a collection
//! inside it together with the action sub-resources it supports.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Default Prism Central HTTPS port
pub const DEFAULT_PORT: u16 = 9440;
/// Default v4 API version
pub const DEFAULT_API_VERSION: &str = "v4.0";
/// Placeholder replaced with the parent external identifier in nested collections
pub const PARENT_PLACEHOLDER: &str = "{parent}";

/// Prism Central API namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrismService {
    /// Virtual machine management
    Vmm,
    /// Identity and access management
    Iam,
    /// Cluster management
    Clusters,
    /// Flow virtual networking
    Flow,
    /// Life cycle management
    Lcm,
    /// Licensing
    Licensing,
    /// Prism (tasks, categories, domain manager)
    Prism,
    /// Volume groups and iSCSI clients
    Volumes,
    /// Protection and storage policies
    DataPolicies,
    /// Security (STIGs, key management)
    Security,
    /// Flow network security (microsegmentation)
    Microseg,
}

impl PrismService {
    /// Returns the URL namespace of the service.
    #[must_use]
    pub const fn namespace(&self) -> &'static str {
        match self {
            Self::Vmm => "vmm",
            Self::Iam => "iam",
            Self::Clusters => "clustermgmt",
            Self::Flow => "networking",
            Self::Lcm => "lifecycle",
            Self::Licensing => "licensing",
            Self::Prism => "prism",
            Self::Volumes => "volumes",
            Self::DataPolicies => "datapolicies",
            Self::Security => "security",
            Self::Microseg => "microseg",
        }
    }

    /// Returns all known services.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Vmm,
            Self::Iam,
            Self::Clusters,
            Self::Flow,
            Self::Lcm,
            Self::Licensing,
            Self::Prism,
            Self::Volumes,
            Self::DataPolicies,
            Self::Security,
            Self::Microseg,
        ]
    }
}

impl FromStr for PrismService {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "vmm" => Ok(Self::Vmm),
            "iam" => Ok(Self::Iam),
            "clusters" | "clustermgmt" => Ok(Self::Clusters),
            "flow" | "networking" => Ok(Self::Flow),
            "lcm" | "lifecycle" => Ok(Self::Lcm),
            "licensing" => Ok(Self::Licensing),
            "prism" => Ok(Self::Prism),
            "volumes" => Ok(Self::Volumes),
            "datapolicies" => Ok(Self::DataPolicies),
            "security" => Ok(Self::Security),
            "microseg" => Ok(Self::Microseg),
            _ => Err(Error::SdkUnavailable(format!("Unknown service: {s}"))),
        }
    }
}

impl std::fmt::Display for PrismService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.namespace())
    }
}

/// Families of action sub-resources (`…/$actions/{action}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// attach-vm, attach-iscsi-client, …
    Attach,
    /// detach-vm, detach-iscsi-client, …
    Detach,
    /// revoke-keys, …
    Revoke,
    /// Task cancellation
    Cancel,
    /// restore, restore-from-backup, …
    Restore,
    /// LCM upgrade
    Upgrade,
    /// LCM inventory
    Inventory,
    /// LCM prechecks
    Precheck,
}

impl Action {
    /// Classifies a concrete action path segment into its family.
    #[must_use]
    pub fn classify(segment: &str) -> Option<Self> {
        let head = segment.split('-').next().unwrap_or(segment);
        match head {
            "attach" => Some(Self::Attach),
            "detach" => Some(Self::Detach),
            "revoke" => Some(Self::Revoke),
            "cancel" => Some(Self::Cancel),
            "restore" => Some(Self::Restore),
            "upgrade" => Some(Self::Upgrade),
            "inventory" => Some(Self::Inventory),
            "precheck" | "prechecks" => Some(Self::Precheck),
            _ => None,
        }
    }
}

/// Resource collections reachable through the client factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum ResourceKind {
    Vm,
    Cluster,
    Host,
    Image,
    Category,
    Template,
    Role,
    User,
    UserGroup,
    Permission,
    IdentityProvider,
    DirectoryService,
    AuthorizationPolicy,
    Entity,
    EntityGroup,
    AddressGroup,
    ServiceGroup,
    NetworkSecurityPolicy,
    LcmInventory,
    LcmConfig,
    LcmStatus,
    LcmEntity,
    LcmPrecheck,
    LcmUpgrade,
    Licensing,
    Eula,
    DomainManager,
    DomainManagerBackup,
    Task,
    ProtectionPolicy,
    StoragePolicy,
    VolumeGroup,
    IscsiClient,
    Stigs,
    Kms,
    CertAuthProvider,
    PasswordManager,
}

impl ResourceKind {
    /// Returns the owning service.
    #[must_use]
    pub const fn service(&self) -> PrismService {
        match self {
            Self::Vm | Self::Image | Self::Template => PrismService::Vmm,
            Self::Cluster | Self::Host => PrismService::Clusters,
            Self::Role
            | Self::User
            | Self::UserGroup
            | Self::Permission
            | Self::IdentityProvider
            | Self::DirectoryService
            | Self::AuthorizationPolicy
            | Self::Entity => PrismService::Iam,
            Self::EntityGroup
            | Self::AddressGroup
            | Self::ServiceGroup
            | Self::NetworkSecurityPolicy => PrismService::Microseg,
            Self::LcmInventory
            | Self::LcmConfig
            | Self::LcmStatus
            | Self::LcmEntity
            | Self::LcmPrecheck
            | Self::LcmUpgrade => PrismService::Lcm,
            Self::Licensing | Self::Eula => PrismService::Licensing,
            Self::Category | Self::DomainManager | Self::DomainManagerBackup | Self::Task => {
                PrismService::Prism
            }
            Self::ProtectionPolicy | Self::StoragePolicy => PrismService::DataPolicies,
            Self::VolumeGroup | Self::IscsiClient => PrismService::Volumes,
            Self::Stigs | Self::Kms | Self::CertAuthProvider | Self::PasswordManager => {
                PrismService::Security
            }
        }
    }

    /// Collection path relative to the service base URL.
    ///
    /// Nested collections contain [`PARENT_PLACEHOLDER`].
    #[must_use]
    pub const fn collection_path(&self) -> &'static str {
        match self {
            Self::Vm => "ahv/config/vms",
            Self::Image => "content/images",
            Self::Template => "content/templates",
            Self::Cluster => "config/clusters",
            Self::Host => "config/hosts",
            Self::Category => "config/categories",
            Self::Role => "authz/roles",
            Self::User => "authn/users",
            Self::UserGroup => "authn/user-groups",
            Self::Permission => "authz/operations",
            Self::IdentityProvider => "authn/saml-identity-providers",
            Self::DirectoryService => "authn/directory-services",
            Self::AuthorizationPolicy => "authz/authorization-policies",
            Self::Entity => "authz/entities",
            Self::EntityGroup => "config/entity-groups",
            Self::AddressGroup => "config/address-groups",
            Self::ServiceGroup => "config/service-groups",
            Self::NetworkSecurityPolicy => "config/policies",
            Self::LcmInventory => "operations",
            Self::LcmConfig => "resources/config",
            Self::LcmStatus => "resources/status",
            Self::LcmEntity => "resources/entities",
            Self::LcmPrecheck => "operations",
            Self::LcmUpgrade => "operations",
            Self::Licensing => "config/licenses",
            Self::Eula => "config/eula",
            Self::DomainManager => "config/domain-managers",
            Self::DomainManagerBackup => "management/domain-managers/{parent}/backup-targets",
            Self::Task => "config/tasks",
            Self::ProtectionPolicy => "config/protection-policies",
            Self::StoragePolicy => "config/storage-policies",
            Self::VolumeGroup => "config/volume-groups",
            Self::IscsiClient => "config/iscsi-clients",
            Self::Stigs => "report/stigs",
            Self::Kms => "encryption/key-management-servers",
            Self::CertAuthProvider => "config/cert-auth-providers",
            Self::PasswordManager => "management/password-managers",
        }
    }

    /// Action families supported by the resource.
    #[must_use]
    pub const fn actions(&self) -> &'static [Action] {
        match self {
            Self::VolumeGroup => &[Action::Attach, Action::Detach],
            Self::IscsiClient => &[Action::Attach, Action::Detach],
            Self::Vm => &[Action::Attach, Action::Detach],
            Self::DirectoryService | Self::User => &[Action::Revoke],
            Self::Task => &[Action::Cancel],
            Self::DomainManager | Self::DomainManagerBackup => &[Action::Restore],
            Self::LcmUpgrade => &[Action::Upgrade],
            Self::LcmInventory => &[Action::Inventory],
            Self::LcmPrecheck => &[Action::Precheck],
            _ => &[],
        }
    }

    /// Returns true if the resource supports the action family.
    #[must_use]
    pub fn supports(&self, action: Action) -> bool {
        self.actions().contains(&action)
    }

    /// Returns true if the collection is nested under a parent entity.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.collection_path().contains(PARENT_PLACEHOLDER)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.service(), self.collection_path())
    }
}
