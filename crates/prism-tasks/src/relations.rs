//! Relation tags used to find the entity a task produced.
//!
//! A finished task lists every entity it touched. The one a create call cares
//! about is picked by its relation: a tag matches a relation when they are equal
//! or the relation ends with `:{tag}` (`volumes:config:volume-group` matches
//! `volume-group`).

use prism_core::ResourceKind;

use crate::models::Task;

/// Relation tag per resource kind.
pub const RELATION_TAGS: &[(ResourceKind, &str)] = &[
    (ResourceKind::Vm, "vm"),
    (ResourceKind::Image, "image"),
    (ResourceKind::Template, "template"),
    (ResourceKind::Cluster, "cluster"),
    (ResourceKind::Host, "host"),
    (ResourceKind::Category, "category"),
    (ResourceKind::Role, "role"),
    (ResourceKind::User, "user"),
    (ResourceKind::UserGroup, "user-group"),
    (ResourceKind::IdentityProvider, "saml-identity-provider"),
    (ResourceKind::DirectoryService, "directory-service"),
    (ResourceKind::AuthorizationPolicy, "authorization-policy"),
    (ResourceKind::EntityGroup, "entity-group"),
    (ResourceKind::AddressGroup, "address-group"),
    (ResourceKind::ServiceGroup, "service-group"),
    (ResourceKind::NetworkSecurityPolicy, "network-security-policy"),
    (ResourceKind::DomainManager, "domain-manager"),
    (ResourceKind::DomainManagerBackup, "backup-target"),
    (ResourceKind::ProtectionPolicy, "protection-policy"),
    (ResourceKind::StoragePolicy, "storage-policy"),
    (ResourceKind::VolumeGroup, "volume-group"),
    (ResourceKind::IscsiClient, "iscsi-client"),
    (ResourceKind::Kms, "key-management-server"),
    (ResourceKind::CertAuthProvider, "cert-auth-provider"),
];

/// Relation tag of a volume group disk (not a top-level collection).
pub const VOLUME_GROUP_DISK_TAG: &str = "volume-group-disk";

/// Returns the relation tag of a resource kind.
#[must_use]
pub fn relation_tag(kind: ResourceKind) -> Option<&'static str> {
    RELATION_TAGS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, tag)| *tag)
}

/// Returns true if `relation` carries `tag`.
#[must_use]
pub fn relation_matches(relation: &str, tag: &str) -> bool {
    relation == tag
        || relation
            .strip_suffix(tag)
            .is_some_and(|head| head.ends_with(':'))
}

/// External identifier of the first affected entity carrying `tag`.
///
/// Only meaningful once the task has SUCCEEDED.
#[must_use]
pub fn affected_entity_ext_id<'a>(task: &'a Task, tag: &str) -> Option<&'a str> {
    task.entities_affected
        .iter()
        .find(|entity| {
            entity
                .rel
                .as_deref()
                .is_some_and(|rel| relation_matches(rel, tag))
        })
        .map(|entity| entity.ext_id.as_str())
        .filter(|id| !id.is_empty())
}

/// External identifier of the entity of `kind` produced by a task.
#[must_use]
pub fn created_ext_id(task: &Task, kind: ResourceKind) -> Option<&str> {
    relation_tag(kind).and_then(|tag| affected_entity_ext_id(task, tag))
}
