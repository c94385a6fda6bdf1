//! Parameter schemas of the managed resources.

use prism_core::ResourceKind;
use prism_spec::{Field, FieldKind, Schema, Variant};
use serde_json::{json, Value};

/// A managed resource: kind, argument schema and create defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// Resource kind
    pub kind: ResourceKind,
    /// Parameter schema
    pub schema: Schema,
    /// Parameter carrying the parent ext id of nested collections
    pub parent_param: Option<&'static str>,
    /// Base body for create
    pub defaults: Value,
}

impl Resource {
    /// A resource with an empty base body.
    #[must_use]
    pub fn new(kind: ResourceKind, schema: Schema) -> Self {
        Self {
            kind,
            schema,
            parent_param: None,
            defaults: Value::Null,
        }
    }

    /// Set the parent parameter.
    #[must_use]
    pub const fn with_parent_param(mut self, param: &'static str) -> Self {
        self.parent_param = Some(param);
        self
    }

    /// Set the create defaults.
    #[must_use]
    pub fn with_defaults(mut self, defaults: Value) -> Self {
        self.defaults = defaults;
        self
    }
}

/// IAM authorization policy. Identity and entity filters are free-form and
/// travel under `$reserved`.
#[must_use]
pub fn authorization_policy() -> Resource {
    Resource::new(
        ResourceKind::AuthorizationPolicy,
        Schema::new()
            .field(Field::scalar("display_name"))
            .field(Field::scalar("description"))
            .field(Field::scalar("authorization_policy_type"))
            .field(Field::scalar("role"))
            .field(Field::unordered_list("identities", FieldKind::reserved()))
            .field(Field::unordered_list("entities", FieldKind::reserved()))
            .preserving("$reserved"),
    )
    .with_defaults(json!({"authorizationPolicyType": "USER_DEFINED"}))
}

/// IAM role.
#[must_use]
pub fn role() -> Resource {
    Resource::new(
        ResourceKind::Role,
        Schema::new()
            .field(Field::scalar("display_name"))
            .field(Field::scalar("description"))
            .field(Field::scalar("client_name"))
            .field(Field::unordered_list("operations", FieldKind::Scalar)),
    )
}

/// IAM user. The password is never echoed back by the server.
#[must_use]
pub fn user() -> Resource {
    Resource::new(
        ResourceKind::User,
        Schema::new()
            .field(Field::scalar("username"))
            .field(Field::scalar("user_type"))
            .field(Field::scalar("idp_id"))
            .field(Field::scalar("display_name"))
            .field(Field::scalar("first_name"))
            .field(Field::scalar("last_name"))
            .field(Field::scalar("email_id"))
            .field(Field::scalar("locale"))
            .field(Field::scalar("status"))
            .field(Field::scalar("password").secret()),
    )
}

/// Category key/value pair.
#[must_use]
pub fn category() -> Resource {
    Resource::new(
        ResourceKind::Category,
        Schema::new()
            .field(Field::scalar("key"))
            .field(Field::scalar("value"))
            .field(Field::scalar("description"))
            .field(Field::scalar("owner_uuid")),
    )
}

/// Backup target of a domain manager, located on a cluster or an object store.
#[must_use]
pub fn backup_target() -> Resource {
    let cluster = Schema::new().field(Field::object(
        "config",
        Schema::new().field(Field::scalar("ext_id")),
    ));
    let object_store = Schema::new()
        .field(Field::object(
            "provider_config",
            Schema::new()
                .field(Field::scalar("bucket_name"))
                .field(Field::scalar("region"))
                .field(Field::object(
                    "credentials",
                    Schema::new()
                        .field(Field::scalar("access_key_id"))
                        .field(Field::scalar("secret_access_key").secret()),
                )),
        ))
        .field(Field::object(
            "backup_policy",
            Schema::new().field(Field::scalar("rpo_in_minutes")),
        ));

    Resource::new(
        ResourceKind::DomainManagerBackup,
        Schema::new().field(Field::one_of(
            "location",
            vec![
                Variant::new(
                    "cluster_location",
                    "prism.v4.management.ClusterLocation",
                    cluster,
                ),
                Variant::new(
                    "object_store_location",
                    "prism.v4.management.ObjectStoreLocation",
                    object_store,
                ),
            ],
        )),
    )
    .with_parent_param("domain_manager_ext_id")
}

/// Volume group.
#[must_use]
pub fn volume_group() -> Resource {
    Resource::new(
        ResourceKind::VolumeGroup,
        Schema::new()
            .field(Field::scalar("name"))
            .field(Field::scalar("description"))
            .field(Field::scalar("should_load_balance_vm_attachments"))
            .field(Field::scalar("sharing_status"))
            .field(Field::scalar("target_prefix"))
            .field(Field::scalar("target_name"))
            .field(Field::scalar("cluster_reference"))
            .field(Field::scalar("usage_type"))
            .field(Field::scalar("is_hidden"))
            .field(Field::object(
                "storage_features",
                Schema::new().field(Field::object(
                    "flash_mode",
                    Schema::new().field(Field::scalar("is_enabled")),
                )),
            ))
            .field(Field::object(
                "iscsi_features",
                Schema::new()
                    .field(Field::scalar("enabled_authentications"))
                    .field(Field::scalar("target_secret").secret()),
            )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_kinds_have_parent_param() {
        for resource in [
            authorization_policy(),
            role(),
            user(),
            category(),
            backup_target(),
            volume_group(),
        ] {
            assert_eq!(
                resource.kind.is_nested(),
                resource.parent_param.is_some(),
                "{}",
                resource.kind
            );
        }
    }

    #[test]
    fn test_secret_fields_marked() {
        assert!(user().schema.get("password").unwrap().secret);
        assert!(!role().schema.get("operations").unwrap().secret);
    }
}
