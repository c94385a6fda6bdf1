//! Inventory of hosts, their variables and group memberships.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{json, Map, Value};

/// Group every other group descends from.
pub const ROOT_GROUP: &str = "all";

/// Members of one group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    /// Hosts directly in the group.
    pub hosts: BTreeSet<String>,
    /// Child groups.
    pub children: BTreeSet<String>,
}

/// Inventory under construction.
///
/// Host names are unique; adding a host twice replaces its variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    hostvars: BTreeMap<String, Map<String, Value>>,
    groups: BTreeMap<String, Group>,
}

impl Inventory {
    /// An empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a host. Returns true if a host of that name existed.
    pub fn add_host(&mut self, name: impl Into<String>, vars: Map<String, Value>) -> bool {
        self.hostvars.insert(name.into(), vars).is_some()
    }

    /// Ensures a group exists.
    pub fn add_group(&mut self, name: &str) {
        self.groups.entry(name.to_string()).or_default();
        if name != ROOT_GROUP {
            self.groups
                .entry(ROOT_GROUP.to_string())
                .or_default()
                .children
                .insert(name.to_string());
        }
    }

    /// Places `host` in `group`, creating the group if needed.
    pub fn add_host_to_group(&mut self, group: &str, host: &str) {
        self.add_group(group);
        if let Some(entry) = self.groups.get_mut(group) {
            entry.hosts.insert(host.to_string());
        }
    }

    /// Nests `child` under `parent`.
    pub fn add_child(&mut self, parent: &str, child: &str) {
        if parent == child {
            return;
        }
        self.add_group(parent);
        self.add_group(child);
        if let Some(entry) = self.groups.get_mut(parent) {
            entry.children.insert(child.to_string());
        }
    }

    /// Variables of a host.
    #[must_use]
    pub fn host(&self, name: &str) -> Option<&Map<String, Value>> {
        self.hostvars.get(name)
    }

    /// Host names in order.
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.hostvars.keys().map(String::as_str)
    }

    /// A group by name.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    /// Number of hosts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hostvars.len()
    }

    /// True if the inventory has no hosts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hostvars.is_empty()
    }

    /// Renders the `--list` document.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for (name, group) in &self.groups {
            let mut entry = Map::new();
            if !group.hosts.is_empty() {
                entry.insert("hosts".to_string(), json!(group.hosts));
            }
            if !group.children.is_empty() {
                entry.insert("children".to_string(), json!(group.children));
            }
            out.insert(name.clone(), Value::Object(entry));
        }
        out.entry(ROOT_GROUP.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        out.insert("_meta".to_string(), json!({ "hostvars": self.hostvars }));
        Value::Object(out)
    }

    /// Renders the `--host` document: the host's variables or an empty map.
    #[must_use]
    pub fn host_json(&self, name: &str) -> Value {
        self.host(name)
            .cloned()
            .map_or_else(|| Value::Object(Map::new()), Value::Object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_last_write_wins() {
        let mut inventory = Inventory::new();
        assert!(!inventory.add_host("web01", vars(json!({"a": 1}))));
        assert!(inventory.add_host("web01", vars(json!({"a": 2}))));
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory.host("web01").unwrap()["a"], 2);
    }

    #[test]
    fn test_groups_hang_off_all() {
        let mut inventory = Inventory::new();
        inventory.add_host("web01", Map::new());
        inventory.add_host_to_group("cluster_C_1", "web01");
        inventory.add_host_to_group(ROOT_GROUP, "db01");
        inventory.add_child("clusters", "cluster_C_1");

        let doc = inventory.to_json();
        assert_eq!(doc["cluster_C_1"]["hosts"], json!(["web01"]));
        assert_eq!(doc["clusters"]["children"], json!(["cluster_C_1"]));
        assert_eq!(doc["all"]["hosts"], json!(["db01"]));
        assert_eq!(doc["all"]["children"], json!(["cluster_C_1", "clusters"]));
        assert!(doc["_meta"]["hostvars"]["web01"].is_object());
    }

    #[test]
    fn test_empty_inventory_document() {
        let doc = Inventory::new().to_json();
        assert_eq!(doc, json!({"all": {}, "_meta": {"hostvars": {}}}));
        assert_eq!(Inventory::new().host_json("missing"), json!({}));
    }
}
