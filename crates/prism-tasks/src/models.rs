//! Task records as returned by `prism/v4.0/config/tasks`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Accepted but not started (wire `QUEUED` or `PENDING`)
    #[default]
    #[serde(alias = "QUEUED")]
    Pending,
    /// In progress
    Running,
    /// Finished successfully
    Succeeded,
    /// Finished with an error
    Failed,
    /// Canceled by a user
    Canceled,
    /// Any state this client does not know (`CANCELING`, `SUSPENDED`, …),
    /// kept with its wire spelling
    #[serde(untagged)]
    Other(String),
}

impl TaskStatus {
    /// Returns true for absorbing states.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }

    /// Wire spelling.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Canceled => "CANCELED",
            Self::Other(status) => status,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity created, changed or removed by a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EntityReference {
    /// Entity external identifier
    #[serde(default)]
    pub ext_id: String,
    /// Relation tag, e.g. `volumes:config:volume-group`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    /// Entity name, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Reference to a parent or child task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskLink {
    /// Task external identifier
    #[serde(alias = "taskExtId")]
    pub ext_id: String,
}

/// Message attached to a failed task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskMessage {
    /// Human readable text
    #[serde(default)]
    pub message: String,
    /// Severity (`ERROR`, `WARNING`, …)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    /// Service error code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// A Prism Central task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Task external identifier
    pub ext_id: String,
    /// Current state
    #[serde(default)]
    pub status: TaskStatus,
    /// Operation name, e.g. `CreateVolumeGroup`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Operation description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_description: Option<String>,
    /// Progress 0-100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_percentage: Option<u32>,
    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    /// Start time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_time: Option<DateTime<Utc>>,
    /// Completion time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_time: Option<DateTime<Utc>>,
    /// Parent task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task: Option<TaskLink>,
    /// Child tasks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_tasks: Vec<TaskLink>,
    /// Entities touched by the task
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities_affected: Vec<EntityReference>,
    /// Error messages
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error_messages: Vec<TaskMessage>,
    /// Single legacy error string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_error_message: Option<String>,
    /// Clusters the task ran on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cluster_ext_ids: Vec<String>,
}

impl Task {
    /// Error texts, falling back to the legacy message.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        let messages: Vec<String> = self
            .error_messages
            .iter()
            .map(|m| m.message.clone())
            .filter(|m| !m.is_empty())
            .collect();
        if messages.is_empty() {
            self.legacy_error_message
                .iter()
                .filter(|m| !m.is_empty())
                .cloned()
                .collect()
        } else {
            messages
        }
    }
}
