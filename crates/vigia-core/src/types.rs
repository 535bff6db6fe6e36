use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A remote file descriptor captured at detection time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub id: String,
    pub name: String,
}

impl FileRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Subscription state of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionState {
    Active,
    Suspended,
}

impl SubscriptionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
        }
    }

    /// Parse a stored state string. Unknown values read as `Suspended` so a
    /// corrupted row can never widen access.
    pub fn parse(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            _ => Self::Suspended,
        }
    }
}

/// One operator/tenant served by the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRecord {
    /// Stable identifier — equals the messaging chat id.
    pub client_id: String,
    /// Remote folder being watched for this client.
    pub folder_id: String,
    pub state: SubscriptionState,
    pub expires_on: NaiveDate,
}

/// What the processing agent hands back on success.
#[derive(Debug, Clone, Default)]
pub struct AgentOutput {
    pub artifact_location: Option<String>,
}

/// Outcome of a confirmed task execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(String),
}

/// Result descriptor produced by the task executor.
///
/// Transient: reported once via notification and recorded in the execution
/// log, never held by the state machine afterwards.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub artifact_location: Option<String>,
    pub elapsed: Duration,
    pub outcome: Outcome,
}
