//! Per-event task checklist.
//!
//! Each active event carries a checklist of tasks assigned to operator
//! roles. The checklist endpoint is separate from the board feed; the board
//! only sees its aggregate through the completion counters.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::board::Completion;
use crate::board::types::parse_event_number;
use crate::remote::RemoteError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    NotDone,
    Working,
    Done,
}

impl TaskStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotDone => "notdone",
            Self::Working => "working",
            Self::Done => "done",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "notdone" => Some(Self::NotDone),
            "working" => Some(Self::Working),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub uuid: String,
    #[serde(deserialize_with = "deserialize_task_event")]
    pub event_number: u64,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub central_id: String,
    #[serde(default)]
    pub priority: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub modified_by: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

fn deserialize_task_event<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;
    let value = Value::deserialize(deserializer)?;
    parse_event_number(&value).ok_or_else(|| D::Error::custom(format!("invalid event_number: {value}")))
}

/// Body of a task status change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub uuid: String,
    pub status: TaskStatus,
    pub modified_by: String,
}

#[async_trait::async_trait]
pub trait TaskAuthority: Send + Sync {
    async fn fetch_tasks(&self, center: &str, event: u64) -> Result<Vec<Task>, RemoteError>;

    /// `Ok(false)` means the backend refused the update.
    async fn update_task_status(&self, update: &TaskUpdate) -> Result<bool, RemoteError>;
}

/// Completion counters derived from a checklist.
#[must_use]
pub fn completion_of(tasks: &[Task]) -> Completion {
    let done = tasks.iter().filter(|task| task.status == TaskStatus::Done).count();
    Completion {
        completed: u32::try_from(done).unwrap_or(u32::MAX),
        total: u32::try_from(tasks.len()).unwrap_or(u32::MAX),
    }
}

/// Group tasks by role in first-appearance order, each group sorted by
/// priority.
#[must_use]
pub fn group_by_role(tasks: &[Task]) -> Vec<(String, Vec<Task>)> {
    let mut groups: Vec<(String, Vec<Task>)> = Vec::new();
    for task in tasks {
        match groups.iter_mut().find(|(role, _)| *role == task.role) {
            Some((_, group)) => group.push(task.clone()),
            None => groups.push((task.role.clone(), vec![task.clone()])),
        }
    }
    for (_, group) in &mut groups {
        group.sort_by_key(|task| task.priority);
    }
    groups
}

/// Parse a checklist response: `{Result, Tasks: [...]}`.
///
/// # Errors
///
/// Returns [`RemoteError::Parse`] for invalid JSON or a malformed task list.
pub fn parse_tasks(text: &str) -> Result<Vec<Task>, RemoteError> {
    let body: Value = serde_json::from_str(text).map_err(|e| RemoteError::Parse(e.to_string()))?;
    let Some(tasks) = body.get("Tasks").or_else(|| body.get("tasks")) else {
        return Ok(Vec::new());
    };
    if tasks.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(tasks.clone()).map_err(|e| RemoteError::Parse(e.to_string()))
}

#[cfg(test)]
#[path = "tasks_test.rs"]
mod tasks_test;
