use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A unit of planned work. `duration` is the planned length in minutes;
/// `actual_duration` and `efficiency` are filled in at completion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub duration: u32,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub actual_duration: Option<u32>,
    pub efficiency: Option<u32>,
    pub focus_score: Option<u32>,
}

/// Caller-supplied fields for a new task. Everything else is defaulted by
/// the store (`add_task`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub duration: u32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update for an existing task. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub duration: Option<u32>,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.duration.is_none()
            && self.category.is_none()
            && self.notes.is_none()
            && self.completed.is_none()
    }
}
