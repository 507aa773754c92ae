use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub created: DateTime<Utc>,
    pub is_done: bool,
}

/// Per-filter counters returned alongside the task list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoInfo {
    pub all: u32,
    pub completed: u32,
    pub in_work: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoMeta {
    pub total_amount: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodoList {
    #[serde(default)]
    pub data: Vec<Todo>,
    #[serde(default)]
    pub info: Option<TodoInfo>,
    #[serde(default)]
    pub meta: Option<TodoMeta>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TodoFilter {
    #[default]
    All,
    Completed,
    InWork,
}

impl TodoFilter {
    pub fn as_query(&self) -> &'static str {
        match self {
            TodoFilter::All => "all",
            TodoFilter::Completed => "completed",
            TodoFilter::InWork => "inWork",
        }
    }
}

/// Body for creating or updating a task; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_done: Option<bool>,
}

impl TodoRequest {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            is_done: None,
        }
    }

    pub fn done(is_done: bool) -> Self {
        Self {
            title: None,
            is_done: Some(is_done),
        }
    }
}
