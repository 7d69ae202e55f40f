//! Epic domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{Priority, require_text};
use crate::error::{CoreError, CoreResult};

/// Palette offered for epic color tags.
pub const EPIC_COLORS: &[&str] = &[
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899", "#14b8a6", "#6b7280",
];

/// A large unit of work grouping several stories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Epic {
    pub id: String,
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// 1 (low) to 10 (high).
    pub business_value: u8,
    /// 1 (small) to 10 (large).
    pub effort: u8,
    pub priority: Priority,
    pub status: EpicStatus,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Epic {
    /// Value delivered per unit of effort, used to rank the backlog.
    pub fn value_ratio(&self) -> f64 {
        f64::from(self.business_value) / f64::from(self.effort.max(1))
    }
}

/// Epic status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpicStatus {
    #[default]
    Backlog,
    InProgress,
    Done,
    Archived,
}

impl EpicStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "backlog" => Some(Self::Backlog),
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Archived => "archived",
        }
    }
}

/// Form data for a new epic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEpic {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_score")]
    pub business_value: u8,
    #[serde(default = "default_score")]
    pub effort: u8,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub color: Option<String>,
}

fn default_score() -> u8 {
    5
}

impl NewEpic {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            business_value: default_score(),
            effort: default_score(),
            priority: Priority::default(),
            color: None,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        require_text("Epic title", &self.title)?;
        validate_score("Business value", self.business_value)?;
        validate_score("Effort", self.effort)
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpicPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_value: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effort: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EpicStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl EpicPatch {
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(title) = &self.title {
            require_text("Epic title", title)?;
        }
        if let Some(v) = self.business_value {
            validate_score("Business value", v)?;
        }
        if let Some(v) = self.effort {
            validate_score("Effort", v)?;
        }
        Ok(())
    }
}

fn validate_score(field: &str, value: u8) -> CoreResult<()> {
    if !(1..=10).contains(&value) {
        return Err(CoreError::validation(format!(
            "{} must be between 1 and 10, got {}",
            field, value
        )));
    }
    Ok(())
}

/// Delivery progress of an epic, derived from its stories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpicProgress {
    pub epic_id: String,
    pub story_count: usize,
    pub done_count: usize,
    pub points_total: u32,
    pub points_done: u32,
    /// Completed points as a percentage of all points (0-100).
    pub percent_complete: f64,
}
