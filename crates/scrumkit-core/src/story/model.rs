//! User story domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{Priority, require_text};
use crate::error::{CoreError, CoreResult};

/// Largest estimate accepted for a single story.
pub const MAX_STORY_POINTS: u32 = 100;

/// A user-facing requirement with an estimate and a workflow status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: String,
    pub project_id: String,
    pub epic_id: String,
    #[serde(default)]
    pub sprint_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub story_points: Option<u32>,
    pub priority: Priority,
    pub status: StoryStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub assignee_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Story {
    pub fn points(&self) -> u32 {
        self.story_points.unwrap_or(0)
    }

    pub fn is_done(&self) -> bool {
        self.status == StoryStatus::Done
    }
}

/// Story workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
    Archived,
}

impl StoryStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "todo" => Some(Self::Todo),
            "in_progress" => Some(Self::InProgress),
            "review" => Some(Self::Review),
            "done" => Some(Self::Done),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Done => "done",
            Self::Archived => "archived",
        }
    }
}

/// Form data for a new story.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStory {
    pub epic_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub story_points: Option<u32>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: StoryStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub sprint_id: Option<String>,
}

impl NewStory {
    pub fn new(epic_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            epic_id: epic_id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_points(mut self, points: u32) -> Self {
        self.story_points = Some(points);
        self
    }

    pub fn validate(&self) -> CoreResult<()> {
        require_text("Epic", &self.epic_id)?;
        require_text("Story title", &self.title)?;
        validate_points(self.story_points)
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StoryStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
}

impl StoryPatch {
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(title) = &self.title {
            require_text("Story title", title)?;
        }
        validate_points(self.story_points)
    }
}

fn validate_points(points: Option<u32>) -> CoreResult<()> {
    match points {
        Some(p) if p > MAX_STORY_POINTS => Err(CoreError::validation(format!(
            "Story points must be at most {}, got {}",
            MAX_STORY_POINTS, p
        ))),
        _ => Ok(()),
    }
}

/// Trim, drop blanks and de-duplicate free-form tags, keeping first-seen order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tags() {
        let tags = vec![" UI ".to_string(), "ui".into(), "".into(), "Backend".into()];
        assert_eq!(normalize_tags(&tags), vec!["ui", "backend"]);
    }

    #[test]
    fn test_validation() {
        assert!(NewStory::new("", "Title").validate().is_err());
        assert!(NewStory::new("e1", " ").validate().is_err());
        assert!(NewStory::new("e1", "Ok").with_points(101).validate().is_err());
        assert!(NewStory::new("e1", "Ok").with_points(8).validate().is_ok());
    }
}
