//! Sprint domain models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::common::require_text;
use crate::error::{CoreError, CoreResult};

/// A time-boxed iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sprint {
    pub id: String,
    pub project_id: String,
    pub name: String,
    #[serde(default)]
    pub goal: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: SprintStatus,
    /// Planned points.
    #[serde(default)]
    pub capacity: Option<u32>,
    /// Points actually delivered, set on completion.
    #[serde(default)]
    pub velocity: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sprint {
    /// Inclusive length in days.
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SprintStatus {
    #[default]
    Planned,
    Active,
    Completed,
}

impl SprintStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "planned" => Some(Self::Planned),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

/// Form data for a new sprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSprint {
    pub name: String,
    #[serde(default)]
    pub goal: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub capacity: Option<u32>,
}

impl NewSprint {
    pub fn new(name: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            goal: String::new(),
            start_date,
            end_date,
            capacity: None,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        require_text("Sprint name", &self.name)?;
        validate_dates(self.start_date, self.end_date)
    }
}

/// Partial update; `None` fields are left untouched.
///
/// Status and velocity are not editable here. They change only through
/// `start_sprint` and `complete_sprint`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SprintPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

impl SprintPatch {
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(name) = &self.name {
            require_text("Sprint name", name)?;
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            validate_dates(start, end)?;
        }
        Ok(())
    }

    /// Check the dates this patch would leave on `sprint`.
    pub fn validate_against(&self, sprint: &Sprint) -> CoreResult<()> {
        validate_dates(
            self.start_date.unwrap_or(sprint.start_date),
            self.end_date.unwrap_or(sprint.end_date),
        )
    }

    pub(crate) fn touches_dates(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }
}

fn validate_dates(start: NaiveDate, end: NaiveDate) -> CoreResult<()> {
    if end < start {
        return Err(CoreError::validation(format!(
            "Sprint ends ({}) before it starts ({})",
            end, start
        )));
    }
    Ok(())
}

/// Committed versus delivered work in a sprint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintSummary {
    pub sprint_id: String,
    pub story_count: usize,
    pub done_count: usize,
    pub committed_points: u32,
    pub completed_points: u32,
    #[serde(default)]
    pub capacity: Option<u32>,
}

impl SprintSummary {
    /// Committed points above capacity, if a capacity is set.
    pub fn overcommitted_by(&self) -> Option<u32> {
        self.capacity
            .filter(|cap| self.committed_points > *cap)
            .map(|cap| self.committed_points - cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_dates_must_be_ordered() {
        assert!(NewSprint::new("S1", date(2024, 3, 1), date(2024, 3, 14)).validate().is_ok());
        assert!(NewSprint::new("S1", date(2024, 3, 14), date(2024, 3, 1)).validate().is_err());
        assert!(NewSprint::new("", date(2024, 3, 1), date(2024, 3, 1)).validate().is_err());
    }

    #[test]
    fn test_dates_serialize_as_iso() {
        let sprint = NewSprint::new("S1", date(2024, 3, 1), date(2024, 3, 14));
        let value = serde_json::to_value(&sprint).unwrap();
        assert_eq!(value["startDate"], "2024-03-01");
        assert_eq!(value["endDate"], "2024-03-14");
    }

    fn stored(start: NaiveDate, end: NaiveDate) -> Sprint {
        Sprint {
            id: "s1".into(),
            project_id: "p1".into(),
            name: "S1".into(),
            goal: String::new(),
            start_date: start,
            end_date: end,
            status: SprintStatus::Planned,
            capacity: None,
            velocity: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_one_sided_date_change_is_checked_against_stored_dates() {
        let sprint = stored(date(2024, 3, 1), date(2024, 3, 14));
        let early_end = SprintPatch {
            end_date: Some(date(2024, 1, 1)),
            ..SprintPatch::default()
        };
        assert!(early_end.validate().is_ok());
        assert!(matches!(
            early_end.validate_against(&sprint).unwrap_err(),
            CoreError::Validation(_)
        ));

        let late_start = SprintPatch {
            start_date: Some(date(2024, 4, 1)),
            ..SprintPatch::default()
        };
        assert!(late_start.validate_against(&sprint).is_err());

        let extended = SprintPatch {
            end_date: Some(date(2024, 3, 21)),
            ..SprintPatch::default()
        };
        assert!(extended.validate_against(&sprint).is_ok());
    }

    #[test]
    fn test_patch_rejects_lifecycle_fields() {
        let status: Result<SprintPatch, _> = serde_json::from_value(serde_json::json!({"status": "completed"}));
        assert!(status.is_err());
        let velocity: Result<SprintPatch, _> = serde_json::from_value(serde_json::json!({"velocity": 40}));
        assert!(velocity.is_err());
        let name: SprintPatch = serde_json::from_value(serde_json::json!({"name": "Renamed"})).unwrap();
        assert_eq!(name.name.as_deref(), Some("Renamed"));
    }

    #[test]
    fn test_overcommitment() {
        let summary = SprintSummary {
            committed_points: 25,
            capacity: Some(20),
            ..SprintSummary::default()
        };
        assert_eq!(summary.overcommitted_by(), Some(5));
        let fits = SprintSummary {
            committed_points: 10,
            capacity: Some(20),
            ..SprintSummary::default()
        };
        assert_eq!(fits.overcommitted_by(), None);
    }
}
