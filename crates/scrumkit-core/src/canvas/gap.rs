//! Gap Analysis: where we are, where we want to be, and what closes the gap.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Canvas, CanvasKind, item_id};
use crate::common::Priority;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GapItem {
    pub id: String,
    pub area: String,
    pub current: String,
    pub desired: String,
    pub gap: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    #[default]
    Open,
    InProgress,
    Done,
}

impl ActionStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "open" => Some(Self::Open),
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActionItem {
    pub id: String,
    pub description: String,
    pub owner: String,
    pub due_date: Option<NaiveDate>,
    pub status: ActionStatus,
    /// Gap this action addresses, if any.
    pub gap_item_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GapAnalysis {
    pub title: String,
    pub current_state: String,
    pub desired_state: String,
    pub gap_items: Vec<GapItem>,
    pub action_items: Vec<ActionItem>,
}

impl GapAnalysis {
    /// Append a gap, assigning a fresh id. Returns the id.
    pub fn add_gap_item(&mut self, mut item: GapItem) -> String {
        item.id = item_id();
        let id = item.id.clone();
        self.gap_items.push(item);
        id
    }

    /// Append an action, assigning a fresh id. Returns the id.
    pub fn add_action_item(&mut self, mut item: ActionItem) -> String {
        item.id = item_id();
        let id = item.id.clone();
        self.action_items.push(item);
        id
    }

    /// Returns false when no action has that id.
    pub fn set_action_status(&mut self, action_id: &str, status: ActionStatus) -> bool {
        match self.action_items.iter_mut().find(|a| a.id == action_id) {
            Some(action) => {
                action.status = status;
                true
            }
            None => false,
        }
    }

    /// Remove a gap and detach the actions that pointed at it.
    pub fn remove_gap_item(&mut self, gap_id: &str) -> bool {
        let before = self.gap_items.len();
        self.gap_items.retain(|g| g.id != gap_id);
        if self.gap_items.len() == before {
            return false;
        }
        for action in &mut self.action_items {
            if action.gap_item_id.as_deref() == Some(gap_id) {
                action.gap_item_id = None;
            }
        }
        true
    }

    /// Fraction (0.0 to 1.0) of action items that are done.
    pub fn completion_rate(&self) -> f64 {
        if self.action_items.is_empty() {
            return 0.0;
        }
        let done = self
            .action_items
            .iter()
            .filter(|a| a.status == ActionStatus::Done)
            .count();
        done as f64 / self.action_items.len() as f64
    }

    pub fn actions_for(&self, gap_id: &str) -> Vec<&ActionItem> {
        self.action_items
            .iter()
            .filter(|a| a.gap_item_id.as_deref() == Some(gap_id))
            .collect()
    }
}

impl Canvas for GapAnalysis {
    const KIND: CanvasKind = CanvasKind::GapAnalysis;

    fn normalize(&mut self) {
        self.title = self.title.trim().to_string();
        for item in &mut self.gap_items {
            if item.id.trim().is_empty() {
                item.id = item_id();
            }
        }
        for action in &mut self.action_items {
            if action.id.trim().is_empty() {
                action.id = item_id();
            }
        }
    }
}
