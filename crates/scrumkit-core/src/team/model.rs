//! Team member models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::require_text;
use crate::error::{CoreError, CoreResult};

/// A person working on a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: String,
    pub project_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub role: TeamRole,
    /// Story points this member can take on per sprint.
    #[serde(default)]
    pub capacity: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Scrum role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    ProductOwner,
    ScrumMaster,
    #[default]
    Developer,
    Designer,
    Stakeholder,
}

impl TeamRole {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "product_owner" | "po" => Some(Self::ProductOwner),
            "scrum_master" | "sm" => Some(Self::ScrumMaster),
            "developer" | "dev" => Some(Self::Developer),
            "designer" => Some(Self::Designer),
            "stakeholder" => Some(Self::Stakeholder),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductOwner => "product_owner",
            Self::ScrumMaster => "scrum_master",
            Self::Developer => "developer",
            Self::Designer => "designer",
            Self::Stakeholder => "stakeholder",
        }
    }
}

/// Form data for adding a member.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeamMember {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: TeamRole,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub capacity: Option<u32>,
}

impl NewTeamMember {
    pub fn validate(&self) -> CoreResult<()> {
        require_text("Member name", &self.name)?;
        if !self.email.is_empty() && !self.email.contains('@') {
            return Err(CoreError::validation(format!("'{}' is not an email address", self.email)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<TeamRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

impl TeamMemberPatch {
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(name) = &self.name {
            require_text("Member name", name)?;
        }
        match &self.email {
            Some(email) if !email.is_empty() && !email.contains('@') => Err(CoreError::validation(
                format!("'{}' is not an email address", email),
            )),
            _ => Ok(()),
        }
    }
}
