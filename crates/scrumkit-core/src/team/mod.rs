//! Team membership.

pub mod model;

use scrumkit_store::{Direction, DocumentStore, to_document};
use serde_json::json;

use crate::collections::TEAM_MEMBERS;
use crate::common::{ListOptions, decode_all};
use crate::error::{CoreResult, StoreResultExt};
use model::{NewTeamMember, TeamMember, TeamMemberPatch};

pub async fn add_member(
    store: &dyn DocumentStore,
    project_id: &str,
    input: &NewTeamMember,
) -> CoreResult<TeamMember> {
    let body = to_document(&json!({
        "projectId": project_id,
        "userId": input.user_id,
        "name": input.name.trim(),
        "email": input.email.trim().to_lowercase(),
        "role": input.role,
        "capacity": input.capacity,
    }))
    .or_backend("Could not add the team member.")?;
    let doc = store
        .add(TEAM_MEMBERS, body)
        .await
        .or_backend("Could not add the team member.")?;
    doc.decode().or_backend("Could not read the team member.")
}

pub async fn get_member(store: &dyn DocumentStore, id: &str) -> CoreResult<Option<TeamMember>> {
    let doc = store
        .get(TEAM_MEMBERS, id)
        .await
        .or_backend("Could not load the team member.")?;
    doc.map(|d| d.decode())
        .transpose()
        .or_backend("Could not read the team member.")
}

pub async fn update_member(
    store: &dyn DocumentStore,
    id: &str,
    patch: &TeamMemberPatch,
) -> CoreResult<TeamMember> {
    let body = to_document(patch).or_backend("Could not update the team member.")?;
    let doc = store
        .update(TEAM_MEMBERS, id, body)
        .await
        .or_backend("Could not update the team member.")?;
    doc.decode().or_backend("Could not read the team member.")
}

pub async fn remove_member(store: &dyn DocumentStore, id: &str) -> CoreResult<bool> {
    store
        .delete(TEAM_MEMBERS, id)
        .await
        .or_backend("Could not remove the team member.")
}

/// Members of a project, alphabetical by default.
pub async fn list_members(
    store: &dyn DocumentStore,
    project_id: &str,
    options: &ListOptions,
) -> CoreResult<Vec<TeamMember>> {
    let query = options.project_query(project_id, ("name", Direction::Asc));
    let docs = store
        .query(TEAM_MEMBERS, &query)
        .await
        .or_backend("Could not load the team.")?;
    decode_all(docs).or_backend("Could not read the team.")
}

/// Sum of the declared per-sprint capacity of every member.
pub async fn team_capacity(store: &dyn DocumentStore, project_id: &str) -> CoreResult<u32> {
    let members = list_members(store, project_id, &ListOptions::default()).await?;
    Ok(members.iter().filter_map(|m| m.capacity).sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::TeamRole;
    use scrumkit_store::MemoryStore;

    fn member(name: &str, role: TeamRole, capacity: Option<u32>) -> NewTeamMember {
        NewTeamMember {
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            role,
            user_id: None,
            capacity,
        }
    }

    #[tokio::test]
    async fn test_members_sorted_and_capacity_summed() {
        let store = MemoryStore::new();
        add_member(&store, "p1", &member("Zoe", TeamRole::Developer, Some(8))).await.unwrap();
        add_member(&store, "p1", &member("Ann", TeamRole::ProductOwner, None)).await.unwrap();
        add_member(&store, "p1", &member("Bob", TeamRole::Developer, Some(5))).await.unwrap();
        add_member(&store, "p2", &member("Eve", TeamRole::Designer, Some(13))).await.unwrap();

        let names: Vec<String> = list_members(&store, "p1", &ListOptions::default())
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Ann", "Bob", "Zoe"]);
        assert_eq!(team_capacity(&store, "p1").await.unwrap(), 13);
    }

    #[tokio::test]
    async fn test_update_and_remove() {
        let store = MemoryStore::new();
        let m = add_member(&store, "p1", &member("Ann", TeamRole::Developer, None)).await.unwrap();
        let patch = TeamMemberPatch {
            role: Some(TeamRole::ScrumMaster),
            ..TeamMemberPatch::default()
        };
        let updated = update_member(&store, &m.id, &patch).await.unwrap();
        assert_eq!(updated.role, TeamRole::ScrumMaster);
        assert_eq!(updated.email, "ann@example.com");
        assert!(remove_member(&store, &m.id).await.unwrap());
        assert!(get_member(&store, &m.id).await.unwrap().is_none());
    }

    #[test]
    fn test_role_parsing_and_validation() {
        assert_eq!(TeamRole::from_str("Scrum-Master"), Some(TeamRole::ScrumMaster));
        assert_eq!(TeamRole::from_str("po"), Some(TeamRole::ProductOwner));
        let bad = NewTeamMember {
            name: "X".into(),
            email: "not-an-email".into(),
            ..NewTeamMember::default()
        };
        assert!(bad.validate().is_err());
    }
}
