//! Project write paths: id allocation, team reconciliation, cascades and
//! scoped listing.

mod common;

use assert_matches::assert_matches;
use taskflow_core::authz::ListScope;
use taskflow_core::error::CoreError;
use taskflow_core::roles::Role;
use taskflow_db::repositories::{Junction, ProjectRepo, TeamRepo};
use taskflow_db::DbError;

use common::*;

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_records_primary_curator_and_both_sets() {
    let pool = test_pool().await;
    let a = member(&pool, "a", 1).await;
    let b = member(&pool, "b", 1).await;
    let c = member(&pool, "c", 1).await;

    let created = ProjectRepo::create(&pool, &project_input("Alpha", 1, &[b, a, b], &[c, a]))
        .await
        .unwrap();

    assert_eq!(created.project.curator_user_id, b);
    assert_eq!(created.project.status, "Active");
    assert_eq!(created.project.key, format!("PRJ-{}", created.project.id));
    let curator_ids: Vec<_> = created.curators.iter().map(|m| m.id).collect();
    let assignee_ids: Vec<_> = created.assignees.iter().map(|m| m.id).collect();
    // Members come back ordered by user id.
    assert_eq!(curator_ids, vec![a, b]);
    assert_eq!(assignee_ids, vec![a, c]);
}

#[tokio::test]
async fn create_fills_the_lowest_free_id() {
    let pool = test_pool().await;
    let u = member(&pool, "u", 1).await;
    for name in ["one", "two", "three", "four"] {
        project(&pool, name, &[u], &[u]).await;
    }
    ProjectRepo::delete(&pool, 3).await.unwrap();

    let next = ProjectRepo::create(&pool, &project_input("five", 1, &[u], &[u]))
        .await
        .unwrap();
    assert_eq!(next.project.id, 3);
}

#[tokio::test]
async fn duplicate_key_is_a_conflict_and_writes_nothing() {
    let pool = test_pool().await;
    let u = member(&pool, "u", 1).await;
    let mut input = project_input("Alpha", 1, &[u], &[u]);
    input.key = "ALPHA".into();
    ProjectRepo::create(&pool, &input).await.unwrap();

    let err = ProjectRepo::create(&pool, &input).await.unwrap_err();
    assert_matches!(err, DbError::Core(CoreError::Conflict(msg)) if msg.contains("ALPHA"));
    assert_eq!(count(&pool, "projects", "").await, 1);
    assert_eq!(count(&pool, "project_curators", "").await, 1);
}

#[tokio::test]
async fn create_rejects_team_outside_size_bounds() {
    let pool = test_pool().await;
    let err = ProjectRepo::create(&pool, &project_input("Empty", 1, &[], &[1]))
        .await
        .unwrap_err();
    assert_matches!(err, DbError::Core(CoreError::Validation(_)));
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_replaces_sets_without_residue() {
    let pool = test_pool().await;
    let a = member(&pool, "a", 1).await;
    let b = member(&pool, "b", 1).await;
    let c = member(&pool, "c", 1).await;
    let d = member(&pool, "d", 1).await;
    let id = project(&pool, "Alpha", &[a, b], &[b, c]).await;

    let updated = ProjectRepo::update(&pool, id, &project_input("Alpha 2", 1, &[d, c], &[a]))
        .await
        .unwrap();

    assert_eq!(updated.project.curator_user_id, d);
    assert_eq!(updated.project.name, "Alpha 2");
    assert_eq!(
        TeamRepo::member_ids(&pool, Junction::ProjectCurators, id).await.unwrap(),
        vec![c, d]
    );
    assert_eq!(
        TeamRepo::member_ids(&pool, Junction::ProjectAssignees, id).await.unwrap(),
        vec![a]
    );
}

#[tokio::test]
async fn blank_key_on_update_keeps_existing_key() {
    let pool = test_pool().await;
    let u = member(&pool, "u", 1).await;
    let mut input = project_input("Alpha", 1, &[u], &[u]);
    input.key = "KEEP".into();
    let id = ProjectRepo::create(&pool, &input).await.unwrap().project.id;

    input.key = "   ".into();
    let updated = ProjectRepo::update(&pool, id, &input).await.unwrap();
    assert_eq!(updated.project.key, "KEEP");
}

#[tokio::test]
async fn update_to_taken_key_conflicts_and_keeps_team() {
    let pool = test_pool().await;
    let a = member(&pool, "a", 1).await;
    let b = member(&pool, "b", 1).await;
    let mut first = project_input("First", 1, &[a], &[a]);
    first.key = "FIRST".into();
    ProjectRepo::create(&pool, &first).await.unwrap();
    let second = project(&pool, "Second", &[a], &[a]).await;

    let mut change = project_input("Second", 1, &[b], &[b]);
    change.key = "FIRST".into();
    let err = ProjectRepo::update(&pool, second, &change).await.unwrap_err();

    assert_matches!(err, DbError::Core(CoreError::Conflict(_)));
    assert_eq!(
        TeamRepo::member_ids(&pool, Junction::ProjectCurators, second).await.unwrap(),
        vec![a]
    );
}

#[tokio::test]
async fn update_missing_project_is_not_found() {
    let pool = test_pool().await;
    let u = member(&pool, "u", 1).await;
    let err = ProjectRepo::update(&pool, 77, &project_input("Ghost", 1, &[u], &[u]))
        .await
        .unwrap_err();
    assert_matches!(
        err,
        DbError::Core(CoreError::NotFound { entity: "Project", id: 77 })
    );
    assert_eq!(count(&pool, "project_curators", "").await, 0);
}

// ---------------------------------------------------------------------------
// Delete / close
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_cascades_to_tasks_and_all_junctions() {
    let pool = test_pool().await;
    let a = member(&pool, "a", 1).await;
    let b = member(&pool, "b", 1).await;
    let doomed = project(&pool, "Doomed", &[a], &[b]).await;
    let kept = project(&pool, "Kept", &[a], &[b]).await;
    task(&pool, doomed, "t1", &[a], &[b]).await;
    task(&pool, doomed, "t2", &[b], &[a]).await;
    let survivor = task(&pool, kept, "t3", &[a], &[b]).await;

    ProjectRepo::delete(&pool, doomed).await.unwrap();

    assert_eq!(count(&pool, "projects", "").await, 1);
    assert_eq!(count(&pool, "tasks", "").await, 1);
    assert_eq!(count(&pool, "project_curators", &format!("project_id = {doomed}")).await, 0);
    assert_eq!(count(&pool, "project_assignees", &format!("project_id = {doomed}")).await, 0);
    assert_eq!(count(&pool, "task_curators", &format!("task_id <> {survivor}")).await, 0);
    assert_eq!(count(&pool, "task_assignees", &format!("task_id <> {survivor}")).await, 0);
    assert_eq!(count(&pool, "task_curators", "").await, 1);
}

#[tokio::test]
async fn delete_missing_project_is_not_found() {
    let pool = test_pool().await;
    let err = ProjectRepo::delete(&pool, 5).await.unwrap_err();
    assert_matches!(err, DbError::Core(CoreError::NotFound { entity: "Project", .. }));
}

#[tokio::test]
async fn close_cascades_done_to_every_task() {
    let pool = test_pool().await;
    let u = member(&pool, "u", 1).await;
    let p = project(&pool, "Alpha", &[u], &[u]).await;
    let other = project(&pool, "Other", &[u], &[u]).await;
    let t1 = task(&pool, p, "t1", &[u], &[u]).await;
    let t2 = task(&pool, p, "t2", &[u], &[u]).await;
    let untouched = task(&pool, other, "t3", &[u], &[u]).await;

    let closed = ProjectRepo::close(&pool, p).await.unwrap();

    assert_eq!(closed, 2);
    assert_eq!(task_status(&pool, t1).await, "Done");
    assert_eq!(task_status(&pool, t2).await, "Done");
    assert_eq!(task_status(&pool, untouched).await, "New");
    let project = ProjectRepo::find_by_id(&pool, p).await.unwrap().unwrap();
    assert_eq!(project.project.status, "Closed");
}

#[tokio::test]
async fn close_missing_project_touches_nothing() {
    let pool = test_pool().await;
    let u = member(&pool, "u", 1).await;
    let p = project(&pool, "Alpha", &[u], &[u]).await;
    let t = task(&pool, p, "t", &[u], &[u]).await;

    let err = ProjectRepo::close(&pool, p + 100).await.unwrap_err();
    assert_matches!(err, DbError::Core(CoreError::NotFound { .. }));
    assert_eq!(task_status(&pool, t).await, "New");
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn listing_respects_scope() {
    let pool = test_pool().await;
    let a = member(&pool, "a", 1).await;
    let b = member(&pool, "b", 1).await;
    let c = member(&pool, "c", 2).await;
    let guest = user(&pool, "guest", Role::Guest, 1).await;
    let p1 = project(&pool, "p1", &[a], &[b]).await;
    let p2 = project(&pool, "p2", &[b], &[b]).await;
    let p3 = ProjectRepo::create(&pool, &project_input("p3", 2, &[c], &[c]))
        .await
        .unwrap()
        .project
        .id;

    let ids = |rows: Vec<taskflow_db::models::project::ProjectWithTeam>| {
        rows.into_iter().map(|p| p.project.id).collect::<Vec<_>>()
    };

    assert_eq!(ids(ProjectRepo::list(&pool, ListScope::All).await.unwrap()), vec![p1, p2, p3]);
    assert_eq!(
        ids(ProjectRepo::list(&pool, ListScope::Department(2)).await.unwrap()),
        vec![p3]
    );
    assert_eq!(
        ids(ProjectRepo::list(&pool, ListScope::Participant(a)).await.unwrap()),
        vec![p1]
    );
    assert_eq!(
        ids(ProjectRepo::list(&pool, ListScope::Participant(b)).await.unwrap()),
        vec![p1, p2]
    );
    assert!(ProjectRepo::list(&pool, ListScope::Participant(guest))
        .await
        .unwrap()
        .is_empty());
}
