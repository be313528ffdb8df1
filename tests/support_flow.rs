mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, body_to_vec, TestApp};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Deserialize)]
struct TeamResponse {
    id: Uuid,
}

#[derive(Deserialize)]
struct SupportMessageResponse {
    id: Uuid,
    to_role: String,
    floor_id: Uuid,
    room_id: Uuid,
    status: String,
    resolved_by: Option<Uuid>,
    resolution_notes: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    error: String,
    kind: String,
}

async fn error_kind(response: hyper::Response<axum::body::Body>) -> Result<String> {
    let body = body_to_vec(response.into_body()).await?;
    let parsed: ErrorBody = serde_json::from_slice(&body)?;
    Ok(parsed.kind)
}

#[tokio::test]
async fn support_routing_flow() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("admin", "adminpass", "admin").await?;
    app.insert_user("leader", "leaderpass", "participant").await?;
    app.insert_user("homeless", "homelesspass", "participant")
        .await?;
    app.insert_user("member", "memberpass", "participant").await?;
    let mentor_id = app.insert_user("mentor", "mentorpass", "mentor").await?;
    app.insert_user("faraway", "farawaypass", "mentor").await?;
    app.insert_user_with_location("volunteer", "volunteerpass", "volunteer", Some(1), Some(101))
        .await?;
    app.insert_user("lost-volunteer", "volunteerpass", "volunteer")
        .await?;
    let theme_id = app.insert_theme("hardware", true).await?;
    let floor_id = app.insert_floor(1).await?;
    let room_id = app.insert_room(101, floor_id).await?;

    let admin_token = app.login_token("admin", "adminpass").await?;
    let leader_token = app.login_token("leader", "leaderpass").await?;
    let homeless_token = app.login_token("homeless", "homelesspass").await?;
    let member_token = app.login_token("member", "memberpass").await?;
    let mentor_token = app.login_token("mentor", "mentorpass").await?;
    let faraway_token = app.login_token("faraway", "farawaypass").await?;
    let volunteer_token = app.login_token("volunteer", "volunteerpass").await?;
    let lost_volunteer_token = app.login_token("lost-volunteer", "volunteerpass").await?;

    // Approved, located team for the leader.
    let create = app
        .post_json(
            "/api/teams",
            &json!({
                "name": "Grounded",
                "idea": "idea",
                "problem_statement": "problem",
                "theme_id": theme_id
            }),
            Some(&leader_token),
        )
        .await?;
    let body = body_to_vec(create.into_body()).await?;
    let team: TeamResponse = serde_json::from_slice(&body)?;
    app.patch_json(
        &format!("/api/admin/teams/{}/status", team.id),
        &json!({ "status": "approved" }),
        Some(&admin_token),
    )
    .await?;
    app.patch_json(
        &format!("/api/admin/teams/{}/location", team.id),
        &json!({ "floor_id": floor_id, "room_id": room_id }),
        Some(&admin_token),
    )
    .await?;

    // Approved team with no location yet.
    let create = app
        .post_json(
            "/api/teams",
            &json!({
                "name": "Floating",
                "idea": "idea",
                "problem_statement": "problem",
                "theme_id": theme_id
            }),
            Some(&homeless_token),
        )
        .await?;
    let body = body_to_vec(create.into_body()).await?;
    let homeless_team: TeamResponse = serde_json::from_slice(&body)?;
    app.patch_json(
        &format!("/api/admin/teams/{}/status", homeless_team.id),
        &json!({ "status": "approved" }),
        Some(&admin_token),
    )
    .await?;

    let assignment = app
        .post_json(
            "/api/admin/mentor-assignments",
            &json!({ "mentor_id": mentor_id, "floor_id": floor_id, "room_id": room_id }),
            Some(&admin_token),
        )
        .await?;
    assert_eq!(assignment.status(), StatusCode::CREATED);

    // The assignment also scopes which teams the mentor can see.
    let mentor_view = app.get("/api/mentor/teams", Some(&mentor_token)).await?;
    assert_eq!(mentor_view.status(), StatusCode::OK);
    let body = body_to_vec(mentor_view.into_body()).await?;
    #[derive(Deserialize)]
    struct VisibleTeam {
        id: Uuid,
        name: String,
    }
    let visible_teams: Vec<VisibleTeam> = serde_json::from_slice(&body)?;
    assert_eq!(visible_teams.len(), 1);
    assert_eq!(visible_teams[0].id, team.id);
    assert_eq!(visible_teams[0].name, "Grounded");

    // Leader files to mentor; floor/room derive from the team.
    let filed = app
        .post_json(
            "/api/support",
            &json!({ "to_role": "mentor", "message": "power strip dead" }),
            Some(&leader_token),
        )
        .await?;
    assert_eq!(filed.status(), StatusCode::CREATED);
    let body = body_to_vec(filed.into_body()).await?;
    let message: SupportMessageResponse = serde_json::from_slice(&body)?;
    assert_eq!(message.status, "open");
    assert_eq!(message.floor_id, floor_id);
    assert_eq!(message.room_id, room_id);

    // Non-leader members cannot file.
    let from_member = app
        .post_json(
            "/api/support",
            &json!({ "to_role": "admin", "message": "help" }),
            Some(&member_token),
        )
        .await?;
    assert_eq!(from_member.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_kind(from_member).await?, "not_team_leader");

    // Leader of a team without a location cannot file yet.
    let no_location = app
        .post_json(
            "/api/support",
            &json!({ "to_role": "mentor", "message": "help" }),
            Some(&homeless_token),
        )
        .await?;
    assert_eq!(no_location.status(), StatusCode::CONFLICT);
    assert_eq!(error_kind(no_location).await?, "no_location_assigned");

    // Volunteer routes through their profile location.
    let from_volunteer = app
        .post_json(
            "/api/support",
            &json!({ "to_role": "admin", "message": "ran out of badges" }),
            Some(&volunteer_token),
        )
        .await?;
    assert_eq!(from_volunteer.status(), StatusCode::CREATED);
    let body = body_to_vec(from_volunteer.into_body()).await?;
    let admin_message: SupportMessageResponse = serde_json::from_slice(&body)?;
    assert_eq!(admin_message.floor_id, floor_id);
    assert_eq!(admin_message.room_id, room_id);

    let unplaced = app
        .post_json(
            "/api/support",
            &json!({ "to_role": "admin", "message": "where am I" }),
            Some(&lost_volunteer_token),
        )
        .await?;
    assert_eq!(unplaced.status(), StatusCode::CONFLICT);
    assert_eq!(error_kind(unplaced).await?, "no_location_assigned");

    // Mentor inbox: only mentor-addressed messages on an assigned floor/room.
    let inbox = app.get("/api/support/inbox", Some(&mentor_token)).await?;
    assert_eq!(inbox.status(), StatusCode::OK);
    let body = body_to_vec(inbox.into_body()).await?;
    let visible: Vec<SupportMessageResponse> = serde_json::from_slice(&body)?;
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, message.id);
    assert_eq!(visible[0].to_role, "mentor");

    let empty_inbox = app.get("/api/support/inbox", Some(&faraway_token)).await?;
    let body = body_to_vec(empty_inbox.into_body()).await?;
    let nothing: Vec<SupportMessageResponse> = serde_json::from_slice(&body)?;
    assert!(nothing.is_empty());

    // Admin inbox sees admin-addressed messages irrespective of location.
    let admin_inbox = app.get("/api/support/inbox", Some(&admin_token)).await?;
    let body = body_to_vec(admin_inbox.into_body()).await?;
    let admin_visible: Vec<SupportMessageResponse> = serde_json::from_slice(&body)?;
    assert_eq!(admin_visible.len(), 1);
    assert_eq!(admin_visible[0].id, admin_message.id);

    // A mentor cannot touch an admin-addressed ticket.
    let cross_resolve = app
        .post_json(
            &format!("/api/support/{}/resolve", admin_message.id),
            &json!({ "notes": "nope" }),
            Some(&mentor_token),
        )
        .await?;
    assert_eq!(cross_resolve.status(), StatusCode::NOT_FOUND);

    let progress = app
        .post_json(
            &format!("/api/support/{}/progress", message.id),
            &json!({}),
            Some(&mentor_token),
        )
        .await?;
    assert_eq!(progress.status(), StatusCode::OK);
    let body = body_to_vec(progress.into_body()).await?;
    let in_progress: SupportMessageResponse = serde_json::from_slice(&body)?;
    assert_eq!(in_progress.status, "in_progress");

    let resolve = app
        .post_json(
            &format!("/api/support/{}/resolve", message.id),
            &json!({ "notes": "replaced the strip" }),
            Some(&mentor_token),
        )
        .await?;
    assert_eq!(resolve.status(), StatusCode::OK);
    let body = body_to_vec(resolve.into_body()).await?;
    let resolved: SupportMessageResponse = serde_json::from_slice(&body)?;
    assert_eq!(resolved.status, "resolved");
    assert_eq!(resolved.resolved_by, Some(mentor_id));
    assert_eq!(resolved.resolution_notes.as_deref(), Some("replaced the strip"));

    // No reopening path: resolved is terminal.
    let re_resolve = app
        .post_json(
            &format!("/api/support/{}/resolve", message.id),
            &json!({ "notes": "again" }),
            Some(&mentor_token),
        )
        .await?;
    assert_eq!(re_resolve.status(), StatusCode::CONFLICT);
    assert_eq!(error_kind(re_resolve).await?, "invalid_transition");

    app.cleanup().await?;
    Ok(())
}
