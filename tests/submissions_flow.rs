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
struct SubmissionResponse {
    id: Uuid,
    team_id: Uuid,
    project_name: String,
    repo_url: String,
}

#[tokio::test]
async fn submission_upsert_flow() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("admin", "adminpass", "admin").await?;
    app.insert_user("leader", "leaderpass", "participant").await?;
    app.insert_user("outsider", "outsiderpass", "participant")
        .await?;
    let theme_id = app.insert_theme("mobility", true).await?;

    let admin_token = app.login_token("admin", "adminpass").await?;
    let leader_token = app.login_token("leader", "leaderpass").await?;
    let outsider_token = app.login_token("outsider", "outsiderpass").await?;

    let create = app
        .post_json(
            "/api/teams",
            &json!({
                "name": "Shippers",
                "idea": "idea",
                "problem_statement": "problem",
                "theme_id": theme_id
            }),
            Some(&leader_token),
        )
        .await?;
    let body = body_to_vec(create.into_body()).await?;
    let team: TeamResponse = serde_json::from_slice(&body)?;

    // Submissions open up only once the team is approved.
    let premature = app
        .put_json(
            "/api/submissions",
            &json!({
                "project_name": "Shipit",
                "description": "a thing",
                "repo_url": "https://example.com/shipit"
            }),
            Some(&leader_token),
        )
        .await?;
    assert_eq!(premature.status(), StatusCode::FORBIDDEN);

    app.patch_json(
        &format!("/api/admin/teams/{}/status", team.id),
        &json!({ "status": "approved" }),
        Some(&admin_token),
    )
    .await?;

    let submit = app
        .put_json(
            "/api/submissions",
            &json!({
                "project_name": "Shipit",
                "description": "a thing",
                "repo_url": "https://example.com/shipit"
            }),
            Some(&leader_token),
        )
        .await?;
    assert_eq!(submit.status(), StatusCode::OK);
    let body = body_to_vec(submit.into_body()).await?;
    let submission: SubmissionResponse = serde_json::from_slice(&body)?;
    assert_eq!(submission.team_id, team.id);
    assert_eq!(submission.project_name, "Shipit");

    // Resubmitting replaces, never duplicates.
    let resubmit = app
        .put_json(
            "/api/submissions",
            &json!({
                "project_name": "Shipit 2",
                "description": "a better thing",
                "repo_url": "https://example.com/shipit2",
                "demo_url": "https://demo.example.com"
            }),
            Some(&leader_token),
        )
        .await?;
    assert_eq!(resubmit.status(), StatusCode::OK);
    let body = body_to_vec(resubmit.into_body()).await?;
    let replaced: SubmissionResponse = serde_json::from_slice(&body)?;
    assert_eq!(replaced.id, submission.id);
    assert_eq!(replaced.project_name, "Shipit 2");
    assert_eq!(replaced.repo_url, "https://example.com/shipit2");

    let mine = app.get("/api/submissions/mine", Some(&leader_token)).await?;
    assert_eq!(mine.status(), StatusCode::OK);
    let body = body_to_vec(mine.into_body()).await?;
    let fetched: SubmissionResponse = serde_json::from_slice(&body)?;
    assert_eq!(fetched.project_name, "Shipit 2");

    // Users without a team have nothing to fetch or submit.
    let outsider_fetch = app
        .get("/api/submissions/mine", Some(&outsider_token))
        .await?;
    assert_eq!(outsider_fetch.status(), StatusCode::NOT_FOUND);
    let outsider_submit = app
        .put_json(
            "/api/submissions",
            &json!({
                "project_name": "Nope",
                "description": "",
                "repo_url": "https://example.com/nope"
            }),
            Some(&outsider_token),
        )
        .await?;
    assert_eq!(outsider_submit.status(), StatusCode::FORBIDDEN);

    app.cleanup().await?;
    Ok(())
}
