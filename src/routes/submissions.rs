use axum::{extract::State, Json};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::ParticipantUser;
use crate::error::{AppError, AppResult};
use crate::models::{NewSubmission, Submission};
use crate::schema::{submissions, team_members};
use crate::state::AppState;

use super::teams::{approved_team_led_by, to_iso};

#[derive(Deserialize)]
pub struct UpsertSubmissionRequest {
    pub project_name: String,
    pub description: String,
    pub repo_url: String,
    pub demo_url: Option<String>,
}

#[derive(Serialize)]
pub struct SubmissionResponse {
    pub id: Uuid,
    pub team_id: Uuid,
    pub project_name: String,
    pub description: String,
    pub repo_url: String,
    pub demo_url: Option<String>,
    pub updated_at: String,
}

/// Only the leader submits, and a team has exactly one submission; repeated
/// submits replace the previous one.
pub async fn upsert_submission(
    State(state): State<AppState>,
    ParticipantUser(user): ParticipantUser,
    Json(payload): Json<UpsertSubmissionRequest>,
) -> AppResult<Json<SubmissionResponse>> {
    if payload.project_name.trim().is_empty() || payload.repo_url.trim().is_empty() {
        return Err(AppError::bad_request(
            "project_name and repo_url must not be empty",
        ));
    }

    let mut conn = state.db()?;
    let team = approved_team_led_by(&mut conn, user.user_id)?;

    let new_submission = NewSubmission {
        id: Uuid::new_v4(),
        team_id: team.id,
        project_name: payload.project_name.trim().to_string(),
        description: payload.description.trim().to_string(),
        repo_url: payload.repo_url.trim().to_string(),
        demo_url: payload.demo_url.clone(),
    };

    diesel::insert_into(submissions::table)
        .values(&new_submission)
        .on_conflict(submissions::team_id)
        .do_update()
        .set((
            submissions::project_name.eq(new_submission.project_name.clone()),
            submissions::description.eq(new_submission.description.clone()),
            submissions::repo_url.eq(new_submission.repo_url.clone()),
            submissions::demo_url.eq(new_submission.demo_url.clone()),
            submissions::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let stored: Submission = submissions::table
        .filter(submissions::team_id.eq(team.id))
        .first(&mut conn)?;

    Ok(Json(to_response(stored)))
}

pub async fn my_submission(
    State(state): State<AppState>,
    ParticipantUser(user): ParticipantUser,
) -> AppResult<Json<SubmissionResponse>> {
    let mut conn = state.db()?;

    let team_id: Uuid = team_members::table
        .find(user.user_id)
        .select(team_members::team_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    let submission: Submission = submissions::table
        .filter(submissions::team_id.eq(team_id))
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    Ok(Json(to_response(submission)))
}

fn to_response(submission: Submission) -> SubmissionResponse {
    SubmissionResponse {
        id: submission.id,
        team_id: submission.team_id,
        project_name: submission.project_name,
        description: submission.description,
        repo_url: submission.repo_url,
        demo_url: submission.demo_url,
        updated_at: to_iso(submission.updated_at),
    }
}
