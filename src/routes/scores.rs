use std::collections::HashSet;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{MentorUser, StaffUser};
use crate::error::{AppError, AppResult, ErrorKind};
use crate::models::{MentorAssignment, MentoringRound, NewScore, Score, Team};
use crate::schema::{mentor_assignments, mentoring_rounds, scores, teams};
use crate::state::AppState;
use crate::status::TeamStatus;

use super::teams::{to_iso, to_team_response, TeamResponse};

#[derive(Deserialize)]
pub struct SubmitScoreRequest {
    pub team_id: Uuid,
    pub round_id: Uuid,
    pub score: i32,
    pub comment: Option<String>,
}

#[derive(Serialize)]
pub struct RoundResponse {
    pub id: Uuid,
    pub round_name: String,
    pub description: String,
    pub start_time: String,
    pub end_time: String,
    pub max_score: i32,
    pub is_active: bool,
}

#[derive(Serialize)]
pub struct ScoreResponse {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub team_id: Uuid,
    pub round_id: Uuid,
    pub score: i32,
    pub comment: Option<String>,
    pub updated_at: String,
}

pub async fn list_rounds(
    State(state): State<AppState>,
    StaffUser(_user): StaffUser,
) -> AppResult<Json<Vec<RoundResponse>>> {
    let mut conn = state.db()?;

    let rounds: Vec<MentoringRound> = mentoring_rounds::table
        .order(mentoring_rounds::start_time.asc())
        .load(&mut conn)?;

    let now = Utc::now().naive_utc();
    let response = rounds
        .into_iter()
        .map(|round| {
            let is_active = round.start_time <= now && now < round.end_time;
            RoundResponse {
                id: round.id,
                round_name: round.round_name,
                description: round.description,
                start_time: to_iso(round.start_time),
                end_time: to_iso(round.end_time),
                max_score: round.max_score,
                is_active,
            }
        })
        .collect();

    Ok(Json(response))
}

pub async fn submit_score(
    State(state): State<AppState>,
    MentorUser(user): MentorUser,
    Json(payload): Json<SubmitScoreRequest>,
) -> AppResult<Json<ScoreResponse>> {
    let mut conn = state.db()?;

    let round: MentoringRound = mentoring_rounds::table
        .find(payload.round_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| {
            AppError::new(
                StatusCode::BAD_REQUEST,
                ErrorKind::InvalidRound,
                "round_id does not reference a known round",
            )
        })?;

    if payload.score < 0 || payload.score > round.max_score {
        return Err(AppError::conflict(
            ErrorKind::ScoreOutOfRange,
            format!("score must be between 0 and {}", round.max_score),
        ));
    }

    teams::table.find(payload.team_id).first::<Team>(&mut conn)?;

    // One row per (mentor, team, round): the unique index makes this upsert
    // safe under concurrent writers, with no select-then-branch window.
    let new_score = NewScore {
        id: Uuid::new_v4(),
        mentor_id: user.user_id,
        team_id: payload.team_id,
        round_id: round.id,
        score: payload.score,
        comment: payload.comment.clone(),
    };

    diesel::insert_into(scores::table)
        .values(&new_score)
        .on_conflict((scores::mentor_id, scores::team_id, scores::round_id))
        .do_update()
        .set((
            scores::score.eq(payload.score),
            scores::comment.eq(payload.comment.clone()),
            scores::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let stored: Score = scores::table
        .filter(scores::mentor_id.eq(user.user_id))
        .filter(scores::team_id.eq(payload.team_id))
        .filter(scores::round_id.eq(round.id))
        .first(&mut conn)?;

    Ok(Json(ScoreResponse {
        id: stored.id,
        mentor_id: stored.mentor_id,
        team_id: stored.team_id,
        round_id: stored.round_id,
        score: stored.score,
        comment: stored.comment,
        updated_at: to_iso(stored.updated_at),
    }))
}

/// Approved teams located on a floor/room the calling mentor is assigned to.
pub async fn mentor_teams(
    State(state): State<AppState>,
    MentorUser(user): MentorUser,
) -> AppResult<Json<Vec<TeamResponse>>> {
    let mut conn = state.db()?;

    let assignments: Vec<MentorAssignment> = mentor_assignments::table
        .filter(mentor_assignments::mentor_id.eq(user.user_id))
        .load(&mut conn)?;
    let locations: HashSet<(Uuid, Uuid)> = assignments
        .into_iter()
        .map(|assignment| (assignment.floor_id, assignment.room_id))
        .collect();

    let approved: Vec<Team> = teams::table
        .filter(teams::status.eq(TeamStatus::Approved.as_str()))
        .order(teams::name.asc())
        .load(&mut conn)?;

    let mut response = Vec::new();
    for team in approved {
        let located = match (team.floor_id, team.room_id) {
            (Some(floor_id), Some(room_id)) => locations.contains(&(floor_id, room_id)),
            _ => false,
        };
        if located {
            let members = super::teams::member_count(&mut conn, team.id)?;
            response.push(to_team_response(team, members));
        }
    }

    Ok(Json(response))
}
