use std::collections::HashMap;

use axum::{extract::State, Json};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::ranking::{rank_teams, TeamScores};
use crate::schema::{scores, teams};
use crate::settings;
use crate::state::AppState;
use crate::status::TeamStatus;

#[derive(Serialize)]
pub struct RankingEntry {
    pub rank: i64,
    pub team_id: Uuid,
    pub team_name: String,
    pub average_score: f64,
    pub total_score: i64,
    pub score_count: i64,
}

#[derive(Serialize)]
pub struct RankingsResponse {
    pub rankings: Vec<RankingEntry>,
}

/// Rankings are computed fresh on every call; nothing is denormalized. When
/// the visibility flag is off the calculator is not invoked at all and the
/// caller gets an explicit rankings_hidden error.
pub async fn get_rankings(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> AppResult<Json<RankingsResponse>> {
    let mut conn = state.db()?;

    if !settings::rankings_visible(&mut conn)? {
        return Err(AppError::rankings_hidden());
    }

    let approved: Vec<(Uuid, String)> = teams::table
        .filter(teams::status.eq(TeamStatus::Approved.as_str()))
        .select((teams::id, teams::name))
        .load(&mut conn)?;

    let score_rows: Vec<(Uuid, i32)> = scores::table
        .select((scores::team_id, scores::score))
        .load(&mut conn)?;

    let mut by_team: HashMap<Uuid, Vec<i32>> = HashMap::new();
    for (team_id, score) in score_rows {
        by_team.entry(team_id).or_default().push(score);
    }

    let input = approved
        .into_iter()
        .map(|(team_id, name)| TeamScores {
            team_id,
            name,
            scores: by_team.remove(&team_id).unwrap_or_default(),
        })
        .collect();

    let rankings = rank_teams(input)
        .into_iter()
        .map(|ranked| RankingEntry {
            rank: ranked.rank,
            team_id: ranked.team_id,
            team_name: ranked.name,
            average_score: ranked.average_score,
            total_score: ranked.total_score,
            score_count: ranked.score_count,
        })
        .collect();

    Ok(Json(RankingsResponse { rankings }))
}
