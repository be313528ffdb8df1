use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::{
    dsl::{count_star, exists},
    prelude::*,
    PgConnection,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, ParticipantUser, StaffUser};
use crate::error::{unique_constraint_name, AppError, AppResult, ErrorKind};
use crate::models::{NewTeam, NewTeamMember, Score, Team, Theme, User};
use crate::schema::{join_requests, mentoring_rounds, scores, team_members, teams, themes, users};
use crate::state::AppState;
use crate::status::{RequestStatus, TeamStatus};

#[derive(Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
    pub idea: String,
    pub problem_statement: String,
    pub theme_id: Uuid,
}

#[derive(Serialize)]
pub struct TeamResponse {
    pub id: Uuid,
    pub name: String,
    pub idea: String,
    pub problem_statement: String,
    pub theme_id: Uuid,
    pub leader_id: Uuid,
    pub status: String,
    pub floor_id: Option<Uuid>,
    pub room_id: Option<Uuid>,
    pub member_count: i64,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct MemberInfo {
    pub user_id: Uuid,
    pub username: String,
    pub tech_stack: Option<String>,
    pub is_leader: bool,
    pub joined_at: String,
}

#[derive(Serialize)]
pub struct TeamDetailResponse {
    pub team: TeamResponse,
    pub members: Vec<MemberInfo>,
}

#[derive(Serialize)]
pub struct ScoreEntry {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub round_id: Uuid,
    pub round_name: String,
    pub score: i32,
    pub comment: Option<String>,
    pub updated_at: String,
}

pub async fn create_team(
    State(state): State<AppState>,
    ParticipantUser(user): ParticipantUser,
    Json(payload): Json<CreateTeamRequest>,
) -> AppResult<(StatusCode, Json<TeamResponse>)> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    if payload.idea.trim().is_empty() || payload.problem_statement.trim().is_empty() {
        return Err(AppError::bad_request(
            "idea and problem statement must not be empty",
        ));
    }

    let mut conn = state.db()?;

    let team = conn.transaction::<Team, AppError, _>(|conn| {
        let already_member: bool = diesel::select(exists(
            team_members::table.filter(team_members::user_id.eq(user.user_id)),
        ))
        .get_result(conn)?;
        if already_member {
            return Err(AppError::conflict(
                ErrorKind::AlreadyMember,
                "user already belongs to a team",
            ));
        }

        let has_pending_request: bool = diesel::select(exists(
            join_requests::table
                .filter(join_requests::user_id.eq(user.user_id))
                .filter(join_requests::status.eq(RequestStatus::Pending.as_str())),
        ))
        .get_result(conn)?;
        if has_pending_request {
            return Err(AppError::conflict(
                ErrorKind::PendingJoinRequestExists,
                "cancel the pending join request before creating a team",
            ));
        }

        // Status-blind on purpose: one team per leader, ever, even after a
        // rejection.
        let already_leader: bool = diesel::select(exists(
            teams::table.filter(teams::leader_id.eq(user.user_id)),
        ))
        .get_result(conn)?;
        if already_leader {
            return Err(AppError::conflict(
                ErrorKind::AlreadyLeader,
                "a user may create only one team",
            ));
        }

        let theme: Option<Theme> = themes::table
            .find(payload.theme_id)
            .first(conn)
            .optional()?;
        let theme = theme.filter(|theme| theme.active).ok_or_else(|| {
            AppError::new(
                StatusCode::BAD_REQUEST,
                ErrorKind::InvalidTheme,
                "theme_id does not reference an active theme",
            )
        })?;

        let name_taken: bool =
            diesel::select(exists(teams::table.filter(teams::name.eq(&name)))).get_result(conn)?;
        if name_taken {
            return Err(AppError::conflict(
                ErrorKind::DuplicateName,
                "team name is already in use",
            ));
        }

        let new_team = NewTeam {
            id: Uuid::new_v4(),
            name: name.clone(),
            idea: payload.idea.trim().to_string(),
            problem_statement: payload.problem_statement.trim().to_string(),
            theme_id: theme.id,
            leader_id: user.user_id,
            status: TeamStatus::Pending.as_str().to_string(),
        };

        if let Err(err) = diesel::insert_into(teams::table)
            .values(&new_team)
            .execute(conn)
        {
            return Err(match unique_constraint_name(&err) {
                Some("teams_name_key") => {
                    AppError::conflict(ErrorKind::DuplicateName, "team name is already in use")
                }
                Some("teams_leader_id_key") => {
                    AppError::conflict(ErrorKind::AlreadyLeader, "a user may create only one team")
                }
                _ => AppError::from(err),
            });
        }

        let leader_membership = NewTeamMember {
            user_id: user.user_id,
            team_id: new_team.id,
        };
        if let Err(err) = diesel::insert_into(team_members::table)
            .values(&leader_membership)
            .execute(conn)
        {
            return Err(match unique_constraint_name(&err) {
                Some("team_members_pkey") => AppError::conflict(
                    ErrorKind::AlreadyMember,
                    "user already belongs to a team",
                ),
                _ => AppError::from(err),
            });
        }

        teams::table
            .find(new_team.id)
            .first(conn)
            .map_err(AppError::from)
    })?;

    let response = to_team_response(team, 1);
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_teams(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> AppResult<Json<Vec<TeamResponse>>> {
    let mut conn = state.db()?;

    let team_list: Vec<Team> = teams::table
        .filter(teams::status.eq(TeamStatus::Approved.as_str()))
        .order(teams::name.asc())
        .load(&mut conn)?;

    let counts: Vec<(Uuid, i64)> = team_members::table
        .group_by(team_members::team_id)
        .select((team_members::team_id, count_star()))
        .load(&mut conn)?;
    let count_map: HashMap<Uuid, i64> = counts.into_iter().collect();

    let response = team_list
        .into_iter()
        .map(|team| {
            let members = *count_map.get(&team.id).unwrap_or(&0);
            to_team_response(team, members)
        })
        .collect();

    Ok(Json(response))
}

pub async fn my_team(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<TeamDetailResponse>> {
    let mut conn = state.db()?;

    let team_id: Uuid = team_members::table
        .find(user.user_id)
        .select(team_members::team_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    let team: Team = teams::table.find(team_id).first(&mut conn)?;
    let leader_id = team.leader_id;

    let member_rows: Vec<(Uuid, NaiveDateTime, User)> = team_members::table
        .inner_join(users::table)
        .filter(team_members::team_id.eq(team.id))
        .order(team_members::joined_at.asc())
        .select((
            team_members::user_id,
            team_members::joined_at,
            users::all_columns,
        ))
        .load(&mut conn)?;

    let members = member_rows
        .into_iter()
        .map(|(user_id, joined_at, user)| MemberInfo {
            user_id,
            username: user.username,
            tech_stack: user.tech_stack,
            is_leader: user_id == leader_id,
            joined_at: to_iso(joined_at),
        })
        .collect::<Vec<_>>();

    let member_count = members.len() as i64;
    Ok(Json(TeamDetailResponse {
        team: to_team_response(team, member_count),
        members,
    }))
}

pub async fn team_scores(
    State(state): State<AppState>,
    StaffUser(_user): StaffUser,
    Path(team_id): Path<Uuid>,
) -> AppResult<Json<Vec<ScoreEntry>>> {
    let mut conn = state.db()?;

    teams::table.find(team_id).first::<Team>(&mut conn)?;

    let rows: Vec<(Score, String)> = scores::table
        .inner_join(mentoring_rounds::table)
        .filter(scores::team_id.eq(team_id))
        .order(scores::updated_at.desc())
        .select((scores::all_columns, mentoring_rounds::round_name))
        .load(&mut conn)?;

    let response = rows
        .into_iter()
        .map(|(score, round_name)| ScoreEntry {
            id: score.id,
            mentor_id: score.mentor_id,
            round_id: score.round_id,
            round_name,
            score: score.score,
            comment: score.comment,
            updated_at: to_iso(score.updated_at),
        })
        .collect();

    Ok(Json(response))
}

pub(super) fn to_team_response(team: Team, member_count: i64) -> TeamResponse {
    TeamResponse {
        id: team.id,
        name: team.name,
        idea: team.idea,
        problem_statement: team.problem_statement,
        theme_id: team.theme_id,
        leader_id: team.leader_id,
        status: team.status,
        floor_id: team.floor_id,
        room_id: team.room_id,
        member_count,
        created_at: to_iso(team.created_at),
    }
}

pub(super) fn to_iso(value: NaiveDateTime) -> String {
    DateTime::<Utc>::from_naive_utc_and_offset(value, Utc).to_rfc3339()
}

pub(super) fn member_count(conn: &mut PgConnection, team_id: Uuid) -> AppResult<i64> {
    let count: i64 = team_members::table
        .filter(team_members::team_id.eq(team_id))
        .select(count_star())
        .first(conn)?;
    Ok(count)
}

/// The approved team the caller leads, or `NotTeamLeader`.
pub(super) fn approved_team_led_by(conn: &mut PgConnection, leader_id: Uuid) -> AppResult<Team> {
    let team: Option<Team> = teams::table
        .filter(teams::leader_id.eq(leader_id))
        .first(conn)
        .optional()?;

    team.filter(|team| team.status == TeamStatus::Approved.as_str())
        .ok_or_else(AppError::not_team_leader)
}
