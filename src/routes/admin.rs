use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use diesel::{dsl::exists, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{AdminUser, Role};
use crate::error::{unique_constraint_name, AppError, AppResult, ErrorKind};
use crate::models::{
    Floor, NewFloor, NewMentorAssignment, NewMentoringRound, NewRoom, NewTheme, Room, Team, User,
};
use crate::schema::{
    floors, mentor_assignments, mentoring_rounds, rooms, team_members, teams, themes, users,
};
use crate::settings::{
    self, KEY_RANKINGS_VISIBLE, KEY_TEAM_SIZE_MAX, KEY_TEAM_SIZE_MIN, TEAM_SIZE_LOWER_BOUND,
    TEAM_SIZE_UPPER_BOUND,
};
use crate::state::AppState;
use crate::status::TeamStatus;

use super::teams::{member_count, to_team_response, TeamResponse};

#[derive(Deserialize)]
pub struct SetTeamStatusRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct AssignLocationRequest {
    pub floor_id: Uuid,
    pub room_id: Uuid,
}

#[derive(Deserialize)]
pub struct CreateThemeRequest {
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

#[derive(Deserialize)]
pub struct CreateRoundRequest {
    pub round_name: String,
    #[serde(default)]
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_score: i32,
}

#[derive(Deserialize)]
pub struct CreateFloorRequest {
    pub floor_number: i32,
}

#[derive(Deserialize)]
pub struct CreateRoomRequest {
    pub room_number: i32,
    pub floor_id: Uuid,
}

#[derive(Deserialize)]
pub struct CreateMentorAssignmentRequest {
    pub mentor_id: Uuid,
    pub floor_id: Uuid,
    pub room_id: Uuid,
}

#[derive(Deserialize)]
pub struct UpdateSettingsRequest {
    pub team_size_min: Option<i32>,
    pub team_size_max: Option<i32>,
    pub rankings_visible: Option<bool>,
}

#[derive(Serialize)]
pub struct SettingsResponse {
    pub team_size_min: i32,
    pub team_size_max: i32,
    pub rankings_visible: bool,
}

#[derive(Serialize)]
pub struct IdResponse {
    pub id: Uuid,
}

/// Admin-side approval: only pending -> approved and pending -> rejected are
/// in the transition table, so a decided team can never flip.
pub async fn set_team_status(
    State(state): State<AppState>,
    AdminUser(_user): AdminUser,
    Path(team_id): Path<Uuid>,
    Json(payload): Json<SetTeamStatusRequest>,
) -> AppResult<Json<TeamResponse>> {
    let next = TeamStatus::parse(&payload.status)
        .map_err(|_| AppError::bad_request("status must be approved or rejected"))?;

    let mut conn = state.db()?;

    let team = conn.transaction::<Team, AppError, _>(|conn| {
        let team: Team = teams::table
            .find(team_id)
            .for_update()
            .first(conn)
            .optional()?
            .ok_or_else(AppError::not_found)?;

        let current = TeamStatus::parse(&team.status).map_err(AppError::internal)?;
        if !current.can_transition(next) {
            return Err(AppError::conflict(
                ErrorKind::InvalidTransition,
                format!("team cannot change from {} to {}", team.status, next.as_str()),
            ));
        }

        diesel::update(teams::table.find(team.id))
            .set((
                teams::status.eq(next.as_str()),
                teams::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(conn)?;

        teams::table.find(team.id).first(conn).map_err(AppError::from)
    })?;

    let members = member_count(&mut conn, team.id)?;
    Ok(Json(to_team_response(team, members)))
}

pub async fn assign_team_location(
    State(state): State<AppState>,
    AdminUser(_user): AdminUser,
    Path(team_id): Path<Uuid>,
    Json(payload): Json<AssignLocationRequest>,
) -> AppResult<Json<TeamResponse>> {
    let mut conn = state.db()?;

    let team: Team = teams::table
        .find(team_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;
    if team.status != TeamStatus::Approved.as_str() {
        return Err(AppError::conflict(
            ErrorKind::TeamNotApproved,
            "only approved teams get a floor/room",
        ));
    }

    floors::table.find(payload.floor_id).first::<Floor>(&mut conn)?;
    let room: Room = rooms::table.find(payload.room_id).first(&mut conn)?;
    if room.floor_id != payload.floor_id {
        return Err(AppError::bad_request("room is not on that floor"));
    }

    diesel::update(teams::table.find(team.id))
        .set((
            teams::floor_id.eq(Some(payload.floor_id)),
            teams::room_id.eq(Some(payload.room_id)),
            teams::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let refreshed: Team = teams::table.find(team.id).first(&mut conn)?;
    let members = member_count(&mut conn, refreshed.id)?;
    Ok(Json(to_team_response(refreshed, members)))
}

pub async fn remove_team_member(
    State(state): State<AppState>,
    AdminUser(_user): AdminUser,
    Path((team_id, user_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;

    let team: Team = teams::table
        .find(team_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;
    if team.leader_id == user_id {
        return Err(AppError::conflict(
            ErrorKind::Conflict,
            "the team leader cannot be removed",
        ));
    }

    let deleted = diesel::delete(
        team_members::table
            .find(user_id)
            .filter(team_members::team_id.eq(team_id)),
    )
    .execute(&mut conn)?;
    if deleted == 0 {
        return Err(AppError::not_found());
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_theme(
    State(state): State<AppState>,
    AdminUser(_user): AdminUser,
    Json(payload): Json<CreateThemeRequest>,
) -> AppResult<(StatusCode, Json<IdResponse>)> {
    if payload.name.trim().is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }

    let mut conn = state.db()?;
    let new_theme = NewTheme {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        active: payload.active,
    };

    if let Err(err) = diesel::insert_into(themes::table)
        .values(&new_theme)
        .execute(&mut conn)
    {
        return Err(match unique_constraint_name(&err) {
            Some("themes_name_key") => {
                AppError::conflict(ErrorKind::Conflict, "theme name already exists")
            }
            _ => AppError::from(err),
        });
    }

    Ok((StatusCode::CREATED, Json(IdResponse { id: new_theme.id })))
}

pub async fn create_round(
    State(state): State<AppState>,
    AdminUser(_user): AdminUser,
    Json(payload): Json<CreateRoundRequest>,
) -> AppResult<(StatusCode, Json<IdResponse>)> {
    if payload.round_name.trim().is_empty() {
        return Err(AppError::bad_request("round_name must not be empty"));
    }
    if payload.end_time <= payload.start_time {
        return Err(AppError::bad_request("end_time must be after start_time"));
    }
    if payload.max_score <= 0 {
        return Err(AppError::bad_request("max_score must be positive"));
    }

    let mut conn = state.db()?;
    let new_round = NewMentoringRound {
        id: Uuid::new_v4(),
        round_name: payload.round_name.trim().to_string(),
        description: payload.description.trim().to_string(),
        start_time: payload.start_time.naive_utc(),
        end_time: payload.end_time.naive_utc(),
        max_score: payload.max_score,
    };

    diesel::insert_into(mentoring_rounds::table)
        .values(&new_round)
        .execute(&mut conn)?;

    Ok((StatusCode::CREATED, Json(IdResponse { id: new_round.id })))
}

pub async fn create_floor(
    State(state): State<AppState>,
    AdminUser(_user): AdminUser,
    Json(payload): Json<CreateFloorRequest>,
) -> AppResult<(StatusCode, Json<IdResponse>)> {
    let mut conn = state.db()?;
    let new_floor = NewFloor {
        id: Uuid::new_v4(),
        floor_number: payload.floor_number,
    };

    if let Err(err) = diesel::insert_into(floors::table)
        .values(&new_floor)
        .execute(&mut conn)
    {
        return Err(match unique_constraint_name(&err) {
            Some("floors_floor_number_key") => {
                AppError::conflict(ErrorKind::Conflict, "floor already exists")
            }
            _ => AppError::from(err),
        });
    }

    Ok((StatusCode::CREATED, Json(IdResponse { id: new_floor.id })))
}

pub async fn create_room(
    State(state): State<AppState>,
    AdminUser(_user): AdminUser,
    Json(payload): Json<CreateRoomRequest>,
) -> AppResult<(StatusCode, Json<IdResponse>)> {
    let mut conn = state.db()?;

    floors::table.find(payload.floor_id).first::<Floor>(&mut conn)?;

    let new_room = NewRoom {
        id: Uuid::new_v4(),
        room_number: payload.room_number,
        floor_id: payload.floor_id,
    };

    if let Err(err) = diesel::insert_into(rooms::table)
        .values(&new_room)
        .execute(&mut conn)
    {
        return Err(match unique_constraint_name(&err) {
            Some("rooms_floor_id_room_number_key") => {
                AppError::conflict(ErrorKind::Conflict, "room already exists on that floor")
            }
            _ => AppError::from(err),
        });
    }

    Ok((StatusCode::CREATED, Json(IdResponse { id: new_room.id })))
}

pub async fn create_mentor_assignment(
    State(state): State<AppState>,
    AdminUser(_user): AdminUser,
    Json(payload): Json<CreateMentorAssignmentRequest>,
) -> AppResult<(StatusCode, Json<IdResponse>)> {
    let mut conn = state.db()?;

    let mentor: User = users::table
        .find(payload.mentor_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;
    if Role::parse(&mentor.role) != Some(Role::Mentor) {
        return Err(AppError::bad_request("user is not a mentor"));
    }

    floors::table.find(payload.floor_id).first::<Floor>(&mut conn)?;
    let room: Room = rooms::table.find(payload.room_id).first(&mut conn)?;
    if room.floor_id != payload.floor_id {
        return Err(AppError::bad_request("room is not on that floor"));
    }

    let duplicate: bool = diesel::select(exists(
        mentor_assignments::table
            .filter(mentor_assignments::mentor_id.eq(payload.mentor_id))
            .filter(mentor_assignments::floor_id.eq(payload.floor_id))
            .filter(mentor_assignments::room_id.eq(payload.room_id)),
    ))
    .get_result(&mut conn)?;
    if duplicate {
        return Err(AppError::conflict(
            ErrorKind::Conflict,
            "mentor already assigned to that floor/room",
        ));
    }

    let new_assignment = NewMentorAssignment {
        id: Uuid::new_v4(),
        mentor_id: payload.mentor_id,
        floor_id: payload.floor_id,
        room_id: payload.room_id,
    };

    if let Err(err) = diesel::insert_into(mentor_assignments::table)
        .values(&new_assignment)
        .execute(&mut conn)
    {
        return Err(match unique_constraint_name(&err) {
            Some("mentor_assignments_unique_idx") => AppError::conflict(
                ErrorKind::Conflict,
                "mentor already assigned to that floor/room",
            ),
            _ => AppError::from(err),
        });
    }

    Ok((
        StatusCode::CREATED,
        Json(IdResponse {
            id: new_assignment.id,
        }),
    ))
}

pub async fn update_settings(
    State(state): State<AppState>,
    AdminUser(_user): AdminUser,
    Json(payload): Json<UpdateSettingsRequest>,
) -> AppResult<Json<SettingsResponse>> {
    let mut conn = state.db()?;

    let current = settings::team_size_limits(&mut conn)?;
    let min = payload.team_size_min.unwrap_or(current.min);
    let max = payload.team_size_max.unwrap_or(current.max);

    if !(TEAM_SIZE_LOWER_BOUND..=TEAM_SIZE_UPPER_BOUND).contains(&min)
        || !(TEAM_SIZE_LOWER_BOUND..=TEAM_SIZE_UPPER_BOUND).contains(&max)
    {
        return Err(AppError::bad_request(format!(
            "team sizes must be between {TEAM_SIZE_LOWER_BOUND} and {TEAM_SIZE_UPPER_BOUND}"
        )));
    }
    if min > max {
        return Err(AppError::bad_request(
            "team_size_min must not exceed team_size_max",
        ));
    }

    if payload.team_size_min.is_some() {
        settings::put_setting(&mut conn, KEY_TEAM_SIZE_MIN, &min.to_string())?;
    }
    if payload.team_size_max.is_some() {
        settings::put_setting(&mut conn, KEY_TEAM_SIZE_MAX, &max.to_string())?;
    }
    if let Some(visible) = payload.rankings_visible {
        settings::put_setting(
            &mut conn,
            KEY_RANKINGS_VISIBLE,
            if visible { "true" } else { "false" },
        )?;
    }

    let limits = settings::team_size_limits(&mut conn)?;
    let rankings_visible = settings::rankings_visible(&mut conn)?;
    Ok(Json(SettingsResponse {
        team_size_min: limits.min,
        team_size_max: limits.max,
        rankings_visible,
    }))
}
