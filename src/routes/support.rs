use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use diesel::{dsl::exists, prelude::*, PgConnection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, Role, StaffUser};
use crate::error::{AppError, AppResult, ErrorKind};
use crate::models::{NewSupportMessage, SupportMessage, User};
use crate::schema::{floors, mentor_assignments, rooms, support_messages, users};
use crate::state::AppState;
use crate::status::SupportStatus;

use super::teams::{approved_team_led_by, to_iso};

#[derive(Deserialize)]
pub struct FileMessageRequest {
    pub to_role: Role,
    pub message: String,
}

#[derive(Deserialize)]
pub struct ResolveRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct SupportMessageResponse {
    pub id: Uuid,
    pub from_id: Uuid,
    pub from_role: String,
    pub to_role: String,
    pub message: String,
    pub floor_id: Uuid,
    pub room_id: Uuid,
    pub status: String,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<String>,
    pub resolution_notes: Option<String>,
    pub created_at: String,
}

pub async fn file_message(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<FileMessageRequest>,
) -> AppResult<(StatusCode, Json<SupportMessageResponse>)> {
    if !matches!(payload.to_role, Role::Admin | Role::Mentor) {
        return Err(AppError::bad_request(
            "support messages can only be addressed to admin or mentor",
        ));
    }
    if payload.message.trim().is_empty() {
        return Err(AppError::bad_request("message must not be empty"));
    }

    let mut conn = state.db()?;

    let (floor_id, room_id) = sender_location(&mut conn, &user)?;

    let new_message = NewSupportMessage {
        id: Uuid::new_v4(),
        from_id: user.user_id,
        from_role: user.role.as_str().to_string(),
        to_role: payload.to_role.as_str().to_string(),
        message: payload.message.trim().to_string(),
        floor_id,
        room_id,
        status: SupportStatus::Open.as_str().to_string(),
    };

    diesel::insert_into(support_messages::table)
        .values(&new_message)
        .execute(&mut conn)?;

    let message: SupportMessage = support_messages::table.find(new_message.id).first(&mut conn)?;
    Ok((StatusCode::CREATED, Json(to_response(message))))
}

pub async fn my_messages(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<SupportMessageResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<SupportMessage> = support_messages::table
        .filter(support_messages::from_id.eq(user.user_id))
        .order(support_messages::created_at.desc())
        .load(&mut conn)?;

    Ok(Json(rows.into_iter().map(to_response).collect()))
}

/// A mentor sees messages addressed to mentors on a floor/room they are
/// assigned to; an admin sees every message addressed to admins regardless of
/// location.
pub async fn inbox(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
) -> AppResult<Json<Vec<SupportMessageResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<SupportMessage> = match user.role {
        Role::Admin => support_messages::table
            .filter(support_messages::to_role.eq(Role::Admin.as_str()))
            .order(support_messages::created_at.desc())
            .load(&mut conn)?,
        _ => {
            let locations: Vec<(Uuid, Uuid)> = mentor_assignments::table
                .filter(mentor_assignments::mentor_id.eq(user.user_id))
                .select((mentor_assignments::floor_id, mentor_assignments::room_id))
                .load(&mut conn)?;

            let candidates: Vec<SupportMessage> = support_messages::table
                .filter(support_messages::to_role.eq(Role::Mentor.as_str()))
                .order(support_messages::created_at.desc())
                .load(&mut conn)?;

            candidates
                .into_iter()
                .filter(|message| locations.contains(&(message.floor_id, message.room_id)))
                .collect()
        }
    };

    Ok(Json(rows.into_iter().map(to_response).collect()))
}

pub async fn mark_in_progress(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    Path(message_id): Path<Uuid>,
) -> AppResult<Json<SupportMessageResponse>> {
    let mut conn = state.db()?;

    let message = conn.transaction::<SupportMessage, AppError, _>(|conn| {
        let message = visible_message(conn, &user, message_id)?;
        transition(&message, SupportStatus::InProgress)?;

        diesel::update(support_messages::table.find(message.id))
            .set(support_messages::status.eq(SupportStatus::InProgress.as_str()))
            .execute(conn)?;

        support_messages::table
            .find(message.id)
            .first(conn)
            .map_err(AppError::from)
    })?;

    Ok(Json(to_response(message)))
}

pub async fn resolve_message(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    Path(message_id): Path<Uuid>,
    Json(payload): Json<ResolveRequest>,
) -> AppResult<Json<SupportMessageResponse>> {
    let mut conn = state.db()?;

    let message = conn.transaction::<SupportMessage, AppError, _>(|conn| {
        let message = visible_message(conn, &user, message_id)?;
        transition(&message, SupportStatus::Resolved)?;

        diesel::update(support_messages::table.find(message.id))
            .set((
                support_messages::status.eq(SupportStatus::Resolved.as_str()),
                support_messages::resolved_by.eq(Some(user.user_id)),
                support_messages::resolved_at.eq(Some(Utc::now().naive_utc())),
                support_messages::resolution_notes.eq(payload.notes.clone()),
            ))
            .execute(conn)?;

        support_messages::table
            .find(message.id)
            .first(conn)
            .map_err(AppError::from)
    })?;

    Ok(Json(to_response(message)))
}

/// Floor and room the message should be routed under: a participant routes
/// through the approved team they lead, everyone else through the location on
/// their own profile.
fn sender_location(conn: &mut PgConnection, user: &AuthenticatedUser) -> AppResult<(Uuid, Uuid)> {
    if user.role == Role::Participant {
        let team = approved_team_led_by(conn, user.user_id)?;
        return match (team.floor_id, team.room_id) {
            (Some(floor_id), Some(room_id)) => Ok((floor_id, room_id)),
            _ => Err(AppError::conflict(
                ErrorKind::NoLocationAssigned,
                "team has no floor/room assigned yet",
            )),
        };
    }

    let profile: User = users::table.find(user.user_id).first(conn)?;
    let (floor_number, room_number) = match (profile.floor_number, profile.room_number) {
        (Some(floor_number), Some(room_number)) => (floor_number, room_number),
        _ => {
            return Err(AppError::conflict(
                ErrorKind::NoLocationAssigned,
                "no floor/room assigned on profile",
            ))
        }
    };

    let floor_id: Uuid = floors::table
        .filter(floors::floor_number.eq(floor_number))
        .select(floors::id)
        .first(conn)
        .optional()?
        .ok_or_else(|| {
            AppError::conflict(ErrorKind::NoLocationAssigned, "unknown floor on profile")
        })?;

    let room_id: Uuid = rooms::table
        .filter(rooms::floor_id.eq(floor_id))
        .filter(rooms::room_number.eq(room_number))
        .select(rooms::id)
        .first(conn)
        .optional()?
        .ok_or_else(|| {
            AppError::conflict(ErrorKind::NoLocationAssigned, "unknown room on profile")
        })?;

    Ok((floor_id, room_id))
}

fn visible_message(
    conn: &mut PgConnection,
    user: &AuthenticatedUser,
    message_id: Uuid,
) -> AppResult<SupportMessage> {
    let message: SupportMessage = support_messages::table
        .find(message_id)
        .first(conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    let visible = match user.role {
        Role::Admin => message.to_role == Role::Admin.as_str(),
        Role::Mentor => {
            message.to_role == Role::Mentor.as_str()
                && diesel::select(exists(
                    mentor_assignments::table
                        .filter(mentor_assignments::mentor_id.eq(user.user_id))
                        .filter(mentor_assignments::floor_id.eq(message.floor_id))
                        .filter(mentor_assignments::room_id.eq(message.room_id)),
                ))
                .get_result(conn)?
        }
        _ => false,
    };

    if !visible {
        return Err(AppError::not_found());
    }
    Ok(message)
}

fn transition(message: &SupportMessage, next: SupportStatus) -> AppResult<()> {
    let current = SupportStatus::parse(&message.status).map_err(AppError::internal)?;
    if !current.can_transition(next) {
        return Err(AppError::conflict(
            ErrorKind::InvalidTransition,
            "message cannot change to that status",
        ));
    }
    Ok(())
}

fn to_response(message: SupportMessage) -> SupportMessageResponse {
    SupportMessageResponse {
        id: message.id,
        from_id: message.from_id,
        from_role: message.from_role,
        to_role: message.to_role,
        message: message.message,
        floor_id: message.floor_id,
        room_id: message.room_id,
        status: message.status,
        resolved_by: message.resolved_by,
        resolved_at: message.resolved_at.map(to_iso),
        resolution_notes: message.resolution_notes,
        created_at: to_iso(message.created_at),
    }
}
