use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use diesel::{
    dsl::{count_star, exists},
    prelude::*,
    PgConnection,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{ParticipantUser, Role};
use crate::error::{unique_constraint_name, AppError, AppResult, ErrorKind};
use crate::models::{JoinRequest, NewJoinRequest, NewTeamInvitation, NewTeamMember, Team, TeamInvitation, User};
use crate::schema::{join_requests, team_invitations, team_members, teams, users};
use crate::settings;
use crate::state::AppState;
use crate::status::{RequestStatus, TeamStatus};

use super::teams::{approved_team_led_by, member_count, to_iso};

/// Any-status cap on join requests from one user to one team.
const JOIN_REQUEST_LIMIT: i64 = 3;

#[derive(Deserialize)]
pub struct SendJoinRequestBody {
    pub team_id: Uuid,
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize)]
pub struct SendInvitationBody {
    pub to_user_id: Uuid,
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize)]
pub struct JoinRequestResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub team_id: Uuid,
    pub team_name: Option<String>,
    pub message: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct InvitationResponse {
    pub id: Uuid,
    pub team_id: Uuid,
    pub team_name: Option<String>,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub message: String,
    pub status: String,
    pub created_at: String,
}

pub async fn send_join_request(
    State(state): State<AppState>,
    ParticipantUser(user): ParticipantUser,
    Json(payload): Json<SendJoinRequestBody>,
) -> AppResult<(StatusCode, Json<JoinRequestResponse>)> {
    let mut conn = state.db()?;

    let request = conn.transaction::<JoinRequest, AppError, _>(|conn| {
        let already_member: bool = diesel::select(exists(
            team_members::table.filter(team_members::user_id.eq(user.user_id)),
        ))
        .get_result(conn)?;
        if already_member {
            return Err(AppError::conflict(
                ErrorKind::AlreadyInTeam,
                "user already belongs to a team",
            ));
        }

        let team: Team = teams::table
            .find(payload.team_id)
            .first(conn)
            .optional()?
            .ok_or_else(AppError::not_found)?;
        if team.status != TeamStatus::Approved.as_str() {
            return Err(AppError::conflict(
                ErrorKind::TeamNotApproved,
                "team is not approved",
            ));
        }

        let limits = settings::team_size_limits(conn)?;
        if member_count(conn, team.id)? >= i64::from(limits.max) {
            return Err(AppError::conflict(ErrorKind::TeamFull, "team is full"));
        }

        let total_requests: i64 = join_requests::table
            .filter(join_requests::user_id.eq(user.user_id))
            .filter(join_requests::team_id.eq(team.id))
            .select(count_star())
            .first(conn)?;
        if total_requests >= JOIN_REQUEST_LIMIT {
            return Err(AppError::conflict(
                ErrorKind::RequestLimitExceeded,
                "request limit for this team reached",
            ));
        }

        let duplicate_pending: bool = diesel::select(exists(
            join_requests::table
                .filter(join_requests::user_id.eq(user.user_id))
                .filter(join_requests::team_id.eq(team.id))
                .filter(join_requests::status.eq(RequestStatus::Pending.as_str())),
        ))
        .get_result(conn)?;
        if duplicate_pending {
            return Err(AppError::conflict(
                ErrorKind::DuplicatePending,
                "a pending request for this team already exists",
            ));
        }

        let new_request = NewJoinRequest {
            id: Uuid::new_v4(),
            user_id: user.user_id,
            team_id: team.id,
            message: payload.message.trim().to_string(),
            status: RequestStatus::Pending.as_str().to_string(),
        };

        if let Err(err) = diesel::insert_into(join_requests::table)
            .values(&new_request)
            .execute(conn)
        {
            return Err(match unique_constraint_name(&err) {
                Some("join_requests_pending_unique_idx") => AppError::conflict(
                    ErrorKind::DuplicatePending,
                    "a pending request for this team already exists",
                ),
                _ => AppError::from(err),
            });
        }

        join_requests::table
            .find(new_request.id)
            .first(conn)
            .map_err(AppError::from)
    })?;

    let team_name = team_name_of(&mut conn, request.team_id)?;
    Ok((
        StatusCode::CREATED,
        Json(to_join_request_response(request, team_name)),
    ))
}

pub async fn cancel_join_request(
    State(state): State<AppState>,
    ParticipantUser(user): ParticipantUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;

    // Only the requester may cancel, and only while pending.
    let deleted = diesel::delete(
        join_requests::table
            .find(request_id)
            .filter(join_requests::user_id.eq(user.user_id))
            .filter(join_requests::status.eq(RequestStatus::Pending.as_str())),
    )
    .execute(&mut conn)?;

    if deleted == 0 {
        return Err(AppError::not_found());
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn my_join_requests(
    State(state): State<AppState>,
    ParticipantUser(user): ParticipantUser,
) -> AppResult<Json<Vec<JoinRequestResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<(JoinRequest, String)> = join_requests::table
        .inner_join(teams::table)
        .filter(join_requests::user_id.eq(user.user_id))
        .order(join_requests::created_at.desc())
        .select((join_requests::all_columns, teams::name))
        .load(&mut conn)?;

    let response = rows
        .into_iter()
        .map(|(request, team_name)| to_join_request_response(request, Some(team_name)))
        .collect();
    Ok(Json(response))
}

pub async fn team_join_requests(
    State(state): State<AppState>,
    ParticipantUser(user): ParticipantUser,
) -> AppResult<Json<Vec<JoinRequestResponse>>> {
    let mut conn = state.db()?;

    let team = approved_team_led_by(&mut conn, user.user_id)?;

    let rows: Vec<JoinRequest> = join_requests::table
        .filter(join_requests::team_id.eq(team.id))
        .filter(join_requests::status.eq(RequestStatus::Pending.as_str()))
        .order(join_requests::created_at.asc())
        .load(&mut conn)?;

    let response = rows
        .into_iter()
        .map(|request| to_join_request_response(request, Some(team.name.clone())))
        .collect();
    Ok(Json(response))
}

pub async fn accept_join_request(
    State(state): State<AppState>,
    ParticipantUser(user): ParticipantUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<JoinRequestResponse>> {
    let mut conn = state.db()?;

    let (request, team_name) = conn.transaction::<(JoinRequest, String), AppError, _>(|conn| {
        let request: JoinRequest = join_requests::table
            .find(request_id)
            .first(conn)
            .optional()?
            .ok_or_else(AppError::not_found)?;

        // The row lock on the team serializes concurrent accepts so the
        // capacity check below cannot be double-passed.
        let team: Team = teams::table
            .find(request.team_id)
            .for_update()
            .first(conn)?;
        if team.leader_id != user.user_id {
            return Err(AppError::not_team_leader());
        }

        resolve_request(conn, &request, RequestStatus::Accepted)?;

        let limits = settings::team_size_limits(conn)?;
        if member_count(conn, team.id)? >= i64::from(limits.max) {
            return Err(AppError::conflict(ErrorKind::TeamFull, "team is full"));
        }

        insert_member_guarded(conn, request.user_id, team.id)?;

        let refreshed = join_requests::table.find(request.id).first(conn)?;
        Ok((refreshed, team.name))
    })?;

    Ok(Json(to_join_request_response(request, Some(team_name))))
}

pub async fn reject_join_request(
    State(state): State<AppState>,
    ParticipantUser(user): ParticipantUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<JoinRequestResponse>> {
    let mut conn = state.db()?;

    let (request, team_name) = conn.transaction::<(JoinRequest, String), AppError, _>(|conn| {
        let request: JoinRequest = join_requests::table
            .find(request_id)
            .first(conn)
            .optional()?
            .ok_or_else(AppError::not_found)?;

        let team: Team = teams::table.find(request.team_id).first(conn)?;
        if team.leader_id != user.user_id {
            return Err(AppError::not_team_leader());
        }

        resolve_request(conn, &request, RequestStatus::Rejected)?;

        let refreshed = join_requests::table.find(request.id).first(conn)?;
        Ok((refreshed, team.name))
    })?;

    Ok(Json(to_join_request_response(request, Some(team_name))))
}

pub async fn send_invitation(
    State(state): State<AppState>,
    ParticipantUser(user): ParticipantUser,
    Json(payload): Json<SendInvitationBody>,
) -> AppResult<(StatusCode, Json<InvitationResponse>)> {
    let mut conn = state.db()?;

    let (invitation, team_name) =
        conn.transaction::<(TeamInvitation, String), AppError, _>(|conn| {
            let team = approved_team_led_by(conn, user.user_id)?;

            let limits = settings::team_size_limits(conn)?;
            if member_count(conn, team.id)? >= i64::from(limits.max) {
                return Err(AppError::conflict(ErrorKind::TeamFull, "team is full"));
            }

            let target: User = users::table
                .find(payload.to_user_id)
                .first(conn)
                .optional()?
                .ok_or_else(AppError::not_found)?;
            if Role::parse(&target.role) != Some(Role::Participant) {
                return Err(AppError::conflict(
                    ErrorKind::TargetUnavailable,
                    "invited user is not a participant",
                ));
            }

            let target_teamed: bool = diesel::select(exists(
                team_members::table.filter(team_members::user_id.eq(target.id)),
            ))
            .get_result(conn)?;
            if target_teamed {
                return Err(AppError::conflict(
                    ErrorKind::TargetUnavailable,
                    "invited user already belongs to a team",
                ));
            }

            let target_leads: bool = diesel::select(exists(
                teams::table.filter(teams::leader_id.eq(target.id)).filter(
                    teams::status.eq_any([
                        TeamStatus::Pending.as_str(),
                        TeamStatus::Approved.as_str(),
                    ]),
                ),
            ))
            .get_result(conn)?;
            if target_leads {
                return Err(AppError::conflict(
                    ErrorKind::TargetUnavailable,
                    "invited user already leads a team",
                ));
            }

            let duplicate_invite: bool = diesel::select(exists(
                team_invitations::table
                    .filter(team_invitations::team_id.eq(team.id))
                    .filter(team_invitations::to_user_id.eq(target.id))
                    .filter(team_invitations::status.eq(RequestStatus::Pending.as_str())),
            ))
            .get_result(conn)?;
            if duplicate_invite {
                return Err(AppError::conflict(
                    ErrorKind::DuplicateInvite,
                    "a pending invitation for this user already exists",
                ));
            }

            let new_invitation = NewTeamInvitation {
                id: Uuid::new_v4(),
                team_id: team.id,
                from_user_id: user.user_id,
                to_user_id: target.id,
                message: payload.message.trim().to_string(),
                status: RequestStatus::Pending.as_str().to_string(),
            };

            if let Err(err) = diesel::insert_into(team_invitations::table)
                .values(&new_invitation)
                .execute(conn)
            {
                return Err(match unique_constraint_name(&err) {
                    Some("team_invitations_pending_unique_idx") => AppError::conflict(
                        ErrorKind::DuplicateInvite,
                        "a pending invitation for this user already exists",
                    ),
                    _ => AppError::from(err),
                });
            }

            let invitation = team_invitations::table.find(new_invitation.id).first(conn)?;
            Ok((invitation, team.name))
        })?;

    Ok((
        StatusCode::CREATED,
        Json(to_invitation_response(invitation, Some(team_name))),
    ))
}

pub async fn my_invitations(
    State(state): State<AppState>,
    ParticipantUser(user): ParticipantUser,
) -> AppResult<Json<Vec<InvitationResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<(TeamInvitation, String)> = team_invitations::table
        .inner_join(teams::table)
        .filter(team_invitations::to_user_id.eq(user.user_id))
        .filter(team_invitations::status.eq(RequestStatus::Pending.as_str()))
        .order(team_invitations::created_at.desc())
        .select((team_invitations::all_columns, teams::name))
        .load(&mut conn)?;

    let response = rows
        .into_iter()
        .map(|(invitation, team_name)| to_invitation_response(invitation, Some(team_name)))
        .collect();
    Ok(Json(response))
}

pub async fn accept_invitation(
    State(state): State<AppState>,
    ParticipantUser(user): ParticipantUser,
    Path(invitation_id): Path<Uuid>,
) -> AppResult<Json<InvitationResponse>> {
    let mut conn = state.db()?;

    let (invitation, team_name) =
        conn.transaction::<(TeamInvitation, String), AppError, _>(|conn| {
            let invitation: TeamInvitation = team_invitations::table
                .find(invitation_id)
                .filter(team_invitations::to_user_id.eq(user.user_id))
                .first(conn)
                .optional()?
                .ok_or_else(AppError::not_found)?;

            let team: Team = teams::table
                .find(invitation.team_id)
                .for_update()
                .first(conn)?;

            resolve_invitation(conn, &invitation, RequestStatus::Accepted)?;

            let limits = settings::team_size_limits(conn)?;
            if member_count(conn, team.id)? >= i64::from(limits.max) {
                return Err(AppError::conflict(ErrorKind::TeamFull, "team is full"));
            }

            insert_member_guarded(conn, user.user_id, team.id)?;

            let refreshed = team_invitations::table.find(invitation.id).first(conn)?;
            Ok((refreshed, team.name))
        })?;

    Ok(Json(to_invitation_response(invitation, Some(team_name))))
}

pub async fn reject_invitation(
    State(state): State<AppState>,
    ParticipantUser(user): ParticipantUser,
    Path(invitation_id): Path<Uuid>,
) -> AppResult<Json<InvitationResponse>> {
    let mut conn = state.db()?;

    let (invitation, team_name) =
        conn.transaction::<(TeamInvitation, String), AppError, _>(|conn| {
            let invitation: TeamInvitation = team_invitations::table
                .find(invitation_id)
                .filter(team_invitations::to_user_id.eq(user.user_id))
                .first(conn)
                .optional()?
                .ok_or_else(AppError::not_found)?;

            let team: Team = teams::table.find(invitation.team_id).first(conn)?;

            resolve_invitation(conn, &invitation, RequestStatus::Rejected)?;

            let refreshed = team_invitations::table.find(invitation.id).first(conn)?;
            Ok((refreshed, team.name))
        })?;

    Ok(Json(to_invitation_response(invitation, Some(team_name))))
}

/// Membership insert guarded by the exclusivity constraint; a concurrent
/// accept that wins the race surfaces as `AlreadyInTeam` here rather than a
/// second membership row.
fn insert_member_guarded(conn: &mut PgConnection, user_id: Uuid, team_id: Uuid) -> AppResult<()> {
    let already_member: bool = diesel::select(exists(
        team_members::table.filter(team_members::user_id.eq(user_id)),
    ))
    .get_result(conn)?;
    if already_member {
        return Err(AppError::conflict(
            ErrorKind::AlreadyInTeam,
            "user already belongs to a team",
        ));
    }

    let membership = NewTeamMember { user_id, team_id };
    if let Err(err) = diesel::insert_into(team_members::table)
        .values(&membership)
        .execute(conn)
    {
        return Err(match unique_constraint_name(&err) {
            Some("team_members_pkey") => AppError::conflict(
                ErrorKind::AlreadyInTeam,
                "user already belongs to a team",
            ),
            _ => AppError::from(err),
        });
    }
    Ok(())
}

fn resolve_request(
    conn: &mut PgConnection,
    request: &JoinRequest,
    next: RequestStatus,
) -> AppResult<()> {
    let current = RequestStatus::parse(&request.status).map_err(AppError::internal)?;
    if !current.can_transition(next) {
        return Err(AppError::conflict(
            ErrorKind::InvalidTransition,
            "join request is already resolved",
        ));
    }

    diesel::update(join_requests::table.find(request.id))
        .set((
            join_requests::status.eq(next.as_str()),
            join_requests::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)?;
    Ok(())
}

fn resolve_invitation(
    conn: &mut PgConnection,
    invitation: &TeamInvitation,
    next: RequestStatus,
) -> AppResult<()> {
    let current = RequestStatus::parse(&invitation.status).map_err(AppError::internal)?;
    if !current.can_transition(next) {
        return Err(AppError::conflict(
            ErrorKind::InvalidTransition,
            "invitation is already resolved",
        ));
    }

    diesel::update(team_invitations::table.find(invitation.id))
        .set((
            team_invitations::status.eq(next.as_str()),
            team_invitations::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)?;
    Ok(())
}

fn team_name_of(conn: &mut PgConnection, team_id: Uuid) -> AppResult<Option<String>> {
    let name = teams::table
        .find(team_id)
        .select(teams::name)
        .first::<String>(conn)
        .optional()?;
    Ok(name)
}

fn to_join_request_response(request: JoinRequest, team_name: Option<String>) -> JoinRequestResponse {
    JoinRequestResponse {
        id: request.id,
        user_id: request.user_id,
        team_id: request.team_id,
        team_name,
        message: request.message,
        status: request.status,
        created_at: to_iso(request.created_at),
    }
}

fn to_invitation_response(invitation: TeamInvitation, team_name: Option<String>) -> InvitationResponse {
    InvitationResponse {
        id: invitation.id,
        team_id: invitation.team_id,
        team_name,
        from_user_id: invitation.from_user_id,
        to_user_id: invitation.to_user_id,
        message: invitation.message,
        status: invitation.status,
        created_at: to_iso(invitation.created_at),
    }
}
