use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt::Display;

pub type AppResult<T> = Result<T, AppError>;

/// Machine-readable error kinds surfaced in every error body. Conflict kinds
/// name the exact invariant that rejected the write so callers never have to
/// parse messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    AlreadyMember,
    AlreadyInTeam,
    PendingJoinRequestExists,
    AlreadyLeader,
    InvalidTheme,
    DuplicateName,
    TeamNotApproved,
    TeamFull,
    RequestLimitExceeded,
    DuplicatePending,
    NotTeamLeader,
    TargetUnavailable,
    DuplicateInvite,
    InvalidRound,
    ScoreOutOfRange,
    NoLocationAssigned,
    RankingsHidden,
    InvalidTransition,
    NotFound,
    Unauthorized,
    Forbidden,
    Conflict,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::AlreadyMember => "already_member",
            ErrorKind::AlreadyInTeam => "already_in_team",
            ErrorKind::PendingJoinRequestExists => "pending_join_request_exists",
            ErrorKind::AlreadyLeader => "already_leader",
            ErrorKind::InvalidTheme => "invalid_theme",
            ErrorKind::DuplicateName => "duplicate_name",
            ErrorKind::TeamNotApproved => "team_not_approved",
            ErrorKind::TeamFull => "team_full",
            ErrorKind::RequestLimitExceeded => "request_limit_exceeded",
            ErrorKind::DuplicatePending => "duplicate_pending",
            ErrorKind::NotTeamLeader => "not_team_leader",
            ErrorKind::TargetUnavailable => "target_unavailable",
            ErrorKind::DuplicateInvite => "duplicate_invite",
            ErrorKind::InvalidRound => "invalid_round",
            ErrorKind::ScoreOutOfRange => "score_out_of_range",
            ErrorKind::NoLocationAssigned => "no_location_assigned",
            ErrorKind::RankingsHidden => "rankings_hidden",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Internal => "internal",
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorKind::Validation, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            ErrorKind::Unauthorized,
            "unauthorized",
        )
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, ErrorKind::Forbidden, message)
    }

    pub fn not_found() -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            ErrorKind::NotFound,
            "resource not found",
        )
    }

    /// A state invariant rejected the operation. These are surfaced verbatim
    /// and never retried.
    pub fn conflict(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, kind, message)
    }

    pub fn not_team_leader() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            ErrorKind::NotTeamLeader,
            "caller does not lead an approved team",
        )
    }

    pub fn rankings_hidden() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            ErrorKind::RankingsHidden,
            "rankings are currently hidden",
        )
    }

    /// Persistence and other unexpected failures. The cause is logged; the
    /// response body stays generic so internals never leak to callers.
    pub fn internal<E: Display>(error: E) -> Self {
        tracing::error!(error = %error, "internal error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Internal,
            "internal server error",
        )
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = Json(ErrorResponse {
            error: self.message,
            kind: self.kind.as_str(),
        });
        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
}

impl From<diesel::result::Error> for AppError {
    fn from(value: diesel::result::Error) -> Self {
        match value {
            diesel::result::Error::NotFound => AppError::not_found(),
            _ => AppError::internal(value),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        AppError::internal(value)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        AppError::internal(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        AppError::internal(value)
    }
}

/// Name of the unique constraint behind a lost insert race, if that is what
/// failed. Callers map the constraint back onto the conflict kind of the
/// invariant it enforces.
pub fn unique_constraint_name(err: &diesel::result::Error) -> Option<&str> {
    match err {
        diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            info,
        ) => info.constraint_name(),
        _ => None,
    }
}
