pub mod jwt;
pub mod password;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use serde::{Deserialize, Serialize};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Participant,
    Mentor,
    Volunteer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Participant => "participant",
            Role::Mentor => "mentor",
            Role::Volunteer => "volunteer",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "participant" => Some(Role::Participant),
            "mentor" => Some(Role::Mentor),
            "volunteer" => Some(Role::Volunteer),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: uuid::Uuid,
    pub username: String,
    pub role: Role,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::unauthorized())?;

        let claims = state
            .jwt
            .verify_token(bearer.token())
            .map_err(|_| AppError::unauthorized())?;

        let role = Role::parse(&claims.role).ok_or_else(AppError::unauthorized)?;

        Ok(AuthenticatedUser {
            user_id: claims.sub,
            username: claims.username,
            role,
        })
    }
}

// Role gates live at the extractor boundary so handlers declare their
// required capability in the signature and the workflow code below never
// runs for the wrong role.

macro_rules! role_extractor {
    ($name:ident, $($role:path)|+, $denied:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub AuthenticatedUser);

        #[async_trait]
        impl FromRequestParts<AppState> for $name {
            type Rejection = AppError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &AppState,
            ) -> Result<Self, Self::Rejection> {
                let user = AuthenticatedUser::from_request_parts(parts, state).await?;
                if !matches!(user.role, $($role)|+) {
                    return Err(AppError::forbidden($denied));
                }
                Ok(Self(user))
            }
        }
    };
}

role_extractor!(AdminUser, Role::Admin, "admin access required");
role_extractor!(MentorUser, Role::Mentor, "mentor access required");
role_extractor!(
    ParticipantUser,
    Role::Participant,
    "participant access required"
);
role_extractor!(
    StaffUser,
    Role::Mentor | Role::Admin,
    "mentor or admin access required"
);
