use chrono::NaiveDateTime;
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub tech_stack: Option<String>,
    pub floor_number: Option<i32>,
    pub room_number: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub tech_stack: Option<String>,
    pub floor_number: Option<i32>,
    pub room_number: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = themes)]
pub struct Theme {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = themes)]
pub struct NewTheme {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = floors)]
pub struct Floor {
    pub id: Uuid,
    pub floor_number: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = floors)]
pub struct NewFloor {
    pub id: Uuid,
    pub floor_number: i32,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = rooms)]
#[diesel(belongs_to(Floor))]
pub struct Room {
    pub id: Uuid,
    pub room_number: i32,
    pub floor_id: Uuid,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = rooms)]
pub struct NewRoom {
    pub id: Uuid,
    pub room_number: i32,
    pub floor_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = teams)]
#[diesel(belongs_to(Theme))]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub idea: String,
    pub problem_statement: String,
    pub theme_id: Uuid,
    pub leader_id: Uuid,
    pub status: String,
    pub floor_id: Option<Uuid>,
    pub room_id: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = teams)]
pub struct NewTeam {
    pub id: Uuid,
    pub name: String,
    pub idea: String,
    pub problem_statement: String,
    pub theme_id: Uuid,
    pub leader_id: Uuid,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = team_members)]
#[diesel(belongs_to(Team))]
#[diesel(belongs_to(User))]
#[diesel(primary_key(user_id))]
pub struct TeamMember {
    pub user_id: Uuid,
    pub team_id: Uuid,
    pub joined_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = team_members)]
pub struct NewTeamMember {
    pub user_id: Uuid,
    pub team_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = join_requests)]
#[diesel(belongs_to(Team))]
#[diesel(belongs_to(User))]
pub struct JoinRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub team_id: Uuid,
    pub message: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = join_requests)]
pub struct NewJoinRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub team_id: Uuid,
    pub message: String,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = team_invitations)]
#[diesel(belongs_to(Team))]
pub struct TeamInvitation {
    pub id: Uuid,
    pub team_id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub message: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = team_invitations)]
pub struct NewTeamInvitation {
    pub id: Uuid,
    pub team_id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub message: String,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = mentoring_rounds)]
pub struct MentoringRound {
    pub id: Uuid,
    pub round_name: String,
    pub description: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub max_score: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = mentoring_rounds)]
pub struct NewMentoringRound {
    pub id: Uuid,
    pub round_name: String,
    pub description: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub max_score: i32,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = scores)]
#[diesel(belongs_to(Team))]
#[diesel(belongs_to(MentoringRound, foreign_key = round_id))]
pub struct Score {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub team_id: Uuid,
    pub round_id: Uuid,
    pub score: i32,
    pub comment: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = scores)]
pub struct NewScore {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub team_id: Uuid,
    pub round_id: Uuid,
    pub score: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = submissions)]
#[diesel(belongs_to(Team))]
pub struct Submission {
    pub id: Uuid,
    pub team_id: Uuid,
    pub project_name: String,
    pub description: String,
    pub repo_url: String,
    pub demo_url: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = submissions)]
pub struct NewSubmission {
    pub id: Uuid,
    pub team_id: Uuid,
    pub project_name: String,
    pub description: String,
    pub repo_url: String,
    pub demo_url: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = support_messages)]
pub struct SupportMessage {
    pub id: Uuid,
    pub from_id: Uuid,
    pub from_role: String,
    pub to_role: String,
    pub message: String,
    pub floor_id: Uuid,
    pub room_id: Uuid,
    pub status: String,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<NaiveDateTime>,
    pub resolution_notes: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = support_messages)]
pub struct NewSupportMessage {
    pub id: Uuid,
    pub from_id: Uuid,
    pub from_role: String,
    pub to_role: String,
    pub message: String,
    pub floor_id: Uuid,
    pub room_id: Uuid,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = mentor_assignments)]
pub struct MentorAssignment {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub floor_id: Uuid,
    pub room_id: Uuid,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = mentor_assignments)]
pub struct NewMentorAssignment {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub floor_id: Uuid,
    pub room_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = system_settings)]
#[diesel(primary_key(key))]
pub struct SystemSetting {
    pub key: String,
    pub value: String,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = system_settings)]
pub struct NewSystemSetting {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = refresh_tokens)]
#[diesel(belongs_to(User))]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub revoked_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = refresh_tokens)]
pub struct NewRefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}
