use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::QueryResult;

use crate::schema::system_settings;

pub const KEY_TEAM_SIZE_MIN: &str = "team_size_min";
pub const KEY_TEAM_SIZE_MAX: &str = "team_size_max";
pub const KEY_RANKINGS_VISIBLE: &str = "rankings_visible";

pub const DEFAULT_TEAM_SIZE_MIN: i32 = 1;
pub const DEFAULT_TEAM_SIZE_MAX: i32 = 4;

/// Hard bounds the admin-configured sizes must stay within.
pub const TEAM_SIZE_LOWER_BOUND: i32 = 1;
pub const TEAM_SIZE_UPPER_BOUND: i32 = 10;

#[derive(Debug, Clone, Copy)]
pub struct TeamSizeLimits {
    pub min: i32,
    pub max: i32,
}

/// Settings are plain key/value rows resolved fresh per request; missing or
/// malformed values fall back to the defaults above.
pub fn team_size_limits(conn: &mut PgConnection) -> QueryResult<TeamSizeLimits> {
    let min = lookup_i32(conn, KEY_TEAM_SIZE_MIN)?.unwrap_or(DEFAULT_TEAM_SIZE_MIN);
    let max = lookup_i32(conn, KEY_TEAM_SIZE_MAX)?.unwrap_or(DEFAULT_TEAM_SIZE_MAX);
    Ok(TeamSizeLimits { min, max })
}

pub fn rankings_visible(conn: &mut PgConnection) -> QueryResult<bool> {
    let value = lookup(conn, KEY_RANKINGS_VISIBLE)?;
    Ok(match value.as_deref() {
        Some(raw) => raw == "1" || raw.eq_ignore_ascii_case("true"),
        None => false,
    })
}

pub fn put_setting(conn: &mut PgConnection, key: &str, value: &str) -> QueryResult<()> {
    let now = Utc::now().naive_utc();
    diesel::insert_into(system_settings::table)
        .values((
            system_settings::key.eq(key),
            system_settings::value.eq(value),
        ))
        .on_conflict(system_settings::key)
        .do_update()
        .set((
            system_settings::value.eq(value),
            system_settings::updated_at.eq(now),
        ))
        .execute(conn)?;
    Ok(())
}

fn lookup(conn: &mut PgConnection, key: &str) -> QueryResult<Option<String>> {
    system_settings::table
        .find(key)
        .select(system_settings::value)
        .first::<String>(conn)
        .optional()
}

fn lookup_i32(conn: &mut PgConnection, key: &str) -> QueryResult<Option<i32>> {
    let raw = lookup(conn, key)?;
    Ok(raw.and_then(|value| match value.parse::<i32>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(key, value = %value, "ignoring malformed setting");
            None
        }
    }))
}
