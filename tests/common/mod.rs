use std::env;

use anyhow::{anyhow, ensure, Context, Result};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, NaiveDateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use hackhub::auth::jwt::JwtService;
use hackhub::auth::password;
use hackhub::config::AppConfig;
use hackhub::db::{self, PgPool};
use hackhub::models::{NewFloor, NewMentoringRound, NewRoom, NewTheme, NewUser};
use hackhub::routes;
use hackhub::state::AppState;
use http_body_util::BodyExt;
use once_cell::sync::Lazy;
use serde::Serialize;
use tokio::sync::Mutex;
use tower::util::ServiceExt;
use uuid::Uuid;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

static DB_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        let database_url = env::var("TEST_DATABASE_URL")
            .context("TEST_DATABASE_URL must be set for integration tests")?;

        let config = AppConfig {
            database_url: database_url.clone(),
            database_max_pool_size: db::DEFAULT_MAX_POOL_SIZE,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            jwt_secret: "test-secret".to_string(),
            jwt_issuer: "test-issuer".to_string(),
            jwt_audience: "test-audience".to_string(),
            jwt_expiry_minutes: 60,
            refresh_token_expiry_days: 30,
            refresh_cookie_secure: false,
            refresh_cookie_domain: None,
            cors_allowed_origin: None,
        };

        let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
        prepare_database(&pool).await?;

        let jwt = JwtService::from_config(&config)?;
        let state = AppState::new(pool.clone(), config, jwt);
        let router = routes::create_router(state.clone());

        Ok(Self { state, router })
    }

    pub async fn cleanup(&self) -> Result<()> {
        let pool = self.state.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get cleanup connection: {err}"))?;
            truncate_all(&mut conn)?;
            Ok(())
        })
        .await
        .context("cleanup task panicked")?
    }

    pub async fn insert_user(&self, username: &str, pass: &str, role: &str) -> Result<Uuid> {
        self.insert_user_with_location(username, pass, role, None, None)
            .await
    }

    #[allow(dead_code)]
    pub async fn insert_user_with_location(
        &self,
        username: &str,
        pass: &str,
        role: &str,
        floor_number: Option<i32>,
        room_number: Option<i32>,
    ) -> Result<Uuid> {
        let username = username.to_string();
        let pass = pass.to_string();
        let role = role.to_string();
        self.with_conn(move |conn| {
            let password_hash = password::hash_password(&pass)?;
            let user = NewUser {
                id: Uuid::new_v4(),
                username,
                password_hash,
                role,
                tech_stack: None,
                floor_number,
                room_number,
            };
            diesel::insert_into(hackhub::schema::users::table)
                .values(&user)
                .execute(conn)
                .context("failed to insert user")?;
            Ok(user.id)
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn insert_theme(&self, name: &str, active: bool) -> Result<Uuid> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            let theme = NewTheme {
                id: Uuid::new_v4(),
                name,
                active,
            };
            diesel::insert_into(hackhub::schema::themes::table)
                .values(&theme)
                .execute(conn)
                .context("failed to insert theme")?;
            Ok(theme.id)
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn insert_floor(&self, floor_number: i32) -> Result<Uuid> {
        self.with_conn(move |conn| {
            let floor = NewFloor {
                id: Uuid::new_v4(),
                floor_number,
            };
            diesel::insert_into(hackhub::schema::floors::table)
                .values(&floor)
                .execute(conn)
                .context("failed to insert floor")?;
            Ok(floor.id)
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn insert_room(&self, room_number: i32, floor_id: Uuid) -> Result<Uuid> {
        self.with_conn(move |conn| {
            let room = NewRoom {
                id: Uuid::new_v4(),
                room_number,
                floor_id,
            };
            diesel::insert_into(hackhub::schema::rooms::table)
                .values(&room)
                .execute(conn)
                .context("failed to insert room")?;
            Ok(room.id)
        })
        .await
    }

    /// A round whose window spans the present, so it reads as active.
    #[allow(dead_code)]
    pub async fn insert_round(&self, round_name: &str, max_score: i32) -> Result<Uuid> {
        let start = Utc::now().naive_utc() - Duration::hours(1);
        let end = Utc::now().naive_utc() + Duration::hours(1);
        self.insert_round_between(round_name, max_score, start, end)
            .await
    }

    #[allow(dead_code)]
    pub async fn insert_round_between(
        &self,
        round_name: &str,
        max_score: i32,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> Result<Uuid> {
        let round_name = round_name.to_string();
        self.with_conn(move |conn| {
            let round = NewMentoringRound {
                id: Uuid::new_v4(),
                round_name,
                description: String::new(),
                start_time,
                end_time,
                max_score,
            };
            diesel::insert_into(hackhub::schema::mentoring_rounds::table)
                .values(&round)
                .execute(conn)
                .context("failed to insert round")?;
            Ok(round.id)
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.with_conn(move |conn| {
            hackhub::settings::put_setting(conn, &key, &value)
                .context("failed to store setting")?;
            Ok(())
        })
        .await
    }

    pub async fn login_token(&self, username: &str, pass: &str) -> Result<String> {
        #[derive(Serialize)]
        struct LoginPayload<'a> {
            username: &'a str,
            password: &'a str,
        }

        let response = self
            .post_json(
                "/api/auth/login",
                &LoginPayload {
                    username,
                    password: pass,
                },
                None,
            )
            .await?;

        ensure!(
            response.status() == StatusCode::OK,
            "login failed with status {}",
            response.status()
        );

        let body = body_to_vec(response.into_body()).await?;
        #[derive(serde::Deserialize)]
        struct LoginResponse {
            access_token: String,
        }
        let parsed: LoginResponse = serde_json::from_slice(&body)?;
        Ok(parsed.access_token)
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::POST, path, payload, token).await
    }

    #[allow(dead_code)]
    pub async fn patch_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::PATCH, path, payload, token).await
    }

    #[allow(dead_code)]
    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::PUT, path, payload, token).await
    }

    async fn send_json<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let builder = Request::builder().method(Method::DELETE).uri(path);
        let builder = if let Some(token) = token {
            builder.header("authorization", format!("Bearer {token}"))
        } else {
            builder
        };
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut PgConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.state.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get database connection: {err}"))?;
            f(&mut conn)
        })
        .await
        .context("connection task panicked")?
    }
}

pub async fn acquire_db_lock() -> tokio::sync::MutexGuard<'static, ()> {
    DB_LOCK.lock().await
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

async fn prepare_database(pool: &PgPool) -> Result<()> {
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut conn = pool
            .get()
            .map_err(|err| anyhow!("failed to acquire connection: {err}"))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|err| anyhow!("failed to run migrations: {err}"))?;
        truncate_all(&mut conn)?;
        Ok(())
    })
    .await
    .context("migration task panicked")?
}

fn truncate_all(conn: &mut PgConnection) -> Result<()> {
    conn.batch_execute(
        "TRUNCATE TABLE refresh_tokens, system_settings, mentor_assignments, support_messages, \
         submissions, scores, mentoring_rounds, team_invitations, join_requests, team_members, \
         teams, rooms, floors, themes, users RESTART IDENTITY CASCADE;",
    )
    .context("failed to truncate tables")?;
    Ok(())
}
