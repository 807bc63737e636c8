#![allow(dead_code)]

use classroom_backend::{
    api::router::create_router,
    config::Config,
    domain::models::{
        auth::Claims,
        live_session::SessionDraft,
        notification::SessionNotification,
        user::Actor,
    },
    domain::ports::{Clock, NotificationService},
    domain::services::provisioning::ProvisionerRegistry,
    error::AppError,
    infra::factory::{assemble_state, Repositories},
    infra::meeting::build_registry,
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::Value;
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_ISSUER: &str = "test-issuer";

/// Clock the tests move by hand.
pub struct TestClock {
    now: Mutex<DateTime<Utc>>,
}

impl TestClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[derive(Default)]
pub struct RecordingNotificationService {
    pub sent: Mutex<Vec<SessionNotification>>,
}

#[async_trait]
impl NotificationService for RecordingNotificationService {
    async fn send(&self, notification: &SessionNotification) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Ids of a seeded course with its instructor and one chapter.
pub struct Catalog {
    pub tutor_id: String,
    pub course_id: String,
    pub chapter_id: String,
}

pub struct AuthHeaders {
    pub access_token: String,
    pub csrf_token: String,
}

pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub clock: Arc<TestClock>,
    pub notifications: Arc<RecordingNotificationService>,
}

/// 2025-05-01T00:00:00Z, a month before the sessions the tests schedule.
pub fn default_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap()
}

pub fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, day, hour, minute, 0).unwrap()
}

pub fn actor() -> Actor {
    Actor { id: "admin-1".to_string() }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_overrides(|_, _| {}).await
    }

    /// Lets a test swap repositories or provisioners before the engine is built.
    pub async fn with_overrides<F>(customize: F) -> Self
    where
        F: FnOnce(&mut Repositories, &mut ProvisionerRegistry),
    {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let pub_key_pem = include_str!("../tests/keys/test_public.pem");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            jwt_public_key: pub_key_pem.to_string(),
            auth_issuer: TEST_ISSUER.to_string(),
            notification_service_url: "http://localhost".to_string(),
            notification_service_token: "token".to_string(),
            max_session_minutes: 480,
            default_meeting_platform: "jitsi".to_string(),
            jitsi_base_url: "https://meet.jit.si".to_string(),
            bbb_base_url: None,
            bbb_shared_secret: None,
            custom_meeting_base_url: "https://meet.classroom.test".to_string(),
        };

        let mut repos = Repositories::sqlite(pool.clone());
        let mut registry = build_registry(&config);
        customize(&mut repos, &mut registry);

        let clock = Arc::new(TestClock::new(default_now()));
        let notifications = Arc::new(RecordingNotificationService::default());

        let state = Arc::new(assemble_state(
            &config,
            repos,
            registry,
            notifications.clone(),
            clock.clone(),
            true,
        ));

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            clock,
            notifications,
        }
    }

    pub async fn seed_user(&self, name: &str) -> String {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO users (id, name, email, role, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(&id)
            .bind(name)
            .bind(format!("{}@classroom.test", id))
            .bind("TUTOR")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .unwrap();
        id
    }

    pub async fn seed_course(&self, instructor_id: &str) -> String {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO courses (id, title, instructor_id, created_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind("Systems Programming")
            .bind(instructor_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .unwrap();
        id
    }

    pub async fn seed_chapter(&self, course_id: &str) -> String {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO chapters (id, course_id, title) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(course_id)
            .bind("Ownership")
            .execute(&self.pool)
            .await
            .unwrap();
        id
    }

    pub async fn seed_topic(&self, course_id: &str, chapter_id: Option<&str>) -> String {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO topics (id, course_id, chapter_id, title) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(course_id)
            .bind(chapter_id)
            .bind("Borrowing")
            .execute(&self.pool)
            .await
            .unwrap();
        id
    }

    pub async fn seed_lesson(&self, course_id: &str, topic_id: Option<&str>) -> String {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO lessons (id, course_id, topic_id, title) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(course_id)
            .bind(topic_id)
            .bind("Lifetimes")
            .execute(&self.pool)
            .await
            .unwrap();
        id
    }

    pub async fn seed_catalog(&self) -> Catalog {
        let tutor_id = self.seed_user("Tutor One").await;
        let course_id = self.seed_course(&tutor_id).await;
        let chapter_id = self.seed_chapter(&course_id).await;
        Catalog { tutor_id, course_id, chapter_id }
    }

    /// Adds `count` enrollments with `status`, each for a fresh student.
    pub async fn seed_enrollments(&self, session_id: &str, status: &str, count: usize) {
        for i in 0..count {
            let user_id = self.seed_user(&format!("Student {}", i)).await;
            sqlx::query("INSERT INTO enrollments (id, session_id, user_id, status, created_at) VALUES (?, ?, ?, ?, ?)")
                .bind(Uuid::new_v4().to_string())
                .bind(session_id)
                .bind(&user_id)
                .bind(status)
                .bind(Utc::now())
                .execute(&self.pool)
                .await
                .unwrap();
        }
    }

    pub async fn count_sessions(&self) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM live_sessions")
            .fetch_one(&self.pool)
            .await
            .unwrap();
        count
    }

    pub fn token_for(&self, subject: &str) -> AuthHeaders {
        let priv_key_pem = include_str!("../tests/keys/test_private.pem");
        let key = EncodingKey::from_ed_pem(priv_key_pem.as_bytes()).unwrap();
        let csrf_token = Uuid::new_v4().to_string();
        let now = Utc::now().timestamp() as usize;

        let claims = Claims {
            iss: TEST_ISSUER.to_string(),
            sub: subject.to_string(),
            aud: "classroom-admin".to_string(),
            exp: now + 3600,
            iat: now,
            jti: Uuid::new_v4().to_string(),
            csrf_token: csrf_token.clone(),
        };

        let access_token = encode(&Header::new(Algorithm::EdDSA), &claims, &key).unwrap();
        AuthHeaders { access_token, csrf_token }
    }

    /// Sends a request authenticated with the access-token cookie and CSRF header.
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>, auth: &AuthHeaders) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::COOKIE, format!("access_token={}", auth.access_token))
            .header("X-CSRF-Token", &auth.csrf_token);

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, json)
    }
}

/// One-hour draft on `catalog` with capacity 10/1.
pub fn draft(catalog: &Catalog, title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> SessionDraft {
    SessionDraft {
        course_id: catalog.course_id.clone(),
        tutor_id: catalog.tutor_id.clone(),
        title: title.to_string(),
        start_time: start,
        end_time: Some(end),
        max_attendees: 10,
        min_attendees: 1,
        ..Default::default()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
