use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::state::AppState;
use crate::domain::ports::{
    ActivityLogRepository, Clock, EnrollmentRepository, JobRepository, LiveSessionRepository, NotificationService,
    SystemClock,
};
use crate::domain::services::{
    dispatch::ChangeDispatcher,
    invariants::SessionLimits,
    provisioning::ProvisionerRegistry,
    scheduling::SchedulingEngine,
};
use crate::infra::meeting::build_registry;
use crate::infra::notification::http_notification_service::HttpNotificationService;
use crate::infra::repositories::{
    postgres_activity_repo::PostgresActivityRepo, postgres_enrollment_repo::PostgresEnrollmentRepo,
    postgres_job_repo::PostgresJobRepo, postgres_live_session_repo::PostgresLiveSessionRepo,
    sqlite_activity_repo::SqliteActivityRepo, sqlite_enrollment_repo::SqliteEnrollmentRepo,
    sqlite_job_repo::SqliteJobRepo, sqlite_live_session_repo::SqliteLiveSessionRepo,
};

/// Repository set for one backend, before services are wired on top.
pub struct Repositories {
    pub sessions: Arc<dyn LiveSessionRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub activity: Arc<dyn ActivityLogRepository>,
    pub jobs: Arc<dyn JobRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            sessions: Arc::new(PostgresLiveSessionRepo::new(pool.clone())),
            enrollments: Arc::new(PostgresEnrollmentRepo::new(pool.clone())),
            activity: Arc::new(PostgresActivityRepo::new(pool.clone())),
            jobs: Arc::new(PostgresJobRepo::new(pool)),
        }
    }

    pub fn sqlite(pool: SqlitePool) -> Self {
        Self {
            sessions: Arc::new(SqliteLiveSessionRepo::new(pool.clone())),
            enrollments: Arc::new(SqliteEnrollmentRepo::new(pool.clone())),
            activity: Arc::new(SqliteActivityRepo::new(pool.clone())),
            jobs: Arc::new(SqliteJobRepo::new(pool)),
        }
    }
}

/// Wires the scheduling engine and the rest of the state on top of `repos`.
pub fn assemble_state(
    config: &Config,
    repos: Repositories,
    provisioners: ProvisionerRegistry,
    notification_service: Arc<dyn NotificationService>,
    clock: Arc<dyn Clock>,
    inline_dispatch: bool,
) -> AppState {
    let mut dispatcher = ChangeDispatcher::new(repos.activity.clone(), repos.jobs.clone(), repos.enrollments.clone());
    if inline_dispatch {
        dispatcher = dispatcher.inline();
    }
    let engine = SchedulingEngine::new(
        repos.sessions.clone(),
        repos.enrollments.clone(),
        provisioners,
        dispatcher,
        clock,
        SessionLimits { max_duration_minutes: config.max_session_minutes },
        config.default_meeting_platform.clone(),
    );

    AppState {
        config: config.clone(),
        session_repo: repos.sessions,
        enrollment_repo: repos.enrollments,
        activity_repo: repos.activity,
        job_repo: repos.jobs,
        notification_service,
        engine: Arc::new(engine),
    }
}

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;
    let notification_service = Arc::new(HttpNotificationService::new(
        config.notification_service_url.clone(),
        config.notification_service_token.clone(),
    ));

    let repos = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;
        Repositories::postgres(pool)
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;
        Repositories::sqlite(pool)
    };

    assemble_state(config, repos, build_registry(config), notification_service, Arc::new(SystemClock), false)
}

pub async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

pub async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
