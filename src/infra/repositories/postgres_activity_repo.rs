use crate::domain::models::activity_log::ActivityLog;
use crate::domain::ports::ActivityLogRepository;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresActivityRepo {
    pool: PgPool,
}

impl PostgresActivityRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLogRepository for PostgresActivityRepo {
    async fn record(&self, entry: &ActivityLog) -> Result<(), AppError> {
        sqlx::query("INSERT INTO activity_logs (id, session_id, actor_id, action, changes, created_at) VALUES ($1, $2, $3, $4, $5, $6)")
            .bind(&entry.id)
            .bind(&entry.session_id)
            .bind(&entry.actor_id)
            .bind(&entry.action)
            .bind(&entry.changes)
            .bind(entry.created_at)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn list_by_session(&self, session_id: &str) -> Result<Vec<ActivityLog>, AppError> {
        sqlx::query_as::<_, ActivityLog>("SELECT * FROM activity_logs WHERE session_id = $1 ORDER BY created_at ASC")
            .bind(session_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
