use crate::domain::models::activity_log::ActivityLog;
use crate::domain::ports::ActivityLogRepository;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteActivityRepo {
    pool: SqlitePool,
}

impl SqliteActivityRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLogRepository for SqliteActivityRepo {
    async fn record(&self, entry: &ActivityLog) -> Result<(), AppError> {
        sqlx::query("INSERT INTO activity_logs (id, session_id, actor_id, action, changes, created_at) VALUES (?, ?, ?, ?, ?, ?)")
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
        sqlx::query_as::<_, ActivityLog>("SELECT * FROM activity_logs WHERE session_id = ? ORDER BY created_at ASC")
            .bind(session_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
