use crate::domain::models::enrollment::{NotifiableEnrollment, STATUS_CONFIRMED, STATUS_WAITLISTED};
use crate::domain::ports::EnrollmentRepository;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

pub struct SqliteEnrollmentRepo {
    pool: SqlitePool,
}

impl SqliteEnrollmentRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnrollmentRepository for SqliteEnrollmentRepo {
    async fn count_confirmed(&self, session_id: &str) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM enrollments WHERE session_id = ? AND status = ?")
            .bind(session_id)
            .bind(STATUS_CONFIRMED)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(row.get::<i64, _>("count"))
    }

    async fn count_active(&self, session_id: &str) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM enrollments WHERE session_id = ? AND status IN (?, ?)")
            .bind(session_id)
            .bind(STATUS_CONFIRMED)
            .bind(STATUS_WAITLISTED)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(row.get::<i64, _>("count"))
    }

    async fn list_notifiable(&self, session_id: &str) -> Result<Vec<NotifiableEnrollment>, AppError> {
        sqlx::query_as::<_, NotifiableEnrollment>(
            "SELECT e.id AS enrollment_id, e.user_id, u.email, e.status
             FROM enrollments e JOIN users u ON u.id = e.user_id
             WHERE e.session_id = ? AND e.status IN (?, ?)
             ORDER BY e.created_at ASC"
        )
            .bind(session_id)
            .bind(STATUS_CONFIRMED)
            .bind(STATUS_WAITLISTED)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
