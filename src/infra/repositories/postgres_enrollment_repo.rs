use crate::domain::models::enrollment::{NotifiableEnrollment, STATUS_CONFIRMED, STATUS_WAITLISTED};
use crate::domain::ports::EnrollmentRepository;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::{PgPool, Row};

pub struct PostgresEnrollmentRepo {
    pool: PgPool,
}

impl PostgresEnrollmentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnrollmentRepository for PostgresEnrollmentRepo {
    async fn count_confirmed(&self, session_id: &str) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM enrollments WHERE session_id = $1 AND status = $2")
            .bind(session_id)
            .bind(STATUS_CONFIRMED)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(row.get::<i64, _>("count"))
    }

    async fn count_active(&self, session_id: &str) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM enrollments WHERE session_id = $1 AND status IN ($2, $3)")
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
             WHERE e.session_id = $1 AND e.status IN ($2, $3)
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
