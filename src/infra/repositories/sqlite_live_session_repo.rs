use crate::domain::models::{
    course::{Chapter, Course, Lesson, Topic},
    live_session::LiveSession,
    user::User,
};
use crate::domain::ports::{LiveSessionRepository, ReferenceStore, SchedulingTx, SessionStore};
use crate::domain::services::conflict::TimeRange;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool, Transaction};

pub struct SqliteLiveSessionRepo {
    pool: SqlitePool,
}

impl SqliteLiveSessionRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// SQLite has no row locks; the overlap triggers and the unique slug index
/// reject whatever a concurrent writer slipped in.
pub struct SqliteSchedulingTx {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl LiveSessionRepository for SqliteLiveSessionRepo {
    async fn begin(&self) -> Result<Box<dyn SchedulingTx>, AppError> {
        let tx = self.pool.begin().await.map_err(AppError::Database)?;
        Ok(Box::new(SqliteSchedulingTx { tx }))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<LiveSession>, AppError> {
        sqlx::query_as::<_, LiveSession>("SELECT * FROM live_sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_course(&self, course_id: &str, include_cancelled: bool) -> Result<Vec<LiveSession>, AppError> {
        sqlx::query_as::<_, LiveSession>(
            "SELECT * FROM live_sessions WHERE course_id = ? AND (? OR NOT is_cancelled) ORDER BY start_time ASC"
        )
            .bind(course_id)
            .bind(include_cancelled)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}

#[async_trait]
impl ReferenceStore for SqliteSchedulingTx {
    async fn find_course(&mut self, id: &str) -> Result<Option<Course>, AppError> {
        sqlx::query_as::<_, Course>("SELECT id, title, instructor_id, created_at FROM courses WHERE id = ?")
            .bind(id).fetch_optional(&mut *self.tx).await.map_err(AppError::Database)
    }

    async fn find_user(&mut self, id: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT id, name, email, role, created_at FROM users WHERE id = ?")
            .bind(id).fetch_optional(&mut *self.tx).await.map_err(AppError::Database)
    }

    async fn find_chapter(&mut self, id: &str) -> Result<Option<Chapter>, AppError> {
        sqlx::query_as::<_, Chapter>("SELECT id, course_id, title FROM chapters WHERE id = ?")
            .bind(id).fetch_optional(&mut *self.tx).await.map_err(AppError::Database)
    }

    async fn find_topic(&mut self, id: &str) -> Result<Option<Topic>, AppError> {
        sqlx::query_as::<_, Topic>("SELECT id, course_id, chapter_id, title FROM topics WHERE id = ?")
            .bind(id).fetch_optional(&mut *self.tx).await.map_err(AppError::Database)
    }

    async fn find_lesson(&mut self, id: &str) -> Result<Option<Lesson>, AppError> {
        sqlx::query_as::<_, Lesson>("SELECT id, course_id, topic_id, title FROM lessons WHERE id = ?")
            .bind(id).fetch_optional(&mut *self.tx).await.map_err(AppError::Database)
    }
}

#[async_trait]
impl SessionStore for SqliteSchedulingTx {
    async fn find_session(&mut self, id: &str) -> Result<Option<LiveSession>, AppError> {
        sqlx::query_as::<_, LiveSession>("SELECT * FROM live_sessions WHERE id = ?")
            .bind(id).fetch_optional(&mut *self.tx).await.map_err(AppError::Database)
    }

    async fn slug_exists(&mut self, slug: &str) -> Result<bool, AppError> {
        let found: Option<(String,)> = sqlx::query_as("SELECT id FROM live_sessions WHERE slug = ?")
            .bind(slug).fetch_optional(&mut *self.tx).await.map_err(AppError::Database)?;
        Ok(found.is_some())
    }

    async fn find_tutor_overlaps(&mut self, tutor_id: &str, range: &TimeRange) -> Result<Vec<LiveSession>, AppError> {
        sqlx::query_as::<_, LiveSession>(
            "SELECT * FROM live_sessions WHERE tutor_id = ? AND NOT is_cancelled AND start_time < ? AND end_time > ? ORDER BY start_time ASC"
        )
            .bind(tutor_id).bind(range.end).bind(range.start)
            .fetch_all(&mut *self.tx).await.map_err(AppError::Database)
    }

    async fn find_chapter_overlaps(&mut self, course_id: &str, chapter_id: &str, range: &TimeRange) -> Result<Vec<LiveSession>, AppError> {
        sqlx::query_as::<_, LiveSession>(
            "SELECT * FROM live_sessions WHERE course_id = ? AND chapter_id = ? AND NOT is_cancelled AND start_time < ? AND end_time > ? ORDER BY start_time ASC"
        )
            .bind(course_id).bind(chapter_id).bind(range.end).bind(range.start)
            .fetch_all(&mut *self.tx).await.map_err(AppError::Database)
    }

    async fn insert(&mut self, s: &LiveSession) -> Result<LiveSession, AppError> {
        sqlx::query_as::<_, LiveSession>(
            "INSERT INTO live_sessions (id, slug, course_id, chapter_id, topic_id, lesson_id, tutor_id, title, description,
                start_time, end_time, duration_minutes, timezone, max_attendees, min_attendees, waitlist_enabled, waitlist_capacity,
                access_level, requires_approval, platform, meeting_id, meeting_url, meeting_password, agenda, recommended_setup,
                host_notes, recording_prefs, is_cancelled, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&s.id).bind(&s.slug).bind(&s.course_id).bind(&s.chapter_id).bind(&s.topic_id).bind(&s.lesson_id)
            .bind(&s.tutor_id).bind(&s.title).bind(&s.description)
            .bind(s.start_time).bind(s.end_time).bind(s.duration_minutes).bind(&s.timezone)
            .bind(s.max_attendees).bind(s.min_attendees).bind(s.waitlist_enabled).bind(s.waitlist_capacity)
            .bind(&s.access_level).bind(s.requires_approval).bind(&s.platform)
            .bind(&s.meeting_id).bind(&s.meeting_url).bind(&s.meeting_password)
            .bind(&s.agenda).bind(&s.recommended_setup).bind(&s.host_notes).bind(&s.recording_prefs)
            .bind(s.is_cancelled).bind(s.created_at).bind(s.updated_at)
            .fetch_one(&mut *self.tx).await.map_err(AppError::Database)
    }

    async fn update(&mut self, s: &LiveSession) -> Result<LiveSession, AppError> {
        sqlx::query_as::<_, LiveSession>(
            "UPDATE live_sessions SET chapter_id=?, topic_id=?, lesson_id=?, title=?, description=?,
                start_time=?, end_time=?, duration_minutes=?, timezone=?, max_attendees=?, min_attendees=?,
                waitlist_enabled=?, waitlist_capacity=?, access_level=?, requires_approval=?, agenda=?,
                recommended_setup=?, host_notes=?, recording_prefs=?, is_cancelled=?, updated_at=?
             WHERE id=?
             RETURNING *"
        )
            .bind(&s.chapter_id).bind(&s.topic_id).bind(&s.lesson_id).bind(&s.title).bind(&s.description)
            .bind(s.start_time).bind(s.end_time).bind(s.duration_minutes).bind(&s.timezone)
            .bind(s.max_attendees).bind(s.min_attendees).bind(s.waitlist_enabled).bind(s.waitlist_capacity)
            .bind(&s.access_level).bind(s.requires_approval).bind(&s.agenda)
            .bind(&s.recommended_setup).bind(&s.host_notes).bind(&s.recording_prefs).bind(s.is_cancelled).bind(s.updated_at)
            .bind(&s.id)
            .fetch_one(&mut *self.tx).await.map_err(AppError::Database)
    }
}

#[async_trait]
impl SchedulingTx for SqliteSchedulingTx {
    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await.map_err(AppError::Database)
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        self.tx.rollback().await.map_err(AppError::Database)
    }
}
