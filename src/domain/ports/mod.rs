use crate::domain::models::{
    activity_log::ActivityLog, course::{Chapter, Course, Lesson, Topic}, enrollment::NotifiableEnrollment,
    job::Job, live_session::LiveSession, notification::SessionNotification, user::User,
};
use crate::domain::services::conflict::TimeRange;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Source of "now" for every time-gated decision.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Catalog lookups, scoped to the transaction they are issued from.
#[async_trait]
pub trait ReferenceStore: Send {
    async fn find_course(&mut self, id: &str) -> Result<Option<Course>, AppError>;
    async fn find_user(&mut self, id: &str) -> Result<Option<User>, AppError>;
    async fn find_chapter(&mut self, id: &str) -> Result<Option<Chapter>, AppError>;
    async fn find_topic(&mut self, id: &str) -> Result<Option<Topic>, AppError>;
    async fn find_lesson(&mut self, id: &str) -> Result<Option<Lesson>, AppError>;
}

/// Live session reads and writes inside a transaction.
#[async_trait]
pub trait SessionStore: Send {
    /// Loads a session and, where the backend supports it, locks the row until commit.
    async fn find_session(&mut self, id: &str) -> Result<Option<LiveSession>, AppError>;
    async fn slug_exists(&mut self, slug: &str) -> Result<bool, AppError>;
    async fn find_tutor_overlaps(&mut self, tutor_id: &str, range: &TimeRange) -> Result<Vec<LiveSession>, AppError>;
    async fn find_chapter_overlaps(&mut self, course_id: &str, chapter_id: &str, range: &TimeRange) -> Result<Vec<LiveSession>, AppError>;
    async fn insert(&mut self, session: &LiveSession) -> Result<LiveSession, AppError>;
    async fn update(&mut self, session: &LiveSession) -> Result<LiveSession, AppError>;
}

/// One create/update unit of work. Dropping it without `commit` rolls back.
#[async_trait]
pub trait SchedulingTx: ReferenceStore + SessionStore {
    async fn commit(self: Box<Self>) -> Result<(), AppError>;
    async fn rollback(self: Box<Self>) -> Result<(), AppError>;
}

#[async_trait]
pub trait LiveSessionRepository: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn SchedulingTx>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<LiveSession>, AppError>;
    async fn list_by_course(&self, course_id: &str, include_cancelled: bool) -> Result<Vec<LiveSession>, AppError>;
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    async fn count_confirmed(&self, session_id: &str) -> Result<i64, AppError>;
    /// Confirmed plus waitlisted.
    async fn count_active(&self, session_id: &str) -> Result<i64, AppError>;
    async fn list_notifiable(&self, session_id: &str) -> Result<Vec<NotifiableEnrollment>, AppError>;
}

#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    async fn record(&self, entry: &ActivityLog) -> Result<(), AppError>;
    async fn list_by_session(&self, session_id: &str) -> Result<Vec<ActivityLog>, AppError>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, job: &Job) -> Result<Job, AppError>;
    async fn find_pending(&self, limit: i32) -> Result<Vec<Job>, AppError>;
    async fn list_by_session(&self, session_id: &str) -> Result<Vec<Job>, AppError>;
    async fn update_status(&self, id: &str, status: &str, error_message: Option<String>) -> Result<(), AppError>;
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn send(&self, notification: &SessionNotification) -> Result<(), AppError>;
}

/// What a provisioner needs to know about the session it hosts.
#[derive(Debug, Clone)]
pub struct MeetingRequest<'a> {
    pub session_id: &'a str,
    pub slug: &'a str,
    pub title: &'a str,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i32,
}

/// Join credentials, opaque to the scheduling core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingCredentials {
    pub meeting_id: String,
    pub meeting_url: String,
    pub password: Option<String>,
}

#[async_trait]
pub trait MeetingProvisioner: Send + Sync {
    async fn provision(&self, request: &MeetingRequest<'_>) -> Result<MeetingCredentials, AppError>;
}
