use std::sync::Arc;
use chrono::{DateTime, Utc};
use tracing::{error, info, info_span, Instrument};
use crate::domain::models::{
    activity_log::ActivityLog,
    job::{Job, JOB_SESSION_CHANGED},
};
use crate::domain::ports::{ActivityLogRepository, EnrollmentRepository, JobRepository};
use crate::error::AppError;

/// A committed create or update, as handed to audit and notification.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub session_id: String,
    pub actor_id: String,
    pub action: &'static str,
    pub changes: Vec<String>,
    pub notify_worthy: Vec<String>,
    pub at: DateTime<Utc>,
}

/// Fans committed changes out to the activity log and the notification queue.
/// Failures are logged and dropped; they never reach the caller.
#[derive(Clone)]
pub struct ChangeDispatcher {
    activity_repo: Arc<dyn ActivityLogRepository>,
    job_repo: Arc<dyn JobRepository>,
    enrollment_repo: Arc<dyn EnrollmentRepository>,
    detached: bool,
}

impl ChangeDispatcher {
    pub fn new(
        activity_repo: Arc<dyn ActivityLogRepository>,
        job_repo: Arc<dyn JobRepository>,
        enrollment_repo: Arc<dyn EnrollmentRepository>,
    ) -> Self {
        Self { activity_repo, job_repo, enrollment_repo, detached: true }
    }

    /// Delivers on the publishing task instead of spawning, so the caller
    /// observes the audit row and queued job as soon as `publish` returns.
    pub fn inline(mut self) -> Self {
        self.detached = false;
        self
    }

    /// Must only be called after the owning transaction committed.
    pub async fn publish(&self, event: ChangeEvent) {
        let span = info_span!(
            "change_dispatch",
            session_id = %event.session_id,
            action = %event.action
        );

        if !self.detached {
            self.run(event).instrument(span).await;
            return;
        }

        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.run(event).await }.instrument(span));
    }

    async fn run(&self, event: ChangeEvent) {
        if let Err(e) = self.deliver(&event).await {
            error!("Change dispatch failed: {}", e);
        }
    }

    pub async fn deliver(&self, event: &ChangeEvent) -> Result<(), AppError> {
        let entry = ActivityLog::new(
            event.session_id.clone(),
            event.actor_id.clone(),
            event.action,
            event.changes.clone(),
            event.at,
        );
        self.activity_repo.record(&entry).await?;

        if event.notify_worthy.is_empty() {
            return Ok(());
        }

        let audience = self.enrollment_repo.count_active(&event.session_id).await?;
        if audience == 0 {
            info!("No confirmed or waitlisted enrollments; skipping notification");
            return Ok(());
        }

        let job = Job::new(JOB_SESSION_CHANGED, event.session_id.clone(), event.notify_worthy.clone(), event.at);
        self.job_repo.create(&job).await?;
        info!("Queued {} notification job {} for {} recipients", JOB_SESSION_CHANGED, job.id, audience);
        Ok(())
    }
}
