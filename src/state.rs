use std::sync::Arc;
use crate::domain::ports::{
    ActivityLogRepository, EnrollmentRepository, JobRepository, LiveSessionRepository, NotificationService,
};
use crate::domain::services::scheduling::SchedulingEngine;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub session_repo: Arc<dyn LiveSessionRepository>,
    pub enrollment_repo: Arc<dyn EnrollmentRepository>,
    pub activity_repo: Arc<dyn ActivityLogRepository>,
    pub job_repo: Arc<dyn JobRepository>,
    pub notification_service: Arc<dyn NotificationService>,
    pub engine: Arc<SchedulingEngine>,
}
