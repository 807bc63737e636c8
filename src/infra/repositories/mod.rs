pub mod sqlite_live_session_repo;
pub mod sqlite_enrollment_repo;
pub mod sqlite_activity_repo;
pub mod sqlite_job_repo;

pub mod postgres_live_session_repo;
pub mod postgres_enrollment_repo;
pub mod postgres_activity_repo;
pub mod postgres_job_repo;
