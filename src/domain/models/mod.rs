pub mod activity_log;
pub mod auth;
pub mod course;
pub mod enrollment;
pub mod job;
pub mod live_session;
pub mod notification;
pub mod user;
