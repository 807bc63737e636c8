use serde::Serialize;
use chrono::{DateTime, Utc};

#[derive(Debug, Serialize, Clone)]
pub struct SessionNotification {
    pub recipient: String,
    pub user_id: String,
    pub enrollment_status: String,
    pub session_id: String,
    pub session_title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_cancelled: bool,
    pub changes: Vec<String>,
}
