use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const STATUS_CONFIRMED: &str = "CONFIRMED";
pub const STATUS_WAITLISTED: &str = "WAITLISTED";
pub const STATUS_CANCELLED: &str = "CANCELLED";

/// Enrollment that should hear about changes to its session.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct NotifiableEnrollment {
    pub enrollment_id: String,
    pub user_id: String,
    pub email: String,
    pub status: String,
}
