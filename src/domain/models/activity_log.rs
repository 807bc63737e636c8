use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

pub const ACTION_CREATED: &str = "CREATED";
pub const ACTION_UPDATED: &str = "UPDATED";

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct ActivityLog {
    pub id: String,
    pub session_id: String,
    pub actor_id: String,
    pub action: String,
    pub changes: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    pub fn new(session_id: String, actor_id: String, action: &str, changes: Vec<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id,
            actor_id,
            action: action.to_string(),
            changes: Json(changes),
            created_at: at,
        }
    }
}
