use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

// Read-only projections of the catalog tables. Each entity is looked up by id
// and carries only the parent links needed to validate a session's scope.

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub instructor_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Chapter {
    pub id: String,
    pub course_id: String,
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Topic {
    pub id: String,
    pub course_id: String,
    pub chapter_id: Option<String>,
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Lesson {
    pub id: String,
    pub course_id: String,
    pub topic_id: Option<String>,
    pub title: String,
}
