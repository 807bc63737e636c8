use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use crate::domain::services::conflict::TimeRange;

/// Meeting platform a session is hosted on. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Zoom,
    GoogleMeet,
    Teams,
    Jitsi,
    BigBlueButton,
    Custom,
}

impl Platform {
    /// Unknown tags resolve to `Custom`; the raw tag is still what gets stored.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "zoom" => Platform::Zoom,
            "google_meet" => Platform::GoogleMeet,
            "teams" => Platform::Teams,
            "jitsi" => Platform::Jitsi,
            "bigbluebutton" => Platform::BigBlueButton,
            _ => Platform::Custom,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Zoom => "zoom",
            Platform::GoogleMeet => "google_meet",
            Platform::Teams => "teams",
            Platform::Jitsi => "jitsi",
            Platform::BigBlueButton => "bigbluebutton",
            Platform::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    #[default]
    Enrolled,
    Premium,
    InviteOnly,
    Public,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Enrolled => "enrolled",
            AccessLevel::Premium => "premium",
            AccessLevel::InviteOnly => "invite_only",
            AccessLevel::Public => "public",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RecordingPrefs {
    pub auto_record: bool,
    pub share_with_attendees: bool,
    pub retention_days: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct LiveSession {
    pub id: String,
    pub slug: String,
    pub course_id: String,
    pub chapter_id: Option<String>,
    pub topic_id: Option<String>,
    pub lesson_id: Option<String>,
    pub tutor_id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub timezone: String,
    pub max_attendees: i32,
    pub min_attendees: i32,
    pub waitlist_enabled: bool,
    pub waitlist_capacity: i32,
    pub access_level: String,
    pub requires_approval: bool,
    pub platform: String,
    pub meeting_id: Option<String>,
    pub meeting_url: Option<String>,
    pub meeting_password: Option<String>,
    pub agenda: Option<String>,
    pub recommended_setup: Option<String>,
    pub host_notes: Option<String>,
    pub recording_prefs: Json<RecordingPrefs>,
    pub is_cancelled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LiveSession {
    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time)
    }
}

/// Input of `CreateSession`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SessionDraft {
    pub course_id: String,
    pub tutor_id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
    pub timezone: Option<String>,
    pub chapter_id: Option<String>,
    pub topic_id: Option<String>,
    pub lesson_id: Option<String>,
    pub max_attendees: i32,
    pub min_attendees: i32,
    pub waitlist_enabled: Option<bool>,
    pub waitlist_capacity: Option<i32>,
    pub access_level: Option<AccessLevel>,
    pub requires_approval: Option<bool>,
    pub platform: Option<String>,
    pub agenda: Option<String>,
    pub recommended_setup: Option<String>,
    pub host_notes: Option<String>,
    pub recording_prefs: Option<RecordingPrefs>,
}

/// Input of `UpdateSession`. Absent fields are left untouched; an empty string
/// clears an optional text or link field.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SessionPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
    pub timezone: Option<String>,
    pub chapter_id: Option<String>,
    pub topic_id: Option<String>,
    pub lesson_id: Option<String>,
    pub max_attendees: Option<i32>,
    pub min_attendees: Option<i32>,
    pub waitlist_enabled: Option<bool>,
    pub waitlist_capacity: Option<i32>,
    pub access_level: Option<AccessLevel>,
    pub requires_approval: Option<bool>,
    pub platform: Option<String>,
    pub agenda: Option<String>,
    pub recommended_setup: Option<String>,
    pub host_notes: Option<String>,
    pub recording_prefs: Option<RecordingPrefs>,
    pub is_cancelled: Option<bool>,
}

/// Empty strings mean "clear".
pub fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}
