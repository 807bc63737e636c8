use serde::Serialize;
use crate::domain::models::live_session::LiveSession;
use crate::domain::services::lifecycle::Phase;
use crate::domain::services::mutability::ChangeSet;
use crate::domain::services::scheduling::SessionDetail;

#[derive(Serialize)]
pub struct LiveSessionResponse {
    #[serde(flatten)]
    pub session: LiveSession,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_enrolled: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_seats: Option<i64>,
}

impl LiveSessionResponse {
    pub fn summary(session: LiveSession, phase: Phase) -> Self {
        Self { session, phase, total_enrolled: None, available_seats: None }
    }
}

impl From<SessionDetail> for LiveSessionResponse {
    fn from(detail: SessionDetail) -> Self {
        Self {
            session: detail.session,
            phase: detail.phase,
            total_enrolled: Some(detail.total_enrolled),
            available_seats: Some(detail.available_seats),
        }
    }
}

#[derive(Serialize)]
pub struct ChangesResponse {
    pub changed: Vec<String>,
    pub notify_worthy: Vec<String>,
}

impl From<&ChangeSet> for ChangesResponse {
    fn from(changes: &ChangeSet) -> Self {
        Self {
            changed: changes.names(),
            notify_worthy: changes.notify_worthy().iter().map(|f| f.as_str().to_string()).collect(),
        }
    }
}

#[derive(Serialize)]
pub struct UpdateLiveSessionResponse {
    pub session: LiveSessionResponse,
    pub changes: ChangesResponse,
}
