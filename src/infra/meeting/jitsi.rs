use async_trait::async_trait;
use crate::domain::ports::{MeetingCredentials, MeetingProvisioner, MeetingRequest};
use crate::error::AppError;

/// Jitsi rooms exist as soon as someone joins, so provisioning is naming a room.
pub struct JitsiProvisioner {
    base_url: String,
}

impl JitsiProvisioner {
    pub fn new(base_url: String) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string() }
    }
}

#[async_trait]
impl MeetingProvisioner for JitsiProvisioner {
    async fn provision(&self, request: &MeetingRequest<'_>) -> Result<MeetingCredentials, AppError> {
        let suffix: String = request.session_id.chars().filter(|c| c.is_ascii_alphanumeric()).take(8).collect();
        let room = format!("{}-{}", request.slug, suffix);
        Ok(MeetingCredentials {
            meeting_url: format!("{}/{}", self.base_url, room),
            meeting_id: room,
            password: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::meeting::test_support::request;

    #[tokio::test]
    async fn test_room_is_named_after_slug_and_session() {
        let provisioner = JitsiProvisioner::new("https://meet.jit.si".into());
        let creds = provisioner.provision(&request()).await.unwrap();
        assert_eq!(creds.meeting_id, "office-hours-5f0c1f9e");
        assert_eq!(creds.meeting_url, "https://meet.jit.si/office-hours-5f0c1f9e");
        assert!(creds.password.is_none());
    }
}
