use async_trait::async_trait;
use uuid::Uuid;
use crate::domain::models::live_session::Platform;
use crate::domain::ports::{MeetingCredentials, MeetingProvisioner, MeetingRequest};
use crate::error::AppError;
use super::generate_password;

/// Credentials generated in-process for platforms without a remote integration.
pub struct LocalProvisioner {
    platform: Platform,
    base_url: String,
}

impl LocalProvisioner {
    pub fn new(platform: Platform, base_url: String) -> Self {
        Self { platform, base_url: base_url.trim_end_matches('/').to_string() }
    }
}

#[async_trait]
impl MeetingProvisioner for LocalProvisioner {
    async fn provision(&self, _request: &MeetingRequest<'_>) -> Result<MeetingCredentials, AppError> {
        let meeting_id = Uuid::new_v4().simple().to_string();
        Ok(MeetingCredentials {
            meeting_url: format!("{}/{}/{}", self.base_url, self.platform.as_str(), meeting_id),
            meeting_id,
            password: Some(generate_password(10)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::meeting::test_support::request;

    #[tokio::test]
    async fn test_generates_unique_credentials() {
        let provisioner = LocalProvisioner::new(Platform::Zoom, "https://meet.example.org/".into());
        let first = provisioner.provision(&request()).await.unwrap();
        let second = provisioner.provision(&request()).await.unwrap();

        assert_ne!(first.meeting_id, second.meeting_id);
        assert!(first.meeting_url.starts_with("https://meet.example.org/zoom/"));
        assert!(first.meeting_url.ends_with(&first.meeting_id));
        let password = first.password.unwrap();
        assert_eq!(password.len(), 10);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
