use async_trait::async_trait;
use sha2::{Digest, Sha256};
use crate::domain::ports::{MeetingCredentials, MeetingProvisioner, MeetingRequest};
use crate::error::AppError;
use super::generate_password;

/// Builds a checksummed BigBlueButton join link. Requires both the API base
/// URL and the shared secret.
pub struct BigBlueButtonProvisioner {
    base_url: Option<String>,
    shared_secret: Option<String>,
}

impl BigBlueButtonProvisioner {
    pub fn new(base_url: Option<String>, shared_secret: Option<String>) -> Self {
        Self {
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
            shared_secret,
        }
    }
}

/// BBB API checksum: sha256 over call name, query string and shared secret.
pub fn checksum(call: &str, query: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(call.as_bytes());
    hasher.update(query.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl MeetingProvisioner for BigBlueButtonProvisioner {
    async fn provision(&self, request: &MeetingRequest<'_>) -> Result<MeetingCredentials, AppError> {
        let (Some(base_url), Some(secret)) = (&self.base_url, &self.shared_secret) else {
            return Err(AppError::Provisioning("BigBlueButton is not configured".into()));
        };

        let password = generate_password(12);
        let query = format!("meetingID={}&password={}&redirect=true", request.session_id, password);
        let sum = checksum("join", &query, secret);

        Ok(MeetingCredentials {
            meeting_id: request.session_id.to_string(),
            meeting_url: format!("{}/api/join?{}&checksum={}", base_url, query, sum),
            password: Some(password),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::infra::meeting::test_support::request;

    #[test]
    fn test_checksum_is_stable() {
        let a = checksum("join", "meetingID=m1&password=p", "secret");
        let b = checksum("join", "meetingID=m1&password=p", "secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, checksum("create", "meetingID=m1&password=p", "secret"));
    }

    #[tokio::test]
    async fn test_join_url_carries_checksum() {
        let provisioner = BigBlueButtonProvisioner::new(Some("https://bbb.example.org/bigbluebutton/".into()), Some("s3cret".into()));
        let creds = provisioner.provision(&request()).await.unwrap();
        let password = creds.password.clone().unwrap();
        let query = format!("meetingID={}&password={}&redirect=true", request().session_id, password);

        assert_eq!(creds.meeting_id, request().session_id);
        assert_eq!(
            creds.meeting_url,
            format!("https://bbb.example.org/bigbluebutton/api/join?{}&checksum={}", query, checksum("join", &query, "s3cret"))
        );
    }

    #[tokio::test]
    async fn test_missing_configuration_fails() {
        let provisioner = BigBlueButtonProvisioner::new(Some("https://bbb.example.org".into()), None);
        let err = provisioner.provision(&request()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Provisioning);
    }
}
