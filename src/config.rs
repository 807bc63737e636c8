use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_public_key: String, // Ed25519 public key of the external auth service (PEM)
    pub auth_issuer: String,
    pub notification_service_url: String,
    pub notification_service_token: String,
    pub max_session_minutes: i32,
    pub default_meeting_platform: String,
    pub jitsi_base_url: String,
    pub bbb_base_url: Option<String>,
    pub bbb_shared_secret: Option<String>,
    pub custom_meeting_base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            jwt_public_key: env::var("JWT_PUBLIC_KEY").expect("JWT_PUBLIC_KEY must be set (Ed25519 Public Key)"),
            auth_issuer: env::var("AUTH_ISSUER").unwrap_or_else(|_| "https://auth.classroom.local".to_string()),
            notification_service_url: env::var("NOTIFICATION_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/notify".to_string()),
            notification_service_token: env::var("NOTIFICATION_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            max_session_minutes: env::var("MAX_SESSION_MINUTES").unwrap_or_else(|_| "480".to_string()).parse().expect("MAX_SESSION_MINUTES must be a number"),
            default_meeting_platform: env::var("DEFAULT_MEETING_PLATFORM").unwrap_or_else(|_| "jitsi".to_string()),
            jitsi_base_url: env::var("JITSI_BASE_URL").unwrap_or_else(|_| "https://meet.jit.si".to_string()),
            bbb_base_url: env::var("BBB_BASE_URL").ok(),
            bbb_shared_secret: env::var("BBB_SHARED_SECRET").ok(),
            custom_meeting_base_url: env::var("CUSTOM_MEETING_BASE_URL").unwrap_or_else(|_| "https://meet.classroom.local".to_string()),
        }
    }
}
