use serde::{Deserialize, Serialize};

/// Access token claims issued by the external auth service.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,

    #[serde(rename = "https://classroom.local/claims/csrf")]
    pub csrf_token: String,
}
