use axum::{
    extract::{FromRequestParts, FromRef},
    http::{header, request::Parts},
};
use crate::state::AppState;
use crate::domain::models::auth::Claims;
use crate::domain::models::user::Actor;
use crate::error::AppError;
use std::sync::Arc;
use tower_cookies::Cookies;
use jsonwebtoken::{decode, DecodingKey, Validation, Algorithm};
use tracing::Span;

pub const ACCESS_TOKEN_AUDIENCE: &str = "classroom-admin";

pub struct AuthUser(pub Actor);

enum TokenSource {
    Cookie,
    Bearer,
}

fn extract_token(parts: &Parts) -> Result<(String, TokenSource), AppError> {
    if let Some(value) = parts.headers.get(header::AUTHORIZATION) {
        let value = value.to_str().map_err(|_| AppError::Unauthorized)?;
        let token = value.strip_prefix("Bearer ").ok_or(AppError::Unauthorized)?;
        return Ok((token.trim().to_string(), TokenSource::Bearer));
    }

    let cookies = parts.extensions.get::<Cookies>()
        .ok_or(AppError::Internal)?;
    let token = cookies.get("access_token")
        .ok_or(AppError::Unauthorized)?
        .value()
        .to_string();
    Ok((token, TokenSource::Cookie))
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let (access_token, source) = extract_token(parts)?;

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let decoding_key = DecodingKey::from_ed_pem(app_state.config.jwt_public_key.as_bytes())
            .map_err(|_| AppError::InternalWithMsg("JWT public key is not a valid Ed25519 PEM".into()))?;

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_audience(&[ACCESS_TOKEN_AUDIENCE]);
        validation.set_issuer(&[&app_state.config.auth_issuer]);

        let token_data = decode::<Claims>(&access_token, &decoding_key, &validation)
            .map_err(|_| AppError::Unauthorized)?;

        // Cookies ride along on cross-site requests; bearer tokens do not.
        let method = &parts.method;
        if matches!(source, TokenSource::Cookie) && method != "GET" && method != "HEAD" && method != "OPTIONS" {
            let csrf_header_val = parts.headers.get("X-CSRF-Token")
                .ok_or_else(|| AppError::Forbidden("Missing CSRF token".into()))?
                .to_str()
                .map_err(|_| AppError::Forbidden("Malformed CSRF token".into()))?;

            if csrf_header_val != token_data.claims.csrf_token {
                return Err(AppError::Forbidden("CSRF token mismatch".into()));
            }
        }

        let actor = Actor { id: token_data.claims.sub };

        Span::current().record("actor_id", &actor.id);

        Ok(AuthUser(actor))
    }
}
