use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use foodscanner_core::domain::authentication::{
    AuthError, parse_bearer_header, verify_access_token,
};
use tracing::warn;

use super::http::server::{api_entities::api_error::ApiError, app_state::AppState};

/// Caller identified by a verified bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: Option<String>,
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::SecretNotConfigured => ApiError::InternalServerError(error.to_string()),
            _ => ApiError::Unauthorized(error.to_string()),
        }
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let token = parse_bearer_header(header)?;

        let secret = state.args.auth.jwt_secret.as_deref().unwrap_or_default();
        let claims = verify_access_token(token, secret).map_err(|e| {
            warn!("Rejected access token: {}", e);
            e
        })?;

        Ok(AuthenticatedUser {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}
