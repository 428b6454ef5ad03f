use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use foodscanner_core::domain::{
    common::entities::app_errors::CoreError, subscription::entities::SubscriptionStatus,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use thiserror::Error;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

/// Body of a 403 returned to callers without an active subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionRequiredDetail {
    pub error: String,
    pub message: String,
    pub status: SubscriptionStatus,
    pub trial_ends_at: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{}", .0.message)]
    SubscriptionRequired(SubscriptionRequiredDetail),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    InternalServerError(String),
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    #[schema(value_type = Object)]
    pub detail: Value,
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Invalid(_) | CoreError::InvalidTier | CoreError::InvalidSignature => {
                ApiError::BadRequest(error.to_string())
            }
            CoreError::InvalidWebhookPayload(_) => ApiError::BadRequest(error.to_string()),
            CoreError::NotFound => ApiError::NotFound(error.to_string()),
            CoreError::PriceNotConfigured(_)
            | CoreError::ProfileNotFound(_)
            | CoreError::CustomerNotFound
            | CoreError::ProfileStoreUnavailable
            | CoreError::WebhookSecretMissing
            | CoreError::ExternalServiceError(_)
            | CoreError::InternalServerError => ApiError::InternalServerError(error.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, Value::String(message)),
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, Value::String(message)),
            ApiError::SubscriptionRequired(detail) => (
                StatusCode::FORBIDDEN,
                serde_json::to_value(detail).unwrap_or_else(|_| json!("subscription_required")),
            ),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, Value::String(message)),
            ApiError::PayloadTooLarge(message) => {
                (StatusCode::PAYLOAD_TOO_LARGE, Value::String(message))
            }
            ApiError::InternalServerError(message) => {
                tracing::error!("Request failed: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, Value::String(message))
            }
        };

        (status, Json(ApiErrorResponse { detail })).into_response()
    }
}

/// JSON extractor that runs the `validator` rules of the payload.
pub struct ValidateJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidateJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(rejection.body_text()),
                _ => ApiError::BadRequest(rejection.body_text()),
            })?;

        value
            .validate()
            .map_err(|errors| ApiError::BadRequest(first_validation_message(&errors)))?;

        Ok(ValidateJson(value))
    }
}

fn first_validation_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field))
            })
        })
        .next()
        .unwrap_or_else(|| "Invalid request".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_status_codes() {
        let cases = [
            (CoreError::InvalidTier, StatusCode::BAD_REQUEST),
            (CoreError::InvalidSignature, StatusCode::BAD_REQUEST),
            (CoreError::WebhookSecretMissing, StatusCode::INTERNAL_SERVER_ERROR),
            (
                CoreError::PriceNotConfigured("yearly".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (CoreError::NotFound, StatusCode::NOT_FOUND),
        ];

        for (error, expected) in cases {
            let response = ApiError::from(error).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
