use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use foodscanner_core::domain::subscription::ports::SubscriptionService;
use tracing::info;

use crate::application::http::server::{
    api_entities::api_error::{ApiError, SubscriptionRequiredDetail},
    app_state::AppState,
};

pub const USER_ID_HEADER: &str = "x-user-id";

/// Rejects requests from users without an active subscription or trial.
/// Passes everything through when the gate is switched off.
pub async fn require_subscription(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.args.server.require_subscription {
        return Ok(next.run(req).await);
    }

    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            ApiError::Unauthorized("User ID header (X-User-ID) is required".to_string())
        })?;

    let snapshot = state
        .service
        .get_subscription_status(user_id.clone())
        .await;

    if !snapshot.has_access {
        info!(user_id = %user_id, status = %snapshot.status, "Subscription required");
        return Err(ApiError::SubscriptionRequired(SubscriptionRequiredDetail {
            error: "subscription_required".to_string(),
            message: "Active subscription required to access this feature".to_string(),
            status: snapshot.status,
            trial_ends_at: snapshot.trial_ends_at,
        }));
    }

    Ok(next.run(req).await)
}
