use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateCheckoutRequest {
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,
    /// `monthly` or `yearly`.
    #[schema(example = "monthly")]
    pub tier: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreatePortalRequest {
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,
}
