pub mod create_checkout;
pub mod create_portal;
pub mod get_my_subscription;
pub mod get_subscription_status;
