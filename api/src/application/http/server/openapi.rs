use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::application::http::{
    nutrition::router::NutritionApiDoc, subscription::router::SubscriptionApiDoc,
    webhook::router::WebhookApiDoc,
};

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "FoodScanner API"
    ),
    modifiers(&BearerSecurity),
    paths(
        crate::application::http::health::root,
        crate::application::http::health::health,
    ),
    nest(
        (path = "/analyze_food", api = NutritionApiDoc),
        (path = "/subscription", api = SubscriptionApiDoc),
        (path = "/stripe", api = WebhookApiDoc),
    )
)]
pub struct ApiDoc;
