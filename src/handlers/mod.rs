pub mod checkout;
pub mod orders;
pub mod webhooks;

use actix_web::HttpResponse;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        webhooks::receive_gateway_event,
        checkout::create_checkout,
        orders::get_order,
        orders::list_orders,
        orders::complete_order,
        health,
    ),
    components(schemas(
        webhooks::WebhookReceipt,
        checkout::CreateCheckoutRequest,
        checkout::CreateCheckoutResponse,
        orders::OrderResponse,
        orders::ListOrdersResponse,
    )),
    modifiers(&AdminTokenScheme),
    tags(
        (name = "webhooks", description = "Payment gateway event intake"),
        (name = "checkout", description = "Plan purchases"),
        (name = "orders", description = "Back-office order access"),
    )
)]
pub struct ApiDoc;

struct AdminTokenScheme;

impl Modify for AdminTokenScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme("admin_token", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
        }
    }
}

/// GET /health
#[utoipa::path(get, path = "/health", responses((status = 200, description = "Service is up")))]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// GET /api-docs/openapi.json
pub async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use actix_web::{test, App};
    use serde_json::Value;

    use crate::test_support::{test_state, InMemoryStore};

    #[actix_web::test]
    async fn health_and_openapi_are_public() {
        let store = InMemoryStore::new();
        let app = test::init_service(App::new().configure(|cfg| crate::configure(cfg, test_state(&store)))).await;

        let health: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(health, serde_json::json!({"status": "ok"}));

        let doc: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api-docs/openapi.json").to_request()).await;
        assert!(doc["paths"]["/webhooks/gateway"]["post"].is_object());
        assert!(doc["paths"]["/orders/{transaction_id}/complete"]["post"].is_object());
    }
}
