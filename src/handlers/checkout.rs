use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::checkout_service::CheckoutInput;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    /// Catalog plan id, e.g. "cc-12m"
    #[serde(alias = "plan_id")]
    pub plan_id: String,
    pub name: Option<String>,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateCheckoutResponse {
    /// Gateway transaction id; later webhooks for this purchase carry the same id.
    pub id: String,
    pub status: String,
}

/// POST /checkout/orders
///
/// Opens a gateway order for a catalog plan. The customer's details ride along as custom data
/// and come back in the gateway's webhooks; no order row is written here.
#[utoipa::path(
    post,
    path = "/checkout/orders",
    request_body = CreateCheckoutRequest,
    responses(
        (status = 201, description = "Gateway order created", body = CreateCheckoutResponse),
        (status = 400, description = "Unknown plan or invalid email"),
        (status = 502, description = "Payment gateway error"),
        (status = 503, description = "Payment gateway not configured"),
    ),
    tag = "checkout"
)]
pub async fn create_checkout(
    state: web::Data<AppState>,
    body: web::Json<CreateCheckoutRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let input = CheckoutInput { plan_id: body.plan_id, name: body.name, email: body.email };

    let created = state.checkout.start_checkout(input).await?;

    Ok(HttpResponse::Created().json(CreateCheckoutResponse { id: created.transaction_id, status: created.status }))
}
