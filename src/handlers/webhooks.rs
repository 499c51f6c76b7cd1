use actix_web::{error::BlockingError, web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::WebhookAction;
use crate::domain::order::OrderStatus;
use crate::errors::AppError;
use crate::state::AppState;
use crate::webhook::Envelope;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookReceipt {
    pub received: bool,
    pub event_type: String,
    #[schema(value_type = String, example = "inserted")]
    pub action: WebhookAction,
    #[schema(value_type = Option<String>, example = "ACTIVE")]
    pub status: Option<OrderStatus>,
}

/// POST /webhooks/gateway
///
/// Receives a payment-gateway event. The signature is checked against the raw body before
/// anything is parsed or written. A 200 means the event is durably recorded; any 5xx asks the
/// gateway to redeliver.
#[utoipa::path(
    post,
    path = "/webhooks/gateway",
    request_body(content = String, description = "Raw gateway event JSON", content_type = "application/json"),
    responses(
        (status = 200, description = "Event recorded", body = WebhookReceipt),
        (status = 400, description = "Body is not a gateway event"),
        (status = 401, description = "Missing or invalid signature"),
        (status = 500, description = "Event could not be recorded; the gateway should retry"),
    ),
    tag = "webhooks"
)]
pub async fn receive_gateway_event(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    if !state.verifier.verify(&body, req.headers()) {
        return Err(AppError::Unauthorized("Invalid webhook signature".to_string()));
    }
    let envelope = Envelope::parse(&body)?;
    let event_type = envelope.event_type.clone();
    debug!("Received gateway event {:?} ({event_type})", envelope.event_id);

    let reconciler = state.reconciler.clone();
    let notifier = state.notifier.clone();
    let received_at = Utc::now();
    // The task outlives a timed-out response, so a committed payment still gets its confirmation.
    // Side effects go out even if the audit append failed; the order write is already durable.
    let processing = actix_web::rt::spawn(async move {
        let mut handled = web::block(move || reconciler.handle(&envelope, received_at)).await?;
        if let Some(order) = handled.notify.take() {
            notifier.spawn(order);
        }
        Ok::<_, BlockingError>(handled)
    });
    let handled = tokio::time::timeout(state.webhook_timeout, processing)
        .await
        .map_err(|_| AppError::Internal(format!("Processing {event_type} timed out")))?
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let (action, status) = handled.into_result()?;

    Ok(HttpResponse::Ok().json(WebhookReceipt { received: true, event_type, action, status }))
}
