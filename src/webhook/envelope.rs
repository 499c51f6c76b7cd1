use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use super::extract::{approved_fields, completed_fields, str_at};
use crate::domain::order::{EventKind, OrderFields};

pub const CHECKOUT_ORDER_APPROVED: &str = "CHECKOUT.ORDER.APPROVED";
pub const CHECKOUT_ORDER_COMPLETED: &str = "CHECKOUT.ORDER.COMPLETED";
pub const PAYMENT_CAPTURE_COMPLETED: &str = "PAYMENT.CAPTURE.COMPLETED";

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Webhook body is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("Webhook body has no event_type")]
    MissingEventType,
}

/// A verified gateway delivery: `{ id, event_type, create_time, resource: {...} }`.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub event_id: Option<String>,
    pub event_type: String,
    pub created_at: Option<DateTime<Utc>>,
    pub raw: Value,
}

impl Envelope {
    pub fn parse(body: &[u8]) -> Result<Self, EnvelopeError> {
        let raw: Value = serde_json::from_slice(body).map_err(|e| EnvelopeError::InvalidJson(e.to_string()))?;
        if !raw.is_object() {
            return Err(EnvelopeError::InvalidJson("expected a JSON object".to_string()));
        }
        let event_type = str_at(&raw, "/event_type").ok_or(EnvelopeError::MissingEventType)?.to_string();
        let event_id = str_at(&raw, "/id").map(str::to_string);
        let created_at = str_at(&raw, "/create_time")
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc));
        Ok(Self { event_id, event_type, created_at, raw })
    }

    pub fn classify(&self) -> GatewayEvent {
        let kind = match self.event_type.as_str() {
            CHECKOUT_ORDER_APPROVED => EventKind::OrderApproved,
            PAYMENT_CAPTURE_COMPLETED | CHECKOUT_ORDER_COMPLETED => EventKind::PaymentCompleted,
            _ => return GatewayEvent::Other,
        };
        let fields = match kind {
            EventKind::OrderApproved => approved_fields(&self.raw),
            EventKind::PaymentCompleted => completed_fields(&self.raw),
        };
        match fields {
            Some(fields) => GatewayEvent::Order { kind, fields },
            None => GatewayEvent::Unidentified { kind },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    /// An order-approved or payment-completed event with a usable transaction id.
    Order { kind: EventKind, fields: OrderFields },
    /// An order-bearing event type whose transaction id could not be found.
    Unidentified { kind: EventKind },
    /// Any event type the reconciler does not act on.
    Other,
}
