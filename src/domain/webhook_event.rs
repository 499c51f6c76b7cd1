use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Audit log entry for one delivered gateway event. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    pub id: Uuid,
    pub event_id: Option<String>,
    pub event_type: String,
    pub external_transaction_id: Option<String>,
    pub amount: Option<BigDecimal>,
    pub currency: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub raw_payload: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewWebhookEvent {
    pub event_id: Option<String>,
    pub event_type: String,
    pub external_transaction_id: Option<String>,
    pub amount: Option<BigDecimal>,
    pub currency: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub raw_payload: Value,
}
