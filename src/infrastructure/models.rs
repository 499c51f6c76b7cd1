use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderDraft};
use crate::domain::webhook_event::{NewWebhookEvent, WebhookEvent};
use crate::schema::{orders, webhook_events};

#[derive(Debug, Clone, Queryable, QueryableByName, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub external_transaction_id: String,
    pub status: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub amount: Option<BigDecimal>,
    pub currency: Option<String>,
    pub plan_description: Option<String>,
    pub computed_savings: Option<BigDecimal>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub raw_gateway_payload: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DomainError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id,
            status: row.status.parse().map_err(|_| {
                DomainError::Internal(format!("order {} has unknown status '{}'", row.external_transaction_id, row.status))
            })?,
            external_transaction_id: row.external_transaction_id,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            amount: row.amount,
            currency: row.currency,
            plan_description: row.plan_description,
            computed_savings: row.computed_savings,
            expiry_date: row.expiry_date,
            raw_gateway_payload: row.raw_gateway_payload,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub external_transaction_id: String,
    pub status: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub amount: Option<BigDecimal>,
    pub currency: Option<String>,
    pub plan_description: Option<String>,
    pub computed_savings: Option<BigDecimal>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub raw_gateway_payload: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl From<&OrderDraft> for NewOrderRow {
    fn from(d: &OrderDraft) -> Self {
        NewOrderRow {
            id: Uuid::new_v4(),
            external_transaction_id: d.external_transaction_id.clone(),
            status: d.status.to_string(),
            customer_name: d.customer_name.clone(),
            customer_email: d.customer_email.clone(),
            amount: d.amount.clone(),
            currency: iso_currency(d.currency.as_deref()),
            plan_description: Some(d.plan_description.clone()),
            computed_savings: d.computed_savings.clone(),
            expiry_date: d.expiry_date,
            raw_gateway_payload: Some(d.raw_gateway_payload.clone()),
            created_at: d.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = webhook_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WebhookEventRow {
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

impl From<WebhookEventRow> for WebhookEvent {
    fn from(row: WebhookEventRow) -> Self {
        WebhookEvent {
            id: row.id,
            event_id: row.event_id,
            event_type: row.event_type,
            external_transaction_id: row.external_transaction_id,
            amount: row.amount,
            currency: row.currency,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            raw_payload: row.raw_payload,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = webhook_events)]
pub struct NewWebhookEventRow {
    pub id: Uuid,
    pub event_id: Option<String>,
    pub event_type: String,
    pub external_transaction_id: Option<String>,
    pub amount: Option<BigDecimal>,
    pub currency: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub raw_payload: Value,
}

impl From<NewWebhookEvent> for NewWebhookEventRow {
    fn from(e: NewWebhookEvent) -> Self {
        NewWebhookEventRow {
            id: Uuid::new_v4(),
            event_id: e.event_id,
            event_type: e.event_type,
            external_transaction_id: e.external_transaction_id,
            amount: e.amount,
            currency: iso_currency(e.currency.as_deref()),
            customer_name: e.customer_name,
            customer_email: e.customer_email,
            raw_payload: e.raw_payload,
        }
    }
}

/// The currency columns hold three-letter ISO codes only.
pub fn iso_currency(code: Option<&str>) -> Option<String> {
    code.filter(|c| c.len() == 3 && c.chars().all(|ch| ch.is_ascii_alphabetic())).map(|c| c.to_ascii_uppercase())
}
