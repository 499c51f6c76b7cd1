use std::{fmt, str::FromStr};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::errors::DomainError;

//--------------------------------------      OrderStatus      ---------------------------------------------------------

/// Lifecycle of an order. `Pending` sits below both `Active` and `Completed`; once an order
/// reaches either of those it never goes back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// The customer approved the checkout but no captured payment has been seen.
    Pending,
    /// Payment captured.
    Active,
    /// Payment captured and the subscription delivered.
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Active => "ACTIVE",
            OrderStatus::Completed => "COMPLETED",
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, OrderStatus::Active | OrderStatus::Completed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "ACTIVE" => Ok(Self::Active),
            "COMPLETED" => Ok(Self::Completed),
            s => Err(DomainError::InvalidInput(format!("Unknown order status: {s}"))),
        }
    }
}

//--------------------------------------         Order         ---------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub external_transaction_id: String,
    pub status: OrderStatus,
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

/// Which of the two order-bearing gateway events is being reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    OrderApproved,
    PaymentCompleted,
}

/// Order fields recovered from a single gateway event. Everything except the transaction id is
/// best-effort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFields {
    pub transaction_id: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub amount: Option<BigDecimal>,
    pub currency: Option<String>,
    pub description: Option<String>,
    pub plan_id: Option<String>,
}

/// The full state an order should have after a reconciliation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub external_transaction_id: String,
    pub status: OrderStatus,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub amount: Option<BigDecimal>,
    pub currency: Option<String>,
    pub plan_description: String,
    pub computed_savings: Option<BigDecimal>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub raw_gateway_payload: Value,
    pub created_at: DateTime<Utc>,
}

/// What the store must do for one reconciliation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderWrite {
    /// Insert the order, or overwrite the existing row with the draft.
    Upsert(OrderDraft),
    /// Duplicate delivery: only refresh the audit payload.
    TouchPayload(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliedWrite {
    Inserted,
    Updated,
    PayloadRefreshed,
}

/// Result of applying an [`OrderWrite`]: the row as it was before (if any) and as it is now.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub previous: Option<Order>,
    pub current: Order,
    pub applied: AppliedWrite,
}

impl Reconciled {
    /// True when this pass moved the order from unpaid (or absent) to paid.
    pub fn became_paid(&self) -> bool {
        let was_paid = self.previous.as_ref().map(|o| o.status.is_paid()).unwrap_or(false);
        !was_paid && self.current.status.is_paid()
    }
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<Order>,
    pub total: i64,
}
