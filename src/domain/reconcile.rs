//! The single decision point for turning a gateway event into an order write.
//!
//! Both event kinds go through [`reconcile`], so the merge rules and the status ordering are
//! enforced the same way no matter which event arrives first.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{
    order::{EventKind, Order, OrderDraft, OrderFields, OrderStatus, OrderWrite},
    plans::derive_plan,
};

/// Decide what to write for `incoming`, given the row currently stored (if any).
///
/// * A payment-completed event for an order that is already paid only refreshes the raw payload.
/// * Otherwise the order is upserted. Status never moves backwards, customer fields are only
///   filled in (never blanked), amount and currency keep their first value, and the derived
///   fields are recomputed anchored at the order's original creation time.
pub fn reconcile(
    existing: Option<&Order>,
    incoming: &OrderFields,
    kind: EventKind,
    event_time: DateTime<Utc>,
    raw: &Value,
) -> OrderWrite {
    if let Some(order) = existing {
        if order.status.is_paid() && kind == EventKind::PaymentCompleted {
            return OrderWrite::TouchPayload(raw.clone());
        }
    }

    let status = next_status(existing.map(|o| o.status), kind);
    let created_at = existing.map(|o| o.created_at).unwrap_or(event_time);
    let customer_name = fill(incoming.customer_name.as_ref(), existing.and_then(|o| o.customer_name.as_ref()));
    let customer_email = fill(incoming.customer_email.as_ref(), existing.and_then(|o| o.customer_email.as_ref()));
    let amount = existing.and_then(|o| o.amount.clone()).or_else(|| incoming.amount.clone());
    let currency = existing
        .and_then(|o| o.currency.clone())
        .or_else(|| incoming.currency.as_ref().map(|c| c.to_ascii_uppercase()));

    let description = incoming
        .description
        .as_deref()
        .or_else(|| existing.and_then(|o| o.plan_description.as_deref()));
    let derived =
        derive_plan(description, amount.as_ref(), currency.as_deref(), created_at, incoming.plan_id.as_deref());

    OrderWrite::Upsert(OrderDraft {
        external_transaction_id: incoming.transaction_id.clone(),
        status,
        customer_name,
        customer_email,
        amount,
        currency,
        plan_description: derived.description,
        computed_savings: derived.savings,
        expiry_date: derived.expiry_date,
        raw_gateway_payload: raw.clone(),
        created_at,
    })
}

/// `Pending < Active | Completed`. A paid status is always kept.
pub fn next_status(current: Option<OrderStatus>, kind: EventKind) -> OrderStatus {
    match (current, kind) {
        (Some(s), _) if s.is_paid() => s,
        (_, EventKind::PaymentCompleted) => OrderStatus::Active,
        (_, EventKind::OrderApproved) => OrderStatus::Pending,
    }
}

fn fill(incoming: Option<&String>, existing: Option<&String>) -> Option<String> {
    incoming
        .filter(|v| !v.trim().is_empty())
        .or(existing.filter(|v| !v.trim().is_empty()))
        .cloned()
}
