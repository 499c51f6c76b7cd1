use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;

use crate::domain::{
    errors::DomainError,
    order::{AppliedWrite, EventKind, Order, OrderStatus, Reconciled},
    ports::{OrderRepository, WebhookEventLog},
    reconcile::reconcile,
    webhook_event::NewWebhookEvent,
};
use crate::webhook::{
    envelope::{Envelope, GatewayEvent},
    extract::{audit_record, audit_record_for_order},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookAction {
    /// A new order row was created.
    Inserted,
    /// An existing order row was rewritten.
    Updated,
    /// The order was already paid; only the raw payload was refreshed.
    Duplicate,
    /// Only the audit record was written.
    Recorded,
}

/// Everything the HTTP layer needs to answer the gateway and fire side effects.
#[derive(Debug)]
pub struct HandledEvent {
    /// Outcome of the order write. `Ok` for audit-only events.
    pub order: Result<(WebhookAction, Option<OrderStatus>), DomainError>,
    /// Outcome of the audit append, attempted for every event.
    pub audit: Result<(), DomainError>,
    /// Set when this delivery moved the order into a paid state; the confirmation goes here.
    pub notify: Option<Order>,
}

impl HandledEvent {
    /// The delivery only counts as processed when both writes succeeded.
    pub fn into_result(self) -> Result<(WebhookAction, Option<OrderStatus>), DomainError> {
        let outcome = self.order?;
        self.audit?;
        Ok(outcome)
    }
}

pub struct ReconcileService {
    orders: Arc<dyn OrderRepository>,
    events: Arc<dyn WebhookEventLog>,
}

impl ReconcileService {
    pub fn new(orders: Arc<dyn OrderRepository>, events: Arc<dyn WebhookEventLog>) -> Self {
        Self { orders, events }
    }

    /// Applies one verified gateway delivery.
    ///
    /// The order write (if any) comes first, then the audit record is appended whether or not
    /// the order write succeeded.
    pub fn handle(&self, envelope: &Envelope, received_at: DateTime<Utc>) -> HandledEvent {
        let event_time = envelope.created_at.unwrap_or(received_at);
        match envelope.classify() {
            GatewayEvent::Order { kind, fields } => {
                let plan = |existing: Option<&Order>| reconcile(existing, &fields, kind, event_time, &envelope.raw);
                let written = self.orders.reconcile(&fields.transaction_id, &plan);
                let record = audit_record_for_order(&envelope.raw, envelope.event_id.clone(), &envelope.event_type, &fields);
                let audit = self.append(record);
                match written {
                    Ok(reconciled) => {
                        let action = action_for(&reconciled);
                        info!(
                            "Reconciled {} for order {}: {:?} -> {} ({:?})",
                            envelope.event_type,
                            fields.transaction_id,
                            reconciled.previous.as_ref().map(|o| o.status),
                            reconciled.current.status,
                            action
                        );
                        let notify = reconciled.became_paid().then(|| reconciled.current.clone());
                        HandledEvent { order: Ok((action, Some(reconciled.current.status))), audit, notify }
                    },
                    Err(e) => {
                        error!("Could not write order {} for {}: {e}", fields.transaction_id, envelope.event_type);
                        HandledEvent { order: Err(e), audit, notify: None }
                    },
                }
            },
            GatewayEvent::Unidentified { kind } => {
                let label = match kind {
                    EventKind::OrderApproved => "order-approved",
                    EventKind::PaymentCompleted => "payment-completed",
                };
                warn!(
                    "No transaction id in {label} event {:?} ({}). Recording it for manual reconciliation.",
                    envelope.event_id, envelope.event_type
                );
                self.record_only(envelope)
            },
            GatewayEvent::Other => {
                info!("Recording unhandled gateway event {:?} ({})", envelope.event_id, envelope.event_type);
                self.record_only(envelope)
            },
        }
    }

    fn record_only(&self, envelope: &Envelope) -> HandledEvent {
        let record = audit_record(&envelope.raw, envelope.event_id.clone(), &envelope.event_type);
        HandledEvent { order: Ok((WebhookAction::Recorded, None)), audit: self.append(record), notify: None }
    }

    fn append(&self, record: NewWebhookEvent) -> Result<(), DomainError> {
        self.events.append(record).map(|_| ()).map_err(|e| {
            error!("Could not append webhook audit record: {e}");
            e
        })
    }
}

fn action_for(reconciled: &Reconciled) -> WebhookAction {
    match reconciled.applied {
        AppliedWrite::Inserted => WebhookAction::Inserted,
        AppliedWrite::Updated => WebhookAction::Updated,
        AppliedWrite::PayloadRefreshed => WebhookAction::Duplicate,
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use chrono::TimeZone;
    use serde_json::{json, Value};

    use super::*;
    use crate::test_support::InMemoryStore;

    fn service(store: &Arc<InMemoryStore>) -> ReconcileService {
        ReconcileService::new(store.clone(), store.clone())
    }

    fn envelope(value: Value) -> Envelope {
        Envelope::parse(value.to_string().as_bytes()).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap()
    }

    fn approved(txn: &str, custom: &str) -> Envelope {
        envelope(json!({
            "id": "WH-APPROVED",
            "event_type": "CHECKOUT.ORDER.APPROVED",
            "create_time": "2026-10-18T10:00:00Z",
            "resource": {
                "id": txn,
                "purchase_units": [{
                    "custom_id": custom,
                    "description": "Adobe CC 12 Months",
                    "amount": {"value": "269.99", "currency_code": "USD"}
                }]
            }
        }))
    }

    fn captured(txn: &str, custom: &str) -> Envelope {
        envelope(json!({
            "id": "WH-CAPTURED",
            "event_type": "PAYMENT.CAPTURE.COMPLETED",
            "create_time": "2026-10-18T10:05:00Z",
            "resource": {
                "id": "CAPTURE-1",
                "custom_id": custom,
                "amount": {"value": "269.99", "currency_code": "USD"},
                "supplementary_data": {"related_ids": {"order_id": txn}}
            }
        }))
    }

    const CUSTOM: &str = r#"{"name":"Ada Lovelace","email":"a@x.com","planId":"cc-12m"}"#;

    #[test]
    fn duplicate_completion_creates_one_active_order_and_notifies_once() {
        let store = InMemoryStore::new();
        let svc = service(&store);

        let first = svc.handle(&captured("TXN-1", CUSTOM), now());
        assert!(first.notify.is_some());
        assert_eq!(first.into_result().unwrap(), (WebhookAction::Inserted, Some(OrderStatus::Active)));

        let second = svc.handle(&captured("TXN-1", CUSTOM), now());
        assert!(second.notify.is_none());
        assert_eq!(second.into_result().unwrap(), (WebhookAction::Duplicate, Some(OrderStatus::Active)));

        assert_eq!(store.order_count(), 1);
        assert_eq!(store.order("TXN-1").unwrap().status, OrderStatus::Active);
        assert_eq!(store.events().len(), 2);
    }

    #[test]
    fn approval_after_completion_keeps_order_active() {
        let store = InMemoryStore::new();
        let svc = service(&store);
        svc.handle(&captured("TXN-2", CUSTOM), now()).into_result().unwrap();

        let late = svc.handle(&approved("TXN-2", CUSTOM), now());
        assert!(late.notify.is_none());
        assert_eq!(late.into_result().unwrap(), (WebhookAction::Updated, Some(OrderStatus::Active)));
        assert_eq!(store.order("TXN-2").unwrap().status, OrderStatus::Active);
    }

    #[test]
    fn completion_without_approval_derives_fields_from_its_own_timestamp() {
        let store = InMemoryStore::new();
        service(&store).handle(&captured("TXN-3", CUSTOM), now()).into_result().unwrap();

        let order = store.order("TXN-3").unwrap();
        assert_eq!(order.status, OrderStatus::Active);
        assert_eq!(order.created_at, Utc.with_ymd_and_hms(2026, 10, 18, 10, 5, 0).unwrap());
        assert_eq!(order.expiry_date, Some(Utc.with_ymd_and_hms(2027, 10, 18, 10, 5, 0).unwrap()));
        assert_eq!(order.computed_savings, Some(BigDecimal::from_str("389.89").unwrap()));
        assert_eq!(order.plan_description.as_deref(), Some("Adobe Creative Cloud All Apps - 12 Months"));
    }

    #[test]
    fn approval_then_completion_upgrades_and_notifies() {
        let store = InMemoryStore::new();
        let svc = service(&store);

        let first = svc.handle(&approved("TXN-4", CUSTOM), now());
        assert!(first.notify.is_none());
        assert_eq!(first.into_result().unwrap(), (WebhookAction::Inserted, Some(OrderStatus::Pending)));

        let second = svc.handle(&captured("TXN-4", "not json"), now());
        let notified = second.notify.clone().expect("transition to ACTIVE notifies");
        assert_eq!(notified.customer_email.as_deref(), Some("a@x.com"));
        assert_eq!(second.into_result().unwrap(), (WebhookAction::Updated, Some(OrderStatus::Active)));

        let order = store.order("TXN-4").unwrap();
        // anchored to the approval, not the capture
        assert_eq!(order.created_at, Utc.with_ymd_and_hms(2026, 10, 18, 10, 0, 0).unwrap());
    }

    #[test]
    fn later_event_without_email_keeps_stored_email() {
        let store = InMemoryStore::new();
        let svc = service(&store);
        svc.handle(&approved("TXN-5", CUSTOM), now()).into_result().unwrap();
        svc.handle(&captured("TXN-5", r#"{"planId":"cc-12m"}"#), now()).into_result().unwrap();

        let order = store.order("TXN-5").unwrap();
        assert_eq!(order.customer_email.as_deref(), Some("a@x.com"));
        assert_eq!(order.customer_name.as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn unrecognised_event_is_only_recorded() {
        let store = InMemoryStore::new();
        let handled = service(&store).handle(
            &envelope(json!({"id": "WH-9", "event_type": "BILLING.PLAN.CREATED", "resource": {"id": "P-1"}})),
            now(),
        );
        assert_eq!(handled.into_result().unwrap(), (WebhookAction::Recorded, None));
        assert_eq!(store.order_count(), 0);
        let events = store.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "BILLING.PLAN.CREATED");
        assert_eq!(events[0].external_transaction_id.as_deref(), Some("P-1"));
    }

    #[test]
    fn order_bearing_event_without_transaction_id_is_only_recorded() {
        let store = InMemoryStore::new();
        let handled =
            service(&store).handle(&envelope(json!({"event_type": "PAYMENT.CAPTURE.COMPLETED", "resource": {}})), now());
        assert_eq!(handled.into_result().unwrap(), (WebhookAction::Recorded, None));
        assert_eq!(store.order_count(), 0);
        assert_eq!(store.events().len(), 1);
    }

    #[test]
    fn failed_order_write_still_leaves_an_audit_record() {
        let store = InMemoryStore::new();
        store.fail_order_writes(true);
        let handled = service(&store).handle(&captured("TXN-6", CUSTOM), now());
        assert!(handled.notify.is_none());
        assert!(handled.audit.is_ok());
        assert!(handled.into_result().is_err());
        assert_eq!(store.events().len(), 1);
        assert_eq!(store.events()[0].external_transaction_id.as_deref(), Some("TXN-6"));
    }

    #[test]
    fn failed_audit_append_fails_the_delivery() {
        let store = InMemoryStore::new();
        store.fail_event_writes(true);
        let handled = service(&store).handle(&captured("TXN-7", CUSTOM), now());
        assert!(handled.order.is_ok());
        assert!(handled.into_result().is_err());
    }
}
