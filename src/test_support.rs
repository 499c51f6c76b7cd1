//! In-memory doubles of the storage ports, mirroring the guarded writes of the Postgres store,
//! and handler state wired to them.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    errors::DomainError,
    order::{AppliedWrite, ListResult, Order, OrderStatus, OrderWrite, Reconciled},
    ports::{OrderRepository, PaymentGateway, ProfileDirectory, WebhookEventLog},
    webhook_event::{NewWebhookEvent, WebhookEvent},
};
use crate::infrastructure::LogMailer;
use crate::secret::Secret;
use crate::state::{AppState, Collaborators};
use crate::webhook::HmacVerifier;

pub const WEBHOOK_SECRET: &str = "test-webhook-secret";
pub const ADMIN_TOKEN: &str = "test-admin-token";

/// Handler state over `store`, with no payment gateway configured.
pub fn test_state(store: &Arc<InMemoryStore>) -> AppState {
    test_state_with_gateway(store, None)
}

pub fn test_state_with_gateway(store: &Arc<InMemoryStore>, gateway: Option<Arc<dyn PaymentGateway>>) -> AppState {
    let collaborators = Collaborators {
        orders: store.clone(),
        events: store.clone(),
        profiles: store.clone(),
        mailer: Arc::new(LogMailer),
        gateway,
        verifier: Arc::new(HmacVerifier::new("x-webhook-signature", Secret::new(WEBHOOK_SECRET.to_string()))),
    };
    AppState::new(collaborators, Duration::from_secs(5), Duration::from_secs(5), Some(Secret::new(ADMIN_TOKEN.to_string())))
}

#[derive(Default)]
pub struct InMemoryStore {
    orders: Mutex<HashMap<String, Order>>,
    events: Mutex<Vec<WebhookEvent>>,
    profiles: Mutex<HashSet<String>>,
    fail_orders: AtomicBool,
    fail_events: AtomicBool,
    fail_profiles: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn order(&self, transaction_id: &str) -> Option<Order> {
        self.orders.lock().unwrap().get(transaction_id).cloned()
    }

    pub fn order_count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn events(&self) -> Vec<WebhookEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn put_order(&self, order: Order) {
        self.orders.lock().unwrap().insert(order.external_transaction_id.clone(), order);
    }

    pub fn add_profile(&self, email: &str) {
        self.profiles.lock().unwrap().insert(email.to_ascii_lowercase());
    }

    pub fn fail_order_writes(&self, fail: bool) {
        self.fail_orders.store(fail, Ordering::SeqCst);
    }

    pub fn fail_event_writes(&self, fail: bool) {
        self.fail_events.store(fail, Ordering::SeqCst);
    }

    pub fn fail_profile_lookups(&self, fail: bool) {
        self.fail_profiles.store(fail, Ordering::SeqCst);
    }
}

impl OrderRepository for InMemoryStore {
    fn reconcile(
        &self,
        transaction_id: &str,
        plan: &dyn Fn(Option<&Order>) -> OrderWrite,
    ) -> Result<Reconciled, DomainError> {
        if self.fail_orders.load(Ordering::SeqCst) {
            return Err(DomainError::Internal("order store unavailable".into()));
        }
        let mut orders = self.orders.lock().unwrap();
        let previous = orders.get(transaction_id).cloned();
        let now = Utc::now();
        let (current, applied) = match (plan(previous.as_ref()), previous.as_ref()) {
            (OrderWrite::TouchPayload(raw), Some(prev)) => {
                let mut order = prev.clone();
                order.raw_gateway_payload = Some(raw);
                order.updated_at = now;
                (order, AppliedWrite::PayloadRefreshed)
            },
            (OrderWrite::TouchPayload(_), None) => {
                return Err(DomainError::Internal(format!("no order {transaction_id} to refresh")));
            },
            (OrderWrite::Upsert(d), Some(prev)) => {
                let status = if prev.status.is_paid() { prev.status } else { d.status };
                let order = Order {
                    id: prev.id,
                    external_transaction_id: prev.external_transaction_id.clone(),
                    status,
                    customer_name: d.customer_name.or_else(|| prev.customer_name.clone()),
                    customer_email: d.customer_email.or_else(|| prev.customer_email.clone()),
                    amount: prev.amount.clone().or(d.amount),
                    currency: prev.currency.clone().or(d.currency),
                    plan_description: Some(d.plan_description),
                    computed_savings: d.computed_savings,
                    expiry_date: d.expiry_date,
                    raw_gateway_payload: Some(d.raw_gateway_payload),
                    created_at: prev.created_at,
                    updated_at: now,
                };
                (order, AppliedWrite::Updated)
            },
            (OrderWrite::Upsert(d), None) => {
                let order = Order {
                    id: Uuid::new_v4(),
                    external_transaction_id: d.external_transaction_id,
                    status: d.status,
                    customer_name: d.customer_name,
                    customer_email: d.customer_email,
                    amount: d.amount,
                    currency: d.currency,
                    plan_description: Some(d.plan_description),
                    computed_savings: d.computed_savings,
                    expiry_date: d.expiry_date,
                    raw_gateway_payload: Some(d.raw_gateway_payload),
                    created_at: d.created_at,
                    updated_at: now,
                };
                (order, AppliedWrite::Inserted)
            },
        };
        orders.insert(transaction_id.to_string(), current.clone());
        Ok(Reconciled { previous, current, applied })
    }

    fn find_by_transaction_id(&self, transaction_id: &str) -> Result<Option<Order>, DomainError> {
        Ok(self.order(transaction_id))
    }

    fn list(&self, page: i64, limit: i64, status: Option<OrderStatus>) -> Result<ListResult, DomainError> {
        let mut items: Vec<Order> = self
            .orders
            .lock()
            .unwrap()
            .values()
            .filter(|o| status.map(|s| o.status == s).unwrap_or(true))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = items.len() as i64;
        let items = items.into_iter().skip(((page - 1) * limit) as usize).take(limit as usize).collect();
        Ok(ListResult { items, total })
    }

    fn mark_completed(&self, transaction_id: &str) -> Result<Order, DomainError> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders.get_mut(transaction_id).ok_or(DomainError::NotFound)?;
        if !order.status.is_paid() {
            return Err(DomainError::InvalidTransition(format!("order {transaction_id} has not been paid")));
        }
        order.status = OrderStatus::Completed;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }
}

impl WebhookEventLog for InMemoryStore {
    fn append(&self, event: NewWebhookEvent) -> Result<WebhookEvent, DomainError> {
        if self.fail_events.load(Ordering::SeqCst) {
            return Err(DomainError::Internal("event log unavailable".into()));
        }
        let now = Utc::now();
        let record = WebhookEvent {
            id: Uuid::new_v4(),
            event_id: event.event_id,
            event_type: event.event_type,
            external_transaction_id: event.external_transaction_id,
            amount: event.amount,
            currency: event.currency,
            customer_name: event.customer_name,
            customer_email: event.customer_email,
            raw_payload: event.raw_payload,
            created_at: now,
            updated_at: now,
        };
        self.events.lock().unwrap().push(record.clone());
        Ok(record)
    }
}

impl ProfileDirectory for InMemoryStore {
    fn has_profile(&self, email: &str) -> Result<bool, DomainError> {
        if self.fail_profiles.load(Ordering::SeqCst) {
            return Err(DomainError::Internal("profile lookup failed".into()));
        }
        Ok(self.profiles.lock().unwrap().contains(&email.to_ascii_lowercase()))
    }
}
