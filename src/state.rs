use std::{sync::Arc, time::Duration};

use crate::application::{CheckoutService, ConfirmationDispatcher, OrderService, ReconcileService};
use crate::domain::ports::{Mailer, OrderRepository, PaymentGateway, ProfileDirectory, WebhookEventLog};
use crate::secret::Secret;
use crate::webhook::SignatureVerifier;

/// Shared handler state. Cloned into every actix worker, so everything inside is `Arc`-backed.
#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<ReconcileService>,
    pub orders: Arc<OrderService>,
    pub checkout: Arc<CheckoutService>,
    pub notifier: ConfirmationDispatcher,
    pub verifier: Arc<dyn SignatureVerifier>,
    pub webhook_timeout: Duration,
    pub admin_token: Option<Secret<String>>,
}

/// The collaborators the state is assembled from.
pub struct Collaborators {
    pub orders: Arc<dyn OrderRepository>,
    pub events: Arc<dyn WebhookEventLog>,
    pub profiles: Arc<dyn ProfileDirectory>,
    pub mailer: Arc<dyn Mailer>,
    pub gateway: Option<Arc<dyn PaymentGateway>>,
    pub verifier: Arc<dyn SignatureVerifier>,
}

impl AppState {
    pub fn new(
        c: Collaborators,
        webhook_timeout: Duration,
        notify_timeout: Duration,
        admin_token: Option<Secret<String>>,
    ) -> Self {
        Self {
            reconciler: Arc::new(ReconcileService::new(c.orders.clone(), c.events)),
            orders: Arc::new(OrderService::new(c.orders)),
            checkout: Arc::new(CheckoutService::new(c.gateway)),
            notifier: ConfirmationDispatcher::new(c.profiles, c.mailer, notify_timeout),
            verifier: c.verifier,
            webhook_timeout,
            admin_token,
        }
    }
}
