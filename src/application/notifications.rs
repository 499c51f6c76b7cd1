use std::{sync::Arc, time::Duration};

use log::{debug, info, warn};

use crate::domain::{
    order::Order,
    ports::{Mailer, OrderConfirmation, ProfileDirectory},
};

/// Best-effort side effects of an order becoming paid: confirmation email and marketing
/// enrollment. Nothing here can fail the webhook; every error is logged and dropped.
#[derive(Clone)]
pub struct ConfirmationDispatcher {
    profiles: Arc<dyn ProfileDirectory>,
    mailer: Arc<dyn Mailer>,
    timeout: Duration,
}

impl ConfirmationDispatcher {
    pub fn new(profiles: Arc<dyn ProfileDirectory>, mailer: Arc<dyn Mailer>, timeout: Duration) -> Self {
        Self { profiles, mailer, timeout }
    }

    /// Runs the side effects on the runtime without holding up the caller.
    pub fn spawn(&self, order: Order) {
        let dispatcher = self.clone();
        actix_web::rt::spawn(async move { dispatcher.dispatch(order).await });
    }

    pub async fn dispatch(&self, order: Order) {
        let txn = order.external_transaction_id.clone();
        if tokio::time::timeout(self.timeout, self.run(order)).await.is_err() {
            warn!("📧️ Confirmation for order {txn} timed out after {:?}", self.timeout);
        }
    }

    async fn run(&self, order: Order) {
        let Some(email) = order.customer_email.clone() else {
            info!("📧️ Order {} has no customer email. Skipping confirmation.", order.external_transaction_id);
            return;
        };
        let guest_checkout = !self.has_profile(&email).await;
        let confirmation = OrderConfirmation {
            to: email.clone(),
            customer_name: order.customer_name.clone(),
            transaction_id: order.external_transaction_id.clone(),
            plan_description: order.plan_description.clone().unwrap_or_else(|| "Adobe Creative Cloud".to_string()),
            amount: order.amount.clone(),
            currency: order.currency.clone(),
            expiry_date: order.expiry_date,
            guest_checkout,
        };
        match self.mailer.send_order_confirmation(&confirmation).await {
            Ok(()) => info!("📧️ Sent confirmation for order {}", order.external_transaction_id),
            Err(e) => warn!("📧️ Could not send confirmation for order {}: {e}", order.external_transaction_id),
        }
        match self.mailer.add_marketing_contact(&email, order.customer_name.clone()).await {
            Ok(()) => debug!("📧️ Enrolled customer of order {} in marketing list", order.external_transaction_id),
            Err(e) => warn!("📧️ Could not enroll customer of order {}: {e}", order.external_transaction_id),
        }
    }

    /// Lookup failures count as "no profile", which only changes the email framing.
    async fn has_profile(&self, email: &str) -> bool {
        let profiles = self.profiles.clone();
        let email = email.to_string();
        match tokio::task::spawn_blocking(move || profiles.has_profile(&email)).await {
            Ok(Ok(found)) => found,
            Ok(Err(e)) => {
                warn!("📧️ Profile lookup failed, treating as guest checkout: {e}");
                false
            },
            Err(e) => {
                warn!("📧️ Profile lookup task failed, treating as guest checkout: {e}");
                false
            },
        }
    }
}
