use std::sync::Arc;

use log::info;
use serde_json::json;
use thiserror::Error;

use crate::domain::{
    plans::find_plan,
    ports::{CheckoutRequest, CreatedCheckout, GatewayError, PaymentGateway},
};

/// The gateway truncates longer custom ids.
const CUSTOM_DATA_LIMIT: usize = 127;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Unknown plan: {0}")]
    UnknownPlan(String),
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Checkout details are too long")]
    CustomDataTooLong,
    #[error("Payment gateway is not configured")]
    NotConfigured,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Clone)]
pub struct CheckoutInput {
    pub plan_id: String,
    pub name: Option<String>,
    pub email: String,
}

/// Creates gateway orders for plan purchases. The customer context travels with the gateway
/// order as custom data so later webhooks can be reconciled without a lookup.
pub struct CheckoutService {
    gateway: Option<Arc<dyn PaymentGateway>>,
}

impl CheckoutService {
    pub fn new(gateway: Option<Arc<dyn PaymentGateway>>) -> Self {
        Self { gateway }
    }

    pub async fn start_checkout(&self, input: CheckoutInput) -> Result<CreatedCheckout, CheckoutError> {
        let gateway = self.gateway.as_ref().ok_or(CheckoutError::NotConfigured)?;
        let plan = find_plan(&input.plan_id).ok_or_else(|| CheckoutError::UnknownPlan(input.plan_id.clone()))?;
        let email = input.email.trim();
        if !is_plausible_email(email) {
            return Err(CheckoutError::InvalidEmail);
        }
        let name = input.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
        let custom_data = custom_data(name, email, plan.id)?;

        let request = CheckoutRequest {
            amount: plan.sale_price(),
            currency: plan.currency().to_string(),
            description: plan.label.to_string(),
            custom_data,
        };
        let created = gateway.create_order(&request).await?;
        info!("💳️ Created gateway order {} ({}) for plan {}", created.transaction_id, created.status, plan.id);
        Ok(created)
    }
}

/// Drops the name when the full payload would not fit in the gateway's custom id.
fn custom_data(name: Option<&str>, email: &str, plan_id: &str) -> Result<String, CheckoutError> {
    let full = json!({ "name": name, "email": email, "planId": plan_id }).to_string();
    if full.len() <= CUSTOM_DATA_LIMIT {
        return Ok(full);
    }
    let short = json!({ "email": email, "planId": plan_id }).to_string();
    if short.len() <= CUSTOM_DATA_LIMIT {
        Ok(short)
    } else {
        Err(CheckoutError::CustomDataTooLong)
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !email.contains(char::is_whitespace),
        None => false,
    }
}
