use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::errors::DomainError;
use super::order::{ListResult, Order, OrderStatus, OrderWrite, Reconciled};
use super::webhook_event::{NewWebhookEvent, WebhookEvent};

pub trait OrderRepository: Send + Sync + 'static {
    /// Reads the order for `transaction_id`, lets `plan` decide what to write, and applies it,
    /// with the read and the write forming one atomic unit against concurrent reconciliations of
    /// the same transaction id.
    fn reconcile(
        &self,
        transaction_id: &str,
        plan: &dyn Fn(Option<&Order>) -> OrderWrite,
    ) -> Result<Reconciled, DomainError>;
    fn find_by_transaction_id(&self, transaction_id: &str) -> Result<Option<Order>, DomainError>;
    fn list(&self, page: i64, limit: i64, status: Option<OrderStatus>) -> Result<ListResult, DomainError>;
    /// `ACTIVE | COMPLETED -> COMPLETED`. Fails with `InvalidTransition` for a pending order.
    fn mark_completed(&self, transaction_id: &str) -> Result<Order, DomainError>;
}

pub trait WebhookEventLog: Send + Sync + 'static {
    fn append(&self, event: NewWebhookEvent) -> Result<WebhookEvent, DomainError>;
}

/// Registered customer accounts, owned by the auth provider.
pub trait ProfileDirectory: Send + Sync + 'static {
    fn has_profile(&self, email: &str) -> Result<bool, DomainError>;
}

//--------------------------------------   Outbound services   ---------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct OrderConfirmation {
    pub to: String,
    pub customer_name: Option<String>,
    pub transaction_id: String,
    pub plan_description: String,
    pub amount: Option<BigDecimal>,
    pub currency: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    /// No registered profile exists for the address.
    pub guest_checkout: bool,
}

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Mail provider request failed: {0}")]
    Transport(String),
    #[error("Mail provider rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send_order_confirmation(&self, confirmation: &OrderConfirmation) -> Result<(), MailerError>;
    async fn add_marketing_contact(&self, email: &str, name: Option<String>) -> Result<(), MailerError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub amount: BigDecimal,
    pub currency: String,
    pub description: String,
    /// Opaque JSON string echoed back by the gateway inside later webhook events.
    pub custom_data: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedCheckout {
    pub transaction_id: String,
    pub status: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Payment gateway request failed: {0}")]
    Transport(String),
    #[error("Payment gateway rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Unexpected payment gateway response: {0}")]
    InvalidResponse(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    async fn create_order(&self, request: &CheckoutRequest) -> Result<CreatedCheckout, GatewayError>;
}
