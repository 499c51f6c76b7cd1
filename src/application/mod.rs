pub mod checkout_service;
pub mod notifications;
pub mod order_service;
pub mod reconcile_service;

pub use checkout_service::{CheckoutError, CheckoutService};
pub use notifications::ConfirmationDispatcher;
pub use order_service::OrderService;
pub use reconcile_service::{HandledEvent, ReconcileService, WebhookAction};
