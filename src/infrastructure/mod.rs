pub mod event_log;
pub mod gateway_client;
pub mod mailer;
pub mod models;
pub mod order_repo;
pub mod profiles;

pub use event_log::DieselWebhookEventLog;
pub use gateway_client::{GatewayCredentials, HttpPaymentGateway};
pub use mailer::{HttpMailer, LogMailer, MailSettings};
pub use order_repo::DieselOrderRepository;
pub use profiles::DieselProfileDirectory;
