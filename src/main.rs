use std::sync::Arc;

use dotenvy::dotenv;
use log::{info, warn};
use order_reconciler::domain::ports::{Mailer, PaymentGateway};
use order_reconciler::infrastructure::{
    DieselOrderRepository,
    DieselProfileDirectory,
    DieselWebhookEventLog,
    HttpMailer,
    HttpPaymentGateway,
    LogMailer,
};
use order_reconciler::webhook::HmacVerifier;
use order_reconciler::{build_server, create_pool, run_migrations, AppConfig, AppState, Collaborators};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    let pool = create_pool(config.database_url.reveal(), config.db_pool_size).map_err(std::io::Error::other)?;
    run_migrations(&pool).map_err(std::io::Error::other)?;

    let gateway: Option<Arc<dyn PaymentGateway>> = match config.gateway.clone() {
        Some(credentials) => {
            Some(Arc::new(HttpPaymentGateway::new(credentials, config.webhook_timeout).map_err(std::io::Error::other)?))
        },
        None => {
            warn!("💳️ Payment gateway credentials are not set. Checkout is disabled.");
            None
        },
    };
    let mailer: Arc<dyn Mailer> = match config.mail.clone() {
        Some(settings) => Arc::new(HttpMailer::new(settings, config.notify_timeout).map_err(std::io::Error::other)?),
        None => {
            warn!("📧️ MAIL_API_KEY is not set. Confirmation emails will only be logged.");
            Arc::new(LogMailer)
        },
    };
    if config.admin_token.is_none() {
        warn!("🔐️ ADMIN_API_TOKEN is not set. The order admin endpoints will refuse every request.");
    }

    let collaborators = Collaborators {
        orders: Arc::new(DieselOrderRepository::new(pool.clone())),
        events: Arc::new(DieselWebhookEventLog::new(pool.clone())),
        profiles: Arc::new(DieselProfileDirectory::new(pool)),
        mailer,
        gateway,
        verifier: Arc::new(HmacVerifier::new(&config.signature_header, config.webhook_secret.clone())),
    };
    let state = AppState::new(collaborators, config.webhook_timeout, config.notify_timeout, config.admin_token.clone());

    info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(state, &config.host, config.port)?.await
}
