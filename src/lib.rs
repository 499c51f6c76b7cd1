pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;
pub mod secret;
pub mod state;
pub mod webhook;

#[cfg(test)]
mod test_support;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub use config::AppConfig;
pub use db::{create_pool, DbPool};
pub use state::{AppState, Collaborators};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    for version in applied {
        log::info!("Applied migration {version}");
    }
    Ok(())
}

/// Registers every route and the shared state. Used by the server and by handler tests.
pub fn configure(cfg: &mut web::ServiceConfig, state: AppState) {
    cfg.app_data(web::Data::new(state))
        .route("/health", web::get().to(handlers::health))
        .route("/api-docs/openapi.json", web::get().to(handlers::openapi_json))
        .route("/webhooks/gateway", web::post().to(handlers::webhooks::receive_gateway_event))
        .route("/checkout/orders", web::post().to(handlers::checkout::create_checkout))
        .service(
            web::scope("/orders")
                .route("", web::get().to(handlers::orders::list_orders))
                .route("/{transaction_id}", web::get().to(handlers::orders::get_order))
                .route("/{transaction_id}/complete", web::post().to(handlers::orders::complete_order)),
        );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(state: AppState, host: &str, port: u16) -> std::io::Result<actix_web::dev::Server> {
    Ok(HttpServer::new(move || {
        let state = state.clone();
        App::new().wrap(Logger::default()).configure(move |cfg| configure(cfg, state))
    })
    .bind((host.to_string(), port))?
    .run())
}
