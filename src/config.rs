use std::{env, str::FromStr, time::Duration};

use log::*;
use thiserror::Error;

use crate::infrastructure::{GatewayCredentials, MailSettings};
use crate::secret::Secret;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Secret<String>,
    pub host: String,
    pub port: u16,
    pub db_pool_size: u32,
    pub webhook_secret: Secret<String>,
    pub signature_header: String,
    pub webhook_timeout: Duration,
    pub notify_timeout: Duration,
    /// `None` when the gateway credentials are not configured; checkout is then unavailable.
    pub gateway: Option<GatewayCredentials>,
    /// `None` when no email provider key is configured; mail is then only logged.
    pub mail: Option<MailSettings>,
    pub admin_token: Option<Secret<String>>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where F: Fn(&str) -> Option<String> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let webhook_secret = var("WEBHOOK_SECRET").ok_or(ConfigError::Missing("WEBHOOK_SECRET"))?;

        let gateway = match (var("GATEWAY_CLIENT_ID"), var("GATEWAY_CLIENT_SECRET")) {
            (Some(client_id), Some(secret)) => Some(GatewayCredentials {
                api_base: var("GATEWAY_API_BASE").unwrap_or_else(|| "https://api-m.sandbox.paypal.com".to_string()),
                client_id,
                client_secret: Secret::new(secret),
            }),
            (None, None) => None,
            _ => {
                warn!("🪛️ Only one of GATEWAY_CLIENT_ID and GATEWAY_CLIENT_SECRET is set. Checkout is disabled.");
                None
            },
        };

        let mail = var("MAIL_API_KEY").map(|key| MailSettings {
            api_base: var("MAIL_API_BASE").unwrap_or_else(|| "https://api.resend.com".to_string()),
            api_key: Secret::new(key),
            from: var("MAIL_FROM").unwrap_or_else(|| "orders@localhost".to_string()),
            audience_id: var("MARKETING_AUDIENCE_ID"),
        });

        Ok(Self {
            database_url: Secret::new(database_url),
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(var("PORT"), "PORT", 8080)?,
            db_pool_size: parse_or(var("DB_POOL_SIZE"), "DB_POOL_SIZE", 10)?,
            webhook_secret: Secret::new(webhook_secret),
            signature_header: var("WEBHOOK_SIGNATURE_HEADER").unwrap_or_else(|| "x-webhook-signature".to_string()),
            webhook_timeout: Duration::from_secs(parse_or(var("WEBHOOK_TIMEOUT_SECS"), "WEBHOOK_TIMEOUT_SECS", 10)?),
            notify_timeout: Duration::from_secs(parse_or(var("NOTIFY_TIMEOUT_SECS"), "NOTIFY_TIMEOUT_SECS", 15)?),
            gateway,
            mail,
            admin_token: var("ADMIN_API_TOKEN").map(Secret::new),
        })
    }
}

fn parse_or<T>(value: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::Invalid { name, message: format!("'{v}': {e}") }),
    }
}
