use std::time::Duration;

use async_trait::async_trait;
use log::*;
use reqwest::Client;
use serde_json::{json, Value};

use crate::domain::ports::{Mailer, MailerError, OrderConfirmation};
use crate::secret::Secret;

#[derive(Debug, Clone)]
pub struct MailSettings {
    pub api_base: String,
    pub api_key: Secret<String>,
    pub from: String,
    /// Marketing audience to enroll paying customers in. Enrollment is skipped when unset.
    pub audience_id: Option<String>,
}

/// Mailer backed by the email provider's REST API.
pub struct HttpMailer {
    settings: MailSettings,
    client: Client,
}

impl HttpMailer {
    pub fn new(settings: MailSettings, timeout: Duration) -> Result<Self, MailerError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| MailerError::Transport(e.to_string()))?;
        Ok(Self { settings, client })
    }

    async fn post(&self, path: &str, body: &Value) -> Result<(), MailerError> {
        let url = format!("{}{path}", self.settings.api_base.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .bearer_auth(self.settings.api_key.reveal())
            .json(body)
            .send()
            .await
            .map_err(|e| MailerError::Transport(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(MailerError::Rejected { status: status.as_u16(), body })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_order_confirmation(&self, confirmation: &OrderConfirmation) -> Result<(), MailerError> {
        let (subject, text) = render_confirmation(confirmation);
        let body = json!({
            "from": self.settings.from,
            "to": [confirmation.to],
            "subject": subject,
            "text": text,
        });
        self.post("/emails", &body).await
    }

    async fn add_marketing_contact(&self, email: &str, name: Option<String>) -> Result<(), MailerError> {
        let Some(audience) = self.settings.audience_id.as_deref() else {
            trace!("📧️ No marketing audience configured");
            return Ok(());
        };
        let (first_name, last_name) = split_name(name.as_deref());
        let body = json!({
            "email": email,
            "first_name": first_name,
            "last_name": last_name,
            "unsubscribed": false,
        });
        self.post(&format!("/audiences/{audience}/contacts"), &body).await
    }
}

/// Stand-in used when no email provider is configured. Writes what would have been sent to the log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_order_confirmation(&self, confirmation: &OrderConfirmation) -> Result<(), MailerError> {
        let (subject, _) = render_confirmation(confirmation);
        info!("📧️ [mail disabled] Would send '{subject}' to {}", confirmation.to);
        Ok(())
    }

    async fn add_marketing_contact(&self, email: &str, _name: Option<String>) -> Result<(), MailerError> {
        info!("📧️ [mail disabled] Would enroll {email} in the marketing audience");
        Ok(())
    }
}

pub fn render_confirmation(c: &OrderConfirmation) -> (String, String) {
    let subject = format!("Your order {} is confirmed", c.transaction_id);
    let greeting = match c.customer_name.as_deref() {
        Some(name) => format!("Hi {name},"),
        None => "Hi,".to_string(),
    };
    let mut lines = vec![greeting, String::new(), format!("Thanks for your purchase of {}.", c.plan_description)];
    if let Some(amount) = &c.amount {
        lines.push(format!("Amount paid: {} {}", amount.with_scale(2), c.currency.as_deref().unwrap_or("")).trim_end().to_string());
    }
    lines.push(format!("Order reference: {}", c.transaction_id));
    if let Some(expiry) = c.expiry_date {
        lines.push(format!("Your subscription runs until {}.", expiry.format("%B %-d, %Y")));
    }
    lines.push(String::new());
    if c.guest_checkout {
        lines.push(
            "You checked out as a guest. Create an account with this email address to manage your subscription."
                .to_string(),
        );
    } else {
        lines.push("You can follow this order from your account dashboard.".to_string());
    }
    (subject, lines.join("\n"))
}

fn split_name(name: Option<&str>) -> (Option<&str>, Option<&str>) {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(full) => match full.split_once(' ') {
            Some((first, last)) => (Some(first), Some(last.trim())),
            None => (Some(full), None),
        },
        None => (None, None),
    }
}
