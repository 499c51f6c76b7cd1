use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::*;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;

use crate::domain::ports::{CheckoutRequest, CreatedCheckout, GatewayError, PaymentGateway};
use crate::secret::Secret;

/// Tokens are refreshed this long before the gateway says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct GatewayCredentials {
    pub api_base: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct OrderResponse {
    id: String,
    status: String,
}

/// REST client for the payment gateway's orders API, authenticated with OAuth client credentials.
pub struct HttpPaymentGateway {
    credentials: GatewayCredentials,
    client: Client,
    token: Mutex<Option<AccessToken>>,
}

impl HttpPaymentGateway {
    pub fn new(credentials: GatewayCredentials, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self { credentials, client, token: Mutex::new(None) })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.credentials.api_base.trim_end_matches('/'))
    }

    async fn access_token(&self) -> Result<String, GatewayError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.expires_at > Instant::now()) {
            return Ok(token.value.clone());
        }
        debug!("💳️ Requesting a new gateway access token");
        let response = self
            .client
            .post(self.url("/v1/oauth2/token"))
            .basic_auth(&self.credentials.client_id, Some(self.credentials.client_secret.reveal()))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let token: TokenResponse = read_json(response).await?;
        let value = token.access_token.clone();
        *cached = token_deadline(Instant::now(), token.expires_in)
            .map(|expires_at| AccessToken { value: token.access_token, expires_at });
        Ok(value)
    }
}

/// When a token issued at `now` should be refreshed. `None` when the lifetime is out of range, in
/// which case the token is used once and not cached.
fn token_deadline(now: Instant, expires_in: u64) -> Option<Instant> {
    let lifetime = Duration::from_secs(expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
    now.checked_add(lifetime)
}

async fn read_json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GatewayError::Rejected { status: status.as_u16(), body });
    }
    response.json::<T>().await.map_err(|e| GatewayError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_order(&self, request: &CheckoutRequest) -> Result<CreatedCheckout, GatewayError> {
        let token = self.access_token().await?;
        let body = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "description": request.description,
                "custom_id": request.custom_data,
                "amount": {
                    "currency_code": request.currency,
                    "value": request.amount.with_scale(2).to_string(),
                },
            }],
        });
        trace!("💳️ Creating gateway order: {body}");
        let response = self
            .client
            .post(self.url("/v2/checkout/orders"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let created: OrderResponse = read_json(response).await?;
        Ok(CreatedCheckout { transaction_id: created.id, status: created.status })
    }
}
