use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::PriceRegistrar;
use crate::catalog::error::RegistrarError;
use crate::catalog::record::{GameRecord, PriceId};

fn truncate_for_log(mut s: String, max_len: usize) -> String {
    if s.len() > max_len {
        let mut cut = max_len;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push('…');
    }
    s
}

/// Stripe price client.
/// Public API (base): https://api.stripe.com/
///
/// Key endpoint:
/// - POST /v1/prices (form encoded) - create a price with inline product data
#[derive(Debug, Clone)]
pub struct StripeProvider {
    base_url: String,
    http: Client,
    secret_key: String,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct StripePrice {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl StripeProvider {
    pub fn new(
        base_url: Option<&str>,
        secret_key: impl Into<String>,
        currency: impl Into<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self, RegistrarError> {
        let base_url = base_url
            .unwrap_or("https://api.stripe.com")
            .trim_end_matches('/')
            .to_string();
        let timeout_secs = timeout_secs.unwrap_or(30);
        let http = Client::builder()
            .user_agent("catalog-seed/0.1")
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            http,
            secret_key: secret_key.into(),
            currency: currency.into().to_ascii_lowercase(),
        })
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Form fields for the price-creation request.
    pub fn price_params(
        &self,
        record: &GameRecord,
    ) -> Result<Vec<(&'static str, String)>, RegistrarError> {
        let amount = record
            .unit_amount_minor()
            .ok_or(RegistrarError::Amount(record.price))?;
        Ok(vec![
            ("currency", self.currency.clone()),
            ("unit_amount", amount.to_string()),
            ("product_data[name]", record.title.clone()),
        ])
    }

    /// Create a price object and return its id.
    pub async fn create_price(&self, record: &GameRecord) -> Result<PriceId, RegistrarError> {
        let params = self.price_params(record)?;
        let url = format!("{}/v1/prices", self.base_url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .header("Accept", "application/json")
            .form(&params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<StripeErrorBody>(&body) {
                Ok(StripeErrorBody { error }) => match (error.kind, error.message) {
                    (Some(kind), Some(msg)) => format!("{kind}: {msg}"),
                    (None, Some(msg)) => msg,
                    (Some(kind), None) => kind,
                    (None, None) => truncate_for_log(body, 500),
                },
                Err(_) => truncate_for_log(body, 500),
            };
            return Err(RegistrarError::Rejected { status, message });
        }

        let body = resp.text().await?;
        let price: StripePrice = serde_json::from_str(&body).map_err(|e| {
            RegistrarError::Response(format!("{e}: {}", truncate_for_log(body.clone(), 200)))
        })?;
        debug!(price_id = %price.id, title = %record.title, "stripe price created");
        Ok(PriceId::new(price.id))
    }
}

#[async_trait::async_trait]
impl PriceRegistrar for StripeProvider {
    async fn register_price(&self, record: &GameRecord) -> Result<PriceId, RegistrarError> {
        self.create_price(record).await
    }
}
