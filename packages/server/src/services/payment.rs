//! Outbound payment gateway used when registering for paid events.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PaymentConfig;

#[derive(Debug, Error)]
pub enum PaymentError {
    /// Online payment is switched off for this deployment.
    #[error("payment gateway is disabled")]
    Disabled,
    #[error("payment gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The gateway answered but refused to initialize the transaction.
    #[error("payment gateway rejected the transaction: {0}")]
    Rejected(String),
}

/// What the gateway needs to open a checkout session.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub amount: f64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Our transaction reference, unique per registration attempt.
    pub tx_ref: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentInit {
    pub reference: String,
    pub checkout_url: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize(&self, request: PaymentRequest) -> Result<PaymentInit, PaymentError>;
}

/// Refuses every transaction.
pub struct DisabledGateway;

#[async_trait]
impl PaymentGateway for DisabledGateway {
    async fn initialize(&self, _request: PaymentRequest) -> Result<PaymentInit, PaymentError> {
        Err(PaymentError::Disabled)
    }
}

/// Chapa `transaction/initialize` client.
pub struct ChapaGateway {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
    currency: String,
    callback_url: Option<String>,
    return_url: Option<String>,
}

#[derive(Serialize)]
struct InitializeBody<'a> {
    amount: String,
    currency: &'a str,
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    tx_ref: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_url: Option<&'a str>,
    customization: Customization<'a>,
}

#[derive(Serialize)]
struct Customization<'a> {
    title: &'a str,
}

#[derive(Deserialize)]
struct InitializeResponse {
    status: String,
    #[serde(default)]
    message: Option<serde_json::Value>,
    #[serde(default)]
    data: Option<CheckoutData>,
}

#[derive(Deserialize)]
struct CheckoutData {
    checkout_url: Option<String>,
}

impl ChapaGateway {
    pub fn new(client: reqwest::Client, config: &PaymentConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
            currency: config.currency.clone(),
            callback_url: config.callback_url.clone(),
            return_url: config.return_url.clone(),
        }
    }
}

#[async_trait]
impl PaymentGateway for ChapaGateway {
    #[tracing::instrument(skip(self, request), fields(tx_ref = %request.tx_ref))]
    async fn initialize(&self, request: PaymentRequest) -> Result<PaymentInit, PaymentError> {
        let body = InitializeBody {
            amount: format!("{:.2}", request.amount),
            currency: &self.currency,
            email: &request.email,
            first_name: &request.first_name,
            last_name: &request.last_name,
            tx_ref: &request.tx_ref,
            callback_url: self.callback_url.as_deref(),
            return_url: self.return_url.as_deref(),
            customization: Customization {
                title: &request.title,
            },
        };

        let response: InitializeResponse = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if response.status != "success" {
            let message = response
                .message
                .map(|m| m.to_string())
                .unwrap_or_else(|| response.status.clone());
            tracing::warn!(%message, "Payment initialization refused");
            return Err(PaymentError::Rejected(message));
        }

        Ok(PaymentInit {
            reference: request.tx_ref,
            checkout_url: response.data.and_then(|d| d.checkout_url),
        })
    }
}

/// Splits a display name into the first/last pair the gateway expects.
pub fn split_name(name: &str) -> (String, String) {
    let mut parts = name.split_whitespace();
    let first = parts.next().unwrap_or("Guest").to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}
