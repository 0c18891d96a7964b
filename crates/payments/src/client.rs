//! PayChangu REST client.
//!
//! Thin, stateless wrapper over the gateway's HTTP API: payment initiation,
//! synchronous verification, wallet balance, and webhook signature checks.
//! Persistence happens a layer up (checkout service / reconciler), never
//! here.

use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::error::{PaymentError, PaymentResult};

type HmacSha256 = Hmac<Sha256>;

const DEFAULT_BASE_URL: &str = "https://api.paychangu.com";

/// Gateway credentials and endpoint.
#[derive(Debug, Clone)]
pub struct PayChanguConfig {
    /// Bearer secret for REST calls.
    pub secret_key: String,
    /// Shared secret for inbound webhook signatures.
    pub webhook_secret: String,
    pub base_url: String,
}

impl PayChanguConfig {
    pub fn from_env() -> PaymentResult<Self> {
        let secret_key = std::env::var("PAYCHANGU_SECRET_KEY")
            .map_err(|_| PaymentError::MissingEnv("PAYCHANGU_SECRET_KEY"))?;
        let webhook_secret = std::env::var("PAYCHANGU_WEBHOOK_SECRET")
            .map_err(|_| PaymentError::MissingEnv("PAYCHANGU_WEBHOOK_SECRET"))?;
        let base_url = std::env::var("PAYCHANGU_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            secret_key,
            webhook_secret,
            base_url,
        })
    }
}

/// Opaque correlation data embedded in the gateway request and echoed back
/// in verification responses. This is how a webhook-less callback finds its
/// way back to the right invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMeta {
    pub invoice_id: i64,
    pub organization_id: Uuid,
}

impl PaymentMeta {
    /// The gateway echoes `meta` back either as an object or as a JSON
    /// string, depending on the endpoint. Accept both.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => serde_json::from_str(s).ok(),
            other => serde_json::from_value(other.clone()).ok(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Customization {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body of `POST /payment`.
#[derive(Debug, Clone, Serialize)]
pub struct InitiateRequest {
    /// Major units, e.g. `"100.00"`.
    pub amount: String,
    pub currency: String,
    pub tx_ref: String,
    pub callback_url: String,
    pub return_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
    pub meta: PaymentMeta,
}

/// Successful `POST /payment` data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiateData {
    #[serde(default)]
    pub event: Option<String>,
    pub checkout_url: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayAuthorization {
    pub channel: Option<String>,
}

/// A transaction as reported by `GET /verify-payment/{tx_ref}`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayPayment {
    pub tx_ref: String,
    pub status: String,
    pub reference: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub authorization: Option<GatewayAuthorization>,
    pub customer: Option<serde_json::Value>,
    pub meta: Option<serde_json::Value>,
}

/// `GET /wallet-balance` data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletBalance {
    pub currency: String,
    pub main_balance: f64,
    #[serde(default)]
    pub collection_balance: Option<f64>,
}

/// Every gateway response wraps its payload in this envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    message: Option<String>,
    data: Option<T>,
    errors: Option<serde_json::Value>,
}

/// PayChangu API client.
#[derive(Clone)]
pub struct PayChanguClient {
    http: reqwest::Client,
    config: PayChanguConfig,
}

impl PayChanguClient {
    pub fn new(config: PayChanguConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn from_env() -> PaymentResult<Self> {
        Ok(Self::new(PayChanguConfig::from_env()?))
    }

    pub fn config(&self) -> &PayChanguConfig {
        &self.config
    }

    /// Start a hosted checkout session. One attempt, no retry; a failure
    /// here means no local state was touched yet.
    pub async fn initiate(&self, request: &InitiateRequest) -> PaymentResult<InitiateData> {
        let url = format!("{}/payment", self.config.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .json(request)
            .send()
            .await?;

        unwrap_envelope(response).await
    }

    /// Resolve a transaction's current status at the gateway. Used by the
    /// callback-redirect flow so the user does not wait for the webhook.
    pub async fn verify(&self, tx_ref: &str) -> PaymentResult<GatewayPayment> {
        let url = format!("{}/verify-payment/{}", self.config.base_url, tx_ref);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.secret_key)
            .send()
            .await?;

        unwrap_envelope(response).await
    }

    /// Wallet balance passthrough; no local state involved.
    pub async fn wallet_balance(&self, currency: &str) -> PaymentResult<Option<WalletBalance>> {
        let url = format!("{}/wallet-balance", self.config.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.secret_key)
            .query(&[("currency", currency)])
            .send()
            .await?;

        let http_status = response.status();
        let text = response.text().await?;
        let envelope: Envelope<WalletBalance> = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(_) => {
                return Err(PaymentError::Gateway {
                    message: format!("gateway returned HTTP {http_status}"),
                    errors: None,
                })
            }
        };

        if !http_status.is_success() || envelope.status != "success" {
            return Err(PaymentError::Gateway {
                message: envelope
                    .message
                    .unwrap_or_else(|| format!("gateway returned HTTP {http_status}")),
                errors: envelope.errors,
            });
        }

        Ok(envelope.data)
    }

    /// Check an inbound webhook's `Signature` header: lowercase hex
    /// HMAC-SHA256 over the exact raw body bytes.
    ///
    /// Must run against the unparsed body — re-serializing the JSON can
    /// reorder keys and break byte-for-byte equality. Boolean by contract;
    /// malformed input is simply `false`.
    pub fn verify_webhook_signature(&self, raw_body: &[u8], signature: &str) -> bool {
        let Ok(provided) = hex::decode(signature.trim()) else {
            return false;
        };

        let Ok(mut mac) = HmacSha256::new_from_slice(self.config.webhook_secret.as_bytes()) else {
            return false;
        };
        mac.update(raw_body);
        let computed = mac.finalize().into_bytes();

        if provided.len() != computed.len() {
            return false;
        }
        computed.as_slice().ct_eq(provided.as_slice()).into()
    }
}

/// Unwrap the gateway envelope, translating non-2xx responses and
/// non-success envelope statuses into [`PaymentError::Gateway`].
async fn unwrap_envelope<T: DeserializeOwned>(response: reqwest::Response) -> PaymentResult<T> {
    let http_status = response.status();
    let text = response.text().await?;

    let envelope: Envelope<T> = match serde_json::from_str(&text) {
        Ok(envelope) => envelope,
        Err(_) => {
            return Err(PaymentError::Gateway {
                message: format!("gateway returned HTTP {http_status}"),
                errors: None,
            })
        }
    };

    if !http_status.is_success() || envelope.status != "success" {
        return Err(PaymentError::Gateway {
            message: envelope
                .message
                .unwrap_or_else(|| format!("gateway returned HTTP {http_status}")),
            errors: envelope.errors,
        });
    }

    envelope.data.ok_or_else(|| PaymentError::Gateway {
        message: "gateway response is missing its data payload".to_string(),
        errors: None,
    })
}
