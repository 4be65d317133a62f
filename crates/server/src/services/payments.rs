//! Stripe API client for the mobile payment sheet.
//!
//! The app collects card details with the provider's payment sheet. This
//! client prepares the sheet (customer, ephemeral key, payment intent) and
//! later re-reads the intent so checkout only trusts what the provider says
//! was authorized.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::StripeConfig;
use crate::services::checkout::PaymentGateway;

/// API version pinned for ephemeral keys handed to the mobile SDK.
const EPHEMERAL_KEY_API_VERSION: &str = "2020-08-27";

/// Currency every intent is created in.
const CURRENCY: &str = "usd";

/// Errors that can occur when talking to the payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to build a request or parse a response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The client sent an ID that cannot be a payment intent.
    #[error("invalid payment intent id: {0}")]
    InvalidIntentId(String),

    /// The intent has not been authorized.
    #[error("payment not completed (status: {0})")]
    NotAuthorized(String),

    /// The authorized amount differs from the order total.
    #[error("payment amount mismatch: expected {expected}, got {actual}")]
    AmountMismatch { expected: i64, actual: i64 },

    /// The intent belongs to another customer.
    #[error("payment belongs to a different customer")]
    CustomerMismatch,
}

/// A payment intent as returned by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: i64,
    pub status: String,
    pub customer: Option<String>,
    pub client_secret: Option<String>,
}

impl PaymentIntent {
    /// Whether funds are authorized (captured or awaiting capture).
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        matches!(self.status.as_str(), "succeeded" | "requires_capture")
    }
}

/// Everything the mobile payment sheet needs to present itself.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSheet {
    /// Client secret of the payment intent.
    pub payment_intent: String,
    /// ID of the payment intent, sent back at checkout.
    pub payment_intent_id: String,
    pub publishable_key: String,
    pub customer: String,
    pub ephemeral_key: String,
    /// Amount in minor units.
    pub amount: i64,
}

#[derive(Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Deserialize)]
struct EphemeralKeyResponse {
    secret: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    api_base: Url,
    publishable_key: String,
}

impl StripeClient {
    /// Create a new Stripe API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StripeConfig) -> Result<Self, PaymentError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        let mut auth = HeaderValue::from_str(&auth_value)
            .map_err(|e| PaymentError::Parse(format!("Invalid API key format: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            publishable_key: config.publishable_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, PaymentError> {
        self.api_base
            .join(path)
            .map_err(|e| PaymentError::Parse(format!("invalid endpoint {path}: {e}")))
    }

    /// Send a request and decode a successful JSON body.
    async fn send<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, PaymentError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map_or(body, |parsed| parsed.error.message);
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))
    }

    /// Create a provider customer.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    pub async fn create_customer(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> Result<String, PaymentError> {
        let mut form = vec![("email", email)];
        if let Some(name) = name {
            form.push(("name", name));
        }

        let customer: IdResponse = self
            .send(self.client.post(self.endpoint("/v1/customers")?).form(&form))
            .await?;
        Ok(customer.id)
    }

    /// Create an ephemeral key letting the mobile SDK act for `customer_id`.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    pub async fn create_ephemeral_key(&self, customer_id: &str) -> Result<String, PaymentError> {
        let key: EphemeralKeyResponse = self
            .send(
                self.client
                    .post(self.endpoint("/v1/ephemeral_keys")?)
                    .header("Stripe-Version", EPHEMERAL_KEY_API_VERSION)
                    .form(&[("customer", customer_id)]),
            )
            .await?;
        Ok(key.secret)
    }

    /// Create a card payment intent for `amount` minor units.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    pub async fn create_payment_intent(
        &self,
        amount: i64,
        customer_id: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        let amount = amount.to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", CURRENCY),
            ("customer", customer_id),
            ("payment_method_types[]", "card"),
        ];

        self.send(
            self.client
                .post(self.endpoint("/v1/payment_intents")?)
                .form(&form),
        )
        .await
    }

    /// Fetch a payment intent.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    pub async fn retrieve_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        if !is_intent_id(intent_id) {
            return Err(PaymentError::InvalidIntentId(intent_id.to_owned()));
        }

        self.send(
            self.client
                .get(self.endpoint(&format!("/v1/payment_intents/{intent_id}"))?),
        )
        .await
    }

    /// Prepare the payment sheet for an existing provider customer.
    ///
    /// # Errors
    ///
    /// Returns error if any API request fails.
    pub async fn prepare_sheet(
        &self,
        customer_id: &str,
        amount: i64,
    ) -> Result<PaymentSheet, PaymentError> {
        let ephemeral_key = self.create_ephemeral_key(customer_id).await?;
        let intent = self.create_payment_intent(amount, customer_id).await?;
        let client_secret = intent
            .client_secret
            .ok_or_else(|| PaymentError::Parse("payment intent has no client secret".into()))?;

        Ok(PaymentSheet {
            payment_intent: client_secret,
            payment_intent_id: intent.id,
            publishable_key: self.publishable_key.clone(),
            customer: customer_id.to_owned(),
            ephemeral_key,
            amount,
        })
    }
}

/// Whether `id` has the shape of a provider intent ID and is safe to put in a path.
#[must_use]
pub fn is_intent_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Check a fetched intent against what checkout expects.
///
/// # Errors
///
/// Returns the first mismatch found.
pub fn check_intent(
    intent: &PaymentIntent,
    expected_amount: i64,
    customer_id: Option<&str>,
) -> Result<(), PaymentError> {
    if !intent.is_authorized() {
        return Err(PaymentError::NotAuthorized(intent.status.clone()));
    }
    if intent.amount != expected_amount {
        return Err(PaymentError::AmountMismatch {
            expected: expected_amount,
            actual: intent.amount,
        });
    }
    if customer_id.is_none() || intent.customer.as_deref() != customer_id {
        return Err(PaymentError::CustomerMismatch);
    }
    Ok(())
}

impl PaymentGateway for StripeClient {
    async fn verify_payment(
        &self,
        intent_id: &str,
        expected_amount: i64,
        customer_id: Option<&str>,
    ) -> Result<(), PaymentError> {
        let intent = self.retrieve_payment_intent(intent_id).await?;
        check_intent(&intent, expected_amount, customer_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn intent(status: &str, amount: i64, customer: Option<&str>) -> PaymentIntent {
        PaymentIntent {
            id: "pi_123".to_string(),
            amount,
            status: status.to_string(),
            customer: customer.map(String::from),
            client_secret: None,
        }
    }

    #[test]
    fn test_parse_payment_intent() {
        let json = r#"{
            "id": "pi_3Nabc",
            "object": "payment_intent",
            "amount": 2598,
            "currency": "usd",
            "status": "requires_payment_method",
            "customer": "cus_P1",
            "client_secret": "pi_3Nabc_secret_xyz"
        }"#;

        let intent: PaymentIntent = serde_json::from_str(json).unwrap();
        assert_eq!(intent.amount, 2598);
        assert_eq!(intent.client_secret.as_deref(), Some("pi_3Nabc_secret_xyz"));
        assert!(!intent.is_authorized());
    }

    #[test]
    fn test_parse_api_error_body() {
        let json = r#"{"error": {"type": "invalid_request_error", "message": "No such customer: 'cus_x'"}}"#;
        let body: ApiErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.error.message, "No such customer: 'cus_x'");
    }

    #[test]
    fn test_intent_id_shape() {
        assert!(is_intent_id("pi_3Nabc"));
        assert!(!is_intent_id(""));
        assert!(!is_intent_id("pi_1/capture"));
        assert!(!is_intent_id("pi_1?expand[]=customer"));
    }

    #[test]
    fn test_check_intent_accepts_authorized() {
        assert!(check_intent(&intent("succeeded", 1500, Some("cus_1")), 1500, Some("cus_1")).is_ok());
        assert!(
            check_intent(&intent("requires_capture", 1500, Some("cus_1")), 1500, Some("cus_1"))
                .is_ok()
        );
    }

    #[test]
    fn test_check_intent_rejects_unpaid() {
        let result = check_intent(&intent("requires_payment_method", 1500, Some("cus_1")), 1500, Some("cus_1"));
        assert!(matches!(result, Err(PaymentError::NotAuthorized(s)) if s == "requires_payment_method"));
    }

    #[test]
    fn test_check_intent_rejects_amount_mismatch() {
        let result = check_intent(&intent("succeeded", 999, Some("cus_1")), 1500, Some("cus_1"));
        assert!(matches!(
            result,
            Err(PaymentError::AmountMismatch { expected: 1500, actual: 999 })
        ));
    }

    #[test]
    fn test_check_intent_rejects_other_customer() {
        let result = check_intent(&intent("succeeded", 1500, Some("cus_2")), 1500, Some("cus_1"));
        assert!(matches!(result, Err(PaymentError::CustomerMismatch)));

        let result = check_intent(&intent("succeeded", 1500, None), 1500, None);
        assert!(matches!(result, Err(PaymentError::CustomerMismatch)));
    }

    #[test]
    fn test_sheet_serializes_camel_case() {
        let sheet = PaymentSheet {
            payment_intent: "pi_1_secret".into(),
            payment_intent_id: "pi_1".into(),
            publishable_key: "pk_test".into(),
            customer: "cus_1".into(),
            ephemeral_key: "ek_1".into(),
            amount: 1250,
        };
        let json = serde_json::to_value(&sheet).unwrap();
        assert_eq!(json["paymentIntent"], "pi_1_secret");
        assert_eq!(json["ephemeralKey"], "ek_1");
        assert_eq!(json["publishableKey"], "pk_test");
    }
}
