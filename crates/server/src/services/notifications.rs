//! Expo push notifications for order status changes.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use food_order_core::{OrderId, OrderStatus};

use crate::config::PushConfig;

/// Errors that can occur when sending a push notification.
#[derive(Debug, Error)]
pub enum PushError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Push service returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Client configuration is invalid.
    #[error("Config error: {0}")]
    Config(String),
}

/// Message body accepted by the Expo push endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushMessage {
    pub to: String,
    pub sound: &'static str,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

impl PushMessage {
    /// Message telling the customer their order moved to `status`.
    #[must_use]
    pub fn order_status(token: &str, order_id: OrderId, status: OrderStatus) -> Self {
        let (title, body) = status.customer_message(order_id);
        Self {
            to: token.to_owned(),
            sound: "default",
            title: title.to_owned(),
            body,
            data: serde_json::json!({ "orderId": order_id, "status": status }),
        }
    }
}

/// Whether a token looks like an Expo push token.
#[must_use]
pub fn is_expo_token(token: &str) -> bool {
    (token.starts_with("ExponentPushToken[") || token.starts_with("ExpoPushToken["))
        && token.ends_with(']')
}

/// Expo push client.
#[derive(Clone)]
pub struct PushNotifier {
    client: reqwest::Client,
    url: Url,
}

impl PushNotifier {
    /// Create a new push client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &PushConfig) -> Result<Self, PushError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        if let Some(token) = &config.access_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| PushError::Config(format!("Invalid access token format: {e}")))?;
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    /// Send one message.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the service rejects it.
    pub async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(message)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PushError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }

    /// Notify a customer about a status change. Failures are logged, never
    /// returned: a missed notification must not undo the status update.
    pub async fn notify_order_status(
        &self,
        token: Option<&str>,
        order_id: OrderId,
        status: OrderStatus,
    ) {
        let Some(token) = token.filter(|t| is_expo_token(t)) else {
            tracing::debug!(order_id = %order_id, "No push token for order owner");
            return;
        };

        let message = PushMessage::order_status(token, order_id, status);
        match self.send(&message).await {
            Ok(()) => tracing::info!(order_id = %order_id, status = %status, "Push notification sent"),
            Err(e) => tracing::warn!(order_id = %order_id, error = %e, "Push notification failed"),
        }
    }
}
