//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use crate::config::ServerConfig;
use crate::services::{
    EmailService, ImageStore, MenuCache, OrderEvents, PaymentError, PushNotifier, StripeClient,
    notifications::PushError,
};

/// Error building the outbound service clients.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("payment client: {0}")]
    Payments(#[from] PaymentError),
    #[error("push client: {0}")]
    Push(#[from] PushError),
    #[error("email transport: {0}")]
    Email(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    stripe: StripeClient,
    push: PushNotifier,
    email: Option<EmailService>,
    images: ImageStore,
    menu_cache: MenuCache,
    order_events: OrderEvents,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if an outbound client cannot be built.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, StateError> {
        let stripe = StripeClient::new(&config.stripe)?;
        let push = PushNotifier::new(&config.push)?;
        let email = config.email.as_ref().map(EmailService::new).transpose()?;
        let images = ImageStore::new(&config.images);

        if email.is_none() {
            tracing::warn!("SMTP not configured; password reset codes will not be emailed");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                stripe,
                push,
                email,
                images,
                menu_cache: MenuCache::new(),
                order_events: OrderEvents::new(),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Payment provider client.
    #[must_use]
    pub fn stripe(&self) -> &StripeClient {
        &self.inner.stripe
    }

    #[must_use]
    pub fn push(&self) -> &PushNotifier {
        &self.inner.push
    }

    /// Email service, if SMTP is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    #[must_use]
    pub fn images(&self) -> &ImageStore {
        &self.inner.images
    }

    #[must_use]
    pub fn menu_cache(&self) -> &MenuCache {
        &self.inner.menu_cache
    }

    /// Order change feed.
    #[must_use]
    pub fn order_events(&self) -> &OrderEvents {
        &self.inner.order_events
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
impl AppState {
    /// State over a pool that never connects; only code paths that skip
    /// the database can be exercised.
    pub(crate) fn for_tests() -> Self {
        use std::path::PathBuf;

        use secrecy::SecretString;
        use sqlx::postgres::PgPoolOptions;
        use url::Url;

        use crate::config::{
            DEFAULT_EXPO_PUSH_URL, DEFAULT_MAX_IMAGE_BYTES, DEFAULT_STRIPE_API_BASE, ImageConfig,
            PushConfig, StripeConfig,
        };

        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/food_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: Url::parse("http://localhost:3000").unwrap(),
            images: ImageConfig {
                dir: PathBuf::from("data/product-images"),
                max_bytes: DEFAULT_MAX_IMAGE_BYTES,
            },
            stripe: StripeConfig {
                api_base: Url::parse(DEFAULT_STRIPE_API_BASE).unwrap(),
                secret_key: SecretString::from("sk_test_51Hq8ZpQ2vX9rT"),
                publishable_key: "pk_test_public".to_string(),
            },
            push: PushConfig {
                url: Url::parse(DEFAULT_EXPO_PUSH_URL).unwrap(),
                access_token: None,
            },
            email: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_traces_sample_rate: 0.0,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/food_test")
            .unwrap();
        Self::new(config, pool).unwrap()
    }
}
