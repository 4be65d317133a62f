//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FOOD_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `FOOD_BASE_URL` - Public URL of the API (used for cookie security and image URLs)
//! - `STRIPE_SECRET_KEY` - Stripe secret API key (server-side only)
//! - `STRIPE_PUBLISHABLE_KEY` - Stripe publishable key handed to the payment sheet
//!
//! ## Optional
//! - `FOOD_HOST` - Bind address (default: 127.0.0.1)
//! - `FOOD_PORT` - Listen port (default: 3000)
//! - `FOOD_IMAGE_DIR` - Product image storage directory (default: data/product-images)
//! - `FOOD_MAX_IMAGE_BYTES` - Upload size cap (default: 5 MiB)
//! - `STRIPE_API_BASE` - Stripe API base URL (default: <https://api.stripe.com>)
//! - `EXPO_PUSH_URL` - Expo push endpoint (default: <https://exp.host/--/api/v2/push/send>)
//! - `EXPO_ACCESS_TOKEN` - Expo access token for enhanced push security
//! - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `EMAIL_FROM` -
//!   outgoing mail for password reset codes (all or nothing; `SMTP_PORT` defaults to 587)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_TRACES_SAMPLE_RATE` - Sentry performance sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
pub const DEFAULT_EXPO_PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the API
    pub base_url: Url,
    /// Product image storage
    pub images: ImageConfig,
    /// Payment provider
    pub stripe: StripeConfig,
    /// Push notifications
    pub push: PushConfig,
    /// Outgoing mail, if configured
    pub email: Option<EmailConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry performance sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Product image storage configuration.
#[derive(Debug, Clone)]
pub struct ImageConfig {
    /// Directory uploaded images are written to and served from
    pub dir: PathBuf,
    /// Maximum accepted upload size in bytes
    pub max_bytes: usize,
}

/// Stripe configuration. Secrets print as redacted in `Debug`.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// API base URL
    pub api_base: Url,
    /// Secret API key
    pub secret_key: SecretString,
    /// Publishable key returned to clients with the payment sheet
    pub publishable_key: String,
}

/// Expo push notification configuration.
#[derive(Debug, Clone)]
pub struct PushConfig {
    /// Push send endpoint
    pub url: Url,
    /// Optional access token
    pub access_token: Option<SecretString>,
}

/// SMTP configuration for password reset mail.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    pub from_address: String,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("FOOD_DATABASE_URL")?;
        let host = parse_env("FOOD_HOST", "127.0.0.1")?;
        let port = parse_env("FOOD_PORT", "3000")?;
        let base_url = parse_url("FOOD_BASE_URL", &get_required_env("FOOD_BASE_URL")?)?;

        let images = ImageConfig {
            dir: PathBuf::from(get_env_or_default("FOOD_IMAGE_DIR", "data/product-images")),
            max_bytes: parse_env("FOOD_MAX_IMAGE_BYTES", &DEFAULT_MAX_IMAGE_BYTES.to_string())?,
        };

        let sentry_traces_sample_rate = parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            images,
            stripe: StripeConfig::from_env()?,
            push: PushConfig::from_env()?,
            email: EmailConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the public URL is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

impl StripeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_base: parse_url(
                "STRIPE_API_BASE",
                &get_env_or_default("STRIPE_API_BASE", DEFAULT_STRIPE_API_BASE),
            )?,
            secret_key: get_validated_secret("STRIPE_SECRET_KEY")?,
            publishable_key: get_required_env("STRIPE_PUBLISHABLE_KEY")?,
        })
    }
}

impl PushConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: parse_url(
                "EXPO_PUSH_URL",
                &get_env_or_default("EXPO_PUSH_URL", DEFAULT_EXPO_PUSH_URL),
            )?,
            access_token: get_optional_env("EXPO_ACCESS_TOKEN").map(SecretString::from),
        })
    }
}

impl EmailConfig {
    /// Mail is optional, but a half-configured SMTP block is an error.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(smtp_host) = get_optional_env("SMTP_HOST") else {
            return Ok(None);
        };

        Ok(Some(Self {
            smtp_host,
            smtp_port: parse_env("SMTP_PORT", "587")?,
            smtp_username: get_required_env("SMTP_USERNAME")?,
            smtp_password: get_required_secret("SMTP_PASSWORD")?,
            from_address: get_required_env("EMAIL_FROM")?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    get_required_env(key).map(SecretString::from)
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) with `FromStr`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse an absolute http(s) URL.
fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url =
        Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the provider."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> ServerConfig {
        ServerConfig {
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
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-stripe-key-here", "STRIPE_SECRET_KEY");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("sk_aaaaaaaaaaaaaaaaaaaaaaa", "STRIPE_SECRET_KEY");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_stripe_shaped_key() {
        let result = validate_secret_strength(
            "sk_test_51Hq8ZpQ2vX9rTbLmN3kYcW7dE0fGhJ4",
            "STRIPE_SECRET_KEY",
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_url_rejects_non_http() {
        assert!(parse_url("EXPO_PUSH_URL", "ftp://exp.host/push").is_err());
        assert!(parse_url("EXPO_PUSH_URL", "not a url").is_err());
        assert!(parse_url("EXPO_PUSH_URL", DEFAULT_EXPO_PUSH_URL).is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_is_secure() {
        let mut config = test_config();
        assert!(!config.is_secure());
        config.base_url = Url::parse("https://api.food.test").unwrap();
        assert!(config.is_secure());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug_output = format!("{:?}", test_config());

        assert!(debug_output.contains("pk_test_public"));
        assert!(!debug_output.contains("sk_test_51Hq8ZpQ2vX9rT"));
        assert!(!debug_output.contains("food_test"));
    }
}
