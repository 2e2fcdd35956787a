//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_STOREFRONT_PRIVATE_TOKEN` - Storefront API private access token
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_DATABASE_URL` / `DATABASE_URL` - `PostgreSQL` session store
//!   (in-memory sessions when unset)
//! - `SHOPIFY_API_VERSION` - API version (default: 2026-01)
//! - `SHOP_BASE_CURRENCY` - Shop default currency (default: USD)
//! - `SHOP_SUPPORTED_CURRENCIES` - Comma separated list; queried from the
//!   Storefront API localization at startup when unset
//! - `SHOP_LOCALE_CURRENCIES` - Locale overrides, e.g. `pl-PL=PLN,de=EUR`
//! - `CURRENCY_COOKIE_NAME` - Currency cookie name (default: `harbor_currency`)
//! - `SHOPIFY_RETRY_BASE_DELAY_MS` - First retry delay (default: 1000)
//! - `SHOPIFY_RETRY_MAX_DELAY_MS` - Retry delay cap (default: 30000)
//! - `SHOPIFY_READ_RETRIES` - Retries for queries (default: 3)
//! - `SHOPIFY_WRITE_RETRIES` - Retries for mutations (default: 1)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use harbor_core::CurrencyCode;
use secrecy::SecretString;
use thiserror::Error;

use crate::shopify::retry::RetryPolicy;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Default name of the cookie holding the active currency.
pub const DEFAULT_CURRENCY_COOKIE: &str = "harbor_currency";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` session store URL (contains password)
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Shopify Storefront API configuration
    pub shopify: ShopifyStorefrontConfig,
    /// Shop currency settings
    pub currency: CurrencyConfig,
    /// Retry policy shared by all Storefront API calls
    pub retry: RetryPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Shopify Storefront API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ShopifyStorefrontConfig {
    /// Shopify store domain (e.g., your-store.myshopify.com)
    pub store: String,
    /// Shopify API version (e.g., 2026-01)
    pub api_version: String,
    /// Storefront API private access token (server-side only)
    pub storefront_private_token: SecretString,
}

impl std::fmt::Debug for ShopifyStorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyStorefrontConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("storefront_private_token", &"[REDACTED]")
            .finish()
    }
}

/// Shop currency settings.
#[derive(Debug, Clone)]
pub struct CurrencyConfig {
    /// Authoritative default currency for the shop.
    pub base: CurrencyCode,
    /// Allowed currencies in display order. Empty means "ask the backend".
    pub supported: Vec<CurrencyCode>,
    /// Locale tag (or bare language) overrides, checked before the region table.
    pub locale_currencies: HashMap<String, CurrencyCode>,
    /// Name of the cookie holding the active currency.
    pub cookie_name: String,
}

impl StorefrontConfig {
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

        let database_url = get_database_url("STOREFRONT_DATABASE_URL");
        let host = parse_env_or_default::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        let shopify = ShopifyStorefrontConfig::from_env()?;
        let currency = CurrencyConfig::from_env()?;
        let retry = retry_policy_from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            shopify,
            currency,
            retry,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl ShopifyStorefrontConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            store: get_required_env("SHOPIFY_STORE")?,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", "2026-01"),
            storefront_private_token: get_validated_secret("SHOPIFY_STOREFRONT_PRIVATE_TOKEN")?,
        })
    }
}

impl CurrencyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base = parse_env_or_default::<CurrencyCode>("SHOP_BASE_CURRENCY", "USD")?;
        let supported = get_optional_env("SHOP_SUPPORTED_CURRENCIES")
            .map(|raw| parse_currency_list(&raw))
            .transpose()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOP_SUPPORTED_CURRENCIES".to_string(), e))?
            .unwrap_or_default();
        let locale_currencies = get_optional_env("SHOP_LOCALE_CURRENCIES")
            .map(|raw| parse_locale_currencies(&raw))
            .transpose()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOP_LOCALE_CURRENCIES".to_string(), e))?
            .unwrap_or_default();

        Ok(Self {
            base,
            supported,
            locale_currencies,
            cookie_name: get_env_or_default("CURRENCY_COOKIE_NAME", DEFAULT_CURRENCY_COOKIE),
        })
    }
}

fn retry_policy_from_env() -> Result<RetryPolicy, ConfigError> {
    let defaults = RetryPolicy::default();
    let base_ms = parse_optional_env::<u64>("SHOPIFY_RETRY_BASE_DELAY_MS")?;
    let max_ms = parse_optional_env::<u64>("SHOPIFY_RETRY_MAX_DELAY_MS")?;

    Ok(RetryPolicy {
        base_delay: base_ms.map_or(defaults.base_delay, Duration::from_millis),
        max_delay: max_ms.map_or(defaults.max_delay, Duration::from_millis),
        read_max_retries: parse_optional_env("SHOPIFY_READ_RETRIES")?
            .unwrap_or(defaults.read_max_retries),
        write_max_retries: parse_optional_env("SHOPIFY_WRITE_RETRIES")?
            .unwrap_or(defaults.write_max_retries),
    })
}

// =============================================================================
// Value Parsers
// =============================================================================

/// Parse `"USD, EUR,PLN"` into codes, dropping duplicates but keeping order.
fn parse_currency_list(raw: &str) -> Result<Vec<CurrencyCode>, String> {
    let mut codes: Vec<CurrencyCode> = Vec::new();
    for part in raw.split(',').filter(|p| !p.trim().is_empty()) {
        let code = CurrencyCode::parse(part).map_err(|e| format!("{part:?}: {e}"))?;
        if !codes.contains(&code) {
            codes.push(code);
        }
    }
    Ok(codes)
}

/// Parse `"pl-PL=PLN,de=EUR"` into a lower-cased locale lookup table.
fn parse_locale_currencies(raw: &str) -> Result<HashMap<String, CurrencyCode>, String> {
    raw.split(',')
        .filter(|p| !p.trim().is_empty())
        .map(|pair| {
            let (locale, code) = pair
                .split_once('=')
                .ok_or_else(|| format!("{pair:?}: expected locale=CODE"))?;
            let code = CurrencyCode::parse(code).map_err(|e| format!("{pair:?}: {e}"))?;
            Ok((locale.trim().replace('_', "-").to_ascii_lowercase(), code))
        })
        .collect()
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to a default literal.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse an optional environment variable.
fn parse_optional_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .transpose()
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
    let len = s.len() as f64;
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the token issued by Shopify."
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
