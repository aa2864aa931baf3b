//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ADMIN_API_TOKEN` - Bearer token for admin routes (min 32 chars, high entropy)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 0.0.0.0)
//! - `STOREFRONT_PORT` - Listen port (default: 5000)
//! - `STOREFRONT_BASE_URL` - Public URL, decides secure cookies (default: `http://localhost:5000`)
//! - `ALLOWED_ORIGINS` - Comma-separated CORS origins
//! - `TELEGRAM_BOT_TOKEN` / `TELEGRAM_CHAT_ID` - Telegram notifications (both or neither)
//! - `TELEGRAM_API_BASE` - Telegram Bot API base URL (default: `https://api.telegram.org`)
//! - `OFFER_AUTO_ACCEPT_SECONDS` - Delay before pending offers auto-resolve (default: 30)
//! - `OFFER_FLOOR_RATIO` - Lowest auto-accepted `offer / list` ratio (default: 0.80)
//! - `OFFER_TTL_HOURS` - Age after which pending offers expire (default: 24)
//! - `FLAT_SHIPPING` - Shipping charge per order in USD (default: 25.00)
//! - `MIN_ORDER_QUANTITY` - Fewest units per order (default: 5)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use uephone_core::{AutoAcceptPolicy, ShippingPolicy};

const MIN_ADMIN_TOKEN_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";
const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

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
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// Origins allowed to call the API from a browser
    pub allowed_origins: Vec<String>,
    /// Bearer token guarding admin routes
    pub admin_api_token: SecretString,
    /// Telegram notification settings, if enabled
    pub telegram: Option<TelegramConfig>,
    /// Offer negotiation timings and policy
    pub offers: OfferConfig,
    /// Shipping charge and minimum order
    pub shipping: ShippingPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Telegram Bot API configuration.
///
/// Implements `Debug` manually to redact the bot token.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token issued by `@BotFather`
    pub bot_token: SecretString,
    /// Chat that receives store notifications
    pub chat_id: String,
    /// API base URL
    pub api_base: Url,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base.as_str())
            .finish()
    }
}

/// Offer negotiation settings.
#[derive(Debug, Clone, Copy)]
pub struct OfferConfig {
    /// How long a pending offer waits before the auto-accept policy decides it
    pub auto_accept_after: Duration,
    /// Auto-accept policy applied when the delay elapses
    pub policy: AutoAcceptPolicy,
    /// Pending offers older than this are expired
    pub ttl: Duration,
}

impl Default for OfferConfig {
    fn default() -> Self {
        Self {
            auto_accept_after: Duration::from_secs(30),
            policy: AutoAcceptPolicy::default(),
            ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
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

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_parsed_env("STOREFRONT_HOST", "0.0.0.0")?;
        let port = get_parsed_env("STOREFRONT_PORT", "5000")?;
        let base_url = get_parsed_env("STOREFRONT_BASE_URL", "http://localhost:5000")?;
        let allowed_origins = parse_origins(
            "ALLOWED_ORIGINS",
            &get_env_or_default("ALLOWED_ORIGINS", DEFAULT_ALLOWED_ORIGINS),
        )?;

        let admin_api_token = get_validated_secret("ADMIN_API_TOKEN")?;
        validate_secret_length(&admin_api_token, "ADMIN_API_TOKEN")?;

        let telegram = TelegramConfig::from_env()?;
        let offers = OfferConfig::from_env()?;
        let shipping = shipping_policy(
            get_parsed_env("FLAT_SHIPPING", "25.00")?,
            get_parsed_env("MIN_ORDER_QUANTITY", "5")?,
        )?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            allowed_origins,
            admin_api_token,
            telegram,
            offers,
            shipping,
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
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

impl TelegramConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        match (
            get_optional_env("TELEGRAM_BOT_TOKEN"),
            get_optional_env("TELEGRAM_CHAT_ID"),
        ) {
            (None, None) => Ok(None),
            (Some(token), Some(chat_id)) => Ok(Some(Self {
                bot_token: SecretString::from(token),
                chat_id,
                api_base: get_parsed_env("TELEGRAM_API_BASE", DEFAULT_TELEGRAM_API_BASE)?,
            })),
            (Some(_), None) => Err(ConfigError::MissingEnvVar("TELEGRAM_CHAT_ID".to_string())),
            (None, Some(_)) => Err(ConfigError::MissingEnvVar(
                "TELEGRAM_BOT_TOKEN".to_string(),
            )),
        }
    }
}

impl OfferConfig {
    /// Load only the offer settings, for tools that do not serve HTTP.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for unparsable values, a floor
    /// ratio outside `(0, 1]` or a TTL too long to represent.
    pub fn from_env() -> Result<Self, ConfigError> {
        let seconds: u64 = get_parsed_env("OFFER_AUTO_ACCEPT_SECONDS", "30")?;
        let hours: u64 = get_parsed_env("OFFER_TTL_HOURS", "24")?;
        let floor_ratio: Decimal = get_parsed_env("OFFER_FLOOR_RATIO", "0.80")?;

        if floor_ratio <= Decimal::ZERO || floor_ratio > Decimal::ONE {
            return Err(ConfigError::InvalidEnvVar(
                "OFFER_FLOOR_RATIO".to_string(),
                format!("must be in (0, 1], got {floor_ratio}"),
            ));
        }

        Ok(Self {
            auto_accept_after: Duration::from_secs(seconds),
            policy: AutoAcceptPolicy::new(floor_ratio),
            ttl: ttl_from_hours(hours)?,
        })
    }
}

fn ttl_from_hours(hours: u64) -> Result<Duration, ConfigError> {
    hours
        .checked_mul(60 * 60)
        .map(Duration::from_secs)
        .ok_or_else(|| {
            ConfigError::InvalidEnvVar("OFFER_TTL_HOURS".to_string(), format!("{hours} is too large"))
        })
}

fn shipping_policy(flat_rate: Decimal, minimum_quantity: i64) -> Result<ShippingPolicy, ConfigError> {
    if flat_rate < Decimal::ZERO {
        return Err(ConfigError::InvalidEnvVar(
            "FLAT_SHIPPING".to_string(),
            format!("must not be negative, got {flat_rate}"),
        ));
    }
    if minimum_quantity < 1 {
        return Err(ConfigError::InvalidEnvVar(
            "MIN_ORDER_QUANTITY".to_string(),
            format!("must be at least 1, got {minimum_quantity}"),
        ));
    }
    Ok(ShippingPolicy {
        flat_rate,
        minimum_quantity,
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an environment variable parsed into `T`, falling back to `default`.
fn get_parsed_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Split a comma-separated origin list, checking each is an absolute URL.
fn parse_origins(key: &str, raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|origin| {
            Url::parse(origin)
                .map(|_| origin.trim_end_matches('/').to_string())
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), format!("{origin}: {e}")))
        })
        .collect()
}

/// Validate that a secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_ADMIN_TOKEN_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_ADMIN_TOKEN_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
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

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated token."
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

    fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/uephone_test"),
            host: "0.0.0.0".parse().unwrap(),
            port: 5000,
            base_url: Url::parse("http://localhost:5000").unwrap(),
            allowed_origins: vec!["http://localhost:5173".to_string()],
            admin_api_token: SecretString::from("k9Qz2LmX7vB4nR8tW1yH6pJ3sD5fG0aC"),
            telegram: None,
            offers: OfferConfig::default(),
            shipping: ShippingPolicy::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_ttl_hours_overflow_is_config_error() {
        assert_eq!(ttl_from_hours(24).unwrap(), Duration::from_secs(86_400));
        assert!(matches!(
            ttl_from_hours(u64::MAX),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "OFFER_TTL_HOURS"
        ));
    }

    #[test]
    fn test_shipping_policy_bounds() {
        let policy = shipping_policy(Decimal::ZERO, 1).unwrap();
        assert_eq!(policy.flat_rate, Decimal::ZERO);
        assert_eq!(policy.minimum_quantity, 1);

        assert!(matches!(
            shipping_policy(Decimal::new(-1, 2), 5),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "FLAT_SHIPPING"
        ));
        assert!(matches!(
            shipping_policy(Decimal::from(25), 0),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "MIN_ORDER_QUANTITY"
        ));
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-admin-token-here", "ADMIN_API_TOKEN");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength(&"ab".repeat(20), "ADMIN_API_TOKEN");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("k9Qz2LmX7vB4nR8tW1yH6pJ3sD5fG0aC", "ADMIN_API_TOKEN");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_secret_length() {
        let short = SecretString::from("aB3$xY9!mK2@");
        assert!(validate_secret_length(&short, "ADMIN_API_TOKEN").is_err());

        let long = SecretString::from("k9Qz2LmX7vB4nR8tW1yH6pJ3sD5fG0aC");
        assert!(validate_secret_length(&long, "ADMIN_API_TOKEN").is_ok());
    }

    #[test]
    fn test_parse_origins() {
        let origins = parse_origins(
            "ALLOWED_ORIGINS",
            "http://localhost:3000/, https://shop.uephone.example ,",
        )
        .unwrap();
        assert_eq!(
            origins,
            vec!["http://localhost:3000", "https://shop.uephone.example"]
        );

        assert!(parse_origins("ALLOWED_ORIGINS", "not a url").is_err());
    }

    #[test]
    fn test_socket_addr_and_secure_flag() {
        let mut config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "0.0.0.0");
        assert_eq!(addr.port(), 5000);
        assert!(!config.is_secure());

        config.base_url = Url::parse("https://shop.uephone.example").unwrap();
        assert!(config.is_secure());
    }

    #[test]
    fn test_telegram_config_debug_redacts_token() {
        let config = TelegramConfig {
            bot_token: SecretString::from("7806541153:super_secret_bot_token"),
            chat_id: "6777655739".to_string(),
            api_base: Url::parse(DEFAULT_TELEGRAM_API_BASE).unwrap(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("6777655739"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_bot_token"));
    }

    #[test]
    fn test_offer_config_defaults() {
        let offers = OfferConfig::default();
        assert_eq!(offers.auto_accept_after, Duration::from_secs(30));
        assert_eq!(offers.ttl, Duration::from_secs(86_400));
        assert_eq!(offers.policy.floor_ratio, Decimal::new(80, 2));
    }
}
