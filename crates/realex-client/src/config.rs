//! Gateway configuration.

use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use realex_core::{Credentials, GatewayError};

use crate::signing::DigestAlgorithm;

/// Acquirer environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    /// Sandbox. No money moves.
    #[default]
    Test,
    /// Live processing.
    Production,
}

impl Environment {
    /// Base URL of the acquirer's remote API for this environment.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Test => "https://api.sandbox.realexpayments.com/epage-remote.cgi",
            Self::Production => "https://api.realexpayments.com/epage-remote.cgi",
        }
    }
}

impl FromStr for Environment {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "test" | "sandbox" => Ok(Self::Test),
            "production" | "live" => Ok(Self::Production),
            other => Err(GatewayError::Configuration(format!(
                "unknown environment: {other}"
            ))),
        }
    }
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Merchant credentials.
    pub credentials: Credentials,

    /// Acquirer environment (default: test).
    pub environment: Environment,

    /// Endpoint override, used instead of the environment's URL when set.
    pub endpoint: Option<String>,

    /// Per-request timeout in seconds (default: 30).
    pub timeout_seconds: u64,

    /// Currency used when a call does not name one (default: "GBP").
    pub default_currency: String,

    /// Currencies the merchant account accepts. Empty accepts any ISO code.
    pub supported_currencies: Vec<String>,

    /// Digest algorithm (default: SHA-1).
    pub digest: DigestAlgorithm,

    /// Whether `process` settles immediately (purchase) or only
    /// authorizes (default: false).
    pub auto_settle: bool,
}

/// Realex secrets file structure.
#[derive(Debug, Deserialize)]
struct RealexSecrets {
    merchant_id: String,
    shared_secret: String,
    #[serde(default)]
    account: Option<String>,
    #[serde(default)]
    rebate_secret: Option<String>,
}

impl GatewayConfig {
    /// Configuration with defaults for everything except credentials.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            environment: Environment::Test,
            endpoint: None,
            timeout_seconds: 30,
            default_currency: "GBP".into(),
            supported_currencies: Vec::new(),
            digest: DigestAlgorithm::Sha1,
            auto_settle: false,
        }
    }

    /// Load configuration from a secrets file or environment variables.
    ///
    /// Credentials come from `.secrets/realex.json` when one of the known
    /// paths exists, otherwise from `REALEX_MERCHANT_ID`,
    /// `REALEX_SHARED_SECRET`, `REALEX_ACCOUNT` and `REALEX_REBATE_SECRET`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] if credentials are missing or a
    /// variable has an invalid value.
    pub fn from_env() -> Result<Self, GatewayError> {
        let credentials = load_credentials()?;
        let mut config = Self::new(credentials);

        if let Ok(env) = std::env::var("REALEX_ENVIRONMENT") {
            config.environment = env.parse()?;
        }
        config.endpoint = std::env::var("REALEX_ENDPOINT")
            .ok()
            .filter(|s| !s.trim().is_empty());
        if let Ok(raw) = std::env::var("REALEX_TIMEOUT_SECONDS") {
            config.timeout_seconds = raw.parse().map_err(|_| {
                GatewayError::Configuration(format!("invalid REALEX_TIMEOUT_SECONDS: {raw}"))
            })?;
        }
        if let Ok(currency) = std::env::var("REALEX_CURRENCY") {
            config.default_currency = currency.trim().to_string();
        }
        if let Ok(list) = std::env::var("REALEX_SUPPORTED_CURRENCIES") {
            config.supported_currencies = list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(digest) = std::env::var("REALEX_DIGEST") {
            config.digest = match digest.trim().to_ascii_lowercase().as_str() {
                "sha1" => DigestAlgorithm::Sha1,
                "md5" => DigestAlgorithm::Md5,
                other => {
                    return Err(GatewayError::Configuration(format!(
                        "unknown digest algorithm: {other}"
                    )))
                }
            };
        }
        config.auto_settle = std::env::var("REALEX_AUTO_SETTLE")
            .is_ok_and(|v| matches!(v.trim(), "1" | "true" | "yes"));

        Ok(config)
    }

    /// The endpoint requests are sent to.
    #[must_use]
    pub fn endpoint_url(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.environment.endpoint())
    }

    /// The per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] for a zero timeout: every call
    /// must be bounded.
    pub fn timeout(&self) -> Result<Duration, GatewayError> {
        if self.timeout_seconds == 0 {
            return Err(GatewayError::Configuration(
                "timeout must be at least one second".into(),
            ));
        }
        Ok(Duration::from_secs(self.timeout_seconds))
    }
}

/// Load credentials from a secrets file or environment.
fn load_credentials() -> Result<Credentials, GatewayError> {
    let secret_paths = [
        ".secrets/realex.json",
        "realex/.secrets/realex.json",
        "../.secrets/realex.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<RealexSecrets>(path) {
            tracing::info!(path = %path, "Loaded Realex secrets from file");
            return credentials_from_parts(
                secrets.merchant_id,
                secrets.shared_secret,
                secrets.account,
                secrets.rebate_secret,
            );
        }
    }

    // Fall back to environment variables
    tracing::debug!("Realex secrets file not found, using environment variables");
    let merchant_id = std::env::var("REALEX_MERCHANT_ID")
        .map_err(|_| GatewayError::Configuration("REALEX_MERCHANT_ID is not set".into()))?;
    let shared_secret = std::env::var("REALEX_SHARED_SECRET")
        .map_err(|_| GatewayError::Configuration("REALEX_SHARED_SECRET is not set".into()))?;

    credentials_from_parts(
        merchant_id,
        shared_secret,
        std::env::var("REALEX_ACCOUNT").ok(),
        std::env::var("REALEX_REBATE_SECRET").ok(),
    )
}

fn credentials_from_parts(
    merchant_id: String,
    shared_secret: String,
    account: Option<String>,
    rebate_secret: Option<String>,
) -> Result<Credentials, GatewayError> {
    let mut credentials = Credentials::new(merchant_id, shared_secret)?;
    if let Some(account) = account {
        credentials = credentials.with_account(account);
    }
    if let Some(rebate) = rebate_secret {
        credentials = credentials.with_rebate_secret(rebate);
    }
    Ok(credentials)
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(
    path: impl AsRef<Path>,
) -> Result<T, std::io::Error> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn creds() -> Credentials {
        Credentials::new("X", "Y").unwrap()
    }

    #[test]
    fn defaults() {
        let config = GatewayConfig::new(creds());
        assert_eq!(config.environment, Environment::Test);
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.default_currency, "GBP");
        assert_eq!(config.digest, DigestAlgorithm::Sha1);
        assert!(!config.auto_settle);
        assert_eq!(config.endpoint_url(), Environment::Test.endpoint());
    }

    #[test]
    fn endpoint_override_wins() {
        let mut config = GatewayConfig::new(creds());
        config.environment = Environment::Production;
        assert_eq!(
            config.endpoint_url(),
            "https://api.realexpayments.com/epage-remote.cgi"
        );
        config.endpoint = Some("http://127.0.0.1:9000".into());
        assert_eq!(config.endpoint_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn parses_environment_names() {
        assert_eq!("sandbox".parse::<Environment>().unwrap(), Environment::Test);
        assert_eq!("LIVE".parse::<Environment>().unwrap(), Environment::Production);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = GatewayConfig::new(creds());
        config.timeout_seconds = 0;
        assert!(matches!(
            config.timeout(),
            Err(GatewayError::Configuration(_))
        ));
    }

    #[test]
    fn loads_secrets_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"merchant_id": "thestore", "shared_secret": "s3cret", "account": "internet"}}"#
        )
        .unwrap();

        let secrets: RealexSecrets = load_secrets_file(file.path()).unwrap();
        let creds = credentials_from_parts(
            secrets.merchant_id,
            secrets.shared_secret,
            secrets.account,
            secrets.rebate_secret,
        )
        .unwrap();
        assert_eq!(creds.merchant_id(), "thestore");
        assert_eq!(creds.account(), Some("internet"));
        assert_eq!(creds.rebate_secret(), None);
    }

    #[test]
    fn missing_secrets_file_is_not_found() {
        let err = load_secrets_file::<RealexSecrets>("/nonexistent/realex.json").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn blank_secret_in_file_is_configuration_error() {
        let err = credentials_from_parts("thestore".into(), String::new(), None, None).unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
    }
}
