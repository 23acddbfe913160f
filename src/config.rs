//! Runtime configuration read from the environment (and `.env` via dotenvy).

use std::path::PathBuf;
use std::time::Duration;

use crate::{Result, StorefrontError};

const PRODUCTION_API_URL: &str = "https://rd-backend-0e7p.onrender.com";
const DEVELOPMENT_API_URL: &str = "http://localhost:5002";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" | "" => Ok(Self::Development),
            other => Err(StorefrontError::Config(format!("unknown SHOPKART_ENV '{other}'"))),
        }
    }

    pub fn default_api_url(self) -> &'static str {
        match self {
            Self::Production => PRODUCTION_API_URL,
            Self::Development => DEVELOPMENT_API_URL,
        }
    }
}

/// Payee details and polling policy for UPI deep-link payments.
#[derive(Clone, Debug)]
pub struct UpiConfig {
    pub payee_vpa: String,
    pub payee_name: String,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for UpiConfig {
    fn default() -> Self {
        Self {
            payee_vpa: "shopkart@upi".to_string(),
            payee_name: "ShopKart".to_string(),
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(180),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub api_base_url: String,
    pub session_file: PathBuf,
    pub http_timeout: Duration,
    /// Used when the backend's payment order omits its key id.
    pub gateway_key_id: Option<String>,
    pub upi: UpiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            api_base_url: DEVELOPMENT_API_URL.to_string(),
            session_file: PathBuf::from(".shopkart/session.json"),
            http_timeout: Duration::from_secs(30),
            gateway_key_id: None,
            upi: UpiConfig::default(),
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let environment = match lookup("SHOPKART_ENV") {
            Some(v) => Environment::parse(&v)?,
            None => Environment::Development,
        };
        let api_base_url = lookup("SHOPKART_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| environment.default_api_url().to_string())
            .trim_end_matches('/')
            .to_string();

        let defaults = Config::default();
        let upi_defaults = UpiConfig::default();

        Ok(Self {
            environment,
            api_base_url,
            session_file: lookup("SHOPKART_SESSION_FILE").map(PathBuf::from).unwrap_or(defaults.session_file),
            http_timeout: secs(&lookup, "SHOPKART_HTTP_TIMEOUT_SECS")?.unwrap_or(defaults.http_timeout),
            gateway_key_id: lookup("RAZORPAY_KEY_ID").filter(|v| !v.is_empty()),
            upi: UpiConfig {
                payee_vpa: lookup("SHOPKART_UPI_VPA").unwrap_or(upi_defaults.payee_vpa),
                payee_name: lookup("SHOPKART_UPI_PAYEE").unwrap_or(upi_defaults.payee_name),
                poll_interval: secs(&lookup, "SHOPKART_UPI_POLL_SECS")?.unwrap_or(upi_defaults.poll_interval),
                timeout: secs(&lookup, "SHOPKART_UPI_TIMEOUT_SECS")?.unwrap_or(upi_defaults.timeout),
            },
        })
    }
}

fn secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<Duration>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|s| Some(Duration::from_secs(s)))
            .map_err(|_| StorefrontError::Config(format!("{key} must be a whole number of seconds, got '{raw}'"))),
    }
}
