//! Service configuration loaded from environment variables.
//!
//! Required: `DATABASE_URL`, `JWT_SECRET`, `RAZORPAY_KEY_ID`,
//! `RAZORPAY_KEY_SECRET`, `S3_BUCKET_NAME`, `S3_ACCESS_KEY_ID`,
//! `S3_SECRET_ACCESS_KEY`, `STORAGE_ENDPOINT`.
//!
//! Optional: `DATABASE_NAME`, `HOST`, `PORT`, `JWT_EXPIRY_HOURS`,
//! `COOKIE_SECURE`, `RAZORPAY_API_URL`, `CURRENCY`, `S3_REGION`,
//! `STORAGE_PUBLIC_URL`.

use std::env;
use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

const DEFAULT_RAZORPAY_API_URL: &str = "https://api.razorpay.com/v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub database_name: String,
    pub host: IpAddr,
    pub port: u16,
    pub auth: AuthSettings,
    pub razorpay: RazorpayConfig,
    pub storage: StorageConfig,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("database_name", &self.database_name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("auth", &self.auth)
            .field("razorpay", &self.razorpay)
            .field("storage", &self.storage)
            .finish()
    }
}

/// Session token settings shared by the login handlers and the auth middleware.
#[derive(Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub cookie_secure: bool,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

#[derive(Clone)]
pub struct RazorpayConfig {
    pub api_url: String,
    pub key_id: String,
    pub key_secret: String,
    pub currency: String,
}

impl std::fmt::Debug for RazorpayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RazorpayConfig")
            .field("api_url", &self.api_url)
            .field("key_id", &self.key_id)
            .field("key_secret", &"[REDACTED]")
            .field("currency", &self.currency)
            .finish()
    }
}

#[derive(Clone)]
pub struct StorageConfig {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub public_url: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("public_url", &self.public_url)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first
    /// when one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = parse("HOST", &or_default("HOST", "127.0.0.1"))?;
        let port = parse("PORT", &or_default("PORT", "5000"))?;

        let token_ttl_hours: i64 = parse("JWT_EXPIRY_HOURS", &or_default("JWT_EXPIRY_HOURS", "24"))?;
        if token_ttl_hours <= 0 {
            return Err(ConfigError::InvalidEnvVar(
                "JWT_EXPIRY_HOURS".to_string(),
                "must be positive".to_string(),
            ));
        }

        let auth = AuthSettings {
            jwt_secret: required("JWT_SECRET")?,
            token_ttl_hours,
            cookie_secure: parse("COOKIE_SECURE", &or_default("COOKIE_SECURE", "false"))?,
        };

        let razorpay = RazorpayConfig {
            api_url: trim_slash(or_default("RAZORPAY_API_URL", DEFAULT_RAZORPAY_API_URL)),
            key_id: required("RAZORPAY_KEY_ID")?,
            key_secret: required("RAZORPAY_KEY_SECRET")?,
            currency: or_default("CURRENCY", "INR"),
        };

        let endpoint = trim_slash(required("STORAGE_ENDPOINT")?);
        let bucket = required("S3_BUCKET_NAME")?;
        let public_url = lookup("STORAGE_PUBLIC_URL")
            .map(trim_slash)
            .unwrap_or_else(|| format!("{endpoint}/{bucket}"));
        let storage = StorageConfig {
            endpoint,
            region: or_default("S3_REGION", "us-east-1"),
            bucket,
            public_url,
            access_key_id: required("S3_ACCESS_KEY_ID")?,
            secret_access_key: required("S3_SECRET_ACCESS_KEY")?,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_name: or_default("DATABASE_NAME", "ecom"),
            host,
            port,
            auth,
            razorpay,
            storage,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn trim_slash(value: String) -> String {
    value.trim_end_matches('/').to_string()
}
