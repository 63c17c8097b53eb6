use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

#[derive(Debug, Clone, PartialEq)]
pub enum MailConfig {
    /// No mail API configured: verification links go to the log.
    Log,
    Http {
        api_url: String,
        api_key: String,
        from_email: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_hours: Option<i64>,
    pub site_url: String,
    pub site_name: String,
    pub upload_dir: PathBuf,
    pub mail: MailConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = get("STOREFRONT_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("STOREFRONT_JWT_SECRET is unset or still a placeholder; set it in .env and restart");
        }

        let port: u16 = or("STOREFRONT_PORT", "8000")
            .parse()
            .context("STOREFRONT_PORT must be a port number")?;

        let token_ttl_hours = get("STOREFRONT_TOKEN_TTL_HOURS")
            .map(|v| v.parse::<i64>())
            .transpose()
            .context("STOREFRONT_TOKEN_TTL_HOURS must be a whole number of hours")?;
        if matches!(token_ttl_hours, Some(h) if h <= 0) {
            bail!("STOREFRONT_TOKEN_TTL_HOURS must be positive");
        }

        let mail = match get("STOREFRONT_MAIL_API_URL") {
            None => MailConfig::Log,
            Some(api_url) => MailConfig::Http {
                api_url,
                api_key: get("STOREFRONT_MAIL_API_KEY")
                    .context("STOREFRONT_MAIL_API_KEY is required when STOREFRONT_MAIL_API_URL is set")?,
                from_email: get("STOREFRONT_MAIL_FROM")
                    .context("STOREFRONT_MAIL_FROM is required when STOREFRONT_MAIL_API_URL is set")?,
            },
        };

        Ok(Self {
            host: or("STOREFRONT_HOST", "0.0.0.0"),
            port,
            db_path: or("STOREFRONT_DB_PATH", "storefront.db").into(),
            jwt_secret,
            token_ttl_hours,
            site_url: or("STOREFRONT_SITE_URL", "http://localhost:8000"),
            site_name: or("STOREFRONT_SITE_NAME", "Nice shop"),
            upload_dir: or("STOREFRONT_UPLOAD_DIR", "./static/images").into(),
            mail,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}
