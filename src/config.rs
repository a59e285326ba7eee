//! Runtime configuration, read from the environment (and `.env`).

use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{Context, Result};
use time::Duration;

pub const DEFAULT_ADDRESS: &str = "0.0.0.0:3000";
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";
pub const DEFAULT_SESSION_DAYS: i64 = 30;
pub const DEFAULT_PASSWORD_COST: u32 = 10;

pub const MAILGUN_DOMAIN: &str = "mail.campuspickup.app";
pub const MAIL_FROM_NAME: &str = "Campus Pickup";
pub const MAIL_FROM_ADDRESS: &str = "noreply@campuspickup.app";

#[derive(Debug, Clone)]
pub struct Config {
    pub address: SocketAddr,
    /// Postgres connection string; without one the in-memory store is used
    pub database_url: Option<String>,
    /// Base URL of this server, used for links in emails
    pub public_url: String,
    pub session_lifetime: Duration,
    pub password_cost: u32,
    pub mail: MailConfig,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Mailgun API token; without one emails are only logged
    pub mailgun_token: Option<String>,
    pub mailgun_domain: String,
    pub from_name: String,
    pub from_address: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: None,
            public_url: DEFAULT_PUBLIC_URL.to_owned(),
            session_lifetime: Duration::days(DEFAULT_SESSION_DAYS),
            password_cost: DEFAULT_PASSWORD_COST,
            mail: MailConfig {
                mailgun_token: None,
                mailgun_domain: MAILGUN_DOMAIN.to_owned(),
                from_name: MAIL_FROM_NAME.to_owned(),
                from_address: MAIL_FROM_ADDRESS.to_owned(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source. Blank values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let address = parse_or(var("PICKUP_ADDRESS"), DEFAULT_ADDRESS)
            .context("`PICKUP_ADDRESS` must be a socket address like 0.0.0.0:3000")?;
        let session_days: i64 = parse_or(var("SESSION_DAYS"), DEFAULT_SESSION_DAYS)
            .context("`SESSION_DAYS` must be a whole number of days")?;
        let password_cost: u32 = parse_or(var("PASSWORD_COST"), DEFAULT_PASSWORD_COST)
            .context("`PASSWORD_COST` must be a number")?;
        if !(4..=31).contains(&password_cost) {
            anyhow::bail!("`PASSWORD_COST` must be between 4 and 31, got {}", password_cost);
        }

        Ok(Self {
            address,
            database_url: var("DATABASE_URL"),
            public_url: var("PUBLIC_URL")
                .unwrap_or_else(|| DEFAULT_PUBLIC_URL.to_owned())
                .trim_end_matches('/')
                .to_owned(),
            session_lifetime: Duration::days(session_days),
            password_cost,
            mail: MailConfig {
                mailgun_token: var("MAILGUN_TOKEN"),
                mailgun_domain: var("MAILGUN_DOMAIN").unwrap_or_else(|| MAILGUN_DOMAIN.to_owned()),
                from_name: var("MAIL_FROM_NAME").unwrap_or_else(|| MAIL_FROM_NAME.to_owned()),
                from_address: var("MAIL_FROM_ADDRESS")
                    .unwrap_or_else(|| MAIL_FROM_ADDRESS.to_owned()),
            },
        })
    }

    pub fn verify_url(&self, user_id: uuid::Uuid, token: &str) -> String {
        format!(
            "{}/verifyEmail/user/{}?token={}",
            self.public_url, user_id, token
        )
    }
}

fn parse_or<T>(value: Option<String>, default: impl ToString) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = value.unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse()
        .with_context(|| format!("invalid value `{}`", raw))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.address, DEFAULT_ADDRESS.parse().unwrap());
        assert_eq!(config.database_url, None);
        assert_eq!(config.session_lifetime, Duration::days(30));
        assert_eq!(config.password_cost, 10);
        assert_eq!(config.mail.mailgun_token, None);
    }

    #[test]
    fn values_are_read_and_trimmed() {
        let config = config_from(&[
            ("PICKUP_ADDRESS", "127.0.0.1:8080"),
            ("DATABASE_URL", "postgres://localhost/pickup"),
            ("PUBLIC_URL", "https://campuspickup.app/"),
            ("SESSION_DAYS", " 7 "),
            ("MAILGUN_TOKEN", ""),
        ])
        .unwrap();

        assert_eq!(config.address.port(), 8080);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/pickup"));
        assert_eq!(config.session_lifetime, Duration::days(7));
        assert_eq!(config.mail.mailgun_token, None);

        let id = uuid::Uuid::nil();
        assert_eq!(
            config.verify_url(id, "abc123"),
            format!("https://campuspickup.app/verifyEmail/user/{}?token=abc123", id)
        );
    }

    #[test]
    fn malformed_values_fail() {
        assert!(config_from(&[("PICKUP_ADDRESS", "not an address")]).is_err());
        assert!(config_from(&[("SESSION_DAYS", "forever")]).is_err());
        assert!(config_from(&[("PASSWORD_COST", "2")]).is_err());
    }
}
