use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::Duration;
use tracing::warn;

use vidtube_api::auth::AuthSettings;

const DEV_SECRET: &str = "dev-secret-change-me";

/// Runtime settings read from the environment (after `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub token_ttl_hours: i64,
    pub refresh_ttl_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = lookup("VIDTUBE_JWT_SECRET").unwrap_or_else(|| {
            warn!("VIDTUBE_JWT_SECRET not set, using the development secret");
            DEV_SECRET.into()
        });

        let config = Self {
            jwt_secret,
            db_path: PathBuf::from(lookup("VIDTUBE_DB_PATH").unwrap_or_else(|| "vidtube.db".into())),
            host: lookup("VIDTUBE_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_var(&lookup, "VIDTUBE_PORT", 3000)?,
            token_ttl_hours: parse_var(&lookup, "VIDTUBE_TOKEN_TTL_HOURS", 24)?,
            refresh_ttl_days: parse_var(&lookup, "VIDTUBE_REFRESH_TTL_DAYS", 10)?,
        };

        if config.token_ttl_hours <= 0 || config.refresh_ttl_days <= 0 {
            anyhow::bail!("token lifetimes must be positive");
        }
        Ok(config)
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    pub fn auth(&self) -> AuthSettings {
        AuthSettings {
            jwt_secret: self.jwt_secret.clone(),
            access_ttl: Duration::hours(self.token_ttl_hours),
            refresh_ttl: Duration::days(self.refresh_ttl_days),
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw.parse().with_context(|| format!("{} is not valid: {}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.jwt_secret, DEV_SECRET);
        assert_eq!(config.port, 3000);
        assert_eq!(config.db_path, PathBuf::from("vidtube.db"));
        assert_eq!(config.auth().access_ttl, Duration::hours(24));
        assert_eq!(config.addr().unwrap().port(), 3000);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("VIDTUBE_PORT", "8080"),
            ("VIDTUBE_HOST", "127.0.0.1"),
            ("VIDTUBE_REFRESH_TTL_DAYS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.addr().unwrap().to_string(), "127.0.0.1:8080");
        assert_eq!(config.auth().refresh_ttl, Duration::days(3));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        assert!(Config::from_lookup(lookup(&[("VIDTUBE_PORT", "http")])).is_err());
        assert!(Config::from_lookup(lookup(&[("VIDTUBE_TOKEN_TTL_HOURS", "0")])).is_err());
    }
}
