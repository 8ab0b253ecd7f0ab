use crate::auth::Credentials;
use anyhow::{Context, Result};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://web3.okx.com";

/// Process-wide settings, read once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub api_base: String,
    pub proxy_url: Option<String>,
    pub request_timeout: Duration,
    pub node_url: Option<String>,
}

impl Config {
    /// Load config from a specific .env file, or the default `.env` if None.
    pub fn from_env_file(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => {
                dotenvy::from_filename(p).with_context(|| format!("Failed to load {p}"))?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }
        Self::build_from_env()
    }

    fn build_from_env() -> Result<Self> {
        Self::build_with(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; the environment is one such source.
    pub fn build_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            lookup(key).with_context(|| format!("{key} is required"))
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let credentials = Credentials::new(
            &required("API_KEY")?,
            &required("API_SECRET")?,
            &required("API_PASSPHRASE")?,
        );

        let request_timeout_secs: u64 = optional("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .context("REQUEST_TIMEOUT_SECS must be a valid u64")?;

        Ok(Self {
            credentials,
            api_base: optional("DEX_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            proxy_url: optional("CLIENT_PROXY"),
            request_timeout: Duration::from_secs(request_timeout_secs),
            node_url: optional("NODE_URL"),
        })
    }

    /// Config with explicit credentials and defaults for everything else.
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            credentials,
            api_base: DEFAULT_API_BASE.to_string(),
            proxy_url: None,
            request_timeout: Duration::from_secs(10),
            node_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const CREDS: [(&str, &str); 3] = [
        ("API_KEY", "key"),
        ("API_SECRET", "secret"),
        ("API_PASSPHRASE", "pass"),
    ];

    #[test]
    fn test_defaults() {
        let cfg = Config::build_with(source(&CREDS)).unwrap();
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert_eq!(cfg.proxy_url, None);
        assert_eq!(cfg.request_timeout, Duration::from_secs(10));
        assert_eq!(cfg.credentials.api_key(), "key");
    }

    #[test]
    fn test_missing_secret_is_error() {
        let err = Config::build_with(source(&[("API_KEY", "k"), ("API_PASSPHRASE", "p")]))
            .unwrap_err();
        assert!(err.to_string().contains("API_SECRET"));
    }

    #[test]
    fn test_optional_values() {
        let mut pairs = CREDS.to_vec();
        pairs.extend([
            ("CLIENT_PROXY", "socks5://127.0.0.1:1080"),
            ("DEX_API_BASE", "http://localhost:9000/"),
            ("REQUEST_TIMEOUT_SECS", "3"),
            ("NODE_URL", "https://bsc.example"),
        ]);
        let cfg = Config::build_with(source(&pairs)).unwrap();
        assert_eq!(cfg.proxy_url.as_deref(), Some("socks5://127.0.0.1:1080"));
        assert_eq!(cfg.api_base, "http://localhost:9000");
        assert_eq!(cfg.request_timeout, Duration::from_secs(3));
        assert_eq!(cfg.node_url.as_deref(), Some("https://bsc.example"));
    }

    #[test]
    fn test_empty_proxy_means_none() {
        let mut pairs = CREDS.to_vec();
        pairs.push(("CLIENT_PROXY", ""));
        let cfg = Config::build_with(source(&pairs)).unwrap();
        assert!(cfg.proxy_url.is_none());
    }

    #[test]
    fn test_bad_timeout() {
        let mut pairs = CREDS.to_vec();
        pairs.push(("REQUEST_TIMEOUT_SECS", "soon"));
        assert!(Config::build_with(source(&pairs)).is_err());
    }
}
