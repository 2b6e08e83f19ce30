use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use anyhow::{Context, Result};

use tokenchat_store::{DEFAULT_CLIENT_START_TOKENS, DEFAULT_MESSAGE_COST, StoreConfig};

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_HOST: &str = "0.0.0.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub store: StoreConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host: IpAddr = parse_or(
            get("TOKENCHAT_HOST"),
            "TOKENCHAT_HOST",
            IpAddr::from_str(DEFAULT_HOST)?,
        )?;
        let port = parse_or(get("PORT"), "PORT", DEFAULT_PORT)?;
        let client_start_tokens = parse_or(
            get("TOKENCHAT_CLIENT_START_TOKENS"),
            "TOKENCHAT_CLIENT_START_TOKENS",
            DEFAULT_CLIENT_START_TOKENS,
        )?;
        let default_message_cost = parse_or(
            get("TOKENCHAT_DEFAULT_MESSAGE_COST"),
            "TOKENCHAT_DEFAULT_MESSAGE_COST",
            DEFAULT_MESSAGE_COST,
        )?;

        Ok(Self {
            host,
            port,
            store: StoreConfig {
                client_start_tokens,
                default_message_cost,
            },
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(v) => v
            .trim()
            .parse()
            .with_context(|| format!("invalid {}: {:?}", key, v)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.port, 4000);
        assert_eq!(cfg.addr().to_string(), "0.0.0.0:4000");
        assert_eq!(cfg.store, StoreConfig::default());
        assert_eq!(cfg.store.client_start_tokens, 100);
        assert_eq!(cfg.store.default_message_cost, 1);
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("PORT", "8080"),
            ("TOKENCHAT_HOST", "127.0.0.1"),
            ("TOKENCHAT_CLIENT_START_TOKENS", "200"),
            ("TOKENCHAT_DEFAULT_MESSAGE_COST", " 2 "),
        ])
        .unwrap();
        assert_eq!(cfg.addr().to_string(), "127.0.0.1:8080");
        assert_eq!(cfg.store.client_start_tokens, 200);
        assert_eq!(cfg.store.default_message_cost, 2);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = config(&[("PORT", "")]).unwrap();
        assert_eq!(cfg.port, DEFAULT_PORT);
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = config(&[("PORT", "not-a-port")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));

        assert!(config(&[("TOKENCHAT_DEFAULT_MESSAGE_COST", "-1")]).is_err());
    }
}
