//! Client configuration: gateway location, fallback country, timeout.
//!
//! Defaults are compiled in; `from_env` overrides them with
//! `MEDSUPPLY_GATEWAY_URL`, `MEDSUPPLY_COUNTRY` and `MEDSUPPLY_TIMEOUT_SECS`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::country::Country;

pub const DEFAULT_GATEWAY_URL: &str = "https://api.medsupply.app";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const GATEWAY_URL_ENV: &str = "MEDSUPPLY_GATEWAY_URL";
pub const COUNTRY_ENV: &str = "MEDSUPPLY_COUNTRY";
pub const TIMEOUT_ENV: &str = "MEDSUPPLY_TIMEOUT_SECS";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var} must be an http(s) URL, got {value:?}")]
    InvalidUrl { var: &'static str, value: String },

    #[error("{var}: unknown country code {value:?}")]
    InvalidCountry { var: &'static str, value: String },

    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidTimeout { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub default_country: Country,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_URL.to_string(),
            default_country: Country::DEFAULT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset variables keep their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(GATEWAY_URL_ENV) {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl {
                    var: GATEWAY_URL_ENV,
                    value: url,
                });
            }
            config.base_url = url;
        }

        if let Some(code) = lookup(COUNTRY_ENV) {
            config.default_country = code.parse().map_err(|_| ConfigError::InvalidCountry {
                var: COUNTRY_ENV,
                value: code.clone(),
            })?;
        }

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            config.timeout_secs = match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::InvalidTimeout {
                        var: TIMEOUT_ENV,
                        value: raw,
                    })
                }
            };
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.default_country, Country::Mx);
    }

    #[test]
    fn overrides_from_variables() {
        let config = ClientConfig::from_lookup(lookup(&[
            (GATEWAY_URL_ENV, "http://127.0.0.1:3000"),
            (COUNTRY_ENV, "AR"),
            (TIMEOUT_ENV, "5"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:3000");
        assert_eq!(config.default_country, Country::Ar);
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[(GATEWAY_URL_ENV, "ftp://x")])),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[(COUNTRY_ENV, "br")])),
            Err(ConfigError::InvalidCountry { .. })
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[(TIMEOUT_ENV, "0")])),
            Err(ConfigError::InvalidTimeout { .. })
        ));
    }

    #[test]
    fn deserializes_partial_config() {
        let config: ClientConfig = serde_json::from_str(r#"{"default_country":"pe"}"#).unwrap();
        assert_eq!(config.default_country, Country::Pe);
        assert_eq!(config.base_url, DEFAULT_GATEWAY_URL);
    }
}
