use reqwest::Url;
use std::{collections::HashMap, env, time::Duration};
use thiserror::Error;

const DEFAULT_PORT: u16 = 8081;
const DEFAULT_API_BASE: &str = "https://mitxonline.mit.edu";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key} is not a valid URL: {value}")]
    Url { key: &'static str, value: String },
    #[error("{key} is not a number: {value}")]
    Number { key: &'static str, value: String },
}

/// Settings for the upstream API and the listener, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub api_base: Url,
    pub cart_url: Url,
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = parse_number(vars, "PORT", DEFAULT_PORT)?;
        let timeout = parse_number(vars, "REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

        let base = vars
            .get("MITXONLINE_API_BASE")
            .map(String::as_str)
            .unwrap_or(DEFAULT_API_BASE);
        let api_base = parse_base("MITXONLINE_API_BASE", base)?;

        let cart_url = match vars.get("MITXONLINE_CART_URL") {
            Some(v) => parse_url("MITXONLINE_CART_URL", v)?,
            None => api_base.join("cart/add/").map_err(|_| ConfigError::Url {
                key: "MITXONLINE_CART_URL",
                value: format!("{api_base}cart/add/"),
            })?,
        };

        Ok(Self {
            port,
            api_base,
            cart_url,
            request_timeout: Duration::from_secs(timeout),
        })
    }
}

fn parse_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|_| ConfigError::Url { key, value: value.to_string() })
}

// Joins are relative to the base, so its path needs a trailing slash.
fn parse_base(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    let mut url = parse_url(key, value)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_number<T: std::str::FromStr>(
    vars: &HashMap<String, String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(key) {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Number { key, value: v.clone() }),
        None => Ok(default),
    }
}
