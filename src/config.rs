//! Environment-based configuration.
//!
//! Every setting comes from a `SPENDLINE_*` variable. Binaries usually load
//! a `.env` file first (see `dotenvy`), then call
//! [`LedgerConfig::from_env`].

use core::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::currency::CurrencyOption;
use crate::error::{LedgerError, Result};

/// Base URL of the remote API.
pub const API_URL_ENV: &str = "SPENDLINE_API_URL";
/// Bearer token for the remote API.
pub const TOKEN_ENV: &str = "SPENDLINE_TOKEN";
/// Per-request timeout in whole seconds.
pub const TIMEOUT_ENV: &str = "SPENDLINE_TIMEOUT_SECS";
/// Seconds between scheduled budget refreshes.
pub const POLL_ENV: &str = "SPENDLINE_POLL_SECS";
/// ISO code of the display currency.
pub const CURRENCY_ENV: &str = "SPENDLINE_CURRENCY";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 5;
/// Default refresh interval in seconds.
const DEFAULT_POLL_SECS: u64 = 30;

/// Resolved runtime settings.
///
/// The API URL and token are optional here so that local-only use (a
/// file backend) needs no credentials; [`LedgerConfig::remote`] enforces
/// them.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Base URL of the remote API.
    pub api_url: Option<Url>,
    /// Bearer token, redacted in `Debug` output.
    pub token: Option<SecretString>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Interval between scheduled budget refreshes.
    pub poll_interval: Duration,
    /// Display currency.
    pub currency: CurrencyOption,
}

impl Default for LedgerConfig {
    #[inline]
    fn default() -> Self {
        Self {
            api_url: None,
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            currency: CurrencyOption::default(),
        }
    }
}

impl LedgerConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Config`] if a variable is set to an invalid
    /// value.
    #[inline]
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable
    /// name to its value. Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Config`] if a variable is set to an invalid
    /// value.
    #[inline]
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let api_url = read(API_URL_ENV).map(|raw| parse_url(&raw)).transpose()?;
        let token = read(TOKEN_ENV).map(SecretString::from);
        let timeout = read(TIMEOUT_ENV)
            .map(|raw| parse_secs(TIMEOUT_ENV, &raw))
            .transpose()?
            .unwrap_or(defaults.timeout);
        let poll_interval = read(POLL_ENV)
            .map(|raw| parse_secs(POLL_ENV, &raw))
            .transpose()?
            .unwrap_or(defaults.poll_interval);
        let currency = match read(CURRENCY_ENV) {
            Some(code) => CurrencyOption::by_code(&code).ok_or_else(|| {
                LedgerError::Config(format!("{CURRENCY_ENV}: unknown currency code '{code}'"))
            })?,
            None => defaults.currency,
        };

        tracing::debug!(
            api_url = api_url.as_ref().map(Url::as_str),
            has_token = token.is_some(),
            timeout_secs = timeout.as_secs(),
            poll_secs = poll_interval.as_secs(),
            currency = %currency.code,
            "configuration loaded"
        );
        Ok(Self {
            api_url,
            token,
            timeout,
            poll_interval,
            currency,
        })
    }

    /// Returns the API URL and token, both required for remote access.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Config`] naming the first missing variable.
    #[inline]
    pub fn remote(&self) -> Result<(&Url, &SecretString)> {
        let url = self
            .api_url
            .as_ref()
            .ok_or_else(|| LedgerError::Config(format!("{API_URL_ENV} is not set")))?;
        let token = self
            .token
            .as_ref()
            .ok_or_else(|| LedgerError::Config(format!("{TOKEN_ENV} is not set")))?;
        Ok((url, token))
    }

    /// Builds an async HTTP client from the remote settings.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Config`] if the URL or token is missing, or
    /// the client builder's error.
    #[cfg(feature = "async")]
    #[inline]
    pub fn client(&self) -> Result<crate::client::LedgerClient> {
        use secrecy::ExposeSecret as _;

        let (url, token) = self.remote()?;
        crate::client::LedgerClient::builder()
            .base_url(url.as_str())
            .token(token.expose_secret())
            .timeout(self.timeout)
            .build()
    }

    /// Builds a blocking HTTP client from the remote settings.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Config`] if the URL or token is missing, or
    /// the client builder's error.
    #[cfg(feature = "blocking")]
    #[inline]
    pub fn blocking_client(&self) -> Result<crate::client::LedgerBlockingClient> {
        use secrecy::ExposeSecret as _;

        let (url, token) = self.remote()?;
        crate::client::LedgerBlockingClient::builder()
            .base_url(url.as_str())
            .token(token.expose_secret())
            .timeout(self.timeout)
            .build()
    }
}

/// Parses an absolute `http(s)` base URL.
fn parse_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|err| LedgerError::Config(format!("{API_URL_ENV}: invalid URL '{raw}': {err}")))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(LedgerError::Config(format!(
            "{API_URL_ENV}: '{raw}' is not an http(s) base URL"
        )));
    }
    Ok(url)
}

/// Parses a positive whole number of seconds.
fn parse_secs(key: &str, raw: &str) -> Result<Duration> {
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        Ok(_) => Err(LedgerError::Config(format!("{key}: must be at least 1 second"))),
        Err(err) => Err(LedgerError::Config(format!("{key}: invalid number '{raw}': {err}"))),
    }
}
