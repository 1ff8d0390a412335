//! # Service Configuration
//!
//! Loaded once at startup from `QUOTEDESK_*` environment variables, falling
//! back to development defaults.
//!
//! | Variable                         | Default  | Meaning                     |
//! |----------------------------------|----------|-----------------------------|
//! | `QUOTEDESK_DEFAULT_CURRENCY`     | `USD`    | Currency of new quotes      |
//! | `QUOTEDESK_VALIDITY_DAYS`        | `30`     | Validity of new quotes      |
//! | `QUOTEDESK_SWEEP_INTERVAL_SECS`  | `300`    | Expiry sweep period         |
//! | `QUOTEDESK_SYSTEM_ACTOR_NAME`    | `System` | Name on automated records   |
//! | `QUOTEDESK_QUOTE_PREFIX`         | `Q`      | Number prefix, 11 chars max |
//!
//! Configuration is read-only after load, so it is shared without locks.

use std::env;
use std::time::Duration;

use quotedesk_core::validation::{validate_quote_number, validate_validity_days};
use quotedesk_core::{Currency, QuoteTerms, DEFAULT_VALIDITY_DAYS};
use serde::Serialize;

/// Width of the zero-padded sequence in generated quote numbers.
const QUOTE_SEQUENCE_WIDTH: usize = 6;

/// Orchestrator configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Currency applied when a quote is created without explicit terms.
    pub default_currency: Currency,

    /// Validity period applied when a quote is created without explicit terms.
    pub default_validity_days: u32,

    /// How often the background expiry sweep runs.
    pub sweep_interval: Duration,

    /// Display name recorded on automated status changes.
    pub system_actor_name: String,

    /// Prefix of generated quote numbers (`Q` → `Q-000001`).
    pub quote_prefix: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            default_currency: Currency::usd(),
            default_validity_days: DEFAULT_VALIDITY_DAYS,
            sweep_interval: Duration::from_secs(300),
            system_actor_name: "System".to_string(),
            quote_prefix: "Q".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup (environment, test map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServiceConfig::default();

        let default_currency = match lookup("QUOTEDESK_DEFAULT_CURRENCY") {
            Some(code) => Currency::new(&code)
                .map_err(|_| ConfigError::InvalidValue("QUOTEDESK_DEFAULT_CURRENCY".to_string()))?,
            None => defaults.default_currency,
        };

        let default_validity_days = match lookup("QUOTEDESK_VALIDITY_DAYS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|days| validate_validity_days(*days).is_ok())
                .ok_or_else(|| ConfigError::InvalidValue("QUOTEDESK_VALIDITY_DAYS".to_string()))?,
            None => defaults.default_validity_days,
        };

        let sweep_interval = match lookup("QUOTEDESK_SWEEP_INTERVAL_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| {
                    ConfigError::InvalidValue("QUOTEDESK_SWEEP_INTERVAL_SECS".to_string())
                })?,
            None => defaults.sweep_interval,
        };

        let system_actor_name = lookup("QUOTEDESK_SYSTEM_ACTOR_NAME")
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or(defaults.system_actor_name);

        let quote_prefix = lookup("QUOTEDESK_QUOTE_PREFIX")
            .map(|prefix| prefix.trim().to_string())
            .unwrap_or(defaults.quote_prefix);

        let config = ServiceConfig {
            default_currency,
            default_validity_days,
            sweep_interval,
            system_actor_name,
            quote_prefix,
        };

        // Every sequence value must give a valid number, which caps the prefix
        // at 11 characters
        let widest = config.quote_number(u64::MAX);
        if config.quote_prefix.is_empty() || validate_quote_number(&widest).is_err() {
            return Err(ConfigError::InvalidValue("QUOTEDESK_QUOTE_PREFIX".to_string()));
        }

        Ok(config)
    }

    /// Terms for a quote created without explicit terms.
    pub fn default_terms(&self) -> QuoteTerms {
        QuoteTerms {
            currency: self.default_currency.clone(),
            validity_days: self.default_validity_days,
            ..QuoteTerms::default()
        }
    }

    /// Formats the quote number for a sequence value (`Q-000042`).
    pub fn quote_number(&self, sequence: u64) -> String {
        format!(
            "{}-{:0width$}",
            self.quote_prefix,
            sequence,
            width = QUOTE_SEQUENCE_WIDTH
        )
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
