#![allow(clippy::must_use_candidate)]

//! Configuration for the Mistral chat client
//!
//! Loaded from TOML with `{{ env.VAR }}` placeholders expanded before parsing

pub mod api;
mod env;
mod loader;
pub mod logging;

use mistral_types::RequestParameters;
use serde::Deserialize;

pub use api::{ApiConfig, DEFAULT_BASE_URL};
pub use logging::{LogFormat, LoggingConfig};

/// Top-level configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Service connection settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Parameters applied to every request unless overridden per call
    #[serde(default)]
    pub defaults: RequestParameters,
    /// Parameter range checks before sending
    #[serde(default)]
    pub validation: ValidationConfig,
    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Opt-in local parameter validation
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Reject out-of-range parameters before any request is sent
    #[serde(default)]
    pub enabled: bool,
}
