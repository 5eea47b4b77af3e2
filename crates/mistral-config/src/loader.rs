use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a placeholder cannot be
    /// expanded, the TOML is malformed, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse and validate configuration from a TOML string
    ///
    /// # Errors
    ///
    /// Returns an error if a placeholder cannot be expanded, the TOML is
    /// malformed, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is usable
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL scheme, timeout, log filter or
    /// (when validation is enabled) the default parameters are invalid
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_api()?;
        self.validate_logging()?;
        self.validate_defaults()?;
        Ok(())
    }

    fn validate_api(&self) -> anyhow::Result<()> {
        let scheme = self.api.base_url.scheme();
        if scheme != "http" && scheme != "https" {
            anyhow::bail!("api.base_url must use http or https, got '{scheme}'");
        }

        if self.api.timeout()?.is_zero() {
            anyhow::bail!("api.timeout must be greater than 0");
        }

        Ok(())
    }

    fn validate_logging(&self) -> anyhow::Result<()> {
        EnvFilter::try_new(&self.logging.level)
            .map_err(|e| anyhow::anyhow!("invalid logging.level '{}': {e}", self.logging.level))?;
        Ok(())
    }

    fn validate_defaults(&self) -> anyhow::Result<()> {
        if !self.validation.enabled {
            return Ok(());
        }

        mistral_types::validate(&self.defaults).map_err(|e| anyhow::anyhow!("invalid [defaults]: {e}"))
    }
}
