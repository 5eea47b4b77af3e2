use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai/v1";

/// Connection settings for the chat-completion service
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Bearer token sent with every request
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL including the version prefix
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Request timeout (e.g. "30s", "2m")
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            timeout: default_timeout(),
        }
    }
}

impl ApiConfig {
    /// Parsed request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if `timeout` is not a valid duration string
    pub fn timeout(&self) -> anyhow::Result<std::time::Duration> {
        duration_str::parse(&self.timeout).map_err(|e| anyhow::anyhow!("invalid api.timeout '{}': {e}", self.timeout))
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default base URL must be valid")
}

fn default_timeout() -> String {
    "60s".to_owned()
}
