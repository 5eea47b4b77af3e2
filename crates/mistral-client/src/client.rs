use std::pin::Pin;
use std::time::Duration;

use futures::stream::Stream;
use mistral_config::ApiConfig;
use mistral_types::{ChatEvent, ChatRequest, ChatResponse, Model, ModelList};
use reqwest::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use url::Url;

use crate::error::{MistralClientError, Result};
use crate::sse::parse_sse_stream;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Stream of events from a streaming chat completion
pub type ChatEventStream = Pin<Box<dyn Stream<Item = Result<ChatEvent>> + Send>>;

/// Typed client for the Mistral chat-completion API
#[derive(Debug, Clone)]
pub struct MistralClient {
    base_url: Url,
    http: reqwest::Client,
    api_key: Option<SecretString>,
    timeout: Duration,
    validate: bool,
}

impl MistralClient {
    /// Create a new client pointing at the given base URL
    ///
    /// The base URL includes the version prefix, e.g. `https://api.mistral.ai/v1`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or not http(s)
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| MistralClientError::Config(format!("invalid base URL: {e}")))?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(MistralClientError::Config(format!(
                "unsupported base URL scheme: {}",
                base_url.scheme()
            )));
        }

        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            validate: false,
        })
    }

    /// Create a client from the `[api]` configuration section
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or timeout is invalid
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let timeout = config
            .timeout()
            .map_err(|e| MistralClientError::Config(e.to_string()))?;

        let mut client = Self::new(config.base_url.as_str())?.with_timeout(timeout);
        client.api_key.clone_from(&config.api_key);

        Ok(client)
    }

    /// Set the API key sent as a bearer token
    #[must_use]
    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Set the per-request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reject out-of-range parameters locally before sending
    #[must_use]
    pub const fn with_validation(mut self, enabled: bool) -> Self {
        self.validate = enabled;
        self
    }

    /// Get the base URL
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send a chat completion request (non-streaming)
    ///
    /// # Errors
    ///
    /// Returns an error if validation is enabled and fails, the request
    /// fails, or the response cannot be parsed
    pub async fn chat_completion(&self, req: &ChatRequest) -> Result<ChatResponse> {
        let request = ChatRequest {
            stream: false,
            ..req.clone()
        };
        self.check(&request)?;

        let url = make_url(&self.base_url, "chat/completions");

        let response = self
            .make_request(reqwest::Method::POST, &url)
            .json(&request)
            .send()
            .await?;

        let body = handle_error(response).await?.text().await?;

        let response: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| MistralClientError::Parse(format!("invalid chat completion body: {e}")))?;

        if let Some(ref usage) = response.usage {
            tracing::debug!(
                model = %response.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion finished"
            );
        }

        Ok(response)
    }

    /// Send a streaming chat completion request
    ///
    /// Returns a stream of `ChatEvent`s parsed from SSE. Deltas carry their
    /// choice index; the stream ends with a single `ChatEvent::Done` once
    /// every requested choice has finished
    ///
    /// # Errors
    ///
    /// Returns an error if validation is enabled and fails or the request
    /// is rejected before streaming starts
    pub async fn chat_completion_stream(&self, req: &ChatRequest) -> Result<ChatEventStream> {
        let mut request = req.clone();
        request.stream = true;
        self.check(&request)?;

        let url = make_url(&self.base_url, "chat/completions");

        let response = self
            .make_request(reqwest::Method::POST, &url)
            .json(&request)
            .send()
            .await?;

        let response = handle_error(response).await?;

        let choices = request
            .params
            .n
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(1);

        Ok(Box::pin(parse_sse_stream(response.bytes_stream(), choices)))
    }

    /// List available models
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn list_models(&self) -> Result<Vec<Model>> {
        let url = make_url(&self.base_url, "models");

        let response = self.make_request(reqwest::Method::GET, &url).send().await?;

        let body = handle_error(response).await?.text().await?;

        let list: ModelList = serde_json::from_str(&body)
            .map_err(|e| MistralClientError::Parse(format!("invalid model list body: {e}")))?;

        Ok(list.data)
    }

    /// Run local validation when enabled and log the outgoing request
    fn check(&self, request: &ChatRequest) -> Result<()> {
        if self.validate {
            mistral_types::validate(&request.params)?;
        }

        tracing::debug!(
            model = request.model().unwrap_or("<service default>"),
            messages = request.messages.len(),
            stream = request.stream,
            params = ?request.params.present_keys(),
            "sending chat completion"
        );

        Ok(())
    }

    /// Build an authenticated request
    fn make_request(&self, method: reqwest::Method, url: &Url) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, url.as_str()).timeout(self.timeout);

        if let Some(ref key) = self.api_key {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", key.expose_secret()));
        }

        builder
    }
}

/// Append an endpoint path to the base URL path
fn make_url(base_url: &Url, path: &str) -> Url {
    let mut url = base_url.clone();
    let joined = format!("{}/{path}", base_url.path().trim_end_matches('/'));
    url.set_path(&joined);
    url
}

/// Check an HTTP response for errors
async fn handle_error(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let (error_type, message) = parse_error_body(&body);

    tracing::error!("Mistral API error ({status}): {error_type}: {message}");

    Err(MistralClientError::Api {
        status: status.as_u16(),
        error_type,
        message,
    })
}

/// Parse an error response body into (type, message)
///
/// Understands `{"error": {"type", "message"}}`, the flat
/// `{"object": "error", "type", "message"}` form, and `{"detail": ...}`
/// request validation errors. Anything else is returned verbatim.
fn parse_error_body(body: &str) -> (String, String) {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return ("unknown".to_owned(), body.to_owned());
    };

    let error = json.get("error").filter(|e| e.is_object()).unwrap_or(&json);

    if let Some(message) = error.get("message").and_then(Value::as_str) {
        let error_type = error.get("type").and_then(Value::as_str).unwrap_or("unknown");
        return (error_type.to_owned(), message.to_owned());
    }

    match json.get("detail") {
        Some(Value::String(detail)) => ("invalid_request_error".to_owned(), detail.clone()),
        Some(detail) => ("invalid_request_error".to_owned(), detail.to_string()),
        None => ("unknown".to_owned(), body.to_owned()),
    }
}
