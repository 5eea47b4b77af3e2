use serde::Serialize;

use crate::{message::Message, params::RequestParameters};

/// Body of a `POST /v1/chat/completions` call
///
/// The parameters are flattened into the top-level object, so the model and
/// every sampling field sit next to `messages`. Unset parameters are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChatRequest {
    /// Conversation messages
    pub messages: Vec<Message>,
    /// Whether to stream the response
    pub stream: bool,
    /// Model and sampling parameters
    #[serde(flatten)]
    pub params: RequestParameters,
}

impl ChatRequest {
    /// Create a request for the given conversation with no parameters set
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            stream: false,
            params: RequestParameters::default(),
        }
    }

    /// Replace the request parameters
    #[must_use]
    pub fn with_params(mut self, params: RequestParameters) -> Self {
        self.params = params;
        self
    }

    /// Set the target model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.params.model = Some(model.into());
        self
    }

    /// Request a streamed response
    #[must_use]
    pub const fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Model the request targets, if one is set
    pub fn model(&self) -> Option<&str> {
        self.params.model.as_deref()
    }
}
