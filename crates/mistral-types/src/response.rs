use serde::{Deserialize, Serialize};

use crate::message::Role;

// -- Chat completion response types --

/// Chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Unique response identifier
    pub id: String,
    /// Object type
    pub object: String,
    /// Unix timestamp
    #[serde(default)]
    pub created: u64,
    /// Model used
    pub model: String,
    /// Generated choices
    pub choices: Vec<Choice>,
    /// Token usage statistics
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// Text of the first choice, if any
    pub fn text(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.message.content.as_deref())
    }
}

/// A single completion choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Choice index
    pub index: u32,
    /// Generated message
    pub message: ChoiceMessage,
    /// Why generation stopped
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Message in a response choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceMessage {
    /// Role (always assistant)
    pub role: Role,
    /// Text content
    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt
    pub prompt_tokens: u32,
    /// Tokens generated in the completion
    pub completion_tokens: u32,
    /// Total tokens
    pub total_tokens: u32,
}

// -- Streaming types --

/// SSE streaming chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Chunk identifier
    pub id: String,
    /// Object type
    #[serde(default)]
    pub object: String,
    /// Creation timestamp
    #[serde(default)]
    pub created: u64,
    /// Model used
    pub model: String,
    /// Delta choices
    pub choices: Vec<StreamChoice>,
    /// Usage (on final chunk)
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// Choice within a streaming chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChoice {
    /// Choice index
    pub index: u32,
    /// Delta content
    pub delta: StreamDelta,
    /// Finish reason (on final chunk)
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Delta content within a streaming choice
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamDelta {
    /// Role (first chunk only)
    #[serde(default)]
    pub role: Option<Role>,
    /// Incremental text content
    #[serde(default)]
    pub content: Option<String>,
}

/// High-level streaming event parsed from SSE
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// Incremental text content of one choice
    ContentDelta {
        /// Index of the choice the text belongs to
        index: u32,
        /// Text fragment
        content: String,
    },
    /// Every choice finished
    Done {
        /// Finish reason of the lowest-indexed finished choice
        finish_reason: Option<String>,
        /// Usage statistics
        usage: Option<Usage>,
    },
}

impl ChatEvent {
    /// Shorthand for a delta on the given choice
    pub fn delta(index: u32, content: impl Into<String>) -> Self {
        Self::ContentDelta {
            index,
            content: content.into(),
        }
    }
}

impl StreamChunk {
    /// Text deltas carried by this chunk, in choice order
    ///
    /// Empty fragments (such as the role-only opening chunk) are skipped.
    pub fn deltas(&self) -> impl Iterator<Item = ChatEvent> + '_ {
        self.choices.iter().filter_map(|choice| {
            choice
                .delta
                .content
                .as_deref()
                .filter(|c| !c.is_empty())
                .map(|content| ChatEvent::delta(choice.index, content))
        })
    }

    /// Choices this chunk finishes, with their reasons
    pub fn finishes(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.choices
            .iter()
            .filter_map(|choice| choice.finish_reason.as_deref().map(|reason| (choice.index, reason)))
    }
}

// -- Model types --

/// Model list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelList {
    /// Object type
    pub object: String,
    /// Available models
    pub data: Vec<Model>,
}

/// A model entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    /// Model identifier
    pub id: String,
    /// Object type
    #[serde(default)]
    pub object: String,
    /// Creation timestamp
    #[serde(default)]
    pub created: u64,
    /// Owner
    #[serde(default)]
    pub owned_by: String,
}
