#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Typed async HTTP client for the Mistral chat-completion API
//!
//! Serializes [`mistral_types::ChatRequest`] bodies, maps error responses,
//! and decodes server-sent event streams

mod client;
pub mod error;
mod sse;

pub use client::{ChatEventStream, MistralClient};
pub use error::{MistralClientError, Result};
pub use mistral_types as types;
