#![allow(clippy::must_use_candidate)]

//! Wire types for the Mistral chat-completion API
//!
//! [`RequestParameters`] describes the optional tunables of one call;
//! [`ChatRequest`] combines them with the conversation into a request body.

pub mod message;
pub mod params;
pub mod request;
pub mod response;
pub mod validation;

pub use message::{Message, Role};
pub use params::RequestParameters;
pub use request::ChatRequest;
pub use response::{
    ChatEvent, ChatResponse, Choice, ChoiceMessage, Model, ModelList, StreamChoice, StreamChunk, StreamDelta, Usage,
};
pub use validation::{ValidationError, Violation, validate};
