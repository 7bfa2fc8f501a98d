use async_trait::async_trait;
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::pin::Pin;

/// A ClientWrapper is a wrapper around a specific cloud LLM service.
/// It provides a common interface to interact with chat-completion endpoints that
/// stream a separate reasoning channel next to the visible answer.
/// It does not keep track of the conversation, for that we use an [`Agent`](crate::Agent)
/// turn per request and the [`Simulation`](crate::Simulation) interaction log.
// src/careerday/client_wrapper.rs

/// Represents the possible roles for a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    // set by the developer to steer the model's responses
    System,
    // a message sent by a human user (or app user)
    User,
    // lets the model know the content was generated as a response to a user message
    Assistant,
}

impl Role {
    /// Wire name used by OpenAI-compatible chat APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Represents a generic message to be sent to an LLM.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The role associated with the message.
    pub role: Role,
    /// The actual content of the message.
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Represents one incremental chunk of a streaming response.
///
/// Reasoning-capable models deliver their deliberation on a separate channel, so a
/// chunk may carry a reasoning delta, an answer delta, both, or neither (keep-alive
/// and role-announcement chunks are common).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MessageChunk {
    /// Incremental text of the reasoning channel, if any.
    pub reasoning: Option<String>,
    /// Incremental text of the answer channel, if any.
    pub content: Option<String>,
    /// Finish reason reported by the provider on the last chunk.
    pub finish_reason: Option<String>,
}

impl MessageChunk {
    /// Chunk carrying only answer text.
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Self::default()
        }
    }

    /// Chunk carrying only reasoning text.
    pub fn reasoning(text: impl Into<String>) -> Self {
        Self {
            reasoning: Some(text.into()),
            ..Self::default()
        }
    }
}

/// Bounds for the internal reasoning phase some providers run before answering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningBudget {
    pub min_tokens: u32,
    pub max_tokens: u32,
}

/// Sampling and length parameters attached to every turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
    /// `None` omits the reasoning hint from the request entirely.
    pub reasoning_budget: Option<ReasoningBudget>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            max_tokens: 1024,
            reasoning_budget: Some(ReasoningBudget {
                min_tokens: 256,
                max_tokens: 512,
            }),
        }
    }
}

/// Type alias for a Send-able error box
pub type SendError = Box<dyn Error + Send + Sync>;

/// Stream of chunks produced by [`ClientWrapper::send_message_stream`].
pub type MessageChunkStream = Pin<Box<dyn Stream<Item = Result<MessageChunk, SendError>> + Send>>;

/// Trait defining the interface to interact with various LLM services.
#[async_trait]
pub trait ClientWrapper: Send + Sync {
    /// Model identifier injected into each request.
    fn model_name(&self) -> &str;

    /// Send the messages and get a streaming response.
    /// Returns a Stream of MessageChunk items in arrival order. Errors raised before
    /// the first byte (connection, authentication, non-2xx status) are returned
    /// directly; errors after that surface as `Err` items of the stream.
    async fn send_message_stream(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<MessageChunkStream, SendError>;
}
