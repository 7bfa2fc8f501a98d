//! Agent System
//!
//! This module provides the [`Agent`] struct: one of the four [`AgentRole`]s bound to
//! a [`ClientWrapper`], plus the turn executor [`Agent::think_and_act`].
//!
//! A turn is a single two-message exchange (system prompt + task) sent as a streaming
//! chat completion. The stream is folded into two accumulators, one for the reasoning
//! channel and one for the visible answer, and the result is returned as an immutable
//! [`TurnResult`]. Nothing is exposed mid-stream.
//!
//! # Example
//!
//! ```rust,no_run
//! use careerday::{Agent, AgentRole};
//! use careerday::clients::nvidia::NvidiaClient;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let client = Arc::new(NvidiaClient::new_with_model_str("nvapi-...", "nvidia/nvidia-nemotron-nano-9b-v2")?);
//! let narrator = Agent::new(AgentRole::Narrator, client);
//!
//! let turn = narrator
//!     .think_and_act("Present this scenario engagingly: ...", Some(&json!({"career": "Chef"})))
//!     .await?;
//! println!("{}", turn.action);
//! # Ok(())
//! # }
//! ```

use crate::careerday::client_wrapper::{
    ClientWrapper, GenerationParams, Message, MessageChunk, MessageChunkStream, Role, SendError,
};
use crate::careerday::event::{preview, EventHandler, SimulationEvent};
use crate::careerday::roles::AgentRole;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Record of one completed turn.
///
/// Created once per [`Agent::think_and_act`] call and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    /// Role that produced the turn, serialized as its display name.
    pub agent: AgentRole,
    /// Concatenated reasoning-channel text (empty when the model streamed none).
    pub reasoning: String,
    /// Concatenated answer text.
    pub action: String,
    /// When the turn finished.
    pub timestamp: DateTime<Utc>,
}

/// Folds streamed chunks into the two channel buffers, in arrival order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StreamAccumulator {
    pub reasoning: String,
    pub content: String,
    pub chunks: usize,
}

impl StreamAccumulator {
    pub fn push(&mut self, chunk: &MessageChunk) {
        if let Some(reasoning) = &chunk.reasoning {
            self.reasoning.push_str(reasoning);
        }
        if let Some(content) = &chunk.content {
            self.content.push_str(content);
        }
        self.chunks += 1;
    }

    /// Drain a chunk stream to completion. The first `Err` item aborts the fold.
    pub async fn collect(stream: MessageChunkStream) -> Result<Self, SendError> {
        stream
            .try_fold(StreamAccumulator::default(), |mut acc, chunk| async move {
                acc.push(&chunk);
                Ok::<_, SendError>(acc)
            })
            .await
    }
}

/// Format the user message of a turn.
///
/// A present, non-empty context is serialized as compact JSON ahead of the task:
/// `Context: {...}\n\nTask: <task>`. `null` and `{}` count as no context.
pub fn format_prompt(task: &str, context: Option<&Value>) -> String {
    match context {
        Some(ctx) if !is_empty_context(ctx) => format!("Context: {}\n\nTask: {}", ctx, task),
        _ => task.to_string(),
    }
}

fn is_empty_context(ctx: &Value) -> bool {
    match ctx {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// An LLM-backed persona executing turns for one [`AgentRole`].
pub struct Agent {
    pub role: AgentRole,
    client: Arc<dyn ClientWrapper>,
    params: GenerationParams,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl Agent {
    /// Create an agent with default [`GenerationParams`].
    pub fn new(role: AgentRole, client: Arc<dyn ClientWrapper>) -> Self {
        Self {
            role,
            client,
            params: GenerationParams::default(),
            event_handler: None,
        }
    }

    /// Override sampling parameters (builder pattern).
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Attach an [`EventHandler`] receiving turn lifecycle events (builder pattern).
    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Replace the event handler on a live agent. Used by
    /// [`Simulation::with_event_handler`](crate::Simulation::with_event_handler).
    pub fn set_event_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.event_handler = Some(handler);
    }

    pub fn set_params(&mut self, params: GenerationParams) {
        self.params = params;
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    async fn emit(&self, event: SimulationEvent) {
        if let Some(handler) = &self.event_handler {
            handler.on_simulation_event(&event).await;
        }
    }

    /// The exact messages a turn sends: the role's system prompt, then the
    /// formatted task.
    pub fn build_messages(&self, task: &str, context: Option<&Value>) -> Vec<Message> {
        vec![
            Message::new(Role::System, self.role.system_prompt()),
            Message::new(Role::User, format_prompt(task, context)),
        ]
    }

    /// Run one turn: send the task, wait for the whole stream, and return the
    /// accumulated reasoning and answer.
    ///
    /// No retry is attempted and the answer is not validated; errors from the
    /// transport or the stream are returned as-is.
    pub async fn think_and_act(
        &self,
        task: &str,
        context: Option<&Value>,
    ) -> Result<TurnResult, SendError> {
        self.emit(SimulationEvent::TurnStarted {
            role: self.role,
            task_preview: preview(task),
        })
        .await;

        let messages = self.build_messages(task, context);
        log::debug!(
            "[{}] sending turn to {} ({} chars)",
            self.role,
            self.client.model_name(),
            messages[1].content.len()
        );

        let outcome = match self.client.send_message_stream(&messages, &self.params).await {
            Ok(stream) => StreamAccumulator::collect(stream).await,
            Err(err) => Err(err),
        };

        let acc = match outcome {
            Ok(acc) => acc,
            Err(err) => {
                log::error!("[{}] turn failed: {}", self.role, err);
                self.emit(SimulationEvent::TurnFailed {
                    role: self.role,
                    error: err.to_string(),
                })
                .await;
                return Err(err);
            }
        };

        log::debug!(
            "[{}] turn complete: {} chunks, {} reasoning chars, {} answer chars",
            self.role,
            acc.chunks,
            acc.reasoning.len(),
            acc.content.len()
        );

        let result = TurnResult {
            agent: self.role,
            reasoning: acc.reasoning,
            action: acc.content,
            timestamp: Utc::now(),
        };

        self.emit(SimulationEvent::TurnCompleted {
            role: self.role,
            reasoning_preview: preview(&result.reasoning),
            answer_length: result.action.len(),
        })
        .await;

        Ok(result)
    }
}
