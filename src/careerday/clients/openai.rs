//! The `OpenAIClient` struct implements `ClientWrapper` for any OpenAI-compatible
//! Chat Completions endpoint, speaking the streaming (`text/event-stream`) variant of
//! the protocol.
//!
//! # Key Features
//!
//! - **Two channels**: `delta.reasoning_content` and `delta.content` are surfaced
//!   separately on every [`MessageChunk`](crate::MessageChunk).
//! - **Reasoning budget**: [`GenerationParams::reasoning_budget`](crate::GenerationParams)
//!   is forwarded as `min_thinking_tokens` / `max_thinking_tokens`.
//! - **Pooled connections**: clients for the same base URL share one `reqwest::Client`.
//!
//! # Example
//!
//! ```rust,no_run
//! use careerday::clients::openai::OpenAIClient;
//! use careerday::{ClientWrapper, GenerationParams, Message, Role};
//! use futures_util::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let key = std::env::var("OPENAI_API_KEY")?;
//!     let client = OpenAIClient::new_with_base_url(&key, "gpt-4.1-nano", "https://api.openai.com/v1")?;
//!
//!     let messages = vec![
//!         Message::new(Role::System, "You are terse."),
//!         Message::new(Role::User, "Hello!"),
//!     ];
//!     let mut stream = client.send_message_stream(&messages, &GenerationParams::default()).await?;
//!     while let Some(chunk) = stream.next().await {
//!         if let Some(text) = chunk?.content {
//!             print!("{}", text);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;

use crate::careerday::client_wrapper::{
    ClientWrapper, GenerationParams, Message, MessageChunkStream, SendError,
};
use crate::careerday::clients::common::{sse_chunk_stream, ApiError, ChatCompletionRequest};
use crate::careerday::http_client_pool::get_or_create_client;

/// Client wrapper for OpenAI-compatible streaming Chat Completions APIs.
pub struct OpenAIClient {
    /// Pooled HTTP client used for every request.
    http: reqwest::Client,
    /// Secret sent as the bearer token.
    secret_key: String,
    /// Base URL without the trailing `/chat/completions` (e.g. `https://api.openai.com/v1`).
    base_url: String,
    /// Model name that will be injected into each request.
    model: String,
}

impl OpenAIClient {
    /// Construct a client targeting an OpenAI compatible base URL.
    ///
    /// Fails only when the underlying HTTP client cannot be built (e.g. the TLS
    /// backend is unavailable).
    pub fn new_with_base_url(
        secret_key: &str,
        model_name: &str,
        base_url: &str,
    ) -> Result<Self, SendError> {
        let http = get_or_create_client(base_url)?;
        Ok(Self::new_with_http_client(
            http, secret_key, model_name, base_url,
        ))
    }

    /// Construct a client around a caller-provided `reqwest::Client`, bypassing the pool.
    pub fn new_with_http_client(
        http: reqwest::Client,
        secret_key: &str,
        model_name: &str,
        base_url: &str,
    ) -> Self {
        OpenAIClient {
            http,
            secret_key: secret_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model_name.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ClientWrapper for OpenAIClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn send_message_stream(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<MessageChunkStream, SendError> {
        let request = ChatCompletionRequest::streaming(&self.model, messages, params);

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.secret_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                log::error!(
                    "OpenAIClient::send_message_stream(...): request to {} failed: {}",
                    self.base_url,
                    err
                );
                Box::new(err) as SendError
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!(
                "OpenAIClient::send_message_stream(...): API error {}: {}",
                status.as_u16(),
                body
            );
            return Err(Box::new(ApiError {
                status: status.as_u16(),
                body,
            }));
        }

        Ok(sse_chunk_stream(response.bytes_stream()))
    }
}
