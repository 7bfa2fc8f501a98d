use crate::client_wrapper::{GenerationParams, Message, MessageChunk, MessageChunkStream, SendError};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt;
use std::pin::Pin;

/// Error raised while reading or decoding a streamed response.
#[derive(Debug, Clone)]
pub struct StreamError(pub String);

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for StreamError {}

/// Non-2xx answer from the chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: u16,
    pub body: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API returned HTTP {}: {}", self.status, self.body)
    }
}

impl Error for ApiError {}

/// Request body for an OpenAI-compatible streaming chat completion.
///
/// The reasoning budget is sent as top-level `min_thinking_tokens` /
/// `max_thinking_tokens` fields, which is where providers expect "extra body"
/// parameters.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<WireMessage<'a>>,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_thinking_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_thinking_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct WireMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

impl<'a> ChatCompletionRequest<'a> {
    pub fn streaming(model: &'a str, messages: &'a [Message], params: &GenerationParams) -> Self {
        Self {
            model,
            messages: messages
                .iter()
                .map(|msg| WireMessage {
                    role: msg.role.as_str(),
                    content: &msg.content,
                })
                .collect(),
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: params.max_tokens,
            stream: true,
            min_thinking_tokens: params.reasoning_budget.map(|b| b.min_tokens),
            max_thinking_tokens: params.reasoning_budget.map(|b| b.max_tokens),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

/// Parse the JSON payload of one `data:` line into a [`MessageChunk`].
///
/// Only the first choice is read; chunks without choices (usage trailers) map to an
/// empty chunk.
pub fn parse_chunk(data: &str) -> Result<MessageChunk, serde_json::Error> {
    let chunk: ChatCompletionChunk = serde_json::from_str(data)?;
    Ok(match chunk.choices.into_iter().next() {
        Some(choice) => MessageChunk {
            reasoning: choice.delta.reasoning_content,
            content: choice.delta.content,
            finish_reason: choice.finish_reason,
        },
        None => MessageChunk::default(),
    })
}

/// One meaningful line of a server-sent event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    Data(String),
    Done,
}

/// Incremental line splitter for `text/event-stream` bodies.
///
/// Bytes are buffered until a full line is available, so multi-byte characters that
/// straddle network reads are decoded intact. Comment lines, blank lines and
/// non-`data` fields are dropped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = decode_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<SseEvent> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest)
    }
}

fn decode_line(raw: &[u8]) -> Option<SseEvent> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim_end_matches(['\r', '\n']);
    let data = line.strip_prefix("data:")?.trim_start();
    if data.is_empty() {
        return None;
    }
    if data == "[DONE]" {
        Some(SseEvent::Done)
    } else {
        Some(SseEvent::Data(data.to_string()))
    }
}

struct SseState<S> {
    body: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<MessageChunk, SendError>>,
    finished: bool,
}

impl<S> SseState<S> {
    fn queue(&mut self, event: SseEvent) {
        if self.finished {
            return;
        }
        match event {
            SseEvent::Done => self.finished = true,
            SseEvent::Data(data) => {
                let item = parse_chunk(&data).map_err(|err| {
                    log::error!("careerday::clients::common: malformed stream chunk: {}", err);
                    Box::new(StreamError(format!("Malformed stream chunk: {}", err))) as SendError
                });
                if item.is_err() {
                    self.finished = true;
                }
                self.pending.push_back(item);
            }
        }
    }
}

/// Turn a raw response body into a stream of [`MessageChunk`]s.
///
/// The stream ends at `data: [DONE]` or when the body ends, whichever comes first.
/// A transport error or an undecodable chunk is yielded once as an `Err` item and
/// terminates the stream.
pub fn sse_chunk_stream<S, B, E>(body: S) -> MessageChunkStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let state = SseState {
        body: Box::pin(body),
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(futures_util::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(bytes)) => {
                    for event in state.decoder.push(bytes.as_ref()) {
                        state.queue(event);
                    }
                }
                Some(Err(err)) => {
                    log::error!("careerday::clients::common: stream read error: {}", err);
                    state.finished = true;
                    let err = Box::new(StreamError(format!("Stream read error: {}", err))) as SendError;
                    return Some((Err(err), state));
                }
                None => {
                    if let Some(event) = state.decoder.finish() {
                        state.queue(event);
                    }
                    state.finished = true;
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client_wrapper::{ReasoningBudget, Role};
    use futures_util::stream;

    fn collect(body: Vec<&'static str>) -> Vec<Result<MessageChunk, String>> {
        let parts: Vec<Result<&'static [u8], String>> =
            body.into_iter().map(|s| Ok(s.as_bytes())).collect();
        let chunks = sse_chunk_stream(stream::iter(parts));
        tokio::runtime::Runtime::new().unwrap().block_on(async {
            chunks
                .map(|item| item.map_err(|e| e.to_string()))
                .collect::<Vec<_>>()
                .await
        })
    }

    #[test]
    fn test_decoder_handles_lines_split_across_reads() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(b"data: {\"a\"").is_empty());
        let events = decoder.push(b":1}\n\ndata: [DONE]\n");
        assert_eq!(
            events,
            vec![SseEvent::Data("{\"a\":1}".to_string()), SseEvent::Done]
        );
    }

    #[test]
    fn test_decoder_skips_comments_and_other_fields() {
        let mut decoder = SseDecoder::default();
        let events = decoder.push(b": keep-alive\r\nevent: message\r\ndata: x\r\n\r\n");
        assert_eq!(events, vec![SseEvent::Data("x".to_string())]);
    }

    #[test]
    fn test_decoder_keeps_multibyte_characters_intact() {
        let mut decoder = SseDecoder::default();
        let line = "data: café\n".as_bytes();
        let (head, tail) = line.split_at(10); // splits inside 'é'
        assert!(decoder.push(head).is_empty());
        assert_eq!(decoder.push(tail), vec![SseEvent::Data("café".to_string())]);
    }

    #[test]
    fn test_parse_chunk_reads_both_channels() {
        let chunk = parse_chunk(
            r#"{"choices":[{"delta":{"reasoning_content":"hmm","content":"Hi"},"finish_reason":null}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.reasoning.as_deref(), Some("hmm"));
        assert_eq!(chunk.content.as_deref(), Some("Hi"));
        assert!(chunk.finish_reason.is_none());

        let empty = parse_chunk(r#"{"choices":[],"usage":{"total_tokens":3}}"#).unwrap();
        assert_eq!(empty, MessageChunk::default());
    }

    #[test]
    fn test_stream_stops_at_done_marker() {
        let items = collect(vec![
            "data: {\"choices\":[{\"delta\":{\"content\":\"A\"}}]}\n\n",
            "data: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n",
        ]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap().content.as_deref(), Some("A"));
    }

    #[test]
    fn test_stream_flushes_unterminated_last_line() {
        let items = collect(vec!["data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}"]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap().content.as_deref(), Some("tail"));
    }

    #[test]
    fn test_stream_reports_malformed_chunk_once() {
        let items = collect(vec![
            "data: not json\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"after\"}}]}\n\n",
        ]);
        assert_eq!(items.len(), 1);
        assert!(items[0].as_ref().unwrap_err().contains("Malformed stream chunk"));
    }

    #[test]
    fn test_request_serializes_reasoning_budget_at_top_level() {
        let messages = vec![
            Message::new(Role::System, "sys"),
            Message::new(Role::User, "hi"),
        ];
        let params = GenerationParams::default();
        let body =
            serde_json::to_value(ChatCompletionRequest::streaming("m", &messages, &params)).unwrap();
        assert_eq!(body["model"], "m");
        assert_eq!(body["stream"], true);
        assert_eq!(body["temperature"], 0.7);
        assert_eq!(body["top_p"], 0.95);
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["min_thinking_tokens"], 256);
        assert_eq!(body["max_thinking_tokens"], 512);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");

        let no_budget = GenerationParams {
            reasoning_budget: None,
            ..GenerationParams::default()
        };
        let body =
            serde_json::to_value(ChatCompletionRequest::streaming("m", &messages, &no_budget))
                .unwrap();
        assert!(body.get("min_thinking_tokens").is_none());

        let custom = GenerationParams {
            reasoning_budget: Some(ReasoningBudget {
                min_tokens: 1,
                max_tokens: 2,
            }),
            ..GenerationParams::default()
        };
        let body =
            serde_json::to_value(ChatCompletionRequest::streaming("m", &messages, &custom)).unwrap();
        assert_eq!(body["max_thinking_tokens"], 2);
    }
}
