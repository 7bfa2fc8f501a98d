#![allow(dead_code)]

use async_trait::async_trait;
use careerday::client_wrapper::{
    ClientWrapper, GenerationParams, Message, MessageChunk, MessageChunkStream, SendError,
};
use careerday::event::{EventHandler, SimulationEvent};
use careerday::AgentRole;
use futures_util::stream;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// How a scripted call should go wrong.
#[derive(Clone, Copy)]
pub enum Failure {
    /// `send_message_stream` itself returns an error.
    Request,
    /// The stream yields one chunk and then an error.
    MidStream,
}

/// Answers every turn according to the role found in the system prompt and
/// records the messages and parameters it was sent.
pub struct ScriptedClient {
    evaluations: Mutex<VecDeque<String>>,
    scenario_count: AtomicUsize,
    narration_count: AtomicUsize,
    failure: Mutex<Option<(usize, Failure)>>,
    pub calls: Mutex<Vec<Vec<Message>>>,
    pub params: Mutex<Vec<GenerationParams>>,
}

pub const DEFAULT_EVALUATION: &str = r#"{"consequence": "The team appreciated it", "skills_used": ["time management"], "professional_insight": "Pros plan ahead"}"#;
pub const RESEARCH_ANSWER: &str = r#"{"needs_research": false, "missing_info": [], "known_info": {"setting": "busy workplace"}}"#;

impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            evaluations: Mutex::new(VecDeque::new()),
            scenario_count: AtomicUsize::new(0),
            narration_count: AtomicUsize::new(0),
            failure: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            params: Mutex::new(Vec::new()),
        }
    }

    /// Queue evaluator answers; once drained the default evaluation is used.
    pub fn with_evaluations<I, S>(self, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.evaluations
            .lock()
            .unwrap()
            .extend(answers.into_iter().map(Into::into));
        self
    }

    /// Fail the call with zero-based index `call`.
    pub fn fail_at(&self, call: usize, failure: Failure) {
        *self.failure.lock().unwrap() = Some((call, failure));
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// User message of the call with index `call`.
    pub fn user_message(&self, call: usize) -> String {
        self.calls.lock().unwrap()[call][1].content.clone()
    }

    fn answer_for(&self, role: AgentRole) -> String {
        match role {
            AgentRole::Research => RESEARCH_ANSWER.to_string(),
            AgentRole::ScenarioDesigner => {
                let n = self.scenario_count.fetch_add(1, Ordering::SeqCst) + 1;
                format!(
                    r#"{{"scenario": "Scenario {}", "options": ["A", "B", "C"], "learning_goal": "prioritisation"}}"#,
                    n
                )
            }
            AgentRole::Evaluator => self
                .evaluations
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| DEFAULT_EVALUATION.to_string()),
            AgentRole::Narrator => {
                let n = self.narration_count.fetch_add(1, Ordering::SeqCst) + 1;
                format!("Narration {}", n)
            }
        }
    }
}

pub fn role_of(messages: &[Message]) -> AgentRole {
    AgentRole::ALL
        .into_iter()
        .find(|role| role.system_prompt() == messages[0].content)
        .expect("system prompt of a known role")
}

#[async_trait]
impl ClientWrapper for ScriptedClient {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn send_message_stream(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<MessageChunkStream, SendError> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(messages.to_vec());
            calls.len() - 1
        };
        self.params.lock().unwrap().push(params.clone());

        let failure = match *self.failure.lock().unwrap() {
            Some((call, failure)) if call == index => Some(failure),
            _ => None,
        };
        if let Some(Failure::Request) = failure {
            return Err("API returned HTTP 503: overloaded".into());
        }

        let role = role_of(messages);
        let answer = self.answer_for(role);
        let (head, tail) = answer.split_at(answer.len() / 2);

        let mut chunks: Vec<Result<MessageChunk, SendError>> = vec![
            Ok(MessageChunk::reasoning("Thinking as ")),
            Ok(MessageChunk::reasoning(role.name())),
        ];
        if let Some(Failure::MidStream) = failure {
            chunks.push(Err("stream interrupted".into()));
        } else {
            chunks.push(Ok(MessageChunk::content(head)));
            chunks.push(Ok(MessageChunk::default()));
            chunks.push(Ok(MessageChunk::content(tail)));
        }
        Ok(Box::pin(stream::iter(chunks)))
    }
}

/// Collects every event it receives.
#[derive(Default)]
pub struct RecordingHandler {
    pub events: Mutex<Vec<SimulationEvent>>,
}

impl RecordingHandler {
    pub fn events(&self) -> Vec<SimulationEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn on_simulation_event(&self, event: &SimulationEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
