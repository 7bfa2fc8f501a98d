//! Chat sessions for the frontends.
//!
//! A [`ChatSession`] wraps at most one [`Simulation`] together with the visible chat
//! transcript and enforces the rules a frontend applies around the orchestrator:
//!
//! - a career and an API key are required to start
//! - blank input is rejected before any model call
//! - no decisions are accepted once the scenario cutoff is reached
//! - the summary is only available once the day is complete
//!
//! [`SessionStore`] maps session ids (UUID v4) to sessions. Each session sits behind
//! its own `tokio::sync::Mutex`, so a long turn in one session never blocks another.
//! Sessions left idle are evicted together with the client holding their API key.

use crate::careerday::client_wrapper::{ClientWrapper, Message, Role, SendError};
use crate::careerday::clients::nvidia::NvidiaClient;
use crate::careerday::config::SimulationConfig;
use crate::careerday::event::EventHandler;
use crate::careerday::simulation::{Simulation, SimulationPhase, SummaryRecord};
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

/// Builds the model client for a session from the API key the user supplied.
pub trait ClientFactory: Send + Sync {
    fn create_client(&self, api_key: &str) -> Result<Arc<dyn ClientWrapper>, SendError>;
}

impl<F> ClientFactory for F
where
    F: Fn(&str) -> Result<Arc<dyn ClientWrapper>, SendError> + Send + Sync,
{
    fn create_client(&self, api_key: &str) -> Result<Arc<dyn ClientWrapper>, SendError> {
        self(api_key)
    }
}

/// Creates [`NvidiaClient`]s for a fixed model.
pub struct NvidiaClientFactory {
    pub model: String,
}

impl Default for NvidiaClientFactory {
    fn default() -> Self {
        Self {
            model: crate::careerday::clients::nvidia::default_model(),
        }
    }
}

impl ClientFactory for NvidiaClientFactory {
    fn create_client(&self, api_key: &str) -> Result<Arc<dyn ClientWrapper>, SendError> {
        Ok(Arc::new(NvidiaClient::new_with_model_str(api_key, &self.model)?))
    }
}

/// Why a session refused or failed a request.
#[derive(Debug)]
pub enum SessionError {
    EmptyInput,
    MissingCareer,
    MissingApiKey,
    NotStarted,
    AlreadyStarted,
    SimulationComplete,
    NotComplete,
    /// A model call failed.
    Simulation(SendError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::EmptyInput => write!(f, "Input must not be empty"),
            SessionError::MissingCareer => write!(f, "A career is required to start"),
            SessionError::MissingApiKey => write!(f, "An API key is required to start"),
            SessionError::NotStarted => write!(f, "Simulation has not been started"),
            SessionError::AlreadyStarted => write!(f, "Simulation is already running"),
            SessionError::SimulationComplete => write!(f, "Career day complete"),
            SessionError::NotComplete => {
                write!(f, "Summary is available once the career day is complete")
            }
            SessionError::Simulation(err) => write!(f, "Simulation failed: {}", err),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SessionError::Simulation(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// One user's run through a career day.
pub struct ChatSession {
    config: SimulationConfig,
    event_handler: Option<Arc<dyn EventHandler>>,
    simulation: Option<Simulation>,
    transcript: Vec<Message>,
    summary: Option<SummaryRecord>,
}

impl ChatSession {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            event_handler: None,
            simulation: None,
            transcript: Vec::new(),
            summary: None,
        }
    }

    /// Handler attached to every simulation this session starts.
    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn simulation(&self) -> Option<&Simulation> {
        self.simulation.as_ref()
    }

    /// Opening, user decisions and narrated continuations, in order.
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn summary(&self) -> Option<&SummaryRecord> {
        self.summary.as_ref()
    }

    pub fn phase(&self) -> SimulationPhase {
        self.simulation
            .as_ref()
            .map(Simulation::phase)
            .unwrap_or(SimulationPhase::NotStarted)
    }

    /// Start a simulation for `career` with a client built from `api_key`.
    ///
    /// The session stays unstarted if any of the three opening turns fails.
    pub async fn start(
        &mut self,
        career: &str,
        api_key: &str,
        factory: &dyn ClientFactory,
    ) -> Result<String, SessionError> {
        let career = career.trim();
        if career.is_empty() {
            return Err(SessionError::MissingCareer);
        }
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(SessionError::MissingApiKey);
        }
        if self.simulation.is_some() {
            return Err(SessionError::AlreadyStarted);
        }

        let client = factory
            .create_client(api_key)
            .map_err(SessionError::Simulation)?;
        let mut simulation = Simulation::new(client).with_config(self.config.clone());
        if let Some(handler) = &self.event_handler {
            simulation = simulation.with_event_handler(handler.clone());
        }

        let opening = simulation
            .start_simulation(career)
            .await
            .map_err(SessionError::Simulation)?;
        self.transcript
            .push(Message::new(Role::Assistant, opening.clone()));
        self.simulation = Some(simulation);
        Ok(opening)
    }

    /// Feed one user decision to the running simulation.
    ///
    /// The transcript only grows when the decision was fully processed.
    pub async fn send(&mut self, input: &str) -> Result<String, SessionError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        let simulation = self.simulation.as_mut().ok_or(SessionError::NotStarted)?;
        if simulation.is_complete() {
            return Err(SessionError::SimulationComplete);
        }

        let story = simulation
            .process_user_decision(input)
            .await
            .map_err(SessionError::Simulation)?;
        self.transcript.push(Message::new(Role::User, input));
        self.transcript
            .push(Message::new(Role::Assistant, story.clone()));
        Ok(story)
    }

    /// Generate the end-of-day summary. Generated once; later calls return the
    /// stored record.
    pub async fn summarize(&mut self) -> Result<SummaryRecord, SessionError> {
        let simulation = self.simulation.as_mut().ok_or(SessionError::NotStarted)?;
        if !simulation.is_complete() {
            return Err(SessionError::NotComplete);
        }
        if let Some(summary) = &self.summary {
            return Ok(summary.clone());
        }

        let summary = simulation
            .generate_summary()
            .await
            .map_err(SessionError::Simulation)?;
        self.summary = Some(summary.clone());
        Ok(summary)
    }

    /// Drop the simulation, transcript and summary.
    pub fn reset(&mut self) {
        self.simulation = None;
        self.transcript.clear();
        self.summary = None;
    }
}

/// Idle time after which a session is dropped by [`SessionStore::evict_idle`].
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

struct SessionSlot {
    session: Arc<Mutex<ChatSession>>,
    last_active: Instant,
}

/// Session-keyed store of [`ChatSession`]s.
///
/// Sessions idle for longer than the idle timeout are evicted on every
/// [`create`](SessionStore::create) and by the task started with
/// [`spawn_reaper`](SessionStore::spawn_reaper). A session whose handle is still held
/// by a request is never evicted.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionSlot>>,
    config: SimulationConfig,
    event_handler: Option<Arc<dyn EventHandler>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl SessionStore {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
            event_handler: None,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Create an empty session and return its id.
    pub async fn create(&self) -> String {
        self.evict_idle().await;

        let id = uuid::Uuid::new_v4().to_string();
        let mut session = ChatSession::new(self.config.clone());
        if let Some(handler) = &self.event_handler {
            session = session.with_event_handler(handler.clone());
        }
        self.sessions.write().await.insert(
            id.clone(),
            SessionSlot {
                session: Arc::new(Mutex::new(session)),
                last_active: Instant::now(),
            },
        );
        log::info!("session {} created", id);
        id
    }

    /// Look a session up and mark it active.
    pub async fn get(&self, id: &str) -> Option<Arc<Mutex<ChatSession>>> {
        let mut sessions = self.sessions.write().await;
        let slot = sessions.get_mut(id)?;
        slot.last_active = Instant::now();
        Some(slot.session.clone())
    }

    /// Tear a session down. Returns whether it existed.
    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            log::info!("session {} removed", id);
        }
        removed
    }

    /// Drop every session idle for at least the idle timeout and not currently in
    /// use. Returns how many were dropped.
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, slot| {
            let keep = slot.last_active.elapsed() < self.idle_timeout
                || Arc::strong_count(&slot.session) > 1;
            if !keep {
                log::info!("session {} expired", id);
            }
            keep
        });
        before - sessions.len()
    }

    /// Run [`evict_idle`](SessionStore::evict_idle) every `period` on the tokio runtime.
    pub fn spawn_reaper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let evicted = store.evict_idle().await;
                if evicted > 0 {
                    log::debug!("session reaper evicted {} idle sessions", evicted);
                }
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_messages() {
        assert_eq!(SessionError::EmptyInput.to_string(), "Input must not be empty");
        let err = SessionError::Simulation("HTTP 401".into());
        assert_eq!(err.to_string(), "Simulation failed: HTTP 401");
        assert!(err.source().is_some());
        assert!(SessionError::NotComplete.source().is_none());
    }

    #[test]
    fn test_new_session_is_not_started() {
        let session = ChatSession::new(SimulationConfig::default());
        assert_eq!(session.phase(), SimulationPhase::NotStarted);
        assert!(session.transcript().is_empty());
        assert!(session.summary().is_none());
    }
}
