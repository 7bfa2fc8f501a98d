//! Simulation event system.
//!
//! Provides a callback-based observability layer for agents and the simulation.
//! Implement [`EventHandler`] to receive real-time notifications about:
//!
//! - **Turns**: when each role starts, finishes or fails a model call
//! - **Research**: how the research answer was classified
//! - **Skills**: whether an evaluation yielded a skill list
//! - **Progress**: scenario counter and clock after each decision
//! - **Lifecycle**: simulation start and summary generation
//!
//! The orchestrator never prints. Frontends decide what to show: the CLI prints
//! role banners and reasoning previews, the web server only logs.
//!
//! # Example
//!
//! ```rust,no_run
//! use careerday::event::{EventHandler, SimulationEvent};
//! use async_trait::async_trait;
//!
//! struct MyHandler;
//!
//! #[async_trait]
//! impl EventHandler for MyHandler {
//!     async fn on_simulation_event(&self, event: &SimulationEvent) {
//!         if let SimulationEvent::TurnCompleted { role, reasoning_preview, .. } = event {
//!             println!("[{}] Reasoning: {}...", role, reasoning_preview);
//!         }
//!     }
//! }
//! ```

use crate::careerday::roles::AgentRole;
use crate::careerday::simulation::{ResearchAssessment, SkillExtraction};
use async_trait::async_trait;

/// Number of characters kept by [`preview`].
pub const PREVIEW_CHARS: usize = 100;

/// First [`PREVIEW_CHARS`] characters of `text`, cut on a character boundary.
pub fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

/// Events emitted during a simulation.
///
/// # Event Flow (during a typical `process_user_decision()` call)
///
/// ```text
/// TurnStarted { Evaluator }
/// TurnCompleted { Evaluator }
/// SkillsExtracted
/// TurnStarted { ScenarioDesigner }
/// TurnCompleted { ScenarioDesigner }
/// TurnStarted { Narrator }
/// TurnCompleted { Narrator }
/// ScenarioAdvanced
/// ```
#[derive(Debug, Clone)]
pub enum SimulationEvent {
    /// Fired at the start of [`Simulation::start_simulation`](crate::Simulation::start_simulation).
    SimulationStarted { career: String },

    /// Fired before each model call.
    TurnStarted {
        role: AgentRole,
        /// First ~100 characters of the task text.
        task_preview: String,
    },

    /// Fired after a turn's stream has been fully consumed.
    TurnCompleted {
        role: AgentRole,
        /// First ~100 characters of the reasoning channel.
        reasoning_preview: String,
        /// Byte length of the answer text.
        answer_length: usize,
    },

    /// Fired when the transport or the stream fails; the error is also returned
    /// to the caller.
    TurnFailed { role: AgentRole, error: String },

    /// The research answer has been classified. It does not alter the call sequence.
    ResearchAssessed { assessment: ResearchAssessment },

    /// Outcome of best-effort skill extraction from an evaluation.
    SkillsExtracted { extraction: SkillExtraction },

    /// A decision was fully processed and committed.
    ScenarioAdvanced {
        scenarios_completed: usize,
        time: String,
    },

    /// [`Simulation::generate_summary`](crate::Simulation::generate_summary) finished.
    SummaryGenerated {
        career: String,
        scenarios_completed: usize,
        skill_count: usize,
    },
}

/// Receiver of [`SimulationEvent`]s.
///
/// The default implementation is a no-op, so implementors only override what they
/// care about. Handlers are shared as `Arc<dyn EventHandler>` between the
/// simulation and its four agents.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_simulation_event(&self, _event: &SimulationEvent) {}
}

/// Forwards every event to the [`log`] facade (`info` for progress, `debug` for
/// turn detail, `warn` for failures).
pub struct LoggingEventHandler;

#[async_trait]
impl EventHandler for LoggingEventHandler {
    async fn on_simulation_event(&self, event: &SimulationEvent) {
        match event {
            SimulationEvent::SimulationStarted { career } => {
                log::info!("simulation started for career '{}'", career)
            }
            SimulationEvent::TurnStarted { role, task_preview } => {
                log::debug!("[{}] turn started: {}", role, task_preview)
            }
            SimulationEvent::TurnCompleted {
                role,
                reasoning_preview,
                answer_length,
            } => log::debug!(
                "[{}] turn completed ({} answer bytes), reasoning: {}",
                role,
                answer_length,
                reasoning_preview
            ),
            SimulationEvent::TurnFailed { role, error } => {
                log::warn!("[{}] turn failed: {}", role, error)
            }
            SimulationEvent::ResearchAssessed { assessment } => {
                log::info!("research assessment: {:?}", assessment)
            }
            SimulationEvent::SkillsExtracted { extraction } => {
                log::debug!("skill extraction: {:?}", extraction)
            }
            SimulationEvent::ScenarioAdvanced {
                scenarios_completed,
                time,
            } => log::info!("scenario {} complete, clock at {}", scenarios_completed, time),
            SimulationEvent::SummaryGenerated {
                career,
                scenarios_completed,
                skill_count,
            } => log::info!(
                "summary for '{}': {} scenarios, {} distinct skills",
                career,
                scenarios_completed,
                skill_count
            ),
        }
    }
}
