//! # careerday
//!
//! careerday improvises a "day in the life" of any career by sequencing streamed calls to a
//! reasoning language model across four fixed agent roles:
//!
//! * **Research** decides whether enough is known about the career to simulate it
//! * **Scenario Designer** writes realistic decision points with trade-offs
//! * **Evaluator** judges each user decision and names the skills it demonstrated
//! * **Narrator** turns the structured output into a few paragraphs of story
//!
//! The crate is layered leaf-first:
//!
//! * [`ClientWrapper`] is the transport seam. [`clients::openai::OpenAIClient`] speaks the
//!   OpenAI-compatible streaming `/chat/completions` protocol and
//!   [`clients::nvidia::NvidiaClient`] presets it for the NVIDIA-hosted endpoint.
//! * [`Agent::think_and_act`] runs one turn and folds the reasoning and answer channels of
//!   the stream into a [`TurnResult`].
//! * [`Simulation`] owns the four agents, the [`SimulationState`] and the interaction log.
//! * [`session`] keeps one simulation per chat session for the frontends: the `careerday`
//!   CLI and, with the `web` feature, the `careerday-web` chat server.
//!
//! ## Getting Started
//!
//! ```rust,no_run
//! use careerday::clients::nvidia::NvidiaClient;
//! use careerday::event::LoggingEventHandler;
//! use careerday::Simulation;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     careerday::init_logger();
//!
//!     let api_key = std::env::var("NVIDIA_API_KEY")?;
//!     let client = Arc::new(NvidiaClient::new_with_model_str(
//!         &api_key,
//!         &careerday::clients::nvidia::default_model(),
//!     )?);
//!
//!     let mut sim = Simulation::new(client).with_event_handler(Arc::new(LoggingEventHandler));
//!     println!("{}", sim.start_simulation("Emergency Room Nurse").await?);
//!     println!("{}", sim.process_user_decision("Triage the chest pain patient first").await?);
//!
//!     let summary = sim.generate_summary().await?;
//!     println!("{}", summary.summary);
//!     Ok(())
//! }
//! ```

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// Binaries call this on startup; libraries embedding careerday can skip it and install
/// their own `log` backend.
///
/// ```rust
/// careerday::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `careerday` module.
pub mod careerday;

// Re-exporting key items for easier external access.
pub use careerday::agent::{Agent, TurnResult};
pub use careerday::client_wrapper;
pub use careerday::client_wrapper::{
    ClientWrapper, GenerationParams, Message, MessageChunk, ReasoningBudget, Role,
};
pub use careerday::clients;
pub use careerday::config;
pub use careerday::config::SimulationConfig;
pub use careerday::event;
pub use careerday::event::{EventHandler, SimulationEvent};
pub use careerday::roles::AgentRole;
pub use careerday::session;
pub use careerday::session::{ChatSession, SessionError, SessionStore};
pub use careerday::simulation;
pub use careerday::simulation::{
    ResearchAssessment, Simulation, SimulationError, SimulationPhase, SimulationState,
    SkillExtraction, SummaryRecord,
};
#[cfg(feature = "web")]
pub use careerday::web;
