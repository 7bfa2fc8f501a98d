//! Career day orchestration.
//!
//! [`Simulation`] owns the four role agents, the simulation state and the
//! chronological interaction log, and drives the roles through a fixed sequence of
//! turns per call:
//!
//! ```text
//! start_simulation       Research → Scenario Designer → Narrator      (log +3)
//! process_user_decision  Evaluator → Scenario Designer → Narrator     (log +3)
//! generate_summary       Evaluator → Narrator                         (log +2)
//! ```
//!
//! Every call issues its model requests strictly one after another. A simulation is
//! owned by exactly one session; it is `Send` so it can live behind a per-session
//! mutex, but it is never shared between sessions.
//!
//! # Example
//!
//! ```rust,no_run
//! use careerday::Simulation;
//! use careerday::clients::nvidia::NvidiaClient;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let client = Arc::new(NvidiaClient::new_with_model_str("nvapi-...", "nvidia/nvidia-nemotron-nano-9b-v2")?);
//! let mut sim = Simulation::new(client);
//!
//! println!("{}", sim.start_simulation("Chef").await?);
//! while !sim.is_complete() {
//!     println!("{}", sim.process_user_decision("Check the walk-in fridge first").await?);
//! }
//! let summary = sim.generate_summary().await?;
//! println!("{} ({} agent turns)", summary.summary, summary.agent_interactions);
//! # Ok(())
//! # }
//! ```

use crate::careerday::agent::{Agent, TurnResult};
use crate::careerday::client_wrapper::{ClientWrapper, SendError};
use crate::careerday::config::SimulationConfig;
use crate::careerday::event::{EventHandler, SimulationEvent};
use crate::careerday::roles::AgentRole;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Mutable progress of one simulated day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    /// Current clock label.
    pub time: String,
    /// Decisions processed so far. Never decreases.
    pub scenarios_completed: usize,
    /// Skills reported by the evaluator, in order, duplicates kept.
    pub skills_demonstrated: Vec<String>,
    /// The most recently designed scenario.
    pub current_scenario: Option<TurnResult>,
}

impl SimulationState {
    fn new(opening_time: &str) -> Self {
        Self {
            time: opening_time.to_string(),
            scenarios_completed: 0,
            skills_demonstrated: Vec::new(),
            current_scenario: None,
        }
    }
}

/// Background handed to the scenario designer for the opening scenario.
///
/// Derived from the career name alone; no lookup is performed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CareerKnowledge {
    pub career: String,
    pub researched: bool,
    pub typical_challenges: String,
    pub tools: String,
}

impl CareerKnowledge {
    pub fn placeholder(career: &str) -> Self {
        Self {
            career: career.to_string(),
            researched: true,
            typical_challenges: format!("Common challenges for {}", career),
            tools: format!("Tools used in {}", career),
        }
    }
}

/// The research agent's verdict on whether the career is known well enough.
#[derive(Clone, Debug, PartialEq)]
pub enum ResearchAssessment {
    /// `needs_research` was true; carries `missing_info`.
    NeedsInfo(Vec<String>),
    /// `needs_research` was false; carries `known_info` (JSON `null` if absent).
    Sufficient(Value),
    /// The answer was not a JSON object with a boolean `needs_research`.
    Unparsed,
}

impl ResearchAssessment {
    pub fn from_answer(answer: &str) -> Self {
        let parsed: Value = match serde_json::from_str(answer) {
            Ok(value) => value,
            Err(_) => return ResearchAssessment::Unparsed,
        };
        match parsed.get("needs_research").and_then(Value::as_bool) {
            Some(true) => ResearchAssessment::NeedsInfo(string_items(parsed.get("missing_info"))),
            Some(false) => ResearchAssessment::Sufficient(
                parsed.get("known_info").cloned().unwrap_or(Value::Null),
            ),
            None => ResearchAssessment::Unparsed,
        }
    }
}

/// Result of best-effort skill extraction from an evaluator answer.
#[derive(Clone, Debug, PartialEq)]
pub enum SkillExtraction {
    /// The answer was a JSON object; carries the string items of `skills_used`
    /// (empty when the key is missing or not a list).
    Parsed(Vec<String>),
    /// The answer was not a JSON object. Nothing is recorded for the turn.
    Unparsed,
}

impl SkillExtraction {
    pub fn skills(&self) -> &[String] {
        match self {
            SkillExtraction::Parsed(skills) => skills,
            SkillExtraction::Unparsed => &[],
        }
    }
}

/// Extract `skills_used` from an evaluator answer without ever failing.
pub fn extract_skills(answer: &str) -> SkillExtraction {
    match serde_json::from_str::<Value>(answer) {
        Ok(Value::Object(map)) => SkillExtraction::Parsed(string_items(map.get("skills_used"))),
        _ => SkillExtraction::Unparsed,
    }
}

fn string_items(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Order-preserving de-duplication.
pub fn dedupe_skills(skills: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    skills
        .iter()
        .filter(|skill| seen.insert(skill.as_str()))
        .cloned()
        .collect()
}

/// End-of-day report returned by [`Simulation::generate_summary`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub career: String,
    pub scenarios_completed: usize,
    /// Distinct skills, in the order they were first demonstrated.
    pub skills: Vec<String>,
    /// The narrator's summary text.
    pub summary: String,
    /// Turns taken by the day itself: the opening plus every decision, not counting
    /// the two summary turns.
    pub agent_interactions: usize,
}

/// Where a simulation stands relative to the configured scenario cutoff.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationPhase {
    NotStarted,
    Active,
    Complete,
}

/// Errors raised by the orchestrator itself (as opposed to transport errors,
/// which are passed through).
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// A decision or summary was requested before [`Simulation::start_simulation`].
    NotStarted,
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::NotStarted => write!(f, "Simulation has not been started"),
        }
    }
}

impl Error for SimulationError {}

/// The orchestrator of one career day.
pub struct Simulation {
    config: SimulationConfig,
    research: Agent,
    scenario: Agent,
    evaluator: Agent,
    narrator: Agent,
    career_knowledge: Option<CareerKnowledge>,
    research_assessment: Option<ResearchAssessment>,
    state: SimulationState,
    agent_log: Vec<TurnResult>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl Simulation {
    /// Create a simulation whose four agents share `client`, using
    /// [`SimulationConfig::default`].
    pub fn new(client: Arc<dyn ClientWrapper>) -> Self {
        let config = SimulationConfig::default();
        let agent = |role| Agent::new(role, client.clone()).with_params(config.generation.clone());
        Self {
            research: agent(AgentRole::Research),
            scenario: agent(AgentRole::ScenarioDesigner),
            evaluator: agent(AgentRole::Evaluator),
            narrator: agent(AgentRole::Narrator),
            career_knowledge: None,
            research_assessment: None,
            state: SimulationState::new(config.opening_time()),
            agent_log: Vec::new(),
            event_handler: None,
            config,
        }
    }

    /// Replace the configuration (builder pattern). Meant to be called before
    /// [`start_simulation`](Simulation::start_simulation): the clock is reset to the
    /// new opening label.
    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        for agent in self.agents_mut() {
            agent.set_params(config.generation.clone());
        }
        self.state.time = config.opening_time().to_string();
        self.config = config;
        self
    }

    /// Attach an [`EventHandler`] (builder pattern). The handler is propagated to
    /// the four agents so their turn events flow through the same callback.
    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        for agent in self.agents_mut() {
            agent.set_event_handler(handler.clone());
        }
        self.event_handler = Some(handler);
        self
    }

    fn agents_mut(&mut self) -> [&mut Agent; 4] {
        [
            &mut self.research,
            &mut self.scenario,
            &mut self.evaluator,
            &mut self.narrator,
        ]
    }

    async fn emit(&self, event: SimulationEvent) {
        if let Some(handler) = &self.event_handler {
            handler.on_simulation_event(&event).await;
        }
    }

    fn career(&self) -> Result<&str, SimulationError> {
        self.career_knowledge
            .as_ref()
            .map(|knowledge| knowledge.career.as_str())
            .ok_or(SimulationError::NotStarted)
    }

    /// Research the career, design the opening scenario and narrate it.
    ///
    /// Returns the narrator's opening text. Three turns are appended to the log.
    /// Calling this again restarts the day with the same log. State, career
    /// knowledge and the research assessment are replaced only once all three
    /// turns have succeeded; turns that did complete stay in the log.
    pub async fn start_simulation(&mut self, career: &str) -> Result<String, SendError> {
        self.emit(SimulationEvent::SimulationStarted {
            career: career.to_string(),
        })
        .await;

        let research = self
            .research
            .think_and_act(
                &format!(
                    "Do we have enough information to simulate a day as a {}? What do we need to know?",
                    career
                ),
                Some(&json!({ "career": career })),
            )
            .await?;
        let assessment = ResearchAssessment::from_answer(&research.action);
        self.agent_log.push(research);
        self.emit(SimulationEvent::ResearchAssessed {
            assessment: assessment.clone(),
        })
        .await;

        let knowledge = CareerKnowledge::placeholder(career);
        let opening_time = self.config.opening_time().to_string();

        let scenario = self
            .scenario
            .think_and_act(
                &format!(
                    "Design an engaging opening scenario for a {}'s day at {}",
                    career, opening_time
                ),
                Some(&serde_json::to_value(&knowledge)?),
            )
            .await?;
        self.agent_log.push(scenario.clone());

        let narrative = self
            .narrator
            .think_and_act(
                &format!("Present this scenario engagingly: {}", scenario.action),
                Some(&json!({ "career": career, "time": opening_time })),
            )
            .await?;
        let opening = narrative.action.clone();
        self.agent_log.push(narrative);

        let mut state = SimulationState::new(&opening_time);
        state.current_scenario = Some(scenario);
        self.state = state;
        self.career_knowledge = Some(knowledge);
        self.research_assessment = Some(assessment);

        Ok(opening)
    }

    /// Evaluate the user's choice, design the next scenario and narrate both.
    ///
    /// Any text is accepted, including an empty string. The scenario counter, the
    /// clock, the recorded skills and the current scenario are committed only once
    /// all three turns have succeeded; turns that did complete stay in the log.
    pub async fn process_user_decision(&mut self, user_choice: &str) -> Result<String, SendError> {
        let career = self.career()?.to_string();

        let evaluation = self
            .evaluator
            .think_and_act(
                &format!("User chose: '{}'. Evaluate this decision.", user_choice),
                Some(&json!({
                    "scenario": self.state.current_scenario,
                    "career": career,
                })),
            )
            .await?;
        self.agent_log.push(evaluation.clone());

        let extraction = extract_skills(&evaluation.action);
        self.emit(SimulationEvent::SkillsExtracted {
            extraction: extraction.clone(),
        })
        .await;

        let scenarios_completed = self.state.scenarios_completed + 1;
        let time = self.config.time_label(scenarios_completed).to_string();

        let next_scenario = self
            .scenario
            .think_and_act(
                "Create next scenario based on the consequence of user's choice",
                Some(&json!({
                    "previous_choice": user_choice,
                    "consequence": evaluation.action,
                    "time": time,
                    "career": career,
                })),
            )
            .await?;
        self.agent_log.push(next_scenario.clone());

        let narrative = self
            .narrator
            .think_and_act(
                "Tell the story of what happened after their choice and introduce the new scenario",
                Some(&json!({
                    "choice": user_choice,
                    "consequence": evaluation.action,
                    "next_scenario": next_scenario.action,
                })),
            )
            .await?;
        let story = narrative.action.clone();
        self.agent_log.push(narrative);

        if let SkillExtraction::Parsed(skills) = extraction {
            self.state.skills_demonstrated.extend(skills);
        }
        self.state.scenarios_completed = scenarios_completed;
        self.state.time = time.clone();
        self.state.current_scenario = Some(next_scenario);

        self.emit(SimulationEvent::ScenarioAdvanced {
            scenarios_completed,
            time,
        })
        .await;

        Ok(story)
    }

    /// Ask the evaluator and the narrator to wrap up the day.
    ///
    /// Two turns are appended to the log; `agent_interactions` is taken before them.
    pub async fn generate_summary(&mut self) -> Result<SummaryRecord, SendError> {
        let career = self.career()?.to_string();
        let state = serde_json::to_value(&self.state)?;
        let interactions = self.agent_log.len();

        let evaluation = self
            .evaluator
            .think_and_act("Summarize the skills and decisions demonstrated", Some(&state))
            .await?;
        self.agent_log.push(evaluation.clone());

        let narrative = self
            .narrator
            .think_and_act(
                "Create an engaging summary of the career day experience",
                Some(&json!({
                    "state": state,
                    "evaluation": evaluation.action,
                })),
            )
            .await?;
        let summary = narrative.action.clone();
        self.agent_log.push(narrative);

        let record = SummaryRecord {
            career,
            scenarios_completed: self.state.scenarios_completed,
            skills: dedupe_skills(&self.state.skills_demonstrated),
            summary,
            agent_interactions: interactions,
        };

        self.emit(SimulationEvent::SummaryGenerated {
            career: record.career.clone(),
            scenarios_completed: record.scenarios_completed,
            skill_count: record.skills.len(),
        })
        .await;

        Ok(record)
    }

    /// Every turn taken so far, in chronological order.
    pub fn get_agent_log(&self) -> &[TurnResult] {
        &self.agent_log
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn career_knowledge(&self) -> Option<&CareerKnowledge> {
        self.career_knowledge.as_ref()
    }

    pub fn research_assessment(&self) -> Option<&ResearchAssessment> {
        self.research_assessment.as_ref()
    }

    pub fn phase(&self) -> SimulationPhase {
        if self.career_knowledge.is_none() {
            SimulationPhase::NotStarted
        } else if self.state.scenarios_completed >= self.config.max_scenarios {
            SimulationPhase::Complete
        } else {
            SimulationPhase::Active
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase() == SimulationPhase::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_skills_from_evaluator_json() {
        let answer = r#"{"consequence": "ok", "skills_used": ["triage", "communication", 3], "professional_insight": "..."}"#;
        assert_eq!(
            extract_skills(answer),
            SkillExtraction::Parsed(vec!["triage".to_string(), "communication".to_string()])
        );
    }

    #[test]
    fn test_extract_skills_tolerates_non_json_and_non_objects() {
        assert_eq!(extract_skills("The chef was brave."), SkillExtraction::Unparsed);
        assert_eq!(extract_skills("[\"triage\"]"), SkillExtraction::Unparsed);
        assert_eq!(
            extract_skills(r#"{"consequence": "no skills key"}"#),
            SkillExtraction::Parsed(vec![])
        );
        assert!(SkillExtraction::Unparsed.skills().is_empty());
    }

    #[test]
    fn test_research_assessment_variants() {
        assert_eq!(
            ResearchAssessment::from_answer(
                r#"{"needs_research": true, "missing_info": ["typical day", "tools"], "known_info": {}}"#
            ),
            ResearchAssessment::NeedsInfo(vec!["typical day".into(), "tools".into()])
        );
        assert_eq!(
            ResearchAssessment::from_answer(
                r#"{"needs_research": false, "known_info": {"shift": "long"}}"#
            ),
            ResearchAssessment::Sufficient(json!({"shift": "long"}))
        );
        assert_eq!(
            ResearchAssessment::from_answer(r#"{"needs_research": "maybe"}"#),
            ResearchAssessment::Unparsed
        );
        assert_eq!(
            ResearchAssessment::from_answer("I know plenty about chefs."),
            ResearchAssessment::Unparsed
        );
    }

    #[test]
    fn test_dedupe_skills_keeps_first_occurrence_order() {
        let skills: Vec<String> = ["triage", "leadership", "triage", "budgeting", "leadership"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            dedupe_skills(&skills),
            vec!["triage", "leadership", "budgeting"]
        );
    }

    #[test]
    fn test_placeholder_knowledge_is_derived_from_career() {
        let knowledge = CareerKnowledge::placeholder("Chef");
        assert!(knowledge.researched);
        assert_eq!(knowledge.typical_challenges, "Common challenges for Chef");
        assert_eq!(knowledge.tools, "Tools used in Chef");
    }
}
