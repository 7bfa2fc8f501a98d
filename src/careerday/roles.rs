//! The four agent personas of a career day.
//!
//! A role is nothing more than a display name and a fixed system prompt. The prompts
//! ask the structured roles for a JSON answer, but nothing downstream relies on the
//! model honouring that beyond the best-effort extraction in
//! [`simulation`](crate::simulation).

use serde::{Deserialize, Serialize};
use std::fmt;

const RESEARCH_PROMPT: &str = r#"You are a Career Research Agent. Your job:
1. DECIDE if you have enough information about the career to create realistic scenarios
2. If NOT, identify WHAT specific information you need (typical day, common challenges, required skills, tools used)
3. Output your decision and reasoning

Use /think to analyze what's known vs needed. Output JSON:
{"needs_research": true/false, "missing_info": [...], "known_info": {...}}"#;

const SCENARIO_DESIGNER_PROMPT: &str = r#"You are a Scenario Designer Agent. Create realistic, challenging scenarios for career simulations.

For each scenario, include:
- Realistic problem/situation
- 3-4 decision options with trade-offs
- Hidden complexity that reveals career realities

Use /think to ensure authenticity. Output JSON:
{"scenario": "...", "options": [...], "learning_goal": "..."}"#;

const EVALUATOR_PROMPT: &str = r#"You are an Evaluation Agent. Analyze user decisions in career scenarios.

Consider:
- Immediate consequences
- Long-term implications
- What professionals would actually do
- Skills demonstrated (or lacking)

Use /think to reason about realistic outcomes. Output JSON:
{"consequence": "...", "skills_used": [...], "professional_insight": "..."}"#;

const NARRATOR_PROMPT: &str = r#"You are a Narrator Agent. Transform scenario data into immersive storytelling.

Make it feel real and engaging while being educational. Keep responses 2-3 paragraphs.
Use /think to craft compelling narrative that teaches."#;

/// One of the fixed agent personas.
///
/// Serialized as its display name, so a [`TurnResult`](crate::TurnResult) passed back
/// to the model as context reads `"agent": "Scenario Designer"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentRole {
    #[serde(rename = "Research")]
    Research,
    #[serde(rename = "Scenario Designer")]
    ScenarioDesigner,
    #[serde(rename = "Evaluator")]
    Evaluator,
    #[serde(rename = "Narrator")]
    Narrator,
}

impl AgentRole {
    pub const ALL: [AgentRole; 4] = [
        AgentRole::Research,
        AgentRole::ScenarioDesigner,
        AgentRole::Evaluator,
        AgentRole::Narrator,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AgentRole::Research => "Research",
            AgentRole::ScenarioDesigner => "Scenario Designer",
            AgentRole::Evaluator => "Evaluator",
            AgentRole::Narrator => "Narrator",
        }
    }

    /// The instruction string sent as the system message of every turn.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            AgentRole::Research => RESEARCH_PROMPT,
            AgentRole::ScenarioDesigner => SCENARIO_DESIGNER_PROMPT,
            AgentRole::Evaluator => EVALUATOR_PROMPT,
            AgentRole::Narrator => NARRATOR_PROMPT,
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
