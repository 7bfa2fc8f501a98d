//! Configuration for a simulation.
//!
//! Provides the [`SimulationConfig`] struct holding the day's clock labels, the
//! number of decisions that make up a full day, and the sampling parameters every
//! turn uses. Users construct this manually; no file parsing dependencies are
//! required.
//!
//! # Example
//!
//! ```rust
//! use careerday::SimulationConfig;
//!
//! // The standard six-slot working day with five decisions
//! let config = SimulationConfig::default();
//! assert_eq!(config.max_scenarios, 5);
//!
//! // A shorter shift
//! let config = SimulationConfig::default()
//!     .with_time_labels(["8:00 PM", "11:00 PM", "2:00 AM"])
//!     .with_max_scenarios(2);
//! assert_eq!(config.time_label(7), "2:00 AM");
//! ```

use crate::careerday::client_wrapper::GenerationParams;

/// Clock labels of the standard day, in order.
pub const DEFAULT_TIME_LABELS: [&str; 6] = [
    "9:00 AM", "10:30 AM", "12:00 PM", "2:00 PM", "4:00 PM", "5:30 PM",
];

/// Decisions after which the day is considered complete.
pub const DEFAULT_MAX_SCENARIOS: usize = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Ordered clock labels. The label for `n` completed scenarios is
    /// `time_labels[min(n, len - 1)]`.
    pub time_labels: Vec<String>,
    /// Frontends stop accepting decisions once this many have been processed.
    pub max_scenarios: usize,
    /// Sampling parameters applied to all four agents.
    pub generation: GenerationParams,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_labels: DEFAULT_TIME_LABELS.iter().map(|s| s.to_string()).collect(),
            max_scenarios: DEFAULT_MAX_SCENARIOS,
            generation: GenerationParams::default(),
        }
    }
}

impl SimulationConfig {
    /// Replace the clock labels. An empty list is ignored.
    pub fn with_time_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            log::warn!("SimulationConfig::with_time_labels: empty label list ignored");
        } else {
            self.time_labels = labels;
        }
        self
    }

    pub fn with_max_scenarios(mut self, max_scenarios: usize) -> Self {
        self.max_scenarios = max_scenarios;
        self
    }

    pub fn with_generation(mut self, generation: GenerationParams) -> Self {
        self.generation = generation;
        self
    }

    /// Clock label after `scenarios_completed` decisions, clamped to the last label.
    pub fn time_label(&self, scenarios_completed: usize) -> &str {
        let last = self.time_labels.len().saturating_sub(1);
        self.time_labels
            .get(scenarios_completed.min(last))
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// The label the day starts at.
    pub fn opening_time(&self) -> &str {
        self.time_label(0)
    }
}
