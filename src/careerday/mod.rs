// src/careerday/mod.rs

pub mod agent;
pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod event;
pub mod http_client_pool;
pub mod roles;
pub mod session;
pub mod simulation;
#[cfg(feature = "web")]
pub mod web;

// Re-export the orchestrator so it can be reached as careerday::Simulation
pub use simulation::Simulation;
