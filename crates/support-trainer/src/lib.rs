//! Core of the support-trainer service: response scoring, role-play sessions, the
//! completion client that voices the simulated customer, and dialog knowledge import.

pub mod config;
pub mod error;
pub mod knowledge;
pub mod llm;
pub mod scoring;
pub mod session;
pub mod telemetry;
