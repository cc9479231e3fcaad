//! `dao-wizard`: orchestration core for the deposit account opening
//! application wizard.
//!
//! The crate is a thin, in-process state machine: it loads an ordered step
//! list, mounts step components through a closed-enum router, caches
//! per-step payloads, and drives the validate -> persist -> advance
//! protocol, including resuming a partially completed application.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod wizard;

pub use error::WizardAppError;
