//! # podcheck-harness
//!
//! The scenario layer of the harness. One scenario:
//!
//! 1. Captures a baseline snapshot of the watched task prefix
//! 2. Issues exactly one triggering operation (scale, restart,
//!    replace, config update) against the external scheduler
//! 3. Polls the live inventory until the scenario's identity-diff
//!    expectation holds or the deadline expires
//! 4. Asserts placement/ordering invariants on the converged state
//!
//! Scenarios run strictly sequentially and mutate nothing but the one
//! trigger; everything else is observation. The triggering call is
//! never retried - only observation is.

mod client;
mod collector;
mod config;
mod error;
mod scenario;
pub mod scenarios;
mod store;

pub use client::{AppConfig, LastTaskFailure, PodCommandResponse, SchedulerClient};
pub use collector::SnapshotCollector;
pub use config::HarnessConfig;
pub use error::{ClientError, HarnessError};
pub use scenario::{
    run_lock_oracle, run_scenario, Expectation, FinalCount, PostChecks, ScenarioContext,
    ScenarioReport, ScenarioSpec, Trigger,
};
pub use store::ConfigStoreClient;
