//! multigitminder core - CI progress logging to Beeminder
//!
//! Provides the pieces the `multigitminder` binary wires together:
//! - Validates the action inputs supplied by the CI runner
//! - Derives branch name, short SHA and the default comment
//! - Evaluates the optional repository language gate
//! - Fetches a goal, stages one data point and commits it

pub mod action;
pub mod beeminder;
pub mod error;
pub mod fakes;
pub mod git_ref;
pub mod goal;
pub mod inputs;
pub mod langs;
pub mod telemetry;

// Re-export key types
pub use action::{run, Outcome, Receipt, RunState};
pub use beeminder::{BeeminderClient, BeeminderConfig};
pub use error::{ClientError, ConfigError, MinderError, MissingInput};
pub use git_ref::{branch_name, resolve_comment, short_sha};
pub use goal::{Credentials, DataPoint, Goal, GoalClient};
pub use inputs::{ActionInputs, RequiredInputs};
pub use langs::{GateVerdict, LanguageGate, RepoLanguages, TargetLanguages};
pub use telemetry::init_tracing;

/// multigitminder core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
