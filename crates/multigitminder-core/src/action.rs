//! Run orchestration: validate inputs, gate on languages, log one data point.

use crate::error::{ClientError, MissingInput, Result};
use crate::git_ref::{branch_name, resolve_comment, short_sha};
use crate::goal::{Credentials, GoalClient};
use crate::inputs::ActionInputs;
use crate::langs::LanguageGate;
use std::fmt;
use tracing::{debug, error, info};

/// Stages of a run. A run only moves forward and stops at the first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunState {
    Unvalidated,
    Validated,
    GoalFetched,
    Staged,
    Committed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Unvalidated => "unvalidated",
            RunState::Validated => "validated",
            RunState::GoalFetched => "goal_fetched",
            RunState::Staged => "staged",
            RunState::Committed => "committed",
        };
        f.write_str(name)
    }
}

/// What was (or, for a dry run, would have been) logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub branch: String,
    pub short_sha: String,
    pub value: String,
    pub goal: String,
    pub comment: String,

    /// Languages that satisfied the gate; empty when it was skipped.
    pub matched_languages: Vec<String>,
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}: Data point of {} added to {} with comment: '{}'",
            self.branch, self.short_sha, self.value, self.goal, self.comment
        )
    }
}

/// How a run ended without a hard failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A required input was missing; nothing was contacted.
    Skipped(MissingInput),

    /// Inputs were valid, the service was not contacted.
    DryRun(Receipt),

    /// The data point was committed.
    Committed(Receipt),
}

impl Outcome {
    /// Last state the run reached.
    pub fn final_state(&self) -> RunState {
        match self {
            Outcome::Skipped(_) => RunState::Unvalidated,
            Outcome::DryRun(_) => RunState::Validated,
            Outcome::Committed(_) => RunState::Committed,
        }
    }
}

fn enter(state: RunState) {
    debug!(state = %state, "Run state");
}

/// Execute one run.
///
/// `connect` builds the goal client and is only called once every input has
/// been validated, so a rejected run never constructs a client.
///
/// A missing required input is reported as `Ok(Outcome::Skipped(_))`;
/// configuration and service failures are returned as errors.
pub async fn run<C, F>(inputs: &ActionInputs, connect: F) -> Result<Outcome>
where
    C: GoalClient,
    F: FnOnce(&Credentials) -> std::result::Result<C, ClientError>,
{
    enter(RunState::Unvalidated);

    let required = match inputs.require() {
        Ok(required) => required,
        Err(missing) => {
            error!("{}", missing);
            return Ok(Outcome::Skipped(missing));
        }
    };

    let branch = branch_name(inputs.git_ref.as_deref())?;
    let short_sha = short_sha(inputs.sha.as_deref());
    let comment = resolve_comment(inputs.comment.as_deref(), &branch, &short_sha);
    let verdict =
        LanguageGate::evaluate(inputs.target_langs.as_deref(), inputs.repo_langs.as_deref())?;

    let receipt = Receipt {
        branch,
        short_sha,
        value: required.value.clone(),
        goal: required.goal.clone(),
        comment,
        matched_languages: verdict.matched().to_vec(),
    };
    enter(RunState::Validated);

    if inputs.dry_run {
        info!(goal = %receipt.goal, value = %receipt.value, "Dry run, not contacting Beeminder");
        return Ok(Outcome::DryRun(receipt));
    }

    let client = connect(&required.credentials())?;

    let mut goal = client.fetch_goal(&required.goal).await?;
    enter(RunState::GoalFetched);

    match inputs.sha.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(sha) => goal.stage_commit_datapoint(&receipt.value, &receipt.comment, sha),
        None => goal.stage_datapoint(&receipt.value, &receipt.comment),
    }
    enter(RunState::Staged);

    let committed = client.commit_datapoints(&mut goal).await?;
    enter(RunState::Committed);

    info!(goal = %receipt.goal, committed, "Data point logged");
    Ok(Outcome::Committed(receipt))
}
