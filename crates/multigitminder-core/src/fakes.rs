//! In-memory goal client (testing only)
//!
//! `RecordingGoalClient` satisfies the [`GoalClient`] contract without a
//! network and records every call so tests can assert on order and payload.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ClientError;
use crate::goal::{DataPoint, Goal, GoalClient};

/// A call observed by [`RecordingGoalClient`].
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCall {
    FetchGoal(String),
    Commit { goal: String, points: Vec<DataPoint> },
}

/// Goal client that records calls and optionally fails them.
#[derive(Debug, Default)]
pub struct RecordingGoalClient {
    calls: Mutex<Vec<ClientCall>>,
    committed: Mutex<Vec<DataPoint>>,
    fetch_error: Option<ClientError>,
    commit_error: Option<ClientError>,
}

impl RecordingGoalClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `fetch_goal` fail with `err`.
    pub fn failing_fetch(mut self, err: ClientError) -> Self {
        self.fetch_error = Some(err);
        self
    }

    /// Make every `commit_datapoints` fail with `err`.
    pub fn failing_commit(mut self, err: ClientError) -> Self {
        self.commit_error = Some(err);
        self
    }

    /// All calls so far, oldest first.
    pub fn calls(&self) -> Vec<ClientCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Every data point that was successfully committed.
    pub fn committed(&self) -> Vec<DataPoint> {
        self.committed.lock().unwrap().clone()
    }
}

#[async_trait]
impl GoalClient for RecordingGoalClient {
    async fn fetch_goal(&self, name: &str) -> Result<Goal, ClientError> {
        self.calls
            .lock()
            .unwrap()
            .push(ClientCall::FetchGoal(name.to_string()));

        match &self.fetch_error {
            Some(err) => Err(err.clone()),
            None => Ok(Goal::new(name)),
        }
    }

    async fn commit_datapoints(&self, goal: &mut Goal) -> Result<usize, ClientError> {
        self.calls.lock().unwrap().push(ClientCall::Commit {
            goal: goal.slug.clone(),
            points: goal.staged().to_vec(),
        });

        if let Some(err) = &self.commit_error {
            return Err(err.clone());
        }

        let count = goal.staged().len();
        self.committed
            .lock()
            .unwrap()
            .extend_from_slice(goal.staged());
        goal.clear_staged();
        Ok(count)
    }
}
