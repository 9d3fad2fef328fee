//! Goal handle and the client seam for the goal-tracking service.

use crate::error::ClientError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Account credentials for the goal-tracking service.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub auth_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

/// One observation to log against a goal.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    /// Numeric value, forwarded as given.
    pub value: String,

    pub comment: String,

    /// When the point was staged.
    pub timestamp: DateTime<Utc>,

    /// Sent as `requestid`. The service ignores a second point with the same
    /// id, so only ids derived from the commit make a re-run idempotent.
    pub request_id: String,
}

/// A goal fetched from the service, holding data points staged for commit.
#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    /// Goal identifier (the name used in the URL).
    pub slug: String,

    pub title: String,

    pub goal_type: Option<String>,

    pub units: Option<String>,

    staged: Vec<DataPoint>,
}

impl Goal {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            title: String::new(),
            goal_type: None,
            units: None,
            staged: Vec::new(),
        }
    }

    /// Buffer a data point locally; nothing is sent until commit.
    ///
    /// The point gets a random request id, so every call yields a new point
    /// on the service.
    pub fn stage_datapoint(&mut self, value: impl Into<String>, comment: impl Into<String>) {
        self.push(value.into(), comment.into(), Uuid::new_v4());
    }

    /// Buffer a data point keyed to a commit.
    ///
    /// The request id is derived from the goal slug and the commit SHA, so
    /// re-running the same commit against the same goal is deduplicated by
    /// the service instead of counted twice.
    pub fn stage_commit_datapoint(
        &mut self,
        value: impl Into<String>,
        comment: impl Into<String>,
        sha: &str,
    ) {
        let key = format!("multigitminder:{}:{}", self.slug, sha);
        let request_id = Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes());
        self.push(value.into(), comment.into(), request_id);
    }

    fn push(&mut self, value: String, comment: String, request_id: Uuid) {
        self.staged.push(DataPoint {
            value,
            comment,
            timestamp: Utc::now(),
            request_id: request_id.to_string(),
        });
    }

    pub fn staged(&self) -> &[DataPoint] {
        &self.staged
    }

    /// Drop the staged points once they have been committed.
    pub fn clear_staged(&mut self) {
        self.staged.clear();
    }
}

/// Client for a goal-tracking service.
///
/// Implementations are built once per run from [`Credentials`]; no
/// implementation retries on its own.
#[async_trait]
pub trait GoalClient: Send + Sync {
    /// Fetch a goal by name.
    async fn fetch_goal(&self, name: &str) -> Result<Goal, ClientError>;

    /// Send every staged data point in one request and clear the buffer.
    ///
    /// Returns how many points were committed; nothing staged is a no-op.
    async fn commit_datapoints(&self, goal: &mut Goal) -> Result<usize, ClientError>;
}

#[async_trait]
impl<T: GoalClient + ?Sized> GoalClient for Arc<T> {
    async fn fetch_goal(&self, name: &str) -> Result<Goal, ClientError> {
        (**self).fetch_goal(name).await
    }

    async fn commit_datapoints(&self, goal: &mut Goal) -> Result<usize, ClientError> {
        (**self).commit_datapoints(goal).await
    }
}
