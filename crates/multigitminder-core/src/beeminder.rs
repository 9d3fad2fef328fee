//! Beeminder HTTP client
//!
//! Implements [`GoalClient`] against the Beeminder v1 REST API. Requests
//! are made once; status codes map onto [`ClientError`] variants and the
//! caller decides what to do with them.

use crate::error::ClientError;
use crate::goal::{Credentials, Goal, GoalClient};
use async_trait::async_trait;
use reqwest::{Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://www.beeminder.com/api/v1";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Beeminder client configuration
#[derive(Debug, Clone)]
pub struct BeeminderConfig {
    /// API root, without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// User-Agent header value
    pub user_agent: String,
}

impl Default for BeeminderConfig {
    fn default() -> Self {
        BeeminderConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("multigitminder/{}", crate::VERSION),
        }
    }
}

impl BeeminderConfig {
    /// Point the client at a different API root.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Goal as returned by `GET /users/{u}/goals/{g}.json`.
#[derive(Debug, Deserialize)]
struct GoalResponse {
    slug: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    goal_type: Option<String>,
    #[serde(default)]
    gunits: Option<String>,
}

impl From<GoalResponse> for Goal {
    fn from(resp: GoalResponse) -> Self {
        let mut goal = Goal::new(resp.slug);
        goal.title = resp.title;
        goal.goal_type = resp.goal_type;
        goal.units = resp.gunits;
        goal
    }
}

#[derive(Debug, Serialize)]
struct DatapointPayload<'a> {
    value: &'a str,
    comment: &'a str,
    timestamp: i64,
    requestid: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateAllRequest<'a> {
    auth_token: &'a str,
    datapoints: Vec<DatapointPayload<'a>>,
}

/// Beeminder API client bound to one account.
pub struct BeeminderClient {
    base_url: Url,
    credentials: Credentials,
    http_client: reqwest::Client,
}

impl BeeminderClient {
    /// Create a new Beeminder client
    ///
    /// Fails with [`ClientError::InvalidUrl`] when the API root is not a URL
    /// that path segments can be appended to.
    pub fn new(config: BeeminderConfig, credentials: Credentials) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(config.base_url));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(BeeminderClient {
            base_url,
            credentials,
            http_client,
        })
    }

    /// Append percent-encoded path segments to the API root.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl GoalClient for BeeminderClient {
    async fn fetch_goal(&self, name: &str) -> Result<Goal, ClientError> {
        info!(goal = %name, user = %self.credentials.username, "Fetching goal");

        let user = self.credentials.username.as_str();
        let url = self.endpoint(&["users", user, "goals", format!("{}.json", name).as_str()])?;
        let response = self
            .http_client
            .get(url)
            .query(&[("auth_token", self.credentials.auth_token.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, name).await);
        }

        let goal: GoalResponse = response.json().await?;
        debug!(goal = %goal.slug, title = %goal.title, "Goal fetched");
        Ok(goal.into())
    }

    async fn commit_datapoints(&self, goal: &mut Goal) -> Result<usize, ClientError> {
        let count = goal.staged().len();
        if count == 0 {
            debug!(goal = %goal.slug, "Nothing staged, skipping commit");
            return Ok(0);
        }

        info!(goal = %goal.slug, count, "Committing data points");

        let body = CreateAllRequest {
            auth_token: &self.credentials.auth_token,
            datapoints: goal
                .staged()
                .iter()
                .map(|dp| DatapointPayload {
                    value: &dp.value,
                    comment: &dp.comment,
                    timestamp: dp.timestamp.timestamp(),
                    requestid: &dp.request_id,
                })
                .collect(),
        };

        let user = self.credentials.username.as_str();
        let url = self.endpoint(&[
            "users",
            user,
            "goals",
            goal.slug.as_str(),
            "datapoints",
            "create_all.json",
        ])?;
        let response = self
            .http_client
            .post(url)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, &goal.slug).await);
        }

        goal.clear_staged();
        debug!(goal = %goal.slug, count, "Data points committed");
        Ok(count)
    }
}

/// Map a non-success response onto a [`ClientError`].
async fn error_from_response(response: Response, goal: &str) -> ClientError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    warn!(status = status.as_u16(), goal = %goal, "Beeminder request failed: {}", message);

    match status {
        StatusCode::NOT_FOUND => ClientError::NotFound(format!("{}: {}", goal, message)),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Authentication(message),
        StatusCode::TOO_MANY_REQUESTS => ClientError::RateLimited {
            message,
            retry_after,
        },
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ClientError::Rejected(message),
        s if s.is_server_error() => ClientError::Server {
            status: s.as_u16(),
            message,
        },
        s => ClientError::Rejected(format!("unexpected status {}: {}", s.as_u16(), message)),
    }
}

/// Pull a readable message out of an error body.
///
/// Beeminder answers with `{"errors": ...}` where the value is a string,
/// a list, or an object of field errors; plain-text bodies are used as is.
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    let errors = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => json.get("errors").cloned().unwrap_or(json),
        Err(_) => return Some(body.to_string()),
    };

    Some(match errors {
        serde_json::Value::String(s) => s,
        serde_json::Value::Array(items) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    })
}
