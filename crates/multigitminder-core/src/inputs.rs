//! Action inputs supplied by the CI runner.
//!
//! The binary fills an [`ActionInputs`] once from its arguments and
//! environment; everything downstream works on that value and never reads
//! the process environment itself.

use crate::error::MissingInput;
use crate::goal::Credentials;

/// Raw inputs as strings, exactly as the runner provided them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionInputs {
    /// `GITHUB_SHA`
    pub sha: Option<String>,

    /// `GITHUB_REF`
    pub git_ref: Option<String>,

    /// `INPUT_USERNAME`
    pub username: Option<String>,

    /// `INPUT_AUTH_TOKEN`
    pub auth_token: Option<String>,

    /// `INPUT_GOAL`
    pub goal: Option<String>,

    /// `INPUT_VALUE`
    pub value: Option<String>,

    /// `INPUT_COMMENT`
    pub comment: Option<String>,

    /// `INPUT_TARGET_LANGS`
    pub target_langs: Option<String>,

    /// `INPUT_REPO_LANGS`
    pub repo_langs: Option<String>,

    /// Validate everything but do not contact the service.
    pub dry_run: bool,
}

/// The four inputs a run cannot proceed without, all non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredInputs {
    pub username: String,
    pub auth_token: String,
    pub goal: String,
    pub value: String,
}

impl RequiredInputs {
    /// Credentials used to construct the goal client.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            auth_token: self.auth_token.clone(),
        }
    }
}

impl ActionInputs {
    /// Check username, auth token, goal and value, in that order.
    ///
    /// The first absent or empty one is reported; nothing else is inspected.
    pub fn require(&self) -> Result<RequiredInputs, MissingInput> {
        let username = present(&self.username).ok_or(MissingInput::Username)?;
        let auth_token = present(&self.auth_token).ok_or(MissingInput::AuthToken)?;
        let goal = present(&self.goal).ok_or(MissingInput::Goal)?;
        let value = present(&self.value).ok_or(MissingInput::Value)?;

        Ok(RequiredInputs {
            username: username.to_string(),
            auth_token: auth_token.to_string(),
            goal: goal.to_string(),
            value: value.to_string(),
        })
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}
