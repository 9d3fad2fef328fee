//! Commit identity helpers: short SHA, branch name and the default comment.

use crate::error::ConfigError;
use tracing::info;

/// Number of characters kept from the commit SHA.
pub const SHORT_SHA_LEN: usize = 7;

/// Shorten a commit SHA to its first seven characters.
///
/// Absent or empty input yields an empty string; shorter input is returned whole.
pub fn short_sha(sha: Option<&str>) -> String {
    match sha {
        Some(sha) if !sha.is_empty() => sha.chars().take(SHORT_SHA_LEN).collect(),
        _ => String::new(),
    }
}

/// Reduce a ref such as `refs/heads/main` to its last path segment.
pub fn branch_name(git_ref: Option<&str>) -> Result<String, ConfigError> {
    let git_ref = git_ref.ok_or(ConfigError::MissingRef)?;
    Ok(git_ref.rsplit('/').next().unwrap_or(git_ref).to_string())
}

/// Use the supplied comment, or synthesize `<branch>@<sha> via multigitminder API call`.
pub fn resolve_comment(comment: Option<&str>, branch: &str, short_sha: &str) -> String {
    match comment {
        Some(comment) if !comment.is_empty() => comment.to_string(),
        _ => {
            info!("Comment not provided. Using default comment.");
            format!("{}@{} via multigitminder API call", branch, short_sha)
        }
    }
}
