//! Repository language gate.
//!
//! A run may be restricted to repositories that contain at least one of a
//! list of target languages. The repository's languages arrive as the JSON
//! object GitHub's languages API returns (`{"Rust": 12345, ...}`); the
//! targets arrive either as a literal sequence (`['Rust', "Go"]`,
//! `('Rust', 'Go')` or `'Rust', 'Go'`) or as a single bare name.

use crate::error::ConfigError;
use std::collections::BTreeMap;
use std::iter::Peekable;
use std::str::Chars;
use tracing::{debug, info};

/// Target languages, lowercased, in the order they were given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetLanguages(pub Vec<String>);

impl TargetLanguages {
    /// Parse the raw input.
    ///
    /// A list, tuple or bare comma-separated run of quoted literals is
    /// unpacked; anything else
    /// is taken as one language name. Blank input yields no targets.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::default();
        }

        let names = match parse_literal(raw) {
            Some(names) => names,
            None => vec![raw.to_string()],
        };

        Self(names.into_iter().map(|n| n.to_lowercase()).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Repository languages keyed by lowercased name, valued in bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepoLanguages(pub BTreeMap<String, f64>);

impl RepoLanguages {
    /// Parse the JSON object of language byte counts.
    ///
    /// Any JSON number is accepted as a count. Keys differing only by case
    /// are merged and their counts summed.
    pub fn parse(raw: Option<&str>) -> Result<Self, ConfigError> {
        let raw = raw.ok_or(ConfigError::RepoLanguagesAbsent)?;
        if raw.trim().is_empty() {
            return Err(ConfigError::RepoLanguagesEmpty);
        }

        let parsed: BTreeMap<String, serde_json::Number> = serde_json::from_str(raw)
            .map_err(|e| ConfigError::InvalidRepoLanguages(e.to_string()))?;
        if parsed.is_empty() {
            return Err(ConfigError::RepoLanguagesEmpty);
        }

        let mut langs = BTreeMap::new();
        for (name, bytes) in parsed {
            let bytes = bytes.as_f64().ok_or_else(|| {
                ConfigError::InvalidRepoLanguages(format!("count for {} is out of range", name))
            })?;
            *langs.entry(name.to_lowercase()).or_insert(0.0) += bytes;
        }
        Ok(Self(langs))
    }

    pub fn contains(&self, lang: &str) -> bool {
        self.0.contains_key(lang)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Outcome of a gate evaluation that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateVerdict {
    /// No target languages were configured.
    Skipped,

    /// Target languages present in the repository, in target order.
    Matched(Vec<String>),
}

impl GateVerdict {
    /// Languages that satisfied the gate (empty when skipped).
    pub fn matched(&self) -> &[String] {
        match self {
            GateVerdict::Skipped => &[],
            GateVerdict::Matched(langs) => langs,
        }
    }
}

/// Language gate evaluation rules.
pub struct LanguageGate;

impl LanguageGate {
    /// Evaluate the gate from raw inputs.
    ///
    /// Rules, in order:
    /// - repository languages must be present, valid and non-empty, even when
    ///   no targets are configured
    /// - no targets means the gate is skipped
    /// - otherwise at least one target must be a repository language
    pub fn evaluate(
        target_langs: Option<&str>,
        repo_langs: Option<&str>,
    ) -> Result<GateVerdict, ConfigError> {
        debug!(repo_langs = ?repo_langs, "Evaluating language gate");
        let repo = RepoLanguages::parse(repo_langs)?;

        let targets = TargetLanguages::parse(target_langs.unwrap_or_default());
        if targets.is_empty() && target_langs.map_or(true, |t| t.trim().is_empty()) {
            debug!("No target languages configured, skipping language gate");
            return Ok(GateVerdict::Skipped);
        }

        Self::check(&targets, &repo)
    }

    /// Intersect parsed targets with repository languages.
    pub fn check(
        targets: &TargetLanguages,
        repo: &RepoLanguages,
    ) -> Result<GateVerdict, ConfigError> {
        let mut matched: Vec<String> = Vec::new();
        for lang in targets.as_slice() {
            if repo.contains(lang) && !matched.contains(lang) {
                matched.push(lang.clone());
            }
        }

        if matched.is_empty() {
            return Err(ConfigError::NoLanguageMatch);
        }

        info!(
            "Target languages found: {}\nLogging data to Beeminder.",
            matched.join(" ")
        );
        Ok(GateVerdict::Matched(matched))
    }
}

/// Parse a literal sequence of quoted strings.
///
/// Accepts `[...]`, `(...)`, or a bare comma-separated run of quoted
/// strings (a single quoted string included). Returns `None` for anything
/// else so the caller can fall back.
fn parse_literal(raw: &str) -> Option<Vec<String>> {
    let mut chars = raw.chars().peekable();
    let close = match chars.peek()? {
        '[' => Some(']'),
        '(' => Some(')'),
        '\'' | '"' => None,
        _ => return None,
    };
    if close.is_some() {
        chars.next();
    }

    let items = parse_items(&mut chars, close)?;
    skip_whitespace(&mut chars);
    chars.next().is_none().then_some(items)
}

/// Comma-separated quoted strings up to `close`, or to end of input when
/// `close` is `None`. A trailing comma is allowed.
fn parse_items(chars: &mut Peekable<Chars<'_>>, close: Option<char>) -> Option<Vec<String>> {
    let mut items = Vec::new();
    loop {
        skip_whitespace(chars);
        if chars.peek().copied() == close {
            chars.next();
            return Some(items);
        }

        items.push(parse_quoted(chars)?);

        skip_whitespace(chars);
        match chars.next() {
            Some(',') => continue,
            c if c == close => return Some(items),
            _ => return None,
        }
    }
}

fn parse_quoted(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let quote = match chars.next()? {
        q @ ('\'' | '"') => q,
        _ => return None,
    };

    let mut out = String::new();
    loop {
        match chars.next()? {
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                c @ ('\\' | '\'' | '"') => out.push(c),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            },
            c if c == quote => return Some(out),
            c => out.push(c),
        }
    }
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}
