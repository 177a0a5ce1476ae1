//! # Subscription patterns.
//!
//! A [`Pattern`] decides whether an emitted event name belongs to a listener.
//!
//! ## Variants
//! ```text
//! Bidirectional("ls")   regex(pattern) finds in name  OR  regex(name) finds in pattern
//! Exact("user.login")   name == pattern
//! Glob("user.*")        glob anchored to the whole name
//! Regex("user\.\d+")    regex anchored to the whole name
//! ```
//!
//! Plain strings convert into [`Pattern::Bidirectional`]. The rule is
//! unanchored in both directions, so a literal name matches any name that
//! contains it, and either side may act as the regex. Malformed regexes on
//! either side never match.
//!
//! ## Identity
//! Two patterns are equal when they have the same kind and the same source
//! string. The registry is keyed by this identity.

use std::fmt;
use std::hash::{Hash, Hasher};

use regex::Regex;

use crate::error::EmitterError;

/// Tagged name pattern.
#[derive(Clone)]
pub enum Pattern {
    /// Baseline rule: substring regex match in either direction.
    Bidirectional(Bidirectional),
    /// Literal, full-name equality.
    Exact(String),
    /// Shell glob anchored to the full name.
    Glob(GlobPattern),
    /// Regular expression anchored to the full name.
    Regex(AnchoredRegex),
}

/// Source plus its (optional) regex compilation.
#[derive(Clone)]
pub struct Bidirectional {
    source: String,
    compiled: Option<Regex>,
}

/// Source plus its compiled glob, built by [`Pattern::glob`].
#[derive(Clone)]
pub struct GlobPattern {
    source: String,
    compiled: glob::Pattern,
}

/// Source plus its `^(?:..)$` compilation, built by [`Pattern::regex`].
#[derive(Clone)]
pub struct AnchoredRegex {
    source: String,
    compiled: Regex,
}

impl Pattern {
    /// Baseline bidirectional pattern. Never fails; a malformed regex only disables
    /// the pattern-as-regex direction.
    pub fn bidirectional(source: impl Into<String>) -> Self {
        let source = source.into();
        let compiled = Regex::new(&source).ok();
        Pattern::Bidirectional(Bidirectional { source, compiled })
    }

    /// Literal pattern matching only the identical name.
    pub fn exact(source: impl Into<String>) -> Self {
        Pattern::Exact(source.into())
    }

    /// Glob pattern (`*`, `?`, `[..]`).
    pub fn glob(source: impl Into<String>) -> Result<Self, EmitterError> {
        let source = source.into();
        let compiled = glob::Pattern::new(&source).map_err(|e| EmitterError::InvalidPattern {
            pattern: source.clone(),
            reason: e.to_string(),
        })?;
        Ok(Pattern::Glob(GlobPattern { source, compiled }))
    }

    /// Regular expression matched against the whole name.
    pub fn regex(source: impl Into<String>) -> Result<Self, EmitterError> {
        let source = source.into();
        let compiled =
            Regex::new(&format!("^(?:{source})$")).map_err(|e| EmitterError::InvalidPattern {
                pattern: source.clone(),
                reason: e.to_string(),
            })?;
        Ok(Pattern::Regex(AnchoredRegex { source, compiled }))
    }

    /// Source string as supplied at construction.
    pub fn as_str(&self) -> &str {
        match self {
            Pattern::Bidirectional(b) => &b.source,
            Pattern::Exact(s) => s,
            Pattern::Glob(g) => &g.source,
            Pattern::Regex(r) => &r.source,
        }
    }

    /// Short kind label (for logs).
    pub fn kind(&self) -> &'static str {
        match self {
            Pattern::Bidirectional(_) => "bidirectional",
            Pattern::Exact(_) => "exact",
            Pattern::Glob(_) => "glob",
            Pattern::Regex(_) => "regex",
        }
    }

    /// Returns `true` if an event called `name` is routed to this pattern.
    pub fn matches(&self, name: &str) -> bool {
        self.matches_candidate(&Candidate::new(name))
    }

    /// Same as [`matches`](Self::matches), reusing a candidate whose regex form
    /// was compiled once for many patterns.
    pub(crate) fn matches_candidate(&self, name: &Candidate<'_>) -> bool {
        match self {
            Pattern::Bidirectional(b) => {
                let forward = b.compiled.as_ref().is_some_and(|re| re.is_match(name.text));
                forward || name.regex().is_some_and(|re| re.is_match(&b.source))
            }
            Pattern::Exact(s) => s == name.text,
            Pattern::Glob(g) => g.compiled.matches(name.text),
            Pattern::Regex(r) => r.compiled.is_match(name.text),
        }
    }
}

/// Query pattern used by listing and bulk close, prepared once for many keys.
///
/// A registered key is selected when either side matches the other's source.
pub(crate) struct Selector<'a> {
    query: &'a Pattern,
    source: Candidate<'a>,
}

impl<'a> Selector<'a> {
    pub(crate) fn new(query: &'a Pattern) -> Self {
        Self {
            query,
            source: Candidate::new(query.as_str()),
        }
    }

    pub(crate) fn selects(&self, registered: &Pattern) -> bool {
        registered.matches_candidate(&self.source) || self.query.matches(registered.as_str())
    }
}

/// Emitted name prepared for matching against many patterns.
///
/// The name's regex form (needed only by bidirectional patterns) is compiled
/// lazily and at most once.
pub(crate) struct Candidate<'a> {
    text: &'a str,
    regex: std::cell::OnceCell<Option<Regex>>,
}

impl<'a> Candidate<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self {
            text,
            regex: std::cell::OnceCell::new(),
        }
    }

    fn regex(&self) -> Option<&Regex> {
        self.regex.get_or_init(|| Regex::new(self.text).ok()).as_ref()
    }
}

impl From<&str> for Pattern {
    fn from(s: &str) -> Self {
        Pattern::bidirectional(s)
    }
}

impl From<String> for Pattern {
    fn from(s: String) -> Self {
        Pattern::bidirectional(s)
    }
}

impl From<&Pattern> for Pattern {
    fn from(p: &Pattern) -> Self {
        p.clone()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.as_str() == other.as_str()
    }
}

impl Eq for Pattern {}

impl Hash for Pattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        self.as_str().hash(state);
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.kind(), self.as_str())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
