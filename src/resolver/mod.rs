//! Heuristic extraction of account and argument references from expressions
//!
//! Constraint expressions are arbitrary Rust, so the resolver does not parse
//! them. It looks for lowercase identifiers and, when an identifier is followed
//! by `.ident`, records the accessed field unless that field is a helper such
//! as `key` or `as_ref`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::config::AnalyzerConfig;
use crate::constants::anchor::DEFAULT_EXCLUDED_TOKENS;

static REFERENCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([a-z_][a-z0-9_]*)(\.|\s|$)([a-z_][a-z0-9_]*)?")
        .expect("reference pattern is a valid regex")
});

/// An identifier found in an expression, with the field accessed on it
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reference {
    pub name: String,
    pub field: Option<String>,
}

impl Reference {
    pub fn new(name: impl Into<String>, field: Option<&str>) -> Self {
        Self {
            name: name.into(),
            field: field.map(str::to_string),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}.{}", self.name, field),
            None => f.write_str(&self.name),
        }
    }
}

/// Resolves references with a configurable set of excluded field tokens
#[derive(Debug, Clone)]
pub struct ReferenceResolver {
    excluded: HashSet<String>,
}

impl Default for ReferenceResolver {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_TOKENS.iter().copied())
    }
}

impl ReferenceResolver {
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.excluded_tokens.iter().cloned())
    }

    pub fn is_excluded(&self, token: &str) -> bool {
        self.excluded.contains(token)
    }

    /// All references in `expression`, ordered by name then field
    pub fn resolve(&self, expression: &str) -> BTreeSet<Reference> {
        REFERENCE_PATTERN
            .captures_iter(expression)
            .filter_map(|captures| {
                let name = captures.get(1)?.as_str();
                let field = match (captures.get(2), captures.get(3)) {
                    (Some(separator), Some(field))
                        if separator.as_str() == "." && !self.is_excluded(field.as_str()) =>
                    {
                        Some(field.as_str())
                    }
                    _ => None,
                };
                Some(Reference::new(name, field))
            })
            .collect()
    }
}
