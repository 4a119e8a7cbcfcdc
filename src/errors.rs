//! Error handling for the account definition analyzer.
//!
//! Malformed constraint text never produces an error: the analysis degrades
//! locally and records issues on the affected accounts instead. The errors
//! in this module belong to the collaborators around the core, such as
//! reading a source file, parsing it, or loading a configuration.

use std::fmt;
use thiserror::Error;

/// Main error type for the analyzer.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// The source text could not be parsed into a syntax tree.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Errors related to file I/O, such as file not found or permission denied.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing a report failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The analyzer configuration is invalid or unreadable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A source file contains no `#[derive(Accounts)]` struct.
    #[error("No constraint structs found in {0}")]
    NoConstraintStructs(String),

    /// Fallback for other errors that don't fit into the above categories.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<serde_json::Error> for AnalyzerError {
    fn from(err: serde_json::Error) -> Self {
        AnalyzerError::Serialization(err.to_string())
    }
}

/// Result type alias for the analyzer.
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

/// Context information for errors.
///
/// Describes where an error occurred: the source file being analyzed (if
/// any), the component and the operation in progress.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Source file being analyzed, if applicable.
    pub source_file: Option<String>,

    /// Component where the error occurred (e.g., "syntax").
    pub component: String,

    /// Operation being performed when the error occurred (e.g., "parse_file").
    pub operation: String,

    /// Additional context details.
    pub details: Option<String>,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "In {} while {}", self.component, self.operation)?;
        if let Some(source_file) = &self.source_file {
            write!(f, " for {}", source_file)?;
        }
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorExt<T> {
    /// Add detailed context to an error.
    fn with_context(self, context: ErrorContext) -> AnalyzerResult<T>;

    /// Add the component and operation to an error.
    fn with_simple_context(self, component: &str, operation: &str) -> AnalyzerResult<T>;
}

impl<T, E: std::error::Error + 'static> ErrorExt<T> for Result<T, E> {
    fn with_context(self, context: ErrorContext) -> AnalyzerResult<T> {
        self.map_err(|e| {
            let error_msg = format!("{}: {}", context, e);
            let e: Box<dyn std::error::Error + 'static> = Box::new(e);
            if let Some(io_err) = e.downcast_ref::<std::io::Error>() {
                return AnalyzerError::Io(std::io::Error::new(io_err.kind(), error_msg));
            }
            match e.downcast::<AnalyzerError>() {
                Ok(analyzer_err) => match *analyzer_err {
                    AnalyzerError::Parse(_) => AnalyzerError::Parse(error_msg),
                    AnalyzerError::Config(_) => AnalyzerError::Config(error_msg),
                    AnalyzerError::Serialization(_) => AnalyzerError::Serialization(error_msg),
                    other => other,
                },
                Err(_) => match context.component.as_str() {
                    "syntax" => AnalyzerError::Parse(error_msg),
                    "config" => AnalyzerError::Config(error_msg),
                    "report" => AnalyzerError::Serialization(error_msg),
                    _ => AnalyzerError::Unknown(error_msg),
                },
            }
        })
    }

    fn with_simple_context(self, component: &str, operation: &str) -> AnalyzerResult<T> {
        self.with_context(ErrorContext {
            source_file: None,
            component: component.to_string(),
            operation: operation.to_string(),
            details: None,
        })
    }
}
