//! A library for building account definition graphs of Anchor programs
//!
//! For every `#[derive(Accounts)]` struct in a source file, the crate works
//! out which accounts are pinned to a known identity (by seeds, an associated
//! token derivation, a fixed address, a `has_one` relation, ...) and which
//! ones a caller could substitute freely.

pub mod analyzer;
pub mod classifier;
pub mod config;
pub mod constants;
pub mod errors;
pub mod extractor;
pub mod models;
pub mod report;
pub mod resolver;
pub mod syntax;

use log::info;
use std::fs;
use std::path::Path;

use crate::analyzer::analyze_all;
use crate::config::AnalyzerConfig;
use crate::errors::{AnalyzerError, AnalyzerResult, ErrorContext, ErrorExt};
use crate::extractor::ConstraintExtractor;
use crate::models::{Constraints, DefinitionGraph};
use crate::syntax::SyntaxTree;

/// Extract every validation struct from source text
pub fn extract_constraints(source: &str, source_file: &str) -> AnalyzerResult<Vec<Constraints>> {
    let tree = SyntaxTree::parse(source).with_context(ErrorContext {
        source_file: Some(source_file.to_string()),
        component: "syntax".to_string(),
        operation: "parse_source".to_string(),
        details: None,
    })?;
    Ok(ConstraintExtractor::new(&tree, source_file).extract_all_constraints())
}

/// Build the definition graph of every validation struct in source text
///
/// Source without any `#[derive(Accounts)]` struct is an error.
pub fn analyze_source(
    source: &str,
    source_file: &str,
    config: &AnalyzerConfig,
) -> AnalyzerResult<Vec<DefinitionGraph>> {
    let constraints = extract_constraints(source, source_file)?;
    if constraints.is_empty() {
        return Err(AnalyzerError::NoConstraintStructs(source_file.to_string()));
    }
    Ok(analyze_all(&constraints, config))
}

/// Read and analyze a source file
pub fn analyze_file(path: &Path, config: &AnalyzerConfig) -> AnalyzerResult<Vec<DefinitionGraph>> {
    let source_file = path.display().to_string();
    info!("Analyzing {}", source_file);

    let source = fs::read_to_string(path).with_context(ErrorContext {
        source_file: Some(source_file.clone()),
        component: "io".to_string(),
        operation: "read_source".to_string(),
        details: None,
    })?;
    analyze_source(&source, &source_file, config)
}

/// Version of the analyzer
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
