//! Human-readable summaries and JSON reports of definition graphs

use anyhow::{Context, Result};
use log::{debug, info};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::errors::AnalyzerResult;
use crate::models::{DefinitionGraph, DefinitionSource, DefinitionStatus};

const RULE_WIDTH: usize = 80;

/// Render the analysis summary of one graph
pub fn summary(graph: &DefinitionGraph) -> String {
    Summary(graph).to_string()
}

/// Text summary of one graph
pub struct Summary<'a>(pub &'a DefinitionGraph);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let graph = self.0;
        let rule = "=".repeat(RULE_WIDTH);

        writeln!(f, "\n{}", rule)?;
        writeln!(f, "DEFINITION ANALYSIS: {}", graph.struct_name)?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Source: {}", graph.source_file)?;
        writeln!(f, "\nStatistics:")?;
        writeln!(f, "  Total accounts: {}", graph.total_accounts())?;
        writeln!(f, "  Properly defined: {}", graph.defined_count())?;
        writeln!(
            f,
            "  Undefined/Need review: {}",
            graph.undefined_count() + graph.needs_review_count()
        )?;

        if !graph.instruction_args.is_empty() {
            writeln!(f, "\nInstruction Arguments: {}", graph.instruction_args.join(", "))?;
        }

        let problematic = graph.get_undefined_accounts();
        if !problematic.is_empty() {
            writeln!(f, "\nACCOUNTS NEEDING MANUAL REVIEW ({}):", problematic.len())?;
            writeln!(f, "{}", rule)?;
            for definition in problematic {
                writeln!(
                    f,
                    "\n  {} [{}] (line {})",
                    definition.account_name,
                    definition.status,
                    line(definition.line_number)
                )?;
                if definition.defined_by.is_empty() {
                    writeln!(f, "    Not defined by anything")?;
                } else {
                    write_sources(f, &definition.defined_by)?;
                }
                if !definition.issues.is_empty() {
                    writeln!(f, "    Issues:")?;
                    for issue in &definition.issues {
                        writeln!(f, "      - {}", issue)?;
                    }
                }
            }
        }

        writeln!(f, "\nPROPERLY DEFINED ACCOUNTS ({}):", graph.defined_count())?;
        writeln!(f, "{}", rule)?;
        for definition in graph
            .accounts()
            .filter(|definition| definition.status == DefinitionStatus::Defined)
        {
            writeln!(
                f,
                "\n  {} (line {})",
                definition.account_name,
                line(definition.line_number)
            )?;
            if !definition.defined_by.is_empty() {
                write_sources(f, &definition.defined_by)?;
            }
        }
        Ok(())
    }
}

fn write_sources(f: &mut fmt::Formatter<'_>, sources: &[DefinitionSource]) -> fmt::Result {
    writeln!(f, "    Defined by:")?;
    for source in sources {
        writeln!(f, "      - {}", source)?;
    }
    Ok(())
}

fn line(line_number: Option<usize>) -> String {
    line_number.map_or_else(|| "?".to_string(), |line| line.to_string())
}

/// Pretty-printed JSON array of the graphs
pub fn to_json(graphs: &[DefinitionGraph]) -> AnalyzerResult<String> {
    // local import: `anyhow::Context` also has a `with_context`
    use crate::errors::ErrorExt;

    serde_json::to_string_pretty(graphs).with_simple_context("report", "to_json")
}

/// Write the graphs as a pretty-printed JSON array, creating parent directories
pub fn save_graphs(graphs: &[DefinitionGraph], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            info!("Creating directory: {}", parent.display());
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    let json = to_json(graphs).context("Failed to serialize definition graphs")?;
    debug!("Serialized {} graph(s) ({} bytes)", graphs.len(), json.len());

    fs::write(path, json.as_bytes())
        .with_context(|| format!("Failed to write report: {}", path.display()))?;

    info!("Definition graphs saved to {}", path.display());
    Ok(())
}
