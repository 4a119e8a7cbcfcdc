//! Definition graph analysis for a single validation struct
//!
//! The analysis runs in two passes. The first pass classifies every account on
//! its own constraints, in a fixed priority order. The second pass looks at
//! the accounts that are *not* created by the instruction and marks the
//! accounts they point to (through `has_one` or seeds) as defined.

mod associated_token;
mod reverse;
mod seeds;
#[cfg(test)]
mod tests;

use log::{debug, info, warn};
use solana_pubkey::Pubkey;
use std::collections::{BTreeSet, HashSet};
use std::str::FromStr;

use crate::config::AnalyzerConfig;
use crate::constants::programs::known_program_name;
use crate::models::{
    AccountDefinition, AccountField, AccountType, ConnectionType, Constraints, DefinitionGraph,
    DefinitionSource, DefinitionStatus, SourceType,
};
use crate::resolver::ReferenceResolver;

/// Builds the definition graph of one `Constraints` value
///
/// An analyzer is used once: [`DefinitionAnalyzer::analyze`] consumes it and
/// returns the graph.
pub struct DefinitionAnalyzer<'a> {
    constraints: &'a Constraints,
    config: &'a AnalyzerConfig,
    resolver: ReferenceResolver,
    known_accounts: HashSet<&'a str>,
    known_instruction_args: HashSet<&'a str>,
    graph: DefinitionGraph,
    constants: BTreeSet<String>,
}

impl<'a> DefinitionAnalyzer<'a> {
    pub fn new(constraints: &'a Constraints, config: &'a AnalyzerConfig) -> Self {
        let graph = DefinitionGraph::new(
            constraints.name.clone(),
            constraints
                .source_file
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            constraints
                .instruction_args
                .iter()
                .map(|arg| arg.name.clone())
                .collect(),
        );

        Self {
            constraints,
            config,
            resolver: ReferenceResolver::from_config(config),
            known_accounts: constraints
                .accounts
                .iter()
                .map(|account| account.name.as_str())
                .collect(),
            known_instruction_args: constraints
                .instruction_args
                .iter()
                .map(|arg| arg.name.as_str())
                .collect(),
            graph,
            constants: BTreeSet::new(),
        }
    }

    /// Run both passes and return the graph
    pub fn analyze(mut self) -> DefinitionGraph {
        self.analyze_accounts();
        self.analyze_reverse_definitions();

        self.graph.constants = std::mem::take(&mut self.constants).into_iter().collect();
        info!(
            "Analyzed {}: {} accounts, {} defined, {} undefined, {} need review",
            self.graph.struct_name,
            self.graph.total_accounts(),
            self.graph.defined_count(),
            self.graph.undefined_count(),
            self.graph.needs_review_count()
        );
        self.graph
    }

    /// First pass: classify every account on its own constraints
    fn analyze_accounts(&mut self) {
        let constraints = self.constraints;
        for account in &constraints.accounts {
            if self.graph.contains(&account.name) {
                warn!(
                    "Duplicate account '{}' in {}, keeping the first declaration",
                    account.name, constraints.name
                );
                continue;
            }
            let definition = self.analyze_account(account);
            debug!("{} -> {}", definition.account_name, definition.status);
            self.graph.add_account_definition(definition);
        }
    }

    fn analyze_account(&mut self, account: &AccountField) -> AccountDefinition {
        let mut definition = AccountDefinition::new(
            account.name.clone(),
            account.account_type,
            account.line_number,
        );
        definition.is_inited = account.is_initialized_here();

        if account.is_default_defined(&self.config.default_accounts) {
            definition.add_source(DefinitionSource::new(
                SourceType::Default,
                ConnectionType::Default,
                &account.name,
                "System program or standard account",
            ));
            definition.status = DefinitionStatus::Defined;
            return definition;
        }

        if let Some(address) = &account.address {
            self.analyze_address(address, &mut definition);
            return definition;
        }

        match &account.seeds {
            Some(seeds) if account.is_defined_by_seeds() => {
                self.analyze_seeds(seeds, &mut definition);
                return definition;
            }
            _ => {}
        }

        if account.account_type == AccountType::AssociatedToken {
            self.analyze_associated_token(account.associated_token.as_ref(), &mut definition);
            return definition;
        }

        if !account.custom_constraints.is_empty() {
            self.analyze_custom_constraints(account, &mut definition);
            if !definition.defined_by.is_empty() {
                return definition;
            }
        }

        if account.is_initialized_here() {
            self.analyze_initialized_account(account, &mut definition);
            return definition;
        }

        definition.status = DefinitionStatus::Undefined;
        definition.add_issue("Account is not defined by any constraints");
        definition
    }

    fn analyze_address(&mut self, address: &str, definition: &mut AccountDefinition) {
        let mut details = "Fixed address constraint".to_string();
        if let Some(literal) = quoted_literal(address) {
            match Pubkey::from_str(literal) {
                Ok(pubkey) => {
                    if let Some(name) = known_program_name(&pubkey) {
                        details = format!("Fixed address constraint ({})", name);
                    }
                }
                Err(_) => definition.add_issue(format!(
                    "Address literal '{}' is not a valid public key",
                    literal
                )),
            }
        }

        definition.add_source(DefinitionSource::new(
            SourceType::Address,
            ConnectionType::Address,
            address,
            details,
        ));
        definition.status = DefinitionStatus::Defined;
        self.constants.insert(address.to_string());
    }

    fn analyze_custom_constraints(&self, account: &AccountField, definition: &mut AccountDefinition) {
        for constraint in &account.custom_constraints {
            let details = format!(
                "Custom constraint: {}",
                truncate(&constraint.expression, self.config.detail_width)
            );
            for reference in self.resolver.resolve(&constraint.expression) {
                if reference.name == account.name || !self.is_known_account(&reference.name) {
                    continue;
                }
                definition.add_source(
                    DefinitionSource::new(
                        SourceType::Account,
                        ConnectionType::Custom,
                        reference.name,
                        details.clone(),
                    )
                    .with_field(reference.field),
                );
            }
        }

        if !definition.defined_by.is_empty() {
            definition.status = DefinitionStatus::NeedsReview;
            definition.add_issue("Defined only by custom constraints - needs manual verification");
        }
    }

    /// Accounts created by the instruction must be pinned by seeds or an associated token
    fn analyze_initialized_account(&mut self, account: &AccountField, definition: &mut AccountDefinition) {
        if let Some(seeds) = &account.seeds {
            self.analyze_seeds(seeds, definition);
            if definition.status == DefinitionStatus::Defined {
                return;
            }
        }

        if account.account_type == AccountType::AssociatedToken {
            self.analyze_associated_token(account.associated_token.as_ref(), definition);
            if definition.status == DefinitionStatus::Defined {
                return;
            }
        }

        if definition.defined_by.is_empty() {
            definition.status = DefinitionStatus::IncorrectlyDefined;
            definition.add_issue(
                "Account has init/init_if_needed but no seeds or associated_token constraints",
            );
        }
    }

    fn is_known_account(&self, name: &str) -> bool {
        self.known_accounts.contains(name)
    }

    /// Source type of a seed reference, if it names an account or an instruction argument
    fn seed_source_type(&self, name: &str) -> Option<SourceType> {
        if self.known_accounts.contains(name) {
            Some(SourceType::Account)
        } else if self.known_instruction_args.contains(name) {
            Some(SourceType::InstructionArg)
        } else {
            None
        }
    }
}

/// Analyze every validation struct of a file
pub fn analyze_all(constraints: &[Constraints], config: &AnalyzerConfig) -> Vec<DefinitionGraph> {
    constraints
        .iter()
        .map(|constraints| DefinitionAnalyzer::new(constraints, config).analyze())
        .collect()
}

/// First `width` characters of `text`
pub(crate) fn truncate(text: &str, width: usize) -> &str {
    match text.char_indices().nth(width) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// Content of the first `"..."` literal in an expression
fn quoted_literal(expression: &str) -> Option<&str> {
    let start = expression.find('"')? + 1;
    let end = start + expression[start..].find('"')?;
    Some(&expression[start..end])
}
