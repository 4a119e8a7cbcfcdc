//! Reverse definitions
//!
//! An account that is not created by the instruction already exists on chain,
//! so whatever it references through `has_one` or its seeds is pinned by it.

use log::debug;
use std::collections::HashSet;

use super::DefinitionAnalyzer;
use crate::constants::anchor::BUMP;
use crate::models::{AccountType, ConnectionType, DefinitionSource, SourceType};

impl DefinitionAnalyzer<'_> {
    /// Second pass; only ever moves accounts from undefined to defined
    pub(super) fn analyze_reverse_definitions(&mut self) {
        let constraints = self.constraints;
        let mut seen = HashSet::new();

        for account in &constraints.accounts {
            if !seen.insert(account.name.as_str()) || account.is_initialized_here() {
                continue;
            }

            let details = format!(
                "Reverse definition: validated by has_one in non-init account '{}'",
                account.name
            );
            for target in &account.has_one {
                self.apply_reverse_definition(
                    target,
                    &account.name,
                    ConnectionType::ContainsAsHasOne,
                    &details,
                );
            }

            if account.account_type == AccountType::AssociatedToken {
                continue;
            }
            let Some(seeds) = &account.seeds else {
                continue;
            };

            let details = format!(
                "Reverse definition: used in seeds of non-init account '{}'",
                account.name
            );
            let bump = seeds.bump.iter().filter(|bump| bump.as_str() != BUMP);
            for expression in seeds.seeds.iter().chain(bump) {
                self.apply_reverse_definition(
                    expression,
                    &account.name,
                    ConnectionType::ContainsAsSeed,
                    &details,
                );
            }
        }
    }

    fn apply_reverse_definition(
        &mut self,
        expression: &str,
        defining_account: &str,
        connection_type: ConnectionType,
        details: &str,
    ) {
        for reference in self.resolver.resolve(expression) {
            if reference.name == defining_account {
                continue;
            }

            if !self.graph.contains(&reference.name) {
                self.graph.add_issue(
                    defining_account,
                    format!(
                        "Account {} for connection {} wasn't found in the graph",
                        reference.name, connection_type
                    ),
                );
                continue;
            }

            self.graph.add_source(
                &reference.name,
                DefinitionSource::new(SourceType::Account, connection_type, defining_account, details)
                    .with_field(reference.field.clone()),
            );
            if self.graph.promote_to_defined(&reference.name) {
                debug!(
                    "{} defined by {} ({})",
                    reference.name, defining_account, connection_type
                );
            }
        }
    }
}
