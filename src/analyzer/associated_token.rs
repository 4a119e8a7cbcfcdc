//! Associated token account analysis

use super::DefinitionAnalyzer;
use crate::models::{
    AccountDefinition, AssociatedTokenConstraint, ConnectionType, DefinitionSource,
    DefinitionStatus, SourceType,
};

impl DefinitionAnalyzer<'_> {
    /// An associated token address is derived from its mint and authority,
    /// so both must be present and point at accounts of the struct
    pub(super) fn analyze_associated_token(
        &self,
        constraint: Option<&AssociatedTokenConstraint>,
        definition: &mut AccountDefinition,
    ) {
        let Some(constraint) = constraint else {
            definition.status = DefinitionStatus::IncorrectlyDefined;
            definition.add_issue("Marked as associated token but missing associated_token constraints");
            return;
        };

        match &constraint.mint {
            Some(mint) => self.resolve_derivation_input(
                mint,
                ConnectionType::AtMint,
                "Associated token mint",
                "Mint",
                definition,
            ),
            None => definition.add_issue("Missing 'associated_token::mint' constraint"),
        }

        match &constraint.authority {
            Some(authority) => self.resolve_derivation_input(
                authority,
                ConnectionType::AtAuthority,
                "Associated token authority",
                "Authority",
                definition,
            ),
            None => definition.add_issue("Missing 'associated_token::authority' constraint"),
        }

        definition.status = match (constraint.is_defined(), definition.issues.is_empty()) {
            (true, true) => DefinitionStatus::Defined,
            (true, false) => DefinitionStatus::NeedsReview,
            (false, _) => DefinitionStatus::IncorrectlyDefined,
        };
    }

    /// The first reference naming a known account becomes provenance
    fn resolve_derivation_input(
        &self,
        expression: &str,
        connection_type: ConnectionType,
        details: &str,
        label: &str,
        definition: &mut AccountDefinition,
    ) {
        let found = self
            .resolver
            .resolve(expression)
            .into_iter()
            .find(|reference| self.is_known_account(&reference.name));

        match found {
            Some(reference) => definition.add_source(
                DefinitionSource::new(SourceType::Account, connection_type, reference.name, details)
                    .with_field(reference.field),
            ),
            None => definition.add_issue(format!(
                "{} reference '{}' not found in accounts",
                label, expression
            )),
        }
    }
}
