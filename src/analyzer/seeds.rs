//! Seeds analysis

use std::collections::HashSet;

use super::{truncate, DefinitionAnalyzer};
use crate::constants::anchor::BUMP;
use crate::models::{
    AccountDefinition, ConnectionType, DefinitionSource, DefinitionStatus, SeedsConstraint,
    SourceType,
};
use crate::resolver::Reference;

impl DefinitionAnalyzer<'_> {
    /// Resolve every seed and the bump against the struct's accounts and
    /// instruction arguments
    pub(super) fn analyze_seeds(&mut self, seeds: &SeedsConstraint, definition: &mut AccountDefinition) {
        let width = self.config.detail_width;
        let mut all_sources_valid = true;
        let mut added: HashSet<Reference> = HashSet::new();

        for seed in &seeds.seeds {
            let references = self.resolver.resolve(seed);
            if references.is_empty() {
                self.add_constant(definition, seed, ConnectionType::Seed, "Constant seed value");
                continue;
            }

            let details = format!("Referenced in seed: {}", truncate(seed, width));
            for reference in references {
                if added.contains(&reference) {
                    continue;
                }
                match self.seed_source_type(&reference.name) {
                    Some(source_type) => {
                        definition.add_source(
                            DefinitionSource::new(
                                source_type,
                                ConnectionType::Seed,
                                &reference.name,
                                details.clone(),
                            )
                            .with_field(reference.field.clone()),
                        );
                        added.insert(reference);
                    }
                    None => {
                        all_sources_valid = false;
                        definition.add_issue(format!("Unknown reference '{}' in seeds", reference.name));
                    }
                }
            }
        }

        if let Some(bump) = &seeds.bump {
            let references = self.resolver.resolve(bump);
            if references.is_empty() {
                self.add_constant(definition, bump, ConnectionType::SeedBump, "Constant seed bump value");
            } else {
                let details = format!("Referenced in seed_bump: {}", truncate(bump, width));
                for reference in references.into_iter().filter(|r| r.name != BUMP) {
                    match self.seed_source_type(&reference.name) {
                        Some(source_type) => definition.add_source(
                            DefinitionSource::new(
                                source_type,
                                ConnectionType::SeedBump,
                                reference.name,
                                details.clone(),
                            )
                            .with_field(reference.field),
                        ),
                        None => {
                            all_sources_valid = false;
                            definition
                                .add_issue(format!("Unknown reference '{}' in seed bump", reference.name));
                        }
                    }
                }
            }
        }

        definition.status = if definition.defined_by.is_empty() {
            definition.add_issue("Seeds constraint present but no valid sources found");
            DefinitionStatus::Undefined
        } else if all_sources_valid {
            DefinitionStatus::Defined
        } else {
            DefinitionStatus::NeedsReview
        };
    }

    /// Record a literal seed or bump as a constant
    fn add_constant(
        &mut self,
        definition: &mut AccountDefinition,
        expression: &str,
        connection_type: ConnectionType,
        details: &str,
    ) {
        let name = truncate(expression, self.config.detail_width).replace('"', "'");
        definition.add_source(DefinitionSource::new(
            SourceType::Constant,
            connection_type,
            name.clone(),
            details,
        ));
        self.constants.insert(name);
    }
}
