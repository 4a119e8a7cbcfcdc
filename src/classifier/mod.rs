//! Classification of raw `#[account(...)]` entries into a typed account field


use crate::constants::anchor::{
    ADDRESS, ASSOCIATED_TOKEN_AUTHORITY, ASSOCIATED_TOKEN_MINT, ASSOCIATED_TOKEN_PREFIX,
    ASSOCIATED_TOKEN_PROGRAM, BUMP, CONSTRAINT, HAS_ONE, INIT, INIT_IF_NEEDED, MUT, PAYER, SEEDS,
    SEEDS_PROGRAM, SPACE,
};
use crate::extractor::smart_split;
use crate::models::{
    AccountField, AccountType, AssociatedTokenConstraint, ConstraintAttribute, CustomConstraint,
    SeedsConstraint,
};

/// A field as read from the source, before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    pub name: String,
    pub type_name: String,
    pub attributes: Vec<ConstraintAttribute>,
    pub line_number: Option<usize>,
    pub comment: Option<String>,
}

/// Build the typed account field
pub fn classify(raw: RawField) -> AccountField {
    let attributes = raw.attributes;
    let account_type = determine_account_type(&raw.type_name, &attributes);

    let mut payer = None;
    let mut space = None;
    let mut address = None;
    for attr in &attributes {
        let Some(value) = attr.value.as_ref().filter(|value| !value.is_empty()) else {
            continue;
        };
        match attr.name.as_str() {
            PAYER => payer = Some(value.clone()),
            SPACE => space = Some(value.clone()),
            ADDRESS => address = Some(value.clone()),
            _ => {}
        }
    }

    AccountField {
        name: raw.name,
        type_name: raw.type_name,
        account_type,
        is_mut: has_flag(&attributes, MUT),
        is_init: has_flag(&attributes, INIT),
        is_init_if_needed: has_flag(&attributes, INIT_IF_NEEDED),
        seeds: parse_seeds_constraint(&attributes),
        associated_token: parse_associated_token_constraint(&attributes),
        custom_constraints: parse_custom_constraints(&attributes),
        has_one: parse_has_one_constraints(&attributes),
        payer,
        space,
        address,
        raw_attributes: attributes,
        line_number: raw.line_number,
        comment: raw.comment,
    }
}

/// Category of a field; the first matching rule wins
pub fn determine_account_type(type_name: &str, attributes: &[ConstraintAttribute]) -> AccountType {
    if attributes
        .iter()
        .any(|attr| attr.name.starts_with(ASSOCIATED_TOKEN_PREFIX))
    {
        return AccountType::AssociatedToken;
    }
    if attributes.iter().any(|attr| attr.name == SEEDS) {
        return AccountType::SeedsDerived;
    }

    if type_name.contains("Signer") {
        AccountType::Signer
    } else if type_name.contains("Program") {
        AccountType::Program
    } else if type_name.contains("Interface") {
        AccountType::Interface
    } else if type_name.contains("Account") {
        // also covers AccountInfo and AccountLoader
        AccountType::Basic
    } else {
        AccountType::Unknown
    }
}

fn has_flag(attributes: &[ConstraintAttribute], name: &str) -> bool {
    attributes.iter().any(|attr| attr.name == name)
}

/// `seeds`, `bump` and `seeds::program`; absent unless `seeds` has a value
pub fn parse_seeds_constraint(attributes: &[ConstraintAttribute]) -> Option<SeedsConstraint> {
    let mut seeds = None;
    let mut bump = None;
    let mut program = None;

    for attr in attributes {
        match attr.name.as_str() {
            SEEDS => seeds = attr.value.clone(),
            BUMP => bump = Some(attr.value.clone().unwrap_or_else(|| BUMP.to_string())),
            SEEDS_PROGRAM => program = attr.value.clone(),
            _ => {}
        }
    }

    Some(SeedsConstraint {
        seeds: parse_seeds_array(&seeds?),
        bump,
        program,
    })
}

/// Split a `[a, b, c]` seeds array into its expressions
pub fn parse_seeds_array(seeds: &str) -> Vec<String> {
    let seeds = seeds.trim();
    let inner = seeds
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(seeds);

    smart_split(inner, ',')
        .iter()
        .map(|seed| seed.trim())
        .filter(|seed| !seed.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_associated_token_constraint(
    attributes: &[ConstraintAttribute],
) -> Option<AssociatedTokenConstraint> {
    let mut constraint = AssociatedTokenConstraint::default();

    for attr in attributes {
        match attr.name.as_str() {
            ASSOCIATED_TOKEN_MINT => constraint.mint = attr.value.clone(),
            ASSOCIATED_TOKEN_AUTHORITY => constraint.authority = attr.value.clone(),
            ASSOCIATED_TOKEN_PROGRAM => constraint.token_program = attr.value.clone(),
            _ => {}
        }
    }

    if constraint == AssociatedTokenConstraint::default() {
        None
    } else {
        Some(constraint)
    }
}

/// `constraint = <expr> @ <error>` entries, split on the first `@`
pub fn parse_custom_constraints(attributes: &[ConstraintAttribute]) -> Vec<CustomConstraint> {
    attributes
        .iter()
        .filter(|attr| attr.name == CONSTRAINT)
        .filter_map(|attr| attr.value.as_deref().filter(|value| !value.is_empty()))
        .map(|value| match value.split_once('@') {
            Some((expression, error_code)) => CustomConstraint {
                expression: expression.trim().to_string(),
                error_code: Some(error_code.trim().to_string()),
            },
            None => CustomConstraint {
                expression: value.to_string(),
                error_code: None,
            },
        })
        .collect()
}

pub fn parse_has_one_constraints(attributes: &[ConstraintAttribute]) -> Vec<String> {
    attributes
        .iter()
        .filter(|attr| attr.name == HAS_ONE)
        .filter_map(|attr| attr.value.clone().filter(|value| !value.is_empty()))
        .collect()
}
