//! Typed model of an Anchor `#[derive(Accounts)]` struct

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of an account field, derived from its type and constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Basic,
    Signer,
    Program,
    Interface,
    AssociatedToken,
    SeedsDerived,
    Unknown,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Basic => "basic",
            AccountType::Signer => "signer",
            AccountType::Program => "program",
            AccountType::Interface => "interface",
            AccountType::AssociatedToken => "associated_token",
            AccountType::SeedsDerived => "seeds_derived",
            AccountType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An argument declared with `#[instruction(...)]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionArgument {
    /// Argument name
    pub name: String,
    /// Argument type, as written
    pub type_name: String,
}

/// One entry of an `#[account(...)]` attribute, either a flag or `key = value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintAttribute {
    pub name: String,
    pub value: Option<String>,
}

impl ConstraintAttribute {
    /// A flag such as `mut`
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// A `key = value` entry
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

impl fmt::Display for ConstraintAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} = {}", self.name, value),
            None => f.write_str(&self.name),
        }
    }
}

/// `seeds = [...]`, `bump` and `seeds::program`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedsConstraint {
    /// Seed expressions in declaration order
    pub seeds: Vec<String>,
    /// Bump expression; the literal `bump` when given as a flag
    pub bump: Option<String>,
    /// Program the address is derived for, when not the current one
    pub program: Option<String>,
}

/// `associated_token::*` constraints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociatedTokenConstraint {
    pub mint: Option<String>,
    pub authority: Option<String>,
    pub token_program: Option<String>,
}

impl AssociatedTokenConstraint {
    /// An associated token address needs both the mint and the authority
    pub fn is_defined(&self) -> bool {
        self.mint.is_some() && self.authority.is_some()
    }
}

/// `constraint = <expr> @ <error>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomConstraint {
    pub expression: String,
    pub error_code: Option<String>,
}

impl fmt::Display for CustomConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_code {
            Some(error_code) => write!(f, "constraint = {} @ {}", self.expression, error_code),
            None => write!(f, "constraint = {}", self.expression),
        }
    }
}

/// A single account field of a validation struct
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountField {
    /// Field name
    pub name: String,
    /// Declared type, as written
    pub type_name: String,
    /// Category; set once by the classifier
    pub account_type: AccountType,

    pub is_mut: bool,
    pub is_init: bool,
    pub is_init_if_needed: bool,
    pub seeds: Option<SeedsConstraint>,
    pub associated_token: Option<AssociatedTokenConstraint>,
    pub custom_constraints: Vec<CustomConstraint>,
    /// Targets of `has_one` constraints
    pub has_one: Vec<String>,

    pub payer: Option<String>,
    pub space: Option<String>,
    pub address: Option<String>,

    /// Attributes as parsed, before classification
    pub raw_attributes: Vec<ConstraintAttribute>,

    /// 1-based source line of the field
    pub line_number: Option<usize>,
    /// Trailing `//` comment on the field line
    pub comment: Option<String>,
}

impl AccountField {
    /// Whether the account is created by this instruction
    pub fn is_initialized_here(&self) -> bool {
        self.is_init || self.is_init_if_needed
    }

    /// Well-known accounts such as `system_program` or `rent`
    pub fn is_default_defined(&self, default_accounts: &[String]) -> bool {
        default_accounts.iter().any(|name| *name == self.name)
    }

    /// Seeds only pin an existing account; for `init` they describe the one being created
    pub fn is_defined_by_seeds(&self) -> bool {
        self.seeds.is_some() && !self.is_initialized_here()
    }

    pub fn is_associated_token_defined(&self) -> bool {
        self.account_type == AccountType::AssociatedToken
            && self
                .associated_token
                .as_ref()
                .is_some_and(AssociatedTokenConstraint::is_defined)
    }
}

impl fmt::Display for AccountField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.type_name)?;
        if self.is_mut {
            write!(f, ", mut")?;
        }
        if self.is_init {
            write!(f, ", init")?;
        }
        if self.is_init_if_needed {
            write!(f, ", init_if_needed")?;
        }
        if let Some(seeds) = &self.seeds {
            write!(f, ", seeds=[{}]", seeds.seeds.join(", "))?;
        }
        Ok(())
    }
}

/// A parsed `#[derive(Accounts)]` struct
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    /// Struct identifier
    pub name: String,
    pub instruction_args: Vec<InstructionArgument>,
    /// Account fields in source order
    pub accounts: Vec<AccountField>,

    pub source_file: Option<String>,
    pub line_start: Option<usize>,
    pub line_end: Option<usize>,
}

impl Constraints {
    /// Create an empty struct model
    pub fn new(name: String) -> Self {
        Self {
            name,
            instruction_args: Vec::new(),
            accounts: Vec::new(),
            source_file: None,
            line_start: None,
            line_end: None,
        }
    }

    /// First account with the given name
    pub fn get_account(&self, name: &str) -> Option<&AccountField> {
        self.accounts.iter().find(|account| account.name == name)
    }

    pub fn get_instruction_arg(&self, name: &str) -> Option<&InstructionArgument> {
        self.instruction_args.iter().find(|arg| arg.name == name)
    }
}

