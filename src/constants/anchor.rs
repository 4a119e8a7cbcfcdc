//! Anchor-specific constants

/// Account names whose identity is fixed by the runtime or by Anchor itself.
pub const DEFAULT_ACCOUNT_NAMES: &[&str] = &[
    "system_program",
    "token_program",
    "associated_token_program",
    "rent",
    "clock",
    "recent_slothashes",
    "instruction_sysvar_account",
];

/// Tokens that are never captured as the field part of a reference.
pub const DEFAULT_EXCLUDED_TOKENS: &[&str] = &[
    "self",
    "ctx",
    "Some",
    "None",
    "Ok",
    "Err",
    "as_ref",
    "to_be_bytes",
    "key",
    "as_bytes",
    "clone",
    "to_string",
    "unwrap",
    "expect",
];

/// Width used when quoting expressions in provenance details.
pub const DEFAULT_DETAIL_WIDTH: usize = 50;

/// Attribute markers
pub const DERIVE_MARKER: &str = "derive";
pub const ACCOUNTS_MARKER: &str = "Accounts";
pub const ACCOUNT_ATTRIBUTE: &str = "account";
pub const INSTRUCTION_ATTRIBUTE: &str = "instruction";

/// Constraint attribute names
pub const MUT: &str = "mut";
pub const INIT: &str = "init";
pub const INIT_IF_NEEDED: &str = "init_if_needed";
pub const SEEDS: &str = "seeds";
pub const BUMP: &str = "bump";
pub const SEEDS_PROGRAM: &str = "seeds::program";
pub const ASSOCIATED_TOKEN_PREFIX: &str = "associated_token::";
pub const ASSOCIATED_TOKEN_MINT: &str = "associated_token::mint";
pub const ASSOCIATED_TOKEN_AUTHORITY: &str = "associated_token::authority";
pub const ASSOCIATED_TOKEN_PROGRAM: &str = "associated_token::token_program";
pub const CONSTRAINT: &str = "constraint";
pub const HAS_ONE: &str = "has_one";
pub const PAYER: &str = "payer";
pub const SPACE: &str = "space";
pub const ADDRESS: &str = "address";
