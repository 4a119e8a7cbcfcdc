//! Definition graph: why each account is (or is not) bound to a known identity

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

use crate::errors::AnalyzerResult;
use crate::models::constraint::AccountType;

/// Status of an account definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionStatus {
    /// Bound to a known identity
    Defined,
    /// Not bound by anything
    Undefined,
    /// Some constraints but possibly incomplete
    PartiallyDefined,
    /// Has constraints but they cannot bind the account
    IncorrectlyDefined,
    /// Ambiguous, needs a human
    NeedsReview,
}

impl DefinitionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefinitionStatus::Defined => "defined",
            DefinitionStatus::Undefined => "undefined",
            DefinitionStatus::PartiallyDefined => "partially_defined",
            DefinitionStatus::IncorrectlyDefined => "incorrectly_defined",
            DefinitionStatus::NeedsReview => "needs_review",
        }
    }

    /// Statuses counted under `needs_review`
    pub fn needs_review(&self) -> bool {
        matches!(
            self,
            DefinitionStatus::NeedsReview
                | DefinitionStatus::PartiallyDefined
                | DefinitionStatus::IncorrectlyDefined
        )
    }
}

impl fmt::Display for DefinitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of entity provides a definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Account,
    InstructionArg,
    Constant,
    Address,
    Default,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Account => "account",
            SourceType::InstructionArg => "instruction_arg",
            SourceType::Constant => "constant",
            SourceType::Address => "address",
            SourceType::Default => "default",
        }
    }
}

/// How the defining entity is connected to the account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionType {
    Seed,
    SeedBump,
    AtMint,
    AtAuthority,
    Custom,
    ContainsAsSeed,
    ContainsAsHasOne,
    Address,
    Default,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::Seed => "seed",
            ConnectionType::SeedBump => "seed_bump",
            ConnectionType::AtMint => "AT_mint",
            ConnectionType::AtAuthority => "AT_authority",
            ConnectionType::Custom => "custom",
            ConnectionType::ContainsAsSeed => "contains_as_seed",
            ConnectionType::ContainsAsHasOne => "contains_as_has_one",
            ConnectionType::Address => "address",
            ConnectionType::Default => "default",
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One piece of provenance for an account
///
/// Serializes as `{ type, name, details }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionSource {
    #[serde(rename = "type")]
    pub source_type: SourceType,
    #[serde(skip)]
    pub connection_type: ConnectionType,
    /// Name of the defining entity
    #[serde(rename = "name")]
    pub source_name: Option<String>,
    /// Field accessed on the defining entity, e.g. `order_hash` in `order.order_hash`
    #[serde(skip)]
    pub source_field_name: Option<String>,
    pub details: String,
}

impl DefinitionSource {
    pub fn new(
        source_type: SourceType,
        connection_type: ConnectionType,
        source_name: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            source_type,
            connection_type,
            source_name: Some(source_name.into()),
            source_field_name: None,
            details: details.into(),
        }
    }

    pub fn with_field(mut self, field: Option<String>) -> Self {
        self.source_field_name = field;
        self
    }
}

impl fmt::Display for DefinitionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source_type.as_str())?;
        if self.source_field_name.is_some() {
            f.write_str("_field")?;
        }
        if let Some(name) = &self.source_name {
            write!(f, ":{}", name)?;
        }
        if let Some(field) = &self.source_field_name {
            write!(f, ".{}", field)?;
        }
        write!(f, " ({})", self.connection_type)
    }
}

/// Analysis result for a single account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountDefinition {
    pub account_name: String,
    pub account_type: AccountType,
    pub status: DefinitionStatus,
    pub defined_by: Vec<DefinitionSource>,
    /// Human-readable diagnostics
    pub issues: Vec<String>,
    #[serde(skip)]
    pub is_inited: bool,
    pub line_number: Option<usize>,
}

impl AccountDefinition {
    /// A fresh, undefined account
    pub fn new(account_name: String, account_type: AccountType, line_number: Option<usize>) -> Self {
        Self {
            account_name,
            account_type,
            status: DefinitionStatus::Undefined,
            defined_by: Vec::new(),
            issues: Vec::new(),
            is_inited: false,
            line_number,
        }
    }

    pub fn add_source(&mut self, source: DefinitionSource) {
        self.defined_by.push(source);
    }

    pub fn add_issue(&mut self, issue: impl Into<String>) {
        self.issues.push(issue.into());
    }
}

/// Counters of a graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total_accounts: usize,
    pub defined: usize,
    pub undefined: usize,
    pub needs_review: usize,
}

/// Complete definition graph for one validation struct
///
/// The counters are updated only through the graph's own methods so they
/// always match the account map.
#[derive(Debug, Clone)]
pub struct DefinitionGraph {
    pub struct_name: String,
    pub source_file: String,
    accounts: Vec<AccountDefinition>,
    index: HashMap<String, usize>,
    pub instruction_args: Vec<String>,
    /// Literal seeds and fixed addresses seen while analyzing
    pub constants: Vec<String>,
    stats: Statistics,
}

impl DefinitionGraph {
    pub fn new(struct_name: String, source_file: String, instruction_args: Vec<String>) -> Self {
        Self {
            struct_name,
            source_file,
            accounts: Vec::new(),
            index: HashMap::new(),
            instruction_args,
            constants: Vec::new(),
            stats: Statistics::default(),
        }
    }

    /// Add an account definition. A second definition with the same name is
    /// ignored; returns whether the definition was added.
    pub fn add_account_definition(&mut self, definition: AccountDefinition) -> bool {
        if self.index.contains_key(&definition.account_name) {
            return false;
        }
        self.count(definition.status);
        self.stats.total_accounts += 1;
        self.index
            .insert(definition.account_name.clone(), self.accounts.len());
        self.accounts.push(definition);
        true
    }

    pub fn get(&self, name: &str) -> Option<&AccountDefinition> {
        self.index.get(name).map(|i| &self.accounts[*i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Accounts in source order
    pub fn accounts(&self) -> impl Iterator<Item = &AccountDefinition> {
        self.accounts.iter()
    }

    /// Append provenance to an account without touching its status
    pub fn add_source(&mut self, name: &str, source: DefinitionSource) -> bool {
        match self.index.get(name) {
            Some(i) => {
                self.accounts[*i].add_source(source);
                true
            }
            None => false,
        }
    }

    pub fn add_issue(&mut self, name: &str, issue: impl Into<String>) -> bool {
        match self.index.get(name) {
            Some(i) => {
                self.accounts[*i].add_issue(issue);
                true
            }
            None => false,
        }
    }

    /// Move an `Undefined` account to `Defined`, dropping its "not defined"
    /// issues. Any other status is left alone. Returns whether the status changed.
    pub fn promote_to_defined(&mut self, name: &str) -> bool {
        let Some(i) = self.index.get(name).copied() else {
            return false;
        };
        let definition = &mut self.accounts[i];
        if definition.status != DefinitionStatus::Undefined {
            return false;
        }
        definition.status = DefinitionStatus::Defined;
        definition
            .issues
            .retain(|issue| !issue.to_lowercase().contains("not defined"));
        self.stats.undefined -= 1;
        self.stats.defined += 1;
        true
    }

    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    pub fn total_accounts(&self) -> usize {
        self.stats.total_accounts
    }

    pub fn defined_count(&self) -> usize {
        self.stats.defined
    }

    pub fn undefined_count(&self) -> usize {
        self.stats.undefined
    }

    pub fn needs_review_count(&self) -> usize {
        self.stats.needs_review
    }

    /// Accounts that are undefined or need review
    pub fn get_undefined_accounts(&self) -> Vec<&AccountDefinition> {
        self.accounts
            .iter()
            .filter(|definition| definition.status != DefinitionStatus::Defined)
            .collect()
    }

    /// Recount statuses from the account map and compare with the counters
    pub fn is_consistent(&self) -> bool {
        let mut recount = Statistics {
            total_accounts: self.accounts.len(),
            ..Statistics::default()
        };
        for definition in &self.accounts {
            match definition.status {
                DefinitionStatus::Defined => recount.defined += 1,
                DefinitionStatus::Undefined => recount.undefined += 1,
                _ => recount.needs_review += 1,
            }
        }
        recount == self.stats
    }

    /// Pretty-printed JSON of this graph alone
    pub fn to_json(&self) -> AnalyzerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn count(&mut self, status: DefinitionStatus) {
        match status {
            DefinitionStatus::Defined => self.stats.defined += 1,
            DefinitionStatus::Undefined => self.stats.undefined += 1,
            _ => self.stats.needs_review += 1,
        }
    }
}

struct OrderedAccounts<'a>(&'a [AccountDefinition]);

impl Serialize for OrderedAccounts<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for definition in self.0 {
            map.serialize_entry(&definition.account_name, definition)?;
        }
        map.end()
    }
}

impl Serialize for DefinitionGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DefinitionGraph", 5)?;
        state.serialize_field("struct_name", &self.struct_name)?;
        state.serialize_field("source_file", &self.source_file)?;
        state.serialize_field("statistics", &self.stats)?;
        state.serialize_field("instruction_args", &self.instruction_args)?;
        state.serialize_field("accounts", &OrderedAccounts(&self.accounts))?;
        state.end()
    }
}
