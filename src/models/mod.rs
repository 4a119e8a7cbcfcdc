//! Data models for account validation structs and their definition graphs

pub mod constraint;
pub mod definition;

pub use self::constraint::{
    AccountField, AccountType, AssociatedTokenConstraint, ConstraintAttribute, Constraints,
    CustomConstraint, InstructionArgument, SeedsConstraint,
};
pub use self::definition::{
    AccountDefinition, ConnectionType, DefinitionGraph, DefinitionSource, DefinitionStatus,
    SourceType, Statistics,
};
