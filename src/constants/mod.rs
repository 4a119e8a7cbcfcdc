//! Constants used throughout the analyzer

pub mod anchor;
pub mod programs;
