//! Strategy rule evaluation.

pub mod matcher;

pub use matcher::RuleMatcher;
