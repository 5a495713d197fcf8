//! Indicator naming concerns.

pub mod names;
