//! Core application primitives (HTTP surface, worker runtime)

pub mod http;
pub mod runtime;

pub use http::*;
pub use runtime::*;
