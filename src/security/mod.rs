//! Security module.
//!
//! Provides name matching and masking of sensitive values in events.

pub mod cleaner;
pub mod patterns;
pub mod query_string;

pub use cleaner::*;
pub use patterns::*;
pub use query_string::*;
