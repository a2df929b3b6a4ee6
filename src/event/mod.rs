//! Event module.
//!
//! Canonical in-memory shapes for the records the sanitizer rewrites.

pub mod models;

pub use models::*;
