//! Hook module.
//!
//! Lets several independent callbacks share one client extension point.

pub mod chain;

pub use chain::*;
