//! Structured logging with sanitizer context.
//!
//! Provides logging macros and utilities that include the extension point
//! and event id in every log message for easy correlation.

pub mod structured;

pub use structured::*;
