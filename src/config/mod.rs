//! Configuration module.
//!
//! Provides the masking policy and the client options it is attached to:
//! - Policy options with shape validation
//! - Hook chains per extension point
//! - Process-wide client options

pub mod options;
pub mod policy;

pub use options::*;
pub use policy::*;
