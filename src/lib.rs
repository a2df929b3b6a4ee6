//! Event Sanitizer - policy-driven masking of sensitive event data
//!
//! This crate strips sensitive values out of error events and breadcrumbs
//! before a reporting client sends them to a collector. The implementation
//! prioritizes:
//!
//! 1. **Safety** - Matching values are masked at any depth, never leaked
//! 2. **Permissiveness** - Unexpected shapes pass through; masking never fails
//! 3. **Composition** - The sanitizer is one hook among others, not a replacement
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `config` - Masking policy options and the client options hosting them
//! - `security` - Name matchers and the [`Cleaner`]
//! - `hooks` - Ordered hook chains per extension point
//! - `event` - Event, request and breadcrumb models
//! - `logging` - Structured logging with sanitizer context
//!
//! ## Example
//!
//! ```
//! use event_sanitizer::{Cleaner, PolicyConfig};
//! use serde_json::json;
//!
//! let mut policy = PolicyConfig::new();
//! policy.set_fields(["password"]).unwrap();
//! policy.set_query_string(true);
//!
//! let cleaner = Cleaner::new(&policy).unwrap();
//! let event = cleaner.apply_value(json!({
//!     "request": {"query_string": "password=hunter2&page=2"},
//!     "extra": {"password": "hunter2"}
//! }));
//!
//! assert_eq!(event["request"]["query_string"], "password=[FILTERED]&page=2");
//! assert_eq!(event["extra"]["password"], "[FILTERED]");
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod hooks;
pub mod logging;
pub mod security;

pub use config::options::{get_client_options, get_client_options_mut, init, ClientOptions};
pub use config::policy::{HeaderPolicy, PolicyConfig, DEFAULT_MASK};
pub use error::{Result, ValidationError};
pub use event::models::{Breadcrumb, Event, Hint, Request};
pub use hooks::chain::{ExtensionPoint, Hook, HookChain};
pub use security::cleaner::{Cleaner, MaskStats, MAX_DEPTH};
pub use security::patterns::DEFAULT_SENSITIVE_HEADERS;

/// Initialize the `env_logger` backend.
///
/// Safe to call more than once; only the first call installs the logger.
pub fn init_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}
