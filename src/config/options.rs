//! Client options the sanitizer plugs into.
//!
//! The reporting client owns one [`ClientOptions`]. It exposes the masking
//! policy as `sanitize` and one [`HookChain`] per extension point; the
//! sanitizer installs itself by registering a hook on each chain rather than
//! replacing whatever the host already registered.

use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::policy::PolicyConfig;
use crate::error::Result;
use crate::event::models::{Breadcrumb, Event, Hint};
use crate::hooks::chain::{ExtensionPoint, HookChain};
use crate::log_info;
use crate::logging::structured::LogContext;
use crate::security::cleaner::Cleaner;

/// Options of a reporting client.
#[derive(Debug)]
pub struct ClientOptions {
    pub sanitize: PolicyConfig,
    pub before_send: HookChain<Event>,
    pub before_breadcrumb: HookChain<Breadcrumb>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            sanitize: PolicyConfig::new(),
            before_send: HookChain::new(ExtensionPoint::BeforeSend),
            before_breadcrumb: HookChain::new(ExtensionPoint::BeforeBreadcrumb),
        }
    }
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cleaner built from `sanitize` on both chains.
    ///
    /// Does nothing and returns `Ok(false)` when the policy was never
    /// configured.
    pub fn install_sanitizer(&self) -> Result<bool> {
        if !self.sanitize.configured() {
            log::debug!("SANITIZER_SKIPPED reason=not_configured");
            return Ok(false);
        }

        let cleaner = Arc::new(Cleaner::new(&self.sanitize)?);

        let event_cleaner = cleaner.clone();
        self.before_send
            .register(move |event: Option<Event>, _: &Hint| event.map(|e| event_cleaner.apply_event(e)));

        self.before_breadcrumb.register(move |crumb: Option<Breadcrumb>, _: &Hint| {
            crumb.map(|c| cleaner.apply_breadcrumb(c))
        });

        let chains = [
            (self.before_send.point(), self.before_send.len()),
            (self.before_breadcrumb.point(), self.before_breadcrumb.len()),
        ];
        for (point, hooks) in chains {
            log_info!(
                LogContext::new(point),
                "SANITIZER_INSTALLED",
                hooks = hooks,
                fields = self.sanitize.fields().len(),
                cookies = self.sanitize.cookies(),
                query_string = self.sanitize.query_string(),
            );
        }
        Ok(true)
    }

    /// Run the before-send chain on an event.
    pub fn process_event(&self, event: Event, hint: &Hint) -> Option<Event> {
        self.before_send.dispatch(event, hint)
    }

    /// Run the before-breadcrumb chain on a breadcrumb.
    pub fn process_breadcrumb(&self, breadcrumb: Breadcrumb, hint: &Hint) -> Option<Breadcrumb> {
        self.before_breadcrumb.dispatch(breadcrumb, hint)
    }
}

// Process-wide client options
lazy_static! {
    static ref CLIENT_OPTIONS: RwLock<ClientOptions> = RwLock::new(ClientOptions::new());
}

/// Get a read-only reference to the global client options.
pub fn get_client_options() -> RwLockReadGuard<'static, ClientOptions> {
    CLIENT_OPTIONS.read()
}

/// Get a mutable reference to the global client options.
pub fn get_client_options_mut() -> RwLockWriteGuard<'static, ClientOptions> {
    CLIENT_OPTIONS.write()
}

/// Replace the global options with freshly configured ones and install the
/// sanitizer on them.
///
/// Also installs the `env_logger` backend if no logger is set yet.
///
/// `configure` runs against a new [`ClientOptions`]; any error it returns, or
/// any error building the cleaner, leaves the previous global options in
/// place.
pub fn init<F>(configure: F) -> Result<()>
where
    F: FnOnce(&mut ClientOptions) -> Result<()>,
{
    crate::init_logger();

    let mut options = ClientOptions::new();
    configure(&mut options)?;
    options.install_sanitizer()?;

    *get_client_options_mut() = options;
    Ok(())
}
