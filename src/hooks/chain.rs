//! Ordered hook chains for client extension points.
//!
//! Several independent callbacks can be registered against the same
//! extension point. Dispatch runs them in registration order, feeding each
//! one the previous one's output.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::event::models::Hint;

/// Callback signature shared by every extension point.
///
/// `None` in or out means the record has been dropped.
pub type Hook<T> = Arc<dyn Fn(Option<T>, &Hint) -> Option<T> + Send + Sync>;

/// Where a chain is attached on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionPoint {
    BeforeSend,
    BeforeBreadcrumb,
}

impl ExtensionPoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionPoint::BeforeSend => "before_send",
            ExtensionPoint::BeforeBreadcrumb => "before_breadcrumb",
        }
    }
}

impl fmt::Display for ExtensionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hooks registered against one extension point.
pub struct HookChain<T> {
    point: ExtensionPoint,
    hooks: RwLock<Vec<Hook<T>>>,
}

impl<T> HookChain<T> {
    pub fn new(point: ExtensionPoint) -> Self {
        Self {
            point,
            hooks: RwLock::new(Vec::new()),
        }
    }

    pub fn point(&self) -> ExtensionPoint {
        self.point
    }

    /// Append a hook. Hooks are never removed.
    pub fn register<F>(&self, hook: F)
    where
        F: Fn(Option<T>, &Hint) -> Option<T> + Send + Sync + 'static,
    {
        let mut hooks = self.hooks.write();
        hooks.push(Arc::new(hook));
        log::debug!("HOOK_REGISTERED point={} count={}", self.point, hooks.len());
    }

    /// Assignment-style registration: `None` disables nothing and leaves the
    /// chain as it is, `Some` appends.
    pub fn assign<F>(&self, hook: Option<F>)
    where
        F: Fn(Option<T>, &Hint) -> Option<T> + Send + Sync + 'static,
    {
        if let Some(hook) = hook {
            self.register(hook);
        }
    }

    pub fn len(&self) -> usize {
        self.hooks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.read().is_empty()
    }

    /// Run every hook in order.
    ///
    /// `BeforeSend` threads the value through all hooks, even after one has
    /// returned `None`. `BeforeBreadcrumb` stops at the first `None` and the
    /// remaining hooks are not called.
    pub fn dispatch(&self, value: T, hint: &Hint) -> Option<T> {
        // Snapshot so a hook may register further hooks without deadlocking.
        let hooks: Vec<Hook<T>> = self.hooks.read().clone();

        let mut current = Some(value);
        for (index, hook) in hooks.iter().enumerate() {
            current = hook(current, hint);

            if current.is_none() && self.point == ExtensionPoint::BeforeBreadcrumb {
                log::debug!(
                    "HOOK_CHAIN_STOPPED point={} at={} skipped={}",
                    self.point,
                    index,
                    hooks.len() - index - 1
                );
                break;
            }
        }
        current
    }
}

impl<T> fmt::Debug for HookChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookChain")
            .field("point", &self.point)
            .field("hooks", &self.len())
            .finish()
    }
}
