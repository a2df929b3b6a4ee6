//! Structured logging utilities.
//!
//! Every sanitizer log line is prefixed with the extension point it ran
//! under and, when known, the id of the event being cleaned.

use std::fmt;

use serde_json::{Map, Value};

use crate::event::models::Event;
use crate::hooks::chain::ExtensionPoint;

/// Logging context for one sanitizer invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    pub point: ExtensionPoint,
    pub event_id: Option<String>,
}

impl LogContext {
    pub fn new(point: ExtensionPoint) -> Self {
        Self {
            point,
            event_id: None,
        }
    }

    /// Context for cleaning a typed event before it is sent.
    pub fn for_event(event: &Event) -> Self {
        Self::new(ExtensionPoint::BeforeSend).with_event(&event.id_string())
    }

    /// Context for cleaning an untyped event; its `event_id` is used when it
    /// is a string.
    pub fn for_event_value(event: &Map<String, Value>) -> Self {
        let ctx = Self::new(ExtensionPoint::BeforeSend);
        match event.get("event_id").and_then(Value::as_str) {
            Some(id) => ctx.with_event(id),
            None => ctx,
        }
    }

    pub fn with_event(&self, event_id: &str) -> Self {
        Self {
            point: self.point,
            event_id: Some(event_id.to_string()),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.event_id {
            Some(eid) => write!(f, "[point={}] [event={}]", self.point, eid),
            None => write!(f, "[point={}]", self.point),
        }
    }
}

/// Log an info message with context.
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::info!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}

/// Log a warning message with context.
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::warn!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}

/// Log a debug message with context.
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::debug!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}
