//! crates/logging/src/thread_local.rs
//! Thread-local storage for verbosity configuration and event collection.

use super::config::VerbosityConfig;
use super::levels::DiagFlag;
use std::cell::RefCell;

thread_local! {
    static VERBOSITY: RefCell<VerbosityConfig> = RefCell::new(VerbosityConfig::default());
    #[allow(clippy::missing_const_for_thread_local)]
    static EVENTS: RefCell<Vec<DiagnosticEvent>> = RefCell::new(Vec::new());
}

/// Diagnostic event collected during execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticEvent {
    /// Level-gated debug diagnostic.
    Debug {
        /// The category.
        flag: DiagFlag,
        /// The verbosity level the event was emitted at.
        level: u8,
        /// The diagnostic message.
        message: String,
    },
    /// Warning; recorded regardless of the configured levels.
    Warning {
        /// The category.
        flag: DiagFlag,
        /// The diagnostic message.
        message: String,
    },
}

impl DiagnosticEvent {
    /// Category of the event.
    #[must_use]
    pub const fn flag(&self) -> DiagFlag {
        match self {
            Self::Debug { flag, .. } | Self::Warning { flag, .. } => *flag,
        }
    }

    /// Message carried by the event.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Debug { message, .. } | Self::Warning { message, .. } => message,
        }
    }
}

/// Initialize verbosity configuration for the current thread.
pub fn init(config: VerbosityConfig) {
    VERBOSITY.with(|v| {
        *v.borrow_mut() = config;
    });
}

/// Check if the category is at or above the specified level.
pub fn diag_gte(flag: DiagFlag, level: u8) -> bool {
    VERBOSITY.with(|v| v.borrow().levels.get(flag) >= level)
}

/// Record a debug diagnostic event.
pub fn emit_debug(flag: DiagFlag, level: u8, message: String) {
    #[cfg(feature = "tracing")]
    super::tracing_bridge::forward(flag, false, &message);

    EVENTS.with(|e| {
        e.borrow_mut().push(DiagnosticEvent::Debug {
            flag,
            level,
            message,
        });
    });
}

/// Record a warning diagnostic event.
pub fn emit_warning(flag: DiagFlag, message: String) {
    #[cfg(feature = "tracing")]
    super::tracing_bridge::forward(flag, true, &message);

    EVENTS.with(|e| {
        e.borrow_mut()
            .push(DiagnosticEvent::Warning { flag, message });
    });
}

/// Drain all collected events, clearing the internal buffer.
pub fn drain_events() -> Vec<DiagnosticEvent> {
    EVENTS.with(|e| e.borrow_mut().drain(..).collect())
}

/// Apply a flag token to the current configuration.
pub fn apply_flag(token: &str) -> Result<(), String> {
    VERBOSITY.with(|v| v.borrow_mut().apply_flag(token))
}
