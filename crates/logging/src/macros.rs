//! crates/logging/src/macros.rs
//! Level-gated diagnostic macros.

/// Record a debug diagnostic when the category is at or above `level`.
///
/// The message is only formatted when it will be recorded.
///
/// # Example
/// ```
/// use logging::{debug_log, drain_events, init, VerbosityConfig};
///
/// let mut config = VerbosityConfig::default();
/// config.levels.access = 1;
/// init(config);
///
/// debug_log!(Access, 1, "granted {:#x}", 0x20);
/// debug_log!(Access, 2, "suppressed");
/// assert_eq!(drain_events().len(), 1);
/// ```
#[macro_export]
macro_rules! debug_log {
    ($flag:ident, $level:expr, $($arg:tt)+) => {{
        let level: u8 = $level;
        if $crate::diag_gte($crate::DiagFlag::$flag, level) {
            $crate::emit_debug($crate::DiagFlag::$flag, level, ::std::format!($($arg)+));
        }
    }};
}

/// Record a warning diagnostic for the category.
///
/// Warnings are recorded regardless of the configured levels.
///
/// # Example
/// ```
/// use logging::{drain_events, warn_log, DiagnosticEvent};
///
/// warn_log!(Idmap, "lookup of {} failed", 1001);
/// assert!(matches!(drain_events()[0], DiagnosticEvent::Warning { .. }));
/// ```
#[macro_export]
macro_rules! warn_log {
    ($flag:ident, $($arg:tt)+) => {{
        $crate::emit_warning($crate::DiagFlag::$flag, ::std::format!($($arg)+));
    }};
}
