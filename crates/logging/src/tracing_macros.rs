//! crates/logging/src/tracing_macros.rs
//! Convenience macros for category-targeted tracing.
//!
//! These wrap the standard tracing macros with the `aclfs::<category>`
//! target so subscribers can filter per subsystem.

/// Emit a codec trace.
///
/// # Example
/// ```ignore
/// trace_codec!("decoded {} entries", count);
/// ```
#[macro_export]
macro_rules! trace_codec {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "aclfs::codec", $($arg)*);
    };
}

/// Emit an access evaluation trace.
///
/// # Example
/// ```ignore
/// trace_access!("residual {:#x}", residual);
/// ```
#[macro_export]
macro_rules! trace_access {
    ($($arg:tt)*) => {
        ::tracing::trace!(target: "aclfs::access", $($arg)*);
    };
}

/// Emit an inheritance trace.
///
/// # Example
/// ```ignore
/// trace_inherit!("inherited {} of {} entries", kept, total);
/// ```
#[macro_export]
macro_rules! trace_inherit {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "aclfs::inherit", $($arg)*);
    };
}

/// Emit a mode synthesis trace.
///
/// # Example
/// ```ignore
/// trace_mode!("mode {:o}", mode);
/// ```
#[macro_export]
macro_rules! trace_mode {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "aclfs::mode", $($arg)*);
    };
}

/// Emit an identity mapping trace.
///
/// # Example
/// ```ignore
/// trace_idmap!("mapped {} to {:#x}", uid, fuid);
/// ```
#[macro_export]
macro_rules! trace_idmap {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "aclfs::idmap", $($arg)*);
    };
}
