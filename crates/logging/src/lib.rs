#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` provides the diagnostic plumbing shared by the aclfs crates:
//! a fixed set of categories ([`DiagFlag`]), a per-category verbosity level
//! ([`DiagLevels`]), and a thread-local buffer of [`DiagnosticEvent`]s that
//! callers and tests can drain.
//!
//! # Design
//!
//! Engine code records diagnostics through [`debug_log!`] and [`warn_log!`].
//! Debug events are gated on the thread's [`VerbosityConfig`]; warnings are
//! always recorded. Nothing is written anywhere by default: the host decides
//! whether to drain the buffer or, with the `tracing` feature, to install a
//! subscriber via `init_tracing` and receive every event under its
//! `aclfs::<category>` target.
//!
//! # Invariants
//!
//! - Configuration and captured events are per thread; one thread never
//!   observes another thread's diagnostics.
//! - [`drain_events`] returns events in emission order and leaves the buffer
//!   empty.
//!
//! # Examples
//!
//! ```
//! use logging::{debug_log, drain_events, init, warn_log, VerbosityConfig};
//!
//! init(VerbosityConfig::from_verbose_level(2));
//! drain_events();
//!
//! debug_log!(Store, 1, "wrote {} bytes", 48);
//! warn_log!(Idmap, "identity service unreachable");
//!
//! let events = drain_events();
//! assert_eq!(events.len(), 2);
//! assert_eq!(events[0].message(), "wrote 48 bytes");
//! ```

mod config;
mod levels;
mod macros;
mod thread_local;

#[cfg(feature = "tracing")]
mod tracing_bridge;
#[cfg(feature = "tracing")]
mod tracing_macros;

pub use config::VerbosityConfig;
pub use levels::{DiagFlag, DiagLevels};
pub use thread_local::{
    DiagnosticEvent, apply_flag, diag_gte, drain_events, emit_debug, emit_warning, init,
};

#[cfg(feature = "tracing")]
pub use tracing_bridge::{
    LOG_ENV, env_filter, init_tracing, init_tracing_with_filter, target_to_flag,
};
