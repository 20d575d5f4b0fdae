//! crates/logging/src/tracing_bridge.rs
//! Bridge between captured diagnostics and the tracing crate.
//!
//! Every event recorded through [`emit_debug`](crate::emit_debug) or
//! [`emit_warning`](crate::emit_warning) is also emitted as a `tracing` event
//! under the category target (`aclfs::access`, `aclfs::codec`, ...), so a
//! host that installs a subscriber sees the same stream the thread-local
//! buffer captures.
//!
//! # Usage
//!
//! ```rust,ignore
//! use logging::{VerbosityConfig, init_tracing};
//!
//! init_tracing(VerbosityConfig::from_verbose_level(2));
//!
//! // Filter further with ACLFS_LOG, e.g. ACLFS_LOG=aclfs::access=debug
//! ```

use super::config::VerbosityConfig;
use super::levels::DiagFlag;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

/// Environment variable read by [`init_tracing`] for the subscriber filter.
pub const LOG_ENV: &str = "ACLFS_LOG";

/// Filter used when [`LOG_ENV`] is unset or invalid.
const DEFAULT_FILTER: &str = "aclfs=warn";

macro_rules! forward_to {
    ($target:literal, $warning:expr, $message:expr) => {
        if $warning {
            ::tracing::warn!(target: $target, "{}", $message);
        } else {
            ::tracing::debug!(target: $target, "{}", $message);
        }
    };
}

/// Emit a captured diagnostic as a `tracing` event under its category target.
pub(crate) fn forward(flag: DiagFlag, warning: bool, message: &str) {
    match flag {
        DiagFlag::Codec => forward_to!("aclfs::codec", warning, message),
        DiagFlag::Container => forward_to!("aclfs::container", warning, message),
        DiagFlag::Mode => forward_to!("aclfs::mode", warning, message),
        DiagFlag::Inherit => forward_to!("aclfs::inherit", warning, message),
        DiagFlag::Access => forward_to!("aclfs::access", warning, message),
        DiagFlag::Idmap => forward_to!("aclfs::idmap", warning, message),
        DiagFlag::Store => forward_to!("aclfs::store", warning, message),
    }
}

/// Map a tracing target back to its diagnostic category.
///
/// Matches on the `::<category>` suffix so nested targets such as
/// `aclfs::access::delete` resolve to their parent category.
pub fn target_to_flag(target: &str) -> Option<DiagFlag> {
    let rest = target.strip_prefix("aclfs::")?;
    let head = rest.split("::").next()?;
    DiagFlag::from_name(head)
}

/// Build the subscriber filter from [`LOG_ENV`], falling back to warnings only.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize tracing with the given verbosity configuration.
///
/// Installs a `fmt` subscriber filtered by [`env_filter`] and seeds the
/// thread-local configuration. Calling it twice is harmless; the second
/// global subscriber installation is ignored.
pub fn init_tracing(config: VerbosityConfig) {
    init_tracing_with_filter(config, env_filter());
}

/// Initialize tracing with an explicit filter layer.
pub fn init_tracing_with_filter<F>(config: VerbosityConfig, filter: F)
where
    F: Layer<tracing_subscriber::Registry> + Send + Sync + 'static,
{
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    super::thread_local::init(config);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_to_flag_resolves_categories() {
        assert_eq!(target_to_flag("aclfs::access"), Some(DiagFlag::Access));
        assert_eq!(target_to_flag("aclfs::codec"), Some(DiagFlag::Codec));
        assert_eq!(
            target_to_flag("aclfs::access::delete"),
            Some(DiagFlag::Access)
        );
    }

    #[test]
    fn target_to_flag_rejects_foreign_targets() {
        assert_eq!(target_to_flag("nfs::io"), None);
        assert_eq!(target_to_flag("aclfs::unknown"), None);
        assert_eq!(target_to_flag("access"), None);
    }

    #[test]
    fn every_flag_target_maps_back() {
        for flag in DiagFlag::ALL {
            assert_eq!(target_to_flag(flag.target()), Some(flag));
        }
    }

    #[test]
    fn forwarding_without_subscriber_is_a_no_op() {
        forward(DiagFlag::Store, false, "no subscriber");
        forward(DiagFlag::Idmap, true, "still no subscriber");
    }
}
