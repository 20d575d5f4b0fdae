//! crates/logging/src/levels.rs
//! Diagnostic categories and their per-category verbosity levels.

/// Diagnostic categories emitted by the ACL engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DiagFlag {
    /// Entry decoding, encoding and layout upgrades.
    Codec,
    /// ACL container bookkeeping and mask computation.
    Container,
    /// Mode word derivation and chmod-driven ACL synthesis.
    Mode,
    /// Inheritance of entries into new objects.
    Inherit,
    /// Access evaluation verdicts.
    Access,
    /// Identity mapping lookups.
    Idmap,
    /// Persistence of ACL bytes and object attributes.
    Store,
}

impl DiagFlag {
    /// Every category, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Codec,
        Self::Container,
        Self::Mode,
        Self::Inherit,
        Self::Access,
        Self::Idmap,
        Self::Store,
    ];

    /// Token used for this category in flag strings such as `access2`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Codec => "codec",
            Self::Container => "container",
            Self::Mode => "mode",
            Self::Inherit => "inherit",
            Self::Access => "access",
            Self::Idmap => "idmap",
            Self::Store => "store",
        }
    }

    /// `tracing` target used when diagnostics are forwarded.
    #[must_use]
    pub const fn target(self) -> &'static str {
        match self {
            Self::Codec => "aclfs::codec",
            Self::Container => "aclfs::container",
            Self::Mode => "aclfs::mode",
            Self::Inherit => "aclfs::inherit",
            Self::Access => "aclfs::access",
            Self::Idmap => "aclfs::idmap",
            Self::Store => "aclfs::store",
        }
    }

    /// Looks up a category by its flag-string token.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.name() == name)
    }
}

/// Verbosity level configured for each diagnostic category.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiagLevels {
    /// Codec level.
    pub codec: u8,
    /// Container level.
    pub container: u8,
    /// Mode synthesis level.
    pub mode: u8,
    /// Inheritance level.
    pub inherit: u8,
    /// Access evaluation level.
    pub access: u8,
    /// Identity mapping level.
    pub idmap: u8,
    /// Store level.
    pub store: u8,
}

impl DiagLevels {
    /// Get the level for a specific category.
    pub const fn get(&self, flag: DiagFlag) -> u8 {
        match flag {
            DiagFlag::Codec => self.codec,
            DiagFlag::Container => self.container,
            DiagFlag::Mode => self.mode,
            DiagFlag::Inherit => self.inherit,
            DiagFlag::Access => self.access,
            DiagFlag::Idmap => self.idmap,
            DiagFlag::Store => self.store,
        }
    }

    /// Set the level for a specific category.
    pub fn set(&mut self, flag: DiagFlag, level: u8) {
        match flag {
            DiagFlag::Codec => self.codec = level,
            DiagFlag::Container => self.container = level,
            DiagFlag::Mode => self.mode = level,
            DiagFlag::Inherit => self.inherit = level,
            DiagFlag::Access => self.access = level,
            DiagFlag::Idmap => self.idmap = level,
            DiagFlag::Store => self.store = level,
        }
    }

    /// Set all categories to the specified level.
    pub fn set_all(&mut self, level: u8) {
        for flag in DiagFlag::ALL {
            self.set(flag, level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_name() {
        for flag in DiagFlag::ALL {
            assert_eq!(DiagFlag::from_name(flag.name()), Some(flag));
        }
        assert_eq!(DiagFlag::from_name("acl"), None);
        assert_eq!(DiagFlag::from_name(""), None);
    }

    #[test]
    fn targets_share_the_crate_prefix() {
        for flag in DiagFlag::ALL {
            let target = flag.target();
            assert!(target.starts_with("aclfs::"));
            assert!(target.ends_with(flag.name()));
        }
    }

    #[test]
    fn default_levels_are_zero() {
        let levels = DiagLevels::default();
        for flag in DiagFlag::ALL {
            assert_eq!(levels.get(flag), 0);
        }
    }

    #[test]
    fn set_updates_only_the_named_category() {
        let mut levels = DiagLevels::default();
        levels.set(DiagFlag::Access, 2);
        levels.set(DiagFlag::Idmap, 1);

        assert_eq!(levels.access, 2);
        assert_eq!(levels.idmap, 1);
        assert_eq!(levels.get(DiagFlag::Codec), 0);
        assert_eq!(levels.get(DiagFlag::Store), 0);
    }

    #[test]
    fn set_all_updates_every_category() {
        let mut levels = DiagLevels::default();
        levels.set_all(3);
        for flag in DiagFlag::ALL {
            assert_eq!(levels.get(flag), 3);
        }
    }

    #[test]
    fn debug_format_names_fields() {
        let rendered = format!("{:?}", DiagLevels::default());
        assert!(rendered.contains("DiagLevels"));
        assert!(rendered.contains("access"));
    }
}
