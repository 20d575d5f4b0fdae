//! Tunable ACL policies and engine options.

use std::fmt;
use std::str::FromStr;

use protocol::acl::LayoutVersion;

/// Policy applied to an existing ACL when the mode word changes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum AclMode {
    /// Replace the ACL with one derived from the mode alone.
    #[default]
    Discard,
    /// Keep the ACL and mask its entries down to the new mode.
    Mask,
    /// Keep the ACL and leave explicit entries untouched.
    Passthrough,
}

/// Policy applied to inheritable entries when a child object is created.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum AclInherit {
    /// Inherit nothing.
    Discard,
    /// Inherit only DENY entries.
    #[cfg_attr(feature = "serde", serde(rename = "noallow"))]
    NoAllow,
    /// Inherit entries but strip `write_acl` and `write_owner` grants.
    #[default]
    Restricted,
    /// Inherit entries unchanged.
    Passthrough,
    /// Inherit entries unchanged, dropping execute when the mode grants none.
    PassthroughX,
}

/// Error returned when a policy name cannot be parsed.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown {kind} policy '{value}'")]
pub struct ParsePolicyError {
    kind: &'static str,
    value: String,
}

impl ParsePolicyError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }

    /// Returns the rejected input.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl AclMode {
    /// Returns the property spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Discard => "discard",
            Self::Mask => "mask",
            Self::Passthrough => "passthrough",
        }
    }
}

impl AclInherit {
    /// Returns the property spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Discard => "discard",
            Self::NoAllow => "noallow",
            Self::Restricted => "restricted",
            Self::Passthrough => "passthrough",
            Self::PassthroughX => "passthrough-x",
        }
    }
}

impl fmt::Display for AclMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AclInherit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AclMode {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discard" => Ok(Self::Discard),
            "mask" => Ok(Self::Mask),
            "passthrough" => Ok(Self::Passthrough),
            _ => Err(ParsePolicyError::new("aclmode", s)),
        }
    }
}

impl FromStr for AclInherit {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discard" => Ok(Self::Discard),
            "noallow" => Ok(Self::NoAllow),
            "restricted" => Ok(Self::Restricted),
            "passthrough" => Ok(Self::Passthrough),
            "passthrough-x" => Ok(Self::PassthroughX),
            _ => Err(ParsePolicyError::new("aclinherit", s)),
        }
    }
}

/// Filesystem-wide settings that steer ACL synthesis and access checks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "kebab-case"))]
pub struct AclOptions {
    acl_mode: AclMode,
    acl_inherit: AclInherit,
    use_fuids: bool,
    read_only: bool,
    replay: bool,
}

impl AclOptions {
    /// Creates a new [`AclOptions`] value with defaults applied.
    ///
    /// The defaults discard the ACL on chmod, inherit in restricted mode and
    /// store ACLs in the extended layout.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            acl_mode: AclMode::Discard,
            acl_inherit: AclInherit::Restricted,
            use_fuids: true,
            read_only: false,
            replay: false,
        }
    }

    /// Selects the chmod policy.
    #[must_use]
    #[doc(alias = "aclmode")]
    pub const fn acl_mode(mut self, mode: AclMode) -> Self {
        self.acl_mode = mode;
        self
    }

    /// Selects the inheritance policy.
    #[must_use]
    #[doc(alias = "aclinherit")]
    pub const fn acl_inherit(mut self, inherit: AclInherit) -> Self {
        self.acl_inherit = inherit;
        self
    }

    /// Selects whether ACLs carry composite identities.
    ///
    /// Disabling this keeps new ACLs in the basic layout and stops `set_acl`
    /// from upgrading existing ones.
    #[must_use]
    pub const fn use_fuids(mut self, enabled: bool) -> Self {
        self.use_fuids = enabled;
        self
    }

    /// Marks the filesystem as mounted read-only.
    #[must_use]
    pub const fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Marks the engine as replaying a log; access checks then always pass.
    #[must_use]
    pub const fn replay(mut self, replay: bool) -> Self {
        self.replay = replay;
        self
    }

    /// Returns the chmod policy.
    #[must_use]
    pub const fn mode_policy(&self) -> AclMode {
        self.acl_mode
    }

    /// Returns the inheritance policy.
    #[must_use]
    pub const fn inherit_policy(&self) -> AclInherit {
        self.acl_inherit
    }

    /// Reports whether composite identities are in use.
    #[must_use]
    pub const fn fuids_enabled(&self) -> bool {
        self.use_fuids
    }

    /// Reports whether the filesystem is read-only.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Reports whether log replay is in progress.
    #[must_use]
    pub const fn is_replay(&self) -> bool {
        self.replay
    }

    /// Returns the layout new ACLs are written in.
    #[must_use]
    pub const fn layout(&self) -> LayoutVersion {
        if self.use_fuids {
            LayoutVersion::Extended
        } else {
            LayoutVersion::Basic
        }
    }
}

impl Default for AclOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_expected_configuration() {
        let options = AclOptions::new();

        assert_eq!(options.mode_policy(), AclMode::Discard);
        assert_eq!(options.inherit_policy(), AclInherit::Restricted);
        assert!(options.fuids_enabled());
        assert!(!options.is_read_only());
        assert!(!options.is_replay());
        assert_eq!(options.layout(), LayoutVersion::Extended);

        assert_eq!(AclOptions::default(), options);
    }

    #[test]
    fn builder_methods_apply_requested_settings() {
        let options = AclOptions::new()
            .acl_mode(AclMode::Passthrough)
            .acl_inherit(AclInherit::PassthroughX)
            .use_fuids(false)
            .read_only(true)
            .replay(true);

        assert_eq!(options.mode_policy(), AclMode::Passthrough);
        assert_eq!(options.inherit_policy(), AclInherit::PassthroughX);
        assert!(!options.fuids_enabled());
        assert!(options.is_read_only());
        assert!(options.is_replay());
        assert_eq!(options.layout(), LayoutVersion::Basic);
    }

    #[test]
    fn policy_names_round_trip() {
        for mode in [AclMode::Discard, AclMode::Mask, AclMode::Passthrough] {
            assert_eq!(mode.to_string().parse::<AclMode>(), Ok(mode));
        }
        for inherit in [
            AclInherit::Discard,
            AclInherit::NoAllow,
            AclInherit::Restricted,
            AclInherit::Passthrough,
            AclInherit::PassthroughX,
        ] {
            assert_eq!(inherit.to_string().parse::<AclInherit>(), Ok(inherit));
        }
    }

    #[test]
    fn policy_parsing_is_case_insensitive() {
        assert_eq!(" Passthrough-X ".parse(), Ok(AclInherit::PassthroughX));
        assert_eq!("MASK".parse(), Ok(AclMode::Mask));
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let err = "groupmask".parse::<AclMode>().unwrap_err();
        assert_eq!(err.value(), "groupmask");
        assert_eq!(err.to_string(), "unknown aclmode policy 'groupmask'");
        assert!("secure".parse::<AclInherit>().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_uses_property_spellings() {
        let options = AclOptions::new()
            .acl_inherit(AclInherit::NoAllow)
            .acl_mode(AclMode::Mask);
        let json = serde_json::to_string(&options).expect("serialize");
        assert!(json.contains("\"noallow\""));
        assert!(json.contains("\"mask\""));
        let back: AclOptions = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, options);

        let x: AclInherit = serde_json::from_str("\"passthrough-x\"").expect("deserialize");
        assert_eq!(x, AclInherit::PassthroughX);
    }
}
