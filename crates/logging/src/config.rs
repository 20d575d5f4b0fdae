//! crates/logging/src/config.rs
//! Verbosity configuration for the diagnostic categories.

use super::levels::{DiagFlag, DiagLevels};

/// Verbosity configuration consulted before a diagnostic is recorded.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerbosityConfig {
    /// Per-category levels.
    pub levels: DiagLevels,
}

impl VerbosityConfig {
    /// Create a configuration from a coarse verbose level (0-4).
    ///
    /// Level 1 reports persistence and synthesis summaries, level 2 adds
    /// access verdicts and identity lookups, level 3 raises the chatty
    /// categories and level 4 turns everything up.
    pub fn from_verbose_level(level: u8) -> Self {
        let mut config = Self::default();
        let levels = &mut config.levels;

        match level {
            0 => {}
            1 => {
                levels.codec = 1;
                levels.mode = 1;
                levels.inherit = 1;
                levels.store = 1;
            }
            2 => {
                levels.set_all(1);
            }
            3 => {
                levels.set_all(1);
                levels.access = 2;
                levels.container = 2;
                levels.mode = 2;
                levels.inherit = 2;
            }
            _ => {
                levels.set_all(3);
            }
        }

        config
    }

    /// Apply a single flag token (e.g., `"access2"`, `"codec"`, `"ALL"`).
    ///
    /// A token without digits selects level 1. `ALL` applies the level to
    /// every category and `NONE` clears them all.
    pub fn apply_flag(&mut self, token: &str) -> Result<(), String> {
        let (name, level) = parse_flag_token(token)?;

        if name.eq_ignore_ascii_case("all") {
            self.levels.set_all(level);
            return Ok(());
        }
        if name.eq_ignore_ascii_case("none") {
            self.levels.set_all(0);
            return Ok(());
        }

        let flag = DiagFlag::from_name(name).ok_or_else(|| format!("unknown diag flag: {name}"))?;
        self.levels.set(flag, level);
        Ok(())
    }

    /// Apply a comma separated list of flag tokens.
    pub fn apply_flags(&mut self, list: &str) -> Result<(), String> {
        list.split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .try_for_each(|token| self.apply_flag(token))
    }
}

/// Parse a flag token like "access2" into ("access", 2) or "codec" into ("codec", 1).
fn parse_flag_token(token: &str) -> Result<(&str, u8), String> {
    if token.is_empty() {
        return Err("empty flag token".to_string());
    }

    match token.find(|c: char| c.is_ascii_digit()) {
        Some(0) => Err(format!("missing flag name in: {token}")),
        Some(pos) => {
            let name = &token[..pos];
            let level = token[pos..]
                .parse::<u8>()
                .map_err(|_| format!("invalid level in flag: {token}"))?;
            Ok((name, level))
        }
        None => Ok((token, 1)),
    }
}
