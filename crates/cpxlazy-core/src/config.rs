//! Environment configuration.
//!
//! Two variables are recognized:
//! - `CPXLAZY_LIBRARY`: explicit library path. When non-empty it is the
//!   first candidate tried and the install-tree search is skipped.
//! - `CPXLAZY_DEBUG`: any non-empty value enables JSONL diagnostics on
//!   stderr.
//!
//! Unlike a cached runtime mode, the configuration is re-read at the start of
//! every `initialize` / `try_load` call so a host may toggle debugging between
//! attempts.

use std::ffi::OsString;

/// Override path variable.
pub const LIBRARY_ENV: &str = "CPXLAZY_LIBRARY";
/// Debug flag variable.
pub const DEBUG_ENV: &str = "CPXLAZY_DEBUG";

/// Snapshot of the recognized options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShimConfig {
    pub override_path: Option<String>,
    pub debug: bool,
}

impl ShimConfig {
    /// Read the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    /// Build from an arbitrary variable source.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        Self {
            override_path: parse_override(lookup(LIBRARY_ENV)),
            debug: parse_debug(lookup(DEBUG_ENV).as_ref()),
        }
    }

    /// Read only the debug flag.
    #[must_use]
    pub fn debug_from_env() -> bool {
        parse_debug(std::env::var_os(DEBUG_ENV).as_ref())
    }
}

fn parse_override(raw: Option<OsString>) -> Option<String> {
    raw.map(|v| v.to_string_lossy().into_owned())
        .filter(|v| !v.is_empty())
}

fn parse_debug(raw: Option<&OsString>) -> bool {
    raw.is_some_and(|v| !v.is_empty())
}
