//! Integer status codes returned across the C boundary.

/// Status returned by `cpxlazy_initialize`, `cpxlazy_try_load` and
/// `cpxlazy_verify_handle`. Zero is success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    Ok = 0,
    /// No candidate exists, or the loader could not open it.
    NotFound = 1,
    /// A handshake entry point is not exported.
    MissingEntryPoint = 2,
    /// The vendor refused to create an environment.
    EnvironmentOpenFailed = 3,
    /// The library is older than the caller's minimum.
    VersionTooOld = 4,
    /// The version string was not four dot-separated integers.
    MalformedVersion = 5,
    /// Null or non-UTF-8 path argument.
    InvalidArgument = 6,
    NoActiveHandle = 7,
    /// `initialize` after a manual `try_load`.
    DiscoveryBypassed = 8,
}

/// Returned by forwarded `int` entry points whose symbol could not be
/// resolved and whose error handler returned. The vendor never produces a
/// negative status.
pub const ERR_UNRESOLVED: i32 = -1;

impl Status {
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Self::Ok,
            1 => Self::NotFound,
            2 => Self::MissingEntryPoint,
            3 => Self::EnvironmentOpenFailed,
            4 => Self::VersionTooOld,
            5 => Self::MalformedVersion,
            6 => Self::InvalidArgument,
            7 => Self::NoActiveHandle,
            8 => Self::DiscoveryBypassed,
            _ => return None,
        })
    }

    /// Stable short name used in diagnostics and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NotFound => "not-found",
            Self::MissingEntryPoint => "missing-entry-point",
            Self::EnvironmentOpenFailed => "environment-open-failed",
            Self::VersionTooOld => "version-too-old",
            Self::MalformedVersion => "malformed-version",
            Self::InvalidArgument => "invalid-argument",
            Self::NoActiveHandle => "no-active-handle",
            Self::DiscoveryBypassed => "discovery-bypassed",
        }
    }
}
