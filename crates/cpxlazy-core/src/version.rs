//! Encoded solver versions.
//!
//! The vendor reports its version as a single integer
//! `major*1_000_000 + minor*10_000 + micro*100 + patch`, so `12.6.0.0`
//! becomes `12060000`. Callers state their minimum requirement in the same
//! form and the two are compared as plain integers.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const MAJOR_SCALE: i64 = 1_000_000;
const MINOR_SCALE: i64 = 10_000;
const MICRO_SCALE: i64 = 100;

/// Largest value a non-major component may take without bleeding into the
/// next decimal slot.
pub const MAX_COMPONENT: u32 = 99;

/// Number of dot-separated components in a vendor version string.
pub const VERSION_SEGMENTS: usize = 4;

/// A version in the vendor's encoded integer form. Ordering is integer ordering.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EncodedVersion(i32);

impl EncodedVersion {
    /// Accepts every version.
    pub const ANY: Self = Self(i32::MIN);

    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Encode four components. Returns `None` when a non-major component
    /// exceeds [`MAX_COMPONENT`] or the result does not fit in an `i32`.
    #[must_use]
    pub fn encode(major: u32, minor: u32, micro: u32, patch: u32) -> Option<Self> {
        if minor > MAX_COMPONENT || micro > MAX_COMPONENT || patch > MAX_COMPONENT {
            return None;
        }
        let value = i64::from(major) * MAJOR_SCALE
            + i64::from(minor) * MINOR_SCALE
            + i64::from(micro) * MICRO_SCALE
            + i64::from(patch);
        i32::try_from(value).ok().map(Self)
    }

    /// Split back into `(major, minor, micro, patch)`.
    #[must_use]
    pub fn parts(self) -> (i32, i32, i32, i32) {
        let v = i64::from(self.0);
        (
            (v / MAJOR_SCALE) as i32,
            ((v % MAJOR_SCALE) / MINOR_SCALE) as i32,
            ((v % MINOR_SCALE) / MICRO_SCALE) as i32,
            (v % MICRO_SCALE) as i32,
        )
    }

    /// Returns true if `self` is at least `minimum`. Equal versions satisfy.
    #[inline]
    #[must_use]
    pub fn satisfies(self, minimum: Self) -> bool {
        self >= minimum
    }
}

impl fmt::Display for EncodedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            return write!(f, "{}", self.0);
        }
        let (major, minor, micro, patch) = self.parts();
        write!(f, "{major}.{minor}.{micro}.{patch}")
    }
}

/// Why a vendor version string could not be encoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    #[error("expected {VERSION_SEGMENTS} dot-separated components, found {found}")]
    SegmentCount { found: usize },
    #[error("component {index} ({text:?}) is not a non-negative integer")]
    InvalidComponent { index: usize, text: String },
    #[error("component {index} value {value} exceeds {MAX_COMPONENT}")]
    ComponentOutOfRange { index: usize, value: u32 },
    #[error("major version {major} does not fit the encoded form")]
    Overflow { major: u32 },
}

/// Parse a vendor version string such as `"12.6.0.0"`.
///
/// Surrounding whitespace is ignored; anything else that is not exactly four
/// decimal components is rejected.
pub fn parse_version_string(raw: &str) -> Result<EncodedVersion, VersionParseError> {
    let segments: Vec<&str> = raw.trim().split('.').collect();
    if segments.len() != VERSION_SEGMENTS {
        return Err(VersionParseError::SegmentCount {
            found: segments.len(),
        });
    }

    let mut parts = [0u32; VERSION_SEGMENTS];
    for (index, text) in segments.iter().enumerate() {
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(VersionParseError::InvalidComponent {
                index,
                text: (*text).to_string(),
            });
        }
        let value: u32 = text
            .parse()
            .map_err(|_| VersionParseError::InvalidComponent {
                index,
                text: (*text).to_string(),
            })?;
        if index > 0 && value > MAX_COMPONENT {
            return Err(VersionParseError::ComponentOutOfRange { index, value });
        }
        parts[index] = value;
    }

    EncodedVersion::encode(parts[0], parts[1], parts[2], parts[3])
        .ok_or(VersionParseError::Overflow { major: parts[0] })
}

impl FromStr for EncodedVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_version_string(s)
    }
}
