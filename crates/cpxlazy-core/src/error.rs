//! Error taxonomy.
//!
//! Discovery and probe failures are values, never aborts. Only a missing
//! symbol at call time reaches the (replaceable) error handler.

use thiserror::Error;

use crate::status::Status;
use crate::version::{EncodedVersion, VersionParseError};

/// Why the probe refused one candidate. Every variant carries the path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeRejection {
    #[error("{path}: cannot open library: {reason}")]
    NotFound { path: String, reason: String },
    #[error("{path}: missing entry point {symbol}")]
    MissingEntryPoint { path: String, symbol: &'static str },
    #[error("{path}: environment open failed (status {status})")]
    EnvironmentOpenFailed { path: String, status: i32 },
    #[error("{path}: version {found} is older than required {required}")]
    VersionTooOld {
        path: String,
        found: EncodedVersion,
        required: EncodedVersion,
    },
    #[error("{path}: malformed version string {raw:?}: {source}")]
    MalformedVersion {
        path: String,
        raw: String,
        #[source]
        source: VersionParseError,
    },
}

impl ProbeRejection {
    #[must_use]
    pub fn status(&self) -> Status {
        match self {
            Self::NotFound { .. } => Status::NotFound,
            Self::MissingEntryPoint { .. } => Status::MissingEntryPoint,
            Self::EnvironmentOpenFailed { .. } => Status::EnvironmentOpenFailed,
            Self::VersionTooOld { .. } => Status::VersionTooOld,
            Self::MalformedVersion { .. } => Status::MalformedVersion,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::NotFound { path, .. }
            | Self::MissingEntryPoint { path, .. }
            | Self::EnvironmentOpenFailed { path, .. }
            | Self::VersionTooOld { path, .. }
            | Self::MalformedVersion { path, .. } => path,
        }
    }
}

/// Failure of `initialize`, `try_load` or `verify_handle`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("no candidate library locations")]
    NoCandidates,
    #[error("no acceptable library among {tried} candidates; last: {last}")]
    Exhausted { tried: usize, last: ProbeRejection },
    #[error(transparent)]
    Rejected(#[from] ProbeRejection),
    #[error("invalid library path: {0}")]
    InvalidPath(String),
    #[error("no active library handle")]
    NoActiveHandle,
    #[error("automatic discovery bypassed by an earlier manual load")]
    DiscoveryBypassed,
}

impl LoadError {
    #[must_use]
    pub fn status(&self) -> Status {
        match self {
            Self::NoCandidates => Status::NotFound,
            Self::Exhausted { last, .. } => last.status(),
            Self::Rejected(rejection) => rejection.status(),
            Self::InvalidPath(_) => Status::InvalidArgument,
            Self::NoActiveHandle => Status::NoActiveHandle,
            Self::DiscoveryBypassed => Status::DiscoveryBypassed,
        }
    }
}

/// A dispatch slot could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("{symbol}: no active library handle")]
    NoActiveHandle { symbol: &'static str },
    #[error("{symbol}: not exported by the active library")]
    SymbolMissing { symbol: &'static str },
}

impl ResolveError {
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::NoActiveHandle { symbol } | Self::SymbolMissing { symbol } => symbol,
        }
    }
}
