//! Structured diagnostics.
//!
//! When `CPXLAZY_DEBUG` is set, discovery and resolution events are written
//! to stderr as one JSON object per line. Required fields are `timestamp_ms`,
//! `level` and `event`; the rest are present only when relevant.

use serde::Serialize;

use cpxlazy_core::candidates::Candidate;
use cpxlazy_core::error::{ProbeRejection, ResolveError};
use cpxlazy_core::version::EncodedVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

/// One diagnostic line.
#[derive(Debug, Clone, Serialize)]
pub struct DiagRecord {
    pub timestamp_ms: u64,
    pub level: Level,
    pub event: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl DiagRecord {
    #[must_use]
    pub fn new(level: Level, event: &'static str) -> Self {
        Self {
            timestamp_ms: now_ms(),
            level,
            event,
            candidate: None,
            origin: None,
            symbol: None,
            version: None,
            required: None,
            status: None,
            reason: None,
            count: None,
        }
    }

    #[must_use]
    pub fn with_candidate(mut self, candidate: &Candidate) -> Self {
        self.candidate = Some(candidate.path.clone());
        self.origin = Some(candidate.origin.as_str());
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.candidate = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: EncodedVersion) -> Self {
        self.version = Some(version.raw());
        self
    }

    #[must_use]
    pub fn with_required(mut self, required: EncodedVersion) -> Self {
        self.required = Some(required.raw());
        self
    }

    #[must_use]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    #[must_use]
    pub fn with_rejection(mut self, rejection: &ProbeRejection) -> Self {
        self.status = Some(rejection.status().as_str());
        self.reason = Some(rejection.to_string());
        self
    }

    #[must_use]
    pub fn with_resolve_error(mut self, err: &ResolveError) -> Self {
        self.symbol = Some(err.symbol());
        self.reason = Some(err.to_string());
        self
    }

    /// Serialize to a single JSON line (no trailing newline).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Sink gated on the debug flag read at the start of the current operation.
#[derive(Debug, Clone, Copy)]
pub struct Diagnostics {
    enabled: bool,
}

impl Diagnostics {
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    #[must_use]
    pub const fn enabled(self) -> bool {
        self.enabled
    }

    pub fn emit(self, record: DiagRecord) {
        if !self.enabled {
            return;
        }
        if let Ok(line) = record.to_jsonl() {
            eprintln!("{line}");
        }
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
