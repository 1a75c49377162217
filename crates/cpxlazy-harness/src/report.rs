//! Machine-readable reports for the harness subcommands.

use std::sync::Arc;

use cpxlazy_abi::loader::Loader;
use cpxlazy_abi::probe;
use cpxlazy_core::candidates::{Candidate, CandidatePlan};
use cpxlazy_core::config::ShimConfig;
use cpxlazy_core::error::ProbeRejection;
use cpxlazy_core::status::Status;
use cpxlazy_core::version::{EncodedVersion, VersionParseError, parse_version_string};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("invalid version {input:?}: {source}")]
    InvalidVersion {
        input: String,
        #[source]
        source: VersionParseError,
    },
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a minimum version given either dotted (`12.6.0.0`) or encoded
/// (`12060000`). `any` accepts every version.
pub fn parse_minimum(input: &str) -> Result<EncodedVersion, HarnessError> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("any") {
        return Ok(EncodedVersion::ANY);
    }
    if let Ok(raw) = trimmed.parse::<i32>() {
        return Ok(EncodedVersion::from_raw(raw));
    }
    parse_version_string(trimmed).map_err(|source| HarnessError::InvalidVersion {
        input: input.to_string(),
        source,
    })
}

fn version_text(version: EncodedVersion) -> String {
    if version == EncodedVersion::ANY {
        "any".to_string()
    } else {
        version.to_string()
    }
}

// ---------------------------------------------------------------------------
// candidates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateEntry {
    pub path: String,
    pub origin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateReport {
    pub override_path: Option<String>,
    pub patterns: Vec<String>,
    pub candidates: Vec<CandidateEntry>,
}

impl CandidateReport {
    /// Describe the platform plan for `config`, expanding globs with `expand`.
    pub fn build<F>(config: &ShimConfig, expand: F) -> Self
    where
        F: FnMut(&str) -> Vec<String>,
    {
        let plan = CandidatePlan::for_platform(config.override_path.as_deref());
        let candidates = plan.assemble(expand);
        Self {
            override_path: plan.override_path().map(str::to_string),
            patterns: plan.active_patterns().to_vec(),
            candidates: candidates.iter().map(CandidateEntry::from).collect(),
        }
    }
}

impl From<&Candidate> for CandidateEntry {
    fn from(candidate: &Candidate) -> Self {
        Self {
            path: candidate.path.clone(),
            origin: candidate.origin.as_str().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// probe
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeReport {
    pub path: String,
    pub accepted: bool,
    pub status: String,
    pub code: i32,
    pub version: Option<String>,
    pub version_raw: Option<i32>,
    pub required: String,
    pub reason: Option<String>,
}

impl ProbeReport {
    /// Probe `path` and unload it again, whatever the outcome.
    pub fn run(loader: &Arc<dyn Loader>, path: &str, minimum: EncodedVersion) -> Self {
        match probe::probe(loader, path, minimum) {
            Ok(accepted) => Self {
                path: path.to_string(),
                accepted: true,
                status: Status::Ok.as_str().to_string(),
                code: Status::Ok.code(),
                version: Some(accepted.version.to_string()),
                version_raw: Some(accepted.version.raw()),
                required: version_text(minimum),
                reason: None,
            },
            Err(rejection) => Self::rejected(path, minimum, &rejection),
        }
    }

    fn rejected(path: &str, minimum: EncodedVersion, rejection: &ProbeRejection) -> Self {
        let found = match rejection {
            ProbeRejection::VersionTooOld { found, .. } => Some(*found),
            _ => None,
        };
        Self {
            path: path.to_string(),
            accepted: false,
            status: rejection.status().as_str().to_string(),
            code: rejection.status().code(),
            version: found.map(|v| v.to_string()),
            version_raw: found.map(EncodedVersion::raw),
            required: version_text(minimum),
            reason: Some(rejection.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// discover
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub required: String,
    pub attempts: Vec<ProbeReport>,
    pub selected: Option<String>,
    pub status: String,
    pub code: i32,
}

impl DiscoveryReport {
    /// Probe `candidates` in order. Stops at the first acceptance unless
    /// `exhaustive` is set. Nothing stays loaded afterwards.
    pub fn run(
        loader: &Arc<dyn Loader>,
        candidates: &[Candidate],
        minimum: EncodedVersion,
        exhaustive: bool,
    ) -> Self {
        let mut attempts = Vec::with_capacity(candidates.len());
        let mut selected = None;
        for candidate in candidates {
            let report = ProbeReport::run(loader, &candidate.path, minimum);
            let accepted = report.accepted;
            attempts.push(report);
            if accepted && selected.is_none() {
                selected = Some(candidate.path.clone());
                if !exhaustive {
                    break;
                }
            }
        }

        let status = match (&selected, attempts.last()) {
            (Some(_), _) => Status::Ok,
            (None, None) => Status::NotFound,
            (None, Some(last)) => Status::from_code(last.code).unwrap_or(Status::NotFound),
        };
        Self {
            required: version_text(minimum),
            attempts,
            selected,
            status: status.as_str().to_string(),
            code: status.code(),
        }
    }
}

// ---------------------------------------------------------------------------
// encode-version
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionReport {
    pub input: String,
    pub dotted: String,
    pub encoded: i32,
}

impl VersionReport {
    /// Accepts either form and reports both.
    pub fn from_input(input: &str) -> Result<Self, HarnessError> {
        let version = parse_minimum(input)?;
        Ok(Self {
            input: input.to_string(),
            dotted: version_text(version),
            encoded: version.raw(),
        })
    }
}

/// Pretty JSON with a trailing newline.
pub fn to_json<T: Serialize>(report: &T) -> Result<String, HarnessError> {
    let mut body = serde_json::to_string_pretty(report)?;
    body.push('\n');
    Ok(body)
}
