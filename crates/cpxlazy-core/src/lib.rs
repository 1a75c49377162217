//! # cpxlazy-core
//!
//! Loader-independent logic for the lazy CPLEX binding shim.
//!
//! This crate holds everything that can be decided without touching the
//! dynamic loader: the encoded version format, the ordered candidate plan,
//! environment configuration, status codes and the error taxonomy. The
//! unsafe half (opening libraries, resolving symbols, exporting the C
//! surface) lives in `cpxlazy-abi`.

#![deny(unsafe_code)]

pub mod candidates;
pub mod config;
pub mod error;
pub mod status;
pub mod version;

pub use candidates::{Candidate, CandidateOrigin, CandidatePlan};
pub use config::ShimConfig;
pub use error::{LoadError, ProbeRejection, ResolveError};
pub use status::Status;
pub use version::{EncodedVersion, VersionParseError, parse_version_string};
