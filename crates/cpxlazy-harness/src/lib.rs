//! Operator tooling for the cpxlazy shim.
//!
//! This crate provides:
//! - Candidate listing: the ordered paths discovery would try
//! - Probing: run the version handshake against one path
//! - Discovery dry-runs: probe candidates and report every outcome
//! - Version encoding: convert between dotted and encoded version forms
//!
//! All output is JSON so it can be attached to bug reports.

#![forbid(unsafe_code)]

pub mod report;

pub use report::{
    CandidateReport, DiscoveryReport, HarnessError, ProbeReport, VersionReport, parse_minimum,
};
