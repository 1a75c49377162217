//! Candidate library locations, in priority order.
//!
//! A plan is built from three sources:
//! 1. an explicit override path (highest priority),
//! 2. compiled-in platform default file names,
//! 3. install-tree glob patterns with the studio version wildcarded, only
//!    consulted when no override is given.
//!
//! Pattern expansion is supplied by the caller so this module stays free of
//! filesystem access.

use std::cmp::Ordering;
use std::collections::HashSet;

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateOrigin {
    Override,
    Default,
    InstallTree,
}

impl CandidateOrigin {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Override => "override",
            Self::Default => "default",
            Self::InstallTree => "install-tree",
        }
    }
}

/// One location to try. Priority is its position in the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: String,
    pub origin: CandidateOrigin,
}

impl Candidate {
    #[must_use]
    pub fn new(path: impl Into<String>, origin: CandidateOrigin) -> Self {
        Self {
            path: path.into(),
            origin,
        }
    }
}

#[cfg(target_os = "macos")]
pub const DEFAULT_LIBRARY_NAMES: &[&str] = &["libcplex.dylib"];
#[cfg(target_os = "macos")]
pub const INSTALL_TREE_PATTERNS: &[&str] =
    &["/Applications/CPLEX_Studio*/cplex/bin/x86-64_osx/libcplex*.dylib"];

#[cfg(not(target_os = "macos"))]
pub const DEFAULT_LIBRARY_NAMES: &[&str] = &["libcplex.so"];
#[cfg(not(target_os = "macos"))]
pub const INSTALL_TREE_PATTERNS: &[&str] =
    &["/opt/ibm/ILOG/CPLEX_Studio*/cplex/bin/x86-64_linux/libcplex*.so"];

/// The inputs of one discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePlan {
    override_path: Option<String>,
    defaults: Vec<String>,
    patterns: Vec<String>,
}

impl CandidatePlan {
    /// Plan with this platform's compiled-in names and install-tree patterns.
    #[must_use]
    pub fn for_platform(override_path: Option<&str>) -> Self {
        Self::new(override_path, DEFAULT_LIBRARY_NAMES, INSTALL_TREE_PATTERNS)
    }

    #[must_use]
    pub fn new(override_path: Option<&str>, defaults: &[&str], patterns: &[&str]) -> Self {
        Self {
            override_path: override_path
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            defaults: defaults.iter().map(|s| (*s).to_string()).collect(),
            patterns: patterns.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[must_use]
    pub fn override_path(&self) -> Option<&str> {
        self.override_path.as_deref()
    }

    /// Glob patterns that will be expanded. Empty when an override is set.
    #[must_use]
    pub fn active_patterns(&self) -> &[String] {
        if self.override_path.is_some() {
            &[]
        } else {
            &self.patterns
        }
    }

    /// Produce the ordered candidate list.
    ///
    /// `expand` turns one glob pattern into the paths it matches; its output
    /// is re-ordered newest-first. Duplicates keep their first position.
    pub fn assemble<F>(&self, mut expand: F) -> Vec<Candidate>
    where
        F: FnMut(&str) -> Vec<String>,
    {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut push = |path: String, origin: CandidateOrigin| {
            if seen.insert(path.clone()) {
                out.push(Candidate { path, origin });
            }
        };

        if let Some(path) = &self.override_path {
            push(path.clone(), CandidateOrigin::Override);
        }
        for name in &self.defaults {
            push(name.clone(), CandidateOrigin::Default);
        }
        for pattern in self.active_patterns() {
            let mut matches = expand(pattern);
            order_newest_first(&mut matches);
            for path in matches {
                push(path, CandidateOrigin::InstallTree);
            }
        }
        out
    }
}

/// Sort glob matches so that higher embedded version numbers come first.
pub fn order_newest_first(paths: &mut [String]) {
    paths.sort_by(|a, b| natural_cmp(b, a));
}

/// Compare two strings treating runs of ASCII digits as numbers.
///
/// `"CPLEX_Studio129" < "CPLEX_Studio1210"`, whereas a bytewise compare
/// orders them the other way round.
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0usize, 0usize);

    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let si = i;
            while i < a.len() && a[i].is_ascii_digit() {
                i += 1;
            }
            let sj = j;
            while j < b.len() && b[j].is_ascii_digit() {
                j += 1;
            }
            let da = trim_leading_zeros(&a[si..i]);
            let db = trim_leading_zeros(&b[sj..j]);
            let ord = da.len().cmp(&db.len()).then_with(|| da.cmp(db));
            if ord != Ordering::Equal {
                return ord;
            }
        } else {
            let ord = a[i].cmp(&b[j]);
            if ord != Ordering::Equal {
                return ord;
            }
            i += 1;
            j += 1;
        }
    }

    (a.len() - i).cmp(&(b.len() - j))
}

fn trim_leading_zeros(digits: &[u8]) -> &[u8] {
    let start = digits
        .iter()
        .position(|&d| d != b'0')
        .unwrap_or(digits.len());
    &digits[start..]
}
