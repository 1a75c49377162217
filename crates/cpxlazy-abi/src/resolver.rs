//! Candidate resolution: the platform plan from `cpxlazy_core` plus glob
//! expansion via `libc::glob`.

use std::ffi::{CStr, CString};

use cpxlazy_core::candidates::{Candidate, CandidatePlan};
use cpxlazy_core::config::ShimConfig;

/// Ordered candidates for this platform and configuration.
#[must_use]
pub fn platform_candidates(config: &ShimConfig) -> Vec<Candidate> {
    CandidatePlan::for_platform(config.override_path.as_deref()).assemble(expand_glob)
}

/// Expand a shell glob. Returns no paths on no match or any glob error.
#[must_use]
pub fn expand_glob(pattern: &str) -> Vec<String> {
    let Ok(c_pattern) = CString::new(pattern) else {
        return Vec::new();
    };

    // SAFETY: glob_t is a plain C struct; all-zero is its documented initial state.
    let mut buf: libc::glob_t = unsafe { std::mem::zeroed() };
    // SAFETY: pattern is NUL-terminated and buf is a valid glob_t.
    let rc = unsafe { libc::glob(c_pattern.as_ptr(), 0, None, &mut buf) };

    let mut out = Vec::new();
    if rc == 0 && !buf.gl_pathv.is_null() {
        for i in 0..buf.gl_pathc as usize {
            // SAFETY: glob guarantees gl_pathc valid entries in gl_pathv.
            let entry = unsafe { *buf.gl_pathv.add(i) };
            if entry.is_null() {
                continue;
            }
            // SAFETY: each entry is a NUL-terminated path owned by buf.
            out.push(unsafe { CStr::from_ptr(entry) }.to_string_lossy().into_owned());
        }
    }

    // SAFETY: buf was initialized by glob (or zeroed); globfree accepts both.
    unsafe { libc::globfree(&mut buf) };
    out
}
