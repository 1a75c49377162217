//! Candidate probe: open, handshake, accept or reject.
//!
//! The handshake creates a throwaway vendor environment, reads the version,
//! and closes the environment again:
//!
//! ```text
//! dlopen ─► CPXopenCPLEX ─► CPXversionnumber | CPXversion ─► CPXcloseCPLEX ─► compare
//! ```
//!
//! Any rejection drops the owned [`LibraryHandle`], which unloads the
//! library before the reason is returned.

use std::ffi::{CStr, CString, c_char, c_int, c_void};
use std::sync::Arc;

use cpxlazy_core::error::ProbeRejection;
use cpxlazy_core::version::{EncodedVersion, parse_version_string};

use crate::handle::LibraryHandle;
use crate::loader::{Loader, fn_from_addr};

pub const OPEN_ENV: &str = "CPXopenCPLEX";
pub const VERSION_NUMBER: &str = "CPXversionnumber";
pub const VERSION_STRING: &str = "CPXversion";
pub const CLOSE_ENV: &str = "CPXcloseCPLEX";

type OpenEnvFn = unsafe extern "C" fn(status_p: *mut c_int) -> *mut c_void;
type VersionNumberFn = unsafe extern "C" fn(env: *const c_void, version_p: *mut c_int) -> c_int;
type VersionStringFn = unsafe extern "C" fn(env: *const c_void) -> *const c_char;
type CloseEnvFn = unsafe extern "C" fn(env_p: *mut *mut c_void) -> c_int;

/// An accepted candidate.
#[derive(Debug)]
pub struct Accepted {
    pub handle: LibraryHandle,
    pub version: EncodedVersion,
}

/// Open `path` and run the handshake against `minimum`.
pub fn probe(
    loader: &Arc<dyn Loader>,
    path: &str,
    minimum: EncodedVersion,
) -> Result<Accepted, ProbeRejection> {
    let c_path = CString::new(path).map_err(|_| ProbeRejection::NotFound {
        path: path.to_string(),
        reason: "path contains an interior NUL byte".to_string(),
    })?;

    // SAFETY: running the candidate's initializers is inherent to probing it.
    let raw = unsafe { loader.open(&c_path) }.map_err(|reason| ProbeRejection::NotFound {
        path: path.to_string(),
        reason,
    })?;

    // From here on every early return drops `handle`, which unloads it.
    let handle = LibraryHandle::owned(Arc::clone(loader), raw, path);
    let version = handshake(&handle, minimum)?;
    Ok(Accepted { handle, version })
}

/// Run the environment/version handshake on an already open library.
///
/// Does not take ownership: the caller decides whether to keep or drop the
/// handle. Used by `probe` and by `verify_handle` for injected handles.
pub fn handshake(
    handle: &LibraryHandle,
    minimum: EncodedVersion,
) -> Result<EncodedVersion, ProbeRejection> {
    let path = handle.path();
    let missing = |symbol: &'static str| ProbeRejection::MissingEntryPoint {
        path: path.to_string(),
        symbol,
    };

    let open_env = handle.symbol(OPEN_ENV).ok_or_else(|| missing(OPEN_ENV))?;
    // SAFETY: vendor signature `CPXENVptr CPXopenCPLEX(int *status_p)`.
    let open_env: OpenEnvFn = unsafe { fn_from_addr(open_env) };

    let mut status: c_int = 0;
    // SAFETY: status is a valid out-pointer for the duration of the call.
    let env = unsafe { open_env(&mut status) };
    let env = Environment { handle, env };
    if env.env.is_null() || status != 0 {
        return Err(ProbeRejection::EnvironmentOpenFailed {
            path: path.to_string(),
            status,
        });
    }

    let version = query_version(&env, path)?;
    drop(env);

    if !version.satisfies(minimum) {
        return Err(ProbeRejection::VersionTooOld {
            path: path.to_string(),
            found: version,
            required: minimum,
        });
    }
    Ok(version)
}

/// Numeric form first; the string form is the fallback for libraries that
/// predate it or whose numeric query fails.
fn query_version(env: &Environment<'_>, path: &str) -> Result<EncodedVersion, ProbeRejection> {
    if let Some(addr) = env.handle.symbol(VERSION_NUMBER) {
        // SAFETY: vendor signature `int CPXversionnumber(CPXCENVptr, int *)`.
        let version_number: VersionNumberFn = unsafe { fn_from_addr(addr) };
        let mut raw: c_int = 0;
        // SAFETY: env is a live environment; raw is a valid out-pointer.
        if unsafe { version_number(env.env, &mut raw) } == 0 {
            return Ok(EncodedVersion::from_raw(raw));
        }
    }

    let addr = env
        .handle
        .symbol(VERSION_STRING)
        .ok_or_else(|| ProbeRejection::MissingEntryPoint {
            path: path.to_string(),
            symbol: VERSION_STRING,
        })?;
    // SAFETY: vendor signature `const char *CPXversion(CPXCENVptr)`.
    let version_string: VersionStringFn = unsafe { fn_from_addr(addr) };
    // SAFETY: env is a live environment.
    let text = unsafe { version_string(env.env) };
    let raw = if text.is_null() {
        String::new()
    } else {
        // SAFETY: the vendor returns a NUL-terminated static string.
        unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned()
    };

    parse_version_string(&raw).map_err(|source| ProbeRejection::MalformedVersion {
        path: path.to_string(),
        raw,
        source,
    })
}

/// A vendor environment closed on drop, whatever the handshake outcome.
struct Environment<'a> {
    handle: &'a LibraryHandle,
    env: *mut c_void,
}

impl Drop for Environment<'_> {
    fn drop(&mut self) {
        if self.env.is_null() {
            return;
        }
        // Best effort: a library without a close entry point just leaks the env.
        if let Some(addr) = self.handle.symbol(CLOSE_ENV) {
            // SAFETY: vendor signature `int CPXcloseCPLEX(CPXENVptr *env_p)`.
            let close_env: CloseEnvFn = unsafe { fn_from_addr(addr) };
            // SAFETY: env came from CPXopenCPLEX on this library.
            unsafe {
                close_env(&mut self.env);
            }
        }
    }
}
