//! Exported control surface of the shim.
//!
//! `cpxlazy_initialize`, `cpxlazy_try_load`, `cpxlazy_verify_handle` return
//! a status code (`0` on success, see `cpxlazy_core::status::Status`).
//! All operate on the process-wide context.

use std::ffi::{CStr, c_char, c_int, c_void};

use cpxlazy_core::error::LoadError;
use cpxlazy_core::status::Status;
use cpxlazy_core::version::EncodedVersion;

use crate::dispatch::{CallbackContext, ErrorCallback, ErrorPolicy};
use crate::loader::RawHandle;
use crate::state::global;

/// `cpxlazy_set_error_policy` selectors.
pub const POLICY_ABORT: c_int = 0;
pub const POLICY_LOG: c_int = 1;
pub const POLICY_PROPAGATE: c_int = 2;

fn status_of<T>(result: Result<T, LoadError>) -> c_int {
    match result {
        Ok(_) => Status::Ok.code(),
        Err(err) => err.status().code(),
    }
}

/// Discover and load the vendor library unless one is already active.
#[unsafe(no_mangle)]
pub extern "C" fn cpxlazy_initialize(min_version: c_int) -> c_int {
    status_of(global().initialize(EncodedVersion::from_raw(min_version)))
}

/// Load the vendor library from `path`, bypassing discovery.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cpxlazy_try_load(path: *const c_char, min_version: c_int) -> c_int {
    if path.is_null() {
        return Status::InvalidArgument.code();
    }
    // SAFETY: caller passes a NUL-terminated string.
    let Ok(path) = unsafe { CStr::from_ptr(path) }.to_str() else {
        return Status::InvalidArgument.code();
    };
    status_of(global().try_load(path, EncodedVersion::from_raw(min_version)))
}

/// Install an unresolved-symbol callback. A null callback restores the
/// default (print and abort).
#[unsafe(no_mangle)]
pub extern "C" fn cpxlazy_set_error_callback(callback: Option<ErrorCallback>, context: *mut c_void) {
    let policy = match callback {
        Some(callback) => ErrorPolicy::Callback {
            callback,
            context: CallbackContext(context),
        },
        None => ErrorPolicy::Abort,
    };
    global().set_error_policy(policy);
}

/// Select a built-in unresolved-symbol policy. Returns non-zero for an
/// unknown selector.
#[unsafe(no_mangle)]
pub extern "C" fn cpxlazy_set_error_policy(policy: c_int) -> c_int {
    let policy = match policy {
        POLICY_ABORT => ErrorPolicy::Abort,
        POLICY_LOG => ErrorPolicy::Log,
        POLICY_PROPAGATE => ErrorPolicy::Propagate,
        _ => return Status::InvalidArgument.code(),
    };
    global().set_error_policy(policy);
    Status::Ok.code()
}

/// The active library handle, or null.
#[unsafe(no_mangle)]
pub extern "C" fn cpxlazy_get_handle() -> *mut c_void {
    global()
        .handle()
        .map_or(std::ptr::null_mut(), RawHandle::as_ptr)
}

/// Make `handle` (from the host's own `dlopen`) the active library, or clear
/// it with null. The handle is not validated and is never closed by the shim.
#[unsafe(no_mangle)]
pub extern "C" fn cpxlazy_set_handle(handle: *mut c_void) {
    global().set_handle(RawHandle::from_ptr(handle));
}

/// Run the version handshake against the active handle.
#[unsafe(no_mangle)]
pub extern "C" fn cpxlazy_verify_handle(min_version: c_int) -> c_int {
    status_of(global().verify_handle(EncodedVersion::from_raw(min_version)))
}
