//! Dynamic loader seam.
//!
//! [`Loader`] is the three-call interface the shim needs from the platform:
//! open a library, look up a symbol, close it. [`SystemLoader`] delegates to
//! `dlopen` / `dlsym` / `dlclose` via `libc`. Tests substitute an in-process
//! fake whose "libraries" are tables of Rust `extern "C"` functions.

use std::ffi::{CStr, CString, c_void};
use std::ptr::NonNull;

/// Opaque token for one library opened by a [`Loader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(NonNull<c_void>);

// SAFETY: the pointer is an opaque loader cookie; it is never dereferenced
// by the shim, only passed back to the loader that produced it.
unsafe impl Send for RawHandle {}
unsafe impl Sync for RawHandle {}

impl RawHandle {
    #[must_use]
    pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    #[must_use]
    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// Platform loader operations.
pub trait Loader: Send + Sync {
    /// Open the library named by `path`. On failure returns the loader's
    /// error text.
    ///
    /// # Safety
    ///
    /// Opening a library runs its initializers, which may do anything.
    unsafe fn open(&self, path: &CStr) -> Result<RawHandle, String>;

    /// Address of the exported symbol `name` in `handle`.
    fn symbol(&self, handle: RawHandle, name: &str) -> Option<NonNull<c_void>>;

    /// Unload `handle`. Called exactly once per handle returned by `open`.
    fn close(&self, handle: RawHandle);
}

/// `dlopen`-backed loader.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLoader;

/// Mode used for every candidate: bind lazily, keep the vendor's symbols out
/// of the global namespace.
pub const OPEN_FLAGS: libc::c_int = libc::RTLD_LAZY | libc::RTLD_LOCAL;

impl Loader for SystemLoader {
    unsafe fn open(&self, path: &CStr) -> Result<RawHandle, String> {
        clear_dlerror();
        // SAFETY: `path` is NUL-terminated; initializer side effects are the
        // caller's contract.
        let handle = unsafe { libc::dlopen(path.as_ptr(), OPEN_FLAGS) };
        RawHandle::from_ptr(handle).ok_or_else(take_dlerror)
    }

    fn symbol(&self, handle: RawHandle, name: &str) -> Option<NonNull<c_void>> {
        let name = CString::new(name).ok()?;
        clear_dlerror();
        // SAFETY: handle came from dlopen and has not been closed.
        NonNull::new(unsafe { libc::dlsym(handle.as_ptr(), name.as_ptr()) })
    }

    fn close(&self, handle: RawHandle) {
        // SAFETY: handle came from dlopen; ownership guarantees a single close.
        unsafe {
            libc::dlclose(handle.as_ptr());
        }
    }
}

fn clear_dlerror() {
    // SAFETY: dlerror has no preconditions; the result is discarded.
    unsafe {
        libc::dlerror();
    }
}

fn take_dlerror() -> String {
    // SAFETY: dlerror returns null or a NUL-terminated thread-local string.
    let msg = unsafe { libc::dlerror() };
    if msg.is_null() {
        return "shared object not found".to_string();
    }
    // SAFETY: non-null dlerror result is a valid C string until the next
    // dlerror call on this thread.
    unsafe { CStr::from_ptr(msg) }
        .to_string_lossy()
        .into_owned()
}

/// Reinterpret a resolved symbol address as a function pointer type `F`.
///
/// # Safety
///
/// `F` must be an `unsafe extern "C" fn` type matching the symbol's real
/// signature.
#[inline]
#[must_use]
pub unsafe fn fn_from_addr<F: Copy>(addr: NonNull<c_void>) -> F {
    debug_assert_eq!(
        std::mem::size_of::<F>(),
        std::mem::size_of::<*mut c_void>()
    );
    let ptr = addr.as_ptr();
    // SAFETY: F is a thin function pointer of pointer size per the contract.
    unsafe { std::mem::transmute_copy::<*mut c_void, F>(&ptr) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_not_a_handle() {
        assert!(RawHandle::from_ptr(std::ptr::null_mut()).is_none());
    }

    #[test]
    fn missing_file_reports_loader_error() {
        let err = unsafe { SystemLoader.open(c"/nonexistent/cpxlazy/libcplex.so") }.unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn symbol_with_interior_nul_is_absent() {
        // Any valid handle works; the name is rejected before dlsym runs.
        let Ok(handle) = (unsafe { SystemLoader.open(c"libm.so.6") }) else {
            eprintln!("Skipping: libm.so.6 not loadable");
            return;
        };
        assert!(SystemLoader.symbol(handle, "co\0s").is_none());
        assert!(SystemLoader.symbol(handle, "cos").is_some());
        SystemLoader.close(handle);
    }

    #[test]
    fn fn_from_addr_calls_through() {
        unsafe extern "C" fn seven() -> i32 {
            7
        }
        let addr = NonNull::new(seven as *mut c_void).unwrap();
        let f: unsafe extern "C" fn() -> i32 = unsafe { fn_from_addr(addr) };
        assert_eq!(unsafe { f() }, 7);
    }
}
