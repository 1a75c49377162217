//! The library handle: a scoped owner of one opened vendor library.

use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::loader::{Loader, RawHandle};

/// Whether dropping the handle unloads the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Opened by the shim; closed on drop.
    Owned,
    /// Injected by the host with `set_handle`; never closed by the shim.
    Borrowed,
}

/// One opened library plus the loader that opened it.
pub struct LibraryHandle {
    raw: RawHandle,
    path: String,
    ownership: Ownership,
    loader: Arc<dyn Loader>,
}

impl LibraryHandle {
    pub(crate) fn owned(loader: Arc<dyn Loader>, raw: RawHandle, path: impl Into<String>) -> Self {
        Self {
            raw,
            path: path.into(),
            ownership: Ownership::Owned,
            loader,
        }
    }

    pub(crate) fn borrowed(loader: Arc<dyn Loader>, raw: RawHandle) -> Self {
        Self {
            raw,
            path: String::from("<injected>"),
            ownership: Ownership::Borrowed,
            loader,
        }
    }

    #[must_use]
    pub fn raw(&self) -> RawHandle {
        self.raw
    }

    /// The candidate this handle was opened from, or `<injected>`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    #[must_use]
    pub fn is_owned(&self) -> bool {
        self.ownership == Ownership::Owned
    }

    /// Look up an exported symbol by exact name.
    #[must_use]
    pub fn symbol(&self, name: &str) -> Option<NonNull<c_void>> {
        self.loader.symbol(self.raw, name)
    }
}

impl Drop for LibraryHandle {
    fn drop(&mut self) {
        if self.is_owned() {
            self.loader.close(self.raw);
        }
    }
}

impl fmt::Debug for LibraryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryHandle")
            .field("raw", &self.raw)
            .field("path", &self.path)
            .field("ownership", &self.ownership)
            .finish_non_exhaustive()
    }
}
