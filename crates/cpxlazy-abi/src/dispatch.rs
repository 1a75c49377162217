//! Lazy dispatch table.
//!
//! One [`DispatchSlot`] per vendor entry point. A slot starts unresolved and
//! moves to resolved at most once through a compare-and-swap on its cached
//! address; it never reverts, even if the active library later changes.
//! Concurrent first calls may both perform the lookup, but exactly one
//! writes the cache and every caller uses the winner's address.
//!
//! A failed lookup leaves the slot unresolved and is reported through the
//! context's [`ErrorPolicy`].

use std::ffi::{CString, c_char, c_void};
use std::ops::Index;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use cpxlazy_core::error::ResolveError;
use cpxlazy_core::status::ERR_UNRESOLVED;

use crate::handle::LibraryHandle;

const UNRESOLVED: usize = 0;

/// Cached address for one entry point.
#[derive(Debug)]
pub struct DispatchSlot {
    name: &'static str,
    addr: AtomicUsize,
    lookups: AtomicUsize,
}

impl DispatchSlot {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            addr: AtomicUsize::new(UNRESOLVED),
            lookups: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The cached address, if the slot has been resolved.
    #[inline]
    #[must_use]
    pub fn cached(&self) -> Option<NonNull<c_void>> {
        NonNull::new(self.addr.load(Ordering::Acquire) as *mut c_void)
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.cached().is_some()
    }

    /// Number of symbol lookups performed for this slot.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Resolve against `handle` unless already cached.
    pub fn resolve_with(
        &self,
        handle: Option<&LibraryHandle>,
    ) -> Result<NonNull<c_void>, ResolveError> {
        if let Some(addr) = self.cached() {
            return Ok(addr);
        }
        let Some(handle) = handle else {
            return Err(ResolveError::NoActiveHandle { symbol: self.name });
        };

        self.lookups.fetch_add(1, Ordering::Relaxed);
        let found = handle
            .symbol(self.name)
            .ok_or(ResolveError::SymbolMissing { symbol: self.name })?;

        match self.addr.compare_exchange(
            UNRESOLVED,
            found.as_ptr() as usize,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => Ok(found),
            // Lost the race: the first writer's address stands.
            Err(winner) => Ok(NonNull::new(winner as *mut c_void).unwrap_or(found)),
        }
    }
}

/// Name-indexed set of slots.
#[derive(Debug)]
pub struct DispatchTable {
    slots: Box<[DispatchSlot]>,
}

impl DispatchTable {
    #[must_use]
    pub fn new(names: &[&'static str]) -> Self {
        Self {
            slots: names.iter().map(|&name| DispatchSlot::new(name)).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&DispatchSlot> {
        self.slots.get(index)
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.name == name)
    }

    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_resolved()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DispatchSlot> {
        self.slots.iter()
    }
}

impl Index<usize> for DispatchTable {
    type Output = DispatchSlot;

    fn index(&self, index: usize) -> &DispatchSlot {
        &self.slots[index]
    }
}

// ---------------------------------------------------------------------------
// Error policy
// ---------------------------------------------------------------------------

/// C error callback: receives the unresolved symbol name and the context
/// pointer registered with it.
pub type ErrorCallback = unsafe extern "C" fn(symbol: *const c_char, context: *mut c_void);

/// Host-supplied context pointer, passed back verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackContext(pub *mut c_void);

// SAFETY: the shim never dereferences the pointer; thread-safety of the
// pointee is the host's responsibility, as with any C callback cookie.
unsafe impl Send for CallbackContext {}
unsafe impl Sync for CallbackContext {}

/// What happens when a slot cannot be resolved.
#[derive(Debug, Clone, Copy, Default)]
pub enum ErrorPolicy {
    /// Print the symbol name to stderr and abort the process.
    #[default]
    Abort,
    /// Print the symbol name and return the entry point's unresolved value.
    Log,
    /// Return the unresolved value silently.
    Propagate,
    /// Invoke a host callback; if it returns, return the unresolved value.
    Callback {
        callback: ErrorCallback,
        context: CallbackContext,
    },
}

impl ErrorPolicy {
    /// Apply the policy. Returns only if the policy lets the call continue.
    pub fn handle(&self, err: &ResolveError) {
        match *self {
            Self::Abort => abort_unresolved(err.symbol()),
            Self::Log => eprintln!("cpxlazy: unresolved symbol {}", err.symbol()),
            Self::Propagate => {}
            Self::Callback { callback, context } => {
                // Entry point names never contain NUL.
                let Ok(name) = CString::new(err.symbol()) else {
                    return;
                };
                // SAFETY: the host registered this callback for exactly this call shape.
                unsafe { callback(name.as_ptr(), context.0) };
            }
        }
    }
}

/// Default handler: report the missing name and terminate abnormally.
pub fn abort_unresolved(symbol: &str) -> ! {
    eprintln!("cpxlazy: unresolved symbol {symbol}");
    std::process::abort()
}

/// Value a forwarded entry point returns when its symbol could not be
/// resolved and the error policy returned.
pub trait Unresolved {
    fn unresolved() -> Self;
}

impl Unresolved for () {
    fn unresolved() -> Self {}
}

impl Unresolved for i32 {
    fn unresolved() -> Self {
        ERR_UNRESOLVED
    }
}

impl Unresolved for f64 {
    fn unresolved() -> Self {
        f64::NAN
    }
}

impl<T> Unresolved for *mut T {
    fn unresolved() -> Self {
        std::ptr::null_mut()
    }
}

impl<T> Unresolved for *const T {
    fn unresolved() -> Self {
        std::ptr::null()
    }
}
