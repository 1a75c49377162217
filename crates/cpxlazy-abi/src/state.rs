//! Process state: the active library, discovery lifecycle, error policy and
//! dispatch table.
//!
//! A [`ShimContext`] is an explicit, injectable object. The exported C
//! surface and the generated trampolines use the process-wide instance from
//! [`global`], which registers an `atexit` teardown on first acceptance.
//!
//! Locking: the load state mutex is held for the whole of `initialize`,
//! `try_load`, `set_handle` and `verify_handle`, and while a slot performs
//! its first lookup. Resolved slots are read without locking.

use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};

use cpxlazy_core::candidates::Candidate;
use cpxlazy_core::config::ShimConfig;
use cpxlazy_core::error::{LoadError, ResolveError};
use cpxlazy_core::version::EncodedVersion;

use crate::diag::{DiagRecord, Diagnostics, Level};
use crate::dispatch::{DispatchTable, ErrorPolicy};
use crate::entry_points::ENTRY_POINT_NAMES;
use crate::handle::LibraryHandle;
use crate::loader::{Loader, RawHandle, SystemLoader};
use crate::probe;
use crate::resolver;

type ConfigSource = Box<dyn Fn() -> ShimConfig + Send + Sync>;
type CandidateSource = Box<dyn Fn(&ShimConfig) -> Vec<Candidate> + Send + Sync>;

#[derive(Debug, Default)]
struct LoadState {
    active: Option<LibraryHandle>,
    /// Owned handles displaced by `set_handle`; resolved slots may still
    /// point into them, so they stay loaded until teardown.
    retired: Vec<LibraryHandle>,
    /// Set by `try_load`; later `initialize` calls skip discovery.
    manual_attempted: bool,
    teardown_registered: bool,
}

/// Everything the shim knows about the vendor library.
pub struct ShimContext {
    loader: Arc<dyn Loader>,
    config: ConfigSource,
    candidates: CandidateSource,
    exit_hook: Option<extern "C" fn()>,
    state: Mutex<LoadState>,
    policy: RwLock<ErrorPolicy>,
    debug: AtomicBool,
    dispatch: DispatchTable,
}

impl ShimContext {
    /// Context over `loader` with one dispatch slot per name. Reads the
    /// environment for configuration and searches the platform candidates.
    #[must_use]
    pub fn new(loader: Arc<dyn Loader>, entry_points: &[&'static str]) -> Self {
        Self {
            loader,
            config: Box::new(ShimConfig::from_env),
            candidates: Box::new(resolver::platform_candidates),
            exit_hook: None,
            state: Mutex::new(LoadState::default()),
            policy: RwLock::new(ErrorPolicy::default()),
            debug: AtomicBool::new(false),
            dispatch: DispatchTable::new(entry_points),
        }
    }

    /// Replace the configuration source (default: process environment).
    #[must_use]
    pub fn with_config_source<F>(mut self, source: F) -> Self
    where
        F: Fn() -> ShimConfig + Send + Sync + 'static,
    {
        self.config = Box::new(source);
        self
    }

    /// Replace the candidate source (default: platform plan plus glob).
    #[must_use]
    pub fn with_candidate_source<F>(mut self, source: F) -> Self
    where
        F: Fn(&ShimConfig) -> Vec<Candidate> + Send + Sync + 'static,
    {
        self.candidates = Box::new(source);
        self
    }

    /// Register `hook` with `atexit` the first time a library is accepted.
    #[must_use]
    pub fn with_exit_hook(mut self, hook: extern "C" fn()) -> Self {
        self.exit_hook = Some(hook);
        self
    }

    #[must_use]
    pub fn dispatch(&self) -> &DispatchTable {
        &self.dispatch
    }

    /// Re-read configuration at the start of `initialize` / `try_load`.
    fn begin(&self) -> (ShimConfig, Diagnostics) {
        let config = (self.config)();
        self.debug.store(config.debug, Ordering::Relaxed);
        let diag = Diagnostics::new(config.debug);
        (config, diag)
    }

    // -----------------------------------------------------------------------
    // Discovery
    // -----------------------------------------------------------------------

    /// Find and accept a library unless one is already active.
    pub fn initialize(&self, minimum: EncodedVersion) -> Result<(), LoadError> {
        let (config, diag) = self.begin();

        let mut state = self.state.lock();
        if state.active.is_some() {
            return Ok(());
        }
        if state.manual_attempted {
            diag.emit(DiagRecord::new(Level::Info, "discovery_bypassed"));
            return Err(LoadError::DiscoveryBypassed);
        }

        let candidates = (self.candidates)(&config);
        diag.emit(
            DiagRecord::new(Level::Info, "discovery_start")
                .with_required(minimum)
                .with_count(candidates.len()),
        );

        let mut last = None;
        for candidate in &candidates {
            diag.emit(DiagRecord::new(Level::Debug, "candidate").with_candidate(candidate));
            match probe::probe(&self.loader, &candidate.path, minimum) {
                Ok(accepted) => {
                    diag.emit(
                        DiagRecord::new(Level::Info, "probe_accept")
                            .with_candidate(candidate)
                            .with_version(accepted.version),
                    );
                    self.activate(&mut state, accepted.handle);
                    return Ok(());
                }
                Err(rejection) => {
                    diag.emit(
                        DiagRecord::new(Level::Warn, "probe_reject")
                            .with_candidate(candidate)
                            .with_rejection(&rejection),
                    );
                    last = Some(rejection);
                }
            }
        }

        diag.emit(DiagRecord::new(Level::Error, "discovery_exhausted").with_count(candidates.len()));
        Err(match last {
            Some(last) => LoadError::Exhausted {
                tried: candidates.len(),
                last,
            },
            None => LoadError::NoCandidates,
        })
    }

    /// Probe one caller-supplied path, bypassing candidate resolution.
    ///
    /// After this call `initialize` never runs discovery, whether or not the
    /// path was accepted.
    pub fn try_load(&self, path: &str, minimum: EncodedVersion) -> Result<(), LoadError> {
        let (_, diag) = self.begin();

        let mut state = self.state.lock();
        state.manual_attempted = true;
        if state.active.is_some() {
            return Ok(());
        }

        match probe::probe(&self.loader, path, minimum) {
            Ok(accepted) => {
                diag.emit(
                    DiagRecord::new(Level::Info, "probe_accept")
                        .with_path(path)
                        .with_version(accepted.version),
                );
                self.activate(&mut state, accepted.handle);
                Ok(())
            }
            Err(rejection) => {
                diag.emit(
                    DiagRecord::new(Level::Warn, "probe_reject")
                        .with_path(path)
                        .with_rejection(&rejection),
                );
                Err(LoadError::Rejected(rejection))
            }
        }
    }

    fn activate(&self, state: &mut LoadState, handle: LibraryHandle) {
        state.active = Some(handle);
        if state.teardown_registered {
            return;
        }
        state.teardown_registered = true;
        if let Some(hook) = self.exit_hook {
            // SAFETY: hook is a plain `extern "C" fn()` with static lifetime.
            unsafe {
                libc::atexit(hook);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Manual handle control
    // -----------------------------------------------------------------------

    /// The active library, if any.
    #[must_use]
    pub fn handle(&self) -> Option<RawHandle> {
        self.state.lock().active.as_ref().map(LibraryHandle::raw)
    }

    /// Path of the active library (`<injected>` for borrowed handles).
    #[must_use]
    pub fn active_path(&self) -> Option<String> {
        self.state
            .lock()
            .active
            .as_ref()
            .map(|h| h.path().to_string())
    }

    /// Install a library the host loaded itself, or clear with `None`.
    ///
    /// The handle is not validated; call [`Self::verify_handle`] to run the
    /// handshake against it. The shim never closes an injected handle. An
    /// owned handle displaced by this call stays loaded until teardown.
    pub fn set_handle(&self, raw: Option<RawHandle>) {
        let diag = Diagnostics::new(self.debug.load(Ordering::Relaxed));
        let mut state = self.state.lock();
        if let Some(previous) = state.active.take() {
            if previous.is_owned() {
                state.retired.push(previous);
            }
        }
        state.active = raw.map(|raw| LibraryHandle::borrowed(Arc::clone(&self.loader), raw));
        diag.emit(DiagRecord::new(Level::Info, "handle_set").with_count(usize::from(raw.is_some())));
    }

    /// Run the version handshake against the active handle without unloading it.
    pub fn verify_handle(&self, minimum: EncodedVersion) -> Result<EncodedVersion, LoadError> {
        let state = self.state.lock();
        let handle = state.active.as_ref().ok_or(LoadError::NoActiveHandle)?;
        probe::handshake(handle, minimum).map_err(LoadError::Rejected)
    }

    /// Release every owned library. Resolved slots are left dangling; calling
    /// through them afterwards is undefined.
    pub fn teardown(&self) {
        let diag = Diagnostics::new(self.debug.load(Ordering::Relaxed));
        let (active, retired) = {
            let mut state = self.state.lock();
            (state.active.take(), std::mem::take(&mut state.retired))
        };
        let released = usize::from(active.as_ref().is_some_and(LibraryHandle::is_owned))
            + retired.len();
        drop(active);
        drop(retired);
        if released > 0 {
            diag.emit(DiagRecord::new(Level::Info, "teardown").with_count(released));
        }
    }

    // -----------------------------------------------------------------------
    // Error policy and resolution
    // -----------------------------------------------------------------------

    /// Replace the unresolved-symbol policy. Applies to later resolutions only.
    pub fn set_error_policy(&self, policy: ErrorPolicy) {
        *self.policy.write() = policy;
    }

    #[must_use]
    pub fn error_policy(&self) -> ErrorPolicy {
        *self.policy.read()
    }

    /// Resolve slot `index`, returning the failure as a value.
    pub fn resolve(&self, index: usize) -> Result<NonNull<c_void>, ResolveError> {
        let slot = &self.dispatch[index];
        if let Some(addr) = slot.cached() {
            return Ok(addr);
        }
        let state = self.state.lock();
        slot.resolve_with(state.active.as_ref())
    }

    /// Resolve by exported name. `None` for names not in the table.
    pub fn resolve_by_name(&self, name: &str) -> Option<Result<NonNull<c_void>, ResolveError>> {
        self.dispatch.index_of(name).map(|index| self.resolve(index))
    }

    /// Resolve slot `index` for a trampoline. On failure the error policy
    /// runs; `None` is returned only if the policy lets the call continue.
    #[inline]
    pub fn entry(&self, index: usize) -> Option<NonNull<c_void>> {
        match self.resolve(index) {
            Ok(addr) => Some(addr),
            Err(err) => {
                self.report_unresolved(&err);
                None
            }
        }
    }

    #[cold]
    fn report_unresolved(&self, err: &ResolveError) {
        Diagnostics::new(self.debug.load(Ordering::Relaxed))
            .emit(DiagRecord::new(Level::Error, "symbol_unresolved").with_resolve_error(err));
        // Copy out so a callback may replace the policy without deadlocking.
        let policy = self.error_policy();
        policy.handle(err);
    }
}

impl std::fmt::Debug for ShimContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShimContext")
            .field("state", &*self.state.lock())
            .field("policy", &self.error_policy())
            .field("dispatch_len", &self.dispatch.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Process-wide instance
// ---------------------------------------------------------------------------

static GLOBAL: OnceLock<ShimContext> = OnceLock::new();

/// The process-wide context used by the exported C surface.
pub fn global() -> &'static ShimContext {
    GLOBAL.get_or_init(|| {
        ShimContext::new(Arc::new(SystemLoader), ENTRY_POINT_NAMES).with_exit_hook(global_teardown)
    })
}

extern "C" fn global_teardown() {
    if let Some(ctx) = GLOBAL.get() {
        ctx.teardown();
    }
}
