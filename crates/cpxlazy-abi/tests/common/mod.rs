//! In-process fake vendor libraries for loader-independent tests.
//!
//! A [`FakeLoader`] serves "libraries" that are tables of Rust `extern "C"`
//! functions keyed by exported name. It records every open, close and
//! symbol lookup so tests can assert on resource balance. Vendor-side
//! environment counters are thread-local because each test runs on its own
//! thread and the probe calls vendor functions synchronously.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::ffi::{CStr, c_char, c_int, c_void};
use std::ptr::NonNull;
use std::sync::{Arc, Mutex};

use cpxlazy_abi::loader::{Loader, RawHandle};
use cpxlazy_abi::state::ShimContext;
use cpxlazy_core::candidates::{Candidate, CandidateOrigin};
use cpxlazy_core::config::ShimConfig;

pub const ENV_TOKEN: usize = 0xE17;
pub const OPEN_ENV_FAILURE: c_int = 1024;
pub const NUM_ROWS: c_int = 42;

/// Slot names used by test contexts.
pub const TEST_ENTRY_POINTS: &[&str] = &["CPXgetnumrows", "CPXlpopt", "CPXnotexported"];

thread_local! {
    static ENV_OPENS: Cell<usize> = const { Cell::new(0) };
    static ENV_CLOSES: Cell<usize> = const { Cell::new(0) };
}

/// `(opened, closed)` vendor environments on this thread.
pub fn env_balance() -> (usize, usize) {
    (ENV_OPENS.with(Cell::get), ENV_CLOSES.with(Cell::get))
}

// ---------------------------------------------------------------------------
// Fake vendor entry points
// ---------------------------------------------------------------------------

pub unsafe extern "C" fn open_env_ok(status_p: *mut c_int) -> *mut c_void {
    ENV_OPENS.with(|c| c.set(c.get() + 1));
    unsafe { *status_p = 0 };
    ENV_TOKEN as *mut c_void
}

pub unsafe extern "C" fn open_env_fails(status_p: *mut c_int) -> *mut c_void {
    unsafe { *status_p = OPEN_ENV_FAILURE };
    std::ptr::null_mut()
}

pub unsafe extern "C" fn close_env(env_p: *mut *mut c_void) -> c_int {
    ENV_CLOSES.with(|c| c.set(c.get() + 1));
    unsafe { *env_p = std::ptr::null_mut() };
    0
}

pub unsafe extern "C" fn version_number_12_6(_env: *const c_void, v: *mut c_int) -> c_int {
    unsafe { *v = 12_060_000 };
    0
}

pub unsafe extern "C" fn version_number_12_5(_env: *const c_void, v: *mut c_int) -> c_int {
    unsafe { *v = 12_050_000 };
    0
}

pub unsafe extern "C" fn version_number_22_1(_env: *const c_void, v: *mut c_int) -> c_int {
    unsafe { *v = 22_010_000 };
    0
}

pub unsafe extern "C" fn version_number_fails(_env: *const c_void, _v: *mut c_int) -> c_int {
    1
}

pub unsafe extern "C" fn version_string_12_6(_env: *const c_void) -> *const c_char {
    c"12.6.0.0".as_ptr()
}

pub unsafe extern "C" fn version_string_three_segments(_env: *const c_void) -> *const c_char {
    c"12.6.0".as_ptr()
}

pub unsafe extern "C" fn get_num_rows(_env: *const c_void, _lp: *const c_void) -> c_int {
    NUM_ROWS
}

pub unsafe extern "C" fn lp_opt(_env: *const c_void, _lp: *mut c_void) -> c_int {
    0
}

pub fn addr_of_open_env_ok() -> usize {
    open_env_ok as usize
}

// ---------------------------------------------------------------------------
// Fake libraries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FakeLibrary {
    pub path: String,
    symbols: HashMap<&'static str, usize>,
}

impl FakeLibrary {
    pub fn empty(path: &str) -> Self {
        Self {
            path: path.to_string(),
            symbols: HashMap::new(),
        }
    }

    pub fn with(mut self, name: &'static str, addr: usize) -> Self {
        self.symbols.insert(name, addr);
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.symbols.remove(name);
        self
    }

    /// A complete vendor library reporting `version_fn` numerically.
    pub fn vendor(path: &str, version_fn: usize) -> Self {
        Self::empty(path)
            .with("CPXopenCPLEX", open_env_ok as usize)
            .with("CPXcloseCPLEX", close_env as usize)
            .with("CPXversionnumber", version_fn)
            .with("CPXgetnumrows", get_num_rows as usize)
            .with("CPXlpopt", lp_opt as usize)
    }

    /// Vendor library at 12.6.0.0.
    pub fn vendor_12_6(path: &str) -> Self {
        Self::vendor(path, version_number_12_6 as usize)
    }

    /// Vendor library with only the string-form version query.
    pub fn vendor_string_only(path: &str, version_string_fn: usize) -> Self {
        Self::vendor_12_6(path)
            .without("CPXversionnumber")
            .with("CPXversion", version_string_fn)
    }
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub opens: Vec<String>,
    pub closes: usize,
    pub open_handles: HashSet<usize>,
    pub lookups: Vec<String>,
}

#[derive(Debug)]
pub struct FakeLoader {
    libraries: Vec<FakeLibrary>,
    pub state: Mutex<FakeState>,
}

const HANDLE_STRIDE: usize = 0x100;

impl FakeLoader {
    pub fn new(libraries: Vec<FakeLibrary>) -> Arc<Self> {
        Arc::new(Self {
            libraries,
            state: Mutex::new(FakeState::default()),
        })
    }

    pub fn as_loader(self: &Arc<Self>) -> Arc<dyn Loader> {
        Arc::clone(self) as Arc<dyn Loader>
    }

    /// Handle a host would have obtained by opening `path` itself.
    pub fn host_handle(&self, path: &str) -> RawHandle {
        let index = self
            .libraries
            .iter()
            .position(|lib| lib.path == path)
            .expect("unknown fake library");
        RawHandle::from_ptr(((index + 1) * HANDLE_STRIDE) as *mut c_void).unwrap()
    }

    pub fn opens(&self) -> usize {
        self.state.lock().unwrap().opens.len()
    }

    pub fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }

    pub fn currently_open(&self) -> usize {
        self.state.lock().unwrap().open_handles.len()
    }

    pub fn lookups_of(&self, name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .lookups
            .iter()
            .filter(|n| n.as_str() == name)
            .count()
    }

    fn library(&self, handle: RawHandle) -> Option<&FakeLibrary> {
        let index = (handle.as_ptr() as usize / HANDLE_STRIDE).checked_sub(1)?;
        self.libraries.get(index)
    }
}

impl Loader for FakeLoader {
    unsafe fn open(&self, path: &CStr) -> Result<RawHandle, String> {
        let path = path.to_str().map_err(|e| e.to_string())?;
        let mut state = self.state.lock().unwrap();
        state.opens.push(path.to_string());
        let index = self
            .libraries
            .iter()
            .position(|lib| lib.path == path)
            .ok_or_else(|| format!("{path}: cannot open shared object file"))?;
        let raw = (index + 1) * HANDLE_STRIDE;
        state.open_handles.insert(raw);
        Ok(RawHandle::from_ptr(raw as *mut c_void).unwrap())
    }

    fn symbol(&self, handle: RawHandle, name: &str) -> Option<NonNull<c_void>> {
        self.state.lock().unwrap().lookups.push(name.to_string());
        let addr = *self.library(handle)?.symbols.get(name)?;
        NonNull::new(addr as *mut c_void)
    }

    fn close(&self, handle: RawHandle) {
        let mut state = self.state.lock().unwrap();
        state.closes += 1;
        let removed = state.open_handles.remove(&(handle.as_ptr() as usize));
        assert!(removed, "close of a handle that is not open");
    }
}

/// Context over `fake` with a fixed candidate list and debug off.
pub fn context(fake: &Arc<FakeLoader>, candidates: &[&str]) -> ShimContext {
    let candidates: Vec<Candidate> = candidates
        .iter()
        .map(|path| Candidate::new(*path, CandidateOrigin::Default))
        .collect();
    ShimContext::new(fake.as_loader(), TEST_ENTRY_POINTS)
        .with_config_source(ShimConfig::default)
        .with_candidate_source(move |_| candidates.clone())
}
