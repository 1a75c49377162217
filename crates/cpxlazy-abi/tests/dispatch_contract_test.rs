//! Dispatch contract: one lookup per slot, forwarding, and the
//! unresolved-symbol policies.
//!
//! Run: cargo test -p cpxlazy-abi --test dispatch_contract_test

mod common;

use std::ffi::{CStr, c_char, c_int, c_void};
use std::process::Command;
use std::sync::{Arc, Mutex};

use common::*;
use cpxlazy_abi::dispatch::{CallbackContext, ErrorPolicy, Unresolved};
use cpxlazy_abi::loader::fn_from_addr;
use cpxlazy_core::error::ResolveError;
use cpxlazy_core::status::ERR_UNRESOLVED;
use cpxlazy_core::version::EncodedVersion;

const V12_6: EncodedVersion = EncodedVersion::from_raw(12_060_000);
const ABORT_CHILD_ENV: &str = "CPXLAZY_TEST_ABORT_CHILD";

type GetNumRowsFn = unsafe extern "C" fn(*const c_void, *const c_void) -> c_int;

fn loaded_context() -> (Arc<FakeLoader>, cpxlazy_abi::ShimContext) {
    let fake = FakeLoader::new(vec![FakeLibrary::vendor_12_6("libcplex.so")]);
    let ctx = context(&fake, &["libcplex.so"]);
    ctx.initialize(V12_6).expect("fake vendor library accepted");
    (fake, ctx)
}

fn index(ctx: &cpxlazy_abi::ShimContext, name: &str) -> usize {
    ctx.dispatch().index_of(name).expect("name is in the test table")
}

#[test]
fn slot_is_looked_up_once_across_many_calls() {
    let (fake, ctx) = loaded_context();
    let slot = index(&ctx, "CPXgetnumrows");

    for _ in 0..100 {
        ctx.resolve(slot).unwrap();
    }

    assert_eq!(fake.lookups_of("CPXgetnumrows"), 1);
    assert_eq!(ctx.dispatch()[slot].lookups(), 1);
    assert!(ctx.dispatch()[slot].is_resolved());
}

#[test]
fn forwarded_call_returns_vendor_value() {
    let (_fake, ctx) = loaded_context();

    let addr = ctx.entry(index(&ctx, "CPXgetnumrows")).unwrap();
    // SAFETY: the fake exports get_num_rows under this name.
    let real: GetNumRowsFn = unsafe { fn_from_addr(addr) };

    assert_eq!(unsafe { real(std::ptr::null(), std::ptr::null()) }, NUM_ROWS);
}

#[test]
fn concurrent_first_calls_agree_on_one_address() {
    let (_fake, ctx) = loaded_context();
    let ctx = Arc::new(ctx);
    let slot = index(&ctx, "CPXlpopt");

    let threads: Vec<_> = (0..8)
        .map(|_| {
            let ctx = Arc::clone(&ctx);
            std::thread::spawn(move || ctx.resolve(slot).unwrap().as_ptr() as usize)
        })
        .collect();
    let addrs: Vec<usize> = threads.into_iter().map(|t| t.join().unwrap()).collect();

    assert!(addrs.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(ctx.dispatch()[slot].lookups(), 1);
}

#[test]
fn resolved_slot_survives_handle_replacement() {
    let fake = FakeLoader::new(vec![
        FakeLibrary::vendor_12_6("first.so"),
        FakeLibrary::vendor_12_6("second.so").with("CPXgetnumrows", lp_opt as usize),
    ]);
    let ctx = context(&fake, &["first.so"]);
    ctx.initialize(V12_6).unwrap();
    let slot = index(&ctx, "CPXgetnumrows");

    let before = ctx.resolve(slot).unwrap();
    ctx.set_handle(Some(fake.host_handle("second.so")));
    let after = ctx.resolve(slot).unwrap();

    assert_eq!(before, after);
    assert_eq!(fake.lookups_of("CPXgetnumrows"), 1);
}

#[test]
fn resolution_without_handle_retries_after_load() {
    let fake = FakeLoader::new(vec![FakeLibrary::vendor_12_6("libcplex.so")]);
    let ctx = context(&fake, &["libcplex.so"]);
    ctx.set_error_policy(ErrorPolicy::Propagate);
    let slot = index(&ctx, "CPXgetnumrows");

    assert_eq!(
        ctx.resolve(slot).unwrap_err(),
        ResolveError::NoActiveHandle {
            symbol: "CPXgetnumrows"
        }
    );
    assert!(ctx.entry(slot).is_none());
    assert_eq!(ctx.dispatch()[slot].lookups(), 0);

    ctx.initialize(V12_6).unwrap();
    assert!(ctx.entry(slot).is_some());
}

#[test]
fn missing_symbol_is_reported_by_name() {
    let (fake, ctx) = loaded_context();

    let err = ctx.resolve_by_name("CPXnotexported").unwrap().unwrap_err();

    assert_eq!(
        err,
        ResolveError::SymbolMissing {
            symbol: "CPXnotexported"
        }
    );
    assert_eq!(fake.lookups_of("CPXnotexported"), 1);
    assert!(ctx.resolve_by_name("CPXnotinthetable").is_none());
}

unsafe extern "C" fn record_symbol(symbol: *const c_char, context: *mut c_void) {
    // SAFETY: the test registers a `Mutex<Vec<String>>` as the context.
    let seen = unsafe { &*(context as *const Mutex<Vec<String>>) };
    // SAFETY: the shim passes a NUL-terminated entry point name.
    let name = unsafe { CStr::from_ptr(symbol) }.to_string_lossy().into_owned();
    seen.lock().unwrap().push(name);
}

#[test]
fn callback_receives_exact_symbol_and_context() {
    let (_fake, ctx) = loaded_context();
    let seen = Box::new(Mutex::new(Vec::<String>::new()));
    ctx.set_error_policy(ErrorPolicy::Callback {
        callback: record_symbol,
        context: CallbackContext(&*seen as *const Mutex<Vec<String>> as *mut c_void),
    });

    let slot = index(&ctx, "CPXnotexported");
    assert!(ctx.entry(slot).is_none());
    assert!(ctx.entry(slot).is_none());

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["CPXnotexported".to_string(), "CPXnotexported".to_string()]
    );
    assert!(!ctx.dispatch()[slot].is_resolved());
}

unsafe extern "C" fn switch_to_propagate(_symbol: *const c_char, context: *mut c_void) {
    // SAFETY: the test registers its `ShimContext` as the context.
    let ctx = unsafe { &*(context as *const cpxlazy_abi::ShimContext) };
    ctx.set_error_policy(ErrorPolicy::Propagate);
}

#[test]
fn callback_may_replace_the_policy() {
    let (_fake, ctx) = loaded_context();
    ctx.set_error_policy(ErrorPolicy::Callback {
        callback: switch_to_propagate,
        context: CallbackContext(&ctx as *const cpxlazy_abi::ShimContext as *mut c_void),
    });

    assert!(ctx.entry(index(&ctx, "CPXnotexported")).is_none());
    assert!(matches!(ctx.error_policy(), ErrorPolicy::Propagate));
}

#[test]
fn log_and_propagate_return_to_caller() {
    let (_fake, ctx) = loaded_context();
    let slot = index(&ctx, "CPXnotexported");

    ctx.set_error_policy(ErrorPolicy::Log);
    assert!(ctx.entry(slot).is_none());
    ctx.set_error_policy(ErrorPolicy::Propagate);
    assert!(ctx.entry(slot).is_none());
}

#[test]
fn unresolved_values_by_return_type() {
    assert_eq!(<c_int as Unresolved>::unresolved(), ERR_UNRESOLVED);
    assert!(<f64 as Unresolved>::unresolved().is_nan());
    assert!(<*mut c_void as Unresolved>::unresolved().is_null());
    assert!(<*const c_char as Unresolved>::unresolved().is_null());
}

#[test]
fn default_policy_is_abort() {
    let (_fake, ctx) = loaded_context();
    assert!(matches!(ctx.error_policy(), ErrorPolicy::Abort));
}

/// Re-runs itself in a child process where the default handler aborts.
#[test]
fn default_handler_aborts_with_symbol_name() {
    if std::env::var_os(ABORT_CHILD_ENV).is_some() {
        let (_fake, ctx) = loaded_context();
        let _ = ctx.entry(index(&ctx, "CPXnotexported"));
        unreachable!("default policy returned");
    }

    let exe = std::env::current_exe().expect("test binary path");
    let output = Command::new(exe)
        .args([
            "--exact",
            "default_handler_aborts_with_symbol_name",
            "--nocapture",
            "--test-threads=1",
        ])
        .env(ABORT_CHILD_ENV, "1")
        .output()
        .expect("spawn child test process");

    assert!(!output.status.success(), "child must terminate abnormally");
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(output.status.signal(), Some(libc::SIGABRT));
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("cpxlazy: unresolved symbol CPXnotexported"),
        "stderr: {stderr}"
    );
}
