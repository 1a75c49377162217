//! Forwarding entry points for the vendor API.
//!
//! Generated from the `(name, signature)` table below. Each function resolves
//! its own dispatch slot against the active library on first call. Adding a
//! vendor function means adding one line here.

#![allow(non_snake_case, clippy::too_many_arguments)]

use std::ffi::{c_char, c_int, c_void};

pub type CPXENVptr = *mut c_void;
pub type CPXCENVptr = *const c_void;
pub type CPXLPptr = *mut c_void;
pub type CPXCLPptr = *const c_void;
pub type CPXCHANNELptr = *mut c_void;
pub type CPXINT = c_int;

entry_points! {
    fixed {
        // Environment
        fn CPXopenCPLEX(status_p: *mut c_int) -> CPXENVptr;
        fn CPXcloseCPLEX(env_p: *mut CPXENVptr) -> c_int;
        fn CPXversion(env: CPXCENVptr) -> *const c_char;
        fn CPXversionnumber(env: CPXCENVptr, version_p: *mut c_int) -> c_int;
        fn CPXgeterrorstring(env: CPXCENVptr, errcode: c_int, buffer_str: *mut c_char) -> *const c_char;
        fn CPXsetlogfilename(env: CPXCENVptr, filename: *const c_char, mode: *const c_char) -> c_int;

        // Parameters
        fn CPXsetintparam(env: CPXENVptr, whichparam: c_int, newvalue: CPXINT) -> c_int;
        fn CPXgetintparam(env: CPXCENVptr, whichparam: c_int, value_p: *mut CPXINT) -> c_int;
        fn CPXsetdblparam(env: CPXENVptr, whichparam: c_int, newvalue: f64) -> c_int;
        fn CPXgetdblparam(env: CPXCENVptr, whichparam: c_int, value_p: *mut f64) -> c_int;

        // Problem lifecycle and I/O
        fn CPXcreateprob(env: CPXCENVptr, status_p: *mut c_int, probname_str: *const c_char) -> CPXLPptr;
        fn CPXfreeprob(env: CPXCENVptr, lp_p: *mut CPXLPptr) -> c_int;
        fn CPXreadcopyprob(env: CPXCENVptr, lp: CPXLPptr, filename_str: *const c_char, filetype_str: *const c_char) -> c_int;
        fn CPXwriteprob(env: CPXCENVptr, lp: CPXCLPptr, filename_str: *const c_char, filetype_str: *const c_char) -> c_int;
        fn CPXchgprobtype(env: CPXCENVptr, lp: CPXLPptr, type_: c_int) -> c_int;
        fn CPXgetprobtype(env: CPXCENVptr, lp: CPXCLPptr) -> c_int;

        // Model construction
        fn CPXchgobjsen(env: CPXCENVptr, lp: CPXLPptr, maxormin: c_int) -> c_int;
        fn CPXnewcols(env: CPXCENVptr, lp: CPXLPptr, ccnt: c_int, obj: *const f64, lb: *const f64, ub: *const f64, xctype: *const c_char, colname: *mut *mut c_char) -> c_int;
        fn CPXnewrows(env: CPXCENVptr, lp: CPXLPptr, rcnt: c_int, rhs: *const f64, sense: *const c_char, rngval: *const f64, rowname: *mut *mut c_char) -> c_int;
        fn CPXaddrows(env: CPXCENVptr, lp: CPXLPptr, ccnt: c_int, rcnt: c_int, nzcnt: c_int, rhs: *const f64, sense: *const c_char, rmatbeg: *const c_int, rmatind: *const c_int, rmatval: *const f64, colname: *mut *mut c_char, rowname: *mut *mut c_char) -> c_int;
        fn CPXchgobj(env: CPXCENVptr, lp: CPXLPptr, cnt: c_int, indices: *const c_int, values: *const f64) -> c_int;
        fn CPXchgbds(env: CPXCENVptr, lp: CPXLPptr, cnt: c_int, indices: *const c_int, lu: *const c_char, bd: *const f64) -> c_int;
        fn CPXchgcoef(env: CPXCENVptr, lp: CPXLPptr, i: c_int, j: c_int, newvalue: f64) -> c_int;
        fn CPXgetnumrows(env: CPXCENVptr, lp: CPXCLPptr) -> c_int;
        fn CPXgetnumcols(env: CPXCENVptr, lp: CPXCLPptr) -> c_int;

        // Optimization and solution queries
        fn CPXlpopt(env: CPXCENVptr, lp: CPXLPptr) -> c_int;
        fn CPXmipopt(env: CPXCENVptr, lp: CPXLPptr) -> c_int;
        fn CPXgetstat(env: CPXCENVptr, lp: CPXCLPptr) -> c_int;
        fn CPXgetobjval(env: CPXCENVptr, lp: CPXCLPptr, objval_p: *mut f64) -> c_int;
        fn CPXgetx(env: CPXCENVptr, lp: CPXCLPptr, x: *mut f64, begin: c_int, end: c_int) -> c_int;
        fn CPXsolution(env: CPXCENVptr, lp: CPXCLPptr, lpstat_p: *mut c_int, objval_p: *mut f64, x: *mut f64, pi: *mut f64, slack: *mut f64, dj: *mut f64) -> c_int;

        // Message channels
        fn CPXgetchannels(env: CPXCENVptr, cpxresults_p: *mut CPXCHANNELptr, cpxwarning_p: *mut CPXCHANNELptr, cpxerror_p: *mut CPXCHANNELptr, cpxlog_p: *mut CPXCHANNELptr) -> c_int;
        fn CPXmsgstr(channel: CPXCHANNELptr, msg_str: *const c_char) -> c_int;
    }
    variadic {
        /// Only `channel` and `format` are forwarded; format arguments are dropped.
        fn CPXmsg(channel: CPXCHANNELptr, format: *const c_char) -> c_int;
    }
}
