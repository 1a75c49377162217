// Exported entry points take raw pointers from C callers and forward them
// unchanged; per-function safety docs would restate the vendor's contract.
#![allow(clippy::missing_safety_doc)]
//! # cpxlazy-abi
//!
//! Lazy-binding shim for the CPLEX callable library.
//!
//! A program links against this `cdylib` instead of the vendor library. The
//! vendor library is located and loaded only when asked (`cpxlazy_initialize`
//! or `cpxlazy_try_load`), and each forwarded `CPX*` entry point resolves its
//! real address on first call.
//!
//! # Architecture
//!
//! ```text
//! cpxlazy_initialize ─► resolver (override, defaults, install-tree glob)
//!                    ─► probe (open, env handshake, version gate)
//!                    ─► ShimContext (active handle, atexit teardown)
//!
//! CPXfoo(args) ─► dispatch slot (cached? else dlsym once) ─► vendor CPXfoo(args)
//!                          └─ unresolved ─► ErrorPolicy (abort by default)
//! ```
//!
//! Failure to find a library is reported as a status and is not fatal; the
//! first call through an unresolvable entry point is.

#[macro_use]
mod macros;

pub mod diag;
pub mod dispatch;
pub mod entry_points;
pub mod handle;
pub mod loader;
pub mod probe;
pub mod resolver;
pub mod shim_abi;
pub mod state;

pub use dispatch::{DispatchSlot, DispatchTable, ErrorPolicy};
pub use handle::LibraryHandle;
pub use loader::{Loader, RawHandle, SystemLoader};
pub use state::{ShimContext, global};
