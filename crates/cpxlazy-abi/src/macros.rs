//! Trampoline generation.
//!
//! `entry_points!` turns a `(name, signature)` table into:
//! - `ENTRY_POINT_NAMES`, the exported names in slot order,
//! - `EntryPoint`, an enum whose discriminants are the slot indices,
//! - one `#[unsafe(no_mangle)] pub unsafe extern "C" fn` per entry that
//!   resolves its slot in the global context on first call and forwards.
//!
//! Entries in the `variadic` section are called through a C-variadic
//! function pointer with only the fixed-argument prefix; trailing variadic
//! arguments from the caller are not forwarded.
//!
//! # Usage
//!
//! ```ignore
//! entry_points! {
//!     fixed {
//!         fn CPXgetnumrows(env: CPXCENVptr, lp: CPXCLPptr) -> c_int;
//!     }
//!     variadic {
//!         fn CPXmsg(channel: CPXCHANNELptr, format: *const c_char) -> c_int;
//!     }
//! }
//! ```

macro_rules! entry_points {
    (
        fixed {
            $(
                $(#[$fmeta:meta])*
                fn $fname:ident( $($farg:ident : $fty:ty),* $(,)? ) -> $fret:ty;
            )*
        }
        variadic {
            $(
                $(#[$vmeta:meta])*
                fn $vname:ident( $($varg:ident : $vty:ty),* $(,)? ) -> $vret:ty;
            )*
        }
    ) => {
        /// Exported vendor entry points, in dispatch slot order.
        pub const ENTRY_POINT_NAMES: &[&str] = &[
            $( stringify!($fname), )*
            $( stringify!($vname), )*
        ];

        /// Dispatch slot index of each entry point.
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(usize)]
        pub enum EntryPoint {
            $( $fname, )*
            $( $vname, )*
        }

        impl EntryPoint {
            #[must_use]
            pub const fn index(self) -> usize {
                self as usize
            }
        }

        $(
            entry_points!(@trampoline fixed [$(#[$fmeta])*] $fname ( $($farg : $fty),* ) -> $fret);
        )*
        $(
            entry_points!(@trampoline variadic [$(#[$vmeta])*] $vname ( $($varg : $vty),* ) -> $vret);
        )*
    };

    (@trampoline $kind:ident [$(#[$meta:meta])*] $name:ident ( $($arg:ident : $argty:ty),* ) -> $ret:ty) => {
        $(#[$meta])*
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name( $($arg : $argty),* ) -> $ret {
            match $crate::state::global().entry(EntryPoint::$name.index()) {
                Some(addr) => {
                    // SAFETY: the slot holds the vendor's export of this exact
                    // name, whose signature is the one declared here.
                    let real: entry_points!(@fnptr $kind ( $($argty),* ) -> $ret) =
                        unsafe { $crate::loader::fn_from_addr(addr) };
                    unsafe { real( $($arg),* ) }
                }
                None => <$ret as $crate::dispatch::Unresolved>::unresolved(),
            }
        }
    };

    (@fnptr fixed ( $($argty:ty),* ) -> $ret:ty) => {
        unsafe extern "C" fn( $($argty),* ) -> $ret
    };

    (@fnptr variadic ( $($argty:ty),* ) -> $ret:ty) => {
        unsafe extern "C" fn( $($argty,)* ... ) -> $ret
    };
}
