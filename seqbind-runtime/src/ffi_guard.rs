// FFI boundary guard: keeps panics from unwinding into a foreign caller.
//
// A panic inside the runtime means a broken caller/callee contract. It is
// neither recoverable nor allowed to cross an `extern "C"` frame, so the
// guard logs it and aborts the process.

use std::any::Any;
use std::panic::{catch_unwind, UnwindSafe};

/// Execute `f`; abort the process if it panics.
pub fn fatal_boundary<F, R>(entry: &'static str, f: F) -> R
where
    F: FnOnce() -> R + UnwindSafe,
{
    match catch_unwind(f) {
        Ok(value) => value,
        Err(payload) => {
            tracing::error!(entry, panic = %panic_message(&*payload), "panic at seqbind FFI boundary, aborting");
            std::process::abort()
        }
    }
}

/// Extract a human-readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
