//! Panic containment for the exported functions.
//!
//! Unwinding out of an `extern "C"` function aborts the host process, so
//! every exported body that does real work runs inside [`guard_status`]
//! or [`guard_ptr`].

use std::any::Any;
use std::ffi::c_int;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

use tracing::error;

use crate::types::WEBRTC_AEC3_ERROR;

/// Runs a body returning a C status code; a panic becomes [`WEBRTC_AEC3_ERROR`].
pub(crate) fn guard_status(body: impl FnOnce() -> c_int) -> c_int {
    guarded(WEBRTC_AEC3_ERROR, body)
}

/// Runs a body returning a handle; a panic becomes `NULL`.
pub(crate) fn guard_ptr<T>(body: impl FnOnce() -> *mut T) -> *mut T {
    guarded(ptr::null_mut(), body)
}

fn guarded<T>(fallback: T, body: impl FnOnce() -> T) -> T {
    // Handles are only reachable through raw pointers owned by C, so no
    // broken invariant can be observed from Rust after a caught panic.
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(value) => value,
        Err(payload) => {
            error!(
                message = panic_message(payload.as_ref()),
                "panic caught at the C boundary"
            );
            fallback
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}
