use std::ffi::c_int;

use webrtc_aec3::{AecError, Processor};

/// Returned by processing functions on success.
pub const WEBRTC_AEC3_OK: c_int = 0;
/// Returned by processing functions when arguments are rejected.
pub const WEBRTC_AEC3_ERROR: c_int = -1;

/// Opaque processor handle.
///
/// Created by `webrtc_aec3_create`, freed by `webrtc_aec3_destroy`.
/// C code only ever sees a pointer to it.
pub struct WebRTCAEC3Processor {
    pub(crate) inner: Processor,
}

/// Collapses a processing result into a C status code.
pub(crate) fn status(result: Result<(), AecError>) -> c_int {
    match result {
        Ok(()) => WEBRTC_AEC3_OK,
        Err(_) => WEBRTC_AEC3_ERROR,
    }
}
