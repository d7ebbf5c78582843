//! C-compatible interface for the `webrtc-aec3` echo canceller.
//!
//! Exposes the `webrtc_aec3_*` functions declared in
//! `include/webrtc_aec3_processor.h`. Symbol names and signatures are those
//! of the existing native library, so bridges built against it link
//! unchanged.
//!
//! # Status codes
//!
//! - `0` ([`WEBRTC_AEC3_OK`]): success
//! - `-1` ([`WEBRTC_AEC3_ERROR`]): rejected arguments or internal error
//!
//! `webrtc_aec3_create` reports failure with `NULL` instead.
//!
//! # Thread safety
//!
//! **NOT thread-safe.** All calls on the same [`WebRTCAEC3Processor`]
//! handle must come from one thread at a time, in frame order.

mod functions;
mod panic_guard;
mod types;

pub use functions::*;
pub use types::*;
