#![doc = include_str!("../README.md")]

mod error;
mod frame;
mod processor;
mod suppressor;

pub use error::*;
pub use processor::*;
pub use suppressor::*;

/// Returns the version of this library.
///
/// The same string is exported to C as `webrtc_aec3_version`.
///
/// # Example
///
/// ```rust
/// let version = webrtc_aec3::get_version();
/// println!("webrtc-aec3 version: {version}");
/// ```
pub fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
