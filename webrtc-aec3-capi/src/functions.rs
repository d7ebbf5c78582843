//! Exported `extern "C"` functions.
//!
//! # Symbol prefix
//!
//! All public symbols use the `webrtc_aec3_` prefix.

use std::ffi::{CStr, c_char, c_int};
use std::{mem, ptr, slice};

use tracing::warn;
use webrtc_aec3::{Processor, ProcessorConfig};

use crate::panic_guard::{guard_ptr, guard_status};
use crate::types::{WEBRTC_AEC3_ERROR, WEBRTC_AEC3_OK, WebRTCAEC3Processor, status};

const VERSION: &CStr = match CStr::from_bytes_with_nul(
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes(),
) {
    Ok(version) => version,
    Err(_) => panic!("version string contains a NUL byte"),
};

// ─── Version ─────────────────────────────────────────────────────────

/// Returns a pointer to a static NUL-terminated version string.
///
/// The pointer is valid for the lifetime of the process and must not be freed.
#[unsafe(no_mangle)]
pub extern "C" fn webrtc_aec3_version() -> *const c_char {
    VERSION.as_ptr()
}

// ─── Lifecycle ───────────────────────────────────────────────────────

/// Creates a processor for `sample_rate` Hz audio with `num_channels`
/// interleaved channels.
///
/// Returns `NULL` if either value is not positive or the processor state
/// can't be allocated. The two causes are not distinguished. The caller
/// owns the returned pointer and must free it with [`webrtc_aec3_destroy`].
#[unsafe(no_mangle)]
pub extern "C" fn webrtc_aec3_create(
    sample_rate: c_int,
    num_channels: c_int,
) -> *mut WebRTCAEC3Processor {
    guard_ptr(|| {
        let (Ok(sample_rate), Ok(num_channels)) =
            (u32::try_from(sample_rate), u32::try_from(num_channels))
        else {
            warn!(sample_rate, num_channels, "rejected echo canceller parameters");
            return ptr::null_mut();
        };

        let config = ProcessorConfig {
            sample_rate,
            num_channels,
        };
        match Processor::new(&config) {
            Ok(inner) => Box::into_raw(Box::new(WebRTCAEC3Processor { inner })),
            Err(_) => ptr::null_mut(),
        }
    })
}

/// Destroys a processor and frees its memory.
///
/// Passing `NULL` is a safe no-op. After this call the pointer is invalid;
/// destroying it a second time is undefined behaviour.
///
/// # Safety
///
/// `processor` must be `NULL` or a pointer returned by
/// [`webrtc_aec3_create`] that has not been destroyed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn webrtc_aec3_destroy(processor: *mut WebRTCAEC3Processor) {
    if !processor.is_null() {
        // SAFETY: created by Box::into_raw in webrtc_aec3_create, and the
        // caller guarantees single ownership.
        drop(unsafe { Box::from_raw(processor) });
    }
}

// ─── Processing ──────────────────────────────────────────────────────

/// Removes echo of `far_end` from `near_end` and writes the result to `output`.
///
/// Each buffer holds `frame_size * num_channels` interleaved samples. With
/// the current suppression law `output[i] = near_end[i] - 0.1 * far_end[i]`.
///
/// `output` may be the same pointer as `near_end` or `far_end`, or overlap
/// either input in any other way. Samples are then computed in index order,
/// each from the inputs as they are at that point.
///
/// Returns `0` on success. Returns `-1`, without writing to `output`, if a
/// pointer is `NULL` or `frame_size` is not positive.
///
/// # Safety
///
/// - `processor` must be `NULL` or a live handle from [`webrtc_aec3_create`],
///   not used concurrently from another thread.
/// - Non-null buffers must be valid for `frame_size * num_channels` floats
///   for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn webrtc_aec3_process_stream(
    processor: *mut WebRTCAEC3Processor,
    near_end: *const f32,
    far_end: *const f32,
    output: *mut f32,
    frame_size: c_int,
) -> c_int {
    guard_status(|| {
        if processor.is_null() || near_end.is_null() || far_end.is_null() || output.is_null() {
            warn!("null pointer passed to webrtc_aec3_process_stream");
            return WEBRTC_AEC3_ERROR;
        }

        // SAFETY: the caller guarantees a live handle used from one thread.
        let processor = unsafe { &mut (*processor).inner };
        let Some(len) = frame_len(processor, frame_size) else {
            return WEBRTC_AEC3_ERROR;
        };

        let writes_near = overlaps(output.cast_const(), near_end, len);
        let writes_far = overlaps(output.cast_const(), far_end, len);

        // SAFETY (all arms): the caller guarantees `len` valid samples per
        // buffer. A mutable slice is only formed over `output` when it
        // overlaps no other slice formed in the same arm.
        match (writes_near, writes_far) {
            (false, false) => {
                let near_end = unsafe { slice::from_raw_parts(near_end, len) };
                let far_end = unsafe { slice::from_raw_parts(far_end, len) };
                let output = unsafe { slice::from_raw_parts_mut(output, len) };
                status(processor.process_stream(near_end, far_end, output))
            }
            (true, false) if ptr::eq(output.cast_const(), near_end) => {
                let capture = unsafe { slice::from_raw_parts_mut(output, len) };
                let far_end = unsafe { slice::from_raw_parts(far_end, len) };
                status(processor.process_stream_in_place(capture, far_end))
            }
            (false, true) if ptr::eq(output.cast_const(), far_end) => {
                let near_end = unsafe { slice::from_raw_parts(near_end, len) };
                let playback = unsafe { slice::from_raw_parts_mut(output, len) };
                status(processor.process_stream_far_in_place(near_end, playback))
            }
            _ => {
                unsafe { attenuate_overlapping(processor, near_end, far_end, output, len) };
                WEBRTC_AEC3_OK
            }
        }
    })
}

/// Feeds a far-end reference frame of `frame_size * num_channels` samples.
///
/// Returns `0` on success and `-1` if a pointer is `NULL` or `frame_size`
/// is not positive. Reference frames currently have no effect on the
/// output of [`webrtc_aec3_process_stream`].
///
/// # Safety
///
/// - `processor` must be `NULL` or a live handle from [`webrtc_aec3_create`],
///   not used concurrently from another thread.
/// - A non-null `reference` must be valid for `frame_size * num_channels`
///   floats for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn webrtc_aec3_process_reference(
    processor: *mut WebRTCAEC3Processor,
    reference: *const f32,
    frame_size: c_int,
) -> c_int {
    guard_status(|| {
        if processor.is_null() || reference.is_null() {
            warn!("null pointer passed to webrtc_aec3_process_reference");
            return WEBRTC_AEC3_ERROR;
        }

        // SAFETY: the caller guarantees a live handle used from one thread.
        let processor = unsafe { &mut (*processor).inner };
        let Some(len) = frame_len(processor, frame_size) else {
            return WEBRTC_AEC3_ERROR;
        };

        // SAFETY: the caller guarantees `len` valid samples.
        let reference = unsafe { slice::from_raw_parts(reference, len) };
        status(processor.process_reference(reference))
    })
}

// ─── Helpers ─────────────────────────────────────────────────────────

/// Interleaved sample count for `frame_size`, or `None` if it isn't
/// positive or the buffer would exceed `isize::MAX` bytes.
fn frame_len(processor: &Processor, frame_size: c_int) -> Option<usize> {
    let len = usize::try_from(frame_size)
        .ok()
        .filter(|&frames| frames > 0)
        .and_then(|frames| frames.checked_mul(processor.num_channels() as usize))
        .filter(|&len| len <= isize::MAX as usize / mem::size_of::<f32>());

    if len.is_none() {
        warn!(frame_size, "rejected frame size");
    }
    len
}

/// Sample-by-sample suppression for an `output` that partially overlaps an
/// input, or covers both at once. No slices are formed over the buffers.
///
/// # Safety
///
/// All three pointers must be valid for `len` samples, `output` for writes.
unsafe fn attenuate_overlapping(
    processor: &Processor,
    near_end: *const f32,
    far_end: *const f32,
    output: *mut f32,
    len: usize,
) {
    let factor = processor.suppressor().factor();
    for i in 0..len {
        unsafe {
            let near = near_end.add(i).read();
            let far = far_end.add(i).read();
            output.add(i).write(near - far * factor);
        }
    }
}

/// Whether the `len`-sample buffers starting at `a` and `b` share any memory.
fn overlaps(a: *const f32, b: *const f32, len: usize) -> bool {
    let bytes = len * mem::size_of::<f32>();
    let (a, b) = (a as usize, b as usize);
    a < b.saturating_add(bytes) && b < a.saturating_add(bytes)
}

// ─── Tests ───────────────────────────────────────────────────────────
