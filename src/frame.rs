//! Shape checks for interleaved audio frames.
//!
//! A frame is `num_frames × num_channels` samples laid out as
//! `[ch0_f0, ch1_f0, ch0_f1, ch1_f1, ..]`. The processor never
//! deinterleaves; these helpers only make sure the buffers handed to it
//! agree with each other and with the configured channel count.

use crate::error::AecError;

/// Returns the number of frames (samples per channel) in `samples`.
pub(crate) fn num_frames(samples: &[f32], num_channels: u32) -> Result<usize, AecError> {
    if samples.is_empty() {
        return Err(AecError::EmptyFrame);
    }

    let channels = num_channels as usize;
    if !samples.len().is_multiple_of(channels) {
        return Err(AecError::FrameLayoutMismatch {
            len: samples.len(),
            num_channels,
        });
    }

    Ok(samples.len() / channels)
}

/// Checks that `actual` holds exactly `expected` samples.
pub(crate) fn ensure_len(expected: usize, actual: usize) -> Result<(), AecError> {
    if expected != actual {
        return Err(AecError::FrameLengthMismatch { expected, actual });
    }
    Ok(())
}
