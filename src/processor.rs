use crate::{
    error::*,
    frame,
    suppressor::{EchoSuppressor, FixedAttenuation},
};

use tracing::{debug, trace, warn};

/// Stream configuration passed to [`Processor::new`].
///
/// The defaults (16 kHz mono) are what voice pipelines usually run at.
/// 16000, 32000 and 48000 Hz with one or two channels are the documented
/// combinations, but any non-zero rate and channel count is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessorConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels (1 for mono, 2 for stereo).
    pub num_channels: u32,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            num_channels: 1,
        }
    }
}

impl ProcessorConfig {
    pub fn with_sample_rate(self, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..self
        }
    }

    pub fn with_num_channels(self, num_channels: u32) -> Self {
        Self {
            num_channels,
            ..self
        }
    }

    /// Checks that both the sample rate and the channel count are non-zero.
    pub fn validate(&self) -> Result<(), AecError> {
        if self.sample_rate == 0 {
            return Err(AecError::SampleRateUnsupported(self.sample_rate));
        }
        if self.num_channels == 0 {
            return Err(AecError::ChannelCountUnsupported(self.num_channels));
        }
        Ok(())
    }

    /// Samples per channel in a 10 ms frame, never less than one.
    pub fn optimal_num_frames(&self) -> usize {
        (self.sample_rate as usize / 100).max(1)
    }

    /// Total interleaved samples in a frame of `num_frames` samples per channel.
    pub fn frame_len(&self, num_frames: usize) -> usize {
        num_frames * self.num_channels as usize
    }
}

/// A single echo canceller instance.
///
/// Owns its configuration, a history buffer reserved for one second of
/// audio, and the [`EchoSuppressor`] that computes the output. All
/// processing methods take `&mut self`: one thread drives an instance, in
/// frame order. The type is `Send`, so it can be created on a control
/// thread and moved into the audio callback.
///
/// # Example
///
/// ```rust
/// use webrtc_aec3::{Processor, ProcessorConfig};
///
/// let config = ProcessorConfig::default().with_num_channels(2);
/// let mut processor = Processor::new(&config).unwrap();
///
/// let frame_len = config.frame_len(config.optimal_num_frames());
/// let speaker = vec![0.5f32; frame_len];
/// let microphone = vec![1.0f32; frame_len];
/// let mut output = vec![0.0f32; frame_len];
///
/// processor.process_reference(&speaker).unwrap();
/// processor.process_stream(&microphone, &speaker, &mut output).unwrap();
/// assert!((output[0] - 0.95).abs() < 1e-6);
/// ```
pub struct Processor<S = FixedAttenuation> {
    config: ProcessorConfig,
    /// Reserved for filter history, never filled by the fixed law.
    history: Vec<f32>,
    suppressor: S,
}

impl Processor<FixedAttenuation> {
    /// Creates a processor that uses [`FixedAttenuation`] with its default factor.
    ///
    /// # Errors
    ///
    /// - [`AecError::SampleRateUnsupported`] / [`AecError::ChannelCountUnsupported`]
    ///   if either value is zero.
    /// - [`AecError::AllocationFailed`] if the history buffer can't be reserved.
    pub fn new(config: &ProcessorConfig) -> Result<Self, AecError> {
        Self::with_suppressor(config, FixedAttenuation::default())
    }
}

impl<S: EchoSuppressor> Processor<S> {
    /// Creates a processor around a custom [`EchoSuppressor`].
    ///
    /// Validation and buffer reservation are identical to [`Processor::new`].
    pub fn with_suppressor(config: &ProcessorConfig, suppressor: S) -> Result<Self, AecError> {
        config.validate().inspect_err(|error| {
            warn!(
                sample_rate = config.sample_rate,
                num_channels = config.num_channels,
                %error,
                "rejected echo canceller config"
            );
        })?;

        let capacity = (config.sample_rate as usize)
            .checked_mul(config.num_channels as usize)
            .ok_or(AecError::AllocationFailed(usize::MAX))?;
        let mut history = Vec::new();
        history.try_reserve_exact(capacity).map_err(|_| {
            warn!(capacity, "failed to reserve echo canceller history");
            AecError::AllocationFailed(capacity)
        })?;

        debug!(
            sample_rate = config.sample_rate,
            num_channels = config.num_channels,
            "created echo canceller"
        );

        Ok(Self {
            config: *config,
            history,
            suppressor,
        })
    }

    /// Removes echo of `far_end` from `near_end` and writes the result to `output`.
    ///
    /// All three buffers are interleaved frames of the same length, which
    /// must be a non-zero multiple of the channel count. On error `output`
    /// is left untouched.
    ///
    /// With the default suppressor every sample becomes
    /// `near_end[i] - 0.1 * far_end[i]`.
    pub fn process_stream(
        &mut self,
        near_end: &[f32],
        far_end: &[f32],
        output: &mut [f32],
    ) -> Result<(), AecError> {
        self.check_stream(near_end, far_end, output.len())
            .inspect_err(|error| warn!(%error, "rejected stream frame"))?;

        self.suppressor.attenuate(near_end, far_end, output);
        Ok(())
    }

    /// Like [`process_stream`](Self::process_stream), but `capture` holds the
    /// near-end frame on entry and receives the output.
    pub fn process_stream_in_place(
        &mut self,
        capture: &mut [f32],
        far_end: &[f32],
    ) -> Result<(), AecError> {
        self.check_stream(capture, far_end, capture.len())
            .inspect_err(|error| warn!(%error, "rejected stream frame"))?;

        self.suppressor.attenuate_in_place(capture, far_end);
        Ok(())
    }

    /// Like [`process_stream`](Self::process_stream), but `playback` holds the
    /// far-end frame on entry and receives the output.
    pub fn process_stream_far_in_place(
        &mut self,
        near_end: &[f32],
        playback: &mut [f32],
    ) -> Result<(), AecError> {
        self.check_stream(near_end, playback, playback.len())
            .inspect_err(|error| warn!(%error, "rejected stream frame"))?;

        self.suppressor.attenuate_far_in_place(near_end, playback);
        Ok(())
    }

    /// Feeds a far-end reference frame to the processor.
    ///
    /// The frame is validated like a stream frame and handed to
    /// [`EchoSuppressor::observe_reference`]. With [`FixedAttenuation`] this
    /// has no effect on later [`process_stream`](Self::process_stream) output.
    pub fn process_reference(&mut self, reference: &[f32]) -> Result<(), AecError> {
        let num_frames = frame::num_frames(reference, self.config.num_channels)
            .inspect_err(|error| warn!(%error, "rejected reference frame"))?;

        trace!(num_frames, "reference frame");
        self.suppressor.observe_reference(reference);
        Ok(())
    }

    /// Processes interleaved capture buffers of arbitrary length in 10 ms frames.
    ///
    /// `near_end`, `output` and, if given, `far_end` must have equal length,
    /// a multiple of the channel count. A missing far-end is treated as
    /// silence. Samples that don't fill a whole frame at the end are copied
    /// from `near_end` unprocessed.
    ///
    /// Returns the number of frames processed.
    pub fn process_capture_buffer(
        &mut self,
        near_end: &[f32],
        far_end: Option<&[f32]>,
        output: &mut [f32],
    ) -> Result<usize, AecError> {
        self.check_buffer(near_end)
            .and_then(|_| match far_end {
                Some(far_end) => frame::ensure_len(near_end.len(), far_end.len()),
                None => Ok(()),
            })
            .and_then(|_| frame::ensure_len(near_end.len(), output.len()))
            .inspect_err(|error| warn!(%error, "rejected capture buffer"))?;

        let frame_len = self.config.frame_len(self.config.optimal_num_frames());
        let near_frames = near_end.chunks_exact(frame_len);
        let tail = near_frames.remainder();
        let mut output_frames = output.chunks_exact_mut(frame_len);

        let mut processed = 0;
        match far_end {
            Some(far_end) => {
                for ((near, far), out) in near_frames
                    .zip(far_end.chunks_exact(frame_len))
                    .zip(&mut output_frames)
                {
                    self.suppressor.attenuate(near, far, out);
                    processed += 1;
                }
            }
            None => {
                let silence = vec![0.0f32; frame_len];
                for (near, out) in near_frames.zip(&mut output_frames) {
                    self.suppressor.attenuate(near, &silence, out);
                    processed += 1;
                }
            }
        }
        output_frames.into_remainder().copy_from_slice(tail);

        Ok(processed)
    }

    /// Feeds every complete 10 ms frame of `reference` to
    /// [`process_reference`](Self::process_reference).
    ///
    /// A trailing partial frame is dropped. Returns the number of frames fed.
    pub fn process_reference_buffer(&mut self, reference: &[f32]) -> Result<usize, AecError> {
        self.check_buffer(reference)
            .inspect_err(|error| warn!(%error, "rejected reference buffer"))?;

        let frame_len = self.config.frame_len(self.config.optimal_num_frames());
        let mut fed = 0;
        for frame in reference.chunks_exact(frame_len) {
            self.process_reference(frame)?;
            fed += 1;
        }
        Ok(fed)
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    pub fn num_channels(&self) -> u32 {
        self.config.num_channels
    }

    /// Samples per channel in the 10 ms frames used by the buffer helpers.
    pub fn optimal_num_frames(&self) -> usize {
        self.config.optimal_num_frames()
    }

    /// Number of samples reserved for filter history.
    ///
    /// At least `sample_rate * num_channels`; fixed for the processor's lifetime.
    pub fn history_capacity(&self) -> usize {
        self.history.capacity()
    }

    pub fn suppressor(&self) -> &S {
        &self.suppressor
    }

    pub fn suppressor_mut(&mut self) -> &mut S {
        &mut self.suppressor
    }

    fn check_stream(
        &self,
        near_end: &[f32],
        far_end: &[f32],
        output_len: usize,
    ) -> Result<(), AecError> {
        frame::num_frames(near_end, self.config.num_channels)?;
        frame::ensure_len(near_end.len(), far_end.len())?;
        frame::ensure_len(near_end.len(), output_len)
    }

    /// Buffers may be empty, but must still be whole channel groups.
    fn check_buffer(&self, samples: &[f32]) -> Result<(), AecError> {
        match frame::num_frames(samples, self.config.num_channels) {
            Ok(_) | Err(AecError::EmptyFrame) => Ok(()),
            Err(error) => Err(error),
        }
    }
}

impl<S> Drop for Processor<S> {
    fn drop(&mut self) {
        debug!(
            sample_rate = self.config.sample_rate,
            num_channels = self.config.num_channels,
            "destroyed echo canceller"
        );
    }
}
