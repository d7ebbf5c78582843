/// Default scale applied to the far-end signal by [`FixedAttenuation`].
pub const DEFAULT_ATTENUATION: f32 = 0.1;

/// The numeric law that turns a near-end and a far-end frame into an
/// echo-attenuated output frame.
///
/// The [`Processor`](crate::Processor) validates every buffer before it
/// reaches an implementation, so all slices passed here have the same,
/// non-zero length and are laid out identically (interleaved). An
/// implementation must write every element of `output` and must not keep
/// references to any of the buffers after returning.
///
/// Implementations that adapt to the far-end signal can keep their state
/// in `self` and update it from [`observe_reference`](Self::observe_reference).
pub trait EchoSuppressor: Send {
    /// Computes `output` from `near_end` and `far_end`.
    fn attenuate(&mut self, near_end: &[f32], far_end: &[f32], output: &mut [f32]);

    /// Same as [`attenuate`](Self::attenuate), but `capture` holds the
    /// near-end signal on entry and the output on return.
    fn attenuate_in_place(&mut self, capture: &mut [f32], far_end: &[f32]);

    /// Same as [`attenuate`](Self::attenuate), but `playback` holds the
    /// far-end signal on entry and the output on return.
    fn attenuate_far_in_place(&mut self, near_end: &[f32], playback: &mut [f32]);

    /// Called with every reference frame passed to
    /// [`Processor::process_reference`](crate::Processor::process_reference).
    ///
    /// The default implementation ignores the frame.
    fn observe_reference(&mut self, _reference: &[f32]) {}
}

/// Subtracts a fixed fraction of the far-end signal from the near-end signal.
///
/// `output[i] = near_end[i] - factor * far_end[i]`
///
/// This is a stateless placeholder, not a converging canceller: reference
/// frames have no effect on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAttenuation {
    factor: f32,
}

impl FixedAttenuation {
    pub fn new(factor: f32) -> Self {
        Self { factor }
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }
}

impl Default for FixedAttenuation {
    fn default() -> Self {
        Self::new(DEFAULT_ATTENUATION)
    }
}

impl EchoSuppressor for FixedAttenuation {
    fn attenuate(&mut self, near_end: &[f32], far_end: &[f32], output: &mut [f32]) {
        for ((out, &near), &far) in output.iter_mut().zip(near_end).zip(far_end) {
            *out = near - far * self.factor;
        }
    }

    fn attenuate_in_place(&mut self, capture: &mut [f32], far_end: &[f32]) {
        for (sample, &far) in capture.iter_mut().zip(far_end) {
            *sample -= far * self.factor;
        }
    }

    fn attenuate_far_in_place(&mut self, near_end: &[f32], playback: &mut [f32]) {
        for (sample, &near) in playback.iter_mut().zip(near_end) {
            *sample = near - *sample * self.factor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn default_factor_is_one_tenth() {
        assert_eq!(FixedAttenuation::default().factor(), 0.1);
    }

    #[test]
    fn subtracts_scaled_far_end() {
        let mut law = FixedAttenuation::default();
        let near = [1.0, -0.5, 0.25, 0.0];
        let far = [0.5, 0.5, -1.0, 1.0];
        let mut output = [f32::NAN; 4];

        law.attenuate(&near, &far, &mut output);

        let expected = [0.95, -0.55, 0.35, -0.1];
        for (out, want) in output.iter().zip(expected) {
            assert_abs_diff_eq!(*out, want, epsilon = 1e-6);
        }
    }

    #[test]
    fn in_place_matches_out_of_place() {
        let mut law = FixedAttenuation::new(0.3);
        let near = [0.2, 0.4, -0.6, 0.8, 1.0, -1.0];
        let far = [1.0, 0.0, 0.5, -0.5, 0.25, 0.75];

        let mut output = [0.0; 6];
        law.attenuate(&near, &far, &mut output);

        let mut capture = near;
        law.attenuate_in_place(&mut capture, &far);

        assert_eq!(capture, output);
    }

    #[test]
    fn far_in_place_matches_out_of_place() {
        let mut law = FixedAttenuation::default();
        let near = [1.0, 1.0, -0.25, 0.0];
        let far = [0.5, 0.5, 1.0, -2.0];

        let mut output = [0.0; 4];
        law.attenuate(&near, &far, &mut output);

        let mut playback = far;
        law.attenuate_far_in_place(&near, &mut playback);

        assert_eq!(playback, output);
        assert_abs_diff_eq!(playback[0], 0.95, epsilon = 1e-6);
    }

    #[test]
    fn zero_factor_passes_near_end_through() {
        let mut law = FixedAttenuation::new(0.0);
        let near = [0.1, 0.2, 0.3];
        let mut output = [0.0; 3];
        law.attenuate(&near, &[9.0, 9.0, 9.0], &mut output);
        assert_eq!(output, near);
    }
}
