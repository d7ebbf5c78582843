use thiserror::Error;

/// Error type for echo canceller operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AecError {
    #[error("Sample rate {0} Hz is not supported")]
    SampleRateUnsupported(u32),
    #[error("Channel count {0} is not supported")]
    ChannelCountUnsupported(u32),
    #[error("Frame contains no samples")]
    EmptyFrame,
    #[error("Frame of {len} samples does not divide into {num_channels} channels")]
    FrameLayoutMismatch { len: usize, num_channels: u32 },
    #[error("Frame length mismatch: expected {expected} samples, got {actual}")]
    FrameLengthMismatch { expected: usize, actual: usize },
    #[error("Failed to reserve {0} samples of processor state")]
    AllocationFailed(usize),
}

/// Coarse classification of an [`AecError`].
///
/// The C interface reports both kinds with the same status code; this is
/// the only place they are told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A parameter, pointer or buffer shape was rejected.
    InvalidArgument,
    /// Backing storage could not be reserved.
    AllocationFailure,
}

impl AecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AecError::AllocationFailed(_) => ErrorKind::AllocationFailure,
            _ => ErrorKind::InvalidArgument,
        }
    }
}
