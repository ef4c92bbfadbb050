//! Our error types for the EA telegram protocol.

use thiserror::Error;

use crate::scaling::Quantity;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Custom error type for EA device communications.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Serial communication error")]
    SerialError(I),
    #[error("Telegram error: {0}")]
    Frame(FrameError),
    #[error("Communication timeout")]
    Timeout,
    #[error("Invalid channel {0}")]
    InvalidChannel(u8),
    #[error("Invalid range: {0}")]
    Scaling(ScalingError),
    /// The retry budget ran out. The link should be treated as unreliable.
    #[error("Connection lost after {attempts} attempts")]
    ConnectionLost { attempts: u16 },
    #[error("Invalid response received")]
    InvalidResponse,
    #[error("Buffer too small")]
    BufferError,
}

impl<I: embedded_io::Error> Error<I> {
    /// Whether a fresh attempt with the same request telegram could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout => true,
            Error::Frame(frame) => frame.is_corruption(),
            _ => false,
        }
    }
}

impl<I: embedded_io::Error> From<FrameError> for Error<I> {
    fn from(err: FrameError) -> Self {
        Error::Frame(err)
    }
}

impl<I: embedded_io::Error> From<ScalingError> for Error<I> {
    fn from(err: ScalingError) -> Self {
        Error::Scaling(err)
    }
}

/// Problems found while building or parsing a telegram.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("checksum mismatch (computed {expected:#06x}, received {received:#06x})")]
    ChecksumMismatch { expected: u16, received: u16 },
    #[error("declared data length {declared} but carried {actual} bytes")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("telegram of {0} bytes is too short")]
    TooShort(usize),
    #[error("data length {0} cannot be encoded (1-16)")]
    InvalidDataLength(usize),
}

impl FrameError {
    /// Corruption on the wire, as opposed to a telegram we refused to build.
    pub fn is_corruption(&self) -> bool {
        !matches!(self, FrameError::InvalidDataLength(_))
    }
}

/// Rejected physical-unit conversions.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ScalingError {
    #[error("{quantity} of {value} is outside 0..={nominal}")]
    OutOfRange {
        quantity: Quantity,
        value: f32,
        nominal: f32,
    },
    #[error("device has no nominal {0}")]
    NoNominal(Quantity),
}
