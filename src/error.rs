/// Reasons a decoded frame is rejected.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameError {
    /// The bus cycle ended before all 40 bits were sampled.
    Incomplete {
        /// Number of bits that were sampled.
        bits: u8,
    },
    /// Checksum did not match the received data.
    ChecksumMismatch,
    /// Checksum passed but the values are outside the sensor's physical range.
    RangeViolation,
}

impl FrameError {
    /// Short, static description used in log output.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Incomplete { .. } => "incomplete frame",
            Self::ChecksumMismatch => "checksum mismatch",
            Self::RangeViolation => "value out of range",
        }
    }
}

/// Possible errors from one acquisition attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DhtError<E> {
    /// Timed out waiting for the sensor's acknowledgement.
    Timeout,
    /// The frame could not be decoded into a reading.
    Frame(FrameError),
    /// Error from the GPIO pin (input/output).
    PinError(E),
}

impl<E> DhtError<E> {
    /// Short, static description used in log output.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "bus timeout",
            Self::Frame(e) => e.as_str(),
            Self::PinError(_) => "pin error",
        }
    }
}

impl<E> From<E> for DhtError<E> {
    fn from(value: E) -> Self {
        Self::PinError(value)
    }
}
