//! Frame decoding, validation and unit conversion.

use core::ops::RangeInclusive;

use crate::{
    bus::{FRAME_BITS, Samples},
    error::FrameError,
    variant::SensorVariant,
};

/// Temperature and humidity placeholder of a reading that could not be obtained.
pub const SENTINEL: f32 = -99.0;

/// Temperatures (degrees Celsius) the sensors can physically report.
pub const TEMPERATURE_RANGE: RangeInclusive<f32> = -40.0..=125.0;

/// Relative humidities (percent) the sensors can physically report.
pub const HUMIDITY_RANGE: RangeInclusive<f32> = 0.0..=100.0;

/// Reading returned by the sensor.
///
/// Either every field holds a measured value and `valid` is `true`, or both values
/// are [`SENTINEL`] and `valid` is `false`.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    /// Temperature in degrees Celsius.
    pub temperature: f32,
    /// Relative humidity in percent.
    pub humidity: f32,
    /// Whether the values were actually measured.
    pub valid: bool,
}

impl Reading {
    /// The "no data this cycle" reading.
    pub const fn sentinel() -> Self {
        Reading {
            temperature: SENTINEL,
            humidity: SENTINEL,
            valid: false,
        }
    }

    /// `true` when the values were measured.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The reading, or `None` for the sentinel.
    pub fn ok(self) -> Option<Self> {
        self.valid.then_some(self)
    }
}

/// The five bytes of one transmission.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawFrame([u8; 5]);

impl RawFrame {
    /// Wraps `[hum_hi, hum_lo, temp_hi, temp_lo, checksum]`.
    pub const fn new(bytes: [u8; 5]) -> Self {
        RawFrame(bytes)
    }

    /// All five bytes in transmission order.
    pub const fn bytes(&self) -> [u8; 5] {
        self.0
    }

    /// The four data bytes.
    pub const fn data(&self) -> [u8; 4] {
        [self.0[0], self.0[1], self.0[2], self.0[3]]
    }

    /// The transmitted checksum byte.
    pub const fn checksum(&self) -> u8 {
        self.0[4]
    }

    /// Low byte of the sum of the data bytes.
    pub fn expected_checksum(&self) -> u8 {
        self.data().iter().fold(0u8, |sum, v| sum.wrapping_add(*v))
    }
}

/// Turns high-phase durations into a frame, most significant bit first.
///
/// A duration at or above the variant's threshold is a `1`.
///
/// # Errors
///
/// Returns `FrameError::Incomplete` if fewer than 40 samples were collected.
pub fn decode(samples: &Samples, variant: &SensorVariant) -> Result<RawFrame, FrameError> {
    if !samples.is_complete() {
        return Err(FrameError::Incomplete {
            bits: samples.len() as u8,
        });
    }

    let mut bytes = [0u8; 5];
    for (i, &high_us) in samples.as_slice().iter().enumerate().take(FRAME_BITS) {
        bytes[i / 8] <<= 1;
        if high_us >= variant.bit_threshold_us {
            bytes[i / 8] |= 1;
        }
    }
    Ok(RawFrame::new(bytes))
}

/// Checks the transmitted checksum against the data bytes.
pub fn validate(frame: &RawFrame) -> bool {
    frame.checksum() == frame.expected_checksum()
}

/// Converts a frame into calibrated values.
///
/// # Errors
///
/// Returns `FrameError::RangeViolation` if either value falls outside
/// [`TEMPERATURE_RANGE`] or [`HUMIDITY_RANGE`].
pub fn to_reading(frame: &RawFrame, variant: &SensorVariant) -> Result<Reading, FrameError> {
    let [hum_hi, hum_lo, temp_hi, temp_lo] = frame.data();

    let mut humidity = u16::from_be_bytes([hum_hi, hum_lo]) as f32 / 10.0;

    let is_temp_negative = (temp_hi >> 7) != 0;
    let temp_hi = temp_hi & 0b0111_1111;
    let mut temperature = u16::from_be_bytes([temp_hi, temp_lo]) as f32 / 10.0;

    if let Some(fallback) = variant.legacy_fallback {
        if humidity > fallback.humidity_above {
            humidity = hum_hi as f32;
        }
        if temperature > fallback.temperature_above {
            temperature = temp_hi as f32;
        }
    }

    if is_temp_negative {
        temperature = -temperature;
    }

    if !TEMPERATURE_RANGE.contains(&temperature) || !HUMIDITY_RANGE.contains(&humidity) {
        return Err(FrameError::RangeViolation);
    }

    Ok(Reading {
        temperature,
        humidity,
        valid: true,
    })
}

/// Runs decode, checksum and conversion on one cycle's samples.
pub fn evaluate(samples: &Samples, variant: &SensorVariant) -> Result<Reading, FrameError> {
    let frame = decode(samples, variant)?;
    if !validate(&frame) {
        return Err(FrameError::ChecksumMismatch);
    }
    to_reading(&frame, variant)
}
