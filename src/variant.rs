//! Sensor variant descriptors.
//!
//! The DHT11 and DHT22 speak the same protocol: the same acknowledgement pulse pair,
//! the same 40-bit frame and the same checksum. They differ in how long the host
//! must hold the line low to wake them and in how the DHT11 encodes its values, so a
//! single [`SensorVariant`] value describes either device.

/// The two supported sensor families.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariantKind {
    /// DHT11 style sensors.
    ShortFrame,
    /// DHT22 / AM2302 style sensors.
    ExtendedFrame,
}

/// Whole-number reinterpretation used by DHT11 style sensors.
///
/// The DHT11 sends integral values in the high bytes and (mostly zero) decimals in
/// the low bytes. Read as a fixed-point `/ 10` value this gives absurdly large
/// numbers, so any value above the threshold is re-read as the high byte alone.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LegacyFallback {
    /// Humidity (percent) above which `hum_hi` is taken as whole percent.
    pub humidity_above: f32,
    /// Temperature (degrees Celsius) above which `temp_hi` is taken as whole degrees.
    pub temperature_above: f32,
}

impl LegacyFallback {
    /// Thresholds matching the upper ends of the valid reading range.
    pub const DEFAULT: Self = Self {
        humidity_above: 100.0,
        temperature_above: 125.0,
    };
}

/// Timing and encoding parameters of one sensor family.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorVariant {
    /// Which family this descriptor belongs to.
    pub kind: VariantKind,
    /// How long the host drives the line low to request a transmission.
    pub wake_us: u32,
    /// Pause after releasing the line before listening for the acknowledgement.
    pub settle_us: u32,
    /// High pulses lasting at least this long encode a `1` bit.
    pub bit_threshold_us: u32,
    /// Budget for each half of the acknowledgement pulse pair.
    pub ack_timeout_us: u32,
    /// Budget for each low or high phase of a data bit.
    pub phase_timeout_us: u32,
    /// `Some` when raw values are whole numbers rather than tenths.
    pub legacy_fallback: Option<LegacyFallback>,
}

impl SensorVariant {
    /// DHT11 defaults: 20 ms wake pulse, whole-number fallback enabled.
    pub const DHT11: Self = Self {
        kind: VariantKind::ShortFrame,
        wake_us: 20_000,
        settle_us: 40,
        bit_threshold_us: 40,
        ack_timeout_us: 200,
        phase_timeout_us: 100,
        legacy_fallback: Some(LegacyFallback::DEFAULT),
    };

    /// DHT22 defaults: 1.2 ms wake pulse, values always in tenths.
    pub const DHT22: Self = Self {
        kind: VariantKind::ExtendedFrame,
        wake_us: 1_200,
        settle_us: 40,
        bit_threshold_us: 40,
        ack_timeout_us: 200,
        phase_timeout_us: 100,
        legacy_fallback: None,
    };

    /// Default descriptor for the given family.
    pub const fn new(kind: VariantKind) -> Self {
        match kind {
            VariantKind::ShortFrame => Self::DHT11,
            VariantKind::ExtendedFrame => Self::DHT22,
        }
    }

    /// Overrides the bit threshold.
    pub const fn with_bit_threshold_us(mut self, threshold_us: u32) -> Self {
        self.bit_threshold_us = threshold_us;
        self
    }

    /// Overrides the acknowledgement and per-phase timeouts.
    pub const fn with_timeouts_us(mut self, ack_timeout_us: u32, phase_timeout_us: u32) -> Self {
        self.ack_timeout_us = ack_timeout_us;
        self.phase_timeout_us = phase_timeout_us;
        self
    }

    /// Enables, disables or re-tunes the whole-number fallback.
    pub const fn with_legacy_fallback(mut self, fallback: Option<LegacyFallback>) -> Self {
        self.legacy_fallback = fallback;
        self
    }
}
