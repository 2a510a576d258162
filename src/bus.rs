use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::{clock::Monotonic, error::DhtError, variant::SensorVariant};

/// Number of bits in one transmission.
pub const FRAME_BITS: usize = 40;

/// Direction the data line is currently set to.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// The host is actively pulling the line low.
    Output,
    /// The line is released and floats high through its pull-up.
    Input,
}

/// The single data line shared by the host and the sensor.
///
/// The pin is expected to be configured as open-drain with a pull-up: driving it
/// high releases the line so the sensor can talk, driving it low is the wake signal.
pub struct BusLine<PIN> {
    pin: PIN,
    direction: Direction,
}

impl<PIN, E> BusLine<PIN>
where
    PIN: InputPin<Error = E> + OutputPin<Error = E>,
{
    /// Wraps a pin. No level is applied until the line is released or driven.
    pub fn new(pin: PIN) -> Self {
        BusLine {
            pin,
            direction: Direction::Input,
        }
    }

    /// Current direction of the line.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Pulls the line low.
    pub fn drive_low(&mut self) -> Result<(), E> {
        self.pin.set_low()?;
        self.direction = Direction::Output;
        Ok(())
    }

    /// Lets go of the line so it idles high and the sensor may drive it.
    pub fn release(&mut self) -> Result<(), E> {
        self.pin.set_high()?;
        self.direction = Direction::Input;
        Ok(())
    }

    /// Samples the current level.
    pub fn is_high(&mut self) -> Result<bool, E> {
        self.pin.is_high()
    }

    /// Gives the pin back.
    pub fn into_inner(self) -> PIN {
        self.pin
    }
}

/// High-phase durations collected during one bus cycle, one per bit.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Samples {
    durations: [u32; FRAME_BITS],
    len: u8,
}

impl Samples {
    /// An empty sample set.
    pub const fn new() -> Self {
        Samples {
            durations: [0; FRAME_BITS],
            len: 0,
        }
    }

    /// Builds a sample set from recorded durations, keeping at most 40 of them.
    pub fn from_durations(durations: &[u32]) -> Self {
        let mut samples = Self::new();
        for &d in durations.iter().take(FRAME_BITS) {
            samples.push(d);
        }
        samples
    }

    /// Appends a duration. Ignored once the set is full.
    pub fn push(&mut self, duration_us: u32) {
        if let Some(slot) = self.durations.get_mut(self.len as usize) {
            *slot = duration_us;
            self.len += 1;
        }
    }

    /// Number of bits sampled.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// `true` when no bit was sampled.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `true` when all 40 bits were sampled.
    pub fn is_complete(&self) -> bool {
        self.len() == FRAME_BITS
    }

    /// The recorded durations in bit order.
    pub fn as_slice(&self) -> &[u32] {
        &self.durations[..self.len()]
    }
}

impl Default for Samples {
    fn default() -> Self {
        Self::new()
    }
}

/// Something that can run one request/response cycle with the sensor.
///
/// [`BusDriver`] is the GPIO implementation; the retry logic only depends on this
/// trait.
pub trait Bus {
    /// Error raised by the underlying line.
    type Error;

    /// Puts the line in its idle state. Safe to call more than once.
    fn prepare(&mut self, variant: &SensorVariant) -> Result<(), DhtError<Self::Error>>;

    /// Wakes the sensor and samples one transmission.
    ///
    /// # Returns
    ///
    /// * `Ok(Samples)` with up to 40 high-phase durations; fewer than 40 means a data
    ///   bit timed out and the cycle was cut short.
    /// * `Err(DhtError::Timeout)` if the sensor never acknowledged.
    /// * `Err(DhtError::PinError)` if the line itself failed.
    fn acquire_cycle<D: DelayNs>(
        &mut self,
        delay: &mut D,
        variant: &SensorVariant,
    ) -> Result<Samples, DhtError<Self::Error>>;
}

/// GPIO bus driver timing pulses against a [`Monotonic`] clock.
pub struct BusDriver<PIN, CLK> {
    line: BusLine<PIN>,
    clock: CLK,
}

impl<PIN, CLK, E> BusDriver<PIN, CLK>
where
    PIN: InputPin<Error = E> + OutputPin<Error = E>,
    CLK: Monotonic,
{
    /// Creates a new driver.
    ///
    /// # Arguments
    ///
    /// * `pin` - Open-drain GPIO connected to the sensor's data line.
    /// * `clock` - Microsecond time source used to measure pulses and timeouts.
    pub fn new(pin: PIN, clock: CLK) -> Self {
        BusDriver {
            line: BusLine::new(pin),
            clock,
        }
    }

    /// Current direction of the data line.
    pub fn direction(&self) -> Direction {
        self.line.direction()
    }

    /// Gives the pin and clock back.
    pub fn release(self) -> (PIN, CLK) {
        (self.line.into_inner(), self.clock)
    }

    /// Waits while the line stays at `level_high`.
    ///
    /// # Returns
    ///
    /// * `Ok(elapsed_us)` once the level changes
    /// * `Err(DhtError::Timeout)` if the level outlasts `timeout_us`
    fn wait_while(&mut self, level_high: bool, timeout_us: u32) -> Result<u32, DhtError<E>> {
        let start = self.clock.now_us();
        loop {
            let elapsed = self.clock.now_us().saturating_sub(start);
            if self.line.is_high()? != level_high {
                return Ok(u32::try_from(elapsed).unwrap_or(u32::MAX));
            }
            if elapsed > u64::from(timeout_us) {
                return Err(DhtError::Timeout);
            }
        }
    }

    /// Measures one bit: the low lead-in, then the high pulse that carries the value.
    ///
    /// Returns `Ok(None)` when either phase times out.
    fn sample_bit(&mut self, timeout_us: u32) -> Result<Option<u32>, DhtError<E>> {
        match self.wait_while(false, timeout_us) {
            Ok(_) => {}
            Err(DhtError::Timeout) => return Ok(None),
            Err(e) => return Err(e),
        }
        match self.wait_while(true, timeout_us) {
            Ok(high_us) => Ok(Some(high_us)),
            Err(DhtError::Timeout) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl<PIN, CLK, E> Bus for BusDriver<PIN, CLK>
where
    PIN: InputPin<Error = E> + OutputPin<Error = E>,
    CLK: Monotonic,
{
    type Error = E;

    fn prepare(&mut self, _variant: &SensorVariant) -> Result<(), DhtError<E>> {
        self.line.release()?;
        Ok(())
    }

    fn acquire_cycle<D: DelayNs>(
        &mut self,
        delay: &mut D,
        variant: &SensorVariant,
    ) -> Result<Samples, DhtError<E>> {
        // Host start request
        self.line.drive_low()?;
        delay.delay_us(variant.wake_us);
        self.line.release()?;
        delay.delay_us(variant.settle_us);

        // Sensor may still be idle-high after the settle delay
        self.wait_while(true, variant.ack_timeout_us)?;

        // Sensor acknowledgement: ~80us low, ~80us high
        self.wait_while(false, variant.ack_timeout_us)?;
        self.wait_while(true, variant.ack_timeout_us)?;

        let mut samples = Samples::new();
        for _ in 0..FRAME_BITS {
            match self.sample_bit(variant.phase_timeout_us)? {
                Some(high_us) => samples.push(high_us),
                None => {
                    trace!("bus cycle cut short after {} bits", samples.len());
                    break;
                }
            }
        }

        Ok(samples)
    }
}
