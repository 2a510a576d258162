use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::{
    bus::{Bus, BusDriver},
    clock::{Liveness, Monotonic, NoWatchdog},
    error::DhtError,
    frame::{self, Reading},
    retry::{Action, RetryPolicy},
    variant::SensorVariant,
};

/// Reads the sensor, retrying bad cycles according to `policy`.
///
/// Every per-attempt failure (acknowledgement timeout, truncated frame, checksum
/// mismatch, out-of-range values, pin errors) is absorbed here. The caller always
/// gets exactly one [`Reading`] back and must check [`Reading::valid`].
pub fn acquire_and_decode<B, D, W>(
    bus: &mut B,
    delay: &mut D,
    watchdog: &mut W,
    variant: &SensorVariant,
    policy: &RetryPolicy,
) -> Reading
where
    B: Bus,
    D: DelayNs,
    W: Liveness,
{
    let mut attempt: u8 = 0;
    loop {
        watchdog.feed();
        trace!("starting bus cycle, attempt {}", attempt);
        let result = bus.acquire_cycle(delay, variant).and_then(|samples| {
            frame::evaluate(&samples, variant).map_err(DhtError::<B::Error>::Frame)
        });

        match &result {
            Ok(reading) => debug!(
                "good frame on attempt {}: {} C, {} %RH",
                attempt, reading.temperature, reading.humidity
            ),
            Err(e) => warn!("bad frame on attempt {}: {}", attempt, e.as_str()),
        }

        match policy.next_action(attempt, result) {
            Action::Return(reading) => {
                if !reading.valid {
                    warn!("no valid frame after {} attempts", attempt + 1);
                }
                return reading;
            }
            Action::Retry { after } => {
                delay.delay_us(u32::try_from(after.as_micros()).unwrap_or(u32::MAX));
                watchdog.feed();
                attempt = attempt.saturating_add(1);
            }
        }
    }
}

/// Driver for DHT11 and DHT22 temperature and humidity sensors.
pub struct Dht<B, D, W = NoWatchdog> {
    bus: B,
    delay: D,
    watchdog: W,
    variant: SensorVariant,
    policy: RetryPolicy,
    prepared: bool,
    last: Reading,
}

impl<PIN, CLK, D, E> Dht<BusDriver<PIN, CLK>, D>
where
    PIN: InputPin<Error = E> + OutputPin<Error = E>,
    CLK: Monotonic,
    D: DelayNs,
{
    /// Creates a new instance of the driver.
    ///
    /// # Arguments
    ///
    /// * `pin` - The GPIO pin connected to the data line. Must be open-drain with a
    ///   pull-up, supporting both input and output.
    /// * `clock` - A monotonic microsecond time source.
    /// * `delay` - A delay provider implementing the `DelayNs` trait.
    /// * `variant` - Which sensor family is connected.
    pub fn new(pin: PIN, clock: CLK, delay: D, variant: SensorVariant) -> Self {
        Self::with_bus(BusDriver::new(pin, clock), delay, variant)
    }
}

impl<B, D> Dht<B, D>
where
    B: Bus,
    D: DelayNs,
{
    /// Creates a driver on top of any [`Bus`] implementation.
    pub fn with_bus(bus: B, delay: D, variant: SensorVariant) -> Self {
        Dht {
            bus,
            delay,
            watchdog: NoWatchdog,
            variant,
            policy: RetryPolicy::DEFAULT,
            prepared: false,
            last: Reading::sentinel(),
        }
    }
}

impl<B, D, W> Dht<B, D, W>
where
    B: Bus,
    D: DelayNs,
    W: Liveness,
{
    /// Attaches a watchdog that is fed while a read is in progress.
    pub fn with_watchdog<W2: Liveness>(self, watchdog: W2) -> Dht<B, D, W2> {
        Dht {
            bus: self.bus,
            delay: self.delay,
            watchdog,
            variant: self.variant,
            policy: self.policy,
            prepared: self.prepared,
            last: self.last,
        }
    }

    /// Replaces the retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The configured sensor variant.
    pub fn variant(&self) -> &SensorVariant {
        &self.variant
    }

    /// Puts the data line in its idle state.
    ///
    /// Called automatically by the first [`read`](Self::read); calling it earlier
    /// gives the sensor time to settle before the first request.
    pub fn prepare(&mut self) -> Result<(), DhtError<B::Error>> {
        self.bus.prepare(&self.variant)?;
        self.prepared = true;
        Ok(())
    }

    /// Reads a temperature and humidity measurement.
    ///
    /// Blocks for the whole exchange, including any backoff between retries.
    ///
    /// # Returns
    ///
    /// A valid [`Reading`], or [`Reading::sentinel`] if no attempt produced a
    /// plausible, checksum-correct frame.
    pub fn read(&mut self) -> Reading {
        if !self.prepared && self.prepare().is_err() {
            warn!("failed to idle the data line");
        }

        self.last = acquire_and_decode(
            &mut self.bus,
            &mut self.delay,
            &mut self.watchdog,
            &self.variant,
            &self.policy,
        );
        self.last
    }

    /// The result of the most recent [`read`](Self::read), or the sentinel before
    /// the first one.
    pub fn last_reading(&self) -> Reading {
        self.last
    }

    /// Gives back the bus, delay and watchdog.
    pub fn release(self) -> (B, D, W) {
        (self.bus, self.delay, self.watchdog)
    }
}
