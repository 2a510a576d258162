//! Simulated sensor and collaborators for tests.

use std::{cell::Cell, convert::Infallible, rc::Rc};

use embedded_hal::{
    delay::DelayNs,
    digital::{ErrorType, InputPin, OutputPin},
};

use crate::{
    bus::{Bus, Samples},
    clock::{Liveness, Monotonic},
    error::DhtError,
    variant::SensorVariant,
};

/// Shared simulated time in microseconds.
#[derive(Clone, Default)]
pub struct SimTime(Rc<Cell<u64>>);

impl SimTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.0.get()
    }

    pub fn advance(&self, us: u64) {
        self.0.set(self.0.get() + us);
    }
}

/// Clock that costs one microsecond per read.
pub struct SimClock {
    time: SimTime,
}

impl SimClock {
    pub fn new(time: SimTime) -> Self {
        SimClock { time }
    }
}

impl Monotonic for SimClock {
    fn now_us(&mut self) -> u64 {
        let now = self.time.now();
        self.time.advance(1);
        now
    }
}

/// Delay that advances simulated time and remembers each call.
pub struct SimDelay {
    time: SimTime,
    pub calls_us: Vec<u64>,
}

impl SimDelay {
    pub fn new(time: SimTime) -> Self {
        SimDelay {
            time,
            calls_us: Vec::new(),
        }
    }

    fn wait(&mut self, us: u64) {
        self.calls_us.push(us);
        self.time.advance(us);
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.wait(u64::from(ns).div_ceil(1_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.wait(u64::from(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.wait(u64::from(ms) * 1_000);
    }
}

/// Line levels the sensor produces after the host releases the bus.
///
/// Each segment is `(is_high, duration_us)`; once the segments run out the line
/// idles high through its pull-up.
#[derive(Clone, Default)]
pub struct Waveform {
    segments: Vec<(bool, u64)>,
}

impl Waveform {
    /// A sensor that never answers.
    pub fn silent() -> Self {
        Self::default()
    }

    /// A complete transmission of `frame`.
    pub fn transmitting(frame: [u8; 5]) -> Self {
        let bits: Vec<u8> = frame
            .iter()
            .flat_map(|byte| (0..8).map(move |i| (byte >> (7 - i)) & 1))
            .collect();
        let mut waveform = Self::transmitting_bits(&bits);
        // End of transmission
        waveform.segments.push((false, 50));
        waveform
    }

    /// The given bits, with the line left high after the last one.
    pub fn transmitting_bits(bits: &[u8]) -> Self {
        let mut segments = vec![
            // Pull-up before the sensor reacts, then the ack pair
            (true, 20),
            (false, 80),
            (true, 80),
        ];
        for &bit in bits {
            segments.push((false, 50));
            segments.push((true, if bit == 1 { 70 } else { 26 }));
        }
        Waveform { segments }
    }

    /// Moves the sensor's first reaction to `us` after the line is released.
    pub fn responding_after(mut self, us: u64) -> Self {
        if let Some(first) = self.segments.first_mut() {
            *first = (true, us);
        }
        self
    }

    fn level_at(&self, mut offset_us: u64) -> bool {
        for &(high, duration) in &self.segments {
            if offset_us < duration {
                return high;
            }
            offset_us -= duration;
        }
        true
    }
}

/// Open-drain pin wired to a simulated sensor.
pub struct SimPin {
    time: SimTime,
    waveform: Waveform,
    driven_low: bool,
    released_at: Option<u64>,
}

impl SimPin {
    pub fn new(time: SimTime, waveform: Waveform) -> Self {
        SimPin {
            time,
            waveform,
            driven_low: false,
            released_at: None,
        }
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.driven_low = true;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.driven_low {
            self.released_at = Some(self.time.now());
        }
        self.driven_low = false;
        Ok(())
    }
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        if self.driven_low {
            return Ok(false);
        }
        Ok(match self.released_at {
            Some(at) => self.waveform.level_at(self.time.now() - at),
            None => true,
        })
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Error reported by [`ScriptedBus`] for a faulty line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineFault;

/// [`Bus`] double replaying scripted cycle results.
///
/// The last entry repeats once the script is used up.
pub struct ScriptedBus {
    script: Vec<Result<Samples, DhtError<LineFault>>>,
    pub cycles: usize,
    pub prepared: usize,
    /// Simulated time at the start of each cycle, when a clock is attached.
    pub started_at: Vec<u64>,
    time: Option<SimTime>,
}

impl ScriptedBus {
    pub fn new(script: Vec<Result<Samples, DhtError<LineFault>>>) -> Self {
        ScriptedBus {
            script,
            cycles: 0,
            prepared: 0,
            started_at: Vec::new(),
            time: None,
        }
    }

    pub fn with_time(mut self, time: SimTime) -> Self {
        self.time = Some(time);
        self
    }
}

impl Bus for ScriptedBus {
    type Error = LineFault;

    fn prepare(&mut self, _variant: &SensorVariant) -> Result<(), DhtError<LineFault>> {
        self.prepared += 1;
        Ok(())
    }

    fn acquire_cycle<D: DelayNs>(
        &mut self,
        _delay: &mut D,
        _variant: &SensorVariant,
    ) -> Result<Samples, DhtError<LineFault>> {
        if let Some(time) = &self.time {
            self.started_at.push(time.now());
        }
        let index = self.cycles.min(self.script.len() - 1);
        self.cycles += 1;
        self.script[index].clone()
    }
}

/// Watchdog double counting feeds.
#[derive(Default)]
pub struct CountingWatchdog {
    pub feeds: usize,
}

impl Liveness for CountingWatchdog {
    fn feed(&mut self) {
        self.feeds += 1;
    }
}

/// Encodes a frame as sample durations: 30us for a zero bit, 70us for a one bit.
pub fn frame_samples(frame: [u8; 5]) -> Samples {
    let durations: Vec<u32> = frame
        .iter()
        .flat_map(|byte| (0..8).map(move |i| if (byte >> (7 - i)) & 1 == 1 { 70 } else { 30 }))
        .collect();
    Samples::from_durations(&durations)
}
