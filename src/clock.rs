//! Time and liveness collaborators.

/// A monotonic microsecond counter.
///
/// Used to time pulse widths and to bound every wait on the line. Implement it on
/// top of whatever free-running timer the platform provides.
pub trait Monotonic {
    /// Microseconds since an arbitrary fixed point. Must never go backwards.
    fn now_us(&mut self) -> u64;
}

impl<T: Monotonic + ?Sized> Monotonic for &mut T {
    fn now_us(&mut self) -> u64 {
        T::now_us(self)
    }
}

/// Hook for a supervising watchdog.
///
/// Fed at the start of every bus cycle and after every retry wait, so a read that
/// spends several seconds backing off does not look like a stalled task.
pub trait Liveness {
    /// Signals that the caller is still making progress.
    fn feed(&mut self);
}

impl<T: Liveness + ?Sized> Liveness for &mut T {
    fn feed(&mut self) {
        T::feed(self)
    }
}

/// [`Liveness`] implementation for setups without a watchdog.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoWatchdog;

impl Liveness for NoWatchdog {
    fn feed(&mut self) {}
}
