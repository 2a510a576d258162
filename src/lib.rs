//! DHT11 / DHT22 Sensor Driver for Embedded Rust
//!
//! This crate provides a platform-agnostic driver for the DHT11 and DHT22 (AM2302)
//! temperature and humidity sensors, built on top of the [`embedded-hal`] traits.
//! It drives the single-wire bus, times every pulse against a monotonic clock,
//! decodes and checks the 40-bit frame, and retries bad reads with a fixed backoff.
//!
//! # Features
//! - Blocking synchronous API using `embedded-hal` traits
//! - Designed for `no_std` environments
//! - Never hangs: every wait on the line is bounded by a timeout
//! - Never fails loudly: a read yields either a valid [`Reading`] or
//!   [`Reading::sentinel`]
//!
//! # Dependencies
//! This driver depends on the following `embedded-hal` traits:
//! - [`InputPin`] and [`OutputPin`] for GPIO access
//! - [`DelayNs`] for the wake pulse and the retry backoff
//!
//! and on two small traits of its own:
//! - [`Monotonic`] for measuring pulse widths
//! - [`Liveness`] for feeding a watchdog during long reads
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` and logs through `defmt`
//! - `log`: Logs through the `log` facade
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal
//! [`InputPin`]: embedded_hal::digital::InputPin
//! [`OutputPin`]: embedded_hal::digital::OutputPin
//! [`DelayNs`]: embedded_hal::delay::DelayNs

#![cfg_attr(not(test), no_std)]

#[cfg(all(feature = "defmt", feature = "log"))]
compile_error!("Features \"defmt\" and \"log\" are mutually exclusive and cannot be enabled together");

mod fmt;

pub mod bus;
pub mod clock;
pub mod error;
pub mod frame;
pub mod retry;
pub mod sensor;
pub mod variant;

#[cfg(test)]
mod sim;

pub use bus::{Bus, BusDriver, Samples};
pub use clock::{Liveness, Monotonic, NoWatchdog};
pub use error::{DhtError, FrameError};
pub use frame::{RawFrame, Reading, SENTINEL};
pub use retry::{Action, RetryPolicy};
pub use sensor::{Dht, acquire_and_decode};
pub use variant::{LegacyFallback, SensorVariant, VariantKind};
