//! Async driver for range sensors with pulse-width-encoded output
//!
//! Drives a time-of-flight range sensor (LIDAR-Lite in PWM mode and
//! compatible units) that reports distance by holding a digital line high
//! for a duration proportional to the measured range. The driver captures
//! rising/falling edge timestamps, converts the pulse width into a
//! distance, and power-cycles the sensor between readings.
//!
//! # Sensor Operation
//! - The sensor free-runs while its enable line is active and encodes
//!   10 µs of pulse width per centimeter of range
//! - One duty cycle = power up, wait for wake-up, capture one pulse
//!   (bounded by a timeout), power down, cool down
//! - A timed-out cycle is a dropped sample, not an error; the next cycle
//!   starts immediately
//!
//! # Hardware Capabilities
//! All hardware access is injected through traits, so the driver runs on
//! any HAL that implements `embedded-hal`/`embedded-hal-async`:
//! - [`OutputPin`](embedded_hal::digital::OutputPin) for the enable line
//! - [`EdgeCapture`] for timestamped edges on the pulse line, with
//!   [`PulsePin`] adapting any [`Wait`](embedded_hal_async::digital::Wait)
//!   pin plus a monotonic [`Clock`]
//! - [`DelayNs`](embedded_hal_async::delay::DelayNs) for the wake,
//!   timeout and cool-down pauses
//!
//! # Concurrency
//! Edges may arrive from an interrupt or a dedicated high-priority task.
//! [`PulseTimer::on_edge`] is non-blocking and safe to call from there;
//! completed readings cross over to the controller through a one-shot
//! signal, so the duty-cycle loop suspends instead of polling.
//!
//! # Example
//! ```rust,ignore
//! use embassy_executor::Spawner;
//! use embassy_rp::gpio::{Input, Level, Output, Pull};
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//! use embassy_sync::signal::Signal;
//! use embassy_time::{Delay, Instant};
//! use lidar_pwm::{
//!     watch_edges, Clock, CycleConfig, PulseConfig, PulsePin, PulseTimer, RangeController,
//!     SerialSink,
//! };
//!
//! static PULSE_TIMER: PulseTimer<CriticalSectionRawMutex> =
//!     PulseTimer::new(PulseConfig::micros());
//! static SHUTDOWN: Signal<CriticalSectionRawMutex, ()> = Signal::new();
//!
//! struct EmbassyClock;
//!
//! impl Clock for EmbassyClock {
//!     fn now_ticks(&self) -> u64 {
//!         Instant::now().as_micros()
//!     }
//! }
//!
//! #[embassy_executor::task]
//! async fn pulse_watch(pin: Input<'static>) {
//!     let capture = PulsePin::new(pin, EmbassyClock);
//!     watch_edges(&PULSE_TIMER, capture).await.ok();
//! }
//!
//! #[embassy_executor::main]
//! async fn main(spawner: Spawner) {
//!     let p = embassy_rp::init(Default::default());
//!     let enable = Output::new(p.PIN_1, Level::Low);
//!     let pulse = Input::new(p.PIN_0, Pull::None);
//!     spawner.spawn(pulse_watch(pulse)).unwrap();
//!
//!     let uart = /* some embedded_io_async::Write transport */;
//!     let mut controller = RangeController::new(
//!         enable,
//!         Delay,
//!         &PULSE_TIMER,
//!         SerialSink::new(uart),
//!         CycleConfig::default(),
//!     );
//!     controller.run(&SHUTDOWN).await.unwrap();
//! }
//! ```

#![cfg_attr(not(test), no_std)]

/// Hardware input capability: timestamped edges
pub mod capture;
/// Duty-cycle controller
pub mod controller;
/// Edge-to-pulse-width reduction and distance conversion
pub mod pulse;
/// Downstream notification sinks
pub mod sink;

#[cfg(test)]
mod testutil;

pub use capture::{Clock, EdgeCapture, PulsePin};
pub use controller::{CycleConfig, CycleState, Error, RangeController};
pub use pulse::{
    watch_edges, DistanceUnit, Edge, EdgeEvent, Measurement, PulseConfig, PulseTimer,
};
pub use sink::{ReadingSink, SerialSink};
