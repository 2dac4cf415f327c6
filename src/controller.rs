//! Duty-cycle controller
//!
//! Runs the sensor's measure/power-cycle loop: enable the sensor, wait for
//! it to wake, wait for one completed pulse bounded by a timeout, power it
//! down again, cool off, then report. Power-cycling between readings keeps
//! consumption down and the pulse line quiet while the next cycle is set
//! up.
//!
//! # Failure Semantics
//! - A cycle that times out is a dropped sample, logged and absorbed; the
//!   next cycle starts immediately
//! - An unavailable enable output is fatal: it surfaces once from
//!   [`RangeController::run`] and the duty cycle never starts
//! - The notification sink is invoked at most once per cycle, always from
//!   the controller's own context, never from the edge context

use defmt::{debug, info};
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;

use crate::pulse::PulseTimer;
use crate::sink::ReadingSink;

/// Sensor settling time after power-up; the pulse output is not
/// meaningful earlier
const WAKE_DELAY_MS: u32 = 5;

/// Upper bound on one measurement; a pulse not closed by then is dropped
const MEASURE_TIMEOUT_MS: u32 = 40;

/// Power-down pause between cycles
const COOLDOWN_MS: u32 = 5;

/// Phase of the measurement duty cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum CycleState {
    /// Between cycles, sensor unpowered
    Idle,
    /// Sensor enabled, waiting out the wake-up delay
    PoweredWaking,
    /// Listening for a completed pulse, bounded by the timeout
    Armed,
    /// Sensor disabled again, waiting out the cool-down
    Cooling,
}

/// Timing of one duty cycle, all in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct CycleConfig {
    /// Pause after enabling the sensor before its output counts
    pub wake_delay_ms: u32,
    /// Bound on the wait for a completed measurement
    pub measure_timeout_ms: u32,
    /// Pause after disabling the sensor before the next cycle
    pub cooldown_ms: u32,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            wake_delay_ms: WAKE_DELAY_MS,
            measure_timeout_ms: MEASURE_TIMEOUT_MS,
            cooldown_ms: COOLDOWN_MS,
        }
    }
}

/// Controller failure
#[derive(Debug, thiserror::Error)]
pub enum Error<E> {
    /// The enable output capability failed
    #[error("enable output unavailable")]
    Enable(E),
}

/// Drives one range sensor through its measurement duty cycle
///
/// Owns the enable output and the delay capability; shares the
/// [`PulseTimer`] with whatever context feeds edges into it. Construct it
/// once and hand it to the task that runs the loop; there are no global
/// instances.
pub struct RangeController<'t, M: RawMutex, EN, D, S> {
    enable: EN,
    delay: D,
    timer: &'t PulseTimer<M>,
    sink: S,
    config: CycleConfig,
    state: CycleState,
}

impl<'t, M, EN, D, S> RangeController<'t, M, EN, D, S>
where
    M: RawMutex,
    EN: OutputPin,
    D: DelayNs,
    S: ReadingSink,
{
    /// Creates an idle controller; nothing happens until [`run`]
    ///
    /// [`run`]: RangeController::run
    pub fn new(
        enable: EN,
        delay: D,
        timer: &'t PulseTimer<M>,
        sink: S,
        config: CycleConfig,
    ) -> Self {
        Self {
            enable,
            delay,
            timer,
            sink,
            config,
            state: CycleState::Idle,
        }
    }

    /// Current duty-cycle phase
    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Runs measurement cycles until `shutdown` is signalled
    ///
    /// Spawn this on its own task; it must not run on the edge-event
    /// context. The sensor is forced off before the first cycle, so a dead
    /// enable capability surfaces here and the loop never starts. Shutdown
    /// is honoured between cycles: an in-flight cycle always completes,
    /// including its notification.
    pub async fn run<SM: RawMutex>(
        &mut self,
        shutdown: &Signal<SM, ()>,
    ) -> Result<(), Error<EN::Error>> {
        self.enable.set_low().map_err(Error::Enable)?;
        info!("range controller started");
        while !shutdown.signaled() {
            self.cycle().await?;
        }
        info!("range controller stopped");
        Ok(())
    }

    /// One full duty cycle: one measurement attempt
    async fn cycle(&mut self) -> Result<(), Error<EN::Error>> {
        // Clear pulse state from the previous cycle before the sensor can
        // produce new edges.
        self.timer.rearm();
        self.state = CycleState::PoweredWaking;
        self.enable.set_high().map_err(Error::Enable)?;
        self.delay.delay_ms(self.config.wake_delay_ms).await;

        self.state = CycleState::Armed;
        let outcome = select(
            self.timer.completed(),
            self.delay.delay_ms(self.config.measure_timeout_ms),
        )
        .await;

        // Power down regardless of outcome.
        self.state = CycleState::Cooling;
        self.enable.set_low().map_err(Error::Enable)?;
        self.delay.delay_ms(self.config.cooldown_ms).await;

        self.state = CycleState::Idle;
        match outcome {
            Either::First(measurement) => {
                debug!(
                    "range {} ({} ticks)",
                    measurement.distance, measurement.pulse_ticks
                );
                self.sink.on_reading(measurement).await;
            }
            Either::Second(()) => {
                debug!("no pulse within the timeout, sample dropped");
            }
        }
        Ok(())
    }
}
