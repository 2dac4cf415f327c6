//! Pulse width measurement
//!
//! Reduces a stream of timestamped rising/falling edges into completed
//! distance readings.
//!
//! # Edge Handling
//! - Rising edge: records the pulse start timestamp
//! - Falling edge: closes the pulse, converts the elapsed ticks into a
//!   distance and raises the completion signal
//! - A falling edge with no recorded start (power-up glitch, edge missed
//!   while rearming) is ignored
//! - A second rising edge restarts the measurement from the new timestamp
//!
//! # Distance Conversion
//! ```text
//! centimeters = elapsed_ticks / ticks_per_cm
//! inches      = centimeters / 2.54
//! feet        = inches / 12
//! ```
//! The sensor holds the line high for 10 µs per centimeter; `ticks_per_cm`
//! maps that onto whatever tick rate the timestamp capability runs at.

use core::cell::Cell;
use core::convert::Infallible;

use defmt::{debug, info};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;

use crate::capture::EdgeCapture;

/// Centimeters per inch
const CM_PER_INCH: f64 = 2.54;

/// Inches per foot
const INCHES_PER_FOOT: f64 = 12.0;

/// Pulse width per centimeter of range when timestamps are 100 ns ticks
/// (the sensor encodes 10 µs/cm)
const TICKS_PER_CM_100NS: f64 = 100.0;

/// Pulse width per centimeter of range when timestamps are microsecond
/// ticks
const TICKS_PER_CM_MICROS: f64 = 10.0;

/// Direction of a digital signal transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Edge {
    /// Low-to-high transition, starts a pulse
    Rising,
    /// High-to-low transition, ends a pulse
    Falling,
}

/// One timestamped signal transition on the pulse line
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct EdgeEvent {
    /// Transition direction
    pub edge: Edge,
    /// Monotonic tick count at the transition
    pub ticks: u64,
}

/// Unit for reported distances
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum DistanceUnit {
    Centimeters,
    Inches,
    Feet,
}

/// Conversion settings for the pulse timer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseConfig {
    /// Unit of the reported distance
    pub unit: DistanceUnit,
    /// Timestamp ticks per centimeter of range
    pub ticks_per_cm: f64,
}

impl PulseConfig {
    /// Settings for 100 ns timestamp ticks (10 MHz input capture),
    /// reporting feet
    pub const fn default_100ns() -> Self {
        Self {
            unit: DistanceUnit::Feet,
            ticks_per_cm: TICKS_PER_CM_100NS,
        }
    }

    /// Settings for microsecond timestamp ticks, reporting feet
    pub const fn micros() -> Self {
        Self {
            unit: DistanceUnit::Feet,
            ticks_per_cm: TICKS_PER_CM_MICROS,
        }
    }

    /// Converts a closed pulse into a distance in the configured unit
    fn distance(&self, elapsed_ticks: u64) -> f64 {
        let centimeters = elapsed_ticks as f64 / self.ticks_per_cm;
        match self.unit {
            DistanceUnit::Centimeters => centimeters,
            DistanceUnit::Inches => centimeters / CM_PER_INCH,
            DistanceUnit::Feet => (centimeters / CM_PER_INCH) / INCHES_PER_FOOT,
        }
    }
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self::default_100ns()
    }
}

/// One completed range reading
#[derive(Debug, Clone, Copy, PartialEq, defmt::Format)]
pub struct Measurement {
    /// Distance in the configured unit
    pub distance: f64,
    /// Raw pulse width in timestamp ticks that produced this reading
    pub pulse_ticks: u64,
}

/// Edge-to-pulse-width reducer
///
/// Shared between the edge-event context (which feeds [`on_edge`]) and the
/// duty-cycle controller (which rearms it each cycle and awaits the
/// completion signal). The pending start timestamp lives behind a blocking
/// mutex so [`on_edge`] stays safe to call from an interrupt; pick
/// `CriticalSectionRawMutex` as `M` in that case.
///
/// [`on_edge`]: PulseTimer::on_edge
pub struct PulseTimer<M: RawMutex> {
    start: Mutex<M, Cell<Option<u64>>>,
    done: Signal<M, Measurement>,
    config: PulseConfig,
}

impl<M: RawMutex> PulseTimer<M> {
    /// Creates a rearmed pulse timer. Usable in statics.
    pub const fn new(config: PulseConfig) -> Self {
        Self {
            start: Mutex::new(Cell::new(None)),
            done: Signal::new(),
            config,
        }
    }

    /// Feeds one edge into the reducer
    ///
    /// Returns the completed reading when `event` closes a pulse. Never
    /// blocks and never fails: an orphan falling edge is dropped, a repeat
    /// rising edge restarts the measurement. On completion the reading is
    /// also latched for [`completed`](PulseTimer::completed).
    pub fn on_edge(&self, event: EdgeEvent) -> Option<Measurement> {
        match event.edge {
            Edge::Rising => {
                self.start.lock(|start| start.set(Some(event.ticks)));
                None
            }
            Edge::Falling => {
                let Some(start) = self.start.lock(|start| start.take()) else {
                    debug!("falling edge without a pulse start, dropped");
                    return None;
                };
                // Timestamps are monotonic; saturate anyway rather than
                // report a bogus huge distance on a misbehaving capability.
                let pulse_ticks = event.ticks.saturating_sub(start);
                let measurement = Measurement {
                    distance: self.config.distance(pulse_ticks),
                    pulse_ticks,
                };
                self.done.signal(measurement);
                Some(measurement)
            }
        }
    }

    /// Discards any pulse state left over from a previous cycle
    ///
    /// The controller calls this before activating the sensor, so a stale
    /// reading can never be mistaken for one belonging to the new cycle.
    pub fn rearm(&self) {
        self.start.lock(|start| start.set(None));
        self.done.reset();
    }

    /// Waits for the next completed reading
    pub async fn completed(&self) -> Measurement {
        self.done.wait().await
    }
}

/// Feeds a pulse timer from an edge capture capability
///
/// Runs until the capability fails; spawn it wherever edge waits are
/// serviced. When edges arrive through a raw interrupt handler instead,
/// skip this and call [`PulseTimer::on_edge`] from the handler directly.
pub async fn watch_edges<M, C>(timer: &PulseTimer<M>, mut capture: C) -> Result<Infallible, C::Error>
where
    M: RawMutex,
    C: EdgeCapture,
{
    info!("edge watch started");
    loop {
        let event = capture.next_edge().await?;
        timer.on_edge(event);
    }
}
