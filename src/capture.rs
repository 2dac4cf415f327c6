//! Edge capture capability
//!
//! The driver does not own pins or timers; it consumes an [`EdgeCapture`]
//! capability that delivers timestamped transitions of the sensor's pulse
//! line. [`PulsePin`] provides that capability for any HAL with
//! `embedded-hal-async` pin waits and a monotonic tick source.

use embedded_hal_async::digital::Wait;

use crate::pulse::{Edge, EdgeEvent};

/// Monotonic tick source used to timestamp edges
///
/// Ticks never go backwards. The tick rate is whatever the integrator's
/// timer runs at; [`PulseConfig`](crate::PulseConfig) maps it onto the
/// sensor's pulse encoding.
pub trait Clock {
    /// Current tick count
    fn now_ticks(&self) -> u64;
}

/// Source of timestamped edges on the pulse line
#[allow(async_fn_in_trait)]
pub trait EdgeCapture {
    /// Capability failure (pin fault, capture unit gone)
    type Error;

    /// Waits for the next transition and returns it with its timestamp
    async fn next_edge(&mut self) -> Result<EdgeEvent, Self::Error>;
}

/// [`EdgeCapture`] adapter for an `embedded-hal-async` input pin
///
/// Alternates rising/falling waits and stamps each transition with the
/// clock. Timestamping happens after the wait resumes, so the tick count
/// carries the executor's wake-up latency; prefer a hardware input-capture
/// backed [`EdgeCapture`] implementation where pulse widths must be exact.
pub struct PulsePin<P, C> {
    pin: P,
    clock: C,
    next: Edge,
}

impl<P, C> PulsePin<P, C>
where
    P: Wait,
    C: Clock,
{
    /// Wraps a pulse input pin and a tick source
    ///
    /// Assumes the line is idle low (sensor disabled), so the first
    /// transition of interest is a rising edge.
    pub fn new(pin: P, clock: C) -> Self {
        Self {
            pin,
            clock,
            next: Edge::Rising,
        }
    }

    /// Releases the pin and clock
    pub fn release(self) -> (P, C) {
        (self.pin, self.clock)
    }
}

impl<P, C> EdgeCapture for PulsePin<P, C>
where
    P: Wait,
    C: Clock,
{
    type Error = P::Error;

    async fn next_edge(&mut self) -> Result<EdgeEvent, Self::Error> {
        match self.next {
            Edge::Rising => self.pin.wait_for_rising_edge().await?,
            Edge::Falling => self.pin.wait_for_falling_edge().await?,
        }
        let event = EdgeEvent {
            edge: self.next,
            ticks: self.clock.now_ticks(),
        };
        self.next = match self.next {
            Edge::Rising => Edge::Falling,
            Edge::Falling => Edge::Rising,
        };
        Ok(event)
    }
}
