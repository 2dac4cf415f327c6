//! Shared test doubles: recording capabilities and host-side glue for
//! defmt and critical-section.

use core::sync::atomic::{AtomicU32, Ordering};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use critical_section::RawRestoreState;
use defmt_rtt as _;
use embassy_futures::yield_now;
use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};
use embedded_hal_async::delay::DelayNs;

use crate::capture::EdgeCapture;
use crate::pulse::{EdgeEvent, Measurement};
use crate::sink::ReadingSink;

// Tests run single-threaded under block_on; a no-op critical section is
// enough to satisfy defmt-rtt and the blocking mutexes.
struct SingleThreaded;

unsafe impl critical_section::Impl for SingleThreaded {
    unsafe fn acquire() -> RawRestoreState {}
    unsafe fn release(_state: RawRestoreState) {}
}
critical_section::set_impl!(SingleThreaded);

static COUNT: AtomicU32 = AtomicU32::new(0);
defmt::timestamp!("{=u32}", COUNT.fetch_add(1, Ordering::Relaxed));

/// Everything the mocks observe, in the order it happened
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TestEvent {
    /// Enable output transition
    Enable(bool),
    /// Delay started, total nanoseconds
    Delay(u64),
    /// Sink received a reading
    Reading(Measurement),
}

pub type Log = Rc<RefCell<Vec<TestEvent>>>;

/// Enable transitions in recorded order
pub fn enable_events(events: &[TestEvent]) -> impl Iterator<Item = bool> + '_ {
    events.iter().filter_map(|event| match event {
        TestEvent::Enable(active) => Some(*active),
        _ => None,
    })
}

/// Yields until the log satisfies `pred`
pub async fn until(log: &Log, pred: impl Fn(&[TestEvent]) -> bool) {
    loop {
        if pred(&log.borrow()) {
            return;
        }
        yield_now().await;
    }
}

/// Enable pin that records its transitions
pub struct LogPin {
    log: Log,
}

impl LogPin {
    pub fn new(log: &Log) -> Self {
        Self {
            log: Rc::clone(log),
        }
    }
}

impl ErrorType for LogPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for LogPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(TestEvent::Enable(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(TestEvent::Enable(true));
        Ok(())
    }
}

/// Enable pin whose capability is gone
pub struct BrokenPin;

impl ErrorType for BrokenPin {
    type Error = ErrorKind;
}

impl OutputPin for BrokenPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Err(ErrorKind::Other)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Err(ErrorKind::Other)
    }
}

/// Delay that records its duration and completes after one yield, so
/// concurrent test futures get to run in between
pub struct LogDelay {
    log: Log,
}

impl LogDelay {
    pub fn new(log: &Log) -> Self {
        Self {
            log: Rc::clone(log),
        }
    }

    async fn record(&mut self, ns: u64) {
        self.log.borrow_mut().push(TestEvent::Delay(ns));
        yield_now().await;
    }
}

impl DelayNs for LogDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.record(ns as u64).await;
    }

    async fn delay_us(&mut self, us: u32) {
        self.record(us as u64 * 1_000).await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.record(ms as u64 * 1_000_000).await;
    }
}

/// Sink that records every reading it is handed
pub struct LogSink {
    log: Log,
}

impl LogSink {
    pub fn new(log: &Log) -> Self {
        Self {
            log: Rc::clone(log),
        }
    }
}

impl ReadingSink for LogSink {
    async fn on_reading(&mut self, measurement: Measurement) {
        self.log.borrow_mut().push(TestEvent::Reading(measurement));
    }
}

/// Edge capture that replays a script, then pends forever
pub struct ScriptedCapture {
    script: VecDeque<Result<EdgeEvent, &'static str>>,
}

impl ScriptedCapture {
    pub fn new(script: Vec<Result<EdgeEvent, &'static str>>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl EdgeCapture for ScriptedCapture {
    type Error = &'static str;

    async fn next_edge(&mut self) -> Result<EdgeEvent, Self::Error> {
        match self.script.pop_front() {
            Some(event) => event,
            None => core::future::pending().await,
        }
    }
}

/// In-memory byte transport for sink tests
#[derive(Default)]
pub struct MemTransport {
    written: Vec<u8>,
}

impl MemTransport {
    pub fn written(&self) -> &[u8] {
        &self.written
    }
}

impl embedded_io_async::ErrorType for MemTransport {
    type Error = core::convert::Infallible;
}

impl embedded_io_async::Write for MemTransport {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
