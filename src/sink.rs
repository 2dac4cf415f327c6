//! Notification sinks
//!
//! Where completed readings go. The controller pushes each reading into a
//! [`ReadingSink`] from its own context; sinks absorb their transport's
//! failures so the duty cycle keeps running no matter what the consumer
//! does.

use core::fmt::Write as _;

use defmt::warn;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Sender;
use embedded_io_async::Write;

use crate::pulse::Measurement;

/// Consumer of completed range readings
#[allow(async_fn_in_trait)]
pub trait ReadingSink {
    /// Called once per successful duty cycle with the finished reading
    async fn on_reading(&mut self, measurement: Measurement);
}

/// Channels work as sinks directly; readings queue up for whatever task
/// consumes them.
impl<M: RawMutex, const N: usize> ReadingSink for Sender<'_, M, Measurement, N> {
    async fn on_reading(&mut self, measurement: Measurement) {
        self.send(measurement).await;
    }
}

/// Sink that writes each reading to a byte transport as its plain decimal
/// string, with no terminator and no length prefix. Downstream framing,
/// if any, is the consumer's business.
pub struct SerialSink<W> {
    transport: W,
}

impl<W: Write> SerialSink<W> {
    /// Wraps a byte transport (UART, TCP stream, anything
    /// `embedded-io-async`)
    pub fn new(transport: W) -> Self {
        Self { transport }
    }

    /// Releases the transport
    pub fn release(self) -> W {
        self.transport
    }
}

impl<W: Write> ReadingSink for SerialSink<W> {
    async fn on_reading(&mut self, measurement: Measurement) {
        let mut digits = DecimalBuf::default();
        if write!(digits, "{}", measurement.distance).is_err() {
            warn!("reading does not fit the serial buffer, dropped");
            return;
        }
        if self.transport.write_all(digits.as_bytes()).await.is_err() {
            warn!("serial transport write failed, reading dropped");
        }
    }
}

/// Stack buffer for the decimal rendering of one reading
#[derive(Default)]
struct DecimalBuf {
    buf: [u8; 32],
    len: usize,
}

impl DecimalBuf {
    fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl core::fmt::Write for DecimalBuf {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buf.len() - self.len;
        if bytes.len() > remaining {
            return Err(core::fmt::Error);
        }
        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }
}
