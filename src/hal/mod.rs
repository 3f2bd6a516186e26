//! Collaborator interfaces consumed by the controller
//!
//! The protocol engine never talks to sockets, LED hardware or system clocks
//! directly. It drives these traits, which keeps the whole pipeline runnable
//! against the in-memory simulator in [`memory`] and against real UDP sockets
//! in [`udp`].

pub mod memory;
pub mod udp;

use tokio::time::Instant;

use crate::Result;
use crate::types::{Millis, Rgb};

/// Network transport: one bound port per run plus a unicast status channel.
///
/// Every method returns immediately; nothing here may block the loop.
pub trait Transport: Send + 'static {
    /// Drain every datagram currently buffered, calling `sink` with the run index
    /// implied by the receiving port and the raw datagram bytes.
    fn poll(&mut self, sink: &mut dyn FnMut(u8, &[u8]));

    /// Send one heartbeat payload to the status target.
    fn send_status(&mut self, payload: &[u8]) -> Result<()>;

    /// Whether the physical link is currently up.
    fn link_up(&self) -> bool;

    /// Address string reported in heartbeats.
    fn ip(&self) -> &str;
}

/// Pixel output with asynchronous, fire-and-forget transmission.
pub trait OutputSurface: Send + 'static {
    /// Number of physical output channels.
    fn strip_count(&self) -> usize;

    /// Pixel capacity of every channel.
    fn pixels_per_strip(&self) -> usize;

    /// Stage one pixel. Writes outside the surface are ignored.
    fn set_pixel(&mut self, strip: usize, index: usize, color: Rgb);

    /// Start transmitting the staged pixels.
    fn show(&mut self);

    /// Whether the previous transmission is still in flight.
    fn is_busy(&self) -> bool;
}

/// Single on/off status indicator.
pub trait StatusLed: Send + 'static {
    fn set(&mut self, on: bool);
}

/// Monotonic millisecond clock, wrapping at 2^32.
pub trait Clock {
    fn now_ms(&self) -> Millis;
}

/// Milliseconds since the clock was created, backed by tokio's clock so paused
/// test time applies.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> Millis {
        // Truncation is the 2^32 wrap
        self.start.elapsed().as_millis() as Millis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn monotonic_clock_follows_tokio_time() {
        let clock = MonotonicClock::new();
        assert_eq!(clock.now_ms(), 0);

        tokio::time::advance(Duration::from_millis(1500)).await;
        assert_eq!(clock.now_ms(), 1500);
    }
}
