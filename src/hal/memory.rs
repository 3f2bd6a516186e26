//! In-memory simulator for every collaborator interface
//!
//! Each type is a cheap, cloneable handle onto shared state: hand one clone to the
//! [`Controller`](crate::Controller) and keep another to inject datagrams, inspect
//! pixels or read back heartbeats. The binary runs on [`MemorySurface`] because no
//! physical LED output is attached on a host.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{Clock, OutputSurface, StatusLed, Transport};
use crate::types::{Millis, Rgb};
use crate::{ControllerError, Result};

fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct TransportState {
    inbox: VecDeque<(u8, Vec<u8>)>,
    sent: Vec<Vec<u8>>,
    link_up: bool,
    fail_sends: bool,
}

/// Transport backed by an injected datagram queue.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    ip: String,
    state: Arc<Mutex<TransportState>>,
}

impl MemoryTransport {
    /// New transport with the link up and nothing queued.
    pub fn new(ip: impl Into<String>) -> Self {
        let state = TransportState {
            inbox: VecDeque::new(),
            sent: Vec::new(),
            link_up: true,
            fail_sends: false,
        };
        Self { ip: ip.into(), state: Arc::new(Mutex::new(state)) }
    }

    /// Queue a datagram as if it arrived on run `run_index`'s port.
    pub fn inject(&self, run_index: u8, datagram: impl Into<Vec<u8>>) {
        lock(&self.state).inbox.push_back((run_index, datagram.into()));
    }

    /// Datagrams still waiting to be polled.
    pub fn pending(&self) -> usize {
        lock(&self.state).inbox.len()
    }

    /// Remove and return every heartbeat payload sent so far.
    pub fn take_sent(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut lock(&self.state).sent)
    }

    /// Number of heartbeat payloads sent and not yet taken.
    pub fn sent_count(&self) -> usize {
        lock(&self.state).sent.len()
    }

    pub fn set_link_up(&self, up: bool) {
        lock(&self.state).link_up = up;
    }

    /// Make every following `send_status` fail until cleared.
    pub fn set_send_failure(&self, fail: bool) {
        lock(&self.state).fail_sends = fail;
    }
}

impl Transport for MemoryTransport {
    fn poll(&mut self, sink: &mut dyn FnMut(u8, &[u8])) {
        // Swap the queue out so the sink can inject without deadlocking
        let inbox = std::mem::take(&mut lock(&self.state).inbox);
        for (run_index, datagram) in &inbox {
            sink(*run_index, datagram);
        }
    }

    fn send_status(&mut self, payload: &[u8]) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_sends {
            return Err(ControllerError::Io(std::io::Error::other("simulated send failure")));
        }
        state.sent.push(payload.to_vec());
        Ok(())
    }

    fn link_up(&self) -> bool {
        lock(&self.state).link_up
    }

    fn ip(&self) -> &str {
        &self.ip
    }
}

#[derive(Debug)]
struct SurfaceState {
    staged: Vec<Rgb>,
    shown: Vec<Rgb>,
    show_count: u32,
    busy: bool,
}

/// Output surface that records staged and transmitted pixels.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    strip_count: usize,
    pixels_per_strip: usize,
    state: Arc<Mutex<SurfaceState>>,
}

impl MemorySurface {
    pub fn new(strip_count: usize, pixels_per_strip: usize) -> Self {
        let len = strip_count * pixels_per_strip;
        let state = SurfaceState {
            staged: vec![Rgb::BLACK; len],
            shown: vec![Rgb::BLACK; len],
            show_count: 0,
            busy: false,
        };
        Self { strip_count, pixels_per_strip, state: Arc::new(Mutex::new(state)) }
    }

    /// Pixel as of the last `show`.
    pub fn pixel(&self, strip: usize, index: usize) -> Option<Rgb> {
        let offset = self.offset(strip, index)?;
        Some(lock(&self.state).shown[offset])
    }

    /// Every pixel of one strip as of the last `show`.
    pub fn strip(&self, strip: usize) -> Vec<Rgb> {
        if strip >= self.strip_count {
            return Vec::new();
        }
        let start = strip * self.pixels_per_strip;
        lock(&self.state).shown[start..start + self.pixels_per_strip].to_vec()
    }

    /// Whether every transmitted pixel is black.
    pub fn is_dark(&self) -> bool {
        lock(&self.state).shown.iter().all(|&pixel| pixel == Rgb::BLACK)
    }

    /// Number of transmissions started.
    pub fn show_count(&self) -> u32 {
        lock(&self.state).show_count
    }

    /// Simulate a transmission still in flight.
    pub fn set_busy(&self, busy: bool) {
        lock(&self.state).busy = busy;
    }

    fn offset(&self, strip: usize, index: usize) -> Option<usize> {
        (strip < self.strip_count && index < self.pixels_per_strip)
            .then_some(strip * self.pixels_per_strip + index)
    }
}

impl OutputSurface for MemorySurface {
    fn strip_count(&self) -> usize {
        self.strip_count
    }

    fn pixels_per_strip(&self) -> usize {
        self.pixels_per_strip
    }

    fn set_pixel(&mut self, strip: usize, index: usize, color: Rgb) {
        if let Some(offset) = self.offset(strip, index) {
            lock(&self.state).staged[offset] = color;
        }
    }

    fn show(&mut self) {
        let mut state = lock(&self.state);
        let SurfaceState { staged, shown, show_count, .. } = &mut *state;
        shown.copy_from_slice(staged);
        *show_count = show_count.wrapping_add(1);
    }

    fn is_busy(&self) -> bool {
        lock(&self.state).busy
    }
}

#[derive(Debug, Default)]
struct LedState {
    on: bool,
    changes: u32,
}

/// Status LED that remembers its level and how often it changed.
#[derive(Debug, Clone, Default)]
pub struct MemoryStatusLed {
    state: Arc<Mutex<LedState>>,
}

impl MemoryStatusLed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on(&self) -> bool {
        lock(&self.state).on
    }

    /// Number of on/off transitions so far.
    pub fn changes(&self) -> u32 {
        lock(&self.state).changes
    }
}

impl StatusLed for MemoryStatusLed {
    fn set(&mut self, on: bool) {
        let mut state = lock(&self.state);
        if state.on != on {
            state.on = on;
            state.changes += 1;
        }
    }
}

/// Hand-driven clock for deterministic tests.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU32>,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self { now: Arc::new(AtomicU32::new(start)) }
    }

    pub fn set(&self, now: Millis) {
        self.now.store(now, Ordering::Relaxed);
    }

    /// Move forward by `ms`, wrapping at 2^32. Returns the new time.
    pub fn advance(&self, ms: u32) -> Millis {
        self.now.fetch_add(ms, Ordering::Relaxed).wrapping_add(ms)
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_drains_in_arrival_order() {
        let handle = MemoryTransport::new("10.10.0.2");
        let mut transport = handle.clone();
        handle.inject(1, vec![1]);
        handle.inject(0, vec![2, 2]);

        let mut seen = Vec::new();
        transport.poll(&mut |run, datagram| seen.push((run, datagram.to_vec())));

        assert_eq!(seen, vec![(1, vec![1]), (0, vec![2, 2])]);
        assert_eq!(handle.pending(), 0);
    }

    #[test]
    fn transport_records_and_fails_sends() {
        let handle = MemoryTransport::new("10.10.0.2");
        let mut transport = handle.clone();

        transport.send_status(b"one").unwrap();
        handle.set_send_failure(true);
        assert!(transport.send_status(b"two").is_err());

        assert_eq!(handle.take_sent(), vec![b"one".to_vec()]);
        assert_eq!(handle.sent_count(), 0);
    }

    #[test]
    fn surface_shows_staged_pixels_only_on_show() {
        let handle = MemorySurface::new(2, 3);
        let mut surface = handle.clone();

        surface.set_pixel(1, 2, Rgb::WARM_WHITE);
        surface.set_pixel(2, 0, Rgb::WARM_WHITE);
        surface.set_pixel(0, 3, Rgb::WARM_WHITE);
        assert!(handle.is_dark());

        surface.show();
        assert_eq!(handle.pixel(1, 2), Some(Rgb::WARM_WHITE));
        assert_eq!(handle.pixel(2, 0), None);
        assert_eq!(handle.strip(0), vec![Rgb::BLACK; 3]);
        assert_eq!(handle.show_count(), 1);
    }

    #[test]
    fn status_led_counts_transitions() {
        let handle = MemoryStatusLed::new();
        let mut led = handle.clone();
        led.set(true);
        led.set(true);
        led.set(false);
        assert!(!handle.is_on());
        assert_eq!(handle.changes(), 2);
    }

    #[test]
    fn manual_clock_wraps() {
        let clock = ManualClock::new(u32::MAX - 1);
        assert_eq!(clock.advance(3), 1);
        assert_eq!(clock.now_ms(), 1);
    }
}
