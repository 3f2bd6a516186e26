//! Frame application to the physical output surface
//!
//! The [`OutputDriver`] maps assembled frames (every run's RGB bytes, concatenated
//! in run order) back onto strips, one strip per run, and enforces the power-up
//! blackout: frames are only accepted once [`STARTUP_BLACKOUT_MS`] have passed
//! since initialization, or once a frame has already been applied.

use tracing::{debug, trace};

use crate::hal::OutputSurface;
use crate::types::{BYTES_PER_PIXEL, Millis, Rgb, Topology, elapsed_ms};
use crate::{ControllerError, Result};

/// Minimum time the outputs stay black after initialization.
pub const STARTUP_BLACKOUT_MS: u32 = 1000;

/// Drives an [`OutputSurface`] with assembled frames and startup patterns.
#[derive(Debug)]
pub struct OutputDriver<S> {
    surface: S,
    topology: Topology,
    started_at: Millis,
    frame_applied: bool,
}

impl<S: OutputSurface> OutputDriver<S> {
    /// Take ownership of `surface` and blank it.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Topology`] when the surface has fewer strips than
    /// the topology has runs, or a run is longer than a strip.
    pub fn new(mut surface: S, topology: Topology, now: Millis) -> Result<Self> {
        if surface.strip_count() < topology.run_count() {
            return Err(ControllerError::topology(format!(
                "{} runs need {} strips, surface has {}",
                topology.run_count(),
                topology.run_count(),
                surface.strip_count()
            )));
        }
        if topology.max_pixels() > surface.pixels_per_strip() {
            return Err(ControllerError::topology(format!(
                "longest run has {} pixels, strips hold {}",
                topology.max_pixels(),
                surface.pixels_per_strip()
            )));
        }

        blank(&mut surface);
        surface.show();
        debug!("Output blanked across {} strips", surface.strip_count());

        Ok(Self { surface, topology, started_at: now, frame_applied: false })
    }

    /// Write one assembled frame to the strips and start transmission.
    ///
    /// Pixels past a run's length and every strip without a run are set black.
    pub fn apply(&mut self, frame: &[u8]) {
        let pixels_per_strip = self.surface.pixels_per_strip();

        for run in 0..self.topology.run_count() {
            let run_bytes = self.topology.run_range(run).and_then(|range| frame.get(range));
            let mut written = 0;
            if let Some(bytes) = run_bytes {
                for (index, pixel) in bytes.chunks_exact(BYTES_PER_PIXEL).enumerate() {
                    if let Some(color) = Rgb::from_bytes(pixel) {
                        self.surface.set_pixel(run, index, color);
                    }
                    written = index + 1;
                }
            } else {
                trace!("Frame of {} bytes has no data for run {}", frame.len(), run);
            }
            for index in written..pixels_per_strip {
                self.surface.set_pixel(run, index, Rgb::BLACK);
            }
        }

        for strip in self.topology.run_count()..self.surface.strip_count() {
            for index in 0..pixels_per_strip {
                self.surface.set_pixel(strip, index, Rgb::BLACK);
            }
        }

        self.surface.show();
        self.frame_applied = true;
    }

    /// Set every pixel of every strip black and start transmission.
    pub fn show_black(&mut self) {
        blank(&mut self.surface);
        self.surface.show();
    }

    /// Stage `color` on every pixel of one run. Takes effect on [`show`](Self::show).
    pub fn fill_run(&mut self, run: usize, color: Rgb) {
        let Some(count) = self.topology.pixel_count(run) else {
            return;
        };
        for index in 0..count {
            self.surface.set_pixel(run, index, color);
        }
    }

    /// Stage `color` on every run.
    pub fn fill_all_runs(&mut self, color: Rgb) {
        for run in 0..self.topology.run_count() {
            self.fill_run(run, color);
        }
    }

    /// Start transmitting the staged pixels.
    pub fn show(&mut self) {
        self.surface.show();
    }

    pub fn is_busy(&self) -> bool {
        self.surface.is_busy()
    }

    /// Whether frames may be applied. Opens after the blackout period or the first
    /// applied frame and never closes again.
    pub fn ready_for_frames(&self, now: Millis) -> bool {
        self.frame_applied || elapsed_ms(now, self.started_at) >= STARTUP_BLACKOUT_MS
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

fn blank<S: OutputSurface>(surface: &mut S) {
    for strip in 0..surface.strip_count() {
        for index in 0..surface.pixels_per_strip() {
            surface.set_pixel(strip, index, Rgb::BLACK);
        }
    }
}
