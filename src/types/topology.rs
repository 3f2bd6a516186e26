//! Fixed run topology of one controller

use std::ops::Range;

use crate::{ControllerError, Result};

/// Maximum number of runs a controller drives (one bit per run in the received mask).
pub const MAX_RUNS: usize = 8;

/// Bytes per pixel on the wire and in assembled frames (R, G, B).
pub const BYTES_PER_PIXEL: usize = 3;

/// Per-device run layout: how many pixels each run has and where each run's
/// bytes live inside an assembled frame.
///
/// The topology is fixed for the process lifetime. Frame buffers are laid out as
/// the concatenation of every run's RGB bytes in run order, so the byte offset of
/// run `n` is the sum of the sizes of runs `0..n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    pixel_counts: Vec<u16>,
    offsets: Vec<usize>,
    frame_size: usize,
}

impl Topology {
    /// Build a topology from per-run pixel counts.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Topology`] when there are no runs, more than
    /// [`MAX_RUNS`] runs, or a run with zero pixels.
    pub fn new(pixel_counts: &[u16]) -> Result<Self> {
        if pixel_counts.is_empty() {
            return Err(ControllerError::topology("at least one run is required"));
        }
        if pixel_counts.len() > MAX_RUNS {
            return Err(ControllerError::topology(format!(
                "{} runs configured, at most {} are supported",
                pixel_counts.len(),
                MAX_RUNS
            )));
        }
        if let Some(run) = pixel_counts.iter().position(|&count| count == 0) {
            return Err(ControllerError::topology(format!("run {run} has no pixels")));
        }

        let mut offsets = Vec::with_capacity(pixel_counts.len());
        let mut frame_size = 0usize;
        for &count in pixel_counts {
            offsets.push(frame_size);
            frame_size += usize::from(count) * BYTES_PER_PIXEL;
        }

        Ok(Self { pixel_counts: pixel_counts.to_vec(), offsets, frame_size })
    }

    /// Number of runs.
    pub fn run_count(&self) -> usize {
        self.pixel_counts.len()
    }

    /// Per-run pixel counts in run order.
    pub fn pixel_counts(&self) -> &[u16] {
        &self.pixel_counts
    }

    /// Pixel count of one run, `None` for an unknown run index.
    pub fn pixel_count(&self, run: usize) -> Option<usize> {
        self.pixel_counts.get(run).map(|&count| usize::from(count))
    }

    /// Largest pixel count of any run.
    pub fn max_pixels(&self) -> usize {
        self.pixel_counts.iter().copied().map(usize::from).max().unwrap_or(0)
    }

    /// Number of RGB bytes carried for one run.
    pub fn run_bytes(&self, run: usize) -> Option<usize> {
        self.pixel_count(run).map(|count| count * BYTES_PER_PIXEL)
    }

    /// Byte range of one run inside an assembled frame.
    pub fn run_range(&self, run: usize) -> Option<Range<usize>> {
        let start = *self.offsets.get(run)?;
        let len = self.run_bytes(run)?;
        Some(start..start + len)
    }

    /// Total size of an assembled frame in bytes.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Received-mask value once every run has contributed to a frame.
    pub fn expected_mask(&self) -> u8 {
        // run_count is at most 8, so the shift stays within u16
        ((1u16 << self.run_count()) - 1) as u8
    }
}
