//! Receiver statistics

use serde::Serialize;

/// Per-interval receive counters.
///
/// Counters are owned by the assembler and handed out with read-and-clear
/// semantics, so each snapshot covers exactly one reporting interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReceiverStats {
    /// Datagrams handed to the assembler, including ones later dropped
    pub rx_packets: u32,
    /// Frames for which every run arrived
    pub complete_frames: u32,
    /// Frames handed out for display
    pub applied_frames: u32,
    /// Datagrams dropped for a length mismatch or unknown run
    pub drops_len: u32,
    /// Datagrams dropped because their frame was not newer than the last applied one
    pub drops_stale: u32,
}

impl ReceiverStats {
    /// Length and staleness drops combined, as reported in heartbeats.
    pub fn dropped(&self) -> u32 {
        self.drops_len.saturating_add(self.drops_stale)
    }
}
