//! Periodic status reports back to the sender
//!
//! Once per [`HEARTBEAT_INTERVAL_MS`] the reporter drains the assembler's counters
//! and pending error into a [`HeartbeatRecord`] and sends it as JSON:
//!
//! ```json
//! {"id":"LEFT","ip":"10.10.0.2","uptime_ms":12000,"link":true,"runs":2,
//!  "leds":[300,240],"rx_frames":120,"complete":60,"applied":60,
//!  "dropped_frames":0,"errors":[]}
//! ```
//!
//! Counters cover exactly one interval. At most one error is reported: only the
//! most recent event since the previous heartbeat survives.

use serde::Serialize;
use tracing::{debug, warn};

use crate::assembler::FrameAssembler;
use crate::hal::Transport;
use crate::types::{Millis, elapsed_ms};
use crate::{ControllerError, Result};

/// Time between two heartbeats.
pub const HEARTBEAT_INTERVAL_MS: u32 = 1000;

/// Maximum length of the reported error, in characters.
pub const MAX_REPORTED_ERROR_CHARS: usize = 600;

/// One heartbeat, as serialized on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeartbeatRecord {
    /// Device identity
    pub id: String,
    pub ip: String,
    /// Milliseconds since the reporter started
    pub uptime_ms: u32,
    /// Physical link state
    pub link: bool,
    /// Number of runs
    pub runs: usize,
    /// Pixel count of each run
    pub leds: Vec<u16>,
    /// Datagrams received this interval
    pub rx_frames: u32,
    /// Frames completed this interval
    pub complete: u32,
    /// Frames displayed this interval
    pub applied: u32,
    /// Length and stale drops this interval
    pub dropped_frames: u32,
    /// Zero or one error message
    pub errors: Vec<String>,
}

impl HeartbeatRecord {
    /// Serialize to the JSON wire form.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|source| ControllerError::Serialize { context: "heartbeat".to_string(), source })
    }
}

/// Emits a [`HeartbeatRecord`] every [`HEARTBEAT_INTERVAL_MS`].
#[derive(Debug, Clone)]
pub struct HeartbeatReporter {
    device_id: String,
    started_at: Millis,
    last_emitted: Millis,
}

impl HeartbeatReporter {
    pub fn new(device_id: impl Into<String>, now: Millis) -> Self {
        Self { device_id: device_id.into(), started_at: now, last_emitted: now }
    }

    /// Emit a heartbeat if the interval has elapsed.
    ///
    /// Returns the emitted record. The interval timer, the counters and the
    /// pending error are only reset when a record is built; a failed send is
    /// logged and not retried.
    pub fn poll<T: Transport + ?Sized>(
        &mut self,
        now: Millis,
        assembler: &mut FrameAssembler,
        transport: &mut T,
    ) -> Option<HeartbeatRecord> {
        if elapsed_ms(now, self.last_emitted) < HEARTBEAT_INTERVAL_MS {
            return None;
        }
        self.last_emitted = now;

        let record = self.build(now, assembler, transport);
        debug!(
            "Heartbeat: rx={} complete={} applied={} dropped={} errors={}",
            record.rx_frames,
            record.complete,
            record.applied,
            record.dropped_frames,
            record.errors.len()
        );

        match record.to_json() {
            Ok(payload) => {
                if let Err(err) = transport.send_status(&payload) {
                    warn!("Heartbeat not delivered: {}", err);
                }
            }
            Err(err) => warn!("Heartbeat not encoded: {}", err),
        }

        Some(record)
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    fn build<T: Transport + ?Sized>(
        &self,
        now: Millis,
        assembler: &mut FrameAssembler,
        transport: &T,
    ) -> HeartbeatRecord {
        let stats = assembler.read_and_reset_stats();
        let errors: Vec<String> = assembler
            .take_last_error()
            .map(|error| error.chars().take(MAX_REPORTED_ERROR_CHARS).collect::<String>())
            .into_iter()
            .collect();
        let topology = assembler.topology();

        HeartbeatRecord {
            id: self.device_id.clone(),
            ip: transport.ip().to_string(),
            uptime_ms: elapsed_ms(now, self.started_at),
            link: transport.link_up(),
            runs: topology.run_count(),
            leds: topology.pixel_counts().to_vec(),
            rx_frames: stats.rx_packets,
            complete: stats.complete_frames,
            applied: stats.applied_frames,
            dropped_frames: stats.dropped(),
            errors,
        }
    }
}
