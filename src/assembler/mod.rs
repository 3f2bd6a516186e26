//! Multi-datagram frame assembly.
//!
//! A frame is split into one datagram per run. Datagrams arrive independently,
//! unordered and lossy; the [`FrameAssembler`] reconstructs complete frames from them
//! using a fixed pool of two slots.
//!
//! ## Ingest Pipeline
//!
//! For each datagram, in order:
//! 1. Bounds and length check against the run's pixel count (length drop)
//! 2. Session check: a new `session_id` means the sender restarted, so every slot is
//!    cleared and ordering starts over
//! 3. Staleness check: once a frame has been applied, only strictly newer frame ids
//!    (wraparound-safe) are accepted
//! 4. Slot resolution: matching slot, else an empty slot, else evict the oldest
//! 5. Copy the payload at the run's offset and set the run's bit
//! 6. On a full mask the frame is complete and, when newer, copied into the display
//!    buffer and published
//!
//! ## Usage Example
//!
//! ```rust
//! use ledwire::assembler::FrameAssembler;
//! use ledwire::packet::{PacketHeader, encode};
//! use ledwire::types::Topology;
//!
//! let topology = Topology::new(&[2]).unwrap();
//! let mut assembler = FrameAssembler::new(topology);
//!
//! let datagram = encode(PacketHeader::new(1, 1), &[255, 0, 0, 0, 255, 0]);
//! assembler.handle_datagram(0, &datagram, 0);
//!
//! let frame = assembler.take_ready_frame().expect("single-run frame completes");
//! assert_eq!(frame.data, &[255, 0, 0, 0, 255, 0]);
//! assert!(assembler.take_ready_frame().is_none());
//! ```

mod slot;

use tracing::{debug, info, trace};

use crate::packet::{self, PacketHeader};
use crate::types::{Millis, ReceiverStats, Topology, frame_newer};
use slot::FrameSlot;

/// Number of frames that can be in flight at once.
pub const SLOT_COUNT: usize = 2;

/// Maximum stored length of the pending error message, in bytes.
pub const MAX_ERROR_LEN: usize = 128;

/// What happened to one ingested datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    /// Stored; the frame is still missing runs
    Partial { frame_id: u32 },
    /// Every run is present. `published` is false when a newer frame was already applied
    Completed { frame_id: u32, published: bool },
    /// Wrong length or unknown run
    DroppedLength,
    /// Frame id not newer than the last applied frame
    DroppedStale { frame_id: u32 },
}

/// A completed frame handed out for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameView<'a> {
    pub frame_id: u32,
    /// Concatenated RGB bytes of every run, in run order
    pub data: &'a [u8],
}

#[derive(Debug, Default, Clone, Copy)]
struct SessionState {
    current_session_id: u16,
    initialized: bool,
    last_applied_frame_id: u32,
}

/// Reassembles frames from per-run datagrams.
///
/// Owns the slot pool, the display buffer, the session state, the receive
/// counters and the pending error. All memory is allocated in
/// [`FrameAssembler::new`].
///
/// Publishing copies the completed frame into the display buffer, so the pool
/// keeps both slots for assembly while a frame waits to be taken.
#[derive(Debug)]
pub struct FrameAssembler {
    topology: Topology,
    slots: [FrameSlot; SLOT_COUNT],
    display: Box<[u8]>,
    session: SessionState,
    /// Id of the published frame not yet taken for display
    ready: Option<u32>,
    stats: ReceiverStats,
    last_error: Option<String>,
}

impl FrameAssembler {
    /// Create an assembler with empty slots sized for `topology`.
    pub fn new(topology: Topology) -> Self {
        let frame_size = topology.frame_size();
        Self {
            slots: std::array::from_fn(|_| FrameSlot::new(frame_size)),
            display: vec![0u8; frame_size].into(),
            topology,
            session: SessionState::default(),
            ready: None,
            stats: ReceiverStats::default(),
            last_error: None,
        }
    }

    /// Return to the just-initialized state: no session, empty slots, zero counters.
    pub fn reset(&mut self) {
        self.clear_slots();
        self.session = SessionState::default();
        self.stats = ReceiverStats::default();
        self.last_error = None;
    }

    /// Decode a raw datagram received for `run_index` and ingest it.
    ///
    /// Datagrams that fail decoding are counted as received and as length drops.
    pub fn handle_datagram(&mut self, run_index: u8, datagram: &[u8], now: Millis) -> Ingest {
        match packet::decode(&self.topology, run_index, datagram) {
            Ok(packet) => self.ingest(packet.run_index, packet.header, packet.payload, now),
            Err(err) => {
                self.stats.rx_packets = self.stats.rx_packets.wrapping_add(1);
                self.stats.drops_len = self.stats.drops_len.wrapping_add(1);
                trace!("Dropping datagram: {}", err);
                Ingest::DroppedLength
            }
        }
    }

    /// Ingest one run's contribution to a frame.
    ///
    /// `now` only timestamps the session-change message.
    pub fn ingest(
        &mut self,
        run_index: u8,
        header: PacketHeader,
        payload: &[u8],
        now: Millis,
    ) -> Ingest {
        self.stats.rx_packets = self.stats.rx_packets.wrapping_add(1);

        let range = match self.topology.run_range(usize::from(run_index)) {
            Some(range) if range.len() == payload.len() => range,
            _ => {
                self.stats.drops_len = self.stats.drops_len.wrapping_add(1);
                trace!("Dropping run {} payload of {} bytes", run_index, payload.len());
                return Ingest::DroppedLength;
            }
        };

        if !self.session.initialized || header.session_id != self.session.current_session_id {
            self.begin_session(header.session_id, now);
        }

        let frame_id = header.frame_id;
        let last_applied = self.session.last_applied_frame_id;
        if last_applied != 0 && !frame_newer(frame_id, last_applied) {
            self.stats.drops_stale = self.stats.drops_stale.wrapping_add(1);
            trace!("Dropping stale frame {} (last applied {})", frame_id, last_applied);
            return Ingest::DroppedStale { frame_id };
        }

        let index = self.resolve_slot(frame_id);
        let expected_mask = self.topology.expected_mask();
        let slot = &mut self.slots[index];
        slot.write_run(run_index, range, payload);

        if slot.received_mask != expected_mask {
            return Ingest::Partial { frame_id };
        }

        self.stats.complete_frames = self.stats.complete_frames.wrapping_add(1);
        let published = last_applied == 0 || frame_newer(frame_id, last_applied);
        if published {
            self.display.copy_from_slice(slot.data());
            self.ready = Some(frame_id);
            self.session.last_applied_frame_id = frame_id;
            trace!("Frame {} complete in slot {}", frame_id, index);
        }
        slot.release();

        Ingest::Completed { frame_id, published }
    }

    /// Take the most recently published frame, at most once.
    ///
    /// Counts an applied frame exactly when one is returned.
    pub fn take_ready_frame(&mut self) -> Option<FrameView<'_>> {
        let frame_id = self.ready.take()?;
        self.stats.applied_frames = self.stats.applied_frames.wrapping_add(1);
        Some(FrameView { frame_id, data: &self.display })
    }

    /// Whether a completed frame is waiting to be taken.
    pub fn has_ready_frame(&self) -> bool {
        self.ready.is_some()
    }

    /// Return the counters accumulated since the previous call and zero them.
    pub fn read_and_reset_stats(&mut self) -> ReceiverStats {
        std::mem::take(&mut self.stats)
    }

    /// Counters accumulated so far, without resetting them.
    pub fn stats(&self) -> &ReceiverStats {
        &self.stats
    }

    /// Return and clear the pending error message.
    pub fn take_last_error(&mut self) -> Option<String> {
        self.last_error.take()
    }

    /// Pending error message, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Session id of the current sender, once a datagram has been seen.
    pub fn session_id(&self) -> Option<u16> {
        self.session.initialized.then_some(self.session.current_session_id)
    }

    /// Id of the newest frame published in this session (0 before the first one).
    pub fn last_applied_frame_id(&self) -> u32 {
        self.session.last_applied_frame_id
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    fn begin_session(&mut self, session_id: u16, now: Millis) {
        let previous = self.session.current_session_id;
        info!("Sender session change {} -> {}", previous, session_id);
        self.record_error(format!("{now}: session change {previous} -> {session_id}"));

        self.session = SessionState {
            current_session_id: session_id,
            initialized: true,
            last_applied_frame_id: 0,
        };
        self.clear_slots();
    }

    fn clear_slots(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
        self.ready = None;
    }

    /// Pick the slot for `frame_id`: the one already assembling it, else a free
    /// slot, else the slot with the oldest frame id.
    fn resolve_slot(&mut self, frame_id: u32) -> usize {
        if let Some(index) =
            self.slots.iter().position(|slot| slot.in_use && slot.frame_id == frame_id)
        {
            return index;
        }

        let index = match self.slots.iter().position(|slot| !slot.in_use) {
            Some(free) => free,
            None => {
                let mut oldest = 0;
                for index in 1..SLOT_COUNT {
                    if frame_newer(self.slots[oldest].frame_id, self.slots[index].frame_id) {
                        oldest = index;
                    }
                }
                debug!(
                    "Evicting partial frame {} (mask {:#04b}) for frame {}",
                    self.slots[oldest].frame_id, self.slots[oldest].received_mask, frame_id
                );
                oldest
            }
        };

        self.slots[index].claim(frame_id);
        index
    }

    fn record_error(&mut self, mut message: String) {
        if message.len() > MAX_ERROR_LEN {
            let mut cut = MAX_ERROR_LEN;
            while !message.is_char_boundary(cut) {
                cut -= 1;
            }
            message.truncate(cut);
        }
        self.last_error = Some(message);
    }
}
