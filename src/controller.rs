//! The cooperative main loop
//!
//! [`Controller`] owns every piece of protocol state and the collaborators, and
//! advances all of them in [`Controller::tick`]. Nothing in a tick blocks: the
//! transport only drains what is already buffered and transmission is checked
//! through the busy flag on a later tick.
//!
//! ## Tick Sequence
//!
//! 1. While the startup sequence runs, poll it and do nothing else
//! 2. Drain the transport into the assembler
//! 3. If the blackout is over and the output idle, display the ready frame
//! 4. Poll the heartbeat reporter
//! 5. Poll the liveness indicator
//!
//! ## Usage Example
//!
//! ```rust
//! use ledwire::Controller;
//! use ledwire::hal::memory::{MemoryStatusLed, MemorySurface, MemoryTransport};
//! use ledwire::types::Topology;
//!
//! let transport = MemoryTransport::new("10.10.0.2");
//! let surface = MemorySurface::new(8, 20);
//! let topology = Topology::new(&[20]).unwrap();
//!
//! let mut controller =
//!     Controller::new("LEFT", topology, transport, surface, MemoryStatusLed::new(), 0).unwrap();
//!
//! for now in 0..=1000 {
//!     controller.tick(now);
//! }
//! assert!(controller.startup().is_complete());
//! ```

use tracing::{info, trace};

use crate::Result;
use crate::assembler::FrameAssembler;
use crate::hal::{OutputSurface, StatusLed, Transport};
use crate::heartbeat::{HeartbeatRecord, HeartbeatReporter};
use crate::indicator::LivenessIndicator;
use crate::output::OutputDriver;
use crate::startup::StartupSequencer;
use crate::types::{Millis, Topology};

/// Owns the protocol engine and its collaborators.
#[derive(Debug)]
pub struct Controller<T, S, L> {
    output: OutputDriver<S>,
    startup: StartupSequencer,
    assembler: FrameAssembler,
    transport: T,
    heartbeat: HeartbeatReporter,
    indicator: LivenessIndicator<L>,
}

impl<T, S, L> Controller<T, S, L>
where
    T: Transport,
    S: OutputSurface,
    L: StatusLed,
{
    /// Initialize every component at `now`, blanking the output first.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Topology`](crate::ControllerError::Topology) when
    /// `topology` does not fit on `surface`.
    pub fn new(
        device_id: impl Into<String>,
        topology: Topology,
        transport: T,
        surface: S,
        led: L,
        now: Millis,
    ) -> Result<Self> {
        let output = OutputDriver::new(surface, topology.clone(), now)?;
        let startup = StartupSequencer::new(now);
        let assembler = FrameAssembler::new(topology);
        let heartbeat = HeartbeatReporter::new(device_id, now);
        let indicator = LivenessIndicator::new(led, now);

        info!(
            "LED controller initialized: id={} runs={} ip={}",
            heartbeat.device_id(),
            assembler.topology().run_count(),
            transport.ip()
        );

        Ok(Self { output, startup, assembler, transport, heartbeat, indicator })
    }

    /// Run one loop iteration. Returns the heartbeat if one was emitted.
    pub fn tick(&mut self, now: Millis) -> Option<HeartbeatRecord> {
        if !self.startup.is_complete() {
            self.startup.poll(now, &mut self.output);
            return None;
        }

        let assembler = &mut self.assembler;
        self.transport.poll(&mut |run_index, datagram| {
            assembler.handle_datagram(run_index, datagram, now);
        });

        if self.output.ready_for_frames(now) && !self.output.is_busy() {
            if let Some(frame) = self.assembler.take_ready_frame() {
                trace!("Displaying frame {}", frame.frame_id);
                self.output.apply(frame.data);
                self.indicator.frame_displayed(now);
            }
        }

        let record = self.heartbeat.poll(now, &mut self.assembler, &mut self.transport);
        self.indicator.poll(now);
        record
    }

    pub fn assembler(&self) -> &FrameAssembler {
        &self.assembler
    }

    pub fn output(&self) -> &OutputDriver<S> {
        &self.output
    }

    pub fn startup(&self) -> &StartupSequencer {
        &self.startup
    }

    pub fn indicator(&self) -> &LivenessIndicator<L> {
        &self.indicator
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
