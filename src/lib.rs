//! Controller-side frame distribution engine for remote LED runs.
//!
//! A sender streams frames of per-pixel color data over UDP, one datagram per
//! run per frame. Datagrams arrive unordered and lossy; this crate reconstructs
//! complete frames from them and drives the LED output, while reporting health
//! back to the sender once a second.
//!
//! # Features
//!
//! - **Fixed memory**: two frame slots, allocated once at startup
//! - **Wraparound-safe ordering**: frame ids run indefinitely across the 2^32 wrap
//! - **Sender restart recovery**: a new session id resets assembly state
//! - **Startup identification**: every run lights up once before frames are shown
//! - **Pluggable collaborators**: UDP sockets or an in-memory simulator
//!
//! # Architecture
//!
//! ```text
//! datagram -> packet::decode -> FrameAssembler -> OutputDriver -> OutputSurface
//!                                     |
//!                                     +-> HeartbeatReporter -> Transport
//! ```
//!
//! [`Controller`] runs the whole pipeline one non-blocking tick at a time;
//! [`Driver`] spawns it on a tokio task.
//!
//! ## Example
//!
//! ```rust
//! use ledwire::hal::memory::{MemoryStatusLed, MemorySurface, MemoryTransport};
//! use ledwire::packet::{PacketHeader, encode};
//! use ledwire::{Controller, Rgb, Topology};
//!
//! let transport = MemoryTransport::new("10.10.0.2");
//! let surface = MemorySurface::new(8, 2);
//! let mut controller = Controller::new(
//!     "LEFT",
//!     Topology::new(&[2]).unwrap(),
//!     transport.clone(),
//!     surface.clone(),
//!     MemoryStatusLed::new(),
//!     0,
//! )
//! .unwrap();
//!
//! // Identification sequence, then the power-up blackout
//! controller.tick(0);
//! controller.tick(200);
//!
//! transport.inject(0, encode(PacketHeader::new(7, 1), &[255, 0, 0, 0, 0, 255]));
//! controller.tick(1000);
//!
//! assert_eq!(surface.pixel(0, 0), Some(Rgb::new(255, 0, 0)));
//! assert_eq!(surface.pixel(0, 1), Some(Rgb::new(0, 0, 255)));
//! ```

// Core types and error handling
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Protocol engine
pub mod assembler;
pub mod heartbeat;
pub mod indicator;
pub mod output;
pub mod packet;
pub mod startup;

// Orchestration
pub mod config;
pub mod controller;
pub mod driver;
pub mod hal;

// Core exports
pub use error::*;
pub use types::*;

// Main API exports
pub use assembler::{FrameAssembler, FrameView, Ingest};
pub use config::DeviceConfig;
pub use controller::Controller;
pub use driver::{Driver, DriverChannels};
pub use heartbeat::{HeartbeatRecord, HeartbeatReporter};
pub use output::OutputDriver;
pub use packet::{DecodeError, PacketHeader};
pub use startup::{StartupSequencer, StartupState};
