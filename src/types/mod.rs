//! Core value types shared by the protocol engine.
//!
//! - [`Topology`] describes the fixed run layout and frame buffer offsets
//! - [`Rgb`] is one pixel in wire order
//! - [`ReceiverStats`] holds the per-interval receive counters
//! - [`frame_newer`] orders frame ids across the 2^32 wrap
//!
//! ## Usage Example
//!
//! ```rust
//! use ledwire::types::{Topology, frame_newer};
//!
//! let topology = Topology::new(&[20, 30]).unwrap();
//! assert_eq!(topology.frame_size(), 150);
//! assert_eq!(topology.run_range(1), Some(60..150));
//! assert_eq!(topology.expected_mask(), 0b11);
//!
//! assert!(frame_newer(1, 0xFFFF_FFFF));
//! ```

mod color;
mod sequence;
mod stats;
mod topology;

pub use color::Rgb;
pub use sequence::{Millis, elapsed_ms, frame_newer};
pub use stats::ReceiverStats;
pub use topology::{BYTES_PER_PIXEL, MAX_RUNS, Topology};
