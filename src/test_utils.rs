//! Datagram builders shared by unit tests and benchmarks

#![cfg(any(test, feature = "benchmark"))]

use crate::packet::{PacketHeader, encode};
use crate::types::{BYTES_PER_PIXEL, Rgb, Topology};

/// Deterministic, non-repeating-per-run byte pattern of `len` bytes.
pub fn pattern_payload(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(7).wrapping_add(seed)).collect()
}

/// Payload painting every pixel of `run` with `color`.
pub fn solid_payload(topology: &Topology, run: usize, color: Rgb) -> Vec<u8> {
    let pixels = topology.pixel_count(run).unwrap_or(0);
    let mut payload = Vec::with_capacity(pixels * BYTES_PER_PIXEL);
    for _ in 0..pixels {
        payload.extend_from_slice(&[color.r, color.g, color.b]);
    }
    payload
}

/// One datagram per run for a whole frame, each run a solid color from `color_for_run`.
pub fn frame_datagrams(
    topology: &Topology,
    session_id: u16,
    frame_id: u32,
    color_for_run: impl Fn(usize) -> Rgb,
) -> Vec<(u8, Vec<u8>)> {
    let header = PacketHeader::new(session_id, frame_id);
    (0..topology.run_count())
        .map(|run| (run as u8, encode(header, &solid_payload(topology, run, color_for_run(run)))))
        .collect()
}

/// One datagram per run carrying [`pattern_payload`] bytes, seeded by run index.
pub fn pattern_datagrams(topology: &Topology, session_id: u16, frame_id: u32) -> Vec<(u8, Vec<u8>)> {
    let header = PacketHeader::new(session_id, frame_id);
    (0..topology.run_count())
        .map(|run| {
            let len = topology.run_bytes(run).unwrap_or(0);
            (run as u8, encode(header, &pattern_payload(len, run as u8)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::FrameAssembler;

    #[test]
    fn pattern_frame_reassembles_in_run_order() {
        let topology = Topology::new(&[3, 5, 2]).unwrap();
        let mut assembler = FrameAssembler::new(topology.clone());

        let datagrams = pattern_datagrams(&topology, 1, 1);
        for (run, datagram) in datagrams.iter().rev() {
            assembler.handle_datagram(*run, datagram, 0);
        }

        let frame = assembler.take_ready_frame().unwrap();
        for run in 0..topology.run_count() {
            let range = topology.run_range(run).unwrap();
            assert_eq!(&frame.data[range.clone()], pattern_payload(range.len(), run as u8).as_slice());
        }
    }

    #[test]
    fn solid_payload_repeats_color() {
        let topology = Topology::new(&[2]).unwrap();
        assert_eq!(solid_payload(&topology, 0, Rgb::new(1, 2, 3)), vec![1, 2, 3, 1, 2, 3]);
        assert!(solid_payload(&topology, 1, Rgb::BLACK).is_empty());
    }
}
