//! Wire format for controller-bound pixel datagrams
//!
//! Every datagram carries one run's pixels for one frame. The run is not in the
//! payload: it is implied by the UDP port the datagram arrived on.
//!
//! ```text
//! Offset  Size  Field
//! 0       2     session_id  (u16, big-endian)
//! 2       4     frame_id    (u32, big-endian)
//! 6       N*3   RGB pixels for the run, in strip order
//! ```
//!
//! Decoding is pure: it validates the datagram length against the run's pixel
//! count and returns borrowed views, without touching any assembly state.

use thiserror::Error;

use crate::types::Topology;

/// Size of the fixed datagram header in bytes.
pub const HEADER_SIZE: usize = 6;

/// Decoded datagram header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketHeader {
    /// Random id chosen by the sender at startup
    pub session_id: u16,
    /// Sender frame counter, wraps at 2^32
    pub frame_id: u32,
}

impl PacketHeader {
    pub fn new(session_id: u16, frame_id: u32) -> Self {
        Self { session_id, frame_id }
    }

    /// Parse the header from the first [`HEADER_SIZE`] bytes of `bytes`.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let &[s0, s1, f0, f1, f2, f3, ..] = bytes else {
            return None;
        };
        Some(Self {
            session_id: u16::from_be_bytes([s0, s1]),
            frame_id: u32::from_be_bytes([f0, f1, f2, f3]),
        })
    }

    /// Serialize the header in wire order.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let session = self.session_id.to_be_bytes();
        let frame = self.frame_id.to_be_bytes();
        [session[0], session[1], frame[0], frame[1], frame[2], frame[3]]
    }
}

/// A validated datagram: decoded header plus a view of the run's pixel bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet<'a> {
    pub run_index: u8,
    pub header: PacketHeader,
    pub payload: &'a [u8],
}

/// Reasons a datagram is rejected before reaching the assembler.
///
/// Both variants count as length drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("run {run_index} is outside the configured {run_count} runs")]
    UnknownRun { run_index: u8, run_count: usize },

    #[error("run {run_index} expects {expected} bytes, got {actual}")]
    Length { run_index: u8, expected: usize, actual: usize },
}

/// Exact datagram length for a run, `None` for an unknown run.
pub fn expected_len(topology: &Topology, run_index: u8) -> Option<usize> {
    topology.run_bytes(usize::from(run_index)).map(|bytes| HEADER_SIZE + bytes)
}

/// Validate and decode a datagram received for `run_index`.
///
/// # Errors
///
/// Returns [`DecodeError::UnknownRun`] for a run index outside the topology and
/// [`DecodeError::Length`] when the length differs from `6 + pixels * 3`.
pub fn decode<'a>(
    topology: &Topology,
    run_index: u8,
    datagram: &'a [u8],
) -> Result<Packet<'a>, DecodeError> {
    let expected = expected_len(topology, run_index)
        .ok_or(DecodeError::UnknownRun { run_index, run_count: topology.run_count() })?;

    if datagram.len() != expected {
        return Err(DecodeError::Length { run_index, expected, actual: datagram.len() });
    }

    let (header_bytes, payload) = datagram.split_at(HEADER_SIZE);
    let header = PacketHeader::parse(header_bytes).ok_or(DecodeError::Length {
        run_index,
        expected,
        actual: datagram.len(),
    })?;

    Ok(Packet { run_index, header, payload })
}

/// Build a datagram from a header and a run's pixel bytes.
pub fn encode(header: PacketHeader, payload: &[u8]) -> Vec<u8> {
    let mut datagram = Vec::with_capacity(HEADER_SIZE + payload.len());
    datagram.extend_from_slice(&header.to_bytes());
    datagram.extend_from_slice(payload);
    datagram
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn topology() -> Topology {
        Topology::new(&[20, 4]).unwrap()
    }

    #[test]
    fn header_is_big_endian() {
        let header = PacketHeader::new(0x1234, 0xA1B2_C3D4);
        assert_eq!(header.to_bytes(), [0x12, 0x34, 0xA1, 0xB2, 0xC3, 0xD4]);
    }

    #[test]
    fn decode_returns_payload_view() {
        let payload: Vec<u8> = (0..12).collect();
        let datagram = encode(PacketHeader::new(7, 42), &payload);

        let packet = decode(&topology(), 1, &datagram).unwrap();

        assert_eq!(packet.run_index, 1);
        assert_eq!(packet.header, PacketHeader::new(7, 42));
        assert_eq!(packet.payload, payload.as_slice());
    }

    #[test]
    fn wrong_length_is_rejected() {
        let short = [0u8; 10];
        assert_eq!(
            decode(&topology(), 0, &short),
            Err(DecodeError::Length { run_index: 0, expected: 66, actual: 10 })
        );

        let long = vec![0u8; 67];
        assert!(matches!(decode(&topology(), 0, &long), Err(DecodeError::Length { .. })));
    }

    #[test]
    fn header_only_datagram_is_rejected() {
        let datagram = PacketHeader::new(1, 1).to_bytes();
        assert!(matches!(decode(&topology(), 0, &datagram), Err(DecodeError::Length { .. })));
    }

    #[test]
    fn unknown_run_is_rejected() {
        let datagram = vec![0u8; 66];
        assert_eq!(
            decode(&topology(), 2, &datagram),
            Err(DecodeError::UnknownRun { run_index: 2, run_count: 2 })
        );
    }

    proptest! {
        #[test]
        fn header_round_trips(session_id in any::<u16>(), frame_id in any::<u32>()) {
            let header = PacketHeader::new(session_id, frame_id);
            prop_assert_eq!(PacketHeader::parse(&header.to_bytes()), Some(header));
        }

        #[test]
        fn decode_recovers_encoded_payload(
            session_id in any::<u16>(),
            frame_id in any::<u32>(),
            payload in prop::collection::vec(any::<u8>(), 12)
        ) {
            let datagram = encode(PacketHeader::new(session_id, frame_id), &payload);
            let packet = decode(&topology(), 1, &datagram).unwrap();
            prop_assert_eq!(packet.header.session_id, session_id);
            prop_assert_eq!(packet.header.frame_id, frame_id);
            prop_assert_eq!(packet.payload, payload.as_slice());
        }
    }
}
