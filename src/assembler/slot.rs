//! In-flight frame slot

use std::ops::Range;

/// One fixed-capacity assembly buffer.
///
/// The buffer is allocated once when the assembler is built and reused for every
/// frame afterwards.
#[derive(Debug)]
pub(crate) struct FrameSlot {
    pub(crate) frame_id: u32,
    pub(crate) received_mask: u8,
    pub(crate) in_use: bool,
    rgb: Box<[u8]>,
}

impl FrameSlot {
    pub(crate) fn new(frame_size: usize) -> Self {
        Self { frame_id: 0, received_mask: 0, in_use: false, rgb: vec![0u8; frame_size].into() }
    }

    /// Start assembling `frame_id` in this slot, discarding whatever it held.
    pub(crate) fn claim(&mut self, frame_id: u32) {
        self.frame_id = frame_id;
        self.received_mask = 0;
        self.in_use = true;
        self.rgb.fill(0);
    }

    /// Return the slot to its freshly allocated state.
    pub(crate) fn clear(&mut self) {
        self.frame_id = 0;
        self.received_mask = 0;
        self.in_use = false;
        self.rgb.fill(0);
    }

    /// Copy one run's pixels into place and mark the run received.
    pub(crate) fn write_run(&mut self, run_index: u8, range: Range<usize>, payload: &[u8]) {
        self.rgb[range].copy_from_slice(payload);
        self.received_mask |= 1 << run_index;
    }

    /// Stop assembling; the buffer keeps the completed frame's bytes.
    pub(crate) fn release(&mut self) {
        self.in_use = false;
        self.received_mask = 0;
    }

    pub(crate) fn data(&self) -> &[u8] {
        &self.rgb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_zeroes_previous_contents() {
        let mut slot = FrameSlot::new(6);
        slot.claim(1);
        slot.write_run(1, 3..6, &[7, 8, 9]);
        assert_eq!(slot.data(), &[0, 0, 0, 7, 8, 9]);
        assert_eq!(slot.received_mask, 0b10);

        slot.claim(2);
        assert_eq!(slot.frame_id, 2);
        assert_eq!(slot.received_mask, 0);
        assert_eq!(slot.data(), &[0; 6]);
    }

    #[test]
    fn release_keeps_completed_bytes() {
        let mut slot = FrameSlot::new(3);
        slot.claim(5);
        slot.write_run(0, 0..3, &[1, 2, 3]);
        slot.release();

        assert!(!slot.in_use);
        assert_eq!(slot.received_mask, 0);
        assert_eq!(slot.frame_id, 5);
        assert_eq!(slot.data(), &[1, 2, 3]);
    }
}
