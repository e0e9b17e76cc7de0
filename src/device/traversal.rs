//! Circular log traversal planning
//!
//! The device stores records in a fixed-capacity circular buffer and
//! reports only the write cursor (next free segment). Reading the N most
//! recent records therefore means walking backwards from the cursor,
//! wrapping past segment 0 into the top of the address space.

use super::constants::{ADDR_CURSOR_DISTOX, ADDR_CURSOR_DISTOX2};
use super::memory::MemoryAccess;
use super::model::DeviceModel;
use crate::error::Result;
use crate::transport::Transport;

/// Read the device's log write cursor as a segment index
///
/// The original DistoX stores the cursor as a byte address into its flat
/// 8-byte-segment log; the DistoX2 stores the segment index directly.
pub fn read_write_cursor<T: Transport>(
    memory: &mut MemoryAccess<T>,
    model: DeviceModel,
) -> Result<u16> {
    match model {
        DeviceModel::DistoX => Ok(memory.read_u16(ADDR_CURSOR_DISTOX)? / 8),
        DeviceModel::DistoX2 => memory.read_u16(ADDR_CURSOR_DISTOX2),
    }
}

/// Compute the device addresses of the `requested` most recent segments,
/// oldest first
///
/// The caller guarantees `requested <= model.max_segments()` and that
/// `write_cursor` is a valid segment index.
pub fn plan(write_cursor: u16, requested: u16, model: DeviceModel) -> Vec<u16> {
    let max = model.max_segments();
    let start = write_cursor as i32 - requested as i32;

    let indices: Vec<u16> = if start < 0 {
        // Range wraps past the start of the buffer: tail of the address
        // space first (oldest), then the front up to the cursor.
        ((start + max as i32) as u16..max)
            .chain(0..write_cursor)
            .collect()
    } else {
        (start as u16..write_cursor).collect()
    };

    indices
        .into_iter()
        .map(|i| model.segment_to_addr(i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_without_wraparound() {
        let addrs = plan(10, 4, DeviceModel::DistoX);
        assert_eq!(addrs, vec![6 * 8, 7 * 8, 8 * 8, 9 * 8]);
    }

    #[test]
    fn plan_wraps_oldest_first() {
        let addrs = plan(10, 20, DeviceModel::DistoX);
        assert_eq!(addrs.len(), 20);
        // [4086..4096) then [0..10), as addresses
        let expected: Vec<u16> = (4086u16..4096)
            .chain(0..10)
            .map(|i| i * 8)
            .collect();
        assert_eq!(addrs, expected);
    }

    #[test]
    fn plan_full_buffer_has_no_duplicates() {
        let model = DeviceModel::DistoX2;
        let addrs = plan(100, model.max_segments(), model);
        assert_eq!(addrs.len(), model.max_segments() as usize);
        let mut seen = addrs.clone();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), addrs.len());
    }

    #[test]
    fn plan_zero_requested_is_empty() {
        assert!(plan(10, 0, DeviceModel::DistoX).is_empty());
    }
}
