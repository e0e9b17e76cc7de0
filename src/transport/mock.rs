//! Emulated DistoX for hardware-free testing
//!
//! [`MockDisto`] implements [`Transport`] on top of a 64 KiB memory image
//! and answers memory requests the way the instrument does, so the whole
//! driver stack can be exercised end to end. Faults can be scripted per
//! exchange to test the retry path.
//!
//! The emulator is `Clone` over shared state: tests keep one handle for
//! seeding and inspection while the driver owns the other.

use super::Transport;
use crate::device::constants::{
    ADDR_STATUS_DISTOX, ADDR_STATUS_DISTOX2, CAL_FLAG_DISTOX, CAL_FLAG_DISTOX2, CMD_CAL_START,
    CMD_CAL_STOP, OP_MEM_READ, OP_MEM_WRITE, REPLY_LEN,
};
use crate::error::Result;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Scripted transport fault, consumed one per memory exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Swallow the request; the reply never arrives
    DropReply,
    /// Reply truncated to half a frame
    ShortReply,
    /// Reply with a garbled echoed address
    CorruptEcho,
}

/// In-memory DistoX emulator
#[derive(Clone)]
pub struct MockDisto {
    inner: Arc<Mutex<MockDistoInner>>,
}

struct MockDistoInner {
    memory: Vec<u8>,
    reply: VecDeque<u8>,
    faults: VecDeque<Fault>,
    commands: Vec<u8>,
    writes: usize,
}

impl MockDisto {
    /// Create an emulated device with erased (0xFF) memory
    ///
    /// Real flash erases to 0xFF; seed concrete regions with [`poke`].
    ///
    /// [`poke`]: MockDisto::poke
    pub fn new() -> Self {
        MockDisto {
            inner: Arc::new(Mutex::new(MockDistoInner {
                memory: vec![0xFF; 0x10000],
                reply: VecDeque::new(),
                faults: VecDeque::new(),
                commands: Vec::new(),
                writes: 0,
            })),
        }
    }

    /// Write bytes directly into the memory image (test setup)
    pub fn poke(&self, addr: u16, data: &[u8]) {
        let mut inner = self.inner.lock().unwrap();
        let start = addr as usize;
        inner.memory[start..start + data.len()].copy_from_slice(data);
    }

    /// Read bytes directly from the memory image (test inspection)
    pub fn peek(&self, addr: u16, len: usize) -> Vec<u8> {
        let inner = self.inner.lock().unwrap();
        let start = addr as usize;
        inner.memory[start..start + len].to_vec()
    }

    /// Script a fault for an upcoming memory exchange
    pub fn push_fault(&self, fault: Fault) {
        let mut inner = self.inner.lock().unwrap();
        inner.faults.push_back(fault);
    }

    /// Number of memory writes applied so far
    pub fn write_count(&self) -> usize {
        self.inner.lock().unwrap().writes
    }

    /// Single-byte commands received so far
    pub fn commands(&self) -> Vec<u8> {
        self.inner.lock().unwrap().commands.clone()
    }
}

impl Default for MockDisto {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDistoInner {
    fn word_at(&self, addr: u16) -> [u8; 4] {
        let start = addr as usize;
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.memory[start..start + 4]);
        word
    }

    fn queue_reply(&mut self, addr: u16, word: [u8; 4], fault: Option<Fault>) {
        if fault == Some(Fault::DropReply) {
            return;
        }
        let [lo, hi] = addr.to_le_bytes();
        let mut frame = [0u8; REPLY_LEN];
        frame[0] = OP_MEM_READ;
        frame[1] = if fault == Some(Fault::CorruptEcho) {
            lo ^ 0xFF
        } else {
            lo
        };
        frame[2] = hi;
        frame[3..7].copy_from_slice(&word);
        let len = if fault == Some(Fault::ShortReply) {
            REPLY_LEN / 2
        } else {
            REPLY_LEN
        };
        self.reply.extend(&frame[..len]);
    }

    fn handle_command(&mut self, cmd: u8) {
        self.commands.push(cmd);
        // Emulate the calibration-mode state machine: the command flips
        // the status bit in both generations' status bytes, so one
        // emulator serves tests for either model.
        match cmd {
            CMD_CAL_START => {
                self.memory[ADDR_STATUS_DISTOX as usize] |= CAL_FLAG_DISTOX;
                self.memory[ADDR_STATUS_DISTOX2 as usize] |= CAL_FLAG_DISTOX2;
            }
            CMD_CAL_STOP => {
                self.memory[ADDR_STATUS_DISTOX as usize] &= !CAL_FLAG_DISTOX;
                self.memory[ADDR_STATUS_DISTOX2 as usize] &= !CAL_FLAG_DISTOX2;
            }
            _ => {}
        }
    }
}

impl Transport for MockDisto {
    fn send(&mut self, data: &[u8]) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        match data {
            [cmd] => inner.handle_command(*cmd),
            [OP_MEM_READ, lo, hi] => {
                let addr = u16::from_le_bytes([*lo, *hi]);
                let fault = inner.faults.pop_front();
                let word = inner.word_at(addr);
                inner.queue_reply(addr, word, fault);
            }
            [OP_MEM_WRITE, lo, hi, d0, d1, d2, d3] => {
                let addr = u16::from_le_bytes([*lo, *hi]);
                let word = [*d0, *d1, *d2, *d3];
                let fault = inner.faults.pop_front();
                if fault.is_none() {
                    // A faulted exchange loses the request before the
                    // device acts on it
                    let start = addr as usize;
                    inner.memory[start..start + 4].copy_from_slice(&word);
                    inner.writes += 1;
                }
                inner.queue_reply(addr, word, fault);
            }
            _ => {
                log::warn!("MockDisto: unrecognized request {:02X?}", data);
            }
        }
        Ok(data.len())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        let available = inner.reply.len().min(buf.len());
        for slot in buf.iter_mut().take(available) {
            *slot = inner.reply.pop_front().unwrap_or(0);
        }
        Ok(available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_returns_poked_word() {
        let mut dev = MockDisto::new();
        dev.poke(0x1234, &[1, 2, 3, 4]);

        dev.send(&[OP_MEM_READ, 0x34, 0x12]).unwrap();
        let mut reply = [0u8; REPLY_LEN];
        assert_eq!(dev.receive(&mut reply).unwrap(), REPLY_LEN);
        assert_eq!(reply, [0x38, 0x34, 0x12, 1, 2, 3, 4, 0]);
    }

    #[test]
    fn dropped_reply_yields_nothing() {
        let mut dev = MockDisto::new();
        dev.push_fault(Fault::DropReply);

        dev.send(&[OP_MEM_READ, 0x00, 0x00]).unwrap();
        let mut reply = [0u8; REPLY_LEN];
        assert_eq!(dev.receive(&mut reply).unwrap(), 0);
    }

    #[test]
    fn faulted_write_is_not_applied() {
        let mut dev = MockDisto::new();
        dev.push_fault(Fault::CorruptEcho);

        dev.send(&[OP_MEM_WRITE, 0x10, 0x80, 9, 9, 9, 9]).unwrap();
        assert_eq!(dev.write_count(), 0);
        assert_eq!(dev.peek(0x8010, 4), vec![0xFF; 4]);
    }

    #[test]
    fn clones_share_state() {
        let handle = MockDisto::new();
        let mut owned = handle.clone();
        handle.poke(0x0100, &[5, 6, 7, 8]);

        owned.send(&[OP_MEM_READ, 0x00, 0x01]).unwrap();
        let mut reply = [0u8; REPLY_LEN];
        assert_eq!(owned.receive(&mut reply).unwrap(), REPLY_LEN);
        assert_eq!(&reply[3..7], &[5, 6, 7, 8]);
    }
}
