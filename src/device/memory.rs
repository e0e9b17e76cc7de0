//! Reliable memory word access
//!
//! Wraps the raw transport with request framing, reply validation and a
//! bounded retry loop. Every exchange either returns fully validated data
//! or fails with [`Error::MemoryAccess`] naming the last underlying fault;
//! there is no partial success.

use super::constants::{MEM_RETRY_ATTEMPTS, OP_MEM_READ, OP_MEM_WRITE, REPLY_LEN};
use crate::error::{Error, MemoryOp, Result};
use crate::transport::Transport;

/// Validated 4-byte read/write access to device memory
pub struct MemoryAccess<T: Transport> {
    transport: T,
}

/// Run `op` up to `attempts` times, returning the first success or the
/// last error seen.
fn retry<V>(attempts: u32, mut op: impl FnMut() -> Result<V>) -> Result<V> {
    let mut last = Error::Transport("no attempts made");
    for _ in 0..attempts {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) => last = e,
        }
    }
    Err(last)
}

impl<T: Transport> MemoryAccess<T> {
    pub fn new(transport: T) -> Self {
        MemoryAccess { transport }
    }

    /// Read the 4-byte word at `addr`, retrying transient faults
    pub fn read(&mut self, addr: u16) -> Result<[u8; 4]> {
        retry(MEM_RETRY_ATTEMPTS, || self.try_read(addr)).map_err(|e| Error::MemoryAccess {
            operation: MemoryOp::Read,
            address: addr,
            attempts: MEM_RETRY_ATTEMPTS,
            reason: e.to_string(),
        })
    }

    /// Write a 4-byte word to `addr`, retrying transient faults
    pub fn write(&mut self, addr: u16, word: [u8; 4]) -> Result<()> {
        retry(MEM_RETRY_ATTEMPTS, || self.try_write(addr, word)).map_err(|e| {
            Error::MemoryAccess {
                operation: MemoryOp::Write,
                address: addr,
                attempts: MEM_RETRY_ATTEMPTS,
                reason: e.to_string(),
            }
        })
    }

    /// Read the low 16-bit value of the word at `addr`
    pub fn read_u16(&mut self, addr: u16) -> Result<u16> {
        let word = self.read(addr)?;
        Ok(u16::from_le_bytes([word[0], word[1]]))
    }

    /// Send a single-byte command; the device does not reply to these
    pub fn send_command(&mut self, opcode: u8) -> Result<()> {
        if self.transport.send(&[opcode])? != 1 {
            return Err(Error::Transport("short command send"));
        }
        log::debug!("Sent command {:#04x}", opcode);
        Ok(())
    }

    fn try_read(&mut self, addr: u16) -> Result<[u8; 4]> {
        let [lo, hi] = addr.to_le_bytes();
        let req = [OP_MEM_READ, lo, hi];
        if self.transport.send(&req)? != req.len() {
            return Err(Error::Transport("short request send"));
        }

        let mut reply = [0u8; REPLY_LEN];
        let n = self.transport.receive(&mut reply)?;
        if n != REPLY_LEN {
            return Err(Error::Transport("short reply"));
        }
        if reply[0..3] != req {
            return Err(Error::Transport("reply echo mismatch"));
        }

        let mut word = [0u8; 4];
        word.copy_from_slice(&reply[3..7]);
        Ok(word)
    }

    fn try_write(&mut self, addr: u16, word: [u8; 4]) -> Result<()> {
        let [lo, hi] = addr.to_le_bytes();
        let req = [OP_MEM_WRITE, lo, hi, word[0], word[1], word[2], word[3]];
        if self.transport.send(&req)? != req.len() {
            return Err(Error::Transport("short request send"));
        }

        let mut reply = [0u8; REPLY_LEN];
        let n = self.transport.receive(&mut reply)?;
        if n != REPLY_LEN {
            return Err(Error::Transport("short reply"));
        }
        // The write reply echoes address and data but normalizes the
        // opcode to the read opcode.
        if reply[0] != OP_MEM_READ || reply[1..7] != req[1..7] {
            return Err(Error::Transport("reply echo mismatch"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{Fault, MockDisto};

    #[test]
    fn retry_returns_first_success() {
        let mut calls = 0;
        let result: Result<u32> = retry(5, || {
            calls += 1;
            if calls < 3 {
                Err(Error::Transport("flaky"))
            } else {
                Ok(42)
            }
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 3);
    }

    #[test]
    fn retry_keeps_last_error() {
        let mut calls = 0;
        let result: Result<u32> = retry(5, || {
            calls += 1;
            if calls == 5 {
                Err(Error::Transport("final fault"))
            } else {
                Err(Error::Transport("earlier fault"))
            }
        });
        assert_eq!(calls, 5);
        assert!(matches!(result, Err(Error::Transport("final fault"))));
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut mem = MemoryAccess::new(MockDisto::new());
        mem.write(0x8010, [0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
        assert_eq!(mem.read(0x8010).unwrap(), [0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn transient_faults_are_retried() {
        let mut dev = MockDisto::new();
        dev.poke(0x0040, &[7, 7, 7, 7]);
        for fault in [Fault::DropReply, Fault::ShortReply, Fault::CorruptEcho] {
            dev.push_fault(fault);
        }

        let mut mem = MemoryAccess::new(dev);
        // Three faulted exchanges, fourth succeeds - same result as a
        // clean transport
        assert_eq!(mem.read(0x0040).unwrap(), [7, 7, 7, 7]);
    }

    #[test]
    fn persistent_faults_escalate() {
        let mut dev = MockDisto::new();
        for _ in 0..5 {
            dev.push_fault(Fault::DropReply);
        }

        let mut mem = MemoryAccess::new(dev);
        match mem.read(0x0040) {
            Err(Error::MemoryAccess {
                operation,
                address,
                attempts,
                reason,
            }) => {
                assert_eq!(operation, MemoryOp::Read);
                assert_eq!(address, 0x0040);
                assert_eq!(attempts, 5);
                assert!(reason.contains("short reply"));
            }
            other => panic!("expected MemoryAccess error, got {:?}", other),
        }
    }
}
