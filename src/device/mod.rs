//! DistoX device driver
//!
//! [`DistoDriver`] owns the transport for the duration of a session and
//! exposes the four top-level operations of the tool:
//!
//! - calibration-mode query/toggle
//! - calibration dump (raw coefficient window)
//! - calibration load (with format and firmware validation)
//! - log dump (circular-buffer traversal, decode, hand-off to a sink)
//!
//! The protocol is half-duplex: every exchange completes (or exhausts its
//! retries) before the next is issued, so the driver is strictly
//! sequential and never shares the transport.

pub mod calib;
pub mod constants;
pub mod memory;
pub mod model;
pub mod record;
pub mod traversal;

use crate::error::{Error, Result};
use crate::transport::Transport;
use calib::CalibrationBlob;
use constants::{
    ADDR_CAL_DATA, ADDR_CAL_DATA_END, ADDR_FW_VERSION, CMD_CAL_START, CMD_CAL_STOP,
    MIN_NONLINEAR_FW,
};
use memory::MemoryAccess;
use model::DeviceModel;
use record::{LogRecord, RecordData};
use std::thread;
use std::time::Duration;

/// Settle time after a calibration-mode toggle before the status byte
/// reflects the new mode. 100 ms is too short.
const CAL_TOGGLE_SETTLE: Duration = Duration::from_millis(500);

/// How many most-recent log records to dump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpCount {
    /// The whole circular buffer
    All,
    /// The N most recent segments
    Recent(u16),
}

/// Receives decoded records during a log dump
pub trait RecordSink {
    fn record(&mut self, record: &LogRecord) -> Result<()>;
}

/// Driver for a connected DistoX or DistoX2
pub struct DistoDriver<T: Transport> {
    memory: MemoryAccess<T>,
    model: DeviceModel,
    fw_version: u16,
}

impl<T: Transport> DistoDriver<T> {
    /// Attach to an already-connected transport
    ///
    /// Classifies the hardware generation from the advertised device name
    /// and reads the firmware version once.
    pub fn new(transport: T, device_name: &str) -> Result<Self> {
        let model = DeviceModel::from_device_name(device_name)?;
        let mut memory = MemoryAccess::new(transport);

        let word = memory.read(ADDR_FW_VERSION)?;
        let fw_version = word[0] as u16 * 1000 + word[1] as u16;
        log::info!(
            "Connected to {:?}, firmware {}.{}",
            model,
            fw_version / 1000,
            fw_version % 1000
        );

        Ok(DistoDriver {
            memory,
            model,
            fw_version,
        })
    }

    pub fn model(&self) -> DeviceModel {
        self.model
    }

    /// Firmware version as `major * 1000 + minor`
    pub fn firmware_version(&self) -> u16 {
        self.fw_version
    }

    /// Query whether the device is in calibration mode
    pub fn read_cal_mode(&mut self) -> Result<bool> {
        let (addr, mask) = self.model.cal_flag();
        Ok(self.memory.read(addr)?[0] & mask != 0)
    }

    /// Toggle calibration mode, returning the new state
    pub fn toggle_cal_mode(&mut self) -> Result<bool> {
        let was_on = self.read_cal_mode()?;
        self.memory.send_command(if was_on {
            CMD_CAL_STOP
        } else {
            CMD_CAL_START
        })?;
        thread::sleep(CAL_TOGGLE_SETTLE);
        self.read_cal_mode()
    }

    /// Read the raw calibration coefficient window (52 bytes)
    pub fn dump_calibration(&mut self) -> Result<Vec<u8>> {
        let mut blob = Vec::with_capacity((ADDR_CAL_DATA_END - ADDR_CAL_DATA) as usize);
        let mut addr = ADDR_CAL_DATA;
        while addr < ADDR_CAL_DATA_END {
            blob.extend_from_slice(&self.memory.read(addr)?);
            addr += 4;
        }
        Ok(blob)
    }

    /// Parse and write a calibration blob to the device
    ///
    /// Validation happens before the first write: an unsupported blob
    /// leaves the device calibration untouched.
    pub fn load_calibration(&mut self, input: &[u8]) -> Result<()> {
        let blob = CalibrationBlob::parse(input)?;

        if blob.is_extended() && !self.supports_nonlinear_calibration() {
            return Err(Error::UnsupportedCalibration(format!(
                "{:?} firmware {} cannot store nonlinear coefficients \
                 (needs DistoX2 firmware >= {})",
                self.model, self.fw_version, MIN_NONLINEAR_FW
            )));
        }

        log::info!(
            "Writing {} byte {} calibration",
            blob.len(),
            if blob.is_extended() {
                "extended"
            } else {
                "linear"
            }
        );
        for (addr, word) in blob.words() {
            self.memory.write(addr, word)?;
        }
        Ok(())
    }

    fn supports_nonlinear_calibration(&self) -> bool {
        self.model == DeviceModel::DistoX2 && self.fw_version >= MIN_NONLINEAR_FW
    }

    /// Dump the most recent log records into `sink`, oldest first
    ///
    /// Returns the number of records delivered. Aborts on the first
    /// undecodable record; a decode failure means the model or format
    /// assumptions are wrong, not that the transport hiccuped.
    pub fn dump_log(&mut self, count: DumpCount, sink: &mut dyn RecordSink) -> Result<usize> {
        let max = self.model.max_segments();
        let requested = match count {
            DumpCount::All => max,
            DumpCount::Recent(n) if n <= max => n,
            DumpCount::Recent(n) => {
                return Err(Error::InvalidParameter(format!(
                    "{} records is more than the log capacity ({})",
                    n, max
                )))
            }
        };

        let cursor = traversal::read_write_cursor(&mut self.memory, self.model)?;
        let addrs = traversal::plan(cursor, requested, self.model);
        log::info!(
            "Dumping {} segments (write cursor at {})",
            addrs.len(),
            cursor
        );
        if standby_risk(self.model, addrs.len()) {
            log::warn!(
                "Long dump on an original DistoX: keep the device awake \
                 (press a key occasionally) or it will stand by mid-dump"
            );
        }

        let mut delivered = 0;
        for (done, &addr) in addrs.iter().enumerate() {
            delivered += self.dump_segment(addr, sink)?;
            if (done + 1) % 128 == 0 {
                log::info!("... {} / {} segments", done + 1, addrs.len());
            }
        }
        Ok(delivered)
    }

    /// Fetch and decode one log segment, skipping empty/erased slots
    fn dump_segment(&mut self, addr: u16, sink: &mut dyn RecordSink) -> Result<usize> {
        let first = self.memory.read(addr)?;
        // 0x00 = never written, 0xFF = erased flash; neither holds a
        // record, and the rest of the segment is not worth fetching
        if first[0] == 0x00 || first[0] == 0xFF {
            return Ok(0);
        }

        let mut segment = [0u8; record::SEGMENT_LEN_DISTOX2];
        segment[..4].copy_from_slice(&first);
        let words = self.model.words_per_segment();
        for w in 1..words {
            let offset = (w * 4) as usize;
            segment[offset..offset + 4].copy_from_slice(&self.memory.read(addr + w * 4)?);
        }

        let mut delivered = 0;
        match self.model {
            DeviceModel::DistoX => {
                let rec = record::decode_segment(&segment[..record::RECORD_LEN])?;
                delivered += deliver(&rec, sink)?;
            }
            DeviceModel::DistoX2 => {
                for rec in record::decode_segment_pair(&segment)? {
                    delivered += deliver(&rec, sink)?;
                }
            }
        }
        Ok(delivered)
    }
}

fn deliver(record: &LogRecord, sink: &mut dyn RecordSink) -> Result<usize> {
    if record.data == RecordData::Empty {
        return Ok(0);
    }
    sink.record(record)?;
    Ok(1)
}

/// The original DistoX drops into standby during long dumps; anything past
/// 150 segments deserves an operator warning. The DistoX2 stays awake.
fn standby_risk(model: DeviceModel, segments: usize) -> bool {
    model == DeviceModel::DistoX && segments > 150
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standby_warning_only_for_long_distox_dumps() {
        assert!(!standby_risk(DeviceModel::DistoX, 150));
        assert!(standby_risk(DeviceModel::DistoX, 151));
        assert!(!standby_risk(DeviceModel::DistoX2, 1064));
    }
}
