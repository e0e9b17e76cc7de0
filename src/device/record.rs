//! Log record decoding
//!
//! Every log segment starts with an 8-byte record whose byte 0 carries the
//! record tag in its low 6 bits, an overflow/reverse flag in bit 6, and
//! (original DistoX only) the unread flag in bit 7. Angles are 16-bit
//! fractions of a full circle; distances are millimeters.
//!
//! On the DistoX2 two logical records share one 18-byte segment: the roll
//! of the first record is split across both halves and the unread flags
//! live in trailing continuation bytes, so a segment is decoded as a pair.

use super::model::DeviceModel;
use crate::error::{Error, Result};

/// Bytes per logical record
pub const RECORD_LEN: usize = 8;

/// Bytes fetched per DistoX2 segment: two records plus the continuation
/// bytes carrying the shared roll low byte and both unread flags
pub const SEGMENT_LEN_DISTOX2: usize = 20;

/// One degree per 65536th of a circle
const DEG_PER_UNIT: f64 = 360.0 / 65536.0;

/// A decoded log record with its unread ("hot") flag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRecord {
    /// Record has not been downloaded before
    pub hot: bool,
    pub data: RecordData,
}

/// Measurement payload of a log record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordData {
    /// Slot not yet written
    Empty,
    /// Survey shot
    Leg {
        distance_m: f64,
        heading_deg: f64,
        clino_deg: f64,
        roll_deg: f64,
    },
    /// Raw accelerometer sample (calibration mode)
    Acc { x: i16, y: i16, z: i16, cal_group: u8 },
    /// Raw magnetometer sample (calibration mode)
    Mag { x: i16, y: i16, z: i16, cal_group: u8 },
    /// Calibration-quality diagnostics (DistoX2)
    Vec {
        reverse: bool,
        abs_g: u16,
        abs_m: u16,
        dip_deg: f64,
    },
}

/// Decode one 8-byte record
///
/// `roll_low` supplies the low byte of the LEG roll angle: always 0 on the
/// original DistoX (roll resolution is one byte), the shared continuation
/// byte for the first record of a DistoX2 segment.
pub fn decode(d: &[u8], model: DeviceModel, hot: bool, roll_low: u8) -> Result<LogRecord> {
    if d.len() < RECORD_LEN {
        return Err(Error::InvalidParameter(format!(
            "record needs {} bytes, got {}",
            RECORD_LEN,
            d.len()
        )));
    }
    let tag = d[0] & 0x3F;
    let data = match tag {
        0 => RecordData::Empty,
        1 => {
            let overflow = if d[0] & 0x40 != 0 { 65536.0 } else { 0.0 };
            let mut distance_m =
                (u16::from_le_bytes([d[1], d[2]]) as f64 + overflow) / 1000.0;
            if model == DeviceModel::DistoX && distance_m > 100_000.0 {
                // Extended-range encoding on the original hardware
                distance_m = distance_m * 10.0 - 900_000.0;
            }
            RecordData::Leg {
                distance_m,
                heading_deg: u16::from_le_bytes([d[3], d[4]]) as f64 * DEG_PER_UNIT,
                clino_deg: i16::from_le_bytes([d[5], d[6]]) as f64 * DEG_PER_UNIT,
                roll_deg: i16::from_be_bytes([d[7], roll_low]) as f64 * DEG_PER_UNIT,
            }
        }
        2 | 3 => {
            let x = i16::from_le_bytes([d[1], d[2]]);
            let y = i16::from_le_bytes([d[3], d[4]]);
            let z = i16::from_le_bytes([d[5], d[6]]);
            let cal_group = d[7];
            if tag == 2 {
                RecordData::Acc { x, y, z, cal_group }
            } else {
                RecordData::Mag { x, y, z, cal_group }
            }
        }
        4 => RecordData::Vec {
            reverse: d[0] & 0x40 != 0,
            abs_g: u16::from_le_bytes([d[1], d[2]]),
            abs_m: u16::from_le_bytes([d[3], d[4]]),
            dip_deg: i16::from_le_bytes([d[5], d[6]]) as f64 * DEG_PER_UNIT,
        },
        tag => return Err(Error::UnknownPacket { tag }),
    };
    Ok(LogRecord { hot, data })
}

/// Decode a DistoX segment: one record, unread flag in bit 7 of byte 0
pub fn decode_segment(d: &[u8]) -> Result<LogRecord> {
    if d.len() < RECORD_LEN {
        return Err(Error::InvalidParameter(format!(
            "segment needs {} bytes, got {}",
            RECORD_LEN,
            d.len()
        )));
    }
    decode(d, DeviceModel::DistoX, d[0] & 0x80 != 0, 0)
}

/// Decode a DistoX2 segment fetch: two packed records
///
/// Byte 15 (the tail of the second record) doubles as the roll low byte of
/// the first record; bytes 16 and 17 carry the per-record unread flags.
pub fn decode_segment_pair(d: &[u8]) -> Result<[LogRecord; 2]> {
    if d.len() < SEGMENT_LEN_DISTOX2 {
        return Err(Error::InvalidParameter(format!(
            "segment fetch needs {} bytes, got {}",
            SEGMENT_LEN_DISTOX2,
            d.len()
        )));
    }
    let first = decode(&d[0..8], DeviceModel::DistoX2, d[16] & 1 != 0, d[15])?;
    let second = decode(&d[8..16], DeviceModel::DistoX2, d[17] & 1 != 0, 0)?;
    Ok([first, second])
}
