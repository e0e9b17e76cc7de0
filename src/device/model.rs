//! Per-generation device descriptor
//!
//! Two incompatible hardware generations speak the same memory protocol but
//! lay out their log and status regions differently. Everything
//! generation-specific is answered here so the rest of the driver stays
//! free of model branches.

use super::constants::{
    ADDR_STATUS_DISTOX, ADDR_STATUS_DISTOX2, CAL_FLAG_DISTOX, CAL_FLAG_DISTOX2,
};
use crate::error::{Error, Result};

/// DistoX hardware generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceModel {
    /// Original DistoX (modified Leica Disto A3)
    DistoX,
    /// DistoX2 (modified Leica Disto X310)
    DistoX2,
}

impl DeviceModel {
    /// Classify a device by its advertised bluetooth name
    ///
    /// The original hardware announces itself as exactly `DistoX`; the
    /// DistoX2 appends its serial number (`DistoX-1234`).
    pub fn from_device_name(name: &str) -> Result<Self> {
        if name == "DistoX" {
            Ok(DeviceModel::DistoX)
        } else if name.starts_with("DistoX-") {
            Ok(DeviceModel::DistoX2)
        } else {
            Err(Error::UnsupportedDevice(name.to_string()))
        }
    }

    /// Capacity of the circular log, in segments
    pub fn max_segments(&self) -> u16 {
        match self {
            DeviceModel::DistoX => 4096,
            DeviceModel::DistoX2 => 1064,
        }
    }

    /// Map a log segment index to its device memory address
    ///
    /// The DistoX log is a flat array of 8-byte segments. The DistoX2
    /// packs 56 18-byte segments into each 1024-byte flash page, leaving
    /// the page tail unused.
    pub fn segment_to_addr(&self, index: u16) -> u16 {
        match self {
            DeviceModel::DistoX => index * 8,
            DeviceModel::DistoX2 => (index / 56) * 1024 + (index % 56) * 18,
        }
    }

    /// Words fetched per segment during a log dump
    ///
    /// One 8-byte record on the DistoX; on the DistoX2 a fetch spans two
    /// packed records plus their shared flag/roll continuation bytes.
    pub fn words_per_segment(&self) -> u16 {
        match self {
            DeviceModel::DistoX => 2,
            DeviceModel::DistoX2 => 5,
        }
    }

    /// Address and bitmask of the calibration-mode status flag
    pub fn cal_flag(&self) -> (u16, u8) {
        match self {
            DeviceModel::DistoX => (ADDR_STATUS_DISTOX, CAL_FLAG_DISTOX),
            DeviceModel::DistoX2 => (ADDR_STATUS_DISTOX2, CAL_FLAG_DISTOX2),
        }
    }
}
