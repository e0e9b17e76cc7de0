//! Error types for distox-io

use std::fmt;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Memory operation kind, carried in [`Error::MemoryAccess`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryOp {
    Read,
    Write,
}

impl fmt::Display for MemoryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryOp::Read => write!(f, "read"),
            MemoryOp::Write => write!(f, "write"),
        }
    }
}

/// distox-io error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transient transport fault (short frame, echo mismatch). Retried by
    /// the memory layer before escalating to [`Error::MemoryAccess`].
    #[error("Transport fault: {0}")]
    Transport(&'static str),

    /// A memory exchange failed on every retry attempt
    #[error("Memory {operation} of {address:#06x} failed after {attempts} attempts: {reason}")]
    MemoryAccess {
        operation: MemoryOp,
        address: u16,
        attempts: u32,
        reason: String,
    },

    /// Log record with an unrecognized type tag (format/model mismatch)
    #[error("Unknown packet type {tag}")]
    UnknownPacket { tag: u8 },

    /// Device name does not match any supported hardware generation
    #[error("Unsupported device: {0}")]
    UnsupportedDevice(String),

    /// Calibration blob cannot be stored on the connected device
    #[error("Unsupported calibration format: {0}")]
    UnsupportedCalibration(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration file error
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}
