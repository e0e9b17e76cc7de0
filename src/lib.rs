//! distox-io - protocol driver for DistoX cave-surveying instruments
//!
//! The DistoX (a converted Leica Disto laser rangefinder with onboard
//! accelerometer and magnetometer) logs survey shots and calibration
//! samples to a circular buffer in device memory and exposes a small
//! request/reply memory protocol over a bluetooth serial channel.
//!
//! This crate provides:
//!
//! - a retrying memory read/write layer over a lossy transport
//! - per-generation addressing for both hardware models (DistoX, DistoX2)
//! - decoding of logged records into physical measurements
//! - the calibration coefficient codec (linear and extended nonlinear)
//! - CSV output of dumped logs

pub mod config;
pub mod device;
pub mod error;
pub mod report;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use device::{DistoDriver, DumpCount, RecordSink};
pub use error::{Error, Result};
