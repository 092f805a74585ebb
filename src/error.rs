// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for the sensor hub driver

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::sensors::SensorKind;

const EINVAL: i32 = 22;
const EIO: i32 = 5;
const ENOENT: i32 = 2;
const EACCES: i32 = 13;

/// Error type for sensor hub operations
#[derive(Error, Debug)]
pub enum HubError {
    /// Event stream or calibration file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Handle does not name a physical sensor
    #[error("Invalid sensor handle: {0}")]
    InvalidHandle(i32),

    /// Requested a non-positive number of events
    #[error("Invalid event count: {0}")]
    InvalidCount(usize),

    /// Sensor cannot be batched with a non-zero timeout
    #[error("Batch mode not supported for {0}")]
    BatchNotSupported(SensorKind),

    /// Control attribute could not be read or written
    #[error("Control attribute {attr} failed: {source}")]
    Control {
        attr: &'static str,
        #[source]
        source: io::Error,
    },

    /// Calibration file could not be parsed
    #[error("Malformed calibration data in {}: {reason}", .path.display())]
    Calibration { path: PathBuf, reason: String },

    /// The dispatch loop behind a handle has gone away
    #[error("Sensor hub dispatch loop has shut down")]
    Disconnected,
}

impl HubError {
    /// Negative errno for the framework ABI
    pub fn errno(&self) -> i32 {
        match self {
            HubError::InvalidHandle(_)
            | HubError::InvalidCount(_)
            | HubError::BatchNotSupported(_)
            | HubError::Calibration { .. } => -EINVAL,
            HubError::Io(e) => -e.raw_os_error().unwrap_or(EIO),
            HubError::Control { source, .. } => match source.kind() {
                io::ErrorKind::NotFound => -ENOENT,
                io::ErrorKind::PermissionDenied => -EACCES,
                _ => -source.raw_os_error().unwrap_or(EIO),
            },
            HubError::Disconnected => -EIO,
        }
    }
}

/// Result type for sensor hub operations
pub type Result<T> = std::result::Result<T, HubError>;
