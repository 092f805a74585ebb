// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Seams between the dispatch core and the host system.
//!
//! The driver never touches sysfs or the system clock directly. It goes
//! through [`ControlSurface`] and [`Clock`], which lets tests substitute
//! recording and manual implementations.

pub mod clock;
pub mod sysfs;

pub use clock::SystemClock;
pub use sysfs::SysfsControl;

use std::io;

/// Firmware control attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAttr {
    /// `"<kind> <flag>"`
    Enable,
    /// `"<kind> <flags> <delay_ms> <timeout_ms>"`
    BatchEnable,
    /// `"<kind>"` or `"<sync_code>"`
    Flush,
    /// `"<kind> <delay_ms>"`
    DelayMs,
    /// IIO buffer length in records
    BufferLength,
    /// IIO buffer on/off
    BufferEnable,
    /// IIO trigger bound to the buffer
    CurrentTrigger,
    /// Driver-side magnetometer calibration
    CalibratorMag,
    /// Driver-side accelerometer calibration
    CalibratorAcc,
}

impl ControlAttr {
    /// Attribute path relative to its base directory
    pub fn name(self) -> &'static str {
        match self {
            ControlAttr::Enable => "enable",
            ControlAttr::BatchEnable => "batch_enable",
            ControlAttr::Flush => "flush",
            ControlAttr::DelayMs => "delay_ms",
            ControlAttr::BufferLength => "buffer/length",
            ControlAttr::BufferEnable => "buffer/enable",
            ControlAttr::CurrentTrigger => "trigger/current_trigger",
            ControlAttr::CalibratorMag => "calibrator_data_mag",
            ControlAttr::CalibratorAcc => "calibrator_data_acc",
        }
    }

    /// True for attributes that live under the IIO device directory
    pub fn is_iio(self) -> bool {
        matches!(
            self,
            ControlAttr::BufferLength | ControlAttr::BufferEnable | ControlAttr::CurrentTrigger
        )
    }
}

/// Text attribute store exposed by the sensor hub kernel driver
pub trait ControlSurface {
    fn write_attr(&mut self, attr: ControlAttr, value: &str) -> io::Result<()>;

    fn read_attr(&mut self, attr: ControlAttr) -> io::Result<String>;
}

impl<T: ControlSurface + ?Sized> ControlSurface for Box<T> {
    fn write_attr(&mut self, attr: ControlAttr, value: &str) -> io::Result<()> {
        (**self).write_attr(attr, value)
    }

    fn read_attr(&mut self, attr: ControlAttr) -> io::Result<String> {
        (**self).read_attr(attr)
    }
}

/// Host-side time source
pub trait Clock {
    /// Current host time in nanoseconds
    fn now_ns(&self) -> i64;
}

impl<T: Clock + ?Sized> Clock for Box<T> {
    fn now_ns(&self) -> i64 {
        (**self).now_ns()
    }
}
