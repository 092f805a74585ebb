// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Host-side driver for the CwMcu sensor hub.
//!
//! The firmware streams packed 24-byte records through an IIO character
//! device and is configured through text attributes in sysfs. [`SensorHub`]
//! decodes the stream into framework [`OutputEvent`]s and drives the control
//! attributes, including the timestamp sync handshake.

pub mod calibration;
pub mod config;
pub mod constants;
pub mod decoder;
pub mod driver;
pub mod error;
pub mod interface;
pub mod reader;
pub mod reports;
pub mod sensors;
pub mod sync;

pub use config::HubConfig;
pub use driver::{Command, HubHandle, SensorHub};
pub use error::{HubError, Result};
pub use interface::{Clock, ControlAttr, ControlSurface, SysfsControl, SystemClock};
pub use reader::{EventReader, RawRecord};
pub use reports::{OutputEvent, Payload, SensorEvent};
pub use sensors::SensorKind;
