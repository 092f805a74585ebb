// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Calibration persistence.
//!
//! The firmware keeps its calibration in two driver attributes, a 3-value
//! accelerometer offset and a 26-value magnetometer state. Both use the same
//! text form: whitespace separated integers and a trailing newline. Persisted
//! copies in the same form are pushed back to the driver at startup and
//! refreshed whenever a magnetometer consumer is switched off.

use std::fs;
use std::path::Path;

use log::debug;

use crate::constants::{COMPASS_CALIBRATION_DATA_SIZE, G_SENSOR_CALIBRATION_DATA_SIZE};
use crate::error::{HubError, Result};
use crate::interface::{ControlAttr, ControlSurface};

/// Fixed-length calibration vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration<const N: usize>(pub [i32; N]);

/// Accelerometer offsets
pub type AccelCalibration = Calibration<G_SENSOR_CALIBRATION_DATA_SIZE>;
/// Magnetometer calibration state
pub type CompassCalibration = Calibration<COMPASS_CALIBRATION_DATA_SIZE>;

impl<const N: usize> Default for Calibration<N> {
    fn default() -> Self {
        Self([0; N])
    }
}

impl<const N: usize> Calibration<N> {
    /// Parse the first `N` integers of `text`. Trailing values are ignored.
    pub fn parse(text: &str, source: &Path) -> Result<Self> {
        let mut values = [0i32; N];
        let mut tokens = text.split_whitespace();
        for (i, slot) in values.iter_mut().enumerate() {
            let token = tokens.next().ok_or_else(|| HubError::Calibration {
                path: source.to_path_buf(),
                reason: format!("expected {} values, found {}", N, i),
            })?;
            *slot = token.parse().map_err(|_| HubError::Calibration {
                path: source.to_path_buf(),
                reason: format!("value {} is not an integer: {:?}", i, token),
            })?;
        }
        Ok(Self(values))
    }

    /// Text form, `"v0 v1 ... vN\n"`
    pub fn to_text(&self) -> String {
        let mut text = self
            .0
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        text.push('\n');
        text
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0)
    }

    pub fn load(path: &Path) -> Result<Self> {
        debug!("reading calibration from {}", path.display());
        let text = fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    /// Overwrite `path` with this calibration
    pub fn store(&self, path: &Path) -> Result<()> {
        debug!("saving calibration to {}", path.display());
        fs::write(path, self.to_text())?;
        Ok(())
    }

    /// Read from a driver attribute
    pub fn read_from<C: ControlSurface + ?Sized>(
        control: &mut C,
        attr: ControlAttr,
    ) -> Result<Self> {
        let text = control
            .read_attr(attr)
            .map_err(|source| HubError::Control {
                attr: attr.name(),
                source,
            })?;
        Self::parse(&text, Path::new(attr.name()))
    }

    /// Push to a driver attribute
    pub fn write_to<C: ControlSurface + ?Sized>(
        &self,
        control: &mut C,
        attr: ControlAttr,
    ) -> Result<()> {
        control
            .write_attr(attr, &self.to_text())
            .map_err(|source| HubError::Control {
                attr: attr.name(),
                source,
            })
    }
}
