// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Driver configuration.

use std::path::{Path, PathBuf};

use crate::constants::EVENT_BUFFER_RECORDS;

/// Character device carrying the record stream
pub const DEFAULT_DEVICE_NODE: &str = "/dev/iio:device0";
/// Directory holding the firmware control attributes
pub const DEFAULT_CONTROL_DIR: &str = "/sys/class/htc_sensorhub/sensor_hub/";
/// IIO trigger bound to the event buffer
pub const DEFAULT_TRIGGER_NAME: &str = "CwMcuSensor-dev0";
/// Persisted magnetometer calibration
pub const DEFAULT_MAG_CALIBRATION: &str = "/data/misc/cw_calibrator_mag.ini";
/// Persisted accelerometer calibration
pub const DEFAULT_ACC_CALIBRATION: &str = "/data/misc/cw_calibrator_acc.ini";

/// Paths and tunables for a [`SensorHub`](crate::SensorHub)
#[derive(Debug, Clone, PartialEq)]
pub struct HubConfig {
    /// Character device carrying the record stream
    pub device_node: PathBuf,
    /// Directory holding `enable`, `batch_enable`, `flush`, `delay_ms`, ...
    pub control_dir: PathBuf,
    /// Trigger written to `iio/trigger/current_trigger`
    pub trigger_name: String,
    /// Value written to `iio/buffer/length`
    pub buffer_length: usize,
    /// Persisted magnetometer calibration, `None` disables persistence
    pub mag_calibration_path: Option<PathBuf>,
    /// Persisted accelerometer calibration, `None` disables persistence
    pub acc_calibration_path: Option<PathBuf>,
    /// Log around every blocking fill of the event buffer
    pub fill_debug: bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            device_node: PathBuf::from(DEFAULT_DEVICE_NODE),
            control_dir: PathBuf::from(DEFAULT_CONTROL_DIR),
            trigger_name: DEFAULT_TRIGGER_NAME.to_string(),
            buffer_length: EVENT_BUFFER_RECORDS,
            mag_calibration_path: Some(PathBuf::from(DEFAULT_MAG_CALIBRATION)),
            acc_calibration_path: Some(PathBuf::from(DEFAULT_ACC_CALIBRATION)),
            fill_debug: false,
        }
    }
}

impl HubConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device_node(mut self, path: impl AsRef<Path>) -> Self {
        self.device_node = path.as_ref().to_path_buf();
        self
    }

    pub fn with_control_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.control_dir = path.as_ref().to_path_buf();
        self
    }

    pub fn with_trigger_name(mut self, name: impl Into<String>) -> Self {
        self.trigger_name = name.into();
        self
    }

    pub fn with_buffer_length(mut self, length: usize) -> Self {
        self.buffer_length = length;
        self
    }

    pub fn with_mag_calibration(mut self, path: Option<PathBuf>) -> Self {
        self.mag_calibration_path = path;
        self
    }

    pub fn with_acc_calibration(mut self, path: Option<PathBuf>) -> Self {
        self.acc_calibration_path = path;
        self
    }

    pub fn with_fill_debug(mut self, enabled: bool) -> Self {
        self.fill_debug = enabled;
        self
    }

    /// Directory holding the IIO buffer and trigger attributes
    pub fn iio_dir(&self) -> PathBuf {
        self.control_dir.join("iio")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HubConfig::default();
        assert_eq!(config.device_node, PathBuf::from("/dev/iio:device0"));
        assert_eq!(config.buffer_length, 1024);
        assert!(!config.fill_debug);
        assert_eq!(
            config.iio_dir(),
            PathBuf::from("/sys/class/htc_sensorhub/sensor_hub/iio")
        );
    }

    #[test]
    fn test_builder_overrides() {
        let config = HubConfig::new()
            .with_device_node("/dev/iio:device3")
            .with_control_dir("/tmp/hub")
            .with_trigger_name("CwMcuSensor-dev3")
            .with_mag_calibration(None)
            .with_fill_debug(true);
        assert_eq!(config.device_node, PathBuf::from("/dev/iio:device3"));
        assert_eq!(config.iio_dir(), PathBuf::from("/tmp/hub/iio"));
        assert_eq!(config.trigger_name, "CwMcuSensor-dev3");
        assert_eq!(config.mag_calibration_path, None);
        assert!(config.acc_calibration_path.is_some());
        assert!(config.fill_debug);
    }
}
