// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{error, trace};

use super::{ControlAttr, ControlSurface};
use crate::config::HubConfig;

/// Control attributes backed by sysfs files
#[derive(Debug, Clone)]
pub struct SysfsControl {
    control_dir: PathBuf,
    iio_dir: PathBuf,
}

impl SysfsControl {
    pub fn new<P: AsRef<Path>>(control_dir: P) -> Self {
        let control_dir = control_dir.as_ref().to_path_buf();
        let iio_dir = control_dir.join("iio");
        Self {
            control_dir,
            iio_dir,
        }
    }

    pub fn from_config(config: &HubConfig) -> Self {
        Self {
            control_dir: config.control_dir.clone(),
            iio_dir: config.iio_dir(),
        }
    }

    /// Full path of an attribute
    pub fn path(&self, attr: ControlAttr) -> PathBuf {
        if attr.is_iio() {
            self.iio_dir.join(attr.name())
        } else {
            self.control_dir.join(attr.name())
        }
    }
}

impl ControlSurface for SysfsControl {
    fn write_attr(&mut self, attr: ControlAttr, value: &str) -> io::Result<()> {
        let path = self.path(attr);
        trace!("write {} <- {:?}", path.display(), value);
        // sysfs attributes always exist, so never create one
        let mut file = OpenOptions::new().write(true).open(&path).map_err(|e| {
            error!("open {} failed: {}", path.display(), e);
            e
        })?;
        file.write_all(value.as_bytes()).map_err(|e| {
            error!("write {} failed: {}", path.display(), e);
            e
        })
    }

    fn read_attr(&mut self, attr: ControlAttr) -> io::Result<String> {
        fs::read_to_string(self.path(attr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cwmcu-sysfs-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("iio/buffer")).unwrap();
        fs::create_dir_all(dir.join("iio/trigger")).unwrap();
        dir
    }

    #[test]
    fn test_paths_split_between_control_and_iio() {
        let control = SysfsControl::new("/sys/class/htc_sensorhub/sensor_hub");
        assert_eq!(
            control.path(ControlAttr::Enable),
            PathBuf::from("/sys/class/htc_sensorhub/sensor_hub/enable")
        );
        assert_eq!(
            control.path(ControlAttr::BufferEnable),
            PathBuf::from("/sys/class/htc_sensorhub/sensor_hub/iio/buffer/enable")
        );
        assert_eq!(
            control.path(ControlAttr::CurrentTrigger),
            PathBuf::from("/sys/class/htc_sensorhub/sensor_hub/iio/trigger/current_trigger")
        );
    }

    #[test]
    fn test_write_existing_attribute() {
        let dir = scratch_dir("write");
        fs::write(dir.join("enable"), "").unwrap();
        let mut control = SysfsControl::new(&dir);

        control.write_attr(ControlAttr::Enable, "7 1\n").unwrap();
        assert_eq!(control.read_attr(ControlAttr::Enable).unwrap(), "7 1\n");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_write_missing_attribute_is_not_created() {
        let dir = scratch_dir("missing");
        let mut control = SysfsControl::new(&dir);

        let err = control.write_attr(ControlAttr::Flush, "98\n").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!dir.join("flush").exists());

        let _ = fs::remove_dir_all(&dir);
    }
}
