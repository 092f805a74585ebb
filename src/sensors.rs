// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Sensor kinds known to the sensor hub firmware.
//!
//! Every record and every control operation is addressed by a [`SensorKind`].
//! Each kind has a wire tag (byte 0 of a record), a dense index used by the
//! state table, and, for physical sensors, a framework handle and type.

use crate::constants::*;

/// Sensor kind, including the protocol-internal pseudo kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SensorKind {
    Accelerometer,
    Magnetometer,
    Gyroscope,
    Light,
    Pressure,
    Orientation,
    RotationVector,
    LinearAcceleration,
    Gravity,
    MagneticUncalibrated,
    GyroscopeUncalibrated,
    GameRotationVector,
    GeomagneticRotationVector,
    SignificantMotion,
    StepDetector,
    StepCounter,
    WakeGesture,
    /// Flush-complete marker
    MetaData,
    /// Acknowledgement of a timestamp sync request
    SyncAck,
    /// Firmware time-difference counter exhausted
    TimeDiffExhausted,
}

impl SensorKind {
    /// Number of kinds
    pub const COUNT: usize = 20;

    /// All kinds in dense index order
    pub const ALL: [SensorKind; SensorKind::COUNT] = [
        SensorKind::Accelerometer,
        SensorKind::Magnetometer,
        SensorKind::Gyroscope,
        SensorKind::Light,
        SensorKind::Pressure,
        SensorKind::Orientation,
        SensorKind::RotationVector,
        SensorKind::LinearAcceleration,
        SensorKind::Gravity,
        SensorKind::MagneticUncalibrated,
        SensorKind::GyroscopeUncalibrated,
        SensorKind::GameRotationVector,
        SensorKind::GeomagneticRotationVector,
        SensorKind::SignificantMotion,
        SensorKind::StepDetector,
        SensorKind::StepCounter,
        SensorKind::WakeGesture,
        SensorKind::MetaData,
        SensorKind::SyncAck,
        SensorKind::TimeDiffExhausted,
    ];

    /// Dense index, used for bitsets and the state table
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Wire tag carried in byte 0 of a record
    pub fn tag(self) -> u8 {
        match self {
            SensorKind::Accelerometer => CW_ACCELERATION,
            SensorKind::Magnetometer => CW_MAGNETIC,
            SensorKind::Gyroscope => CW_GYRO,
            SensorKind::Light => CW_LIGHT,
            SensorKind::Pressure => CW_PRESSURE,
            SensorKind::Orientation => CW_ORIENTATION,
            SensorKind::RotationVector => CW_ROTATIONVECTOR,
            SensorKind::LinearAcceleration => CW_LINEARACCELERATION,
            SensorKind::Gravity => CW_GRAVITY,
            SensorKind::MagneticUncalibrated => CW_MAGNETIC_UNCALIBRATED,
            SensorKind::GyroscopeUncalibrated => CW_GYROSCOPE_UNCALIBRATED,
            SensorKind::GameRotationVector => CW_GAME_ROTATION_VECTOR,
            SensorKind::GeomagneticRotationVector => CW_GEOMAGNETIC_ROTATION_VECTOR,
            SensorKind::SignificantMotion => CW_SIGNIFICANT_MOTION,
            SensorKind::StepDetector => CW_STEP_DETECTOR,
            SensorKind::StepCounter => CW_STEP_COUNTER,
            SensorKind::WakeGesture => HTC_WAKE_UP_GESTURE,
            SensorKind::MetaData => CW_META_DATA,
            SensorKind::SyncAck => CW_SYNC_ACK,
            SensorKind::TimeDiffExhausted => TIME_DIFF_EXHAUSTED,
        }
    }

    /// Framework handle, `None` for protocol-internal kinds
    pub fn handle(self) -> Option<i32> {
        let handle = match self {
            SensorKind::Accelerometer => ID_A,
            SensorKind::Magnetometer => ID_M,
            SensorKind::Gyroscope => ID_GY,
            SensorKind::Light => ID_L,
            SensorKind::Pressure => ID_PS,
            SensorKind::Orientation => ID_O,
            SensorKind::RotationVector => ID_RV,
            SensorKind::LinearAcceleration => ID_LA,
            SensorKind::Gravity => ID_G,
            SensorKind::MagneticUncalibrated => ID_CW_MAGNETIC_UNCALIBRATED,
            SensorKind::GyroscopeUncalibrated => ID_CW_GYROSCOPE_UNCALIBRATED,
            SensorKind::GameRotationVector => ID_CW_GAME_ROTATION_VECTOR,
            SensorKind::GeomagneticRotationVector => ID_CW_GEOMAGNETIC_ROTATION_VECTOR,
            SensorKind::SignificantMotion => ID_CW_SIGNIFICANT_MOTION,
            SensorKind::StepDetector => ID_CW_STEP_DETECTOR,
            SensorKind::StepCounter => ID_CW_STEP_COUNTER,
            SensorKind::WakeGesture => ID_WAKE_UP_GESTURE,
            SensorKind::MetaData | SensorKind::SyncAck | SensorKind::TimeDiffExhausted => {
                return None
            }
        };
        Some(handle)
    }

    /// Framework sensor type reported in output events
    pub fn framework_type(self) -> Option<i32> {
        let sensor_type = match self {
            SensorKind::Accelerometer => SENSOR_TYPE_ACCELEROMETER,
            SensorKind::Magnetometer => SENSOR_TYPE_MAGNETIC_FIELD,
            SensorKind::Gyroscope => SENSOR_TYPE_GYROSCOPE,
            SensorKind::Light => SENSOR_TYPE_LIGHT,
            SensorKind::Pressure => SENSOR_TYPE_PRESSURE,
            SensorKind::Orientation => SENSOR_TYPE_ORIENTATION,
            SensorKind::RotationVector => SENSOR_TYPE_ROTATION_VECTOR,
            SensorKind::LinearAcceleration => SENSOR_TYPE_LINEAR_ACCELERATION,
            SensorKind::Gravity => SENSOR_TYPE_GRAVITY,
            SensorKind::MagneticUncalibrated => SENSOR_TYPE_MAGNETIC_FIELD_UNCALIBRATED,
            SensorKind::GyroscopeUncalibrated => SENSOR_TYPE_GYROSCOPE_UNCALIBRATED,
            SensorKind::GameRotationVector => SENSOR_TYPE_GAME_ROTATION_VECTOR,
            SensorKind::GeomagneticRotationVector => SENSOR_TYPE_GEOMAGNETIC_ROTATION_VECTOR,
            SensorKind::SignificantMotion => SENSOR_TYPE_SIGNIFICANT_MOTION,
            SensorKind::StepDetector => SENSOR_TYPE_STEP_DETECTOR,
            SensorKind::StepCounter => SENSOR_TYPE_STEP_COUNTER,
            SensorKind::WakeGesture => SENSOR_TYPE_WAKE_GESTURE,
            SensorKind::MetaData => SENSOR_TYPE_META_DATA,
            SensorKind::SyncAck | SensorKind::TimeDiffExhausted => return None,
        };
        Some(sensor_type)
    }

    /// Look up a kind by wire tag
    pub fn from_tag(tag: u8) -> Option<SensorKind> {
        SensorKind::ALL.iter().copied().find(|kind| kind.tag() == tag)
    }

    /// Look up a physical kind by framework handle
    pub fn from_handle(handle: i32) -> Option<SensorKind> {
        SensorKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.handle() == Some(handle))
    }

    /// Short name, used on the command line and in logs
    pub fn name(self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "accel",
            SensorKind::Magnetometer => "mag",
            SensorKind::Gyroscope => "gyro",
            SensorKind::Light => "light",
            SensorKind::Pressure => "pressure",
            SensorKind::Orientation => "orientation",
            SensorKind::RotationVector => "rotation",
            SensorKind::LinearAcceleration => "linear-accel",
            SensorKind::Gravity => "gravity",
            SensorKind::MagneticUncalibrated => "mag-uncal",
            SensorKind::GyroscopeUncalibrated => "gyro-uncal",
            SensorKind::GameRotationVector => "game-rotation",
            SensorKind::GeomagneticRotationVector => "geomag-rotation",
            SensorKind::SignificantMotion => "significant-motion",
            SensorKind::StepDetector => "step-detector",
            SensorKind::StepCounter => "step-counter",
            SensorKind::WakeGesture => "wake-gesture",
            SensorKind::MetaData => "meta-data",
            SensorKind::SyncAck => "sync-ack",
            SensorKind::TimeDiffExhausted => "time-diff-exhausted",
        }
    }

    /// Look up a kind by its short name
    pub fn from_name(name: &str) -> Option<SensorKind> {
        SensorKind::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// True for kinds the framework can enable
    #[inline]
    pub fn is_physical(self) -> bool {
        self.handle().is_some()
    }

    /// True for kinds whose 4th quaternion component is derived on the host
    #[inline]
    pub fn is_rotation_vector(self) -> bool {
        matches!(
            self,
            SensorKind::RotationVector
                | SensorKind::GameRotationVector
                | SensorKind::GeomagneticRotationVector
        )
    }

    /// True for kinds whose output events carry an accuracy status
    pub fn reports_accuracy(self) -> bool {
        matches!(
            self,
            SensorKind::Accelerometer
                | SensorKind::Magnetometer
                | SensorKind::Gyroscope
                | SensorKind::Orientation
                | SensorKind::LinearAcceleration
                | SensorKind::Gravity
                | SensorKind::MagneticUncalibrated
                | SensorKind::GyroscopeUncalibrated
        )
    }

    /// Accuracy a freshly created slot starts with
    pub fn default_accuracy(self) -> i8 {
        match self {
            SensorKind::Orientation
            | SensorKind::RotationVector
            | SensorKind::LinearAcceleration
            | SensorKind::Gravity
            | SensorKind::MagneticUncalibrated
            | SensorKind::GyroscopeUncalibrated
            | SensorKind::GameRotationVector
            | SensorKind::GeomagneticRotationVector
            | SensorKind::SignificantMotion
            | SensorKind::StepDetector => SENSOR_STATUS_ACCURACY_HIGH,
            SensorKind::Accelerometer
            | SensorKind::Magnetometer
            | SensorKind::Gyroscope
            | SensorKind::Light
            | SensorKind::Pressure
            | SensorKind::StepCounter
            | SensorKind::WakeGesture
            | SensorKind::MetaData
            | SensorKind::SyncAck
            | SensorKind::TimeDiffExhausted => SENSOR_STATUS_UNRELIABLE,
        }
    }

    /// Continuous batching is rejected for these kinds
    pub fn supports_batching(self) -> bool {
        !matches!(self, SensorKind::Light | SensorKind::SignificantMotion)
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
