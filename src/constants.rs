// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Constants for the CwMcu sensor hub driver.
//!
//! This module contains the record layout, wire tags, framework handles and
//! types, scale factors and control codes used when talking to the sensor hub
//! firmware.

/// Buffer sizes
pub const RECORD_SIZE: usize = 24;
pub const EVENT_BUFFER_RECORDS: usize = 1024;

// =============================================================================
// Record Layout
// =============================================================================

/// Byte offset of the sensor tag
pub const RECORD_TAG_OFFSET: usize = 0;
/// Byte offset of the three primary i16 values
pub const RECORD_DATA_OFFSET: usize = 1;
/// Byte offset of the three bias/aux i16 values
pub const RECORD_BIAS_OFFSET: usize = 7;
/// Byte offset of the i64 device timestamp (nanoseconds)
pub const RECORD_TIME_OFFSET: usize = 13;

// =============================================================================
// Sensor Tags (record byte 0, also the `<kind>` written to control files)
// =============================================================================

pub const CW_ACCELERATION: u8 = 0;
pub const CW_MAGNETIC: u8 = 1;
pub const CW_GYRO: u8 = 2;
pub const CW_LIGHT: u8 = 3;
pub const CW_PRESSURE: u8 = 5;
pub const CW_ORIENTATION: u8 = 6;
pub const CW_ROTATIONVECTOR: u8 = 7;
pub const CW_LINEARACCELERATION: u8 = 8;
pub const CW_GRAVITY: u8 = 9;
pub const CW_MAGNETIC_UNCALIBRATED: u8 = 16;
pub const CW_GYROSCOPE_UNCALIBRATED: u8 = 17;
pub const CW_GAME_ROTATION_VECTOR: u8 = 18;
pub const CW_GEOMAGNETIC_ROTATION_VECTOR: u8 = 19;
pub const CW_SIGNIFICANT_MOTION: u8 = 20;
pub const CW_STEP_DETECTOR: u8 = 21;
pub const CW_STEP_COUNTER: u8 = 22;
pub const HTC_WAKE_UP_GESTURE: u8 = 25;
/// Firmware ran out of range on its internal time-difference counter
pub const TIME_DIFF_EXHAUSTED: u8 = 97;
/// Firmware acknowledged a timestamp sync request
pub const CW_SYNC_ACK: u8 = 98;
/// Flush-complete marker
pub const CW_META_DATA: u8 = 99;

// =============================================================================
// Framework Handles
// =============================================================================

pub const ID_A: i32 = 0;
pub const ID_M: i32 = 1;
pub const ID_GY: i32 = 2;
pub const ID_L: i32 = 3;
pub const ID_PS: i32 = 4;
pub const ID_O: i32 = 5;
pub const ID_RV: i32 = 6;
pub const ID_LA: i32 = 7;
pub const ID_G: i32 = 8;
pub const ID_CW_MAGNETIC_UNCALIBRATED: i32 = 9;
pub const ID_CW_GYROSCOPE_UNCALIBRATED: i32 = 10;
pub const ID_CW_GAME_ROTATION_VECTOR: i32 = 11;
pub const ID_CW_GEOMAGNETIC_ROTATION_VECTOR: i32 = 12;
pub const ID_CW_SIGNIFICANT_MOTION: i32 = 13;
pub const ID_CW_STEP_DETECTOR: i32 = 14;
pub const ID_CW_STEP_COUNTER: i32 = 15;
pub const ID_WAKE_UP_GESTURE: i32 = 16;
/// Handle reported in a flush-complete event whose sensor id is unknown
pub const INVALID_HANDLE: i32 = 0xFF;

// =============================================================================
// Framework Sensor Types
// =============================================================================

pub const SENSOR_TYPE_META_DATA: i32 = 0;
pub const SENSOR_TYPE_ACCELEROMETER: i32 = 1;
pub const SENSOR_TYPE_MAGNETIC_FIELD: i32 = 2;
pub const SENSOR_TYPE_ORIENTATION: i32 = 3;
pub const SENSOR_TYPE_GYROSCOPE: i32 = 4;
pub const SENSOR_TYPE_LIGHT: i32 = 5;
pub const SENSOR_TYPE_PRESSURE: i32 = 6;
pub const SENSOR_TYPE_GRAVITY: i32 = 9;
pub const SENSOR_TYPE_LINEAR_ACCELERATION: i32 = 10;
pub const SENSOR_TYPE_ROTATION_VECTOR: i32 = 11;
pub const SENSOR_TYPE_MAGNETIC_FIELD_UNCALIBRATED: i32 = 14;
pub const SENSOR_TYPE_GAME_ROTATION_VECTOR: i32 = 15;
pub const SENSOR_TYPE_GYROSCOPE_UNCALIBRATED: i32 = 16;
pub const SENSOR_TYPE_SIGNIFICANT_MOTION: i32 = 17;
pub const SENSOR_TYPE_STEP_DETECTOR: i32 = 18;
pub const SENSOR_TYPE_STEP_COUNTER: i32 = 19;
pub const SENSOR_TYPE_GEOMAGNETIC_ROTATION_VECTOR: i32 = 20;
pub const SENSOR_TYPE_WAKE_GESTURE: i32 = 23;

/// Meta-data event kind for a completed flush
pub const META_DATA_FLUSH_COMPLETE: i32 = 1;
/// Version field carried by meta-data events
pub const META_DATA_VERSION: i32 = 0x103405;

/// Accuracy status values
pub const SENSOR_STATUS_UNRELIABLE: i8 = 0;
pub const SENSOR_STATUS_ACCURACY_HIGH: i8 = 3;

// =============================================================================
// Batch Flags
// =============================================================================

pub const SENSORS_BATCH_DRY_RUN: i32 = 0x0000_0001;
pub const SENSORS_BATCH_WAKE_UPON_FIFO_FULL: i32 = 0x0000_0002;

// =============================================================================
// Timestamp Synchronization
// =============================================================================

/// Written to the `flush` attribute to request a timestamp sync
pub const TIMESTAMP_SYNC_CODE: i32 = 98;
/// primary[0] of a valid sync ack record
pub const SYNC_ACK_MAGIC: i16 = 0x66;
/// primary[0] of a valid time-diff-exhausted record
pub const EXHAUSTED_MAGIC: i16 = 0x77;

// =============================================================================
// Scale Factors
// =============================================================================

pub const CONVERT_10: f32 = 0.1;
pub const CONVERT_100: f32 = 0.01;
pub const CONVERT_10000: f32 = 0.0001;

/// Lux value for each firmware light level
pub const LIGHTSENSOR_LEVEL: usize = 10;
pub const LUX_VALUES: [f32; LIGHTSENSOR_LEVEL] =
    [0.0, 10.0, 40.0, 90.0, 160.0, 225.0, 320.0, 640.0, 1280.0, 2600.0];

/// Calibration vector lengths
pub const G_SENSOR_CALIBRATION_DATA_SIZE: usize = 3;
pub const COMPASS_CALIBRATION_DATA_SIZE: usize = 26;

pub const NS_PER_MS: i64 = 1_000_000;

// =============================================================================
// Helper Functions
// =============================================================================

/// Map a firmware light level to lux, clamping out-of-range levels
#[inline]
pub fn index_to_lux(index: i16) -> f32 {
    // negative levels are out of range too
    let index =
        usize::try_from(index).map_or(LIGHTSENSOR_LEVEL - 1, |i| i.min(LIGHTSENSOR_LEVEL - 1));
    LUX_VALUES[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_layout() {
        assert_eq!(RECORD_DATA_OFFSET, RECORD_TAG_OFFSET + 1);
        assert_eq!(RECORD_BIAS_OFFSET, RECORD_DATA_OFFSET + 6);
        assert_eq!(RECORD_TIME_OFFSET, RECORD_BIAS_OFFSET + 6);
        assert!(
            RECORD_TIME_OFFSET + 8 <= RECORD_SIZE,
            "Timestamp runs past the end of the record"
        );
    }

    #[test]
    fn test_lux_table_monotonic() {
        for pair in LUX_VALUES.windows(2) {
            assert!(pair[0] < pair[1], "Lux table not increasing: {:?}", pair);
        }
    }

    #[test]
    fn test_index_to_lux() {
        assert_eq!(index_to_lux(0), 0.0);
        assert_eq!(index_to_lux(4), 160.0);
        assert_eq!(index_to_lux(9), 2600.0);
        // Out of range levels clamp to the brightest entry
        assert_eq!(index_to_lux(10), 2600.0);
        assert_eq!(index_to_lux(i16::MAX), 2600.0);
        assert_eq!(index_to_lux(-1), 2600.0);
        assert_eq!(index_to_lux(i16::MIN), 2600.0);
    }

    #[test]
    fn test_magic_values_differ() {
        assert_ne!(SYNC_ACK_MAGIC, EXHAUSTED_MAGIC);
    }
}
