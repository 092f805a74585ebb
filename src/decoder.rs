// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Record decoder.
//!
//! Turns one [`RawRecord`] into a typed [`Decoded`] update. Decoding is pure:
//! writing the update into per-sensor state and driving the timestamp sync
//! both happen elsewhere.

use log::{trace, warn};

use crate::constants::{
    index_to_lux, CONVERT_10, CONVERT_100, CONVERT_10000, EXHAUSTED_MAGIC, INVALID_HANDLE,
    SYNC_ACK_MAGIC,
};
use crate::reader::RawRecord;
use crate::sensors::SensorKind;

/// Value carried by a decoded record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Update {
    /// Replaces data[0..3], and the accuracy when present
    Vector {
        values: [f32; 3],
        accuracy: Option<i8>,
    },
    /// Replaces data[0..6]
    Uncalibrated { values: [f32; 3], bias: [f32; 3] },
    /// Pressure in hPa and temperature in degrees C
    Pressure { hpa: f32, temperature: f32 },
    /// Ambient light in lux
    Light(f32),
    /// A step was detected, `hint` goes to the step counter slot
    StepDetected { hint: f32 },
    /// Cumulative step count
    StepCount(u64),
    WakeGesture,
    /// A flush finished for the sensor with this handle
    FlushComplete { handle: i32 },
    /// Firmware answered a sync request
    SyncAck { magic_ok: bool },
    /// Firmware time-difference counter ran out
    TimeDiffExhausted { magic_ok: bool },
    /// Tag not known to this driver
    Unknown,
}

/// A decoded record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decoded {
    /// Wire tag, kept for unknown records
    pub tag: u8,
    pub kind: Option<SensorKind>,
    /// Device timestamp in nanoseconds
    pub timestamp: i64,
    pub update: Update,
}

/// Reinterpret primary[0..2] as a little-endian 32-bit word
#[inline]
fn low_word(primary: &[i16; 3]) -> u32 {
    (primary[0] as u16 as u32) | ((primary[1] as u16 as u32) << 16)
}

#[inline]
fn scale3(values: [i16; 3], factor: f32) -> [f32; 3] {
    [
        values[0] as f32 * factor,
        values[1] as f32 * factor,
        values[2] as f32 * factor,
    ]
}

/// Map the sensor tag carried by a meta-data record to a framework handle
pub fn flush_handle(tag: i16) -> i32 {
    let kind = u8::try_from(tag).ok().and_then(SensorKind::from_tag);
    match kind.and_then(SensorKind::handle) {
        Some(handle) => handle,
        None => {
            warn!("meta-data for unmapped sensor id {}", tag);
            INVALID_HANDLE
        }
    }
}

/// Decode a single record
pub fn decode(record: &RawRecord) -> Decoded {
    let tag = record.tag();
    let data = record.primary();
    let bias = record.bias();
    let timestamp = record.timestamp();
    let kind = SensorKind::from_tag(tag);

    let update = match kind {
        Some(SensorKind::Orientation) => Update::Vector {
            values: scale3(data, CONVERT_10),
            accuracy: Some(bias[0] as i8),
        },
        Some(SensorKind::Magnetometer) => Update::Vector {
            values: scale3(data, CONVERT_100),
            accuracy: Some(bias[0] as i8),
        },
        Some(
            SensorKind::Accelerometer
            | SensorKind::Gyroscope
            | SensorKind::LinearAcceleration
            | SensorKind::Gravity,
        ) => Update::Vector {
            values: scale3(data, CONVERT_100),
            accuracy: None,
        },
        Some(SensorKind::Pressure) => Update::Pressure {
            hpa: low_word(&data) as i32 as f32 * CONVERT_100,
            temperature: data[2] as f32 * CONVERT_100,
        },
        Some(
            SensorKind::RotationVector
            | SensorKind::GameRotationVector
            | SensorKind::GeomagneticRotationVector,
        ) => Update::Vector {
            values: scale3(data, CONVERT_10000),
            accuracy: None,
        },
        Some(SensorKind::MagneticUncalibrated | SensorKind::GyroscopeUncalibrated) => {
            Update::Uncalibrated {
                values: scale3(data, CONVERT_100),
                bias: scale3(bias, CONVERT_100),
            }
        }
        Some(SensorKind::SignificantMotion) => Update::Vector {
            values: scale3(data, 1.0),
            accuracy: None,
        },
        Some(SensorKind::Light) => Update::Light(index_to_lux(data[0])),
        Some(SensorKind::StepDetector) => Update::StepDetected {
            hint: data[0] as f32,
        },
        Some(SensorKind::StepCounter) => Update::StepCount(low_word(&data) as u64),
        Some(SensorKind::WakeGesture) => Update::WakeGesture,
        Some(SensorKind::MetaData) => Update::FlushComplete {
            handle: flush_handle(data[0]),
        },
        Some(SensorKind::SyncAck) => Update::SyncAck {
            magic_ok: data[0] == SYNC_ACK_MAGIC,
        },
        Some(SensorKind::TimeDiffExhausted) => Update::TimeDiffExhausted {
            magic_ok: data[0] == EXHAUSTED_MAGIC,
        },
        None => {
            warn!("Unknown sensor tag {}", tag);
            Update::Unknown
        }
    };
    trace!("decoded tag {} at {}: {:?}", tag, timestamp, update);

    Decoded {
        tag,
        kind,
        timestamp,
        update,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-4 * b.abs().max(1.0)
    }

    #[test]
    fn test_decode_accelerometer() {
        let record = RawRecord::new(CW_ACCELERATION, [981, -12, 0], [9, 9, 9], 1_000);
        let decoded = decode(&record);
        assert_eq!(decoded.kind, Some(SensorKind::Accelerometer));
        assert_eq!(decoded.timestamp, 1_000);
        match decoded.update {
            Update::Vector { values, accuracy } => {
                assert!(close(values[0], 9.81), "x = {}", values[0]);
                assert!(close(values[1], -0.12));
                assert_eq!(values[2], 0.0);
                assert_eq!(accuracy, None, "Accelerometer accuracy is not on the wire");
            }
            other => panic!("Unexpected update {:?}", other),
        }
    }

    #[test]
    fn test_decode_orientation_and_magnetic_accuracy() {
        let orientation = decode(&RawRecord::new(CW_ORIENTATION, [1800, 0, -900], [2, 0, 0], 0));
        assert_eq!(
            orientation.update,
            Update::Vector {
                values: [1800.0 * CONVERT_10, 0.0, -900.0 * CONVERT_10],
                accuracy: Some(2)
            }
        );

        let magnetic = decode(&RawRecord::new(CW_MAGNETIC, [100, 200, 300], [1, 0, 0], 0));
        match magnetic.update {
            Update::Vector { accuracy, .. } => assert_eq!(accuracy, Some(1)),
            other => panic!("Unexpected update {:?}", other),
        }
    }

    #[test]
    fn test_decode_pressure_word() {
        // 101325 = 0x0001_8BCD -> 1013.25 hPa
        let low = 0x8BCDu16 as i16;
        let record = RawRecord::new(CW_PRESSURE, [low, 0x0001, 2500], [0; 3], 0);
        match decode(&record).update {
            Update::Pressure { hpa, temperature } => {
                assert!(close(hpa, 1013.25), "hpa = {}", hpa);
                assert!(close(temperature, 25.0));
            }
            other => panic!("Unexpected update {:?}", other),
        }

        let zero = decode(&RawRecord::new(CW_PRESSURE, [0, 0, 0], [0; 3], 0));
        assert_eq!(
            zero.update,
            Update::Pressure {
                hpa: 0.0,
                temperature: 0.0
            }
        );
    }

    #[test]
    fn test_decode_rotation_vector_leaves_w_for_finalize() {
        let record = RawRecord::new(CW_ROTATIONVECTOR, [5000, 0, 0], [0; 3], 0);
        match decode(&record).update {
            Update::Vector { values, accuracy } => {
                assert!(close(values[0], 0.5));
                assert_eq!(accuracy, None);
            }
            other => panic!("Unexpected update {:?}", other),
        }
    }

    #[test]
    fn test_decode_uncalibrated() {
        let record = RawRecord::new(CW_GYROSCOPE_UNCALIBRATED, [100, -100, 50], [10, 20, -30], 0);
        match decode(&record).update {
            Update::Uncalibrated { values, bias } => {
                assert!(close(values[0], 1.0) && close(values[1], -1.0) && close(values[2], 0.5));
                assert!(close(bias[0], 0.1) && close(bias[1], 0.2) && close(bias[2], -0.3));
            }
            other => panic!("Unexpected update {:?}", other),
        }
    }

    #[test]
    fn test_decode_light_clamps_level() {
        let bright = decode(&RawRecord::new(CW_LIGHT, [42, 0, 0], [0; 3], 0));
        assert_eq!(bright.update, Update::Light(2600.0));
        let negative = decode(&RawRecord::new(CW_LIGHT, [-1, 0, 0], [0; 3], 0));
        assert_eq!(negative.update, Update::Light(2600.0));
        let mid = decode(&RawRecord::new(CW_LIGHT, [3, 0, 0], [0; 3], 0));
        assert_eq!(mid.update, Update::Light(90.0));
    }

    #[test]
    fn test_decode_steps() {
        let detector = decode(&RawRecord::new(CW_STEP_DETECTOR, [4, 0, 0], [0; 3], 0));
        assert_eq!(detector.update, Update::StepDetected { hint: 4.0 });

        let counter = decode(&RawRecord::new(CW_STEP_COUNTER, [0x0002, 0x0001, 0], [0; 3], 0));
        assert_eq!(counter.update, Update::StepCount(0x0001_0002));

        // The high bit of the low half must not sign-extend
        let counter = decode(&RawRecord::new(CW_STEP_COUNTER, [-1, 0, 0], [0; 3], 0));
        assert_eq!(counter.update, Update::StepCount(0xFFFF));
    }

    #[test]
    fn test_decode_meta_data_handles() {
        let flush = decode(&RawRecord::new(CW_META_DATA, [CW_GYRO as i16, 0, 0], [0; 3], 0));
        assert_eq!(flush.update, Update::FlushComplete { handle: ID_GY });

        let motion = decode(&RawRecord::new(
            CW_META_DATA,
            [CW_SIGNIFICANT_MOTION as i16, 0, 0],
            [0; 3],
            0,
        ));
        assert_eq!(
            motion.update,
            Update::FlushComplete {
                handle: ID_CW_SIGNIFICANT_MOTION
            }
        );

        let unknown = decode(&RawRecord::new(CW_META_DATA, [4, 0, 0], [0; 3], 0));
        assert_eq!(
            unknown.update,
            Update::FlushComplete {
                handle: INVALID_HANDLE
            }
        );

        // Protocol kinds have no handle either
        assert_eq!(flush_handle(CW_SYNC_ACK as i16), INVALID_HANDLE);
        assert_eq!(flush_handle(-7), INVALID_HANDLE);
    }

    #[test]
    fn test_decode_sync_magic() {
        let ack = decode(&RawRecord::new(CW_SYNC_ACK, [SYNC_ACK_MAGIC, 0, 0], [0; 3], 0));
        assert_eq!(ack.update, Update::SyncAck { magic_ok: true });
        let bad = decode(&RawRecord::new(CW_SYNC_ACK, [EXHAUSTED_MAGIC, 0, 0], [0; 3], 0));
        assert_eq!(bad.update, Update::SyncAck { magic_ok: false });

        let exhausted = decode(&RawRecord::new(
            TIME_DIFF_EXHAUSTED,
            [EXHAUSTED_MAGIC, 0, 0],
            [0; 3],
            0,
        ));
        assert_eq!(exhausted.update, Update::TimeDiffExhausted { magic_ok: true });
    }

    #[test]
    fn test_decode_unknown_tag_keeps_fields() {
        let decoded = decode(&RawRecord::new(0x42, [1, 2, 3], [0; 3], 77));
        assert_eq!(decoded.kind, None);
        assert_eq!(decoded.tag, 0x42);
        assert_eq!(decoded.timestamp, 77);
        assert_eq!(decoded.update, Update::Unknown);
    }
}
