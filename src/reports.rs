// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Sensor report handling for the sensor hub driver.
//!
//! This module holds the per-sensor pending state that decoded records are
//! written into, the bitsets that track which sensors are enabled or have
//! unreported data, and the output events built from that state.

use crate::constants::{META_DATA_FLUSH_COMPLETE, META_DATA_VERSION, SENSOR_TYPE_META_DATA};
use crate::decoder::{Decoded, Update};
use crate::sensors::SensorKind;

/// Set of sensor kinds, one bit per dense index
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KindSet(u32);

impl KindSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    #[inline]
    pub fn insert(&mut self, kind: SensorKind) {
        self.0 |= 1 << kind.index();
    }

    #[inline]
    pub fn remove(&mut self, kind: SensorKind) {
        self.0 &= !(1 << kind.index());
    }

    #[inline]
    pub fn contains(self, kind: SensorKind) -> bool {
        self.0 & (1 << kind.index()) != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    /// Members in dense index order
    pub fn iter(self) -> impl Iterator<Item = SensorKind> {
        SensorKind::ALL.into_iter().filter(move |kind| self.contains(*kind))
    }
}

impl FromIterator<SensorKind> for KindSet {
    fn from_iter<I: IntoIterator<Item = SensorKind>>(iter: I) -> Self {
        let mut set = KindSet::empty();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

/// Latest decoded state for one sensor kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingSample {
    pub data: [f32; 6],
    /// Cumulative count, step counter only
    pub step_count: u64,
    pub accuracy: i8,
    /// Device time after a decode, host time once dispatched
    pub timestamp: i64,
}

impl PendingSample {
    pub fn new(kind: SensorKind) -> Self {
        Self {
            data: [0.0; 6],
            step_count: 0,
            accuracy: kind.default_accuracy(),
            timestamp: 0,
        }
    }
}

/// Derive the real part of a unit quaternion from its vector part.
///
/// Rounding on the firmware side can push the radicand below zero, in which
/// case the result is 0 rather than NaN.
#[inline]
pub fn quaternion_w(x: f32, y: f32, z: f32) -> f32 {
    let radicand = 1.0 - x * x - y * y - z * z;
    if radicand > 0.0 {
        radicand.sqrt()
    } else {
        0.0
    }
}

/// Sensor values carried by an output event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payload {
    /// [x, y, z]
    Vector([f32; 3]),
    /// [x, y, z, w]
    Quaternion([f32; 4]),
    Uncalibrated { values: [f32; 3], bias: [f32; 3] },
    /// hPa and degrees C
    Pressure { hpa: f32, temperature: f32 },
    /// Lux
    Light(f32),
    StepCount(u64),
    /// One-shot trigger value
    Trigger(f32),
}

/// A sample reported to the framework
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorEvent {
    pub handle: i32,
    pub kind: SensorKind,
    pub sensor_type: i32,
    pub payload: Payload,
    /// Accuracy status for kinds that report one
    pub accuracy: Option<i8>,
    /// Host time at emission, nanoseconds
    pub timestamp: i64,
}

/// Event handed back from a dispatch pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputEvent {
    Sensor(SensorEvent),
    /// A flush requested for `handle` has completed
    FlushComplete { handle: i32 },
}

impl OutputEvent {
    pub fn handle(&self) -> i32 {
        match self {
            OutputEvent::Sensor(event) => event.handle,
            OutputEvent::FlushComplete { handle } => *handle,
        }
    }

    /// Framework sensor type, meta-data for flush completions
    pub fn sensor_type(&self) -> i32 {
        match self {
            OutputEvent::Sensor(event) => event.sensor_type,
            OutputEvent::FlushComplete { .. } => SENSOR_TYPE_META_DATA,
        }
    }

    /// Meta-data `what` field, `None` for sensor samples
    pub fn meta_what(&self) -> Option<i32> {
        match self {
            OutputEvent::Sensor(_) => None,
            OutputEvent::FlushComplete { .. } => Some(META_DATA_FLUSH_COMPLETE),
        }
    }

    /// Version tag of meta-data events
    pub fn meta_version(&self) -> Option<i32> {
        self.meta_what().map(|_| META_DATA_VERSION)
    }

    pub fn as_sensor(&self) -> Option<&SensorEvent> {
        match self {
            OutputEvent::Sensor(event) => Some(event),
            OutputEvent::FlushComplete { .. } => None,
        }
    }
}

/// Pending state for every sensor kind
#[derive(Debug, Clone)]
pub struct SensorTable {
    slots: [PendingSample; SensorKind::COUNT],
    /// Kinds with data received since their last emission
    pub dirty: KindSet,
}

impl Default for SensorTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorTable {
    pub fn new() -> Self {
        Self {
            slots: SensorKind::ALL.map(PendingSample::new),
            dirty: KindSet::empty(),
        }
    }

    pub fn sample(&self, kind: SensorKind) -> &PendingSample {
        &self.slots[kind.index()]
    }

    pub fn sample_mut(&mut self, kind: SensorKind) -> &mut PendingSample {
        &mut self.slots[kind.index()]
    }

    /// Write a decoded record into its slot.
    ///
    /// The device timestamp always replaces the slot timestamp. Physical
    /// kinds are marked dirty. Returns the kind the record addressed, or
    /// `None` for an unknown tag.
    pub fn apply(&mut self, decoded: &Decoded) -> Option<SensorKind> {
        let kind = decoded.kind?;
        let slot = &mut self.slots[kind.index()];
        slot.timestamp = decoded.timestamp;

        match decoded.update {
            Update::Vector { values, accuracy } => {
                slot.data[..3].copy_from_slice(&values);
                if let Some(accuracy) = accuracy {
                    slot.accuracy = accuracy;
                }
            }
            Update::Uncalibrated { values, bias } => {
                slot.data[..3].copy_from_slice(&values);
                slot.data[3..].copy_from_slice(&bias);
            }
            Update::Pressure { hpa, temperature } => {
                slot.data[0] = hpa;
                slot.data[2] = temperature;
            }
            Update::Light(lux) => slot.data[0] = lux,
            Update::StepDetected { hint } => {
                slot.data[0] = 1.0;
                self.slots[SensorKind::StepCounter.index()].data[0] = hint;
            }
            Update::StepCount(count) => slot.step_count = count,
            Update::WakeGesture => slot.data[0] = 1.0,
            Update::FlushComplete { .. }
            | Update::SyncAck { .. }
            | Update::TimeDiffExhausted { .. }
            | Update::Unknown => {}
        }

        if kind.is_physical() {
            self.dirty.insert(kind);
        }
        Some(kind)
    }

    /// Fill in derived fields before a sample is emitted
    pub fn finalize(&mut self, kind: SensorKind) {
        if kind.is_rotation_vector() {
            let data = &mut self.slots[kind.index()].data;
            data[3] = quaternion_w(data[0], data[1], data[2]);
        }
    }

    /// Build the output event for a physical kind from its slot
    pub fn event(&self, kind: SensorKind) -> Option<SensorEvent> {
        let handle = kind.handle()?;
        let sensor_type = kind.framework_type()?;
        let slot = &self.slots[kind.index()];
        let d = slot.data;

        let payload = match kind {
            SensorKind::RotationVector
            | SensorKind::GameRotationVector
            | SensorKind::GeomagneticRotationVector => {
                Payload::Quaternion([d[0], d[1], d[2], d[3]])
            }
            SensorKind::MagneticUncalibrated | SensorKind::GyroscopeUncalibrated => {
                Payload::Uncalibrated {
                    values: [d[0], d[1], d[2]],
                    bias: [d[3], d[4], d[5]],
                }
            }
            SensorKind::Pressure => Payload::Pressure {
                hpa: d[0],
                temperature: d[2],
            },
            SensorKind::Light => Payload::Light(d[0]),
            SensorKind::StepCounter => Payload::StepCount(slot.step_count),
            SensorKind::StepDetector | SensorKind::WakeGesture => Payload::Trigger(d[0]),
            _ => Payload::Vector([d[0], d[1], d[2]]),
        };

        Some(SensorEvent {
            handle,
            kind,
            sensor_type,
            payload,
            accuracy: kind.reports_accuracy().then_some(slot.accuracy),
            timestamp: slot.timestamp,
        })
    }
}
