// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Sensor hub driver implementation.
//!
//! This module contains the dispatch loop that turns the record stream into
//! framework events, and the control operations (enable, batch, flush, delay
//! and timestamp sync) that configure the firmware through its sysfs
//! attributes.
//!
//! A [`SensorHub`] is owned by a single dispatch thread. Other threads
//! configure it through a cloneable [`HubHandle`], which validates requests
//! immediately and queues them for the dispatch thread to apply.

use std::fs::{File, OpenOptions};
use std::io::Read;
use std::sync::mpsc::{self, Receiver, Sender};

use log::{debug, info, trace, warn};

use crate::calibration::{AccelCalibration, CompassCalibration};
use crate::config::HubConfig;
use crate::constants::{
    NS_PER_MS, SENSORS_BATCH_DRY_RUN, SENSORS_BATCH_WAKE_UPON_FIFO_FULL, TIMESTAMP_SYNC_CODE,
};
use crate::decoder::{decode, Decoded, Update};
use crate::error::{HubError, Result};
use crate::interface::{Clock, ControlAttr, ControlSurface, SysfsControl, SystemClock};
use crate::reader::EventReader;
use crate::reports::{KindSet, OutputEvent, SensorTable};
use crate::sensors::SensorKind;
use crate::sync::TimestampSync;

/// Resolve a framework handle to a physical sensor kind
pub fn physical_kind(handle: i32) -> Result<SensorKind> {
    SensorKind::from_handle(handle).ok_or(HubError::InvalidHandle(handle))
}

/// Reject batching with a FIFO timeout for sensors that cannot buffer
fn check_batch(kind: SensorKind, timeout_ns: i64) -> Result<()> {
    if timeout_ns > 0 && !kind.supports_batching() {
        debug!("{} does not support batch mode", kind);
        return Err(HubError::BatchNotSupported(kind));
    }
    Ok(())
}

#[inline]
fn is_dry_run(flags: i32) -> bool {
    flags & SENSORS_BATCH_DRY_RUN != 0
}

/// Control request queued by a [`HubHandle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Enable {
        kind: SensorKind,
        enabled: bool,
    },
    Batch {
        kind: SensorKind,
        flags: i32,
        period_ns: i64,
        timeout_ns: i64,
    },
    Flush(SensorKind),
    SetDelay {
        kind: SensorKind,
        delay_ns: i64,
    },
    SyncTimestamp,
}

/// Thread-safe front end to a [`SensorHub`].
///
/// Arguments are checked on the calling thread, so an invalid handle or an
/// unsupported batch request fails here. Accepted requests run on the
/// dispatch thread at the start of its next [`SensorHub::read_events`].
#[derive(Debug, Clone)]
pub struct HubHandle {
    tx: Sender<Command>,
}

impl HubHandle {
    fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command).map_err(|_| HubError::Disconnected)
    }

    pub fn enable(&self, handle: i32, enabled: bool) -> Result<()> {
        let kind = physical_kind(handle)?;
        self.send(Command::Enable { kind, enabled })
    }

    pub fn batch(&self, handle: i32, flags: i32, period_ns: i64, timeout_ns: i64) -> Result<()> {
        let kind = physical_kind(handle)?;
        check_batch(kind, timeout_ns)?;
        if is_dry_run(flags) {
            return Ok(());
        }
        self.send(Command::Batch {
            kind,
            flags,
            period_ns,
            timeout_ns,
        })
    }

    pub fn flush(&self, handle: i32) -> Result<()> {
        let kind = physical_kind(handle)?;
        self.send(Command::Flush(kind))
    }

    pub fn set_delay(&self, handle: i32, delay_ns: i64) -> Result<()> {
        let kind = physical_kind(handle)?;
        self.send(Command::SetDelay { kind, delay_ns })
    }

    pub fn sync_timestamp(&self) -> Result<()> {
        self.send(Command::SyncTimestamp)
    }
}

/// Sensor hub driver
///
/// Reads records from `R`, configures the firmware through `C` and stamps
/// output events with time from `K`.
pub struct SensorHub<R: Read, C: ControlSurface, K: Clock> {
    reader: EventReader<R>,
    control: C,
    clock: K,
    config: HubConfig,
    table: SensorTable,
    /// Sensors the framework has switched on
    enabled: KindSet,
    sync: TimestampSync,
    /// Has the IIO trigger been bound
    trigger_bound: bool,
    commands: Receiver<Command>,
    command_tx: Sender<Command>,
}

impl SensorHub<File, SysfsControl, SystemClock> {
    /// Open the configured device node and sysfs attributes, then run the
    /// startup sequence
    pub fn open(config: HubConfig) -> Result<Self> {
        let device = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.device_node)?;
        debug!("opened {}", config.device_node.display());
        let control = SysfsControl::from_config(&config);
        let mut hub = Self::new(device, control, SystemClock, config);
        hub.start();
        Ok(hub)
    }
}

impl<R: Read, C: ControlSurface, K: Clock> SensorHub<R, C, K> {
    /// Create a driver over already opened collaborators. Nothing is written
    /// until [`start`](Self::start) or a control operation.
    pub fn new(source: R, control: C, clock: K, config: HubConfig) -> Self {
        let (command_tx, commands) = mpsc::channel();
        Self {
            reader: EventReader::new(source),
            control,
            clock,
            config,
            table: SensorTable::new(),
            enabled: KindSet::empty(),
            sync: TimestampSync::new(),
            trigger_bound: false,
            commands,
            command_tx,
        }
    }

    /// Bring up the IIO buffer and restore persisted calibration.
    ///
    /// Every step is best effort: failures are logged and startup continues.
    pub fn start(&mut self) {
        trace!("hub start");
        self.prepare_buffer();
        self.restore_calibration();
    }

    /// A handle for configuring this hub from other threads
    pub fn handle(&self) -> HubHandle {
        HubHandle {
            tx: self.command_tx.clone(),
        }
    }

    /// Apply every queued command, returning how many were taken
    pub fn process_commands(&mut self) -> usize {
        let mut count = 0;
        while let Ok(command) = self.commands.try_recv() {
            if let Err(e) = self.apply(command) {
                warn!("{:?}", e)
            }
            count += 1;
        }
        count
    }

    fn apply(&mut self, command: Command) -> Result<()> {
        trace!("apply {:?}", command);
        match command {
            Command::Enable { kind, enabled } => self.enable_kind(kind, enabled),
            Command::Batch {
                kind,
                flags,
                period_ns,
                timeout_ns,
            } => self.batch_kind(kind, flags, period_ns, timeout_ns),
            Command::Flush(kind) => self.flush_kind(kind),
            Command::SetDelay { kind, delay_ns } => self.set_delay_kind(kind, delay_ns),
            Command::SyncTimestamp => self.sync_timestamp(),
        }
    }

    /// Read and dispatch up to `max_count` events.
    ///
    /// Blocks until the stream delivers data. Records left over once the
    /// budget is spent stay queued for the next call.
    pub fn read_events(&mut self, max_count: usize) -> Result<Vec<OutputEvent>> {
        if max_count == 0 {
            return Err(HubError::InvalidCount(max_count));
        }
        self.process_commands();

        if self.config.fill_debug {
            debug!("read_events: before fill");
        }
        let filled = self.reader.fill()?;
        if self.config.fill_debug {
            debug!("read_events: after fill, n = {}", filled);
        }

        let mut events = Vec::with_capacity(max_count.min(self.reader.len()));
        while events.len() < max_count {
            let Some(record) = self.reader.read_next() else {
                break;
            };
            self.handle_record(&decode(&record), &mut events);
            self.reader.advance();
        }
        Ok(events)
    }

    fn handle_record(&mut self, decoded: &Decoded, events: &mut Vec<OutputEvent>) {
        let Some(kind) = self.table.apply(decoded) else {
            return;
        };

        match decoded.update {
            Update::FlushComplete { handle } => {
                info!("flush complete for handle {}", handle);
                events.push(OutputEvent::FlushComplete { handle });
                return;
            }
            Update::SyncAck { magic_ok } => {
                self.sync.acknowledge(magic_ok);
            }
            Update::TimeDiffExhausted { magic_ok } => {
                if magic_ok {
                    info!("firmware time difference exhausted, resyncing");
                    if let Err(e) = self.sync_timestamp() {
                        warn!("{:?}", e)
                    }
                } else {
                    debug!("time-diff-exhausted with bad magic ignored");
                }
            }
            _ => {}
        }

        self.table.sample_mut(kind).timestamp = self.clock.now_ns();
        if !self.enabled.contains(kind) {
            return;
        }

        self.table.finalize(kind);
        if let Some(event) = self.table.event(kind) {
            trace!("emit {:?}", event);
            events.push(OutputEvent::Sensor(event));
        }
        self.table.dirty.remove(kind);

        if kind == SensorKind::SignificantMotion {
            // one-shot, the framework re-arms it
            if let Err(e) = self.enable_kind(kind, false) {
                warn!("{:?}", e);
                self.enabled.remove(kind);
            }
        }
    }

    /// Whether decoded data is waiting that has not been emitted
    pub fn has_pending_events(&self) -> bool {
        !self.table.dirty.is_empty()
    }

    // =========================================================================
    // Control operations
    // =========================================================================

    fn write_attr(&mut self, attr: ControlAttr, value: &str) -> Result<()> {
        self.control
            .write_attr(attr, value)
            .map_err(|source| HubError::Control {
                attr: attr.name(),
                source,
            })
    }

    /// Switch a sensor on or off
    pub fn set_enable(&mut self, handle: i32, enabled: bool) -> Result<()> {
        let kind = physical_kind(handle)?;
        self.enable_kind(kind, enabled)
    }

    fn enable_kind(&mut self, kind: SensorKind, enabled: bool) -> Result<()> {
        debug!("set_enable {} = {}", kind, enabled);
        self.write_attr(ControlAttr::Enable, &format!("{} {}\n", kind.tag(), enabled as u8))?;

        if enabled {
            self.enabled.insert(kind);
        } else {
            self.enabled.remove(kind);
            if self.enabled.is_empty() {
                match self.write_attr(ControlAttr::BufferEnable, "0") {
                    Ok(()) => info!("IIO buffer disabled"),
                    Err(e) => warn!("{:?}", e),
                }
            }
            if matches!(
                kind,
                SensorKind::Magnetometer | SensorKind::Orientation | SensorKind::RotationVector
            ) {
                self.save_compass_calibration();
            }
        }
        Ok(())
    }

    /// Configure sampling period and FIFO timeout for a sensor
    pub fn batch(
        &mut self,
        handle: i32,
        flags: i32,
        period_ns: i64,
        timeout_ns: i64,
    ) -> Result<()> {
        let kind = physical_kind(handle)?;
        check_batch(kind, timeout_ns)?;
        if is_dry_run(flags) {
            debug!("batch dry run for {}", kind);
            return Ok(());
        }
        self.batch_kind(kind, flags, period_ns, timeout_ns)
    }

    fn batch_kind(
        &mut self,
        kind: SensorKind,
        flags: i32,
        period_ns: i64,
        timeout_ns: i64,
    ) -> Result<()> {
        if flags == SENSORS_BATCH_WAKE_UPON_FIFO_FULL {
            debug!("batch {} wakes upon FIFO full", kind);
        }
        if self.enabled.is_empty() {
            self.prepare_buffer();
        }
        if let Err(e) = self.sync_timestamp() {
            warn!("{:?}", e)
        }

        let delay_ms = period_ns / NS_PER_MS;
        let timeout_ms = timeout_ns / NS_PER_MS;
        debug!(
            "batch {}: flags = {}, delay_ms = {}, timeout_ms = {}",
            kind, flags, delay_ms, timeout_ms
        );
        self.write_attr(
            ControlAttr::BatchEnable,
            &format!("{} {} {} {}\n", kind.tag(), flags, delay_ms, timeout_ms),
        )
    }

    /// Ask the firmware to drain a sensor's FIFO.
    ///
    /// Completion arrives later as an [`OutputEvent::FlushComplete`].
    pub fn flush(&mut self, handle: i32) -> Result<()> {
        let kind = physical_kind(handle)?;
        self.flush_kind(kind)
    }

    fn flush_kind(&mut self, kind: SensorKind) -> Result<()> {
        debug!("flush {}", kind);
        self.write_attr(ControlAttr::Flush, &format!("{}\n", kind.tag()))
    }

    pub fn set_delay(&mut self, handle: i32, delay_ns: i64) -> Result<()> {
        let kind = physical_kind(handle)?;
        self.set_delay_kind(kind, delay_ns)
    }

    fn set_delay_kind(&mut self, kind: SensorKind, delay_ns: i64) -> Result<()> {
        let delay_ms = delay_ns / NS_PER_MS;
        debug!("set_delay {} = {} ms", kind, delay_ms);
        self.write_attr(ControlAttr::DelayMs, &format!("{} {}\n", kind.tag(), delay_ms))
    }

    /// Request a timestamp sync. The handshake completes when the firmware
    /// acknowledges through the record stream.
    pub fn sync_timestamp(&mut self) -> Result<()> {
        self.write_attr(ControlAttr::Flush, &format!("{}\n", TIMESTAMP_SYNC_CODE))?;
        let now = self.clock.now_ns();
        self.sync.request(now);
        info!("timestamp sync requested at {}", now);
        Ok(())
    }

    // =========================================================================
    // Startup and calibration
    // =========================================================================

    fn prepare_buffer(&mut self) {
        let length = self.config.buffer_length.to_string();
        match self.write_attr(ControlAttr::BufferLength, &length) {
            Ok(()) => debug!("IIO buffer length = {}", length),
            Err(e) => warn!("{:?}", e),
        }

        if !self.trigger_bound {
            let trigger = self.config.trigger_name.clone();
            match self.write_attr(ControlAttr::CurrentTrigger, &trigger) {
                Ok(()) => self.trigger_bound = true,
                Err(e) => warn!("{:?}", e),
            }
        }

        match self.write_attr(ControlAttr::BufferEnable, "1") {
            Ok(()) => info!("IIO buffer enabled"),
            Err(e) => warn!("{:?}", e),
        }
    }

    fn restore_calibration(&mut self) {
        if let Some(path) = self.config.mag_calibration_path.clone() {
            match CompassCalibration::load(&path) {
                Ok(cal) => {
                    if let Err(e) = cal.write_to(&mut self.control, ControlAttr::CalibratorMag) {
                        warn!("{:?}", e)
                    }
                }
                Err(e) => info!("compass calibration unavailable: {}", e),
            }
        }

        if let Some(path) = self.config.acc_calibration_path.clone() {
            match AccelCalibration::load(&path) {
                Ok(cal) if cal.is_zero() => debug!("accelerometer calibration is zero, skipped"),
                Ok(cal) => {
                    if let Err(e) = cal.write_to(&mut self.control, ControlAttr::CalibratorAcc) {
                        warn!("{:?}", e)
                    }
                }
                Err(e) => info!("accelerometer calibration unavailable: {}", e),
            }
        }
    }

    /// Copy the driver's compass calibration to persistent storage
    fn save_compass_calibration(&mut self) {
        let Some(path) = self.config.mag_calibration_path.clone() else {
            return;
        };
        let saved = CompassCalibration::read_from(&mut self.control, ControlAttr::CalibratorMag)
            .and_then(|cal| cal.store(&path));
        match saved {
            Ok(()) => debug!("compass calibration saved to {}", path.display()),
            Err(e) => warn!("{:?}", e),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn enabled(&self) -> KindSet {
        self.enabled
    }

    pub fn is_enabled(&self, kind: SensorKind) -> bool {
        self.enabled.contains(kind)
    }

    pub fn table(&self) -> &SensorTable {
        &self.table
    }

    pub fn timestamp_sync(&self) -> &TimestampSync {
        &self.sync
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut C {
        &mut self.control
    }

    /// Whole records read but not yet dispatched
    pub fn queued_records(&self) -> usize {
        self.reader.len()
    }
}

impl<R: Read, C: ControlSurface, K: Clock> Drop for SensorHub<R, C, K> {
    fn drop(&mut self) {
        for kind in self.enabled.iter() {
            if let Err(e) = self.enable_kind(kind, false) {
                warn!("{:?}", e);
                self.enabled.remove(kind);
            }
        }
    }
}
