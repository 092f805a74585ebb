// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Timestamp synchronization handshake.
//!
//! The host asks the firmware to resynchronize by writing a sync code to the
//! `flush` attribute, remembering its own clock at that moment. When the
//! firmware answers with a sync ack carrying the right magic, that remembered
//! time becomes the synchronized timestamp. A lost ack leaves the state
//! waiting until the next request.

use log::{debug, info};

/// Where the handshake currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    WaitingForAck,
}

#[derive(Debug, Clone, Default)]
pub struct TimestampSync {
    phase: SyncPhase,
    /// Host time of the outstanding request
    candidate: i64,
    /// Host time of the last acknowledged request
    synchronized: i64,
}

impl TimestampSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request issued at host time `now`.
    ///
    /// Call only once the sync code has been written. A newer request
    /// replaces an outstanding one.
    pub fn request(&mut self, now: i64) {
        if self.phase == SyncPhase::WaitingForAck {
            debug!("sync request at {} replaces {}", now, self.candidate);
        }
        self.candidate = now;
        self.phase = SyncPhase::WaitingForAck;
    }

    /// Handle a sync ack record. Returns true if the candidate was promoted.
    pub fn acknowledge(&mut self, magic_ok: bool) -> bool {
        if !magic_ok {
            debug!("sync ack with bad magic ignored");
            return false;
        }
        match self.phase {
            SyncPhase::WaitingForAck => {
                self.synchronized = self.candidate;
                self.phase = SyncPhase::Idle;
                info!("timestamp synchronized at {}", self.synchronized);
                true
            }
            SyncPhase::Idle => {
                debug!("sync ack without outstanding request");
                false
            }
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn candidate(&self) -> i64 {
        self.candidate
    }

    pub fn synchronized(&self) -> i64 {
        self.synchronized
    }
}
