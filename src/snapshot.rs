//! Snapshot-version tracking and visibility notification.
//!
//! Every accepted batch carries a snapshot version; "visible at V" means all
//! operations of all batches with version <= V are durably applied. The
//! tracker holds the highest applied version and a registry of one-shot
//! gates so a writer can block on a specific version without polling. The
//! confirmation channel is trusted to deliver notifications in
//! non-decreasing order; out-of-order delivery is an external-component
//! error and is not compensated for here.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::types::SnapshotVersion;

/// One-shot wakeup a waiter blocks on until its version is applied.
struct VersionGate {
    fired: Mutex<bool>,
    cond: Condvar,
}

impl VersionGate {
    fn new() -> Self {
        Self {
            fired: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    fn fire(&self) {
        let mut fired = self.fired.lock();
        *fired = true;
        self.cond.notify_all();
    }

    fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut fired = self.fired.lock();
        while !*fired {
            if self.cond.wait_until(&mut fired, deadline).timed_out() {
                return *fired;
            }
        }
        true
    }
}

/// Tracks applied snapshot versions and wakes registered waiters.
///
/// Shared freely across threads; the registry lock is held only long enough
/// to move gates in or out, never while signalling or waiting.
pub struct SnapshotTracker {
    /// Highest version confirmed applied. Monotonic, moves only upward.
    applied: AtomicU64,
    /// Highest version any batch was accepted at. Acceptance does not imply
    /// the batch is applied yet.
    accepted: AtomicU64,
    waiters: Mutex<BTreeMap<u64, Vec<Arc<VersionGate>>>>,
}

impl SnapshotTracker {
    pub fn new() -> Self {
        Self {
            applied: AtomicU64::new(0),
            accepted: AtomicU64::new(0),
            waiters: Mutex::new(BTreeMap::new()),
        }
    }

    /// Records that a batch was assigned `version` by the ingestion gateway.
    pub fn on_batch_accepted(&self, version: SnapshotVersion) {
        self.accepted.fetch_max(version.0, Ordering::AcqRel);
    }

    /// Confirmation-channel entry point: `version` and everything below it
    /// is now durably applied. Fires and discards every gate registered at a
    /// version <= `version`, each exactly once.
    pub fn notify_applied(&self, version: SnapshotVersion) {
        // Watermark before registry: await_version re-checks the watermark
        // under the registry lock, so a gate is either seen here or its
        // owner already returned.
        self.applied.fetch_max(version.0, Ordering::AcqRel);
        let ready = {
            let mut waiters = self.waiters.lock();
            let later = waiters.split_off(&(version.0 + 1));
            std::mem::replace(&mut *waiters, later)
        };
        let mut woken = 0usize;
        for gates in ready.into_values() {
            for gate in gates {
                gate.fire();
                woken += 1;
            }
        }
        trace!(version = version.0, woken, "snapshot version applied");
    }

    /// Blocks the calling thread until `version` is applied or `timeout`
    /// elapses; returns whether it was applied in time.
    ///
    /// Timing out does not retract the gate; its eventual firing is
    /// harmless. Returns immediately when the version is already applied.
    pub fn await_version(&self, version: SnapshotVersion, timeout: Duration) -> bool {
        if version.0 <= self.applied.load(Ordering::Acquire) {
            return true;
        }
        let gate = {
            let mut waiters = self.waiters.lock();
            // Re-check under the lock; a notification may have landed since
            // the fast-path read.
            if version.0 <= self.applied.load(Ordering::Acquire) {
                return true;
            }
            let gate = Arc::new(VersionGate::new());
            waiters.entry(version.0).or_default().push(gate.clone());
            gate
        };
        gate.wait(timeout)
    }

    /// Highest version confirmed applied.
    pub fn applied(&self) -> SnapshotVersion {
        SnapshotVersion(self.applied.load(Ordering::Acquire))
    }

    /// Highest version any batch was accepted at.
    pub fn accepted(&self) -> SnapshotVersion {
        SnapshotVersion(self.accepted.load(Ordering::Acquire))
    }
}

impl Default for SnapshotTracker {
    fn default() -> Self {
        Self::new()
    }
}
