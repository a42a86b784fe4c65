//! Lease-based unique id allocation.
//!
//! Edge instance discriminators must be unique across every writer in the
//! cluster, but asking a remote authority for each one would put an RPC on
//! the hot path. The allocator instead caches a contiguous block (a lease)
//! obtained from the remote service and dispenses from it locally, going
//! back to the authority only once per `lease_size` ids. Ids still held when
//! a process exits leak, which is acceptable in a 64-bit id space.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Result, WriteError};
use crate::types::InnerId;

/// Remote allocation authority. Blocks handed out for a given id space are
/// disjoint, which is what makes locally dispensed ids globally unique.
pub trait LeaseService: Send + Sync {
    /// Grants a fresh block of `size` ids and returns its first value.
    fn allocate(&self, size: u32) -> Result<u64>;
}

/// Process-local dispenser over remotely granted leases.
///
/// The fast path is a lock-free compare-and-swap on the counter; the mutex
/// guards only the bound-check-and-refresh branch, so unrelated writers
/// never serialize on each other while the lease has ids left.
pub struct IdAllocator {
    /// Next value to dispense.
    current: AtomicU64,
    /// Exclusive end of the held lease.
    upper: AtomicU64,
    refresh: Mutex<()>,
    lease_size: u32,
    service: Arc<dyn LeaseService>,
}

impl std::fmt::Debug for IdAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdAllocator")
            .field("current", &self.current)
            .field("upper", &self.upper)
            .field("lease_size", &self.lease_size)
            .finish_non_exhaustive()
    }
}

impl IdAllocator {
    /// Creates an allocator with an empty lease; the first `next_id` call
    /// fetches the first block.
    pub fn new(service: Arc<dyn LeaseService>, lease_size: u32) -> Result<Self> {
        if lease_size == 0 {
            return Err(WriteError::InvalidArgument(
                "lease size must be positive".into(),
            ));
        }
        Ok(Self {
            current: AtomicU64::new(0),
            upper: AtomicU64::new(0),
            refresh: Mutex::new(()),
            lease_size,
            service,
        })
    }

    /// Dispenses the next globally unique id.
    ///
    /// Blocks only the calling thread, and only while a lease refresh is in
    /// flight. A remote failure propagates to the caller; the allocator
    /// itself never retries.
    pub fn next_id(&self) -> Result<InnerId> {
        loop {
            let seen = self.current.load(Ordering::Acquire);
            if seen < self.upper.load(Ordering::Acquire) {
                if self
                    .current
                    .compare_exchange(seen, seen + 1, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    return Ok(InnerId(seen));
                }
                // Lost the race for this value; take the next one.
                continue;
            }
            self.refresh_lease()?;
        }
    }

    /// Ids remaining in the held lease. Observability only; the value is
    /// stale the moment it is read.
    pub fn remaining(&self) -> u64 {
        self.upper
            .load(Ordering::Acquire)
            .saturating_sub(self.current.load(Ordering::Acquire))
    }

    fn refresh_lease(&self) -> Result<()> {
        let _guard = self.refresh.lock();
        // Double-checked: another thread may have refreshed while this one
        // waited on the lock.
        if self.current.load(Ordering::Acquire) < self.upper.load(Ordering::Acquire) {
            return Ok(());
        }
        let start = self.service.allocate(self.lease_size)?;
        debug!(start, size = self.lease_size, "installed fresh id lease");
        // Counter first, bound second. The fast path may observe the new
        // counter with the stale bound and spuriously fall through to the
        // slow path, but never the reverse, which would dispense ids from
        // between the two leases.
        self.current.store(start, Ordering::Release);
        self.upper
            .store(start + u64::from(self.lease_size), Ordering::Release);
        Ok(())
    }
}
