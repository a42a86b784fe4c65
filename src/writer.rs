//! Writer-facing entry point of the write path.
//!
//! [`GraphWriter`] wires the compiler, allocator, router and snapshot
//! tracker together behind three calls: `write` to submit a batch, `flush`
//! to block until a version is visible, and `confirm_applied` for the
//! confirmation channel to report progress. One instance serves many
//! threads; the only shared state is in the allocator, the tracker and the
//! session counter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::alloc::{IdAllocator, LeaseService};
use crate::compiler::{self, OperationBatch};
use crate::config::Config;
use crate::error::{Result, WriteError};
use crate::model::WriteRequest;
use crate::router::{self, SessionFactory, SessionId};
use crate::schema::SchemaProvider;
use crate::snapshot::SnapshotTracker;
use crate::types::{QueueIndex, SnapshotVersion};

/// Remote ingestion sink. Accepts a finished operation batch on a queue and
/// returns the snapshot version assigned to it. Failures surface as
/// [`WriteError::Submission`]; retry policy belongs to the transport, not
/// to this crate.
pub trait IngestionGateway: Send + Sync {
    fn submit(&self, queue: QueueIndex, batch: OperationBatch) -> Result<SnapshotVersion>;
}

pub struct GraphWriter {
    schema: Arc<dyn SchemaProvider>,
    gateway: Arc<dyn IngestionGateway>,
    allocator: IdAllocator,
    tracker: SnapshotTracker,
    sessions: SessionFactory,
    config: Config,
    /// Highest version this instance itself produced; `flush_latest` keys
    /// off it rather than off cluster-wide acceptance.
    last_version: AtomicU64,
}

impl GraphWriter {
    pub fn new(
        config: Config,
        schema: Arc<dyn SchemaProvider>,
        lease: Arc<dyn LeaseService>,
        gateway: Arc<dyn IngestionGateway>,
    ) -> Result<Self> {
        config.validate()?;
        let allocator = IdAllocator::new(lease, config.lease_size)?;
        let sessions = SessionFactory::new(config.writer_name.clone());
        Ok(Self {
            schema,
            gateway,
            allocator,
            tracker: SnapshotTracker::new(),
            sessions,
            config,
            last_version: AtomicU64::new(0),
        })
    }

    /// Opens a new write session. All writes issued under one session land
    /// on the same queue and observe program order at the ingestion point.
    pub fn open_session(&self) -> SessionId {
        self.sessions.open_session()
    }

    /// Compiles, routes and submits one batch of logical mutations,
    /// returning the snapshot version the gateway assigned.
    ///
    /// Compilation failures abort before any remote call; the cluster never
    /// sees a partially valid batch.
    pub fn write(
        &self,
        session: &SessionId,
        requests: &[WriteRequest],
    ) -> Result<SnapshotVersion> {
        if requests.is_empty() {
            return Err(WriteError::InvalidArgument("empty write batch".into()));
        }
        let schema = self.schema.current();
        let batch = compiler::compile(&schema, &self.allocator, requests)?;
        let queue = router::route_for_session(session, self.config.queue_count)?;
        let ops = batch.len();
        let version = self.gateway.submit(queue, batch)?;
        self.tracker.on_batch_accepted(version);
        self.last_version.fetch_max(version.0, Ordering::AcqRel);
        debug!(
            session = %session,
            queue = queue.0,
            version = version.0,
            ops,
            "submitted write batch"
        );
        Ok(version)
    }

    /// Blocks until `version` is confirmed applied cluster-wide, or the
    /// timeout elapses. A `false` return is an expected outcome under slow
    /// replication, not corruption; callers may re-wait or proceed
    /// optimistically.
    pub fn flush(&self, version: SnapshotVersion, timeout: Duration) -> bool {
        self.tracker.await_version(version, timeout)
    }

    /// Like [`flush`](Self::flush), for the highest version this instance
    /// has produced. Trivially true when nothing was written yet.
    pub fn flush_latest(&self, timeout: Duration) -> bool {
        let latest = self.last_version.load(Ordering::Acquire);
        if latest == 0 {
            return true;
        }
        self.tracker.await_version(SnapshotVersion(latest), timeout)
    }

    /// Confirmation-channel entry point; versions must arrive in
    /// non-decreasing order.
    pub fn confirm_applied(&self, version: SnapshotVersion) {
        self.tracker.notify_applied(version);
    }

    pub fn tracker(&self) -> &SnapshotTracker {
        &self.tracker
    }

    /// Highest version this instance has produced.
    pub fn last_version(&self) -> SnapshotVersion {
        SnapshotVersion(self.last_version.load(Ordering::Acquire))
    }
}
