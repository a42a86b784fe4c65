//! Deterministic routing of batches to write queues and partitions.
//!
//! Two unrelated routers live here. [`route_for_session`] pins every batch
//! of one write session to the same queue so the ingestion point observes
//! that session's program order, while spreading independent sessions for
//! throughput. [`partition_for_key`] maps an internal vertex id to a store
//! partition for offline bulk partitioning of the same key space; the two
//! never need to agree with each other, only with themselves.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use xxhash_rust::xxh64::xxh64;

use crate::error::{Result, WriteError};
use crate::types::{PartitionId, QueueIndex, VertexId};

const SESSION_HASH_SEED: u64 = 0x726f_7574_6572_3031;

/// Logical write session: a client name plus a monotonically assigned
/// sequence number. The sequence number, not the name, drives routing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId {
    name: String,
    seq: u64,
}

impl SessionId {
    pub fn new(name: impl Into<String>, seq: u64) -> Self {
        Self {
            name: name.into(),
            seq,
        }
    }

    /// Parses the `name:seq` wire form.
    pub fn parse(raw: &str) -> Result<Self> {
        let malformed = || WriteError::InvalidArgument(format!("malformed session id \"{raw}\""));
        let (name, seq) = raw.rsplit_once(':').ok_or_else(malformed)?;
        if name.is_empty() {
            return Err(malformed());
        }
        let seq = seq.parse::<u64>().map_err(|_| malformed())?;
        Ok(Self {
            name: name.to_owned(),
            seq,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.seq)
    }
}

impl FromStr for SessionId {
    type Err = WriteError;

    fn from_str(raw: &str) -> Result<Self> {
        SessionId::parse(raw)
    }
}

/// Hands out sessions with increasing sequence numbers for one client name.
pub struct SessionFactory {
    name: String,
    next_seq: AtomicU64,
}

impl SessionFactory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn open_session(&self) -> SessionId {
        SessionId {
            name: self.name.clone(),
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
        }
    }
}

/// Picks the write queue for a session. Queue 0 is reserved for schema/DDL
/// traffic and is never selected for data writes, so the result is always in
/// `[1, queue_count - 1]`.
///
/// A `queue_count` of one or less leaves no data queues at all; that is a
/// fatal configuration error, not something to retry.
pub fn route_for_session(session: &SessionId, queue_count: u16) -> Result<QueueIndex> {
    if queue_count <= 1 {
        return Err(WriteError::InvalidArgument(format!(
            "queue count must exceed 1, got {queue_count}"
        )));
    }
    let hash = xxh64(&session.seq.to_be_bytes(), SESSION_HASH_SEED);
    Ok(QueueIndex((hash % u64::from(queue_count - 1)) as u16 + 1))
}

/// Maps a vertex id to its store partition. Same key, same partition,
/// independent of which queue carried the write.
pub fn partition_for_key(vertex: VertexId, partition_count: u32) -> Result<PartitionId> {
    if partition_count == 0 {
        return Err(WriteError::InvalidArgument(
            "partition count must be positive".into(),
        ));
    }
    Ok(PartitionId((vertex.0 % u64::from(partition_count)) as u32))
}
