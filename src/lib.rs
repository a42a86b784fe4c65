//! Tenebra: the write path of a distributed, sharded property-graph store.
//!
//! Clients submit logical mutations addressed by label and primary-key
//! properties, never by internal ids. This crate turns those mutations into
//! globally-ordered, partition-routed, internally-addressed operation
//! batches and lets callers observe, asynchronously, when a batch has become
//! durably visible cluster-wide. There is no central lock service anywhere
//! on the path: identities are derived by hashing, edge discriminators come
//! from remotely leased id blocks, and visibility is confirmed through a
//! push channel.
//!
//! Storage, query planning, analytical engines and RPC transport live in
//! other services; they are consumed through the collaborator traits
//! [`schema::SchemaProvider`], [`alloc::LeaseService`] and
//! [`writer::IngestionGateway`].

#![forbid(unsafe_code)]

pub mod alloc;
pub mod codec;
pub mod compiler;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod router;
pub mod schema;
pub mod snapshot;
pub mod types;
pub mod writer;

pub use config::Config;
pub use error::{Result, WriteError};
pub use model::{
    DataRecord, DataType, EdgeKey, EdgeTarget, MutationKind, PropertyMap, PropertyValue,
    RecordKey, VertexKey, WriteRequest,
};
pub use router::SessionId;
pub use types::{EdgeId, EdgeKind, InnerId, LabelId, SnapshotVersion, VertexId};
pub use writer::GraphWriter;
