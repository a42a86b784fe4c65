//! Translation of logical write requests into internally-addressed
//! operation batches.
//!
//! Compilation is purely computational: labels and properties resolve
//! against the supplied schema snapshot, vertex identities come from the
//! key codec, and fresh edge discriminators come from the id allocator. Any
//! failure aborts the whole batch before a single remote submission happens,
//! so a rejected batch changes no cluster state.
//!
//! Every logical edge mutation expands to a mirrored pair: a forward
//! operation keyed for outgoing-edge lookup and a backward operation keyed
//! for incoming-edge lookup, adjacent in the batch and sharing one edge
//! id, kind and property map. Request order is preserved; nothing is
//! reordered or deduplicated.

use tracing::debug;

use crate::alloc::IdAllocator;
use crate::codec;
use crate::error::{Result, WriteError};
use crate::model::{EdgeKey, MutationKind, PropertyMap, RecordKey, VertexKey, WriteRequest};
use crate::schema::{PropertyDef, SchemaSnapshot, VertexLabelDef};
use crate::types::{EdgeId, EdgeKind, LabelId, VertexId};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum OpKind {
    Overwrite,
    Update,
    Delete,
}

/// Which adjacency index an edge operation feeds.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VertexOp {
    pub kind: OpKind,
    pub label: LabelId,
    pub id: VertexId,
    pub properties: PropertyMap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeOp {
    pub kind: OpKind,
    pub direction: Direction,
    pub edge_kind: EdgeKind,
    pub id: EdgeId,
    pub properties: PropertyMap,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Vertex(VertexOp),
    Edge(EdgeOp),
}

/// Ordered operation sequence handed to the ingestion gateway. Immutable
/// history once compiled; the mirrored halves of an edge mutation are never
/// split across batches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationBatch {
    ops: Vec<Op>,
}

impl OperationBatch {
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Compiles a batch of logical write requests into an [`OperationBatch`].
pub fn compile(
    schema: &SchemaSnapshot,
    allocator: &IdAllocator,
    requests: &[WriteRequest],
) -> Result<OperationBatch> {
    let mut batch = OperationBatch::default();
    for request in requests {
        match request.kind {
            MutationKind::OverwriteVertex => {
                compile_vertex(schema, request, OpKind::Overwrite, &mut batch)?
            }
            MutationKind::UpdateVertex => {
                compile_vertex(schema, request, OpKind::Update, &mut batch)?
            }
            MutationKind::DeleteVertex => {
                compile_vertex(schema, request, OpKind::Delete, &mut batch)?
            }
            MutationKind::OverwriteEdge => {
                compile_edge(schema, allocator, request, OpKind::Overwrite, &mut batch)?
            }
            MutationKind::UpdateEdge => {
                compile_edge(schema, allocator, request, OpKind::Update, &mut batch)?
            }
            MutationKind::DeleteEdge => {
                compile_edge(schema, allocator, request, OpKind::Delete, &mut batch)?
            }
        }
    }
    debug!(
        requests = requests.len(),
        ops = batch.len(),
        "compiled write batch"
    );
    Ok(batch)
}

fn compile_vertex(
    schema: &SchemaSnapshot,
    request: &WriteRequest,
    kind: OpKind,
    batch: &mut OperationBatch,
) -> Result<()> {
    let RecordKey::Vertex(key) = &request.record.key else {
        return Err(WriteError::InvalidArgument(
            "vertex mutation requires a vertex key".into(),
        ));
    };
    let label = schema.vertex_label(&key.label)?;
    // Identity always comes from the key, never from the payload, so a
    // payload can never silently rename a vertex.
    let id = codec::vertex_id(label, &key.primary_key)?;

    let properties = match kind {
        OpKind::Delete => PropertyMap::new(),
        OpKind::Overwrite | OpKind::Update => {
            check_payload(&label.name, label.properties(), &request.record.properties)?;
            reject_primary_key_change(label, key, &request.record.properties)?;
            // Primary-key columns are always persisted alongside the payload.
            let mut merged = request.record.properties.clone();
            for def in label.primary_keys() {
                if let Some(value) = key.primary_key.get(&def.name) {
                    merged.insert(def.name.clone(), value.clone());
                }
            }
            merged
        }
    };

    batch.ops.push(Op::Vertex(VertexOp {
        kind,
        label: label.id,
        id,
        properties,
    }));
    Ok(())
}

fn compile_edge(
    schema: &SchemaSnapshot,
    allocator: &IdAllocator,
    request: &WriteRequest,
    kind: OpKind,
    batch: &mut OperationBatch,
) -> Result<()> {
    let (edge_kind, id, label_name, defs) = match &request.record.key {
        RecordKey::Edge(key) => resolve_edge_key(schema, allocator, key, kind)?,
        RecordKey::ResolvedEdge(target) => {
            let label = schema.edge_label_by_id(target.kind.edge_label)?;
            (target.kind, target.id, label.name.as_str(), label.properties())
        }
        RecordKey::Vertex(_) => {
            return Err(WriteError::InvalidArgument(
                "edge mutation requires an edge key".into(),
            ));
        }
    };

    let properties = match kind {
        OpKind::Delete => PropertyMap::new(),
        OpKind::Overwrite | OpKind::Update => {
            check_payload(label_name, defs, &request.record.properties)?;
            request.record.properties.clone()
        }
    };

    // Mirrored pair: forward for the outgoing-edge index, backward for the
    // incoming-edge index, always adjacent.
    batch.ops.push(Op::Edge(EdgeOp {
        kind,
        direction: Direction::Forward,
        edge_kind,
        id,
        properties: properties.clone(),
    }));
    batch.ops.push(Op::Edge(EdgeOp {
        kind,
        direction: Direction::Backward,
        edge_kind,
        id,
        properties,
    }));
    Ok(())
}

fn resolve_edge_key<'a>(
    schema: &'a SchemaSnapshot,
    allocator: &IdAllocator,
    key: &EdgeKey,
    kind: OpKind,
) -> Result<(EdgeKind, EdgeId, &'a str, &'a [PropertyDef])> {
    let edge_label = schema.edge_label(&key.label)?;
    let src_label = schema.vertex_label(&key.src.label)?;
    let dst_label = schema.vertex_label(&key.dst.label)?;
    let src = codec::vertex_id(src_label, &key.src.primary_key)?;
    let dst = codec::vertex_id(dst_label, &key.dst.primary_key)?;
    let edge_kind = codec::edge_kind(edge_label.id, src_label.id, dst_label.id);

    let inner = match kind {
        // A new instance is being created; discriminate it from any
        // parallel edge of the same kind between the same vertices.
        OpKind::Overwrite => allocator.next_id()?,
        OpKind::Update | OpKind::Delete => key.inner.ok_or_else(|| {
            WriteError::InvalidArgument(format!(
                "edge {} requires an instance discriminator for update/delete",
                key.label
            ))
        })?,
    };

    Ok((
        edge_kind,
        EdgeId { src, dst, inner },
        edge_label.name.as_str(),
        edge_label.properties(),
    ))
}

fn check_payload(label_name: &str, defs: &[PropertyDef], payload: &PropertyMap) -> Result<()> {
    for (name, value) in payload {
        let def = defs.iter().find(|d| d.name == *name).ok_or_else(|| {
            WriteError::PropertyNotFound(format!("{label_name}.{name}"))
        })?;
        if def.data_type != value.data_type() {
            return Err(WriteError::InvalidArgument(format!(
                "property {label_name}.{name} expects {:?}, got {:?}",
                def.data_type,
                value.data_type()
            )));
        }
    }
    Ok(())
}

/// Changing a primary-key property would change the vertex's identity; that
/// is a rename, which the write path does not support. Re-stating the same
/// value is allowed since callers often echo the key back in the payload.
fn reject_primary_key_change(
    label: &VertexLabelDef,
    key: &VertexKey,
    payload: &PropertyMap,
) -> Result<()> {
    for def in label.primary_keys() {
        if let (Some(supplied), Some(keyed)) =
            (payload.get(&def.name), key.primary_key.get(&def.name))
        {
            if supplied != keyed {
                return Err(WriteError::InvalidArgument(format!(
                    "primary key property {}.{} cannot be modified",
                    label.name, def.name
                )));
            }
        }
    }
    Ok(())
}
