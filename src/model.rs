//! Caller-facing mutation model.
//!
//! Everything here is request-scoped: callers build [`WriteRequest`]s out of
//! keys and property maps, the compiler consumes them, and nothing is kept
//! afterwards. Vertices and edges are addressed by label plus primary-key
//! values, never by internal ids, except for [`EdgeTarget`] which lets a
//! caller reuse ids it already holds from a prior response.

use std::collections::BTreeMap;

use crate::types::{EdgeId, EdgeKind, InnerId};

/// Declared value type of a property column.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DataType {
    Bool,
    Int,
    Float,
    Text,
    Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl PropertyValue {
    pub fn data_type(&self) -> DataType {
        match self {
            PropertyValue::Bool(_) => DataType::Bool,
            PropertyValue::Int(_) => DataType::Int,
            PropertyValue::Float(_) => DataType::Float,
            PropertyValue::Text(_) => DataType::Text,
            PropertyValue::Bytes(_) => DataType::Bytes,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<Vec<u8>> for PropertyValue {
    fn from(value: Vec<u8>) -> Self {
        PropertyValue::Bytes(value)
    }
}

/// BTreeMap so iteration order is deterministic regardless of insertion order.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// Logical vertex address: label plus primary-key property values.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexKey {
    pub label: String,
    pub primary_key: PropertyMap,
}

impl VertexKey {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            primary_key: PropertyMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.primary_key.insert(name.into(), value.into());
        self
    }
}

/// Logical edge address. `inner` absent means "any/new": required for
/// update and delete of a specific instance, ignored for overwrite where a
/// fresh discriminator is allocated.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeKey {
    pub label: String,
    pub src: VertexKey,
    pub dst: VertexKey,
    pub inner: Option<InnerId>,
}

impl EdgeKey {
    pub fn new(label: impl Into<String>, src: VertexKey, dst: VertexKey) -> Self {
        Self {
            label: label.into(),
            src,
            dst,
            inner: None,
        }
    }

    pub fn instance(mut self, inner: InnerId) -> Self {
        self.inner = Some(inner);
        self
    }
}

/// Already-resolved edge address, for callers holding internal ids from a
/// prior response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeTarget {
    pub kind: EdgeKind,
    pub id: EdgeId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordKey {
    Vertex(VertexKey),
    Edge(EdgeKey),
    ResolvedEdge(EdgeTarget),
}

/// Mutation payload: an address plus the properties to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRecord {
    pub key: RecordKey,
    pub properties: PropertyMap,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MutationKind {
    OverwriteVertex,
    UpdateVertex,
    DeleteVertex,
    OverwriteEdge,
    UpdateEdge,
    DeleteEdge,
}

impl MutationKind {
    pub fn is_vertex(self) -> bool {
        matches!(
            self,
            MutationKind::OverwriteVertex | MutationKind::UpdateVertex | MutationKind::DeleteVertex
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteRequest {
    pub kind: MutationKind,
    pub record: DataRecord,
}

impl WriteRequest {
    pub fn new(kind: MutationKind, key: RecordKey, properties: PropertyMap) -> Self {
        Self {
            kind,
            record: DataRecord { key, properties },
        }
    }

    pub fn overwrite_vertex(key: VertexKey, properties: PropertyMap) -> Self {
        Self::new(MutationKind::OverwriteVertex, RecordKey::Vertex(key), properties)
    }

    pub fn update_vertex(key: VertexKey, properties: PropertyMap) -> Self {
        Self::new(MutationKind::UpdateVertex, RecordKey::Vertex(key), properties)
    }

    pub fn delete_vertex(key: VertexKey) -> Self {
        Self::new(MutationKind::DeleteVertex, RecordKey::Vertex(key), PropertyMap::new())
    }

    pub fn overwrite_edge(key: EdgeKey, properties: PropertyMap) -> Self {
        Self::new(MutationKind::OverwriteEdge, RecordKey::Edge(key), properties)
    }

    pub fn update_edge(key: EdgeKey, properties: PropertyMap) -> Self {
        Self::new(MutationKind::UpdateEdge, RecordKey::Edge(key), properties)
    }

    pub fn delete_edge(key: EdgeKey) -> Self {
        Self::new(MutationKind::DeleteEdge, RecordKey::Edge(key), PropertyMap::new())
    }
}

/// Builds a [`PropertyMap`] from `(name, value)` pairs.
pub fn props<I, K, V>(pairs: I) -> PropertyMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<PropertyValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
