//! Versioned schema snapshots.
//!
//! The schema is an explicitly passed handle, not ambient state: every
//! compile call receives the snapshot it should resolve labels against, and
//! concurrent schema changes simply produce a newer snapshot from the
//! provider. A snapshot is immutable once built.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{Result, WriteError};
use crate::model::DataType;
use crate::types::{LabelId, PropId, SnapshotVersion};

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    pub id: PropId,
    pub name: String,
    pub data_type: DataType,
    /// Whether this property participates in the label's primary key.
    pub primary_key: bool,
}

/// Vertex label definition. Properties keep declared order; primary-key
/// columns hash in that order, so it is part of vertex identity.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexLabelDef {
    pub id: LabelId,
    pub name: String,
    properties: Vec<PropertyDef>,
}

impl VertexLabelDef {
    pub fn properties(&self) -> &[PropertyDef] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Primary-key definitions in declared order.
    pub fn primary_keys(&self) -> impl Iterator<Item = &PropertyDef> {
        self.properties.iter().filter(|p| p.primary_key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLabelDef {
    pub id: LabelId,
    pub name: String,
    properties: Vec<PropertyDef>,
}

impl EdgeLabelDef {
    pub fn properties(&self) -> &[PropertyDef] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Immutable view of the schema as of one snapshot version.
#[derive(Debug, Clone)]
pub struct SchemaSnapshot {
    version: SnapshotVersion,
    vertex_labels: FxHashMap<String, VertexLabelDef>,
    edge_labels: FxHashMap<String, EdgeLabelDef>,
    edge_label_names: FxHashMap<LabelId, String>,
}

impl SchemaSnapshot {
    pub fn builder(version: SnapshotVersion) -> SchemaBuilder {
        SchemaBuilder {
            version,
            next_label: 1,
            next_prop: 1,
            vertex_labels: Vec::new(),
            edge_labels: Vec::new(),
        }
    }

    pub fn version(&self) -> SnapshotVersion {
        self.version
    }

    pub fn vertex_label(&self, name: &str) -> Result<&VertexLabelDef> {
        self.vertex_labels
            .get(name)
            .ok_or_else(|| WriteError::SchemaNotFound(format!("vertex label \"{name}\"")))
    }

    pub fn edge_label(&self, name: &str) -> Result<&EdgeLabelDef> {
        self.edge_labels
            .get(name)
            .ok_or_else(|| WriteError::SchemaNotFound(format!("edge label \"{name}\"")))
    }

    /// Reverse lookup for already-resolved edge addresses.
    pub fn edge_label_by_id(&self, id: LabelId) -> Result<&EdgeLabelDef> {
        self.edge_label_names
            .get(&id)
            .and_then(|name| self.edge_labels.get(name))
            .ok_or_else(|| WriteError::SchemaNotFound(format!("edge label id {id}")))
    }
}

/// Source of the current schema snapshot. In production this fronts the
/// cluster metadata service; tests assemble snapshots directly.
pub trait SchemaProvider: Send + Sync {
    fn current(&self) -> Arc<SchemaSnapshot>;
}

/// Provider that always serves one fixed snapshot.
pub struct StaticProvider {
    snapshot: Arc<SchemaSnapshot>,
}

impl StaticProvider {
    pub fn new(snapshot: SchemaSnapshot) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
        }
    }
}

impl SchemaProvider for StaticProvider {
    fn current(&self) -> Arc<SchemaSnapshot> {
        self.snapshot.clone()
    }
}

/// Assembles a [`SchemaSnapshot`], assigning label and property ids in
/// declaration order.
pub struct SchemaBuilder {
    version: SnapshotVersion,
    next_label: u32,
    next_prop: u32,
    vertex_labels: Vec<VertexLabelDef>,
    edge_labels: Vec<EdgeLabelDef>,
}

impl SchemaBuilder {
    pub fn vertex_label(&mut self, name: impl Into<String>) -> LabelBuilder<'_> {
        let def = VertexLabelDef {
            id: LabelId(self.next_label),
            name: name.into(),
            properties: Vec::new(),
        };
        self.next_label += 1;
        self.vertex_labels.push(def);
        let idx = self.vertex_labels.len() - 1;
        LabelBuilder {
            properties: &mut self.vertex_labels[idx].properties,
            next_prop: &mut self.next_prop,
            allow_primary_key: true,
        }
    }

    pub fn edge_label(&mut self, name: impl Into<String>) -> LabelBuilder<'_> {
        let def = EdgeLabelDef {
            id: LabelId(self.next_label),
            name: name.into(),
            properties: Vec::new(),
        };
        self.next_label += 1;
        self.edge_labels.push(def);
        let idx = self.edge_labels.len() - 1;
        LabelBuilder {
            properties: &mut self.edge_labels[idx].properties,
            next_prop: &mut self.next_prop,
            allow_primary_key: false,
        }
    }

    pub fn finish(self) -> SchemaSnapshot {
        let edge_label_names = self
            .edge_labels
            .iter()
            .map(|def| (def.id, def.name.clone()))
            .collect();
        SchemaSnapshot {
            version: self.version,
            vertex_labels: self
                .vertex_labels
                .into_iter()
                .map(|def| (def.name.clone(), def))
                .collect(),
            edge_labels: self
                .edge_labels
                .into_iter()
                .map(|def| (def.name.clone(), def))
                .collect(),
            edge_label_names,
        }
    }
}

/// Adds property columns to one label under construction.
pub struct LabelBuilder<'a> {
    properties: &'a mut Vec<PropertyDef>,
    next_prop: &'a mut u32,
    allow_primary_key: bool,
}

impl LabelBuilder<'_> {
    pub fn property(self, name: impl Into<String>, data_type: DataType) -> Self {
        self.push(name.into(), data_type, false)
    }

    /// Declares a primary-key column. Only vertex labels carry primary keys.
    pub fn primary_key(self, name: impl Into<String>, data_type: DataType) -> Self {
        debug_assert!(self.allow_primary_key, "edge labels have no primary key");
        self.push(name.into(), data_type, true)
    }

    fn push(self, name: String, data_type: DataType, primary_key: bool) -> Self {
        self.properties.push(PropertyDef {
            id: PropId(*self.next_prop),
            name,
            data_type,
            primary_key: primary_key && self.allow_primary_key,
        });
        *self.next_prop += 1;
        self
    }
}
