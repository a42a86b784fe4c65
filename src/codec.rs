//! Key codec: deterministic derivation of internal identities.
//!
//! Two writers anywhere in the cluster computing an id for the same logical
//! vertex must agree without coordination, so everything here is a pure
//! function of the schema snapshot and the caller-supplied key. Property
//! values go through a canonical byte encoding before hashing so that the
//! hash input is independent of caller representation, and the label id is
//! always part of the input so that two labels sharing identical key values
//! never alias.
//!
//! Hashes are treated as collision-free downstream; no uniqueness check is
//! performed anywhere on the write path.

use smallvec::SmallVec;
use xxhash_rust::xxh64::Xxh64;

use crate::error::{Result, WriteError};
use crate::model::{DataType, PropertyMap, PropertyValue};
use crate::schema::VertexLabelDef;
use crate::types::{EdgeKind, LabelId, VertexId};

/// Seed fixed for the lifetime of a deployment; changing it changes every
/// derived id.
const ID_HASH_SEED: u64 = 0x7465_6e65_6272_6131;

/// Canonical bytes of one property value. Inline capacity covers every
/// fixed-width type and short strings.
pub type ValueBytes = SmallVec<[u8; 24]>;

/// Encodes a value canonically for its declared column type: fixed-width
/// big-endian for numerics, u32 length prefix plus raw bytes for
/// variable-width types.
pub fn encode_value(data_type: DataType, value: &PropertyValue) -> Result<ValueBytes> {
    let mut out = ValueBytes::new();
    match (data_type, value) {
        (DataType::Bool, PropertyValue::Bool(v)) => out.push(*v as u8),
        (DataType::Int, PropertyValue::Int(v)) => out.extend_from_slice(&v.to_be_bytes()),
        (DataType::Float, PropertyValue::Float(v)) => {
            out.extend_from_slice(&v.to_bits().to_be_bytes())
        }
        (DataType::Text, PropertyValue::Text(v)) => {
            out.extend_from_slice(&(v.len() as u32).to_be_bytes());
            out.extend_from_slice(v.as_bytes());
        }
        (DataType::Bytes, PropertyValue::Bytes(v)) => {
            out.extend_from_slice(&(v.len() as u32).to_be_bytes());
            out.extend_from_slice(v);
        }
        (declared, supplied) => {
            return Err(WriteError::InvalidArgument(format!(
                "expected {declared:?} value, got {:?}",
                supplied.data_type()
            )))
        }
    }
    Ok(out)
}

/// Derives the internal vertex id from a label and its primary-key values.
///
/// The hash covers the label id followed by the canonical bytes of every
/// primary-key column in schema-declared order. A declared key column
/// missing from `primary_key` is a caller error.
pub fn vertex_id(label: &VertexLabelDef, primary_key: &PropertyMap) -> Result<VertexId> {
    let mut hasher = Xxh64::new(ID_HASH_SEED);
    hasher.update(&u64::from(label.id.0).to_be_bytes());
    let mut columns = 0usize;
    for def in label.primary_keys() {
        let value = primary_key.get(&def.name).ok_or_else(|| {
            WriteError::PropertyNotFound(format!(
                "primary key \"{}.{}\" missing from vertex key",
                label.name, def.name
            ))
        })?;
        hasher.update(&encode_value(def.data_type, value)?);
        columns += 1;
    }
    if columns == 0 {
        return Err(WriteError::InvalidArgument(format!(
            "vertex label \"{}\" declares no primary key",
            label.name
        )));
    }
    Ok(VertexId(hasher.digest()))
}

/// Resolves the true type of an edge: the label triple, not the edge label
/// alone.
pub fn edge_kind(edge_label: LabelId, src_label: LabelId, dst_label: LabelId) -> EdgeKind {
    EdgeKind {
        edge_label,
        src_label,
        dst_label,
    }
}
