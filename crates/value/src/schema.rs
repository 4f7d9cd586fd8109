//! Schema description and the reader-side key/column mapping (§3 "Key
//! mapping", §6 "Input arrays").
//!
//! This is the data-model half of the external "Input arrays" contract: a
//! [`Schema`] describes one side's attributes and dimensions; a
//! [`SideLayout`] is the *resolved* mapping from those source columns into a
//! tuple's fixed positions, built once by `config::resolve` and then reused
//! by the reader for every cell.

use crate::error::{JoinError, JoinResult};
use crate::value::TypeId;

/// One schema attribute: a named, typed, possibly-nullable column.
#[derive(Debug, Clone)]
pub struct AttributeDesc {
    pub name: String,
    pub type_id: TypeId,
    pub nullable: bool,
}

/// One schema dimension: a named, bounded, chunked coordinate axis.
#[derive(Debug, Clone)]
pub struct DimensionDesc {
    pub name: String,
    pub start: i64,
    pub end: i64,
    pub chunk_interval: i64,
}

/// One side's schema: attributes followed by dimensions.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub attributes: Vec<AttributeDesc>,
    pub dimensions: Vec<DimensionDesc>,
}

impl Schema {
    /// Resolves a source column ordinal per §6's convention: non-negative
    /// ordinals index attributes; negative ordinals index dimensions,
    /// counting down from -1 (`-1` => dimension 0, `-2` => dimension 1, …).
    pub fn resolve_ordinal(&self, ordinal: i64) -> JoinResult<ColumnSource> {
        if ordinal >= 0 {
            let idx = ordinal as usize;
            if idx >= self.attributes.len() {
                return Err(JoinError::Bounds(ordinal));
            }
            Ok(ColumnSource::Attribute(idx))
        } else {
            let idx = (-ordinal - 1) as usize;
            if idx >= self.dimensions.len() {
                return Err(JoinError::Bounds(ordinal));
            }
            Ok(ColumnSource::Dimension(idx))
        }
    }

    /// Resolves a column name against attributes first, then dimensions.
    /// A name that matches more than one column in the same namespace is
    /// ambiguous (E-CONFIG); a name matching nothing is also E-CONFIG.
    pub fn resolve_name(&self, name: &str) -> JoinResult<ColumnSource> {
        let attr_hits: Vec<usize> = self
            .attributes
            .iter()
            .enumerate()
            .filter(|(_, a)| a.name == name)
            .map(|(i, _)| i)
            .collect();
        if attr_hits.len() > 1 {
            return Err(JoinError::Config(format!("column name '{name}' is ambiguous")));
        }
        if let Some(&idx) = attr_hits.first() {
            return Ok(ColumnSource::Attribute(idx));
        }

        let dim_hits: Vec<usize> = self
            .dimensions
            .iter()
            .enumerate()
            .filter(|(_, d)| d.name == name)
            .map(|(i, _)| i)
            .collect();
        if dim_hits.len() > 1 {
            return Err(JoinError::Config(format!("column name '{name}' is ambiguous")));
        }
        if let Some(&idx) = dim_hits.first() {
            return Ok(ColumnSource::Dimension(idx));
        }

        Err(JoinError::Config(format!("unknown column name '{name}'")))
    }

    pub fn attribute_type(&self, idx: usize) -> Option<TypeId> {
        self.attributes.get(idx).map(|a| a.type_id)
    }
}

/// Where one tuple position's value is pulled from when reading a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnSource {
    Attribute(usize),
    Dimension(usize),
}

/// One side's resolved tuple layout: which source column (attribute or
/// dimension) lands at each tuple position. `columns[0..num_keys]` are the
/// join keys in canonical order; the rest is payload.
#[derive(Debug, Clone)]
pub struct SideLayout {
    pub num_keys: usize,
    pub columns: Vec<ColumnSource>,
}

impl SideLayout {
    pub fn tuple_size(&self) -> usize {
        self.columns.len()
    }
}

/// The full resolved layout for one join invocation.
#[derive(Debug, Clone)]
pub struct JoinLayout {
    pub num_keys: usize,
    pub left: SideLayout,
    pub right: SideLayout,
}

impl JoinLayout {
    /// Output tuple width: `leftTupleSize + rightTupleSize - numKeys`.
    pub fn output_width(&self) -> usize {
        self.left.tuple_size() + self.right.tuple_size() - self.num_keys
    }
}

/// One row of a host-provided chunked array: attribute values plus the
/// dimension coordinates the row sits at (§6 "Input arrays").
#[derive(Debug, Clone)]
pub struct Cell {
    pub attributes: Vec<crate::Value>,
    pub coordinates: Vec<i64>,
}

/// The chunked-cell-iterator contract a host array exposes (§6). Chunks are
/// visited in chunk-major order; `chunk_origin` is the coordinate vector of
/// a chunk's lower corner, consulted by the [`bloom::ChunkFilter`] to skip
/// chunks that cannot match (§4.3). `bloom` does not depend on this crate's
/// I/O traits, so this lives here rather than there.
pub trait InputArray {
    /// Iterates chunk origins along with that chunk's cells, in an
    /// unspecified per-chunk order.
    fn chunks(&self) -> Box<dyn Iterator<Item = (Vec<i64>, Vec<Cell>)> + '_>;

    fn schema(&self) -> &Schema;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema {
            attributes: vec![
                AttributeDesc { name: "a".into(), type_id: TypeId::Int32, nullable: false },
                AttributeDesc { name: "b".into(), type_id: TypeId::Str, nullable: true },
            ],
            dimensions: vec![DimensionDesc { name: "x".into(), start: 0, end: 99, chunk_interval: 10 }],
        }
    }

    #[test]
    fn resolve_ordinal_splits_attrs_and_dims() {
        let s = schema();
        assert_eq!(s.resolve_ordinal(0).unwrap(), ColumnSource::Attribute(0));
        assert_eq!(s.resolve_ordinal(-1).unwrap(), ColumnSource::Dimension(0));
        assert!(s.resolve_ordinal(5).is_err());
        assert!(s.resolve_ordinal(-2).is_err());
    }

    #[test]
    fn resolve_name_prefers_attributes() {
        let s = schema();
        assert_eq!(s.resolve_name("a").unwrap(), ColumnSource::Attribute(0));
        assert_eq!(s.resolve_name("x").unwrap(), ColumnSource::Dimension(0));
        assert!(s.resolve_name("nope").is_err());
    }

    #[test]
    fn resolve_name_rejects_duplicates() {
        let mut s = schema();
        s.attributes.push(AttributeDesc { name: "a".into(), type_id: TypeId::Int32, nullable: false });
        assert!(s.resolve_name("a").is_err());
    }
}
