//! # Config
//!
//! Resolves the host's enumerated join options (§6) into a validated
//! [`JoinConfig`] plus a resolved [`value::JoinLayout`], performing every
//! setup-time check before any row is read (§7 policy: E-CONFIG, E-BOUNDS,
//! E-UNSUPPORTED all raise here, never mid-join).
//!
//! Parses and validates every keyword parameter up front, so a bad option
//! never surfaces as a mid-join panic.

mod algorithm;
mod bucket_table;
mod outnames;

pub use algorithm::Algorithm;

use std::collections::HashSet;
use value::{ColumnSource, JoinError, JoinLayout, JoinResult, Schema, SideLayout, TypeId};

/// A source-column reference, before it is resolved against a schema:
/// either an ordinal (§6 `leftIds`/`rightIds` convention) or a name (§6
/// `leftNames`/`rightNames`).
#[derive(Debug, Clone)]
pub enum ColumnRef {
    Ordinal(i64),
    Name(String),
}

/// One side's raw, unresolved configuration: its join-key column list plus
/// which non-key columns to keep.
///
/// `ids` and `names` mirror the host's separate `leftIds`/`leftNames`
/// (or `rightIds`/`rightNames`) options (§6): exactly one must be set, never
/// both -- a host that supplies both gets E-CONFIG, not a silent pick.
#[derive(Debug, Clone, Default)]
pub struct SideSpec {
    pub ids: Option<Vec<i64>>,
    pub names: Option<Vec<String>>,
    /// Non-key columns to retain in output, in order. `None` means "every
    /// non-key attribute, and every non-key dimension iff `keep_dimensions`".
    pub payload: Option<Vec<ColumnRef>>,
}

/// The full, still-unresolved set of options enumerated in §6.
#[derive(Debug, Clone)]
pub struct JoinConfigBuilder {
    pub left: SideSpec,
    pub right: SideSpec,
    pub hash_join_threshold_mb: u64,
    pub chunk_size: i64,
    pub algorithm: Option<Algorithm>,
    pub keep_dimensions: bool,
    pub bloom_filter_size_bits: i64,
    pub filter_columns: Option<Vec<ColumnRef>>,
    pub left_outer: bool,
    pub right_outer: bool,
    pub out_names: Option<Vec<String>>,
}

/// The validated, resolved configuration the engine drives off of.
#[derive(Debug, Clone)]
pub struct JoinConfig {
    pub layout: JoinLayout,
    pub hash_join_threshold_bytes: u64,
    pub num_hash_buckets: u32,
    pub chunk_size: i64,
    pub algorithm: Option<Algorithm>,
    pub keep_dimensions: bool,
    pub bloom_filter_size_bits: i64,
    pub left_outer: bool,
    pub right_outer: bool,
    pub out_names: Vec<String>,
}

impl JoinConfigBuilder {
    /// Resolves and validates every option against the two sides' schemas,
    /// producing an executable [`JoinConfig`]. Order matches the original
    /// constructor: ids/names resolution, then thresholds, then the
    /// algorithm/outer veto, then `outNames`, then the filter check.
    pub fn resolve(self, left_schema: &Schema, right_schema: &Schema) -> JoinResult<JoinConfig> {
        let left_keys = resolve_side_keys("left", &self.left, left_schema)?;
        let right_keys = resolve_side_keys("right", &self.right, right_schema)?;
        if left_keys.len() != right_keys.len() {
            return Err(JoinError::Config(format!(
                "left has {} join keys but right has {}",
                left_keys.len(),
                right_keys.len()
            )));
        }
        check_key_types(&left_keys, left_schema, &right_keys, right_schema)?;

        let left_layout = build_side_layout(&left_keys, &self.left.payload, left_schema, self.keep_dimensions)?;
        let right_layout = build_side_layout(&right_keys, &self.right.payload, right_schema, self.keep_dimensions)?;
        let num_keys = left_keys.len();
        let layout = JoinLayout { num_keys, left: left_layout, right: right_layout };

        if self.hash_join_threshold_mb == 0 {
            return Err(JoinError::Config("hashJoinThreshold must be positive".to_string()));
        }
        let hash_join_threshold_bytes = self.hash_join_threshold_mb * 1024 * 1024; // Q-2: not 1024*1204
        let num_hash_buckets = bucket_table::bucket_count(self.hash_join_threshold_mb);

        if self.chunk_size <= 0 {
            return Err(JoinError::Config("chunkSize must be positive".to_string()));
        }
        if self.bloom_filter_size_bits <= 0 {
            return Err(JoinError::Config("bloomFilterSize must be positive".to_string()));
        }

        if let Some(algo) = self.algorithm {
            // §4.9 rule 5: replicate-that-side is rejected when that side is outer.
            if algo == Algorithm::HashReplicateLeft && self.left_outer {
                return Err(JoinError::Unsupported(
                    "left replicate algorithm cannot be used for left outer join".to_string(),
                ));
            }
            if algo == Algorithm::HashReplicateRight && self.right_outer {
                return Err(JoinError::Unsupported(
                    "right replicate algorithm cannot be used for right outer join".to_string(),
                ));
            }
        }

        let out_names = outnames::resolve(self.out_names, layout.output_width())?;

        if let Some(filter_cols) = &self.filter_columns {
            reject_dimension_filter(filter_cols, &layout)?;
        }

        Ok(JoinConfig {
            layout,
            hash_join_threshold_bytes,
            num_hash_buckets,
            chunk_size: self.chunk_size,
            algorithm: self.algorithm,
            keep_dimensions: self.keep_dimensions,
            bloom_filter_size_bits: self.bloom_filter_size_bits,
            left_outer: self.left_outer,
            right_outer: self.right_outer,
            out_names,
        })
    }
}

/// Resolves one side's `ids`/`names` option pair into key `ColumnSource`s,
/// rejecting the "both set" and "neither set" configuration errors (§6,
/// §7 E-CONFIG "both ids and names set").
fn resolve_side_keys(side_name: &str, spec: &SideSpec, schema: &Schema) -> JoinResult<Vec<ColumnSource>> {
    match (&spec.ids, &spec.names) {
        (Some(_), Some(_)) => Err(JoinError::Config(format!("{side_name}: both ids and names specified"))),
        (Some(ids), None) => ids.iter().map(|o| schema.resolve_ordinal(*o)).collect(),
        (None, Some(names)) => names.iter().map(|n| schema.resolve_name(n)).collect(),
        (None, None) => Err(JoinError::Config(format!("{side_name}: neither ids nor names specified"))),
    }
}

fn resolve_refs(refs: &[ColumnRef], schema: &Schema) -> JoinResult<Vec<ColumnSource>> {
    refs.iter()
        .map(|r| match r {
            ColumnRef::Ordinal(o) => schema.resolve_ordinal(*o),
            ColumnRef::Name(n) => schema.resolve_name(n),
        })
        .collect()
}

fn check_key_types(left: &[ColumnSource], left_schema: &Schema, right: &[ColumnSource], right_schema: &Schema) -> JoinResult<()> {
    for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
        let lt = column_type(l, left_schema);
        let rt = column_type(r, right_schema);
        if lt != rt {
            return Err(JoinError::Config(format!("join key {i} type mismatch: {lt:?} vs {rt:?}")));
        }
    }
    Ok(())
}

fn column_type(col: &ColumnSource, schema: &Schema) -> TypeId {
    match col {
        ColumnSource::Attribute(i) => schema.attribute_type(*i).expect("resolved ordinal is in range"),
        ColumnSource::Dimension(_) => TypeId::Int64,
    }
}

fn build_side_layout(
    keys: &[ColumnSource],
    payload: &Option<Vec<ColumnRef>>,
    schema: &Schema,
    keep_dimensions: bool,
) -> JoinResult<SideLayout> {
    let key_set: HashSet<ColumnSource> = keys.iter().copied().collect();
    let mut columns = keys.to_vec();

    match payload {
        Some(refs) => {
            for c in resolve_refs(refs, schema)? {
                if !key_set.contains(&c) {
                    columns.push(c);
                }
            }
        }
        None => {
            for i in 0..schema.attributes.len() {
                let c = ColumnSource::Attribute(i);
                if !key_set.contains(&c) {
                    columns.push(c);
                }
            }
            if keep_dimensions {
                for i in 0..schema.dimensions.len() {
                    let c = ColumnSource::Dimension(i);
                    if !key_set.contains(&c) {
                        columns.push(c);
                    }
                }
            }
        }
    }

    Ok(SideLayout { num_keys: keys.len(), columns })
}

/// §4.12: a predicate referencing a dimension is rejected at setup,
/// mirroring `ArrayWriter`'s constructor throwing on `BindInfo::BI_COORDINATE`.
fn reject_dimension_filter(filter_columns: &[ColumnRef], layout: &JoinLayout) -> JoinResult<()> {
    for c in filter_columns {
        if let ColumnRef::Ordinal(o) = c {
            if *o < 0 {
                return Err(JoinError::Unsupported("filtering on dimensions not supported".to_string()));
            }
        }
    }
    let _ = layout;
    Ok(())
}
