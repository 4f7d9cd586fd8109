//! Wires a [`ChunkFilter`] to the probe side's actual dimension bounds.
//!
//! `ChunkFilter::new` alone only knows *which* join-key positions land on a
//! probe dimension (that's derivable from the resolved [`JoinLayout`]
//! alone); it still needs each such dimension's `(start, chunk_interval)`
//! to compute chunk origins, and those live on the probe side's
//! [`Schema`], which the filter type deliberately doesn't depend on (so
//! `bloom` stays free of the schema/reader data model). This glue lives in
//! `engine` because it is the one crate that already depends on both.

use bloom::{BuildSide, ChunkFilter};
use value::{ColumnSource, JoinLayout, Schema};

pub fn build_chunk_filter(build_side: BuildSide, layout: &JoinLayout, probe_schema: &Schema, bloom_bits: usize) -> ChunkFilter {
    let mut cf = ChunkFilter::new(build_side, layout, bloom_bits);
    let probe_layout = match build_side {
        BuildSide::Left => &layout.right,
        BuildSide::Right => &layout.left,
    };
    for (key_pos, col) in probe_layout.columns.iter().take(layout.num_keys).enumerate() {
        if let ColumnSource::Dimension(dim_idx) = col {
            if let Some(d) = probe_schema.dimensions.get(*dim_idx) {
                cf.set_probe_dimension(key_pos, *dim_idx, d.start, d.chunk_interval);
            }
        }
    }
    cf
}
