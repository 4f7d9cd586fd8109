use crate::bloomfilter::BloomFilter;
use value::{ColumnSource, JoinLayout, SideLayout, Value};

/// Which side of the join is the build side for this `ChunkFilter` -- i.e.
/// which side's join keys were used to populate it, and therefore which
/// side's *probe* chunks it can reject (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildSide {
    Left,
    Right,
}

/// A bloom-backed set of probe-side chunk origins, derived from the build
/// side's join keys.
///
/// For each build-side join key that maps to a dimension *on the probe
/// side*, `record` computes that probe dimension's chunk origin
/// (`floor((key - origin) / chunkSize) * chunkSize + origin`) and inserts
/// it. `containsChunk` then rejects any probe chunk whose origin never
/// showed up on the build side. If no join key maps to a probe dimension at
/// all, the filter is a pass-through (every chunk is kept) -- there is
/// nothing about chunk placement the build side could have told us.
#[derive(Debug, Clone)]
pub struct ChunkFilter {
    build_side: BuildSide,
    /// For each join-key position, the probe-side dimension index and its
    /// `(start, chunk_interval)` if that key maps to a probe dimension.
    probe_dims: Vec<Option<(usize, i64, i64)>>,
    filter: BloomFilter,
    pass_through: bool,
}

impl ChunkFilter {
    pub fn new(build_side: BuildSide, layout: &JoinLayout, bloom_size_bits: usize) -> Self {
        let probe_side: &SideLayout = match build_side {
            BuildSide::Left => &layout.right,
            BuildSide::Right => &layout.left,
        };
        let mut probe_dims = Vec::with_capacity(layout.num_keys);
        let mut any = false;
        for i in 0..layout.num_keys {
            match probe_side.columns.get(i) {
                Some(ColumnSource::Dimension(_)) => {
                    // Dimension bounds are attached by the caller via
                    // `attach_dimension_bounds`, since `SideLayout` alone
                    // does not carry dimension start/chunk_interval.
                    probe_dims.push(None);
                    any = true;
                }
                _ => probe_dims.push(None),
            }
        }
        Self {
            build_side,
            probe_dims,
            filter: BloomFilter::new(bloom_size_bits),
            pass_through: !any,
        }
    }

    /// Supplies the probe-side dimension `(start, chunk_interval)` for a
    /// given join-key position that a prior `new()` call found mapped to a
    /// dimension. Called once per matching key during setup.
    pub fn set_probe_dimension(&mut self, key_pos: usize, dim_idx: usize, start: i64, chunk_interval: i64) {
        if key_pos < self.probe_dims.len() {
            self.probe_dims[key_pos] = Some((dim_idx, start, chunk_interval));
        }
    }

    pub fn is_pass_through(&self) -> bool {
        self.pass_through
    }

    /// Records the probe-side chunk origin a build-side tuple's keys would
    /// land in, for every key that maps to a probe dimension.
    pub fn record(&mut self, keys: &[Value]) {
        if self.pass_through {
            return;
        }
        if let Some(origin) = self.origin_for_keys(keys) {
            self.filter.add_data(&origin);
        }
    }

    /// `true` if a probe chunk whose lower-corner coordinates are
    /// `chunk_origin` might contain a matching row. Never a false
    /// negative.
    pub fn contains_chunk(&self, chunk_origin: &[i64]) -> bool {
        if self.pass_through {
            return true;
        }
        match self.origin_bytes_from_chunk(chunk_origin) {
            Some(bytes) => self.filter.has_data(&bytes),
            None => true,
        }
    }

    fn origin_for_keys(&self, keys: &[Value]) -> Option<Vec<u8>> {
        let mut buf = Vec::new();
        let mut touched = false;
        for (pos, dim) in self.probe_dims.iter().enumerate() {
            if let Some((_, start, chunk_interval)) = dim {
                let k = keys.get(pos)?;
                let v = match k {
                    Value::Int32(v) => *v as i64,
                    Value::Int64(v) => *v,
                    _ => return None,
                };
                let origin = ((v - start).div_euclid(*chunk_interval)) * chunk_interval + start;
                buf.extend_from_slice(&origin.to_le_bytes());
                touched = true;
            }
        }
        touched.then_some(buf)
    }

    fn origin_bytes_from_chunk(&self, chunk_origin: &[i64]) -> Option<Vec<u8>> {
        let mut buf = Vec::new();
        let mut touched = false;
        for dim in self.probe_dims.iter() {
            if let Some((dim_idx, _, _)) = dim {
                let v = *chunk_origin.get(*dim_idx)?;
                buf.extend_from_slice(&v.to_le_bytes());
                touched = true;
            }
        }
        touched.then_some(buf)
    }

    pub fn build_side(&self) -> BuildSide {
        self.build_side
    }

    pub fn bloom(&self) -> &BloomFilter {
        &self.filter
    }

    pub fn bloom_mut(&mut self) -> &mut BloomFilter {
        &mut self.filter
    }
}
