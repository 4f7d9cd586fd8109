//! Adapts a host [`InputArray`] into a tuple sequence (§4.5 Reader).
//!
//! Per chunk: a [`ChunkFilter`] (if any) can skip the whole chunk before a
//! single cell is touched. Per cell: columns are mapped into tuple position
//! via the side's [`SideLayout`]; a tuple whose key columns contain a null
//! is dropped (keys never join against nulls); a probe-side [`BloomFilter`]
//! (if any) can drop the tuple once its keys are known.

use bloom::{BloomFilter, ChunkFilter};
use value::{Cell, InputArray, JoinResult, SideLayout, Value};

fn cell_to_tuple(layout: &SideLayout, cell: &Cell) -> Value2Tuple {
    let mut tuple = Vec::with_capacity(layout.tuple_size());
    for col in &layout.columns {
        let v = match col {
            value::ColumnSource::Attribute(i) => cell.attributes[*i].clone(),
            value::ColumnSource::Dimension(i) => Value::Int64(cell.coordinates[*i]),
        };
        tuple.push(v);
    }
    tuple
}

type Value2Tuple = Vec<Value>;

/// Lazily reads tuples out of `array`, applying the chunk filter, null-key
/// drop, and optional probe bloom filter in order (§4.5).
pub struct TupleReader<'a> {
    layout: &'a SideLayout,
    chunk_filter: Option<&'a ChunkFilter>,
    probe_bloom: Option<&'a BloomFilter>,
    chunks: Box<dyn Iterator<Item = (Vec<i64>, Vec<Cell>)> + 'a>,
    pending: std::vec::IntoIter<Cell>,
}

impl<'a> TupleReader<'a> {
    pub fn new(
        array: &'a dyn InputArray,
        layout: &'a SideLayout,
        chunk_filter: Option<&'a ChunkFilter>,
        probe_bloom: Option<&'a BloomFilter>,
    ) -> Self {
        Self { layout, chunk_filter, probe_bloom, chunks: array.chunks(), pending: Vec::new().into_iter() }
    }

    fn advance_chunk(&mut self) -> bool {
        for (origin, cells) in self.chunks.by_ref() {
            if let Some(cf) = self.chunk_filter {
                if !cf.contains_chunk(&origin) {
                    continue;
                }
            }
            self.pending = cells.into_iter();
            return true;
        }
        false
    }
}

impl<'a> Iterator for TupleReader<'a> {
    type Item = JoinResult<value::Tuple>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.pending.next() {
                None => {
                    if !self.advance_chunk() {
                        return None;
                    }
                }
                Some(cell) => {
                    let tuple = cell_to_tuple(self.layout, &cell);
                    if tuple[..self.layout.num_keys].iter().any(Value::is_null) {
                        continue;
                    }
                    if let Some(bf) = self.probe_bloom {
                        if !bf.has_tuple(&tuple[..self.layout.num_keys]) {
                            continue;
                        }
                    }
                    return Some(Ok(tuple));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use value::{AttributeDesc, ColumnSource, DimensionDesc, Schema, TypeId};

    struct FakeArray {
        schema: Schema,
        chunks: Vec<(Vec<i64>, Vec<Cell>)>,
    }

    impl InputArray for FakeArray {
        fn chunks(&self) -> Box<dyn Iterator<Item = (Vec<i64>, Vec<Cell>)> + '_> {
            Box::new(self.chunks.clone().into_iter())
        }
        fn schema(&self) -> &Schema {
            &self.schema
        }
    }

    fn schema() -> Schema {
        Schema {
            attributes: vec![AttributeDesc { name: "k".into(), type_id: TypeId::Int32, nullable: true }],
            dimensions: vec![DimensionDesc { name: "x".into(), start: 0, end: 99, chunk_interval: 10 }],
        }
    }

    #[test]
    fn drops_null_key_tuples() {
        let array = FakeArray {
            schema: schema(),
            chunks: vec![(
                vec![0],
                vec![
                    Cell { attributes: vec![Value::Null(TypeId::Int32)], coordinates: vec![0] },
                    Cell { attributes: vec![Value::Int32(7)], coordinates: vec![1] },
                ],
            )],
        };
        let layout = SideLayout { num_keys: 1, columns: vec![ColumnSource::Attribute(0)] };
        let out: Vec<_> = TupleReader::new(&array, &layout, None, None).collect::<JoinResult<Vec<_>>>().unwrap();
        assert_eq!(out, vec![vec![Value::Int32(7)]]);
    }

    #[test]
    fn dimension_sourced_key_reads_coordinate() {
        let array = FakeArray {
            schema: schema(),
            chunks: vec![(vec![0], vec![Cell { attributes: vec![Value::Int32(1)], coordinates: vec![42] }])],
        };
        let layout = SideLayout { num_keys: 1, columns: vec![ColumnSource::Dimension(0)] };
        let out: Vec<_> = TupleReader::new(&array, &layout, None, None).collect::<JoinResult<Vec<_>>>().unwrap();
        assert_eq!(out, vec![vec![Value::Int64(42)]]);
    }
}
