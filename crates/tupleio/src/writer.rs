//! The three output shapes a tuple stream can be written into (§4.5
//! Writer), grounded on the original's `ArrayWriterMode` template
//! (`examples/original_source/ArrayWriter.h`): rather than a
//! mode-parameterized template, this is a small enum plus one struct that
//! branches on it, since Rust has no zero-cost template instantiation for
//! three near-identical variants worth the trait-object overhead here.
//!
//! Positions are logical row coordinates, not physical chunk boundaries --
//! chunking a result array is the host's concern (§6 Output); this crate
//! only decides, for each tuple, which coordinate it lands at.

use crate::partition::hash_partition_target;
use value::Tuple;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterMode {
    /// First phase: tag every tuple with its origin instance and a running
    /// row number. The hash column has already been attached by the caller
    /// before tuples reach the writer.
    PreSort,
    /// Second phase: route each tuple to its target instance by the hash
    /// column already present at `tuple[hash_pos]`.
    SplitOnHash,
    /// Final phase: tag every tuple with this instance and a running row
    /// number; the caller has already applied any post-join predicate.
    Output,
}

/// One written row: its logical position plus the tuple, with the
/// empty-tag `true` value appended as the final output attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenRow {
    pub position: Vec<i64>,
    pub tuple: Tuple,
}

/// Drives the position assignment for one of the three writer modes.
pub struct TupleWriter {
    mode: WriterMode,
    my_instance_id: i64,
    num_instances: usize,
    hash_pos: usize,
    num_hash_buckets: u32,
    row_no: i64,
    rows: Vec<WrittenRow>,
}

impl TupleWriter {
    /// `num_hash_buckets` is only meaningful for [`WriterMode::SplitOnHash`]
    /// (it is `B`, the bucket count from the memory-limit table, §6); other
    /// modes ignore it.
    pub fn new(mode: WriterMode, my_instance_id: usize, num_instances: usize, hash_pos: usize, num_hash_buckets: u32) -> Self {
        Self {
            mode,
            my_instance_id: my_instance_id as i64,
            num_instances: num_instances.max(1),
            hash_pos,
            num_hash_buckets,
            row_no: 0,
            rows: Vec::new(),
        }
    }

    /// Appends `tuple` with the empty-tag attribute and this mode's
    /// position assignment. The caller is responsible for any filtering
    /// (null-key drop, post-join predicate) before calling this.
    pub fn write_tuple(&mut self, mut tuple: Tuple) {
        tuple.push(value::Value::Bool(true));

        let position = match self.mode {
            WriterMode::PreSort => {
                let p = vec![0, self.my_instance_id, self.row_no];
                self.row_no += 1;
                p
            }
            WriterMode::Output => {
                let p = vec![self.my_instance_id, self.row_no];
                self.row_no += 1;
                p
            }
            WriterMode::SplitOnHash => {
                let hash = match &tuple[self.hash_pos] {
                    value::Value::Int64(h) => *h as u32,
                    value::Value::Int32(h) => *h as u32,
                    other => panic!("split-on-hash tuple's hash column is not integral: {other:?}"),
                };
                let target = hash_partition_target(hash, self.num_instances, self.num_hash_buckets);
                if target as i64 != self.target_position() {
                    self.row_no = 0;
                }
                let p = vec![target as i64, self.my_instance_id, self.row_no];
                self.row_no += 1;
                p
            }
        };
        self.rows.push(WrittenRow { position, tuple });
    }

    fn target_position(&self) -> i64 {
        self.rows.last().map(|r| r.position[0]).unwrap_or(-1)
    }

    pub fn finalize(self) -> Vec<WrittenRow> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use value::Value;

    #[test]
    fn pre_sort_tags_origin_instance_and_increments_row() {
        let mut w = TupleWriter::new(WriterMode::PreSort, 3, 4, 1, 16);
        w.write_tuple(vec![Value::Int32(1), Value::Int64(10)]);
        w.write_tuple(vec![Value::Int32(2), Value::Int64(11)]);
        let rows = w.finalize();
        assert_eq!(rows[0].position, vec![0, 3, 0]);
        assert_eq!(rows[1].position, vec![0, 3, 1]);
        assert_eq!(*rows[0].tuple.last().unwrap(), Value::Bool(true));
    }

    #[test]
    fn split_on_hash_routes_by_break_and_resets_row_no() {
        // 4 instances, 16 buckets -> break_interval = 4, breaks = [4, 8, 12]
        let mut w = TupleWriter::new(WriterMode::SplitOnHash, 0, 4, 1, 16);
        w.write_tuple(vec![Value::Int32(0), Value::Int64(1)]); // target 0
        w.write_tuple(vec![Value::Int32(0), Value::Int64(2)]); // target 0
        w.write_tuple(vec![Value::Int32(0), Value::Int64(9)]); // target 2
        let rows = w.finalize();
        assert_eq!(rows[0].position[0], 0);
        assert_eq!(rows[1].position[0], 0);
        assert_eq!(rows[1].position[2], 1); // second row to target 0
        assert_eq!(rows[2].position[0], 2);
        assert_eq!(rows[2].position[2], 0); // first row to target 2, row_no reset
    }

    #[test]
    fn output_mode_tags_this_instance() {
        let mut w = TupleWriter::new(WriterMode::Output, 2, 4, 0, 0);
        w.write_tuple(vec![Value::Int32(1)]);
        let rows = w.finalize();
        assert_eq!(rows[0].position, vec![2, 0]);
    }
}
