//! Random-access cursor over a sorted tuple stream (§4.7), used by the
//! merge kernel's rewind (`engine::sortmerge_driver`) to re-walk a
//! duplicate-key run on one side once per matching row on the other.
//!
//! The original backs this with a chunk-at-a-time array iterator and a
//! fast path that reuses the current chunk when `setIdx` stays inside it.
//! This port keeps the whole sorted side as one in-memory `Vec<Tuple>`
//! (materialized by `ExternalSorter`/`TupleWriter` upstream), so every
//! index is already O(1); the chunk-reuse fast path collapses into the
//! general case and isn't worth a separate code path here.
use value::{JoinError, JoinResult, Tuple};

pub struct SortedCursor<'a> {
    rows: &'a [Tuple],
    idx: usize,
}

impl<'a> SortedCursor<'a> {
    pub fn new(rows: &'a [Tuple]) -> Self {
        Self { rows, idx: 0 }
    }

    pub fn end(&self) -> bool {
        self.idx >= self.rows.len()
    }

    pub fn tuple(&self) -> JoinResult<&'a Tuple> {
        self.rows.get(self.idx).ok_or_else(|| JoinError::Invariant("cursor access past end".to_string()))
    }

    pub fn next(&mut self) -> JoinResult<()> {
        if self.end() {
            return Err(JoinError::Invariant("cursor iterating past end".to_string()));
        }
        self.idx += 1;
        Ok(())
    }

    pub fn get_idx(&self) -> usize {
        self.idx
    }

    /// Jumps to absolute row index `i`. Any non-negative `i` is accepted,
    /// including `i == rows.len()` (an `end()` position).
    pub fn set_idx(&mut self, i: usize) {
        self.idx = i;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use value::Value;

    fn rows() -> Vec<Tuple> {
        (0..5).map(|i| vec![Value::Int32(i)]).collect()
    }

    #[test]
    fn next_advances_and_end_detects_past_last() {
        let data = rows();
        let mut c = SortedCursor::new(&data);
        for i in 0..5 {
            assert!(!c.end());
            assert_eq!(c.tuple().unwrap()[0], Value::Int32(i));
            c.next().unwrap();
        }
        assert!(c.end());
        assert!(c.next().is_err());
    }

    #[test]
    fn set_idx_jumps_and_reports_back_via_get_idx() {
        let data = rows();
        let mut c = SortedCursor::new(&data);
        c.set_idx(3);
        assert_eq!(c.get_idx(), 3);
        assert_eq!(c.tuple().unwrap()[0], Value::Int32(3));
        c.set_idx(5);
        assert!(c.end());
    }
}
