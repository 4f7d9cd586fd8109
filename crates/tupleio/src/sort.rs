//! External-memory sort on `(hash, key₀, …, key_{k-1})` (§4.6). Runs larger
//! than `run_rows` are split, each run sorted in memory and spilled to a
//! tempfile, then merged back with a k-way merge keyed the same way.
//!
//! Stability matters here: the sort-merge driver's hash fallback and the
//! merge kernel's rewind both assume that two tuples with equal `(hash,
//! keys)` keep their relative order from the pre-sort stream. `Vec::sort_by`
//! is already stable, and the k-way merge below breaks ties by run index
//! (ascending) rather than arbitrarily, which preserves the same property
//! across a spill.

use crate::codec::{decode_tuple, encode_tuple};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use tempfile::NamedTempFile;
use value::{compare_keys, JoinError, JoinResult, Tuple};

/// Sorts tuples on `(hash, tuple[..num_keys])`, spilling to disk when the
/// input exceeds `run_rows`. The hash column is always the tuple's last
/// element (`attach_hash` appends it), so its position is read off each
/// tuple rather than fixed -- the two sides of a join keep a different
/// number of payload columns in the common case, so a fixed index would
/// point at the wrong column, or past the end, on whichever side is
/// narrower.
pub struct ExternalSorter {
    num_keys: usize,
    run_rows: usize,
}

impl ExternalSorter {
    /// `run_rows` bounds how many tuples are sorted in memory per spilled
    /// run.
    pub fn new(num_keys: usize, run_rows: usize) -> Self {
        Self { num_keys, run_rows: run_rows.max(1) }
    }

    fn compare(&self, a: &Tuple, b: &Tuple) -> Ordering {
        match a[a.len() - 1].compare(&b[b.len() - 1]) {
            Ordering::Equal => compare_keys(&a[..self.num_keys], &b[..self.num_keys]),
            other => other,
        }
    }

    pub fn sort(&self, tuples: Vec<Tuple>) -> JoinResult<Vec<Tuple>> {
        if tuples.len() <= self.run_rows {
            let mut run = tuples;
            run.sort_by(|a, b| self.compare(a, b));
            return Ok(run);
        }

        let mut runs = Vec::new();
        for chunk in tuples.chunks(self.run_rows) {
            let mut run = chunk.to_vec();
            run.sort_by(|a, b| self.compare(a, b));
            runs.push(self.spill_run(&run)?);
        }
        self.merge_runs(runs)
    }

    fn spill_run(&self, run: &[Tuple]) -> JoinResult<NamedTempFile> {
        let file = NamedTempFile::new().map_err(|e| JoinError::Invariant(format!("spill file create: {e}")))?;
        {
            let mut w = BufWriter::new(file.reopen().map_err(|e| JoinError::Invariant(e.to_string()))?);
            for t in run {
                let bytes = encode_tuple(t);
                w.write_all(&bytes).map_err(|e| JoinError::Invariant(e.to_string()))?;
            }
            w.flush().map_err(|e| JoinError::Invariant(e.to_string()))?;
        }
        Ok(file)
    }

    fn merge_runs(&self, runs: Vec<NamedTempFile>) -> JoinResult<Vec<Tuple>> {
        struct RunCursor {
            reader: BufReader<std::fs::File>,
            run_index: usize,
            current: Option<Tuple>,
        }

        let mut cursors: Vec<RunCursor> = Vec::with_capacity(runs.len());
        for (i, file) in runs.iter().enumerate() {
            let mut f = file.reopen().map_err(|e| JoinError::Invariant(e.to_string()))?;
            f.seek(SeekFrom::Start(0)).map_err(|e| JoinError::Invariant(e.to_string()))?;
            cursors.push(RunCursor { reader: BufReader::new(f), run_index: i, current: None });
        }
        for c in cursors.iter_mut() {
            c.current = decode_tuple(&mut c.reader)?;
        }

        // Min-heap by (key, run_index): wrapping the whole pair in `Reverse`
        // means a tie on key falls back to ascending run_index, which
        // preserves the pre-spill order (runs were carved out in stream
        // order) and so keeps the sort stable across a spill.
        let mut heap: BinaryHeap<std::cmp::Reverse<(TupleKey, usize)>> = BinaryHeap::new();
        for c in &cursors {
            if let Some(t) = &c.current {
                heap.push(std::cmp::Reverse((TupleKey { tuple: t.clone(), num_keys: self.num_keys }, c.run_index)));
            }
        }

        let mut out = Vec::new();
        while let Some(std::cmp::Reverse((_, run_index))) = heap.pop() {
            let cursor = &mut cursors[run_index];
            let tuple = cursor.current.take().expect("heap entry implies a current tuple");
            out.push(tuple);
            cursor.current = decode_tuple(&mut cursor.reader)?;
            if let Some(t) = &cursor.current {
                heap.push(std::cmp::Reverse((TupleKey { tuple: t.clone(), num_keys: self.num_keys }, run_index)));
            }
        }
        Ok(out)
    }
}

struct TupleKey {
    tuple: Tuple,
    num_keys: usize,
}
impl PartialEq for TupleKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for TupleKey {}
impl PartialOrd for TupleKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for TupleKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.tuple[self.tuple.len() - 1].compare(&other.tuple[other.tuple.len() - 1]) {
            Ordering::Equal => compare_keys(&self.tuple[..self.num_keys], &other.tuple[..self.num_keys]),
            other_ord => other_ord,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use value::Value;

    fn tuple(hash: i64, key: i32) -> Tuple {
        vec![Value::Int32(key), Value::Str("payload".to_string()), Value::Int64(hash)]
    }

    #[test]
    fn sorts_in_memory_without_spilling() {
        let sorter = ExternalSorter::new(1, 100);
        let input = vec![tuple(3, 1), tuple(1, 2), tuple(2, 3)];
        let sorted = sorter.sort(input).unwrap();
        let hashes: Vec<i64> = sorted.iter().map(|t| if let Value::Int64(h) = t[2] { h } else { unreachable!() }).collect();
        assert_eq!(hashes, vec![1, 2, 3]);
    }

    #[test]
    fn spills_and_merges_multiple_runs() {
        let sorter = ExternalSorter::new(1, 2); // force 3 spilled runs over 6 rows
        let input: Vec<Tuple> = (0..6).rev().map(|h| tuple(h, h as i32)).collect();
        let sorted = sorter.sort(input).unwrap();
        let hashes: Vec<i64> = sorted.iter().map(|t| if let Value::Int64(h) = t[2] { h } else { unreachable!() }).collect();
        assert_eq!(hashes, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn sorts_by_trailing_hash_regardless_of_tuple_width() {
        // Two differently-shaped tuples (3 and 2 columns before the trailing
        // hash) must sort purely by their own last element, never by a
        // shared fixed index.
        let wide = vec![Value::Int32(1), Value::Str("p1".to_string()), Value::Str("p2".to_string()), Value::Int64(9)];
        let narrow = vec![Value::Int32(2), Value::Str("q".to_string()), Value::Int64(3)];
        let sorter = ExternalSorter::new(1, 100);
        let sorted = sorter.sort(vec![wide, narrow]).unwrap();
        let hashes: Vec<i64> = sorted
            .iter()
            .map(|t| if let Value::Int64(h) = t[t.len() - 1] { h } else { unreachable!() })
            .collect();
        assert_eq!(hashes, vec![3, 9]);
    }

    #[test]
    fn stable_on_ties_across_a_spill() {
        let sorter = ExternalSorter::new(1, 1); // one row per run, all equal hash/key
        let input = vec![
            vec![Value::Int32(1), Value::Str("first".to_string()), Value::Int64(9)],
            vec![Value::Int32(1), Value::Str("second".to_string()), Value::Int64(9)],
            vec![Value::Int32(1), Value::Str("third".to_string()), Value::Int64(9)],
        ];
        let sorted = sorter.sort(input).unwrap();
        let payloads: Vec<String> = sorted
            .iter()
            .map(|t| if let Value::Str(s) = &t[1] { s.clone() } else { unreachable!() })
            .collect();
        assert_eq!(payloads, vec!["first", "second", "third"]);
    }
}
