//! # HashTable
//!
//! The bucketed, open-addressing-free hash table at the core of the
//! replicate-hash driver and the post-shuffle hash fallback (§4.4).
//!
//! Bucket chains are arrays of arena-style entries linked by index, never by
//! pointer (§9 design note: "pointer-heavy per-bucket chains → arena +
//! index chains"). A tuple is fully copied into the flat `values` backing
//! store before its entry is linked; the store only ever grows by
//! append, so entry indices stay valid across the whole table's lifetime.
//!
//! Within one bucket, entries stay sorted ascending by key; an
//! equal-key run preserves insertion order, with new ties appended at the
//! run's tail.

use std::cmp::Ordering;
use value::{compare_keys, hash_key_bytes, keys_equal, JoinError, JoinResult, Value, SEED_PRIMARY};

#[derive(Debug, Clone)]
struct Entry {
    tuple_idx: usize,
    next: Option<usize>,
}

/// A fixed array of `B` buckets (`B` chosen from the memory-limit table of
/// §6), each a singly-linked, sorted chain of tuple entries.
#[derive(Debug)]
pub struct HashTable {
    num_keys: usize,
    num_attrs: usize,
    num_buckets: usize,
    buckets: Vec<Option<usize>>,
    entries: Vec<Entry>,
    values: Vec<Value>,
    large_value_bytes: i64,
    arena_bytes: usize,
    num_hashes: u64,
    num_groups: u64,
}

impl HashTable {
    pub fn new(num_keys: usize, num_attrs: usize, num_buckets: usize) -> Self {
        Self {
            num_keys,
            num_attrs,
            num_buckets: num_buckets.max(1),
            buckets: vec![None; num_buckets.max(1)],
            entries: Vec::new(),
            values: Vec::new(),
            large_value_bytes: 0,
            arena_bytes: 0,
            num_hashes: 0,
            num_groups: 0,
        }
    }

    pub fn num_buckets(&self) -> usize {
        self.num_buckets
    }

    pub fn num_groups(&self) -> u64 {
        self.num_groups
    }

    pub fn num_hashes(&self) -> u64 {
        self.num_hashes
    }

    fn bucket_for(&self, keys: &[Value]) -> u32 {
        hash_key_bytes(keys, SEED_PRIMARY) % self.num_buckets as u32
    }

    fn tuple_keys(&self, tuple_idx: usize) -> &[Value] {
        &self.values[tuple_idx..tuple_idx + self.num_keys]
    }

    fn tuple_at(&self, tuple_idx: usize) -> &[Value] {
        &self.values[tuple_idx..tuple_idx + self.num_attrs]
    }

    /// Inserts `tuple` (width `num_attrs`, keys first), keeping its bucket's
    /// chain sorted ascending by key with ties appended at the tail
    /// of the existing equal-key run.
    pub fn insert(&mut self, tuple: Tuple) -> JoinResult<()> {
        if tuple.len() != self.num_attrs {
            return Err(JoinError::Invariant(format!(
                "tuple width {} does not match table width {}",
                tuple.len(),
                self.num_attrs
            )));
        }
        let bucket = self.bucket_for(&tuple[..self.num_keys]) as usize;
        let new_hash = self.buckets[bucket].is_none();

        let mut prev: Option<usize> = None;
        let mut cur = self.buckets[bucket];
        let mut new_group = true;
        while let Some(idx) = cur {
            let stored_tuple_idx = self.entries[idx].tuple_idx;
            let ord = compare_keys(self.tuple_keys(stored_tuple_idx), &tuple[..self.num_keys]);
            if ord == Ordering::Equal {
                new_group = false;
                prev = cur;
                cur = self.entries[idx].next;
            } else if ord != Ordering::Less {
                // stored > new: insert point is right before this entry.
                break;
            } else {
                prev = cur;
                cur = self.entries[idx].next;
            }
        }

        if new_group {
            self.num_groups += 1;
        }
        if new_hash {
            self.num_hashes += 1;
        }

        let tuple_idx = self.values.len();
        for v in &tuple {
            if v.is_large() {
                self.large_value_bytes += v.byte_len() as i64;
            }
        }
        self.arena_bytes += std::mem::size_of::<Entry>() + self.num_attrs * std::mem::size_of::<Value>();
        self.values.extend(tuple);

        let new_entry_idx = self.entries.len();
        self.entries.push(Entry { tuple_idx, next: cur });
        match prev {
            Some(p) => self.entries[p].next = Some(new_entry_idx),
            None => self.buckets[bucket] = Some(new_entry_idx),
        }
        Ok(())
    }

    /// `true` iff an entry with exactly these keys exists; also returns the
    /// bucket hash, matching the original's `contains(keys, &hash)` API.
    pub fn contains(&self, keys: &[Value]) -> (bool, u32) {
        let hash = self.bucket_for(keys);
        let mut cur = self.buckets[hash as usize % self.num_buckets];
        while let Some(idx) = cur {
            let stored = self.tuple_keys(self.entries[idx].tuple_idx);
            if keys_equal(stored, keys) {
                return (true, hash);
            }
            if compare_keys(stored, keys) != Ordering::Less {
                return (false, hash);
            }
            cur = self.entries[idx].next;
        }
        (false, hash)
    }

    /// Total bytes used by the structure: arena allocations plus the sum of
    /// large (heap-allocated) value payload sizes. Never decreases.
    pub fn used_bytes(&self) -> JoinResult<usize> {
        if self.large_value_bytes < 0 {
            return Err(JoinError::Overflow);
        }
        Ok(self.arena_bytes + self.large_value_bytes as usize)
    }

    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(self)
    }
}

type Tuple = Vec<Value>;

/// A read-only cursor over a [`HashTable`], visiting entries in bucket-major,
/// chain order. Mirrors the original's `const_iterator`: `next` walks the
/// whole table, `next_at_hash` stays within the current bucket, and
/// `mark`/`go_to_mark` save and restore a position within the current
/// bucket (used by the merge-join fallback to rewind over duplicate-key
/// runs -- though in the hash-table path that rewind is unnecessary since
/// probing re-walks from `find`).
///
/// Every operation that would otherwise need to "do nothing sensible" --
/// iterating past end, marking past end, visiting a null mark -- raises
/// [`JoinError::Invariant`] instead (§4.4 Failure).
pub struct Cursor<'a> {
    table: &'a HashTable,
    bucket: usize,
    entry: Option<usize>,
    mark: Option<(usize, Option<usize>)>,
}

impl<'a> Cursor<'a> {
    fn new(table: &'a HashTable) -> Self {
        let mut c = Self { table, bucket: 0, entry: None, mark: None };
        c.restart();
        c
    }

    pub fn restart(&mut self) {
        self.bucket = 0;
        self.entry = None;
        while self.bucket < self.table.num_buckets {
            if let Some(e) = self.table.buckets[self.bucket] {
                self.entry = Some(e);
                return;
            }
            self.bucket += 1;
        }
    }

    pub fn end(&self) -> bool {
        self.bucket >= self.table.num_buckets
    }

    fn invalidate(&mut self) {
        self.bucket = self.table.num_buckets;
        self.entry = None;
    }

    /// Advances only within the current bucket; reaching the end of the
    /// chain invalidates the cursor (does not spill into the next bucket).
    pub fn next_at_hash(&mut self) -> JoinResult<()> {
        if self.end() {
            return Err(JoinError::Invariant("iterating past end".to_string()));
        }
        let idx = self.entry.expect("non-end cursor has an entry");
        self.entry = self.table.entries[idx].next;
        if self.entry.is_none() {
            self.invalidate();
        }
        Ok(())
    }

    /// Advances to the next entry overall, spilling into subsequent
    /// buckets as needed.
    pub fn next(&mut self) -> JoinResult<()> {
        if self.end() {
            return Err(JoinError::Invariant("iterating past end".to_string()));
        }
        let idx = self.entry.expect("non-end cursor has an entry");
        self.entry = self.table.entries[idx].next;
        while self.entry.is_none() {
            self.bucket += 1;
            if self.end() {
                return Ok(());
            }
            self.entry = self.table.buckets[self.bucket];
        }
        Ok(())
    }

    pub fn tuple(&self) -> JoinResult<&'a [Value]> {
        if self.end() {
            return Err(JoinError::Invariant("access past end".to_string()));
        }
        let idx = self.entry.expect("non-end cursor has an entry");
        Ok(self.table.tuple_at(self.table.entries[idx].tuple_idx))
    }

    /// Positions the cursor on the first equal-key entry in its bucket, or
    /// invalidates it (`end()`) if no such entry exists.
    pub fn find(&mut self, keys: &[Value]) -> bool {
        let hash = self.table.bucket_for(keys) as usize % self.table.num_buckets;
        self.bucket = hash;
        self.entry = self.table.buckets[hash];
        loop {
            match self.entry {
                None => {
                    self.invalidate();
                    return false;
                }
                Some(idx) => {
                    let stored = self.table.tuple_keys(self.table.entries[idx].tuple_idx);
                    if keys_equal(stored, keys) {
                        return true;
                    }
                    if compare_keys(stored, keys) != Ordering::Less {
                        self.invalidate();
                        return false;
                    }
                    self.entry = self.table.entries[idx].next;
                }
            }
        }
    }

    pub fn at_keys(&self, keys: &[Value]) -> JoinResult<bool> {
        if self.end() {
            return Err(JoinError::Invariant("access past end".to_string()));
        }
        Ok(keys_equal(self.tuple()?, keys))
    }

    /// This entry's 0-based insertion order: entries are appended to the
    /// table's arena in the order `insert` is called and never removed, so
    /// this doubles as a stable per-entry identity a caller can key a
    /// "matched" bitmap off of (used by the replicate-hash driver's outer
    /// join finalize, §4.11).
    pub fn entry_ordinal(&self) -> JoinResult<usize> {
        if self.end() {
            return Err(JoinError::Invariant("access past end".to_string()));
        }
        Ok(self.entry.expect("non-end cursor has an entry"))
    }

    pub fn mark(&mut self) -> JoinResult<()> {
        if self.end() {
            return Err(JoinError::Invariant("mark past end".to_string()));
        }
        self.mark = Some((self.bucket, self.entry));
        Ok(())
    }

    pub fn go_to_mark(&mut self) -> JoinResult<()> {
        match self.mark {
            None => Err(JoinError::Invariant("visit to null mark".to_string())),
            Some((bucket, entry)) => {
                self.bucket = bucket;
                self.entry = entry;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests;
