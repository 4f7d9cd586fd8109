use crate::bitvector::BitVector;
use value::{concat_key_bytes, Value, SEED_PRIMARY, SEED_SECONDARY};

/// A bloom filter with exactly two hash positions per insertion, sized in
/// bits (the `bloomFilterSize` configuration option, §6).
///
/// `has_data`/`has_tuple` can false-positive but never false-negative:
/// once a key has been inserted, both its bit positions stay set for the
/// life of the filter.
#[derive(Debug, Clone)]
pub struct BloomFilter {
    bits: BitVector,
}

impl BloomFilter {
    pub fn new(size_bits: usize) -> Self {
        Self { bits: BitVector::new(size_bits.max(1)) }
    }

    fn positions(&self, raw: &[u8]) -> (usize, usize) {
        let len = self.bits.len() as u32;
        let h1 = value::murmur3_32(raw, SEED_PRIMARY) % len;
        let h2 = value::murmur3_32(raw, SEED_SECONDARY) % len;
        (h1 as usize, h2 as usize)
    }

    /// Inserts the raw byte concatenation of a key.
    pub fn add_data(&mut self, raw: &[u8]) {
        let (h1, h2) = self.positions(raw);
        self.bits.set(h1).expect("positions derived from vector length");
        self.bits.set(h2).expect("positions derived from vector length");
    }

    /// `true` iff both bit positions for this key are set.
    pub fn has_data(&self, raw: &[u8]) -> bool {
        let (h1, h2) = self.positions(raw);
        self.bits.get(h1).expect("positions derived from vector length")
            && self.bits.get(h2).expect("positions derived from vector length")
    }

    /// Concatenates the first `num_keys` values' raw payloads, as §4.1, and
    /// inserts that byte string.
    pub fn add_tuple(&mut self, keys: &[Value]) {
        self.add_data(&concat_key_bytes(keys));
    }

    pub fn has_tuple(&self, keys: &[Value]) -> bool {
        self.has_data(&concat_key_bytes(keys))
    }

    pub fn size_bits(&self) -> usize {
        self.bits.len()
    }

    /// OR-s `other`'s bits into `self`. Used by the coordinator side of
    /// `global_exchange` (the merge step) and exercised directly in tests;
    /// the two-phase collective itself lives in `transport`, which already
    /// depends on this crate (`bloom` must not depend on `transport`).
    pub fn merge_from(&mut self, other: &BloomFilter) -> value::JoinResult<()> {
        self.bits.or_in(&other.bits)
    }

    pub fn bits(&self) -> &BitVector {
        &self.bits
    }

    pub fn from_bits(bits: BitVector) -> Self {
        Self { bits }
    }

    /// Serializes to `[size_bits: u64 LE][words: u64 LE ...]`, used by
    /// `transport::global_exchange_bloom` to ship a filter to the
    /// coordinator and to broadcast the merged result back.
    pub fn to_bytes(&self) -> Vec<u8> {
        let words = self.bits.as_words();
        let mut buf = Vec::with_capacity(8 + words.len() * 8);
        buf.extend_from_slice(&(self.bits.len() as u64).to_le_bytes());
        for w in words {
            buf.extend_from_slice(&w.to_le_bytes());
        }
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> value::JoinResult<Self> {
        if buf.len() < 8 {
            return Err(value::JoinError::Invariant("bloom filter payload too short".to_string()));
        }
        let size_bits = u64::from_le_bytes(buf[0..8].try_into().unwrap()) as usize;
        let mut words = Vec::with_capacity((buf.len() - 8) / 8);
        for chunk in buf[8..].chunks_exact(8) {
            words.push(u64::from_le_bytes(chunk.try_into().unwrap()));
        }
        Ok(Self { bits: BitVector::from_words(words, size_bits) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_bytes() {
        let mut bf = BloomFilter::new(2048);
        bf.add_tuple(&[Value::Int32(17)]);
        let bytes = bf.to_bytes();
        let back = BloomFilter::from_bytes(&bytes).unwrap();
        assert!(back.has_tuple(&[Value::Int32(17)]));
        assert_eq!(back.size_bits(), bf.size_bits());
    }

    #[test]
    fn inserted_tuple_is_found() {
        let mut bf = BloomFilter::new(1024);
        let keys = vec![Value::Int32(42)];
        bf.add_tuple(&keys);
        assert!(bf.has_tuple(&keys));
    }

    #[test]
    fn absent_tuple_usually_not_found() {
        let mut bf = BloomFilter::new(4096);
        bf.add_tuple(&[Value::Int32(1)]);
        bf.add_tuple(&[Value::Int32(2)]);
        // Not a proof (false positives are allowed) but with this much
        // headroom a specific untouched key should not collide.
        assert!(!bf.has_tuple(&[Value::Int32(999_999)]));
    }

    #[test]
    fn merge_from_is_sound() {
        let mut a = BloomFilter::new(2048);
        let mut b = BloomFilter::new(2048);
        a.add_tuple(&[Value::Int32(1)]);
        b.add_tuple(&[Value::Int32(2)]);
        a.merge_from(&b).unwrap();
        assert!(a.has_tuple(&[Value::Int32(1)]));
        assert!(a.has_tuple(&[Value::Int32(2)]));
    }
}
