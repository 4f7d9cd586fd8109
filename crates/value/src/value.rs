use byteorder::{LittleEndian, WriteBytesExt};
use std::cmp::Ordering;

/// The fixed set of cell types the core understands. Every join key on the
/// left must match its counterpart on the right (§3 Value; a mismatch is
/// rejected at setup as `E-CONFIG`, see `config::resolve`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeId {
    Int32,
    Int64,
    Float64,
    Bool,
    Str,
    Binary,
}

/// A typed cell. Carries its own size and raw bytes; may be null.
///
/// Equality and ordering are defined per type (`compare`/`PartialEq`) --
/// there is no single "externally supplied comparator" object in this port
/// since Rust's `Ord`/`PartialOrd` already give every type its natural
/// comparator; `TypeId::Float64` is the one case handled specially (total
/// order via `f64::total_cmp`, since `NaN` must still sort and compare
/// consistently inside the hash table's sorted chains).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null(TypeId),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Bool(bool),
    Str(String),
    Binary(Vec<u8>),
}

impl Value {
    pub fn type_id(&self) -> TypeId {
        match self {
            Value::Null(t) => *t,
            Value::Int32(_) => TypeId::Int32,
            Value::Int64(_) => TypeId::Int64,
            Value::Float64(_) => TypeId::Float64,
            Value::Bool(_) => TypeId::Bool,
            Value::Str(_) => TypeId::Str,
            Value::Binary(_) => TypeId::Binary,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(_))
    }

    /// Size in bytes of the raw (unframed) payload -- what the key hasher
    /// hashes and what the hash table's large-value accounting counts.
    pub fn byte_len(&self) -> usize {
        match self {
            Value::Null(_) => 0,
            Value::Int32(_) => 4,
            Value::Int64(_) => 8,
            Value::Float64(_) => 8,
            Value::Bool(_) => 1,
            Value::Str(s) => s.len(),
            Value::Binary(b) => b.len(),
        }
    }

    /// `true` for the variable-length types whose heap bytes are tracked
    /// separately by the hash table's `large_value_bytes` counter.
    pub fn is_large(&self) -> bool {
        matches!(self, Value::Str(_) | Value::Binary(_))
    }

    /// Appends this value's fixed, little-endian raw byte serialization to
    /// `buf`. Numeric types are little-endian; strings and binary are their
    /// raw bytes. A null value appends nothing -- null keys are never
    /// hashed, since null-keyed tuples are dropped by the reader (§4.5).
    pub fn append_raw_bytes(&self, buf: &mut Vec<u8>) {
        match self {
            Value::Null(_) => {}
            Value::Int32(v) => buf.write_i32::<LittleEndian>(*v).expect("vec write"),
            Value::Int64(v) => buf.write_i64::<LittleEndian>(*v).expect("vec write"),
            Value::Float64(v) => buf.write_f64::<LittleEndian>(*v).expect("vec write"),
            Value::Bool(v) => buf.push(if *v { 1 } else { 0 }),
            Value::Str(s) => buf.extend_from_slice(s.as_bytes()),
            Value::Binary(b) => buf.extend_from_slice(b),
        }
    }

    /// Per-type ordering, used to keep a hash table bucket's chain sorted
    /// ascending by key. Null values sort before everything else of
    /// the same type (they never appear as hash-table keys in practice,
    /// since null keys are dropped before insertion, but the ordering must
    /// still be total for an external sort's comparator).
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null(_), Value::Null(_)) => Ordering::Equal,
            (Value::Null(_), _) => Ordering::Less,
            (_, Value::Null(_)) => Ordering::Greater,
            (Value::Int32(a), Value::Int32(b)) => a.cmp(b),
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            (Value::Float64(a), Value::Float64(b)) => a.total_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Binary(a), Value::Binary(b)) => a.cmp(b),
            (a, b) => panic!(
                "comparing values of mismatched types {:?} vs {:?}",
                a.type_id(),
                b.type_id()
            ),
        }
    }
}

/// Lexicographic key-vector comparison, used by the hash table (`keysLess`
/// in the original) and by the sort/merge cursors.
pub fn compare_keys(a: &[Value], b: &[Value]) -> Ordering {
    for (va, vb) in a.iter().zip(b.iter()) {
        match va.compare(vb) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

pub fn keys_equal(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.compare(y) == Ordering::Equal)
}

/// A fixed-width flat row. Keys occupy the leading positions in canonical
/// order; payload follows (§3 Tuple).
pub type Tuple = Vec<Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_len_matches_raw_bytes_len() {
        let v = Value::Str("hello".to_string());
        let mut buf = Vec::new();
        v.append_raw_bytes(&mut buf);
        assert_eq!(buf.len(), v.byte_len());
    }

    #[test]
    fn compare_orders_nulls_first() {
        let n = Value::Null(TypeId::Int32);
        let v = Value::Int32(0);
        assert_eq!(n.compare(&v), Ordering::Less);
        assert_eq!(v.compare(&n), Ordering::Greater);
    }

    #[test]
    fn compare_keys_is_lexicographic() {
        let a = vec![Value::Str("k".into()), Value::Int32(1)];
        let b = vec![Value::Str("k".into()), Value::Int32(2)];
        assert_eq!(compare_keys(&a, &b), Ordering::Less);
    }

    #[test]
    fn keys_equal_checks_every_column() {
        let a = vec![Value::Int32(1), Value::Int32(2)];
        let b = vec![Value::Int32(1), Value::Int32(2)];
        let c = vec![Value::Int32(1), Value::Int32(3)];
        assert!(keys_equal(&a, &b));
        assert!(!keys_equal(&a, &c));
    }
}
