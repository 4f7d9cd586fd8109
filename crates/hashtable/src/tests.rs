use super::*;
use value::Value;

fn row(key: i32, payload: &str) -> Tuple {
    vec![Value::Int32(key), Value::Str(payload.to_string())]
}

#[test]
fn insert_then_contains() {
    let mut t = HashTable::new(1, 2, 17);
    t.insert(row(1, "a")).unwrap();
    t.insert(row(2, "b")).unwrap();
    assert!(t.contains(&[Value::Int32(1)]).0);
    assert!(t.contains(&[Value::Int32(2)]).0);
    assert!(!t.contains(&[Value::Int32(3)]).0);
}

#[test]
fn duplicate_keys_preserve_insertion_order_within_bucket() {
    let mut t = HashTable::new(1, 2, 1); // single bucket forces one chain
    t.insert(row(1, "first")).unwrap();
    t.insert(row(1, "second")).unwrap();
    t.insert(row(1, "third")).unwrap();

    let mut cur = t.cursor();
    let mut seen = Vec::new();
    while !cur.end() {
        if let Value::Str(s) = &cur.tuple().unwrap()[1] {
            seen.push(s.clone());
        }
        cur.next().unwrap();
    }
    assert_eq!(seen, vec!["first", "second", "third"]);
}

#[test]
fn chain_stays_sorted_ascending_by_key() {
    let mut t = HashTable::new(1, 2, 1);
    for k in [5, 1, 3, 2, 4] {
        t.insert(row(k, "x")).unwrap();
    }
    let mut cur = t.cursor();
    let mut keys = Vec::new();
    while !cur.end() {
        if let Value::Int32(k) = cur.tuple().unwrap()[0] {
            keys.push(k);
        }
        cur.next().unwrap();
    }
    assert_eq!(keys, vec![1, 2, 3, 4, 5]);
}

#[test]
fn new_group_counted_once_per_distinct_key() {
    let mut t = HashTable::new(1, 2, 7);
    t.insert(row(1, "a")).unwrap();
    t.insert(row(1, "b")).unwrap();
    t.insert(row(2, "c")).unwrap();
    assert_eq!(t.num_groups(), 2);
}

#[test]
fn find_positions_on_first_equal_key_entry() {
    let mut t = HashTable::new(1, 2, 1);
    t.insert(row(1, "a")).unwrap();
    t.insert(row(1, "b")).unwrap();
    t.insert(row(2, "c")).unwrap();

    let mut cur = t.cursor();
    assert!(cur.find(&[Value::Int32(1)]));
    assert!(cur.at_keys(&[Value::Int32(1)]).unwrap());
    cur.next_at_hash().unwrap();
    assert!(cur.at_keys(&[Value::Int32(1)]).unwrap());

    assert!(!cur.find(&[Value::Int32(99)]));
    assert!(cur.end());
}

#[test]
fn mark_and_go_to_mark_rewinds_within_bucket() {
    let mut t = HashTable::new(1, 2, 1);
    t.insert(row(1, "a")).unwrap();
    t.insert(row(1, "b")).unwrap();

    let mut cur = t.cursor();
    assert!(cur.find(&[Value::Int32(1)]));
    cur.mark().unwrap();
    cur.next_at_hash().unwrap();
    assert!(!cur.end());
    cur.go_to_mark().unwrap();
    if let Value::Str(s) = &cur.tuple().unwrap()[1] {
        assert_eq!(s, "a");
    } else {
        panic!("expected payload string");
    }
}

#[test]
fn next_past_end_is_invariant_error() {
    let t = HashTable::new(1, 2, 4);
    let mut cur = t.cursor();
    assert!(cur.end());
    assert!(matches!(cur.next(), Err(JoinError::Invariant(_))));
}

#[test]
fn mark_past_end_is_invariant_error() {
    let t = HashTable::new(1, 2, 4);
    let mut cur = t.cursor();
    assert!(matches!(cur.mark(), Err(JoinError::Invariant(_))));
}

#[test]
fn go_to_null_mark_is_invariant_error() {
    let t = HashTable::new(1, 2, 4);
    let mut cur = t.cursor();
    assert!(matches!(cur.go_to_mark(), Err(JoinError::Invariant(_))));
}

#[test]
fn used_bytes_accounts_for_large_values() {
    let mut t = HashTable::new(1, 2, 7);
    t.insert(row(1, "a longer payload string")).unwrap();
    assert!(t.used_bytes().unwrap() > 0);
}

#[test]
fn wrong_tuple_width_is_invariant_error() {
    let mut t = HashTable::new(1, 2, 7);
    let bad: Tuple = vec![Value::Int32(1)];
    assert!(matches!(t.insert(bad), Err(JoinError::Invariant(_))));
}
