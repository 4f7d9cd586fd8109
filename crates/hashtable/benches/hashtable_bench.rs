use criterion::{criterion_group, criterion_main, Criterion};
use hashtable::HashTable;
use value::Value;

const N_KEYS: usize = 20_000;
const NUM_BUCKETS: usize = 33_554_467; // hashJoinThreshold ~4GiB bucket count

fn build_table() -> HashTable {
    let mut t = HashTable::new(1, 2, NUM_BUCKETS);
    for i in 0..N_KEYS {
        t.insert(vec![Value::Int32(i as i32), Value::Int64(i as i64)]).unwrap();
    }
    t
}

fn insert_benchmark(c: &mut Criterion) {
    c.bench_function("hashtable_insert_20k", |b| {
        b.iter(build_table);
    });
}

fn contains_hit_benchmark(c: &mut Criterion) {
    let table = build_table();
    c.bench_function("hashtable_contains_hit_20k", |b| {
        b.iter(|| {
            for i in 0..N_KEYS {
                let (found, _hash) = table.contains(&[Value::Int32(i as i32)]);
                assert!(found);
            }
        });
    });
}

criterion_group!(benches, insert_benchmark, contains_hit_benchmark);
criterion_main!(benches);
