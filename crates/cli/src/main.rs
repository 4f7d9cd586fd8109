//! # CLI - Equi-join demo driver
//!
//! Spins up N in-process "peers" over [`transport::LocalTransport`] and
//! drives one distributed equi-join invocation end to end against a small
//! built-in dataset, the way the teacher's CLI drives its `Engine` from a
//! fixed command set rather than a full query language (§1 Non-goals: no
//! query-plan surface here either).
//!
//! ## Configuration
//!
//! ```text
//! JOIN_NUM_INSTANCES   number of simulated peers      (default: 2)
//! JOIN_HASH_THRESHOLD_MB  hashJoinThreshold, in MiB    (default: 1)
//! JOIN_ALGORITHM       force an algorithm: hash_replicate_left,
//!                      hash_replicate_right, merge_left_first,
//!                      merge_right_first (default: let the selector pick)
//! ```
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p cli
//! [join] 2 peers, hashJoinThreshold=1MiB
//! [instance 0] [join] algorithm = HashReplicateLeft (left~256B, right~320B)
//! [instance 0] [join] done: JoinStats { algorithm: Some(HashReplicateLeft), ... }
//! [instance 1] [join] algorithm = HashReplicateLeft (left~256B, right~320B)
//! [instance 1] [join] done: JoinStats { algorithm: Some(HashReplicateLeft), ... }
//! total output rows across all peers: 3
//! ```

use anyhow::{Context, Result};
use config::{Algorithm, JoinConfigBuilder, SideSpec};
use engine::PrintlnLogger;
use transport::build_cluster;
use value::{AttributeDesc, Cell, InputArray, Schema, TypeId, Value};

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_algorithm(s: &str) -> Result<Algorithm> {
    Algorithm::parse(s).with_context(|| format!("unrecognized JOIN_ALGORITHM '{s}'"))
}

struct DemoArray {
    schema: Schema,
    cells: Vec<Cell>,
}

impl InputArray for DemoArray {
    fn chunks(&self) -> Box<dyn Iterator<Item = (Vec<i64>, Vec<Cell>)> + '_> {
        Box::new(std::iter::once((vec![0], self.cells.clone())))
    }
    fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// A fixed, two-column (key, payload) demo relation, split across
/// `num_instances` peers by row index -- real hosts shard by their own
/// storage layout; this demo only needs something deterministic.
fn shard(rows: &[(i32, &str)], instance: usize, num_instances: usize) -> DemoArray {
    let schema = Schema {
        attributes: vec![
            AttributeDesc { name: "k".to_string(), type_id: TypeId::Int32, nullable: true },
            AttributeDesc { name: "p".to_string(), type_id: TypeId::Str, nullable: true },
        ],
        dimensions: vec![],
    };
    let cells = rows
        .iter()
        .enumerate()
        .filter(|(i, _)| i % num_instances == instance)
        .map(|(_, (k, p))| Cell { attributes: vec![Value::Int32(*k), Value::Str((*p).to_string())], coordinates: vec![] })
        .collect();
    DemoArray { schema, cells }
}

fn main() -> Result<()> {
    let num_instances: usize = env_or("JOIN_NUM_INSTANCES", "2").parse().unwrap_or(2);
    let threshold_mb: u64 = env_or("JOIN_HASH_THRESHOLD_MB", "1").parse().unwrap_or(1);
    let algorithm = match std::env::var("JOIN_ALGORITHM") {
        Ok(s) => Some(parse_algorithm(&s)?),
        Err(_) => None,
    };

    println!("[join] {num_instances} peers, hashJoinThreshold={threshold_mb}MiB");

    let left_rows = vec![(1, "a"), (2, "b"), (2, "c"), (4, "d")];
    let right_rows = vec![(1, "x"), (2, "y"), (3, "z")];

    let cluster = build_cluster(num_instances);
    let handles: Vec<_> = cluster
        .into_iter()
        .enumerate()
        .map(|(i, transport)| {
            let left_rows = left_rows.clone();
            let right_rows = right_rows.clone();
            std::thread::spawn(move || -> Result<usize> {
                let left = shard(&left_rows, i, num_instances);
                let right = shard(&right_rows, i, num_instances);

                let builder = JoinConfigBuilder {
                    left: SideSpec { ids: Some(vec![0]), names: None, payload: None },
                    right: SideSpec { ids: Some(vec![0]), names: None, payload: None },
                    hash_join_threshold_mb: threshold_mb,
                    chunk_size: 1000,
                    algorithm,
                    keep_dimensions: false,
                    bloom_filter_size_bits: 4096,
                    filter_columns: None,
                    left_outer: false,
                    right_outer: false,
                    out_names: None,
                };
                let cfg = builder.resolve(left.schema(), right.schema())?;

                let logger = PrintlnLogger;
                let (rows, _stats) = engine::execute(&left, &right, &cfg, &transport, None, &logger)?;
                for row in &rows {
                    println!("[instance {i}] {row:?}");
                }
                Ok(rows.len())
            })
        })
        .collect();

    let mut total = 0usize;
    for h in handles {
        total += h.join().expect("peer thread panicked")?;
    }
    println!("total output rows across all peers: {total}");

    Ok(())
}
