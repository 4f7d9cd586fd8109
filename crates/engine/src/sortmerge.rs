//! The sort-merge driver (§4.11): hash-partitioned pre-sort, a
//! distributed shuffle, then a local join chosen by post-shuffle size --
//! either a hash-table fallback (one side turned out small once shuffled)
//! or the merge kernel (`mergekernel.rs`) over a final local re-sort.
//!
//! `first_local_size` and `second_local_size` are measured independently
//! right after each side's own shuffle -- never by reusing one
//! measurement for both, since a skewed shuffle can leave the two sides
//! with very different post-shuffle sizes.

use crate::logger::JoinLogger;
use crate::output;
use crate::predicate::{self, OutputPredicate};
use crate::size::PER_CELL_FIXED_SIZE;
use crate::stats::JoinStats;
use crate::Side;
use bloom::{BloomFilter, BuildSide, ChunkFilter};
use config::JoinConfig;
use hashtable::HashTable;
use transport::{InstanceId, PeerTransport};
use tupleio::{hash_partition_target, ExternalSorter, TupleReader};
use value::{hash_key_bytes, InputArray, JoinResult, SideLayout, Schema, Tuple, Value, SEED_PRIMARY};

/// Spilled-run size for the external sorter; unrelated to `chunkSize`
/// (that governs the host's output chunking, §6), this just bounds how
/// many tuples the sorter holds in memory per run before spilling.
const SORT_RUN_ROWS: usize = 50_000;

/// Coordinator instance for the two `globalExchange` collectives (§4.2);
/// any fixed, agreed-upon instance works, so every peer uses instance 0.
const FILTER_COORDINATOR: InstanceId = 0;

#[allow(clippy::too_many_arguments)]
pub fn run(
    first: Side,
    left_array: &dyn InputArray,
    right_array: &dyn InputArray,
    cfg: &JoinConfig,
    transport: &dyn PeerTransport,
    predicate_fn: Option<&dyn OutputPredicate>,
    logger: &dyn JoinLogger,
) -> JoinResult<(Vec<Tuple>, JoinStats)> {
    let mut stats = JoinStats::default();
    let num_keys = cfg.layout.num_keys;

    let (first_array, first_layout, first_build_side, second_array, second_layout): (
        &dyn InputArray,
        &SideLayout,
        BuildSide,
        &dyn InputArray,
        &SideLayout,
    ) = match first {
        Side::Left => (left_array, &cfg.layout.left, BuildSide::Left, right_array, &cfg.layout.right),
        Side::Right => (right_array, &cfg.layout.right, BuildSide::Right, left_array, &cfg.layout.left),
    };

    // ---- Phase 1: prepare the FIRST side ----
    logger.phase("sort-merge: phase 1, reading and hashing the first side");
    let mut chunk_filter = crate::chunkfilter_setup::build_chunk_filter(
        first_build_side,
        &cfg.layout,
        second_array.schema(),
        cfg.bloom_filter_size_bits as usize,
    );
    let mut bloom_filter = BloomFilter::new(cfg.bloom_filter_size_bits as usize);

    let first_raw: Vec<Tuple> = TupleReader::new(first_array, first_layout, None, None).collect::<JoinResult<Vec<_>>>()?;
    count_read(&mut stats, first, first_raw.len() as u64);

    let first_hashed: Vec<Tuple> = first_raw
        .into_iter()
        .map(|t| {
            chunk_filter.record(&t[..num_keys]);
            bloom_filter.add_tuple(&t[..num_keys]);
            attach_hash(t, num_keys)
        })
        .collect();
    let sorter = ExternalSorter::new(num_keys, SORT_RUN_ROWS);
    let first_sorted = sorter.sort(first_hashed)?;

    logger.phase("sort-merge: phase 1, shuffling the first side");
    let first_shuffled = shuffle(first_sorted, cfg.num_hash_buckets, transport)?;

    logger.phase("sort-merge: phase 1, exchanging chunk/bloom filters");
    transport::global_exchange_chunk_filter(&mut chunk_filter, FILTER_COORDINATOR, transport)?;
    transport::global_exchange_bloom(&mut bloom_filter, FILTER_COORDINATOR, transport)?;
    stats.chunk_filter_exchanges += 1;
    stats.bloom_filter_exchanges += 1;

    // ---- Phase 2: prepare the SECOND side ----
    logger.phase("sort-merge: phase 2, reading the second side through both filters");
    let second_raw: Vec<Tuple> =
        TupleReader::new(second_array, second_layout, Some(&chunk_filter), Some(&bloom_filter)).collect::<JoinResult<Vec<_>>>()?;
    count_read(&mut stats, first.other(), second_raw.len() as u64);

    let second_hashed: Vec<Tuple> = second_raw.into_iter().map(|t| attach_hash(t, num_keys)).collect();
    let second_sorted = sorter.sort(second_hashed)?;

    logger.phase("sort-merge: phase 2, shuffling the second side");
    let second_shuffled = shuffle(second_sorted, cfg.num_hash_buckets, transport)?;

    // ---- Phase 3: local join ----
    let first_local_size = first_shuffled.len() as u64 * PER_CELL_FIXED_SIZE;
    let second_local_size = second_shuffled.len() as u64 * PER_CELL_FIXED_SIZE;

    let first_schema = first_array.schema();
    let second_schema = second_array.schema();

    let (left_rows, right_rows, left_layout, right_layout, left_schema, right_schema) = match first {
        Side::Left => (first_shuffled, second_shuffled, first_layout, second_layout, first_schema, second_schema),
        Side::Right => (second_shuffled, first_shuffled, second_layout, first_layout, second_schema, first_schema),
    };
    let (left_local_size, right_local_size) = match first {
        Side::Left => (first_local_size, second_local_size),
        Side::Right => (second_local_size, first_local_size),
    };

    let mut out = Vec::new();
    if left_local_size < cfg.hash_join_threshold_bytes {
        logger.phase("sort-merge: phase 3, post-shuffle hash fallback (left side small)");
        stats.merge_fallback_to_hash = true;
        hash_fallback(
            Side::Left,
            &left_rows,
            &right_rows,
            num_keys,
            cfg,
            left_layout,
            right_layout,
            left_schema,
            right_schema,
            predicate_fn,
            &mut out,
            &mut stats,
        )?;
    } else if right_local_size < cfg.hash_join_threshold_bytes {
        logger.phase("sort-merge: phase 3, post-shuffle hash fallback (right side small)");
        stats.merge_fallback_to_hash = true;
        hash_fallback(
            Side::Right,
            &left_rows,
            &right_rows,
            num_keys,
            cfg,
            left_layout,
            right_layout,
            left_schema,
            right_schema,
            predicate_fn,
            &mut out,
            &mut stats,
        )?;
    } else {
        logger.phase("sort-merge: phase 3, re-sorting both sides and running the merge kernel");
        let left_resorted = sorter.sort(left_rows)?;
        let right_resorted = sorter.sort(right_rows)?;
        merge_join_with_outer(&left_resorted, &right_resorted, num_keys, cfg, left_layout, right_layout, left_schema, right_schema, predicate_fn, &mut out, &mut stats)?;
    }

    Ok((out, stats))
}

fn count_read(stats: &mut JoinStats, side: Side, n: u64) {
    match side {
        Side::Left => stats.rows_read_left += n,
        Side::Right => stats.rows_read_right += n,
    }
}

fn attach_hash(mut tuple: Tuple, num_keys: usize) -> Tuple {
    let h = hash_key_bytes(&tuple[..num_keys], SEED_PRIMARY);
    tuple.push(Value::Int64(h as i64));
    tuple
}

/// Routes each already-hashed tuple to its target instance and runs the
/// shuffle collective. Uses the same `hash_partition_target` function
/// `tupleio::TupleWriter`'s `SplitOnHash` mode uses for the host-facing
/// array layout (§4.5), so the two never drift on which instance a given
/// hash routes to -- this operates directly on in-memory tuples, since the
/// intermediate shuffle never touches the host's chunked storage, so it
/// calls the shared function rather than going through the writer's
/// position-tagging (which is for materializing a host-visible array).
fn shuffle(tuples: Vec<Tuple>, num_hash_buckets: u32, transport: &dyn PeerTransport) -> JoinResult<Vec<Tuple>> {
    let num_instances = transport.num_instances().max(1);
    let routed: Vec<(InstanceId, Tuple)> = tuples
        .into_iter()
        .map(|t| {
            let hash = match t.last() {
                Some(Value::Int64(h)) => *h as u32,
                other => panic!("shuffle input missing trailing hash column: {other:?}"),
            };
            let target = hash_partition_target(hash, num_instances, num_hash_buckets);
            (target, t)
        })
        .collect();
    transport.shuffle_by_first_dim(routed)
}

fn strip_hash(tuple: &Tuple) -> Tuple {
    tuple[..tuple.len() - 1].to_vec()
}

#[allow(clippy::too_many_arguments)]
fn hash_fallback(
    small: Side,
    left_rows: &[Tuple],
    right_rows: &[Tuple],
    num_keys: usize,
    cfg: &JoinConfig,
    left_layout: &SideLayout,
    right_layout: &SideLayout,
    left_schema: &Schema,
    right_schema: &Schema,
    predicate_fn: Option<&dyn OutputPredicate>,
    out: &mut Vec<Tuple>,
    stats: &mut JoinStats,
) -> JoinResult<()> {
    let (build_rows, probe_rows, build_width) = match small {
        Side::Left => (left_rows, right_rows, left_layout.tuple_size()),
        Side::Right => (right_rows, left_rows, right_layout.tuple_size()),
    };

    let mut table = HashTable::new(num_keys, build_width, cfg.num_hash_buckets as usize);
    for t in build_rows {
        table.insert(strip_hash(t))?;
    }
    let mut matched = vec![false; build_rows.len()];
    stats.hash_table_bytes = stats.hash_table_bytes.max(table.used_bytes()? as u64);

    for probe_hashed in probe_rows {
        let probe_tuple = strip_hash(probe_hashed);
        let keys = &probe_tuple[..num_keys];
        let mut cursor = table.cursor();
        let mut any_match = false;
        if cursor.find(keys) {
            loop {
                if cursor.end() || !cursor.at_keys(keys)? {
                    break;
                }
                any_match = true;
                matched[cursor.entry_ordinal()?] = true;
                let build_tuple = cursor.tuple()?;
                let row = match small {
                    Side::Left => output::matched_row(build_tuple, &probe_tuple, num_keys),
                    Side::Right => output::matched_row(&probe_tuple, build_tuple, num_keys),
                };
                emit(out, stats, predicate_fn, row)?;
                if cursor.end() {
                    break;
                }
                cursor.next_at_hash()?;
            }
        }
        if !any_match {
            let outer_applies = match small {
                Side::Left => cfg.right_outer,
                Side::Right => cfg.left_outer,
            };
            if outer_applies {
                let row = match small {
                    Side::Left => output::right_outer_row(&probe_tuple, left_layout, left_schema, num_keys),
                    Side::Right => output::left_outer_row(&probe_tuple, right_layout, right_schema),
                };
                emit(out, stats, predicate_fn, row)?;
            }
        }
    }

    let build_outer = match small {
        Side::Left => cfg.left_outer,
        Side::Right => cfg.right_outer,
    };
    if build_outer {
        let (probe_layout, probe_schema) = match small {
            Side::Left => (right_layout, right_schema),
            Side::Right => (left_layout, left_schema),
        };
        let mut cursor = table.cursor();
        while !cursor.end() {
            let ordinal = cursor.entry_ordinal()?;
            if !matched[ordinal] {
                let build_tuple = cursor.tuple()?;
                let row = match small {
                    Side::Left => output::left_outer_row(build_tuple, probe_layout, probe_schema),
                    Side::Right => output::right_outer_row(build_tuple, probe_layout, probe_schema, num_keys),
                };
                emit(out, stats, predicate_fn, row)?;
            }
            cursor.next()?;
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn merge_join_with_outer(
    left_rows: &[Tuple],
    right_rows: &[Tuple],
    num_keys: usize,
    cfg: &JoinConfig,
    left_layout: &SideLayout,
    right_layout: &SideLayout,
    left_schema: &Schema,
    right_schema: &Schema,
    predicate_fn: Option<&dyn OutputPredicate>,
    out: &mut Vec<Tuple>,
    stats: &mut JoinStats,
) -> JoinResult<()> {
    let mut left_matched = vec![false; left_rows.len()];
    let mut right_matched = vec![false; right_rows.len()];

    let mut pending: Vec<Tuple> = Vec::new();
    crate::mergekernel::merge_join(left_rows, right_rows, num_keys, |li, l, ri, r| {
        left_matched[li] = true;
        right_matched[ri] = true;
        pending.push(output::matched_row(&strip_hash(l), &strip_hash(r), num_keys));
        Ok(())
    })?;
    for row in pending {
        emit(out, stats, predicate_fn, row)?;
    }

    if cfg.left_outer {
        for (i, t) in left_rows.iter().enumerate() {
            if !left_matched[i] {
                let row = output::left_outer_row(&strip_hash(t), right_layout, right_schema);
                emit(out, stats, predicate_fn, row)?;
            }
        }
    }
    if cfg.right_outer {
        for (i, t) in right_rows.iter().enumerate() {
            if !right_matched[i] {
                let row = output::right_outer_row(&strip_hash(t), left_layout, left_schema, num_keys);
                emit(out, stats, predicate_fn, row)?;
            }
        }
    }
    Ok(())
}

fn emit(out: &mut Vec<Tuple>, stats: &mut JoinStats, predicate_fn: Option<&dyn OutputPredicate>, row: Tuple) -> JoinResult<()> {
    if predicate::passes(predicate_fn, &row)? {
        stats.rows_emitted += 1;
        out.push(row);
    }
    Ok(())
}
