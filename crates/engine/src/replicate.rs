//! The replicate-hash driver (spec §4.10): redistribute the small side to
//! full replication, build a hash table from it, probe with the other
//! side, pruning probe chunks with a [`ChunkFilter`] built from the build
//! side's keys.

use crate::logger::JoinLogger;
use crate::output;
use crate::predicate::{self, OutputPredicate};
use crate::stats::JoinStats;
use crate::Side;
use bloom::BuildSide;
use config::JoinConfig;
use hashtable::HashTable;
use transport::PeerTransport;
use tupleio::TupleReader;
use value::{InputArray, JoinResult, Tuple};

/// Runs the replicate-hash driver with `small` as the side to replicate
/// and build the hash table from. Returns every OUTPUT row (post-predicate)
/// plus the stats collected along the way.
#[allow(clippy::too_many_arguments)]
pub fn run(
    small: Side,
    left_array: &dyn InputArray,
    right_array: &dyn InputArray,
    cfg: &JoinConfig,
    transport: &dyn PeerTransport,
    predicate_fn: Option<&dyn OutputPredicate>,
    logger: &dyn JoinLogger,
) -> JoinResult<(Vec<Tuple>, JoinStats)> {
    let mut stats = JoinStats::default();
    let num_keys = cfg.layout.num_keys;

    let (build_array, build_layout, build_side, probe_array, probe_layout): (
        &dyn InputArray,
        &value::SideLayout,
        BuildSide,
        &dyn InputArray,
        &value::SideLayout,
    ) = match small {
        Side::Left => (left_array, &cfg.layout.left, BuildSide::Left, right_array, &cfg.layout.right),
        Side::Right => (right_array, &cfg.layout.right, BuildSide::Right, left_array, &cfg.layout.left),
    };

    logger.phase("replicate: reading build side locally");
    let local_build: Vec<Tuple> = TupleReader::new(build_array, build_layout, None, None).collect::<JoinResult<Vec<_>>>()?;

    logger.phase("replicate: redistributing build side to full replication");
    let replicated = transport.replicate(local_build)?;

    let mut chunk_filter = crate::chunkfilter_setup::build_chunk_filter(build_side, &cfg.layout, probe_array.schema(), cfg.bloom_filter_size_bits as usize);

    let mut table = HashTable::new(num_keys, build_layout.tuple_size(), cfg.num_hash_buckets as usize);
    for t in &replicated {
        chunk_filter.record(&t[..num_keys]);
        table.insert(t.clone())?;
    }
    let mut matched = vec![false; replicated.len()];
    stats.hash_table_bytes = table.used_bytes()? as u64;

    logger.phase("replicate: probing with the other side");
    let mut out = Vec::new();
    for probe_tuple in TupleReader::new(probe_array, probe_layout, Some(&chunk_filter), None) {
        let probe_tuple = probe_tuple?;
        match small {
            Side::Left => stats.rows_read_right += 1,
            Side::Right => stats.rows_read_left += 1,
        }

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
                emit(&mut out, &mut stats, predicate_fn, row)?;
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
                    Side::Left => output::right_outer_row(&probe_tuple, build_layout, build_array.schema(), num_keys),
                    Side::Right => output::left_outer_row(&probe_tuple, build_layout, build_array.schema()),
                };
                emit(&mut out, &mut stats, predicate_fn, row)?;
            }
        }
    }

    let build_outer = match small {
        Side::Left => cfg.left_outer,
        Side::Right => cfg.right_outer,
    };
    if build_outer {
        logger.phase("replicate: emitting unmatched build-side rows (outer join)");
        let mut cursor = table.cursor();
        while !cursor.end() {
            let ordinal = cursor.entry_ordinal()?;
            if !matched[ordinal] {
                let build_tuple = cursor.tuple()?;
                let row = match small {
                    Side::Left => output::left_outer_row(build_tuple, probe_layout, probe_array.schema()),
                    Side::Right => output::right_outer_row(build_tuple, probe_layout, probe_array.schema(), num_keys),
                };
                emit(&mut out, &mut stats, predicate_fn, row)?;
            }
            cursor.next()?;
        }
    }

    match small {
        Side::Left => stats.rows_read_left += replicated.len() as u64,
        Side::Right => stats.rows_read_right += replicated.len() as u64,
    }
    Ok((out, stats))
}

fn emit(out: &mut Vec<Tuple>, stats: &mut JoinStats, predicate_fn: Option<&dyn OutputPredicate>, row: Tuple) -> JoinResult<()> {
    if predicate::passes(predicate_fn, &row)? {
        stats.rows_emitted += 1;
        out.push(row);
    }
    Ok(())
}
