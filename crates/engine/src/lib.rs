//! # Engine
//!
//! The central orchestrator tying [`value`], [`bloom`], [`hashtable`],
//! [`tupleio`], [`transport`], and [`config`] together into a complete
//! distributed equi-join operator.
//!
//! ## Architecture
//!
//! ```text
//! execute()
//!   |
//!   v
//! ┌────────────────────────────────────────────────┐
//! │ size::local_lower_bound  (per side, local)      │
//! │ size::global_lower_bound (all-to-all sum)       │
//! │              |                                  │
//! │              v                                  │
//! │ selector::select -> Algorithm                   │
//! │              |                                  │
//! │     ┌────────┴────────┐                         │
//! │     v                 v                         │
//! │ replicate::run    sortmerge::run                │
//! │ (HashReplicate*)  (MergeLeftFirst/MergeRightFirst)│
//! └────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module               | Purpose                                        |
//! |-----------------------|-------------------------------------------------|
//! | [`lib.rs`]             | `Side`, `execute`, wiring                       |
//! | [`size`]               | Local + global size lower-bound estimation      |
//! | [`selector`]           | Threshold-based algorithm choice                |
//! | [`chunkfilter_setup`]  | Wires a `ChunkFilter` to probe-side dimensions  |
//! | [`replicate`]          | The replicate-hash driver                       |
//! | [`sortmerge`]          | The sort-merge driver                           |
//! | [`mergekernel`]        | The local two-cursor merge-join kernel          |
//! | [`output`]             | Matched/outer OUTPUT row assembly               |
//! | [`predicate`]          | The post-join output filter seam                |
//! | [`stats`]              | Per-invocation counters                         |
//! | [`logger`]             | The host logging seam + a `println!` impl       |

mod chunkfilter_setup;
mod logger;
mod mergekernel;
mod output;
mod predicate;
mod replicate;
mod selector;
mod size;
mod sortmerge;
mod stats;

pub use config::Algorithm;
pub use logger::{JoinLogger, NullLogger, PrintlnLogger};
pub use predicate::{ColumnEquals, OutputPredicate};
pub use stats::JoinStats;

use config::JoinConfig;
use transport::PeerTransport;
use value::{InputArray, JoinResult, Tuple};

/// Which of the two join inputs a value refers to. Doubles as the
/// replicate driver's "which side is the build side" choice and the
/// sort-merge driver's "which side is prepared first" choice (§4.9's
/// `MergeLeftFirst`/`MergeRightFirst`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Runs one equi-join invocation end to end: size estimation (§4.8),
/// algorithm selection (§4.9), and dispatch to whichever driver the
/// chosen [`Algorithm`] calls for (§4.10 / §4.11).
///
/// Returns this peer's slice of the OUTPUT relation, in `cfg.out_names`
/// column order, plus the stats collected along the way. Writing that
/// slice back out through a host array-writer is outside this crate
/// (§1 Non-goals).
pub fn execute(
    left_array: &dyn InputArray,
    right_array: &dyn InputArray,
    cfg: &JoinConfig,
    transport: &dyn PeerTransport,
    predicate_fn: Option<&dyn OutputPredicate>,
    logger: &dyn JoinLogger,
) -> JoinResult<(Vec<Tuple>, JoinStats)> {
    logger.phase("estimating input sizes");
    let threshold = cfg.hash_join_threshold_bytes;
    let local_left = size::local_lower_bound(left_array, threshold);
    let local_right = size::local_lower_bound(right_array, threshold);
    let left_estimate = size::global_lower_bound(local_left, threshold, transport)?;
    let right_estimate = size::global_lower_bound(local_right, threshold, transport)?;

    let algorithm = selector::select(left_estimate, right_estimate, threshold, cfg.algorithm, cfg.left_outer, cfg.right_outer);
    logger.algorithm_chosen(algorithm, left_estimate, right_estimate);

    let (out, mut run_stats) = match algorithm {
        Algorithm::HashReplicateLeft => replicate::run(Side::Left, left_array, right_array, cfg, transport, predicate_fn, logger)?,
        Algorithm::HashReplicateRight => replicate::run(Side::Right, left_array, right_array, cfg, transport, predicate_fn, logger)?,
        Algorithm::MergeLeftFirst => sortmerge::run(Side::Left, left_array, right_array, cfg, transport, predicate_fn, logger)?,
        Algorithm::MergeRightFirst => sortmerge::run(Side::Right, left_array, right_array, cfg, transport, predicate_fn, logger)?,
    };
    run_stats.algorithm = Some(algorithm);
    logger.finished(&run_stats);

    Ok((out, run_stats))
}
