//! The algorithm selector (spec §4.9): a thresholded choice among the four
//! join strategies, applied after size estimation's global synchronization
//! point.

use config::Algorithm;

/// Implements the decision rule of §4.9 exactly:
///
/// 1. a user override always wins (the left/right-outer veto for an
///    override is enforced earlier, at `config::JoinConfigBuilder::resolve`
///    time, as `E-UNSUPPORTED` -- an override that reaches here has already
///    survived that check);
/// 2. otherwise prefer replicating whichever side is under threshold,
///    skipping a side the veto rules out because it is the preserved side
///    of an outer join (the replicate driver does not track unmatched rows
///    on the replicated side);
/// 3. otherwise fall back to merge, starting with whichever side's
///    estimate is smaller.
pub fn select(
    left_estimate: u64,
    right_estimate: u64,
    threshold_bytes: u64,
    user_override: Option<Algorithm>,
    left_outer: bool,
    right_outer: bool,
) -> Algorithm {
    if let Some(algo) = user_override {
        return algo;
    }
    if left_estimate < threshold_bytes && !left_outer {
        return Algorithm::HashReplicateLeft;
    }
    if right_estimate < threshold_bytes && !right_outer {
        return Algorithm::HashReplicateRight;
    }
    if left_estimate < right_estimate {
        Algorithm::MergeLeftFirst
    } else {
        Algorithm::MergeRightFirst
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_left_picks_replicate_left() {
        assert_eq!(select(10, 1000, 100, None, false, false), Algorithm::HashReplicateLeft);
    }

    #[test]
    fn small_right_picks_replicate_right_when_left_is_big() {
        assert_eq!(select(1000, 10, 100, None, false, false), Algorithm::HashReplicateRight);
    }

    #[test]
    fn both_big_picks_merge_with_smaller_side_first() {
        assert_eq!(select(500, 900, 100, None, false, false), Algorithm::MergeLeftFirst);
        assert_eq!(select(900, 500, 100, None, false, false), Algorithm::MergeRightFirst);
    }

    #[test]
    fn left_outer_vetoes_replicate_left_even_when_left_is_small() {
        // Left is small, but leftOuter means the replicate-left driver can't
        // track unmatched left rows, so it falls through.
        assert_eq!(select(10, 1000, 100, None, true, false), Algorithm::MergeLeftFirst);
    }

    #[test]
    fn right_outer_vetoes_replicate_right() {
        assert_eq!(select(1000, 10, 100, None, false, true), Algorithm::MergeRightFirst);
    }

    #[test]
    fn user_override_always_wins() {
        assert_eq!(select(10, 1000, 100, Some(Algorithm::MergeRightFirst), false, false), Algorithm::MergeRightFirst);
    }
}
