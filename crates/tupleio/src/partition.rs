//! Shared hash-to-instance partitioning math (§4.5 `SplitOnHash`, §6
//! `shuffleByFirstDim`). [`TupleWriter`](crate::TupleWriter)'s `SplitOnHash`
//! mode and the sort-merge driver's in-memory shuffle both need to agree on
//! which instance a given hash routes to, so both go through this one
//! function rather than each carrying its own copy of the arithmetic.

/// `num_hash_buckets` split evenly across `num_instances` targets; the top
/// instance absorbs whatever bucket range doesn't divide evenly.
pub fn hash_partition_target(hash: u32, num_instances: usize, num_hash_buckets: u32) -> usize {
    let num_instances = num_instances.max(1);
    let break_interval = (num_hash_buckets / num_instances as u32).max(1);
    ((hash / break_interval) as usize).min(num_instances - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_within_range_and_clamps_to_last_instance() {
        assert_eq!(hash_partition_target(0, 4, 16), 0);
        assert_eq!(hash_partition_target(9, 4, 16), 2);
        assert_eq!(hash_partition_target(u32::MAX, 4, 16), 3);
    }

    #[test]
    fn single_instance_always_routes_home() {
        assert_eq!(hash_partition_target(12345, 1, 16), 0);
    }
}
