//! The exact memory-limit -> bucket-count table of §6. Every peer must
//! derive the same bucket count from the same `hashJoinThreshold` for the
//! hash table's bucket-hash routing to agree across instances.

/// Looks up the bucket count `B` for a `hashJoinThreshold` given in MB.
/// The table is exact and must not be approximated (interoperability
/// across peers depends on it).
pub fn bucket_count(threshold_mb: u64) -> u32 {
    match threshold_mb {
        0..=128 => 1_048_573,
        129..=256 => 2_097_143,
        257..=512 => 4_194_301,
        513..=1024 => 8_388_617,
        1025..=2048 => 16_777_213,
        2049..=4096 => 33_554_467,
        4097..=8192 => 67_108_859,
        8193..=16384 => 134_217_757,
        16385..=32768 => 268_435_459,
        32769..=65536 => 536_870_909,
        65537..=131072 => 1_073_741_827,
        _ => 2_147_483_647,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_boundaries_match_spec_exactly() {
        assert_eq!(bucket_count(1), 1_048_573);
        assert_eq!(bucket_count(128), 1_048_573);
        assert_eq!(bucket_count(129), 2_097_143);
        assert_eq!(bucket_count(256), 2_097_143);
        assert_eq!(bucket_count(512), 4_194_301);
        assert_eq!(bucket_count(1024), 8_388_617);
        assert_eq!(bucket_count(2048), 16_777_213);
        assert_eq!(bucket_count(4096), 33_554_467);
        assert_eq!(bucket_count(8192), 67_108_859);
        assert_eq!(bucket_count(16384), 134_217_757);
        assert_eq!(bucket_count(32768), 268_435_459);
        assert_eq!(bucket_count(65536), 536_870_909);
        assert_eq!(bucket_count(131072), 1_073_741_827);
        assert_eq!(bucket_count(131073), 2_147_483_647);
    }
}
