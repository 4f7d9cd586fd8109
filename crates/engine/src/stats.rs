use config::Algorithm;

/// Per-invocation counters, hand-formatted the way the teacher's `Engine`
/// backs its `STATS` command off a `Debug` impl rather than a metrics
/// dependency (§4.15 / §9 "logging is delegated to a host collaborator").
#[derive(Clone, Default)]
pub struct JoinStats {
    pub rows_read_left: u64,
    pub rows_read_right: u64,
    pub rows_emitted: u64,
    pub hash_table_bytes: u64,
    pub algorithm: Option<Algorithm>,
    pub chunk_filter_exchanges: u64,
    pub bloom_filter_exchanges: u64,
    pub merge_fallback_to_hash: bool,
}

impl std::fmt::Debug for JoinStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinStats")
            .field("algorithm", &self.algorithm)
            .field("rows_read_left", &self.rows_read_left)
            .field("rows_read_right", &self.rows_read_right)
            .field("rows_emitted", &self.rows_emitted)
            .field("hash_table_bytes", &self.hash_table_bytes)
            .field("chunk_filter_exchanges", &self.chunk_filter_exchanges)
            .field("bloom_filter_exchanges", &self.bloom_filter_exchanges)
            .field("merge_fallback_to_hash", &self.merge_fallback_to_hash)
            .finish()
    }
}
