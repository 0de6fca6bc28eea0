// src/opts.rs
//
// Tunables for the repeat discovery pipeline, one flat struct passed down
// from the CLI.

use crate::defaults;

#[derive(Debug, Clone)]
pub struct RepeatOpt {
    /// Minimum shared prefix for two suffixes to cluster together
    pub seed_len: u64,
    /// Minimum consensus length for a repeat family to be reportable
    pub min_repeat_len: u64,
    /// Minimum number of occurrences for a repeat family
    pub min_repeat_count: usize,
    /// Edit budget for folding one group under another as an allele
    pub max_edit_distance: u32,
    /// Whether to run the pairwise group merge pass at all
    pub grouping: bool,
    /// Minimum edit-free run an allele alignment must contain
    pub min_match_len: usize,

    // Seed extension
    /// Per-round mismatch budget during consensus growth
    pub max_seed_mismatch: u32,
    /// Flank length attempted per extension round
    pub max_seed_extend_len: usize,

    // Clusterer dedup policy
    pub dedup_overlap_pct: usize,
    pub dedup_sampling: usize,
    pub dedup_pos_tolerance: u64,

    pub verbosity: i32,
}

impl Default for RepeatOpt {
    fn default() -> Self {
        RepeatOpt {
            seed_len: defaults::SEED_LEN,
            min_repeat_len: defaults::MIN_REPEAT_LEN,
            min_repeat_count: defaults::MIN_REPEAT_COUNT,
            max_edit_distance: defaults::MAX_EDIT_DISTANCE,
            grouping: true,
            min_match_len: defaults::MIN_MATCH_LEN,
            max_seed_mismatch: defaults::MAX_SEED_MISMATCH,
            max_seed_extend_len: defaults::MAX_SEED_EXTEND_LEN,
            dedup_overlap_pct: defaults::DEDUP_OVERLAP_PCT,
            dedup_sampling: defaults::DEDUP_SAMPLING,
            dedup_pos_tolerance: defaults::DEDUP_POS_TOLERANCE,
            verbosity: defaults::VERBOSITY,
        }
    }
}
