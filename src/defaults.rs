// src/defaults.rs

// Repeat discovery constants
pub const SEED_LEN: u64 = 50;
pub const MIN_REPEAT_LEN: u64 = 100;
pub const MIN_REPEAT_COUNT: usize = 5;
pub const MAX_EDIT_DISTANCE: u32 = 10;
pub const MIN_MATCH_LEN: usize = 50;

// Seed extension constants
pub const MAX_SEED_MISMATCH: u32 = 5;
pub const MAX_SEED_EXTEND_LEN: usize = 25;

// Group dedup policy (see cluster.rs)
pub const DEDUP_OVERLAP_PCT: usize = 90;
pub const DEDUP_SAMPLING: usize = 10;
pub const DEDUP_POS_TOLERANCE: u64 = 5;

// Fragment map lookup cache entries
pub const FRAG_CACHE_SIZE: usize = 4;

// Output
pub const FASTA_LINE_WIDTH: usize = 60;
pub const POSITIONS_PER_LINE: usize = 10;

// Other Constants
pub const VERBOSITY: i32 = 3;
