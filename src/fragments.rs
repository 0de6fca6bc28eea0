use crate::defaults::FRAG_CACHE_SIZE;
use crate::joined_seq::SourceRecord;

/// One contiguous source-record span within the joined sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fragment {
    pub joined_off: u64,
    pub length: u64,
    pub frag_id: usize,
    pub seq_id: usize,
    /// Offset of this fragment within its source sequence (gaps included)
    pub seq_off: u64,
    pub first: bool,
}

impl Fragment {
    #[inline]
    pub fn contains(&self, joined_off: u64) -> bool {
        joined_off >= self.joined_off && joined_off < self.joined_off + self.length
    }
}

/// Maps joined-sequence offsets to fragments and genome coordinates, and
/// supplies the fragment bounds that seed extension may not cross.
///
/// Lookups go through a small round-robin cache before binary search; seed
/// lookups cluster locally so most hits are served from the cache. The
/// cache is a micro-optimization only and does not change behavior.
pub struct FragmentMap {
    frags: Vec<Fragment>,
    forward_len: u64,
    cache: [usize; FRAG_CACHE_SIZE],
    num_cached: usize,
    victim: usize,
}

impl FragmentMap {
    /// Build the ordered fragment list from source records. Zero-length
    /// records are skipped; a record flagged `first` starts a new source
    /// sequence and resets the local offset. A zero-length sentinel
    /// fragment terminates the list.
    pub fn build(records: &[SourceRecord]) -> Self {
        let mut frags = Vec::with_capacity(records.len() + 1);
        let mut acc_joined: u64 = 0;
        let mut acc_seq: u64 = 0;
        let mut seq_id: usize = 0;
        let mut frag_id: usize = 0;

        for rec in records {
            if rec.len == 0 {
                continue;
            }
            if rec.first {
                acc_seq = 0;
                seq_id += 1;
            }

            acc_seq += rec.gap;
            frags.push(Fragment {
                joined_off: acc_joined,
                length: rec.len,
                frag_id,
                seq_id: seq_id - 1,
                seq_off: acc_seq,
                first: rec.first,
            });
            frag_id += 1;

            acc_joined += rec.len;
            acc_seq += rec.len;
        }

        // Sentinel
        frags.push(Fragment {
            joined_off: acc_joined,
            length: 0,
            frag_id,
            seq_id,
            seq_off: acc_seq,
            first: false,
        });

        FragmentMap {
            frags,
            forward_len: acc_joined,
            cache: [0; FRAG_CACHE_SIZE],
            num_cached: 0,
            victim: 0,
        }
    }

    pub fn forward_len(&self) -> u64 {
        self.forward_len
    }

    pub fn joined_len(&self) -> u64 {
        self.forward_len * 2
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.frags
    }

    /// Fragment index containing the forward-strand offset, or None for an
    /// out-of-range offset (a fatal precondition violation upstream).
    pub fn locate(&mut self, joined_off: u64) -> Option<usize> {
        for i in 0..self.num_cached {
            let idx = self.cache[i];
            if self.frags[idx].contains(joined_off) {
                return Some(idx);
            }
        }

        let mut top = 0usize;
        let mut bot = self.frags.len() - 1;
        while bot - top > 1 {
            let mid = top + ((bot - top) >> 1);
            if joined_off < self.frags[mid].joined_off {
                bot = mid;
            } else {
                top = mid;
            }
        }

        if self.frags[top].contains(joined_off) {
            if self.num_cached < FRAG_CACHE_SIZE {
                self.cache[self.num_cached] = top;
                self.num_cached += 1;
            } else {
                self.cache[self.victim] = top;
                self.victim = (self.victim + 1) % FRAG_CACHE_SIZE;
            }
            Some(top)
        } else {
            None
        }
    }

    /// Translate a forward-strand joined offset into (sequence id, local
    /// position within the source sequence).
    pub fn to_genome_coord(&mut self, joined_off: u64) -> Option<(usize, u64)> {
        let idx = self.locate(joined_off)?;
        let frag = &self.frags[idx];
        Some((frag.seq_id, frag.seq_off + (joined_off - frag.joined_off)))
    }

    /// The `[start, end)` span of the enclosing fragment, in the orientation
    /// implied by `off`: forward bounds for forward offsets, mirrored bounds
    /// for reverse-complement offsets. This is the hard ceiling for seed
    /// extension.
    pub fn extension_bound(&mut self, off: u64) -> Option<(u64, u64)> {
        let total = self.joined_len();
        if off >= total {
            return None;
        }
        if off < self.forward_len {
            let idx = self.locate(off)?;
            let frag = &self.frags[idx];
            Some((frag.joined_off, frag.joined_off + frag.length))
        } else {
            // Positions are w.r.t. the reverse-complement string; the
            // fragment list is based on the forward string
            let idx = self.locate(total - off - 1)?;
            let frag = &self.frags[idx];
            Some((
                total - (frag.joined_off + frag.length),
                total - frag.joined_off,
            ))
        }
    }
}

#[path = "fragments_test.rs"]
mod fragments_test;
