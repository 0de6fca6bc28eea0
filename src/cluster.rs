//! Suffix-scan clusterer: consumes sorted suffix positions and groups runs
//! sharing a prefix of at least `seed_len` into raw repeat groups,
//! deduplicating families whose occurrence sets overlap.

use std::collections::BTreeMap;

use crate::fragments::FragmentMap;
use crate::joined_seq::SequenceSource;
use crate::opts::RepeatOpt;
use crate::repeat::{RepeatCoord, RepeatGroup};
use crate::utils::precondition_fatal;

/// Pull-based supplier of suffix start offsets, ascending in lexicographic
/// order of the suffixes they denote. May block while producing the next
/// element (e.g. a disk-backed blockwise source); the clusterer never looks
/// ahead more than one element.
pub trait SuffixSupplier {
    fn next_suffix(&mut self) -> Option<u64>;
}

/// In-memory supplier over a prebuilt sorted offset list.
pub struct SortedSuffixes {
    offsets: Vec<u64>,
    next: usize,
}

impl SortedSuffixes {
    pub fn new(offsets: Vec<u64>) -> Self {
        SortedSuffixes { offsets, next: 0 }
    }
}

impl SuffixSupplier for SortedSuffixes {
    fn next_suffix(&mut self) -> Option<u64> {
        let off = self.offsets.get(self.next).copied();
        self.next += 1;
        off
    }
}

pub struct Clusterer<'a, S: SequenceSource> {
    seq: &'a S,
    frags: &'a mut FragmentMap,
    opt: &'a RepeatOpt,
    groups: Vec<RepeatGroup>,
    /// Seed-position dedup index, scoped to one construction run: maps a
    /// previously indexed joined offset to the group that owns it
    seedpos_index: BTreeMap<u64, usize>,
}

impl<'a, S: SequenceSource> Clusterer<'a, S> {
    pub fn new(seq: &'a S, frags: &'a mut FragmentMap, opt: &'a RepeatOpt) -> Self {
        Clusterer {
            seq,
            frags,
            opt,
            groups: Vec::new(),
            seedpos_index: BTreeMap::new(),
        }
    }

    /// Longest common prefix of the suffixes at `a` and `b`, by direct byte
    /// comparison, never reading past either position's fragment end.
    pub fn lcp(&mut self, a: u64, b: u64) -> u64 {
        let a_end = match self.frags.extension_bound(a) {
            Some((_, end)) => end,
            None => precondition_fatal("lcp", &format!("offset {} out of joined range", a)),
        };
        let b_end = match self.frags.extension_bound(b) {
            Some((_, end)) => end,
            None => precondition_fatal("lcp", &format!("offset {} out of joined range", b)),
        };

        let mut k = 0u64;
        while a + k < a_end && b + k < b_end {
            if self.seq.base_at(a + k) != self.seq.base_at(b + k) {
                break;
            }
            k += 1;
        }
        k
    }

    /// Drive the scan to the end of the suffix stream.
    pub fn run(&mut self, supplier: &mut dyn SuffixSupplier) {
        let mut positions: Vec<RepeatCoord> = Vec::new();
        let mut min_lcp = u64::MAX;
        let mut prev = 0u64;
        let mut count = 0u64;

        while let Some(sa_elt) = supplier.next_suffix() {
            count += 1;
            if count % 10_000_000 == 0 {
                log::info!("suffix scan: {} positions", count);
            }

            if positions.is_empty() {
                positions.push(RepeatCoord { joined_off: sa_elt, fw: true });
            } else {
                let lcp_len = self.lcp(prev, sa_elt);
                if lcp_len >= self.opt.seed_len {
                    positions.push(RepeatCoord { joined_off: sa_elt, fw: true });
                    if min_lcp > lcp_len {
                        min_lcp = lcp_len;
                    }
                } else {
                    self.flush_run(&mut positions, min_lcp, prev);
                    positions.push(RepeatCoord { joined_off: sa_elt, fw: true });
                    min_lcp = u64::MAX;
                }
            }
            prev = sa_elt;
        }
        self.flush_run(&mut positions, min_lcp, prev);

        log::info!(
            "suffix scan: {} positions, {} seed positions indexed, {} groups",
            count,
            self.seedpos_index.len(),
            self.groups.len()
        );
    }

    /// Emit the pending run as a candidate group if it is large enough; the
    /// group's seed is the minimum adjacent LCP observed across the run.
    fn flush_run(&mut self, positions: &mut Vec<RepeatCoord>, min_lcp: u64, last_off: u64) {
        if positions.len() >= self.opt.min_repeat_count && positions.len() >= 2 {
            debug_assert!(min_lcp != u64::MAX);
            positions.sort();
            let seed_seq = self.seq.fetch(last_off, min_lcp as usize);
            let run = std::mem::take(positions);
            self.add_repeat_group(seed_seq, run);
        } else {
            positions.clear();
        }
    }

    /// Add a candidate group, deduplicating against previously emitted
    /// groups whose occurrence sets overlap. A family with no sense-strand
    /// occurrence is not reportable and is discarded outright.
    fn add_repeat_group(&mut self, seed_seq: Vec<u8>, positions: Vec<RepeatCoord>) {
        let forward_len = self.frags.forward_len();
        let sense_count = positions
            .iter()
            .filter(|p| p.joined_off < forward_len)
            .count();
        if sense_count == 0 {
            return;
        }

        let pos_diff = self.opt.dedup_pos_tolerance;
        let mut add_idx = self.groups.len();

        'sampling: for i in (0..positions.len()).step_by(self.opt.dedup_sampling.max(1)) {
            let joined_off = positions[i].joined_off;
            let low = joined_off.saturating_sub(pos_diff);
            let nearby: Vec<usize> = self
                .seedpos_index
                .range(low..=joined_off + pos_diff)
                .map(|(_, &grp)| grp)
                .collect();

            for grp_id in nearby {
                let positions2 = &self.groups[grp_id].positions;

                // sampled overlap between the two sorted occurrence lists
                let mut num_match = 0usize;
                let (mut p, mut p2) = (0usize, 0usize);
                while p < positions.len() && p2 < positions2.len() {
                    let pos = positions[p].joined_off;
                    let pos2 = positions2[p2].joined_off;
                    if pos + pos_diff >= pos2 && pos2 + pos_diff >= pos {
                        num_match += 1;
                    }
                    if pos <= pos2 {
                        p += 1;
                    } else {
                        p2 += 1;
                    }
                }

                let smaller = positions.len().min(positions2.len());
                if num_match * 100 >= smaller * self.opt.dedup_overlap_pct {
                    if positions.len() <= positions2.len() {
                        // existing family is at least as large; drop the
                        // candidate
                        return;
                    }
                    // candidate replaces the smaller family in place
                    add_idx = grp_id;
                    let stale: Vec<u64> =
                        positions2.iter().map(|p| p.joined_off).collect();
                    for off in stale {
                        if self.seedpos_index.get(&off) == Some(&grp_id) {
                            self.seedpos_index.remove(&off);
                        }
                    }
                    break 'sampling;
                }
            }
        }

        if add_idx == self.groups.len() {
            self.groups.push(RepeatGroup::default());
        }
        for p in &positions {
            self.seedpos_index.insert(p.joined_off, add_idx);
        }
        self.groups[add_idx].seq = seed_seq;
        self.groups[add_idx].positions = positions;
    }

    pub fn groups(&self) -> &[RepeatGroup] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<RepeatGroup> {
        self.groups
    }
}
