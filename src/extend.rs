//! Seed extension engine: grows each repeat family's occurrences outward
//! from the seed by majority vote, within per-round edit budgets and hard
//! fragment bounds, and threads a backbone relation through the sub-groups
//! it splits off along the way.

use crate::joined_seq::SequenceSource;
use crate::opts::RepeatOpt;

/// Flank request meaning "as far as support allows".
const UNBOUNDED: usize = usize::MAX;

/// One occurrence being extended. `pos` is the current extent, `orig_pos`
/// the seed extent it started from, `bound` the enclosing fragment span the
/// extension may never cross. `backbone` points at the seed this one's
/// consensus was derived from; a root satisfies `backbone == index`.
#[derive(Debug, Clone)]
pub struct SeedExt {
    pub orig_pos: (u64, u64),
    pub pos: (u64, u64),
    pub bound: (u64, u64),
    pub ed: u32,
    pub total_ed: u32,
    pub base_off: u64,
    pub backbone: usize,
    pub done: bool,
}

impl SeedExt {
    pub fn new(left: u64, right: u64, bound: (u64, u64), index: usize) -> Self {
        SeedExt {
            orig_pos: (left, right),
            pos: (left, right),
            bound,
            ed: 0,
            total_ed: 0,
            base_off: 0,
            backbone: index,
            done: false,
        }
    }

    pub fn ext_len(&self) -> u64 {
        self.pos.1 - self.pos.0
    }

    pub fn left_ext_len(&self) -> u64 {
        self.orig_pos.0 - self.pos.0
    }
}

fn max_index(counts: &[usize; 4]) -> u8 {
    let mut max_idx = 0usize;
    for i in 1..4 {
        if counts[max_idx] < counts[i] {
            max_idx = i;
        }
    }
    max_idx as u8
}

#[inline]
fn avail_left(s: &SeedExt) -> u64 {
    s.pos.0 - s.bound.0
}

#[inline]
fn avail_right(s: &SeedExt) -> u64 {
    s.bound.1 - s.pos.1
}

/// Hamming distance between two seeds' flanks, `left_ext` bases leftward and
/// `right_ext` rightward of the current extents. A finite request that
/// crosses either seed's bound yields `limit + 1`; an UNBOUNDED request
/// compares as far as both bounds allow. Early-exits once `limit` is
/// exceeded.
fn pair_edit_dist<S: SequenceSource>(
    seq: &S,
    a: &SeedExt,
    b: &SeedExt,
    left_ext: usize,
    right_ext: usize,
    limit: u32,
) -> u32 {
    let left = if left_ext == UNBOUNDED {
        avail_left(a).min(avail_left(b))
    } else {
        let l = left_ext as u64;
        if l > avail_left(a) || l > avail_left(b) {
            return limit + 1;
        }
        l
    };
    let right = if right_ext == UNBOUNDED {
        avail_right(a).min(avail_right(b))
    } else {
        let r = right_ext as u64;
        if r > avail_right(a) || r > avail_right(b) {
            return limit + 1;
        }
        r
    };

    let mut ed = 0u32;
    for i in 0..left {
        if seq.base_at(a.pos.0 - i - 1) != seq.base_at(b.pos.0 - i - 1) {
            ed += 1;
            if ed > limit {
                return ed;
            }
        }
    }
    for i in 0..right {
        if seq.base_at(a.pos.1 + i) != seq.base_at(b.pos.1 + i) {
            ed += 1;
            if ed > limit {
                return ed;
            }
        }
    }
    ed
}

/// Recompute each seed's `ed` against the chosen consensus flanks. Crossing
/// a bound forces `max_ed + 1`, which excludes the seed from this round.
fn consensus_edit_dists<S: SequenceSource>(
    seq: &S,
    seeds: &mut [SeedExt],
    sb: usize,
    se: usize,
    left_cons: &[u8],
    right_cons: &[u8],
    max_ed: u32,
) {
    let left_ext = left_cons.len() as u64;
    let right_ext = right_cons.len() as u64;

    for seed in seeds[sb..se].iter_mut() {
        debug_assert!(!seed.done);
        if left_ext > avail_left(seed) || right_ext > avail_right(seed) {
            seed.ed = max_ed + 1;
            continue;
        }

        let mut ed = 0u32;
        for (j, &c) in left_cons.iter().enumerate() {
            if seq.base_at(seed.pos.0 - j as u64 - 1) != c {
                ed += 1;
                if ed > max_ed {
                    break;
                }
            }
        }
        for (j, &c) in right_cons.iter().enumerate() {
            if seq.base_at(seed.pos.1 + j as u64) != c {
                ed += 1;
                if ed > max_ed {
                    break;
                }
            }
        }
        seed.ed = ed;
    }
}

/// Build per-budget consensus flanks for `seeds[sb..se]`.
///
/// The seeds are first clustered by pairwise flank distance and the largest
/// cluster votes on each extension base. The ladder then grows one base per
/// iteration; `ed_seed_nums[e]` records how many seeds stay within a
/// cumulative budget of `e` mismatches for the consensus recorded in
/// `left/right_consensuses[e]`. Growth stops when even the full budget
/// retains fewer than `min_cnt` seeds.
#[allow(clippy::too_many_arguments)]
fn get_consensus_seq<S: SequenceSource>(
    seq: &S,
    seeds: &mut [SeedExt],
    sb: usize,
    se: usize,
    min_left_ext: usize,
    min_right_ext: usize,
    max_ed: u32,
    min_cnt: usize,
    ed_seed_nums: &mut Vec<usize>,
    mut left_consensuses: Option<&mut Vec<Vec<u8>>>,
    mut right_consensuses: Option<&mut Vec<Vec<u8>>>,
) {
    debug_assert!(sb < se && se <= seeds.len());
    let rungs = max_ed as usize + 1;
    ed_seed_nums.clear();
    ed_seed_nums.resize(rungs, 0);
    if let Some(lc) = left_consensuses.as_deref_mut() {
        lc.clear();
        lc.resize(rungs, Vec::new());
    }
    if let Some(rc) = right_consensuses.as_deref_mut() {
        rc.clear();
        rc.resize(rungs, Vec::new());
    }

    // cluster the seeds; the largest cluster gets to vote
    let n = se - sb;
    let mut belongto: Vec<usize> = (0..n).collect();
    for i in 0..n.saturating_sub(1) {
        for j in (i + 1)..n {
            if belongto[j] != j {
                continue;
            }
            let ed = pair_edit_dist(
                seq,
                &seeds[sb + i],
                &seeds[sb + j],
                min_left_ext,
                min_right_ext,
                max_ed + 1,
            );
            if ed <= max_ed + 1 {
                belongto[j] = belongto[i];
            }
        }
    }

    let mut vote = vec![0usize; n];
    let mut max_group = 0usize;
    for i in 0..n {
        let g = belongto[i];
        vote[g] += 1;
        if g != max_group && vote[g] > vote[max_group] {
            max_group = g;
        }
    }
    let consensus_group: Vec<usize> = (0..n).filter(|&i| belongto[i] == max_group).collect();

    for seed in seeds[sb..se].iter_mut() {
        seed.ed = 0;
    }

    let total_len = seq.len();
    let mut next_ed_seed_nums = vec![0usize; rungs];
    let target = if min_left_ext == UNBOUNDED || min_right_ext == UNBOUNDED {
        usize::MAX
    } else {
        min_left_ext.max(min_right_ext)
    };

    let mut seed_ext_len = 0usize;
    while seed_ext_len < target {
        let ext = seed_ext_len as u64;

        // majority base at this offset, voted by the main cluster
        let mut l_count = [0usize; 4];
        let mut r_count = [0usize; 4];
        for &ci in &consensus_group {
            let s = &seeds[sb + ci];
            if seed_ext_len < min_left_ext && s.pos.0 >= ext + 1 {
                l_count[seq.base_at(s.pos.0 - ext - 1) as usize] += 1;
            }
            if seed_ext_len < min_right_ext && s.pos.1 + ext < total_len {
                r_count[seq.base_at(s.pos.1 + ext) as usize] += 1;
            }
        }
        let left_base = max_index(&l_count);
        let right_base = max_index(&r_count);

        // how many seeds would each budget retain after this base
        for v in next_ed_seed_nums.iter_mut() {
            *v = 0;
        }
        for s in seeds[sb..se].iter() {
            let mut est = s.ed;
            if seed_ext_len < min_left_ext {
                if s.pos.0 < s.bound.0 + ext + 1 {
                    est = max_ed + 1;
                } else if seq.base_at(s.pos.0 - ext - 1) != left_base {
                    est += 1;
                }
            }
            if seed_ext_len < min_right_ext {
                if s.pos.1 + ext >= s.bound.1 {
                    est = max_ed + 1;
                } else if seq.base_at(s.pos.1 + ext) != right_base {
                    est += 1;
                }
            }
            if est <= max_ed {
                next_ed_seed_nums[est as usize] += 1;
            }
        }
        for i in 1..rungs {
            next_ed_seed_nums[i] += next_ed_seed_nums[i - 1];
        }
        if next_ed_seed_nums[max_ed as usize] < min_cnt {
            break;
        }

        for s in seeds[sb..se].iter_mut() {
            if seed_ext_len < min_left_ext {
                if s.pos.0 < s.bound.0 + ext + 1 {
                    s.ed = max_ed + 1;
                } else if seq.base_at(s.pos.0 - ext - 1) != left_base {
                    s.ed += 1;
                }
            }
            if seed_ext_len < min_right_ext {
                if s.pos.1 + ext >= s.bound.1 {
                    s.ed = max_ed + 1;
                } else if seq.base_at(s.pos.1 + ext) != right_base {
                    s.ed += 1;
                }
            }
        }

        for i in 0..rungs {
            if next_ed_seed_nums[i] < min_cnt {
                continue;
            }
            ed_seed_nums[i] = next_ed_seed_nums[i];
            if seed_ext_len < min_left_ext {
                if let Some(lc) = left_consensuses.as_deref_mut() {
                    lc[i].push(left_base);
                }
            }
            if seed_ext_len < min_right_ext {
                if let Some(rc) = right_consensuses.as_deref_mut() {
                    rc[i].push(right_base);
                }
            }
        }

        seed_ext_len += 1;
    }
}

/// Extend a family's seeds into consensus sequences.
///
/// The worklist starts with all seeds as one group. The first round extends
/// both flanks by up to `max_seed_extend_len` under the full mismatch
/// budget; seeds that fit the consensus are partitioned to the front,
/// widened and re-queued, and the remainder is retried against fresh
/// consensuses until the group runs out of support. Later rounds grow one
/// flank at a time, preferring the largest allowance that still extends far
/// enough. Every accepted consensus is appended to `consensus_merged`, and
/// each seed's `base_off` records where its consensus starts in it.
pub fn seed_extension<S: SequenceSource>(
    seq: &S,
    seed_str: &[u8],
    seeds: &mut [SeedExt],
    consensus_merged: &mut Vec<u8>,
    opt: &RepeatOpt,
) {
    let seed_mm = opt.max_seed_mismatch;
    let min_rpt_cnt = opt.min_repeat_count;
    let min_rpt_len = opt.min_repeat_len;
    let max_seed_extlen = opt.max_seed_extend_len;
    let mut baseoff = 0u64;

    let mut seed_groups: Vec<(usize, usize)> = vec![(0, seeds.len())];
    let mut left_consensuses: Vec<Vec<u8>> = Vec::new();
    let mut right_consensuses: Vec<Vec<u8>> = Vec::new();
    let mut ed_seed_nums: Vec<usize> = Vec::new();
    let mut ed_seed_nums2: Vec<usize> = Vec::new();
    let mut first_ext = true;

    while let Some((mut sb, se)) = seed_groups.pop() {
        let mut max_group_rep = 0usize;
        let mut max_group_num = 0usize;

        for seed in seeds[sb..se].iter_mut() {
            seed.done = false;
            seed.ed = 0;
        }

        while se - sb >= min_rpt_cnt {
            let left_consensus: Vec<u8>;
            let right_consensus: Vec<u8>;
            let mut allowed_seed_mm = seed_mm;

            if first_ext {
                get_consensus_seq(
                    seq,
                    seeds,
                    sb,
                    se,
                    max_seed_extlen,
                    max_seed_extlen,
                    seed_mm,
                    min_rpt_cnt,
                    &mut ed_seed_nums,
                    Some(&mut left_consensuses),
                    Some(&mut right_consensuses),
                );
                left_consensus = left_consensuses[seed_mm as usize].clone();
                right_consensus = right_consensuses[seed_mm as usize].clone();
            } else {
                get_consensus_seq(
                    seq,
                    seeds,
                    sb,
                    se,
                    UNBOUNDED,
                    0,
                    seed_mm,
                    min_rpt_cnt,
                    &mut ed_seed_nums,
                    Some(&mut left_consensuses),
                    None,
                );
                get_consensus_seq(
                    seq,
                    seeds,
                    sb,
                    se,
                    0,
                    UNBOUNDED,
                    seed_mm,
                    min_rpt_cnt,
                    &mut ed_seed_nums2,
                    None,
                    Some(&mut right_consensuses),
                );

                // pick the most permissive allowance that still extends far
                // enough; the longer flank wins, left on ties
                let mut chosen_left: Vec<u8> = Vec::new();
                let mut chosen_right: Vec<u8> = Vec::new();
                for i in (0..=seed_mm as usize).rev() {
                    let left_extlen = if ed_seed_nums[i] < min_rpt_cnt {
                        0
                    } else {
                        left_consensuses[i].len()
                    };
                    let right_extlen = if ed_seed_nums2[i] < min_rpt_cnt {
                        0
                    } else {
                        right_consensuses[i].len()
                    };
                    if i > 0 {
                        if left_extlen.max(right_extlen) < max_seed_extlen {
                            continue;
                        }
                    } else if left_extlen.max(right_extlen) == 0 {
                        continue;
                    }

                    if left_extlen >= right_extlen {
                        chosen_left = left_consensuses[i].clone();
                    } else {
                        chosen_right = right_consensuses[i].clone();
                    }
                    allowed_seed_mm = i as u32;
                    break;
                }
                left_consensus = chosen_left;
                right_consensus = chosen_right;

                consensus_edit_dists(seq, seeds, sb, se, &left_consensus, &right_consensus, seed_mm);
            }

            if left_consensus.is_empty() && right_consensus.is_empty() {
                break;
            }

            // the ladder collects left bases outward, so they reverse into
            // sequence order
            let mut consensus: Vec<u8> = left_consensus.iter().rev().copied().collect();
            if first_ext {
                consensus.extend_from_slice(seed_str);
            } else {
                let start = seeds[sb].base_off as usize;
                let len = (seeds[sb].pos.1 - seeds[sb].pos.0) as usize;
                let cur = consensus_merged[start..start + len].to_vec();
                consensus.extend_from_slice(&cur);
            }
            consensus.extend_from_slice(&right_consensus);
            consensus_merged.extend_from_slice(&consensus);

            // partition passed seeds to the front of the window
            let mut num_passed_seeds = 0usize;
            let mut j = sb;
            for i in sb..se {
                if seeds[i].ed > allowed_seed_mm {
                    seeds[i].ed = 0;
                    continue;
                }

                seeds[i].done = true;
                seeds[i].base_off = baseoff;
                seeds[i].pos.0 -= left_consensus.len() as u64;
                seeds[i].pos.1 += right_consensus.len() as u64;
                seeds[i].total_ed += seeds[i].ed;
                seeds[i].backbone = sb;
                debug_assert_eq!(seeds[i].pos.1 - seeds[i].pos.0, consensus.len() as u64);
                if i > j {
                    seeds.swap(i, j);
                    j += 1;
                    while j < i && seeds[j].done {
                        j += 1;
                    }
                } else {
                    j = i + 1;
                }
                num_passed_seeds += 1;
            }

            if num_passed_seeds >= min_rpt_cnt {
                let further_extend = !(first_ext && (consensus.len() as u64) < min_rpt_len);
                if further_extend {
                    seed_groups.push((sb, sb + num_passed_seeds));
                    if num_passed_seeds > max_group_num {
                        max_group_rep = sb;
                        max_group_num = num_passed_seeds;
                    }
                }
            }

            baseoff += consensus.len() as u64;
            sb += num_passed_seeds;
        }

        // leftovers that never joined a consensus this round
        if se > sb {
            for i in sb..se {
                seeds[i].done = true;
                if first_ext {
                    seeds[i].base_off = baseoff;
                } else if max_group_num > 0 {
                    seeds[i].backbone = max_group_rep;
                }
            }
            if first_ext {
                consensus_merged.extend_from_slice(seed_str);
                baseoff += seed_str.len() as u64;
            }
        }

        first_ext = false;
    }

    // resolve every seed to its terminal representative
    for i in 0..seeds.len() {
        let mut root = i;
        while root != seeds[root].backbone {
            root = seeds[root].backbone;
        }
        seeds[i].backbone = root;
    }
}
