//! Local-alignment collaborator for the repeat-group merger.
//!
//! The merger only needs "align two short strings under a scoring scheme and
//! give me the edits and the reference start"; everything else in the crate
//! treats the aligner as a black box behind `LocalAligner`.

use crate::repeat::{Edit, EditKind};

#[derive(Debug, Clone)]
pub struct Alignment {
    /// Edits transforming the reference into the read, ordered by read
    /// position
    pub edits: Vec<Edit>,
    /// Reference offset where the read alignment starts
    pub ref_off: usize,
    pub score: i32,
}

/// Penalty scheme. Matches score zero; mismatches and gaps subtract, and an
/// alignment scoring below `score_floor` is rejected outright.
#[derive(Debug, Clone, Copy)]
pub struct Scoring {
    pub mismatch_pen: i32,
    pub gap_open: i32,
    pub gap_extend: i32,
    pub score_floor: i32,
}

impl Scoring {
    /// Scoring admitting roughly `max_edit` mismatches worth of damage.
    pub fn with_edit_budget(max_edit: u32) -> Self {
        const MM_PEN: i32 = 3;
        const GAP_PEN_CON: i32 = 4;
        const GAP_PEN_LIN: i32 = 2;
        Scoring {
            mismatch_pen: MM_PEN,
            gap_open: GAP_PEN_CON,
            gap_extend: GAP_PEN_LIN,
            score_floor: -(MM_PEN * max_edit as i32),
        }
    }
}

pub trait LocalAligner {
    /// Align `read` against `reference` (both 2-bit code strings). Returns
    /// None when no alignment clears the score floor.
    fn align(&self, reference: &[u8], read: &[u8]) -> Option<Alignment>;
}

/// Affine-gap dynamic-programming aligner. The read must align end to end;
/// the reference contributes a free prefix and suffix, so the alignment may
/// start anywhere in the reference (the start becomes `ref_off`).
pub struct FittingAligner {
    scoring: Scoring,
}

const NEG_INF: i32 = i32::MIN / 2;

impl FittingAligner {
    pub fn new(scoring: Scoring) -> Self {
        FittingAligner { scoring }
    }
}

impl LocalAligner for FittingAligner {
    fn align(&self, reference: &[u8], read: &[u8]) -> Option<Alignment> {
        let n = reference.len();
        let m = read.len();
        if n == 0 || m == 0 {
            return None;
        }

        let sc = &self.scoring;
        let cols = n + 1;
        let idx = |j: usize, i: usize| j * cols + i;

        // h: best ending at (j, i); e: gap in the read (reference base
        // deleted); f: gap in the reference (read base inserted)
        let mut h = vec![NEG_INF; (m + 1) * cols];
        let mut e = vec![NEG_INF; (m + 1) * cols];
        let mut f = vec![NEG_INF; (m + 1) * cols];

        for i in 0..=n {
            h[idx(0, i)] = 0; // free reference prefix
        }
        for j in 1..=m {
            let gap = sc.gap_open + sc.gap_extend * j as i32;
            f[idx(j, 0)] = -gap;
            h[idx(j, 0)] = -gap;
        }

        for j in 1..=m {
            for i in 1..=n {
                let open = h[idx(j, i - 1)] - sc.gap_open - sc.gap_extend;
                let ext = e[idx(j, i - 1)] - sc.gap_extend;
                e[idx(j, i)] = open.max(ext);

                let open = h[idx(j - 1, i)] - sc.gap_open - sc.gap_extend;
                let ext = f[idx(j - 1, i)] - sc.gap_extend;
                f[idx(j, i)] = open.max(ext);

                let sub = if read[j - 1] == reference[i - 1] {
                    0
                } else {
                    -sc.mismatch_pen
                };
                let diag = h[idx(j - 1, i - 1)] + sub;
                h[idx(j, i)] = diag.max(e[idx(j, i)]).max(f[idx(j, i)]);
            }
        }

        // Free reference suffix: best cell in the last row, leftmost on ties
        let mut best_i = 0usize;
        let mut best = h[idx(m, 0)];
        for i in 1..=n {
            if h[idx(m, i)] > best {
                best = h[idx(m, i)];
                best_i = i;
            }
        }
        if best < sc.score_floor {
            return None;
        }

        // Traceback, preferring the diagonal on ties
        let mut edits = Vec::new();
        let mut j = m;
        let mut i = best_i;
        while j > 0 {
            if i > 0 {
                let sub = if read[j - 1] == reference[i - 1] {
                    0
                } else {
                    -sc.mismatch_pen
                };
                if h[idx(j, i)] == h[idx(j - 1, i - 1)] + sub {
                    if sub != 0 {
                        edits.push(Edit {
                            pos: j - 1,
                            kind: EditKind::Mismatch { base: read[j - 1] },
                        });
                    }
                    j -= 1;
                    i -= 1;
                    continue;
                }
                if h[idx(j, i)] == e[idx(j, i)] {
                    // consume reference bases until the gap opens
                    loop {
                        edits.push(Edit { pos: j, kind: EditKind::Deletion });
                        let opened =
                            e[idx(j, i)] == h[idx(j, i - 1)] - sc.gap_open - sc.gap_extend;
                        i -= 1;
                        if opened || i == 0 {
                            break;
                        }
                    }
                    continue;
                }
            }
            // gap in the reference: read base inserted
            loop {
                edits.push(Edit {
                    pos: j - 1,
                    kind: EditKind::Insertion { base: read[j - 1] },
                });
                let opened = i == 0
                    || f[idx(j, i)] == h[idx(j - 1, i)] - sc.gap_open - sc.gap_extend;
                j -= 1;
                if opened || j == 0 {
                    break;
                }
            }
        }

        edits.reverse();
        Some(Alignment { edits, ref_off: i, score: best })
    }
}
