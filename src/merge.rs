//! Repeat-group merger: pairwise pass over raw groups that folds a
//! near-duplicate consensus under an earlier group as an allele, so that
//! one-edit-apart families do not surface as independent repeats.

use crate::align::LocalAligner;
use crate::opts::RepeatOpt;
use crate::repeat::{max_match_len, Edit, RepeatGroup};

/// Pad prepended to both sequences before alignment so the aligner is
/// forced to anchor at the true sequence starts.
pub const PAD_LEN: usize = 5;

/// Build a pad that matches neither the reference nor the read head. Each
/// pad base is the reference base shifted by one code, shifted once more if
/// it collides with the read; the tail half is additionally shifted away
/// from the read's first bases so the pad cannot be absorbed by a slid
/// alignment.
pub fn make_pad(reference: &[u8], read: &[u8], len: usize) -> Vec<u8> {
    let mut pad = vec![0u8; len];
    for i in 0..len {
        pad[i] = (reference[i] + 1) & 3;
        if read[i] == pad[i] {
            pad[i] = (pad[i] + 1) & 3;
        }
    }

    let head_len = len / 2;
    let pad_start = len - head_len;
    for i in 0..head_len {
        if read[i] == pad[pad_start + i] {
            pad[pad_start + i] = (pad[pad_start + i] + 1) & 3;
        }
    }
    pad
}

/// Decide whether `read` can be folded under `reference` as an allele.
/// Returns the stripped edit list (positions on `read`) and the offset of
/// the read within the reference, or None when the pair is not mergeable.
pub fn check_mergeable(
    aligner: &dyn LocalAligner,
    reference: &[u8],
    read: &[u8],
    opt: &RepeatOpt,
) -> Option<(Vec<Edit>, usize)> {
    if reference.len() < PAD_LEN || read.len() < PAD_LEN {
        return None;
    }

    let pad = make_pad(reference, read, PAD_LEN);
    let mut ref2 = pad.clone();
    ref2.extend_from_slice(reference);
    let mut read2 = pad;
    read2.extend_from_slice(read);

    let aln = aligner.align(&ref2, &read2)?;

    // alignment must start at the pad
    if aln.ref_off != 0 {
        return None;
    }
    // and carry no edits inside it
    if let Some(first) = aln.edits.first() {
        if first.pos < PAD_LEN {
            return None;
        }
    }

    let left = PAD_LEN;
    let right = left + read.len();
    let edits: Vec<Edit> = aln
        .edits
        .iter()
        .filter(|e| e.pos >= left && e.pos <= right)
        .map(|e| Edit { pos: e.pos - left, kind: e.kind })
        .collect();

    if edits.len() > opt.max_edit_distance as usize {
        return None;
    }
    if max_match_len(&edits, read.len()) < opt.min_match_len {
        return None;
    }

    Some((edits, 0))
}

/// Pairwise merge pass. Every group is tested against each later group;
/// when a later group is mergeable it is absorbed as an allele of the
/// earlier one and emptied. Emptied slots are compacted away at the end.
pub fn group_pairs(groups: &mut Vec<RepeatGroup>, aligner: &dyn LocalAligner, opt: &RepeatOpt) {
    if groups.is_empty() {
        log::warn!("no repeat group to merge");
        return;
    }

    log::info!("before grouping: {} groups", groups.len());
    let step = (groups.len() >> 8).max(1);

    for i in 0..groups.len().saturating_sub(1) {
        if i % step == 0 {
            log::debug!("grouping {}/{}", i, groups.len());
        }
        if groups[i].is_empty() {
            continue;
        }
        let str1 = groups[i].seq.clone();

        for j in (i + 1)..groups.len() {
            if groups[j].is_empty() {
                continue;
            }
            if let Some((edits, coord)) = check_mergeable(aligner, &str1, &groups[j].seq, opt) {
                let absorbed = std::mem::take(&mut groups[j]);
                groups[i].absorb(absorbed, edits, coord);
            }
        }
    }

    groups.retain(|g| !g.is_empty());
    log::info!("after merge: {} groups", groups.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{FittingAligner, Scoring};
    use crate::repeat::{EditKind, RepeatCoord};

    fn codes(s: &str) -> Vec<u8> {
        s.bytes()
            .map(|b| crate::joined_seq::NT4_TABLE[b as usize])
            .collect()
    }

    fn aligner(max_edit: u32) -> FittingAligner {
        FittingAligner::new(Scoring::with_edit_budget(max_edit))
    }

    fn group(seq: &str, offs: &[u64]) -> RepeatGroup {
        RepeatGroup {
            seq: codes(seq),
            positions: offs
                .iter()
                .map(|&o| RepeatCoord { joined_off: o, fw: true })
                .collect(),
            ..RepeatGroup::default()
        }
    }

    #[test]
    fn test_make_pad_collides_with_neither() {
        let reference = codes("ACGTACGTAC");
        let read = codes("CAGTCCGTAG");
        let pad = make_pad(&reference, &read, PAD_LEN);
        for i in 0..PAD_LEN {
            assert_ne!(pad[i], reference[i]);
            assert_ne!(pad[i], read[i]);
        }
    }

    #[test]
    fn test_one_mismatch_fold() {
        let opt = RepeatOpt {
            max_edit_distance: 10,
            min_match_len: 5,
            ..RepeatOpt::default()
        };
        let mut groups = vec![
            group("ACGTACGTAC", &[0, 10, 20]),
            group("ACGTACGTAG", &[30]),
        ];
        group_pairs(&mut groups, &aligner(opt.max_edit_distance), &opt);

        assert_eq!(groups.len(), 1);
        let grp = &groups[0];
        assert_eq!(grp.positions.len(), 3);
        assert_eq!(grp.alleles.len(), 1);
        assert_eq!(grp.occurrence_count(), 4);

        let allele = &grp.alleles[0];
        assert_eq!(allele.positions.len(), 1);
        assert_eq!(allele.positions[0].joined_off, 30);
        assert_eq!(allele.edits.len(), 1);
        assert_eq!(allele.edits[0].pos, 9);
        assert_eq!(allele.edits[0].kind, EditKind::Mismatch { base: 2 });
    }

    #[test]
    fn test_unrelated_sequences_stay_apart() {
        let opt = RepeatOpt {
            max_edit_distance: 2,
            min_match_len: 5,
            ..RepeatOpt::default()
        };
        let mut groups = vec![
            group("ACGTACGTAC", &[0]),
            group("TTGGCCAATT", &[40]),
        ];
        group_pairs(&mut groups, &aligner(opt.max_edit_distance), &opt);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_min_match_len_gates_fold() {
        // single mismatch at position 5 of 10: longest clean run is 5
        let reference = codes("ACGTACGTAC");
        let read = codes("ACGTAGGTAC");
        let strict = RepeatOpt {
            max_edit_distance: 10,
            min_match_len: 8,
            ..RepeatOpt::default()
        };
        assert!(check_mergeable(&aligner(10), &reference, &read, &strict).is_none());

        let lenient = RepeatOpt { min_match_len: 4, ..strict };
        assert!(check_mergeable(&aligner(10), &reference, &read, &lenient).is_some());
    }

    #[test]
    fn test_edit_budget_gates_fold() {
        let reference = codes("ACGTACGTACGTACGT");
        let read = codes("ACCTACGAACGTAGGT"); // 3 mismatches
        let opt = RepeatOpt {
            max_edit_distance: 2,
            min_match_len: 2,
            ..RepeatOpt::default()
        };
        assert!(check_mergeable(&aligner(10), &reference, &read, &opt).is_none());
    }
}
