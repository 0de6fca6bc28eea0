//! Repeat-group data model: occurrences, edits, primary groups and the
//! allele groups folded under them during merging.

/// One edit transforming a parent consensus into an allele sequence.
/// `pos` is the position on the allele (candidate) sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edit {
    pub pos: usize,
    pub kind: EditKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// Substituted base on the candidate (2-bit code)
    Mismatch { base: u8 },
    /// Base present on the candidate but not the reference
    Insertion { base: u8 },
    /// Reference base missing from the candidate
    Deletion,
}

/// One instance of a repeat family's sequence in the joined space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RepeatCoord {
    pub joined_off: u64,
    pub fw: bool,
}

/// An alternate sequence structurally alignable to its parent consensus
/// within a bounded edit distance.
#[derive(Debug, Clone, Default)]
pub struct AlleleGroup {
    pub seq: Vec<u8>,
    pub edits: Vec<Edit>,
    /// Offset of the allele within the parent consensus
    pub coord: usize,
    pub positions: Vec<RepeatCoord>,
    pub snp_ids: Vec<String>,
    pub base_offset: u64,
}

/// A repeat family: consensus sequence, its occurrences, and any absorbed
/// alleles. `base_offset` is assigned only when the emitted consensus
/// stream is finalized, never during construction.
#[derive(Debug, Clone, Default)]
pub struct RepeatGroup {
    pub seq: Vec<u8>,
    pub base_offset: u64,
    pub positions: Vec<RepeatCoord>,
    pub alleles: Vec<AlleleGroup>,
}

impl RepeatGroup {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn set_empty(&mut self) {
        self.positions.clear();
        self.seq.clear();
        self.alleles.clear();
    }

    /// Fold `other` under this group as an allele carrying `edits` (which
    /// transform this group's consensus into `other`'s sequence at `coord`).
    pub fn absorb(&mut self, other: RepeatGroup, edits: Vec<Edit>, coord: usize) {
        self.alleles.push(AlleleGroup {
            seq: other.seq,
            edits,
            coord,
            positions: other.positions,
            snp_ids: Vec::new(),
            base_offset: 0,
        });
    }

    /// Total occurrences across the primary and all alleles.
    pub fn occurrence_count(&self) -> usize {
        self.positions.len() + self.alleles.iter().map(|a| a.positions.len()).sum::<usize>()
    }
}

/// Reapply an edit list to a reference, reproducing the candidate sequence
/// the edits were computed against.
pub fn apply_edits(reference: &[u8], read_len: usize, edits: &[Edit], coord: usize) -> Vec<u8> {
    let mut read = Vec::with_capacity(read_len);
    let mut ref_pos = coord;
    let mut read_pos = 0usize;

    for edit in edits {
        while read_pos < edit.pos {
            read.push(reference[ref_pos]);
            read_pos += 1;
            ref_pos += 1;
        }
        match edit.kind {
            EditKind::Deletion => {
                ref_pos += 1;
            }
            EditKind::Insertion { base } => {
                read.push(base);
                read_pos += 1;
            }
            EditKind::Mismatch { base } => {
                read.push(base);
                read_pos += 1;
                ref_pos += 1;
            }
        }
    }
    while read_pos < read_len {
        read.push(reference[ref_pos]);
        read_pos += 1;
        ref_pos += 1;
    }

    read
}

/// Length of the longest edit-free run of an alignment.
pub fn max_match_len(edits: &[Edit], read_len: usize) -> usize {
    if edits.is_empty() {
        return read_len;
    }

    let mut max_length = 0usize;
    let mut last_edit_pos = 0usize;
    for edit in edits {
        if last_edit_pos > edit.pos {
            continue;
        }
        let len = edit.pos - last_edit_pos;
        if len > max_length {
            max_length = len;
        }
        last_edit_pos = edit.pos + 1;
    }
    if last_edit_pos < read_len {
        let len = read_len - last_edit_pos;
        if len > max_length {
            max_length = len;
        }
    }

    max_length
}
