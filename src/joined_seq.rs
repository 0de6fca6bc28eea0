use bio::io::fasta;
use std::io::{self, Read};

// Same ASCII -> 2-bit code table as bwa's nst_nt4_table; anything that is
// not ACGT (case-insensitive) maps to 4.
pub const NT4_TABLE: [u8; 256] = [
    4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4,
    4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4,
    4, 0, 4, 1, 4, 4, 4, 2, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 3, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4,
    4, 0, 4, 1, 4, 4, 4, 2, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 3, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4,
    4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4,
    4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4,
    4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4,
    4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4,
];

pub const BASE_CHARS: [u8; 4] = *b"ACGT";

/// Render a 2-bit code slice as an ACGT string.
pub fn codes_to_string(codes: &[u8]) -> String {
    codes.iter().map(|&c| BASE_CHARS[c as usize] as char).collect()
}

/// Abstract random access to a base sequence, so the engine is not coupled
/// to one concrete representation.
pub trait SequenceSource {
    fn len(&self) -> u64;

    /// 2-bit base code at `pos` (0=A, 1=C, 2=G, 3=T).
    fn base_at(&self, pos: u64) -> u8;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fetch(&self, start: u64, len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(len);
        for i in 0..len as u64 {
            out.push(self.base_at(start + i));
        }
        out
    }
}

/// One contiguous run of unambiguous bases from one input record.
/// `gap` is the number of skipped (ambiguous) characters preceding this run
/// inside its source sequence; `first` marks the first run of a new source.
#[derive(Debug, Clone, Copy)]
pub struct SourceRecord {
    pub len: u64,
    pub gap: u64,
    pub first: bool,
}

/// The joined sequence: the forward genome packed 2 bits per base, addressed
/// as forward + mirrored reverse complement over a single offset space of
/// length `2 * forward_len`. Offsets at or past `forward_len` read the
/// reverse-complement strand.
pub struct JoinedSeq {
    packed: Vec<u8>,
    forward_len: u64,
    names: Vec<String>,
    records: Vec<SourceRecord>,
}

impl JoinedSeq {
    pub fn new() -> Self {
        JoinedSeq {
            packed: Vec::new(),
            forward_len: 0,
            names: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Read FASTA input into the packed forward strand. Runs of ambiguous
    /// bases are not packed; they terminate the current source record and
    /// are carried as the next record's `gap`, which keeps the whole
    /// pipeline deterministic and gives the fragment map its boundaries.
    pub fn from_fasta<R: Read>(reader: R) -> io::Result<Self> {
        let mut js = JoinedSeq::new();
        let fasta_reader = fasta::Reader::new(reader);

        for result in fasta_reader.records() {
            let record = result.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

            let mut first = true;
            let mut run_len: u64 = 0;
            let mut gap: u64 = 0;
            let mut emitted = 0usize;

            for &b in record.seq() {
                let code = NT4_TABLE[b as usize];
                if code < 4 {
                    js.push_base(code);
                    run_len += 1;
                } else if run_len > 0 {
                    js.records.push(SourceRecord { len: run_len, gap, first });
                    emitted += 1;
                    first = false;
                    run_len = 0;
                    gap = 1;
                } else {
                    gap += 1;
                }
            }
            if run_len > 0 {
                js.records.push(SourceRecord { len: run_len, gap, first });
                emitted += 1;
            }

            if emitted == 0 {
                log::warn!(
                    "sequence {} has no unambiguous bases, skipping",
                    record.id()
                );
            } else {
                js.names.push(record.id().to_string());
            }
        }

        log::info!(
            "joined sequence: {} forward bases, {} sequences, {} fragments",
            js.forward_len,
            js.names.len(),
            js.records.len()
        );

        Ok(js)
    }

    fn push_base(&mut self, code: u8) {
        debug_assert!(code < 4);
        let byte_idx = (self.forward_len / 4) as usize;
        if self.packed.len() <= byte_idx {
            self.packed.push(0);
        }
        // Same bit packing order as bwa's .pac: base 0 in the high bits
        let shift = ((!(self.forward_len % 4)) & 3) << 1;
        self.packed[byte_idx] |= code << shift;
        self.forward_len += 1;
    }

    pub fn forward_len(&self) -> u64 {
        self.forward_len
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    #[inline]
    fn get_packed(&self, pos: u64) -> u8 {
        let shift = ((!(pos % 4)) & 3) << 1;
        (self.packed[(pos / 4) as usize] >> shift) & 3
    }
}

impl Default for JoinedSeq {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceSource for JoinedSeq {
    fn len(&self) -> u64 {
        self.forward_len * 2
    }

    #[inline]
    fn base_at(&self, pos: u64) -> u8 {
        if pos < self.forward_len {
            self.get_packed(pos)
        } else {
            // Mirrored reverse-complement coordinate: complement of the
            // forward base at len - pos - 1
            3 - self.get_packed(self.len() - pos - 1)
        }
    }
}

#[path = "joined_seq_test.rs"]
mod joined_seq_test;
