#[cfg(test)]
mod tests {
    use crate::joined_seq::*;
    use std::io::Cursor;

    fn from_str(fasta: &str) -> JoinedSeq {
        JoinedSeq::from_fasta(Cursor::new(fasta.as_bytes().to_vec())).unwrap()
    }

    #[test]
    fn test_single_record_packing() {
        let js = from_str(">chr1\nACGTACGTA\n");
        assert_eq!(js.forward_len(), 9);
        assert_eq!(js.names(), &["chr1".to_string()]);
        assert_eq!(js.records().len(), 1);
        assert_eq!(js.records()[0].len, 9);
        assert_eq!(js.records()[0].gap, 0);
        assert!(js.records()[0].first);

        let expected = [0u8, 1, 2, 3, 0, 1, 2, 3, 0];
        for (i, &code) in expected.iter().enumerate() {
            assert_eq!(js.base_at(i as u64), code, "base {}", i);
        }
    }

    #[test]
    fn test_ambiguous_run_splits_records() {
        let js = from_str(">chr1\nACGTNNACG\n");
        assert_eq!(js.forward_len(), 7);
        assert_eq!(js.records().len(), 2);

        let first = js.records()[0];
        assert_eq!((first.len, first.gap, first.first), (4, 0, true));
        let second = js.records()[1];
        assert_eq!((second.len, second.gap, second.first), (3, 2, false));

        // the packed stream holds only the unambiguous bases
        assert_eq!(codes_to_string(&js.fetch(0, 7)), "ACGTACG");
    }

    #[test]
    fn test_mirrored_half_is_reverse_complement() {
        let js = from_str(">chr1\nACCTGA\n");
        let total = js.len();
        assert_eq!(total, 12);
        for i in 0..total {
            assert_eq!(js.base_at(i), 3 - js.base_at(total - i - 1));
        }
        // revcomp of ACCTGA is TCAGGT
        assert_eq!(codes_to_string(&js.fetch(6, 6)), "TCAGGT");
    }

    #[test]
    fn test_all_ambiguous_sequence_skipped() {
        let js = from_str(">good\nACGT\n>bad\nNNNN\n>tail\nGGCC\n");
        assert_eq!(js.names(), &["good".to_string(), "tail".to_string()]);
        assert_eq!(js.records().len(), 2);
        assert!(js.records()[1].first);
        assert_eq!(js.forward_len(), 8);
    }

    #[test]
    fn test_lowercase_and_case_table() {
        let js = from_str(">chr1\nacgt\n");
        assert_eq!(js.fetch(0, 4), vec![0, 1, 2, 3]);

        assert_eq!(NT4_TABLE[b'A' as usize], 0);
        assert_eq!(NT4_TABLE[b't' as usize], 3);
        assert_eq!(NT4_TABLE[b'N' as usize], 4);
        assert_eq!(NT4_TABLE[b'-' as usize], 4);
    }

    #[test]
    fn test_fetch_spans_byte_boundaries() {
        // 11 bases so the packed representation crosses into a third byte
        let js = from_str(">chr1\nTTGACCAAGGT\n");
        assert_eq!(codes_to_string(&js.fetch(0, 11)), "TTGACCAAGGT");
        assert_eq!(codes_to_string(&js.fetch(3, 5)), "ACCAA");
    }
}
