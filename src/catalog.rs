//! Catalog emitters: the repeat FASTA, the occurrence/allele info table,
//! the SNP and haplotype side files, and the seed-extension report.

use std::io::{self, Write};

use crate::defaults::{FASTA_LINE_WIDTH, POSITIONS_PER_LINE};
use crate::extend::SeedExt;
use crate::fragments::FragmentMap;
use crate::joined_seq::{codes_to_string, SequenceSource, BASE_CHARS};
use crate::repeat::{AlleleGroup, EditKind, RepeatCoord, RepeatGroup};
use crate::utils::precondition_fatal;

const REP_BASENAME: &str = "rep";

/// Write every group's consensus into one continuous FASTA record named
/// "rep", wrapped at the output width. Each group's `base_offset` into the
/// concatenated stream is assigned here and nowhere else.
pub fn save_repeat_fa<W: Write>(out: &mut W, groups: &mut [RepeatGroup]) -> io::Result<()> {
    writeln!(out, ">{}", REP_BASENAME)?;

    let mut oskip = 0usize;
    let mut acc_len = 0u64;

    for rg in groups.iter_mut() {
        rg.base_offset = acc_len;
        let seq_len = rg.seq.len();
        acc_len += seq_len as u64;

        let mut si = 0usize;
        while si < seq_len {
            let out_len = (FASTA_LINE_WIDTH - oskip).min(seq_len - si);
            out.write_all(codes_to_string(&rg.seq[si..si + out_len]).as_bytes())?;

            if oskip + out_len == FASTA_LINE_WIDTH {
                writeln!(out)?;
                oskip = 0;
            } else {
                oskip += out_len;
            }
            si += out_len;
        }
    }
    if oskip > 0 {
        writeln!(out)?;
    }
    Ok(())
}

fn genome_coord(frags: &mut FragmentMap, names: &[String], joined_off: u64) -> (String, u64) {
    match frags.to_genome_coord(joined_off) {
        Some((seq_id, pos)) => (names[seq_id].clone(), pos),
        None => precondition_fatal(
            "catalog",
            &format!("joined offset {} has no genome coordinate", joined_off),
        ),
    }
}

/// Write a group's occurrence list, ten per line. Reverse-strand positions
/// are given as forward-strand coordinates of the occurrence's left end.
fn write_positions<W: Write>(
    out: &mut W,
    positions: &[RepeatCoord],
    seq_len: u64,
    frags: &mut FragmentMap,
    names: &[String],
) -> io::Result<()> {
    let total = frags.joined_len();

    let mut converted: Vec<RepeatCoord> = positions
        .iter()
        .map(|p| {
            if p.joined_off < frags.forward_len() {
                RepeatCoord { joined_off: p.joined_off, fw: true }
            } else {
                RepeatCoord {
                    joined_off: total - p.joined_off - seq_len,
                    fw: false,
                }
            }
        })
        .collect();
    converted.sort();

    for (j, p) in converted.iter().enumerate() {
        if j > 0 && j % POSITIONS_PER_LINE == 0 {
            writeln!(out)?;
        }
        if j % POSITIONS_PER_LINE != 0 {
            write!(out, " ")?;
        }
        let (chr_name, pos_in_chr) = genome_coord(frags, names, p.joined_off);
        let direction = if p.fw { '+' } else { '-' };
        write!(out, "{}:{}:{}", chr_name, pos_in_chr, direction)?;
    }
    writeln!(out)
}

/// Reference position on the concatenated repeat stream for each edit of an
/// allele. Edit positions are read-relative, so earlier indels shift the
/// mapping.
fn edit_ref_positions(allele: &AlleleGroup, base_offset: u64) -> Vec<u64> {
    let mut out = Vec::with_capacity(allele.edits.len());
    let mut dels = 0i64;
    let mut ins = 0i64;
    for edit in &allele.edits {
        let ref_pos = edit.pos as i64 + dels - ins;
        debug_assert!(ref_pos >= 0);
        out.push(base_offset + allele.coord as u64 + ref_pos as u64);
        match edit.kind {
            EditKind::Deletion => dels += 1,
            EditKind::Insertion { .. } => ins += 1,
            EditKind::Mismatch { .. } => {}
        }
    }
    out
}

fn write_snps<W: Write>(
    out: &mut W,
    allele: &mut AlleleGroup,
    base_offset: u64,
    snp_idx: &mut usize,
) -> io::Result<()> {
    let ref_positions = edit_ref_positions(allele, base_offset);
    allele.snp_ids.clear();

    for (edit, &ref_pos) in allele.edits.iter().zip(ref_positions.iter()) {
        let id = format!("rps{}", *snp_idx);
        *snp_idx += 1;
        allele.snp_ids.push(id.clone());

        match edit.kind {
            EditKind::Mismatch { base } => {
                writeln!(
                    out,
                    "{}\tsingle\t{}\t{}\t{}",
                    id, REP_BASENAME, ref_pos, BASE_CHARS[base as usize] as char
                )?;
            }
            EditKind::Deletion => {
                writeln!(out, "{}\tdeletion\t{}\t{}\t1", id, REP_BASENAME, ref_pos)?;
            }
            EditKind::Insertion { base } => {
                writeln!(
                    out,
                    "{}\tinsertion\t{}\t{}\t{}",
                    id, REP_BASENAME, ref_pos, BASE_CHARS[base as usize] as char
                )?;
            }
        }
    }
    Ok(())
}

fn write_haplotype<W: Write>(
    out: &mut W,
    allele: &AlleleGroup,
    base_offset: u64,
    hapl_idx: &mut usize,
) -> io::Result<()> {
    if allele.snp_ids.is_empty() {
        return Ok(());
    }
    let ref_positions = edit_ref_positions(allele, base_offset);
    let left = ref_positions.iter().min().copied().unwrap_or(0);
    let right = ref_positions.iter().max().copied().unwrap_or(0);

    writeln!(
        out,
        "rpht{}\t{}\t{}\t{}\t{}",
        *hapl_idx,
        REP_BASENAME,
        left,
        right,
        allele.snp_ids.join(",")
    )?;
    *hapl_idx += 1;
    Ok(())
}

/// Write the info table plus the SNP and haplotype files. Requires
/// `save_repeat_fa` to have assigned base offsets already.
pub fn save_repeat_groups<W: Write>(
    info: &mut W,
    snp: &mut W,
    hapl: &mut W,
    groups: &mut [RepeatGroup],
    frags: &mut FragmentMap,
    names: &[String],
) -> io::Result<()> {
    let mut snp_idx = 0usize;
    let mut hapl_idx = 0usize;

    for (i, rg) in groups.iter_mut().enumerate() {
        writeln!(
            info,
            ">rpt_{}*0\t{}\t{}\t{}\t{}\t0",
            i,
            REP_BASENAME,
            rg.base_offset,
            rg.seq.len(),
            rg.positions.len()
        )?;
        write_positions(info, &rg.positions, rg.seq.len() as u64, frags, names)?;

        let base_offset = rg.base_offset;
        let parent_len = rg.seq.len();
        for (j, allele) in rg.alleles.iter_mut().enumerate() {
            allele.base_offset = base_offset;

            // snp ids first, so the info header can reference them
            write_snps(snp, allele, base_offset, &mut snp_idx)?;
            write_haplotype(hapl, allele, base_offset, &mut hapl_idx)?;

            writeln!(
                info,
                ">rpt_{}*{}\t{}\t{}\t{}\t{}\t{}\t{}",
                i,
                j + 1,
                REP_BASENAME,
                base_offset,
                parent_len,
                allele.positions.len(),
                allele.edits.len(),
                allele.snp_ids.join(",")
            )?;
            write_positions(info, &allele.positions, allele.seq.len() as u64, frags, names)?;
        }
    }
    Ok(())
}

/// Append one family's extension outcome to the report. Seeds sharing a
/// consensus are printed together with a trailing count; seeds whose extent
/// stayed below the reportable length are skipped. Roots contribute their
/// consensus length to `total_repeat_seq_len`.
#[allow(clippy::too_many_arguments)]
pub fn save_seed_extension<W: Write, S: SequenceSource>(
    out: &mut W,
    seq: &S,
    frags: &mut FragmentMap,
    names: &[String],
    grp_id: usize,
    num_positions: usize,
    seeds: &[SeedExt],
    min_rpt_len: u64,
    total_repeat_seq_len: &mut u64,
) -> io::Result<()> {
    let forward_len = frags.forward_len();
    let total = frags.joined_len();

    let mut max_left_ext_len = 0u64;
    for seed in seeds {
        max_left_ext_len = max_left_ext_len.max(seed.left_ext_len());
    }

    let mut prev_base_off = u64::MAX;
    let mut count = 0usize;
    for (i, seed) in seeds.iter().enumerate() {
        let ext_len = seed.ext_len();
        if ext_len < min_rpt_len {
            continue;
        }

        if prev_base_off == seed.base_off {
            count += 1;
        } else {
            if count > 0 {
                writeln!(out, "{}\n", count)?;
            }
            count = 1;
            prev_base_off = seed.base_off;
        }

        write!(
            out,
            "{}\t{}\t{} -> {}\t{}\t{}\t{}\t{}\t{}\t{}",
            grp_id,
            num_positions,
            i,
            seed.backbone,
            ext_len,
            seed.total_ed,
            seed.pos.0,
            seed.pos.1,
            seed.bound.0,
            seed.bound.1
        )?;

        let left_off = if seed.pos.0 < forward_len {
            seed.pos.0
        } else {
            total - seed.pos.0 - ext_len
        };
        let (chr_name, pos_in_chr) = genome_coord(frags, names, left_off);
        write!(out, "\t{}:{}", chr_name, pos_in_chr)?;

        let right_off = if seed.pos.1 < forward_len {
            seed.pos.1
        } else {
            total - seed.pos.1 - ext_len
        };
        let (chr_name, pos_in_chr) = genome_coord(frags, names, right_off);
        write!(out, "\t{}:{}", chr_name, pos_in_chr)?;

        let indent = (max_left_ext_len - seed.left_ext_len()) as usize;
        let dest = seq.fetch(seed.pos.0, ext_len as usize);
        writeln!(out, "\t{:indent$}{}", "", codes_to_string(&dest), indent = indent)?;

        if seed.backbone == i {
            *total_repeat_seq_len += ext_len;
        }
    }
    if count > 0 {
        writeln!(out, "{}\n", count)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joined_seq::JoinedSeq;
    use crate::repeat::Edit;
    use std::io::Cursor;

    fn codes(s: &str) -> Vec<u8> {
        s.bytes()
            .map(|b| crate::joined_seq::NT4_TABLE[b as usize])
            .collect()
    }

    fn fixture(seq: &str) -> (JoinedSeq, FragmentMap) {
        let fasta = format!(">chr1\n{}\n", seq);
        let js = JoinedSeq::from_fasta(Cursor::new(fasta.into_bytes())).unwrap();
        let frags = FragmentMap::build(js.records());
        (js, frags)
    }

    #[test]
    fn test_fa_wraps_and_assigns_offsets() {
        let mut groups = vec![
            RepeatGroup { seq: vec![0u8; 70], ..RepeatGroup::default() },
            RepeatGroup { seq: vec![1u8; 50], ..RepeatGroup::default() },
        ];
        let mut out = Vec::new();
        save_repeat_fa(&mut out, &mut groups).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ">rep");
        assert_eq!(lines[1].len(), 60);
        assert_eq!(lines[2].len(), 60);
        assert_eq!(lines.len(), 3);
        // second group starts mid-line
        assert_eq!(&lines[2][..10], "AAAAAAAAAA");
        assert_eq!(&lines[2][10..], "CCCCCCCCCC".repeat(5));

        assert_eq!(groups[0].base_offset, 0);
        assert_eq!(groups[1].base_offset, 70);
    }

    #[test]
    fn test_info_snp_haplotype_output() {
        let (_js, mut frags) = fixture(&"ACGT".repeat(10)); // 40 bases

        let allele = AlleleGroup {
            seq: codes("ACGGATCGAT"),
            edits: vec![
                Edit { pos: 2, kind: EditKind::Mismatch { base: 2 } },
                Edit { pos: 5, kind: EditKind::Insertion { base: 3 } },
                Edit { pos: 8, kind: EditKind::Deletion },
            ],
            coord: 0,
            positions: vec![RepeatCoord { joined_off: 25, fw: true }],
            snp_ids: Vec::new(),
            base_offset: 0,
        };
        let mut groups = vec![RepeatGroup {
            seq: codes("ACGTACGTAC"),
            base_offset: 0,
            positions: vec![
                RepeatCoord { joined_off: 0, fw: true },
                // reverse strand: converts to 80 - 50 - 10 = 20
                RepeatCoord { joined_off: 50, fw: true },
            ],
            alleles: vec![allele],
        }];

        let names = vec!["chr1".to_string()];
        let (mut info, mut snp, mut hapl) = (Vec::new(), Vec::new(), Vec::new());
        save_repeat_groups(&mut info, &mut snp, &mut hapl, &mut groups, &mut frags, &names)
            .unwrap();

        let info = String::from_utf8(info).unwrap();
        let info_lines: Vec<&str> = info.lines().collect();
        assert_eq!(info_lines[0], ">rpt_0*0\trep\t0\t10\t2\t0");
        assert_eq!(info_lines[1], "chr1:0:+ chr1:20:-");
        assert_eq!(info_lines[2], ">rpt_0*1\trep\t0\t10\t1\t3\trps0,rps1,rps2");
        assert_eq!(info_lines[3], "chr1:25:+");

        let snp = String::from_utf8(snp).unwrap();
        let snp_lines: Vec<&str> = snp.lines().collect();
        assert_eq!(snp_lines[0], "rps0\tsingle\trep\t2\tG");
        assert_eq!(snp_lines[1], "rps1\tinsertion\trep\t5\tT");
        assert_eq!(snp_lines[2], "rps2\tdeletion\trep\t7\t1");

        let hapl = String::from_utf8(hapl).unwrap();
        assert_eq!(hapl.trim_end(), "rpht0\trep\t2\t7\trps0,rps1,rps2");
    }

    #[test]
    fn test_seed_report_counts_and_total() {
        let block = "GGATCACGTTGCAACTTAGC";
        let text = format!("AAATAG{b}CCTATA{b}GGCGGC{b}TTCTTC", b = block);
        let (js, mut frags) = fixture(&text);

        // two seeds sharing one consensus, one residue seed
        let mk = |pos: (u64, u64), base_off: u64, backbone: usize| SeedExt {
            orig_pos: (pos.0 + 5, pos.1 - 5),
            pos,
            bound: (0, js.forward_len()),
            ed: 0,
            total_ed: 0,
            base_off,
            backbone,
            done: true,
        };
        let seeds = vec![mk((6, 26), 0, 0), mk((32, 52), 0, 0), mk((58, 78), 20, 2)];

        let names = vec!["chr1".to_string()];
        let mut out = Vec::new();
        let mut total = 0u64;
        save_seed_extension(&mut out, &js, &mut frags, &names, 0, 3, &seeds, 10, &mut total)
            .unwrap();

        // roots at 0 and 2 each contribute 20
        assert_eq!(total, 40);

        let text = String::from_utf8(out).unwrap();
        let counts: Vec<&str> = text
            .lines()
            .filter(|l| !l.is_empty() && !l.contains('\t'))
            .collect();
        assert_eq!(counts, vec!["2", "1"]);
        assert!(text.contains("0 -> 0"));
        assert!(text.contains("2 -> 2"));
    }
}
