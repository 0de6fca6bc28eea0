// End-to-end pipeline checks: FASTA in, full repeat catalog out.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use repeat_forge::builder::RepeatBuilder;
use repeat_forge::opts::RepeatOpt;

fn setup_test_dir(test_name: &str) -> io::Result<PathBuf> {
    let temp_dir = PathBuf::from(format!("target/test_pipeline_{test_name}"));
    if temp_dir.exists() {
        fs::remove_dir_all(&temp_dir)?;
    }
    fs::create_dir_all(&temp_dir)?;
    Ok(temp_dir)
}

fn cleanup_test_dir(temp_dir: &Path) {
    if temp_dir.exists() {
        if let Err(e) = fs::remove_dir_all(temp_dir) {
            eprintln!(
                "Failed to clean up test directory {}: {}",
                temp_dir.display(),
                e
            );
        }
    }
}

// A 20-base motif repeated three times exactly, then three more times with
// two substitutions (positions 5 and 15). Every copy is followed by a
// spacer whose first base differs from the other spacers', so suffix runs
// break at exactly 20 bases.
const MOTIF: &str = "ATCGGATTCACCTGAAGTCC";
const VARIANT: &str = "ATCGGCTTCACCTGAGGTCC";

fn reference_sequence() -> String {
    format!(
        "TTGACCA{m}AGGTTCAACCG{m}CTTGGAACGTA{m}GCAATTGGACG{v}ATTCCGGAATC{v}CAAGGTTCCAA{v}GTTAACCGGTT",
        m = MOTIF,
        v = VARIANT
    )
}

fn pipeline_opt() -> RepeatOpt {
    RepeatOpt {
        seed_len: 20,
        min_repeat_len: 20,
        min_repeat_count: 3,
        max_edit_distance: 10,
        min_match_len: 8,
        max_seed_mismatch: 0,
        ..RepeatOpt::default()
    }
}

fn run_pipeline(test_name: &str) -> io::Result<(PathBuf, PathBuf)> {
    let temp_dir = setup_test_dir(test_name)?;
    let fasta_path = temp_dir.join("ref.fa");
    fs::write(&fasta_path, format!(">chr1\n{}\n", reference_sequence()))?;

    let prefix = temp_dir.join("ref");
    let mut builder =
        RepeatBuilder::from_fasta(&fasta_path, pipeline_opt()).expect("reading reference");
    builder.build().expect("repeat discovery");
    builder.save(&prefix).expect("writing catalog");

    Ok((temp_dir, prefix))
}

fn read_catalog_file(prefix: &Path, suffix: &str) -> String {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(suffix);
    fs::read_to_string(PathBuf::from(name)).expect("catalog file")
}

#[test]
fn test_variant_copies_fold_into_one_family() -> io::Result<()> {
    let (temp_dir, prefix) = run_pipeline("allele_fold")?;

    let mut builder =
        RepeatBuilder::from_fasta(&temp_dir.join("ref.fa"), pipeline_opt()).unwrap();
    builder.build().unwrap();

    let groups = builder.groups();
    assert_eq!(groups.len(), 1);
    let grp = &groups[0];
    assert_eq!(grp.positions.len(), 3);
    assert_eq!(grp.alleles.len(), 1);
    assert_eq!(grp.alleles[0].positions.len(), 3);
    assert_eq!(grp.alleles[0].edits.len(), 2);
    assert_eq!(grp.occurrence_count(), 6);

    cleanup_test_dir(&temp_dir);
    let _ = prefix;
    Ok(())
}

#[test]
fn test_catalog_files_match_expected_layout() -> io::Result<()> {
    let (temp_dir, prefix) = run_pipeline("catalog_layout")?;

    let fa = read_catalog_file(&prefix, ".rep.fa");
    assert_eq!(fa, format!(">rep\n{}\n", MOTIF));

    let info = read_catalog_file(&prefix, ".rep.info");
    let info_lines: Vec<&str> = info.lines().collect();
    assert_eq!(info_lines[0], ">rpt_0*0\trep\t0\t20\t3\t0");
    assert_eq!(info_lines[1], "chr1:7:+ chr1:38:+ chr1:69:+");
    assert_eq!(info_lines[2], ">rpt_0*1\trep\t0\t20\t3\t2\trps0,rps1");
    assert_eq!(info_lines[3], "chr1:100:+ chr1:131:+ chr1:162:+");

    let snp = read_catalog_file(&prefix, ".rep.snp");
    let snp_lines: Vec<&str> = snp.lines().collect();
    assert_eq!(snp_lines, vec!["rps0\tsingle\trep\t5\tC", "rps1\tsingle\trep\t15\tG"]);

    let hapl = read_catalog_file(&prefix, ".rep.haplotype");
    assert_eq!(hapl.trim_end(), "rpht0\trep\t5\t15\trps0,rps1");

    cleanup_test_dir(&temp_dir);
    Ok(())
}

#[test]
fn test_seed_report_totals() -> io::Result<()> {
    let (temp_dir, prefix) = run_pipeline("seed_report")?;

    // flanks diverge at every copy, so no seed grows past its 20 bases and
    // each stays its own backbone root
    let seed = read_catalog_file(&prefix, ".rep.seed");
    let data_lines: Vec<&str> = seed.lines().filter(|l| l.contains(" -> ")).collect();
    assert_eq!(data_lines.len(), 3);
    for line in &data_lines {
        assert!(line.contains(&format!("\t{}\t", MOTIF.len())), "line: {}", line);
        assert!(line.trim_end().ends_with(MOTIF), "line: {}", line);
    }
    assert!(seed
        .lines()
        .any(|l| l == "total repeat sequence length: 60"));

    cleanup_test_dir(&temp_dir);
    Ok(())
}

#[test]
fn test_grouping_disabled_keeps_families_apart() -> io::Result<()> {
    let temp_dir = setup_test_dir("no_grouping")?;
    let fasta_path = temp_dir.join("ref.fa");
    fs::write(&fasta_path, format!(">chr1\n{}\n", reference_sequence()))?;

    let opt = RepeatOpt { grouping: false, ..pipeline_opt() };
    let mut builder = RepeatBuilder::from_fasta(&fasta_path, opt).unwrap();
    builder.build().unwrap();

    let groups = builder.groups();
    assert_eq!(groups.len(), 2);
    assert!(groups.iter().all(|g| g.positions.len() == 3));
    assert!(groups.iter().all(|g| g.alleles.is_empty()));

    cleanup_test_dir(&temp_dir);
    Ok(())
}

#[test]
fn test_ambiguous_gap_bounds_are_respected() -> io::Result<()> {
    // the same repeat structure but with an N-run inside the third copy's
    // spacer; fragments still resolve to correct chromosome coordinates
    let temp_dir = setup_test_dir("gap_bounds")?;
    let seq = format!(
        "TTGACCA{m}AGGTTCAACCG{m}CTTGGNNNNNAACGTA{m}GCAATTGGACG",
        m = MOTIF
    );
    let fasta_path = temp_dir.join("ref.fa");
    fs::write(&fasta_path, format!(">chr1\n{}\n", seq))?;

    let opt = RepeatOpt {
        max_edit_distance: 0,
        grouping: false,
        ..pipeline_opt()
    };
    let prefix = temp_dir.join("ref");
    let mut builder = RepeatBuilder::from_fasta(&fasta_path, opt).unwrap();
    builder.build().unwrap();
    builder.save(&prefix).expect("writing catalog");

    let groups = builder.groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].positions.len(), 3);

    // chromosome coordinates count the skipped bases
    let info = read_catalog_file(&prefix, ".rep.info");
    let info_lines: Vec<&str> = info.lines().collect();
    assert_eq!(info_lines[1], "chr1:7:+ chr1:38:+ chr1:74:+");

    cleanup_test_dir(&temp_dir);
    Ok(())
}
