//! Pipeline driver: joined sequence in, repeat catalog files out.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bio::data_structures::suffix_array::suffix_array;

use crate::align::{FittingAligner, Scoring};
use crate::catalog;
use crate::cluster::{Clusterer, SortedSuffixes};
use crate::extend::{seed_extension, SeedExt};
use crate::fragments::FragmentMap;
use crate::joined_seq::{JoinedSeq, SequenceSource, BASE_CHARS};
use crate::merge;
use crate::opts::RepeatOpt;
use crate::repeat::RepeatGroup;
use crate::utils;

fn catalog_path(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

pub struct RepeatBuilder {
    opt: RepeatOpt,
    joined: JoinedSeq,
    frags: FragmentMap,
    groups: Vec<RepeatGroup>,
}

impl RepeatBuilder {
    pub fn from_fasta(path: &Path, opt: RepeatOpt) -> Result<Self> {
        let reader = utils::xzopen(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let joined = JoinedSeq::from_fasta(reader)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        if joined.is_empty() {
            anyhow::bail!("no unambiguous sequence in {}", path.display());
        }
        let frags = FragmentMap::build(joined.records());

        Ok(RepeatBuilder {
            opt,
            joined,
            frags,
            groups: Vec::new(),
        })
    }

    pub fn groups(&self) -> &[RepeatGroup] {
        &self.groups
    }

    /// Discover repeat groups: suffix scan over the joined sequence, run
    /// clustering, then the pairwise allele merge.
    pub fn build(&mut self) -> Result<()> {
        let total = self.joined.len();
        log::info!("building suffix array over {} joined bases", total);

        let mut text = Vec::with_capacity(total as usize + 1);
        for i in 0..total {
            text.push(BASE_CHARS[self.joined.base_at(i) as usize]);
        }
        text.push(b'$');
        let sa = suffix_array(&text);
        let offsets: Vec<u64> = sa
            .into_iter()
            .filter(|&p| p < total as usize)
            .map(|p| p as u64)
            .collect();

        let mut clusterer = Clusterer::new(&self.joined, &mut self.frags, &self.opt);
        clusterer.run(&mut SortedSuffixes::new(offsets));
        self.groups = clusterer.into_groups();
        log::info!("{} groups found", self.groups.len());

        if self.opt.grouping && self.opt.max_edit_distance > 0 {
            let aligner =
                FittingAligner::new(Scoring::with_edit_budget(self.opt.max_edit_distance));
            merge::group_pairs(&mut self.groups, &aligner, &self.opt);
        }

        Ok(())
    }

    /// Write the catalog next to `prefix`: the consensus FASTA (which fixes
    /// each group's offset into the concatenated stream), the extension
    /// report, and the info/snp/haplotype tables.
    pub fn save(&mut self, prefix: &Path) -> Result<()> {
        let fa_path = catalog_path(prefix, ".rep.fa");
        let mut fa = BufWriter::new(
            File::create(&fa_path)
                .with_context(|| format!("failed to create {}", fa_path.display()))?,
        );
        catalog::save_repeat_fa(&mut fa, &mut self.groups)?;

        self.save_seed_report(&catalog_path(prefix, ".rep.seed"))?;

        let info_path = catalog_path(prefix, ".rep.info");
        let snp_path = catalog_path(prefix, ".rep.snp");
        let hapl_path = catalog_path(prefix, ".rep.haplotype");
        let mut info = BufWriter::new(
            File::create(&info_path)
                .with_context(|| format!("failed to create {}", info_path.display()))?,
        );
        let mut snp = BufWriter::new(
            File::create(&snp_path)
                .with_context(|| format!("failed to create {}", snp_path.display()))?,
        );
        let mut hapl = BufWriter::new(
            File::create(&hapl_path)
                .with_context(|| format!("failed to create {}", hapl_path.display()))?,
        );
        catalog::save_repeat_groups(
            &mut info,
            &mut snp,
            &mut hapl,
            &mut self.groups,
            &mut self.frags,
            self.joined.names(),
        )?;

        Ok(())
    }

    /// Run seed extension for every family with enough occurrences and
    /// write the report.
    fn save_seed_report(&mut self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(
            File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?,
        );

        let mut total_rep_seq_len = 0u64;
        for i in 0..self.groups.len() {
            let num_positions = self.groups[i].positions.len();
            if num_positions < self.opt.min_repeat_count {
                continue;
            }

            let seed_take = (self.opt.seed_len as usize).min(self.groups[i].seq.len());
            let seed_str = self.groups[i].seq[..seed_take].to_vec();

            let mut seeds: Vec<SeedExt> = Vec::with_capacity(num_positions);
            for k in 0..num_positions {
                let off = self.groups[i].positions[k].joined_off;
                let bound = match self.frags.extension_bound(off) {
                    Some(b) => b,
                    None => utils::precondition_fatal(
                        "seed-extension",
                        &format!("occurrence at {} outside the joined sequence", off),
                    ),
                };
                seeds.push(SeedExt::new(off, off + seed_take as u64, bound, k));
            }

            let mut consensus = Vec::new();
            seed_extension(&self.joined, &seed_str, &mut seeds, &mut consensus, &self.opt);

            catalog::save_seed_extension(
                &mut out,
                &self.joined,
                &mut self.frags,
                self.joined.names(),
                i,
                num_positions,
                &seeds,
                self.opt.min_repeat_len,
                &mut total_rep_seq_len,
            )?;
        }

        writeln!(out, "total repeat sequence length: {}", total_rep_seq_len)?;
        Ok(())
    }
}
