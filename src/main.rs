use clap::{Parser, Subcommand};
use std::path::PathBuf;

use repeat_forge::builder::RepeatBuilder;
use repeat_forge::opts::RepeatOpt;

#[derive(Parser)]
#[command(name = "repeat-forge")]
#[command(about = "Repeat catalog builder for DNA reference genomes", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover repeat families in a reference and write the catalog
    Build {
        /// Input FASTA file (gzip accepted, '-' for stdin)
        #[arg(value_name = "REF.FA")]
        fasta: PathBuf,

        /// Prefix for catalog files (default: same as FASTA)
        #[arg(short = 'p', long, value_name = "PREFIX")]
        prefix: Option<PathBuf>,

        /// Minimum shared prefix length for two suffixes to cluster
        #[arg(long, value_name = "INT", default_value = "50")]
        seed_len: u64,

        /// Minimum consensus length for a reportable repeat
        #[arg(long, value_name = "INT", default_value = "100")]
        min_repeat_len: u64,

        /// Minimum number of occurrences for a repeat family
        #[arg(long, value_name = "INT", default_value = "5")]
        min_repeat_count: usize,

        /// Edit budget for folding one group under another as an allele
        #[arg(long, value_name = "INT", default_value = "10")]
        max_edit_distance: u32,

        /// Skip the pairwise allele merge pass
        #[arg(long)]
        no_grouping: bool,

        /// Minimum edit-free run an allele alignment must contain
        #[arg(long, value_name = "INT", default_value = "50")]
        min_match_len: usize,

        /// Per-round mismatch budget during seed extension
        #[arg(long, value_name = "INT", default_value = "5")]
        max_seed_mismatch: u32,

        /// Flank length attempted per extension round
        #[arg(long, value_name = "INT", default_value = "25")]
        max_seed_extend_len: usize,

        /// Verbose level: 1=error, 2=warning, 3=message, 4+=debugging
        #[arg(short = 'v', long, value_name = "INT", default_value = "3")]
        verbosity: i32,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            fasta,
            prefix,
            seed_len,
            min_repeat_len,
            min_repeat_count,
            max_edit_distance,
            no_grouping,
            min_match_len,
            max_seed_mismatch,
            max_seed_extend_len,
            verbosity,
        } => {
            let log_level = match verbosity {
                v if v <= 1 => log::LevelFilter::Error,
                2 => log::LevelFilter::Warn,
                3 => log::LevelFilter::Info,
                4 => log::LevelFilter::Debug,
                _ => log::LevelFilter::Trace,
            };
            env_logger::Builder::from_default_env()
                .filter_level(log_level)
                .format_timestamp(None)
                .format_target(false)
                .init();

            let mut opt = RepeatOpt::default();
            opt.seed_len = seed_len;
            opt.min_repeat_len = min_repeat_len;
            opt.min_repeat_count = min_repeat_count;
            opt.max_edit_distance = max_edit_distance;
            opt.grouping = !no_grouping;
            opt.min_match_len = min_match_len;
            opt.max_seed_mismatch = max_seed_mismatch;
            opt.max_seed_extend_len = max_seed_extend_len;
            opt.verbosity = verbosity;

            let out_prefix = prefix.unwrap_or_else(|| fasta.clone());
            log::info!("building repeat catalog for {}", fasta.display());
            log::info!("catalog prefix: {}", out_prefix.display());

            let mut builder = match RepeatBuilder::from_fasta(&fasta, opt) {
                Ok(b) => b,
                Err(e) => {
                    log::error!("{:#}", e);
                    std::process::exit(1);
                }
            };
            if let Err(e) = builder.build() {
                log::error!("repeat discovery failed: {:#}", e);
                std::process::exit(1);
            }
            if let Err(e) = builder.save(&out_prefix) {
                log::error!("writing catalog failed: {:#}", e);
                std::process::exit(1);
            }

            log::info!("repeat catalog completed successfully");
        }
    }
}
