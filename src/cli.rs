use crate::config::{DecodeConfig, LibraryType};
use crate::summary::STRAND_SAMPLE_SIZE;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "bamkit-rs",
    about = "Evaluate spliced paired-end alignments against simulated ground truth",
    version
)]
pub struct Args {
    /// Set logging level to WARN
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Aligned reads, bases, read length and insert size
    Count {
        bam: PathBuf,
        #[command(flatten)]
        decode: DecodeArgs,
    },
    /// Like `count`, restricted to single-op (unspliced, ungapped) alignments
    Fragment {
        bam: PathBuf,
        #[command(flatten)]
        decode: DecodeArgs,
    },
    /// Infer library strandedness from XS tags
    Strand {
        bam: PathBuf,
        /// Number of records with an XS tag to sample
        #[arg(long, default_value_t = STRAND_SAMPLE_SIZE)]
        samples: u64,
        #[command(flatten)]
        decode: DecodeArgs,
    },
    /// Add XS tags derived from ts tags
    #[command(name = "ts2xs")]
    Ts2Xs { in_bam: PathBuf, out_bam: PathBuf },
    /// Compare aligner pairs against ground-truth pairs
    PairEval {
        #[command(flatten)]
        inputs: EvalInputs,
        #[command(flatten)]
        decode: DecodeArgs,
    },
    /// Compare merged (bridged) aligner records against annotation-derived bridges
    BridgeEval {
        #[command(flatten)]
        inputs: EvalInputs,
        /// Reference annotation the reads were simulated from (GTF)
        #[arg(short = 'G', long = "guide", value_name = "GTF")]
        annotation: PathBuf,
        #[command(flatten)]
        decode: DecodeArgs,
    },
}

#[derive(ClapArgs, Debug)]
pub struct EvalInputs {
    /// BAM produced by the aligner under evaluation
    #[arg(short = 'a', long, value_name = "BAM")]
    pub aligner: PathBuf,

    /// Ground-truth BAM from the simulator
    #[arg(short = 't', long, value_name = "BAM")]
    pub truth: PathBuf,

    /// Directory for report files
    #[arg(short = 'o', long, default_value = ".")]
    pub out_dir: PathBuf,
}

#[derive(ClapArgs, Debug)]
pub struct DecodeArgs {
    /// Library protocol used to infer transcript strand
    #[arg(long, value_enum, default_value_t = LibraryType::FrFirst)]
    pub library: LibraryType,

    /// Minimum match length on each side of a splice junction
    #[arg(long, default_value_t = 3)]
    pub min_flank: u32,

    /// Skip records with more CIGAR operations than this
    #[arg(long, default_value_t = 7)]
    pub max_cigar: usize,

    /// Minimum mapping quality for count/fragment
    #[arg(long, default_value_t = 1)]
    pub min_mapq: u8,

    /// Include secondary alignments in count/fragment
    #[arg(long)]
    pub secondary: bool,
}

impl DecodeArgs {
    pub fn to_config(&self) -> DecodeConfig {
        DecodeConfig {
            library_type: self.library,
            min_flank_length: self.min_flank,
            max_num_cigar: self.max_cigar,
            min_mapping_quality: self.min_mapq,
            use_second_alignment: self.secondary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_eval_parses_with_defaults() {
        let args = Args::try_parse_from([
            "bamkit-rs", "bridge-eval", "-a", "al.bam", "-t", "gt.bam", "-G", "genes.gtf",
        ])
        .unwrap();
        let Command::BridgeEval { inputs, annotation, decode } = args.command else {
            panic!("expected bridge-eval");
        };
        assert_eq!(inputs.aligner, PathBuf::from("al.bam"));
        assert_eq!(inputs.out_dir, PathBuf::from("."));
        assert_eq!(annotation, PathBuf::from("genes.gtf"));
        let cfg = decode.to_config();
        assert_eq!(cfg.library_type, LibraryType::FrFirst);
        assert_eq!(cfg.max_num_cigar, 7);
    }

    #[test]
    fn library_and_quiet_flags() {
        let args = Args::try_parse_from(["bamkit-rs", "strand", "x.bam", "--library", "second", "-q"]).unwrap();
        assert!(args.quiet);
        let Command::Strand { samples, decode, .. } = args.command else {
            panic!("expected strand");
        };
        assert_eq!(samples, STRAND_SAMPLE_SIZE);
        assert_eq!(decode.library, LibraryType::FrSecond);
    }

    #[test]
    fn ts2xs_takes_two_paths() {
        let args = Args::try_parse_from(["bamkit-rs", "ts2xs", "in.bam", "out.bam"]).unwrap();
        assert!(matches!(args.command, Command::Ts2Xs { .. }));
    }
}
