use anyhow::Result;
use bamkit_rs::bam_input;
use bamkit_rs::cli::{Args, Command};
use bamkit_rs::report::ReportDir;
use bamkit_rs::summary::{self, SummaryMode};
use bamkit_rs::{accuracy, bridging, xs_tag};
use clap::Parser;
use mimalloc::MiMalloc;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args.quiet {
            EnvFilter::new("warn")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Count { bam, decode } => {
            let config = decode.to_config();
            let s = summary::summarize(bam_input::read_records(&bam)?, &config, SummaryMode::Alignments)?;
            tracing::info!(aligned_reads = s.aligned_reads, aligned_bases = s.aligned_bases, "bamkit-rs: count complete");
            println!("{}", s.summary_line());
        }
        Command::Fragment { bam, decode } => {
            let config = decode.to_config();
            let s = summary::summarize(bam_input::read_records(&bam)?, &config, SummaryMode::Fragments)?;
            tracing::info!(aligned_reads = s.aligned_reads, "bamkit-rs: fragment count complete");
            println!("{}", s.summary_line());
        }
        Command::Strand { bam, samples, decode } => {
            let config = decode.to_config();
            let s = summary::infer_strandedness(bam_input::read_records(&bam)?, &config, samples)?;
            tracing::info!(samples = s.samples, library = s.library(), "bamkit-rs: strand inference complete");
            println!("{}", s.summary_line());
        }
        Command::Ts2Xs { in_bam, out_bam } => {
            xs_tag::rewrite_ts_as_xs(&in_bam, &out_bam)?;
        }
        Command::PairEval { inputs, decode } => {
            let config = decode.to_config();
            let reports = ReportDir::new(&inputs.out_dir);
            let eval = accuracy::evaluate_pairs(&inputs.aligner, &inputs.truth, &config, &reports)?;
            println!("{}", eval.summary_line());
        }
        Command::BridgeEval {
            inputs,
            annotation,
            decode,
        } => {
            let config = decode.to_config();
            let reports = ReportDir::new(&inputs.out_dir);
            let eval = bridging::evaluate_bridging(&inputs.aligner, &inputs.truth, &annotation, &config, &reports)?;
            println!("{}", eval.pairs.summary_line());
            println!("{}", eval.counters);
            println!("{}", eval.unbridgeable_line());
        }
    }
    Ok(())
}
