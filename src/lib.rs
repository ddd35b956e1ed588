//! bamkit-rs: evaluate spliced paired-end RNA-seq alignments against
//! simulated ground truth.
//!
//! Two questions are answered from a ground-truth BAM and an aligner BAM:
//! which read pairs the aligner placed exactly (pair evaluation), and whether
//! the aligner merged each pair into one spliced record matching the
//! annotated transcript (bridging evaluation).
//!
//! # Library usage
//!
//! ```no_run
//! use bamkit_rs::{DecodeConfig, resolve_pairs, evaluate_tables};
//! use bamkit_rs::bam_input::read_records;
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = DecodeConfig::default();
//! let truth = resolve_pairs(read_records(Path::new("truth.bam"))?, &config)?;
//! let aligner = resolve_pairs(read_records(Path::new("aligner.bam"))?, &config)?;
//! let (evaluation, _) = evaluate_tables(&truth, &aligner);
//! println!("{}", evaluation.summary_line());
//! # Ok(())
//! # }
//! ```

pub mod accuracy;
pub mod annotation;
pub mod bam_input;
pub mod bridge;
pub mod bridging;
pub mod cigar;
pub mod cli;
pub mod config;
pub mod hit;
pub mod pairing;
pub mod record;
pub mod report;
pub mod summary;
pub mod types;
pub mod xs_tag;

pub use accuracy::{AlignEvalMap, PairEvaluation, evaluate_tables};
pub use annotation::{Exon, ExonModel};
pub use bridge::{BridgeRecord, FragmentSpan, synthesize_bridge};
pub use bridging::{BridgeClass, ClassificationCounters, PairClass, run_bridging};
pub use cigar::{Cigar, CigarOp};
pub use config::{DecodeConfig, LibraryType};
pub use hit::{DecodeProfile, Hit, Strand};
pub use pairing::{PairTable, resolve_pairs};
pub use record::AlignmentRecord;
