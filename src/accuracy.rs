//! Pair-level accuracy: which ground-truth pairs the aligner recovered.

use crate::bam_input;
use crate::config::DecodeConfig;
use crate::pairing::{PairIdentity, PairTable, resolve_pairs};
use crate::report::{COMMON_PAIRS, ReportDir, WRONG_PAIRS, format_ratio, ratio};
use crate::types::PairKey;
use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;

/// `(read name, multimap index) -> recovered correctly`.
///
/// Holds every key decoded from either stream; only aligner keys whose pair
/// identity is also in the ground truth are `true`.
pub type AlignEvalMap = BTreeMap<PairKey, bool>;

/// The three pairwise-disjoint parts of two pair-identity sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairComparison {
    pub common: BTreeSet<PairIdentity>,
    pub unaligned: BTreeSet<PairIdentity>,
    pub wrong: BTreeSet<PairIdentity>,
}

pub fn compare_pair_sets(
    ground_truth: &BTreeSet<PairIdentity>,
    aligner: &BTreeSet<PairIdentity>,
) -> PairComparison {
    PairComparison {
        common: ground_truth.intersection(aligner).cloned().collect(),
        unaligned: ground_truth.difference(aligner).cloned().collect(),
        wrong: aligner.difference(ground_truth).cloned().collect(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct PairEvaluation {
    pub ground_truth: u64,
    pub aligner: u64,
    pub unaligned: u64,
    pub common: u64,
    pub wrong: u64,
    pub sensitivity: Option<f64>,
    pub precision: Option<f64>,
    pub align_eval: AlignEvalMap,
}

impl PairEvaluation {
    pub fn summary_line(&self) -> String {
        format!(
            "ground-truth pairs = {}, aligner pairs = {}, unaligned = {}, common = {}, wrong = {}, sensitivity = {}, precision = {}",
            self.ground_truth,
            self.aligner,
            self.unaligned,
            self.common,
            self.wrong,
            format_ratio(self.sensitivity),
            format_ratio(self.precision)
        )
    }
}

/// Compare two resolved streams and fill the accuracy map.
pub fn evaluate_tables(ground_truth: &PairTable, aligner: &PairTable) -> (PairEvaluation, PairComparison) {
    let gt_set = ground_truth.identity_set();
    let aligner_set = aligner.identity_set();
    let comparison = compare_pair_sets(&gt_set, &aligner_set);

    let mut align_eval: AlignEvalMap = ground_truth
        .seen
        .iter()
        .chain(aligner.seen.iter())
        .map(|key| (key.clone(), false))
        .collect();
    let aligner_keys = aligner.identity_keys();
    for identity in &comparison.common {
        for key in aligner_keys.get(identity).into_iter().flatten() {
            align_eval.insert(key.clone(), true);
        }
    }

    let common = comparison.common.len() as u64;
    let evaluation = PairEvaluation {
        ground_truth: gt_set.len() as u64,
        aligner: aligner_set.len() as u64,
        unaligned: comparison.unaligned.len() as u64,
        common,
        wrong: comparison.wrong.len() as u64,
        sensitivity: ratio(common, gt_set.len() as u64),
        precision: ratio(common, aligner_set.len() as u64),
        align_eval,
    };
    (evaluation, comparison)
}

/// One `qname HI:<index>` line per identity, using the lowest index that
/// produced it in `table`.
pub fn write_identity_report<W: Write>(
    writer: &mut W,
    identities: &BTreeSet<PairIdentity>,
    table: &PairTable,
) -> Result<()> {
    let keys = table.identity_keys();
    for identity in identities {
        let hit_index = keys
            .get(identity)
            .and_then(|ks| ks.first())
            .map_or(-1, |(_, hi)| *hi);
        writeln!(writer, "{} HI:{}", identity.0, hit_index)?;
    }
    writer.flush()?;
    Ok(())
}

/// Resolve both BAM files, compare them, and write the common and spurious
/// pair reports.
pub fn evaluate_pairs(
    aligner_bam: &Path,
    ground_truth_bam: &Path,
    config: &DecodeConfig,
    reports: &ReportDir,
) -> Result<PairEvaluation> {
    let aligner = resolve_pairs(bam_input::read_records(aligner_bam)?, config)?;
    let ground_truth = resolve_pairs(bam_input::read_records(ground_truth_bam)?, config)?;
    let (evaluation, comparison) = evaluate_tables(&ground_truth, &aligner);

    let mut common = reports.create(COMMON_PAIRS)?;
    write_identity_report(&mut common, &comparison.common, &aligner)?;
    let mut wrong = reports.create(WRONG_PAIRS)?;
    write_identity_report(&mut wrong, &comparison.wrong, &aligner)?;

    tracing::info!(
        ground_truth = evaluation.ground_truth,
        aligner = evaluation.aligner,
        unaligned = evaluation.unaligned,
        common = evaluation.common,
        wrong = evaluation.wrong,
        sensitivity = %format_ratio(evaluation.sensitivity),
        precision = %format_ratio(evaluation.precision),
        "pair evaluation complete"
    );
    Ok(evaluation)
}
