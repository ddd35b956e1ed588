//! Bridging evaluation: does the aligner report each fragment as one merged,
//! spliced record identical to the one implied by the annotation?

use crate::accuracy::{self, AlignEvalMap, PairEvaluation};
use crate::annotation::{self, ExonModel};
use crate::bam_input;
use crate::bridge::{BridgeRecord, FragmentSpan, synthesize_bridge};
use crate::config::DecodeConfig;
use crate::hit::{DecodeProfile, Hit};
use crate::record::AlignmentRecord;
use crate::report::{BRIDGE_MATCH, BRIDGE_MISMATCH, ReportDir, format_ratio, ratio};
use crate::types::{HashMap, HashMapExt, Pos};
use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::Write;
use std::path::Path;

/// Transcript id carried in a simulated read name: the third `:`-separated
/// field (`chr1:100-900W:ENST0001:...`).
pub fn transcript_id_from_read_name(name: &str) -> Option<&str> {
    name.split(':').nth(2).filter(|t| !t.is_empty())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialSpan {
    pub start: Option<Pos>,
    pub end: Option<Pos>,
}

impl PartialSpan {
    pub fn span(&self) -> Option<FragmentSpan> {
        Some(FragmentSpan {
            start: self.start?,
            end: self.end?,
        })
    }
}

/// Ground-truth fragment extents by read name, filled one mate at a time.
#[derive(Debug, Clone, Default)]
pub struct FragmentSpans {
    spans: BTreeMap<String, PartialSpan>,
}

impl FragmentSpans {
    /// Segment 1 sets the start, segment 2 sets the end; either may come first.
    pub fn observe(&mut self, record: &AlignmentRecord, config: &DecodeConfig) {
        if !record.is_mapped() {
            return;
        }
        let flags = record.flags;
        if !flags.is_first_segment() && !flags.is_last_segment() {
            return;
        }
        let hit = Hit::decode(record, DecodeProfile::Span, config);
        let entry = self.spans.entry(record.name.clone()).or_default();
        if flags.is_first_segment() {
            entry.start = Some(hit.position);
        } else {
            entry.end = Some(hit.reference_end);
        }
    }

    pub fn get(&self, name: &str) -> Option<PartialSpan> {
        self.spans.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PartialSpan)> {
        self.spans.iter()
    }
}

/// Expected bridges for every ground-truth fragment.
#[derive(Debug, Clone, Default)]
pub struct Bridges {
    pub records: HashMap<String, BridgeRecord>,
    pub fragments: u64,
    /// Fragments with only one mate in the ground truth.
    pub incomplete: u64,
    /// Read names with no transcript field.
    pub unnamed: u64,
    pub missing_transcripts: BTreeSet<String>,
}

pub fn synthesize_bridges(spans: &FragmentSpans, model: &ExonModel) -> Bridges {
    let mut bridges = Bridges {
        records: HashMap::with_capacity(spans.len()),
        ..Default::default()
    };
    for (name, partial) in spans.iter() {
        bridges.fragments += 1;
        let Some(span) = partial.span() else {
            tracing::debug!(read = %name, "fragment has a single mate; no bridge");
            bridges.incomplete += 1;
            continue;
        };

        let transcript_id = transcript_id_from_read_name(name);
        let exons = transcript_id.and_then(|t| model.exons(t));
        match (transcript_id, exons) {
            (None, _) => {
                tracing::debug!(read = %name, "read name carries no transcript id; bridge will be empty");
                bridges.unnamed += 1;
            }
            (Some(t), None) => {
                if bridges.missing_transcripts.insert(t.to_string()) {
                    tracing::warn!(transcript_id = t, "transcript not in annotation; bridge will be empty");
                }
            }
            _ => {}
        }
        let bridge = synthesize_bridge(span, exons.into_iter().flatten());
        bridges.records.insert(name.clone(), bridge);
    }
    if bridges.unnamed > 0 {
        tracing::warn!(
            fragments = bridges.unnamed,
            "ground-truth read names without a transcript id; bridges will be empty"
        );
    }
    bridges
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BridgeClass {
    Correct = 0,
    Incorrect = 1,
    Unbridged = 2,
}

impl BridgeClass {
    pub const ALL: [BridgeClass; 3] = [BridgeClass::Correct, BridgeClass::Incorrect, BridgeClass::Unbridged];

    pub fn label(self) -> &'static str {
        match self {
            BridgeClass::Correct => "bridged-correct",
            BridgeClass::Incorrect => "bridged-incorrect",
            BridgeClass::Unbridged => "unbridged",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairClass {
    Correct = 0,
    Incorrect = 1,
    Unaligned = 2,
}

impl PairClass {
    pub const ALL: [PairClass; 3] = [PairClass::Correct, PairClass::Incorrect, PairClass::Unaligned];

    /// From the pair-level accuracy flag of a `(read name, multimap index)` key.
    pub fn from_accuracy(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => PairClass::Correct,
            Some(false) => PairClass::Incorrect,
            None => PairClass::Unaligned,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PairClass::Correct => "aligned-correct",
            PairClass::Incorrect => "aligned-incorrect",
            PairClass::Unaligned => "unaligned",
        }
    }
}

/// Nine-way taxonomy of aligner records plus the bridging totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationCounters {
    cells: [[u64; 3]; 3],
    pub total_ground_truth_fragments: u64,
    pub total_bridged_output_records: u64,
    pub total_correctly_bridged: u64,
}

impl ClassificationCounters {
    pub fn record(&mut self, bridge: BridgeClass, pair: PairClass) {
        self.cells[bridge as usize][pair as usize] += 1;
        if bridge != BridgeClass::Unbridged {
            self.total_bridged_output_records += 1;
        }
        if bridge == BridgeClass::Correct {
            self.total_correctly_bridged += 1;
        }
    }

    pub fn get(&self, bridge: BridgeClass, pair: PairClass) -> u64 {
        self.cells[bridge as usize][pair as usize]
    }

    pub fn total_records(&self) -> u64 {
        self.cells.iter().flatten().sum()
    }

    pub fn sensitivity(&self) -> Option<f64> {
        ratio(self.total_correctly_bridged, self.total_ground_truth_fragments)
    }

    pub fn precision(&self) -> Option<f64> {
        ratio(self.total_correctly_bridged, self.total_bridged_output_records)
    }
}

impl fmt::Display for ClassificationCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bridge in BridgeClass::ALL {
            for pair in PairClass::ALL {
                writeln!(f, "{} & {} = {}", bridge.label(), pair.label(), self.get(bridge, pair))?;
            }
        }
        write!(
            f,
            "ground-truth fragments = {}, bridged records = {}, correctly bridged = {}, sensitivity = {}, precision = {}",
            self.total_ground_truth_fragments,
            self.total_bridged_output_records,
            self.total_correctly_bridged,
            format_ratio(self.sensitivity()),
            format_ratio(self.precision())
        )
    }
}

/// Second pass: classify each aligner record against the expected bridges
/// and the pair-level accuracy map.
pub struct BridgeComparator<'a, M: Write, X: Write> {
    config: &'a DecodeConfig,
    bridges: &'a Bridges,
    align_eval: &'a AlignEvalMap,
    counters: ClassificationCounters,
    match_report: M,
    mismatch_report: X,
    skipped: u64,
}

impl<'a, M: Write, X: Write> BridgeComparator<'a, M, X> {
    pub fn new(
        config: &'a DecodeConfig,
        bridges: &'a Bridges,
        align_eval: &'a AlignEvalMap,
        match_report: M,
        mismatch_report: X,
    ) -> Self {
        let counters = ClassificationCounters {
            total_ground_truth_fragments: bridges.fragments,
            ..Default::default()
        };
        Self {
            config,
            bridges,
            align_eval,
            counters,
            match_report,
            mismatch_report,
            skipped: 0,
        }
    }

    /// Records of any CIGAR length are classified: only the name, `HI` and
    /// CIGAR text are compared, so no capped copy of the CIGAR is decoded.
    pub fn observe(&mut self, record: &AlignmentRecord) -> Result<()> {
        if !record.is_mapped() {
            return Ok(());
        }
        if record.cigar.is_empty() {
            self.skipped += 1;
            return Ok(());
        }

        let hit = Hit::decode(record, DecodeProfile::Tags, self.config);
        let flag = self.align_eval.get(&(record.name.clone(), hit.hit_index)).copied();
        let pair = PairClass::from_accuracy(flag);

        // A merged record spanning both mates carries mate position 0.
        if hit.mate_position != 0 {
            self.counters.record(BridgeClass::Unbridged, pair);
            return Ok(());
        }

        let cigar = record.cigar.to_string();
        let expected = self.bridges.records.get(&record.name);
        let bridge = match expected {
            Some(b) if b.matches(hit.position, &cigar) => BridgeClass::Correct,
            _ => BridgeClass::Incorrect,
        };
        let report: &mut dyn Write = match bridge {
            BridgeClass::Correct => &mut self.match_report,
            _ => &mut self.mismatch_report,
        };
        write_bridge_line(report, &record.name, &hit, &cigar, expected)?;
        self.counters.record(bridge, pair);
        Ok(())
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn finish(mut self) -> Result<ClassificationCounters> {
        self.match_report.flush()?;
        self.mismatch_report.flush()?;
        Ok(self.counters)
    }
}

fn write_bridge_line(
    writer: &mut dyn Write,
    name: &str,
    hit: &Hit,
    cigar: &str,
    expected: Option<&BridgeRecord>,
) -> Result<()> {
    let (gt_pos, gt_cigar) = expected.map_or((-1, String::new()), |b| (b.start, b.cigar.to_string()));
    writeln!(
        writer,
        "{}:\nGT:({}, {})\tObserved:(HI:{}, {}, {})",
        name, gt_pos, gt_cigar, hit.hit_index, hit.position, cigar
    )?;
    Ok(())
}

/// Both passes over in-memory record streams.
pub fn run_bridging<G, A, M, X>(
    ground_truth: G,
    aligner: A,
    model: &ExonModel,
    align_eval: &AlignEvalMap,
    config: &DecodeConfig,
    match_report: M,
    mismatch_report: X,
) -> Result<(ClassificationCounters, Bridges)>
where
    G: IntoIterator<Item = Result<AlignmentRecord>>,
    A: IntoIterator<Item = Result<AlignmentRecord>>,
    M: Write,
    X: Write,
{
    let mut spans = FragmentSpans::default();
    for record in ground_truth {
        spans.observe(&record?, config);
    }
    let bridges = synthesize_bridges(&spans, model);

    let mut comparator = BridgeComparator::new(config, &bridges, align_eval, match_report, mismatch_report);
    for record in aligner {
        comparator.observe(&record?)?;
    }
    if comparator.skipped() > 0 {
        tracing::warn!(skipped = comparator.skipped(), "mapped aligner records without a CIGAR skipped");
    }
    let counters = comparator.finish()?;
    Ok((counters, bridges))
}

#[derive(Debug, Clone)]
pub struct BridgeEvaluation {
    pub pairs: PairEvaluation,
    pub counters: ClassificationCounters,
    pub missing_transcripts: usize,
    pub incomplete_fragments: u64,
    pub unnamed_fragments: u64,
}

impl BridgeEvaluation {
    /// Ground-truth fragments that could never be bridged correctly.
    pub fn unbridgeable_line(&self) -> String {
        format!(
            "incomplete fragments = {}, unnamed fragments = {}, missing transcripts = {}",
            self.incomplete_fragments, self.unnamed_fragments, self.missing_transcripts
        )
    }
}

/// Pair evaluation followed by bridging evaluation of the same two files.
pub fn evaluate_bridging(
    aligner_bam: &Path,
    ground_truth_bam: &Path,
    annotation_path: &Path,
    config: &DecodeConfig,
    reports: &ReportDir,
) -> Result<BridgeEvaluation> {
    let pairs = accuracy::evaluate_pairs(aligner_bam, ground_truth_bam, config, reports)?;
    let model = annotation::load_exon_model(annotation_path)?;

    let match_report = reports.create(BRIDGE_MATCH)?;
    let mismatch_report = reports.create(BRIDGE_MISMATCH)?;
    let (counters, bridges) = run_bridging(
        bam_input::read_records(ground_truth_bam)?,
        bam_input::read_records(aligner_bam)?,
        &model,
        &pairs.align_eval,
        config,
        match_report,
        mismatch_report,
    )?;

    if !bridges.missing_transcripts.is_empty() {
        tracing::warn!(
            transcripts = bridges.missing_transcripts.len(),
            "ground-truth transcripts absent from annotation"
        );
    }
    tracing::info!(
        fragments = counters.total_ground_truth_fragments,
        bridged = counters.total_bridged_output_records,
        correct = counters.total_correctly_bridged,
        incomplete = bridges.incomplete,
        unnamed = bridges.unnamed,
        sensitivity = %format_ratio(counters.sensitivity()),
        precision = %format_ratio(counters.precision()),
        "bridging evaluation complete"
    );
    Ok(BridgeEvaluation {
        pairs,
        counters,
        missing_transcripts: bridges.missing_transcripts.len(),
        incomplete_fragments: bridges.incomplete,
        unnamed_fragments: bridges.unnamed,
    })
}
