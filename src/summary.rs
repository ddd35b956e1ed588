use crate::config::{DecodeConfig, LibraryType};
use crate::hit::{DecodeProfile, Hit, Strand};
use crate::record::AlignmentRecord;
use anyhow::Result;

/// Template lengths at or above this are left out of the insert-size histogram.
pub const MAX_INSERT_SIZE: usize = 500;
pub const STRAND_SAMPLE_SIZE: u64 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryMode {
    /// Every filtered alignment.
    Alignments,
    /// Only unspliced, ungapped alignments (a single CIGAR op).
    Fragments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentSummary {
    pub aligned_reads: u64,
    pub aligned_bases: u64,
    insert_sizes: Vec<u64>,
}

impl Default for AlignmentSummary {
    fn default() -> Self {
        Self {
            aligned_reads: 0,
            aligned_bases: 0,
            insert_sizes: vec![0; MAX_INSERT_SIZE],
        }
    }
}

impl AlignmentSummary {
    pub fn add(&mut self, hit: &Hit) {
        self.aligned_reads += 1;
        self.aligned_bases += hit.query_length.max(0) as u64;
        if hit.insert_size > 0 && (hit.insert_size as usize) < MAX_INSERT_SIZE {
            self.insert_sizes[hit.insert_size as usize] += 1;
        }
    }

    pub fn average_read_length(&self) -> Option<f64> {
        crate::report::ratio(self.aligned_bases, self.aligned_reads)
    }

    /// Mean and standard deviation of the insert-size histogram.
    pub fn insert_size(&self) -> Option<(f64, f64)> {
        let count: u64 = self.insert_sizes.iter().sum();
        if count == 0 {
            return None;
        }
        let buckets = || self.insert_sizes.iter().enumerate().map(|(i, &n)| (i as f64, n as f64));
        let mean = buckets().map(|(i, n)| i * n).sum::<f64>() / count as f64;
        let var = buckets()
            .map(|(i, n)| (i - mean) * (i - mean) * n)
            .sum::<f64>()
            / count as f64;
        Some((mean, var.sqrt()))
    }

    pub fn summary_line(&self) -> String {
        let avg = self
            .average_read_length()
            .map_or("N/A".to_string(), |v| format!("{v:.2}"));
        let isize = self
            .insert_size()
            .map_or("N/A".to_string(), |(m, sd)| format!("{m:.2} +- {sd:.2}"));
        format!(
            "aligned reads = {} aligned base pair = {} average read length = {} insert size = {}",
            self.aligned_reads, self.aligned_bases, avg, isize
        )
    }
}

fn passes_filter(record: &AlignmentRecord, config: &DecodeConfig, mode: SummaryMode) -> bool {
    let flags = record.flags;
    if flags.is_unmapped() {
        return false;
    }
    if flags.is_secondary() && !config.use_second_alignment {
        return false;
    }
    let n = record.cigar.len();
    if n < 1 || !config.accepts_cigar_len(n) {
        return false;
    }
    if record.mapping_quality < config.min_mapping_quality {
        return false;
    }
    mode == SummaryMode::Alignments || n == 1
}

pub fn summarize<I>(records: I, config: &DecodeConfig, mode: SummaryMode) -> Result<AlignmentSummary>
where
    I: IntoIterator<Item = Result<AlignmentRecord>>,
{
    let mut summary = AlignmentSummary::default();
    for record in records {
        let record = record?;
        if !passes_filter(&record, config, mode) {
            continue;
        }
        summary.add(&Hit::decode(&record, DecodeProfile::Span, config));
    }
    Ok(summary)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrandSummary {
    pub samples: u64,
    pub first: u64,
    pub second: u64,
    pub sample_size: u64,
}

impl StrandSummary {
    /// `first`/`second` when at least 80% of the requested sample was seen
    /// and at least 80% of it agrees; `unstranded` otherwise.
    pub fn library(&self) -> &'static str {
        if self.samples == 0 {
            return "unstranded";
        }
        let enough = self.samples as f64 >= 0.8 * self.sample_size as f64;
        let threshold = 0.8 * self.samples as f64;
        if enough && self.second as f64 >= threshold {
            "second"
        } else if enough && self.first as f64 >= threshold {
            "first"
        } else {
            "unstranded"
        }
    }

    pub fn summary_line(&self) -> String {
        format!(
            "samples = {}, first = {}, second = {}, library = {}",
            self.samples,
            self.first,
            self.second,
            self.library()
        )
    }
}

/// Compare mate-orientation strand under `FR_FIRST` with the aligner's `XS`
/// for up to `sample_size` properly paired primary records.
pub fn infer_strandedness<I>(records: I, config: &DecodeConfig, sample_size: u64) -> Result<StrandSummary>
where
    I: IntoIterator<Item = Result<AlignmentRecord>>,
{
    let config = DecodeConfig {
        library_type: LibraryType::FrFirst,
        ..config.clone()
    };
    let mut summary = StrandSummary {
        sample_size,
        ..Default::default()
    };
    for record in records {
        if summary.samples >= sample_size {
            break;
        }
        let record = record?;
        let flags = record.flags;
        if flags.is_unmapped() || flags.is_mate_unmapped() || flags.is_secondary() {
            continue;
        }
        if !config.accepts_cigar_len(record.cigar.len()) {
            continue;
        }
        let hit = Hit::decode(&record, DecodeProfile::Tags, &config);
        if hit.xs == Strand::Unknown {
            continue;
        }
        match (hit.strand, hit.xs) {
            (Strand::Forward, Strand::Forward) | (Strand::Reverse, Strand::Reverse) => summary.first += 1,
            (Strand::Forward, Strand::Reverse) | (Strand::Reverse, Strand::Forward) => summary.second += 1,
            _ => {}
        }
        summary.samples += 1;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{AuxValue, XS};

    const F1R2: u16 = 0x1 | 0x2 | 0x20 | 0x40;
    const R2F1: u16 = 0x1 | 0x2 | 0x10 | 0x80;

    fn rec(flags: u16, cigar: &str, tlen: i32) -> Result<AlignmentRecord> {
        Ok(AlignmentRecord::new("r", flags, 100, cigar.parse()?)
            .with_mapping_quality(60)
            .with_template_length(tlen))
    }

    #[test]
    fn counts_filtered_alignments() {
        let cfg = DecodeConfig::default();
        let records = vec![
            rec(F1R2, "50M", 200),
            rec(R2F1, "20M100N30M", -200),
            rec(F1R2 | 0x100, "50M", 200),
            rec(0x4, "*", 0),
            rec(F1R2, "50M", 300).map(|r| r.with_mapping_quality(0)),
            rec(F1R2, "50M", 900),
        ];
        let summary = summarize(records, &cfg, SummaryMode::Alignments).unwrap();
        assert_eq!(summary.aligned_reads, 3);
        assert_eq!(summary.aligned_bases, 150);
        assert_eq!(summary.average_read_length(), Some(50.0));
        assert_eq!(summary.insert_size(), Some((200.0, 0.0)));
    }

    #[test]
    fn fragment_mode_keeps_single_op_alignments() {
        let cfg = DecodeConfig::default();
        let records = vec![rec(F1R2, "50M", 100), rec(F1R2, "20M100N30M", 300), rec(F1R2, "50M", 300)];
        let summary = summarize(records, &cfg, SummaryMode::Fragments).unwrap();
        assert_eq!(summary.aligned_reads, 2);
        let (mean, sd) = summary.insert_size().unwrap();
        assert_eq!(mean, 200.0);
        assert_eq!(sd, 100.0);
    }

    #[test]
    fn empty_input_has_no_averages() {
        let summary = summarize(Vec::new(), &DecodeConfig::default(), SummaryMode::Alignments).unwrap();
        assert_eq!(summary.average_read_length(), None);
        assert_eq!(summary.insert_size(), None);
        assert!(summary.summary_line().contains("insert size = N/A"));
    }

    #[test]
    fn strand_inference_labels_library() {
        let cfg = DecodeConfig::new(LibraryType::FrSecond);
        // F1R2 decodes to '-' under FR_FIRST; XS '-' agrees.
        let agree = || rec(F1R2, "50M", 0).map(|r| r.with_tag(XS, AuxValue::Character(b'-')));
        let disagree = || rec(F1R2, "50M", 0).map(|r| r.with_tag(XS, AuxValue::Character(b'+')));
        let no_xs = || rec(F1R2, "50M", 0);

        let mut records: Vec<_> = (0..9).map(|_| agree()).collect();
        records.push(disagree());
        records.push(no_xs());
        let summary = infer_strandedness(records, &cfg, 10).unwrap();
        assert_eq!(summary.samples, 10);
        assert_eq!(summary.first, 9);
        assert_eq!(summary.second, 1);
        assert_eq!(summary.library(), "first");

        let records: Vec<_> = (0..5).map(|_| disagree()).collect();
        let summary = infer_strandedness(records, &cfg, 10).unwrap();
        assert_eq!(summary.library(), "unstranded");
        let records: Vec<_> = (0..10).map(|_| disagree()).collect();
        assert_eq!(infer_strandedness(records, &cfg, 10).unwrap().library(), "second");
    }

    #[test]
    fn empty_sample_is_unstranded() {
        let summary = infer_strandedness(Vec::new(), &DecodeConfig::default(), 0).unwrap();
        assert_eq!(summary.samples, 0);
        assert_eq!(summary.library(), "unstranded");

        let summary = infer_strandedness(Vec::new(), &DecodeConfig::default(), 10).unwrap();
        assert_eq!(summary.library(), "unstranded");
    }
}
