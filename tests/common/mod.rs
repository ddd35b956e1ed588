//! Builders for small BAM fixtures written with noodles.
#![allow(dead_code)]

use bamkit_rs::record::HI;
use bamkit_rs::{Cigar, CigarOp};
use noodles::bam;
use noodles::core::Position;
use noodles::sam;
use noodles::sam::alignment::io::Write as _;
use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record::{Flags, MappingQuality};
use noodles::sam::alignment::record_buf::RecordBuf;
use noodles::sam::alignment::record_buf::data::field::Value;
use noodles::sam::header::record::value::{Map, map::ReferenceSequence};
use std::fs::File;
use std::num::NonZeroUsize;
use std::path::Path;

pub const F1R2: u16 = 0x1 | 0x2 | 0x20 | 0x40;
pub const R2F1: u16 = 0x1 | 0x2 | 0x10 | 0x80;

/// Fragment of transcript `T1` spanning its two exons.
pub const READ_A: &str = "chr1:100-300W:T1:1";
pub const READ_B: &str = "chr1:400-600W:T1:2";

/// `T1` has exons [100,150) and [170,230) in 0-based half-open coordinates.
pub const GTF: &str = "\
chr1\tsim\ttranscript\t101\t230\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
chr1\tsim\texon\t101\t150\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
chr1\tsim\texon\t171\t230\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
";

fn kind(op: CigarOp) -> Kind {
    match op {
        CigarOp::Match => Kind::Match,
        CigarOp::Ins => Kind::Insertion,
        CigarOp::Del => Kind::Deletion,
        CigarOp::RefSkip => Kind::Skip,
        CigarOp::SoftClip => Kind::SoftClip,
        CigarOp::HardClip => Kind::HardClip,
        CigarOp::Pad => Kind::Pad,
        CigarOp::Equal => Kind::SequenceMatch,
        CigarOp::Diff => Kind::SequenceMismatch,
    }
}

/// A mapped record on `chr1`. Positions are 0-based like the evaluator's;
/// `mate` is the 0-based mate position, if any.
pub fn mapped(name: &str, flags: u16, pos: usize, cigar: &str, mate: Option<usize>, hi: i32) -> RecordBuf {
    let parsed: Cigar = cigar.parse().unwrap();
    let mut record = RecordBuf::default();
    record.name_mut().replace(name.into());
    *record.flags_mut() = Flags::from(flags);
    *record.reference_sequence_id_mut() = Some(0);
    *record.alignment_start_mut() = Position::new(pos + 1);
    *record.mapping_quality_mut() = MappingQuality::new(60);
    for &(len, op) in parsed.iter() {
        record.cigar_mut().as_mut().push(Op::new(kind(op), len as usize));
    }
    if let Some(mate) = mate {
        *record.mate_reference_sequence_id_mut() = Some(0);
        *record.mate_alignment_start_mut() = Position::new(mate + 1);
    }
    record.data_mut().insert(HI, Value::Int32(hi));
    record
}

pub fn with_tag(mut record: RecordBuf, tag: Tag, value: Value) -> RecordBuf {
    record.data_mut().insert(tag, value);
    record
}

pub fn header() -> sam::Header {
    sam::Header::builder()
        .add_reference_sequence(
            "chr1",
            Map::<ReferenceSequence>::new(NonZeroUsize::try_from(10_000).unwrap()),
        )
        .build()
}

pub fn write_bam(path: &Path, records: &[RecordBuf]) {
    let header = header();
    let mut writer = bam::io::Writer::new(File::create(path).unwrap());
    writer.write_header(&header).unwrap();
    for record in records {
        writer.write_alignment_record(&header, record).unwrap();
    }
    writer.try_finish().unwrap();
}

/// Ground truth: `READ_A` crosses the intron, `READ_B` sits in exon 2.
pub fn ground_truth() -> Vec<RecordBuf> {
    vec![
        mapped(READ_A, F1R2, 120, "30M", Some(170), 1),
        mapped(READ_A, R2F1, 170, "10M", Some(120), 1),
        mapped(READ_B, F1R2, 175, "20M", Some(200), 1),
        mapped(READ_B, R2F1, 200, "25M", Some(175), 1),
    ]
}

/// Aligner output: `READ_A` as one merged record (mate position 0) followed by
/// both mates under the same `HI`; `READ_B` with its second mate misplaced.
pub fn aligner_output() -> Vec<RecordBuf> {
    vec![
        mapped(READ_A, 0x1 | 0x40, 120, "30M20N10M", Some(0), 1),
        mapped(READ_A, F1R2, 120, "30M", Some(170), 1),
        mapped(READ_A, R2F1, 170, "10M", Some(120), 1),
        mapped(READ_B, F1R2, 175, "20M", Some(210), 1),
        mapped(READ_B, R2F1, 210, "25M", Some(175), 1),
    ]
}
