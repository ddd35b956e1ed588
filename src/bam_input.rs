use crate::cigar::{Cigar, CigarOp};
use crate::record::{AlignmentRecord, AuxValue, HI, NH, NM, STAR_NM, TS, XS};
use crate::types::Pos;
use anyhow::{Context, Result};
use noodles::bam;
use noodles::core::Position;
use noodles::sam::alignment::record::data::field::{Tag, Value};
use std::io;
use std::path::Path;

/// Aux tags copied out of each BAM record; everything else is dropped.
const DECODED_TAGS: [Tag; 6] = [XS, TS, HI, NH, STAR_NM, NM];

/// Stream the records of a BAM file in file order.
///
/// The header is read and discarded; evaluation never needs reference names.
pub fn read_records(path: &Path) -> Result<impl Iterator<Item = Result<AlignmentRecord>>> {
    let mut reader = bam::io::reader::Builder
        .build_from_path(path)
        .with_context(|| format!("failed to open BAM {}", path.display()))?;
    reader
        .read_header()
        .with_context(|| format!("failed to read BAM header from {}", path.display()))?;

    let display = path.display().to_string();
    let mut record = bam::Record::default();
    Ok(std::iter::from_fn(move || match reader.read_record(&mut record) {
        Ok(0) => None,
        Ok(_) => Some(convert_record(&record)),
        Err(e) => Some(Err(e).with_context(|| format!("failed to read record from {display}"))),
    }))
}

/// Copy the fields the evaluator needs out of a lazily-decoded BAM record.
pub fn convert_record(record: &bam::Record) -> Result<AlignmentRecord> {
    let mut cigar = Cigar::default();
    for op in record.cigar().iter() {
        let op = op?;
        cigar.push(op.len() as u32, CigarOp::from(op.kind()));
    }

    let data = record.data();
    let mut tags = Vec::new();
    for tag in DECODED_TAGS {
        let Some(value) = data.get(&tag) else {
            continue;
        };
        let value = match value? {
            Value::Character(c) => AuxValue::Character(c),
            v => v.as_int().map_or(AuxValue::Other, AuxValue::Int),
        };
        tags.push((tag, value));
    }

    Ok(AlignmentRecord {
        name: record.name().map(|n| n.to_string()).unwrap_or_default(),
        flags: record.flags(),
        position: zero_based(record.alignment_start())?,
        mapping_quality: record.mapping_quality().map_or(255, u8::from),
        cigar,
        mate_position: zero_based(record.mate_alignment_start())?,
        template_length: record.template_length(),
        tags,
    })
}

fn zero_based(position: Option<io::Result<Position>>) -> Result<Pos> {
    match position {
        Some(p) => Ok(usize::from(p?) as Pos - 1),
        None => Ok(-1),
    }
}
