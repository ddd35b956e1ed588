mod common;

use bamkit_rs::bam_input::read_records;
use bamkit_rs::record::{AuxValue, HI, NM, STAR_NM, TS, XS};
use bamkit_rs::xs_tag::rewrite_ts_as_xs;
use common::{F1R2, R2F1, mapped, with_tag, write_bam};
use noodles::sam::alignment::record_buf::data::field::Value;

#[test]
fn records_come_back_zero_based_with_tags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("in.bam");
    let record = with_tag(mapped("r1", F1R2, 120, "5S30M20N10M", Some(170), 2), NM, Value::UInt8(3));
    let record = with_tag(record, STAR_NM, Value::Int16(4));
    write_bam(&path, &[record, mapped("r2", R2F1, 0, "10M", None, 1)]);

    let records: Vec<_> = read_records(&path).unwrap().collect::<anyhow::Result<_>>().unwrap();
    assert_eq!(records.len(), 2);

    let r1 = &records[0];
    assert_eq!(r1.name, "r1");
    assert_eq!(r1.position, 120);
    assert_eq!(r1.mate_position, 170);
    assert_eq!(r1.mapping_quality, 60);
    assert_eq!(r1.cigar.to_string(), "5S30M20N10M");
    assert_eq!(r1.int_tag(HI), Some(2));
    assert_eq!(r1.int_tag(NM), Some(3));
    assert_eq!(r1.int_tag(STAR_NM), Some(4));
    assert_eq!(r1.tag(XS), None);

    let r2 = &records[1];
    assert_eq!(r2.position, 0);
    assert_eq!(r2.mate_position, -1);
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(read_records(&dir.path().join("absent.bam")).is_err());
}

#[test]
fn ts_tags_become_xs_tags() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.bam");
    let output = dir.path().join("out.bam");
    write_bam(
        &input,
        &[
            with_tag(mapped("fwd", F1R2, 10, "20M", None, 1), TS, Value::Character(b'+')),
            with_tag(mapped("rev", R2F1, 40, "20M", None, 1), TS, Value::Character(b'+')),
            mapped("plain", F1R2, 70, "20M", None, 1),
        ],
    );

    let tagged = rewrite_ts_as_xs(&input, &output).unwrap();
    assert_eq!(tagged, 2);

    let records: Vec<_> = read_records(&output).unwrap().collect::<anyhow::Result<_>>().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].tag(XS), Some(AuxValue::Character(b'+')));
    assert_eq!(records[1].tag(XS), Some(AuxValue::Character(b'-')));
    assert_eq!(records[2].tag(XS), None);
    assert_eq!(records[1].tag(TS), Some(AuxValue::Character(b'+')));
}
