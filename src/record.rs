use crate::cigar::Cigar;
use crate::types::Pos;
use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::record::data::field::Tag;

pub const XS: Tag = Tag::new(b'X', b'S');
pub const TS: Tag = Tag::new(b't', b's');
pub const HI: Tag = Tag::new(b'H', b'I');
pub const NH: Tag = Tag::new(b'N', b'H');
pub const NM: Tag = Tag::new(b'N', b'M');
pub const STAR_NM: Tag = Tag::new(b'n', b'M');

/// Auxiliary tag value, reduced to the two shapes the decoder inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuxValue {
    Character(u8),
    Int(i64),
    Other,
}

/// One raw alignment record as delivered by the record source.
///
/// Positions are 0-based with `-1` for "unavailable", mirroring the BAM core
/// fields, so that the mate-position convention used by merged alignments
/// (`mate_position == 0`) can be checked directly.
#[derive(Debug, Clone)]
pub struct AlignmentRecord {
    pub name: String,
    pub flags: Flags,
    pub position: Pos,
    pub mapping_quality: u8,
    pub cigar: Cigar,
    pub mate_position: Pos,
    pub template_length: i32,
    pub tags: Vec<(Tag, AuxValue)>,
}

impl AlignmentRecord {
    pub fn new(name: &str, flags: u16, position: Pos, cigar: Cigar) -> Self {
        Self {
            name: name.to_string(),
            flags: Flags::from(flags),
            position,
            mapping_quality: 255,
            cigar,
            mate_position: -1,
            template_length: 0,
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: Tag, value: AuxValue) -> Self {
        self.tags.retain(|(t, _)| *t != tag);
        self.tags.push((tag, value));
        self
    }

    pub fn with_mate_position(mut self, mate_position: Pos) -> Self {
        self.mate_position = mate_position;
        self
    }

    pub fn with_template_length(mut self, template_length: i32) -> Self {
        self.template_length = template_length;
        self
    }

    pub fn with_mapping_quality(mut self, mapping_quality: u8) -> Self {
        self.mapping_quality = mapping_quality;
        self
    }

    pub fn tag(&self, tag: Tag) -> Option<AuxValue> {
        self.tags.iter().find(|(t, _)| *t == tag).map(|(_, v)| *v)
    }

    pub fn char_tag(&self, tag: Tag) -> Option<u8> {
        match self.tag(tag)? {
            AuxValue::Character(c) => Some(c),
            _ => None,
        }
    }

    pub fn int_tag(&self, tag: Tag) -> Option<i64> {
        match self.tag(tag)? {
            AuxValue::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_mapped(&self) -> bool {
        !self.flags.is_unmapped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_typed() {
        let rec = AlignmentRecord::new("r1", 0x63, 10, "10M".parse().unwrap())
            .with_tag(XS, AuxValue::Character(b'+'))
            .with_tag(HI, AuxValue::Int(2));
        assert_eq!(rec.char_tag(XS), Some(b'+'));
        assert_eq!(rec.int_tag(XS), None);
        assert_eq!(rec.int_tag(HI), Some(2));
        assert_eq!(rec.tag(NH), None);
        assert!(rec.is_mapped());
        assert!(rec.flags.is_first_segment());
    }

    #[test]
    fn with_tag_replaces_existing_value() {
        let rec = AlignmentRecord::new("r1", 0, 0, Cigar::default())
            .with_tag(NM, AuxValue::Int(1))
            .with_tag(NM, AuxValue::Int(4));
        assert_eq!(rec.int_tag(NM), Some(4));
        assert_eq!(rec.tags.len(), 1);
    }
}
