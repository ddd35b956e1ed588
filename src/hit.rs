//! Decoding of raw alignment records into hits.
//!
//! A [`Hit`] is built from an [`AlignmentRecord`] under a [`DecodeProfile`].
//! Profiles are ordered by cost; each one fills in everything the cheaper
//! profiles do plus its own fields, and leaves the rest at their neutral
//! values (`-1`, `.`, empty).

use crate::cigar::{Cigar, CigarOp};
use crate::config::{DecodeConfig, LibraryType};
use crate::record::{AlignmentRecord, HI, NH, NM, STAR_NM, XS};
use crate::types::{HitIndex, Pos};
use noodles::sam::alignment::record::Flags;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strand {
    Forward,
    Reverse,
    #[default]
    Unknown,
}

impl Strand {
    pub fn from_byte(b: u8) -> Self {
        match b {
            b'+' => Strand::Forward,
            b'-' => Strand::Reverse,
            _ => Strand::Unknown,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
            Strand::Unknown => '.',
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// How much derived state to compute for a hit, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DecodeProfile {
    /// Flag, position, MAPQ, mate position and template length only.
    Core,
    /// Adds reference end and query length.
    Span,
    /// Adds mate-orientation concordance and the library strand.
    Strand,
    /// Adds the `XS` fallback and the `HI`/`NH`/mismatch tags.
    Tags,
    /// Adds a copy of the CIGAR and the read name.
    Named,
    /// Adds the splice-site list.
    Spliced,
}

/// An intron `[start, end)` in reference coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Junction {
    pub start: Pos,
    pub end: Pos,
}

impl Junction {
    /// Both coordinates in one integer: start in the high 32 bits.
    pub fn pack(self) -> i64 {
        ((self.start as i64) << 32) | (self.end as u32 as i64)
    }

    pub fn unpack(packed: i64) -> Self {
        Self {
            start: (packed >> 32) as Pos,
            end: (packed & 0xffff_ffff) as u32 as Pos,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Hit {
    pub profile: DecodeProfile,

    pub flags: Flags,
    pub position: Pos,
    pub mapping_quality: u8,
    pub mate_position: Pos,
    pub insert_size: i32,
    pub n_cigar: usize,

    pub reference_end: Pos,
    pub query_length: i32,

    pub concordant: bool,
    pub strand: Strand,

    pub xs: Strand,
    pub hit_index: HitIndex,
    pub hit_count: i32,
    pub mismatches: i32,

    pub cigar: Cigar,
    pub name: String,

    pub splice_sites: Vec<Junction>,
}

impl Hit {
    /// Decode `record` up to `profile`.
    ///
    /// # Panics
    ///
    /// At [`DecodeProfile::Named`] and above, if the record has no CIGAR
    /// operations or more than `config.max_num_cigar`. Callers filter such
    /// records before decoding.
    pub fn decode(record: &AlignmentRecord, profile: DecodeProfile, config: &DecodeConfig) -> Self {
        let mut hit = Hit {
            profile,
            flags: record.flags,
            position: record.position,
            mapping_quality: record.mapping_quality,
            mate_position: record.mate_position,
            insert_size: record.template_length,
            n_cigar: record.cigar.len(),
            reference_end: record.position,
            query_length: 0,
            concordant: false,
            strand: Strand::Unknown,
            xs: Strand::Unknown,
            hit_index: -1,
            hit_count: -1,
            mismatches: 0,
            cigar: Cigar::default(),
            name: String::new(),
            splice_sites: Vec::new(),
        };
        if profile < DecodeProfile::Span {
            return hit;
        }

        hit.reference_end = record.position + record.cigar.reference_len() as Pos;
        hit.query_length = record.cigar.query_len() as i32;
        if profile < DecodeProfile::Strand {
            return hit;
        }

        let orientation = mate_orientation(record.flags);
        hit.concordant = orientation.is_some();
        if !record.flags.is_mate_unmapped()
            && let Some((first, reverse)) = orientation
        {
            hit.strand = library_strand(config.library_type, first, reverse);
        }
        if profile < DecodeProfile::Tags {
            return hit;
        }

        hit.xs = record.char_tag(XS).map_or(Strand::Unknown, Strand::from_byte);
        // A lone mate carries no orientation; trust the aligner's splice strand.
        if record.flags.is_mate_unmapped() && config.library_type != LibraryType::Unstranded {
            hit.strand = hit.xs;
        }
        hit.hit_index = record.int_tag(HI).map_or(-1, |v| v as HitIndex);
        hit.hit_count = record.int_tag(NH).map_or(-1, |v| v as i32);
        // NM is read after nM so it wins when both are present.
        if let Some(nm) = record.int_tag(STAR_NM) {
            hit.mismatches = nm as i32;
        }
        if let Some(nm) = record.int_tag(NM) {
            hit.mismatches = nm as i32;
        }
        if profile < DecodeProfile::Named {
            return hit;
        }

        assert!(
            !record.cigar.is_empty() && config.accepts_cigar_len(record.cigar.len()),
            "record {} has {} CIGAR ops (allowed 1..={})",
            record.name,
            record.cigar.len(),
            config.max_num_cigar
        );
        hit.cigar = record.cigar.clone();
        hit.name = record.name.clone();
        if profile < DecodeProfile::Spliced {
            return hit;
        }

        hit.splice_sites = hit.build_splice_sites(config.min_flank_length);
        hit
    }

    /// The observed CIGAR in SAM text form.
    pub fn cigar_summary(&self) -> String {
        self.cigar.to_string()
    }

    /// False if some `M N M` junction has an intron so long relative to its
    /// shorter anchor that it is unlikely to be real: `log2(s) > log2(10) + 2m`.
    pub fn verify_junctions(&self) -> bool {
        let ops = &self.cigar.ops;
        for k in 1..ops.len().saturating_sub(1) {
            let Some((s, m1, m2)) = interior_skip(ops, k) else {
                continue;
            };
            let m = m1.min(m2);
            if f64::from(s).log2() > 10f64.log2() + 2.0 * f64::from(m) {
                tracing::debug!(
                    read = %self.name,
                    skip = s,
                    m1,
                    m2,
                    "detected super long junction"
                );
                return false;
            }
        }
        true
    }

    /// Reference intervals covered by `M` runs.
    pub fn matched_intervals(&self) -> Vec<(Pos, Pos)> {
        let mut out = Vec::new();
        let mut p = self.position;
        for &(len, op) in self.cigar.iter() {
            if op.consumes_reference() {
                p += len as Pos;
            }
            if op == CigarOp::Match {
                out.push((p - len as Pos, p));
            }
        }
        out
    }

    /// Read name, then multimap index when both sides define one, then position.
    pub fn name_order(&self, other: &Hit) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| {
                if self.hit_index != -1 && other.hit_index != -1 {
                    self.hit_index.cmp(&other.hit_index)
                } else {
                    Ordering::Equal
                }
            })
            .then_with(|| self.position.cmp(&other.position))
    }

    fn build_splice_sites(&self, min_flank_length: u32) -> Vec<Junction> {
        let ops = &self.cigar.ops;
        let mut sites = Vec::new();
        let mut p = self.position;
        for (k, &(len, op)) in ops.iter().enumerate() {
            if op.consumes_reference() {
                p += len as Pos;
            }
            if k == 0 || k + 1 == ops.len() {
                continue;
            }
            let Some((_, m1, m2)) = interior_skip(ops, k) else {
                continue;
            };
            if m1 < min_flank_length || m2 < min_flank_length {
                continue;
            }
            sites.push(Junction {
                start: p - len as Pos,
                end: p,
            });
        }
        sites
    }
}

impl fmt::Display for Hit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Hit {}: [{}-{}), mpos = {}, cigar = {}, flag = {}, quality = {}, strand = {}, isize = {}, qlen = {}, hi = {}",
            self.name,
            self.position,
            self.reference_end,
            self.mate_position,
            self.cigar,
            u16::from(self.flags),
            self.mapping_quality,
            self.strand,
            self.insert_size,
            self.query_length,
            self.hit_index
        )
    }
}

/// `(skip, left match, right match)` when op `k` is an `N` run between two `M` runs.
fn interior_skip(ops: &[(u32, CigarOp)], k: usize) -> Option<(u32, u32, u32)> {
    let (s, op) = ops[k];
    if op != CigarOp::RefSkip {
        return None;
    }
    let (m1, left) = *ops.get(k.checked_sub(1)?)?;
    let (m2, right) = *ops.get(k + 1)?;
    if left != CigarOp::Match || right != CigarOp::Match {
        return None;
    }
    Some((s, m1, m2))
}

/// `(is first segment, is reverse)` for a properly oriented mate, where one
/// mate is forward and the other reverse.
fn mate_orientation(flags: Flags) -> Option<(bool, bool)> {
    let reverse = flags.is_reverse_complemented();
    if reverse == flags.is_mate_reverse_complemented() {
        return None;
    }
    match (flags.is_first_segment(), flags.is_last_segment()) {
        (true, false) => Some((true, reverse)),
        (false, true) => Some((false, reverse)),
        _ => None,
    }
}

fn library_strand(library_type: LibraryType, first: bool, reverse: bool) -> Strand {
    // FR_FIRST: F1R2 and R2F1 come from the reverse strand.
    let sense = first == reverse;
    match library_type {
        LibraryType::Unstranded => Strand::Unknown,
        LibraryType::FrFirst if sense => Strand::Forward,
        LibraryType::FrFirst => Strand::Reverse,
        LibraryType::FrSecond if sense => Strand::Reverse,
        LibraryType::FrSecond => Strand::Forward,
    }
}
