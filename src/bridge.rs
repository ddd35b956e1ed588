use crate::annotation::Exon;
use crate::cigar::{Cigar, CigarOp};
use crate::types::Pos;

/// Genomic extent of a ground-truth fragment: segment 1's start to
/// segment 2's reference end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentSpan {
    pub start: Pos,
    pub end: Pos,
}

/// The single spliced alignment a perfect aligner would report for a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeRecord {
    pub start: Pos,
    pub cigar: Cigar,
}

impl BridgeRecord {
    /// Exact agreement of start and full CIGAR text.
    pub fn matches(&self, position: Pos, cigar_summary: &str) -> bool {
        self.start == position && self.cigar.to_string() == cigar_summary
    }
}

/// Walk `exons` (ascending by start) across `span`, emitting `N` for gaps
/// not covered by any exon and `M` for covered stretches.
///
/// An empty exon list yields an empty CIGAR.
pub fn synthesize_bridge<'a, I>(span: FragmentSpan, exons: I) -> BridgeRecord
where
    I: IntoIterator<Item = &'a Exon>,
{
    let mut cigar = Cigar::default();
    let mut p2 = span.start;
    for exon in exons {
        if exon.end < span.start {
            continue;
        }
        if p2 >= span.end {
            break;
        }
        let p1 = p2.max(exon.start);
        if p1 > p2 {
            cigar.add_operation((p1 - p2) as u32, CigarOp::RefSkip);
        }
        // Never step back when an exon lies inside ground already covered.
        p2 = p1.max(span.end.min(exon.end));
        if p2 > p1 {
            cigar.add_operation((p2 - p1) as u32, CigarOp::Match);
        }
    }
    BridgeRecord {
        start: span.start,
        cigar,
    }
}
