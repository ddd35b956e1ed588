use crate::config::DecodeConfig;
use crate::hit::{DecodeProfile, Hit, Strand};
use crate::record::AlignmentRecord;
use crate::types::{PairKey, Pos};
use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};

/// Position and CIGAR of one mate; `(-1, "")` until that mate is seen.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairSlot {
    pub position: Pos,
    pub cigar: String,
}

impl PairSlot {
    pub fn empty() -> Self {
        Self {
            position: -1,
            cigar: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.position == -1 && self.cigar.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairPositions {
    pub first: PairSlot,
    pub second: PairSlot,
}

impl PairPositions {
    pub fn empty() -> Self {
        Self {
            first: PairSlot::empty(),
            second: PairSlot::empty(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.first.is_empty() && !self.second.is_empty()
    }
}

/// What is compared across files: the read name plus both mates' geometry.
pub type PairIdentity = (String, PairPositions);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentRole {
    First,
    Second,
}

/// Slot a hit occupies, from its segment flag and resolved strand, so that
/// the same physical mate lands in the same slot whichever file it came from.
pub fn segment_role(hit: &Hit) -> SegmentRole {
    let first = (hit.flags.is_first_segment() && hit.strand == Strand::Forward)
        || (hit.flags.is_last_segment() && hit.strand == Strand::Reverse);
    if first {
        SegmentRole::First
    } else {
        SegmentRole::Second
    }
}

/// Result of one pass of [`PairResolver`] over an alignment stream.
#[derive(Debug, Clone, Default)]
pub struct PairTable {
    pub pairs: BTreeMap<PairKey, PairPositions>,
    /// Every key decoded, whether or not its pair was completed.
    pub seen: BTreeSet<PairKey>,
    pub records: u64,
    pub skipped: u64,
}

impl PairTable {
    pub fn identity_set(&self) -> BTreeSet<PairIdentity> {
        self.pairs
            .iter()
            .map(|((name, _), positions)| (name.clone(), positions.clone()))
            .collect()
    }

    /// Keys producing each identity, in ascending multimap-index order.
    pub fn identity_keys(&self) -> BTreeMap<PairIdentity, Vec<PairKey>> {
        let mut out: BTreeMap<PairIdentity, Vec<PairKey>> = BTreeMap::new();
        for (key, positions) in &self.pairs {
            out.entry((key.0.clone(), positions.clone()))
                .or_default()
                .push(key.clone());
        }
        out
    }
}

/// Groups the hits of one stream by `(read name, multimap index)`.
pub struct PairResolver<'c> {
    config: &'c DecodeConfig,
    table: PairTable,
}

impl<'c> PairResolver<'c> {
    pub fn new(config: &'c DecodeConfig) -> Self {
        Self {
            config,
            table: PairTable::default(),
        }
    }

    pub fn observe(&mut self, record: &AlignmentRecord) {
        if !record.is_mapped() {
            return;
        }
        self.table.records += 1;
        if record.cigar.is_empty() || !self.config.accepts_cigar_len(record.cigar.len()) {
            tracing::debug!(read = %record.name, ops = record.cigar.len(), "skipping record with unusable CIGAR");
            self.table.skipped += 1;
            return;
        }

        let hit = Hit::decode(record, DecodeProfile::Named, self.config);
        let key: PairKey = (hit.name.clone(), hit.hit_index);
        self.table.seen.insert(key.clone());

        let slot = PairSlot {
            position: hit.position,
            cigar: hit.cigar_summary(),
        };
        let entry = self
            .table
            .pairs
            .entry(key)
            .or_insert_with(PairPositions::empty);
        match segment_role(&hit) {
            SegmentRole::First => entry.first = slot,
            SegmentRole::Second => entry.second = slot,
        }
    }

    pub fn finish(self) -> PairTable {
        self.table
    }
}

/// One full pass over `records`.
pub fn resolve_pairs<I>(records: I, config: &DecodeConfig) -> Result<PairTable>
where
    I: IntoIterator<Item = Result<AlignmentRecord>>,
{
    let mut resolver = PairResolver::new(config);
    for record in records {
        resolver.observe(&record?);
    }
    let table = resolver.finish();
    if table.skipped > 0 {
        tracing::warn!(
            skipped = table.skipped,
            max_cigar = config.max_num_cigar,
            "records skipped for CIGAR length"
        );
    }
    Ok(table)
}
