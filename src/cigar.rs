use anyhow::{anyhow, bail};
use noodles::sam::alignment::record::cigar::op::Kind as CigarKind;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CigarOp {
    #[default]
    Match,
    Ins,
    Del,
    RefSkip,
    SoftClip,
    HardClip,
    Pad,
    Equal,
    Diff,
}

impl CigarOp {
    pub fn consumes_reference(self) -> bool {
        matches!(
            self,
            CigarOp::Match | CigarOp::Del | CigarOp::RefSkip | CigarOp::Equal | CigarOp::Diff
        )
    }

    pub fn consumes_query(self) -> bool {
        matches!(
            self,
            CigarOp::Match | CigarOp::Ins | CigarOp::SoftClip | CigarOp::Equal | CigarOp::Diff
        )
    }

    pub fn as_char(self) -> char {
        match self {
            CigarOp::Match => 'M',
            CigarOp::Ins => 'I',
            CigarOp::Del => 'D',
            CigarOp::RefSkip => 'N',
            CigarOp::SoftClip => 'S',
            CigarOp::HardClip => 'H',
            CigarOp::Pad => 'P',
            CigarOp::Equal => '=',
            CigarOp::Diff => 'X',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        let op = match c {
            'M' => CigarOp::Match,
            'I' => CigarOp::Ins,
            'D' => CigarOp::Del,
            'N' => CigarOp::RefSkip,
            'S' => CigarOp::SoftClip,
            'H' => CigarOp::HardClip,
            'P' => CigarOp::Pad,
            '=' => CigarOp::Equal,
            'X' => CigarOp::Diff,
            _ => return None,
        };
        Some(op)
    }
}

impl From<CigarKind> for CigarOp {
    fn from(kind: CigarKind) -> Self {
        match kind {
            CigarKind::Match => CigarOp::Match,
            CigarKind::Insertion => CigarOp::Ins,
            CigarKind::Deletion => CigarOp::Del,
            CigarKind::Skip => CigarOp::RefSkip,
            CigarKind::SoftClip => CigarOp::SoftClip,
            CigarKind::HardClip => CigarOp::HardClip,
            CigarKind::Pad => CigarOp::Pad,
            CigarKind::SequenceMatch => CigarOp::Equal,
            CigarKind::SequenceMismatch => CigarOp::Diff,
        }
    }
}

/// Run-length list of CIGAR operations.
///
/// `push` keeps runs exactly as given (observed alignments); `add_operation`
/// folds a run into the previous one when the operation repeats (synthesized
/// alignments).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Cigar {
    pub ops: Vec<(u32, CigarOp)>,
}

impl Cigar {
    pub fn push(&mut self, len: u32, op: CigarOp) {
        self.ops.push((len, op));
    }

    pub fn add_operation(&mut self, len: u32, op: CigarOp) {
        if len == 0 {
            return;
        }
        if let Some((prev_len, prev_op)) = self.ops.last_mut()
            && *prev_op == op
        {
            *prev_len += len;
            return;
        }
        self.ops.push((len, op));
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(u32, CigarOp)> {
        self.ops.iter()
    }

    pub fn reference_len(&self) -> u32 {
        self.ops
            .iter()
            .filter(|(_, op)| op.consumes_reference())
            .map(|(len, _)| *len)
            .sum()
    }

    pub fn query_len(&self) -> u32 {
        self.ops
            .iter()
            .filter(|(_, op)| op.consumes_query())
            .map(|(len, _)| *len)
            .sum()
    }
}

/// SAM text form (`30M20N10M`). An empty CIGAR renders as the empty string,
/// never `*`, so it can be compared against other summaries directly.
impl fmt::Display for Cigar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (len, op) in &self.ops {
            write!(f, "{}{}", len, op.as_char())?;
        }
        Ok(())
    }
}

impl FromStr for Cigar {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cigar = Cigar::default();
        if s == "*" {
            return Ok(cigar);
        }
        let mut len: Option<u32> = None;
        for c in s.chars() {
            if let Some(d) = c.to_digit(10) {
                let n = len.unwrap_or(0);
                len = Some(
                    n.checked_mul(10)
                        .and_then(|n| n.checked_add(d))
                        .ok_or_else(|| anyhow!("CIGAR run too long in {s:?}"))?,
                );
                continue;
            }
            let op = CigarOp::from_char(c).ok_or_else(|| anyhow!("invalid CIGAR op {c:?} in {s:?}"))?;
            let Some(n) = len.take() else {
                bail!("CIGAR op {c:?} without length in {s:?}");
            };
            cigar.push(n, op);
        }
        if len.is_some() {
            bail!("trailing length without op in CIGAR {s:?}");
        }
        Ok(cigar)
    }
}
