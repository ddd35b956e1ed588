use crate::types::{HashMap, HashMapExt, Pos};
use anyhow::{Context, Result, anyhow, bail};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// 0-based, half-open exon interval. Ordered by start, then end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Exon {
    pub start: Pos,
    pub end: Pos,
}

impl Exon {
    pub fn len(&self) -> Pos {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// One GTF line split into its nine tab-separated columns.
#[derive(Debug, Clone, Copy)]
pub struct GtfRow<'a> {
    pub seqname: &'a str,
    pub source: &'a str,
    pub feature: &'a str,
    pub start: &'a str,
    pub end: &'a str,
    pub score: &'a str,
    pub strand: &'a str,
    pub frame: &'a str,
    pub attributes: &'a str,
}

impl<'a> GtfRow<'a> {
    /// `None` for blank lines and `#` comments.
    pub fn parse(line: &'a str) -> Result<Option<Self>> {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let mut fields = line.splitn(9, '\t');
        let mut next = |name: &str| {
            fields
                .next()
                .ok_or_else(|| anyhow!("GTF row is missing the {name} column"))
        };
        Ok(Some(Self {
            seqname: next("seqname")?,
            source: next("source")?,
            feature: next("feature")?,
            start: next("start")?,
            end: next("end")?,
            score: next("score")?,
            strand: next("strand")?,
            frame: next("frame")?,
            attributes: next("attribute")?,
        }))
    }
}

/// `transcript_id -> exons`, deduplicated and sorted by start.
///
/// Overlapping exons from different rows are kept side by side; only exact
/// duplicates collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExonModel {
    transcripts: HashMap<String, BTreeSet<Exon>>,
}

impl ExonModel {
    pub fn new() -> Self {
        Self {
            transcripts: HashMap::new(),
        }
    }

    /// Add the exon described by `row`. Non-exon rows are ignored; returns
    /// whether the row contributed an exon.
    pub fn add_row(&mut self, row: &GtfRow<'_>) -> Result<bool> {
        if row.feature != "exon" {
            return Ok(false);
        }
        let start: Pos = row
            .start
            .trim()
            .parse()
            .with_context(|| format!("invalid exon start {:?}", row.start))?;
        let end: Pos = row
            .end
            .trim()
            .parse()
            .with_context(|| format!("invalid exon end {:?}", row.end))?;
        let Some(transcript_id) = transcript_id_from_attributes(row.attributes) else {
            bail!("exon row without transcript_id: {:?}", row.attributes);
        };

        // 1-based inclusive -> 0-based half-open
        let exon = Exon {
            start: start - 1,
            end,
        };
        if exon.is_empty() {
            tracing::warn!(transcript_id, start, end, "skipping empty exon");
            return Ok(false);
        }
        self.transcripts
            .entry(transcript_id.to_string())
            .or_default()
            .insert(exon);
        Ok(true)
    }

    pub fn from_rows<'a, I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = GtfRow<'a>>,
    {
        let mut model = Self::new();
        for row in rows {
            model.add_row(&row)?;
        }
        Ok(model)
    }

    pub fn exons(&self, transcript_id: &str) -> Option<&BTreeSet<Exon>> {
        self.transcripts.get(transcript_id)
    }

    pub fn contains(&self, transcript_id: &str) -> bool {
        self.transcripts.contains_key(transcript_id)
    }

    pub fn num_transcripts(&self) -> usize {
        self.transcripts.len()
    }

    pub fn num_exons(&self) -> usize {
        self.transcripts.values().map(BTreeSet::len).sum()
    }
}

/// Value of the `transcript_id` key in a GTF attribute column.
///
/// Tokens are whitespace separated; the value token loses one leading quote
/// and a trailing `";` (or a bare trailing quote or separator).
pub fn transcript_id_from_attributes(attributes: &str) -> Option<&str> {
    let mut tokens = attributes.split_whitespace();
    while let Some(token) = tokens.next() {
        if token != "transcript_id" {
            continue;
        }
        let value = tokens.next()?;
        let value = value.strip_prefix('"').unwrap_or(value);
        let value = value
            .strip_suffix("\";")
            .or_else(|| value.strip_suffix('"'))
            .or_else(|| value.strip_suffix(';'))
            .unwrap_or(value);
        return Some(value);
    }
    None
}

pub fn parse_exon_model<R: BufRead>(reader: R) -> Result<ExonModel> {
    let mut model = ExonModel::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let row = GtfRow::parse(&line).with_context(|| format!("GTF line {}", idx + 1))?;
        if let Some(row) = row {
            model
                .add_row(&row)
                .with_context(|| format!("GTF line {}", idx + 1))?;
        }
    }
    Ok(model)
}

/// Load the exon model from a GTF file.
pub fn load_exon_model(path: &Path) -> Result<ExonModel> {
    let file =
        File::open(path).with_context(|| format!("failed to open annotation {}", path.display()))?;
    let model = parse_exon_model(BufReader::new(file))
        .with_context(|| format!("failed to parse annotation {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        transcripts = model.num_transcripts(),
        exons = model.num_exons(),
        "loaded exon model"
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GTF: &str = "\
#!genome-build test
chr1\tsim\ttranscript\t101\t230\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T\";
chr1\tsim\texon\t201\t230\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T\";
chr1\tsim\texon\t101\t150\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T\";
chr1\tsim\texon\t101\t150\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T\";
chr1\tsim\texon\t301\t400\t.\t-\t.\tgene_id \"G2\"; transcript_id \"U\"; exon_number \"1\";
";

    #[test]
    fn builds_sorted_deduplicated_exons() {
        let model = parse_exon_model(GTF.as_bytes()).unwrap();
        assert_eq!(model.num_transcripts(), 2);
        assert_eq!(model.num_exons(), 3);
        let t: Vec<Exon> = model.exons("T").unwrap().iter().copied().collect();
        assert_eq!(
            t,
            vec![Exon { start: 100, end: 150 }, Exon { start: 200, end: 230 }]
        );
        assert!(model.contains("U"));
        assert!(model.exons("missing").is_none());
    }

    #[test]
    fn rebuilding_is_idempotent() {
        let a = parse_exon_model(GTF.as_bytes()).unwrap();
        let b = parse_exon_model(GTF.as_bytes()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn overlapping_exons_are_not_merged() {
        let rows = [
            "chr1\ts\texon\t1\t50\t.\t+\t.\ttranscript_id \"T\";",
            "chr1\ts\texon\t41\t90\t.\t+\t.\ttranscript_id \"T\";",
        ];
        let model =
            ExonModel::from_rows(rows.iter().map(|l| GtfRow::parse(l).unwrap().unwrap())).unwrap();
        assert_eq!(model.exons("T").unwrap().len(), 2);
    }

    #[test]
    fn transcript_id_quoting_variants() {
        assert_eq!(
            transcript_id_from_attributes("gene_id \"G\"; transcript_id \"T1\";"),
            Some("T1")
        );
        assert_eq!(transcript_id_from_attributes("transcript_id \"T2\""), Some("T2"));
        assert_eq!(transcript_id_from_attributes("transcript_id T3;"), Some("T3"));
        assert_eq!(transcript_id_from_attributes("gene_id \"G\";"), None);
        assert_eq!(transcript_id_from_attributes("transcript_id"), None);
    }

    #[test]
    fn bad_coordinates_are_errors() {
        let bad = "chr1\ts\texon\tabc\t50\t.\t+\t.\ttranscript_id \"T\";\n";
        let err = parse_exon_model(bad.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("line 1"));

        let short = "chr1\ts\texon\t1\t50\n";
        assert!(parse_exon_model(short.as_bytes()).is_err());
    }

    #[test]
    fn empty_exons_are_skipped() {
        let row = "chr1\ts\texon\t51\t50\t.\t+\t.\ttranscript_id \"T\";";
        let mut model = ExonModel::new();
        let added = model.add_row(&GtfRow::parse(row).unwrap().unwrap()).unwrap();
        assert!(!added);
        assert_eq!(model.num_exons(), 0);
    }
}
