use clap::ValueEnum;

/// Library preparation protocol used to turn mate orientation into a
/// transcription strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LibraryType {
    /// No strand information; every hit decodes to `.`.
    Unstranded,
    /// dUTP-style: the first segment is antisense to the transcript.
    #[default]
    #[value(name = "first")]
    FrFirst,
    /// Ligation-style: the first segment is sense to the transcript.
    #[value(name = "second")]
    FrSecond,
}

/// Parameters shared by the record decoder and every evaluation pass.
///
/// Built once from the command line and handed to each component by
/// reference; nothing reads these values from global state.
#[derive(Debug, Clone)]
pub struct DecodeConfig {
    pub library_type: LibraryType,
    /// Both match runs flanking an `N` run must be at least this long for
    /// the junction to be reported as a splice site.
    pub min_flank_length: u32,
    /// Records with more CIGAR operations than this are skipped by callers.
    pub max_num_cigar: usize,
    pub min_mapping_quality: u8,
    pub use_second_alignment: bool,
}

impl DecodeConfig {
    pub fn new(library_type: LibraryType) -> Self {
        Self {
            library_type,
            ..Self::default()
        }
    }

    /// True when a record with `n_ops` CIGAR operations can be decoded with
    /// a profile that copies the CIGAR.
    pub fn accepts_cigar_len(&self, n_ops: usize) -> bool {
        n_ops <= self.max_num_cigar
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            library_type: LibraryType::FrFirst,
            min_flank_length: 3,
            max_num_cigar: 7,
            min_mapping_quality: 1,
            use_second_alignment: false,
        }
    }
}
