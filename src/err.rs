//! Error types raised while reading and selecting variants.

/// Errors raised when a header or data line does not follow the expected grammar.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("fileformat must have a value")]
    MissingFileFormat,
    #[error("one of the INFO lines is malformed: {0}")]
    MalformedInfo(String),
    #[error("one of the FILTER lines is malformed: {0}")]
    MalformedFilter(String),
    #[error("one of the FORMAT lines is malformed: {0}")]
    MalformedFormat(String),
    #[error("one of the variant lines is malformed: {0}")]
    MalformedVariant(String),
    #[error("variant line found before the #CHROM header line: {0}")]
    MissingHeader(String),
    #[error("expected exactly one sample column, header has {0} columns")]
    UnsupportedSampleCount(usize),
    #[error("invalid numeric value {value:?} of {key} for variant {locus}")]
    InvalidNumber {
        locus: String,
        key: String,
        value: String,
    },
}

/// Errors raised for missing or unsupported input files.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("missing required input: {0}")]
    Missing(String),
    #[error("file {0} is not in a supported format, use .vcf or .vcf.gz")]
    Unsupported(String),
}
