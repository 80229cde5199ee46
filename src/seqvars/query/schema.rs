//! Data structures for variant records and the selection settings.

use indexmap::{IndexMap, IndexSet};

use crate::err::ParseError;

/// Identifier of a variant within one sample, `CHROM:POS:ID:REF:ALT`.
#[derive(
    serde::Serialize, serde::Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone,
)]
#[serde(transparent)]
pub struct LocusKey(String);

impl LocusKey {
    /// Delimiter between the key components.
    pub const DELIMITER: char = ':';

    /// Construct from chromosome, position, ID, reference and alternative allele.
    pub fn new(chrom: &str, pos: &str, id: &str, reference: &str, alternative: &str) -> Self {
        Self([chrom, pos, id, reference, alternative].join(":"))
    }

    /// The chromosome, i.e., the first component of the key.
    pub fn chrom(&self) -> &str {
        self.0
            .split(Self::DELIMITER)
            .next()
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LocusKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// VEP annotation of one locus from the `CSQ` INFO field.
///
/// Maps each VEP column name to the list of per-transcript values.  Each list has one
/// entry per transcript and the columns are ordered as declared in the VCF header.
#[derive(serde::Serialize, serde::Deserialize, PartialEq, Eq, Debug, Clone, Default)]
pub struct VepAnnotation {
    /// Per-transcript values by column name.
    pub columns: IndexMap<String, Vec<String>>,
}

impl VepAnnotation {
    /// Build from the VEP column names and the raw per-transcript `CSQ` strings.
    ///
    /// Transcripts with fewer `|`-separated values than columns are padded with empty
    /// values, surplus values are dropped.
    pub fn from_transcripts<S: AsRef<str>>(vep_columns: &[String], transcripts: &[S]) -> Self {
        let mut columns: IndexMap<String, Vec<String>> = vep_columns
            .iter()
            .map(|name| (name.clone(), Vec::with_capacity(transcripts.len())))
            .collect();
        for transcript in transcripts {
            let mut values = transcript.as_ref().split('|');
            for column in columns.values_mut() {
                column.push(values.next().unwrap_or_default().to_string());
            }
        }
        Self { columns }
    }

    /// Values of the given column over all transcripts, empty if the column is unknown.
    pub fn values(&self, column: &str) -> &[String] {
        self.columns
            .get(column)
            .map(|values| values.as_slice())
            .unwrap_or_default()
    }

    /// Number of transcripts.
    pub fn num_transcripts(&self) -> usize {
        self.columns.values().next().map(Vec::len).unwrap_or(0)
    }
}

/// Information on one variant of the single sample in a VCF file.
#[derive(serde::Serialize, serde::Deserialize, PartialEq, Eq, Debug, Clone, Default)]
pub struct VariantRecord {
    /// Value of the `QUAL` column.
    pub qual: String,
    /// Value of the `FILTER` column.
    pub filter: String,
    /// The sample's `GT` value, if the `FORMAT` column declares one.
    pub genotype: Option<String>,
    /// `INFO` fields (except `CSQ`) in order of appearance, flags map to no values.
    pub info: IndexMap<String, Vec<String>>,
    /// Expanded VEP annotation, if `CSQ` was present.
    pub csq: Option<VepAnnotation>,
}

impl VariantRecord {
    /// Values of the given `INFO` field, if present.
    pub fn info_values(&self, key: &str) -> Option<&[String]> {
        self.info.get(key).map(|values| values.as_slice())
    }

    /// Interpret the joined values of an `INFO` field as a number.
    ///
    /// Returns `Ok(None)` if the field is absent and an error if the value is not numeric.
    pub fn info_number(&self, locus: &LocusKey, key: &str) -> Result<Option<f64>, anyhow::Error> {
        self.info_values(key)
            .map(|values| parse_number(locus, key, &values.concat()))
            .transpose()
    }

    /// Values of the given VEP column, empty if there is no `CSQ` annotation.
    pub fn csq_values(&self, column: &str) -> &[String] {
        self.csq
            .as_ref()
            .map(|csq| csq.values(column))
            .unwrap_or_default()
    }
}

/// Parse `value` as a floating point number, raising `ParseError::InvalidNumber`.
pub fn parse_number(locus: &LocusKey, key: &str, value: &str) -> Result<f64, anyhow::Error> {
    value.trim().parse::<f64>().map_err(|_| {
        ParseError::InvalidNumber {
            locus: locus.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        }
        .into()
    })
}

/// All variants of one sample, by locus and in file order.
pub type SampleVariants = IndexMap<LocusKey, VariantRecord>;

/// A subset of the loci of one sample, in file order.
pub type LocusSet = IndexSet<LocusKey>;

/// Pathogenicity predictions that can vote for a missense variant.
#[derive(
    serde::Serialize,
    serde::Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    Clone,
    Copy,
    clap::ValueEnum,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Criterion {
    /// VEP `SIFT` is deleterious.
    Sift,
    /// VEP `PolyPhen` is possibly or probably damaging.
    Polyphen,
    /// VEP `MPC` is at least 2.
    Mpc,
    /// `CADD` phred score is at least 20.
    Cadd,
    /// Absolute `SPIDEX` score is at least 2.
    Spidex,
    /// `dbNSFP_phyloP100way_vertebrate` is at least 2.
    Phylop,
}

/// The result of the combined selection that is passed on to gene matching.
#[derive(
    serde::Serialize,
    serde::Deserialize,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Clone,
    Copy,
    Default,
    clap::ValueEnum,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VariantClass {
    /// Loss-of-function and damaging missense variants.
    #[default]
    Damaging,
    /// Loss-of-function variants only.
    Lof,
    /// Damaging missense variants only.
    Missense,
}

/// Quality thresholds, variants failing any given threshold are excluded.
#[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug, Clone, Default)]
#[serde(default)]
pub struct QualitySettings {
    /// Required value of the `FILTER` column, e.g., `PASS`.
    pub filter: Option<String>,
    /// Minimal `INFO/DP`.
    pub dp: Option<f64>,
    /// Minimal `INFO/QD`.
    pub qd: Option<f64>,
    /// Minimal `INFO/MQ`.
    pub mq: Option<f64>,
}

/// Frequency thresholds, variants more frequent than any given threshold are excluded.
#[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug, Clone, Default)]
#[serde(default)]
pub struct FrequencySettings {
    /// Maximal 1000 Genomes allele frequency (`INFO/1000GAF`).
    pub kg: Option<f64>,
    /// Maximal ExAC allele frequency (`INFO/EXACAF`).
    pub exac: Option<f64>,
    /// Maximal gnomAD allele frequency (VEP `gnomAD_AF`).
    pub gnomad: Option<f64>,
    /// Maximal SweGen allele frequency (`INFO/SWEGENAF`).
    pub swegen: Option<f64>,
}

/// Settings of one selection run, as read from the query JSON.
#[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug, Clone, Default)]
#[serde(default)]
pub struct CaseQuery {
    /// Quality thresholds.
    pub quality: QualitySettings,
    /// Population frequency thresholds.
    pub frequency: FrequencySettings,
    /// Predictions voting on missense variants.
    pub criteria: IndexSet<Criterion>,
}
