use indexmap::IndexSet;

use crate::seqvars::query::schema::{parse_number, Criterion, LocusKey, VariantRecord};

/// Consequences that mark a loss-of-function variant.
pub const LOF_CONSEQUENCES: &[&str] = &[
    "frameshift_variant",
    "stop_gained",
    "splice_acceptor_variant",
    "splice_donor_variant",
    "stop_lost",
    "start_lost",
];

/// Consequence that marks a missense candidate.
pub const MISSENSE_CONSEQUENCE: &str = "missense_variant";

/// Callers whose exclusive calls are not considered.
pub const SINGLE_CALLERS: &[&str] = &["freebayes", "gatk", "samtools"];

/// Classification of one locus by its VEP consequences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    /// Any transcript has a loss-of-function consequence.
    pub lof: bool,
    /// Any transcript has a missense consequence.
    pub missense: bool,
}

/// Whether the variant was called by exactly one low-confidence caller (`INFO/set`).
pub fn is_single_caller(record: &VariantRecord) -> bool {
    match record.info_values("set") {
        Some([caller]) => SINGLE_CALLERS.contains(&caller.as_str()),
        _ => false,
    }
}

/// Classify the variant by the `Consequence` values of all its transcripts.
///
/// Variants from a single caller are never classified.
pub fn classify(record: &VariantRecord) -> Classification {
    let mut result = Classification::default();
    if is_single_caller(record) {
        return result;
    }
    for consequence in record.csq_values("Consequence") {
        if LOF_CONSEQUENCES
            .iter()
            .any(|lof| consequence.contains(lof))
        {
            result.lof = true;
        }
        if consequence.contains(MISSENSE_CONSEQUENCE) {
            result.missense = true;
        }
    }
    result
}

/// Whether the prediction of `criterion` calls the variant damaging.
pub fn passes_criterion(
    criterion: Criterion,
    locus: &LocusKey,
    record: &VariantRecord,
) -> Result<bool, anyhow::Error> {
    Ok(match criterion {
        Criterion::Sift => record
            .csq_values("SIFT")
            .iter()
            .any(|value| value.contains("deleterious")),
        Criterion::Polyphen => record.csq_values("PolyPhen").iter().any(|value| {
            value.contains("possibly_damaging") || value.contains("probably_damaging")
        }),
        Criterion::Mpc => any_at_least(locus, "MPC", record.csq_values("MPC"), 2.0)?,
        Criterion::Cadd => record
            .info_number(locus, "CADD")?
            .map(|value| value >= 20.0)
            .unwrap_or(false),
        Criterion::Spidex => record
            .info_number(locus, "SPIDEX")?
            .map(|value| value.abs() >= 2.0)
            .unwrap_or(false),
        Criterion::Phylop => any_at_least(
            locus,
            "dbNSFP_phyloP100way_vertebrate",
            record
                .info_values("dbNSFP_phyloP100way_vertebrate")
                .unwrap_or_default(),
            2.0,
        )?,
    })
}

/// Whether any of the values is at least `threshold`, skipping empty and `NA` values.
fn any_at_least(
    locus: &LocusKey,
    key: &str,
    values: &[String],
    threshold: f64,
) -> Result<bool, anyhow::Error> {
    for value in values {
        if value.is_empty() || value == "NA" {
            continue;
        }
        if parse_number(locus, key, value)? >= threshold {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Number of the given criteria whose prediction calls the variant damaging.
pub fn votes(
    criteria: &IndexSet<Criterion>,
    locus: &LocusKey,
    record: &VariantRecord,
) -> Result<usize, anyhow::Error> {
    let mut result = 0;
    for criterion in criteria {
        if passes_criterion(*criterion, locus, record)? {
            tracing::trace!("variant {} is damaging according to {}", locus, criterion);
            result += 1;
        }
    }
    Ok(result)
}

/// Whether `votes` is a strict majority of `num_criteria`.
pub fn is_majority(votes: usize, num_criteria: usize) -> bool {
    2 * votes > num_criteria
}
