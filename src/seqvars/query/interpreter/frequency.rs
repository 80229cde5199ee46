use std::{collections::HashMap, path::Path};

use crate::{
    common::io::open_read_maybe_gz,
    seqvars::query::schema::{parse_number, FrequencySettings, LocusKey, VariantRecord},
};

/// Maximal in-house frequency, more frequent variants are excluded.
pub const INNER_FREQUENCY_THRESHOLD: f64 = 0.01;

/// In-house cohort frequencies by locus key, as read from JSON.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(transparent)]
pub struct InnerFrequencies(HashMap<String, f64>);

impl InnerFrequencies {
    /// Load from a JSON file mapping locus key to frequency.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let reader = open_read_maybe_gz(&path).map_err(|e| {
            anyhow::anyhow!("could not open {:?} for reading: {}", path.as_ref(), e)
        })?;
        let result: Self = serde_json::from_reader(reader).map_err(|e| {
            anyhow::anyhow!("could not parse in-house frequencies {:?}: {}", path.as_ref(), e)
        })?;
        tracing::debug!("loaded {} in-house frequencies", result.0.len());
        Ok(result)
    }

    /// Frequency of the given locus, if known.
    pub fn get(&self, locus: &LocusKey) -> Option<f64> {
        self.0.get(locus.as_str()).copied()
    }
}

/// Determine whether the `VariantRecord` passes the frequency filter.
///
/// Frequencies only apply where present, the gnomAD threshold applies to each non-empty
/// per-transcript value of the VEP `gnomAD_AF` column.  All active thresholds are
/// evaluated so that an invalid number is an error even if the record already fails an
/// earlier check.
pub fn passes(
    settings: &FrequencySettings,
    inner: Option<&InnerFrequencies>,
    locus: &LocusKey,
    record: &VariantRecord,
) -> Result<bool, anyhow::Error> {
    let mut result = true;

    for (key, threshold) in [
        ("1000GAF", settings.kg),
        ("EXACAF", settings.exac),
        ("SWEGENAF", settings.swegen),
    ] {
        if let Some(threshold) = threshold {
            if let Some(value) = record.info_number(locus, key)? {
                if value > threshold {
                    tracing::trace!(
                        "variant {} fails {} filter {} with {}",
                        locus,
                        key,
                        threshold,
                        value
                    );
                    result = false;
                }
            }
        }
    }

    if let Some(threshold) = settings.gnomad {
        for value in record.csq_values("gnomAD_AF") {
            if value.is_empty() {
                continue;
            }
            let value = parse_number(locus, "gnomAD_AF", value)?;
            if value > threshold {
                tracing::trace!(
                    "variant {} fails gnomAD filter {} with {}",
                    locus,
                    threshold,
                    value
                );
                result = false;
            }
        }
    }

    if let Some(value) = inner.and_then(|inner| inner.get(locus)) {
        if value > INNER_FREQUENCY_THRESHOLD {
            tracing::trace!("variant {} fails in-house frequency with {}", locus, value);
            result = false;
        }
    }

    Ok(result)
}
