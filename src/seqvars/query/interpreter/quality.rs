use crate::seqvars::query::schema::{LocusKey, QualitySettings, VariantRecord};

/// Determine whether the `VariantRecord` passes the quality filter.
///
/// The numeric thresholds only apply if the record has the corresponding `INFO` field.
/// All active thresholds are evaluated so that an invalid number is an error even if the
/// record already fails an earlier check.
pub fn passes(
    settings: &QualitySettings,
    locus: &LocusKey,
    record: &VariantRecord,
) -> Result<bool, anyhow::Error> {
    let mut result = true;

    if let Some(filter) = settings.filter.as_ref() {
        if &record.filter != filter {
            tracing::trace!(
                "variant {} fails FILTER {:?} with {:?}",
                locus,
                filter,
                &record.filter
            );
            result = false;
        }
    }

    for (key, threshold) in [("DP", settings.dp), ("QD", settings.qd), ("MQ", settings.mq)] {
        if let Some(threshold) = threshold {
            if let Some(value) = record.info_number(locus, key)? {
                if value < threshold {
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

    Ok(result)
}
