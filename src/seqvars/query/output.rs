//! Aggregation of matched variants over samples and flattening into a table.

use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;

use crate::common::io::open_write_maybe_gz;

use super::schema::SampleVariants;

/// Name of the row key column.
pub const ROW_KEY_COLUMN: &str = "sample_variant";
/// Prefix of the columns holding VEP annotation.
pub const CSQ_PREFIX: &str = "CSQ:";

/// Matched variants by sample.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulator {
    /// Variants by sample name, in order of insertion.
    pub samples: IndexMap<String, SampleVariants>,
}

impl Accumulator {
    /// Add the variants of one sample, replacing earlier variants of the same sample.
    pub fn insert(&mut self, sample: String, variants: SampleVariants) {
        if self.samples.insert(sample.clone(), variants).is_some() {
            tracing::warn!("replacing earlier variants of sample {}", &sample);
        }
    }

    /// Merge `other` into `self`, samples in `other` win.
    pub fn merge(mut self, other: Accumulator) -> Accumulator {
        for (sample, variants) in other.samples {
            self.insert(sample, variants);
        }
        self
    }

    /// Total number of variants over all samples.
    pub fn num_variants(&self) -> usize {
        self.samples.values().map(|variants| variants.len()).sum()
    }

    /// Flatten into one row per sample and variant.
    pub fn flatten(&self) -> Table {
        let mut info_columns = IndexSet::new();
        let mut csq_columns = IndexSet::new();
        let mut rows = Vec::new();
        for (sample, variants) in &self.samples {
            for (locus, record) in variants {
                let mut row = IndexMap::new();
                row.insert(String::from("QUAL"), record.qual.clone());
                row.insert(String::from("FILTER"), record.filter.clone());
                if let Some(genotype) = record.genotype.as_ref() {
                    row.insert(String::from("GT"), genotype.clone());
                }
                for (key, values) in &record.info {
                    info_columns.insert(key.clone());
                    row.insert(key.clone(), values.iter().join(","));
                }
                for (column, values) in record.csq.iter().flat_map(|csq| csq.columns.iter()) {
                    let column = format!("{}{}", CSQ_PREFIX, column);
                    csq_columns.insert(column.clone());
                    row.insert(column, values.iter().join(","));
                }
                rows.push((format!("{}_{}", sample, locus), row));
            }
        }

        let header = [ROW_KEY_COLUMN, "QUAL", "FILTER", "GT"]
            .into_iter()
            .map(String::from)
            .chain(
                info_columns
                    .into_iter()
                    .filter(|column| !["QUAL", "FILTER", "GT"].contains(&column.as_str())),
            )
            .chain(csq_columns)
            .collect::<Vec<_>>();
        let rows = rows
            .into_iter()
            .map(|(row_key, mut row)| {
                std::iter::once(row_key)
                    .chain(
                        header
                            .iter()
                            .skip(1)
                            .map(|column| row.swap_remove(column).unwrap_or_default()),
                    )
                    .collect::<Vec<_>>()
            })
            .collect();

        Table { header, rows }
    }
}

/// Flat table of matched variants, missing values are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Column names, starting with `ROW_KEY_COLUMN`.
    pub header: Vec<String>,
    /// Rows, each with one value per column.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Write as TSV, gzip-compressed if the path ends in `.gz`.
    pub fn write_tsv<P: AsRef<Path>>(&self, path: P) -> Result<(), anyhow::Error> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(open_write_maybe_gz(path.as_ref()).map_err(|e| {
                anyhow::anyhow!("Cannot open {:?} for writing: {:?}", path.as_ref(), e)
            })?);
        writer.write_record(&self.header)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}
