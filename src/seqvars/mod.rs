//! Selection of sequence variants from single-sample VCF files.

pub mod ingest;
pub mod query;
