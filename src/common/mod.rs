//! Common functionality.

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

pub mod io;

/// Commonly used command line arguments.
#[derive(Parser, Debug)]
pub struct Args {
    /// Verbosity of the program
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            verbose: Verbosity::new(0, 0),
        }
    }
}

/// Strip an optional `chr` prefix from a chromosome name.
pub fn canonicalize(chrom: &str) -> &str {
    chrom
        .strip_prefix("chr")
        .or_else(|| chrom.strip_prefix("CHR"))
        .unwrap_or(chrom)
}

/// Chromosome class relevant for the zygosity interpretation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Chrom {
    Auto, // or chrMT, but does not matter for inheritance matching
    X,
    Y,
}

impl From<&str> for Chrom {
    fn from(s: &str) -> Self {
        match canonicalize(s) {
            "X" => Chrom::X,
            "Y" => Chrom::Y,
            _ => Chrom::Auto,
        }
    }
}

/// Sex of a sample, samples not listed as male are treated as female.
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
pub enum Sex {
    Male,
    Female,
}

/// Helper type for classifying the `GT` call of a single sample.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Genotype {
    /// het., `0/1` or `1/0`
    Het,
    /// hom. alt., `1/1`
    HomAlt,
    /// one allele not called, `./1` or `1/.`
    Hemi,
    /// anything else, includes hom. ref. and no-call
    Other,
}

impl From<&str> for Genotype {
    fn from(s: &str) -> Self {
        match s {
            "0/1" | "1/0" | "0|1" | "1|0" => Genotype::Het,
            "1/1" | "1|1" => Genotype::HomAlt,
            "./1" | "1/." | ".|1" | "1|." => Genotype::Hemi,
            _ => Genotype::Other,
        }
    }
}

/// The version of the `vcf-varselect` package.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
