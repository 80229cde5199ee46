//! Code implementing the "seqvars query" sub command.

pub mod genes;
pub mod interpreter;
pub mod output;
pub mod schema;

use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use clap::Parser;
use thousands::Separable;

use crate::{
    common::{
        io::{open_read_maybe_gz, read_lines},
        VERSION,
    },
    err::InputError,
    seqvars::ingest::is_vcf_path,
};

use self::{
    genes::GeneMatcher,
    interpreter::{frequency::InnerFrequencies, VariantSelection},
    output::Accumulator,
    schema::{CaseQuery, Criterion, VariantClass},
};

/// Command line arguments for `seqvars query` sub command.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Select rare damaging variants in disease genes", long_about = None)]
pub struct Args {
    /// Input VCF files, directories to scan for `*.vcf`/`*.vcf.gz`, or `@` followed by
    /// the path to a file listing inputs.
    #[arg(long, required = true)]
    pub path_input: Vec<String>,
    /// Path to the disease gene list (`alias,gene,modes`).
    #[arg(long, required = true)]
    pub path_genes: String,
    /// Path to the list of male sample names, one per line.
    #[arg(long, required = true)]
    pub path_males: String,
    /// Path to the output TSV file, gzip-compressed if ending in `.gz`.
    #[arg(long, required = true)]
    pub path_output: String,
    /// Optional path to in-house frequency JSON.
    #[arg(long)]
    pub path_inner_freq: Option<String>,
    /// Optional path to query JSON file, overridden by the thresholds below.
    #[arg(long)]
    pub path_query_json: Option<String>,

    /// Required value of the FILTER column, e.g., `PASS`.
    #[arg(long)]
    pub filter: Option<String>,
    /// Minimal `INFO/DP`.
    #[arg(long)]
    pub dp: Option<f64>,
    /// Minimal `INFO/QD`.
    #[arg(long)]
    pub qd: Option<f64>,
    /// Minimal `INFO/MQ`.
    #[arg(long)]
    pub mq: Option<f64>,
    /// Maximal 1000 Genomes allele frequency.
    #[arg(long)]
    pub kg: Option<f64>,
    /// Maximal ExAC allele frequency.
    #[arg(long)]
    pub exac: Option<f64>,
    /// Maximal gnomAD allele frequency.
    #[arg(long)]
    pub gnomad: Option<f64>,
    /// Maximal SweGen allele frequency.
    #[arg(long)]
    pub swegen: Option<f64>,
    /// Predictions voting on missense variants.
    #[arg(long, value_enum, value_delimiter = ',')]
    pub criteria: Vec<Criterion>,
    /// The class of selected variants to match against the disease genes.
    #[arg(long, value_enum, default_value_t = VariantClass::Damaging)]
    pub variant_class: VariantClass,
}

/// Load the query JSON, if any, and apply the thresholds from the command line.
pub fn load_query(args: &Args) -> Result<CaseQuery, anyhow::Error> {
    let mut query = if let Some(path) = args.path_query_json.as_ref() {
        let reader = open_read_maybe_gz(path)
            .map_err(|e| anyhow::anyhow!("could not open query JSON {:?}: {}", path, e))?;
        serde_json::from_reader(reader)
            .map_err(|e| anyhow::anyhow!("could not parse query JSON {:?}: {}", path, e))?
    } else {
        CaseQuery::default()
    };

    if args.filter.is_some() {
        query.quality.filter = args.filter.clone();
    }
    let overrides = [
        (&mut query.quality.dp, args.dp),
        (&mut query.quality.qd, args.qd),
        (&mut query.quality.mq, args.mq),
        (&mut query.frequency.kg, args.kg),
        (&mut query.frequency.exac, args.exac),
        (&mut query.frequency.gnomad, args.gnomad),
        (&mut query.frequency.swegen, args.swegen),
    ];
    for (setting, value) in overrides {
        if value.is_some() {
            *setting = value;
        }
    }
    if !args.criteria.is_empty() {
        query.criteria = args.criteria.iter().copied().collect();
    }

    Ok(query)
}

/// Resolve the input arguments to the list of VCF files to process.
pub fn collect_inputs(path_input: &[String]) -> Result<Vec<PathBuf>, anyhow::Error> {
    let mut result = Vec::new();
    for input in path_input {
        if let Some(path_list) = input.strip_prefix('@') {
            for path in read_lines(path_list)? {
                collect_path(Path::new(&path), &mut result)?;
            }
        } else {
            collect_path(Path::new(input), &mut result)?;
        }
    }
    if result.is_empty() {
        return Err(InputError::Missing(String::from("no VCF files found in input")).into());
    }
    Ok(result)
}

/// Add `path` or, for directories, the VCF files in it.
fn collect_path(path: &Path, result: &mut Vec<PathBuf>) -> Result<(), anyhow::Error> {
    if path.is_dir() {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry_path = entry?.path();
            if entry_path.is_file() && is_vcf_path(&entry_path) {
                paths.push(entry_path);
            }
        }
        paths.sort();
        tracing::debug!("found {} VCF files in {:?}", paths.len(), path);
        result.extend(paths);
    } else if path.is_file() {
        if !is_vcf_path(path) {
            return Err(InputError::Unsupported(path.display().to_string()).into());
        }
        result.push(path.to_path_buf());
    } else {
        return Err(InputError::Missing(path.display().to_string()).into());
    }
    Ok(())
}

/// Run the selection on one VCF file and return the variants matching disease genes.
fn process_file(
    path: &Path,
    query: &CaseQuery,
    inner: Option<&InnerFrequencies>,
    matcher: &GeneMatcher,
    variant_class: VariantClass,
) -> Result<Accumulator, anyhow::Error> {
    let before_processing = Instant::now();
    let selection = VariantSelection::from_path(path)?;
    let selected = selection.comb_selection(query, inner)?;
    let matched = matcher.match_sample(
        &selection.sample,
        &selection.subset(selected.get(variant_class)),
    );
    tracing::info!(
        "sample {} from {:?}: {} variants, {} {} variants, {} in disease genes ({:?})",
        &selection.sample,
        path,
        selection.variants.len().separate_with_commas(),
        selected.get(variant_class).len().separate_with_commas(),
        variant_class,
        matched.len().separate_with_commas(),
        before_processing.elapsed()
    );

    let mut result = Accumulator::default();
    result.insert(selection.sample, matched);
    Ok(result)
}

/// Main entry point for `seqvars query` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = Instant::now();
    tracing::info!("vcf-varselect {}", VERSION);
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    tracing::info!("Loading query...");
    let query = load_query(args)?;
    tracing::info!(
        "... done loading query = {}",
        &serde_json::to_string(&query)?
    );

    let matcher = GeneMatcher::from_paths(&args.path_genes, &args.path_males)?;
    let inner = args
        .path_inner_freq
        .as_ref()
        .map(InnerFrequencies::from_path)
        .transpose()?;
    let inputs = collect_inputs(&args.path_input)?;
    tracing::info!("processing {} VCF files", inputs.len());

    let mut accumulator = Accumulator::default();
    for path in &inputs {
        let result = process_file(path, &query, inner.as_ref(), &matcher, args.variant_class)
            .map_err(|e| anyhow::anyhow!("error processing {:?}: {}", path, e))?;
        accumulator = accumulator.merge(result);
    }

    tracing::info!(
        "writing {} variants of {} samples to {:?}",
        accumulator.num_variants().separate_with_commas(),
        accumulator.samples.len(),
        &args.path_output
    );
    accumulator.flatten().write_tsv(&args.path_output)?;

    tracing::info!(
        "All of `seqvars query` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}
