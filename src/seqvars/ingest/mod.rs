//! Reading of single-sample VCF files into `VariantRecord`s.

pub mod header;

use std::{io::BufRead, path::Path};

use thousands::Separable;

use crate::{
    common::io::open_read_maybe_gz,
    err::{InputError, ParseError},
    seqvars::query::schema::{LocusKey, SampleVariants, VariantRecord, VepAnnotation},
};

use self::header::{HeaderKind, MetadataParser};

/// Whether the path has one of the supported VCF file extensions.
pub fn is_vcf_path<P: AsRef<Path>>(path: P) -> bool {
    let name = path
        .as_ref()
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    name.ends_with(".vcf") || name.ends_with(".vcf.gz")
}

/// Convert one data line of a VCF file into a `VariantRecord`.
///
/// # Errors
///
/// Returns `ParseError::MalformedVariant` if the number of columns does not match the
/// `#CHROM` header line.
pub fn read_variant(
    line: &str,
    parser: &MetadataParser,
) -> Result<(LocusKey, VariantRecord), anyhow::Error> {
    let line = line.trim_end_matches(['\r', '\n']);
    let fields = line.split('\t').collect::<Vec<_>>();
    if fields.len() != parser.header.len() {
        return Err(ParseError::MalformedVariant(line.to_string()).into());
    }

    let key = LocusKey::new(fields[0], fields[1], fields[2], fields[3], fields[4]);

    let genotype = fields[8]
        .split(':')
        .position(|key| key == "GT")
        .and_then(|idx| fields[9].split(':').nth(idx))
        .map(String::from);

    let mut info = indexmap::IndexMap::new();
    let mut csq = None;
    for entry in fields[7].split(';') {
        if entry.is_empty() || entry == "." {
            continue;
        }
        let (info_key, values) = match entry.split_once('=') {
            Some((info_key, value)) => (
                info_key,
                value.split(',').map(String::from).collect::<Vec<_>>(),
            ),
            None => (entry, Vec::new()),
        };
        if info_key == "CSQ" {
            csq = Some(VepAnnotation::from_transcripts(&parser.vep_columns, &values));
        } else {
            info.insert(info_key.to_string(), values);
        }
    }

    Ok((
        key,
        VariantRecord {
            qual: fields[5].to_string(),
            filter: fields[6].to_string(),
            genotype,
            info,
            csq,
        },
    ))
}

/// The header and all variants of one single-sample VCF file.
#[derive(Debug)]
pub struct SampleVcf {
    /// Parsed header information.
    pub metadata: MetadataParser,
    /// Name of the sample from the `#CHROM` line.
    pub sample: String,
    /// The sample's variants, later lines win on duplicate loci.
    pub variants: SampleVariants,
}

impl SampleVcf {
    /// Read from a `.vcf` or `.vcf.gz` file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        if !is_vcf_path(path) {
            return Err(InputError::Unsupported(path.display().to_string()).into());
        }
        tracing::debug!("reading VCF file {:?}", path);
        let reader = open_read_maybe_gz(path)
            .map_err(|e| anyhow::anyhow!("could not open {:?} for reading: {}", path, e))?;
        Self::from_reader(reader)
    }

    /// Read header and records until the end of input or the next header line.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, anyhow::Error> {
        let mut metadata = MetadataParser::new()?;
        let mut variants = SampleVariants::new();
        let mut in_header = true;

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if line.starts_with('#') {
                if !in_header {
                    tracing::debug!("stopping at header line after records: {}", &line);
                    break;
                }
                if line.starts_with("##") {
                    metadata.read_metadata(&line)?;
                } else if line.starts_with("#CHROM") {
                    metadata.read_header(&line)?;
                }
            } else {
                in_header = false;
                if metadata.sample().is_none() {
                    return Err(ParseError::MissingHeader(line).into());
                }
                let (key, record) = read_variant(&line, &metadata)?;
                tracing::trace!(
                    "read variant {} with {} transcripts",
                    &key,
                    record
                        .csq
                        .as_ref()
                        .map(VepAnnotation::num_transcripts)
                        .unwrap_or_default()
                );
                variants.insert(key, record);
            }
        }

        tracing::debug!(
            "header of {:?} declares {} INFO, {} FILTER, and {} FORMAT fields",
            metadata.fileformat.as_deref().unwrap_or("unknown format"),
            metadata.info.len(),
            metadata.ids[HeaderKind::Filter].len(),
            metadata.ids[HeaderKind::Format].len()
        );
        let sample = metadata
            .sample()
            .ok_or_else(|| ParseError::MissingHeader(String::from("<end of file>")))?
            .to_string();
        tracing::debug!(
            "read {} variants for sample {}",
            variants.len().separate_with_commas(),
            &sample
        );

        Ok(Self {
            metadata,
            sample,
            variants,
        })
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{header::MetadataParser, read_variant, SampleVcf};
    use crate::{
        err::{InputError, ParseError},
        seqvars::query::schema::LocusKey,
    };

    fn parser() -> MetadataParser {
        let mut parser = MetadataParser::new().unwrap();
        parser
            .read_metadata(
                "##INFO=<ID=CSQ,Number=.,Type=String,Description=\"Consequence annotations \
                 from Ensembl VEP. Format: Allele|Consequence|Gene\">",
            )
            .unwrap();
        parser
            .read_header("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1")
            .unwrap();
        parser
    }

    #[test]
    fn read_variant_fields() -> Result<(), anyhow::Error> {
        let line = "1\t1000\trs1\tC\tA\t50.2\tPASS\t\
            DP=15;AC=1,2;DB;CSQ=A|missense_variant|ENSG001,A|frameshift_variant|ENSG001\t\
            AD:GT:GQ\t7,8:0/1:99";

        let (key, record) = read_variant(line, &parser())?;

        assert_eq!(key, LocusKey::new("1", "1000", "rs1", "C", "A"));
        assert_eq!(record.qual, "50.2");
        assert_eq!(record.filter, "PASS");
        assert_eq!(record.genotype.as_deref(), Some("0/1"));
        assert_eq!(
            record.info.keys().collect::<Vec<_>>(),
            vec!["DP", "AC", "DB"]
        );
        assert_eq!(record.info["DP"], vec!["15"]);
        assert_eq!(record.info["AC"], vec!["1", "2"]);
        assert!(record.info["DB"].is_empty());

        let csq = record.csq.expect("CSQ is present");
        assert_eq!(csq.columns.len(), 3);
        assert_eq!(
            csq.values("Consequence"),
            &["missense_variant", "frameshift_variant"]
        );
        assert_eq!(csq.values("Gene"), &["ENSG001", "ENSG001"]);

        Ok(())
    }

    #[test]
    fn read_variant_without_gt_and_info() -> Result<(), anyhow::Error> {
        let line = "X\t5\t.\tG\tT\t.\tq10\t.\tDP\t12";

        let (key, record) = read_variant(line, &parser())?;

        assert_eq!(key.chrom(), "X");
        assert_eq!(record.genotype, None);
        assert!(record.info.is_empty());
        assert_eq!(record.csq, None);

        Ok(())
    }

    #[rstest]
    #[case("1\t1000\trs1\tC\tA\t50\tPASS\tDP=15\tGT")]
    #[case("1\t1000\trs1\tC\tA\t50\tPASS\tDP=15\tGT\t0/1\t0/1")]
    fn read_variant_malformed(#[case] line: &str) {
        let err = read_variant(line, &parser()).unwrap_err();

        assert_eq!(
            err.downcast_ref::<ParseError>(),
            Some(&ParseError::MalformedVariant(line.to_string()))
        );
    }

    #[rstest]
    #[case("tests/seqvars/ingest/example.vcf")]
    #[case("tests/seqvars/ingest/example.vcf.gz")]
    fn sample_vcf_from_path(#[case] path: &str) -> Result<(), anyhow::Error> {
        let vcf = SampleVcf::from_path(path)?;

        assert_eq!(vcf.sample, "SAMPLE01");
        assert_eq!(vcf.metadata.fileformat.as_deref(), Some("VCFv4.2"));
        assert_eq!(vcf.variants.len(), 7);
        assert_eq!(
            vcf.metadata.vep_columns,
            vec![
                "Allele",
                "Consequence",
                "Gene",
                "SYMBOL",
                "SIFT",
                "PolyPhen",
                "gnomAD_AF",
                "MPC"
            ]
        );

        Ok(())
    }

    #[test]
    fn sample_vcf_duplicate_locus_last_wins() -> Result<(), anyhow::Error> {
        let vcf = "##fileformat=VCFv4.2\n\
            #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n\
            1\t10\t.\tA\tG\t10\tPASS\tDP=5\tGT\t0/1\n\
            1\t20\t.\tA\tG\t10\tPASS\tDP=6\tGT\t0/1\n\
            1\t10\t.\tA\tG\t10\tPASS\tDP=7\tGT\t1/1\n";

        let vcf = SampleVcf::from_reader(vcf.as_bytes())?;

        assert_eq!(vcf.variants.len(), 2);
        let record = &vcf.variants[&LocusKey::new("1", "10", ".", "A", "G")];
        assert_eq!(record.info["DP"], vec!["7"]);
        assert_eq!(record.genotype.as_deref(), Some("1/1"));

        Ok(())
    }

    #[test]
    fn sample_vcf_stops_at_header_line() -> Result<(), anyhow::Error> {
        let vcf = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n\
            1\t10\t.\tA\tG\t10\tPASS\tDP=5\tGT\t0/1\n\
            #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n\
            1\t20\t.\tA\tG\t10\tPASS\tDP=6\tGT\t0/1\n";

        let vcf = SampleVcf::from_reader(vcf.as_bytes())?;

        assert_eq!(vcf.variants.len(), 1);

        Ok(())
    }

    #[test]
    fn sample_vcf_malformed_line() {
        let vcf = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n\
            1\t10\t.\tA\tG\t10\tPASS\tDP=5\tGT\n";

        let err = SampleVcf::from_reader(vcf.as_bytes()).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ParseError>(),
            Some(ParseError::MalformedVariant(_))
        ));
    }

    #[test]
    fn sample_vcf_missing_header() {
        let vcf = "##fileformat=VCFv4.2\n1\t10\t.\tA\tG\t10\tPASS\tDP=5\tGT\t0/1\n";

        let err = SampleVcf::from_reader(vcf.as_bytes()).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ParseError>(),
            Some(ParseError::MissingHeader(_))
        ));
    }

    #[test]
    fn sample_vcf_unsupported_extension() {
        let err = SampleVcf::from_path("tests/seqvars/query/genes.txt").unwrap_err();

        assert_eq!(
            err.downcast_ref::<InputError>(),
            Some(&InputError::Unsupported(String::from(
                "tests/seqvars/query/genes.txt"
            )))
        );
    }
}
