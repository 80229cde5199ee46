//! Matching of selected variants against disease genes and their modes of inheritance.

use std::{collections::HashSet, path::Path, time::Instant};

use enum_map::EnumMap;
use indexmap::IndexMap;
use itertools::Itertools;

use crate::common::{
    io::{open_read_maybe_gz, read_lines},
    Chrom, Genotype, Sex,
};

use super::schema::{LocusKey, SampleVariants, VariantRecord};

/// Ensembl IDs of the genes on both X and Y chromosomes.
pub const PSEUDOAUTOSOMAL_GENES: &[&str] = &[
    "ENSG00000197976",
    "ENSG00000196433",
    "ENSG00000169093",
    "ENSG00000002586",
    "ENSG00000205755",
    "ENSG00000198223",
    "ENSG00000169084",
    "ENSG00000178605",
    "ENSG00000185291",
    "ENSG00000182162",
    "ENSG00000182378",
    "ENSG00000167393",
    "ENSG00000185960",
    "ENSG00000169100",
    "ENSG00000124343",
    "ENSG00000214717",
    "ENSG00000124334",
    "ENSG00000168939",
    "ENSG00000124333",
    "ENSG00000182484",
];

/// Whether the gene is one of `PSEUDOAUTOSOMAL_GENES`.
pub fn is_pseudoautosomal(gene: &str) -> bool {
    PSEUDOAUTOSOMAL_GENES.contains(&gene)
}

/// Inheritance groups that disease genes are bucketed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, enum_map::Enum, strum::Display)]
pub enum InheritanceGroup {
    #[strum(serialize = "AR")]
    AutosomalRecessive,
    #[strum(serialize = "XR")]
    XLinkedRecessive,
    #[strum(serialize = "AD")]
    AutosomalDominant,
    #[strum(serialize = "XD")]
    XLinkedDominant,
}

impl InheritanceGroup {
    /// Groups of a gene with the given mode of inheritance string, e.g., `AR,AD`.
    ///
    /// The recessive groups only apply if the corresponding dominant mode is absent.
    pub fn from_modes(modes: &str) -> Vec<Self> {
        let mut result = Vec::new();
        if modes.contains("AR") && !modes.contains("AD") {
            result.push(Self::AutosomalRecessive);
        }
        if modes.contains("XR") && !modes.contains("XD") {
            result.push(Self::XLinkedRecessive);
        }
        if modes.contains("AD") {
            result.push(Self::AutosomalDominant);
        }
        if modes.contains("XD") {
            result.push(Self::XLinkedDominant);
        }
        result
    }
}

/// One entry of the disease gene list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiseaseGene {
    /// Alias, usually the gene symbol.
    pub alias: String,
    /// Modes of inheritance, e.g., `AR,AD`.
    pub modes: String,
}

/// Load the disease gene list.
///
/// Each line has the gene alias, the gene identifier as used in the VEP `Gene` column,
/// and the modes of inheritance, separated by commas.
pub fn load_genes<P: AsRef<Path>>(path: P) -> Result<IndexMap<String, DiseaseGene>, anyhow::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(open_read_maybe_gz(path.as_ref())?);

    let mut result = IndexMap::new();
    for record in reader.records() {
        let record = record?;
        if record.len() < 3 {
            anyhow::bail!(
                "gene list line {:?} in {:?} has fewer than 3 columns",
                record.iter().collect::<Vec<_>>(),
                path.as_ref()
            );
        }
        result.insert(
            record[1].to_string(),
            DiseaseGene {
                alias: record[0].to_string(),
                modes: record.iter().skip(2).collect::<Vec<_>>().join(","),
            },
        );
    }
    Ok(result)
}

/// Matches variants against the disease genes given the sample's sex.
#[derive(Debug, Clone, Default)]
pub struct GeneMatcher {
    /// Disease genes by identifier.
    pub genes: IndexMap<String, DiseaseGene>,
    /// Gene identifiers by inheritance group.
    pub groups: EnumMap<InheritanceGroup, HashSet<String>>,
    /// Names of the male samples.
    pub males: HashSet<String>,
}

impl GeneMatcher {
    /// Construct from the disease genes and the male sample names.
    pub fn new(genes: IndexMap<String, DiseaseGene>, males: HashSet<String>) -> Self {
        let mut groups: EnumMap<InheritanceGroup, HashSet<String>> = EnumMap::default();
        for (gene, disease_gene) in &genes {
            for group in InheritanceGroup::from_modes(&disease_gene.modes) {
                groups[group].insert(gene.clone());
            }
        }
        for (group, genes) in &groups {
            tracing::debug!("{} genes with inheritance {}", genes.len(), group);
        }
        Self {
            genes,
            groups,
            males,
        }
    }

    /// Load gene list and male sample list from files.
    pub fn from_paths<P: AsRef<Path>, Q: AsRef<Path>>(
        path_genes: P,
        path_males: Q,
    ) -> Result<Self, anyhow::Error> {
        let before_loading = Instant::now();
        let genes = load_genes(path_genes.as_ref()).map_err(|e| {
            anyhow::anyhow!(
                "could not load gene list from {:?}: {}",
                path_genes.as_ref(),
                e
            )
        })?;
        let males = read_lines(path_males.as_ref())?
            .into_iter()
            .collect::<HashSet<_>>();
        tracing::info!(
            "loaded {} disease genes and {} male samples in {:?}",
            genes.len(),
            males.len(),
            before_loading.elapsed()
        );
        Ok(Self::new(genes, males))
    }

    /// Sex of the given sample.
    pub fn sex(&self, sample: &str) -> Sex {
        if self.males.contains(sample) {
            Sex::Male
        } else {
            Sex::Female
        }
    }

    /// Whether any of the variant's genes is in one of `groups`, optionally also requiring
    /// the gene to be (or not to be) pseudoautosomal.
    fn any_gene(
        &self,
        record: &VariantRecord,
        groups: &[InheritanceGroup],
        pseudoautosomal: Option<bool>,
    ) -> bool {
        record.csq_values("Gene").iter().any(|gene| {
            groups.iter().any(|group| self.groups[*group].contains(gene))
                && pseudoautosomal.map_or(true, |expected| is_pseudoautosomal(gene) == expected)
        })
    }

    /// Determine whether the variant of the sample is compatible with the inheritance of
    /// one of its genes.
    pub fn passes(&self, sample: &str, locus: &LocusKey, record: &VariantRecord) -> bool {
        use InheritanceGroup::*;

        let chrom = Chrom::from(locus.chrom());
        let sex = self.sex(sample);
        let genotype = record
            .genotype
            .as_deref()
            .map(Genotype::from)
            .unwrap_or(Genotype::Other);

        let result = match (chrom, sex, genotype) {
            (Chrom::Auto, _, Genotype::Het) => self.any_gene(record, &[AutosomalDominant], None),
            (Chrom::Auto, _, Genotype::HomAlt) => {
                self.any_gene(record, &[AutosomalDominant, AutosomalRecessive], None)
            }
            (Chrom::X, Sex::Female, Genotype::Het) => {
                self.any_gene(record, &[XLinkedDominant], None)
            }
            (Chrom::X, Sex::Female, Genotype::HomAlt) => {
                self.any_gene(record, &[XLinkedDominant, XLinkedRecessive], None)
            }
            (Chrom::X, Sex::Male, Genotype::Het) | (Chrom::Y, Sex::Male, Genotype::Het) => {
                self.any_gene(record, &[XLinkedDominant], Some(true))
            }
            (Chrom::X, Sex::Male, Genotype::HomAlt) | (Chrom::Y, Sex::Male, Genotype::HomAlt) => {
                self.any_gene(record, &[XLinkedDominant, XLinkedRecessive], Some(true))
            }
            (Chrom::X, Sex::Male, Genotype::Hemi) | (Chrom::Y, Sex::Male, Genotype::Hemi) => {
                self.any_gene(record, &[XLinkedDominant, XLinkedRecessive], Some(false))
            }
            _ => false,
        };

        tracing::trace!(
            "variant {} of {} sample {} ({:?} on {:?}) in disease genes [{}]: {}",
            locus,
            sex,
            sample,
            genotype,
            chrom,
            record
                .csq_values("Gene")
                .iter()
                .filter_map(|gene| self.genes.get(gene))
                .map(|gene| &gene.alias)
                .join(","),
            result
        );
        result
    }

    /// The variants of the sample that match the disease genes, in input order.
    pub fn match_sample(&self, sample: &str, variants: &SampleVariants) -> SampleVariants {
        variants
            .iter()
            .filter(|(locus, record)| self.passes(sample, locus, record))
            .map(|(locus, record)| (locus.clone(), record.clone()))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{load_genes, GeneMatcher, InheritanceGroup};
    use crate::{
        common::Sex,
        seqvars::query::schema::{LocusKey, SampleVariants, VariantRecord, VepAnnotation},
    };

    fn matcher() -> GeneMatcher {
        GeneMatcher::from_paths("tests/seqvars/query/genes.txt", "tests/seqvars/query/males.txt")
            .unwrap()
    }

    fn record(genotype: &str, genes: &[&str]) -> VariantRecord {
        VariantRecord {
            genotype: Some(genotype.to_string()),
            csq: Some(VepAnnotation::from_transcripts(
                &[String::from("Gene")],
                genes,
            )),
            ..Default::default()
        }
    }

    #[rstest]
    #[case("AR", &[InheritanceGroup::AutosomalRecessive])]
    #[case("AD", &[InheritanceGroup::AutosomalDominant])]
    #[case("AR,AD", &[InheritanceGroup::AutosomalDominant])]
    #[case("XR", &[InheritanceGroup::XLinkedRecessive])]
    #[case("XR,XD", &[InheritanceGroup::XLinkedDominant])]
    #[case(
        "AD,XD",
        &[InheritanceGroup::AutosomalDominant, InheritanceGroup::XLinkedDominant]
    )]
    #[case(
        "AR,XR",
        &[InheritanceGroup::AutosomalRecessive, InheritanceGroup::XLinkedRecessive]
    )]
    #[case("", &[])]
    fn inheritance_group_from_modes(#[case] modes: &str, #[case] expected: &[InheritanceGroup]) {
        assert_eq!(InheritanceGroup::from_modes(modes), expected.to_vec());
    }

    #[test]
    fn load_genes_fixture() -> Result<(), anyhow::Error> {
        let genes = load_genes("tests/seqvars/query/genes.txt")?;

        assert_eq!(genes.len(), 7);
        assert_eq!(genes["ENSG00000001"].alias, "GENEAD");
        assert_eq!(genes["ENSG00000003"].modes, "AR,AD");
        assert_eq!(genes["ENSG00000124333"].alias, "VAMP7");

        Ok(())
    }

    #[test]
    fn gene_matcher_groups() {
        let matcher = matcher();

        assert!(matcher.groups[InheritanceGroup::AutosomalDominant].contains("ENSG00000003"));
        assert!(!matcher.groups[InheritanceGroup::AutosomalRecessive].contains("ENSG00000003"));
        assert_eq!(matcher.sex("MALE01"), Sex::Male);
        assert_eq!(matcher.sex("FEMALE01"), Sex::Female);
    }

    #[rstest]
    // autosomal
    #[case("FEMALE01", "1", "0/1", "ENSG00000001", true)]
    #[case("FEMALE01", "1", "1/0", "ENSG00000002", false)]
    #[case("FEMALE01", "1", "1/1", "ENSG00000002", true)]
    #[case("MALE01", "chr1", "0|1", "ENSG00000003", true)]
    #[case("FEMALE01", "1", "0/0", "ENSG00000001", false)]
    #[case("FEMALE01", "1", "0/1", "ENSG99999999", false)]
    // X, female
    #[case("FEMALE01", "X", "0/1", "ENSG00000004", true)]
    #[case("FEMALE01", "X", "0/1", "ENSG00000005", false)]
    #[case("FEMALE01", "X", "1/1", "ENSG00000005", true)]
    #[case("FEMALE01", "X", "./1", "ENSG00000005", false)]
    // X, male
    #[case("MALE01", "X", "0/1", "ENSG00000004", false)]
    #[case("MALE01", "X", "0/1", "ENSG00000124333", true)]
    #[case("MALE01", "X", "1/1", "ENSG00000005", false)]
    #[case("MALE01", "X", "1/1", "ENSG00000182484", true)]
    #[case("MALE01", "X", "./1", "ENSG00000005", true)]
    #[case("MALE02", "chrX", "1/.", "ENSG00000004", true)]
    #[case("MALE01", "X", "./1", "ENSG00000182484", false)]
    // Y
    #[case("MALE01", "Y", "0/1", "ENSG00000124333", true)]
    #[case("MALE01", "Y", "./1", "ENSG00000005", true)]
    #[case("FEMALE01", "Y", "1/1", "ENSG00000182484", false)]
    #[case("FEMALE01", "Y", "./1", "ENSG00000005", false)]
    fn gene_matcher_passes(
        #[case] sample: &str,
        #[case] chrom: &str,
        #[case] genotype: &str,
        #[case] gene: &str,
        #[case] expected: bool,
    ) {
        let locus = LocusKey::new(chrom, "1000", ".", "A", "G");

        assert_eq!(
            matcher().passes(sample, &locus, &record(genotype, &[gene])),
            expected
        );
    }

    #[test]
    fn gene_matcher_passes_without_gt_or_csq() {
        let locus = LocusKey::new("1", "1000", ".", "A", "G");
        let matcher = matcher();

        assert!(!matcher.passes("FEMALE01", &locus, &VariantRecord::default()));
        assert!(!matcher.passes(
            "FEMALE01",
            &locus,
            &VariantRecord {
                genotype: Some(String::from("0/1")),
                ..Default::default()
            }
        ));
    }

    #[test]
    fn gene_matcher_match_sample() {
        let variants: SampleVariants = [
            (
                LocusKey::new("1", "100", ".", "A", "G"),
                record("0/1", &["ENSG00000002", "ENSG00000001"]),
            ),
            (
                LocusKey::new("1", "200", ".", "A", "G"),
                record("0/1", &["ENSG00000002"]),
            ),
            (
                LocusKey::new("X", "300", ".", "A", "G"),
                record("./1", &["ENSG00000005"]),
            ),
        ]
        .into_iter()
        .collect();

        let matcher = matcher();

        assert_eq!(
            matcher
                .match_sample("MALE01", &variants)
                .keys()
                .map(|locus| locus.as_str())
                .collect::<Vec<_>>(),
            vec!["1:100:.:A:G", "X:300:.:A:G"]
        );
        assert_eq!(
            matcher
                .match_sample("FEMALE01", &variants)
                .keys()
                .map(|locus| locus.as_str())
                .collect::<Vec<_>>(),
            vec!["1:100:.:A:G"]
        );
    }
}
