//! Apply the settings of a `CaseQuery` to the variants of one sample.

pub mod consequences;
pub mod frequency;
pub mod quality;

use std::path::Path;

use indexmap::IndexSet;
use thousands::Separable;

use self::frequency::InnerFrequencies;
use super::schema::{
    CaseQuery, Criterion, FrequencySettings, LocusSet, QualitySettings, SampleVariants,
    VariantClass,
};
use crate::seqvars::ingest::SampleVcf;

/// Result of the damaging selection, all subsets of one sample's loci.
#[derive(Debug, Clone, Default, PartialEq, Eq, derive_new::new)]
pub struct DamagingSelection {
    /// Loss-of-function and damaging missense variants.
    pub damaging: LocusSet,
    /// Loss-of-function variants.
    pub lof: LocusSet,
    /// Missense variants called damaging by a majority of the criteria.
    pub missense: LocusSet,
}

impl DamagingSelection {
    /// The loci of the given class.
    pub fn get(&self, class: VariantClass) -> &LocusSet {
        match class {
            VariantClass::Damaging => &self.damaging,
            VariantClass::Lof => &self.lof,
            VariantClass::Missense => &self.missense,
        }
    }
}

/// All variants of one sample together with the selection operations on them.
#[derive(Debug, Clone, Default)]
pub struct VariantSelection {
    /// Name of the sample.
    pub sample: String,
    /// The sample's variants in file order.
    pub variants: SampleVariants,
}

impl VariantSelection {
    /// Construct from the sample name and its variants.
    pub fn new(sample: String, variants: SampleVariants) -> Self {
        Self { sample, variants }
    }

    /// Read all variants of the single sample in a `.vcf` or `.vcf.gz` file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let SampleVcf {
            metadata,
            sample,
            variants,
        } = SampleVcf::from_path(path)?;
        tracing::debug!("VEP columns of {}: {:?}", &sample, &metadata.vep_columns);
        Ok(Self::new(sample, variants))
    }

    /// Loci of variants that pass the quality thresholds.
    pub fn quality_selection(&self, settings: &QualitySettings) -> Result<LocusSet, anyhow::Error> {
        let mut result = LocusSet::new();
        for (locus, record) in &self.variants {
            if quality::passes(settings, locus, record)? {
                result.insert(locus.clone());
            }
        }
        tracing::debug!(
            "{} of {} variants of {} pass quality filter",
            result.len().separate_with_commas(),
            self.variants.len().separate_with_commas(),
            &self.sample
        );
        Ok(result)
    }

    /// Loci of variants that are not more frequent than the thresholds.
    pub fn freq_selection(
        &self,
        settings: &FrequencySettings,
        inner: Option<&InnerFrequencies>,
    ) -> Result<LocusSet, anyhow::Error> {
        let mut result = LocusSet::new();
        for (locus, record) in &self.variants {
            if frequency::passes(settings, inner, locus, record)? {
                result.insert(locus.clone());
            }
        }
        tracing::debug!(
            "{} of {} variants of {} pass frequency filter",
            result.len().separate_with_commas(),
            self.variants.len().separate_with_commas(),
            &self.sample
        );
        Ok(result)
    }

    /// Loci of loss-of-function variants and missense variants that a strict majority
    /// of `criteria` calls damaging.
    pub fn damaging_selection(
        &self,
        criteria: &IndexSet<Criterion>,
    ) -> Result<DamagingSelection, anyhow::Error> {
        let mut result = DamagingSelection::default();
        for (locus, record) in &self.variants {
            let classification = consequences::classify(record);
            let votes = consequences::votes(criteria, locus, record)?;
            if classification.lof {
                result.lof.insert(locus.clone());
            }
            if classification.missense && consequences::is_majority(votes, criteria.len()) {
                tracing::trace!(
                    "missense variant {} has {} of {} votes",
                    locus,
                    votes,
                    criteria.len()
                );
                result.missense.insert(locus.clone());
            }
            if result.lof.contains(locus) || result.missense.contains(locus) {
                result.damaging.insert(locus.clone());
            }
        }
        tracing::debug!(
            "{} damaging variants of {} ({} LOF, {} missense)",
            result.damaging.len().separate_with_commas(),
            &self.sample,
            result.lof.len().separate_with_commas(),
            result.missense.len().separate_with_commas()
        );
        Ok(result)
    }

    /// Intersect the damaging selection with the quality and frequency selections.
    pub fn comb_selection(
        &self,
        query: &CaseQuery,
        inner: Option<&InnerFrequencies>,
    ) -> Result<DamagingSelection, anyhow::Error> {
        let damaging = self.damaging_selection(&query.criteria)?;
        let quality = self.quality_selection(&query.quality)?;
        let freq = self.freq_selection(&query.frequency, inner)?;

        let intersect = |selected: &LocusSet| -> LocusSet {
            selected
                .iter()
                .filter(|locus| quality.contains(*locus) && freq.contains(*locus))
                .cloned()
                .collect()
        };
        Ok(DamagingSelection::new(
            intersect(&damaging.damaging),
            intersect(&damaging.lof),
            intersect(&damaging.missense),
        ))
    }

    /// The variants at the given loci, in file order.
    pub fn subset(&self, loci: &LocusSet) -> SampleVariants {
        self.variants
            .iter()
            .filter(|(locus, _)| loci.contains(*locus))
            .map(|(locus, record)| (locus.clone(), record.clone()))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use indexmap::IndexSet;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{DamagingSelection, VariantSelection};
    use crate::{
        err::ParseError,
        seqvars::{
            ingest::SampleVcf,
            query::schema::{
                CaseQuery, Criterion, FrequencySettings, LocusSet, QualitySettings, VariantClass,
            },
        },
    };

    const VCF: &str = "##fileformat=VCFv4.2\n\
        ##INFO=<ID=CSQ,Number=.,Type=String,Description=\"Consequence annotations from \
        Ensembl VEP. Format: Allele|Consequence|Gene|SIFT|gnomAD_AF\">\n\
        #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n\
        1\t100\t.\tC\tA\t50\tPASS\tDP=15;CADD=25;\
        CSQ=A|missense_variant|ENSG001|deleterious(0)|0.001,\
        A|frameshift_variant|ENSG001||0.001\tGT\t0/1\n\
        1\t200\t.\tG\tT\t50\tq10\tDP=5;CADD=25;\
        CSQ=T|missense_variant|ENSG002|deleterious(0)|\tGT\t0/1\n\
        1\t300\t.\tA\tG\t50\tPASS\tCADD=3;\
        CSQ=G|missense_variant|ENSG003|tolerated(0.3)|0.2\tGT\t1/1\n\
        1\t400\t.\tT\tC\t50\tPASS\tDP=30;set=gatk;\
        CSQ=C|stop_gained|ENSG004||\tGT\t0/1\n\
        X\t500\t.\tA\tT\t50\tPASS\tDP=30;\
        CSQ=T|synonymous_variant|ENSG005|tolerated(1)|\tGT\t./1\n";

    fn selection() -> VariantSelection {
        let vcf = SampleVcf::from_reader(VCF.as_bytes()).unwrap();
        VariantSelection::new(vcf.sample, vcf.variants)
    }

    fn loci(positions: &[&str]) -> LocusSet {
        let selection = selection();
        selection
            .variants
            .keys()
            .filter(|locus| positions.contains(&locus.as_str().split(':').nth(1).unwrap()))
            .cloned()
            .collect()
    }

    fn criteria(criteria: &[Criterion]) -> IndexSet<Criterion> {
        criteria.iter().copied().collect()
    }

    #[test]
    fn quality_selection_identity() -> Result<(), anyhow::Error> {
        let selection = selection();

        let result = selection.quality_selection(&QualitySettings::default())?;

        assert_eq!(result.len(), selection.variants.len());

        Ok(())
    }

    #[rstest]
    #[case(Some("PASS"), None, &["100", "300", "400", "500"])]
    #[case(None, Some(10.0), &["100", "300", "400", "500"])]
    #[case(None, Some(20.0), &["300", "400", "500"])]
    #[case(Some("PASS"), Some(20.0), &["300", "400", "500"])]
    fn quality_selection(
        #[case] filter: Option<&str>,
        #[case] dp: Option<f64>,
        #[case] expected: &[&str],
    ) -> Result<(), anyhow::Error> {
        let settings = QualitySettings {
            filter: filter.map(String::from),
            dp,
            ..Default::default()
        };

        assert_eq!(selection().quality_selection(&settings)?, loci(expected));

        Ok(())
    }

    #[rstest]
    #[case(None, &["100", "200", "300", "400", "500"])]
    #[case(Some(0.1), &["100", "200", "400", "500"])]
    #[case(Some(0.0001), &["200", "400", "500"])]
    fn freq_selection(
        #[case] gnomad: Option<f64>,
        #[case] expected: &[&str],
    ) -> Result<(), anyhow::Error> {
        let settings = FrequencySettings {
            gnomad,
            ..Default::default()
        };

        assert_eq!(selection().freq_selection(&settings, None)?, loci(expected));

        Ok(())
    }

    #[test]
    fn freq_selection_monotonic() -> Result<(), anyhow::Error> {
        let selection = selection();
        let mut previous = selection.freq_selection(&FrequencySettings::default(), None)?;
        for gnomad in [0.5, 0.1, 0.01, 0.001, 0.0] {
            let settings = FrequencySettings {
                gnomad: Some(gnomad),
                ..Default::default()
            };
            let current = selection.freq_selection(&settings, None)?;
            assert!(current.is_subset(&previous));
            previous = current;
        }

        Ok(())
    }

    #[test]
    fn quality_selection_monotonic() -> Result<(), anyhow::Error> {
        let selection = selection();
        let mut previous = selection.quality_selection(&QualitySettings::default())?;
        for threshold in [0.0, 10.0, 20.0, 40.0] {
            let settings = QualitySettings {
                filter: None,
                dp: Some(threshold),
                qd: Some(threshold / 10.0),
                mq: Some(threshold * 2.0),
            };
            let current = selection.quality_selection(&settings)?;
            assert!(current.is_subset(&previous));
            previous = current;
        }
        assert_eq!(previous, loci(&["300"]));

        Ok(())
    }

    #[test]
    fn damaging_selection_without_criteria()-> Result<(), anyhow::Error> {
        let result = selection().damaging_selection(&IndexSet::new())?;

        assert_eq!(result.damaging, result.lof);
        assert_eq!(result.lof, loci(&["100"]));
        assert!(result.missense.is_empty());

        Ok(())
    }

    #[rstest]
    #[case(&[Criterion::Sift], &["100", "200"])]
    #[case(&[Criterion::Cadd], &["100", "200"])]
    #[case(&[Criterion::Sift, Criterion::Cadd], &["100", "200"])]
    #[case(&[Criterion::Sift, Criterion::Polyphen], &[])]
    #[case(&[Criterion::Sift, Criterion::Polyphen, Criterion::Cadd], &["100", "200"])]
    fn damaging_selection_missense(
        #[case] selected: &[Criterion],
        #[case] expected: &[&str],
    ) -> Result<(), anyhow::Error> {
        let result = selection().damaging_selection(&criteria(selected))?;

        assert_eq!(result.missense, loci(expected));
        let mut damaging = loci(&["100"]);
        damaging.extend(loci(expected));
        damaging.sort();
        let mut actual = result.damaging.clone();
        actual.sort();
        assert_eq!(actual, damaging);

        Ok(())
    }

    #[test]
    fn damaging_selection_invalid_number() {
        let vcf = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n\
            1\t10\t.\tA\tG\t10\tPASS\tCADD=NA\tGT\t0/1\n";
        let vcf = SampleVcf::from_reader(vcf.as_bytes()).unwrap();
        let selection = VariantSelection::new(vcf.sample, vcf.variants);

        let err = selection
            .damaging_selection(&criteria(&[Criterion::Cadd]))
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ParseError>(),
            Some(ParseError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn comb_selection() -> Result<(), anyhow::Error> {
        let query = CaseQuery {
            quality: QualitySettings {
                filter: Some(String::from("PASS")),
                dp: Some(10.0),
                ..Default::default()
            },
            frequency: FrequencySettings {
                gnomad: Some(0.01),
                ..Default::default()
            },
            criteria: criteria(&[Criterion::Sift, Criterion::Cadd]),
        };

        let result = selection().comb_selection(&query, None)?;

        assert_eq!(
            result,
            DamagingSelection::new(loci(&["100"]), loci(&["100"]), loci(&["100"]))
        );
        assert_eq!(result.get(VariantClass::Lof), &loci(&["100"]));

        Ok(())
    }

    #[tracing_test::traced_test]
    #[test]
    fn comb_selection_logs_counts() -> Result<(), anyhow::Error> {
        selection().comb_selection(&CaseQuery::default(), None)?;

        assert!(logs_contain("5 of 5 variants of S1 pass quality filter"));
        assert!(logs_contain("1 damaging variants of S1 (1 LOF, 0 missense)"));

        Ok(())
    }

    #[test]
    fn subset() {
        let selection = selection();

        let subset = selection.subset(&loci(&["300", "100"]));

        assert_eq!(
            subset
                .keys()
                .map(|locus| locus.as_str())
                .collect::<Vec<_>>(),
            vec!["1:100:.:C:A", "1:300:.:A:G"]
        );
    }
}
