// Variant quality calculator (spec.md §4.8, component C8), grounded on
// `original_source/cpp/src/caller/diploid/variantQualityCalculator.{hpp,cpp}`.

use ndarray::Array2;

use crate::frequency::haplotype_frequencies_excluding;
use crate::genotype::Genotype;
use crate::haplotype::HaplotypeVector;
use crate::priors::default_prior;
use crate::variant::Variant;

/// Per-sample data needed to score one candidate variant: that sample's
/// likelihood matrix (rows = its reads, columns = `haplotypes`), haplotype
/// frequencies (already computed by C5, the non-reweighted `freq`), and the
/// genotype likelihoods/list, skipped entirely if the sample had no reads
/// (spec.md §4.8 "samples with zero reads are skipped").
pub struct SampleEvidence<'a> {
    pub matrix: &'a Array2<f64>,
    pub frequencies: &'a [f64],
    pub likelihoods: &'a [f64],
    pub genotypes: &'a [Genotype],
}

/// Posterior Phred quality for `variant`. The "what-if `variant` were
/// absent" frequencies `freq'` are computed the same way as C5's excluded-
/// haplotype-indices counterfactual (spec.md §4.5, referenced directly by
/// §4.8): zero the columns of haplotypes carrying `variant`, then
/// renormalize each read before summing.
pub fn variant_quality(haplotypes: &HaplotypeVector, variant: &Variant, samples: &[SampleEvidence], max_phred: f64) -> f64 {
    let carrying = haplotypes.indices_containing_variant(variant);
    let prior = default_prior(variant);
    let floor_log = f64::MIN_POSITIVE.ln();

    let mut sum_log_total = 0.0;
    let mut sum_log_no_var = 0.0;

    for sample in samples {
        if sample.likelihoods.is_empty() {
            continue;
        }
        let reweighted = haplotype_frequencies_excluding(sample.matrix, &carrying);

        let mut total_event = 0.0;
        let mut no_variant = 0.0;
        for (g, genotype) in sample.genotypes.iter().enumerate() {
            let lambda = sample.likelihoods[g] * genotype.n_combinations() as f64;
            let prod_freq: f64 = genotype.present().map(|(h, m)| sample.frequencies[h].powi(m as i32)).product();
            let prod_reweighted: f64 = genotype.present().map(|(h, m)| reweighted[h].powi(m as i32)).product();
            total_event += lambda * prod_freq;
            no_variant += lambda * prod_reweighted;
        }

        sum_log_total += if total_event > 0.0 { total_event.ln() } else { floor_log };
        sum_log_no_var += if no_variant > 0.0 { no_variant.ln() } else { floor_log };
    }

    let ratio = ((sum_log_no_var - sum_log_total).exp() * (1.0 - prior)).max(f64::MIN_POSITIVE);
    let qual = -10.0 * (ratio.log10() - (prior + ratio).log10());
    qual.round().min(max_phred)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genotype::enumerate_genotypes;
    use crate::haplotype::Haplotype;
    use crate::reference::ReferenceWindow;
    use crate::region::{Region, RegionSet};
    use ndarray::Array2;

    #[test]
    fn strongly_supported_variant_gets_a_high_quality() {
        let w = ReferenceWindow::new(Region::new("1", 0, 9), b"AAACCCGGG".to_vec());
        let region_set = RegionSet::from_regions(vec![Region::new("1", 0, 9)]);
        let snp = Variant::new(&w, Region::new("1", 4, 5), b"T".to_vec(), false).unwrap();
        let mut haps = HaplotypeVector::new();
        haps.push(Haplotype::reference(&w, region_set.clone(), 0, 0).unwrap(), None);
        haps.push(Haplotype::new(&w, region_set, vec![snp.clone()], 0, 0).unwrap(), None);

        let genotypes = enumerate_genotypes(&haps, &[0, 1], 2).unwrap();
        let matrix = Array2::from_shape_vec((4, 2), vec![0.01, 0.9, 0.01, 0.9, 0.01, 0.9, 0.01, 0.9]).unwrap();
        let likelihoods = crate::annotation::genotype_likelihoods(&matrix, &genotypes, 2).unwrap();
        let frequencies = crate::frequency::haplotype_frequencies(&matrix);

        let sample = SampleEvidence {
            matrix: &matrix,
            frequencies: &frequencies,
            likelihoods: &likelihoods,
            genotypes: &genotypes,
        };
        let qual = variant_quality(&haps, &snp, &[sample], 3000.0);
        assert!(qual > 0.0);
    }

    #[test]
    fn samples_with_no_reads_are_skipped() {
        let w = ReferenceWindow::new(Region::new("1", 0, 9), b"AAACCCGGG".to_vec());
        let region_set = RegionSet::from_regions(vec![Region::new("1", 0, 9)]);
        let snp = Variant::new(&w, Region::new("1", 4, 5), b"T".to_vec(), false).unwrap();
        let mut haps = HaplotypeVector::new();
        haps.push(Haplotype::reference(&w, region_set.clone(), 0, 0).unwrap(), None);
        haps.push(Haplotype::new(&w, region_set, vec![snp.clone()], 0, 0).unwrap(), None);
        let genotypes = enumerate_genotypes(&haps, &[0, 1], 2).unwrap();
        let frequencies = vec![0.5, 0.5];
        let empty_matrix = Array2::<f64>::zeros((0, 2));
        let empty_sample = SampleEvidence {
            matrix: &empty_matrix,
            frequencies: &frequencies,
            likelihoods: &[],
            genotypes: &genotypes,
        };
        // with every sample skipped the formula degenerates to the prior-only case; it
        // must not panic.
        let _ = variant_quality(&haps, &snp, &[empty_sample], 3000.0);
    }
}
