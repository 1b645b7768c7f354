// Per-sample genotype log-likelihood, genotype quality, phase quality, and
// the Phred-scaled genotype-likelihood triple (spec.md §4.7, component C7),
// grounded on `original_source/cpp/src/caller/diploid/diploidAnnotate.{hpp,cpp}`.

use ndarray::Array2;

use crate::genotype::Genotype;
use crate::haplotype::HaplotypeVector;
use crate::variant::Variant;

/// Per-genotype likelihoods after rescaling (subtract the max log-likelihood,
/// clamp at `f64::MIN_POSITIVE.ln()`, exponentiate), parallel to the input
/// `genotypes` slice. `None` if there were no reads at all (spec.md §4.7
/// "sentinel unknown").
pub fn genotype_likelihoods(matrix: &Array2<f64>, genotypes: &[Genotype], ploidy: u32) -> Option<Vec<f64>> {
    let n_reads = matrix.dim().0;
    if n_reads == 0 {
        return None;
    }

    let raw: Vec<f64> = genotypes
        .iter()
        .map(|g| {
            (0..n_reads)
                .map(|r| {
                    let p_r_given_g: f64 = g
                        .present()
                        .map(|(h, m)| (m as f64 / ploidy as f64) * matrix[[r, h]])
                        .sum();
                    p_r_given_g.ln()
                })
                .sum()
        })
        .collect();

    let max_ll = raw.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let floor = f64::MIN_POSITIVE.ln();
    Some(raw.into_iter().map(|ll| (ll - max_ll).max(floor).exp()).collect())
}

/// `(argmax index, Phred quality)` for the called genotype, restricted to
/// `subset` (the full genotype list for overall quality, or a non-phased
/// equivalence class for phase quality — spec.md §4.7 "same formula, but
/// sums and max are restricted to the equivalence class").
fn phred_quality(likelihoods: &[f64], genotypes: &[Genotype], subset: &[usize], max_phred: f64) -> (usize, f64) {
    let weighted: Vec<(usize, f64)> = subset
        .iter()
        .map(|&i| (i, likelihoods[i] * genotypes[i].n_combinations() as f64))
        .collect();
    let &(best_idx, max_l) = weighted
        .iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
        .expect("subset must be non-empty");
    let err: f64 = weighted.iter().filter(|&&(i, _)| i != best_idx).map(|&(_, l)| l).sum();
    let quality = if max_l + err <= 0.0 {
        0.0
    } else {
        (-10.0 * (err / (max_l + err)).log10()).min(max_phred)
    };
    (best_idx, quality)
}

pub fn genotype_quality(likelihoods: &[f64], genotypes: &[Genotype], max_phred: f64) -> (usize, f64) {
    let all: Vec<usize> = (0..genotypes.len()).collect();
    phred_quality(likelihoods, genotypes, &all, max_phred)
}

pub fn phase_quality(likelihoods: &[f64], genotypes: &[Genotype], equivalence_class: &[usize], max_phred: f64) -> f64 {
    phred_quality(likelihoods, genotypes, equivalence_class, max_phred).1
}

/// Phred-scaled genotype-likelihood triple (more generally, a `ploidy+1`
/// vector) for `variant`: bucket `Σ L_i · n_i` by "strands of `g` carrying
/// `variant`", take log10, rescale so the max bucket is 0, multiply by −10
/// (spec.md §4.7 "Genotype-likelihood triple").
pub fn pl_values(
    haplotypes: &HaplotypeVector,
    likelihoods: &[f64],
    genotypes: &[Genotype],
    variant: &Variant,
    ploidy: u32,
) -> Vec<f64> {
    let mut buckets = vec![0.0; ploidy as usize + 1];
    for (i, g) in genotypes.iter().enumerate() {
        let carriers: u32 = g
            .present()
            .filter(|&(h, _)| haplotypes.get(h).map(|hap| hap.contains_variant(variant)).unwrap_or(false))
            .map(|(_, m)| m)
            .sum();
        buckets[carriers as usize] += likelihoods[i] * g.n_combinations() as f64;
    }

    let log10_buckets: Vec<f64> = buckets
        .iter()
        .map(|&b| if b > 0.0 { b.log10() } else { f64::NEG_INFINITY })
        .collect();
    let max_log10 = log10_buckets.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    log10_buckets
        .into_iter()
        .map(|l| if l.is_finite() { -10.0 * (l - max_log10) } else { f64::INFINITY })
        .collect()
}
