// Haplotype frequency estimation (spec.md §4.5, component C5), grounded on
// `original_source/cpp/src/caller/haplotypeLikelihoods.{hpp,cpp}`'s
// column-summing step; the teacher's closest analogue is the posterior
// summation in `model/sample.rs`.

use ndarray::Array2;

/// `freq[h] = Σ_r L[r,h] / Σ_r Σ_h' L[r,h']`: no per-read normalization, a
/// plain ratio of column sums over the grand total (spec.md §4.5, explicit
/// that this differs from a per-read-normalized EM step). Returns a uniform
/// distribution if the matrix carries no evidence at all (every entry zero).
pub fn haplotype_frequencies(matrix: &Array2<f64>) -> Vec<f64> {
    let (_, n_haps) = matrix.dim();
    if n_haps == 0 {
        return Vec::new();
    }
    let column_sums: Vec<f64> = (0..n_haps).map(|h| matrix.column(h).sum()).collect();
    normalize(column_sums)
}

/// As `haplotype_frequencies`, but with `excluded` haplotype columns zeroed
/// out first and each read's row renormalized over the remaining columns
/// before summing (spec.md §4.5 "what-if this variant were absent"
/// counterfactual, used by C8).
pub fn haplotype_frequencies_excluding(matrix: &Array2<f64>, excluded: &[usize]) -> Vec<f64> {
    let (n_reads, n_haps) = matrix.dim();
    if n_haps == 0 {
        return Vec::new();
    }
    let mut column_sums = vec![0.0; n_haps];
    for r in 0..n_reads {
        let row_sum: f64 = (0..n_haps)
            .filter(|h| !excluded.contains(h))
            .map(|h| matrix[[r, h]])
            .sum();
        if row_sum <= 0.0 {
            continue;
        }
        for h in 0..n_haps {
            if excluded.contains(&h) {
                continue;
            }
            column_sums[h] += matrix[[r, h]] / row_sum;
        }
    }
    normalize(column_sums)
}

/// Sum per-sample frequency vectors (all the same length) and renormalize to
/// one distribution (spec.md §4.5 "summed across samples and then
/// renormalized").
pub fn combine_sample_frequencies(per_sample: &[Vec<f64>]) -> Vec<f64> {
    if per_sample.is_empty() {
        return Vec::new();
    }
    let n_haps = per_sample[0].len();
    let mut combined = vec![0.0; n_haps];
    for freqs in per_sample {
        for (h, f) in freqs.iter().enumerate() {
            combined[h] += f;
        }
    }
    normalize(combined)
}

fn normalize(values: Vec<f64>) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        let n = values.len();
        return vec![1.0 / n as f64; n];
    }
    values.into_iter().map(|v| v / total).collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn frequencies_are_proportional_to_column_sums() {
        let matrix = Array2::from_shape_vec((2, 2), vec![1.0, 3.0, 1.0, 1.0]).unwrap();
        let freqs = haplotype_frequencies(&matrix);
        assert_relative_eq!(freqs[0], 2.0 / 6.0, epsilon = 1e-9);
        assert_relative_eq!(freqs[1], 4.0 / 6.0, epsilon = 1e-9);
    }

    #[test]
    fn all_zero_matrix_yields_uniform_frequencies() {
        let matrix = Array2::<f64>::zeros((2, 2));
        let freqs = haplotype_frequencies(&matrix);
        assert_eq!(freqs, vec![0.5, 0.5]);
    }

    #[test]
    fn excluding_a_haplotype_renormalizes_each_read_over_the_rest() {
        // read 0 strongly supports hap 1; excluding hap 1 should push all of
        // its mass onto hap 0 before summing.
        let matrix = Array2::from_shape_vec((1, 2), vec![0.1, 0.9]).unwrap();
        let freqs = haplotype_frequencies_excluding(&matrix, &[1]);
        assert_relative_eq!(freqs[0], 1.0, epsilon = 1e-9);
        assert_eq!(freqs[1], 0.0);
    }

    #[test]
    fn combining_samples_sums_then_renormalizes() {
        let per_sample = vec![vec![0.2, 0.8], vec![0.6, 0.4]];
        let combined = combine_sample_frequencies(&per_sample);
        assert_relative_eq!(combined[0], 0.4, epsilon = 1e-9);
        assert_relative_eq!(combined[1], 0.6, epsilon = 1e-9);
    }
}
