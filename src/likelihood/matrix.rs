// Dense read-by-haplotype likelihood matrix and low-outlier smoothing
// (spec.md §4.4, component C4).
//
// Grounded on `original_source/cpp/src/alignment/{alignScorer,aligner}.hpp`
// for the k-mer-hint + gap-affine alignment pipeline and on
// `model/evidence/reads.rs`'s per-read probability-matrix assembly pattern.

use std::collections::HashMap;

use ndarray::Array2;

use bio::stats::{LogProb, Prob};

use crate::config::CallerConfig;
use crate::haplotype::HaplotypeVector;
use crate::likelihood::aligner::GapAffineAligner;
use crate::reads::Read;

const HINT_KMER_SIZE: usize = 10;

/// A k-mer index over one haplotype's padded sequences, used only to decide
/// quickly whether a read shares any seed with the haplotype at all; the
/// aligner itself always considers every haplotype offset, so a miss here is
/// solely a probability-zero short-circuit, never a correctness change.
struct KmerHintIndex {
    kmers: HashMap<Vec<u8>, ()>,
}

impl KmerHintIndex {
    fn build(seq: &[u8]) -> Self {
        let mut kmers = HashMap::new();
        if seq.len() >= HINT_KMER_SIZE {
            for w in seq.windows(HINT_KMER_SIZE) {
                kmers.insert(w.to_vec(), ());
            }
        }
        KmerHintIndex { kmers }
    }

    /// True if any `HINT_KMER_SIZE`-mer of `read_seq` also occurs in the
    /// haplotype sequence this index was built from (or the sequence was too
    /// short to index at all, in which case we cannot rule anything out).
    fn shares_seed(&self, read_seq: &[u8]) -> bool {
        if self.kmers.is_empty() {
            return true;
        }
        if read_seq.len() < HINT_KMER_SIZE {
            return true;
        }
        read_seq.windows(HINT_KMER_SIZE).any(|w| self.kmers.contains_key(w))
    }
}

/// Build `L[r,h] = Pr(read_r | haplotype_h)`, maximizing over each
/// haplotype's padded sequences, then apply low-outlier smoothing (spec.md
/// §4.4 "Post-processing").
pub fn build_likelihood_matrix(haplotypes: &HaplotypeVector, reads: &[Read], config: &CallerConfig) -> Array2<f64> {
    let n_reads = reads.len();
    let n_haps = haplotypes.len();
    let mut matrix = Array2::<f64>::zeros((n_reads, n_haps));

    let gap_open = LogProb::from(Prob(config.indel_gap_open_prob));
    let gap_extend = LogProb::from(Prob(config.indel_gap_extend_prob));

    for (h, hap) in haplotypes.iter().enumerate() {
        let indices: Vec<KmerHintIndex> = hap.padded_sequences().iter().map(|s| KmerHintIndex::build(s)).collect();
        for (r, read) in reads.iter().enumerate() {
            let mut best = LogProb::ln_zero();
            for (seq, hint) in hap.padded_sequences().iter().zip(&indices) {
                if !hint.shares_seed(read.sequence()) {
                    continue;
                }
                let aligner = GapAffineAligner::new(seq, gap_open, gap_extend);
                let p = aligner.prob_read(read.sequence(), read.qualities());
                if p > best {
                    best = p;
                }
            }
            matrix[[r, h]] = best.exp();
        }
    }

    smooth_low_outliers(&mut matrix, reads);
    matrix
}

/// Lift every entry below `median_r(max_h L[r,h]) * maxDifference` up to that
/// floor, where `maxDifference = 10^(-maxMappingQ/10)` and `maxMappingQ` is
/// the highest mapping quality among `reads` (spec.md §4.4). A matrix with no
/// rows is left untouched.
fn smooth_low_outliers(matrix: &mut Array2<f64>, reads: &[Read]) {
    let (n_reads, n_haps) = matrix.dim();
    if n_reads == 0 || n_haps == 0 {
        return;
    }

    let row_maxima: Vec<f64> = (0..n_reads)
        .map(|r| (0..n_haps).map(|h| matrix[[r, h]]).fold(f64::MIN, f64::max))
        .collect();
    let median = median(&row_maxima);

    let max_mapping_q = reads.iter().map(|r| r.mapping_quality()).max().unwrap_or(0);
    let max_difference = 10f64.powf(-(max_mapping_q as f64) / 10.0);
    let floor = median * max_difference;

    for r in 0..n_reads {
        for h in 0..n_haps {
            if matrix[[r, h]] < floor {
                matrix[[r, h]] = floor;
            }
        }
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haplotype::Haplotype;
    use crate::reference::ReferenceWindow;
    use crate::region::{Region, RegionSet};
    use rust_htslib::bam::record::Cigar;

    fn read(seq: &[u8], mapq: u8) -> Read {
        Read::new(
            "rg1",
            "1",
            0,
            vec![Cigar::Match(seq.len() as u32)],
            seq.to_vec(),
            vec![40u8; seq.len()],
            mapq,
            0,
        )
    }

    #[test]
    fn matching_haplotype_scores_highest() {
        let window = ReferenceWindow::new(Region::new("1", 0, 9), b"AAACCCGGG".to_vec());
        let region_set = RegionSet::from_regions(vec![Region::new("1", 0, 9)]);
        let reference = Haplotype::reference(&window, region_set.clone(), 0, 0).unwrap();
        let config = CallerConfig::default();
        let mut haps = HaplotypeVector::new();
        haps.push(reference, None);

        let reads = vec![read(b"AAACCCGGG", 60), read(b"TTTTTTTTT", 60)];
        let matrix = build_likelihood_matrix(&haps, &reads, &config);
        assert!(matrix[[0, 0]] > matrix[[1, 0]]);
    }

    #[test]
    fn smoothing_lifts_zero_entries_to_a_floor() {
        let mut matrix = Array2::<f64>::zeros((2, 2));
        matrix[[0, 0]] = 1.0;
        matrix[[0, 1]] = 1.0;
        matrix[[1, 0]] = 1.0;
        matrix[[1, 1]] = 0.0;
        let reads = vec![read(b"A", 60), read(b"A", 60)];
        smooth_low_outliers(&mut matrix, &reads);
        assert!(matrix[[1, 1]] > 0.0);
    }

    #[test]
    fn median_of_empty_row_maxima_leaves_matrix_untouched() {
        let mut matrix = Array2::<f64>::zeros((0, 0));
        smooth_low_outliers(&mut matrix, &[]);
        assert_eq!(matrix.dim(), (0, 0));
    }
}
