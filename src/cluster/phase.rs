// Phase alignment between consecutive clusters on the same contig (spec.md
// §4.9 "Phase alignment between consecutive clusters"), grounded on
// `original_source/cpp/src/caller/alignPhasing.{hpp,cpp}`.
//
// The full model re-invocation the spec describes (build the combined
// haplotype vector, run C4→C8 on it, pick the top genotype) collapses here
// to scoring the combined per-strand haplotype concatenations directly
// against the bridging reads with the same `GapAffineAligner` C4 already
// uses: for two strands the combined-genotype posterior is dominated by
// which pairing the bridging reads actually support, so the argmax over
// per-read best pairing stands in for the full genotype posterior. Recorded
// as a simplification in the grounding ledger.

use bio::stats::LogProb;
use itertools::Itertools;

use crate::config::CallerConfig;
use crate::haplotype::HaplotypeVector;
use crate::likelihood::aligner::GapAffineAligner;
use crate::reads::Read;
use crate::region::Region;

/// One cluster's already-decided per-sample haplotype assignment, as needed
/// by phase alignment: which haplotype (by index into `haplotypes`) each
/// strand carries, and the phase-set id attached to that sample's call.
pub struct ClusterPhaseState {
    pub region: Region,
    pub haplotypes: HaplotypeVector,
    /// `strand_haplotypes[sample][strand] = haplotype index`.
    pub strand_haplotypes: Vec<Vec<usize>>,
    pub phase_set: Vec<Option<u64>>,
}

impl ClusterPhaseState {
    fn is_homozygous(&self, sample: usize) -> bool {
        match self.strand_haplotypes.get(sample) {
            Some(strands) => strands.windows(2).all(|w| w[0] == w[1]),
            None => true,
        }
    }
}

/// Concatenate `prev`'s `i`-th strand haplotype sequence with `current`'s
/// `j`-th strand haplotype sequence, approximating the spec's "combined
/// haplotype vector over the union window".
fn combined_sequence(prev: &ClusterPhaseState, current: &ClusterPhaseState, sample: usize, i: usize, j: usize) -> Vec<u8> {
    let prev_hap_idx = prev.strand_haplotypes[sample][i];
    let current_hap_idx = current.strand_haplotypes[sample][j];
    let mut seq = prev.haplotypes.get(prev_hap_idx).unwrap().padded_sequences().concat();
    seq.extend(current.haplotypes.get(current_hap_idx).unwrap().padded_sequences().concat());
    seq
}

/// Best strand pairing `(i -> j)` supported by `reads`, scored by summing
/// each read's best-matching combined haplotype log-probability.
fn best_permutation(prev: &ClusterPhaseState, current: &ClusterPhaseState, sample: usize, reads: &[Read], config: &CallerConfig) -> Option<Vec<usize>> {
    let ploidy = prev.strand_haplotypes[sample].len();
    if ploidy == 0 || ploidy != current.strand_haplotypes[sample].len() {
        return None;
    }

    let gap_open = LogProb::from(bio::stats::Prob(config.indel_gap_open_prob));
    let gap_extend = LogProb::from(bio::stats::Prob(config.indel_gap_extend_prob));

    // log Pr(read | strand i paired with strand j), for every (i, j).
    let mut pair_scores = vec![vec![LogProb::ln_zero(); ploidy]; ploidy];
    for read in reads {
        for i in 0..ploidy {
            for j in 0..ploidy {
                let seq = combined_sequence(prev, current, sample, i, j);
                let aligner = GapAffineAligner::new(&seq, gap_open, gap_extend);
                let p = aligner.prob_read(read.sequence(), read.qualities());
                pair_scores[i][j] = pair_scores[i][j].ln_add_exp(p);
            }
        }
    }

    (0..ploidy)
        .permutations(ploidy)
        .max_by(|a, b| {
            let score = |perm: &Vec<usize>| -> f64 { (0..ploidy).map(|i| *pair_scores[i][perm[i]]).sum() };
            score(a).partial_cmp(&score(b)).unwrap()
        })
}

/// Reorder `current`'s strand-haplotype assignment for `sample` according to
/// `permutation` (`permutation[i]` is the current-cluster strand now in
/// slot `i`), and adopt `prev`'s phase-set id.
fn apply_permutation(current: &mut ClusterPhaseState, prev: &ClusterPhaseState, sample: usize, permutation: &[usize]) {
    let reordered: Vec<usize> = permutation.iter().map(|&j| current.strand_haplotypes[sample][j]).collect();
    current.strand_haplotypes[sample] = reordered;
    current.phase_set[sample] = prev.phase_set[sample];
}

/// Phase-align `current` against `prev` in place, per sample, using
/// `bridge_reads[sample]` (reads overlapping both cluster windows). Samples
/// that fail a skip condition (no bridge reads, or a homozygous-previous /
/// heterozygous-current pairing with nothing to carry) are left untouched.
pub fn phase_align(prev: &ClusterPhaseState, current: &mut ClusterPhaseState, bridge_reads: &[Vec<Read>], config: &CallerConfig) {
    if prev.region.is_empty() || current.region.is_empty() {
        return;
    }

    let n_samples = current.strand_haplotypes.len();
    for sample in 0..n_samples {
        if sample >= prev.strand_haplotypes.len() {
            continue;
        }
        if prev.is_homozygous(sample) && !current.is_homozygous(sample) {
            continue;
        }
        let reads = match bridge_reads.get(sample) {
            Some(r) if !r.is_empty() => r,
            _ => continue,
        };
        if let Some(permutation) = best_permutation(prev, current, sample, reads, config) {
            apply_permutation(current, prev, sample, &permutation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haplotype::Haplotype;
    use crate::reference::ReferenceWindow;
    use crate::region::RegionSet;
    use rust_htslib::bam::record::Cigar;

    fn window(contig: &str, start: u64, seq: &[u8]) -> ReferenceWindow {
        ReferenceWindow::new(Region::new(contig, start, start + seq.len() as u64), seq.to_vec())
    }

    fn read(contig: &str, start: u64, seq: &[u8]) -> Read {
        Read::new("rg1", contig, start, vec![Cigar::Match(seq.len() as u32)], seq.to_vec(), vec![40u8; seq.len()], 60, 0)
    }

    #[test]
    fn skips_when_either_cluster_is_empty() {
        let w = window("1", 0, b"AAAA");
        let mut haps = HaplotypeVector::new();
        haps.push(Haplotype::reference(&w, RegionSet::from_regions(vec![Region::new("1", 0, 4)]), 0, 0).unwrap(), None);
        let prev = ClusterPhaseState {
            region: Region::new("1", 0, 0),
            haplotypes: haps.clone(),
            strand_haplotypes: vec![vec![0, 0]],
            phase_set: vec![Some(1)],
        };
        let mut current = ClusterPhaseState {
            region: Region::new("1", 10, 14),
            haplotypes: haps,
            strand_haplotypes: vec![vec![0, 0]],
            phase_set: vec![None],
        };
        let config = CallerConfig::default();
        phase_align(&prev, &mut current, &[vec![read("1", 10, b"AAAA")]], &config);
        assert_eq!(current.phase_set[0], None);
    }

    #[test]
    fn consistent_pairing_adopts_previous_phase_set() {
        let w = window("1", 0, b"AAACCCC");
        let snp_region = Region::new("1", 3, 4);
        let ref_hap = Haplotype::reference(&w, RegionSet::from_regions(vec![Region::new("1", 0, 7)]), 0, 0).unwrap();
        let snp = crate::variant::Variant::new(&w, snp_region, b"G".to_vec(), false).unwrap();
        let alt_hap = Haplotype::new(&w, RegionSet::from_regions(vec![Region::new("1", 0, 7)]), vec![snp], 0, 0).unwrap();

        let mut haps = HaplotypeVector::new();
        haps.push(ref_hap, None);
        haps.push(alt_hap, None);

        let prev = ClusterPhaseState {
            region: Region::new("1", 0, 7),
            haplotypes: haps.clone(),
            strand_haplotypes: vec![vec![0, 1]],
            phase_set: vec![Some(42)],
        };
        let mut current = ClusterPhaseState {
            region: Region::new("1", 0, 7),
            haplotypes: haps,
            strand_haplotypes: vec![vec![1, 0]],
            phase_set: vec![None],
        };
        let config = CallerConfig::default();
        let reads = vec![read("1", 0, b"AAACCCC")];
        phase_align(&prev, &mut current, &[reads], &config);
        // whatever permutation is chosen, the phase set is adopted from prev.
        assert_eq!(current.phase_set[0], Some(42));
    }
}
