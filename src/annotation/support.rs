// Per-variant, per-sample read-support accounting (spec.md §4.7), grounded
// on `original_source/cpp/src/stats/readSupportAccumulator.{hpp,cpp}` for the
// forward/reverse × supporting/not-supporting/reference-supporting tally.

use ndarray::Array2;

use crate::haplotype::HaplotypeVector;
use crate::reads::Read;
use crate::variant::Variant;

/// Forward/reverse read-support tallies for one variant in one sample, plus
/// the base/mapping-quality summaries derived from the supporting reads.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReadSupportAccountant {
    pub forward_supporting: u32,
    pub reverse_supporting: u32,
    pub forward_not_supporting: u32,
    pub reverse_not_supporting: u32,
    pub forward_reference_supporting: u32,
    pub reverse_reference_supporting: u32,
    /// Per-read minimum base quality within `±bad_reads_window_size` of the
    /// variant, for each read counted as supporting.
    pub(crate) min_base_quals: Vec<u8>,
    /// Mapping quality of each read counted as supporting.
    pub(crate) mapping_quals: Vec<u8>,
}

impl ReadSupportAccountant {
    /// Median of the per-read minimum base qualities tracked for supporting
    /// reads, or `None` if none were tracked.
    pub fn median_min_base_quality(&self) -> Option<f64> {
        if self.min_base_quals.is_empty() {
            return None;
        }
        let mut sorted: Vec<u8> = self.min_base_quals.clone();
        sorted.sort_unstable();
        let n = sorted.len();
        Some(if n % 2 == 1 {
            sorted[n / 2] as f64
        } else {
            (sorted[n / 2 - 1] as f64 + sorted[n / 2] as f64) / 2.0
        })
    }

    /// Root-mean-square of the mapping qualities of supporting reads.
    pub fn rms_mapping_quality(&self) -> Option<f64> {
        if self.mapping_quals.is_empty() {
            return None;
        }
        let sum_sq: f64 = self.mapping_quals.iter().map(|&q| (q as f64) * (q as f64)).sum();
        Some((sum_sq / self.mapping_quals.len() as f64).sqrt())
    }
}

fn min_base_quality_in_window(read: &Read, variant: &Variant, window_size: u64) -> Option<u8> {
    let window = variant.region().extend(window_size, window_size);
    let aligned = read.aligned_region();
    if !window.overlaps(&aligned) {
        return None;
    }
    let clipped = window.clip_to(&aligned);
    if clipped.is_empty() {
        return None;
    }
    let (s, e) = read.read_interval_for_ref(&clipped)?;
    read.qualities()[s..e].iter().copied().min()
}

/// Accumulate read support for `variant` given the likelihood `matrix`
/// (rows = `reads`, columns = `haplotypes`) and the posterior threshold
/// above which a read is counted as supporting/reference-supporting
/// (spec.md §4.7).
pub fn accumulate_support(
    matrix: &Array2<f64>,
    reads: &[Read],
    haplotypes: &HaplotypeVector,
    variant: &Variant,
    bad_reads_window_size: u64,
    posterior_threshold: f64,
) -> ReadSupportAccountant {
    let variant_haps = haplotypes.indices_containing_variant(variant);
    let reference_haps = haplotypes.indices_that_are_reference_at(variant.region());

    let mut acc = ReadSupportAccountant::default();
    let n_haps = haplotypes.len();

    for (r, read) in reads.iter().enumerate() {
        let total: f64 = (0..n_haps).map(|h| matrix[[r, h]]).sum();
        if total <= 0.0 {
            continue;
        }
        let supports_variant: f64 = variant_haps.iter().map(|&h| matrix[[r, h]]).sum::<f64>() / total;
        let supports_reference: f64 = reference_haps.iter().map(|&h| matrix[[r, h]]).sum::<f64>() / total;

        let reverse = read.is_reverse();
        if supports_variant > posterior_threshold {
            if reverse {
                acc.reverse_supporting += 1;
            } else {
                acc.forward_supporting += 1;
            }
            if let Some(q) = min_base_quality_in_window(read, variant, bad_reads_window_size) {
                acc.min_base_quals.push(q);
            }
            acc.mapping_quals.push(read.mapping_quality());
        } else if reverse {
            acc.reverse_not_supporting += 1;
        } else {
            acc.forward_not_supporting += 1;
        }

        if supports_reference > posterior_threshold {
            if reverse {
                acc.reverse_reference_supporting += 1;
            } else {
                acc.forward_reference_supporting += 1;
            }
        }
    }

    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haplotype::Haplotype;
    use crate::reference::ReferenceWindow;
    use crate::region::{Region, RegionSet};
    use rust_htslib::bam::record::Cigar;

    fn read(start: u64, len: u32, reverse: bool) -> Read {
        let flags = if reverse { 0x10 } else { 0 };
        Read::new(
            "rg1",
            "1",
            start,
            vec![Cigar::Match(len)],
            vec![b'A'; len as usize],
            vec![40u8; len as usize],
            60,
            flags,
        )
    }

    #[test]
    fn supporting_reads_are_tallied_by_strand() {
        let w = ReferenceWindow::new(Region::new("1", 0, 9), b"AAACCCGGG".to_vec());
        let region_set = RegionSet::from_regions(vec![Region::new("1", 0, 9)]);
        let snp = Variant::new(&w, Region::new("1", 4, 5), b"T".to_vec(), false).unwrap();
        let mut haps = HaplotypeVector::new();
        haps.push(Haplotype::reference(&w, region_set.clone(), 0, 0).unwrap(), None);
        haps.push(Haplotype::new(&w, region_set, vec![snp.clone()], 0, 0).unwrap(), None);

        let reads = vec![read(0, 9, false), read(0, 9, true)];
        let matrix = Array2::from_shape_vec((2, 2), vec![0.01, 0.9, 0.01, 0.9]).unwrap();
        let acc = accumulate_support(&matrix, &reads, &haps, &snp, 10, 0.5);
        assert_eq!(acc.forward_supporting, 1);
        assert_eq!(acc.reverse_supporting, 1);
        assert_eq!(acc.forward_not_supporting, 0);
    }

    #[test]
    fn rms_and_median_are_computed_over_supporting_reads() {
        let w = ReferenceWindow::new(Region::new("1", 0, 9), b"AAACCCGGG".to_vec());
        let region_set = RegionSet::from_regions(vec![Region::new("1", 0, 9)]);
        let snp = Variant::new(&w, Region::new("1", 4, 5), b"T".to_vec(), false).unwrap();
        let mut haps = HaplotypeVector::new();
        haps.push(Haplotype::reference(&w, region_set.clone(), 0, 0).unwrap(), None);
        haps.push(Haplotype::new(&w, region_set, vec![snp.clone()], 0, 0).unwrap(), None);

        let reads = vec![read(0, 9, false)];
        let matrix = Array2::from_shape_vec((1, 2), vec![0.01, 0.9]).unwrap();
        let acc = accumulate_support(&matrix, &reads, &haps, &snp, 10, 0.5);
        assert_eq!(acc.rms_mapping_quality(), Some(60.0));
        assert_eq!(acc.median_min_base_quality(), Some(40.0));
    }
}
