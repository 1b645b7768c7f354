// Reference-block emission (spec.md §4.9 "Reference-block emission"),
// grounded on `original_source/cpp/src/caller/diploid/referenceCalling.{hpp,cpp}`
// for the running-coverage chunking rule.

use crate::call::{Call, RefBlockAnnotation};
use crate::config::CallerConfig;
use crate::reads::Read;
use crate::region::Region;
use crate::stats::beta_binomial_two_sided_p;

/// Beta-Binomial shape used for ref-call quality: "the probability that all
/// reads came from one strand of a diploid" (spec.md §4.9).
const REF_CALL_BETA_SHAPE: f64 = 20.0;

/// Per-sample coverage at `pos` in `reads` (number of reads whose aligned
/// region contains `pos`).
fn coverage_at(reads: &[Read], contig: &str, pos: u64) -> u32 {
    reads
        .iter()
        .filter(|r| r.aligned_region().contains_pos(contig, pos))
        .count() as u32
}

/// Ref-call quality from coverage: 0 at zero coverage (spec.md §9 invariant
/// "0 when coverage is 0"), monotonically increasing thereafter, clipped to
/// `max_phred`.
fn ref_quality(coverage: u32, max_phred: f64) -> f64 {
    if coverage == 0 {
        return 0.0;
    }
    let p = beta_binomial_two_sided_p(0, coverage as u64, REF_CALL_BETA_SHAPE, REF_CALL_BETA_SHAPE);
    (-10.0 * p.log10()).min(max_phred)
}

/// Scan `region` for each sample's reads, chunking wherever the relative
/// change in any sample's coverage-derived quality exceeds
/// `config.reference_call_quality_delta_threshold`, and emit one
/// `Call::RefBlock` per chunk (spec.md §4.9). If `rejected_variant_quality`
/// (`Q_r`) is given and positive, every chunk's quality is capped at
/// `-10 log10(1 - 10^(-Q_r/10))`.
pub fn emit_ref_blocks(region: &Region, samples_reads: &[Vec<Read>], config: &CallerConfig, rejected_variant_quality: Option<f64>) -> Vec<Call> {
    if region.is_empty() {
        return Vec::new();
    }

    let cap = rejected_variant_quality.filter(|&q| q > 0.0).map(|q| {
        let leftover = 1.0 - 10f64.powf(-q / 10.0);
        -10.0 * leftover.max(f64::MIN_POSITIVE).log10()
    });

    let mut calls = Vec::new();
    let mut chunk_start = *region.start();
    let mut chunk_min_dp = vec![u32::MAX; samples_reads.len()];
    let mut prev_quals: Option<Vec<f64>> = None;

    let mut pos = *region.start();
    while pos < *region.end() {
        let coverages: Vec<u32> = samples_reads.iter().map(|reads| coverage_at(reads, region.contig(), pos)).collect();
        let mut quals: Vec<f64> = coverages.iter().map(|&c| ref_quality(c, config.max_phred_score)).collect();
        if let Some(cap) = cap {
            for q in &mut quals {
                *q = q.min(cap);
            }
        }

        let should_start_new_chunk = match &prev_quals {
            None => false,
            Some(prev) => prev.iter().zip(&quals).any(|(&p, &q)| {
                let denom = p.max(1e-9);
                ((q - p).abs() / denom) > config.reference_call_quality_delta_threshold
            }),
        };

        if should_start_new_chunk {
            let chunk_region = Region::new(region.contig().clone(), chunk_start, pos);
            let overall_qual = prev_quals.as_ref().unwrap().iter().cloned().fold(f64::INFINITY, f64::min);
            calls.push(Call::RefBlock {
                region: chunk_region.clone(),
                annotation: RefBlockAnnotation::with_quality(&chunk_region, chunk_min_dp.clone(), overall_qual),
            });
            chunk_start = pos;
            chunk_min_dp = vec![u32::MAX; samples_reads.len()];
        }

        for (slot, &c) in chunk_min_dp.iter_mut().zip(&coverages) {
            *slot = (*slot).min(c);
        }
        prev_quals = Some(quals);
        pos += 1;
    }

    let chunk_region = Region::new(region.contig().clone(), chunk_start, *region.end());
    let overall_qual = prev_quals.map(|q| q.into_iter().fold(f64::INFINITY, f64::min)).unwrap_or(0.0);
    calls.push(Call::RefBlock {
        region: chunk_region.clone(),
        annotation: RefBlockAnnotation::with_quality(&chunk_region, chunk_min_dp, overall_qual),
    });

    calls
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_htslib::bam::record::Cigar;

    fn read(start: u64, len: u32) -> Read {
        Read::new("rg1", "1", start, vec![Cigar::Match(len)], vec![b'A'; len as usize], vec![40u8; len as usize], 60, 0)
    }

    #[test]
    fn zero_coverage_block_has_zero_quality() {
        let config = CallerConfig::default();
        let region = Region::new("1", 0, 10);
        let calls = emit_ref_blocks(&region, &[Vec::new()], &config, None);
        assert_eq!(calls.len(), 1);
        if let Call::RefBlock { annotation, .. } = &calls[0] {
            assert_eq!(annotation.qual, 0.0);
        } else {
            panic!("expected a ref block");
        }
    }

    #[test]
    fn a_coverage_drop_starts_a_new_chunk() {
        let mut config = CallerConfig::default();
        config.reference_call_quality_delta_threshold = 0.2;
        let region = Region::new("1", 0, 20);
        // high coverage for [0,10), then nothing for [10,20).
        let reads = vec![vec![
            read(0, 10),
            read(0, 10),
            read(0, 10),
            read(0, 10),
            read(0, 10),
            read(0, 10),
            read(0, 10),
            read(0, 10),
        ]];
        let calls = emit_ref_blocks(&region, &reads, &config, None);
        assert!(calls.len() >= 2);
    }

    #[test]
    fn rejected_variant_caps_chunk_quality() {
        let config = CallerConfig::default();
        let region = Region::new("1", 0, 5);
        let reads = vec![vec![read(0, 5); 30]];
        let uncapped = emit_ref_blocks(&region, &reads, &config, None);
        let capped = emit_ref_blocks(&region, &reads, &config, Some(10.0));
        let uncapped_q = if let Call::RefBlock { annotation, .. } = &uncapped[0] { annotation.qual } else { unreachable!() };
        let capped_q = if let Call::RefBlock { annotation, .. } = &capped[0] { annotation.qual } else { unreachable!() };
        assert!(capped_q <= uncapped_q);
    }
}
