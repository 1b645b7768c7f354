// Large-variant call merger (spec.md §4.9 "Large-variant call merger"),
// grounded on `original_source/cpp/src/caller/mergeLargeVariantCalls.{hpp,cpp}`.
//
// When `turn_on_large_variant_calls` splits a cluster into a dedicated
// large-variant sub-cluster and small-variant sub-clusters (spec.md §4.9 step
// 2), a small-variant sub-cluster that touches a large deletion runs at
// *reduced* ploidy (default ploidy minus the count of large-variant alt
// strands), so its calls initially have fewer than `ploidy` genotype
// entries. For each such call and sample, the overlapping large-variant
// call's alt-carrying strands are used to extend the small call's genotype
// vector with `Allele::Unknown` in the corresponding slots, and that same
// slot is rewritten to `Allele::Unknown` in the large-variant call too
// (spec.md §4.9: neither call can claim to resolve that strand on its own).
// Reference-only calls from the reduced-ploidy run are dropped for samples
// that don't have the default ploidy, since they'd otherwise wrongly claim
// reference over the deleted region.

use crate::call::{Allele, Call, SampleAnnotation};
use crate::region::Region;

/// Merge `large_calls` (from the large-variant pass, at full `default_ploidy`)
/// with `small_calls` (from the reduced-ploidy pass), per spec.md §4.9's
/// call-merger rules.
pub fn merge_large_variant_calls(default_ploidy: u32, mut large_calls: Vec<Call>, small_calls: Vec<Call>) -> Vec<Call> {
    // Snapshot of each large Call::Variant's region and per-sample genotype,
    // indexed by position in `large_calls`, taken before any mutation so
    // multiple overlapping small calls all see the same alt-carrying slots.
    let large_snapshot: Vec<(usize, Region, Vec<Vec<Allele>>)> = large_calls
        .iter()
        .enumerate()
        .filter_map(|(i, c)| {
            if let Call::Variant { region, samples, .. } = c {
                Some((i, region.clone(), samples.iter().map(|s| s.genotype.clone()).collect()))
            } else {
                None
            }
        })
        .collect();

    // (large_calls index, sample index, slot) to rewrite to `Unknown` once
    // every small call has been matched against the snapshot above.
    let mut large_rewrites: Vec<(usize, usize, usize)> = Vec::new();

    let mut merged = Vec::new();

    for call in small_calls {
        match call {
            Call::Variant { region, alt, annotation, samples } => {
                match large_snapshot.iter().find(|(_, lr, _)| lr.overlaps(&region)) {
                    Some((large_idx, _, large_genotypes)) => {
                        let samples = extend_samples(samples, large_genotypes, default_ploidy, *large_idx, &mut large_rewrites);
                        let carries_alt = samples.iter().any(|s| s.genotype.contains(&Allele::Alt));
                        if carries_alt {
                            merged.push(Call::Variant { region, alt, annotation, samples });
                        }
                    }
                    None => merged.push(Call::Variant { region, alt, annotation, samples }),
                }
            }
            Call::RefBlock { region, annotation } => {
                if !large_snapshot.iter().any(|(_, lr, _)| lr.overlaps(&region)) {
                    merged.push(Call::RefBlock { region, annotation });
                }
            }
        }
    }

    for (large_idx, sample_idx, slot) in large_rewrites {
        if let Call::Variant { samples, .. } = &mut large_calls[large_idx] {
            samples[sample_idx].genotype[slot] = Allele::Unknown;
        }
    }

    merged.extend(large_calls);
    merged.sort_by_key(|c| c.sort_key());
    merged
}

/// Extend each sample's reduced-ploidy genotype to `default_ploidy` strands,
/// filling the large call's alt-carrying strands with `Allele::Unknown` and
/// the small call's own values into the remaining strands, in order. Every
/// slot filled this way is recorded in `large_rewrites` so the caller can
/// also rewrite it to `Allele::Unknown` in the large-variant call.
fn extend_samples(
    samples: Vec<SampleAnnotation>,
    large_genotypes: &[Vec<Allele>],
    default_ploidy: u32,
    large_idx: usize,
    large_rewrites: &mut Vec<(usize, usize, usize)>,
) -> Vec<SampleAnnotation> {
    samples
        .into_iter()
        .enumerate()
        .map(|(sample_idx, mut sample)| {
            let empty = Vec::new();
            let large_gt = large_genotypes.get(sample_idx).unwrap_or(&empty);
            let mut own = sample.genotype.into_iter();
            let mut extended = Vec::with_capacity(default_ploidy as usize);
            for slot in 0..default_ploidy as usize {
                if large_gt.get(slot) == Some(&Allele::Alt) {
                    extended.push(Allele::Unknown);
                    large_rewrites.push((large_idx, sample_idx, slot));
                } else {
                    extended.push(own.next().unwrap_or(Allele::Ref));
                }
            }
            sample.genotype = extended;
            sample
        })
        .collect()
}
