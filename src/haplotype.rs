// Sets of non-overlapping variants realized against a reference window: C3
// (spec.md §4.3), grounded on `examples/original_source/cpp/src/variant/haplotype.hpp`
// and `.../variant/haplotypeVector.hpp` for the host-vector operations
// (push/sort/merge/indices-containing). The teacher's closest shape is its
// `variants/types/replacement.rs` (a struct wrapping a reference interval
// and an alt, with an explicit validity check at construction).

use std::cmp::Ordering;

use getset::Getters;

use crate::errors::{Error, Result};
use crate::reference::ReferenceWindow;
use crate::region::{Region, RegionSet};
use crate::variant::Variant;

/// One of the sequences a sample may carry over a window: a reference window,
/// the (disjoint) region set it covers, the variants applied, and one padded
/// string per region (spec.md §3 "Haplotype").
#[derive(Clone, Debug, Getters)]
pub struct Haplotype {
    #[getset(get = "pub")]
    region_set: RegionSet,
    variants: Vec<Variant>,
    padded_sequences: Vec<Vec<u8>>,
}

impl PartialEq for Haplotype {
    fn eq(&self, other: &Self) -> bool {
        self.region_set == other.region_set && self.padded_sequences == other.padded_sequences
    }
}
impl Eq for Haplotype {}

impl PartialOrd for Haplotype {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Haplotype {
    fn cmp(&self, other: &Self) -> Ordering {
        let self_regions: Vec<&Region> = self.region_set.iter().collect();
        let other_regions: Vec<&Region> = other.region_set.iter().collect();
        self_regions
            .cmp(&other_regions)
            .then_with(|| self.padded_sequences.cmp(&other.padded_sequences))
    }
}

impl Haplotype {
    /// Build a haplotype over `region_set` by applying `variants`. Fails with
    /// `InvalidCombination` if any two variants overlap, or if two variants
    /// with different regions realize the identical mutation (ambiguous
    /// indel representation).
    pub fn new(
        window: &ReferenceWindow,
        region_set: RegionSet,
        mut variants: Vec<Variant>,
        pad_left: u64,
        pad_right: u64,
    ) -> Result<Self> {
        validate_combination(window, &variants)?;
        variants.sort();

        let merged_regions = merge_regions_spanned_by_variants(&region_set, &variants);

        let mut padded_sequences = Vec::with_capacity(merged_regions.len());
        for region in &merged_regions {
            let overlapping: Vec<&Variant> =
                variants.iter().filter(|v| variant_touches_region(v, region)).collect();
            let core = build_sequence(window, region, &overlapping)?;
            let padded = pad_sequence(window, region, &core, pad_left, pad_right)?;
            padded_sequences.push(padded);
        }

        Ok(Haplotype {
            region_set,
            variants,
            padded_sequences,
        })
    }

    /// Construct the all-reference haplotype over `region_set` (spec.md §4.9
    /// step 4: "always include the all-reference haplotype").
    pub fn reference(window: &ReferenceWindow, region_set: RegionSet, pad_left: u64, pad_right: u64) -> Result<Self> {
        Haplotype::new(window, region_set, Vec::new(), pad_left, pad_right)
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn padded_sequences(&self) -> &[Vec<u8>] {
        &self.padded_sequences
    }

    pub fn contains_variant(&self, variant: &Variant) -> bool {
        self.variants.iter().any(|v| v == variant)
    }

    /// True iff no variant on this haplotype overlaps `region` (i.e. the
    /// haplotype matches the reference across that interval).
    pub fn is_reference_at(&self, region: &Region) -> bool {
        !self.variants.iter().any(|v| v.overlaps(region))
    }

    pub fn is_all_reference(&self) -> bool {
        self.variants.is_empty()
    }
}

fn variant_touches_region(variant: &Variant, region: &Region) -> bool {
    if variant.region().is_empty() {
        region.contains_pos(variant.region().contig(), *variant.region().start())
            || *variant.region().start() == *region.end()
    } else {
        variant.region().overlaps(region) || region.contains(variant.region())
    }
}

/// Merge adjacent regions in `region_set` that are spanned by a single
/// variant (spec.md §4.3: "if a variant in the haplotype spans two adjacent
/// R_i, they are merged before padding").
fn merge_regions_spanned_by_variants(region_set: &RegionSet, variants: &[Variant]) -> Vec<Region> {
    let mut regions: Vec<Region> = region_set.iter().cloned().collect();
    regions.sort();
    let mut merged: Vec<Region> = Vec::with_capacity(regions.len());
    for region in regions {
        if let Some(last) = merged.last_mut() {
            let spanned = variants.iter().any(|v| {
                v.region().contig() == last.contig()
                    && *v.region().start() < *last.end()
                    && *v.region().end() > *region.start()
            });
            if spanned && last.contig() == region.contig() {
                *last = last.combine(&region);
                continue;
            }
        }
        merged.push(region);
    }
    merged
}

/// Walk `region` left-to-right, emitting variant alts in place of the
/// reference and reference bases elsewhere (spec.md §4.3).
fn build_sequence(window: &ReferenceWindow, region: &Region, variants: &[&Variant]) -> Result<Vec<u8>> {
    let mut sorted: Vec<&Variant> = variants.to_vec();
    sorted.sort_by_key(|v| *v.region().start());

    let mut seq = Vec::new();
    let mut pos = *region.start();
    let mut vi = 0;

    while pos < *region.end() {
        while vi < sorted.len()
            && sorted[vi].region().is_empty()
            && *sorted[vi].region().start() == pos
        {
            seq.extend_from_slice(sorted[vi].alt());
            vi += 1;
        }
        if vi < sorted.len() && !sorted[vi].region().is_empty() && *sorted[vi].region().start() == pos {
            seq.extend_from_slice(sorted[vi].alt());
            pos = *sorted[vi].region().end();
            vi += 1;
        } else {
            seq.push(window.base_at(pos)?);
            pos += 1;
        }
    }
    while vi < sorted.len() && sorted[vi].region().is_empty() && *sorted[vi].region().start() == pos {
        seq.extend_from_slice(sorted[vi].alt());
        vi += 1;
    }
    Ok(seq)
}

fn pad_sequence(
    window: &ReferenceWindow,
    region: &Region,
    core: &[u8],
    pad_left: u64,
    pad_right: u64,
) -> Result<Vec<u8>> {
    let padded_region = region.extend(pad_left, pad_right).clip_to(window.region());
    let left_len = region.start().saturating_sub(*padded_region.start());
    let right_start = *region.end();
    let right_end = *padded_region.end();

    let mut out = Vec::with_capacity(core.len() + left_len as usize + (right_end - right_start) as usize);
    if left_len > 0 {
        out.extend_from_slice(window.subseq(&Region::new(
            region.contig().clone(),
            *padded_region.start(),
            *region.start(),
        ))?);
    }
    out.extend_from_slice(core);
    if right_end > right_start {
        out.extend_from_slice(window.subseq(&Region::new(region.contig().clone(), right_start, right_end))?);
    }
    Ok(out)
}

/// Pairwise validity check usable standalone before a `Haplotype` is ever
/// built, e.g. to prune variant combinations during assembly ranking (C9)
/// cheaply. Rejects overlapping variants and ambiguous same-mutation
/// indel pairs.
pub fn validate_combination(window: &ReferenceWindow, variants: &[Variant]) -> Result<()> {
    for i in 0..variants.len() {
        for j in (i + 1)..variants.len() {
            let (a, b) = (&variants[i], &variants[j]);
            if a.region().overlaps(b.region()) {
                return Err(Error::InvalidCombination {
                    msg: format!("variants at {} and {} overlap", a.region(), b.region()),
                });
            }
            if a.region().contig() != b.region().contig() {
                continue;
            }
            let a_is_indel = a.region().len() as usize != a.alt().len();
            let b_is_indel = b.region().len() as usize != b.alt().len();
            if !a_is_indel || !b_is_indel || a.region() == b.region() {
                continue;
            }
            let combined = a.region().combine(b.region());
            let seq_a = build_sequence(window, &combined, &[a])?;
            let seq_b = build_sequence(window, &combined, &[b])?;
            if seq_a == seq_b {
                return Err(Error::InvalidCombination {
                    msg: format!(
                        "variants at {} and {} realize the same mutation under different alignments",
                        a.region(),
                        b.region()
                    ),
                });
            }
        }
    }
    Ok(())
}

/// Triage metadata attached to a haplotype during assembly ranking (C9 step
/// 4: "keeps top `maxHaplotypesPerRanker` by summed frequency"), grounded on
/// the score bookkeeping in `variant/haplotype.hpp`.
#[derive(Clone, Copy, Debug, PartialEq, Getters)]
pub struct HaplotypeScore {
    #[getset(get = "pub")]
    summed_frequency: f64,
    #[getset(get = "pub")]
    supporting_reads: usize,
}

impl HaplotypeScore {
    pub fn new(summed_frequency: f64, supporting_reads: usize) -> Self {
        HaplotypeScore {
            summed_frequency,
            supporting_reads,
        }
    }
}

impl PartialOrd for HaplotypeScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.summed_frequency.partial_cmp(&other.summed_frequency)
    }
}

/// Ordered, deduplicated collection of haplotypes sharing a region set
/// (spec.md §3 "Haplotype vector").
#[derive(Clone, Debug, Default)]
pub struct HaplotypeVector {
    haplotypes: Vec<Haplotype>,
    ids: Vec<usize>,
    next_id: usize,
}

impl HaplotypeVector {
    pub fn new() -> Self {
        HaplotypeVector::default()
    }

    pub fn len(&self) -> usize {
        self.haplotypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.haplotypes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Haplotype> {
        self.haplotypes.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Haplotype> {
        self.haplotypes.get(index)
    }

    pub fn id_at(&self, index: usize) -> Option<usize> {
        self.ids.get(index).copied()
    }

    /// Append `haplotype`, returning its assigned id (`id` if given, else an
    /// auto-incrementing counter).
    pub fn push(&mut self, haplotype: Haplotype, id: Option<usize>) -> usize {
        let assigned = id.unwrap_or(self.next_id);
        self.next_id = self.next_id.max(assigned + 1);
        self.haplotypes.push(haplotype);
        self.ids.push(assigned);
        assigned
    }

    /// Sort haplotypes (and their ids, so `push`-assigned identity survives)
    /// by the padded-sequence ordering (spec.md §4.3).
    pub fn sort(&mut self) {
        let mut paired: Vec<(Haplotype, usize)> =
            self.haplotypes.drain(..).zip(self.ids.drain(..)).collect();
        paired.sort_by(|a, b| a.0.cmp(&b.0));
        for (hap, id) in paired {
            self.haplotypes.push(hap);
            self.ids.push(id);
        }
    }

    /// Combine equal-string (per `Ord`/`PartialEq`) haplotypes, preserving
    /// the first-seen id for each group. Assumes `sort` has been called.
    pub fn merge(&mut self) {
        if self.haplotypes.is_empty() {
            return;
        }
        let mut merged_haps = Vec::with_capacity(self.haplotypes.len());
        let mut merged_ids = Vec::with_capacity(self.ids.len());
        for (hap, id) in self.haplotypes.drain(..).zip(self.ids.drain(..)) {
            if merged_haps.last() == Some(&hap) {
                continue;
            }
            merged_haps.push(hap);
            merged_ids.push(id);
        }
        self.haplotypes = merged_haps;
        self.ids = merged_ids;
    }

    /// Refuses to proceed (spec.md §4.6) unless every pair of haplotypes
    /// differs under `Ord` — i.e. `sort` + `merge` have already collapsed
    /// duplicates.
    pub fn assert_merged(&self) -> Result<()> {
        for window in self.haplotypes.windows(2) {
            if window[0] == window[1] {
                return Err(Error::PreconditionViolated {
                    msg: "haplotype vector contains duplicate haplotypes; call sort()+merge() first"
                        .to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn indices_containing_variant(&self, variant: &Variant) -> Vec<usize> {
        self.haplotypes
            .iter()
            .enumerate()
            .filter(|(_, h)| h.contains_variant(variant))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn indices_that_are_reference_at(&self, region: &Region) -> Vec<usize> {
        self.haplotypes
            .iter()
            .enumerate()
            .filter(|(_, h)| h.is_reference_at(region))
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> ReferenceWindow {
        ReferenceWindow::new(Region::new("1", 0, 19), b"CAGATTACAGATTACAGAT".to_vec())
    }

    fn region_set(region: Region) -> RegionSet {
        RegionSet::from_regions(vec![region])
    }

    #[test]
    fn reference_haplotype_matches_reference_bases() {
        let w = window();
        let region = Region::new("1", 2, 8);
        let hap = Haplotype::reference(&w, region_set(region.clone()), 0, 0).unwrap();
        assert_eq!(hap.padded_sequences()[0], w.subseq(&region).unwrap());
        assert!(hap.is_all_reference());
    }

    #[test]
    fn snp_substitutes_single_base() {
        let w = window();
        let region = Region::new("1", 2, 8);
        let snp = Variant::new(&w, Region::new("1", 4, 5), b"G".to_vec(), false).unwrap();
        let hap = Haplotype::new(&w, region_set(region), vec![snp], 0, 0).unwrap();
        assert_eq!(hap.padded_sequences()[0], b"GATGAC");
    }

    #[test]
    fn deletion_shrinks_sequence() {
        let w = window();
        let region = Region::new("1", 2, 8);
        let del = Variant::new(&w, Region::new("1", 4, 6), Vec::new(), false).unwrap();
        let hap = Haplotype::new(&w, region_set(region), vec![del], 0, 0).unwrap();
        assert_eq!(hap.padded_sequences()[0], b"GATAC");
    }

    #[test]
    fn padding_pulls_in_flanking_reference() {
        let w = window();
        let region = Region::new("1", 4, 6);
        let hap = Haplotype::reference(&w, region_set(region), 2, 2).unwrap();
        assert_eq!(hap.padded_sequences()[0], w.subseq(&Region::new("1", 2, 8)).unwrap());
    }

    #[test]
    fn overlapping_variants_rejected() {
        let w = window();
        let region = Region::new("1", 2, 8);
        let a = Variant::new(&w, Region::new("1", 3, 6), b"GGG".to_vec(), false).unwrap();
        let b = Variant::new(&w, Region::new("1", 4, 5), b"G".to_vec(), false).unwrap();
        assert!(Haplotype::new(&w, region_set(region), vec![a, b], 0, 0).is_err());
    }

    #[test]
    fn ambiguous_indel_representations_rejected() {
        // A homopolymer run "AAAA" (positions 1..5) flanked by fixed bases:
        // deleting the base at position 2 or at position 3 both remove one
        // "A" from the same run, yielding the identical resulting string
        // "CAAAG" over their combined interval.
        let w = ReferenceWindow::new(Region::new("1", 0, 6), b"CAAAAG".to_vec());
        let a = Variant::new(&w, Region::new("1", 2, 3), Vec::new(), false).unwrap();
        let b = Variant::new(&w, Region::new("1", 3, 4), Vec::new(), false).unwrap();
        let region = Region::new("1", 0, 6);
        assert!(Haplotype::new(&w, region_set(region), vec![a, b], 0, 0).is_err());
    }

    #[test]
    fn vector_merge_collapses_equal_sequences() {
        let w = window();
        let region = Region::new("1", 2, 8);
        let mut v = HaplotypeVector::new();
        v.push(Haplotype::reference(&w, region_set(region.clone()), 0, 0).unwrap(), None);
        v.push(Haplotype::reference(&w, region_set(region), 0, 0).unwrap(), None);
        v.sort();
        v.merge();
        assert_eq!(v.len(), 1);
    }
}
