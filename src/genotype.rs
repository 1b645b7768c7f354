// Genotype enumeration over a chosen haplotype subset (spec.md §4.6,
// component C6), grounded on `original_source/cpp/src/variant/genotype.{hpp,cpp}`
// and `original_source/cpp/src/caller/diploid/genotypeUtils.{hpp,cpp}` for the
// multiset/multiplicity representation and equivalence-class construction,
// and `original_source/cpp/src/utils/combinationGenerator.hpp` /
// `original_source/cpp/src/utils/multinomialCoefficients.{hpp,cpp}` for the
// combination/multiplicity arithmetic.

use std::collections::HashMap;

use crate::errors::{Error, Result};
use crate::haplotype::HaplotypeVector;
use crate::variant::Variant;

/// A ploidy-`k` genotype: a multiset over a chosen subset of haplotype
/// indices, represented as one multiplicity per chosen index (so
/// `multiplicities.iter().sum() == ploidy`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Genotype {
    /// Haplotype indices this genotype is drawn over, in the order given to
    /// the enumerator (parallel to `multiplicities`).
    pub haplotype_indices: Vec<usize>,
    pub multiplicities: Vec<u32>,
}

impl Genotype {
    /// Strands carrying haplotype `index`, or 0 if absent from this genotype.
    pub fn multiplicity_of(&self, index: usize) -> u32 {
        self.haplotype_indices
            .iter()
            .position(|&i| i == index)
            .map(|pos| self.multiplicities[pos])
            .unwrap_or(0)
    }

    /// `k! / Π m_i!` (spec.md §4.6).
    pub fn n_combinations(&self) -> u64 {
        let k: u32 = self.multiplicities.iter().sum();
        let mut n = factorial(k);
        for &m in &self.multiplicities {
            n /= factorial(m);
        }
        n
    }

    /// Present (haplotype index, multiplicity) pairs, skipping zero entries.
    pub fn present(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.haplotype_indices
            .iter()
            .copied()
            .zip(self.multiplicities.iter().copied())
            .filter(|&(_, m)| m > 0)
    }
}

fn factorial(n: u32) -> u64 {
    (1..=n as u64).product()
}

/// Enumerate all ploidy-`k` genotypes over `indices` (combinations with
/// repetition; `C(n+k-1, k)` of them), refusing if `haplotypes` has not been
/// deduplicated among the chosen indices (spec.md §4.6 "refuses to operate on
/// an un-merged haplotype vector").
pub fn enumerate_genotypes(haplotypes: &HaplotypeVector, indices: &[usize], ploidy: u32) -> Result<Vec<Genotype>> {
    for i in 0..indices.len() {
        for j in (i + 1)..indices.len() {
            let (a, b) = (haplotypes.get(indices[i]), haplotypes.get(indices[j]));
            if let (Some(a), Some(b)) = (a, b) {
                if a == b {
                    return Err(Error::PreconditionViolated {
                        msg: format!("haplotypes at indices {} and {} are not merged", indices[i], indices[j]),
                    });
                }
            }
        }
    }

    let n = indices.len();
    let mut out = Vec::new();
    let mut current = vec![0u32; n];
    enumerate_multiplicities(n, ploidy, 0, &mut current, &mut out);
    Ok(out
        .into_iter()
        .map(|multiplicities| Genotype {
            haplotype_indices: indices.to_vec(),
            multiplicities,
        })
        .collect())
}

/// Fill slot `pos..n` with every way to distribute `remaining` strands,
/// appending each complete assignment to `out` (lexicographic over the
/// multiplicity vector).
fn enumerate_multiplicities(n: usize, remaining: u32, pos: usize, current: &mut Vec<u32>, out: &mut Vec<Vec<u32>>) {
    if pos == n - 1 {
        current[pos] = remaining;
        out.push(current.clone());
        return;
    }
    for m in (0..=remaining).rev() {
        current[pos] = m;
        enumerate_multiplicities(n, remaining - m, pos + 1, current, out);
    }
}

/// Per-variant strand counts for `genotype`: for each of `variants`, the
/// total multiplicity of haplotypes (among `haplotypes`) that carry it.
fn strand_counts(haplotypes: &HaplotypeVector, genotype: &Genotype, variants: &[Variant]) -> Vec<u32> {
    variants
        .iter()
        .map(|v| {
            genotype
                .present()
                .filter(|&(idx, _)| haplotypes.get(idx).map(|h| h.contains_variant(v)).unwrap_or(false))
                .map(|(_, m)| m)
                .sum()
        })
        .collect()
}

/// Group `genotypes` into non-phased equivalence classes: two genotypes are
/// equivalent iff their per-variant strand counts (over `variants`) are equal
/// (spec.md §4.6). Returns, for each input genotype, the index of its class
/// within the returned list of classes (each class is the list of genotype
/// indices sharing it).
pub fn equivalence_classes(haplotypes: &HaplotypeVector, genotypes: &[Genotype], variants: &[Variant]) -> Vec<Vec<usize>> {
    let mut by_key: HashMap<Vec<u32>, Vec<usize>> = HashMap::new();
    for (i, g) in genotypes.iter().enumerate() {
        let key = strand_counts(haplotypes, g, variants);
        by_key.entry(key).or_default().push(i);
    }
    by_key.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceWindow;
    use crate::region::{Region, RegionSet};
    use crate::haplotype::Haplotype;

    fn window() -> ReferenceWindow {
        ReferenceWindow::new(Region::new("1", 0, 9), b"AAACCCGGG".to_vec())
    }

    #[test]
    fn diploid_biallelic_has_three_genotypes() {
        let w = window();
        let region_set = RegionSet::from_regions(vec![Region::new("1", 0, 9)]);
        let snp = Variant::new(&w, Region::new("1", 4, 5), b"T".to_vec(), false).unwrap();
        let mut haps = HaplotypeVector::new();
        haps.push(Haplotype::reference(&w, region_set.clone(), 0, 0).unwrap(), None);
        haps.push(Haplotype::new(&w, region_set, vec![snp], 0, 0).unwrap(), None);

        let genotypes = enumerate_genotypes(&haps, &[0, 1], 2).unwrap();
        assert_eq!(genotypes.len(), 3);
        assert!(genotypes.iter().any(|g| g.multiplicities == vec![2, 0]));
        assert!(genotypes.iter().any(|g| g.multiplicities == vec![1, 1]));
        assert!(genotypes.iter().any(|g| g.multiplicities == vec![0, 2]));
    }

    #[test]
    fn n_combinations_counts_strand_orderings() {
        let w = window();
        let region_set = RegionSet::from_regions(vec![Region::new("1", 0, 9)]);
        let snp = Variant::new(&w, Region::new("1", 4, 5), b"T".to_vec(), false).unwrap();
        let mut haps = HaplotypeVector::new();
        haps.push(Haplotype::reference(&w, region_set.clone(), 0, 0).unwrap(), None);
        haps.push(Haplotype::new(&w, region_set, vec![snp], 0, 0).unwrap(), None);
        let genotypes = enumerate_genotypes(&haps, &[0, 1], 2).unwrap();
        let het = genotypes.iter().find(|g| g.multiplicities == vec![1, 1]).unwrap();
        assert_eq!(het.n_combinations(), 2);
        let hom = genotypes.iter().find(|g| g.multiplicities == vec![2, 0]).unwrap();
        assert_eq!(hom.n_combinations(), 1);
    }

    #[test]
    fn unmerged_haplotypes_are_rejected() {
        let w = window();
        let region_set = RegionSet::from_regions(vec![Region::new("1", 0, 9)]);
        let mut haps = HaplotypeVector::new();
        haps.push(Haplotype::reference(&w, region_set.clone(), 0, 0).unwrap(), None);
        haps.push(Haplotype::reference(&w, region_set, 0, 0).unwrap(), None);
        assert!(enumerate_genotypes(&haps, &[0, 1], 2).is_err());
    }
}
