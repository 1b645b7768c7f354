// Normalized representation of a mutation: C2 of the spec (§4.2), grounded on
// `examples/original_source/cpp/src/variant/type/variant.hpp` and the shape of
// the teacher's `variants::types` module (trait-per-variant-kind dispatch,
// e.g. `variants/insertion.rs`, `variants/types/replacement.rs`). Here the
// data model is a single struct rather than one type per kind, since the
// kind is fully determined by the lengths of `region` and `alt` (spec.md §3).

use std::cmp::Ordering;

use getset::Getters;

use crate::errors::{Error, Result};
use crate::reference::ReferenceWindow;
use crate::region::{Region, RegionSet};

/// SNP / MNP / insertion / deletion classification, derived purely from the
/// lengths of the reference interval and the alt sequence (spec.md §3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariantKind {
    Snp,
    Mnp,
    Insertion,
    Deletion,
}

/// `{reference-window-ref, region R, alt-sequence A}` (spec.md §3).
///
/// Equality is `(contig, R, A)`; ordering is lexicographic over
/// `(contig, R.start, R.end, A)`, both derived rather than hand-rolled, since
/// `Region` already orders `(contig, start, end)` and the alt sequence is the
/// natural tie-breaker.
#[derive(Clone, Debug, Getters)]
pub struct Variant {
    #[getset(get = "pub")]
    region: Region,
    alt: Vec<u8>,
    /// Caller asserts this variant is already fully left-aligned; never
    /// re-derived (spec.md §4.2: "a flag; not re-derived").
    fully_left_aligned: bool,
    /// Populated once by `assign_prior`; idempotent thereafter.
    prior: Option<f64>,
    genotyping: bool,
    from_breakpoint: bool,
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        self.region == other.region && self.alt == other.alt
    }
}
impl Eq for Variant {}

impl PartialOrd for Variant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Variant {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.region.contig(), self.region.start(), self.region.end(), &self.alt).cmp(&(
            other.region.contig(),
            other.region.start(),
            other.region.end(),
            &other.alt,
        ))
    }
}

impl Variant {
    /// Construct a variant. Rejects the empty variant (both `|R|=0` and
    /// `|A|=0`) and any region not covered by `window`.
    pub fn new(
        window: &ReferenceWindow,
        region: Region,
        alt: Vec<u8>,
        fully_left_aligned: bool,
    ) -> Result<Self> {
        if region.is_empty() && alt.is_empty() {
            return Err(Error::InvalidArgument {
                msg: "empty variant (empty region and empty alt) is not allowed".to_string(),
            });
        }
        if !window.region().contains(&region) {
            return Err(Error::InvalidArgument {
                msg: format!(
                    "variant region {} is not covered by reference window {}",
                    region,
                    window.region()
                ),
            });
        }
        Ok(Variant {
            region,
            alt,
            fully_left_aligned,
            prior: None,
            genotyping: false,
            from_breakpoint: false,
        })
    }

    pub fn alt(&self) -> &[u8] {
        &self.alt
    }

    pub fn is_fully_left_aligned(&self) -> bool {
        self.fully_left_aligned
    }

    pub fn kind(&self) -> VariantKind {
        let r = self.region.len() as usize;
        let a = self.alt.len();
        if r == a {
            if r == 1 {
                VariantKind::Snp
            } else {
                VariantKind::Mnp
            }
        } else if r < a {
            VariantKind::Insertion
        } else {
            VariantKind::Deletion
        }
    }

    pub fn is_pure_indel(&self) -> bool {
        self.region.is_empty() || self.alt.is_empty()
    }

    /// Zero-indexed display position (spec.md §3): `R.start` for substitutions,
    /// `R.start − 1` for pure indels (the anchoring base sits one before).
    pub fn display_position(&self) -> u64 {
        if self.is_pure_indel() {
            self.region.start().saturating_sub(1)
        } else {
            *self.region.start()
        }
    }

    pub fn assign_prior(&mut self, prior: f64) {
        if self.prior.is_none() {
            self.prior = Some(prior);
        }
    }

    pub fn prior(&self) -> Option<f64> {
        self.prior
    }

    pub fn set_genotyping(&mut self, genotyping: bool) {
        self.genotyping = genotyping;
    }

    pub fn is_genotyping(&self) -> bool {
        self.genotyping
    }

    pub fn set_from_breakpoint(&mut self, from_breakpoint: bool) {
        self.from_breakpoint = from_breakpoint;
    }

    pub fn is_from_breakpoint(&self) -> bool {
        self.from_breakpoint
    }

    pub fn is_large(&self, size_definition: u64) -> bool {
        self.region.len() >= size_definition || self.alt.len() as u64 >= size_definition
    }

    /// Strip matching reference/alt prefixes and suffixes in tandem, shrinking
    /// the region inward. May return the empty variant; callers must check
    /// `is_empty_after_trim` and drop it.
    pub fn trimmed(&self, window: &ReferenceWindow) -> Result<Variant> {
        let ref_seq = window.subseq(&self.region)?;
        let mut ref_seq = ref_seq.to_vec();
        let mut alt = self.alt.clone();
        let mut start = *self.region.start();
        let mut end = *self.region.end();

        let mut prefix = 0;
        while prefix < ref_seq.len() && prefix < alt.len() && ref_seq[prefix] == alt[prefix] {
            prefix += 1;
        }
        ref_seq.drain(0..prefix);
        alt.drain(0..prefix);
        start += prefix as u64;

        let mut suffix = 0;
        while suffix < ref_seq.len()
            && suffix < alt.len()
            && ref_seq[ref_seq.len() - 1 - suffix] == alt[alt.len() - 1 - suffix]
        {
            suffix += 1;
        }
        if suffix > 0 {
            ref_seq.truncate(ref_seq.len() - suffix);
            alt.truncate(alt.len() - suffix);
            end -= suffix as u64;
        }

        Ok(Variant {
            region: Region::new(self.region.contig().clone(), start, end),
            alt,
            fully_left_aligned: self.fully_left_aligned,
            prior: None,
            genotyping: self.genotyping,
            from_breakpoint: self.from_breakpoint,
        })
    }

    pub fn is_empty_after_trim(&self) -> bool {
        self.region.is_empty() && self.alt.is_empty()
    }

    /// For an MNP of length n, return n SNPs at positions `start..start+n`.
    pub fn split(&self, window: &ReferenceWindow) -> Result<Vec<Variant>> {
        if self.region.len() as usize != self.alt.len() || self.region.len() <= 1 {
            return Err(Error::InvalidArgument {
                msg: "split is only defined for MNPs (ref and alt of equal length > 1)"
                    .to_string(),
            });
        }
        let mut out = Vec::with_capacity(self.alt.len());
        for (i, &base) in self.alt.iter().enumerate() {
            let pos = self.region.start() + i as u64;
            let region = Region::new(self.region.contig().clone(), pos, pos + 1);
            out.push(Variant::new(window, region, vec![base], true)?);
        }
        Ok(out)
    }

    /// Concatenate with `other`, provided `self.region.end == other.region.start`
    /// (abutting in reference coordinates).
    pub fn join(&self, other: &Variant) -> Result<Variant> {
        if self.region.contig() != other.region.contig() || self.region.end() != other.region.start()
        {
            return Err(Error::NotJoinable {
                msg: format!(
                    "variant regions {} and {} do not abut",
                    self.region, other.region
                ),
            });
        }
        let mut alt = self.alt.clone();
        alt.extend_from_slice(&other.alt);
        Ok(Variant {
            region: Region::new(
                self.region.contig().clone(),
                *self.region.start(),
                *other.region.end(),
            ),
            alt,
            fully_left_aligned: false,
            prior: None,
            genotyping: self.genotyping && other.genotyping,
            from_breakpoint: self.from_breakpoint || other.from_breakpoint,
        })
    }

    /// True iff `other` is a contiguous sub-interval of `self` with a matching
    /// alt sub-string at the aligned alt offset.
    pub fn removable(&self, other: &Variant) -> bool {
        if self.region.contig() != other.region.contig() {
            return false;
        }
        if other.region.start() < self.region.start() || other.region.end() > self.region.end() {
            return false;
        }
        // Only meaningful when ref-lengths equal alt-lengths at both ends (i.e.
        // this is a substitution-on-substitution removal, which is the only
        // case where an "aligned alt offset" is unambiguous).
        if self.region.len() as usize != self.alt.len() || other.region.len() as usize != other.alt.len()
        {
            return false;
        }
        let offset = (other.region.start() - self.region.start()) as usize;
        let len = other.alt.len();
        offset + len <= self.alt.len() && self.alt[offset..offset + len] == other.alt[..]
    }

    /// Subtract `other`'s contribution from `self`. Panics if `!self.removable(other)`.
    pub fn remove(&self, other: &Variant) -> Variant {
        assert!(self.removable(other), "other is not removable from self");
        let offset = (other.region.start() - self.region.start()) as usize;
        let len = other.alt.len();
        let mut alt = self.alt.clone();
        alt.drain(offset..offset + len);
        let mut region = self.region.clone();
        // Shrink the reference interval by the same span that was removed from alt.
        if offset == 0 {
            region = Region::new(region.contig().clone(), region.start() + len as u64, *region.end());
        } else {
            region = Region::new(region.contig().clone(), *region.start(), region.end() - len as u64);
        }
        Variant {
            region,
            alt,
            fully_left_aligned: false,
            prior: None,
            genotyping: self.genotyping,
            from_breakpoint: self.from_breakpoint,
        }
    }

    pub fn overlaps(&self, region: &Region) -> bool {
        self.region.overlaps(region)
    }

    /// `[left-aligned-start, original-start] ∪ [original-end, right-aligned-end]`,
    /// both clipped to `[min_pos, max_pos]`. Used by C7 to decide which reads
    /// may inform this variant's support.
    pub fn start_end_regions(
        &self,
        window: &ReferenceWindow,
        min_pos: u64,
        max_pos: u64,
    ) -> Result<RegionSet> {
        let left = self.left_aligned(window, Some(min_pos))?;
        let right = self.right_aligned(window, Some(max_pos))?;
        let mut set = RegionSet::new();
        let left_region = Region::new(
            self.region.contig().clone(),
            left.region.start().max(min_pos),
            self.region.start().max(left.region.start().max(min_pos)),
        );
        let right_region = Region::new(
            self.region.contig().clone(),
            self.region.end().min(right.region.end().min(max_pos)),
            right.region.end().min(max_pos).max(*self.region.end()),
        );
        set.insert(left_region);
        set.insert(right_region);
        Ok(set)
    }

    /// Shift the region as far left as possible while preserving the realized
    /// haplotype string (spec.md §4.2). A no-op for non-indels.
    pub fn left_aligned(&self, window: &ReferenceWindow, min_pos: Option<u64>) -> Result<Variant> {
        if !self.is_indel() {
            return Ok(self.clone());
        }
        let floor = min_pos.unwrap_or(0).max(*window.region().start());
        let mut start = *self.region.start();
        let mut end = *self.region.end();
        let mut alt = self.alt.clone();

        while start > floor {
            let last_base = if !alt.is_empty() {
                *alt.last().unwrap()
            } else {
                window.base_at(end - 1)?
            };
            let prev_base = window.base_at(start - 1)?;
            if !bases_equal(last_base, prev_base) {
                break;
            }
            start -= 1;
            end -= 1;
            if !alt.is_empty() {
                let len = alt.len();
                alt.copy_within(0..len - 1, 1);
                alt[0] = prev_base;
            }
        }

        Ok(Variant {
            region: Region::new(self.region.contig().clone(), start, end),
            alt,
            fully_left_aligned: true,
            prior: None,
            genotyping: self.genotyping,
            from_breakpoint: self.from_breakpoint,
        })
    }

    /// Mirror of `left_aligned`: shift the region as far right as possible,
    /// bounded above by `max_pos` (and the reference window).
    pub fn right_aligned(&self, window: &ReferenceWindow, max_pos: Option<u64>) -> Result<Variant> {
        if !self.is_indel() {
            return Ok(self.clone());
        }
        let ceiling = max_pos
            .unwrap_or(*window.region().end())
            .min(*window.region().end());
        let mut start = *self.region.start();
        let mut end = *self.region.end();
        let mut alt = self.alt.clone();

        while end < ceiling {
            let first_base = if !alt.is_empty() {
                alt[0]
            } else {
                window.base_at(start)?
            };
            let next_base = window.base_at(end)?;
            if !bases_equal(first_base, next_base) {
                break;
            }
            start += 1;
            end += 1;
            if !alt.is_empty() {
                let len = alt.len();
                alt.copy_within(1..len, 0);
                *alt.last_mut().unwrap() = next_base;
            }
        }

        Ok(Variant {
            region: Region::new(self.region.contig().clone(), start, end),
            alt,
            fully_left_aligned: false,
            prior: None,
            genotyping: self.genotyping,
            from_breakpoint: self.from_breakpoint,
        })
    }

    fn is_indel(&self) -> bool {
        self.region.len() as usize != self.alt.len()
    }
}

fn bases_equal(a: u8, b: u8) -> bool {
    a.to_ascii_uppercase() == b.to_ascii_uppercase()
}
