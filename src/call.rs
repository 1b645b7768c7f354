// The emitted call record and its annotation keys (spec.md §6 "Per-call
// annotation names"), grounded on the teacher's
// `calling::variants::preprocessing::ObservationProcessorBuilder` for the
// owned-pattern `derive_builder` usage.

use derive_builder::Builder;

use crate::region::Region;

/// Allelic depth: (reference-supporting, alt-supporting).
pub type AllelicDepth = (u32, u32);

/// One strand's call for a variant: carries the alt, carries the reference,
/// or (C9 phase alignment / large-variant merge) not determined. `Unknown`
/// corresponds to the original engine's `UNKNOWN` sentinel (spec.md §4.9
/// "Large-variant call merger").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Allele {
    Ref,
    Alt,
    Unknown,
}

/// Per-sample FORMAT-field annotations for one variant call (spec.md §6).
#[derive(Builder, Clone, Debug, PartialEq)]
#[builder(pattern = "owned")]
pub struct SampleAnnotation {
    /// Per-strand call (GT-equivalent), length `ploidy` (or less, before a
    /// large-variant merge fills it out; spec.md §4.9).
    pub genotype: Vec<Allele>,
    /// `PL`: Phred-scaled genotype-likelihood triple (RR, RA, AA for ploidy 2;
    /// `ploidy+1` entries in general).
    pub pl: Vec<f64>,
    /// `GQ`: genotype quality.
    pub gq: f64,
    /// `PQ`: phase quality.
    pub pq: f64,
    /// `PS`: phase-set id, if this sample's call is phased.
    #[builder(default)]
    pub ps: Option<u64>,
    /// `AD`: allelic depths (ref, alt).
    pub ad: AllelicDepth,
    /// `FORMAT_DP`: per-sample total depth.
    pub format_dp: u32,
    /// `VAF`: variant allele fraction.
    pub vaf: f64,
}

/// Variant-scope annotations (spec.md §6).
#[derive(Builder, Clone, Debug, PartialEq)]
#[builder(pattern = "owned")]
pub struct VariantAnnotation {
    /// `PP`: posterior quality (Phred-scaled).
    pub pp: f64,
    /// `DP`/`DPR`/`DPF`: total/reverse/forward depth across all samples.
    pub dp: u32,
    pub dpr: u32,
    pub dpf: u32,
    /// `VC`/`VCR`/`VCF`: variant-supporting total/reverse/forward reads.
    pub vc: u32,
    pub vcr: u32,
    pub vcf: u32,
    /// `ABPV`/`SBPV`: allele-bias / strand-bias P-values (log10).
    pub abpv: f64,
    pub sbpv: f64,
    /// `MQ`: max across samples of RMS mapping quality for supporting reads.
    pub mq: f64,
    /// `BR`: max across samples of median min base quality for supporting reads.
    pub br: f64,
    /// `QD`: variant support per read.
    pub qd: f64,
}

/// A 1-based inclusive reference-block interval, plus per-sample minimum
/// depth (spec.md §6 `BEG`/`END`/`LEN`, `MIN_DP`).
#[derive(Clone, Debug, PartialEq)]
pub struct RefBlockAnnotation {
    pub beg: u64,
    pub end: u64,
    pub len: u64,
    pub min_dp: Vec<u32>,
    /// Phred quality of the reference call for this chunk (min across
    /// samples of the per-sample Beta-Binomial coverage quality; spec.md
    /// §4.9 "Reference-block emission").
    pub qual: f64,
}

impl RefBlockAnnotation {
    pub fn from_region(region: &Region, min_dp: Vec<u32>) -> Self {
        RefBlockAnnotation::with_quality(region, min_dp, 0.0)
    }

    pub fn with_quality(region: &Region, min_dp: Vec<u32>, qual: f64) -> Self {
        RefBlockAnnotation {
            beg: region.start() + 1,
            end: *region.end(),
            len: region.len(),
            min_dp,
            qual,
        }
    }
}

/// One emitted record: either a variant call (with per-sample genotype
/// annotations) or a reference-block call (spec.md §5 "Reference blocks are
/// emitted between variant blocks; no variant call and no reference block
/// ever overlap").
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Variant {
        region: Region,
        alt: Vec<u8>,
        annotation: VariantAnnotation,
        samples: Vec<SampleAnnotation>,
    },
    RefBlock {
        region: Region,
        annotation: RefBlockAnnotation,
    },
}

impl Call {
    /// Sort key for emission order (spec.md §5 "Ordering guarantees":
    /// `(zero-indexed-vcf-position, reference-end, alt-sequence)`).
    pub fn sort_key(&self) -> (u64, u64, Vec<u8>) {
        match self {
            Call::Variant { region, alt, .. } => (*region.start(), *region.end(), alt.clone()),
            Call::RefBlock { region, .. } => (*region.start(), *region.end(), Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_calls_sort_before_overlapping_ref_blocks_at_the_same_start() {
        let variant = Call::Variant {
            region: Region::new("1", 10, 11),
            alt: b"T".to_vec(),
            annotation: VariantAnnotationBuilder::default()
                .pp(30.0)
                .dp(10)
                .dpr(5)
                .dpf(5)
                .vc(5)
                .vcr(2)
                .vcf(3)
                .abpv(-1.0)
                .sbpv(-1.0)
                .mq(60.0)
                .br(30.0)
                .qd(1.0)
                .build()
                .unwrap(),
            samples: Vec::new(),
        };
        let ref_block = Call::RefBlock {
            region: Region::new("1", 10, 20),
            annotation: RefBlockAnnotation::from_region(&Region::new("1", 10, 20), vec![10]),
        };
        assert!(variant.sort_key() < ref_block.sort_key());
    }

    #[test]
    fn ref_block_annotation_reports_one_based_inclusive_bounds() {
        let region = Region::new("1", 100, 110);
        let ann = RefBlockAnnotation::from_region(&region, vec![5, 8]);
        assert_eq!(ann.beg, 101);
        assert_eq!(ann.end, 110);
        assert_eq!(ann.len, 10);
    }
}
