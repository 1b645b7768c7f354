// Genotype likelihood, quality, and read-support annotation (spec.md §4.7,
// component C7).

pub mod bias;
pub mod likelihood;
pub mod support;

pub use likelihood::{genotype_likelihoods, genotype_quality, phase_quality, pl_values};
pub use support::{accumulate_support, ReadSupportAccountant};

/// Sentinel for a Phred quality that is undefined because a sample had no
/// reads (spec.md §7 "Numeric sentinels (`unknownValue`) are used wherever a
/// quality is undefined"). Callers test with `f64::is_nan`.
pub const UNKNOWN_QUALITY: f64 = f64::NAN;
