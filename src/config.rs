// The recognized-options record (spec.md §6). A single, read-only-after-init
// configuration struct, built with `derive_builder`'s owned pattern the way
// the teacher's `calling::variants::preprocessing::ObservationProcessorBuilder`
// is, and `serde::Deserialize` so a CLI/config-file layer (out of core scope)
// can populate it from YAML/JSON/TOML.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

#[derive(Builder, Clone, Debug, Serialize, Deserialize, PartialEq)]
#[builder(pattern = "owned", default)]
pub struct CallerConfig {
    /// Arity of genotypes.
    pub ploidy: u32,

    /// Starting k-mer size for assembly (C1).
    pub kmer_size: usize,
    /// Maximum k-mer size to escalate to if the graph reports a repeat.
    pub max_kmer_size: usize,
    /// Step by which `kmer_size` escalates.
    pub kmer_size_increment: usize,
    /// Floor on edge support for C1 (Phred base quality).
    pub min_edge_base_quality: u8,
    /// Base (non-homopolymer) probability of opening an indel gap in the C4 aligner.
    pub indel_gap_open_prob: f64,
    /// Probability of extending an already-open indel gap by one base in C4.
    pub indel_gap_extend_prob: f64,
    /// Minimum aggregate support for an assembled chain to be kept.
    pub min_support: usize,
    /// Cap on distinct paths enumerated per reference-node endpoint in C1.
    pub max_paths_per_endpoint: usize,

    /// Top-K haplotypes kept overall per cluster.
    pub max_haplotypes_per_cluster: usize,
    /// Top-K haplotypes kept per assembly-ranking round (C9 step 4).
    pub max_haplotypes_per_ranker: usize,

    /// Candidate-variant filters (applied upstream of the core, documented here
    /// because the core's assembly fallback re-uses them).
    pub min_base_qual: u8,
    pub min_reads_per_var: usize,
    pub per_sample_percent_reads_per_var: f64,

    /// Clustering controls.
    pub min_cluster_dist: u64,
    pub max_cluster_dist: u64,
    pub max_cluster_size: u64,
    pub max_cluster_variant_combinations: usize,
    pub min_reads_to_support_claim: usize,

    /// Large-variant activation.
    pub large_variant_size_definition: u64,
    pub large_variant_cluster_threshold: u64,
    pub turn_on_large_variant_calls: bool,

    /// Window (bases) around a variant used for base-quality accounting in C7.
    pub bad_reads_window_size: u64,
    /// Symmetric Beta-Binomial shape parameter for allele-bias and
    /// strand-bias P-values (spec.md §4.7; the spec leaves the exact value
    /// unspecified ("empirically tuned"), so both biases share one tunable).
    pub bias_beta_shape: f64,
    /// Posterior threshold above which a read counts toward "supports" in
    /// the per-variant read-support accounting (C7).
    pub read_support_posterior_threshold: f64,

    /// Relative-quality threshold for starting a new reference block (C9).
    pub reference_call_quality_delta_threshold: f64,

    /// Output/behavior toggles.
    pub output_phased_genotypes: bool,
    pub output_ref_calls: bool,
    pub all_variants: bool,
    pub genotyping_mode: bool,
    pub allow_mnp_calls: bool,
    pub normalize_variant_calls: bool,

    /// Soft-filter thresholds.
    pub min_allowed_quality_score: f64,
    pub min_call_qual: f64,
    pub min_allele_bias_p: f64,
    pub min_strand_bias_p: f64,
    pub min_allele_plus_strand_bias_p: f64,
    pub min_rms_mapping_q: f64,
    pub min_snp_q_over_depth: f64,
    pub min_indel_q_over_depth: f64,
    pub min_bad_reads_score: f64,

    /// Cap on reads per sample inside a breakpoint region before a cluster is
    /// abandoned outright (spec.md §5, §9 open question: magic number carried
    /// through as configuration, default matches the original engine).
    pub max_reads_per_sample: usize,

    /// Maximum Phred score reported for any quality value.
    pub max_phred_score: f64,
}

impl Default for CallerConfig {
    fn default() -> Self {
        CallerConfig {
            ploidy: 2,
            kmer_size: 15,
            max_kmer_size: 63,
            kmer_size_increment: 4,
            min_edge_base_quality: 20,
            indel_gap_open_prob: 1e-4,
            indel_gap_extend_prob: 1e-2,
            min_support: 100,
            max_paths_per_endpoint: 20,
            max_haplotypes_per_cluster: 128,
            max_haplotypes_per_ranker: 16,
            min_base_qual: 20,
            min_reads_per_var: 2,
            per_sample_percent_reads_per_var: 0.05,
            min_cluster_dist: 9,
            max_cluster_dist: 100,
            max_cluster_size: 500,
            max_cluster_variant_combinations: 10000,
            min_reads_to_support_claim: 2,
            large_variant_size_definition: 50,
            large_variant_cluster_threshold: 100,
            turn_on_large_variant_calls: false,
            bad_reads_window_size: 10,
            bias_beta_shape: 2.0,
            read_support_posterior_threshold: 0.5,
            reference_call_quality_delta_threshold: 0.2,
            output_phased_genotypes: true,
            output_ref_calls: true,
            all_variants: false,
            genotyping_mode: false,
            allow_mnp_calls: true,
            normalize_variant_calls: true,
            min_allowed_quality_score: 20.0,
            min_call_qual: 4.0,
            min_allele_bias_p: 0.009,
            min_strand_bias_p: 0.01,
            min_allele_plus_strand_bias_p: 0.001,
            min_rms_mapping_q: 20.0,
            min_snp_q_over_depth: 3.0,
            min_indel_q_over_depth: 7.0,
            min_bad_reads_score: 15.0,
            max_reads_per_sample: 5000,
            max_phred_score: 3000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = CallerConfigBuilder::default()
            .ploidy(3u32)
            .build()
            .unwrap();
        assert_eq!(config.ploidy, 3);
        assert_eq!(config.kmer_size, CallerConfig::default().kmer_size);
    }
}
