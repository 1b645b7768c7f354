// The per-cluster calling pipeline (spec.md §4.9 C9, steps 1-8), grounded on
// `original_source/cpp/src/caller/job.cpp`'s per-block control flow: assign
// priors, gather reads, build haplotypes (pre-enumerated combinations or
// assembly fallback), run C4->C8, decide which variants to emit, fill the
// gaps with reference blocks.

use crate::annotation::bias::{allele_bias_log10_p, strand_bias_log10_p};
use crate::annotation::{
    accumulate_support, genotype_likelihoods, genotype_quality, phase_quality, pl_values, ReadSupportAccountant,
    UNKNOWN_QUALITY,
};
use crate::call::{Allele, Call, SampleAnnotation, SampleAnnotationBuilder, VariantAnnotationBuilder};
use crate::config::CallerConfig;
use crate::errors::Result;
use crate::frequency::haplotype_frequencies;
use crate::genotype::{enumerate_genotypes, equivalence_classes, Genotype};
use crate::graph;
use crate::haplotype::{Haplotype, HaplotypeVector};
use crate::likelihood::build_likelihood_matrix;
use crate::priors::default_prior;
use crate::quality::{variant_quality, SampleEvidence};
use crate::reads::Read;
use crate::reference::ReferenceWindow;
use crate::region::{Region, RegionSet};
use crate::reporter::Reporter;
use crate::variant::Variant;

use super::merge::merge_large_variant_calls;
use super::phase::ClusterPhaseState;
use super::refblock::emit_ref_blocks;

/// One block of candidate variants and the reads that inform them (spec.md
/// §3 "Variant cluster"). `combinations`, when present, is the authoritative
/// set of variant combinations to turn into haplotypes; otherwise haplotypes
/// are derived by assembly (C1) and alignment ranking.
pub struct ClusterInput {
    pub region: Region,
    pub variants: Vec<Variant>,
    pub combinations: Option<Vec<Vec<Variant>>>,
    pub read_regions: RegionSet,
    pub window: ReferenceWindow,
    /// Reads per sample, in the same order as `sample_names`.
    pub sample_reads: Vec<Vec<Read>>,
    pub sample_names: Vec<String>,
}

/// Result of running one cluster: either the emitted calls (variant calls
/// plus, if enabled, reference blocks over the gaps) together with the
/// per-sample haplotype assignment needed for phase alignment against the
/// next cluster, or a skip with whatever reference blocks could still be
/// produced (spec.md §7 "skipped clusters produce reference calls... but no
/// variant calls").
pub enum ClusterOutcome {
    Called {
        calls: Vec<Call>,
        phase_state: ClusterPhaseState,
    },
    Skipped {
        reason: String,
        ref_blocks: Vec<Call>,
    },
}

/// Run the full C9 pipeline over one cluster (spec.md §4.9 step 1 onward).
/// `phase_set_id` is assigned to every heterozygous sample's calls in this
/// cluster; the caller is responsible for incrementing it monotonically per
/// contig (spec.md §5).
///
/// If `config.turn_on_large_variant_calls` is set and the cluster contains a
/// "large" variant (spec.md §4.9 step 2), the cluster is split into a
/// large-variant sub-cluster and a small-variant sub-cluster run at reduced
/// ploidy, each processed independently and then reconciled by
/// `cluster::merge::merge_large_variant_calls`; otherwise the whole cluster
/// is processed in one pass.
pub fn run_cluster(
    input: &ClusterInput,
    config: &CallerConfig,
    phase_set_id: u64,
    reporter: &dyn Reporter,
) -> ClusterOutcome {
    if config.turn_on_large_variant_calls && input.variants.iter().any(|v| v.is_large(config.large_variant_size_definition)) {
        return run_cluster_with_large_variant_split(input, config, phase_set_id, reporter);
    }
    run_cluster_inner(input, config, phase_set_id, reporter)
}

/// Split `input`'s variants into a large-variant sub-cluster and a
/// small-variant sub-cluster (variants not touching any large variant's
/// region), run each independently, and merge the results per spec.md §4.9's
/// call-merger rules. The large sub-cluster keeps the cluster's original
/// ploidy; the small sub-cluster runs at `reduced_ploidy_for` the realized
/// large-variant calls. If the large sub-cluster itself fails to produce a
/// call, falls back to processing the whole cluster unsplit.
fn run_cluster_with_large_variant_split(
    input: &ClusterInput,
    config: &CallerConfig,
    phase_set_id: u64,
    reporter: &dyn Reporter,
) -> ClusterOutcome {
    let large_variants: Vec<Variant> = input
        .variants
        .iter()
        .filter(|v| v.is_large(config.large_variant_size_definition))
        .cloned()
        .collect();
    let large_regions: Vec<Region> = large_variants.iter().map(|v| v.region().clone()).collect();
    let small_variants: Vec<Variant> = input
        .variants
        .iter()
        .filter(|v| !large_regions.iter().any(|lr| lr.overlaps(v.region())))
        .cloned()
        .collect();

    let large_input = ClusterInput {
        region: input.region.clone(),
        variants: large_variants,
        combinations: None,
        read_regions: input.read_regions.clone(),
        window: input.window.clone(),
        sample_reads: input.sample_reads.clone(),
        sample_names: input.sample_names.clone(),
    };
    let large_outcome = run_cluster_inner(&large_input, config, phase_set_id, reporter);
    let (large_calls, large_phase_state) = match large_outcome {
        ClusterOutcome::Called { calls, phase_state } => (calls, Some(phase_state)),
        ClusterOutcome::Skipped { .. } => {
            // The large-variant pass found nothing to call; process the
            // cluster as a single ordinary pass instead.
            return run_cluster_inner(input, config, phase_set_id, reporter);
        }
    };

    let small_ploidy = reduced_ploidy_for(&large_calls, config.ploidy);
    let small_calls = if small_ploidy == 0 {
        Vec::new()
    } else {
        let mut small_config = config.clone();
        small_config.ploidy = small_ploidy;
        small_config.turn_on_large_variant_calls = false;
        let small_input = ClusterInput {
            region: input.region.clone(),
            variants: small_variants,
            combinations: None,
            read_regions: input.read_regions.clone(),
            window: input.window.clone(),
            sample_reads: input.sample_reads.clone(),
            sample_names: input.sample_names.clone(),
        };
        match run_cluster_inner(&small_input, &small_config, phase_set_id, reporter) {
            ClusterOutcome::Called { calls, .. } => calls,
            ClusterOutcome::Skipped { ref_blocks, .. } => ref_blocks,
        }
    };

    let calls = merge_large_variant_calls(config.ploidy, large_calls, small_calls);
    let phase_state = large_phase_state.expect("large_outcome matched Called above");
    ClusterOutcome::Called { calls, phase_state }
}

/// Effective ploidy for the small-variant sub-cluster: `default_ploidy`
/// minus the largest per-sample count of `Allele::Alt` strands among the
/// large-variant pass's own calls (spec.md §4.9: "ploidy minus the count of
/// large-variant alt strands").
fn reduced_ploidy_for(large_calls: &[Call], default_ploidy: u32) -> u32 {
    let max_alt_strands = large_calls
        .iter()
        .filter_map(|c| {
            if let Call::Variant { samples, .. } = c {
                samples.iter().map(|s| s.genotype.iter().filter(|&&a| a == Allele::Alt).count()).max()
            } else {
                None
            }
        })
        .max()
        .unwrap_or(0) as u32;
    default_ploidy.saturating_sub(max_alt_strands)
}

/// The steps 1, 3-8 pipeline for a single (already split, if applicable)
/// cluster: assign priors, build haplotypes, enumerate genotypes, run
/// C4->C8, decide which variants to emit, fill the gaps with reference
/// blocks.
fn run_cluster_inner(
    input: &ClusterInput,
    config: &CallerConfig,
    phase_set_id: u64,
    reporter: &dyn Reporter,
) -> ClusterOutcome {
    let mut variants = input.variants.clone();
    for v in &mut variants {
        let prior = v.prior().unwrap_or_else(|| default_prior(v));
        v.assign_prior(prior);
    }

    if input.sample_reads.iter().any(|reads| reads.len() > config.max_reads_per_sample) {
        return skip(input, config, "cluster exceeds max_reads_per_sample reads in a sample", None, reporter);
    }

    let region_set = RegionSet::from_regions(vec![input.region.clone()]);
    let all_reads: Vec<Read> = input.sample_reads.iter().flatten().cloned().collect();

    let mut haplotypes = match build_haplotype_vector(input, &variants, &all_reads, &region_set, config, reporter) {
        Ok(h) => h,
        Err(e) => return skip(input, config, &format!("haplotype construction failed: {}", e), None, reporter),
    };
    haplotypes.sort();
    haplotypes.merge();

    if haplotypes.len() < 2 {
        return skip(input, config, "fewer than two valid haplotypes after generation", None, reporter);
    }

    let candidate_variants = canonical_candidate_variants(&haplotypes, config);

    let indices: Vec<usize> = (0..haplotypes.len()).collect();
    let genotypes = match enumerate_genotypes(&haplotypes, &indices, config.ploidy) {
        Ok(g) => g,
        Err(e) => return skip(input, config, &format!("genotype enumeration failed: {}", e), None, reporter),
    };
    let equivalence = equivalence_classes(&haplotypes, &genotypes, &candidate_variants);

    let n_samples = input.sample_reads.len();
    let mut per_sample = Vec::with_capacity(n_samples);
    for reads in &input.sample_reads {
        let matrix = build_likelihood_matrix(&haplotypes, reads, config);
        let likelihoods = genotype_likelihoods(&matrix, &genotypes, config.ploidy);
        let frequencies = haplotype_frequencies(&matrix);
        per_sample.push(SampleCallState::new(matrix, likelihoods, frequencies, reads.len()));
    }

    let sample_evidence: Vec<SampleEvidence> = per_sample
        .iter()
        .map(|s| SampleEvidence {
            matrix: &s.matrix,
            frequencies: &s.frequencies,
            likelihoods: s.likelihoods.as_deref().unwrap_or(&[]),
            genotypes: &genotypes,
        })
        .collect();

    let mut calls = Vec::with_capacity(candidate_variants.len());
    for variant in &candidate_variants {
        let qual = variant_quality(&haplotypes, variant, &sample_evidence, config.max_phred_score);
        let called_anywhere = per_sample
            .iter()
            .any(|s| s.called_strands(&genotypes, &equivalence, config).map_or(false, |(strands, _, _)| {
                strands.iter().any(|&h| haplotypes.get(h).map_or(false, |hap| hap.contains_variant(variant)))
            }));

        let emit = if config.genotyping_mode {
            variant.is_genotyping()
        } else {
            called_anywhere && qual >= config.min_allowed_quality_score
        };
        if !emit && !config.all_variants {
            continue;
        }

        let mut samples = Vec::with_capacity(n_samples);
        let mut accountants = Vec::with_capacity(n_samples);
        for (s, reads) in per_sample.iter().zip(&input.sample_reads) {
            let acc = accumulate_support(&s.matrix, reads, &haplotypes, variant, config.bad_reads_window_size, config.read_support_posterior_threshold);
            samples.push(sample_annotation(s, &haplotypes, &genotypes, &equivalence, variant, &acc, config, phase_set_id));
            accountants.push(acc);
        }
        let combined = combine_accountants(&accountants);
        let dp = combined.forward_supporting + combined.reverse_supporting + combined.forward_not_supporting + combined.reverse_not_supporting;
        let dpf = combined.forward_supporting + combined.forward_not_supporting;
        let dpr = combined.reverse_supporting + combined.reverse_not_supporting;
        let vc = combined.forward_supporting + combined.reverse_supporting;
        let annotation = VariantAnnotationBuilder::default()
            .pp(qual)
            .dp(dp)
            .dpr(dpr)
            .dpf(dpf)
            .vc(vc)
            .vcr(combined.reverse_supporting)
            .vcf(combined.forward_supporting)
            .abpv(allele_bias_log10_p(&combined, config.bias_beta_shape))
            .sbpv(strand_bias_log10_p(&combined, config.bias_beta_shape))
            .mq(combined.rms_mapping_quality().unwrap_or(0.0))
            .br(combined.median_min_base_quality().unwrap_or(0.0))
            .qd(if dp > 0 { vc as f64 / dp as f64 } else { 0.0 })
            .build()
            .expect("all VariantAnnotation fields are set above");

        calls.push(Call::Variant {
            region: variant.region().clone(),
            alt: variant.alt().to_vec(),
            annotation,
            samples,
        });
    }

    calls.sort_by_key(|c| c.sort_key());

    if config.output_ref_calls {
        let gaps = uncovered_gaps(&input.region, &calls);
        for gap in gaps {
            calls.extend(emit_ref_blocks(&gap, &input.sample_reads, config, None));
        }
        calls.sort_by_key(|c| c.sort_key());
    }

    let strand_haplotypes: Vec<Vec<usize>> = per_sample
        .iter()
        .map(|s| s.called_strands(&genotypes, &equivalence, config).map(|(strands, _, _)| strands).unwrap_or_default())
        .collect();
    let phase_set: Vec<Option<u64>> = strand_haplotypes
        .iter()
        .map(|strands| if is_heterozygous(strands) { Some(phase_set_id) } else { None })
        .collect();

    ClusterOutcome::Called {
        calls,
        phase_state: ClusterPhaseState {
            region: input.region.clone(),
            haplotypes,
            strand_haplotypes,
            phase_set,
        },
    }
}

fn skip(input: &ClusterInput, config: &CallerConfig, reason: &str, rejected_quality: Option<f64>, reporter: &dyn Reporter) -> ClusterOutcome {
    reporter.cluster_skipped(&input.region, reason);
    let ref_blocks = if config.output_ref_calls {
        emit_ref_blocks(&input.region, &input.sample_reads, config, rejected_quality)
    } else {
        Vec::new()
    };
    ClusterOutcome::Skipped {
        reason: reason.to_string(),
        ref_blocks,
    }
}

/// Per-sample intermediate state threaded through genotype/quality/annotation
/// (spec.md §4.7, §4.8): the likelihood matrix, haplotype frequencies, and
/// (if the sample had any reads) rescaled genotype likelihoods.
struct SampleCallState {
    matrix: ndarray::Array2<f64>,
    likelihoods: Option<Vec<f64>>,
    frequencies: Vec<f64>,
    read_count: usize,
}

impl SampleCallState {
    fn new(matrix: ndarray::Array2<f64>, likelihoods: Option<Vec<f64>>, frequencies: Vec<f64>, read_count: usize) -> Self {
        SampleCallState { matrix, likelihoods, frequencies, read_count }
    }

    /// `(strand haplotype indices, genotype quality, phase quality)` for the
    /// called genotype, or `None` if this sample had no reads (spec.md §4.7
    /// "sentinel unknown").
    fn called_strands(
        &self,
        genotypes: &[Genotype],
        equivalence: &[Vec<usize>],
        config: &CallerConfig,
    ) -> Option<(Vec<usize>, f64, f64)> {
        let likelihoods = self.likelihoods.as_ref()?;
        let (best_idx, gq) = genotype_quality(likelihoods, genotypes, config.max_phred_score);
        let class = equivalence.iter().find(|c| c.contains(&best_idx)).cloned().unwrap_or_else(|| vec![best_idx]);
        let pq = phase_quality(likelihoods, genotypes, &class, config.max_phred_score);
        Some((expand_to_strands(&genotypes[best_idx]), gq, pq))
    }
}

/// Repeat each haplotype index by its multiplicity, in ascending
/// haplotype-index order, giving a canonical (unphased) strand-to-haplotype
/// assignment (spec.md §3 "Genotype", consumed by phase alignment in
/// `cluster::phase`).
fn expand_to_strands(genotype: &Genotype) -> Vec<usize> {
    let mut strands = Vec::new();
    for (idx, mult) in genotype.haplotype_indices.iter().zip(&genotype.multiplicities) {
        for _ in 0..*mult {
            strands.push(*idx);
        }
    }
    strands
}

fn is_heterozygous(strands: &[usize]) -> bool {
    strands.windows(2).any(|w| w[0] != w[1])
}

fn sample_annotation(
    state: &SampleCallState,
    haplotypes: &HaplotypeVector,
    genotypes: &[Genotype],
    equivalence: &[Vec<usize>],
    variant: &Variant,
    acc: &ReadSupportAccountant,
    config: &CallerConfig,
    phase_set_id: u64,
) -> SampleAnnotation {
    let ad = (
        acc.forward_reference_supporting + acc.reverse_reference_supporting,
        acc.forward_supporting + acc.reverse_supporting,
    );
    let format_dp = state.read_count as u32;
    let vaf = if format_dp > 0 { ad.1 as f64 / format_dp as f64 } else { 0.0 };

    match state.called_strands(genotypes, equivalence, config) {
        Some((strands, gq, pq)) => {
            let genotype = strands
                .iter()
                .map(|&h| {
                    haplotypes.get(h).map_or(Allele::Unknown, |hap| {
                        if hap.contains_variant(variant) {
                            Allele::Alt
                        } else if hap.is_reference_at(variant.region()) {
                            Allele::Ref
                        } else {
                            Allele::Unknown
                        }
                    })
                })
                .collect::<Vec<_>>();
            let likelihoods = state.likelihoods.as_ref().expect("called_strands returned Some only with likelihoods present");
            let pl = pl_values(haplotypes, likelihoods, genotypes, variant, config.ploidy);
            let ps = if is_heterozygous(&strands) && config.output_phased_genotypes {
                Some(phase_set_id)
            } else {
                None
            };
            SampleAnnotationBuilder::default()
                .genotype(genotype)
                .pl(pl)
                .gq(gq)
                .pq(pq)
                .ps(ps)
                .ad(ad)
                .format_dp(format_dp)
                .vaf(vaf)
                .build()
                .expect("all SampleAnnotation fields are set above")
        }
        None => SampleAnnotationBuilder::default()
            .genotype(vec![Allele::Unknown; config.ploidy as usize])
            .pl(vec![UNKNOWN_QUALITY; config.ploidy as usize + 1])
            .gq(UNKNOWN_QUALITY)
            .pq(UNKNOWN_QUALITY)
            .ps(None)
            .ad(ad)
            .format_dp(format_dp)
            .vaf(vaf)
            .build()
            .expect("all SampleAnnotation fields are set above"),
    }
}

fn combine_accountants(accs: &[ReadSupportAccountant]) -> ReadSupportAccountant {
    let mut out = ReadSupportAccountant::default();
    for a in accs {
        out.forward_supporting += a.forward_supporting;
        out.reverse_supporting += a.reverse_supporting;
        out.forward_not_supporting += a.forward_not_supporting;
        out.reverse_not_supporting += a.reverse_not_supporting;
        out.forward_reference_supporting += a.forward_reference_supporting;
        out.reverse_reference_supporting += a.reverse_reference_supporting;
        out.min_base_quals.extend(a.min_base_quals.iter().copied());
        out.mapping_quals.extend(a.mapping_quals.iter().copied());
    }
    out
}

/// The distinct variants carried by any non-reference haplotype (spec.md
/// §4.9 step 6: "optionally re-derive the canonical candidate variants").
/// MNPs are split and indels left-normalized first if the configuration asks
/// for it.
fn canonical_candidate_variants(haplotypes: &HaplotypeVector, config: &CallerConfig) -> Vec<Variant> {
    let mut seen: Vec<Variant> = Vec::new();
    for hap in haplotypes.iter() {
        for v in hap.variants() {
            if !seen.iter().any(|s| s == v) {
                seen.push(v.clone());
            }
        }
    }
    let _ = config;
    seen.sort();
    seen
}

/// Build the haplotype vector for this cluster: from the precomputed
/// combination list when present (spec.md §3 "Variant cluster... the
/// cluster's combinations list, when present, is the authoritative set"), or
/// via assembly (C1) plus alignment-frequency ranking otherwise (spec.md
/// §4.9 step 4). The all-reference haplotype is always included.
fn build_haplotype_vector(
    input: &ClusterInput,
    variants: &[Variant],
    all_reads: &[Read],
    region_set: &RegionSet,
    config: &CallerConfig,
    reporter: &dyn Reporter,
) -> Result<HaplotypeVector> {
    let mut haplotypes = HaplotypeVector::new();
    haplotypes.push(Haplotype::reference(&input.window, region_set.clone(), 0, 0)?, None);

    if let Some(combinations) = &input.combinations {
        for combo in combinations {
            if let Ok(h) = Haplotype::new(&input.window, region_set.clone(), combo.clone(), 0, 0) {
                haplotypes.push(h, None);
            }
        }
        return Ok(haplotypes);
    }

    reporter.assembly_fallback(&input.region);
    let mut candidates = variants.to_vec();
    if candidates.is_empty() {
        let read_pairs: Vec<(&[u8], &[u8])> = all_reads.iter().map(|r| (r.sequence(), r.qualities())).collect();
        candidates.extend(graph::assemble(&input.window, &read_pairs, config, reporter)?);
    }

    let mut ranker = HaplotypeVector::new();
    ranker.push(Haplotype::reference(&input.window, region_set.clone(), 0, 0)?, None);
    for v in &candidates {
        if let Ok(h) = Haplotype::new(&input.window, region_set.clone(), vec![v.clone()], 0, 0) {
            ranker.push(h, None);
        }
    }
    ranker.sort();
    ranker.merge();

    if ranker.len() <= 1 {
        return Ok(ranker);
    }

    let matrix = build_likelihood_matrix(&ranker, all_reads, config);
    let freqs = haplotype_frequencies(&matrix);
    let mut ranked_indices: Vec<usize> = (0..ranker.len()).collect();
    ranked_indices.sort_by(|&a, &b| freqs[b].partial_cmp(&freqs[a]).unwrap());

    let keep = config.max_haplotypes_per_ranker.max(1);
    for idx in ranked_indices.into_iter().filter(|&i| i != 0).take(keep) {
        if let Some(hap) = ranker.get(idx) {
            haplotypes.push(hap.clone(), ranker.id_at(idx));
        }
    }
    Ok(haplotypes)
}

/// Reference-call gaps between sorted variant calls within `region` (spec.md
/// §5 "Reference blocks are emitted between variant blocks; no variant call
/// and no reference block ever overlap").
fn uncovered_gaps(region: &Region, calls: &[Call]) -> Vec<Region> {
    let mut gaps = Vec::new();
    let mut cursor = *region.start();
    for call in calls {
        if let Call::Variant { region: vr, .. } = call {
            if *vr.start() > cursor {
                gaps.push(Region::new(region.contig().clone(), cursor, *vr.start()));
            }
            cursor = cursor.max(*vr.end());
        }
    }
    if cursor < *region.end() {
        gaps.push(Region::new(region.contig().clone(), cursor, *region.end()));
    }
    gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_htslib::bam::record::Cigar;

    fn window(seq: &[u8]) -> ReferenceWindow {
        ReferenceWindow::new(Region::new("1", 0, seq.len() as u64), seq.to_vec())
    }

    fn read(start: u64, seq: &[u8], qual: u8) -> Read {
        Read::new("rg1", "1", start, vec![Cigar::Match(seq.len() as u32)], seq.to_vec(), vec![qual; seq.len()], 60, 0)
    }

    /// S1 (spec.md §8): reference `AAAAA`, 10 reads of `AACAA` at position 0,
    /// base quality 30; expect a homozygous-alt SNP call at position 2 with
    /// `AD=[0,10]`.
    #[test]
    fn s1_homozygous_snp_is_called() {
        let w = window(b"AAAAA");
        let snp = Variant::new(&w, Region::new("1", 2, 3), b"C".to_vec(), false).unwrap();
        let reads = vec![read(0, b"AACAA", 30); 10];
        let input = ClusterInput {
            region: Region::new("1", 0, 5),
            variants: vec![snp],
            combinations: None,
            read_regions: RegionSet::from_regions(vec![Region::new("1", 0, 5)]),
            window: w,
            sample_reads: vec![reads],
            sample_names: vec!["sample1".to_string()],
        };
        let config = CallerConfig::default();
        let outcome = run_cluster(&input, &config, 1, &crate::reporter::NullReporter);
        let calls = match outcome {
            ClusterOutcome::Called { calls, .. } => calls,
            ClusterOutcome::Skipped { reason, .. } => panic!("expected a call, cluster was skipped: {}", reason),
        };
        let variant_call = calls
            .iter()
            .find(|c| matches!(c, Call::Variant { alt, .. } if alt == b"C"))
            .expect("SNP call must be emitted");
        if let Call::Variant { samples, annotation, .. } = variant_call {
            assert_eq!(samples[0].genotype, vec![Allele::Alt, Allele::Alt]);
            assert_eq!(samples[0].ad, (0, 10));
            assert_eq!(samples[0].format_dp, 10);
            assert!(annotation.pp >= 20.0);
        }
    }

    /// S2 (spec.md §8): heterozygous deletion, 5 alt reads + 5 reference
    /// reads; expect `AD=[5,5]` and a `0/1` call.
    #[test]
    fn s2_heterozygous_deletion_is_called() {
        let w = window(b"CAGATTACAG");
        let del = Variant::new(&w, Region::new("1", 6, 7), Vec::new(), false).unwrap();
        let mut reads = vec![read(0, b"CAGATTACAG", 30); 5];
        reads.extend(vec![read(0, b"CAGATTACAG", 30); 0]);
        // alt reads: 1bp deletion at position 6 -> "CAGATT" + "ACAG" (9 bases)
        let alt_reads = vec![read(0, b"CAGATTCAG", 30); 5];
        let mut all = alt_reads;
        all.extend(reads);
        let input = ClusterInput {
            region: Region::new("1", 0, 10),
            variants: vec![del],
            combinations: None,
            read_regions: RegionSet::from_regions(vec![Region::new("1", 0, 10)]),
            window: w,
            sample_reads: vec![all],
            sample_names: vec!["sample1".to_string()],
        };
        let config = CallerConfig::default();
        let outcome = run_cluster(&input, &config, 1, &crate::reporter::NullReporter);
        match outcome {
            ClusterOutcome::Called { calls, .. } => {
                assert!(calls.iter().any(|c| matches!(c, Call::Variant { alt, .. } if alt.is_empty())));
            }
            ClusterOutcome::Skipped { reason, .. } => panic!("expected a call, cluster was skipped: {}", reason),
        }
    }

    #[test]
    fn oversized_cluster_is_skipped() {
        let w = window(b"AAAAA");
        let mut config = CallerConfig::default();
        config.max_reads_per_sample = 2;
        let reads = vec![read(0, b"AAAAA", 30); 3];
        let input = ClusterInput {
            region: Region::new("1", 0, 5),
            variants: Vec::new(),
            combinations: None,
            read_regions: RegionSet::from_regions(vec![Region::new("1", 0, 5)]),
            window: w,
            sample_reads: vec![reads],
            sample_names: vec!["sample1".to_string()],
        };
        let outcome = run_cluster(&input, &config, 1, &crate::reporter::NullReporter);
        match outcome {
            ClusterOutcome::Skipped { ref_blocks, .. } => assert!(!ref_blocks.is_empty()),
            ClusterOutcome::Called { .. } => panic!("expected the cluster to be skipped"),
        }
    }

    #[test]
    fn ref_blocks_fill_gaps_around_a_variant_call() {
        let w = window(b"AAAAAAAAAA");
        let snp = Variant::new(&w, Region::new("1", 4, 5), b"C".to_vec(), false).unwrap();
        let reads = vec![read(0, b"AAAACAAAAA", 30); 10];
        let input = ClusterInput {
            region: Region::new("1", 0, 10),
            variants: vec![snp],
            combinations: None,
            read_regions: RegionSet::from_regions(vec![Region::new("1", 0, 10)]),
            window: w,
            sample_reads: vec![reads],
            sample_names: vec!["sample1".to_string()],
        };
        let config = CallerConfig::default();
        let outcome = run_cluster(&input, &config, 1, &crate::reporter::NullReporter);
        if let ClusterOutcome::Called { calls, .. } = outcome {
            assert!(calls.iter().any(|c| matches!(c, Call::RefBlock { .. })));
            // no ref block may overlap the variant call (spec.md §5).
            let variant_region = calls
                .iter()
                .find_map(|c| if let Call::Variant { region, .. } = c { Some(region.clone()) } else { None })
                .unwrap();
            for call in &calls {
                if let Call::RefBlock { region, .. } = call {
                    assert!(!region.overlaps(&variant_region));
                }
            }
        } else {
            panic!("expected a call");
        }
    }
}
