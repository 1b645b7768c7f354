// K-mer sequence graph and assembly (spec.md §4.1, component C1).
//
// Grounded on `examples/original_source/cpp/src/assembly/sequenceGraph.{hpp,cpp}`
// and `.../assembly/node.{hpp,cpp}`. The arena-of-indices pattern replacing the
// original's weak-pointer cycles is in `node.rs`; chain and path enumeration
// follow in `chain.rs` / `path.rs`.

pub mod chain;
pub mod node;
pub mod path;

use crate::config::CallerConfig;
use crate::errors::Result;
use crate::graph::node::{AddOutcome, SequenceGraph};
use crate::reference::ReferenceWindow;
use crate::reporter::Reporter;
use crate::variant::Variant;

/// Assemble candidate alt variants for `window` from `reads` (grounded on
/// spec.md §4.1's control flow: "Kmer-size escalation", "Failure modes",
/// "Emitting variants from a path").
///
/// `reads` is `(sequence, base_qualities)` pairs; short reads are silently
/// skipped (spec.md: "A read shorter than k is skipped").
pub fn assemble(
    window: &ReferenceWindow,
    reads: &[(&[u8], &[u8])],
    config: &CallerConfig,
    reporter: &dyn Reporter,
) -> Result<Vec<Variant>> {
    let mut k = config.kmer_size;
    loop {
        let mut graph = SequenceGraph::new(k);
        let ref_outcome = graph.add_sequence(
            window.bases(),
            None,
            config.min_edge_base_quality,
            Some(*window.region().start()),
            false,
        )?;
        let mut repeat_found = matches!(ref_outcome, AddOutcome::Added { has_repeat: true });

        for (seq, quals) in reads {
            let outcome = graph.add_sequence(seq, Some(quals), config.min_edge_base_quality, None, true)?;
            if let AddOutcome::Added { has_repeat: true } = outcome {
                repeat_found = true;
            }
        }

        if !repeat_found || k >= config.max_kmer_size {
            let chains = chain::find_chains(&graph);
            let paths = path::paths_between_ref_nodes(
                &graph,
                &chains,
                config.min_support as u32,
                config.max_paths_per_endpoint,
            );
            let mut variants = Vec::new();
            for p in &paths {
                if let Some(v) = path::variant_from_path(window, &graph, &chains, p)? {
                    variants.push(v);
                }
            }
            return Ok(variants);
        }

        let next_k = (k + config.kmer_size_increment).min(config.max_kmer_size);
        reporter.kmer_escalated(window.region(), k, next_k);
        k = next_k;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Region;
    use crate::reporter::NullReporter;

    #[test]
    fn assemble_finds_a_snp_bubble() {
        let ref_seq = b"AAACCCGGG";
        let window = ReferenceWindow::new(Region::new("1", 100, 109), ref_seq.to_vec());
        let mut config = CallerConfig::default();
        config.kmer_size = 3;
        config.min_support = 1;
        let reads: Vec<(&[u8], &[u8])> = vec![(b"AAACTCGGG", &[40u8; 9])];
        let variants = assemble(&window, &reads, &config, &NullReporter).unwrap();
        assert!(variants.iter().any(|v| v.alt() == b"T"));
    }

    #[test]
    fn assemble_with_no_reads_finds_nothing() {
        let ref_seq = b"AAACCCGGG";
        let window = ReferenceWindow::new(Region::new("1", 100, 109), ref_seq.to_vec());
        let mut config = CallerConfig::default();
        config.kmer_size = 3;
        let variants = assemble(&window, &[], &config, &NullReporter).unwrap();
        assert!(variants.is_empty());
    }
}
