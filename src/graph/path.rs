// Paths between reference nodes and variant emission (spec.md §4.1).
//
// The reference comment in the original engine's `getPathsBetweenRefNodes`
// does not explain why its node queue is a max-heap keyed by the current
// k-mer sequence (spec.md §9 Open Questions); this keeps that ordering
// (`BinaryHeap` is a max-heap in Rust, so deriving `Ord` on the candidate's
// accumulated sequence reproduces it directly) until a reference test shows
// otherwise.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::errors::Result;
use crate::graph::chain::Chain;
use crate::graph::node::{NodeIdx, SequenceGraph};
use crate::reference::ReferenceWindow;
use crate::region::Region;
use crate::variant::Variant;

/// One accumulated walk from a reference node, through zero or more alt-to-alt
/// chains, back to a (possibly different) reference node.
#[derive(Clone, Debug)]
pub struct Path {
    pub chain_indices: Vec<usize>,
    pub sequence: Vec<u8>,
    /// Aggregate support: the minimum per-chain max-edge-support along the
    /// path (spec.md §4.1 "min over repeated-chain adjusted maxima").
    pub support: u32,
}

struct Candidate {
    chain_indices: Vec<usize>,
    sequence: Vec<u8>,
    support: u32,
    end_node: NodeIdx,
    complete: bool,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
    }
}
impl Eq for Candidate {}
impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sequence.cmp(&other.sequence)
    }
}

/// A hard cap on queue pops per starting endpoint, protecting against
/// pathologically tangled graphs (e.g. long homopolymer runs) where the
/// alt-to-alt expansion would otherwise not terminate in reasonable time.
const MAX_EXPANSIONS_PER_ENDPOINT: usize = 20_000;

/// Best-first search over alt-to-alt chains from every chain whose first node
/// is a reference node, accumulating up to `max_paths_per_endpoint` distinct
/// paths per starting reference node, each meeting `min_support` (spec.md
/// §4.1 "Paths between reference nodes").
pub fn paths_between_ref_nodes(
    graph: &SequenceGraph,
    chains: &[Chain],
    min_support: u32,
    max_paths_per_endpoint: usize,
) -> Vec<Path> {
    let mut by_start: HashMap<NodeIdx, Vec<usize>> = HashMap::new();
    for (i, c) in chains.iter().enumerate() {
        by_start.entry(c.start()).or_default().push(i);
    }

    let mut starting_endpoints: HashMap<NodeIdx, Vec<usize>> = HashMap::new();
    for (i, c) in chains.iter().enumerate() {
        if graph.node(c.start()).is_reference() {
            starting_endpoints.entry(c.start()).or_default().push(i);
        }
    }

    let mut all_paths = Vec::new();
    for (_, start_chains) in starting_endpoints {
        let mut heap: BinaryHeap<Candidate> = BinaryHeap::new();
        for &ci in &start_chains {
            let c = &chains[ci];
            heap.push(Candidate {
                chain_indices: vec![ci],
                sequence: c.sequence.clone(),
                support: if c.nodes.len() > 1 { c.support } else { 0 },
                end_node: c.end(),
                complete: graph.node(c.end()).is_reference(),
            });
        }

        let mut found = Vec::new();
        let mut expansions = 0;
        while let Some(candidate) = heap.pop() {
            expansions += 1;
            if expansions > MAX_EXPANSIONS_PER_ENDPOINT {
                break;
            }
            if candidate.complete {
                if candidate.support >= min_support {
                    found.push(Path {
                        chain_indices: candidate.chain_indices,
                        sequence: candidate.sequence,
                        support: candidate.support,
                    });
                    if found.len() >= max_paths_per_endpoint {
                        break;
                    }
                }
                continue;
            }
            if let Some(next_chain_idxs) = by_start.get(&candidate.end_node) {
                for &ni in next_chain_idxs {
                    if candidate.chain_indices.contains(&ni) {
                        continue; // no revisiting a chain within one path
                    }
                    let nc = &chains[ni];
                    let leads_to_ref = graph.node(nc.end()).is_reference();
                    if !nc.is_alt_sequence && !leads_to_ref {
                        continue; // must stay on alt-to-alt chains
                    }
                    let mut sequence = candidate.sequence.clone();
                    sequence.extend_from_slice(&nc.sequence[graph.k()..]);
                    let mut chain_indices = candidate.chain_indices.clone();
                    chain_indices.push(ni);
                    let support = if nc.nodes.len() > 1 {
                        candidate.support.min(nc.support)
                    } else {
                        candidate.support
                    };
                    heap.push(Candidate {
                        chain_indices,
                        sequence,
                        support,
                        end_node: nc.end(),
                        complete: leads_to_ref,
                    });
                }
            }
        }
        all_paths.extend(found);
    }
    all_paths
}

/// Turn a path into a candidate variant: the reference sub-interval spans the
/// endpoint nodes' reference positions, extended by `k` to cover the final
/// k-mer; the raw variant is then trimmed and left-aligned (spec.md §4.1
/// "Emitting variants from a path"). Returns `None` if trimming empties it.
pub fn variant_from_path(
    window: &ReferenceWindow,
    graph: &SequenceGraph,
    chains: &[Chain],
    path: &Path,
) -> Result<Option<Variant>> {
    let start_node = chains[path.chain_indices[0]].start();
    let end_node = chains[*path.chain_indices.last().unwrap()].end();
    let start_pos = *graph
        .node(start_node)
        .ref_positions
        .iter()
        .min()
        .expect("path start node must be a reference node");
    let end_pos = *graph
        .node(end_node)
        .ref_positions
        .iter()
        .min()
        .expect("path end node must be a reference node");

    let region = Region::new(window.region().contig().clone(), start_pos, end_pos + graph.k() as u64);
    let raw = Variant::new(window, region, path.sequence.clone(), false)?;
    let trimmed = raw.trimmed(window)?;
    if trimmed.is_empty_after_trim() {
        return Ok(None);
    }
    Ok(Some(trimmed.left_aligned(window, None)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::chain::find_chains;

    #[test]
    fn simple_bubble_yields_one_variant() {
        let k = 3;
        let mut g = SequenceGraph::new(k);
        // reference: AAA CCC GGG ; alt read carries a SNP in the middle base.
        let ref_seq = b"AAACCCGGG";
        let window = ReferenceWindow::new(Region::new("1", 100, 109), ref_seq.to_vec());
        g.add_sequence(ref_seq, None, 20, Some(100), false).unwrap();
        for _ in 0..5 {
            g.add_sequence(b"AAACTCGGG", Some(&[40u8; 9]), 20, None, true).unwrap();
        }
        let chains = find_chains(&g);
        let paths = paths_between_ref_nodes(&g, &chains, 1, 20);
        assert!(!paths.is_empty());
        let mut found_variant = false;
        for p in &paths {
            if let Some(v) = variant_from_path(&window, &g, &chains, p).unwrap() {
                assert_eq!(v.alt(), b"T");
                found_variant = true;
            }
        }
        assert!(found_variant);
    }

    #[test]
    fn paths_below_min_support_are_dropped() {
        let k = 3;
        let mut g = SequenceGraph::new(k);
        let ref_seq = b"AAACCCGGG";
        g.add_sequence(ref_seq, None, 20, Some(100), false).unwrap();
        g.add_sequence(b"AAACTCGGG", Some(&[40u8; 9]), 20, None, true).unwrap();
        let chains = find_chains(&g);
        let paths = paths_between_ref_nodes(&g, &chains, 1000, 20);
        assert!(paths.is_empty());
    }
}
