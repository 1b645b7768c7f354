// Arena-backed k-mer graph nodes (spec.md §4.1 C1).
//
// The original engine stores outgoing edges as weak back-pointers with an
// admitted unsafe-iterator hazard (DESIGN NOTES). Here the arena is
// `petgraph::graph::DiGraph`: nodes are owned by the graph and referenced by
// `NodeIndex`, a plain integer handle, which removes the dangling-pointer
// hazard entirely — "weak" reference-position lookups just become `NodeIndex`
// lookups through the arena.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, EdgeReference, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::errors::{Error, Result};

pub type NodeIdx = NodeIndex<u32>;

/// Per-node bookkeeping: the k-mer itself (first/last character are the
/// fields the spec calls out explicitly; the full string is kept alongside
/// them so chains/paths can reconstruct exact sequence without a reverse
/// lookup through the arena's index), the set of characters seen entering
/// this node, and the reference positions (if any) at which this k-mer
/// occurs on the reference strand.
#[derive(Clone, Debug, Default)]
pub struct NodeData {
    pub kmer: Vec<u8>,
    pub incoming_bases: HashSet<u8>,
    pub ref_positions: Vec<u64>,
}

impl NodeData {
    pub fn first(&self) -> u8 {
        self.kmer[0]
    }

    pub fn last(&self) -> u8 {
        *self.kmer.last().unwrap()
    }

    pub fn is_reference(&self) -> bool {
        !self.ref_positions.is_empty()
    }
}

/// Edge weight: the incoming base and its support (spec.md §4.1: "max base
/// quality of the incoming base across observations, clipped to 0 if below
/// a configured minimum base quality").
#[derive(Clone, Copy, Debug)]
pub struct EdgeData {
    pub base: u8,
    pub support: u32,
}

/// Outcome of adding one sequence to the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddOutcome {
    /// The sequence was folded into the graph; `has_repeat` is set if the
    /// same node was encountered twice (read) or at a different reference
    /// position than previously recorded (reference).
    Added { has_repeat: bool },
    /// The sequence was shorter than `k` and contributed nothing (reads
    /// only; spec.md §4.1 "A read shorter than k is skipped").
    TooShort,
}

pub struct SequenceGraph {
    k: usize,
    graph: DiGraph<NodeData, EdgeData>,
    index: HashMap<Vec<u8>, NodeIdx>,
}

impl SequenceGraph {
    pub fn new(k: usize) -> Self {
        SequenceGraph {
            k,
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn graph(&self) -> &DiGraph<NodeData, EdgeData> {
        &self.graph
    }

    pub fn node(&self, idx: NodeIdx) -> &NodeData {
        &self.graph[idx]
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.graph.node_indices()
    }

    pub fn in_degree(&self, idx: NodeIdx) -> usize {
        self.graph.edges_directed(idx, Direction::Incoming).count()
    }

    pub fn out_degree(&self, idx: NodeIdx) -> usize {
        self.graph.edges_directed(idx, Direction::Outgoing).count()
    }

    /// A node is a branch node iff it does not have exactly one predecessor
    /// and exactly one successor; terminal nodes (in- or out-degree 0)
    /// satisfy this trivially (spec.md §4.1).
    pub fn is_branch(&self, idx: NodeIdx) -> bool {
        self.in_degree(idx) != 1 || self.out_degree(idx) != 1
    }

    pub fn outgoing(&self, idx: NodeIdx) -> impl Iterator<Item = EdgeReference<EdgeData>> + '_ {
        self.graph.edges_directed(idx, Direction::Outgoing)
    }

    pub fn single_successor(&self, idx: NodeIdx) -> Option<(NodeIdx, EdgeData)> {
        let mut edges = self.outgoing(idx);
        let e = edges.next()?;
        if edges.next().is_some() {
            return None;
        }
        Some((e.target(), *e.weight()))
    }

    fn node_index_for(&mut self, kmer: &[u8]) -> NodeIdx {
        if let Some(&idx) = self.index.get(kmer) {
            return idx;
        }
        let data = NodeData {
            kmer: kmer.to_vec(),
            incoming_bases: HashSet::new(),
            ref_positions: Vec::new(),
        };
        let idx = self.graph.add_node(data);
        self.index.insert(kmer.to_vec(), idx);
        idx
    }

    fn add_or_bump_edge(&mut self, from: NodeIdx, to: NodeIdx, base: u8, support: u32) {
        if let Some(edge) = self
            .graph
            .edges_directed(from, Direction::Outgoing)
            .find(|e| e.target() == to && e.weight().base == base)
            .map(|e| e.id())
        {
            let weight = &mut self.graph[edge];
            weight.support = weight.support.max(support);
        } else {
            self.graph.add_edge(from, to, EdgeData { base, support });
        }
        self.graph[to].incoming_bases.insert(base);
    }

    /// Slide a k-mer window over `seq`, creating/joining nodes and updating
    /// edge support (spec.md §4.1 "Adding a sequence"). `quals`, when given,
    /// drives per-edge support as the incoming base's quality, clipped to 0
    /// below `min_edge_base_quality`; reference sequences (no qualities) are
    /// added with maximal synthetic support, since the reference is trusted.
    ///
    /// `ref_start`, when given, additionally records reference positions on
    /// each visited node and reports a repeat when a node already carries a
    /// different reference position (spec.md §4.1 "Adding the reference").
    /// Otherwise (reads), a repeat is any node visited twice within the call;
    /// `disallow_repeats` stops the walk as soon as one is found.
    pub fn add_sequence(
        &mut self,
        seq: &[u8],
        quals: Option<&[u8]>,
        min_edge_base_quality: u8,
        ref_start: Option<u64>,
        disallow_repeats: bool,
    ) -> Result<AddOutcome> {
        if seq.len() < self.k {
            if ref_start.is_some() {
                return Err(Error::ReferenceWindowTooShortForKmer {
                    window_len: seq.len(),
                    kmer_size: self.k,
                });
            }
            return Ok(AddOutcome::TooShort);
        }

        let n_windows = seq.len() - self.k + 1;
        let mut has_repeat = false;
        let mut visited_this_call: HashSet<NodeIdx> = HashSet::new();
        let mut prev_idx: Option<NodeIdx> = None;

        for w in 0..n_windows {
            let kmer = &seq[w..w + self.k];
            let idx = self.node_index_for(kmer);

            if let Some(pos) = ref_start {
                let this_pos = pos + w as u64;
                let data = &mut self.graph[idx];
                if data.ref_positions.iter().any(|&p| p != this_pos) {
                    has_repeat = true;
                }
                if !data.ref_positions.contains(&this_pos) {
                    data.ref_positions.push(this_pos);
                }
            } else if !visited_this_call.insert(idx) {
                has_repeat = true;
                if disallow_repeats {
                    break;
                }
            }

            if let Some(prev) = prev_idx {
                let incoming_base = kmer[kmer.len() - 1];
                let support = if let Some(q) = quals {
                    // the incoming base is the last base of this k-mer, whose
                    // read-space offset is w + k - 1.
                    let qual = q[w + self.k - 1];
                    if qual >= min_edge_base_quality {
                        qual as u32
                    } else {
                        0
                    }
                } else {
                    u8::MAX as u32
                };
                self.add_or_bump_edge(prev, idx, incoming_base, support);
            }
            prev_idx = Some(idx);
        }

        Ok(AddOutcome::Added { has_repeat })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_reference_builds_a_chain() {
        let mut g = SequenceGraph::new(3);
        let outcome = g.add_sequence(b"ACGTAC", None, 20, Some(0), false).unwrap();
        assert_eq!(outcome, AddOutcome::Added { has_repeat: false });
        // 6 - 3 + 1 = 4 k-mer nodes, 3 edges.
        assert_eq!(g.node_count(), 4);
    }

    #[test]
    fn repeated_kmer_on_reference_is_flagged() {
        let mut g = SequenceGraph::new(2);
        // "AT" occurs at two different offsets in "ATAT".
        let outcome = g.add_sequence(b"ATAT", None, 20, Some(100), false).unwrap();
        assert_eq!(outcome, AddOutcome::Added { has_repeat: true });
    }

    #[test]
    fn short_read_is_skipped() {
        let mut g = SequenceGraph::new(5);
        let outcome = g.add_sequence(b"AC", None, 20, None, false).unwrap();
        assert_eq!(outcome, AddOutcome::TooShort);
    }

    #[test]
    fn short_reference_is_an_error() {
        let mut g = SequenceGraph::new(5);
        let result = g.add_sequence(b"AC", None, 20, Some(0), false);
        assert!(result.is_err());
    }

    #[test]
    fn low_quality_edge_is_clipped_to_zero_support() {
        let mut g = SequenceGraph::new(3);
        g.add_sequence(b"ACGT", Some(&[30, 30, 5, 30]), 20, None, false).unwrap();
        let from = g.node_index_for(b"ACG");
        let (_, edge) = g.single_successor(from).unwrap();
        assert_eq!(edge.support, 0);
    }
}
