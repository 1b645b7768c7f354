// Maximal walks between branch nodes (spec.md §4.1 "Chains").

use crate::graph::node::{NodeIdx, SequenceGraph};

/// A maximal walk `n_0 .. n_m` where `n_0`/`n_m` are branch (or terminal)
/// nodes and every interior node is regular (in-degree 1, out-degree 1).
#[derive(Clone, Debug)]
pub struct Chain {
    pub nodes: Vec<NodeIdx>,
    /// Max edge support along the chain; 0 for a single-node chain.
    pub support: u32,
    /// Start k-mer concatenated with the last character of every successive
    /// node (spec.md §4.1).
    pub sequence: Vec<u8>,
    /// Neither endpoint is terminal and no interior node is a reference node.
    pub is_alt_sequence: bool,
}

impl Chain {
    pub fn start(&self) -> NodeIdx {
        *self.nodes.first().unwrap()
    }

    pub fn end(&self) -> NodeIdx {
        *self.nodes.last().unwrap()
    }
}

/// Enumerate all chains in `graph`: for every branch/terminal node, walk
/// forward along each outgoing edge through regular interior nodes until the
/// next branch/terminal node is reached.
pub fn find_chains(graph: &SequenceGraph) -> Vec<Chain> {
    let mut chains = Vec::new();
    for start in graph.node_indices() {
        if !graph.is_branch(start) {
            continue;
        }
        for edge in graph.outgoing(start) {
            let mut nodes = vec![start];
            let mut support = edge.weight().support;
            let mut current = edge.target();
            nodes.push(current);
            while !graph.is_branch(current) {
                let (next, edge_data) = graph
                    .single_successor(current)
                    .expect("regular interior node must have exactly one successor");
                support = support.max(edge_data.support);
                current = next;
                nodes.push(current);
            }
            chains.push(build_chain(graph, nodes, support));
        }
        // A terminal node with no outgoing edges is itself a length-1 chain.
        if graph.out_degree(start) == 0 {
            chains.push(build_chain(graph, vec![start], 0));
        }
    }
    chains
}

fn build_chain(graph: &SequenceGraph, nodes: Vec<NodeIdx>, support: u32) -> Chain {
    let mut sequence = graph.node(nodes[0]).kmer.clone();
    for &idx in &nodes[1..] {
        sequence.push(graph.node(idx).last());
    }

    let start_terminal = graph.in_degree(nodes[0]) == 0;
    let end_terminal = graph.out_degree(*nodes.last().unwrap()) == 0;
    let interior_has_ref = nodes[1..nodes.len().saturating_sub(1)]
        .iter()
        .any(|&idx| graph.node(idx).is_reference());
    let is_alt_sequence = !start_terminal && !end_terminal && !interior_has_ref;

    Chain {
        nodes,
        support,
        sequence,
        is_alt_sequence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_reference_is_a_single_chain() {
        let mut g = SequenceGraph::new(3);
        g.add_sequence(b"ACGTACG", None, 20, Some(0), false).unwrap();
        let chains = find_chains(&g);
        // one branch/terminal node at each end of a purely linear graph.
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].sequence, b"ACGTACG");
        assert!(!chains[0].is_alt_sequence); // endpoints are terminal
    }

    #[test]
    fn bubble_produces_two_alt_chains() {
        let mut g = SequenceGraph::new(3);
        g.add_sequence(b"AAACCCGGG", None, 20, Some(0), false).unwrap();
        // same flanks, different middle -> diverges after "AAC" and rejoins at "CGG"
        g.add_sequence(b"AAATTTGGG", None, 20, None, false).unwrap();
        let chains = find_chains(&g);
        assert!(chains.iter().any(|c| c.is_alt_sequence));
    }
}
