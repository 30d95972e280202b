// src/instance/filter.rs

use petgraph::algo::articulation_points::articulation_points;
use petgraph::algo::connected_components;
use petgraph::graph::UnGraph;

use crate::instance::{Instance, SimpleGraph};
use crate::types::StructuralFilter;

impl StructuralFilter {
    /// Whether `instance` belongs in the ledger under this filter.
    ///
    /// Instances without a parsed graph only pass `All`.
    pub fn accepts(&self, instance: &Instance) -> bool {
        match self {
            StructuralFilter::All => true,
            StructuralFilter::Biconnected => instance.graph.as_ref().is_some_and(is_biconnected),
            StructuralFilter::NotBiconnected => instance
                .graph
                .as_ref()
                .is_some_and(|g| !is_biconnected(g)),
        }
    }
}

fn to_petgraph(graph: &SimpleGraph) -> UnGraph<(), ()> {
    let mut g = UnGraph::with_capacity(graph.node_count(), graph.edge_count());
    let nodes: Vec<_> = (0..graph.node_count()).map(|_| g.add_node(())).collect();
    for (a, b) in graph.edges() {
        g.add_edge(nodes[a], nodes[b], ());
    }
    g
}

/// A graph is biconnected if it is connected and has no articulation point.
///
/// Fewer than two vertices is never biconnected; a single edge is.
pub fn is_biconnected(graph: &SimpleGraph) -> bool {
    let n = graph.node_count();
    if n < 2 {
        return false;
    }
    let g = to_petgraph(graph);
    if connected_components(&g) != 1 {
        return false;
    }
    n == 2 || articulation_points(&g).is_empty()
}
