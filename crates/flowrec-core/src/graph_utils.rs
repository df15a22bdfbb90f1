use crate::{Flow, FlowId, NodeId};
use petgraph::algo::connected_components;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::unionfind::UnionFind;
use std::collections::{HashMap, HashSet};

/// Distinct node ids in first-seen order: for each flow, its source and then
/// its destination. This ordering defines the rows of the incidence matrix.
pub fn node_order(flows: &[Flow]) -> Vec<NodeId> {
    let mut order = Vec::new();
    let mut seen = HashSet::new();
    for flow in flows {
        for node in [&flow.source, &flow.destination].into_iter().flatten() {
            if seen.insert(node) {
                order.push(node.clone());
            }
        }
    }
    order
}

/// Directed multigraph view of a flow list. Boundary flows (one endpoint)
/// have no edge; they only make their node exist.
#[derive(Debug)]
pub struct FlowGraph {
    pub graph: DiGraph<NodeId, FlowId>,
    pub index: HashMap<NodeId, NodeIndex>,
    /// Flows with exactly one endpoint
    pub boundary_flows: usize,
}

impl FlowGraph {
    pub fn from_flows(flows: &[Flow]) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        for node in node_order(flows) {
            let idx = graph.add_node(node.clone());
            index.insert(node, idx);
        }

        let mut boundary_flows = 0;
        for flow in flows {
            match (&flow.source, &flow.destination) {
                (Some(s), Some(d)) => {
                    graph.add_edge(index[s], index[d], flow.id);
                }
                (None, None) => {}
                _ => boundary_flows += 1,
            }
        }

        Self {
            graph,
            index,
            boundary_flows,
        }
    }
}

/// Summary statistics for a flow network.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphStats {
    pub node_count: usize,
    pub internal_flows: usize,
    pub boundary_flows: usize,
    pub connected_components: usize,
}

/// Count nodes, flows and weakly connected components.
pub fn graph_stats(flows: &[Flow]) -> GraphStats {
    let fg = FlowGraph::from_flows(flows);
    GraphStats {
        node_count: fg.graph.node_count(),
        internal_flows: fg.graph.edge_count(),
        boundary_flows: fg.boundary_flows,
        connected_components: connected_components(&fg.graph),
    }
}

/// One weakly connected sub-network.
#[derive(Debug, Clone, PartialEq)]
pub struct IslandSummary {
    pub island_id: usize,
    pub nodes: Vec<NodeId>,
}

/// Group nodes into islands (union-find over internal flows).
///
/// Islands are numbered in order of their first node in [`node_order`].
pub fn find_islands(flows: &[Flow]) -> Vec<IslandSummary> {
    let fg = FlowGraph::from_flows(flows);
    let mut uf = UnionFind::<usize>::new(fg.graph.node_count());
    for edge in fg.graph.raw_edges() {
        uf.union(edge.source().index(), edge.target().index());
    }

    let mut islands: Vec<IslandSummary> = Vec::new();
    let mut by_root: HashMap<usize, usize> = HashMap::new();
    for node in fg.graph.node_indices() {
        let root = uf.find(node.index());
        let island = *by_root.entry(root).or_insert_with(|| {
            islands.push(IslandSummary {
                island_id: islands.len(),
                nodes: Vec::new(),
            });
            islands.len() - 1
        });
        islands[island].nodes.push(fg.graph[node].clone());
    }
    islands
}
