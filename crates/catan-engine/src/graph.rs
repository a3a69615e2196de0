//! Generic node/edge container shared by the board and the road networks.
//!
//! Nodes and edges carry an arbitrary payload. Indices are dense and handed
//! out in insertion order; nothing is ever removed. The only structural
//! mutation besides appending is moving one endpoint of an edge onto another
//! node, which is how a road network is split.

use serde::{Deserialize, Serialize};

/// An edge between two node indices with its payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge<E> {
    /// Indices of the two connected nodes
    pub nodes: [usize; 2],
    /// Edge payload
    pub data: E,
}

impl<E> GraphEdge<E> {
    /// The endpoint opposite `node`, if `node` is one of this edge's endpoints
    pub fn other(&self, node: usize) -> Option<usize> {
        match self.nodes {
            [a, b] if a == node => Some(b),
            [a, b] if b == node => Some(a),
            _ => None,
        }
    }
}

/// Undirected graph with a derived connectivity matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph<N, E> {
    nodes: Vec<N>,
    edges: Vec<GraphEdge<E>>,
    /// `connectivity[i][j]` is true when an edge joins node i and node j
    connectivity: Vec<Vec<bool>>,
    /// Edge indices touching each node, in insertion order
    incidence: Vec<Vec<usize>>,
}

impl<N, E> Graph<N, E> {
    /// Create an empty graph
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            connectivity: Vec::new(),
            incidence: Vec::new(),
        }
    }

    /// Append a node, returning its index
    pub fn add_node(&mut self, data: N) -> usize {
        let index = self.nodes.len();
        self.nodes.push(data);

        for row in &mut self.connectivity {
            row.push(false);
        }
        self.connectivity.push(vec![false; index + 1]);
        self.incidence.push(Vec::new());

        index
    }

    /// Append an edge between `a` and `b`, returning its index.
    ///
    /// # Panics
    ///
    /// Panics if either endpoint is not a node of this graph.
    pub fn add_edge(&mut self, a: usize, b: usize, data: E) -> usize {
        assert!(
            a < self.nodes.len() && b < self.nodes.len(),
            "edge endpoints ({a}, {b}) out of range for {} nodes",
            self.nodes.len()
        );

        let index = self.edges.len();
        self.edges.push(GraphEdge { nodes: [a, b], data });
        self.rebuild_connectivity();
        index
    }

    /// Move the `from` endpoint of `edge` onto node `to`.
    ///
    /// # Panics
    ///
    /// Panics if `edge` or `to` is out of range, or `from` is not an endpoint of `edge`.
    pub fn reattach_edge(&mut self, edge: usize, from: usize, to: usize) {
        assert!(to < self.nodes.len(), "node {to} out of range");
        let endpoints = &mut self.edges[edge].nodes;
        let slot = endpoints
            .iter()
            .position(|&n| n == from)
            .unwrap_or_else(|| panic!("node {from} is not an endpoint of edge {edge}"));
        endpoints[slot] = to;
        self.rebuild_connectivity();
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, index: usize) -> &N {
        &self.nodes[index]
    }

    pub fn node_mut(&mut self, index: usize) -> &mut N {
        &mut self.nodes[index]
    }

    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    pub fn edge(&self, index: usize) -> &GraphEdge<E> {
        &self.edges[index]
    }

    /// Mutable access to an edge payload. Endpoints stay fixed.
    pub fn edge_data_mut(&mut self, index: usize) -> &mut E {
        &mut self.edges[index].data
    }

    pub fn edges(&self) -> &[GraphEdge<E>] {
        &self.edges
    }

    /// The node connectivity matrix
    pub fn connectivity(&self) -> &[Vec<bool>] {
        &self.connectivity
    }

    /// Whether an edge joins `a` and `b`
    pub fn are_adjacent(&self, a: usize, b: usize) -> bool {
        self.connectivity[a][b]
    }

    /// Nodes directly connected to `node`
    pub fn neighbours(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.connectivity[node]
            .iter()
            .enumerate()
            .filter(|(_, &connected)| connected)
            .map(|(index, _)| index)
    }

    /// Edge indices touching `node`, in insertion order
    pub fn incident_edges(&self, node: usize) -> &[usize] {
        &self.incidence[node]
    }

    /// Longest continuous path through the graph.
    ///
    /// Every node is tried as a start. From there the search walks any edge not
    /// already used by the current path, so nodes may be revisited but an edge
    /// never is; this is what terminates the walk around cycles. Returns the
    /// length in edges and the edge indices in walk order. Ties keep the
    /// first path found.
    pub fn longest_continuous_path(&self) -> (usize, Vec<usize>) {
        let mut used = vec![false; self.edges.len()];
        let mut path = Vec::new();
        let mut best = Vec::new();

        for start in 0..self.nodes.len() {
            self.extend_path(start, &mut used, &mut path, &mut best);
        }

        (best.len(), best)
    }

    fn extend_path(
        &self,
        node: usize,
        used: &mut [bool],
        path: &mut Vec<usize>,
        best: &mut Vec<usize>,
    ) {
        let mut extended = false;

        for &edge in &self.incidence[node] {
            if used[edge] {
                continue;
            }
            let Some(next) = self.edges[edge].other(node) else {
                continue;
            };

            extended = true;
            used[edge] = true;
            path.push(edge);
            self.extend_path(next, used, path, best);
            path.pop();
            used[edge] = false;
        }

        // Dead end
        if !extended && path.len() > best.len() {
            best.clone_from(path);
        }
    }

    fn rebuild_connectivity(&mut self) {
        let node_count = self.nodes.len();
        self.connectivity = connectivity_matrix(node_count, self.edges.iter().map(|e| e.nodes));

        self.incidence = vec![Vec::new(); node_count];
        for (index, edge) in self.edges.iter().enumerate() {
            let [a, b] = edge.nodes;
            self.incidence[a].push(index);
            if b != a {
                self.incidence[b].push(index);
            }
        }
    }
}

impl<N, E> Default for Graph<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a symmetric connectivity matrix for `node_count` nodes from a list
/// of edge endpoint pairs.
///
/// # Panics
///
/// Panics if an endpoint is `>= node_count`.
pub fn connectivity_matrix<I>(node_count: usize, edges: I) -> Vec<Vec<bool>>
where
    I: IntoIterator<Item = [usize; 2]>,
{
    let mut matrix = vec![vec![false; node_count]; node_count];
    for [a, b] in edges {
        matrix[a][b] = true;
        matrix[b][a] = true;
    }
    matrix
}
