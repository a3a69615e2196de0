//! Per-player road network used for longest-road computation.
//!
//! The network is its own graph whose nodes are proxies for board nodes. A
//! board node normally has a single proxy, but once an opponent builds there
//! the node is split so that every road touching it sits on its own proxy and
//! roads on either side can no longer be walked as one continuous path.

use crate::board::{Board, EdgeId, NodeId, PlayerId};
use crate::graph::Graph;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Network node standing in for one board node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyNode {
    pub board_node: NodeId,
}

/// Network edge standing in for one built road
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadSegment {
    pub board_edge: EdgeId,
}

/// All roads owned by one player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadNetwork {
    owner: PlayerId,
    graph: Graph<ProxyNode, RoadSegment>,
    /// Board node -> proxy indices representing it
    proxies: HashMap<NodeId, Vec<usize>>,
}

impl RoadNetwork {
    /// Create an empty network for `owner`
    pub fn new(owner: PlayerId) -> Self {
        Self {
            owner,
            graph: Graph::new(),
            proxies: HashMap::new(),
        }
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Record a road on board edge `edge`.
    ///
    /// Each endpoint reuses the first existing proxy for its board node,
    /// unless the node is unrepresented or an opponent has built on it, in
    /// which case a fresh proxy is created.
    pub fn add_road(&mut self, board: &Board, edge: EdgeId) {
        let [a, b] = board.edge_nodes(edge);
        let from = self.resolve_proxy(board, a);
        let to = self.resolve_proxy(board, b);
        self.graph.add_edge(from, to, RoadSegment { board_edge: edge });
    }

    /// Split this player's roads at `node` after an opponent builds there.
    ///
    /// For every proxy of `node`, each incident road after the first moves to
    /// a new proxy of the same board node. No-op if the player has no road
    /// touching `node`.
    pub fn break_road_at_node(&mut self, node: NodeId) {
        let Some(proxies) = self.proxies.get(&node).cloned() else {
            return;
        };

        for proxy in proxies {
            let detached: Vec<usize> = self
                .graph
                .incident_edges(proxy)
                .iter()
                .skip(1)
                .copied()
                .collect();
            for edge in detached {
                let fresh = self.new_proxy(node);
                self.graph.reattach_edge(edge, proxy, fresh);
            }
        }
    }

    /// Longest continuous road, as its length and the board edges walked
    pub fn longest_continuous_path(&self) -> (usize, Vec<EdgeId>) {
        let (length, path) = self.graph.longest_continuous_path();
        let edges = path
            .into_iter()
            .map(|index| self.graph.edge(index).data.board_edge)
            .collect();
        (length, edges)
    }

    /// Number of roads in the network
    pub fn road_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the network holds a road on board edge `edge`
    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        self.graph.edges().iter().any(|e| e.data.board_edge == edge)
    }

    /// Proxy indices representing board node `node`
    pub fn proxies_of(&self, node: NodeId) -> &[usize] {
        self.proxies.get(&node).map_or(&[], Vec::as_slice)
    }

    /// The underlying proxy graph
    pub fn graph(&self) -> &Graph<ProxyNode, RoadSegment> {
        &self.graph
    }

    fn resolve_proxy(&mut self, board: &Board, node: NodeId) -> usize {
        let blocked = board
            .node(node)
            .building
            .owner()
            .is_some_and(|owner| owner != self.owner);

        match self.proxies.get(&node).and_then(|p| p.first()) {
            Some(&proxy) if !blocked => proxy,
            _ => self.new_proxy(node),
        }
    }

    fn new_proxy(&mut self, node: NodeId) -> usize {
        let proxy = self.graph.add_node(ProxyNode { board_node: node });
        self.proxies.entry(node).or_default().push(proxy);
        proxy
    }
}
