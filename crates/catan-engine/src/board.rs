//! Game board representation: the fixed node/edge graph, hex tiles and ports.
//!
//! This module contains:
//! - Resource, port and building types
//! - The hard-coded 54 node / 72 edge layout and the hex-to-node table
//! - Randomised resource, dice number and port assignment
//! - Occupancy queries used for build legality

use crate::graph::Graph;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Player identifier (0-3)
pub type PlayerId = u8;
/// Board intersection index (0-53)
pub type NodeId = usize;
/// Board road slot index (0-71)
pub type EdgeId = usize;
/// Hex tile index (0-18)
pub type HexId = usize;

/// Number of players in a game
pub const PLAYER_COUNT: usize = 4;
/// Number of board intersections
pub const NODE_COUNT: usize = 54;
/// Number of road slots
pub const EDGE_COUNT: usize = 72;
/// Number of hex tiles
pub const HEX_COUNT: usize = 19;
/// Number of resource kinds
pub const RESOURCE_COUNT: usize = 5;

/// Endpoints of every edge, indexed by edge id
const EDGE_LAYOUT: [[NodeId; 2]; EDGE_COUNT] = [
    [0, 1], [1, 2], [2, 3], [3, 4], [4, 5], [5, 6],
    [0, 8], [2, 10], [4, 12], [6, 14],
    [7, 8], [8, 9], [9, 10], [10, 11], [11, 12], [12, 13], [13, 14], [14, 15],
    [7, 17], [9, 19], [11, 21], [13, 23], [15, 25],
    [16, 17], [17, 18], [18, 19], [19, 20], [20, 21], [21, 22], [22, 23], [23, 24], [24, 25], [25, 26],
    [16, 27], [18, 29], [20, 31], [22, 33], [24, 35], [26, 37],
    [27, 28], [28, 29], [29, 30], [30, 31], [31, 32], [32, 33], [33, 34], [34, 35], [35, 36], [36, 37],
    [28, 38], [30, 40], [32, 42], [34, 44], [36, 46],
    [38, 39], [39, 40], [40, 41], [41, 42], [42, 43], [43, 44], [44, 45], [45, 46],
    [39, 47], [41, 49], [43, 51], [45, 53],
    [47, 48], [48, 49], [49, 50], [50, 51], [51, 52], [52, 53],
];

/// Nodes touched by each hex, indexed by hex id
const HEX_LAYOUT: [[NodeId; 6]; HEX_COUNT] = [
    [0, 1, 2, 8, 9, 10],
    [2, 3, 4, 10, 11, 12],
    [4, 5, 6, 12, 13, 14],
    [7, 8, 9, 17, 18, 19],
    [9, 10, 11, 19, 20, 21],
    [11, 12, 13, 21, 22, 23],
    [13, 14, 15, 23, 24, 25],
    [16, 17, 18, 27, 28, 29],
    [18, 19, 20, 29, 30, 31],
    [20, 21, 22, 31, 32, 33],
    [22, 23, 24, 33, 34, 35],
    [24, 25, 26, 35, 36, 37],
    [28, 29, 30, 38, 39, 40],
    [30, 31, 32, 40, 41, 42],
    [32, 33, 34, 42, 43, 44],
    [34, 35, 36, 44, 45, 46],
    [39, 40, 41, 47, 48, 49],
    [41, 42, 43, 49, 50, 51],
    [43, 44, 45, 51, 52, 53],
];

/// Coastal node pairs that receive a port
const PORT_SITES: [[NodeId; 2]; 9] = [
    [0, 1],
    [3, 4],
    [14, 15],
    [26, 37],
    [45, 46],
    [51, 52],
    [48, 49],
    [28, 38],
    [7, 17],
];

/// Dice number tokens placed on the producing hexes
const NUMBER_TOKENS: [u8; 18] = [2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12];

/// Resource kinds, in the canonical order used by every per-resource array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resource {
    Wheat,
    Stone,
    Brick,
    Sheep,
    Wood,
}

impl Resource {
    /// All resource types
    pub const ALL: [Resource; RESOURCE_COUNT] = [
        Resource::Wheat,
        Resource::Stone,
        Resource::Brick,
        Resource::Sheep,
        Resource::Wood,
    ];

    /// Position of this resource in per-resource arrays
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Resource> {
        Self::ALL.get(index).copied()
    }

    /// How many producing hexes of this kind a board has
    pub const fn hex_count(self) -> usize {
        match self {
            Resource::Wheat | Resource::Sheep | Resource::Wood => 4,
            Resource::Stone | Resource::Brick => 3,
        }
    }
}

/// Port types for bank trading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Port {
    /// 3:1 trade any resource
    Generic,
    /// 2:1 trade for a specific resource
    Specific(Resource),
}

impl Port {
    /// Number of port flags per node: 3:1 followed by one 2:1 per resource
    pub const FLAG_COUNT: usize = 1 + RESOURCE_COUNT;

    /// The exchange rate for this port
    pub fn rate(&self) -> u32 {
        match self {
            Port::Generic => 3,
            Port::Specific(_) => 2,
        }
    }

    /// Index of this port in the per-node flag list
    pub fn flag_index(&self) -> usize {
        match self {
            Port::Generic => 0,
            Port::Specific(resource) => 1 + resource.index(),
        }
    }

    fn standard_set() -> Vec<Port> {
        let mut ports = vec![Port::Generic; 4];
        ports.extend(Resource::ALL.map(Port::Specific));
        ports
    }
}

/// What a hex produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HexKind {
    Producing(Resource),
    /// Never produces and never carries a number
    Desert,
}

/// A single resource tile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hex {
    pub id: HexId,
    pub kind: HexKind,
    /// Dice number that triggers production (2-12, never 7, None for desert)
    pub roll: Option<u8>,
    /// Probability of `roll` coming up on two dice
    pub probability: f64,
    /// The six surrounding nodes
    pub nodes: [NodeId; 6],
}

impl Hex {
    /// Get the resource this hex produces, if any
    pub fn resource(&self) -> Option<Resource> {
        match self.kind {
            HexKind::Producing(resource) => Some(resource),
            HexKind::Desert => None,
        }
    }
}

/// What's built on a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Building {
    /// Nothing built
    #[default]
    Empty,
    /// Settlement (1 VP, 1 resource per adjacent hex)
    Settlement(PlayerId),
    /// City (2 VP, 2 resources per adjacent hex)
    City(PlayerId),
}

impl Building {
    /// Get the owner of this building, if any
    pub fn owner(&self) -> Option<PlayerId> {
        match self {
            Building::Empty => None,
            Building::Settlement(p) | Building::City(p) => Some(*p),
        }
    }

    /// Victory points provided by this building
    pub fn victory_points(&self) -> u32 {
        match self {
            Building::Empty => 0,
            Building::Settlement(_) => 1,
            Building::City(_) => 2,
        }
    }

    /// Resource multiplier (how many resources per production)
    pub fn resource_multiplier(&self) -> u32 {
        self.victory_points()
    }
}

/// A board intersection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Summed roll probability per resource over the adjacent hexes
    pub resource_probabilities: [f64; RESOURCE_COUNT],
    /// Dice numbers feeding each resource, without repeats
    pub resource_rolls: [Vec<u8>; RESOURCE_COUNT],
    pub building: Building,
    pub port: Option<Port>,
}

impl Node {
    fn new(id: NodeId) -> Self {
        Self {
            id,
            resource_probabilities: [0.0; RESOURCE_COUNT],
            resource_rolls: Default::default(),
            building: Building::Empty,
            port: None,
        }
    }

    /// Total production probability over all resources
    pub fn total_probability(&self) -> f64 {
        self.resource_probabilities.iter().sum()
    }
}

/// A road slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub road: Option<PlayerId>,
}

/// Resources produced for each player by one roll, indexed `[player][resource]`
pub type Production = [[u32; RESOURCE_COUNT]; PLAYER_COUNT];

/// The two nodes joined by `edge` in the fixed layout
pub fn edge_endpoints(edge: EdgeId) -> [NodeId; 2] {
    EDGE_LAYOUT[edge]
}

/// The six nodes around `hex` in the fixed layout
pub fn hex_nodes(hex: HexId) -> [NodeId; 6] {
    HEX_LAYOUT[hex]
}

/// Probability of rolling `roll` with two six-sided dice
pub fn roll_probability(roll: u8) -> f64 {
    if !(2..=12).contains(&roll) {
        return 0.0;
    }
    let combinations = 6 - (7 - i32::from(roll)).abs();
    f64::from(combinations) / 36.0
}

/// The complete game board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    graph: Graph<Node, Edge>,
    hexes: Vec<Hex>,
    /// Hexes carrying each dice number, indexed by roll (0-12)
    roll_index: Vec<Vec<HexId>>,
    robber: HexId,
}

impl Board {
    /// Create the bare layout: every hex is an unnumbered desert and no ports
    /// are placed. Use [`Board::generate`] for a playable board.
    pub fn new() -> Self {
        let mut graph = Graph::new();
        for id in 0..NODE_COUNT {
            graph.add_node(Node::new(id));
        }
        for (id, [a, b]) in EDGE_LAYOUT.into_iter().enumerate() {
            graph.add_edge(a, b, Edge { id, road: None });
        }

        let hexes = HEX_LAYOUT
            .iter()
            .enumerate()
            .map(|(id, nodes)| Hex {
                id,
                kind: HexKind::Desert,
                roll: None,
                probability: 0.0,
                nodes: *nodes,
            })
            .collect();

        Self {
            graph,
            hexes,
            roll_index: vec![Vec::new(); 13],
            robber: 0,
        }
    }

    /// Create a board with shuffled resources, numbers and ports
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let mut board = Self::new();
        board.assign_resources(rng);
        board.assign_ports(rng);
        board
    }

    fn assign_resources<R: Rng>(&mut self, rng: &mut R) {
        let mut kinds: Vec<HexKind> = Resource::ALL
            .iter()
            .flat_map(|&r| std::iter::repeat(HexKind::Producing(r)).take(r.hex_count()))
            .collect();
        kinds.push(HexKind::Desert);
        kinds.shuffle(rng);

        let mut numbers = NUMBER_TOKENS.to_vec();
        numbers.shuffle(rng);
        let mut numbers = numbers.into_iter();

        for (hex_id, kind) in kinds.into_iter().enumerate() {
            let hex = &mut self.hexes[hex_id];
            hex.kind = kind;

            let HexKind::Producing(resource) = kind else {
                hex.roll = None;
                hex.probability = 0.0;
                self.robber = hex_id;
                continue;
            };

            // 18 tokens for 18 producing hexes
            let Some(roll) = numbers.next() else {
                unreachable!("one number token per producing hex")
            };
            let probability = roll_probability(roll);
            hex.roll = Some(roll);
            hex.probability = probability;
            let nodes = hex.nodes;

            for node_id in nodes {
                let node = self.graph.node_mut(node_id);
                let rolls = &mut node.resource_rolls[resource.index()];
                if !rolls.contains(&roll) {
                    rolls.push(roll);
                    node.resource_probabilities[resource.index()] += probability;
                }
            }
            self.roll_index[usize::from(roll)].push(hex_id);
        }
    }

    fn assign_ports<R: Rng>(&mut self, rng: &mut R) {
        let mut ports = Port::standard_set();
        ports.shuffle(rng);

        for (site, port) in PORT_SITES.iter().zip(ports) {
            for &node in site {
                self.graph.node_mut(node).port = Some(port);
            }
        }
    }

    // ==================== Accessors ====================

    pub fn node(&self, node: NodeId) -> &Node {
        self.graph.node(node)
    }

    pub fn nodes(&self) -> &[Node] {
        self.graph.nodes()
    }

    pub fn edge(&self, edge: EdgeId) -> &Edge {
        &self.graph.edge(edge).data
    }

    /// The two nodes joined by `edge`
    pub fn edge_nodes(&self, edge: EdgeId) -> [NodeId; 2] {
        self.graph.edge(edge).nodes
    }

    /// Edge ids touching `node`
    pub fn incident_edges(&self, node: NodeId) -> &[EdgeId] {
        self.graph.incident_edges(node)
    }

    /// Nodes one edge away from `node`
    pub fn neighbours(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.neighbours(node)
    }

    /// The node connectivity matrix of the fixed layout
    pub fn connectivity(&self) -> &[Vec<bool>] {
        self.graph.connectivity()
    }

    pub fn hex(&self, hex: HexId) -> &Hex {
        &self.hexes[hex]
    }

    pub fn hexes(&self) -> &[Hex] {
        &self.hexes
    }

    /// Hexes carrying dice number `roll`
    pub fn hexes_for_roll(&self, roll: u8) -> &[HexId] {
        self.roll_index
            .get(usize::from(roll))
            .map_or(&[], Vec::as_slice)
    }

    /// Hexes touching `node`
    pub fn hexes_at_node(&self, node: NodeId) -> impl Iterator<Item = &Hex> + '_ {
        self.hexes.iter().filter(move |hex| hex.nodes.contains(&node))
    }

    /// Current robber location
    pub fn robber(&self) -> HexId {
        self.robber
    }

    // ==================== Legality queries ====================

    /// Whether no settlement or city stands on `node`
    pub fn is_empty(&self, node: NodeId) -> bool {
        self.node(node).building == Building::Empty
    }

    /// Whether no road stands on `edge`
    pub fn edge_is_empty(&self, edge: EdgeId) -> bool {
        self.edge(edge).road.is_none()
    }

    /// Distance rule: true iff no node adjacent to `node` is built on
    pub fn connected_nodes_built_on(&self, node: NodeId) -> bool {
        self.neighbours(node).all(|neighbour| self.is_empty(neighbour))
    }

    /// Whether any edge touching `node` carries a road of `player`
    pub fn node_has_road(&self, node: NodeId, player: PlayerId) -> bool {
        self.incident_edges(node)
            .iter()
            .any(|&edge| self.edge(edge).road == Some(player))
    }

    /// Whether `player` may extend onto `edge`: either endpoint holds their
    /// settlement or city, or touches one of their roads
    pub fn edge_has_road_or_settlement(&self, edge: EdgeId, player: PlayerId) -> bool {
        self.edge_nodes(edge).into_iter().any(|node| {
            self.node(node).building.owner() == Some(player) || self.node_has_road(node, player)
        })
    }

    /// Players with a settlement or city on a corner of `hex`, ascending
    pub fn players_adjacent_to_hex(&self, hex: HexId) -> Vec<PlayerId> {
        let mut players: Vec<PlayerId> = self.hexes[hex]
            .nodes
            .iter()
            .filter_map(|&node| self.node(node).building.owner())
            .collect();
        players.sort_unstable();
        players.dedup();
        players
    }

    /// Resources each player collects when `roll` comes up. The hex under
    /// the robber produces nothing.
    pub fn production_for_roll(&self, roll: u8) -> Production {
        let mut production = [[0; RESOURCE_COUNT]; PLAYER_COUNT];

        for &hex_id in self.hexes_for_roll(roll) {
            if hex_id == self.robber {
                continue;
            }
            let hex = &self.hexes[hex_id];
            let Some(resource) = hex.resource() else {
                continue;
            };

            for &node in &hex.nodes {
                let building = self.node(node).building;
                if let Some(owner) = building.owner() {
                    production[usize::from(owner)][resource.index()] +=
                        building.resource_multiplier();
                }
            }
        }

        production
    }

    // ==================== Mutation ====================

    pub fn place_settlement(&mut self, node: NodeId, player: PlayerId) {
        debug_assert!(self.is_empty(node), "node {node} already built on");
        self.graph.node_mut(node).building = Building::Settlement(player);
    }

    pub fn upgrade_to_city(&mut self, node: NodeId, player: PlayerId) {
        debug_assert_eq!(self.node(node).building, Building::Settlement(player));
        self.graph.node_mut(node).building = Building::City(player);
    }

    pub fn place_road(&mut self, edge: EdgeId, player: PlayerId) {
        debug_assert!(self.edge_is_empty(edge), "edge {edge} already built on");
        self.graph.edge_data_mut(edge).road = Some(player);
    }

    /// Move the robber to `hex`
    ///
    /// # Panics
    ///
    /// Panics if `hex` is not a hex of this board.
    pub fn move_robber(&mut self, hex: HexId) {
        assert!(hex < HEX_COUNT, "hex {hex} out of range");
        self.robber = hex;
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
