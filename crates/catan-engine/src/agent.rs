//! Decision-making players.
//!
//! The game never asks an agent about game objects directly. Agents see a
//! flat numeric [`StateVector`] and answer with node, edge and hex ids or a
//! ranked list of [`Action`]s; the manager validates everything they return.
//!
//! Two agents are provided:
//! - [`RandomAgent`]: uniform random scores for every candidate
//! - [`ProbabilityAgent`]: favours high-production nodes and hurts opponents with the robber

use crate::actions::{Action, TRADE_COUNT};
use crate::board::{
    edge_endpoints, hex_nodes, Building, EdgeId, HexId, NodeId, PlayerId, Port, Resource,
    EDGE_COUNT, HEX_COUNT, NODE_COUNT, PLAYER_COUNT, RESOURCE_COUNT,
};
use crate::game::GameState;
use crate::player::{opponents_of, DevelopmentCard};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

const PROBABILITIES: usize = 0;
const SETTLEMENTS: usize = PROBABILITIES + NODE_COUNT * RESOURCE_COUNT;
const CITIES: usize = SETTLEMENTS + NODE_COUNT * PLAYER_COUNT;
const PORTS: usize = CITIES + NODE_COUNT * PLAYER_COUNT;
const ROADS: usize = PORTS + NODE_COUNT * Port::FLAG_COUNT;
const OPPONENT_RESOURCES: usize = ROADS + EDGE_COUNT * PLAYER_COUNT;
const OPPONENT_DEVELOPMENT: usize = OPPONENT_RESOURCES + PLAYER_COUNT - 1;
const OWN_DEVELOPMENT: usize = OPPONENT_DEVELOPMENT + PLAYER_COUNT - 1;
const OWN_RESOURCES: usize = OWN_DEVELOPMENT + DevelopmentCard::ALL.len();

/// Length of every state vector
pub const STATE_VECTOR_LEN: usize = OWN_RESOURCES + RESOURCE_COUNT;

/// What one player can see of the game, flattened.
///
/// Layout, in order: per-node resource probabilities (54 x 5), per-node
/// settlement flags by player id (54 x 4), per-node city flags (54 x 4),
/// per-node port flags (54 x 6), per-edge road flags (72 x 4), opponents'
/// visible resource counts (3), opponents' visible development card counts
/// (3), own development cards (5), own resources (5). Opponents are listed in
/// turn order after the observing player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    /// The observing player
    pub player: PlayerId,
    values: Vec<f64>,
}

impl StateVector {
    /// Flatten `state` as seen by `player`
    pub fn observe(state: &GameState, player: PlayerId) -> Self {
        let board = state.board();
        let me = state.player(player);
        let mut values = Vec::with_capacity(STATE_VECTOR_LEN);

        for node in board.nodes() {
            values.extend(node.resource_probabilities);
        }
        for node in board.nodes() {
            values.extend(
                (0..PLAYER_COUNT).map(|p| flag(node.building == Building::Settlement(p as PlayerId))),
            );
        }
        for node in board.nodes() {
            values.extend(
                (0..PLAYER_COUNT).map(|p| flag(node.building == Building::City(p as PlayerId))),
            );
        }
        for node in board.nodes() {
            let port = node.port.map(|port| port.flag_index());
            values.extend((0..Port::FLAG_COUNT).map(|i| flag(port == Some(i))));
        }
        for edge in 0..EDGE_COUNT {
            let road = board.edge(edge).road;
            values.extend((0..PLAYER_COUNT).map(|p| flag(road == Some(p as PlayerId))));
        }

        let opponents = opponents_of(player);
        values.extend(
            opponents
                .iter()
                .map(|&o| f64::from(me.known.resource_counts[usize::from(o)])),
        );
        values.extend(
            opponents
                .iter()
                .map(|&o| f64::from(me.known.development_counts[usize::from(o)])),
        );
        values.extend(me.development_cards.counts().map(f64::from));
        values.extend(me.resources.to_array().map(f64::from));

        debug_assert_eq!(values.len(), STATE_VECTOR_LEN);
        Self { player, values }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Production probability per resource at `node`
    pub fn node_probabilities(&self, node: NodeId) -> &[f64] {
        self.section(PROBABILITIES, node, RESOURCE_COUNT)
    }

    /// Settlement flag per player id at `node`
    pub fn settlement_flags(&self, node: NodeId) -> &[f64] {
        self.section(SETTLEMENTS, node, PLAYER_COUNT)
    }

    /// City flag per player id at `node`
    pub fn city_flags(&self, node: NodeId) -> &[f64] {
        self.section(CITIES, node, PLAYER_COUNT)
    }

    /// Port flags at `node`: 3:1 then 2:1 per resource
    pub fn port_flags(&self, node: NodeId) -> &[f64] {
        self.section(PORTS, node, Port::FLAG_COUNT)
    }

    /// Road flag per player id at `edge`
    pub fn road_flags(&self, edge: EdgeId) -> &[f64] {
        self.section(ROADS, edge, PLAYER_COUNT)
    }

    pub fn opponent_resource_counts(&self) -> &[f64] {
        &self.values[OPPONENT_RESOURCES..OPPONENT_DEVELOPMENT]
    }

    pub fn opponent_development_counts(&self) -> &[f64] {
        &self.values[OPPONENT_DEVELOPMENT..OWN_DEVELOPMENT]
    }

    /// Own development cards in [`DevelopmentCard::ALL`] order
    pub fn own_development_cards(&self) -> &[f64] {
        &self.values[OWN_DEVELOPMENT..OWN_RESOURCES]
    }

    /// Own resources in canonical order
    pub fn own_resources(&self) -> &[f64] {
        &self.values[OWN_RESOURCES..STATE_VECTOR_LEN]
    }

    /// Owner of the settlement or city at `node`, and whether it is a city
    pub fn building_at(&self, node: NodeId) -> Option<(PlayerId, bool)> {
        let settled = self.settlement_flags(node).iter().position(|&f| f > 0.0);
        let city = self.city_flags(node).iter().position(|&f| f > 0.0);
        match (settled, city) {
            (Some(p), _) => Some((p as PlayerId, false)),
            (None, Some(p)) => Some((p as PlayerId, true)),
            (None, None) => None,
        }
    }

    pub fn road_owner(&self, edge: EdgeId) -> Option<PlayerId> {
        self.road_flags(edge)
            .iter()
            .position(|&f| f > 0.0)
            .map(|p| p as PlayerId)
    }

    /// Empty nodes whose neighbours are all empty
    pub fn open_nodes(&self) -> Vec<NodeId> {
        let mut blocked = [false; NODE_COUNT];
        for node in 0..NODE_COUNT {
            if self.building_at(node).is_some() {
                blocked[node] = true;
            }
        }
        let mut open: Vec<NodeId> = (0..NODE_COUNT).filter(|&n| !blocked[n]).collect();
        for edge in 0..EDGE_COUNT {
            let [a, b] = edge_endpoints(edge);
            if blocked[a] || blocked[b] {
                open.retain(|&n| n != a && n != b);
            }
        }
        open
    }

    fn section(&self, base: usize, index: usize, width: usize) -> &[f64] {
        let start = base + index * width;
        &self.values[start..start + width]
    }
}

fn flag(set: bool) -> f64 {
    if set {
        1.0
    } else {
        0.0
    }
}

/// Edges touching `node`
fn edges_at(node: NodeId) -> impl Iterator<Item = EdgeId> {
    (0..EDGE_COUNT).filter(move |&edge| edge_endpoints(edge).contains(&node))
}

/// A setup move: one settlement and one road touching it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialPlacement {
    pub node: NodeId,
    pub edge: EdgeId,
}

/// An agent's answer during the action phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    EndTurn,
    /// Candidates to try in order until one is legal
    Ranked(Vec<Action>),
}

/// Something that chooses moves
pub trait Agent {
    /// Choose a setup settlement and road
    fn place_initial(&mut self, view: &StateVector) -> InitialPlacement;

    /// Choose what to do next in the action phase
    fn decide(&mut self, view: &StateVector) -> Decision;

    /// Rank hexes for the robber, best first
    fn move_robber(&mut self, view: &StateVector) -> Vec<HexId>;
}

/// Scores for every candidate in each action category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSheet {
    /// One per node
    pub settlements: Vec<f64>,
    /// One per node
    pub cities: Vec<f64>,
    /// One per edge
    pub roads: Vec<f64>,
    /// One per trade index
    pub trades: Vec<f64>,
    /// Buy a card, play a knight
    pub development: [f64; 2],
    pub end_turn: f64,
}

impl ScoreSheet {
    /// All scores zero
    pub fn zeroed() -> Self {
        Self {
            settlements: vec![0.0; NODE_COUNT],
            cities: vec![0.0; NODE_COUNT],
            roads: vec![0.0; EDGE_COUNT],
            trades: vec![0.0; TRADE_COUNT],
            development: [0.0; 2],
            end_turn: 0.0,
        }
    }

    /// Independent uniform scores in `[0, 1)` for every candidate
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let mut scores = || rng.gen::<f64>();
        Self {
            settlements: (0..NODE_COUNT).map(|_| scores()).collect(),
            cities: (0..NODE_COUNT).map(|_| scores()).collect(),
            roads: (0..EDGE_COUNT).map(|_| scores()).collect(),
            trades: (0..TRADE_COUNT).map(|_| scores()).collect(),
            development: [scores(), scores()],
            end_turn: scores(),
        }
    }

    /// Every candidate with its score, in category order
    fn candidates(&self) -> Vec<(f64, Action)> {
        let mut candidates = Vec::new();
        candidates.extend(
            self.settlements
                .iter()
                .enumerate()
                .map(|(node, &s)| (s, Action::BuildSettlement(node))),
        );
        candidates.extend(
            self.cities
                .iter()
                .enumerate()
                .map(|(node, &s)| (s, Action::BuildCity(node))),
        );
        candidates.extend(
            self.roads
                .iter()
                .enumerate()
                .map(|(edge, &s)| (s, Action::BuildRoad(edge))),
        );
        candidates.extend(self.trades.iter().enumerate().filter_map(|(index, &s)| {
            Action::trade_from_index(index).map(|trade| (s, trade))
        }));
        candidates.push((self.development[0], Action::BuyDevelopmentCard));
        candidates.push((self.development[1], Action::PlayKnight));
        candidates.push((self.end_turn, Action::EndTurn));
        candidates
    }

    /// Flatten into one list, highest score first. Equal scores keep category
    /// order. If ending the turn scores highest the decision is to end.
    pub fn rank(&self) -> Decision {
        let mut candidates = self.candidates();
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

        let ranked: Vec<Action> = candidates.into_iter().map(|(_, action)| action).collect();
        match ranked.first() {
            Some(Action::EndTurn) | None => Decision::EndTurn,
            Some(_) => Decision::Ranked(ranked),
        }
    }
}

/// Plays uniformly at random
pub struct RandomAgent {
    rng: StdRng,
}

impl RandomAgent {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for RandomAgent {
    fn place_initial(&mut self, view: &StateVector) -> InitialPlacement {
        let open = view.open_nodes();
        let node = open
            .choose(&mut self.rng)
            .copied()
            .unwrap_or_else(|| self.rng.gen_range(0..NODE_COUNT));
        let edges: Vec<EdgeId> = edges_at(node).collect();
        let edge = edges.choose(&mut self.rng).copied().unwrap_or(0);
        InitialPlacement { node, edge }
    }

    fn decide(&mut self, _view: &StateVector) -> Decision {
        ScoreSheet::random(&mut self.rng).rank()
    }

    fn move_robber(&mut self, _view: &StateVector) -> Vec<HexId> {
        let mut hexes: Vec<HexId> = (0..HEX_COUNT).collect();
        hexes.shuffle(&mut self.rng);
        hexes
    }
}

/// Builds where production is highest and robs where opponents produce most
#[derive(Debug, Default)]
pub struct ProbabilityAgent;

impl ProbabilityAgent {
    pub fn new() -> Self {
        Self
    }

    /// Production value of a node: total probability plus a bonus for
    /// each distinct resource it produces
    fn node_value(view: &StateVector, node: NodeId) -> f64 {
        let probabilities = view.node_probabilities(node);
        let total: f64 = probabilities.iter().sum();
        let diversity = probabilities.iter().filter(|&&p| p > 0.0).count();
        total + 0.01 * diversity as f64
    }

    fn ranked_by_value(view: &StateVector, mut nodes: Vec<NodeId>) -> Vec<NodeId> {
        nodes.sort_by(|&a, &b| Self::node_value(view, b).total_cmp(&Self::node_value(view, a)));
        nodes
    }

    /// Edges this player could extend onto, best endpoint first
    fn road_candidates(view: &StateVector) -> Vec<EdgeId> {
        let me = view.player;
        let reaches = |node: NodeId| {
            view.building_at(node).is_some_and(|(owner, _)| owner == me)
                || edges_at(node).any(|e| view.road_owner(e) == Some(me))
        };

        let mut scored: Vec<(f64, EdgeId)> = (0..EDGE_COUNT)
            .filter(|&edge| view.road_owner(edge).is_none())
            .filter_map(|edge| {
                let [a, b] = edge_endpoints(edge);
                if !reaches(a) && !reaches(b) {
                    return None;
                }
                let value = [a, b]
                    .into_iter()
                    .filter(|&n| view.building_at(n).is_none())
                    .map(|n| Self::node_value(view, n))
                    .fold(0.0, f64::max);
                Some((value, edge))
            })
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().map(|(_, edge)| edge).collect()
    }

    /// Resource this player holds the fewest of
    fn scarcest(view: &StateVector) -> Resource {
        let resources = view.own_resources();
        let index = (0..RESOURCE_COUNT)
            .min_by(|&a, &b| resources[a].total_cmp(&resources[b]))
            .unwrap_or(0);
        Resource::from_index(index).unwrap_or(Resource::Wheat)
    }
}

impl Agent for ProbabilityAgent {
    fn place_initial(&mut self, view: &StateVector) -> InitialPlacement {
        let best = Self::ranked_by_value(view, view.open_nodes());
        let node = best.first().copied().unwrap_or(0);

        // Point the road at the best open neighbour
        let edge = edges_at(node)
            .max_by(|&a, &b| {
                let value = |edge: EdgeId| {
                    let [x, y] = edge_endpoints(edge);
                    Self::node_value(view, if x == node { y } else { x })
                };
                value(a).total_cmp(&value(b))
            })
            .unwrap_or(0);
        InitialPlacement { node, edge }
    }

    fn decide(&mut self, view: &StateVector) -> Decision {
        let me = view.player;
        let cards = view.own_development_cards();
        let held = |card: DevelopmentCard| cards[card.index()] > 0.0;
        let mut ranked = Vec::new();

        // Cities on the most productive own settlements
        let own_settlements: Vec<NodeId> = (0..NODE_COUNT)
            .filter(|&n| view.building_at(n) == Some((me, false)))
            .collect();
        ranked.extend(
            Self::ranked_by_value(view, own_settlements)
                .into_iter()
                .map(Action::BuildCity),
        );

        // Settlements on the best open nodes
        ranked.extend(
            Self::ranked_by_value(view, view.open_nodes())
                .into_iter()
                .map(Action::BuildSettlement),
        );

        if held(DevelopmentCard::Knight) {
            ranked.push(Action::PlayKnight);
        }
        if held(DevelopmentCard::YearOfPlenty) {
            let wanted = Self::scarcest(view);
            ranked.push(Action::PlayYearOfPlenty(wanted, wanted));
        }
        if held(DevelopmentCard::Monopoly) {
            ranked.push(Action::PlayMonopoly(Self::scarcest(view)));
        }

        let roads = Self::road_candidates(view);
        if held(DevelopmentCard::RoadBuilding) {
            if let Some(&first) = roads.first() {
                ranked.push(Action::PlayRoadBuilding(first, roads.get(1).copied()));
            }
        }
        ranked.push(Action::BuyDevelopmentCard);
        ranked.extend(roads.into_iter().map(Action::BuildRoad));

        // Trade away surpluses for whatever is scarcest
        let resources = view.own_resources();
        let wanted = Self::scarcest(view);
        for give in Resource::ALL {
            if give != wanted && resources[give.index()] >= 4.0 {
                ranked.push(Action::Trade {
                    give,
                    receive: wanted,
                });
            }
        }

        ranked.push(Action::EndTurn);
        Decision::Ranked(ranked)
    }

    fn move_robber(&mut self, view: &StateVector) -> Vec<HexId> {
        let me = view.player;
        let score = |hex: HexId| -> f64 {
            hex_nodes(hex)
                .into_iter()
                .filter_map(|node| {
                    let (owner, city) = view.building_at(node)?;
                    let weight = Self::node_value(view, node) * if city { 2.0 } else { 1.0 };
                    Some(if owner == me { -2.0 * weight } else { weight })
                })
                .sum()
        };

        let mut hexes: Vec<(f64, HexId)> = (0..HEX_COUNT).map(|hex| (score(hex), hex)).collect();
        hexes.sort_by(|a, b| b.0.total_cmp(&a.0));
        hexes.into_iter().map(|(_, hex)| hex).collect()
    }
}
