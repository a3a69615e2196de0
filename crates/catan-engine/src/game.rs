//! Core game state machine.
//!
//! This module contains the `GameState` context and all rule enforcement.
//! Every action is validated completely before anything is mutated, so a
//! rejected action leaves the state untouched.

use crate::actions::{Action, GameEvent};
use crate::board::{
    Board, Building, EdgeId, HexId, NodeId, PlayerId, Resource, EDGE_COUNT, HEX_COUNT, NODE_COUNT,
    PLAYER_COUNT,
};
use crate::config::GameConfig;
use crate::player::{costs, opponents_of, DevelopmentCard, Player, ResourceHand};
use crate::road_network::RoadNetwork;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Minimum road length for Longest Road
pub const MIN_LONGEST_ROAD: u32 = 5;

/// Minimum knights for Largest Army
pub const MIN_LARGEST_ARMY: u32 = 3;

/// Hands above this size lose half their cards on a 7
const DISCARD_LIMIT: u32 = 7;

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Initial placements, forward round then reverse round
    Setup,
    /// Before rolling dice at start of turn
    PreRoll,
    /// After a 7 or a knight, the robber must move
    RobberPending,
    /// Build, trade and play cards until the turn ends
    ActionPhase,
    /// Game is over, `winner` is None when the round cap was hit
    GameOver { winner: Option<PlayerId> },
}

/// Reasons an action was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ActionError {
    #[error("Invalid action for current phase")]
    WrongPhase,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Node is already built on")]
    NodeOccupied,

    #[error("Node is next to another settlement or city")]
    TooCloseToSettlement,

    #[error("Not connected to your roads or buildings")]
    NotConnected,

    #[error("Edge already has a road")]
    EdgeOccupied,

    #[error("Road does not touch the settlement")]
    NotIncidentToSettlement,

    #[error("You have no settlement there")]
    NotYourSettlement,

    #[error("Cannot afford this")]
    InsufficientResources,

    #[error("No pieces remaining")]
    NoPiecesRemaining,

    #[error("No development cards left in deck")]
    EmptyDeck,

    #[error("Don't have that card")]
    NoSuchCard,

    #[error("Invalid trade")]
    InvalidTrade,

    #[error("Robber must move to a different hex")]
    InvalidRobberLocation,

    #[error("Game is over")]
    GameOver,
}

/// Setup placement order: forward from `start`, then the same players reversed
pub fn setup_order(start: PlayerId) -> [PlayerId; 2 * PLAYER_COUNT] {
    let mut order = [0; 2 * PLAYER_COUNT];
    for offset in 0..PLAYER_COUNT {
        let player = (start as usize + offset) % PLAYER_COUNT;
        order[offset] = player as PlayerId;
        order[2 * PLAYER_COUNT - 1 - offset] = player as PlayerId;
    }
    order
}

/// Who holds a bonus after `values` changed.
///
/// A unique top value at or above `minimum` takes it. A tie for the top that
/// includes the current holder leaves it with them. Any other tie, or no
/// value reaching `minimum`, leaves nobody holding it.
pub fn bonus_holder(
    values: &[u32; PLAYER_COUNT],
    holder: Option<PlayerId>,
    minimum: u32,
) -> Option<PlayerId> {
    let best = values.iter().copied().max().unwrap_or(0);
    if best < minimum {
        return None;
    }

    let leaders: Vec<PlayerId> = (0..PLAYER_COUNT)
        .filter(|&p| values[p] == best)
        .map(|p| p as PlayerId)
        .collect();

    match leaders.as_slice() {
        [only] => Some(*only),
        tied if holder.is_some_and(|h| tied.contains(&h)) => holder,
        _ => None,
    }
}

/// The complete game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    board: Board,
    road_networks: Vec<RoadNetwork>,
    /// All players, indexed by id
    pub players: Vec<Player>,
    phase: Phase,
    current_player: PlayerId,
    starting_player: PlayerId,
    /// Completed full rotations since setup
    turn_counter: u32,
    /// Placements made so far during setup
    setup_step: usize,
    second_settlements: [Option<NodeId>; PLAYER_COUNT],
    development_deck: Vec<DevelopmentCard>,
    settlements: [u32; PLAYER_COUNT],
    cities: [u32; PLAYER_COUNT],
    road_lengths: [u32; PLAYER_COUNT],
    longest_road: Option<PlayerId>,
    largest_army: Option<PlayerId>,
    last_roll: Option<(u8, u8)>,
    victory_points_to_win: u32,
    #[serde(skip, default = "StdRng::from_entropy")]
    rng: StdRng,
}

impl GameState {
    /// Create a game on a freshly generated board
    pub fn new(config: &GameConfig) -> Self {
        let mut rng = seeded_rng(config.seed);
        let board = Board::generate(&mut rng);
        Self::assemble(board, config, rng)
    }

    /// Create a game on a prepared board
    pub fn with_board(board: Board, config: &GameConfig) -> Self {
        Self::assemble(board, config, seeded_rng(config.seed))
    }

    fn assemble(board: Board, config: &GameConfig, mut rng: StdRng) -> Self {
        let mut development_deck = DevelopmentCard::standard_deck();
        development_deck.shuffle(&mut rng);

        // First player is random
        let starting_player = rng.gen_range(0..PLAYER_COUNT as PlayerId);

        Self {
            board,
            road_networks: (0..PLAYER_COUNT as PlayerId).map(RoadNetwork::new).collect(),
            players: (0..PLAYER_COUNT as PlayerId).map(Player::new).collect(),
            phase: Phase::Setup,
            current_player: starting_player,
            starting_player,
            turn_counter: 0,
            setup_step: 0,
            second_settlements: [None; PLAYER_COUNT],
            development_deck,
            settlements: [0; PLAYER_COUNT],
            cities: [0; PLAYER_COUNT],
            road_lengths: [0; PLAYER_COUNT],
            longest_road: None,
            largest_army: None,
            last_roll: None,
            victory_points_to_win: config.victory_points_to_win,
            rng,
        }
    }

    // ==================== Accessors ====================

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_player(&self) -> PlayerId {
        self.current_player
    }

    pub fn starting_player(&self) -> PlayerId {
        self.starting_player
    }

    pub fn turn_counter(&self) -> u32 {
        self.turn_counter
    }

    pub fn last_roll(&self) -> Option<(u8, u8)> {
        self.last_roll
    }

    pub fn player(&self, id: PlayerId) -> &Player {
        &self.players[usize::from(id)]
    }

    pub fn road_network(&self, id: PlayerId) -> &RoadNetwork {
        &self.road_networks[usize::from(id)]
    }

    /// Cards left in the development deck
    pub fn development_deck_len(&self) -> usize {
        self.development_deck.len()
    }

    pub fn settlement_count(&self, id: PlayerId) -> u32 {
        self.settlements[usize::from(id)]
    }

    pub fn city_count(&self, id: PlayerId) -> u32 {
        self.cities[usize::from(id)]
    }

    /// Cached longest continuous road of a player
    pub fn road_length(&self, id: PlayerId) -> u32 {
        self.road_lengths[usize::from(id)]
    }

    pub fn longest_road_holder(&self) -> Option<PlayerId> {
        self.longest_road
    }

    pub fn largest_army_holder(&self) -> Option<PlayerId> {
        self.largest_army
    }

    /// Check if the game is finished
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::GameOver { .. })
    }

    /// Get the winner if the game is finished with one
    pub fn winner(&self) -> Option<PlayerId> {
        match self.phase {
            Phase::GameOver { winner } => winner,
            _ => None,
        }
    }

    /// Victory points: settlements, cities and the two bonuses.
    /// Victory point cards are not counted.
    pub fn count_points(&self, id: PlayerId) -> u32 {
        let p = usize::from(id);
        let mut points = self.settlements[p] + 2 * self.cities[p];
        if self.longest_road == Some(id) {
            points += 2;
        }
        if self.largest_army == Some(id) {
            points += 2;
        }
        points
    }

    /// The first empty node satisfying the distance rule, with a free edge
    /// touching it
    pub fn first_legal_setup_placement(&self) -> Option<(NodeId, EdgeId)> {
        (0..NODE_COUNT)
            .filter(|&node| self.board.is_empty(node) && self.board.connected_nodes_built_on(node))
            .find_map(|node| {
                self.board
                    .incident_edges(node)
                    .iter()
                    .copied()
                    .find(|&edge| self.board.edge_is_empty(edge))
                    .map(|edge| (node, edge))
            })
    }

    /// Hexes the robber may move to
    pub fn legal_robber_hexes(&self) -> impl Iterator<Item = HexId> + '_ {
        (0..HEX_COUNT).filter(move |&hex| hex != self.board.robber())
    }

    /// End the game without a winner
    pub fn end_without_winner(&mut self) {
        info!("Game ended without a winner after {} rounds", self.turn_counter);
        self.phase = Phase::GameOver { winner: None };
    }

    // ==================== Actions ====================

    /// Apply an action to the game state
    pub fn apply_action(
        &mut self,
        player: PlayerId,
        action: Action,
    ) -> Result<Vec<GameEvent>, ActionError> {
        if self.is_finished() {
            return Err(ActionError::GameOver);
        }
        if player != self.current_player {
            return Err(ActionError::NotYourTurn);
        }

        let mut events = Vec::new();

        match action {
            Action::PlaceInitial { node, edge } => {
                self.place_initial(player, node, edge, &mut events)?
            }
            Action::RollDice => {
                self.require_phase(Phase::PreRoll)?;
                let dice = (self.rng.gen_range(1..=6), self.rng.gen_range(1..=6));
                self.resolve_roll(player, dice, &mut events)?
            }
            Action::MoveRobber(hex) => self.move_robber(player, hex, &mut events)?,
            Action::BuildSettlement(node) => self.build_settlement(player, node, &mut events)?,
            Action::BuildCity(node) => self.build_city(player, node, &mut events)?,
            Action::BuildRoad(edge) => self.build_road(player, edge, &mut events)?,
            Action::BuyDevelopmentCard => self.buy_development_card(player, &mut events)?,
            Action::PlayKnight => self.play_knight(player, &mut events)?,
            Action::PlayYearOfPlenty(first, second) => {
                self.play_year_of_plenty(player, first, second, &mut events)?
            }
            Action::PlayMonopoly(resource) => self.play_monopoly(player, resource, &mut events)?,
            Action::PlayRoadBuilding(first, second) => {
                self.play_road_building(player, first, second, &mut events)?
            }
            Action::Trade { give, receive } => self.trade(player, give, receive, &mut events)?,
            Action::EndTurn => self.end_turn(player, &mut events)?,
        }

        debug!("Player {} applied {:?}", player, action);
        self.sync_visible_counts();
        self.check_win_condition(&mut events);

        Ok(events)
    }

    /// Resolve a dice roll with known dice instead of drawing them
    ///
    /// # Panics
    ///
    /// Panics if either die is outside 1-6.
    pub fn roll_with(
        &mut self,
        player: PlayerId,
        dice: (u8, u8),
    ) -> Result<Vec<GameEvent>, ActionError> {
        assert!(
            (1..=6).contains(&dice.0) && (1..=6).contains(&dice.1),
            "dice {dice:?} out of range"
        );
        if self.is_finished() {
            return Err(ActionError::GameOver);
        }
        if player != self.current_player {
            return Err(ActionError::NotYourTurn);
        }

        let mut events = Vec::new();
        self.resolve_roll(player, dice, &mut events)?;
        self.sync_visible_counts();
        Ok(events)
    }

    fn require_phase(&self, phase: Phase) -> Result<(), ActionError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(ActionError::WrongPhase)
        }
    }

    // ==================== Setup Phase ====================

    fn place_initial(
        &mut self,
        player: PlayerId,
        node: NodeId,
        edge: EdgeId,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), ActionError> {
        self.require_phase(Phase::Setup)?;
        check_node(node);
        check_edge(edge);

        if !self.board.is_empty(node) {
            return Err(ActionError::NodeOccupied);
        }
        if !self.board.connected_nodes_built_on(node) {
            return Err(ActionError::TooCloseToSettlement);
        }
        if !self.board.edge_nodes(edge).contains(&node) {
            return Err(ActionError::NotIncidentToSettlement);
        }
        if !self.board.edge_is_empty(edge) {
            return Err(ActionError::EdgeOccupied);
        }
        let pieces = self.player(player).pieces;
        if pieces.settlements == 0 || pieces.roads == 0 {
            return Err(ActionError::NoPiecesRemaining);
        }

        self.settle(player, node, events);
        self.lay_road(player, edge, events);
        if self.setup_step >= PLAYER_COUNT {
            self.second_settlements[usize::from(player)] = Some(node);
        }
        events.push(GameEvent::InitialPlacement { player, node, edge });

        self.setup_step += 1;
        if self.setup_step < 2 * PLAYER_COUNT {
            self.current_player = setup_order(self.starting_player)[self.setup_step];
        } else {
            self.grant_setup_resources(events);
            self.current_player = self.starting_player;
            self.phase = Phase::PreRoll;
            info!("Setup complete, player {} starts", self.starting_player);
        }
        Ok(())
    }

    fn grant_setup_resources(&mut self, events: &mut Vec<GameEvent>) {
        let mut distributions = Vec::new();

        for (p, second) in self.second_settlements.iter().enumerate() {
            let Some(node) = *second else {
                continue;
            };
            for hex in self.board.hexes_at_node(node) {
                if let Some(resource) = hex.resource() {
                    self.players[p].resources.add(resource, 1);
                    distributions.push((p as PlayerId, resource, 1));
                }
            }
        }

        events.push(GameEvent::SetupResourcesGranted { distributions });
    }

    // ==================== Dice and Robber ====================

    fn resolve_roll(
        &mut self,
        player: PlayerId,
        dice: (u8, u8),
        events: &mut Vec<GameEvent>,
    ) -> Result<(), ActionError> {
        self.require_phase(Phase::PreRoll)?;

        let total = dice.0 + dice.1;
        self.last_roll = Some(dice);
        events.push(GameEvent::DiceRolled {
            player,
            roll: dice,
            total,
        });

        if total == 7 {
            for p in 0..PLAYER_COUNT {
                let held = self.players[p].resources.total();
                if held <= DISCARD_LIMIT {
                    continue;
                }
                let count = held.div_ceil(2);
                self.players[p].resources.discard_random(count, &mut self.rng);
                events.push(GameEvent::CardsDiscarded {
                    player: p as PlayerId,
                    count,
                });
            }
            self.phase = Phase::RobberPending;
            return Ok(());
        }

        let production = self.board.production_for_roll(total);
        let mut distributions = Vec::new();
        for (p, amounts) in production.iter().enumerate() {
            for resource in Resource::ALL {
                let amount = amounts[resource.index()];
                if amount > 0 {
                    self.players[p].resources.add(resource, amount);
                    distributions.push((p as PlayerId, resource, amount));
                }
            }
        }
        if !distributions.is_empty() {
            events.push(GameEvent::ResourcesDistributed { distributions });
        }

        self.phase = Phase::ActionPhase;
        Ok(())
    }

    fn move_robber(
        &mut self,
        player: PlayerId,
        hex: HexId,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), ActionError> {
        self.require_phase(Phase::RobberPending)?;
        assert!(hex < HEX_COUNT, "hex {hex} out of range");

        let from = self.board.robber();
        if hex == from {
            return Err(ActionError::InvalidRobberLocation);
        }

        self.board.move_robber(hex);
        events.push(GameEvent::RobberMoved {
            player,
            from,
            to: hex,
        });

        let victims: Vec<PlayerId> = self
            .board
            .players_adjacent_to_hex(hex)
            .into_iter()
            .filter(|&p| p != player)
            .collect();

        if let Some(&victim) = victims.choose(&mut self.rng) {
            let stolen = self.players[usize::from(victim)]
                .resources
                .steal_random(&mut self.rng);
            if let Some(resource) = stolen {
                self.players[usize::from(player)].resources.add(resource, 1);
                events.push(GameEvent::ResourceStolen {
                    thief: player,
                    victim,
                    resource,
                });
            }
        }

        self.phase = Phase::ActionPhase;
        Ok(())
    }

    // ==================== Building ====================

    fn build_settlement(
        &mut self,
        player: PlayerId,
        node: NodeId,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), ActionError> {
        self.require_phase(Phase::ActionPhase)?;
        check_node(node);

        if !self.board.is_empty(node) {
            return Err(ActionError::NodeOccupied);
        }
        if !self.board.connected_nodes_built_on(node) {
            return Err(ActionError::TooCloseToSettlement);
        }
        if !self.board.node_has_road(node, player) {
            return Err(ActionError::NotConnected);
        }
        let p = self.player(player);
        if p.pieces.settlements == 0 {
            return Err(ActionError::NoPiecesRemaining);
        }
        if !p.resources.can_afford(&costs::settlement()) {
            return Err(ActionError::InsufficientResources);
        }

        self.players[usize::from(player)]
            .resources
            .subtract(&costs::settlement());
        self.settle(player, node, events);
        Ok(())
    }

    fn build_city(
        &mut self,
        player: PlayerId,
        node: NodeId,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), ActionError> {
        self.require_phase(Phase::ActionPhase)?;
        check_node(node);

        if self.board.node(node).building != Building::Settlement(player) {
            return Err(ActionError::NotYourSettlement);
        }
        let p = self.player(player);
        if p.pieces.cities == 0 {
            return Err(ActionError::NoPiecesRemaining);
        }
        if !p.resources.can_afford(&costs::city()) {
            return Err(ActionError::InsufficientResources);
        }

        let idx = usize::from(player);
        let p = &mut self.players[idx];
        p.resources.subtract(&costs::city());
        p.pieces.cities -= 1;
        // Settlement piece returned
        p.pieces.settlements += 1;

        self.board.upgrade_to_city(node, player);
        self.settlements[idx] -= 1;
        self.cities[idx] += 1;

        events.push(GameEvent::CityBuilt { player, node });
        Ok(())
    }

    fn build_road(
        &mut self,
        player: PlayerId,
        edge: EdgeId,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), ActionError> {
        self.require_phase(Phase::ActionPhase)?;
        check_edge(edge);
        self.check_road_site(player, edge)?;

        let p = self.player(player);
        if p.pieces.roads == 0 {
            return Err(ActionError::NoPiecesRemaining);
        }
        if !p.resources.can_afford(&costs::road()) {
            return Err(ActionError::InsufficientResources);
        }

        self.players[usize::from(player)]
            .resources
            .subtract(&costs::road());
        self.lay_road(player, edge, events);
        Ok(())
    }

    fn check_road_site(&self, player: PlayerId, edge: EdgeId) -> Result<(), ActionError> {
        if !self.board.edge_is_empty(edge) {
            return Err(ActionError::EdgeOccupied);
        }
        if !self.board.edge_has_road_or_settlement(edge, player) {
            return Err(ActionError::NotConnected);
        }
        Ok(())
    }

    /// Occupy `node` and consume a settlement piece. Opponents' road networks
    /// touching the node are split.
    fn settle(&mut self, player: PlayerId, node: NodeId, events: &mut Vec<GameEvent>) {
        let idx = usize::from(player);
        self.board.place_settlement(node, player);
        self.players[idx].pieces.settlements -= 1;
        self.settlements[idx] += 1;
        if let Some(port) = self.board.node(node).port {
            self.players[idx].apply_port(port);
        }
        events.push(GameEvent::SettlementBuilt { player, node });

        for other in opponents_of(player) {
            let network = &mut self.road_networks[usize::from(other)];
            if network.proxies_of(node).is_empty() {
                continue;
            }
            network.break_road_at_node(node);
            self.refresh_road_length(other);
            events.push(GameEvent::RoadNetworkSplit {
                owner: other,
                node,
                length: self.road_length(other),
            });
        }

        self.update_longest_road(events);
    }

    /// Occupy `edge` and consume a road piece
    fn lay_road(&mut self, player: PlayerId, edge: EdgeId, events: &mut Vec<GameEvent>) {
        let idx = usize::from(player);
        self.board.place_road(edge, player);
        self.players[idx].pieces.roads -= 1;
        self.road_networks[idx].add_road(&self.board, edge);
        self.refresh_road_length(player);
        events.push(GameEvent::RoadBuilt { player, edge });

        self.update_longest_road(events);
    }

    fn refresh_road_length(&mut self, player: PlayerId) {
        let idx = usize::from(player);
        let (length, _) = self.road_networks[idx].longest_continuous_path();
        self.road_lengths[idx] = length as u32;
    }

    // ==================== Trading ====================

    fn trade(
        &mut self,
        player: PlayerId,
        give: Resource,
        receive: Resource,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), ActionError> {
        self.require_phase(Phase::ActionPhase)?;
        if give == receive {
            return Err(ActionError::InvalidTrade);
        }

        let p = &mut self.players[usize::from(player)];
        let ratio = p.trade_ratio(give);
        if p.resources.get(give) < ratio {
            return Err(ActionError::InsufficientResources);
        }

        p.resources.subtract(&ResourceHand::single(give, ratio));
        p.resources.add(receive, 1);

        events.push(GameEvent::TradeCompleted {
            player,
            gave: give,
            gave_count: ratio,
            received: receive,
        });
        Ok(())
    }

    // ==================== Development Cards ====================

    fn buy_development_card(
        &mut self,
        player: PlayerId,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), ActionError> {
        self.require_phase(Phase::ActionPhase)?;
        if self.development_deck.is_empty() {
            return Err(ActionError::EmptyDeck);
        }
        if !self.player(player).can_afford_development_card() {
            return Err(ActionError::InsufficientResources);
        }

        let Some(card) = self.development_deck.pop() else {
            return Err(ActionError::EmptyDeck);
        };
        let p = &mut self.players[usize::from(player)];
        p.resources.subtract(&costs::development_card());
        p.development_cards.add(card);

        events.push(GameEvent::DevelopmentCardPurchased { player });
        Ok(())
    }

    fn require_card(&self, player: PlayerId, card: DevelopmentCard) -> Result<(), ActionError> {
        self.require_phase(Phase::ActionPhase)?;
        if self.player(player).development_cards.get(card) == 0 {
            return Err(ActionError::NoSuchCard);
        }
        Ok(())
    }

    fn consume_card(&mut self, player: PlayerId, card: DevelopmentCard) {
        self.players[usize::from(player)]
            .development_cards
            .remove(card);
    }

    fn play_knight(
        &mut self,
        player: PlayerId,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), ActionError> {
        self.require_card(player, DevelopmentCard::Knight)?;

        self.consume_card(player, DevelopmentCard::Knight);
        self.players[usize::from(player)].knights_played += 1;
        events.push(GameEvent::KnightPlayed { player });

        self.update_largest_army(events);
        self.phase = Phase::RobberPending;
        Ok(())
    }

    fn play_year_of_plenty(
        &mut self,
        player: PlayerId,
        first: Resource,
        second: Resource,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), ActionError> {
        self.require_card(player, DevelopmentCard::YearOfPlenty)?;

        self.consume_card(player, DevelopmentCard::YearOfPlenty);
        let p = &mut self.players[usize::from(player)];
        p.resources.add(first, 1);
        p.resources.add(second, 1);

        events.push(GameEvent::YearOfPlentyPlayed {
            player,
            resources: (first, second),
        });
        Ok(())
    }

    fn play_monopoly(
        &mut self,
        player: PlayerId,
        resource: Resource,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), ActionError> {
        self.require_card(player, DevelopmentCard::Monopoly)?;

        self.consume_card(player, DevelopmentCard::Monopoly);
        let mut total_stolen = 0;
        for other in opponents_of(player) {
            let hand = &mut self.players[usize::from(other)].resources;
            total_stolen += hand.get(resource);
            hand.set(resource, 0);
        }
        self.players[usize::from(player)]
            .resources
            .add(resource, total_stolen);

        events.push(GameEvent::MonopolyPlayed {
            player,
            resource,
            total_stolen,
        });
        Ok(())
    }

    fn play_road_building(
        &mut self,
        player: PlayerId,
        first: EdgeId,
        second: Option<EdgeId>,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), ActionError> {
        self.require_card(player, DevelopmentCard::RoadBuilding)?;
        check_edge(first);
        self.check_road_site(player, first)?;

        if let Some(second) = second {
            check_edge(second);
            if second == first || !self.board.edge_is_empty(second) {
                return Err(ActionError::EdgeOccupied);
            }
            let [a, b] = self.board.edge_nodes(first);
            let joins_first = self.board.edge_nodes(second).iter().any(|n| *n == a || *n == b);
            if !joins_first && !self.board.edge_has_road_or_settlement(second, player) {
                return Err(ActionError::NotConnected);
            }
        }

        let roads = 1 + u32::from(second.is_some());
        if self.player(player).pieces.roads < roads {
            return Err(ActionError::NoPiecesRemaining);
        }

        self.consume_card(player, DevelopmentCard::RoadBuilding);
        events.push(GameEvent::RoadBuildingPlayed { player, roads });
        self.lay_road(player, first, events);
        if let Some(second) = second {
            self.lay_road(player, second, events);
        }
        Ok(())
    }

    // ==================== Turn Management ====================

    fn end_turn(
        &mut self,
        player: PlayerId,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), ActionError> {
        self.require_phase(Phase::ActionPhase)?;

        let next_player = (player + 1) % PLAYER_COUNT as PlayerId;
        if next_player == self.starting_player {
            self.turn_counter += 1;
        }
        self.current_player = next_player;
        self.last_roll = None;
        self.phase = Phase::PreRoll;

        events.push(GameEvent::TurnEnded {
            player,
            next_player,
        });
        Ok(())
    }

    // ==================== Bonuses and Scoring ====================

    fn update_longest_road(&mut self, events: &mut Vec<GameEvent>) {
        let current = bonus_holder(&self.road_lengths, self.longest_road, MIN_LONGEST_ROAD);
        if current == self.longest_road {
            return;
        }

        let previous = std::mem::replace(&mut self.longest_road, current);
        events.push(GameEvent::LongestRoadChanged {
            previous,
            current,
            length: current.map_or(0, |p| self.road_length(p)),
        });
    }

    fn update_largest_army(&mut self, events: &mut Vec<GameEvent>) {
        let knights: [u32; PLAYER_COUNT] =
            std::array::from_fn(|p| self.players[p].knights_played);
        let current = bonus_holder(&knights, self.largest_army, MIN_LARGEST_ARMY);
        if current == self.largest_army {
            return;
        }

        let previous = std::mem::replace(&mut self.largest_army, current);
        events.push(GameEvent::LargestArmyChanged {
            previous,
            current,
            knights: current.map_or(0, |p| knights[usize::from(p)]),
        });
    }

    fn check_win_condition(&mut self, events: &mut Vec<GameEvent>) {
        if self.phase == Phase::Setup || self.is_finished() {
            return;
        }

        let current = self.current_player;
        let contenders = std::iter::once(current).chain(opponents_of(current));
        for player in contenders {
            let victory_points = self.count_points(player);
            if victory_points >= self.victory_points_to_win {
                info!("Player {} wins with {} points", player, victory_points);
                self.phase = Phase::GameOver {
                    winner: Some(player),
                };
                events.push(GameEvent::GameWon {
                    player,
                    victory_points,
                });
                return;
            }
        }
    }

    /// Refresh every player's view of the others' card counts
    fn sync_visible_counts(&mut self) {
        let resource_counts: [u32; PLAYER_COUNT] =
            std::array::from_fn(|p| self.players[p].resources.total());
        let development_counts: [u32; PLAYER_COUNT] =
            std::array::from_fn(|p| self.players[p].development_cards.total());

        for player in &mut self.players {
            for other in opponents_of(player.id) {
                let o = usize::from(other);
                player.known.resource_counts[o] = resource_counts[o];
                player.known.development_counts[o] = development_counts[o];
            }
        }
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn check_node(node: NodeId) {
    assert!(node < NODE_COUNT, "node {node} out of range");
}

fn check_edge(edge: EdgeId) {
    assert!(edge < EDGE_COUNT, "edge {edge} out of range");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Port, RESOURCE_COUNT};
    use pretty_assertions::assert_eq;

    /// Player 0 to act on a blank board
    fn action_state() -> GameState {
        let mut state = GameState::with_board(Board::new(), &GameConfig::seeded(1));
        state.phase = Phase::ActionPhase;
        state.current_player = 0;
        state.starting_player = 0;
        state
    }

    fn settle(state: &mut GameState, player: PlayerId, node: NodeId) {
        state.settle(player, node, &mut Vec::new());
    }

    fn road(state: &mut GameState, player: PlayerId, edge: EdgeId) {
        state.lay_road(player, edge, &mut Vec::new());
    }

    fn snapshot(state: &GameState) -> serde_json::Value {
        serde_json::to_value(state).unwrap()
    }

    fn dice_for(total: u8) -> (u8, u8) {
        let first = (total - 1).min(6);
        (first, total - first)
    }

    #[test]
    fn test_new_game_starts_in_setup() {
        let game = GameState::new(&GameConfig::seeded(5));
        assert_eq!(game.phase(), Phase::Setup);
        assert_eq!(game.development_deck_len(), 34);
        assert!(usize::from(game.starting_player()) < PLAYER_COUNT);
        assert_eq!(game.current_player(), game.starting_player());
    }

    #[test]
    fn test_setup_order_is_snake() {
        assert_eq!(setup_order(0), [0, 1, 2, 3, 3, 2, 1, 0]);
        assert_eq!(setup_order(2), [2, 3, 0, 1, 1, 0, 3, 2]);
    }

    #[test]
    fn test_setup_runs_forward_then_reverse() {
        let mut game = GameState::new(&GameConfig::seeded(8));
        let start = game.starting_player();
        let mut seen = Vec::new();

        while game.phase() == Phase::Setup {
            let player = game.current_player();
            let (node, edge) = game.first_legal_setup_placement().unwrap();
            seen.push(player);
            game.apply_action(player, Action::PlaceInitial { node, edge })
                .unwrap();
        }

        assert_eq!(seen, setup_order(start).to_vec());
        assert_eq!(game.phase(), Phase::PreRoll);
        assert_eq!(game.current_player(), start);
        for player in &game.players {
            assert_eq!(game.settlement_count(player.id), 2);
            assert_eq!(player.pieces.settlements, 3);
            assert_eq!(player.pieces.roads, 13);
        }
    }

    #[test]
    fn test_setup_resources_come_from_second_settlement() {
        let mut game = GameState::new(&GameConfig::seeded(21));
        let mut second = [None; PLAYER_COUNT];

        for step in 0..2 * PLAYER_COUNT {
            let player = game.current_player();
            let (node, edge) = game.first_legal_setup_placement().unwrap();
            if step >= PLAYER_COUNT {
                second[usize::from(player)] = Some(node);
            }
            game.apply_action(player, Action::PlaceInitial { node, edge })
                .unwrap();
        }

        for (p, node) in second.iter().enumerate() {
            let node = node.unwrap();
            let producing = game
                .board()
                .hexes_at_node(node)
                .filter(|h| h.resource().is_some())
                .count() as u32;
            assert_eq!(game.players[p].resources.total(), producing);
        }
    }

    #[test]
    fn test_setup_rejections() {
        let mut game = GameState::with_board(Board::new(), &GameConfig::seeded(2));
        let first = game.current_player();
        game.apply_action(first, Action::PlaceInitial { node: 31, edge: 43 })
            .unwrap();

        let next = game.current_player();
        assert_ne!(first, next);
        assert_eq!(
            game.apply_action(first, Action::PlaceInitial { node: 0, edge: 0 }),
            Err(ActionError::NotYourTurn)
        );
        assert_eq!(
            game.apply_action(next, Action::PlaceInitial { node: 31, edge: 42 }),
            Err(ActionError::NodeOccupied)
        );
        assert_eq!(
            game.apply_action(next, Action::PlaceInitial { node: 32, edge: 44 }),
            Err(ActionError::TooCloseToSettlement)
        );
        assert_eq!(
            game.apply_action(next, Action::PlaceInitial { node: 0, edge: 2 }),
            Err(ActionError::NotIncidentToSettlement)
        );
        assert_eq!(
            game.apply_action(next, Action::BuildRoad(0)),
            Err(ActionError::WrongPhase)
        );
    }

    #[test]
    fn test_settlement_rejected_on_occupied_node() {
        let mut state = action_state();
        state.players[0].resources = costs::settlement();
        settle(&mut state, 1, 30);
        road(&mut state, 0, 41);

        assert_eq!(
            state.apply_action(0, Action::BuildSettlement(30)),
            Err(ActionError::NodeOccupied)
        );
    }

    #[test]
    fn test_settlement_rejected_next_to_other_building() {
        let mut state = action_state();
        state.players[0].resources = costs::settlement();
        settle(&mut state, 1, 31);
        // 29-30
        road(&mut state, 0, 41);

        assert_eq!(
            state.apply_action(0, Action::BuildSettlement(30)),
            Err(ActionError::TooCloseToSettlement)
        );
    }

    #[test]
    fn test_settlement_rejected_without_resources() {
        let mut state = action_state();
        road(&mut state, 0, 41);

        assert_eq!(
            state.apply_action(0, Action::BuildSettlement(30)),
            Err(ActionError::InsufficientResources)
        );
    }

    #[test]
    fn test_settlement_rejected_without_pieces() {
        let mut state = action_state();
        state.players[0].resources = costs::settlement();
        state.players[0].pieces.settlements = 0;
        road(&mut state, 0, 41);

        assert_eq!(
            state.apply_action(0, Action::BuildSettlement(30)),
            Err(ActionError::NoPiecesRemaining)
        );
    }

    #[test]
    fn test_settlement_requires_own_road() {
        let mut state = action_state();
        state.players[0].resources = costs::settlement();
        road(&mut state, 1, 41);

        assert_eq!(
            state.apply_action(0, Action::BuildSettlement(30)),
            Err(ActionError::NotConnected)
        );
    }

    #[test]
    fn test_build_settlement() {
        let mut state = action_state();
        state.players[0].resources = costs::settlement();
        road(&mut state, 0, 41);

        let events = state.apply_action(0, Action::BuildSettlement(30)).unwrap();
        assert!(events.contains(&GameEvent::SettlementBuilt { player: 0, node: 30 }));
        assert_eq!(state.board().node(30).building, Building::Settlement(0));
        assert_eq!(state.settlement_count(0), 1);
        assert_eq!(state.players[0].pieces.settlements, 4);
        assert!(state.players[0].resources.is_empty());
        assert_eq!(state.count_points(0), 1);
    }

    #[test]
    fn test_rejected_action_leaves_state_unchanged() {
        let mut state = action_state();
        state.players[0].resources = ResourceHand::with_amounts(1, 0, 1, 0, 0);
        road(&mut state, 0, 41);
        let before = snapshot(&state);

        for action in [
            Action::BuildSettlement(30),
            Action::BuildCity(30),
            Action::BuildRoad(40),
            Action::BuyDevelopmentCard,
            Action::PlayKnight,
            Action::PlayRoadBuilding(40, Some(39)),
            Action::Trade {
                give: Resource::Wheat,
                receive: Resource::Wood,
            },
            Action::RollDice,
            Action::MoveRobber(3),
        ] {
            assert!(state.apply_action(0, action).is_err(), "{action:?}");
            assert_eq!(snapshot(&state), before, "{action:?}");
        }
    }

    #[test]
    fn test_build_city_replaces_settlement() {
        let mut state = action_state();
        settle(&mut state, 0, 30);
        state.players[0].resources = costs::city();

        let events = state.apply_action(0, Action::BuildCity(30)).unwrap();
        assert_eq!(events, vec![GameEvent::CityBuilt { player: 0, node: 30 }]);

        let building = state.board().node(30).building;
        assert_eq!(building, Building::City(0));
        assert_ne!(building, Building::Settlement(0));
        assert_eq!(state.settlement_count(0), 0);
        assert_eq!(state.city_count(0), 1);
        assert_eq!(state.players[0].pieces.settlements, 5);
        assert_eq!(state.players[0].pieces.cities, 3);
        assert_eq!(state.count_points(0), 2);
    }

    #[test]
    fn test_city_requires_own_settlement() {
        let mut state = action_state();
        state.players[0].resources = costs::city();
        settle(&mut state, 1, 30);

        assert_eq!(
            state.apply_action(0, Action::BuildCity(30)),
            Err(ActionError::NotYourSettlement)
        );
        assert_eq!(
            state.apply_action(0, Action::BuildCity(40)),
            Err(ActionError::NotYourSettlement)
        );

        settle(&mut state, 0, 40);
        state.board.upgrade_to_city(40, 0);
        assert_eq!(
            state.apply_action(0, Action::BuildCity(40)),
            Err(ActionError::NotYourSettlement)
        );
    }

    #[test]
    fn test_build_road_connectivity() {
        let mut state = action_state();
        state.players[0].resources = ResourceHand::with_amounts(0, 0, 3, 0, 3);
        settle(&mut state, 0, 0);

        assert_eq!(
            state.apply_action(0, Action::BuildRoad(5)),
            Err(ActionError::NotConnected)
        );
        state.apply_action(0, Action::BuildRoad(0)).unwrap();
        assert_eq!(
            state.apply_action(0, Action::BuildRoad(0)),
            Err(ActionError::EdgeOccupied)
        );
        state.apply_action(0, Action::BuildRoad(1)).unwrap();

        assert_eq!(state.road_length(0), 2);
        assert_eq!(state.players[0].pieces.roads, 13);
        assert_eq!(state.players[0].resources.total(), 2);
    }

    #[test]
    fn test_longest_road_awarded_and_contested() {
        let mut state = action_state();
        for edge in 0..4 {
            road(&mut state, 0, edge);
        }
        assert_eq!(state.longest_road_holder(), None);

        let mut events = Vec::new();
        state.lay_road(0, 4, &mut events);
        assert_eq!(state.longest_road_holder(), Some(0));
        assert!(events.contains(&GameEvent::LongestRoadChanged {
            previous: None,
            current: Some(0),
            length: 5,
        }));

        // 38-39-...-43 along the bottom
        for edge in 54..59 {
            road(&mut state, 1, edge);
        }
        assert_eq!(state.road_length(1), 5);
        assert_eq!(state.longest_road_holder(), Some(0));

        road(&mut state, 1, 59);
        assert_eq!(state.longest_road_holder(), Some(1));
        assert_eq!(state.count_points(1), 2);
    }

    #[test]
    fn test_opponent_settlement_splits_longest_road() {
        let mut state = action_state();
        // 0-1-2-3-4-5
        for edge in 0..5 {
            road(&mut state, 0, edge);
        }
        assert_eq!(state.longest_road_holder(), Some(0));

        let mut events = Vec::new();
        state.settle(1, 2, &mut events);

        assert_eq!(state.road_length(0), 3);
        assert_eq!(state.longest_road_holder(), None);
        assert!(events.contains(&GameEvent::RoadNetworkSplit {
            owner: 0,
            node: 2,
            length: 3,
        }));
    }

    #[test]
    fn test_bonus_holder_rule() {
        assert_eq!(bonus_holder(&[4, 0, 0, 0], None, 5), None);
        assert_eq!(bonus_holder(&[5, 0, 0, 0], None, 5), Some(0));
        assert_eq!(bonus_holder(&[5, 5, 0, 0], Some(0), 5), Some(0));
        assert_eq!(bonus_holder(&[5, 5, 0, 0], None, 5), None);
        assert_eq!(bonus_holder(&[5, 6, 6, 0], Some(0), 5), None);
        assert_eq!(bonus_holder(&[5, 6, 0, 0], Some(0), 5), Some(1));
        assert_eq!(bonus_holder(&[3, 0, 0, 2], Some(0), 5), None);
    }

    #[test]
    fn test_roll_distributes_resources() {
        let mut state = GameState::new(&GameConfig::seeded(13));
        let hex = state
            .board()
            .hexes()
            .iter()
            .find(|h| h.roll.is_some() && h.id != state.board().robber())
            .unwrap()
            .clone();
        let resource = hex.resource().unwrap();
        let roll = hex.roll.unwrap();

        settle(&mut state, 0, hex.nodes[0]);
        settle(&mut state, 1, hex.nodes[5]);
        state.board.upgrade_to_city(hex.nodes[5], 1);
        state.phase = Phase::PreRoll;
        let current = state.current_player();

        let expected = state.board().production_for_roll(roll);
        state.roll_with(current, dice_for(roll)).unwrap();

        for p in 0..PLAYER_COUNT {
            assert_eq!(state.players[p].resources.to_array(), expected[p]);
        }
        assert!(state.players[0].resources.get(resource) >= 1);
        assert!(state.players[1].resources.get(resource) >= 2);
        assert_eq!(state.phase(), Phase::ActionPhase);
        assert_eq!(state.last_roll(), Some(dice_for(roll)));
    }

    #[test]
    fn test_seven_discards_half_rounded_up() {
        let mut state = action_state();
        state.phase = Phase::PreRoll;
        state.players[1].resources = ResourceHand::with_amounts(2, 2, 2, 2, 1);
        state.players[2].resources = ResourceHand::with_amounts(7, 0, 0, 0, 0);

        let events = state.roll_with(0, (3, 4)).unwrap();

        assert_eq!(state.players[1].resources.total(), 4);
        assert_eq!(state.players[2].resources.total(), 7);
        assert!(events.contains(&GameEvent::CardsDiscarded { player: 1, count: 5 }));
        assert_eq!(state.phase(), Phase::RobberPending);
        assert_eq!(state.players[0].known.resource_counts[1], 4);
    }

    #[test]
    fn test_robber_moves_and_steals() {
        let mut state = action_state();
        state.phase = Phase::RobberPending;
        // Node 9 touches hexes 0, 3 and 4
        settle(&mut state, 1, 9);
        state.players[1].resources = ResourceHand::single(Resource::Wood, 1);

        let robber = state.board().robber();
        assert_eq!(
            state.apply_action(0, Action::MoveRobber(robber)),
            Err(ActionError::InvalidRobberLocation)
        );

        let events = state.apply_action(0, Action::MoveRobber(4)).unwrap();
        assert_eq!(state.board().robber(), 4);
        assert_eq!(state.players[0].resources.get(Resource::Wood), 1);
        assert!(state.players[1].resources.is_empty());
        assert!(events.contains(&GameEvent::ResourceStolen {
            thief: 0,
            victim: 1,
            resource: Resource::Wood,
        }));
        assert_eq!(state.phase(), Phase::ActionPhase);
    }

    #[test]
    fn test_robber_never_steals_from_mover() {
        let mut state = action_state();
        state.phase = Phase::RobberPending;
        settle(&mut state, 0, 9);
        state.players[0].resources = ResourceHand::single(Resource::Wood, 2);

        let events = state.apply_action(0, Action::MoveRobber(4)).unwrap();
        assert_eq!(state.players[0].resources.total(), 2);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_robber_victim_may_have_empty_hand() {
        let mut empty_robbed = 0;
        let mut card_robbed = 0;
        for seed in 0..40 {
            let mut state = GameState::with_board(Board::new(), &GameConfig::seeded(seed));
            state.phase = Phase::RobberPending;
            state.current_player = 0;
            // Nodes 9 and 11 both touch hex 4
            settle(&mut state, 1, 9);
            settle(&mut state, 2, 11);
            state.players[2].resources = ResourceHand::single(Resource::Sheep, 1);

            let events = state.apply_action(0, Action::MoveRobber(4)).unwrap();
            let stolen = events
                .iter()
                .any(|e| matches!(e, GameEvent::ResourceStolen { victim: 2, .. }));
            if stolen {
                card_robbed += 1;
                assert_eq!(state.players[0].resources.get(Resource::Sheep), 1);
            } else {
                empty_robbed += 1;
                assert!(state.players[0].resources.is_empty());
                assert_eq!(state.players[2].resources.total(), 1);
            }
            assert_eq!(state.phase(), Phase::ActionPhase);
        }
        assert!(empty_robbed > 0, "empty-handed opponent never chosen");
        assert!(card_robbed > 0, "opponent holding a card never chosen");
    }

    #[test]
    fn test_settling_on_port_improves_trade_ratio() {
        let mut state = GameState::new(&GameConfig::seeded(9));
        let player = state.current_player();
        let (node, port) = state
            .board()
            .nodes()
            .iter()
            .find_map(|n| n.port.map(|port| (n.id, port)))
            .unwrap();
        let edge = state.board().incident_edges(node)[0];
        assert_eq!(state.player(player).trade_ratios, [4; RESOURCE_COUNT]);

        state
            .apply_action(player, Action::PlaceInitial { node, edge })
            .unwrap();

        let ratios = state.player(player).trade_ratios;
        match port {
            Port::Generic => assert_eq!(ratios, [3; RESOURCE_COUNT]),
            Port::Specific(resource) => {
                for other in Resource::ALL {
                    let expected = if other == resource { 2 } else { 4 };
                    assert_eq!(ratios[other.index()], expected);
                }
            }
        }
        // Opponents are unaffected
        for other in opponents_of(player) {
            assert_eq!(state.player(other).trade_ratios, [4; RESOURCE_COUNT]);
        }
    }

    #[test]
    fn test_bank_trade_uses_best_ratio() {
        let mut state = action_state();
        state.players[0].resources = ResourceHand::with_amounts(4, 0, 0, 0, 0);

        let trade = Action::Trade {
            give: Resource::Wheat,
            receive: Resource::Wood,
        };
        state.apply_action(0, trade).unwrap();
        assert_eq!(state.players[0].resources, ResourceHand::single(Resource::Wood, 1));

        state.players[0].resources = ResourceHand::with_amounts(3, 0, 0, 0, 0);
        assert_eq!(
            state.apply_action(0, trade),
            Err(ActionError::InsufficientResources)
        );

        state.players[0].apply_port(Port::Generic);
        state.apply_action(0, trade).unwrap();
        assert_eq!(state.players[0].resources, ResourceHand::single(Resource::Wood, 1));

        assert_eq!(
            state.apply_action(
                0,
                Action::Trade {
                    give: Resource::Wood,
                    receive: Resource::Wood
                }
            ),
            Err(ActionError::InvalidTrade)
        );
    }

    #[test]
    fn test_buy_development_card() {
        let mut state = action_state();
        state.players[0].resources = costs::development_card();

        state.apply_action(0, Action::BuyDevelopmentCard).unwrap();
        assert_eq!(state.development_deck_len(), 33);
        assert_eq!(state.players[0].development_cards.total(), 1);
        assert!(state.players[0].resources.is_empty());
        assert_eq!(state.players[1].known.development_counts[0], 1);

        state.players[0].resources = costs::development_card();
        state.development_deck.clear();
        assert_eq!(
            state.apply_action(0, Action::BuyDevelopmentCard),
            Err(ActionError::EmptyDeck)
        );
    }

    #[test]
    fn test_knights_award_largest_army() {
        let mut state = action_state();
        assert_eq!(
            state.apply_action(0, Action::PlayKnight),
            Err(ActionError::NoSuchCard)
        );

        for _ in 0..3 {
            state.players[0].development_cards.add(DevelopmentCard::Knight);
        }
        for hex in [4, 5, 6] {
            state.apply_action(0, Action::PlayKnight).unwrap();
            assert_eq!(state.phase(), Phase::RobberPending);
            state.apply_action(0, Action::MoveRobber(hex)).unwrap();
        }

        assert_eq!(state.players[0].knights_played, 3);
        assert_eq!(state.largest_army_holder(), Some(0));
        assert_eq!(state.count_points(0), 2);
    }

    #[test]
    fn test_year_of_plenty_and_monopoly() {
        let mut state = action_state();
        state.players[0].development_cards.add(DevelopmentCard::YearOfPlenty);
        state.players[0].development_cards.add(DevelopmentCard::Monopoly);
        state.players[1].resources = ResourceHand::with_amounts(0, 0, 0, 3, 0);
        state.players[3].resources = ResourceHand::with_amounts(1, 0, 0, 2, 0);

        state
            .apply_action(0, Action::PlayYearOfPlenty(Resource::Stone, Resource::Stone))
            .unwrap();
        assert_eq!(state.players[0].resources.get(Resource::Stone), 2);

        let events = state
            .apply_action(0, Action::PlayMonopoly(Resource::Sheep))
            .unwrap();
        assert_eq!(state.players[0].resources.get(Resource::Sheep), 5);
        assert_eq!(state.players[1].resources.total(), 0);
        assert_eq!(state.players[3].resources.total(), 1);
        assert!(events.contains(&GameEvent::MonopolyPlayed {
            player: 0,
            resource: Resource::Sheep,
            total_stolen: 5,
        }));
        assert_eq!(state.players[0].development_cards.total(), 0);
    }

    #[test]
    fn test_road_building_places_connected_pair() {
        let mut state = action_state();
        settle(&mut state, 0, 0);
        state.players[0].development_cards.add(DevelopmentCard::RoadBuilding);

        // 5-6 touches nothing of player 0
        assert_eq!(
            state.apply_action(0, Action::PlayRoadBuilding(0, Some(5))),
            Err(ActionError::NotConnected)
        );
        assert_eq!(state.players[0].development_cards.total(), 1);
        assert!(state.board().edge_is_empty(0));

        // 1-2 only connects through 0-1
        state
            .apply_action(0, Action::PlayRoadBuilding(0, Some(1)))
            .unwrap();
        assert_eq!(state.road_length(0), 2);
        assert_eq!(state.players[0].pieces.roads, 13);
        assert_eq!(state.players[0].development_cards.total(), 0);
    }

    #[test]
    fn test_turn_counter_counts_rotations() {
        let mut state = action_state();
        for expected in [0, 1, 2, 3] {
            assert_eq!(state.current_player(), expected);
            state.phase = Phase::ActionPhase;
            state.apply_action(expected, Action::EndTurn).unwrap();
        }
        assert_eq!(state.current_player(), 0);
        assert_eq!(state.turn_counter(), 1);
        assert_eq!(state.phase(), Phase::PreRoll);
    }

    #[test]
    fn test_reaching_target_ends_game() {
        let mut state = action_state();
        state.settlements[0] = 9;
        state.players[0].resources = costs::settlement();
        road(&mut state, 0, 41);

        let events = state.apply_action(0, Action::BuildSettlement(30)).unwrap();
        assert_eq!(state.winner(), Some(0));
        assert!(events.contains(&GameEvent::GameWon {
            player: 0,
            victory_points: 10,
        }));
        assert_eq!(
            state.apply_action(0, Action::EndTurn),
            Err(ActionError::GameOver)
        );
    }

    #[test]
    fn test_victory_point_cards_are_not_scored() {
        let mut state = action_state();
        state.players[0].development_cards.add(DevelopmentCard::VictoryPoint);
        settle(&mut state, 0, 30);
        assert_eq!(state.count_points(0), 1);
        assert_eq!(state.players[0].victory_point_cards(), 1);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_node_panics() {
        let mut state = action_state();
        let _ = state.apply_action(0, Action::BuildSettlement(NODE_COUNT));
    }
}
