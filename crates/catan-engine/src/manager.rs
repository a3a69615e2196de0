//! Game orchestration.
//!
//! `GameManager` owns a [`GameState`] and one [`Agent`] per player. It runs
//! setup, then turns, asking agents for moves and applying the first legal
//! one. Nothing an agent returns is trusted: out-of-range ids are skipped
//! with a warning and illegal moves are simply passed over.

use crate::actions::{Action, GameEvent};
use crate::agent::{Agent, Decision, InitialPlacement, StateVector};
use crate::board::{PlayerId, EDGE_COUNT, HEX_COUNT, NODE_COUNT, PLAYER_COUNT};
use crate::config::{ConfigError, GameConfig};
use crate::game::{ActionError, GameState, Phase};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors creating a [`GameManager`]
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("expected {expected} agents, got {found}")]
    AgentCount { expected: usize, found: usize },
}

/// Summary of a finished game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub winner: Option<PlayerId>,
    /// Full rotations completed
    pub rounds: u32,
    pub victory_points: [u32; PLAYER_COUNT],
    pub longest_road: Option<PlayerId>,
    pub largest_army: Option<PlayerId>,
    /// Successful actions, dice rolls included
    pub actions_applied: u64,
}

/// Runs a game between agents
pub struct GameManager {
    state: GameState,
    agents: Vec<Box<dyn Agent>>,
    config: GameConfig,
    actions_applied: u64,
}

impl GameManager {
    /// Set up a fresh game. `agents[i]` plays as player `i`.
    ///
    /// # Errors
    ///
    /// Fails on an invalid config or if there is not exactly one agent per player.
    pub fn new(config: GameConfig, agents: Vec<Box<dyn Agent>>) -> Result<Self, ManagerError> {
        let state = GameState::new(&config);
        Self::with_state(state, config, agents)
    }

    /// Take over an existing game state
    pub fn with_state(
        state: GameState,
        config: GameConfig,
        agents: Vec<Box<dyn Agent>>,
    ) -> Result<Self, ManagerError> {
        config.validate()?;
        if agents.len() != PLAYER_COUNT {
            return Err(ManagerError::AgentCount {
                expected: PLAYER_COUNT,
                found: agents.len(),
            });
        }
        Ok(Self {
            state,
            agents,
            config,
            actions_applied: 0,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Play the game to the end, or until the round cap is reached
    pub fn run(&mut self) -> GameOutcome {
        info!("Starting game, player {} goes first", self.state.starting_player());
        self.run_setup();

        while !self.state.is_finished() {
            if self.state.turn_counter() >= self.config.max_rounds {
                self.state.end_without_winner();
                break;
            }
            self.play_turn();
        }

        let outcome = self.outcome();
        match outcome.winner {
            Some(winner) => info!(
                "Player {} won after {} rounds with {} points",
                winner, outcome.rounds, outcome.victory_points[usize::from(winner)]
            ),
            None => info!("No winner after {} rounds", outcome.rounds),
        }
        outcome
    }

    /// Summary of the game so far
    pub fn outcome(&self) -> GameOutcome {
        let mut victory_points = [0; PLAYER_COUNT];
        for (id, points) in victory_points.iter_mut().enumerate() {
            *points = self.state.count_points(id as PlayerId);
        }
        GameOutcome {
            winner: self.state.winner(),
            rounds: self.state.turn_counter(),
            victory_points,
            longest_road: self.state.longest_road_holder(),
            largest_army: self.state.largest_army_holder(),
            actions_applied: self.actions_applied,
        }
    }

    /// Collect setup placements until every player has placed twice
    pub fn run_setup(&mut self) {
        while self.state.phase() == Phase::Setup {
            let player = self.state.current_player();
            if !self.request_initial_placement(player) && !self.fallback_initial_placement(player)
            {
                warn!("No legal setup placement left for player {}", player);
                self.state.end_without_winner();
                return;
            }
        }
        info!("Setup complete, player {} starts", self.state.current_player());
    }

    fn request_initial_placement(&mut self, player: PlayerId) -> bool {
        for attempt in 1..=self.config.max_setup_attempts {
            let view = StateVector::observe(&self.state, player);
            let InitialPlacement { node, edge } = self.agent(player).place_initial(&view);
            let action = Action::PlaceInitial { node, edge };
            if !in_range(&action) {
                warn!("Player {} chose out-of-range setup {:?}", player, action);
                continue;
            }
            match self.apply(player, action) {
                Ok(_) => return true,
                Err(reason) => {
                    debug!("Setup attempt {} by player {} rejected: {}", attempt, player, reason)
                }
            }
        }
        false
    }

    fn fallback_initial_placement(&mut self, player: PlayerId) -> bool {
        let Some((node, edge)) = self.state.first_legal_setup_placement() else {
            return false;
        };
        warn!(
            "Player {} gave no legal setup placement, using node {} edge {}",
            player, node, edge
        );
        self.apply(player, Action::PlaceInitial { node, edge }).is_ok()
    }

    /// Play one full turn for the current player
    pub fn play_turn(&mut self) {
        let player = self.state.current_player();

        if let Err(reason) = self.apply(player, Action::RollDice) {
            warn!("Player {} could not roll: {}", player, reason);
            return;
        }
        self.resolve_robber(player);

        let mut applied = 0;
        while !self.state.is_finished() && applied < self.config.max_actions_per_turn {
            let view = StateVector::observe(&self.state, player);
            let ranked = match self.agent(player).decide(&view) {
                Decision::EndTurn => break,
                Decision::Ranked(ranked) => ranked,
            };

            match self.apply_first_legal(player, &ranked) {
                Some(Action::EndTurn) | None => break,
                Some(_) => applied += 1,
            }
        }

        if applied >= self.config.max_actions_per_turn {
            warn!("Player {} hit the action cap, ending turn", player);
        }
        self.finish_turn(player);
    }

    /// Try `ranked` in order and apply the first legal action. Ending the
    /// turn is returned without being applied.
    fn apply_first_legal(&mut self, player: PlayerId, ranked: &[Action]) -> Option<Action> {
        for &action in ranked {
            if action == Action::EndTurn {
                return Some(action);
            }
            if !in_range(&action) {
                warn!("Player {} chose out-of-range {:?}", player, action);
                continue;
            }
            if self.apply(player, action).is_ok() {
                self.resolve_robber(player);
                return Some(action);
            }
        }
        None
    }

    fn finish_turn(&mut self, player: PlayerId) {
        if self.state.is_finished() || self.state.current_player() != player {
            return;
        }
        if let Err(reason) = self.apply(player, Action::EndTurn) {
            warn!("Player {} could not end turn: {}", player, reason);
        }
    }

    /// Move the robber if a 7 or a knight left it pending
    fn resolve_robber(&mut self, player: PlayerId) {
        if self.state.phase() != Phase::RobberPending {
            return;
        }

        let view = StateVector::observe(&self.state, player);
        for hex in self.agent(player).move_robber(&view) {
            if hex >= HEX_COUNT {
                warn!("Player {} chose out-of-range robber hex {}", player, hex);
                continue;
            }
            if self.apply(player, Action::MoveRobber(hex)).is_ok() {
                return;
            }
        }

        let Some(hex) = self.state.legal_robber_hexes().next() else {
            return;
        };
        warn!("Player {} gave no legal robber hex, using {}", player, hex);
        if let Err(reason) = self.apply(player, Action::MoveRobber(hex)) {
            warn!("Fallback robber move failed: {}", reason);
        }
    }

    fn apply(&mut self, player: PlayerId, action: Action) -> Result<Vec<GameEvent>, ActionError> {
        let events = self.state.apply_action(player, action)?;
        self.actions_applied += 1;
        for event in &events {
            debug!("{:?}", event);
        }
        Ok(events)
    }

    fn agent(&mut self, player: PlayerId) -> &mut dyn Agent {
        self.agents[usize::from(player)].as_mut()
    }
}

/// Whether every id in `action` names a real board element
fn in_range(action: &Action) -> bool {
    match *action {
        Action::PlaceInitial { node, edge } => node < NODE_COUNT && edge < EDGE_COUNT,
        Action::MoveRobber(hex) => hex < HEX_COUNT,
        Action::BuildSettlement(node) | Action::BuildCity(node) => node < NODE_COUNT,
        Action::BuildRoad(edge) => edge < EDGE_COUNT,
        Action::PlayRoadBuilding(first, second) => {
            first < EDGE_COUNT && second.map_or(true, |edge| edge < EDGE_COUNT)
        }
        Action::RollDice
        | Action::BuyDevelopmentCard
        | Action::PlayKnight
        | Action::PlayYearOfPlenty(..)
        | Action::PlayMonopoly(_)
        | Action::Trade { .. }
        | Action::EndTurn => true,
    }
}
