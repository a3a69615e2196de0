//! Catan Engine - rules and simulation for four-player Settlers of Catan
//!
//! This crate provides the core game logic, including:
//! - A generic graph with longest-path search
//! - The fixed 54-node, 72-edge board with randomised hexes and ports
//! - Per-player road networks that split when an opponent builds through them
//! - Player state, resources and development cards
//! - Game state machine with full rule enforcement
//! - Agents that play from a flat numeric view of the game
//!
//! # Modules
//!
//! - [`graph`]: Nodes, edges, adjacency and longest continuous path
//! - [`board`]: Board layout, buildings, roads, robber and production
//! - [`road_network`]: Road graphs used for Longest Road
//! - [`player`]: Player state, hands and costs
//! - [`actions`]: Actions players take and the events they produce
//! - [`game`]: Game state machine
//! - [`agent`]: State vectors and decision-making players
//! - [`manager`]: Runs a whole game between agents
//! - [`config`]: Game tunables

pub mod actions;
pub mod agent;
pub mod board;
pub mod config;
pub mod game;
pub mod graph;
pub mod manager;
pub mod player;
pub mod road_network;

// Re-export commonly used types
pub use actions::{Action, GameEvent};
pub use agent::{
    Agent, Decision, InitialPlacement, ProbabilityAgent, RandomAgent, ScoreSheet, StateVector,
};
pub use board::{Board, Building, EdgeId, HexId, NodeId, PlayerId, Port, Resource};
pub use config::{ConfigError, GameConfig};
pub use game::{ActionError, GameState, Phase};
pub use graph::Graph;
pub use manager::{GameManager, GameOutcome, ManagerError};
pub use player::{DevelopmentCard, Player, ResourceHand};
pub use road_network::RoadNetwork;
