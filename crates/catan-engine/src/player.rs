//! Player state and resource management.
//!
//! This module contains:
//! - Player struct with resources, development cards, pieces and trade ratios
//! - ResourceHand for managing resource counts
//! - Development card types and deck construction
//! - Building costs

use crate::board::{Port, PlayerId, Resource, PLAYER_COUNT, RESOURCE_COUNT};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Development card types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DevelopmentCard {
    /// Move robber and steal, counts toward Largest Army
    Knight,
    /// Take any 2 resources from the bank
    YearOfPlenty,
    /// Build 2 roads for free
    RoadBuilding,
    /// All other players give you all of one resource type
    Monopoly,
    /// Held for its point, never played
    VictoryPoint,
}

impl DevelopmentCard {
    /// All card kinds, in state-vector order
    pub const ALL: [DevelopmentCard; 5] = [
        DevelopmentCard::Knight,
        DevelopmentCard::YearOfPlenty,
        DevelopmentCard::RoadBuilding,
        DevelopmentCard::Monopoly,
        DevelopmentCard::VictoryPoint,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// How many copies of this card the deck holds
    pub const fn deck_count(self) -> usize {
        match self {
            DevelopmentCard::Knight => 20,
            DevelopmentCard::YearOfPlenty
            | DevelopmentCard::RoadBuilding
            | DevelopmentCard::Monopoly => 3,
            DevelopmentCard::VictoryPoint => 5,
        }
    }

    /// Create the unshuffled development card deck (34 cards)
    pub fn standard_deck() -> Vec<DevelopmentCard> {
        Self::ALL
            .iter()
            .flat_map(|&card| std::iter::repeat(card).take(card.deck_count()))
            .collect()
    }
}

/// Development cards held by one player, counted per kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevelopmentHand {
    counts: [u32; 5],
}

impl DevelopmentHand {
    pub fn get(&self, card: DevelopmentCard) -> u32 {
        self.counts[card.index()]
    }

    pub fn add(&mut self, card: DevelopmentCard) {
        self.counts[card.index()] += 1;
    }

    /// Remove one card of the given kind, returning false if none is held
    pub fn remove(&mut self, card: DevelopmentCard) -> bool {
        let count = &mut self.counts[card.index()];
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Counts in [`DevelopmentCard::ALL`] order
    pub fn counts(&self) -> [u32; 5] {
        self.counts
    }
}

/// A hand of resources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHand {
    pub wheat: u32,
    pub stone: u32,
    pub brick: u32,
    pub sheep: u32,
    pub wood: u32,
}

impl ResourceHand {
    /// Create an empty hand
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hand with specific amounts, in canonical resource order
    pub fn with_amounts(wheat: u32, stone: u32, brick: u32, sheep: u32, wood: u32) -> Self {
        Self {
            wheat,
            stone,
            brick,
            sheep,
            wood,
        }
    }

    /// Create a hand with a single resource
    pub fn single(resource: Resource, amount: u32) -> Self {
        let mut hand = Self::new();
        hand.add(resource, amount);
        hand
    }

    /// Total number of resource cards
    pub fn total(&self) -> u32 {
        self.wheat + self.stone + self.brick + self.sheep + self.wood
    }

    /// Check if hand is empty
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Get count of a specific resource
    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Wheat => self.wheat,
            Resource::Stone => self.stone,
            Resource::Brick => self.brick,
            Resource::Sheep => self.sheep,
            Resource::Wood => self.wood,
        }
    }

    /// Set count of a specific resource
    pub fn set(&mut self, resource: Resource, count: u32) {
        match resource {
            Resource::Wheat => self.wheat = count,
            Resource::Stone => self.stone = count,
            Resource::Brick => self.brick = count,
            Resource::Sheep => self.sheep = count,
            Resource::Wood => self.wood = count,
        }
    }

    /// Add resources to hand
    pub fn add(&mut self, resource: Resource, amount: u32) {
        self.set(resource, self.get(resource) + amount);
    }

    /// Check if can afford a cost
    pub fn can_afford(&self, cost: &ResourceHand) -> bool {
        Resource::ALL
            .iter()
            .all(|&resource| self.get(resource) >= cost.get(resource))
    }

    /// Subtract a cost (panics if insufficient)
    pub fn subtract(&mut self, cost: &ResourceHand) {
        assert!(self.can_afford(cost), "Cannot afford this cost");
        for resource in Resource::ALL {
            self.set(resource, self.get(resource) - cost.get(resource));
        }
    }

    /// Remove one uniformly random card.
    ///
    /// A card position is drawn over the whole hand, then the resource
    /// buckets are walked in canonical order until the position lands in one.
    pub fn steal_random<R: Rng>(&mut self, rng: &mut R) -> Option<Resource> {
        let total = self.total();
        if total == 0 {
            return None;
        }

        let mut position = rng.gen_range(0..total);
        for resource in Resource::ALL {
            let count = self.get(resource);
            if position < count {
                self.set(resource, count - 1);
                return Some(resource);
            }
            position -= count;
        }
        None
    }

    /// Remove `count` random cards, returning what was removed
    pub fn discard_random<R: Rng>(&mut self, count: u32, rng: &mut R) -> ResourceHand {
        let mut discarded = ResourceHand::new();
        for _ in 0..count {
            match self.steal_random(rng) {
                Some(resource) => discarded.add(resource, 1),
                None => break,
            }
        }
        discarded
    }

    /// Counts in canonical resource order
    pub fn to_array(&self) -> [u32; RESOURCE_COUNT] {
        Resource::ALL.map(|resource| self.get(resource))
    }
}

/// Building costs
pub mod costs {
    use super::ResourceHand;

    /// Cost to build a road: 1 brick, 1 wood
    pub fn road() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 1, 0, 1)
    }

    /// Cost to build a settlement: 1 wheat, 1 brick, 1 sheep, 1 wood
    pub fn settlement() -> ResourceHand {
        ResourceHand::with_amounts(1, 0, 1, 1, 1)
    }

    /// Cost to upgrade to city: 2 wheat, 3 stone
    pub fn city() -> ResourceHand {
        ResourceHand::with_amounts(2, 3, 0, 0, 0)
    }

    /// Cost to buy a development card: 1 wheat, 1 stone, 1 sheep
    pub fn development_card() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 0, 1, 0)
    }
}

/// Building pieces a player has left to place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pieces {
    pub roads: u32,
    pub settlements: u32,
    pub cities: u32,
}

impl Default for Pieces {
    fn default() -> Self {
        Self {
            roads: 15,
            settlements: 5,
            cities: 4,
        }
    }
}

/// What a player can see of everyone else: card counts, never card kinds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentView {
    /// Resource card count per player id
    pub resource_counts: [u32; PLAYER_COUNT],
    /// Development card count per player id
    pub development_counts: [u32; PLAYER_COUNT],
}

/// The other three players, in turn order after `player`
pub fn opponents_of(player: PlayerId) -> [PlayerId; PLAYER_COUNT - 1] {
    let count = PLAYER_COUNT as PlayerId;
    [1, 2, 3].map(|offset| (player + offset) % count)
}

/// A single player's state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Player ID (0-3)
    pub id: PlayerId,
    /// Current resources
    pub resources: ResourceHand,
    /// Development cards in hand (unplayed)
    pub development_cards: DevelopmentHand,
    /// Pieces still in the supply
    pub pieces: Pieces,
    /// Cards given to the bank per card received, per resource
    pub trade_ratios: [u32; RESOURCE_COUNT],
    /// Visible card counts of the other players
    pub known: OpponentView,
    /// Number of knights played (for Largest Army)
    pub knights_played: u32,
}

impl Player {
    /// Create a new player
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            resources: ResourceHand::new(),
            development_cards: DevelopmentHand::default(),
            pieces: Pieces::default(),
            trade_ratios: [4; RESOURCE_COUNT],
            known: OpponentView::default(),
            knights_played: 0,
        }
    }

    /// Bank trade ratio for giving `resource`
    pub fn trade_ratio(&self, resource: Resource) -> u32 {
        self.trade_ratios[resource.index()]
    }

    /// Improve trade ratios after settling on a port. Ratios never get worse.
    pub fn apply_port(&mut self, port: Port) {
        let rate = port.rate();
        for resource in Resource::ALL {
            let covered = match port {
                Port::Generic => true,
                Port::Specific(specific) => specific == resource,
            };
            if covered {
                let ratio = &mut self.trade_ratios[resource.index()];
                *ratio = (*ratio).min(rate);
            }
        }
    }

    /// Can this player pay for a development card?
    pub fn can_afford_development_card(&self) -> bool {
        self.resources.can_afford(&costs::development_card())
    }

    /// Number of victory point cards held
    pub fn victory_point_cards(&self) -> u32 {
        self.development_cards.get(DevelopmentCard::VictoryPoint)
    }
}
