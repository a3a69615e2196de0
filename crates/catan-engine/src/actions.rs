//! Game actions that players can take.
//!
//! This module defines all possible actions in the game and the events
//! that result from those actions.

use crate::board::{EdgeId, HexId, NodeId, PlayerId, Resource};
use serde::{Deserialize, Serialize};

/// Number of distinct bank trades: every ordered pair of different resources
pub const TRADE_COUNT: usize = 20;

/// All possible actions a player can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    // ==================== Setup Phase ====================
    /// Place a free settlement and a free road touching it
    PlaceInitial { node: NodeId, edge: EdgeId },

    // ==================== Turn Actions ====================
    /// Roll the dice (must be done at start of turn)
    RollDice,

    // ==================== Robber Actions ====================
    /// Move the robber to a new hex (after rolling 7 or playing a knight)
    MoveRobber(HexId),

    // ==================== Building Actions ====================
    BuildSettlement(NodeId),
    /// Upgrade one of your settlements to a city
    BuildCity(NodeId),
    BuildRoad(EdgeId),
    /// Buy a development card from the deck
    BuyDevelopmentCard,

    // ==================== Development Card Actions ====================
    /// Play a knight card (move robber, steal, counts toward largest army)
    PlayKnight,
    /// Take two resources from the bank
    PlayYearOfPlenty(Resource, Resource),
    /// Take all of one resource from every opponent
    PlayMonopoly(Resource),
    /// Build one or two roads for free
    PlayRoadBuilding(EdgeId, Option<EdgeId>),

    // ==================== Trading ====================
    /// Trade with the bank at the player's best ratio for `give`
    Trade { give: Resource, receive: Resource },

    // ==================== Turn Management ====================
    /// End your turn
    EndTurn,
}

impl Action {
    /// Bank trade for a trade index in `0..20`.
    ///
    /// Index `offered * 4 + j` gives away resource `offered` for the `j`-th of
    /// the four other resources, in canonical order.
    pub fn trade_from_index(index: usize) -> Option<Action> {
        if index >= TRADE_COUNT {
            return None;
        }
        let give = Resource::from_index(index / 4)?;
        let receive = Resource::ALL
            .into_iter()
            .filter(|&r| r != give)
            .nth(index % 4)?;
        Some(Action::Trade { give, receive })
    }

    /// Inverse of [`Action::trade_from_index`]
    pub fn trade_index(give: Resource, receive: Resource) -> Option<usize> {
        let position = Resource::ALL
            .into_iter()
            .filter(|&r| r != give)
            .position(|r| r == receive)?;
        Some(give.index() * 4 + position)
    }
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A player finished a setup placement
    InitialPlacement {
        player: PlayerId,
        node: NodeId,
        edge: EdgeId,
    },

    /// Setup resources were handed out for second settlements
    SetupResourcesGranted {
        distributions: Vec<(PlayerId, Resource, u32)>,
    },

    /// Dice were rolled
    DiceRolled {
        player: PlayerId,
        roll: (u8, u8),
        total: u8,
    },

    /// Resources were distributed after a dice roll
    ResourcesDistributed {
        distributions: Vec<(PlayerId, Resource, u32)>,
    },

    /// Player had to discard cards
    CardsDiscarded { player: PlayerId, count: u32 },

    /// The robber was moved
    RobberMoved {
        player: PlayerId,
        from: HexId,
        to: HexId,
    },

    /// A resource was stolen
    ResourceStolen {
        thief: PlayerId,
        victim: PlayerId,
        resource: Resource,
    },

    /// A settlement was built
    SettlementBuilt { player: PlayerId, node: NodeId },

    /// A settlement was upgraded to a city
    CityBuilt { player: PlayerId, node: NodeId },

    /// A road was built
    RoadBuilt { player: PlayerId, edge: EdgeId },

    /// A player's road network was cut by an opponent's settlement
    RoadNetworkSplit {
        owner: PlayerId,
        node: NodeId,
        length: u32,
    },

    /// A development card was purchased
    DevelopmentCardPurchased { player: PlayerId },

    /// A knight was played
    KnightPlayed { player: PlayerId },

    /// Year of plenty card was played
    YearOfPlentyPlayed {
        player: PlayerId,
        resources: (Resource, Resource),
    },

    /// Monopoly card was played
    MonopolyPlayed {
        player: PlayerId,
        resource: Resource,
        total_stolen: u32,
    },

    /// Road building card was played
    RoadBuildingPlayed { player: PlayerId, roads: u32 },

    /// Bank or port trade completed
    TradeCompleted {
        player: PlayerId,
        gave: Resource,
        gave_count: u32,
        received: Resource,
    },

    /// Longest road changed hands
    LongestRoadChanged {
        previous: Option<PlayerId>,
        current: Option<PlayerId>,
        length: u32,
    },

    /// Largest army changed hands
    LargestArmyChanged {
        previous: Option<PlayerId>,
        current: Option<PlayerId>,
        knights: u32,
    },

    /// Turn ended
    TurnEnded {
        player: PlayerId,
        next_player: PlayerId,
    },

    /// A player won the game
    GameWon {
        player: PlayerId,
        victory_points: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_trade_index_layout() {
        assert_eq!(
            Action::trade_from_index(0),
            Some(Action::Trade {
                give: Resource::Wheat,
                receive: Resource::Stone
            })
        );
        assert_eq!(
            Action::trade_from_index(3),
            Some(Action::Trade {
                give: Resource::Wheat,
                receive: Resource::Wood
            })
        );
        // Stone skips itself: Wheat, Brick, Sheep, Wood
        assert_eq!(
            Action::trade_from_index(5),
            Some(Action::Trade {
                give: Resource::Stone,
                receive: Resource::Brick
            })
        );
        assert_eq!(
            Action::trade_from_index(19),
            Some(Action::Trade {
                give: Resource::Wood,
                receive: Resource::Sheep
            })
        );
        assert_eq!(Action::trade_from_index(20), None);
    }

    #[test]
    fn test_trade_index_inverse() {
        for index in 0..TRADE_COUNT {
            let Some(Action::Trade { give, receive }) = Action::trade_from_index(index) else {
                panic!("index {index} has no trade");
            };
            assert_ne!(give, receive);
            assert_eq!(Action::trade_index(give, receive), Some(index));
        }
        assert_eq!(Action::trade_index(Resource::Sheep, Resource::Sheep), None);
    }

    #[test]
    fn test_action_serializes_as_tagged_enum() {
        let json = serde_json::to_string(&Action::BuildRoad(12)).unwrap();
        assert_eq!(json, r#"{"BuildRoad":12}"#);
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Action::BuildRoad(12));
    }
}
