use crate::moves::Move;
use crate::player::Player;

/// Number of turns each player spends placing scouts before play begins.
pub const PLACE_SCOUT_TURNS: usize = 5;

/// Play budget per turn during scout placement.
pub const STARTING_PLAYS_PER_TURN: u32 = 1;

/// Play budget per turn once placement is over.
pub const PLAYS_PER_TURN: u32 = 2;

/// A completed turn. Contains only valid, applied moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PastTurn {
    pub player: Player,
    pub moves: Vec<Move>,
}

/// The turn in progress. Contains only valid moves, but may not be complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentTurn {
    pub player: Player,
    pub moves: Vec<Move>,
    /// Number of plays the player has left this turn.
    pub plays: u32,
}

impl CurrentTurn {
    pub(crate) fn has_enough_plays(&self, cost: u32) -> bool {
        self.plays >= cost
    }
}
