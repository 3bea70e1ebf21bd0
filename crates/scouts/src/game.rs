use crate::board::Board;
use crate::moves::{Move, MoveError};
use crate::player::Player;
use crate::possible_moves::PossibleMoves;
use crate::turn::{CurrentTurn, PastTurn, PLAYS_PER_TURN, STARTING_PLAYS_PER_TURN};
use serde::Serialize;
use std::fmt;

/// Lifecycle state of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Players are placing their five scouts each.
    PlacingScouts,
    /// Both players have placed all scouts; regular moves are allowed.
    Playing,
    /// Player A brought a returning scout home.
    EndedAWon,
    /// Player B brought a returning scout home.
    EndedBWon,
}

impl GamePhase {
    /// The end phase in which `player` has won.
    #[must_use]
    pub const fn won_by(player: Player) -> Self {
        match player {
            Player::A => GamePhase::EndedAWon,
            Player::B => GamePhase::EndedBWon,
        }
    }

    /// The winning player, if the game has ended.
    #[must_use]
    pub const fn winner(self) -> Option<Player> {
        match self {
            GamePhase::EndedAWon => Some(Player::A),
            GamePhase::EndedBWon => Some(Player::B),
            _ => None,
        }
    }

    /// Whether the game has ended.
    #[must_use]
    pub const fn is_ended(self) -> bool {
        self.winner().is_some()
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GamePhase::PlacingScouts => write!(f, "placing_scouts"),
            GamePhase::Playing => write!(f, "playing"),
            GamePhase::EndedAWon => write!(f, "ended_a_won"),
            GamePhase::EndedBWon => write!(f, "ended_b_won"),
        }
    }
}

/// Error returned by [`Game::from_past_turns`] naming the turn and move that
/// failed to re-apply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to apply turn {turn}, move {mv:?} for player {player}: {source}")]
pub struct PastTurnsError {
    pub turn: usize,
    pub mv: String,
    pub player: Player,
    #[source]
    pub source: MoveError,
}

/// A game of Scouts: the board, the archived turns, the turn in progress,
/// and the lifecycle phase.
///
/// Given the same sequence of `(player, move)` applications two games end in
/// identical state. The aggregate has no internal synchronization; callers
/// serialize access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub(crate) board: Board,
    pub(crate) turns: Vec<PastTurn>,
    pub(crate) current: CurrentTurn,
    pub(crate) phase: GamePhase,
    pub(crate) placed_boulders: [bool; 2],
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// A fresh game: empty board, player A to place the first scout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            turns: Vec::new(),
            current: CurrentTurn {
                player: Player::A,
                moves: Vec::new(),
                plays: STARTING_PLAYS_PER_TURN,
            },
            phase: GamePhase::PlacingScouts,
            placed_boulders: [false, false],
        }
    }

    /// Rebuild a game by re-applying the given archived turns.
    pub fn from_past_turns(turns: &[PastTurn]) -> Result<Self, PastTurnsError> {
        let mut game = Game::new();
        for (i, turn) in turns.iter().enumerate() {
            for mv in &turn.moves {
                game.apply(turn.player, mv).map_err(|source| PastTurnsError {
                    turn: i + 1,
                    mv: mv.to_string(),
                    player: turn.player,
                    source,
                })?;
            }
        }
        Ok(game)
    }

    /// Validate and apply a move for the given player.
    ///
    /// Fails without mutating the game if it is not the player's turn or the
    /// move does not validate.
    pub fn apply(&mut self, player: Player, mv: &Move) -> Result<(), MoveError> {
        if self.current.player != player {
            return Err(MoveError::NotYourTurn(player));
        }
        mv.validate(self)?;
        mv.apply(self);
        Ok(())
    }

    /// The board.
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The archived turns, oldest first. Does not include the current turn.
    #[must_use]
    pub fn past_turns(&self) -> &[PastTurn] {
        &self.turns
    }

    /// The archived turns of the given player.
    pub fn player_past_turns(&self, player: Player) -> impl Iterator<Item = &PastTurn> {
        self.turns.iter().filter(move |turn| turn.player == player)
    }

    /// The turn in progress.
    #[must_use]
    pub fn current_turn(&self) -> &CurrentTurn {
        &self.current
    }

    /// The lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// The winner, if the game has ended.
    #[must_use]
    pub fn winner(&self) -> Option<Player> {
        self.phase.winner()
    }

    /// Whether the given player has already placed their boulder.
    #[must_use]
    pub fn placed_boulder(&self, player: Player) -> bool {
        self.placed_boulders[player.index()]
    }

    /// Enumerate the legal moves for the given player. See
    /// [`PossibleMoves`].
    #[must_use]
    pub fn possible_moves(&self, player: Player) -> PossibleMoves {
        crate::possible_moves::calculate(self, player)
    }

    /// Record an applied move against the current turn. If the play budget
    /// is exhausted the turn is archived and a fresh turn for the opponent
    /// begins. Returns whether the turn ended.
    pub(crate) fn add_move(&mut self, mv: Move, cost: u32) -> bool {
        self.current.moves.push(mv);
        self.current.plays -= cost;
        if self.current.plays > 0 {
            return false;
        }

        let finished = CurrentTurn {
            player: self.current.player.opponent(),
            moves: Vec::new(),
            plays: PLAYS_PER_TURN,
        };
        let finished = std::mem::replace(&mut self.current, finished);
        self.turns.push(PastTurn {
            player: finished.player,
            moves: finished.moves,
        });
        true
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    /// A game with all ten scouts placed (columns 0–4 of each base row),
    /// about to start player A's first playing turn.
    pub(crate) fn game_in_play() -> Game {
        let mut game = Game::new();
        for x in 0..5 {
            game.apply(
                Player::A,
                &format!("place_scout {x},9").parse().expect("valid move"),
            )
            .expect("placement is legal");
            game.apply(
                Player::B,
                &format!("place_scout {x},0").parse().expect("valid move"),
            )
            .expect("placement is legal");
        }
        assert_eq!(game.phase(), GamePhase::Playing);
        game
    }
}
