use crate::board::is_player_base;
use crate::game::{Game, GamePhase};
use crate::moves::{Move, MoveError};
use crate::piece::{Piece, PieceKind, Scout};
use crate::point::Point;
use crate::turn::{PLACE_SCOUT_TURNS, STARTING_PLAYS_PER_TURN};

/// Place a scout on the current player's base row. Each player places five
/// scouts before the game proper begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceScoutMove {
    pub scout_position: Point,
}

impl PlaceScoutMove {
    pub(crate) fn validate(&self, game: &Game) -> Result<(), MoveError> {
        if !game.current.has_enough_plays(1) {
            return Err(MoveError::NotEnoughPlays);
        }
        if game.phase != GamePhase::PlacingScouts {
            return Err(MoveError::PlacedAllScouts);
        }
        if !is_player_base(game.current.player, self.scout_position) {
            return Err(MoveError::CanOnlyPlaceAtBase);
        }
        if !game.board.point_is_kind(self.scout_position, PieceKind::None) {
            return Err(MoveError::UnexpectedPiece {
                position: self.scout_position,
                expected: PieceKind::None,
                actual: game.board.kind_at(self.scout_position),
            });
        }
        Ok(())
    }

    pub(crate) fn apply(&self, game: &mut Game) {
        game.board.add_piece(Piece::Scout(Scout {
            player: game.current.player,
            position: self.scout_position,
            returning: false,
        }));

        let ended = game.add_move(Move::PlaceScout(*self), 1);
        debug_assert!(ended, "place_scout must end the turn");

        // During placement every fresh turn gets the starting budget. The
        // phase flips after the override, so the first playing turn also
        // begins with one play.
        game.current.plays = STARTING_PLAYS_PER_TURN;
        if game.turns.len() == 2 * PLACE_SCOUT_TURNS {
            game.phase = GamePhase::Playing;
        }
    }
}
