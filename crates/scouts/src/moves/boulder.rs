use crate::game::{Game, GamePhase};
use crate::moves::{Move, MoveError};
use crate::piece::{Boulder, Piece, PieceKind};
use crate::point::Point;

/// Drop a 2×2 boulder whose top-left corner is the given point. Boulders
/// never move, and each player may place at most one per game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoulderMove {
    pub top_left: Point,
}

impl BoulderMove {
    pub(crate) fn validate(&self, game: &Game) -> Result<(), MoveError> {
        if game.phase != GamePhase::Playing {
            return Err(MoveError::StillPlacingScouts);
        }
        if !game.current.has_enough_plays(1) {
            return Err(MoveError::NotEnoughPlays);
        }
        for cell in Boulder::cells_from(self.top_left) {
            if !game.board.point_is_kind(cell, PieceKind::None) {
                return Err(MoveError::UnexpectedPiece {
                    position: cell,
                    expected: PieceKind::None,
                    actual: game.board.kind_at(cell),
                });
            }
        }
        if game.placed_boulders[game.current.player.index()] {
            return Err(MoveError::AlreadyPlacedBoulder);
        }
        Ok(())
    }

    pub(crate) fn apply(&self, game: &mut Game) {
        game.placed_boulders[game.current.player.index()] = true;
        game.board.add_piece(Piece::Boulder(Boulder {
            player: game.current.player,
            top_left: self.top_left,
        }));
        game.add_move(Move::Boulder(*self), 1);
    }
}
