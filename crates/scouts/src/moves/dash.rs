use crate::board::is_player_base;
use crate::game::{Game, GamePhase};
use crate::moves::{Move, MoveError};
use crate::piece::{Piece, PieceKind};
use crate::point::Point;

/// Dash a scout to any of the eight surrounding cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashMove {
    pub scout_position: Point,
    pub destination: Point,
}

impl DashMove {
    pub(crate) fn validate(&self, game: &Game) -> Result<(), MoveError> {
        if game.phase != GamePhase::Playing {
            return Err(MoveError::UnexpectedPhase {
                expected: GamePhase::Playing,
                actual: game.phase,
            });
        }
        if !game.current.has_enough_plays(1) {
            return Err(MoveError::NotEnoughPlays);
        }
        if !game.board.point_is_kind(self.scout_position, PieceKind::Scout) {
            return Err(MoveError::NotYourScout);
        }
        if !game
            .board
            .point_is_player(self.scout_position, game.current.player)
        {
            return Err(MoveError::NotYourScout);
        }
        if !game.board.point_is_kind(self.destination, PieceKind::None) {
            return Err(MoveError::UnexpectedPiece {
                position: self.destination,
                expected: PieceKind::None,
                actual: game.board.kind_at(self.destination),
            });
        }
        let distance = self.destination - self.scout_position;
        if distance.x.abs() > 1 || distance.y.abs() > 1 {
            return Err(MoveError::DashTooFar);
        }
        Ok(())
    }

    pub(crate) fn apply(&self, game: &mut Game) {
        let (id, mut scout) = game
            .board
            .scout_at(self.scout_position)
            .expect("dash source was validated to be a scout");
        scout.position = self.destination;

        if !scout.returning && is_player_base(game.current.player.opponent(), self.destination) {
            scout.returning = true;
        }

        let won = scout.wins_game();
        game.board.update_piece(id, Piece::Scout(scout));
        if won {
            game.phase = GamePhase::won_by(game.current.player);
        }

        game.add_move(Move::Dash(*self), 1);
    }
}
