use crate::board::is_player_base;
use crate::game::{Game, GamePhase};
use crate::moves::{Move, MoveError};
use crate::piece::{Piece, PieceKind};
use crate::point::Point;

/// Jump a scout over an adjacent scout in one of the four cardinal
/// directions, landing exactly two cells away. A jump costs one play unless
/// it continues a jump chain: if the previous move this turn was a jump
/// ending where this one starts, the jump is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpMove {
    pub scout_position: Point,
    pub destination: Point,
}

impl JumpMove {
    fn cost(&self, game: &Game) -> u32 {
        if let Some(Move::Jump(prev)) = game.current.moves.last() {
            if prev.destination == self.scout_position {
                return 0;
            }
        }
        1
    }

    pub(crate) fn validate(&self, game: &Game) -> Result<(), MoveError> {
        if game.phase != GamePhase::Playing {
            return Err(MoveError::StillPlacingScouts);
        }
        if !game.current.has_enough_plays(self.cost(game)) {
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

        let distance = self.destination - self.scout_position;
        // Axial, exactly two cells.
        if distance.x != 0 && distance.y != 0 {
            return Err(MoveError::InvalidJump);
        }
        if distance.x.abs() != 2 && distance.y.abs() != 2 {
            return Err(MoveError::InvalidJump);
        }

        // The jumped-over cell must hold a scout of either color.
        let over = self.scout_position + distance / 2;
        if !game.board.point_is_kind(over, PieceKind::Scout) {
            return Err(MoveError::UnexpectedPiece {
                position: over,
                expected: PieceKind::Scout,
                actual: game.board.kind_at(over),
            });
        }

        if !game.board.point_is_kind(self.destination, PieceKind::None) {
            return Err(MoveError::UnexpectedPiece {
                position: self.destination,
                expected: PieceKind::None,
                actual: game.board.kind_at(self.destination),
            });
        }

        Ok(())
    }

    pub(crate) fn apply(&self, game: &mut Game) {
        let cost = self.cost(game);
        let (id, mut scout) = game
            .board
            .scout_at(self.scout_position)
            .expect("jump source was validated to be a scout");
        scout.position = self.destination;

        if !scout.returning && is_player_base(game.current.player.opponent(), self.destination) {
            scout.returning = true;
        }

        let won = scout.wins_game();
        game.board.update_piece(id, Piece::Scout(scout));
        if won {
            game.phase = GamePhase::won_by(game.current.player);
        }

        game.add_move(Move::Jump(*self), cost);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testutil::game_in_play;
    use crate::player::Player;

    #[test]
    fn jump_must_be_axial_and_two_cells() {
        let mut game = game_in_play();
        assert_eq!(
            game.apply(Player::A, &"jump 0,9 1,8".parse().unwrap()),
            Err(MoveError::InvalidJump)
        );
        assert_eq!(
            game.apply(Player::A, &"jump 0,9 0,8".parse().unwrap()),
            Err(MoveError::InvalidJump)
        );
    }

    #[test]
    fn jump_requires_scout_in_between() {
        let mut game = game_in_play();
        game.apply(Player::A, &"dash 0,9 0,8".parse().unwrap())
            .unwrap();
        game.apply(Player::B, &"skip".parse().unwrap()).unwrap();
        game.apply(Player::B, &"skip".parse().unwrap()).unwrap();
        let err = game
            .apply(Player::A, &"jump 0,8 0,6".parse().unwrap())
            .unwrap_err();
        assert_eq!(
            err,
            MoveError::UnexpectedPiece {
                position: "0,7".parse().unwrap(),
                expected: PieceKind::Scout,
                actual: PieceKind::None,
            }
        );
    }

    #[test]
    fn jump_over_adjacent_scout() {
        let mut game = game_in_play();
        game.apply(Player::A, &"dash 1,9 1,8".parse().unwrap())
            .unwrap();
        game.apply(Player::B, &"skip".parse().unwrap()).unwrap();
        game.apply(Player::B, &"skip".parse().unwrap()).unwrap();
        game.apply(Player::A, &"dash 0,9 0,8".parse().unwrap())
            .unwrap();
        game.apply(Player::A, &"jump 0,8 2,8".parse().unwrap())
            .unwrap();
        assert_eq!(
            game.board().kind_at("2,8".parse().unwrap()),
            PieceKind::Scout
        );
        assert_eq!(game.board().kind_at("0,8".parse().unwrap()), PieceKind::None);
    }

    #[test]
    fn chained_jump_is_free() {
        let mut game = game_in_play();
        // Build two ladder scouts at 0,8 and 1,7 for the chaining scout
        // sitting on 0,9.
        game.apply(Player::A, &"dash 1,9 0,8".parse().unwrap())
            .unwrap();
        game.apply(Player::B, &"skip".parse().unwrap()).unwrap();
        game.apply(Player::B, &"skip".parse().unwrap()).unwrap();
        game.apply(Player::A, &"dash 2,9 1,8".parse().unwrap())
            .unwrap();
        game.apply(Player::A, &"dash 1,8 1,7".parse().unwrap())
            .unwrap();
        game.apply(Player::B, &"skip".parse().unwrap()).unwrap();
        game.apply(Player::B, &"skip".parse().unwrap()).unwrap();

        // First jump costs a play, the chained one is free.
        game.apply(Player::A, &"jump 0,9 0,7".parse().unwrap())
            .unwrap();
        assert_eq!(game.current_turn().plays, 1);
        game.apply(Player::A, &"jump 0,7 2,7".parse().unwrap())
            .unwrap();
        assert_eq!(game.current_turn().plays, 1);

        // A non-chained jump from another scout still costs a play.
        game.apply(Player::A, &"skip".parse().unwrap()).unwrap();
        assert_eq!(game.current_turn().player, Player::B);
    }
}
