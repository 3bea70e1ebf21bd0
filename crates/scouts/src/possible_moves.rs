use crate::board::{base_row, BOARD_WIDTH};
use crate::game::{Game, GamePhase};
use crate::moves::{DashMove, JumpMove, Move, PlaceScoutMove};
use crate::piece::Piece;
use crate::player::Player;
use crate::point::{pt, Point};
use serde::Serialize;
use std::fmt;

/// The legal moves available to a player.
///
/// `moves` never contains a boulder move; boulder placement is reported
/// through `can_place_boulder` and the caller proposes a location.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PossibleMoves {
    pub moves: Vec<Move>,
    pub can_place_boulder: bool,
}

impl fmt::Display for PossibleMoves {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, mv) in self.moves.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{mv}")?;
        }
        if self.can_place_boulder {
            if !self.moves.is_empty() {
                write!(f, " | ")?;
            }
            write!(f, "boulder")?;
        }
        Ok(())
    }
}

pub(crate) fn calculate(game: &Game, player: Player) -> PossibleMoves {
    if game.current_turn().player != player {
        return PossibleMoves::default();
    }

    match game.phase() {
        GamePhase::PlacingScouts => {
            let y = base_row(player);
            let moves = (0..BOARD_WIDTH)
                .map(|x| PlaceScoutMove {
                    scout_position: pt(x, y),
                })
                .filter(|m| m.validate(game).is_ok())
                .map(Move::PlaceScout)
                .collect();
            PossibleMoves {
                moves,
                can_place_boulder: false,
            }
        }

        GamePhase::Playing => {
            let mut possible = PossibleMoves {
                moves: Vec::new(),
                can_place_boulder: !game.placed_boulder(player),
            };

            if Move::Skip.validate(game).is_ok() {
                possible.moves.push(Move::Skip);
            }

            for (_, piece) in game.board().pieces() {
                let scout = match piece {
                    Piece::Scout(scout) if scout.player == player => scout,
                    _ => continue,
                };
                for mv in all_dashes(scout.position) {
                    if mv.validate(game).is_ok() {
                        possible.moves.push(Move::Dash(mv));
                    }
                }
                for mv in all_jumps(scout.position) {
                    if mv.validate(game).is_ok() {
                        possible.moves.push(Move::Jump(mv));
                    }
                }
            }

            possible
        }

        GamePhase::EndedAWon | GamePhase::EndedBWon => PossibleMoves::default(),
    }
}

fn all_dashes(from: Point) -> [DashMove; 8] {
    let dirs = [
        pt(1, 0),
        pt(-1, 0),
        pt(0, 1),
        pt(0, -1),
        pt(1, 1),
        pt(1, -1),
        pt(-1, 1),
        pt(-1, -1),
    ];
    dirs.map(|d| DashMove {
        scout_position: from,
        destination: from + d,
    })
}

fn all_jumps(from: Point) -> [JumpMove; 4] {
    let dirs = [pt(2, 0), pt(-2, 0), pt(0, 2), pt(0, -2)];
    dirs.map(|d| JumpMove {
        scout_position: from,
        destination: from + d,
    })
}
