//! The five move variants and their validate/apply semantics.
//!
//! Every move has a case-sensitive, space-separated text form:
//!
//! ```text
//! place_scout x,y
//! jump sx,sy dx,dy
//! dash sx,sy dx,dy
//! skip
//! boulder tlx,tly
//! ```
//!
//! `validate` checks a move against a game without mutating it; `apply`
//! executes the move and must only be called after a successful `validate`.

mod boulder;
mod dash;
mod jump;
mod place_scout;

pub use boulder::BoulderMove;
pub use dash::DashMove;
pub use jump::JumpMove;
pub use place_scout::PlaceScoutMove;

use crate::game::{Game, GamePhase};
use crate::piece::PieceKind;
use crate::player::Player;
use crate::point::{ParsePointError, Point};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Discriminator for the move variants; doubles as the leading token of the
/// text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    PlaceScout,
    Jump,
    Dash,
    Skip,
    Boulder,
}

impl MoveKind {
    /// The wire name of this move kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            MoveKind::PlaceScout => "place_scout",
            MoveKind::Jump => "jump",
            MoveKind::Dash => "dash",
            MoveKind::Skip => "skip",
            MoveKind::Boulder => "boulder",
        }
    }
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a move can be rejected by the rules engine. The game state is
/// unchanged on rejection; the same player may try again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("it is not {0}'s turn")]
    NotYourTurn(Player),
    #[error("you are still placing scouts")]
    StillPlacingScouts,
    #[error("you have placed all scouts")]
    PlacedAllScouts,
    #[error("you do not have enough plays")]
    NotEnoughPlays,
    #[error("you can only place a piece at your base")]
    CanOnlyPlaceAtBase,
    #[error("you cannot move a scout that is not yours")]
    NotYourScout,
    #[error("cannot dash more than 1 unit at a time")]
    DashTooFar,
    #[error("invalid jump")]
    InvalidJump,
    #[error("already placed boulder")]
    AlreadyPlacedBoulder,
    #[error("expected {expected} at {position}, got {actual}")]
    UnexpectedPiece {
        position: Point,
        expected: PieceKind,
        actual: PieceKind,
    },
    #[error("expected game state {expected}, got {actual}")]
    UnexpectedPhase {
        expected: GamePhase,
        actual: GamePhase,
    },
}

/// A move in its parsed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Move {
    PlaceScout(PlaceScoutMove),
    Jump(JumpMove),
    Dash(DashMove),
    Skip,
    Boulder(BoulderMove),
}

impl Move {
    /// The kind of this move.
    #[must_use]
    pub fn kind(&self) -> MoveKind {
        match self {
            Move::PlaceScout(_) => MoveKind::PlaceScout,
            Move::Jump(_) => MoveKind::Jump,
            Move::Dash(_) => MoveKind::Dash,
            Move::Skip => MoveKind::Skip,
            Move::Boulder(_) => MoveKind::Boulder,
        }
    }

    pub(crate) fn validate(&self, game: &Game) -> Result<(), MoveError> {
        match self {
            Move::PlaceScout(m) => m.validate(game),
            Move::Jump(m) => m.validate(game),
            Move::Dash(m) => m.validate(game),
            Move::Skip => validate_skip(game),
            Move::Boulder(m) => m.validate(game),
        }
    }

    pub(crate) fn apply(&self, game: &mut Game) {
        match self {
            Move::PlaceScout(m) => m.apply(game),
            Move::Jump(m) => m.apply(game),
            Move::Dash(m) => m.apply(game),
            Move::Skip => apply_skip(game),
            Move::Boulder(m) => m.apply(game),
        }
    }
}

fn validate_skip(game: &Game) -> Result<(), MoveError> {
    if !game.current.has_enough_plays(1) {
        return Err(MoveError::NotEnoughPlays);
    }
    if game.phase != GamePhase::Playing {
        return Err(MoveError::StillPlacingScouts);
    }
    Ok(())
}

fn apply_skip(game: &mut Game) {
    game.add_move(Move::Skip, 1);
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::PlaceScout(m) => write!(f, "{} {}", self.kind(), m.scout_position),
            Move::Jump(m) => write!(f, "{} {} {}", self.kind(), m.scout_position, m.destination),
            Move::Dash(m) => write!(f, "{} {} {}", self.kind(), m.scout_position, m.destination),
            Move::Skip => write!(f, "{}", self.kind()),
            Move::Boulder(m) => write!(f, "{} {}", self.kind(), m.top_left),
        }
    }
}

/// Error returned when a move fails to parse from its text form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseMoveError {
    #[error("unknown move type: {0:?}")]
    UnknownType(String),
    #[error("invalid {kind} move: expected {expected} arguments, got {got}")]
    WrongArgCount {
        kind: MoveKind,
        expected: usize,
        got: usize,
    },
    #[error("invalid {kind} move: {source}")]
    BadPoint {
        kind: MoveKind,
        #[source]
        source: ParsePointError,
    },
}

fn parse_args(kind: MoveKind, args: &[&str], expected: usize) -> Result<(), ParseMoveError> {
    if args.len() != expected {
        return Err(ParseMoveError::WrongArgCount {
            kind,
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn parse_point(kind: MoveKind, arg: &str) -> Result<Point, ParseMoveError> {
    arg.parse()
        .map_err(|source| ParseMoveError::BadPoint { kind, source })
}

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(' ');
        let head = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();
        match head {
            "place_scout" => {
                parse_args(MoveKind::PlaceScout, &args, 1)?;
                Ok(Move::PlaceScout(PlaceScoutMove {
                    scout_position: parse_point(MoveKind::PlaceScout, args[0])?,
                }))
            }
            "jump" => {
                parse_args(MoveKind::Jump, &args, 2)?;
                Ok(Move::Jump(JumpMove {
                    scout_position: parse_point(MoveKind::Jump, args[0])?,
                    destination: parse_point(MoveKind::Jump, args[1])?,
                }))
            }
            "dash" => {
                parse_args(MoveKind::Dash, &args, 2)?;
                Ok(Move::Dash(DashMove {
                    scout_position: parse_point(MoveKind::Dash, args[0])?,
                    destination: parse_point(MoveKind::Dash, args[1])?,
                }))
            }
            "skip" => {
                parse_args(MoveKind::Skip, &args, 0)?;
                Ok(Move::Skip)
            }
            "boulder" => {
                parse_args(MoveKind::Boulder, &args, 1)?;
                Ok(Move::Boulder(BoulderMove {
                    top_left: parse_point(MoveKind::Boulder, args[0])?,
                }))
            }
            other => Err(ParseMoveError::UnknownType(other.into())),
        }
    }
}

impl Serialize for Move {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Move {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A list of moves. The text form joins the moves with `"; "`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Moves(pub Vec<Move>);

impl fmt::Display for Moves {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, mv) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{mv}")?;
        }
        Ok(())
    }
}

impl FromStr for Moves {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(';')
            .map(|part| part.trim().parse())
            .collect::<Result<Vec<Move>, _>>()
            .map(Moves)
    }
}
