use crate::board::is_player_base;
use crate::player::Player;
use crate::point::{pt, Point};
use serde::Serialize;
use std::fmt;

/// Stable identity of a piece for the lifetime of a board. Identities are
/// assigned in placement order and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PieceId(pub(crate) u32);

/// The kind of a piece occupying a cell. `None` stands for an empty cell in
/// board queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PieceKind {
    None,
    Scout,
    Boulder,
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceKind::None => write!(f, "no piece"),
            PieceKind::Scout => write!(f, "scout"),
            PieceKind::Boulder => write!(f, "boulder"),
        }
    }
}

/// A one-cell mobile piece. `returning` flips to true once the scout has
/// touched the opponent's base row and never flips back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scout {
    pub player: Player,
    pub position: Point,
    pub returning: bool,
}

impl Scout {
    pub(crate) fn wins_game(&self) -> bool {
        self.returning && is_player_base(self.player, self.position)
    }
}

/// An immobile 2×2 piece identified by its top-left cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Boulder {
    pub player: Player,
    pub top_left: Point,
}

impl Boulder {
    /// The four cells covered by a boulder whose top-left is `top_left`.
    #[must_use]
    pub fn cells_from(top_left: Point) -> [Point; 4] {
        [
            top_left,
            top_left + pt(1, 0),
            top_left + pt(0, 1),
            top_left + pt(1, 1),
        ]
    }
}

/// A piece on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Piece {
    Scout(Scout),
    Boulder(Boulder),
}

impl Piece {
    /// The kind of this piece.
    #[must_use]
    pub fn kind(&self) -> PieceKind {
        match self {
            Piece::Scout(_) => PieceKind::Scout,
            Piece::Boulder(_) => PieceKind::Boulder,
        }
    }

    /// The player that owns this piece.
    #[must_use]
    pub fn player(&self) -> Player {
        match self {
            Piece::Scout(s) => s.player,
            Piece::Boulder(b) => b.player,
        }
    }

    /// The cells this piece occupies.
    #[must_use]
    pub fn cells(&self) -> Vec<Point> {
        match self {
            Piece::Scout(s) => vec![s.position],
            Piece::Boulder(b) => Boulder::cells_from(b.top_left).to_vec(),
        }
    }
}
