use crate::piece::{Piece, PieceId, PieceKind, Scout};
use crate::player::Player;
use crate::point::Point;
use std::collections::{BTreeMap, HashMap};

/// Board width in cells.
pub const BOARD_WIDTH: i32 = 8;
/// Board height in cells.
pub const BOARD_HEIGHT: i32 = 10;

/// Whether `p` lies within the board.
#[must_use]
pub fn in_bounds(p: Point) -> bool {
    (0..BOARD_WIDTH).contains(&p.x) && (0..BOARD_HEIGHT).contains(&p.y)
}

/// The base row of the given player. Player A is at the bottom of the board,
/// player B at the top.
#[must_use]
pub const fn base_row(player: Player) -> i32 {
    match player {
        Player::A => BOARD_HEIGHT - 1,
        Player::B => 0,
    }
}

/// Whether `p` is on the base row of the given player.
#[must_use]
pub fn is_player_base(player: Player, p: Point) -> bool {
    p.y == base_row(player)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PieceEntry {
    piece: Piece,
    cells: Vec<Point>,
}

/// The board: a cell→piece index and a piece→cells index that must agree.
///
/// The board exposes no public mutators; pieces are added and moved by
/// applying moves to a [`Game`](crate::Game). Iteration order over pieces is
/// placement order, which keeps move enumeration deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    cells: HashMap<Point, PieceId>,
    pieces: BTreeMap<PieceId, PieceEntry>,
    next_id: u32,
}

impl Board {
    /// Create an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The piece at the given point, if any.
    #[must_use]
    pub fn piece_at(&self, p: Point) -> Option<&Piece> {
        let id = self.cells.get(&p)?;
        self.pieces.get(id).map(|entry| &entry.piece)
    }

    /// The kind of the piece at the given point, or [`PieceKind::None`].
    #[must_use]
    pub fn kind_at(&self, p: Point) -> PieceKind {
        self.piece_at(p).map_or(PieceKind::None, Piece::kind)
    }

    /// True iff `p` is in bounds and occupied by a piece owned by `player`.
    #[must_use]
    pub fn point_is_player(&self, p: Point, player: Player) -> bool {
        if !in_bounds(p) {
            return false;
        }
        self.piece_at(p).is_some_and(|piece| piece.player() == player)
    }

    /// True iff `p` is in bounds and holds a piece of the given kind.
    /// [`PieceKind::None`] matches an empty in-bounds cell.
    #[must_use]
    pub fn point_is_kind(&self, p: Point, kind: PieceKind) -> bool {
        if !in_bounds(p) {
            return false;
        }
        self.kind_at(p) == kind
    }

    /// All pieces on the board in placement order.
    pub fn pieces(&self) -> impl Iterator<Item = (PieceId, &Piece)> {
        self.pieces.iter().map(|(id, entry)| (*id, &entry.piece))
    }

    pub(crate) fn id_at(&self, p: Point) -> Option<PieceId> {
        self.cells.get(&p).copied()
    }

    pub(crate) fn scout_at(&self, p: Point) -> Option<(PieceId, Scout)> {
        let id = self.id_at(p)?;
        match &self.pieces.get(&id)?.piece {
            Piece::Scout(scout) => Some((id, scout.clone())),
            Piece::Boulder(_) => None,
        }
    }

    /// Add a piece to the board.
    ///
    /// # Panics
    ///
    /// Panics if any cell the piece occupies is out of bounds. Callers
    /// validate overlap before adding; claiming an occupied cell leaves the
    /// previous occupant's index stale.
    pub(crate) fn add_piece(&mut self, piece: Piece) -> PieceId {
        let id = PieceId(self.next_id);
        self.next_id += 1;
        self.index_piece(id, piece);
        id
    }

    /// Replace the piece behind `id`, removing its previous cells from the
    /// index and re-adding it at its current cells.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not on the board or the new cells are out of bounds.
    pub(crate) fn update_piece(&mut self, id: PieceId, piece: Piece) {
        let entry = self.pieces.remove(&id).expect("piece not on board");
        for cell in &entry.cells {
            self.cells.remove(cell);
        }
        self.index_piece(id, piece);
    }

    fn index_piece(&mut self, id: PieceId, piece: Piece) {
        let cells = piece.cells();
        for cell in &cells {
            assert!(in_bounds(*cell), "piece out of bounds at {cell}");
            self.cells.insert(*cell, id);
        }
        self.pieces.insert(id, PieceEntry { piece, cells });
    }
}

/// Render the board as a human-readable grid, mostly for debugging: `A`/`B`
/// for scouts, `a`/`b` for boulders, `.` for empty cells, one row per line.
#[must_use]
pub fn format_board(board: &Board) -> String {
    let mut grid = vec![vec!['.'; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize];
    for (_, piece) in board.pieces() {
        let ch = match (piece.kind(), piece.player()) {
            (PieceKind::Scout, Player::A) => 'A',
            (PieceKind::Scout, Player::B) => 'B',
            (PieceKind::Boulder, Player::A) => 'a',
            (PieceKind::Boulder, Player::B) => 'b',
            (PieceKind::None, _) => continue,
        };
        for cell in piece.cells() {
            grid[cell.y as usize][cell.x as usize] = ch;
        }
    }
    let mut out = String::with_capacity((BOARD_WIDTH as usize + 1) * BOARD_HEIGHT as usize);
    for row in grid {
        out.extend(row);
        out.push('\n');
    }
    out
}
