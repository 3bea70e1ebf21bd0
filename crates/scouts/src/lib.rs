//! Rules engine for the Scouts board game.
//!
//! Scouts is a two-player game on an 8×10 board. Each player places five
//! scouts on their base row, then alternates turns dashing, jumping,
//! skipping, or dropping a single 2×2 boulder. A scout that touches the
//! opponent's base row and then returns to its own base row wins the game.
//!
//! This crate is the pure, deterministic core: board, pieces, move
//! validation and application, and win detection. It performs no I/O and
//! has no notion of wall-clock time; callers are responsible for
//! serializing access to a [`Game`].
//!
//! ## Modules
//!
//! - `point`, `player`, `piece`, `board` - the geometric model
//! - `moves` - the five move variants with validate/apply semantics
//! - `game` - the turn sequencer and terminal-state tracking
//! - `possible_moves` - legal-move enumeration

mod board;
mod game;
mod moves;
mod piece;
mod player;
mod point;
mod possible_moves;
mod turn;

pub use board::{
    base_row, format_board, in_bounds, is_player_base, Board, BOARD_HEIGHT, BOARD_WIDTH,
};
pub use game::{Game, GamePhase, PastTurnsError};
pub use moves::{
    BoulderMove, DashMove, JumpMove, Move, MoveError, MoveKind, Moves, ParseMoveError,
    PlaceScoutMove,
};
pub use piece::{Boulder, Piece, PieceId, PieceKind, Scout};
pub use player::{ParsePlayerError, Player};
pub use point::{pt, ParsePointError, Point};
pub use possible_moves::PossibleMoves;
pub use turn::{CurrentTurn, PastTurn, PLACE_SCOUT_TURNS, PLAYS_PER_TURN, STARTING_PLAYS_PER_TURN};
