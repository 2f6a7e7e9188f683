//! Value-type board that replays coordinate move tokens.
//!
//! There is no legality check here. Whatever stands on the from-square is
//! moved, and the side effects a coordinate token implies are applied:
//! the rook hop of a castle, the pawn removed by en passant, promotion.

use std::fmt;

use crate::types::*;
use crate::uci::MoveToken;

/// Character used for an empty square in a [`PositionKey`].
pub const EMPTY_SQUARE: char = '.';

/// Occupancy of all 64 squares, one character per square (a1..h8).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionKey(String);

impl PositionKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    squares: [Option<Piece>; 64],
    side_to_move: Color,
}

impl Board {
    pub fn empty() -> Self {
        Board {
            squares: [None; 64],
            side_to_move: Color::White,
        }
    }

    pub fn startpos() -> Self {
        let mut b = Board::empty();

        // Pawns
        for f in 0..8 {
            b.set_piece(8 + f, Some(Piece::new(Color::White, PieceKind::Pawn)));
            b.set_piece(48 + f, Some(Piece::new(Color::Black, PieceKind::Pawn)));
        }
        // Back ranks
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (f, &kind) in (0u8..).zip(back.iter()) {
            b.set_piece(f, Some(Piece::new(Color::White, kind)));
            b.set_piece(56 + f, Some(Piece::new(Color::Black, kind)));
        }
        b
    }

    pub fn piece_at(&self, sq: u8) -> Option<Piece> {
        self.squares.get(sq as usize).copied().flatten()
    }

    pub fn set_piece(&mut self, sq: u8, pc: Option<Piece>) {
        if let Some(slot) = self.squares.get_mut(sq as usize) {
            *slot = pc;
        }
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// Snapshot of piece placement, indexed a1 = 0 .. h8 = 63.
    pub fn placement(&self) -> &[Option<Piece>; 64] {
        &self.squares
    }

    /// Applies a move token and hands the move to the other side.
    ///
    /// A token whose from-square is empty still passes the turn.
    pub fn apply(&mut self, mv: MoveToken) {
        self.side_to_move = self.side_to_move.other();

        let Some(moved) = self.squares[mv.from as usize].take() else {
            return;
        };
        let target_empty = self.squares[mv.to as usize].is_none();
        let (from_file, from_rank) = (file_of(mv.from), rank_of(mv.from));
        let to_file = file_of(mv.to);

        match moved.kind {
            // A diagonal pawn step onto an empty square captures en passant.
            PieceKind::Pawn if from_file != to_file && target_empty => {
                if let Some(cs) = sq(to_file, from_rank) {
                    self.squares[cs as usize] = None;
                }
            }
            PieceKind::King if (to_file - from_file).abs() == 2 => {
                let (rook_from, rook_to) = if to_file > from_file { (7, 5) } else { (0, 3) };
                if let (Some(rf), Some(rt)) = (sq(rook_from, from_rank), sq(rook_to, from_rank)) {
                    let rook = self.squares[rf as usize].take();
                    self.squares[rt as usize] = rook;
                }
            }
            _ => {}
        }

        let placed = match mv.promotion {
            Some(kind) if moved.kind == PieceKind::Pawn => Piece::new(moved.color, kind),
            _ => moved,
        };
        self.squares[mv.to as usize] = Some(placed);
    }

    /// Parses `token` leniently and applies it. Returns the parsed move, or
    /// `None` (leaving the board untouched) when the token names no squares.
    pub fn apply_token(&mut self, token: &str) -> Option<MoveToken> {
        let mv = MoveToken::parse_lenient(token)?;
        self.apply(mv);
        Some(mv)
    }

    pub fn position_key(&self) -> PositionKey {
        PositionKey(
            self.squares
                .iter()
                .map(|sq| sq.map_or(EMPTY_SQUARE, Piece::fen_char))
                .collect(),
        )
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::startpos()
    }
}

#[cfg(test)]
#[path = "board_tests.rs"]
mod board_tests;
