//! Terminal board rendering

use std::io::Write;

use chess_core::{Color, Piece, PieceKind};

/// Shown after every applied ply. Nothing it does feeds back into the match.
pub trait BoardRenderer {
    fn render(&mut self, token: &str, player: &str, ply: u32, placement: &[Option<Piece>; 64]);
}

/// Draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl BoardRenderer for NullRenderer {
    fn render(&mut self, _: &str, _: &str, _: u32, _: &[Option<Piece>; 64]) {}
}

const RESET: &str = "\x1b[0m";
const LIGHT_SQUARE: &str = "\x1b[48;5;180m";
const DARK_SQUARE: &str = "\x1b[48;5;137m";
const WHITE_PIECE: &str = "\x1b[1;97m";
const BLACK_PIECE: &str = "\x1b[1;30m";

/// ANSI board redrawn in place after each ply.
pub struct TerminalRenderer<W: Write> {
    out: W,
    clear: bool,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, clear: true }
    }

    /// Append boards instead of redrawing over the previous one.
    pub fn scrolling(mut self) -> Self {
        self.clear = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(
        &mut self,
        token: &str,
        player: &str,
        ply: u32,
        placement: &[Option<Piece>; 64],
    ) -> std::io::Result<()> {
        if self.clear {
            write!(self.out, "\x1b[2J\x1b[H")?;
        }
        writeln!(self.out, "Ply {ply}: {player} played {token}")?;
        for rank in (0..8).rev() {
            write!(self.out, " {} ", rank + 1)?;
            for file in 0..8 {
                let bg = if (rank + file) % 2 == 0 {
                    DARK_SQUARE
                } else {
                    LIGHT_SQUARE
                };
                match placement[rank * 8 + file] {
                    Some(piece) => {
                        let fg = match piece.color {
                            Color::White => WHITE_PIECE,
                            Color::Black => BLACK_PIECE,
                        };
                        write!(self.out, "{bg}{fg} {} {RESET}", glyph(piece))?;
                    }
                    None => write!(self.out, "{bg}   {RESET}")?,
                }
            }
            writeln!(self.out)?;
        }
        writeln!(self.out, "    a  b  c  d  e  f  g  h")?;
        self.out.flush()
    }
}

fn glyph(piece: Piece) -> char {
    match piece.kind {
        PieceKind::King => '♚',
        PieceKind::Queen => '♛',
        PieceKind::Rook => '♜',
        PieceKind::Bishop => '♝',
        PieceKind::Knight => '♞',
        PieceKind::Pawn => '♟',
    }
}

impl<W: Write> BoardRenderer for TerminalRenderer<W> {
    fn render(&mut self, token: &str, player: &str, ply: u32, placement: &[Option<Piece>; 64]) {
        // A broken terminal must not end the match.
        let _ = self.draw(token, player, ply, placement);
    }
}
