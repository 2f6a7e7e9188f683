use std::fmt;

use crate::{board::Board, types::*};

/// Move token sent by an engine that has no move to offer.
pub const NULL_MOVE: &str = "0000";

/// A coordinate move token such as `e2e4` or `e7e8q`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveToken {
    pub from: u8,
    pub to: u8,
    pub promotion: Option<PieceKind>,
}

impl MoveToken {
    /// Parses exactly four or five characters: two squares and an optional
    /// promotion letter.
    pub fn parse(txt: &str) -> Option<MoveToken> {
        let txt = txt.trim();
        match txt.len() {
            4 => Self::parse_lenient(txt).filter(|_| txt.is_ascii()),
            5 => {
                let token = Self::parse_lenient(txt)?;
                token.promotion?;
                Some(token)
            }
            _ => None,
        }
    }

    /// Parses the two leading squares and an optional promotion letter,
    /// ignoring anything after them. Engine replies may carry trailing
    /// marker characters that are not part of the move.
    pub fn parse_lenient(txt: &str) -> Option<MoveToken> {
        let from = coord_to_sq(txt.get(0..2)?)?;
        let to = coord_to_sq(txt.get(2..4)?)?;
        let promotion = txt[4..]
            .chars()
            .next()
            .and_then(PieceKind::from_promotion_char);
        Some(MoveToken {
            from,
            to,
            promotion,
        })
    }
}

impl fmt::Display for MoveToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", sq_to_coord(self.from), sq_to_coord(self.to))?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.letter())?;
        }
        Ok(())
    }
}

/// Rebuilds a board from the arguments of a `position` command.
///
/// Supports `startpos` and `startpos moves ...`. Tokens that do not parse
/// are skipped; legality is the engine's business.
pub fn board_from_position_args(args: &[&str]) -> Board {
    let mut board = Board::startpos();
    let mut i = 0;
    if args.first() == Some(&"startpos") {
        i += 1;
    }
    if i < args.len() && args[i] == "moves" {
        for token in &args[i + 1..] {
            board.apply_token(token);
        }
    }
    board
}

#[cfg(test)]
#[path = "uci_tests.rs"]
mod uci_tests;
