//! A person at the terminal playing one side of a game.
//!
//! The player answers the same commands an engine process does, so the
//! match loop cannot tell the two apart. Moves are read from an injected
//! reader and prompts go to an injected writer.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use chess_core::{board_from_position_args, Board, MoveToken, NULL_MOVE};

use crate::engine::UciEngine;
use crate::error::Result;

/// Input that gives up the game.
pub const RESIGN: &str = "resign";

pub struct HumanPlayer<R: BufRead, W: Write> {
    name: String,
    input: R,
    output: W,
    board: Board,
    replies: VecDeque<String>,
    initialized: bool,
}

impl<R: BufRead, W: Write> HumanPlayer<R, W> {
    pub fn new(name: &str, input: R, output: W) -> Self {
        Self {
            name: name.to_string(),
            input,
            output,
            board: Board::startpos(),
            replies: VecDeque::new(),
            initialized: false,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Prompts until the player enters a usable move or gives up.
    fn ask_move(&mut self) -> Result<String> {
        let side = self.board.side_to_move();
        loop {
            write!(self.output, "{} ({}) move: ", self.name, side.label())?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Ok(NULL_MOVE.to_string());
            }
            let text = line.trim().to_ascii_lowercase();
            if text == RESIGN {
                return Ok(NULL_MOVE.to_string());
            }

            match MoveToken::parse(&text) {
                Some(mv) if self.board.piece_at(mv.from).map(|p| p.color) == Some(side) => {
                    return Ok(mv.to_string());
                }
                Some(_) => writeln!(
                    self.output,
                    "No {} piece on that square, try again.",
                    side.label()
                )?,
                None => writeln!(
                    self.output,
                    "Could not read {text:?}; enter a move like e2e4 or e7e8q, or \"{RESIGN}\"."
                )?,
            }
        }
    }
}

impl<R: BufRead, W: Write> UciEngine for HumanPlayer<R, W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn handshake(&mut self) -> Result<()> {
        self.board = Board::startpos();
        self.initialized = true;
        Ok(())
    }

    fn send_line(&mut self, line: &str) -> Result<()> {
        let mut words = line.split_whitespace();
        match words.next() {
            Some("uci") => {
                self.replies.push_back(format!("id name {}", self.name));
                self.replies.push_back("uciok".to_string());
            }
            Some("isready") => self.replies.push_back("readyok".to_string()),
            Some("ucinewgame") => self.board = Board::startpos(),
            Some("position") => {
                let args: Vec<&str> = words.collect();
                self.board = board_from_position_args(&args);
            }
            Some("go") => {
                let reply = self.ask_move()?;
                self.replies.push_back(format!("bestmove {reply}"));
            }
            _ => {}
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        Ok(self.replies.pop_front())
    }
}
