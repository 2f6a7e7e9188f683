//! Game records and results

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol;

/// Moves of one game in the order they were played, verbatim from the
/// engines' `bestmove` replies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    tokens: Vec<String>,
}

impl MoveRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: impl Into<String>) {
        self.tokens.push(token.into());
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens separated by single spaces; empty for an empty record.
    pub fn joined(&self) -> String {
        self.tokens.join(" ")
    }

    /// `position startpos ...` command reproducing this history.
    pub fn position_command(&self) -> String {
        protocol::position_command(&self.joined())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrawReason {
    Stalemate,
    ThreefoldRepetition,
    MoveLimit,
}

impl fmt::Display for DrawReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DrawReason::Stalemate => "stalemate",
            DrawReason::ThreefoldRepetition => "threefold repetition",
            DrawReason::MoveLimit => "move limit",
        })
    }
}

/// Outcome of one game relative to a reference side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    Win,
    Loss,
    Draw(DrawReason),
}

impl MatchResult {
    /// The same outcome seen from the other side.
    pub fn flipped(self) -> Self {
        match self {
            MatchResult::Win => MatchResult::Loss,
            MatchResult::Loss => MatchResult::Win,
            draw => draw,
        }
    }

    pub fn draw_reason(self) -> Option<DrawReason> {
        match self {
            MatchResult::Draw(reason) => Some(reason),
            _ => None,
        }
    }

    /// PGN-style result string, reference side first.
    pub fn notation(self) -> &'static str {
        match self {
            MatchResult::Win => "1-0",
            MatchResult::Loss => "0-1",
            MatchResult::Draw(_) => "1/2-1/2",
        }
    }
}

/// What ended a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// The mover answered `bestmove (none)`.
    NoMove,
    /// The mover answered the null move `0000`.
    Resignation,
    /// The mover's token carried the checkmate marker.
    CheckmateCue,
    /// The mover's token carried the stalemate marker.
    StalemateCue,
    ThreefoldRepetition,
    MoveLimit,
}

/// A finished game. `result` is from White's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub white: String,
    pub black: String,
    pub result: MatchResult,
    pub termination: Termination,
    pub moves: MoveRecord,
    pub plies: u32,
}

/// Win/loss/draw counters from one side's perspective.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: MatchResult) {
        match result {
            MatchResult::Win => self.wins += 1,
            MatchResult::Loss => self.losses += 1,
            MatchResult::Draw(_) => self.draws += 1,
        }
    }

    pub fn total_games(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    /// Score (1 for win, 0.5 for draw, 0 for loss), 0.5 before any game.
    pub fn score(&self) -> f64 {
        let total = self.total_games() as f64;
        if total == 0.0 {
            return 0.5;
        }
        (self.wins as f64 + 0.5 * self.draws as f64) / total
    }

    /// Adds another tally, e.g. when merging persisted counters.
    pub fn absorb(&mut self, other: Tally) {
        self.wins += other.wins;
        self.losses += other.losses;
        self.draws += other.draws;
    }
}
