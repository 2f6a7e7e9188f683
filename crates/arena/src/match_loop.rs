//! Match loop: drives two engines through alternating plies

use std::collections::HashMap;

use chess_core::{Board, Color, PositionKey, NULL_MOVE};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::engine::UciEngine;
use crate::error::{ArenaError, Result};
use crate::game::{DrawReason, GameRecord, MatchResult, MoveRecord, Tally, Termination};
use crate::protocol::{self, BestMove};
use crate::render::BoardRenderer;
use crate::termination::{Cue, SuffixCues, TerminationDetector};

/// Occurrences of one position that end the game as a draw.
pub const REPETITION_LIMIT: u32 = 3;

/// Configuration for a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Number of games to play
    pub games: u32,
    /// Time budget sent with every `go`
    pub movetime_ms: u64,
    /// Plies before the game is declared drawn
    pub max_plies: u32,
    /// Whether to alternate colors each game
    pub alternate_colors: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            games: 10,
            movetime_ms: 1000,
            max_plies: 100,
            alternate_colors: true,
        }
    }
}

/// Per-game occurrence counts of position keys.
#[derive(Debug, Default)]
pub struct RepetitionTable {
    counts: HashMap<PositionKey, u32>,
}

impl RepetitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one more occurrence of `key` and returns the new total.
    pub fn record(&mut self, key: PositionKey) -> u32 {
        let count = self.counts.entry(key).or_insert(0);
        *count += 1;
        *count
    }

    pub fn count(&self, key: &PositionKey) -> u32 {
        self.counts.get(key).copied().unwrap_or(0)
    }
}

/// Games of one preset, with engine1's tally.
#[derive(Debug, Clone, Default)]
pub struct MatchReport {
    pub tally: Tally,
    pub games: Vec<GameRecord>,
}

/// Runs games between two engines
pub struct MatchLoop {
    config: MatchConfig,
    detector: Box<dyn TerminationDetector>,
}

impl MatchLoop {
    pub fn new(config: MatchConfig) -> Self {
        Self {
            config,
            detector: Box::new(SuffixCues::default()),
        }
    }

    /// Replaces the move-token cue detector.
    pub fn with_detector(mut self, detector: Box<dyn TerminationDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Play a preset of games between two engines, reusing both processes.
    ///
    /// Returns the tally from engine1's perspective.
    pub fn run_match(
        &self,
        engine1: &mut dyn UciEngine,
        engine2: &mut dyn UciEngine,
        renderer: &mut dyn BoardRenderer,
    ) -> Result<MatchReport> {
        let mut report = MatchReport::default();
        info!(
            engine1 = engine1.name(),
            engine2 = engine2.name(),
            games = self.config.games,
            "match started"
        );

        for game_num in 0..self.config.games {
            if game_num > 0 {
                engine1.new_game()?;
                engine2.new_game()?;
            }

            // Alternate colors if configured
            let engine1_white = !self.config.alternate_colors || game_num % 2 == 0;
            let record = if engine1_white {
                self.play_game(engine1, engine2, renderer)?
            } else {
                self.play_game(engine2, engine1, renderer)?
            };
            let result = if engine1_white {
                record.result
            } else {
                record.result.flipped()
            };
            report.tally.record(result);

            info!(
                "Game {}/{}: {} ({}) {:?} after {} plies - Score: {}-{}-{}",
                game_num + 1,
                self.config.games,
                result.notation(),
                if engine1_white { "W" } else { "B" },
                record.termination,
                record.plies,
                report.tally.wins,
                report.tally.losses,
                report.tally.draws
            );
            report.games.push(record);
        }

        Ok(report)
    }

    /// Play a single game; the record's result is from White's perspective.
    pub fn play_game(
        &self,
        white: &mut dyn UciEngine,
        black: &mut dyn UciEngine,
        renderer: &mut dyn BoardRenderer,
    ) -> Result<GameRecord> {
        if self.config.max_plies == 0 {
            return Err(ArenaError::Config("max_plies must be at least 1".into()));
        }
        if !white.is_initialized() {
            white.handshake()?;
        }
        if !black.is_initialized() {
            black.handshake()?;
        }

        let go = protocol::go_movetime(self.config.movetime_ms);
        let mut moves = MoveRecord::new();
        let mut board = Board::startpos();
        let mut repetitions = RepetitionTable::new();
        let mut side = Color::White;
        let mut plies = 0;

        // Whoever is on `side` wins.
        let won_by = |side: Color| match side {
            Color::White => MatchResult::Win,
            Color::Black => MatchResult::Loss,
        };

        let (outcome, termination) = loop {
            let mover: &mut dyn UciEngine = match side {
                Color::White => &mut *white,
                Color::Black => &mut *black,
            };
            mover.send_line(&moves.position_command())?;
            mover.send_line(&go)?;
            let reply = await_bestmove(mover)?;

            let token = reply.token();
            if reply.is_no_move() || token.is_empty() {
                break (won_by(side.other()), Termination::NoMove);
            }
            if token == NULL_MOVE {
                break (won_by(side.other()), Termination::Resignation);
            }

            moves.push(token.as_str());
            plies += 1;
            if board.apply_token(&token).is_none() {
                warn!(
                    engine = mover.name(),
                    %token,
                    "move token names no squares, board not updated"
                );
            }
            renderer.render(&token, mover.name(), plies, board.placement());

            match self.detector.detect(&token) {
                Some(Cue::Checkmate) => break (won_by(side), Termination::CheckmateCue),
                Some(Cue::Stalemate) => {
                    break (
                        MatchResult::Draw(DrawReason::Stalemate),
                        Termination::StalemateCue,
                    )
                }
                None => {}
            }

            if repetitions.record(board.position_key()) >= REPETITION_LIMIT {
                break (
                    MatchResult::Draw(DrawReason::ThreefoldRepetition),
                    Termination::ThreefoldRepetition,
                );
            }

            side = side.other();
            if plies >= self.config.max_plies {
                break (
                    MatchResult::Draw(DrawReason::MoveLimit),
                    Termination::MoveLimit,
                );
            }
        };

        debug!(result = ?outcome, ?termination, plies, "game over");
        Ok(GameRecord {
            white: white.name().to_string(),
            black: black.name().to_string(),
            result: outcome,
            termination,
            moves,
            plies,
        })
    }
}

/// Reads lines until a `bestmove` reply; `info` and other chatter is skipped.
fn await_bestmove(engine: &mut dyn UciEngine) -> Result<BestMove> {
    loop {
        match engine.read_line()? {
            Some(line) => {
                if let Some(reply) = BestMove::parse(&line) {
                    return Ok(reply);
                }
            }
            None => {
                return Err(ArenaError::ProcessTerminated {
                    engine: engine.name().to_string(),
                })
            }
        }
    }
}

/// Quick utility to run a preset without rendering
pub fn quick_match(
    engine1: &mut dyn UciEngine,
    engine2: &mut dyn UciEngine,
    games: u32,
    movetime_ms: u64,
) -> Result<MatchReport> {
    let config = MatchConfig {
        games,
        movetime_ms,
        ..Default::default()
    };
    MatchLoop::new(config).run_match(engine1, engine2, &mut crate::render::NullRenderer)
}

#[cfg(test)]
#[path = "match_loop_tests.rs"]
mod match_loop_tests;
