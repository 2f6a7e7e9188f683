//! Strength calibration against a reference engine at known skill levels
//!
//! The candidate plays a fixed number of games against the reference at
//! each configured `Skill Level`. Each level has an assumed rating; the
//! estimate is the score-weighted mean of those ratings and the confidence
//! half-width shrinks with the square root of the games played.

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::UciEngine;
use crate::engine_process::EngineSpec;
use crate::error::{ArenaError, Result};
use crate::match_loop::{MatchConfig, MatchLoop};
use crate::render::BoardRenderer;
use crate::termination::TerminationDetector;

/// Name of the UCI option that selects the reference's difficulty.
pub const SKILL_LEVEL: &str = "Skill Level";

/// Accepted skill range when the reference advertises none.
pub const DEFAULT_SKILL_RANGE: (i64, i64) = (0, 20);

/// Scale of the confidence half-width, roughly 1.96 standard errors of a
/// single game's score expressed in rating points.
pub const CONFIDENCE_K: f64 = 680.0;

/// One rung of the reference ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationLevel {
    pub skill: i64,
    pub assumed_rating: f64,
}

impl CalibrationLevel {
    pub fn new(skill: i64, assumed_rating: f64) -> Self {
        Self {
            skill,
            assumed_rating,
        }
    }
}

/// Calibration section of the arena config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationSettings {
    /// Name the reference engine is looked up by
    pub reference: String,
    pub games_per_level: u32,
    /// Ascending skill levels with the rating each is assumed to play at
    pub levels: Vec<CalibrationLevel>,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            reference: "stockfish".to_string(),
            games_per_level: 4,
            levels: vec![
                CalibrationLevel::new(0, 1350.0),
                CalibrationLevel::new(5, 1850.0),
                CalibrationLevel::new(10, 2350.0),
                CalibrationLevel::new(15, 2850.0),
                CalibrationLevel::new(20, 3350.0),
            ],
        }
    }
}

/// Candidate's results against one level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSample {
    pub skill: i64,
    pub assumed_rating: f64,
    pub wins: u32,
    pub draws: u32,
    pub games: u32,
}

impl CalibrationSample {
    /// (wins + draws / 2) / games, 0 when nothing was played.
    pub fn score(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        (self.wins as f64 + 0.5 * self.draws as f64) / self.games as f64
    }
}

/// Outcome of a calibration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub samples: Vec<CalibrationSample>,
    pub estimate: f64,
    pub half_width: f64,
}

impl CalibrationReport {
    pub fn total_games(&self) -> u32 {
        self.samples.iter().map(|s| s.games).sum()
    }
}

impl fmt::Display for CalibrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>6} {:>8} {:>5} {:>5} {:>5} {:>7}",
            "Skill", "Rating", "W", "D", "G", "Score"
        )?;
        for s in &self.samples {
            writeln!(
                f,
                "{:>6} {:>8.0} {:>5} {:>5} {:>5} {:>6.1}%",
                s.skill,
                s.assumed_rating,
                s.wins,
                s.draws,
                s.games,
                s.score() * 100.0
            )?;
        }
        write!(
            f,
            "Estimate: {:.0} ± {:.0} ({} games)",
            self.estimate,
            self.half_width,
            self.total_games()
        )
    }
}

/// Score-weighted mean of the assumed ratings.
///
/// Falls back to the lowest assumed rating when the candidate scored
/// nothing anywhere. `None` for an empty sample list.
pub fn estimate_rating(samples: &[CalibrationSample]) -> Option<f64> {
    let lowest = samples
        .iter()
        .map(|s| s.assumed_rating)
        .reduce(f64::min)?;
    let total_score: f64 = samples.iter().map(CalibrationSample::score).sum();
    if total_score <= 0.0 {
        return Some(lowest);
    }
    let weighted: f64 = samples
        .iter()
        .map(|s| s.score() * s.assumed_rating)
        .sum();
    Some(weighted / total_score)
}

/// `K / sqrt(games)`; unbounded before any game.
pub fn confidence_half_width(total_games: u32) -> f64 {
    if total_games == 0 {
        return f64::INFINITY;
    }
    CONFIDENCE_K / (total_games as f64).sqrt()
}

/// Finds the reference engine: a configured engine whose name contains
/// `name` (ignoring case) wins over an executable called `name` on `PATH`.
pub fn locate_reference(engines: &[EngineSpec], name: &str) -> Result<EngineSpec> {
    locate_reference_in(engines, name, env::var_os("PATH"))
}

fn locate_reference_in(
    engines: &[EngineSpec],
    name: &str,
    search_path: Option<OsString>,
) -> Result<EngineSpec> {
    let wanted = name.to_ascii_lowercase();
    if let Some(spec) = engines
        .iter()
        .find(|e| e.name.to_ascii_lowercase().contains(&wanted))
    {
        return Ok(spec.clone());
    }

    let candidates: Vec<PathBuf> = search_path
        .iter()
        .flat_map(env::split_paths)
        .flat_map(|dir| {
            [
                dir.join(name),
                dir.join(format!("{name}{}", env::consts::EXE_SUFFIX)),
            ]
        })
        .collect();
    candidates
        .into_iter()
        .find(|p| p.is_file())
        .map(|path| EngineSpec::new(name, path))
        .ok_or_else(|| ArenaError::StockfishNotFound {
            name: name.to_string(),
        })
}

/// Plays the candidate against every level of the reference ladder.
pub struct Calibrator {
    settings: CalibrationSettings,
    match_loop: MatchLoop,
}

impl Calibrator {
    /// `match_config.games` is replaced by the settings' games per level.
    pub fn new(settings: CalibrationSettings, match_config: MatchConfig) -> Self {
        let match_loop = MatchLoop::new(MatchConfig {
            games: settings.games_per_level,
            alternate_colors: true,
            ..match_config
        });
        Self {
            settings,
            match_loop,
        }
    }

    pub fn with_detector(mut self, detector: Box<dyn TerminationDetector>) -> Self {
        self.match_loop = self.match_loop.with_detector(detector);
        self
    }

    pub fn settings(&self) -> &CalibrationSettings {
        &self.settings
    }

    /// Runs every level in order and aggregates the results.
    pub fn run(
        &self,
        candidate: &mut dyn UciEngine,
        reference: &mut dyn UciEngine,
        renderer: &mut dyn BoardRenderer,
    ) -> Result<CalibrationReport> {
        if self.settings.levels.is_empty() {
            return Err(ArenaError::Config(
                "no calibration levels configured".into(),
            ));
        }
        if self.settings.games_per_level == 0 {
            return Err(ArenaError::Config(
                "calibration needs at least one game per level".into(),
            ));
        }

        info!(
            candidate = candidate.name(),
            reference = reference.name(),
            levels = self.settings.levels.len(),
            games_per_level = self.settings.games_per_level,
            "calibration started"
        );

        let mut samples = Vec::with_capacity(self.settings.levels.len());
        for (i, level) in self.settings.levels.iter().enumerate() {
            if i > 0 {
                candidate.new_game()?;
                reference.new_game()?;
            }
            configure_skill(reference, level.skill)?;

            let report = self.match_loop.run_match(candidate, reference, renderer)?;
            let sample = CalibrationSample {
                skill: level.skill,
                assumed_rating: level.assumed_rating,
                wins: report.tally.wins,
                draws: report.tally.draws,
                games: report.tally.total_games(),
            };
            info!(
                skill = level.skill,
                rating = level.assumed_rating,
                score = sample.score(),
                "level finished"
            );
            samples.push(sample);
        }

        let total: u32 = samples.iter().map(|s| s.games).sum();
        let estimate = estimate_rating(&samples).unwrap_or_default();
        let half_width = confidence_half_width(total);
        info!(estimate, half_width, games = total, "calibration finished");

        Ok(CalibrationReport {
            samples,
            estimate,
            half_width,
        })
    }
}

/// Sets the reference's `Skill Level`, rejecting values outside the range
/// it advertised, and waits until the engine has taken it.
pub fn configure_skill(reference: &mut dyn UciEngine, level: i64) -> Result<()> {
    if !reference.is_initialized() {
        reference.handshake()?;
    }
    let (min, max) = reference
        .spin_range(SKILL_LEVEL)
        .unwrap_or(DEFAULT_SKILL_RANGE);
    if !(min..=max).contains(&level) {
        return Err(ArenaError::InvalidSkillLevel { level, min, max });
    }
    reference.set_option(SKILL_LEVEL, &level.to_string())?;
    reference.sync_ready()
}

#[cfg(test)]
#[path = "calibrator_tests.rs"]
mod calibrator_tests;
