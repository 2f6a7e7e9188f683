//! Persistent match statistics
//!
//! Win/loss/draw counters accumulate across runs in a JSON file, one entry
//! per ordered pair of engine names. The match core only ever reports
//! finished results here.

use std::path::Path;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, Result};
use crate::game::{MatchResult, Tally};

/// Counters for one ordered engine pair, from `engine1`'s perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairEntry {
    pub engine1: String,
    pub engine2: String,
    pub tally: Tally,
    /// Local time of the last update
    pub updated: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStats {
    pub pairs: Vec<PairEntry>,
}

impl MatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load statistics from a JSON file. A missing file is an empty history.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => {
                return Err(ArenaError::Stats(format!(
                    "failed to read {}: {e}",
                    path.display()
                )))
            }
        };
        serde_json::from_str(&contents)
            .map_err(|e| ArenaError::Stats(format!("failed to parse {}: {e}", path.display())))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ArenaError::Stats(format!("failed to serialize: {e}")))?;
        std::fs::write(path, json)
            .map_err(|e| ArenaError::Stats(format!("failed to write {}: {e}", path.display())))
    }

    /// Adds one game, `result` being `engine1`'s.
    pub fn record(&mut self, engine1: &str, engine2: &str, result: MatchResult) {
        let mut tally = Tally::new();
        tally.record(result);
        self.record_tally(engine1, engine2, tally);
    }

    /// Adds a whole preset's counters for the ordered pair.
    pub fn record_tally(&mut self, engine1: &str, engine2: &str, tally: Tally) {
        let updated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        match self
            .pairs
            .iter_mut()
            .find(|p| p.engine1 == engine1 && p.engine2 == engine2)
        {
            Some(entry) => {
                entry.tally.absorb(tally);
                entry.updated = updated;
            }
            None => self.pairs.push(PairEntry {
                engine1: engine1.to_string(),
                engine2: engine2.to_string(),
                tally,
                updated,
            }),
        }
    }

    /// Counters for exactly this ordering of the pair.
    pub fn tally(&self, engine1: &str, engine2: &str) -> Option<Tally> {
        self.pairs
            .iter()
            .find(|p| p.engine1 == engine1 && p.engine2 == engine2)
            .map(|p| p.tally)
    }

    /// Generate a text report
    pub fn report(&self) -> String {
        let mut report = String::new();
        report.push_str("=== Match statistics ===\n");
        report.push_str(&format!(
            "{:<20} vs {:<20} {:>5}-{:<5}-{:<5} {:>7}\n",
            "Engine 1", "Engine 2", "W", "L", "D", "Score"
        ));
        report.push_str(&"-".repeat(70));
        report.push('\n');

        for entry in &self.pairs {
            report.push_str(&format!(
                "{:<20} vs {:<20} {:>5}-{:<5}-{:<5} {:>6.1}%\n",
                entry.engine1,
                entry.engine2,
                entry.tally.wins,
                entry.tally.losses,
                entry.tally.draws,
                entry.tally.score() * 100.0
            ));
        }

        report
    }
}
