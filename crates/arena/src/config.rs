//! Arena configuration loaded from TOML
//!
//! ```toml
//! stats_path = "arena_stats.json"
//! protocol_log = "uci.log"
//!
//! [[engines]]
//! name = "stockfish"
//! path = "/usr/games/stockfish"
//!
//! [match]
//! games = 20
//! movetime_ms = 500
//!
//! [cues]
//! kind = "none"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::calibrator::CalibrationSettings;
use crate::engine_process::{EngineSpec, HandshakeOptions};
use crate::error::{ArenaError, Result};
use crate::match_loop::MatchConfig;
use crate::termination::CueConfig;

/// Config file read when no path is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "arena.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Known engines, looked up by name from the command line
    pub engines: Vec<EngineSpec>,
    #[serde(rename = "match")]
    pub match_config: MatchConfig,
    pub handshake: HandshakeOptions,
    pub cues: CueConfig,
    pub calibration: CalibrationSettings,
    /// JSON file accumulating results across runs
    pub stats_path: PathBuf,
    /// Raw protocol traffic is appended here when set
    pub protocol_log: Option<PathBuf>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            engines: Vec::new(),
            match_config: MatchConfig::default(),
            handshake: HandshakeOptions::default(),
            cues: CueConfig::default(),
            calibration: CalibrationSettings::default(),
            stats_path: PathBuf::from("arena_stats.json"),
            protocol_log: None,
        }
    }
}

impl ArenaConfig {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text)
                .map_err(|e| ArenaError::Config(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ArenaError::Config(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ArenaError::Config(e.to_string()))
    }

    /// Resolves a command-line engine argument: a configured engine name,
    /// otherwise a path to an executable.
    pub fn engine(&self, arg: &str) -> EngineSpec {
        self.engines
            .iter()
            .find(|e| e.name == arg)
            .cloned()
            .unwrap_or_else(|| EngineSpec::from_path(arg))
    }
}
