//! Error taxonomy for engine processes, matches and calibration

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArenaError>;

#[derive(Error, Debug)]
pub enum ArenaError {
    #[error("failed to start engine {path}: {source}")]
    ProcessStartFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("engine executable {path} is not accessible: {source}")]
    InvalidExecutable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("engine {engine} has terminated")]
    ProcessTerminated { engine: String },

    #[error("engine {engine} did not answer `{expected}` during the UCI handshake")]
    UciInitFailed {
        engine: String,
        expected: &'static str,
    },

    #[error("skill level {level} is outside the accepted range {min}..={max}")]
    InvalidSkillLevel { level: i64, min: i64, max: i64 },

    #[error("no reference engine named {name:?} was found")]
    StockfishNotFound { name: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("match statistics error: {0}")]
    Stats(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArenaError {
    /// Name of the error kind, used when no friendlier message applies.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ArenaError::ProcessStartFailed { .. } => "ProcessStartFailed",
            ArenaError::InvalidExecutable { .. } => "InvalidExecutable",
            ArenaError::ProcessTerminated { .. } => "ProcessTerminated",
            ArenaError::UciInitFailed { .. } => "UciInitFailed",
            ArenaError::InvalidSkillLevel { .. } => "InvalidSkillLevel",
            ArenaError::StockfishNotFound { .. } => "StockfishNotFound",
            ArenaError::Config(_) => "Config",
            ArenaError::Stats(_) => "Stats",
            ArenaError::Io(_) => "Io",
        }
    }

    /// One-line message for the terminal.
    pub fn diagnostic(&self) -> String {
        match self {
            ArenaError::ProcessStartFailed { path, .. } => {
                format!("Could not start engine process {}", path.display())
            }
            ArenaError::InvalidExecutable { path, .. } => {
                format!("Engine path {} cannot be opened", path.display())
            }
            ArenaError::ProcessTerminated { engine } => {
                format!("Engine {engine} exited unexpectedly")
            }
            ArenaError::UciInitFailed { engine, expected } => {
                format!("Engine {engine} failed UCI initialisation (no {expected})")
            }
            ArenaError::InvalidSkillLevel { level, min, max } => {
                format!("Skill level {level} rejected (allowed {min}..={max})")
            }
            ArenaError::StockfishNotFound { name } => {
                format!("Reference engine {name} not found in config or PATH")
            }
            ArenaError::Config(msg) => format!("Bad configuration: {msg}"),
            other => other.kind_name().to_string(),
        }
    }
}
