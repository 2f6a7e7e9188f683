//! Match runner and strength calibration for external UCI chess engines
//!
//! This crate provides infrastructure for:
//! - Starting engine processes and driving the UCI handshake
//! - Playing games between two engines without a rules engine, ending
//!   them on forfeit, resignation, marker cues, repetition or a ply cap
//! - Estimating an engine's rating against a reference at known skill levels
//! - Persisting per-pair results across runs
//!
//! # Usage
//!
//! ```bash
//! # Twenty games between two configured engines
//! cargo run -p arena -- match mine stockfish --games 20
//!
//! # Calibrate an engine against Stockfish skill levels
//! cargo run -p arena -- calibrate ./target/release/mine
//! ```

mod calibrator;
mod config;
mod engine;
mod engine_process;
mod error;
mod game;
mod human;
mod match_loop;
pub mod protocol;
mod protocol_log;
mod render;
mod stats;
mod termination;

#[cfg(test)]
mod test_support;

pub use calibrator::*;
pub use config::*;
pub use engine::*;
pub use engine_process::*;
pub use error::*;
pub use game::*;
pub use human::*;
pub use match_loop::*;
pub use protocol_log::*;
pub use render::*;
pub use stats::*;
pub use termination::*;
