//! Minimal chess model for an engine arena.
//!
//! The arena trusts its engines for legality, so this crate only tracks
//! where pieces stand: a value-type board, coordinate move tokens and the
//! occupancy key used for repetition counting.

pub mod board;
pub mod types;
pub mod uci;

pub use board::*;
pub use types::*;
pub use uci::*;
