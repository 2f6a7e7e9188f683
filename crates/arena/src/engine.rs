//! The seam between the match loop and whatever plays a side.
//!
//! External processes ([`crate::EngineProcess`]), the terminal player
//! ([`crate::HumanPlayer`]) and scripted test doubles all speak the same
//! line protocol through this trait.

use crate::error::{ArenaError, Result};
use crate::protocol;

pub trait UciEngine {
    /// Display name used in logs and results.
    fn name(&self) -> &str;

    /// True once the handshake has completed. Never reverts.
    fn is_initialized(&self) -> bool;

    /// Runs the UCI handshake and marks the engine initialized.
    fn handshake(&mut self) -> Result<()>;

    /// Writes one command line.
    fn send_line(&mut self, line: &str) -> Result<()>;

    /// Blocks until the next line arrives. `None` means the stream closed.
    fn read_line(&mut self) -> Result<Option<String>>;

    /// Range of a `type spin` option the engine advertised, if any.
    fn spin_range(&self, _name: &str) -> Option<(i64, i64)> {
        None
    }

    fn set_option(&mut self, name: &str, value: &str) -> Result<()> {
        self.send_line(&protocol::set_option(name, value))
    }

    /// `isready` / `readyok` round trip.
    fn sync_ready(&mut self) -> Result<()> {
        self.send_line("isready")?;
        loop {
            match self.read_line()? {
                Some(line) if line.trim() == "readyok" => return Ok(()),
                Some(_) => continue,
                None => {
                    return Err(ArenaError::ProcessTerminated {
                        engine: self.name().to_string(),
                    })
                }
            }
        }
    }

    /// Resets engine state between games of one preset.
    fn new_game(&mut self) -> Result<()> {
        self.send_line("ucinewgame")?;
        self.sync_ready()
    }
}
