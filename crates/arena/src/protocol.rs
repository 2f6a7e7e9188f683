//! UCI command formatting and reply parsing
//!
//! Only the subset of the protocol the arena drives is covered here.

/// Prefix of the reply that ends an engine's turn.
pub const BESTMOVE: &str = "bestmove";

/// Payload marker of an engine that has no legal move.
pub const NO_MOVE_MARKER: &str = "(none)";

/// Width of the move token taken from a `bestmove` reply: two squares, an
/// optional promotion letter and an optional trailing marker.
pub const MOVE_TOKEN_WIDTH: usize = 6;

/// `position startpos [moves ...]` for the given history.
pub fn position_command(moves: &str) -> String {
    if moves.is_empty() {
        "position startpos".to_string()
    } else {
        format!("position startpos moves {moves}")
    }
}

/// Move list embedded in a position command, or `None` if `cmd` is not one.
pub fn embedded_moves(cmd: &str) -> Option<&str> {
    let rest = cmd.strip_prefix("position startpos")?;
    if rest.is_empty() {
        return Some("");
    }
    rest.strip_prefix(" moves ")
}

pub fn go_movetime(ms: u64) -> String {
    format!("go movetime {ms}")
}

pub fn set_option(name: &str, value: &str) -> String {
    format!("setoption name {name} value {value}")
}

/// A `bestmove` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestMove {
    /// Everything after the `bestmove` keyword, trimmed.
    pub payload: String,
}

impl BestMove {
    /// Parses a line beginning with the literal `bestmove` token.
    pub fn parse(line: &str) -> Option<BestMove> {
        let rest = line.trim().strip_prefix(BESTMOVE)?;
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return None;
        }
        Some(BestMove {
            payload: rest.trim().to_string(),
        })
    }

    /// The engine declared it has no move.
    pub fn is_no_move(&self) -> bool {
        self.payload.contains(NO_MOVE_MARKER)
    }

    /// First word of the payload, cut to [`MOVE_TOKEN_WIDTH`] characters.
    /// The `ponder` suffix and anything else after it is dropped.
    pub fn token(&self) -> String {
        self.payload
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .chars()
            .take(MOVE_TOKEN_WIDTH)
            .collect()
    }
}

/// A `type spin` option advertised during the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinOption {
    pub name: String,
    pub min: i64,
    pub max: i64,
}

/// Parses `option name <N...> type spin default <d> min <lo> max <hi>`.
/// Option names may contain spaces.
pub fn parse_spin_option(line: &str) -> Option<SpinOption> {
    let rest = line.trim().strip_prefix("option name ")?;
    let (name, attrs) = rest.split_once(" type ")?;
    let mut words = attrs.split_whitespace();
    if words.next()? != "spin" {
        return None;
    }
    let (mut min, mut max) = (None, None);
    while let Some(word) = words.next() {
        match word {
            "min" => min = words.next().and_then(|v| v.parse().ok()),
            "max" => max = words.next().and_then(|v| v.parse().ok()),
            _ => {}
        }
    }
    Some(SpinOption {
        name: name.trim().to_string(),
        min: min?,
        max: max?,
    })
}

/// Value of an `id name ...` line.
pub fn parse_id_name(line: &str) -> Option<&str> {
    line.trim()
        .strip_prefix("id name ")
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod protocol_tests;
