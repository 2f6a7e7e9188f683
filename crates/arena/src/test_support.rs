//! In-memory engine doubles for unit tests.

use std::collections::VecDeque;

use crate::engine::UciEngine;
use crate::error::Result;

/// Answers the handshake and replays a fixed list of `bestmove` payloads.
/// Once the script runs out the output stream reads as closed.
pub struct ScriptedEngine {
    name: String,
    script: VecDeque<String>,
    pending: VecDeque<String>,
    pub sent: Vec<String>,
    pub handshakes: u32,
    pub skill_range: Option<(i64, i64)>,
    initialized: bool,
}

impl ScriptedEngine {
    pub fn new(name: &str, replies: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            script: replies.iter().map(|r| r.to_string()).collect(),
            pending: VecDeque::new(),
            sent: Vec::new(),
            handshakes: 0,
            skill_range: None,
            initialized: false,
        }
    }

    /// Engine that replays `moves` as its replies, `times` times over.
    pub fn cycling(name: &str, moves: &[&str], times: usize) -> Self {
        let replies: Vec<&str> = moves.iter().copied().cycle().take(moves.len() * times).collect();
        Self::new(name, &replies)
    }

    /// Lines sent to this engine that start with `prefix`.
    pub fn sent_with(&self, prefix: &str) -> Vec<&str> {
        self.sent
            .iter()
            .filter(|l| l.starts_with(prefix))
            .map(String::as_str)
            .collect()
    }
}

impl UciEngine for ScriptedEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn handshake(&mut self) -> Result<()> {
        self.handshakes += 1;
        self.send_line("uci")?;
        self.pending.clear();
        self.initialized = true;
        Ok(())
    }

    fn send_line(&mut self, line: &str) -> Result<()> {
        self.sent.push(line.to_string());
        match line.split_whitespace().next() {
            Some("uci") => self.pending.push_back("uciok".to_string()),
            Some("isready") => self.pending.push_back("readyok".to_string()),
            Some("go") => {
                if let Some(reply) = self.script.pop_front() {
                    self.pending.push_back("info depth 1 score cp 12".to_string());
                    self.pending.push_back(format!("bestmove {reply}"));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        Ok(self.pending.pop_front())
    }

    fn spin_range(&self, name: &str) -> Option<(i64, i64)> {
        if name.eq_ignore_ascii_case("Skill Level") {
            self.skill_range
        } else {
            None
        }
    }
}
