//! Side-channel game-end cues carried in move tokens.
//!
//! UCI has no way for an engine to announce mate or stalemate, so some
//! harness engines append a marker character to the move that ends the
//! game. Whether a given engine does so is a property of that engine, so
//! detection is a strategy chosen by configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// The mover delivered mate and wins.
    Checkmate,
    /// The position after the move is stalemate.
    Stalemate,
}

pub trait TerminationDetector {
    /// Inspects the token of a move that has just been applied.
    fn detect(&self, token: &str) -> Option<Cue>;
}

/// Reads the last character of the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuffixCues {
    pub checkmate: char,
    pub stalemate: char,
}

impl Default for SuffixCues {
    fn default() -> Self {
        Self {
            checkmate: '#',
            stalemate: '=',
        }
    }
}

impl TerminationDetector for SuffixCues {
    fn detect(&self, token: &str) -> Option<Cue> {
        match token.chars().last()? {
            c if c == self.checkmate => Some(Cue::Checkmate),
            c if c == self.stalemate => Some(Cue::Stalemate),
            _ => None,
        }
    }
}

/// Ignores tokens entirely; games end only by protocol replies,
/// repetition or the ply cap.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCues;

impl TerminationDetector for NoCues {
    fn detect(&self, _token: &str) -> Option<Cue> {
        None
    }
}

/// Detector selection as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CueConfig {
    Suffix { checkmate: char, stalemate: char },
    None,
}

impl Default for CueConfig {
    fn default() -> Self {
        let cues = SuffixCues::default();
        CueConfig::Suffix {
            checkmate: cues.checkmate,
            stalemate: cues.stalemate,
        }
    }
}

impl CueConfig {
    pub fn build(&self) -> Box<dyn TerminationDetector> {
        match *self {
            CueConfig::Suffix {
                checkmate,
                stalemate,
            } => Box::new(SuffixCues {
                checkmate,
                stalemate,
            }),
            CueConfig::None => Box::new(NoCues),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_cues() {
        let cues = SuffixCues::default();
        assert_eq!(cues.detect("d8h4#"), Some(Cue::Checkmate));
        assert_eq!(cues.detect("a7a8="), Some(Cue::Stalemate));
        assert_eq!(cues.detect("e2e4"), None);
        assert_eq!(cues.detect(""), None);
    }

    #[test]
    fn test_custom_markers() {
        let cues = SuffixCues {
            checkmate: 'M',
            stalemate: 'S',
        };
        assert_eq!(cues.detect("d8h4M"), Some(Cue::Checkmate));
        assert_eq!(cues.detect("d8h4#"), None);
    }

    #[test]
    fn test_no_cues() {
        assert_eq!(NoCues.detect("d8h4#"), None);
    }

    #[test]
    fn test_config_builds_detector() {
        let detector = CueConfig::default().build();
        assert_eq!(detector.detect("f7f8#"), Some(Cue::Checkmate));
        assert_eq!(CueConfig::None.build().detect("f7f8#"), None);
    }
}
