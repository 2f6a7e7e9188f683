//! Minimal UCI engine that plays a fixed list of moves.
//!
//! Used by the process integration tests. It speaks just enough UCI to be
//! driven by the arena and can be told to misbehave in a few ways.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use clap::{Parser, ValueEnum};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Answer everything
    Normal,
    /// Never answer `uci`
    Silent,
    /// Exit right after starting
    ExitEarly,
    /// Exit when asked to move
    DieOnGo,
    /// Ignore `quit` and the terminate signal
    Stubborn,
}

#[derive(Parser, Debug)]
#[command(name = "scripted_engine")]
struct Args {
    /// Name reported in `id name`
    #[arg(long, default_value = "Scripted")]
    name: String,

    /// Comma-separated `bestmove` replies, in order. `(none)` once exhausted.
    #[arg(long, default_value = "")]
    moves: String,

    #[arg(long, value_enum, default_value_t = Mode::Normal)]
    mode: Mode,

    /// Advertise `Skill Level` with this `min:max` range
    #[arg(long, allow_hyphen_values = true)]
    skill_range: Option<String>,
}

fn reply(out: &mut impl Write, line: &str) {
    writeln!(out, "{line}").ok();
    out.flush().ok();
}

/// Keeps SIGTERM pending for the whole process. The fixture is single
/// threaded, so blocking it on the main thread is enough.
#[cfg(unix)]
fn ignore_terminate() {
    use nix::sys::signal::{SigSet, Signal};

    let mut blocked = SigSet::empty();
    blocked.add(Signal::SIGTERM);
    if let Err(e) = blocked.thread_block() {
        eprintln!("could not block SIGTERM: {e}");
    }
}

#[cfg(not(unix))]
fn ignore_terminate() {}

fn main() {
    let args = Args::parse();
    if args.mode == Mode::ExitEarly {
        return;
    }
    if args.mode == Mode::Stubborn {
        ignore_terminate();
    }

    let mut script = args
        .moves
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>()
        .into_iter();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }
        eprintln!("received {line}");

        match parts[0] {
            "uci" => {
                if args.mode == Mode::Silent {
                    continue;
                }
                reply(&mut stdout, &format!("id name {}", args.name));
                reply(&mut stdout, "id author arena");
                let skill = args.skill_range.as_deref().and_then(|r| r.split_once(':'));
                if let Some((min, max)) = skill {
                    reply(
                        &mut stdout,
                        &format!(
                            "option name Skill Level type spin default {max} min {min} max {max}"
                        ),
                    );
                }
                reply(
                    &mut stdout,
                    "option name Hash type spin default 16 min 1 max 1024",
                );
                reply(&mut stdout, "uciok");
            }
            "isready" => reply(&mut stdout, "readyok"),
            "go" => {
                if args.mode == Mode::DieOnGo {
                    return;
                }
                reply(&mut stdout, "info depth 1 score cp 0");
                let mv = script.next().unwrap_or_else(|| "(none)".to_string());
                reply(&mut stdout, &format!("bestmove {mv}"));
            }
            "quit" => {
                if args.mode == Mode::Stubborn {
                    continue;
                }
                break;
            }
            _ => {}
        }
    }

    if args.mode == Mode::Stubborn {
        // Keep running after stdin closes until killed.
        loop {
            std::thread::sleep(Duration::from_millis(100));
        }
    }
}
