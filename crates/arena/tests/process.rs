//! End-to-end tests against real engine subprocesses.
#![cfg(unix)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use arena::{
    ArenaError, EngineProcess, EngineSpec, HandshakeOptions, MatchConfig, MatchLoop,
    MatchResult, MemoryProtocolLog, NullRenderer, Termination, UciEngine,
};

fn fixture(name: &str, args: &[&str]) -> EngineSpec {
    EngineSpec::new(name, env!("CARGO_BIN_EXE_scripted_engine"))
        .with_args(["--name", name].iter().chain(args).copied())
}

fn quick_handshake() -> HandshakeOptions {
    HandshakeOptions {
        timeout_ms: 500,
        ..Default::default()
    }
}

#[test]
fn test_handshake_marks_initialized() {
    let log = Arc::new(MemoryProtocolLog::new());
    let mut engine = EngineProcess::spawn(
        &fixture("alpha", &["--skill-range=-5:25"]),
        HandshakeOptions::default(),
    )
    .unwrap()
    .with_log(log.clone());

    assert!(!engine.is_initialized());
    engine.handshake().unwrap();
    assert!(engine.is_initialized());
    assert_eq!(engine.reported_name(), Some("alpha"));
    assert_eq!(engine.spin_range("Skill Level"), Some((-5, 25)));
    assert_eq!(engine.spin_range("hash"), Some((1, 1024)));

    engine.new_game().unwrap();
    assert!(engine.is_initialized());

    assert_eq!(
        log.lines("alpha", true),
        [
            "uci",
            "isready",
            "setoption name Hash value 16",
            "setoption name MultiPV value 1",
            "ucinewgame",
            "ucinewgame",
            "isready",
        ]
    );
    let inbound = log.lines("alpha", false);
    assert_eq!(inbound.iter().filter(|l| *l == "readyok").count(), 2);
    assert!(inbound.contains(&"uciok".to_string()));

    engine.shutdown();
    assert!(engine.is_initialized());
}

#[test]
fn test_silent_engine_fails_handshake() {
    let mut engine =
        EngineProcess::spawn(&fixture("mute", &["--mode", "silent"]), quick_handshake())
            .unwrap();

    let err = engine.handshake().unwrap_err();
    assert!(
        matches!(err, ArenaError::UciInitFailed { expected: "uciok", .. }),
        "{err:?}"
    );
    assert!(!engine.is_initialized());
}

#[test]
fn test_engine_exiting_at_start_is_terminated() {
    let options = HandshakeOptions {
        startup_grace_ms: 5_000,
        ..quick_handshake()
    };
    let err = EngineProcess::spawn(&fixture("ghost", &["--mode", "exit-early"]), options)
        .err()
        .unwrap();
    assert!(
        matches!(err, ArenaError::ProcessTerminated { ref engine } if engine == "ghost"),
        "{err:?}"
    );
}

#[test]
fn test_engine_dying_mid_game_aborts_match() {
    let mut white = EngineProcess::spawn(
        &fixture("white", &["--moves", "e2e4,g1f3"]),
        HandshakeOptions::default(),
    )
    .unwrap();
    let mut black = EngineProcess::spawn(
        &fixture("black", &["--mode", "die-on-go"]),
        HandshakeOptions::default(),
    )
    .unwrap();

    let err = MatchLoop::new(MatchConfig::default())
        .play_game(&mut white, &mut black, &mut NullRenderer)
        .unwrap_err();
    assert!(
        matches!(err, ArenaError::ProcessTerminated { ref engine } if engine == "black"),
        "{err:?}"
    );
}

#[test]
fn test_full_game_over_pipes() {
    let mut white = EngineProcess::spawn(
        &fixture("white", &["--moves", "f2f3,g2g4"]),
        HandshakeOptions::default(),
    )
    .unwrap();
    let mut black = EngineProcess::spawn(
        &fixture("black", &["--moves", "e7e5,d8h4#"]),
        HandshakeOptions::default(),
    )
    .unwrap();

    let record = MatchLoop::new(MatchConfig {
        movetime_ms: 10,
        ..Default::default()
    })
    .play_game(&mut white, &mut black, &mut NullRenderer)
    .unwrap();

    assert_eq!(record.result, MatchResult::Loss);
    assert_eq!(record.termination, Termination::CheckmateCue);
    assert_eq!(record.moves.joined(), "f2f3 e7e5 g2g4 d8h4#");
}

#[test]
fn test_preset_reuses_processes() {
    let log = Arc::new(MemoryProtocolLog::new());
    let mut a = EngineProcess::spawn(
        &fixture("a", &["--moves", "0000,0000"]),
        HandshakeOptions::default(),
    )
    .unwrap()
    .with_log(log.clone());
    let mut b = EngineProcess::spawn(
        &fixture("b", &["--moves", "e2e4"]),
        HandshakeOptions::default(),
    )
    .unwrap()
    .with_log(log.clone());
    let (pid_a, pid_b) = (a.pid(), b.pid());

    let report = MatchLoop::new(MatchConfig {
        games: 2,
        movetime_ms: 10,
        ..Default::default()
    })
    .run_match(&mut a, &mut b, &mut NullRenderer)
    .unwrap();

    assert_eq!(report.tally.losses, 2);
    assert_eq!((a.pid(), b.pid()), (pid_a, pid_b));
    let handshakes = log.lines("a", true).iter().filter(|l| *l == "uci").count();
    assert_eq!(handshakes, 1);
}

#[test]
fn test_shutdown_escalates_to_kill() {
    let mut engine = EngineProcess::spawn(
        &fixture("stubborn", &["--mode", "stubborn"]),
        HandshakeOptions::default(),
    )
    .unwrap();
    engine.handshake().unwrap();

    let started = Instant::now();
    engine.shutdown();
    assert!(started.elapsed() < Duration::from_secs(5));

    // Second call is a no-op.
    engine.shutdown();
    assert!(matches!(
        engine.send_line("isready"),
        Err(ArenaError::ProcessTerminated { .. })
    ));
}

#[test]
fn test_quit_is_honoured() {
    let log = Arc::new(MemoryProtocolLog::new());
    let mut engine = EngineProcess::spawn(&fixture("polite", &[]), HandshakeOptions::default())
        .unwrap()
        .with_log(log.clone());
    engine.handshake().unwrap();
    engine.shutdown();

    assert_eq!(
        log.lines("polite", true).last().map(String::as_str),
        Some("quit")
    );
}
