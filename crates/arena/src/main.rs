//! Arena CLI
//!
//! Run matches between UCI engines, calibrate an engine against a
//! reference, or play one yourself.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use arena::{
    locate_reference, ArenaConfig, ArenaError, BoardRenderer, Calibrator, EngineProcess,
    EngineSpec, FileProtocolLog, HumanPlayer, MatchLoop, MatchStats, NullRenderer, ProtocolLog,
    TerminalRenderer, UciEngine, DEFAULT_CONFIG_PATH,
};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "arena")]
#[command(about = "Run matches between UCI chess engines and estimate their strength")]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Do not draw the board after each ply
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a preset of games between two engines
    Match {
        /// Configured engine name or executable path
        engine1: String,
        engine2: String,
        /// Number of games to play
        #[arg(short, long)]
        games: Option<u32>,
        /// Time per move in milliseconds
        #[arg(short, long)]
        movetime: Option<u64>,
    },
    /// Estimate an engine's rating against the reference at each skill level
    Calibrate {
        candidate: String,
        #[arg(short, long)]
        games_per_level: Option<u32>,
        /// Reference engine name, looked up in the config and then on PATH
        #[arg(short, long)]
        reference: Option<String>,
    },
    /// Play against an engine from the terminal
    Play {
        engine: String,
        /// Take the black pieces
        #[arg(long)]
        black: bool,
    },
    /// Show accumulated match statistics
    Stats,
}

struct Session {
    config: ArenaConfig,
    log: Option<Arc<dyn ProtocolLog>>,
    quiet: bool,
}

impl Session {
    fn open(cli: &Cli) -> anyhow::Result<Self> {
        let config = ArenaConfig::load(&cli.config)?;
        let log = match &config.protocol_log {
            Some(path) => {
                let sink = FileProtocolLog::create(path)
                    .with_context(|| format!("opening protocol log {}", path.display()))?;
                Some(Arc::new(sink) as Arc<dyn ProtocolLog>)
            }
            None => None,
        };
        Ok(Self {
            config,
            log,
            quiet: cli.quiet,
        })
    }

    fn spawn(&self, spec: &EngineSpec) -> Result<EngineProcess, ArenaError> {
        let engine = EngineProcess::spawn(spec, self.config.handshake)?;
        Ok(match &self.log {
            Some(log) => engine.with_log(Arc::clone(log)),
            None => engine,
        })
    }

    fn renderer(&self) -> Box<dyn BoardRenderer> {
        if self.quiet {
            Box::new(NullRenderer)
        } else {
            Box::new(TerminalRenderer::new(io::stdout()))
        }
    }

    fn record_stats(&self, engine1: &str, engine2: &str, tally: arena::Tally) {
        let path = &self.config.stats_path;
        let saved = MatchStats::load(path).and_then(|mut stats| {
            stats.record_tally(engine1, engine2, tally);
            stats.save(path)
        });
        if let Err(e) = saved {
            eprintln!(
                "Warning: Failed to save match statistics: {}",
                e.diagnostic()
            );
        }
    }
}

fn run_match(
    session: &Session,
    engine1: &str,
    engine2: &str,
    games: Option<u32>,
    movetime: Option<u64>,
) -> anyhow::Result<()> {
    let mut config = session.config.match_config.clone();
    if let Some(games) = games {
        config.games = games;
    }
    if let Some(ms) = movetime {
        config.movetime_ms = ms;
    }

    let mut e1 = session.spawn(&session.config.engine(engine1))?;
    let mut e2 = session.spawn(&session.config.engine(engine2))?;

    let runner = MatchLoop::new(config).with_detector(session.config.cues.build());

    println!("=== Match: {} vs {} ===", e1.name(), e2.name());
    println!(
        "Games: {}, Movetime: {} ms",
        runner.config().games,
        runner.config().movetime_ms
    );
    println!();

    let mut renderer = session.renderer();
    let report = runner.run_match(&mut e1, &mut e2, renderer.as_mut())?;

    println!();
    println!("=== Final Result ===");
    for (i, game) in report.games.iter().enumerate() {
        println!(
            "{:>3}. {} - {}: {} ({:?}, {} plies)",
            i + 1,
            game.white,
            game.black,
            game.result.notation(),
            game.termination,
            game.plies
        );
    }
    let tally = report.tally;
    println!(
        "{}: {} wins, {} losses, {} draws",
        e1.name(),
        tally.wins,
        tally.losses,
        tally.draws
    );
    println!("Score: {:.1}%", tally.score() * 100.0);

    session.record_stats(e1.name(), e2.name(), tally);
    e1.shutdown();
    e2.shutdown();
    Ok(())
}

fn run_calibration(
    session: &Session,
    candidate: &str,
    games_per_level: Option<u32>,
    reference: Option<String>,
) -> anyhow::Result<()> {
    let mut settings = session.config.calibration.clone();
    if let Some(games) = games_per_level {
        settings.games_per_level = games;
    }
    if let Some(name) = reference {
        settings.reference = name;
    }

    let reference_spec = locate_reference(&session.config.engines, &settings.reference)?;
    let mut reference = session.spawn(&reference_spec)?;
    let mut candidate = session.spawn(&session.config.engine(candidate))?;

    let calibrator = Calibrator::new(settings, session.config.match_config.clone())
        .with_detector(session.config.cues.build());

    println!(
        "=== Calibration: {} against {} ({} levels, {} games each) ===",
        candidate.name(),
        reference.name(),
        calibrator.settings().levels.len(),
        calibrator.settings().games_per_level
    );
    let mut renderer = session.renderer();
    let report = calibrator.run(&mut candidate, &mut reference, renderer.as_mut())?;

    println!();
    println!("{report}");
    candidate.shutdown();
    reference.shutdown();
    Ok(())
}

fn run_play(session: &Session, engine: &str, black: bool) -> anyhow::Result<()> {
    let mut opponent = session.spawn(&session.config.engine(engine))?;
    let mut human = HumanPlayer::new("you", io::stdin().lock(), io::stdout());

    let runner = MatchLoop::new(session.config.match_config.clone())
        .with_detector(session.config.cues.build());
    let mut renderer = TerminalRenderer::new(io::stdout()).scrolling();

    let record = if black {
        runner.play_game(&mut opponent, &mut human, &mut renderer)?
    } else {
        runner.play_game(&mut human, &mut opponent, &mut renderer)?
    };
    let result = if black {
        record.result.flipped()
    } else {
        record.result
    };

    println!();
    println!(
        "{} - {}: {} ({:?} after {} plies)",
        record.white,
        record.black,
        record.result.notation(),
        record.termination,
        record.plies
    );

    let mut tally = arena::Tally::new();
    tally.record(result);
    session.record_stats(human.name(), opponent.name(), tally);
    opponent.shutdown();
    Ok(())
}

fn show_stats(session: &Session) -> anyhow::Result<()> {
    let stats = MatchStats::load(&session.config.stats_path)?;
    if stats.pairs.is_empty() {
        println!("No match data found. Run some matches first!");
    } else {
        print!("{}", stats.report());
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let session = Session::open(&cli)?;
    info!(config = %cli.config.display(), "arena started");

    match cli.command {
        Command::Match {
            engine1,
            engine2,
            games,
            movetime,
        } => run_match(&session, &engine1, &engine2, games, movetime),
        Command::Calibrate {
            candidate,
            games_per_level,
            reference,
        } => run_calibration(&session, &candidate, games_per_level, reference),
        Command::Play { engine, black } => run_play(&session, &engine, black),
        Command::Stats => show_stats(&session),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<ArenaError>() {
                Some(arena_err) => eprintln!("Error: {}", arena_err.diagnostic()),
                None => eprintln!("Error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
