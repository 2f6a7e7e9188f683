use super::*;
use crate::render::NullRenderer;
use crate::test_support::ScriptedEngine;
use proptest::prelude::*;

fn two_levels(games_per_level: u32) -> CalibrationSettings {
    CalibrationSettings {
        reference: "stockfish".to_string(),
        games_per_level,
        levels: vec![
            CalibrationLevel::new(0, 1350.0),
            CalibrationLevel::new(20, 3350.0),
        ],
    }
}

/// Candidate beats level 0 every game and loses every game at level 20.
fn dominant_then_crushed(games: usize) -> (ScriptedEngine, ScriptedEngine) {
    let half = games / 2;
    let mut candidate_moves = vec!["e2e4"; half];
    candidate_moves.extend(vec!["0000"; games]);
    let mut reference_moves = vec!["0000"; games];
    reference_moves.extend(vec!["e2e4"; half]);
    (
        ScriptedEngine::new("candidate", &candidate_moves),
        ScriptedEngine::new("stockfish", &reference_moves),
    )
}

fn sample(rating: f64, wins: u32, draws: u32, games: u32) -> CalibrationSample {
    CalibrationSample {
        skill: 0,
        assumed_rating: rating,
        wins,
        draws,
        games,
    }
}

#[test]
fn test_estimate_ignores_levels_without_score() {
    for games in [2, 4, 6] {
        let (mut candidate, mut reference) = dominant_then_crushed(games);
        let calibrator = Calibrator::new(two_levels(games as u32), MatchConfig::default());

        let report = calibrator
            .run(&mut candidate, &mut reference, &mut NullRenderer)
            .unwrap();

        assert_eq!(report.estimate, 1350.0, "games per level: {games}");
        assert_eq!(report.samples[0].score(), 1.0);
        assert_eq!(report.samples[1].score(), 0.0);
        assert_eq!(report.total_games(), 2 * games as u32);
    }
}

#[test]
fn test_skill_levels_sent_in_order() {
    let (mut candidate, mut reference) = dominant_then_crushed(2);
    Calibrator::new(two_levels(2), MatchConfig::default())
        .run(&mut candidate, &mut reference, &mut NullRenderer)
        .unwrap();

    assert_eq!(
        reference.sent_with("setoption name Skill Level"),
        [
            "setoption name Skill Level value 0",
            "setoption name Skill Level value 20",
        ]
    );
    assert_eq!(reference.handshakes, 1);
    assert_eq!(candidate.handshakes, 1);
}

#[test]
fn test_half_width_shrinks_with_games() {
    assert_eq!(confidence_half_width(0), f64::INFINITY);
    assert_eq!(confidence_half_width(1), CONFIDENCE_K);
    assert!((confidence_half_width(100) - 68.0).abs() < 1e-9);
    assert!(confidence_half_width(400) < confidence_half_width(100));
}

#[test]
fn test_report_half_width_uses_all_games() {
    let (mut candidate, mut reference) = dominant_then_crushed(2);
    let report = Calibrator::new(two_levels(2), MatchConfig::default())
        .run(&mut candidate, &mut reference, &mut NullRenderer)
        .unwrap();

    assert!((report.half_width - CONFIDENCE_K / 2.0).abs() < 1e-9);
    assert!(report.to_string().contains("Estimate: 1350"));
}

#[test]
fn test_skill_outside_default_range_rejected() {
    let mut reference = ScriptedEngine::new("stockfish", &[]);
    let err = configure_skill(&mut reference, 25).unwrap_err();
    assert!(matches!(
        err,
        ArenaError::InvalidSkillLevel {
            level: 25,
            min: 0,
            max: 20
        }
    ));
    assert!(reference.sent_with("setoption").is_empty());
}

#[test]
fn test_skill_range_follows_advertised_option() {
    let mut reference = ScriptedEngine::new("stockfish", &[]);
    reference.skill_range = Some((-20, 40));

    configure_skill(&mut reference, -5).unwrap();
    configure_skill(&mut reference, 30).unwrap();
    assert!(configure_skill(&mut reference, 41).is_err());
    assert_eq!(reference.sent_with("setoption").len(), 2);
}

#[test]
fn test_invalid_level_aborts_run() {
    let mut candidate = ScriptedEngine::new("candidate", &[]);
    let mut reference = ScriptedEngine::new("stockfish", &[]);
    let settings = CalibrationSettings {
        levels: vec![CalibrationLevel::new(21, 3400.0)],
        ..two_levels(2)
    };

    let err = Calibrator::new(settings, MatchConfig::default())
        .run(&mut candidate, &mut reference, &mut NullRenderer)
        .unwrap_err();
    assert_eq!(err.kind_name(), "InvalidSkillLevel");
    assert!(candidate.sent_with("go").is_empty());
}

#[test]
fn test_empty_ladder_is_a_config_error() {
    let mut candidate = ScriptedEngine::new("candidate", &[]);
    let mut reference = ScriptedEngine::new("stockfish", &[]);
    let settings = CalibrationSettings {
        levels: Vec::new(),
        ..Default::default()
    };

    let err = Calibrator::new(settings, MatchConfig::default())
        .run(&mut candidate, &mut reference, &mut NullRenderer)
        .unwrap_err();
    assert!(matches!(err, ArenaError::Config(_)));
}

#[test]
fn test_sample_score() {
    assert_eq!(sample(1500.0, 3, 2, 8).score(), 0.5);
    assert_eq!(sample(1500.0, 0, 0, 0).score(), 0.0);
    assert_eq!(sample(1500.0, 4, 0, 4).score(), 1.0);
}

#[test]
fn test_estimate_weighting() {
    let samples = [sample(1000.0, 1, 0, 1), sample(2000.0, 1, 0, 1)];
    assert_eq!(estimate_rating(&samples), Some(1500.0));

    let samples = [sample(1000.0, 3, 0, 4), sample(2000.0, 0, 2, 4)];
    // 0.75 * 1000 + 0.25 * 2000 over 1.0
    assert_eq!(estimate_rating(&samples), Some(1250.0));

    let samples = [sample(2000.0, 0, 0, 4), sample(1000.0, 0, 0, 4)];
    assert_eq!(estimate_rating(&samples), Some(1000.0));
    assert_eq!(estimate_rating(&[]), None);
}

#[test]
fn test_locate_reference_prefers_config() {
    let engines = vec![
        EngineSpec::new("mine", "/opt/mine"),
        EngineSpec::new("Stockfish 16", "/opt/sf16"),
    ];
    let spec = locate_reference_in(&engines, "stockfish", None).unwrap();
    assert_eq!(spec.path, PathBuf::from("/opt/sf16"));
}

#[test]
fn test_locate_reference_searches_path() {
    let dir = env::temp_dir().join(format!("arena-path-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let exe = dir.join("fakefish");
    std::fs::write(&exe, "").unwrap();

    let search = env::join_paths([PathBuf::from("/definitely/missing"), dir.clone()]).unwrap();
    let spec = locate_reference_in(&[], "fakefish", Some(search)).unwrap();
    std::fs::remove_dir_all(&dir).ok();

    assert_eq!(spec.name, "fakefish");
    assert_eq!(spec.path, exe);
}

#[test]
fn test_missing_reference() {
    let err = locate_reference_in(&[], "stockfish", None).unwrap_err();
    assert!(
        matches!(err, ArenaError::StockfishNotFound { ref name } if name == "stockfish"),
        "{err:?}"
    );
}

fn sample_strategy() -> impl Strategy<Value = CalibrationSample> {
    (1000.0f64..3500.0, 1u32..20)
        .prop_flat_map(|(rating, games)| {
            (Just(rating), Just(games), 0..=games)
                .prop_flat_map(|(rating, games, wins)| {
                    (Just(rating), Just(games), Just(wins), 0..=games - wins)
                })
        })
        .prop_map(|(rating, games, wins, draws)| sample(rating, wins, draws, games))
}

proptest! {
    #[test]
    fn prop_score_is_a_fraction(s in sample_strategy()) {
        let score = s.score();
        prop_assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn prop_estimate_within_supplied_ratings(
        samples in prop::collection::vec(sample_strategy(), 1..8)
    ) {
        let estimate = estimate_rating(&samples).unwrap();
        let lo = samples.iter().map(|s| s.assumed_rating).fold(f64::INFINITY, f64::min);
        let hi = samples.iter().map(|s| s.assumed_rating).fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(
            estimate >= lo - 1e-6 && estimate <= hi + 1e-6,
            "{estimate} not in {lo}..={hi}"
        );
    }
}
