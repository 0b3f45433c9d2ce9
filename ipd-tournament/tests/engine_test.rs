//! Integration tests for the match execution engine
//!
//! Tests the full stack: match play, caching, chunking, the worker pool and
//! result aggregation.

use std::time::Duration;

use ipd_core::action::{C, D};
use ipd_core::{Cooperator, Defector, Game, Grudger, MetaMajority, Player, Random, TitForTat};
use ipd_tournament::{
    build_chunks, CacheError, CacheKey, DeterministicCache, Match, ResultRow, ResultSet,
    Tournament, TournamentConfig, TournamentError, CHUNK_THRESHOLD,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// ============================================================================
// TEST FIXTURES
// ============================================================================

/// One stochastic player and two identical deterministic ones
fn mixed_population() -> Vec<Player> {
    Player::population(vec![
        Box::new(Random::new(0.5).unwrap()),
        Box::new(TitForTat),
        Box::new(TitForTat),
    ])
}

fn fast(tournament: Tournament) -> Tournament {
    tournament.with_intervals(Duration::from_millis(1), Duration::from_millis(1))
}

// ============================================================================
// MATCH TESTS
// ============================================================================

#[test]
fn test_deterministic_match_replays_identically() {
    let players = (
        Player::new(0, Box::new(TitForTat)),
        Player::new(1, Box::new(Grudger::default())),
    );
    let mut m = Match::new(players, 20, 0.0, Game::default(), 42).unwrap();
    let first = m.play().clone();
    let second = m.play().clone();
    assert_eq!(first, second);
    assert_eq!(first.len(), 20);
}

#[test]
fn test_full_noise_flips_every_action() {
    let players = (
        Player::new(0, Box::new(Cooperator)),
        Player::new(1, Box::new(Cooperator)),
    );
    let mut m = Match::new(players, 10, 1.0, Game::default(), 42).unwrap();
    assert!(m.play().iter().all(|&pair| pair == (D, D)));
    assert_eq!(m.final_score(), (10, 10));
    assert_eq!(m.winner(), None);
}

// ============================================================================
// CACHE TESTS
// ============================================================================

#[test]
fn test_cache_persists_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");

    let population = || {
        Player::population(vec![
            Box::new(Cooperator),
            Box::new(Defector),
            Box::new(TitForTat),
        ])
    };
    let config = TournamentConfig::fixed(8, 1).with_seed(3);

    let mut cache = DeterministicCache::new();
    let mut rows: Vec<ResultRow> = Vec::new();
    let first = Tournament::new(population(), config.clone())
        .unwrap()
        .play_serial(&mut cache, &mut rows)
        .unwrap();
    assert_eq!(first.cache_stats.hits, 0);
    cache.save(&path).unwrap();

    let mut reloaded = DeterministicCache::from_file(&path).unwrap();
    let second = Tournament::new(population(), config)
        .unwrap()
        .play_serial(&mut reloaded, &mut rows)
        .unwrap();
    assert_eq!(second.cache_stats.hits, 6);
    assert_eq!(second.cache_stats.misses, 0);
}

#[test]
fn test_prob_end_serial_freezes_cache() {
    let config = TournamentConfig::prob_end(0.25, 2).with_seed(11);
    let tournament = Tournament::new(mixed_population(), config).unwrap();
    let mut cache = DeterministicCache::new();
    let mut rows: Vec<ResultRow> = Vec::new();

    let summary = tournament.play_serial(&mut cache, &mut rows).unwrap();
    assert_eq!(summary.matches_played, 12);
    assert!(!cache.is_mutable());
    assert!(cache.is_empty());
    let cooperator = Player::new(0, Box::new(Cooperator));
    let key = CacheKey::for_players(&cooperator, &cooperator, 1).unwrap();
    assert!(matches!(
        cache.insert(key, vec![(C, C)]),
        Err(CacheError::Immutable)
    ));
}

// ============================================================================
// END-TO-END TESTS
// ============================================================================

#[test]
fn test_serial_end_to_end() {
    let config = TournamentConfig::fixed(5, 2).with_seed(42);
    let tournament = Tournament::new(mixed_population(), config).unwrap();
    let mut cache = DeterministicCache::new();
    let mut rows: Vec<ResultRow> = Vec::new();

    let summary = tournament.play_serial(&mut cache, &mut rows).unwrap();
    assert_eq!(rows.len(), 12);
    assert_eq!(summary.matches_played, 12);
    assert!(summary.cache_stats.hits > 0);
}

#[test]
fn test_parallel_end_to_end_ignores_cache() {
    let config = TournamentConfig::fixed(5, 2).with_workers(2).with_seed(42);
    let tournament = fast(Tournament::new(mixed_population(), config).unwrap());
    let cache = DeterministicCache::new();
    let mut rows: Vec<ResultRow> = Vec::new();

    let summary = tournament.play_parallel(&mut rows).unwrap();
    assert_eq!(rows.len(), 12);
    assert_eq!(summary.cache_stats.hits + summary.cache_stats.misses, 0);
    assert!(cache.is_empty());

    let results = ResultSet::from_rows(&rows, &Game::default()).unwrap();
    for pair in [(0, 0), (0, 1), (0, 2), (1, 1), (1, 2), (2, 2)] {
        assert_eq!(results.interactions(pair).len(), 2);
    }
}

#[test]
fn test_parallel_csv_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.csv");
    let players = Player::population(vec![
        Box::new(Cooperator),
        Box::new(Defector),
        Box::new(TitForTat),
        Box::new(Grudger::default()),
    ]);
    let config = TournamentConfig::fixed(10, 3).with_workers(3);
    let tournament = fast(Tournament::new(players, config).unwrap());

    let (summary, results) = tournament.play_to_file(&path).unwrap();
    assert_eq!(summary.matches_played, 30);
    assert_eq!(results.match_count(), 30);
    // Defector beats Cooperator every time
    assert!(results.player(1).unwrap().wins >= 3);
    assert_eq!(results.player(0).unwrap().wins, 0);
}

#[test]
fn test_long_running_strategy_isolated() {
    let meta = MetaMajority::new(vec![
        Box::new(TitForTat),
        Box::new(Defector),
        Box::new(Cooperator),
    ])
    .unwrap();
    let players = Player::population(vec![Box::new(meta), Box::new(Cooperator)]);
    let config = TournamentConfig::fixed(4, 2);
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let chunks = build_chunks(&players, &config, &mut rng).unwrap();
    // (0,0) and (0,1) each alone, (1,1) in the remainder
    assert_eq!(chunks.len(), 3);
    assert!(chunks.iter().all(|c| c.len() == 1));

    let tournament = fast(Tournament::new(players, config.with_workers(2)).unwrap());
    let mut rows: Vec<ResultRow> = Vec::new();
    assert_eq!(tournament.play_parallel(&mut rows).unwrap().matches_played, 6);
}

#[test]
fn test_large_population_chunk_sum() {
    let players = Player::population(
        (0..40)
            .map(|i| -> Box<dyn ipd_core::Strategy> {
                if i % 2 == 0 {
                    Box::new(TitForTat)
                } else {
                    Box::new(Defector)
                }
            })
            .collect(),
    );
    let repetitions = 20;
    let config = TournamentConfig::fixed(3, repetitions);
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let chunks = build_chunks(&players, &config, &mut rng).unwrap();

    let total: usize = chunks.iter().map(|c| c.len() * repetitions).sum();
    assert_eq!(total, 40 * 41 / 2 * repetitions);
    assert!(chunks
        .iter()
        .all(|c| (c.len() - 1) * repetitions <= CHUNK_THRESHOLD));
}

#[test]
fn test_configuration_errors() {
    assert!(matches!(
        Tournament::new(mixed_population(), TournamentConfig::fixed(5, 1).with_noise(-0.1)),
        Err(TournamentError::InvalidNoise(_))
    ));
    assert!(matches!(
        Tournament::new(mixed_population(), TournamentConfig::prob_end(2.0, 1)),
        Err(TournamentError::InvalidProbEnd(_))
    ));
    assert!(matches!(
        Match::new(
            (Player::new(0, Box::new(Cooperator)), Player::new(1, Box::new(Defector))),
            0,
            0.0,
            Game::default(),
            1
        ),
        Err(TournamentError::InvalidTurns(0))
    ));
}
