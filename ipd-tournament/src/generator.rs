//! Match generation - pairing a population into matches
//!
//! Level 2 - Phase-level implementation (serial, cache-aware path)
//!
//! A round robin visits every unordered pair `(i, j)` with `i <= j` exactly
//! once, self-play included. A spatial tournament visits an explicit edge
//! list instead.

use ipd_core::{Game, Player};
use rand::Rng;

use crate::cache::DeterministicCache;
use crate::config::{TournamentConfig, TurnSpec};
use crate::error::{Result, TournamentError};
use crate::length::sample_length;
use crate::match_play::{Match, MatchResult};

/// Index pair of one contest
pub type Pair = (usize, usize);

/// Builds the matches of one round robin repetition
#[derive(Debug)]
pub struct MatchGenerator<'a> {
    players: &'a [Player],
    turns: TurnSpec,
    noise: f64,
    game: Game,
    max_turns: usize,
    edges: Vec<Pair>,
}

impl<'a> MatchGenerator<'a> {
    /// Generator for the turn spec, noise, game and edges of `config`
    pub fn new(players: &'a [Player], config: &TournamentConfig) -> Result<Self> {
        config.validate()?;
        if players.is_empty() {
            return Err(TournamentError::EmptyPopulation);
        }
        let edges = match &config.edges {
            Some(edges) => validate_edges(edges, players.len())?,
            None => complete_graph(players.len()),
        };
        Ok(Self {
            players,
            turns: config.turns,
            noise: config.noise,
            game: config.game,
            max_turns: config.max_turns,
            edges,
        })
    }

    /// Fixed-length round robin
    pub fn round_robin(players: &'a [Player], turns: usize, noise: f64, game: Game) -> Result<Self> {
        let config = TournamentConfig {
            turns: TurnSpec::Fixed(turns),
            repetitions: 1,
            noise,
            game,
            ..Default::default()
        };
        Self::new(players, &config)
    }

    /// Round robin whose match lengths are sampled per pair
    pub fn prob_end_round_robin(
        players: &'a [Player],
        prob_end: f64,
        noise: f64,
        game: Game,
    ) -> Result<Self> {
        let config = TournamentConfig {
            turns: TurnSpec::ProbEnd(prob_end),
            repetitions: 1,
            noise,
            game,
            ..Default::default()
        };
        Self::new(players, &config)
    }

    /// Number of pairs per repetition
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn pairs(&self) -> &[Pair] {
        &self.edges
    }

    pub fn turn_spec(&self) -> TurnSpec {
        self.turns
    }

    /// Freeze the cache when lengths are sampled
    ///
    /// A cache entry is only valid for one exact length, so nothing played
    /// with a sampled length may be written.
    pub fn prepare_cache(&self, cache: &mut DeterministicCache) {
        if self.turns.is_prob_end() && cache.is_mutable() {
            tracing::debug!("Freezing deterministic cache for prob-end round robin");
            cache.freeze();
        }
    }

    /// Lazily build one fresh match per pair
    pub fn build_matches<'g, R: Rng>(
        &'g self,
        rng: &'g mut R,
    ) -> impl Iterator<Item = Result<(Pair, Match)>> + 'g {
        self.edges.iter().map(move |&(i, j)| {
            let turns = match self.turns {
                TurnSpec::Fixed(turns) => turns,
                TurnSpec::ProbEnd(p) => sample_length(p, &mut *rng)?.capped(self.max_turns),
            };
            let seed = rng.gen::<u64>();
            let players = (self.players[i].fresh(), self.players[j].fresh());
            let m = Match::new(players, turns, self.noise, self.game, seed)?;
            Ok(((i, j), m))
        })
    }

    /// Build and play one repetition, serving deterministic pairs from the cache
    pub fn play_round<'g, R: Rng>(
        &'g self,
        cache: &'g mut DeterministicCache,
        rng: &'g mut R,
    ) -> impl Iterator<Item = Result<MatchResult>> + 'g {
        self.prepare_cache(cache);
        self.build_matches(rng).map(move |built| {
            let (_, mut m) = built?;
            m.play_cached(&mut *cache)?;
            Ok(m.to_result())
        })
    }
}

/// Every pair (i, j) with i <= j
pub fn complete_graph(n: usize) -> Vec<Pair> {
    (0..n).flat_map(|i| (i..n).map(move |j| (i, j))).collect()
}

/// True when every player appears on at least one edge
///
/// This does not check that every node is reachable from every other.
pub fn graph_is_connected(edges: &[Pair], n: usize) -> bool {
    let mut seen = vec![false; n];
    for &(i, j) in edges {
        if i < n {
            seen[i] = true;
        }
        if j < n {
            seen[j] = true;
        }
    }
    seen.into_iter().all(|s| s)
}

fn validate_edges(edges: &[Pair], n: usize) -> Result<Vec<Pair>> {
    if let Some(&(i, j)) = edges.iter().find(|&&(i, j)| i >= n || j >= n) {
        return Err(TournamentError::UnknownPlayer(i.max(j)));
    }
    if !graph_is_connected(edges, n) {
        return Err(TournamentError::DisconnectedEdges);
    }
    Ok(edges.to_vec())
}
