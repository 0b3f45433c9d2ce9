//! Chunk scheduler - packs pair work into units for the worker pool
//!
//! Level 2 - Phase-level implementation (parallel path)
//!
//! All repetitions of one pair travel together in a single [`PairWork`], so a
//! worker replays the same match object back to back.

use ipd_core::{Game, Player};
use rand::Rng;

use crate::config::TournamentConfig;
use crate::error::Result;
use crate::generator::{MatchGenerator, Pair};
use crate::length::generate_lengths;

/// Matches per chunk above which the current chunk is closed
pub const CHUNK_THRESHOLD: usize = 500;

/// Every repetition of one pair
#[derive(Clone, Debug)]
pub struct PairWork {
    pub pair: Pair,
    /// Fresh copies, owned by whichever worker receives the chunk
    pub players: (Player, Player),
    /// One length per repetition
    pub lengths: Vec<usize>,
    pub noise: f64,
    pub game: Game,
    pub seed: u64,
}

impl PairWork {
    pub fn repetitions(&self) -> usize {
        self.lengths.len()
    }

    fn is_long_running(&self) -> bool {
        self.players.0.classifier().long_run_time
    }
}

/// Work assigned to one worker, consumed exactly once
pub type Chunk = Vec<PairWork>;

/// Total matches held by a chunk
pub fn chunk_matches(chunk: &Chunk) -> usize {
    chunk.iter().map(PairWork::repetitions).sum()
}

/// Split the population's pairs into chunks
///
/// A chunk is closed once `len * repetitions` exceeds [`CHUNK_THRESHOLD`].
/// A pair whose first player is long-running always gets a chunk of its own.
pub fn build_chunks<R: Rng>(
    players: &[Player],
    config: &TournamentConfig,
    rng: &mut R,
) -> Result<Vec<Chunk>> {
    let generator = MatchGenerator::new(players, config)?;
    let repetitions = config.repetitions;

    let mut chunks = Vec::new();
    let mut chunk: Chunk = Vec::new();

    for &(i, j) in generator.pairs() {
        let lengths = generate_lengths(config.turns, repetitions, config.max_turns, &mut *rng)?;
        let work = PairWork {
            pair: (i, j),
            players: (players[i].fresh(), players[j].fresh()),
            lengths,
            noise: config.noise,
            game: config.game,
            seed: rng.gen(),
        };

        let long_running = work.is_long_running();
        if long_running && !chunk.is_empty() {
            chunks.push(std::mem::take(&mut chunk));
        }
        chunk.push(work);
        if long_running || chunk.len() * repetitions > CHUNK_THRESHOLD {
            chunks.push(std::mem::take(&mut chunk));
        }
    }
    if !chunk.is_empty() {
        chunks.push(chunk);
    }

    tracing::debug!(
        pairs = generator.len(),
        chunks = chunks.len(),
        "Built chunks"
    );
    Ok(chunks)
}
