//! Match play - one contest between two players
//!
//! Level 2 - Phase-level implementation

use ipd_core::interactions::{self, Interactions};
use ipd_core::{Action, Game, Player, Score};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::cache::{CacheKey, DeterministicCache};
use crate::config::{validate_noise, validate_turns};
use crate::error::Result;

/// Result of one played match, as sent to the result consumer
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    /// Population index of player A
    pub index_a: usize,
    /// Population index of player B
    pub index_b: usize,
    pub name_a: String,
    pub name_b: String,
    /// One action pair per turn
    pub interactions: Interactions,
}

impl MatchResult {
    /// Total scores under the given payoff table
    pub fn scores(&self, game: &Game) -> (Score, Score) {
        interactions::final_score(&self.interactions, game)
    }

    /// Population index of the strictly higher scorer
    pub fn winner(&self, game: &Game) -> Option<usize> {
        interactions::winner_index(&self.interactions, game).map(|slot| {
            if slot == 0 {
                self.index_a
            } else {
                self.index_b
            }
        })
    }

    pub fn turns(&self) -> usize {
        self.interactions.len()
    }
}

/// A single contest between two players
///
/// The match owns fresh copies of both players, so nothing it does is seen
/// by any other match.
#[derive(Debug)]
pub struct Match {
    player_a: Player,
    player_b: Player,
    turns: usize,
    noise: f64,
    game: Game,
    rng: ChaCha8Rng,
    result: Interactions,
}

impl Match {
    /// Create a match; fails on zero turns or noise outside [0, 1]
    pub fn new(
        players: (Player, Player),
        turns: usize,
        noise: f64,
        game: Game,
        seed: u64,
    ) -> Result<Self> {
        validate_turns(turns)?;
        validate_noise(noise)?;
        Ok(Self {
            player_a: players.0,
            player_b: players.1,
            turns,
            noise,
            game,
            rng: ChaCha8Rng::seed_from_u64(seed),
            result: Vec::new(),
        })
    }

    pub fn turns(&self) -> usize {
        self.turns
    }

    pub fn noise(&self) -> f64 {
        self.noise
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn players(&self) -> (&Player, &Player) {
        (&self.player_a, &self.player_b)
    }

    /// Change the length for the next replay
    pub fn set_turns(&mut self, turns: usize) -> Result<()> {
        validate_turns(turns)?;
        self.turns = turns;
        Ok(())
    }

    /// Change the noise for the next replay
    pub fn set_noise(&mut self, noise: f64) -> Result<()> {
        validate_noise(noise)?;
        self.noise = noise;
        Ok(())
    }

    pub fn set_game(&mut self, game: Game) {
        self.game = game;
    }

    /// True when replaying could produce a different sequence
    pub fn is_stochastic(&self) -> bool {
        self.noise > 0.0 || self.player_a.is_stochastic() || self.player_b.is_stochastic()
    }

    /// Cache key of this contest, `None` when it is stochastic
    pub fn cache_key(&self) -> Option<CacheKey> {
        if self.is_stochastic() {
            return None;
        }
        CacheKey::for_players(&self.player_a, &self.player_b, self.turns).ok()
    }

    /// Play the match without consulting any cache
    pub fn play(&mut self) -> &Interactions {
        self.result = self.simulate();
        &self.result
    }

    /// Play the match, serving deterministic contests from the cache
    ///
    /// On a miss the fresh sequence is written back, unless the cache is frozen.
    pub fn play_cached(&mut self, cache: &mut DeterministicCache) -> Result<&Interactions> {
        let Some(key) = self.cache_key() else {
            self.result = self.simulate();
            return Ok(&self.result);
        };

        if let Some(entry) = cache.lookup(&key) {
            self.result = entry.clone();
            self.restore_histories();
            return Ok(&self.result);
        }

        self.result = self.simulate();
        if cache.is_mutable() {
            cache.insert(key, self.result.clone())?;
        }
        Ok(&self.result)
    }

    /// Interactions of the last play
    pub fn result(&self) -> &Interactions {
        &self.result
    }

    pub fn final_score(&self) -> (Score, Score) {
        interactions::final_score(&self.result, &self.game)
    }

    pub fn final_score_per_turn(&self) -> Option<(f64, f64)> {
        interactions::final_score_per_turn(&self.result, &self.game)
    }

    /// Population index of the winner, `None` on a tie
    pub fn winner(&self) -> Option<usize> {
        interactions::winner_index(&self.result, &self.game).map(|slot| {
            if slot == 0 {
                self.player_a.index
            } else {
                self.player_b.index
            }
        })
    }

    pub fn cooperation(&self) -> (usize, usize) {
        interactions::cooperations(&self.result)
    }

    pub fn sparklines(&self, c_symbol: char, d_symbol: char) -> String {
        interactions::sparklines(&self.result, c_symbol, d_symbol)
    }

    /// Snapshot of the last play for the result consumer
    pub fn to_result(&self) -> MatchResult {
        MatchResult {
            index_a: self.player_a.index,
            index_b: self.player_b.index,
            name_a: self.player_a.name().to_string(),
            name_b: self.player_b.name().to_string(),
            interactions: self.result.clone(),
        }
    }

    // ========================================================================
    // Level 3 - Steps
    // ========================================================================

    /// Run every turn from empty histories
    fn simulate(&mut self) -> Interactions {
        let Self {
            player_a,
            player_b,
            turns,
            noise,
            rng,
            ..
        } = self;

        player_a.reset();
        player_b.reset();

        for _ in 0..*turns {
            let intended_a = player_a.decide(player_b.history(), &mut *rng);
            let intended_b = player_b.decide(player_a.history(), &mut *rng);
            let (actual_a, actual_b) = apply_noise(intended_a, intended_b, *noise, &mut *rng);
            player_a.record(actual_a);
            player_b.record(actual_b);
        }

        player_a
            .history()
            .iter()
            .copied()
            .zip(player_b.history().iter().copied())
            .collect()
    }

    /// Rebuild both histories from a served cache entry
    fn restore_histories(&mut self) {
        self.player_a.reset();
        self.player_b.reset();
        for &(a, b) in &self.result {
            self.player_a.record(a);
            self.player_b.record(b);
        }
    }
}

/// Flip each intended action independently with probability `noise`
fn apply_noise<R: Rng>(
    a: Action,
    b: Action,
    noise: f64,
    rng: &mut R,
) -> (Action, Action) {
    if noise <= 0.0 {
        return (a, b);
    }
    let a = if rng.gen::<f64>() < noise { a.flip() } else { a };
    let b = if rng.gen::<f64>() < noise { b.flip() } else { b };
    (a, b)
}
