//! Configuration types for tournament play
//!
//! Level 4 - Utilities and configuration

use ipd_core::Game;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{Result, TournamentError};

/// Default cap applied to matches whose sampled length is infinite
pub const DEFAULT_MAX_TURNS: usize = 10_000;

/// How match lengths are chosen
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TurnSpec {
    /// Every match lasts exactly this many turns
    Fixed(usize),
    /// Each turn ends the match with this probability
    ProbEnd(f64),
}

impl Default for TurnSpec {
    fn default() -> Self {
        TurnSpec::Fixed(200)
    }
}

impl TurnSpec {
    pub fn is_prob_end(&self) -> bool {
        matches!(self, TurnSpec::ProbEnd(_))
    }
}

/// Tournament configuration
#[derive(Clone, Debug)]
pub struct TournamentConfig {
    /// Fixed or sampled match length
    pub turns: TurnSpec,
    /// Number of times every pair is played
    pub repetitions: usize,
    /// Probability that an intended action is flipped
    pub noise: f64,
    /// Payoff table
    pub game: Game,
    /// Maximum concurrently live workers on the parallel path
    pub max_workers: usize,
    /// Cap for infinite sampled lengths (prob_end of 0)
    pub max_turns: usize,
    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,
    /// Explicit pairings; None means a full round robin
    pub edges: Option<Vec<(usize, usize)>>,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            turns: TurnSpec::default(),
            repetitions: 10,
            noise: 0.0,
            game: Game::default(),
            max_workers: default_workers(),
            max_turns: DEFAULT_MAX_TURNS,
            seed: None,
            edges: None,
        }
    }
}

impl TournamentConfig {
    /// Fixed-length round robin
    pub fn fixed(turns: usize, repetitions: usize) -> Self {
        Self {
            turns: TurnSpec::Fixed(turns),
            repetitions,
            ..Default::default()
        }
    }

    /// Round robin with probabilistic ending
    pub fn prob_end(prob_end: f64, repetitions: usize) -> Self {
        Self {
            turns: TurnSpec::ProbEnd(prob_end),
            repetitions,
            ..Default::default()
        }
    }

    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise;
        self
    }

    pub fn with_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_game(mut self, game: Game) -> Self {
        self.game = game;
        self
    }

    pub fn with_edges(mut self, edges: Vec<(usize, usize)>) -> Self {
        self.edges = Some(edges);
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Check every numeric parameter, failing on the first invalid one
    pub fn validate(&self) -> Result<()> {
        match self.turns {
            TurnSpec::Fixed(turns) => validate_turns(turns)?,
            TurnSpec::ProbEnd(p) => validate_prob_end(p)?,
        }
        validate_noise(self.noise)?;
        validate_turns(self.max_turns)?;
        if self.repetitions == 0 {
            return Err(TournamentError::InvalidRepetitions(self.repetitions));
        }
        Ok(())
    }

    /// RNG for this run: seeded when a seed is configured
    pub fn rng(&self) -> ChaCha8Rng {
        create_rng(self.seed)
    }
}

pub(crate) fn validate_turns(turns: usize) -> Result<()> {
    if turns == 0 {
        return Err(TournamentError::InvalidTurns(turns));
    }
    Ok(())
}

pub(crate) fn validate_noise(noise: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&noise) {
        return Err(TournamentError::InvalidNoise(noise));
    }
    Ok(())
}

pub(crate) fn validate_prob_end(prob_end: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&prob_end) {
        return Err(TournamentError::InvalidProbEnd(prob_end));
    }
    Ok(())
}

/// Create RNG from seed or random
pub fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = TournamentConfig::default();
        assert_eq!(config.turns, TurnSpec::Fixed(200));
        assert_eq!(config.repetitions, 10);
        assert_eq!(config.noise, 0.0);
        assert!(config.max_workers >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builders() {
        let config = TournamentConfig::prob_end(0.1, 3)
            .with_noise(0.05)
            .with_workers(2)
            .with_seed(7)
            .with_max_turns(50);
        assert!(config.turns.is_prob_end());
        assert_eq!(config.repetitions, 3);
        assert_eq!(config.max_workers, 2);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.max_turns, 50);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(matches!(
            TournamentConfig::fixed(0, 1).validate(),
            Err(TournamentError::InvalidTurns(0))
        ));
        assert!(matches!(
            TournamentConfig::fixed(5, 1).with_noise(1.5).validate(),
            Err(TournamentError::InvalidNoise(_))
        ));
        assert!(matches!(
            TournamentConfig::fixed(5, 1).with_noise(f64::NAN).validate(),
            Err(TournamentError::InvalidNoise(_))
        ));
        assert!(matches!(
            TournamentConfig::prob_end(-0.2, 1).validate(),
            Err(TournamentError::InvalidProbEnd(_))
        ));
        assert!(matches!(
            TournamentConfig::fixed(5, 0).validate(),
            Err(TournamentError::InvalidRepetitions(0))
        ));
    }

    #[test]
    fn test_prob_end_edges_are_valid_config() {
        assert!(TournamentConfig::prob_end(0.0, 1).validate().is_ok());
        assert!(TournamentConfig::prob_end(1.0, 1).validate().is_ok());
    }

    #[test]
    fn test_seeded_rng_deterministic() {
        use rand::Rng;
        let mut a = create_rng(Some(42));
        let mut b = create_rng(Some(42));
        assert_eq!(a.gen::<u64>(), b.gen::<u64>());
    }
}
