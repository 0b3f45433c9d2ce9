//! Strategy capability and player handles
//!
//! The engine only ever talks to a strategy through [`Strategy`]: it asks for
//! the next action and reads the classifier flags to decide cache eligibility
//! and chunk isolation. Everything else about a strategy is opaque.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::action::Action;

/// How many past turns a strategy looks at
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryDepth {
    Finite(usize),
    Infinite,
}

/// Classifier flags consulted by the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classifier {
    /// Uses randomness when deciding
    pub stochastic: bool,
    /// Turns of history the strategy depends on
    pub memory_depth: MemoryDepth,
    /// Expensive to play; isolated to its own chunk on the parallel path
    pub long_run_time: bool,
    /// Owns a team of other strategies
    pub composite: bool,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            stochastic: false,
            memory_depth: MemoryDepth::Infinite,
            long_run_time: false,
            composite: false,
        }
    }
}

impl Classifier {
    /// Deterministic classifier with the given memory depth
    pub fn deterministic(memory_depth: MemoryDepth) -> Self {
        Self {
            memory_depth,
            ..Default::default()
        }
    }

    /// Stochastic classifier with the given memory depth
    pub fn stochastic(memory_depth: MemoryDepth) -> Self {
        Self {
            stochastic: true,
            memory_depth,
            ..Default::default()
        }
    }
}

/// A per-turn decision rule
pub trait Strategy: Send + std::fmt::Debug {
    /// Display name, also used as the cache key for this strategy
    ///
    /// Instances that can play differently must not share a name.
    fn name(&self) -> &str;

    fn classifier(&self) -> Classifier;

    /// Choose the next action given both histories so far
    fn decide(&mut self, own: &[Action], opponent: &[Action], rng: &mut dyn RngCore) -> Action;

    /// Clear any per-match state
    fn reset(&mut self) {}

    /// Clone into a new boxed instance with no per-match state
    fn clone_box(&self) -> Box<dyn Strategy>;
}

/// A population member: identity, strategy and the history of the current match
#[derive(Debug)]
pub struct Player {
    /// Index in the population
    pub index: usize,
    strategy: Box<dyn Strategy>,
    history: Vec<Action>,
}

impl Player {
    pub fn new(index: usize, strategy: Box<dyn Strategy>) -> Self {
        Self {
            index,
            strategy,
            history: Vec::new(),
        }
    }

    /// Build a population from strategies, indexed in order
    pub fn population(strategies: Vec<Box<dyn Strategy>>) -> Vec<Player> {
        strategies
            .into_iter()
            .enumerate()
            .map(|(index, strategy)| Player::new(index, strategy))
            .collect()
    }

    /// Clone with fresh strategy state and an empty history
    pub fn fresh(&self) -> Self {
        Self::new(self.index, self.strategy.clone_box())
    }

    pub fn name(&self) -> &str {
        self.strategy.name()
    }

    pub fn classifier(&self) -> Classifier {
        self.strategy.classifier()
    }

    pub fn is_stochastic(&self) -> bool {
        self.classifier().stochastic
    }

    pub fn history(&self) -> &[Action] {
        &self.history
    }

    /// Intended action for the next turn
    pub fn decide(&mut self, opponent: &[Action], rng: &mut dyn RngCore) -> Action {
        self.strategy.decide(&self.history, opponent, rng)
    }

    /// Record the action actually played this turn
    pub fn record(&mut self, action: Action) {
        self.history.push(action);
    }

    /// Clear history and strategy state before a new match
    pub fn reset(&mut self) {
        self.history.clear();
        self.strategy.reset();
    }
}

impl Clone for Player {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            strategy: self.strategy.clone_box(),
            history: self.history.clone(),
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
