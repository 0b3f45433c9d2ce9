//! Reference strategies
//!
//! A small set of classic decision rules used as fixtures and as the default
//! population of the command-line tool. The engine does not depend on any of
//! them.

use rand::{Rng, RngCore};

use crate::action::Action;
use crate::error::{CoreError, Result};
use crate::strategy::{Classifier, MemoryDepth, Strategy};

/// Always cooperates
#[derive(Clone, Copy, Debug, Default)]
pub struct Cooperator;

impl Strategy for Cooperator {
    fn name(&self) -> &str {
        "Cooperator"
    }

    fn classifier(&self) -> Classifier {
        Classifier::deterministic(MemoryDepth::Finite(0))
    }

    fn decide(&mut self, _own: &[Action], _opponent: &[Action], _rng: &mut dyn RngCore) -> Action {
        Action::Cooperate
    }

    fn clone_box(&self) -> Box<dyn Strategy> {
        Box::new(*self)
    }
}

/// Always defects
#[derive(Clone, Copy, Debug, Default)]
pub struct Defector;

impl Strategy for Defector {
    fn name(&self) -> &str {
        "Defector"
    }

    fn classifier(&self) -> Classifier {
        Classifier::deterministic(MemoryDepth::Finite(0))
    }

    fn decide(&mut self, _own: &[Action], _opponent: &[Action], _rng: &mut dyn RngCore) -> Action {
        Action::Defect
    }

    fn clone_box(&self) -> Box<dyn Strategy> {
        Box::new(*self)
    }
}

/// Cooperates first, then copies the opponent's last action
#[derive(Clone, Copy, Debug, Default)]
pub struct TitForTat;

impl Strategy for TitForTat {
    fn name(&self) -> &str {
        "Tit For Tat"
    }

    fn classifier(&self) -> Classifier {
        Classifier::deterministic(MemoryDepth::Finite(1))
    }

    fn decide(&mut self, _own: &[Action], opponent: &[Action], _rng: &mut dyn RngCore) -> Action {
        opponent.last().copied().unwrap_or(Action::Cooperate)
    }

    fn clone_box(&self) -> Box<dyn Strategy> {
        Box::new(*self)
    }
}

/// Alternates C, D, C, D, ...
#[derive(Clone, Copy, Debug, Default)]
pub struct Alternator;

impl Strategy for Alternator {
    fn name(&self) -> &str {
        "Alternator"
    }

    fn classifier(&self) -> Classifier {
        Classifier::deterministic(MemoryDepth::Finite(1))
    }

    fn decide(&mut self, own: &[Action], _opponent: &[Action], _rng: &mut dyn RngCore) -> Action {
        match own.last() {
            Some(last) => last.flip(),
            None => Action::Cooperate,
        }
    }

    fn clone_box(&self) -> Box<dyn Strategy> {
        Box::new(*self)
    }
}

/// Cooperates until the opponent defects once, then defects forever
#[derive(Clone, Copy, Debug, Default)]
pub struct Grudger {
    grudged: bool,
}

impl Strategy for Grudger {
    fn name(&self) -> &str {
        "Grudger"
    }

    fn classifier(&self) -> Classifier {
        Classifier::deterministic(MemoryDepth::Infinite)
    }

    fn decide(&mut self, _own: &[Action], opponent: &[Action], _rng: &mut dyn RngCore) -> Action {
        if opponent.last() == Some(&Action::Defect) {
            self.grudged = true;
        }
        if self.grudged {
            Action::Defect
        } else {
            Action::Cooperate
        }
    }

    fn reset(&mut self) {
        self.grudged = false;
    }

    fn clone_box(&self) -> Box<dyn Strategy> {
        Box::new(Grudger::default())
    }
}

/// Cooperates with probability `p`
#[derive(Clone, Debug)]
pub struct Random {
    p: f64,
    name: String,
}

impl Random {
    pub fn new(p: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&p) {
            return Err(CoreError::InvalidProbability(p));
        }
        Ok(Self {
            p,
            name: format!("Random: {}", p),
        })
    }

    pub fn p(&self) -> f64 {
        self.p
    }
}

impl Strategy for Random {
    fn name(&self) -> &str {
        &self.name
    }

    fn classifier(&self) -> Classifier {
        // p of exactly 0 or 1 never draws a different action
        let stochastic = self.p > 0.0 && self.p < 1.0;
        Classifier {
            stochastic,
            memory_depth: MemoryDepth::Finite(0),
            ..Default::default()
        }
    }

    fn decide(&mut self, _own: &[Action], _opponent: &[Action], rng: &mut dyn RngCore) -> Action {
        if self.p >= 1.0 {
            return Action::Cooperate;
        }
        if self.p <= 0.0 {
            return Action::Defect;
        }
        if rng.gen::<f64>() < self.p {
            Action::Cooperate
        } else {
            Action::Defect
        }
    }

    fn clone_box(&self) -> Box<dyn Strategy> {
        Box::new(self.clone())
    }
}

/// Plays whatever the majority of its team would play (ties cooperate)
///
/// Team members may not themselves own teams, so composition stays acyclic.
/// The name lists the team, so two different teams never share a cache key.
#[derive(Debug)]
pub struct MetaMajority {
    name: String,
    team: Vec<Box<dyn Strategy>>,
}

impl MetaMajority {
    pub const NAME: &'static str = "Meta Majority";

    pub fn new(team: Vec<Box<dyn Strategy>>) -> Result<Self> {
        if team.is_empty() {
            return Err(CoreError::EmptyTeam(Self::NAME.to_string()));
        }
        if let Some(member) = team.iter().find(|m| m.classifier().composite) {
            return Err(CoreError::CyclicTeam {
                owner: Self::NAME.to_string(),
                member: member.name().to_string(),
            });
        }
        let members: Vec<&str> = team.iter().map(|m| m.name()).collect();
        let name = format!("{} [{}]", Self::NAME, members.join(", "));
        Ok(Self { name, team })
    }

    pub fn team_size(&self) -> usize {
        self.team.len()
    }
}

impl Strategy for MetaMajority {
    fn name(&self) -> &str {
        &self.name
    }

    fn classifier(&self) -> Classifier {
        Classifier {
            stochastic: self.team.iter().any(|m| m.classifier().stochastic),
            memory_depth: MemoryDepth::Infinite,
            long_run_time: true,
            composite: true,
        }
    }

    fn decide(&mut self, own: &[Action], opponent: &[Action], rng: &mut dyn RngCore) -> Action {
        let mut defections = 0;
        for member in &mut self.team {
            if member.decide(own, opponent, rng) == Action::Defect {
                defections += 1;
            }
        }
        if defections * 2 > self.team.len() {
            Action::Defect
        } else {
            Action::Cooperate
        }
    }

    fn reset(&mut self) {
        for member in &mut self.team {
            member.reset();
        }
    }

    fn clone_box(&self) -> Box<dyn Strategy> {
        Box::new(Self {
            name: self.name.clone(),
            team: self.team.iter().map(|m| m.clone_box()).collect(),
        })
    }
}
