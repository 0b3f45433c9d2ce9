//! Payoff table for the 2x2 game

use serde::{Deserialize, Serialize};

use crate::action::Action;

/// Score type produced by the payoff table
pub type Score = i32;

/// Payoff table. Defaults to the standard Prisoner's Dilemma values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    /// Reward for mutual cooperation
    pub r: Score,
    /// Sucker's payoff (cooperate against defect)
    pub s: Score,
    /// Temptation (defect against cooperate)
    pub t: Score,
    /// Punishment for mutual defection
    pub p: Score,
}

impl Default for Game {
    fn default() -> Self {
        Self { r: 3, s: 0, t: 5, p: 1 }
    }
}

impl Game {
    pub fn new(r: Score, s: Score, t: Score, p: Score) -> Self {
        Self { r, s, t, p }
    }

    /// Score one turn, returns (score_a, score_b)
    pub fn score(&self, pair: (Action, Action)) -> (Score, Score) {
        match pair {
            (Action::Cooperate, Action::Cooperate) => (self.r, self.r),
            (Action::Cooperate, Action::Defect) => (self.s, self.t),
            (Action::Defect, Action::Cooperate) => (self.t, self.s),
            (Action::Defect, Action::Defect) => (self.p, self.p),
        }
    }

    /// Values in Press and Dyson order (R, P, S, T)
    pub fn rpst(&self) -> (Score, Score, Score, Score) {
        (self.r, self.p, self.s, self.t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{C, D};

    #[test]
    fn test_default_payoffs() {
        let game = Game::default();
        assert_eq!(game.score((C, C)), (3, 3));
        assert_eq!(game.score((C, D)), (0, 5));
        assert_eq!(game.score((D, C)), (5, 0));
        assert_eq!(game.score((D, D)), (1, 1));
    }

    #[test]
    fn test_rpst() {
        let game = Game::new(2, 0, 4, 1);
        assert_eq!(game.rpst(), (2, 1, 0, 4));
    }
}
