//! Actions of the two-player game

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A single move in one turn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    Cooperate,
    Defect,
}

pub use Action::{Cooperate as C, Defect as D};

impl Action {
    /// The opposite action
    pub fn flip(self) -> Self {
        match self {
            Action::Cooperate => Action::Defect,
            Action::Defect => Action::Cooperate,
        }
    }

    /// Single character form used in result rows ('C' or 'D')
    pub fn as_char(self) -> char {
        match self {
            Action::Cooperate => 'C',
            Action::Defect => 'D',
        }
    }

    /// Parse a single 'C' / 'D' character
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            'C' => Ok(Action::Cooperate),
            'D' => Ok(Action::Defect),
            other => Err(CoreError::UnknownAction(other)),
        }
    }

    pub fn is_cooperate(self) -> bool {
        self == Action::Cooperate
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Concatenate actions into a "CDDC..." string
pub fn actions_to_string(actions: &[Action]) -> String {
    actions.iter().map(|a| a.as_char()).collect()
}

/// Parse a "CDDC..." string back into actions
pub fn string_to_actions(s: &str) -> Result<Vec<Action>> {
    s.chars().map(Action::from_char).collect()
}
