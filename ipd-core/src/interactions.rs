//! Helpers over interaction sequences
//!
//! An interaction sequence is the ordered list of action pairs of one match,
//! one entry per turn. Scores and winners are always derived from it.

use crate::action::{actions_to_string, Action};
use crate::game::{Game, Score};

/// One entry per turn: (action of player A, action of player B)
pub type Interactions = Vec<(Action, Action)>;

/// Summed scores over all turns
pub fn final_score(interactions: &[(Action, Action)], game: &Game) -> (Score, Score) {
    interactions.iter().fold((0, 0), |(a, b), &pair| {
        let (sa, sb) = game.score(pair);
        (a + sa, b + sb)
    })
}

/// Mean score per turn, `None` for an empty sequence
pub fn final_score_per_turn(interactions: &[(Action, Action)], game: &Game) -> Option<(f64, f64)> {
    if interactions.is_empty() {
        return None;
    }
    let (a, b) = final_score(interactions, game);
    let turns = interactions.len() as f64;
    Some((a as f64 / turns, b as f64 / turns))
}

/// Winner slot (0 or 1) on strictly higher total score, `None` on a tie
pub fn winner_index(interactions: &[(Action, Action)], game: &Game) -> Option<usize> {
    let (a, b) = final_score(interactions, game);
    match a.cmp(&b) {
        std::cmp::Ordering::Greater => Some(0),
        std::cmp::Ordering::Less => Some(1),
        std::cmp::Ordering::Equal => None,
    }
}

/// Number of cooperations by each player
pub fn cooperations(interactions: &[(Action, Action)]) -> (usize, usize) {
    interactions.iter().fold((0, 0), |(a, b), &(x, y)| {
        (a + x.is_cooperate() as usize, b + y.is_cooperate() as usize)
    })
}

/// Split a sequence into the two concatenated action strings
pub fn action_strings(interactions: &[(Action, Action)]) -> (String, String) {
    let (a, b): (Vec<Action>, Vec<Action>) = interactions.iter().copied().unzip();
    (actions_to_string(&a), actions_to_string(&b))
}

/// Render one history as a sparkline
pub fn sparkline(actions: &[Action], c_symbol: char, d_symbol: char) -> String {
    actions
        .iter()
        .map(|a| if a.is_cooperate() { c_symbol } else { d_symbol })
        .collect()
}

/// Both histories as sparklines, one per line
pub fn sparklines(interactions: &[(Action, Action)], c_symbol: char, d_symbol: char) -> String {
    let (a, b): (Vec<Action>, Vec<Action>) = interactions.iter().copied().unzip();
    format!(
        "{}\n{}",
        sparkline(&a, c_symbol, d_symbol),
        sparkline(&b, c_symbol, d_symbol)
    )
}
