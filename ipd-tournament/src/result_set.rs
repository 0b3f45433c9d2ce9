//! Result set - order-independent aggregation of streamed rows
//!
//! Level 2 - Phase-level implementation
//!
//! Rows may arrive in any order; everything here is keyed by player index
//! pairs. Self-interactions (a player against its own index) are kept in the
//! per-pair table but excluded from player totals, wins and cooperation.

use std::path::Path;

use ipd_core::interactions::{cooperations, final_score, winner_index};
use ipd_core::{string_to_actions, Game, Interactions, Score};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::consumer::ResultRow;
use crate::error::{Result, TournamentError};
use crate::generator::Pair;

/// Aggregated standing of one player
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub index: usize,
    pub name: String,
    /// Total score against other players
    pub score: Score,
    pub wins: usize,
    /// Turns played against other players
    pub turns: usize,
    pub cooperations: usize,
}

impl PlayerSummary {
    pub fn score_per_turn(&self) -> f64 {
        if self.turns == 0 {
            0.0
        } else {
            self.score as f64 / self.turns as f64
        }
    }

    pub fn cooperation_rate(&self) -> f64 {
        if self.turns == 0 {
            0.0
        } else {
            self.cooperations as f64 / self.turns as f64
        }
    }
}

/// One row parsed and scored
struct ScoredRow {
    pair: Pair,
    interactions: Interactions,
    scores: (Score, Score),
    winner: Option<usize>,
    cooperations: (usize, usize),
}

/// Everything learned from one tournament's rows
#[derive(Clone, Debug, Default)]
pub struct ResultSet {
    players: Vec<PlayerSummary>,
    interactions: FxHashMap<Pair, Vec<Interactions>>,
    match_count: usize,
}

impl ResultSet {
    /// Aggregate rows; the population size is the largest index seen plus one
    pub fn from_rows(rows: &[ResultRow], game: &Game) -> Result<Self> {
        let num_players = rows
            .iter()
            .map(|r| r.index_a.max(r.index_b) + 1)
            .max()
            .unwrap_or(0);
        Self::aggregate(rows, game, num_players)
    }

    /// Read a headerless CSV written by [`crate::consumer::CsvSink`]
    pub fn from_csv(path: &Path, game: &Game, num_players: usize) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        let rows = reader
            .deserialize()
            .collect::<std::result::Result<Vec<ResultRow>, csv::Error>>()?;
        Self::aggregate(&rows, game, num_players)
    }

    fn aggregate(rows: &[ResultRow], game: &Game, num_players: usize) -> Result<Self> {
        let scored = rows
            .par_iter()
            .map(|row| score_row(row, game))
            .collect::<Result<Vec<ScoredRow>>>()?;

        let mut players: Vec<PlayerSummary> = (0..num_players)
            .map(|index| PlayerSummary {
                index,
                ..Default::default()
            })
            .collect();
        for row in rows {
            for (index, name) in [(row.index_a, &row.name_a), (row.index_b, &row.name_b)] {
                let player = players
                    .get_mut(index)
                    .ok_or(TournamentError::UnknownPlayer(index))?;
                if player.name.is_empty() {
                    player.name = name.clone();
                }
            }
        }

        let mut interactions: FxHashMap<Pair, Vec<Interactions>> = FxHashMap::default();
        let match_count = scored.len();
        for row in scored {
            let (a, b) = row.pair;
            if a != b {
                let turns = row.interactions.len();
                let pa = &mut players[a];
                pa.score += row.scores.0;
                pa.turns += turns;
                pa.cooperations += row.cooperations.0;
                let pb = &mut players[b];
                pb.score += row.scores.1;
                pb.turns += turns;
                pb.cooperations += row.cooperations.1;
                match row.winner {
                    Some(0) => players[a].wins += 1,
                    Some(_) => players[b].wins += 1,
                    None => {}
                }
            }
            interactions.entry(row.pair).or_default().push(row.interactions);
        }

        Ok(Self {
            players,
            interactions,
            match_count,
        })
    }

    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    pub fn match_count(&self) -> usize {
        self.match_count
    }

    pub fn players(&self) -> &[PlayerSummary] {
        &self.players
    }

    pub fn player(&self, index: usize) -> Option<&PlayerSummary> {
        self.players.get(index)
    }

    /// Total scores against other players, by index
    pub fn scores(&self) -> Vec<Score> {
        self.players.iter().map(|p| p.score).collect()
    }

    pub fn wins(&self) -> Vec<usize> {
        self.players.iter().map(|p| p.wins).collect()
    }

    /// Every interaction sequence recorded for a pair, in arrival order
    pub fn interactions(&self, pair: Pair) -> &[Interactions] {
        self.interactions.get(&pair).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Player indices ordered by score per turn, best first
    pub fn ranking(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.players.len()).collect();
        order.sort_by(|&a, &b| {
            self.players[b]
                .score_per_turn()
                .partial_cmp(&self.players[a].score_per_turn())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });
        order
    }

    /// Player summaries in ranking order
    pub fn standings(&self) -> Vec<&PlayerSummary> {
        self.ranking().into_iter().map(|i| &self.players[i]).collect()
    }
}

fn score_row(row: &ResultRow, game: &Game) -> Result<ScoredRow> {
    let a = string_to_actions(&row.actions_a)
        .map_err(|e| TournamentError::MalformedRow(e.to_string()))?;
    let b = string_to_actions(&row.actions_b)
        .map_err(|e| TournamentError::MalformedRow(e.to_string()))?;
    if a.len() != b.len() {
        return Err(TournamentError::MalformedRow(format!(
            "{} vs {}: histories of length {} and {}",
            row.name_a,
            row.name_b,
            a.len(),
            b.len()
        )));
    }
    let interactions: Interactions = a.into_iter().zip(b).collect();
    Ok(ScoredRow {
        pair: (row.index_a, row.index_b),
        scores: final_score(&interactions, game),
        winner: winner_index(&interactions, game),
        cooperations: cooperations(&interactions),
        interactions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipd_core::action::{C, D};

    fn row(a: usize, b: usize, actions_a: &str, actions_b: &str) -> ResultRow {
        let name = |i: usize| ["Cooperator", "Defector", "Tit For Tat"][i].to_string();
        ResultRow {
            index_a: a,
            index_b: b,
            name_a: name(a),
            name_b: name(b),
            actions_a: actions_a.to_string(),
            actions_b: actions_b.to_string(),
        }
    }

    fn rows() -> Vec<ResultRow> {
        vec![
            row(0, 0, "CCC", "CCC"),
            row(0, 1, "CCC", "DDD"),
            row(0, 2, "CCC", "CCC"),
            row(1, 1, "DDD", "DDD"),
            row(1, 2, "DDD", "CDD"),
            row(2, 2, "CCC", "CCC"),
        ]
    }

    #[test]
    fn test_totals_exclude_self_play() {
        let results = ResultSet::from_rows(&rows(), &Game::default()).unwrap();
        assert_eq!(results.num_players(), 3);
        assert_eq!(results.match_count(), 6);
        // Cooperator: 0 vs Defector + 9 vs TFT
        // Defector: 15 vs Cooperator + (5 + 1 + 1) vs TFT
        // TFT: 9 vs Cooperator + (0 + 1 + 1) vs Defector
        assert_eq!(results.scores(), vec![9, 22, 11]);
        assert_eq!(results.wins(), vec![0, 2, 0]);
        assert_eq!(results.player(1).unwrap().name, "Defector");
        assert_eq!(results.player(0).unwrap().turns, 6);
    }

    #[test]
    fn test_order_independent() {
        let mut reversed = rows();
        reversed.reverse();
        let forward = ResultSet::from_rows(&rows(), &Game::default()).unwrap();
        let backward = ResultSet::from_rows(&reversed, &Game::default()).unwrap();
        assert_eq!(forward.players(), backward.players());
        assert_eq!(forward.ranking(), backward.ranking());
    }

    #[test]
    fn test_interactions_by_pair() {
        let mut all = rows();
        all.push(row(0, 1, "CC", "DD"));
        let results = ResultSet::from_rows(&all, &Game::default()).unwrap();
        let pair = results.interactions((0, 1));
        assert_eq!(pair.len(), 2);
        assert_eq!(pair[1], vec![(C, D), (C, D)]);
        assert!(results.interactions((2, 0)).is_empty());
    }

    #[test]
    fn test_ranking() {
        let results = ResultSet::from_rows(&rows(), &Game::default()).unwrap();
        assert_eq!(results.ranking(), vec![1, 2, 0]);
        let names: Vec<&str> = results.standings().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Defector", "Tit For Tat", "Cooperator"]);
    }

    #[test]
    fn test_malformed_rows() {
        let bad = vec![row(0, 1, "CX", "DD")];
        assert!(matches!(
            ResultSet::from_rows(&bad, &Game::default()),
            Err(TournamentError::MalformedRow(_))
        ));

        let uneven = vec![row(0, 1, "CCC", "DD")];
        assert!(matches!(
            ResultSet::from_rows(&uneven, &Game::default()),
            Err(TournamentError::MalformedRow(_))
        ));
    }

    #[test]
    fn test_from_csv() {
        use crate::consumer::{CsvSink, ResultSink};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let mut sink = CsvSink::from_path(&path).unwrap();
        for r in rows() {
            sink.write_row(&r).unwrap();
        }
        sink.flush().unwrap();

        let results = ResultSet::from_csv(&path, &Game::default(), 4).unwrap();
        assert_eq!(results.num_players(), 4);
        assert_eq!(results.match_count(), 6);
        assert_eq!(results.scores(), vec![9, 22, 11, 0]);

        assert!(matches!(
            ResultSet::from_csv(&path, &Game::default(), 2),
            Err(TournamentError::UnknownPlayer(2))
        ));
    }

    #[test]
    fn test_empty() {
        let results = ResultSet::from_rows(&[], &Game::default()).unwrap();
        assert_eq!(results.num_players(), 0);
        assert!(results.ranking().is_empty());
    }
}
