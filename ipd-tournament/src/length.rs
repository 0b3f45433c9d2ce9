//! Match length sampling
//!
//! Prob-end matches draw their length by inverse-transform sampling of a
//! geometric distribution: each turn independently ends the match with
//! probability `prob_end`.

use rand::Rng;

use crate::config::{validate_prob_end, TurnSpec};
use crate::error::Result;

/// A sampled match length
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchLength {
    Finite(usize),
    /// Produced by a prob_end of 0; the caller must cap it
    Infinite,
}

impl MatchLength {
    /// Concrete turn count, replacing the infinite sentinel with `max_turns`
    pub fn capped(self, max_turns: usize) -> usize {
        match self {
            MatchLength::Finite(n) => n,
            MatchLength::Infinite => max_turns,
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, MatchLength::Infinite)
    }
}

/// Draw one match length for the given probability of ending
///
/// `n = ceil(ln(1 - x) / ln(1 - prob_end))` with `x ~ U[0, 1)`.
/// Both logarithms go through `ln_1p` so a tiny `prob_end` still yields a
/// long match. A `prob_end` of 0, or one so small that the quotient
/// overflows, yields [`MatchLength::Infinite`]. A result below one turn
/// (e.g. `prob_end == 1`) yields 1.
pub fn sample_length<R: Rng + ?Sized>(prob_end: f64, rng: &mut R) -> Result<MatchLength> {
    validate_prob_end(prob_end)?;
    let denominator = (-prob_end).ln_1p();
    if denominator == 0.0 {
        return Ok(MatchLength::Infinite);
    }
    let x: f64 = rng.gen();
    let n = ((-x).ln_1p() / denominator).ceil();
    if n.is_infinite() {
        return Ok(MatchLength::Infinite);
    }
    if n.is_nan() || n < 1.0 {
        return Ok(MatchLength::Finite(1));
    }
    Ok(MatchLength::Finite(n as usize))
}

/// Lengths for every repetition of one pair
///
/// Fixed specs repeat the same value; prob-end specs sample each repetition
/// independently, so two repetitions of a pair may differ.
pub fn generate_lengths<R: Rng + ?Sized>(
    spec: TurnSpec,
    repetitions: usize,
    max_turns: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    match spec {
        TurnSpec::Fixed(turns) => Ok(vec![turns; repetitions]),
        TurnSpec::ProbEnd(p) => (0..repetitions)
            .map(|_| sample_length(p, rng).map(|len| len.capped(max_turns)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TournamentError;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_sample_mean_half() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let samples = 10_000;
        let total: usize = (0..samples)
            .map(|_| sample_length(0.5, &mut rng).unwrap().capped(usize::MAX))
            .sum();
        let mean = total as f64 / samples as f64;
        assert!((mean - 2.0).abs() < 0.1, "mean {} not ~2", mean);
    }

    #[test]
    fn test_sample_mean_tenth() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let samples = 10_000;
        let total: usize = (0..samples)
            .map(|_| sample_length(0.1, &mut rng).unwrap().capped(usize::MAX))
            .sum();
        let mean = total as f64 / samples as f64;
        assert!((mean - 10.0).abs() < 0.5, "mean {} not ~10", mean);
    }

    #[test]
    fn test_prob_end_zero_is_infinite() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let length = sample_length(0.0, &mut rng).unwrap();
        assert_eq!(length, MatchLength::Infinite);
        assert!(length.is_infinite());
        assert_eq!(length.capped(25), 25);
    }

    #[test]
    fn test_tiny_prob_end_is_effectively_infinite() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for prob_end in [1e-17, f64::MIN_POSITIVE, 5e-324] {
            for _ in 0..5 {
                let length = sample_length(prob_end, &mut rng).unwrap();
                assert_eq!(length.capped(1000), 1000, "prob_end {}", prob_end);
            }
        }

        let total: usize = (0..100)
            .map(|_| sample_length(1e-12, &mut rng).unwrap().capped(usize::MAX))
            .sum();
        assert!(total > 100, "1e-12 should not collapse to single turns");
    }

    #[test]
    fn test_prob_end_one_is_single_turn() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..100 {
            assert_eq!(sample_length(1.0, &mut rng).unwrap(), MatchLength::Finite(1));
        }
    }

    #[test]
    fn test_samples_are_positive() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..1000 {
            let n = sample_length(0.9, &mut rng).unwrap().capped(usize::MAX);
            assert!(n >= 1);
        }
    }

    #[test]
    fn test_invalid_prob_end() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        assert!(matches!(
            sample_length(1.5, &mut rng),
            Err(TournamentError::InvalidProbEnd(_))
        ));
    }

    #[test]
    fn test_generate_lengths() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let fixed = generate_lengths(TurnSpec::Fixed(5), 3, 100, &mut rng).unwrap();
        assert_eq!(fixed, vec![5, 5, 5]);

        let capped = generate_lengths(TurnSpec::ProbEnd(0.0), 2, 40, &mut rng).unwrap();
        assert_eq!(capped, vec![40, 40]);

        let sampled = generate_lengths(TurnSpec::ProbEnd(0.2), 50, 1000, &mut rng).unwrap();
        assert_eq!(sampled.len(), 50);
        assert!(sampled.iter().all(|&n| n >= 1));
    }
}
