//! Strategy names to populations
//!
//! Names are matched case-insensitively, ignoring spaces, `-` and `_`, so
//! "Tit For Tat", "tit-for-tat" and "titfortat" are the same strategy.
//! `Random` takes an optional cooperation probability: `Random: 0.3`.

use anyhow::{bail, Context, Result};
use ipd_core::{
    Alternator, Cooperator, Defector, Grudger, MetaMajority, Player, Random, Strategy, TitForTat,
};

/// Names accepted by [`parse_strategy`], for help output
pub const KNOWN_STRATEGIES: &[&str] = &[
    "Cooperator",
    "Defector",
    "Tit For Tat",
    "Alternator",
    "Grudger",
    "Random[: p]",
    "Meta Majority",
];

pub fn parse_strategy(name: &str) -> Result<Box<dyn Strategy>> {
    let (base, param) = match name.split_once(':') {
        Some((base, param)) => (base, Some(param.trim())),
        None => (name, None),
    };

    let key: String = base
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect();

    if param.is_some() && key != "random" {
        bail!("Strategy {:?} takes no parameter", base.trim());
    }

    let strategy: Box<dyn Strategy> = match key.as_str() {
        "cooperator" => Box::new(Cooperator),
        "defector" => Box::new(Defector),
        "titfortat" | "tft" => Box::new(TitForTat),
        "alternator" => Box::new(Alternator),
        "grudger" => Box::new(Grudger::default()),
        "random" => {
            let p = match param {
                Some(p) => p
                    .parse::<f64>()
                    .with_context(|| format!("Invalid probability for Random: {:?}", p))?,
                None => 0.5,
            };
            Box::new(Random::new(p)?)
        }
        "metamajority" => Box::new(MetaMajority::new(vec![
            Box::new(Cooperator),
            Box::new(Defector),
            Box::new(TitForTat),
            Box::new(Grudger::default()),
            Box::new(Alternator),
        ])?),
        _ => bail!(
            "Unknown strategy {:?}; known strategies: {}",
            name.trim(),
            KNOWN_STRATEGIES.join(", ")
        ),
    };
    Ok(strategy)
}

/// Parse a comma-separated list into an indexed population
pub fn parse_population(list: &str) -> Result<Vec<Player>> {
    let strategies = list
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(parse_strategy)
        .collect::<Result<Vec<_>>>()?;
    if strategies.is_empty() {
        bail!("No strategies given");
    }
    Ok(Player::population(strategies))
}
