//! Match command - play one match between two strategies
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_match(), report_results()
//! - Level 4: formatting utilities

use anyhow::{Context, Result};
use clap::Args;
use rand::Rng;
use serde::Serialize;

use ipd_core::{Game, Player};
use ipd_tournament::{create_rng, Match};

use crate::players::parse_strategy;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct MatchArgs {
    /// First strategy
    #[arg(long)]
    pub a: String,

    /// Second strategy
    #[arg(long)]
    pub b: String,

    /// Turns to play
    #[arg(long, default_value = "200")]
    pub turns: usize,

    /// Probability that an intended action is flipped
    #[arg(long, default_value = "0.0")]
    pub noise: f64,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run match command
pub fn run(args: MatchArgs, seed: Option<u64>) -> Result<()> {
    let mut m = build_match(&args, seed)?;

    tracing::info!(
        "Starting match: {} vs {} ({} turns, noise={})",
        args.a,
        args.b,
        args.turns,
        args.noise
    );
    m.play();

    report_results(&m, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn build_match(args: &MatchArgs, seed: Option<u64>) -> Result<Match> {
    let a = parse_strategy(&args.a)?;
    let b = parse_strategy(&args.b)?;
    let players = (Player::new(0, a), Player::new(1, b));
    let match_seed = create_rng(seed).gen::<u64>();
    Match::new(players, args.turns, args.noise, Game::default(), match_seed)
        .context("Invalid match parameters")
}

fn report_results(m: &Match, json: bool) -> Result<()> {
    if json {
        print_json_results(m)
    } else {
        print_text_results(m);
        Ok(())
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn winner_name(m: &Match) -> Option<String> {
    let (a, b) = m.players();
    let winner = m.winner()?;
    let name = if winner == a.index { a.name() } else { b.name() };
    Some(name.to_string())
}

/// Print results as JSON
fn print_json_results(m: &Match) -> Result<()> {
    #[derive(Serialize)]
    struct JsonOutput {
        player_a: String,
        player_b: String,
        turns: usize,
        noise: f64,
        scores: (i32, i32),
        scores_per_turn: Option<(f64, f64)>,
        cooperations: (usize, usize),
        winner: Option<String>,
        actions: (String, String),
    }

    let (a, b) = m.players();
    let output = JsonOutput {
        player_a: a.name().to_string(),
        player_b: b.name().to_string(),
        turns: m.turns(),
        noise: m.noise(),
        scores: m.final_score(),
        scores_per_turn: m.final_score_per_turn(),
        cooperations: m.cooperation(),
        winner: winner_name(m),
        actions: ipd_core::interactions::action_strings(m.result()),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Print results as text
fn print_text_results(m: &Match) {
    let (a, b) = m.players();
    let (score_a, score_b) = m.final_score();
    let (coop_a, coop_b) = m.cooperation();

    println!("\n=== Match Results ===");
    println!("{} vs {} ({} turns)", a.name(), b.name(), m.turns());
    println!("Scores:       {} - {}", score_a, score_b);
    if let Some((per_a, per_b)) = m.final_score_per_turn() {
        println!("Per turn:     {:.3} - {:.3}", per_a, per_b);
    }
    println!("Cooperations: {} - {}", coop_a, coop_b);
    match winner_name(m) {
        Some(name) => println!("Winner:       {}", name),
        None => println!("Winner:       tie"),
    }
    println!();
    println!("{}", m.sparklines('█', ' '));
}
