//! Tournament command - round robin over a population
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_config(), play(), report_results()
//! - Level 3: load_cache(), save_cache()
//! - Level 4: progress sink, formatting utilities

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use ipd_tournament::{
    CsvSink, DeterministicCache, PlayerSummary, ResultRow, ResultSet, ResultSink, Tournament,
    TournamentConfig, TournamentSummary, TurnSpec,
};

use crate::players::parse_population;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct TournamentArgs {
    /// Comma-separated strategy names
    #[arg(long, default_value = "Cooperator,Defector,Tit For Tat,Grudger,Random")]
    pub players: String,

    /// Turns per match
    #[arg(long, default_value = "200", conflicts_with = "prob_end")]
    pub turns: usize,

    /// Probability of the match ending after each turn (replaces --turns)
    #[arg(long)]
    pub prob_end: Option<f64>,

    /// Probability that an intended action is flipped
    #[arg(long, default_value = "0.0")]
    pub noise: f64,

    /// Times every pair is played
    #[arg(long, default_value = "10")]
    pub repetitions: usize,

    /// Maximum concurrent workers (default: available cores)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Play in this thread, using the deterministic cache
    #[arg(long)]
    pub serial: bool,

    /// Cache file to load before a serial run
    #[arg(long, value_name = "FILE")]
    pub cache: Option<PathBuf>,

    /// Write the cache back to --cache after the run
    #[arg(long, requires = "cache")]
    pub save_cache: bool,

    /// Stream match rows to this CSV file
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run tournament command
///
/// 1. Build the population and configuration
/// 2. Play every match into a sink
/// 3. Aggregate and report
pub fn run(args: TournamentArgs, seed: Option<u64>) -> Result<()> {
    let players = parse_population(&args.players)?;
    let num_players = players.len();
    let config = build_config(&args, seed);
    let game = config.game;
    let tournament = Tournament::new(players, config).context("Invalid tournament configuration")?;

    tracing::info!(
        "Starting tournament: {} players, {}, {} repetitions ({})",
        num_players,
        turn_label(tournament.config()),
        args.repetitions,
        if args.serial { "serial" } else { "parallel" }
    );

    let bar = progress_bar(tournament.total_matches()? as u64, args.json)?;
    let (summary, results) = match &args.output {
        Some(path) => {
            let csv = CsvSink::from_path(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut sink = ProgressSink::new(csv, bar.clone());
            let summary = play(&tournament, &args, &mut sink)?;
            sink.into_inner().into_inner()?;
            let results = ResultSet::from_csv(path, &game, num_players)
                .with_context(|| format!("Failed to read back {}", path.display()))?;
            (summary, results)
        }
        None => {
            let mut sink = ProgressSink::new(Vec::<ResultRow>::new(), bar.clone());
            let summary = play(&tournament, &args, &mut sink)?;
            let results = ResultSet::from_rows(&sink.into_inner(), &game)?;
            (summary, results)
        }
    };
    bar.finish_and_clear();

    report_results(&summary, &results, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn build_config(args: &TournamentArgs, seed: Option<u64>) -> TournamentConfig {
    let mut config = match args.prob_end {
        Some(p) => TournamentConfig::prob_end(p, args.repetitions),
        None => TournamentConfig::fixed(args.turns, args.repetitions),
    }
    .with_noise(args.noise);
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    config
}

fn play<S: ResultSink + Send>(
    tournament: &Tournament,
    args: &TournamentArgs,
    sink: &mut S,
) -> Result<TournamentSummary> {
    if !args.serial {
        if args.cache.is_some() {
            tracing::warn!("--cache is only used with --serial; ignoring it");
        }
        return Ok(tournament.play_parallel(sink)?);
    }

    let mut cache = load_cache(args)?;
    let summary = tournament.play_serial(&mut cache, sink)?;
    if args.save_cache {
        save_cache(&cache, args)?;
    }
    Ok(summary)
}

fn report_results(summary: &TournamentSummary, results: &ResultSet, json: bool) -> Result<()> {
    if json {
        print_json_results(summary, results)
    } else {
        print_text_results(summary, results);
        Ok(())
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn load_cache(args: &TournamentArgs) -> Result<DeterministicCache> {
    match &args.cache {
        Some(path) if path.exists() => {
            let cache = DeterministicCache::from_file(path)
                .with_context(|| format!("Failed to load cache: {}", path.display()))?;
            tracing::info!("Loaded {} cache entries from {}", cache.len(), path.display());
            Ok(cache)
        }
        Some(path) if !args.save_cache => {
            bail!("Cache file {} does not exist", path.display())
        }
        _ => Ok(DeterministicCache::new()),
    }
}

fn save_cache(cache: &DeterministicCache, args: &TournamentArgs) -> Result<()> {
    if let Some(path) = &args.cache {
        cache
            .save(path)
            .with_context(|| format!("Failed to save cache: {}", path.display()))?;
        tracing::info!("Saved {} cache entries to {}", cache.len(), path.display());
    }
    Ok(())
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Sink wrapper that advances a progress bar per row
struct ProgressSink<S> {
    inner: S,
    bar: ProgressBar,
}

impl<S: ResultSink> ProgressSink<S> {
    fn new(inner: S, bar: ProgressBar) -> Self {
        Self { inner, bar }
    }

    fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: ResultSink> ResultSink for ProgressSink<S> {
    fn write_row(&mut self, row: &ResultRow) -> ipd_tournament::Result<()> {
        self.inner.write_row(row)?;
        self.bar.inc(1);
        Ok(())
    }

    fn flush(&mut self) -> ipd_tournament::Result<()> {
        self.inner.flush()
    }
}

fn progress_bar(total: u64, hidden: bool) -> Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40}] {pos}/{len} matches ({eta})")?
            .progress_chars("=> "),
    );
    Ok(bar)
}

fn turn_label(config: &TournamentConfig) -> String {
    match config.turns {
        TurnSpec::Fixed(turns) => format!("{} turns", turns),
        TurnSpec::ProbEnd(p) => format!("prob_end {}", p),
    }
}

/// Print results as JSON
fn print_json_results(summary: &TournamentSummary, results: &ResultSet) -> Result<()> {
    #[derive(Serialize)]
    struct JsonStanding<'a> {
        rank: usize,
        #[serde(flatten)]
        player: &'a PlayerSummary,
        score_per_turn: f64,
        cooperation_rate: f64,
    }

    #[derive(Serialize)]
    struct JsonOutput<'a> {
        summary: &'a TournamentSummary,
        match_count: usize,
        standings: Vec<JsonStanding<'a>>,
    }

    let output = JsonOutput {
        summary,
        match_count: results.match_count(),
        standings: results
            .standings()
            .into_iter()
            .enumerate()
            .map(|(i, player)| JsonStanding {
                rank: i + 1,
                player,
                score_per_turn: player.score_per_turn(),
                cooperation_rate: player.cooperation_rate(),
            })
            .collect(),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Print results as text
fn print_text_results(summary: &TournamentSummary, results: &ResultSet) {
    println!("\n=== Tournament Results ===");
    println!("Matches played: {}", summary.matches_played);
    if summary.cache_stats.hits + summary.cache_stats.misses > 0 {
        println!(
            "Cache: {} hits, {} misses",
            summary.cache_stats.hits, summary.cache_stats.misses
        );
    }
    if summary.lost_chunks > 0 {
        println!("Lost chunks: {}", summary.lost_chunks);
    }

    println!();
    println!(
        "{:>4}  {:<20} {:>8} {:>10} {:>6} {:>8}",
        "Rank", "Player", "Score", "Per turn", "Wins", "Coop %"
    );
    for (i, player) in results.standings().into_iter().enumerate() {
        println!(
            "{:>4}  {:<20} {:>8} {:>10.3} {:>6} {:>7.1}%",
            i + 1,
            player.name,
            player.score,
            player.score_per_turn(),
            player.wins,
            player.cooperation_rate() * 100.0
        );
    }
}
