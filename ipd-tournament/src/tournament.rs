//! Tournament execution - serial and parallel round robins
//!
//! Level 1 - Orchestration and Level 2 - Phases

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use ipd_core::Player;
use serde::Serialize;

use crate::cache::{CacheStats, DeterministicCache};
use crate::chunks::build_chunks;
use crate::config::TournamentConfig;
use crate::consumer::{CsvSink, ResultConsumer, ResultRow, ResultSink, REST_INTERVAL};
use crate::error::{Result, TournamentError};
use crate::generator::MatchGenerator;
use crate::pool::{WorkerPool, POLL_INTERVAL};
use crate::result_set::ResultSet;

/// What a tournament run did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TournamentSummary {
    /// Rows written to the sink
    pub matches_played: usize,
    /// Cache lookups made by this run (always zero on the parallel path)
    pub cache_stats: CacheStats,
    /// Chunks lost to worker crashes
    pub lost_chunks: usize,
}

/// A population and the configuration it is played under
#[derive(Debug)]
pub struct Tournament {
    players: Vec<Player>,
    config: TournamentConfig,
    poll_interval: Duration,
    rest_interval: Duration,
}

impl Tournament {
    /// Validate the configuration against the population
    pub fn new(players: Vec<Player>, config: TournamentConfig) -> Result<Self> {
        MatchGenerator::new(&players, &config)?;
        Ok(Self {
            players,
            config,
            poll_interval: POLL_INTERVAL,
            rest_interval: REST_INTERVAL,
        })
    }

    /// Pool poll and consumer rest intervals for the parallel path
    pub fn with_intervals(mut self, poll_interval: Duration, rest_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.rest_interval = rest_interval;
        self
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn config(&self) -> &TournamentConfig {
        &self.config
    }

    /// Matches the run will produce: pairs times repetitions
    pub fn total_matches(&self) -> Result<usize> {
        let generator = MatchGenerator::new(&self.players, &self.config)?;
        Ok(generator.len() * self.config.repetitions)
    }

    // ========================================================================
    // Level 1 - Orchestration
    // ========================================================================

    /// Play every repetition in this thread, serving deterministic pairs from `cache`
    pub fn play_serial<S: ResultSink + ?Sized>(
        &self,
        cache: &mut DeterministicCache,
        sink: &mut S,
    ) -> Result<TournamentSummary> {
        let generator = MatchGenerator::new(&self.players, &self.config)?;
        let mut rng = self.config.rng();
        let before = cache.stats();

        tracing::info!(
            players = self.players.len(),
            pairs = generator.len(),
            repetitions = self.config.repetitions,
            "Starting serial tournament"
        );

        let mut matches_played = 0;
        for repetition in 0..self.config.repetitions {
            for result in generator.play_round(cache, &mut rng) {
                sink.write_row(&ResultRow::from(&result?))?;
                matches_played += 1;
            }
            sink.flush()?;
            tracing::debug!(repetition, matches_played, "Repetition complete");
        }

        let after = cache.stats();
        let summary = TournamentSummary {
            matches_played,
            cache_stats: CacheStats {
                hits: after.hits - before.hits,
                misses: after.misses - before.misses,
            },
            lost_chunks: 0,
        };
        tracing::info!(
            matches = summary.matches_played,
            cache_hits = summary.cache_stats.hits,
            "Serial tournament complete"
        );
        Ok(summary)
    }

    /// Play on a bounded worker pool, streaming rows through a consumer thread
    ///
    /// No cache is consulted: every match is simulated.
    pub fn play_parallel<S: ResultSink + Send + ?Sized>(&self, sink: &mut S) -> Result<TournamentSummary> {
        let mut rng = self.config.rng();
        let chunks = build_chunks(&self.players, &self.config, &mut rng)?;

        tracing::info!(
            players = self.players.len(),
            chunks = chunks.len(),
            workers = self.config.max_workers,
            "Starting parallel tournament"
        );

        let (sender, receiver) = mpsc::channel();
        let shutdown = AtomicBool::new(false);
        let pool = WorkerPool::new(self.config.max_workers).with_poll_interval(self.poll_interval);
        let consumer = ResultConsumer::new(receiver, &shutdown).with_rest_interval(self.rest_interval);

        let (pool_report, consumed) = thread::scope(|scope| {
            let handle = scope.spawn(move || consumer.run(sink));
            let pool_report = pool.run(chunks, sender, &shutdown);
            (pool_report, handle.join())
        });
        let consumer_report = consumed.map_err(|_| TournamentError::ConsumerPanicked)??;

        let summary = TournamentSummary {
            matches_played: consumer_report.rows_written,
            cache_stats: CacheStats::default(),
            lost_chunks: pool_report.lost_chunks,
        };
        if summary.lost_chunks > 0 {
            tracing::warn!(lost = summary.lost_chunks, "Some chunks were lost to worker crashes");
        }
        tracing::info!(matches = summary.matches_played, "Parallel tournament complete");
        Ok(summary)
    }

    /// Play in parallel into a CSV file, then read it back as a result set
    pub fn play_to_file(&self, path: &Path) -> Result<(TournamentSummary, ResultSet)> {
        let mut sink = CsvSink::from_path(path)?;
        let summary = self.play_parallel(&mut sink)?;
        drop(sink);
        let results = ResultSet::from_csv(path, &self.config.game, self.players.len())?;
        Ok((summary, results))
    }
}
