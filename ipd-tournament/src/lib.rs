//! IPD Tournament - Match execution engine
//!
//! This crate turns a population of strategies into played matches:
//! - A single contest with noise and sampled lengths
//! - A memoization cache for deterministic contests
//! - A serial, cache-aware round robin
//! - A parallel path: chunk scheduler, worker pool and result consumer
//! - Order-independent aggregation of the streamed rows
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: Tournament::play_serial / play_parallel (orchestration)
//! - Level 2: MatchGenerator, build_chunks, WorkerPool, ResultConsumer (phases)
//! - Level 3: Match::play, play_chunk, drain (steps)
//! - Level 4: configuration, length sampling, errors

pub mod cache;
pub mod chunks;
pub mod config;
pub mod consumer;
pub mod error;
pub mod generator;
pub mod length;
pub mod match_play;
pub mod pool;
pub mod result_set;
pub mod tournament;

pub use cache::{CacheEntry, CacheError, CacheKey, CacheStats, DeterministicCache};
pub use chunks::{build_chunks, Chunk, PairWork, CHUNK_THRESHOLD};
pub use config::{create_rng, TournamentConfig, TurnSpec, DEFAULT_MAX_TURNS};
pub use consumer::{ConsumerReport, CsvSink, ResultConsumer, ResultRow, ResultSink};
pub use error::{Result, TournamentError};
pub use generator::{complete_graph, graph_is_connected, MatchGenerator, Pair};
pub use length::{generate_lengths, sample_length, MatchLength};
pub use match_play::{Match, MatchResult};
pub use pool::{PoolReport, WorkerPool};
pub use result_set::{PlayerSummary, ResultSet};
pub use tournament::{Tournament, TournamentSummary};
