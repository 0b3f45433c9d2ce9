//! Error types for tournament execution

use crate::cache::CacheError;

/// Configuration and I/O errors raised by the engine
#[derive(Debug, thiserror::Error)]
pub enum TournamentError {
    #[error("Invalid turn count {0}: matches must last at least one turn")]
    InvalidTurns(usize),

    #[error("Invalid noise {0}: must be within [0, 1]")]
    InvalidNoise(f64),

    #[error("Invalid probability of ending {0}: must be within [0, 1]")]
    InvalidProbEnd(f64),

    #[error("Invalid repetitions {0}: must be at least 1")]
    InvalidRepetitions(usize),

    #[error("Population is empty")]
    EmptyPopulation,

    #[error("Edge refers to unknown player index {0}")]
    UnknownPlayer(usize),

    #[error("The graph edges do not include all players")]
    DisconnectedEdges,

    #[error("Result channel closed before the worker finished its chunk")]
    ChannelClosed,

    #[error("Result consumer thread panicked")]
    ConsumerPanicked,

    #[error("Malformed result row: {0}")]
    MalformedRow(String),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, TournamentError>;
