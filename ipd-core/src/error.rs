//! Error types for core game objects

/// Errors raised while building actions or strategies
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Unknown action character {0:?}: must be 'C' or 'D'")]
    UnknownAction(char),

    #[error("Team member {member} of {owner} is itself composite")]
    CyclicTeam { owner: String, member: String },

    #[error("Team of {0} cannot be empty")]
    EmptyTeam(String),

    #[error("Invalid probability {0}: must be within [0, 1]")]
    InvalidProbability(f64),
}

pub type Result<T> = std::result::Result<T, CoreError>;
