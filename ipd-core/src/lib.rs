//! IPD Core - Actions, payoffs and the strategy capability
//!
//! This crate provides the leaf types of the tournament engine:
//! - Actions (cooperate / defect) and their string forms
//! - The 2x2 payoff table
//! - The `Strategy` capability and `Player` handles with classifier flags
//! - Interaction helpers (scores, winners, sparklines)
//! - A handful of reference strategies

pub mod action;
pub mod error;
pub mod game;
pub mod interactions;
pub mod strategies;
pub mod strategy;

// Re-exports for convenient access
pub use action::{actions_to_string, string_to_actions, Action};
pub use error::{CoreError, Result};
pub use game::{Game, Score};
pub use interactions::Interactions;
pub use strategies::{Alternator, Cooperator, Defector, Grudger, MetaMajority, Random, TitForTat};
pub use strategy::{Classifier, MemoryDepth, Player, Strategy};
