//! Deterministic cache - memoized interactions of deterministic matches
//!
//! For a fixed-length, noise-free match between two deterministic strategies
//! the interaction sequence is always the same, so it only needs to be played
//! once. The cache maps `(strategy A, strategy B, turns)` to that sequence.
//!
//! Two rules go beyond plain memoization:
//! - a frozen cache (`mutable == false`) rejects every write with
//!   [`CacheError::Immutable`];
//! - an entry must be exactly `turns` long, otherwise the write is rejected
//!   with [`CacheError::LengthMismatch`].
//!
//! The cache lives in one thread and is only consulted by the serial
//! round-robin path.

use std::path::Path;

use ipd_core::{actions_to_string, string_to_actions, Action, Interactions, Player};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Cached interaction sequence, one action pair per turn
pub type CacheEntry = Interactions;

/// Errors raised by cache writes and persistence
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cannot update cache unless mutable is true")]
    Immutable,

    #[error("Key must be a pair of deterministic strategies, got {0} vs {1}")]
    StochasticKey(String, String),

    #[error("Entry length {actual} does not match key turns {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Cache file is not in the expected format: {0}")]
    Corrupt(String),

    #[error("Cache I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Cache key: strategy names in slot order plus the match length
///
/// Outside this crate a key can only come from [`CacheKey::for_players`], so
/// every key in a cache names two deterministic strategies.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    player_a: String,
    player_b: String,
    turns: usize,
}

impl CacheKey {
    pub(crate) fn new(
        player_a: impl Into<String>,
        player_b: impl Into<String>,
        turns: usize,
    ) -> Self {
        Self {
            player_a: player_a.into(),
            player_b: player_b.into(),
            turns,
        }
    }

    /// Key for a pair of players; fails when either is stochastic
    pub fn for_players(a: &Player, b: &Player, turns: usize) -> Result<Self, CacheError> {
        if a.is_stochastic() || b.is_stochastic() {
            return Err(CacheError::StochasticKey(
                a.name().to_string(),
                b.name().to_string(),
            ));
        }
        Ok(Self::new(a.name(), b.name(), turns))
    }

    pub fn player_a(&self) -> &str {
        &self.player_a
    }

    pub fn player_b(&self) -> &str {
        &self.player_b
    }

    pub fn turns(&self) -> usize {
        self.turns
    }
}

/// Hit / miss counters for lookups
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// On-disk form of one entry
#[derive(Serialize, Deserialize)]
struct CacheRecord {
    player_a: String,
    player_b: String,
    turns: usize,
    actions_a: String,
    actions_b: String,
}

/// Memoized interactions of deterministic matches
#[derive(Clone, Debug)]
pub struct DeterministicCache {
    data: FxHashMap<CacheKey, CacheEntry>,
    mutable: bool,
    stats: CacheStats,
}

impl Default for DeterministicCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DeterministicCache {
    pub fn new() -> Self {
        Self {
            data: FxHashMap::default(),
            mutable: true,
            stats: CacheStats::default(),
        }
    }

    /// Create a cache from a previously saved file
    pub fn from_file(path: &Path) -> Result<Self, CacheError> {
        let mut cache = Self::new();
        cache.load(path)?;
        Ok(cache)
    }

    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Forbid all further writes
    pub fn freeze(&mut self) {
        self.mutable = false;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.data.contains_key(key)
    }

    pub fn get(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.data.get(key)
    }

    /// Look up a key, counting the hit or miss
    pub fn lookup(&mut self, key: &CacheKey) -> Option<&CacheEntry> {
        match self.data.get(key) {
            Some(entry) => {
                self.stats.hits += 1;
                Some(entry)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Store an entry after validating mutability and length
    ///
    /// Stochastic pairs are rejected earlier, by [`CacheKey::for_players`].
    pub fn insert(&mut self, key: CacheKey, entry: CacheEntry) -> Result<(), CacheError> {
        if !self.mutable {
            return Err(CacheError::Immutable);
        }
        if entry.len() != key.turns {
            return Err(CacheError::LengthMismatch {
                expected: key.turns,
                actual: entry.len(),
            });
        }
        self.data.insert(key, entry);
        Ok(())
    }

    /// Serialize every entry to `path`
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        let mut records: Vec<CacheRecord> = self
            .data
            .iter()
            .map(|(key, entry)| {
                let (a, b): (Vec<Action>, Vec<Action>) = entry.iter().copied().unzip();
                CacheRecord {
                    player_a: key.player_a.clone(),
                    player_b: key.player_b.clone(),
                    turns: key.turns,
                    actions_a: actions_to_string(&a),
                    actions_b: actions_to_string(&b),
                }
            })
            .collect();
        // Stable order so the same cache always produces the same bytes
        records.sort_by(|x, y| {
            (&x.player_a, &x.player_b, x.turns).cmp(&(&y.player_a, &y.player_b, y.turns))
        });

        let content =
            serde_json::to_string(&records).map_err(|e| CacheError::Corrupt(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Replace the contents with a previously saved file
    pub fn load(&mut self, path: &Path) -> Result<(), CacheError> {
        if !self.mutable {
            return Err(CacheError::Immutable);
        }
        let content = std::fs::read_to_string(path)?;
        let records: Vec<CacheRecord> = serde_json::from_str(&content).map_err(|e| {
            CacheError::Corrupt(format!(
                "{}. Try deleting and re-building the cache file",
                e
            ))
        })?;

        let mut data = FxHashMap::default();
        for record in records {
            let entry = decode_entry(&record)?;
            if entry.len() != record.turns {
                return Err(CacheError::LengthMismatch {
                    expected: record.turns,
                    actual: entry.len(),
                });
            }
            data.insert(
                CacheKey::new(record.player_a, record.player_b, record.turns),
                entry,
            );
        }
        self.data = data;
        Ok(())
    }
}

fn decode_entry(record: &CacheRecord) -> Result<CacheEntry, CacheError> {
    let a = string_to_actions(&record.actions_a).map_err(|e| CacheError::Corrupt(e.to_string()))?;
    let b = string_to_actions(&record.actions_b).map_err(|e| CacheError::Corrupt(e.to_string()))?;
    if a.len() != b.len() {
        return Err(CacheError::Corrupt(format!(
            "histories of {} vs {} differ in length",
            record.player_a, record.player_b
        )));
    }
    Ok(a.into_iter().zip(b).collect())
}
