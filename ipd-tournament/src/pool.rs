//! Worker pool - bounded set of threads draining chunks
//!
//! Level 2 - Phase-level implementation (parallel path)
//!
//! Each worker owns exactly one chunk and exits once it is exhausted. The
//! only thing shared with sibling workers is the result channel. The pool
//! never blocks on a join: it polls [`JoinHandle::is_finished`] and only
//! joins handles that are already done.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::chunks::{chunk_matches, Chunk, PairWork};
use crate::error::{Result, TournamentError};
use crate::match_play::{Match, MatchResult};

/// Default pause between spawn-loop iterations
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of a pool run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolReport {
    /// Chunks handed to a worker
    pub chunks_dispatched: usize,
    /// Matches reported as played by workers that exited normally
    pub matches_played: usize,
    /// Chunks whose worker died before finishing; never re-dispatched
    pub lost_chunks: usize,
}

/// Bounded pool of chunk workers
#[derive(Clone, Debug)]
pub struct WorkerPool {
    max_workers: usize,
    poll_interval: Duration,
}

struct Worker {
    id: usize,
    matches: usize,
    handle: JoinHandle<usize>,
}

impl WorkerPool {
    /// Pool with at most `max_workers` live threads (0 is treated as 1)
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Dispatch every chunk, wait for all workers, then raise `shutdown`
    ///
    /// The pool's own sender is dropped before `shutdown` is set, so once the
    /// flag is visible no more results can be produced.
    pub fn run<I>(&self, chunks: I, sender: Sender<MatchResult>, shutdown: &AtomicBool) -> PoolReport
    where
        I: IntoIterator<Item = Chunk>,
    {
        let mut pending = chunks.into_iter();
        let mut remaining = true;
        let mut live: Vec<Worker> = Vec::with_capacity(self.max_workers);
        let mut report = PoolReport::default();

        while remaining || !live.is_empty() {
            reap_finished(&mut live, &mut report);

            while remaining && live.len() < self.max_workers {
                let Some(chunk) = pending.next() else {
                    remaining = false;
                    break;
                };
                let id = report.chunks_dispatched;
                report.chunks_dispatched += 1;
                match spawn_worker(id, chunk, sender.clone()) {
                    Ok(worker) => live.push(worker),
                    Err(e) => {
                        tracing::warn!(worker = id, error = %e, "Failed to spawn worker, chunk lost");
                        report.lost_chunks += 1;
                    }
                }
            }

            if remaining || !live.is_empty() {
                thread::sleep(self.poll_interval);
            }
        }

        drop(sender);
        shutdown.store(true, Ordering::Release);
        tracing::debug!(
            chunks = report.chunks_dispatched,
            lost = report.lost_chunks,
            "Worker pool finished"
        );
        report
    }
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

fn spawn_worker(id: usize, chunk: Chunk, sender: Sender<MatchResult>) -> std::io::Result<Worker> {
    let matches = chunk_matches(&chunk);
    tracing::debug!(worker = id, pairs = chunk.len(), matches, "Spawning worker");
    let handle = thread::Builder::new()
        .name(format!("ipd-worker-{}", id))
        .spawn(move || play_chunk(chunk, &sender))?;
    Ok(Worker { id, matches, handle })
}

/// Remove finished workers from the live set, joining only completed threads
fn reap_finished(live: &mut Vec<Worker>, report: &mut PoolReport) {
    let (done, running): (Vec<Worker>, Vec<Worker>) =
        live.drain(..).partition(|w| w.handle.is_finished());
    *live = running;

    for worker in done {
        match worker.handle.join() {
            Ok(played) => {
                tracing::debug!(worker = worker.id, played, "Worker finished");
                report.matches_played += played;
            }
            Err(_) => {
                tracing::warn!(
                    worker = worker.id,
                    matches = worker.matches,
                    "Worker died before finishing its chunk; results lost"
                );
                report.lost_chunks += 1;
            }
        }
    }
}

/// Play every pair of a chunk in order, returning the matches sent
pub fn play_chunk(chunk: Chunk, sender: &Sender<MatchResult>) -> usize {
    let mut played = 0;
    for work in chunk {
        let pair = work.pair;
        match play_pair(work, sender) {
            Ok(n) => played += n,
            Err(e) => {
                tracing::warn!(?pair, error = %e, "Abandoning chunk");
                break;
            }
        }
    }
    played
}

/// Build one match, then re-parameterise and replay it for each repetition
fn play_pair(work: PairWork, sender: &Sender<MatchResult>) -> Result<usize> {
    let PairWork {
        players,
        lengths,
        noise,
        game,
        seed,
        ..
    } = work;
    let Some((&first, rest)) = lengths.split_first() else {
        return Ok(0);
    };

    let mut m = Match::new(players, first, noise, game, seed)?;
    m.play();
    send(sender, m.to_result())?;

    for &turns in rest {
        m.set_turns(turns)?;
        m.set_noise(noise)?;
        m.set_game(game);
        m.play();
        send(sender, m.to_result())?;
    }
    Ok(lengths.len())
}

fn send(sender: &Sender<MatchResult>, result: MatchResult) -> Result<()> {
    sender.send(result).map_err(|_| TournamentError::ChannelClosed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::build_chunks;
    use crate::config::TournamentConfig;
    use ipd_core::{Action, Classifier, Cooperator, Defector, MemoryDepth, Player, Strategy, TitForTat};
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::sync::mpsc;

    #[derive(Clone, Debug)]
    struct Crasher;

    impl Strategy for Crasher {
        fn name(&self) -> &str {
            "Crasher"
        }

        fn classifier(&self) -> Classifier {
            Classifier::deterministic(MemoryDepth::Finite(0))
        }

        fn decide(&mut self, _own: &[Action], _opponent: &[Action], _rng: &mut dyn RngCore) -> Action {
            panic!("crasher always fails");
        }

        fn clone_box(&self) -> Box<dyn Strategy> {
            Box::new(self.clone())
        }
    }

    fn fast_pool(max_workers: usize) -> WorkerPool {
        WorkerPool::new(max_workers).with_poll_interval(Duration::from_millis(1))
    }

    fn players() -> Vec<Player> {
        Player::population(vec![
            Box::new(Cooperator),
            Box::new(Defector),
            Box::new(TitForTat),
        ])
    }

    #[test]
    fn test_zero_workers_treated_as_one() {
        assert_eq!(WorkerPool::new(0).max_workers(), 1);
        assert_eq!(WorkerPool::new(4).max_workers(), 4);
    }

    #[test]
    fn test_play_chunk_replays_each_repetition() {
        let config = TournamentConfig::fixed(4, 3);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let chunks = build_chunks(&players(), &config, &mut rng).unwrap();
        let (tx, rx) = mpsc::channel();

        let played: usize = chunks.into_iter().map(|c| play_chunk(c, &tx)).sum();
        drop(tx);
        let results: Vec<MatchResult> = rx.iter().collect();
        assert_eq!(played, 18);
        assert_eq!(results.len(), 18);
        assert!(results.iter().all(|r| r.turns() == 4));
        // Repetitions of a pair are contiguous
        assert_eq!(results[0].index_a, results[2].index_a);
        assert_eq!(results[0].index_b, results[2].index_b);
    }

    #[test]
    fn test_play_chunk_uses_each_length() {
        let config = TournamentConfig::prob_end(0.3, 5);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let chunks = build_chunks(&players()[..1], &config, &mut rng).unwrap();
        let lengths = chunks[0][0].lengths.clone();
        let (tx, rx) = mpsc::channel();

        play_chunk(chunks.into_iter().flatten().collect(), &tx);
        drop(tx);
        let turns: Vec<usize> = rx.iter().map(|r| r.turns()).collect();
        assert_eq!(turns, lengths);
    }

    #[test]
    fn test_run_sets_shutdown() {
        let config = TournamentConfig::fixed(5, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let chunks = build_chunks(&players(), &config, &mut rng).unwrap();
        let (tx, rx) = mpsc::channel();
        let shutdown = AtomicBool::new(false);

        let report = fast_pool(2).run(chunks, tx, &shutdown);
        assert!(shutdown.load(Ordering::Acquire));
        assert_eq!(report.matches_played, 12);
        assert_eq!(report.lost_chunks, 0);
        assert_eq!(rx.iter().count(), 12);
    }

    #[test]
    fn test_many_chunks_few_workers() {
        let config = TournamentConfig::fixed(2, 200);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let chunks = build_chunks(&players(), &config, &mut rng).unwrap();
        assert!(chunks.len() > 1);
        let dispatched = chunks.len();
        let (tx, rx) = mpsc::channel();
        let shutdown = AtomicBool::new(false);

        let report = fast_pool(1).run(chunks, tx, &shutdown);
        assert_eq!(report.chunks_dispatched, dispatched);
        assert_eq!(rx.iter().count(), 6 * 200);
    }

    #[test]
    fn test_crashed_worker_is_counted() {
        let config = TournamentConfig::fixed(3, 1);
        let crashing = Player::population(vec![Box::new(Crasher)]);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let chunks = build_chunks(&crashing, &config, &mut rng).unwrap();
        let (tx, rx) = mpsc::channel();
        let shutdown = AtomicBool::new(false);

        let report = fast_pool(2).run(chunks, tx, &shutdown);
        assert_eq!(report.lost_chunks, 1);
        assert_eq!(report.matches_played, 0);
        assert!(shutdown.load(Ordering::Acquire));
        assert_eq!(rx.iter().count(), 0);
    }

    #[test]
    fn test_empty_chunk_list() {
        let (tx, rx) = mpsc::channel();
        let shutdown = AtomicBool::new(false);
        let report = fast_pool(3).run(Vec::new(), tx, &shutdown);
        assert_eq!(report, PoolReport::default());
        assert!(shutdown.load(Ordering::Acquire));
        assert_eq!(rx.iter().count(), 0);
    }
}
