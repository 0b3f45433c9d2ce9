//! Result consumer - drains the result channel into a sink
//!
//! Level 2 - Phase-level implementation (parallel path)
//!
//! The consumer never blocks on the channel. It drains whatever is available,
//! rests when nothing arrived, and stops once the pool's shutdown flag is set
//! and the channel is empty. A last exhaustive drain follows the loop.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use ipd_core::interactions::action_strings;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TournamentError};
use crate::match_play::MatchResult;

/// Default pause when the channel is empty
pub const REST_INTERVAL: Duration = Duration::from_millis(100);

/// One flat output row per match
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub index_a: usize,
    pub index_b: usize,
    pub name_a: String,
    pub name_b: String,
    /// Concatenated `C`/`D` history of player A
    pub actions_a: String,
    pub actions_b: String,
}

impl From<&MatchResult> for ResultRow {
    fn from(result: &MatchResult) -> Self {
        let (actions_a, actions_b) = action_strings(&result.interactions);
        Self {
            index_a: result.index_a,
            index_b: result.index_b,
            name_a: result.name_a.clone(),
            name_b: result.name_b.clone(),
            actions_a,
            actions_b,
        }
    }
}

/// Destination for result rows
pub trait ResultSink {
    fn write_row(&mut self, row: &ResultRow) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl ResultSink for Vec<ResultRow> {
    fn write_row(&mut self, row: &ResultRow) -> Result<()> {
        self.push(row.clone());
        Ok(())
    }
}

impl<S: ResultSink + ?Sized> ResultSink for &mut S {
    fn write_row(&mut self, row: &ResultRow) -> Result<()> {
        (**self).write_row(row)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl<S: ResultSink + ?Sized> ResultSink for Box<S> {
    fn write_row(&mut self, row: &ResultRow) -> Result<()> {
        (**self).write_row(row)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Headerless CSV stream of result rows
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(inner),
        }
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| TournamentError::Io(e.into_error()))
    }
}

impl CsvSink<File> {
    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> ResultSink for CsvSink<W> {
    fn write_row(&mut self, row: &ResultRow) -> Result<()> {
        self.writer.serialize(row)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Outcome of a consumer run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConsumerReport {
    pub rows_written: usize,
}

/// Single reader of the result channel
pub struct ResultConsumer<'a> {
    receiver: Receiver<MatchResult>,
    shutdown: &'a AtomicBool,
    rest_interval: Duration,
}

impl<'a> ResultConsumer<'a> {
    pub fn new(receiver: Receiver<MatchResult>, shutdown: &'a AtomicBool) -> Self {
        Self {
            receiver,
            shutdown,
            rest_interval: REST_INTERVAL,
        }
    }

    pub fn with_rest_interval(mut self, rest_interval: Duration) -> Self {
        self.rest_interval = rest_interval;
        self
    }

    /// Drain until shutdown, then drain once more and flush
    pub fn run<S: ResultSink + ?Sized>(self, sink: &mut S) -> Result<ConsumerReport> {
        let mut report = ConsumerReport::default();

        loop {
            match self.poll(&mut *sink)? {
                Poll::Drained(count) => report.rows_written += count,
                Poll::Idle => thread::sleep(self.rest_interval),
                Poll::Done => break,
            }
        }
        report.rows_written += self.finish(&mut *sink)?;

        tracing::debug!(rows = report.rows_written, "Result consumer finished");
        Ok(report)
    }

    /// One pass of the loop: drain, then decide whether to keep going
    fn poll<S: ResultSink + ?Sized>(&self, sink: &mut S) -> Result<Poll> {
        let (drained, disconnected) = self.drain(&mut *sink)?;
        if drained > 0 {
            sink.flush()?;
            return Ok(Poll::Drained(drained));
        }
        if self.shutdown.load(Ordering::Acquire) {
            return Ok(Poll::Done);
        }
        if disconnected {
            // The pool drops its sender just before raising the flag
            tracing::debug!("Result channel closed before shutdown flag was seen");
            return Ok(Poll::Done);
        }
        Ok(Poll::Idle)
    }

    /// Pick up anything sent between the last poll and shutdown
    fn finish<S: ResultSink + ?Sized>(&self, sink: &mut S) -> Result<usize> {
        let (drained, _) = self.drain(&mut *sink)?;
        sink.flush()?;
        Ok(drained)
    }

    /// Write everything currently queued; also reports whether all senders are gone
    fn drain<S: ResultSink + ?Sized>(&self, sink: &mut S) -> Result<(usize, bool)> {
        let mut count = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(result) => {
                    sink.write_row(&ResultRow::from(&result))?;
                    count += 1;
                }
                Err(TryRecvError::Empty) => return Ok((count, false)),
                Err(TryRecvError::Disconnected) => return Ok((count, true)),
            }
        }
    }
}

/// Outcome of one consumer poll
#[derive(Debug, PartialEq, Eq)]
enum Poll {
    Drained(usize),
    Idle,
    Done,
}
