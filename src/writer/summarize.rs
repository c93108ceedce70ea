//! [`Writer`]-wrapper for collecting a summary of execution.

use async_trait::async_trait;
use derive_more::with_trait::{Deref, DerefMut};

use crate::{event::Event, result::Code, writer::Writer};

/// Execution statistics, counted per testcase.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Stats {
    /// Number of testcases that finished `PASS`.
    pub passed: usize,

    /// Number of testcases that finished `SKIPPED`.
    pub skipped: usize,

    /// Number of testcases that finished with any failing code.
    pub failed: usize,
}

impl Stats {
    /// Total number of counted testcases.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.passed + self.skipped + self.failed
    }
}

/// Wrapper for a [`Writer`] that counts every finished testcase's outcome
/// before forwarding the event.
#[derive(Clone, Copy, Debug, Deref, DerefMut)]
pub struct Summarize<Wr> {
    /// Original [`Writer`] the events are forwarded to.
    #[deref]
    #[deref_mut]
    writer: Wr,

    stats: Stats,
}

impl<Wr> Summarize<Wr> {
    /// Wraps the given [`Writer`].
    #[must_use]
    pub const fn new(writer: Wr) -> Self {
        Self {
            writer,
            stats: Stats {
                passed: 0,
                skipped: 0,
                failed: 0,
            },
        }
    }

    /// Collected statistics.
    #[must_use]
    pub const fn stats(&self) -> &Stats {
        &self.stats
    }
}

#[async_trait(?Send)]
impl<Wr: Writer> Writer for Summarize<Wr> {
    async fn handle_event(&mut self, ev: Event<'_>) {
        if let Event::CaseFinished { result } = ev {
            match result.code {
                Code::Pass => self.stats.passed += 1,
                Code::Skipped => self.stats.skipped += 1,
                _ => self.stats.failed += 1,
            }
        }
        self.writer.handle_event(ev).await;
    }
}
