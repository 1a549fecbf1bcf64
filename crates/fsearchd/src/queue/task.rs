//! Queue message types, errors and worker bookkeeping.

use fsearch_core::{SearchError, SearchRequest};
use thiserror::Error;

use crate::sink::{OutputSink, SinkError};

/// One search to run, bound to the connection that asked for it.
///
/// Created by a connection handler, consumed exactly once by the worker.
#[derive(Debug)]
pub struct SearchTask {
    pub request: SearchRequest,
    pub sink: OutputSink,
}

impl SearchTask {
    pub fn new(request: SearchRequest, sink: OutputSink) -> Self {
        Self { request, sink }
    }

    /// Connection number of the requesting client.
    pub fn connection(&self) -> u64 {
        self.sink.connection()
    }
}

/// Errors submitting to the queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("Search worker has stopped")]
    Closed,
}

/// How a single task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Walk finished; `matches` lines were written.
    Completed { matches: u64 },

    /// Walk failed; one error line was written to the client.
    Failed(SearchError),

    /// The client could not be written to; the rest of the task was dropped.
    Abandoned(SinkError),

    /// Shutdown was requested while the task was running.
    Interrupted,
}

/// Counters kept by the worker over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub completed: u64,
    pub failed: u64,
    pub abandoned: u64,
    pub matches: u64,
}

impl WorkerStats {
    pub fn record(&mut self, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Completed { matches } => {
                self.completed += 1;
                self.matches += matches;
            }
            TaskOutcome::Failed(_) => self.failed += 1,
            TaskOutcome::Abandoned(_) => self.abandoned += 1,
            TaskOutcome::Interrupted => {}
        }
    }

    /// Total tasks taken off the queue and finished in any way but shutdown.
    pub fn total(&self) -> u64 {
        self.completed + self.failed + self.abandoned
    }
}
