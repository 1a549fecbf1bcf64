//! The search worker actor.
//!
//! Takes one task at a time off the queue and runs it to completion before
//! taking the next, which is what gives clients global FIFO ordering. The
//! filesystem walk is blocking, so it runs on tokio's blocking pool and
//! hands matches back over a small bounded channel; each match is written
//! to the client as soon as it arrives.
//!
//! A failed walk or a vanished client only ends the current task. Either
//! way the walk is stopped and joined before the next task is taken.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use fsearch_core::{search, SearchError, SearchRoot};
use fsearch_protocol::ServerMessage;

use super::task::{SearchTask, TaskOutcome, WorkerStats};
use crate::sink::SinkError;

/// Matches buffered between the blocking walk and the writer
const MATCH_BUFFER: usize = 64;

type WalkItem = Result<std::path::PathBuf, SearchError>;

/// The single consumer of the task queue.
pub struct SearchWorker {
    receiver: mpsc::UnboundedReceiver<SearchTask>,
    root: SearchRoot,
    cancel_token: CancellationToken,
    stats: WorkerStats,
}

impl SearchWorker {
    pub fn new(
        receiver: mpsc::UnboundedReceiver<SearchTask>,
        root: SearchRoot,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            receiver,
            root,
            cancel_token,
            stats: WorkerStats::default(),
        }
    }

    /// Run the worker loop until shutdown or until every producer is gone.
    pub async fn run(mut self) -> WorkerStats {
        info!(root = %self.root, "Search worker starting");

        while let Some(task) = self.take().await {
            let connection = task.connection();
            let outcome = self.execute(task).await;

            match &outcome {
                TaskOutcome::Completed { matches } => {
                    debug!(connection, matches, "Search completed");
                }
                TaskOutcome::Failed(e) => {
                    warn!(connection, error = %e, "Search failed");
                }
                TaskOutcome::Abandoned(e) => {
                    debug!(connection, error = %e, "Client gone, search abandoned");
                }
                TaskOutcome::Interrupted => {
                    debug!(connection, "Search interrupted by shutdown");
                }
            }

            self.stats.record(&outcome);
        }

        info!(
            completed = self.stats.completed,
            failed = self.stats.failed,
            abandoned = self.stats.abandoned,
            "Search worker stopped"
        );
        self.stats
    }

    /// Waits for the oldest queued task. `None` means stop.
    async fn take(&mut self) -> Option<SearchTask> {
        tokio::select! {
            biased;

            _ = self.cancel_token.cancelled() => {
                debug!("Search worker shutdown requested");
                None
            }

            task = self.receiver.recv() => task,
        }
    }

    /// Runs one task, streaming matches to its sink.
    pub async fn execute(&self, task: SearchTask) -> TaskOutcome {
        debug!(
            connection = task.connection(),
            request = %task.request,
            "Executing search"
        );

        if task.sink.is_closed() {
            return TaskOutcome::Abandoned(SinkError::Closed);
        }

        let (match_tx, mut match_rx) = mpsc::channel::<WalkItem>(MATCH_BUFFER);
        let matches = search(&self.root, &task.request);
        let stop = matches.stop_handle();

        let walk = tokio::task::spawn_blocking(move || {
            for item in matches {
                if match_tx.blocking_send(item).is_err() {
                    break;
                }
            }
        });

        let outcome = self.stream_matches(&task, &mut match_rx).await;

        // The walk must be over before the next task starts its own.
        stop.stop();
        drop(match_rx);
        if let Err(e) = walk.await {
            error!(error = %e, "Search walk task failed");
        }

        outcome
    }

    async fn stream_matches(
        &self,
        task: &SearchTask,
        match_rx: &mut mpsc::Receiver<WalkItem>,
    ) -> TaskOutcome {
        let mut matches = 0u64;

        loop {
            let item = tokio::select! {
                biased;

                _ = self.cancel_token.cancelled() => return TaskOutcome::Interrupted,

                item = match_rx.recv() => item,
            };

            match item {
                None => return TaskOutcome::Completed { matches },
                Some(Ok(path)) => {
                    if let Err(e) = task.sink.send(&ServerMessage::found(path)).await {
                        return TaskOutcome::Abandoned(e);
                    }
                    matches += 1;
                }
                Some(Err(search_error)) => {
                    let reply = ServerMessage::search_failed(&search_error);
                    if let Err(e) = task.sink.send(&reply).await {
                        return TaskOutcome::Abandoned(e);
                    }
                    return TaskOutcome::Failed(search_error);
                }
            }
        }
    }
}
