//! Search task queue and worker using the Actor pattern.
//!
//! Every connection handler holds a `TaskQueue` and `put`s a `SearchTask`
//! per valid request. One `SearchWorker` owns the receiving end and runs
//! tasks strictly in arrival order across all connections.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ConnectionHandler│──┐
//! └─────────────────┘  │   SearchTask          ┌─────────────────┐
//! ┌─────────────────┐  ├──(unbounded mpsc)───▶│  SearchWorker   │
//! │ConnectionHandler│──┘   global FIFO        │ (single, serial)│
//! └─────────────────┘                         └────────┬────────┘
//!                                                      │ match lines
//!                                                      ▼
//!                                             task.sink (origin client)
//! ```
//!
//! The channel is unbounded: `put` never waits, and a flood of requests
//! grows memory without limit. See DESIGN.md for the tradeoff.
//!
//! # Panic-Free Guarantees
//!
//! All operations in this module follow the panic-free policy:
//! - No `.unwrap()` or `.expect()` in production code
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use fsearch_core::SearchRoot;

mod handle;
mod task;
mod worker;

pub use handle::TaskQueue;
pub use task::{QueueError, SearchTask, TaskOutcome, WorkerStats};
pub use worker::SearchWorker;

/// Spawn the search worker and return the queue feeding it.
///
/// The worker runs until `cancel_token` is cancelled or every `TaskQueue`
/// clone has been dropped, then resolves to its final statistics.
///
/// # Example
///
/// ```no_run
/// use fsearch_core::SearchRoot;
/// use fsearchd::queue::spawn_worker;
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() {
///     let (queue, worker) = spawn_worker(SearchRoot::new("/srv"), CancellationToken::new());
///     drop(queue);
///     let stats = worker.await;
/// }
/// ```
pub fn spawn_worker(
    root: SearchRoot,
    cancel_token: CancellationToken,
) -> (TaskQueue, JoinHandle<WorkerStats>) {
    let (task_tx, task_rx) = mpsc::unbounded_channel();

    let worker = SearchWorker::new(task_rx, root, cancel_token);
    let handle = tokio::spawn(worker.run());

    (TaskQueue::new(task_tx), handle)
}
