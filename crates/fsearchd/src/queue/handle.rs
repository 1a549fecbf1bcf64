//! Producer side of the task queue.

use tokio::sync::mpsc;

use super::task::{QueueError, SearchTask};

/// Handle for submitting tasks to the search worker.
///
/// Cheap to clone; every connection handler keeps its own copy.
#[derive(Clone, Debug)]
pub struct TaskQueue {
    sender: mpsc::UnboundedSender<SearchTask>,
}

impl TaskQueue {
    pub fn new(sender: mpsc::UnboundedSender<SearchTask>) -> Self {
        Self { sender }
    }

    /// Appends a task behind everything already queued.
    ///
    /// Never waits.
    ///
    /// # Errors
    ///
    /// - `QueueError::Closed` if the worker has stopped
    pub fn put(&self, task: SearchTask) -> Result<(), QueueError> {
        self.sender.send(task).map_err(|_| QueueError::Closed)
    }
}
