//! The assembled search service.
//!
//! `SearchService` owns everything that would otherwise be process-global:
//! the search root, the task queue and its worker, and the acceptor. It is
//! built once at startup and runs until its cancellation token fires.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use fsearch_core::SearchRoot;

use crate::config::ServerConfig;
use crate::queue::{spawn_worker, WorkerStats};
use crate::server::{SearchServer, ServerError};

/// How long shutdown waits for the worker to notice cancellation
const WORKER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// A bound, ready-to-run search service.
pub struct SearchService {
    root: SearchRoot,
    server: SearchServer,
    worker: JoinHandle<WorkerStats>,
    cancel_token: CancellationToken,
}

impl SearchService {
    /// Starts the worker and binds the listener.
    ///
    /// A root that is not currently a directory is only warned about: each
    /// search reports the problem to its client instead.
    ///
    /// # Errors
    ///
    /// - `ServerError::Bind` if the listening socket cannot be bound
    pub async fn bind(
        config: &ServerConfig,
        cancel_token: CancellationToken,
    ) -> Result<Self, ServerError> {
        let root = config.search_root();
        if !root.is_searchable() {
            warn!(root = %root, "Search root is not an accessible directory");
        }

        let (queue, worker) = spawn_worker(root.clone(), cancel_token.clone());

        let bound = SearchServer::bind(config.socket_addr(), queue, cancel_token.clone()).await;
        let server = match bound {
            Ok(server) => server,
            Err(e) => {
                cancel_token.cancel();
                worker.abort();
                return Err(e);
            }
        };

        Ok(Self {
            root,
            server,
            worker,
            cancel_token,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.server.local_addr()
    }

    pub fn root(&self) -> &SearchRoot {
        &self.root
    }

    /// Serves clients until shutdown, then waits for the worker to stop.
    pub async fn run(self) -> Result<WorkerStats, ServerError> {
        info!(root = %self.root, "Search service starting");

        let served = self.server.run().await;

        // The acceptor only returns on cancellation or error; either way
        // the worker has to stop too.
        self.cancel_token.cancel();
        drop(self.server);

        let stats = match tokio::time::timeout(WORKER_SHUTDOWN_TIMEOUT, self.worker).await {
            Ok(Ok(stats)) => stats,
            Ok(Err(e)) => return Err(ServerError::Worker(e.to_string())),
            Err(_) => {
                warn!("Search worker did not stop in time");
                WorkerStats::default()
            }
        };

        served?;
        info!(tasks = stats.total(), "Search service stopped");
        Ok(stats)
    }
}
