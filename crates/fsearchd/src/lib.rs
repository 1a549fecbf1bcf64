//! fsearch Daemon - TCP search server with a single search worker
//!
//! This crate provides the runtime pieces of the file search service:
//! - `server` - TCP acceptor and per-client connection handlers
//! - `queue` - Shared FIFO task queue and the sequential search worker
//! - `sink` - Per-connection output handle shared by handler and worker
//! - `config` - Layered server configuration (file, environment, CLI)
//! - `service` - Wires the above together around one search root
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        fsearchd                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐   │
//! │  │  SearchServer   │     │       SearchWorker          │   │
//! │  │  (TcpListener)  │     │  (walks root, one task at   │   │
//! │  └────────┬────────┘     │   a time, FIFO)             │   │
//! │           │ accept       └──────────────▲──────┬───────┘   │
//! │           ▼                             │      │           │
//! │  ┌─────────────────┐   SearchTask       │      │ matches   │
//! │  │ConnectionHandler│───────────────▶ TaskQueue │           │
//! │  │  (per client)   │   (unbounded mpsc)        ▼           │
//! │  └────────┬────────┘               ┌─────────────────┐     │
//! │           └──────── errors ───────▶│   OutputSink    │     │
//! │                                    │  (per client)   │     │
//! │                                    └─────────────────┘     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

pub mod config;
pub mod queue;
pub mod server;
pub mod service;
pub mod sink;
