//! fsearch Core - Search types shared by the protocol and the daemon
//!
//! This crate provides the search request model, the fixed search root,
//! and the depth-bounded name search that the daemon's worker streams to
//! clients.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod error;
pub mod request;
pub mod search;

// Re-exports for convenience
pub use error::SearchError;
pub use request::{SearchRequest, SearchRoot};
pub use search::{search, Matches, StopHandle};
