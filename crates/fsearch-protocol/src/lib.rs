//! fsearch Protocol - Line-based wire protocol for the search server
//!
//! Every line in either direction is UTF-8 text ending in a single `\n`.
//! Clients send `<depth> <mask>` requests; the server answers with a
//! greeting on connect, one line per matching path, and single-line
//! error replies.

pub mod message;
pub mod parse;

pub use message::{ServerMessage, GREETING, USAGE_HINT};
pub use parse::{parse_request, RequestError};
