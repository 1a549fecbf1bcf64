//! Parsing client request lines.

use fsearch_core::SearchRequest;
use thiserror::Error;

use crate::message::ServerMessage;

/// Why a request line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("expected 2 arguments, got {found}")]
    WrongArgumentCount { found: usize },

    #[error("depth is not a number: {token:?}")]
    DepthNotNumber { token: String },
}

impl RequestError {
    /// The single line sent back to the client for this error.
    pub fn reply(&self) -> ServerMessage {
        match self {
            Self::WrongArgumentCount { .. } => ServerMessage::WrongArgumentCount,
            Self::DepthNotNumber { .. } => ServerMessage::DepthNotNumber,
        }
    }
}

/// Parses one `<depth> <mask>` request line.
///
/// Tokens are split on any whitespace, so a trailing `\r` or `\n` is
/// ignored and masks cannot contain spaces. The depth must be a base-10
/// non-negative integer; negative or overflowing values are rejected the
/// same way as non-numeric ones.
pub fn parse_request(line: &str) -> Result<SearchRequest, RequestError> {
    let mut tokens = line.split_whitespace();

    let (depth, mask) = match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(depth), Some(mask), None) => (depth, mask),
        _ => {
            return Err(RequestError::WrongArgumentCount {
                found: line.split_whitespace().count(),
            })
        }
    };

    let depth = depth
        .parse::<usize>()
        .map_err(|_| RequestError::DepthNotNumber {
            token: depth.to_string(),
        })?;

    Ok(SearchRequest::new(depth, mask))
}
