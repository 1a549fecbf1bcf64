//! Server-to-client lines.

use std::fmt;
use std::path::PathBuf;

/// First line sent on every new connection.
pub const GREETING: &str = "Connected to the File Search Server.";

/// Second line sent on every new connection.
pub const USAGE_HINT: &str = "Enter search parameters in the format: depth mask";

/// A single line written by the server.
///
/// `Display` renders the exact wire text without the trailing newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Session opening, line one
    Greeting,

    /// Session opening, line two
    UsageHint,

    /// A matching file's full path
    Match(PathBuf),

    /// Request depth token was not an integer
    DepthNotNumber,

    /// Request did not have exactly two tokens
    WrongArgumentCount,

    /// Traversal of the search root failed
    SearchFailed(String),
}

impl ServerMessage {
    /// Creates a match line for a found path.
    pub fn found(path: impl Into<PathBuf>) -> Self {
        Self::Match(path.into())
    }

    /// Creates a search failure line.
    pub fn search_failed(reason: impl fmt::Display) -> Self {
        Self::SearchFailed(reason.to_string())
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Greeting => f.write_str(GREETING),
            Self::UsageHint => f.write_str(USAGE_HINT),
            Self::Match(path) => write!(f, "{}", path.display()),
            Self::DepthNotNumber => f.write_str("Error: Depth must be a number."),
            Self::WrongArgumentCount => {
                f.write_str("Error: Incorrect number of arguments. Usage: depth mask")
            }
            Self::SearchFailed(reason) => write!(f, "Search error: {reason}"),
        }
    }
}
