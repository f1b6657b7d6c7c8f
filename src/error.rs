//! Error taxonomy
//!
//! `ClientError` is what the platform adapter reports; the handshake collapses
//! it into per-session or per-pair outcomes. `HarvestError` covers what the
//! menu flows can fail with.

use thiserror::Error;

/// Errors surfaced to the batch and the interactive menu
#[derive(Error, Debug)]
pub enum HarvestError {
    /// Catalog missing or malformed, credentials missing. Fatal to the batch.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Any other failure of a single handshake
    #[error("Transient failure: {0}")]
    Transient(String),
    /// Standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The three ways the platform tells us a session is unusable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// The authorization key is not known to the server
    AuthKeyUnregistered,
    /// The key is known but no user is logged in with it
    Unauthorized,
    /// The account was deleted or banned
    UserDeactivated,
}

impl std::fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AuthKeyUnregistered => "authorization key unregistered",
            Self::Unauthorized => "user unauthorized",
            Self::UserDeactivated => "user deactivated",
        };
        f.write_str(s)
    }
}

/// Errors reported by the platform client adapter
#[derive(Error, Debug)]
pub enum ClientError {
    /// Persisted credentials were rejected
    #[error("session rejected: {0}")]
    SessionRejected(RejectionKind),
    /// The platform asked us to wait before retrying
    #[error("flood wait: retry after {seconds}s")]
    FloodWait {
        /// Seconds requested by the server
        seconds: u32,
    },
    /// The bot identifier does not resolve to a user
    #[error("peer not found: {0}")]
    PeerNotFound(String),
    /// Any other RPC error
    #[error("rpc error {code}: {name}")]
    Rpc {
        /// Numeric error class (400, 403, 500, ...)
        code: i32,
        /// Upper-case error name as sent by the server
        name: String,
    },
    /// Connection, timeout or deserialization problem
    #[error("transport error: {0}")]
    Transport(String),
    /// Session artifact could not be read or written
    #[error("session storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Whether this error means the session itself is dead
    #[must_use]
    pub const fn is_session_rejected(&self) -> bool {
        matches!(self, Self::SessionRejected(_))
    }
}
