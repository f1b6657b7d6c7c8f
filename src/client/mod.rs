//! Platform client adapter
//!
//! The harvester only needs four things from a Telegram client: open a
//! session, resolve a bot, request a web view and close. `SessionConnector`
//! hands out one `PlatformSession` per handshake; connections are never
//! pooled across handshakes.

use crate::error::ClientError;
use async_trait::async_trait;

/// `grammers`-backed implementation
pub mod grammers;

pub use self::grammers::GrammersConnector;

/// Platform tag sent with every web-view request
pub const WEB_VIEW_PLATFORM: &str = "android";

/// A resolved bot user, usable as both `peer` and `bot` of a web-view request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerHandle {
    /// Platform user id
    pub user_id: i64,
    /// Access hash bound to the session that resolved it
    pub access_hash: i64,
}

/// A live connection bound to one session artifact
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlatformSession: Send {
    /// Resolve a bot username to a peer handle
    async fn resolve(&mut self, bot_identifier: &str) -> Result<PeerHandle, ClientError>;

    /// Ask the platform for the launch URL of `launch_url` opened inside `peer`
    async fn request_web_view(
        &mut self,
        peer: &PeerHandle,
        launch_url: &str,
    ) -> Result<String, ClientError>;

    /// Tear down the connection. Calling it again is a no-op.
    async fn close(&mut self) -> Result<(), ClientError>;
}

/// Supplies the interactive answers of a login
pub trait LoginPrompt: Send {
    /// Ask for the login code the platform just sent
    ///
    /// # Errors
    ///
    /// Returns an error if the answer cannot be read.
    fn login_code(&mut self) -> std::io::Result<String>;

    /// Ask for the two-step verification password
    ///
    /// # Errors
    ///
    /// Returns an error if the answer cannot be read.
    fn password(&mut self, hint: Option<&str>) -> std::io::Result<String>;
}

/// Opens sessions by name
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionConnector: Send + Sync {
    /// Connect using the named session artifact
    ///
    /// Fails with `ClientError::SessionRejected` when the persisted
    /// authorization is no longer accepted.
    async fn open(&self, session_name: &str) -> Result<Box<dyn PlatformSession>, ClientError>;

    /// Log a phone number in and persist the result as a new session artifact
    async fn login(
        &self,
        session_name: &str,
        phone: &str,
        prompt: &mut (dyn LoginPrompt + 'static),
    ) -> Result<(), ClientError>;
}
