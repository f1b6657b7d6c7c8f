//! Web-view handshake
//!
//! Drives one session through `RequestWebView` for one bot and extracts the
//! `tgWebAppData` payload from the launch URL the platform returns.

use crate::catalog::BotDescriptor;
use crate::client::{PlatformSession, SessionConnector};
use crate::error::ClientError;
use percent_encoding::percent_decode_str;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const WEB_APP_DATA_MARKER: &str = "tgWebAppData=";
const WEB_APP_VERSION_MARKER: &str = "&tgWebAppVersion";

/// Reason recorded when the launch URL does not carry a payload
pub const MALFORMED_LAUNCH_URL: &str = "malformed launch url";

/// URL-decoded web-app data. A bearer credential: never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct WebAppData(String);

impl WebAppData {
    /// Payload text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for WebAppData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WebAppData({} bytes)", self.0.len())
    }
}

/// Result of one `(session, bot)` handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeOutcome {
    /// Payload extracted
    Success(WebAppData),
    /// The named session is dead; skip its remaining bots
    InvalidSession(String),
    /// Anything else went wrong for this pair
    TransientFailure(String),
    /// Cancellation was requested while the handshake was in flight
    Cancelled,
}

/// Pull the `tgWebAppData` fragment out of a launch URL and decode it once
///
/// Returns `None` when either marker is missing.
///
/// # Examples
///
/// ```
/// use webview_harvester::handshake::extract_web_app_data;
///
/// let url = "https://x/app#tgWebAppData=abc%20def&tgWebAppVersion=7.0";
/// let data = extract_web_app_data(url).expect("payload present");
/// assert_eq!(data.as_str(), "abc def");
/// ```
#[must_use]
pub fn extract_web_app_data(raw_url: &str) -> Option<WebAppData> {
    let (_, tail) = raw_url.split_once(WEB_APP_DATA_MARKER)?;
    let (encoded, _) = tail.split_once(WEB_APP_VERSION_MARKER)?;
    let decoded = percent_decode_str(encoded).decode_utf8_lossy();
    Some(WebAppData(decoded.into_owned()))
}

enum Step {
    Done(Result<String, ClientError>),
    Cancelled,
}

async fn request_launch_url(
    session: &mut dyn PlatformSession,
    bot: &BotDescriptor,
) -> Result<String, ClientError> {
    let peer = session.resolve(&bot.identifier).await?;
    session.request_web_view(&peer, &bot.launch_url).await
}

/// Run the handshake for `session_name` against `bot`
///
/// The connection opened here is closed before returning on every path,
/// cancellation included.
pub async fn run_handshake(
    connector: &dyn SessionConnector,
    session_name: &str,
    bot: &BotDescriptor,
    cancel: &CancellationToken,
) -> HandshakeOutcome {
    let opened = tokio::select! {
        biased;
        () = cancel.cancelled() => return HandshakeOutcome::Cancelled,
        res = connector.open(session_name) => res,
    };

    let mut session = match opened {
        Ok(session) => session,
        Err(e) if e.is_session_rejected() => {
            debug!(session = %session_name, "Session rejected: {e}");
            return HandshakeOutcome::InvalidSession(session_name.to_string());
        }
        Err(e) => {
            debug!(session = %session_name, bot = %bot.identifier, "Failed to connect: {e}");
            return HandshakeOutcome::TransientFailure(e.to_string());
        }
    };

    let step = tokio::select! {
        biased;
        () = cancel.cancelled() => Step::Cancelled,
        res = request_launch_url(session.as_mut(), bot) => Step::Done(res),
    };

    if let Err(e) = session.close().await {
        debug!(session = %session_name, "Close failed: {e}");
    }

    match step {
        Step::Cancelled => HandshakeOutcome::Cancelled,
        Step::Done(Err(e)) if e.is_session_rejected() => {
            debug!(session = %session_name, "Session rejected: {e}");
            HandshakeOutcome::InvalidSession(session_name.to_string())
        }
        Step::Done(Err(e)) => {
            debug!(session = %session_name, bot = %bot.identifier, "Web view request failed: {e}");
            HandshakeOutcome::TransientFailure(e.to_string())
        }
        Step::Done(Ok(raw_url)) => match extract_web_app_data(&raw_url) {
            Some(data) => HandshakeOutcome::Success(data),
            None => {
                debug!(session = %session_name, bot = %bot.identifier, "Launch URL carries no web app data");
                HandshakeOutcome::TransientFailure(MALFORMED_LAUNCH_URL.to_string())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockPlatformSession, MockSessionConnector, PeerHandle};
    use crate::error::RejectionKind;

    const PEER: PeerHandle = PeerHandle {
        user_id: 42,
        access_hash: 7,
    };

    fn demo_bot() -> BotDescriptor {
        BotDescriptor {
            identifier: "demo_bot".to_string(),
            launch_url: "https://x/app".to_string(),
        }
    }

    fn session_returning(url: &'static str) -> MockPlatformSession {
        let mut session = MockPlatformSession::new();
        session
            .expect_resolve()
            .withf(|name| name == "demo_bot")
            .returning(|_| Ok(PEER));
        session
            .expect_request_web_view()
            .withf(|peer, url| *peer == PEER && url == "https://x/app")
            .returning(move |_, _| Ok(url.to_string()));
        session.expect_close().times(1).returning(|| Ok(()));
        session
    }

    fn connector_with(session: MockPlatformSession) -> MockSessionConnector {
        let mut connector = MockSessionConnector::new();
        let mut slot = Some(session);
        connector.expect_open().times(1).returning(move |_| {
            slot.take()
                .map(|s| Box::new(s) as Box<dyn PlatformSession>)
                .ok_or_else(|| ClientError::Transport("opened twice".to_string()))
        });
        connector
    }

    #[test]
    fn test_extract_decodes_once() {
        let data = extract_web_app_data(
            "https://x/app#tgWebAppData=query_id%3DAA%26user%3D%257B%257D&tgWebAppVersion=7.0",
        );
        assert_eq!(
            data.as_ref().map(WebAppData::as_str),
            Some("query_id=AA&user=%7B%7D")
        );
    }

    #[test]
    fn test_extract_keeps_plus_sign() {
        let data = extract_web_app_data("#tgWebAppData=a+b&tgWebAppVersion=6.9");
        assert_eq!(data.as_ref().map(WebAppData::as_str), Some("a+b"));
    }

    #[test]
    fn test_extract_missing_markers() {
        assert!(extract_web_app_data("https://x/app#tgWebAppVersion=7.0").is_none());
        assert!(extract_web_app_data("https://x/app#tgWebAppData=abc").is_none());
    }

    #[test]
    fn test_debug_hides_payload() {
        let data = WebAppData("secret".to_string());
        assert!(!format!("{data:?}").contains("secret"));
    }

    #[tokio::test]
    async fn test_success_closes_connection() {
        let connector = connector_with(session_returning(
            "https://x/app#tgWebAppData=abc%20def&tgWebAppVersion=7.0",
        ));
        let outcome =
            run_handshake(&connector, "a", &demo_bot(), &CancellationToken::new()).await;
        assert_eq!(
            outcome,
            HandshakeOutcome::Success(WebAppData("abc def".to_string()))
        );
    }

    #[tokio::test]
    async fn test_malformed_url_still_closes() {
        let connector = connector_with(session_returning("https://x/app#tgWebAppVersion=7.0"));
        let outcome =
            run_handshake(&connector, "a", &demo_bot(), &CancellationToken::new()).await;
        assert_eq!(
            outcome,
            HandshakeOutcome::TransientFailure(MALFORMED_LAUNCH_URL.to_string())
        );
    }

    #[tokio::test]
    async fn test_rejected_session_is_invalid() {
        let mut connector = MockSessionConnector::new();
        connector.expect_open().returning(|_| {
            Err(ClientError::SessionRejected(
                RejectionKind::AuthKeyUnregistered,
            ))
        });
        let outcome =
            run_handshake(&connector, "b", &demo_bot(), &CancellationToken::new()).await;
        assert_eq!(outcome, HandshakeOutcome::InvalidSession("b".to_string()));
    }

    #[tokio::test]
    async fn test_rejection_after_open_names_session() {
        let mut session = MockPlatformSession::new();
        session.expect_resolve().returning(|_| {
            Err(ClientError::SessionRejected(RejectionKind::UserDeactivated))
        });
        session.expect_close().times(1).returning(|| Ok(()));

        let outcome = run_handshake(
            &connector_with(session),
            "carol",
            &demo_bot(),
            &CancellationToken::new(),
        )
        .await;
        assert_eq!(outcome, HandshakeOutcome::InvalidSession("carol".to_string()));
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("log buffer").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failures_stay_below_warn() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut connector = MockSessionConnector::new();
        connector.expect_open().returning(|_| {
            Err(ClientError::SessionRejected(RejectionKind::Unauthorized))
        });
        run_handshake(&connector, "b", &demo_bot(), &CancellationToken::new()).await;
        run_handshake(
            &connector_with(session_returning("https://x/app#tgWebAppVersion=7.0")),
            "a",
            &demo_bot(),
            &CancellationToken::new(),
        )
        .await;

        assert!(captured.0.lock().expect("log buffer").is_empty());
    }

    #[tokio::test]
    async fn test_flood_wait_is_transient() {
        let mut session = MockPlatformSession::new();
        session.expect_resolve().returning(|_| Ok(PEER));
        session
            .expect_request_web_view()
            .returning(|_, _| Err(ClientError::FloodWait { seconds: 30 }));
        session.expect_close().times(1).returning(|| Ok(()));

        let outcome = run_handshake(
            &connector_with(session),
            "a",
            &demo_bot(),
            &CancellationToken::new(),
        )
        .await;
        let HandshakeOutcome::TransientFailure(reason) = outcome else {
            panic!("expected transient failure, got {outcome:?}");
        };
        assert!(reason.contains("30"));
    }

    #[tokio::test]
    async fn test_close_failure_keeps_success() {
        let mut session = MockPlatformSession::new();
        session.expect_resolve().returning(|_| Ok(PEER));
        session.expect_request_web_view().returning(|_, _| {
            Ok("#tgWebAppData=tok&tgWebAppVersion=7.0".to_string())
        });
        session
            .expect_close()
            .times(1)
            .returning(|| Err(ClientError::Transport("socket gone".to_string())));

        let outcome = run_handshake(
            &connector_with(session),
            "a",
            &demo_bot(),
            &CancellationToken::new(),
        )
        .await;
        assert_eq!(outcome, HandshakeOutcome::Success(WebAppData("tok".to_string())));
    }

    #[tokio::test]
    async fn test_cancelled_before_open() {
        let mut connector = MockSessionConnector::new();
        connector
            .expect_open()
            .returning(|_| Err(ClientError::Transport("unreachable".to_string())));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = run_handshake(&connector, "a", &demo_bot(), &cancel).await;
        assert_eq!(outcome, HandshakeOutcome::Cancelled);
    }
}
