//! `grammers` adapter
//!
//! One `grammers_client::Client` per opened session. The session artifact is
//! loaded when the session is opened and saved back when it is closed, so the
//! file is only touched while the adapter holds it.

use super::{LoginPrompt, PeerHandle, PlatformSession, SessionConnector, WEB_VIEW_PLATFORM};
use crate::error::{ClientError, RejectionKind};
use crate::sessions::session_path;
use async_trait::async_trait;
use grammers_client::{Client, Config, InitParams, InvocationError, SignInError};
use grammers_session::{PackedType, Session};
use grammers_tl_types as tl;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Map an RPC error onto the adapter taxonomy
///
/// Every 401 means the stored authorization is gone. Unknown keys and
/// deactivated accounts are told apart from the generic case for logging.
#[must_use]
pub fn classify_rpc(code: i32, name: &str, value: Option<u32>) -> ClientError {
    match name {
        "AUTH_KEY_UNREGISTERED" | "AUTH_KEY_INVALID" => {
            ClientError::SessionRejected(RejectionKind::AuthKeyUnregistered)
        }
        "USER_DEACTIVATED" | "USER_DEACTIVATED_BAN" => {
            ClientError::SessionRejected(RejectionKind::UserDeactivated)
        }
        _ if code == 401 => ClientError::SessionRejected(RejectionKind::Unauthorized),
        "FLOOD_WAIT" | "FLOOD_PREMIUM_WAIT" | "SLOWMODE_WAIT" => ClientError::FloodWait {
            seconds: value.unwrap_or_default(),
        },
        _ => ClientError::Rpc {
            code,
            name: name.to_string(),
        },
    }
}

/// Connection parameters shared by `open` and `login`
///
/// `flood_sleep_threshold` is zero so every FLOOD_WAIT reaches the caller
/// instead of being slept through inside the client.
fn init_params() -> InitParams {
    InitParams {
        catch_up: false,
        flood_sleep_threshold: 0,
        ..Default::default()
    }
}

/// Run a blocking terminal read without stalling the runtime's other tasks
///
/// Requires the multi-thread runtime.
fn read_blocking<T>(read: impl FnOnce() -> T) -> T {
    tokio::task::block_in_place(read)
}

fn map_invocation(err: InvocationError) -> ClientError {
    match err {
        InvocationError::Rpc(rpc) => classify_rpc(rpc.code, &rpc.name, rpc.value),
        other => ClientError::Transport(other.to_string()),
    }
}

/// Opens `grammers` clients over `<sessions_dir>/<name>.session`
#[derive(Debug, Clone)]
pub struct GrammersConnector {
    sessions_dir: PathBuf,
    api_id: i32,
    api_hash: String,
}

impl GrammersConnector {
    /// Create a connector bound to a sessions directory and API credentials
    #[must_use]
    pub fn new(sessions_dir: impl Into<PathBuf>, api_id: i32, api_hash: impl Into<String>) -> Self {
        Self {
            sessions_dir: sessions_dir.into(),
            api_id,
            api_hash: api_hash.into(),
        }
    }

    async fn connect(&self, path: &Path) -> Result<Client, ClientError> {
        let session = Session::load_file_or_create(path)?;
        Client::connect(Config {
            session,
            api_id: self.api_id,
            api_hash: self.api_hash.clone(),
            params: init_params(),
        })
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))
    }
}

#[async_trait]
impl SessionConnector for GrammersConnector {
    async fn open(&self, session_name: &str) -> Result<Box<dyn PlatformSession>, ClientError> {
        let path = session_path(&self.sessions_dir, session_name);
        let client = self.connect(&path).await?;

        // An unauthorized key fails here with the server's own 401 name
        client
            .invoke(&tl::functions::updates::GetState {})
            .await
            .map_err(map_invocation)?;

        debug!(session = %session_name, "Session connected");
        Ok(Box::new(GrammersSession {
            client: Some(client),
            path,
            name: session_name.to_string(),
        }))
    }

    async fn login(
        &self,
        session_name: &str,
        phone: &str,
        prompt: &mut (dyn LoginPrompt + 'static),
    ) -> Result<(), ClientError> {
        let path = session_path(&self.sessions_dir, session_name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let client = self.connect(&path).await?;

        if client.is_authorized().await.map_err(map_invocation)? {
            info!(session = %session_name, "Session is already authorized");
        } else {
            let token = client
                .request_login_code(phone)
                .await
                .map_err(|e| ClientError::Transport(e.to_string()))?;
            let code = read_blocking(|| prompt.login_code())?;

            match client.sign_in(&token, code.trim()).await {
                Ok(_) => {}
                Err(SignInError::PasswordRequired(password_token)) => {
                    let hint = password_token.hint().map(str::to_string);
                    let password = read_blocking(|| prompt.password(hint.as_deref()))?;
                    client
                        .check_password(password_token, password.trim())
                        .await
                        .map_err(|e| ClientError::Transport(e.to_string()))?;
                }
                Err(e) => return Err(ClientError::Transport(e.to_string())),
            }
            info!(session = %session_name, "Signed in");
        }

        client.session().save_to_file(&path)?;
        Ok(())
    }
}

struct GrammersSession {
    client: Option<Client>,
    path: PathBuf,
    name: String,
}

impl GrammersSession {
    fn client(&self) -> Result<&Client, ClientError> {
        self.client
            .as_ref()
            .ok_or_else(|| ClientError::Transport("connection already closed".to_string()))
    }
}

#[async_trait]
impl PlatformSession for GrammersSession {
    async fn resolve(&mut self, bot_identifier: &str) -> Result<PeerHandle, ClientError> {
        let username = bot_identifier.trim_start_matches('@');
        let chat = self
            .client()?
            .resolve_username(username)
            .await
            .map_err(map_invocation)?
            .ok_or_else(|| ClientError::PeerNotFound(bot_identifier.to_string()))?;

        let packed = chat.pack();
        match (packed.ty, packed.access_hash) {
            (PackedType::User | PackedType::Bot, Some(access_hash)) => Ok(PeerHandle {
                user_id: packed.id,
                access_hash,
            }),
            _ => Err(ClientError::PeerNotFound(bot_identifier.to_string())),
        }
    }

    async fn request_web_view(
        &mut self,
        peer: &PeerHandle,
        launch_url: &str,
    ) -> Result<String, ClientError> {
        let request = tl::functions::messages::RequestWebView {
            from_bot_menu: false,
            silent: false,
            compact: false,
            peer: tl::types::InputPeerUser {
                user_id: peer.user_id,
                access_hash: peer.access_hash,
            }
            .into(),
            bot: tl::types::InputUser {
                user_id: peer.user_id,
                access_hash: peer.access_hash,
            }
            .into(),
            url: Some(launch_url.to_string()),
            start_param: None,
            theme_params: None,
            platform: WEB_VIEW_PLATFORM.to_string(),
            reply_to: None,
            send_as: None,
        };

        let result = self
            .client()?
            .invoke(&request)
            .await
            .map_err(map_invocation)?;
        match result {
            tl::enums::WebViewResult::Url(view) => Ok(view.url),
        }
    }

    async fn close(&mut self) -> Result<(), ClientError> {
        let Some(client) = self.client.take() else {
            return Ok(());
        };
        if let Err(e) = client.session().save_to_file(&self.path) {
            warn!(session = %self.name, "Failed to save session on close: {e}");
            return Err(e.into());
        }
        drop(client);
        debug!(session = %self.name, "Session closed");
        Ok(())
    }
}
