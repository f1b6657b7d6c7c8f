//! Scripted stand-in for the Telegram client.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use webview_harvester::catalog::BotDescriptor;
use webview_harvester::client::{LoginPrompt, PeerHandle, PlatformSession, SessionConnector};
use webview_harvester::error::{ClientError, RejectionKind};

/// How a scripted session reacts
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Return a well-formed launch URL carrying `<session> <bot>`
    Echo,
    /// Return this launch URL verbatim
    LaunchUrl(String),
    /// Refuse to open
    Reject(RejectionKind),
    /// Answer the web-view request with a flood wait
    FloodWait(u32),
    /// Never finish resolving the bot
    Hang,
}

/// Records every adapter call as a line like `open a` or `close a`
#[derive(Clone, Default)]
pub struct FakeConnector {
    behaviors: HashMap<String, Behavior>,
    events: Arc<Mutex<Vec<String>>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, session: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(session.to_string(), behavior);
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("events lock").clone()
    }

    fn record(&self, event: String) {
        self.events.lock().expect("events lock").push(event);
    }
}

#[async_trait]
impl SessionConnector for FakeConnector {
    async fn open(&self, session_name: &str) -> Result<Box<dyn PlatformSession>, ClientError> {
        self.record(format!("open {session_name}"));
        let behavior = self
            .behaviors
            .get(session_name)
            .cloned()
            .unwrap_or(Behavior::Echo);
        if let Behavior::Reject(kind) = behavior {
            return Err(ClientError::SessionRejected(kind));
        }
        Ok(Box::new(FakeSession {
            name: session_name.to_string(),
            behavior,
            bot: None,
            events: self.events.clone(),
        }))
    }

    async fn login(
        &self,
        session_name: &str,
        phone: &str,
        prompt: &mut (dyn LoginPrompt + 'static),
    ) -> Result<(), ClientError> {
        let code = prompt.login_code()?;
        self.record(format!("login {session_name} {phone} {code}"));
        Ok(())
    }
}

struct FakeSession {
    name: String,
    behavior: Behavior,
    bot: Option<String>,
    events: Arc<Mutex<Vec<String>>>,
}

impl FakeSession {
    fn record(&self, event: String) {
        self.events.lock().expect("events lock").push(event);
    }
}

#[async_trait]
impl PlatformSession for FakeSession {
    async fn resolve(&mut self, bot_identifier: &str) -> Result<PeerHandle, ClientError> {
        self.record(format!("resolve {} {bot_identifier}", self.name));
        if matches!(self.behavior, Behavior::Hang) {
            std::future::pending::<()>().await;
        }
        self.bot = Some(bot_identifier.to_string());
        Ok(PeerHandle {
            user_id: 1000,
            access_hash: 1,
        })
    }

    async fn request_web_view(
        &mut self,
        _peer: &PeerHandle,
        launch_url: &str,
    ) -> Result<String, ClientError> {
        self.record(format!("request {} {launch_url}", self.name));
        match &self.behavior {
            Behavior::FloodWait(seconds) => Err(ClientError::FloodWait { seconds: *seconds }),
            Behavior::LaunchUrl(url) => Ok(url.clone()),
            _ => Ok(format!(
                "{launch_url}#tgWebAppData={}%20{}&tgWebAppVersion=7.0&tgWebAppPlatform=android",
                self.name,
                self.bot.as_deref().unwrap_or_default()
            )),
        }
    }

    async fn close(&mut self) -> Result<(), ClientError> {
        self.record(format!("close {}", self.name));
        Ok(())
    }
}

pub fn bot(identifier: &str) -> BotDescriptor {
    BotDescriptor {
        identifier: identifier.to_string(),
        launch_url: format!("https://{identifier}.example/app"),
    }
}

pub fn names(sessions: &[&str]) -> Vec<String> {
    sessions.iter().map(|s| (*s).to_string()).collect()
}
