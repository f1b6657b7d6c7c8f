//! Interactive menu flows
//!
//! `1` creates a session through the platform login, `2` harvests tokens for
//! one catalog bot across every stored session.

use crate::batch::BatchDriver;
use crate::catalog::load_catalog;
use crate::cli::{parse_bot_selection, parse_menu_choice, InputError, MenuChoice, Prompter};
use crate::client::SessionConnector;
use crate::config::Settings;
use crate::error::HarvestError;
use crate::sessions::{enumerate_sessions, session_path, validate_session_name};
use crate::sink::TokenSink;
use std::io::{BufRead, Write};
use tokio_util::sync::CancellationToken;
use tracing::info;

const MENU: &str = "
Select an action:

    1. Create session
    2. Run bot
";

/// Menu driver bound to settings and a platform connector
pub struct App<'a> {
    settings: &'a Settings,
    connector: &'a dyn SessionConnector,
    cancel: CancellationToken,
}

impl<'a> App<'a> {
    /// Create the menu driver
    #[must_use]
    pub const fn new(
        settings: &'a Settings,
        connector: &'a dyn SessionConnector,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            settings,
            connector,
            cancel,
        }
    }

    /// Show the menu, read a choice and run the chosen flow
    ///
    /// Operator mistakes (blank or invalid answers) are reported on the
    /// prompter and end the run without an error.
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::Config` if the bot catalog cannot be loaded,
    /// `HarvestError::Transient` if a login fails and `HarvestError::Io` on
    /// terminal or filesystem errors.
    pub async fn run<R, W>(&self, prompter: &mut Prompter<R, W>) -> Result<(), HarvestError>
    where
        R: BufRead + Send + 'static,
        W: Write + Send + 'static,
    {
        prompter.say(MENU)?;
        let answer = prompter.ask("Enter your choice (1/2): ")?;
        match parse_menu_choice(&answer) {
            Ok(MenuChoice::CreateSession) => self.create_session(prompter).await,
            Ok(MenuChoice::RunBatch) => self.run_batch(prompter).await,
            Err(e) => {
                prompter.say(e)?;
                Ok(())
            }
        }
    }

    async fn create_session<R, W>(&self, prompter: &mut Prompter<R, W>) -> Result<(), HarvestError>
    where
        R: BufRead + Send + 'static,
        W: Write + Send + 'static,
    {
        let phone = prompter.ask("Enter your phone number (with country code): ")?;
        if phone.is_empty() {
            prompter.say(InputError::Empty)?;
            return Ok(());
        }
        let name = prompter.ask("Enter a name for the new session: ")?;
        if let Err(e) = validate_session_name(&name) {
            prompter.say(e)?;
            return Ok(());
        }

        let path = session_path(&self.settings.sessions_dir, &name);
        info!(session = %name, path = %path.display(), "Creating session");
        self.connector
            .login(&name, &phone, prompter)
            .await
            .map_err(|e| HarvestError::Transient(format!("login for '{name}' failed: {e}")))?;

        prompter.say(format!("New session '{name}' created and logged in."))?;
        Ok(())
    }

    async fn run_batch<R, W>(&self, prompter: &mut Prompter<R, W>) -> Result<(), HarvestError>
    where
        R: BufRead + Send + 'static,
        W: Write + Send + 'static,
    {
        let bots = load_catalog(&self.settings.bot_catalog).await?;
        if bots.is_empty() {
            prompter.say(format!(
                "No bots available in {}. Exiting...",
                self.settings.bot_catalog.display()
            ))?;
            return Ok(());
        }

        prompter.say("Available bots:")?;
        for (i, bot) in bots.iter().enumerate() {
            prompter.say(format!("{}. {}", i + 1, bot.identifier))?;
        }
        let answer = prompter.ask("Select a bot by number: ")?;
        let index = match parse_bot_selection(&answer, bots.len()) {
            Ok(index) => index,
            Err(e) => {
                prompter.say(e)?;
                return Ok(());
            }
        };
        let selected = &bots[index..=index];
        prompter.say(format!("Selected bot | {}", selected[0].identifier))?;

        let sessions = enumerate_sessions(&self.settings.sessions_dir).await?;
        if sessions.is_empty() {
            prompter.say(format!(
                "No sessions found in {}.",
                self.settings.sessions_dir.display()
            ))?;
            return Ok(());
        }

        let sink = TokenSink::new(&self.settings.output_dir);
        let driver = BatchDriver::new(
            self.connector,
            &sink,
            self.settings.request_delay(),
            self.cancel.clone(),
        );
        let report = driver.run(&sessions, selected).await;

        let mut summary = format!(
            "Done | {} harvested | {} failed",
            report.harvested(),
            report.failed()
        );
        if report.cancelled {
            summary.push_str(" | cancelled");
        }
        prompter.say(summary)?;
        Ok(())
    }
}
