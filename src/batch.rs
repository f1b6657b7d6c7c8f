//! Batch driver
//!
//! Walks sessions in enumeration order and, for each, the selected bots in
//! catalog order. One handshake is in flight at a time. A fixed delay
//! separates consecutive attempts; the platform's flood-wait hints are
//! reported but not honored.

use crate::catalog::BotDescriptor;
use crate::client::SessionConnector;
use crate::handshake::{run_handshake, HandshakeOutcome};
use crate::sink::TokenSink;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Default pause between consecutive handshakes
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(5);

/// What happened to one `(session, bot)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservationKind {
    /// Token appended to the given file
    Harvested {
        /// Token file the line went to
        token_file: PathBuf,
    },
    /// The session is dead; its remaining bots were skipped
    InvalidSession,
    /// Handshake or persistence failed for this pair only
    Transient(String),
    /// The batch was cancelled during this handshake
    Cancelled,
}

/// One line of batch output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Session name
    pub session: String,
    /// Bot identifier
    pub bot: String,
    /// Outcome
    pub kind: ObservationKind,
}

impl Observation {
    /// Whether a token was written
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.kind, ObservationKind::Harvested { .. })
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ObservationKind::Harvested { token_file } => write!(
                f,
                "{} | {} | token written to {}",
                self.session,
                self.bot,
                token_file.display()
            ),
            ObservationKind::InvalidSession => {
                write!(f, "{} | {} | InvalidSession", self.session, self.bot)
            }
            ObservationKind::Transient(reason) => {
                write!(f, "{} | {} | {}", self.session, self.bot, reason)
            }
            ObservationKind::Cancelled => write!(f, "{} | {} | cancelled", self.session, self.bot),
        }
    }
}

/// Everything a batch run observed, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Observations in the order the handshakes ran
    pub observations: Vec<Observation>,
    /// Whether the run stopped early on cancellation
    pub cancelled: bool,
}

impl BatchReport {
    /// Number of tokens written
    #[must_use]
    pub fn harvested(&self) -> usize {
        self.observations.iter().filter(|o| o.is_success()).count()
    }

    /// Number of pairs that did not produce a token
    #[must_use]
    pub fn failed(&self) -> usize {
        self.observations.len() - self.harvested()
    }
}

/// Runs handshakes for every session against the selected bots
pub struct BatchDriver<'a> {
    connector: &'a dyn SessionConnector,
    sink: &'a TokenSink,
    delay: Duration,
    cancel: CancellationToken,
}

impl<'a> BatchDriver<'a> {
    /// Create a driver
    #[must_use]
    pub fn new(
        connector: &'a dyn SessionConnector,
        sink: &'a TokenSink,
        delay: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            connector,
            sink,
            delay,
            cancel,
        }
    }

    /// Run the batch
    ///
    /// Never fails as a whole: every per-pair or per-session problem ends up
    /// as an observation in the report.
    pub async fn run(&self, sessions: &[String], bots: &[BotDescriptor]) -> BatchReport {
        let mut report = BatchReport::default();
        let mut first = true;

        'sessions: for session in sessions {
            for bot in bots {
                if !first && !self.pause().await {
                    report.cancelled = true;
                    break 'sessions;
                }
                first = false;

                let kind = self.attempt(session, bot).await;
                let observation = Observation {
                    session: session.clone(),
                    bot: bot.identifier.clone(),
                    kind,
                };
                if observation.is_success() {
                    info!("✅ {observation}");
                } else {
                    warn!("❌ {observation}");
                }

                let kind = observation.kind.clone();
                report.observations.push(observation);
                match kind {
                    ObservationKind::Cancelled => {
                        report.cancelled = true;
                        break 'sessions;
                    }
                    ObservationKind::InvalidSession => continue 'sessions,
                    ObservationKind::Harvested { .. } | ObservationKind::Transient(_) => {}
                }
            }
        }

        info!(
            harvested = report.harvested(),
            failed = report.failed(),
            cancelled = report.cancelled,
            "Batch finished"
        );
        report
    }

    async fn attempt(&self, session: &str, bot: &BotDescriptor) -> ObservationKind {
        match run_handshake(self.connector, session, bot, &self.cancel).await {
            HandshakeOutcome::Success(data) => match self.sink.append(&bot.identifier, &data).await
            {
                Ok(token_file) => ObservationKind::Harvested { token_file },
                Err(e) => ObservationKind::Transient(format!("failed to write token: {e}")),
            },
            HandshakeOutcome::InvalidSession(_) => ObservationKind::InvalidSession,
            HandshakeOutcome::TransientFailure(reason) => ObservationKind::Transient(reason),
            HandshakeOutcome::Cancelled => ObservationKind::Cancelled,
        }
    }

    /// Sleep for the configured delay. Returns `false` if cancelled.
    async fn pause(&self) -> bool {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(self.delay) => true,
        }
    }
}
