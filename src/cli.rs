//! Interactive prompt handling
//!
//! Parsing of menu answers is kept separate from terminal I/O so the flows
//! in `app` can run against in-memory readers and writers.

use crate::client::LoginPrompt;
use std::io::{self, BufRead, Write};

/// Top-level menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    /// Log a phone number in and store a new session
    CreateSession,
    /// Harvest tokens for one bot across all sessions
    RunBatch,
}

/// Problems with an operator's answer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    /// Nothing was typed
    #[error("No input provided. Exiting...")]
    Empty,
    /// The answer is not one of the offered entries
    #[error("Invalid choice. Please enter '1' or '2'.")]
    InvalidChoice,
    /// The bot number is not a number or out of range
    #[error("Invalid selection '{0}'. Please enter a number between 1 and {1}.")]
    InvalidSelection(String, usize),
}

/// Parse the main menu answer
///
/// # Errors
///
/// Returns `InputError::Empty` for a blank answer and `InputError::InvalidChoice`
/// for anything other than `1` or `2`.
pub fn parse_menu_choice(input: &str) -> Result<MenuChoice, InputError> {
    match input.trim() {
        "" => Err(InputError::Empty),
        "1" => Ok(MenuChoice::CreateSession),
        "2" => Ok(MenuChoice::RunBatch),
        _ => Err(InputError::InvalidChoice),
    }
}

/// Parse a 1-based bot number into a catalog index
///
/// # Errors
///
/// Returns `InputError::Empty` for a blank answer and
/// `InputError::InvalidSelection` when the number is not in `1..=count`.
pub fn parse_bot_selection(input: &str, count: usize) -> Result<usize, InputError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(InputError::Empty);
    }
    match input.parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Ok(n - 1),
        _ => Err(InputError::InvalidSelection(input.to_string(), count)),
    }
}

/// Line-oriented question/answer over a reader and a writer
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Wrap a reader and a writer
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `label` without a newline and read one trimmed line
    ///
    /// End of input reads as an empty answer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing or reading fails.
    pub fn ask(&mut self, label: &str) -> io::Result<String> {
        write!(self.output, "{label}")?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    /// Print one line
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn say(&mut self, line: impl std::fmt::Display) -> io::Result<()> {
        writeln!(self.output, "{line}")
    }

    /// Give back the writer
    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead + Send, W: Write + Send> LoginPrompt for Prompter<R, W> {
    fn login_code(&mut self) -> io::Result<String> {
        self.ask("Enter the code you received: ")
    }

    fn password(&mut self, hint: Option<&str>) -> io::Result<String> {
        match hint {
            Some(hint) => self.ask(&format!("Enter your 2FA password (hint: {hint}): ")),
            None => self.ask("Enter your 2FA password: "),
        }
    }
}
