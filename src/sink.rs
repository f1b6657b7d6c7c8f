//! Per-bot token files

use crate::handshake::WebAppData;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

/// Appends harvested payloads to `<bot>_token.txt` files
#[derive(Debug, Clone)]
pub struct TokenSink {
    output_dir: PathBuf,
}

impl TokenSink {
    /// Create a sink writing into `output_dir`
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Path of the token file for `bot_identifier`
    #[must_use]
    pub fn token_path(&self, bot_identifier: &str) -> PathBuf {
        self.output_dir.join(format!("{bot_identifier}_token.txt"))
    }

    /// Append one payload line and flush
    ///
    /// The file is opened and closed within this call. The line is written
    /// with a single `write_all` so a failed append leaves no partial line
    /// behind the previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or written.
    pub async fn append(&self, bot_identifier: &str, data: &WebAppData) -> std::io::Result<PathBuf> {
        let path = self.token_path(bot_identifier);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        let mut line = String::with_capacity(data.as_str().len() + 1);
        line.push_str(data.as_str());
        line.push('\n');
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(path)
    }
}
