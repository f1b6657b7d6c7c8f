//! Bot catalog loading
//!
//! The catalog is a JSON document `{ "bots": [ { "username", "url" }, ... ] }`.
//! Entry order matters: the menu addresses bots by their 1-based position.

use crate::error::HarvestError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// A mini-app bot and the page its web view should open
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BotDescriptor {
    /// Username the bot peer is resolved from
    #[serde(rename = "username")]
    pub identifier: String,
    /// Target page passed to the web-view request
    #[serde(rename = "url")]
    pub launch_url: String,
}

#[derive(Deserialize)]
struct Catalog {
    bots: Vec<BotDescriptor>,
}

/// Parse catalog JSON text
///
/// # Errors
///
/// Returns `HarvestError::Config` if the text is not a valid catalog.
pub fn parse_catalog(text: &str) -> Result<Vec<BotDescriptor>, HarvestError> {
    let catalog: Catalog = serde_json::from_str(text)
        .map_err(|e| HarvestError::Config(format!("malformed bot catalog: {e}")))?;
    Ok(catalog.bots)
}

/// Read and parse the catalog file
///
/// # Errors
///
/// Returns `HarvestError::Config` if the file is missing, unreadable or malformed.
pub async fn load_catalog(path: &Path) -> Result<Vec<BotDescriptor>, HarvestError> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        HarvestError::Config(format!("cannot read bot catalog {}: {e}", path.display()))
    })?;
    let bots = parse_catalog(&text)?;
    debug!(path = %path.display(), count = bots.len(), "Bot catalog loaded");
    Ok(bots)
}
