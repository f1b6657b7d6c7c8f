#![deny(missing_docs)]
//! Web-view token harvester
//!
//! Drives stored Telegram user sessions through the mini-app web-view
//! handshake and appends the resulting `tgWebAppData` to per-bot files.

/// Interactive menu flows
pub mod app;
/// Batch driver
pub mod batch;
/// Bot catalog loading
pub mod catalog;
/// Prompt parsing and terminal I/O
pub mod cli;
/// Platform client adapter
pub mod client;
/// Configuration management
pub mod config;
/// Error taxonomy
pub mod error;
/// Web-view handshake
pub mod handshake;
/// Logging setup
pub mod logging;
/// Session artifact discovery
pub mod sessions;
/// Token files
pub mod sink;
