use dotenvy::dotenv;
use std::io;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use webview_harvester::app::App;
use webview_harvester::cli::Prompter;
use webview_harvester::client::GrammersConnector;
use webview_harvester::config::Settings;
use webview_harvester::logging::{init_logging, RedactionPatterns};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenv().ok();

    // Initialize redaction patterns early (before logging)
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);
    init_logging(patterns);

    let settings = init_settings();
    let credentials = match settings.credentials() {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let connector = GrammersConnector::new(
        &settings.sessions_dir,
        credentials.api_id,
        credentials.api_hash,
    );

    let cancel = CancellationToken::new();
    spawn_ctrlc_handler(cancel.clone());

    let app = App::new(&settings, &connector, cancel);
    let mut prompter = Prompter::new(io::BufReader::new(io::stdin()), io::stdout());
    if let Err(e) = app.run(&mut prompter).await {
        error!("{e}");
        std::process::exit(1);
    }

    Ok(())
}

fn init_settings() -> Settings {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

fn spawn_ctrlc_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("Interrupted, closing the current connection. Press Ctrl-C again to quit now.");
        cancel.cancel();

        // Blocking prompts never see the token
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}
