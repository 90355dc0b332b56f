use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use review_watcher::cli::{Cli, execute_command, init_logger_from_settings, load_and_merge_config};
use review_watcher::config::Settings;
use review_watcher::logger::{LogRelay, RelayHandle, RelayLayer};
use review_watcher::services::notifications::{ChunkedSender, TelegramProvider};

/// Time the relay gets to deliver queued records before the process exits
const RELAY_FLUSH_GRACE: Duration = Duration::from_secs(10);

/// Create the relay layer and spawn its worker on the operator bot
fn start_relay(settings: &Settings) -> (RelayLayer, RelayHandle) {
    let telegram = &settings.telegram;
    let provider =
        TelegramProvider::new(&telegram.api_url, &telegram.log_bot_token, &telegram.chat_id);

    let (layer, records) = RelayLayer::new();
    let closer = layer.closer();
    let handle = LogRelay::new(ChunkedSender::new(provider, telegram.max_message_length))
        .spawn(records, closer);
    (layer, handle)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Credentials may live in a .env file next to the binary
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let settings = match load_and_merge_config(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let (relay_layer, relay) = if settings.logger.relay_enabled && cli.is_watching() {
        let (layer, handle) = start_relay(&settings);
        (Some(layer), Some(handle))
    } else {
        (None, None)
    };

    if let Err(e) = init_logger_from_settings(&settings, relay_layer) {
        eprintln!("Logger initialization error: {:#}", e);
        return ExitCode::FAILURE;
    }

    tracing::debug!(
        version = review_watcher::pkg_version(),
        command = ?cli.effective_command(),
        "Starting review-watcher"
    );

    let result = execute_command(&cli, settings)
        .await
        .map_err(anyhow::Error::from);
    if let Err(ref e) = result {
        tracing::error!("review-watcher stopped: {:?}", e);
    }

    if let Some(relay) = relay {
        relay.shutdown(RELAY_FLUSH_GRACE).await;
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
